//! Page classification for the automation surface.

use serde::{Deserialize, Serialize};

use crate::ActionResponse;

pub const SHORTS_UNAVAILABLE: &str = "Cinema mode not available for Shorts";
pub const NOT_A_VIDEO_PAGE: &str = "Not on a video page";

/// What kind of page a tab is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageKind {
    /// A regular video (`/watch?v=`)
    Watch,
    /// A short-form video (`/shorts/`)
    Short,
    Other,
}

impl PageKind {
    pub fn classify(url: &str) -> Self {
        if url.contains("/watch?v=") {
            PageKind::Watch
        } else if url.contains("/shorts/") {
            PageKind::Short
        } else {
            PageKind::Other
        }
    }

    pub fn is_video(self) -> bool {
        !matches!(self, PageKind::Other)
    }

    /// Cinema mode is only offered on regular videos.
    pub fn supports_cinema(self) -> bool {
        matches!(self, PageKind::Watch)
    }
}

/// Whether a tab URL belongs to the video site at all.
pub fn is_video_site(url: &str) -> bool {
    url.contains("youtube.com")
}

/// Reply of the automation surface to `triggerCinema`.
pub fn respond_to_trigger(page: PageKind) -> ActionResponse {
    match page {
        PageKind::Watch => ActionResponse::ok(),
        PageKind::Short => ActionResponse::failed(SHORTS_UNAVAILABLE),
        PageKind::Other => ActionResponse::failed(NOT_A_VIDEO_PAGE),
    }
}
