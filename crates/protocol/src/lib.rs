//! CineTube Cross-Surface Protocol
//!
//! This crate defines the messages exchanged between surfaces: the control
//! surface (popup, options page, CLI) and the automation surface running in
//! the video page. The wire format is a JSON object tagged by `action`.
//!
//! Delivery is fire-and-forget. The receiving surface may not be running, in
//! which case the message is dropped and the sender carries on; senders must
//! never wait on a response to make progress.
//!
//! # Usage
//!
//! ```ignore
//! use cinetube_protocol::{SurfaceMessage, Notifier};
//!
//! let msg = SurfaceMessage::setting_changed(SettingName::Opacity, 50.into());
//! let json = serde_json::to_string(&msg)?; // {"action":"updateSettings","opacity":50}
//! notifier.notify(msg);
//! ```

pub mod notify;
pub mod page;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use cinetube_config::{CinemaStats, PreferenceSet, Preferences, SettingName};

pub use notify::{channel, ChannelNotifier, Notifier, SurfaceInbox};
pub use page::{is_video_site, respond_to_trigger, PageKind};

// =============================================================================
// Control surface → automation surface
// =============================================================================

/// Messages sent between surfaces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum SurfaceMessage {
    /// Enter (or restart) cinema mode on the current video now.
    TriggerCinema,
    /// The auto-cinema toggle changed.
    UpdateCinemaPreference { enabled: bool },
    /// One or more settings changed; only the changed keys are present.
    UpdateSettings(SettingsUpdate),
    /// Ask the page for its usage statistics.
    GetStats,
}

impl SurfaceMessage {
    /// The `action` tag, for logging.
    pub fn action(&self) -> &'static str {
        match self {
            SurfaceMessage::TriggerCinema => "triggerCinema",
            SurfaceMessage::UpdateCinemaPreference { .. } => "updateCinemaPreference",
            SurfaceMessage::UpdateSettings(_) => "updateSettings",
            SurfaceMessage::GetStats => "getStats",
        }
    }

    pub fn setting_changed(name: SettingName, value: Value) -> Self {
        let mut update = SettingsUpdate::default();
        update.insert(name, value);
        SurfaceMessage::UpdateSettings(update)
    }

    /// Every effective value, sent after a reset so the page picks up all defaults.
    pub fn settings_snapshot(set: &PreferenceSet) -> Self {
        SurfaceMessage::UpdateSettings(SettingsUpdate(
            set.iter().map(|(name, value)| (name, value.clone())).collect(),
        ))
    }
}

/// Partial settings payload of `updateSettings`, flattened next to `action`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SettingsUpdate(pub BTreeMap<SettingName, Value>);

impl SettingsUpdate {
    pub fn insert(&mut self, name: SettingName, value: Value) {
        self.0.insert(name, value);
    }

    pub fn get(&self, name: SettingName) -> Option<&Value> {
        self.0.get(&name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Apply the update to a live view of the preferences.
    ///
    /// Values of the wrong shape are skipped with a warning. Returns how many
    /// settings were applied.
    pub fn apply_to(&self, prefs: &mut Preferences) -> usize {
        let mut applied = 0;
        for (name, value) in &self.0 {
            if prefs.apply(*name, value) {
                applied += 1;
            } else {
                log::warn!("Ignoring update of '{}' with malformed value {}", name, value);
            }
        }
        applied
    }
}

// =============================================================================
// Automation surface → control surface
// =============================================================================

/// Reply to a message, when the receiver chooses to send one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<CinemaStats>,
}

impl ActionResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            message: None,
            stats: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            stats: None,
        }
    }

    pub fn with_stats(stats: CinemaStats) -> Self {
        Self {
            stats: Some(stats),
            ..Self::ok()
        }
    }
}
