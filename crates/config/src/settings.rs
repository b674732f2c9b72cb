// Preference schema
// Every known setting, its wire name, the kind of value it holds and its default

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Errors raised when text from outside the store is turned into a setting or value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("unknown setting '{0}'")]
    UnknownSetting(String),
    #[error("{setting}: expected true or false, got '{input}'")]
    NotABool { setting: SettingName, input: String },
    #[error("{setting}: expected a whole number between 0 and 100, got '{input}'")]
    NotAPercent { setting: SettingName, input: String },
    #[error("{setting}: '{input}' is not one of {allowed}")]
    NotAChoice {
        setting: SettingName,
        input: String,
        allowed: String,
    },
}

/// Name of a known setting.
///
/// The serialized form is the camelCase key used in the backing store, so a
/// stored object and a `BTreeMap<SettingName, _>` share one representation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum SettingName {
    CinemaAutoEnabled,
    Opacity,
    VideoSize,
    Theme,
    GlowIntensity,
    AmbientMode,
    KeyboardShortcuts,
    FadeAnimation,
    RememberPerChannel,
    AutoPauseOnExit,
}

impl SettingName {
    pub const COUNT: usize = 10;

    /// Every setting, in schema order.
    pub const ALL: [SettingName; Self::COUNT] = [
        SettingName::CinemaAutoEnabled,
        SettingName::Opacity,
        SettingName::VideoSize,
        SettingName::Theme,
        SettingName::GlowIntensity,
        SettingName::AmbientMode,
        SettingName::KeyboardShortcuts,
        SettingName::FadeAnimation,
        SettingName::RememberPerChannel,
        SettingName::AutoPauseOnExit,
    ];

    /// Key under which the setting lives in the backing store.
    pub fn as_str(self) -> &'static str {
        match self {
            SettingName::CinemaAutoEnabled => "cinemaAutoEnabled",
            SettingName::Opacity => "opacity",
            SettingName::VideoSize => "videoSize",
            SettingName::Theme => "theme",
            SettingName::GlowIntensity => "glowIntensity",
            SettingName::AmbientMode => "ambientMode",
            SettingName::KeyboardShortcuts => "keyboardShortcuts",
            SettingName::FadeAnimation => "fadeAnimation",
            SettingName::RememberPerChannel => "rememberPerChannel",
            SettingName::AutoPauseOnExit => "autoPauseOnExit",
        }
    }

    /// Position in `ALL`.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn kind(self) -> SettingKind {
        match self {
            SettingName::Opacity => SettingKind::Percent,
            SettingName::VideoSize => SettingKind::Choice(VideoSize::NAMES),
            SettingName::Theme => SettingKind::Choice(Theme::NAMES),
            SettingName::GlowIntensity => SettingKind::Choice(GlowIntensity::NAMES),
            SettingName::CinemaAutoEnabled
            | SettingName::AmbientMode
            | SettingName::KeyboardShortcuts
            | SettingName::FadeAnimation
            | SettingName::RememberPerChannel
            | SettingName::AutoPauseOnExit => SettingKind::Bool,
        }
    }

    /// The static default, as it would be stored.
    pub fn default_value(self) -> Value {
        Preferences::default().value(self)
    }

    /// Parse user input (CLI argument, form field) into a storable value.
    pub fn parse_input(self, input: &str) -> Result<Value, SchemaError> {
        self.kind().parse_input(self, input)
    }
}

impl fmt::Display for SettingName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SettingName {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SettingName::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| SchemaError::UnknownSetting(s.to_string()))
    }
}

/// Shape of the values a setting accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingKind {
    Bool,
    /// Integer in 0..=100
    Percent,
    /// One of a fixed set of lowercase names
    Choice(&'static [&'static str]),
}

impl SettingKind {
    /// Turns input text into a value of this kind.
    ///
    /// Percentages are clamped into range rather than rejected, the way a
    /// slider would clamp them. Choice names are matched case-insensitively.
    pub fn parse_input(self, setting: SettingName, input: &str) -> Result<Value, SchemaError> {
        let trimmed = input.trim();
        match self {
            SettingKind::Bool => match trimmed.to_ascii_lowercase().as_str() {
                "true" | "on" | "yes" | "1" => Ok(Value::Bool(true)),
                "false" | "off" | "no" | "0" => Ok(Value::Bool(false)),
                _ => Err(SchemaError::NotABool {
                    setting,
                    input: input.to_string(),
                }),
            },
            SettingKind::Percent => trimmed
                .trim_end_matches('%')
                .parse::<i64>()
                .map(|n| Value::from(n.clamp(0, 100)))
                .map_err(|_| SchemaError::NotAPercent {
                    setting,
                    input: input.to_string(),
                }),
            SettingKind::Choice(names) => {
                let lowered = trimmed.to_ascii_lowercase();
                names
                    .iter()
                    .find(|name| **name == lowered)
                    .map(|name| Value::from(*name))
                    .ok_or_else(|| SchemaError::NotAChoice {
                        setting,
                        input: input.to_string(),
                        allowed: names.join(", "),
                    })
            }
        }
    }

    /// Whether a stored value has the right shape for this kind.
    pub fn matches(self, value: &Value) -> bool {
        match self {
            SettingKind::Bool => value.is_boolean(),
            SettingKind::Percent => value.as_u64().is_some_and(|n| n <= 100),
            SettingKind::Choice(names) => value.as_str().is_some_and(|s| names.contains(&s)),
        }
    }
}

// ============================================================================
// Enumerated values
// ============================================================================

/// Player size while cinema mode is active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoSize {
    Small,
    Medium,
    #[default]
    Large,
    Full,
}

impl VideoSize {
    pub const NAMES: &'static [&'static str] = &["small", "medium", "large", "full"];

    pub fn as_str(self) -> &'static str {
        match self {
            VideoSize::Small => "small",
            VideoSize::Medium => "medium",
            VideoSize::Large => "large",
            VideoSize::Full => "full",
        }
    }
}

/// Overlay color theme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Classic,
    Dark,
    Neon,
    Minimal,
}

impl Theme {
    pub const NAMES: &'static [&'static str] = &["classic", "dark", "neon", "minimal"];

    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Classic => "classic",
            Theme::Dark => "dark",
            Theme::Neon => "neon",
            Theme::Minimal => "minimal",
        }
    }
}

/// Strength of the glow drawn around the player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GlowIntensity {
    Low,
    #[default]
    Medium,
    High,
}

impl GlowIntensity {
    pub const NAMES: &'static [&'static str] = &["low", "medium", "high"];

    pub fn as_str(self) -> &'static str {
        match self {
            GlowIntensity::Low => "low",
            GlowIntensity::Medium => "medium",
            GlowIntensity::High => "high",
        }
    }
}

// ============================================================================
// Typed preferences
// ============================================================================

/// Strongly-typed view of every setting.
///
/// `Preferences::default()` is the defaults table; `SettingName::default_value`
/// reads from it, so each default is written down exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Preferences {
    /// Enter cinema mode automatically when a video opens
    pub cinema_auto_enabled: bool,
    /// Backdrop opacity, 0-100
    pub opacity: u8,
    pub video_size: VideoSize,
    pub theme: Theme,
    pub glow_intensity: GlowIntensity,
    pub ambient_mode: bool,
    pub keyboard_shortcuts: bool,
    pub fade_animation: bool,
    pub remember_per_channel: bool,
    /// Pause playback when leaving cinema mode
    pub auto_pause_on_exit: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            cinema_auto_enabled: true,
            opacity: 95,
            video_size: VideoSize::Large,
            theme: Theme::Classic,
            glow_intensity: GlowIntensity::Medium,
            ambient_mode: false,
            keyboard_shortcuts: true,
            fade_animation: true,
            remember_per_channel: false,
            auto_pause_on_exit: false,
        }
    }
}

impl Preferences {
    /// The value of one setting, in stored form.
    pub fn value(&self, name: SettingName) -> Value {
        match name {
            SettingName::CinemaAutoEnabled => Value::Bool(self.cinema_auto_enabled),
            SettingName::Opacity => Value::from(self.opacity),
            SettingName::VideoSize => Value::from(self.video_size.as_str()),
            SettingName::Theme => Value::from(self.theme.as_str()),
            SettingName::GlowIntensity => Value::from(self.glow_intensity.as_str()),
            SettingName::AmbientMode => Value::Bool(self.ambient_mode),
            SettingName::KeyboardShortcuts => Value::Bool(self.keyboard_shortcuts),
            SettingName::FadeAnimation => Value::Bool(self.fade_animation),
            SettingName::RememberPerChannel => Value::Bool(self.remember_per_channel),
            SettingName::AutoPauseOnExit => Value::Bool(self.auto_pause_on_exit),
        }
    }

    /// Overwrite one field from a stored value.
    ///
    /// Returns false and leaves the field untouched when the value has the
    /// wrong shape for the setting.
    pub fn apply(&mut self, name: SettingName, value: &Value) -> bool {
        if !name.kind().matches(value) {
            return false;
        }
        match name {
            SettingName::CinemaAutoEnabled => assign_bool(&mut self.cinema_auto_enabled, value),
            SettingName::Opacity => match value.as_u64().and_then(|n| u8::try_from(n).ok()) {
                Some(n) => {
                    self.opacity = n;
                    true
                }
                None => false,
            },
            SettingName::VideoSize => assign_enum(&mut self.video_size, value),
            SettingName::Theme => assign_enum(&mut self.theme, value),
            SettingName::GlowIntensity => assign_enum(&mut self.glow_intensity, value),
            SettingName::AmbientMode => assign_bool(&mut self.ambient_mode, value),
            SettingName::KeyboardShortcuts => assign_bool(&mut self.keyboard_shortcuts, value),
            SettingName::FadeAnimation => assign_bool(&mut self.fade_animation, value),
            SettingName::RememberPerChannel => assign_bool(&mut self.remember_per_channel, value),
            SettingName::AutoPauseOnExit => assign_bool(&mut self.auto_pause_on_exit, value),
        }
    }
}

fn assign_bool(field: &mut bool, value: &Value) -> bool {
    match value.as_bool() {
        Some(b) => {
            *field = b;
            true
        }
        None => false,
    }
}

fn assign_enum<T: serde::de::DeserializeOwned>(field: &mut T, value: &Value) -> bool {
    match T::deserialize(value) {
        Ok(v) => {
            *field = v;
            true
        }
        Err(_) => false,
    }
}
