// Preference storage shared by every CineTube surface

pub mod backing;
pub mod file_store;
pub mod settings;
pub mod stats;
pub mod store;

pub use backing::{BackingStore, Entries, MemoryStore, StoreError};
pub use file_store::JsonFileStore;
pub use settings::{
    GlowIntensity, Preferences, SchemaError, SettingKind, SettingName, Theme, VideoSize,
};
pub use stats::{CinemaStats, StatsStore, StatsSummary, STATS_KEY};
pub use store::{PreferenceSet, PreferenceStore};
