// CLI configuration
// Loaded from ~/.config/cinetube/cli.toml
//
// Precedence for each store path: --flag, then environment variable (clap
// merges both into the flag), then this file, then the built-in default.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use cinetube_config::JsonFileStore;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CliConfig {
    /// Synced preferences file
    pub store: Option<PathBuf>,
    /// Local data file (statistics)
    pub local_store: Option<PathBuf>,
}

impl CliConfig {
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("cinetube").join("cli.toml"))
    }

    pub fn parse(input: &str) -> Result<Self, String> {
        toml::from_str(input).map_err(|e| e.to_string())
    }

    /// Load the config file, falling back to defaults.
    ///
    /// A missing file is normal. An unreadable or invalid one is logged and
    /// ignored so a broken config never locks the user out of their settings.
    pub fn load() -> Self {
        match Self::path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    pub fn load_from(path: &Path) -> Self {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Self::default(),
            Err(e) => {
                log::warn!("Cannot read {}: {}", path.display(), e);
                return Self::default();
            }
        };
        Self::parse(&contents).unwrap_or_else(|e| {
            log::warn!("Ignoring invalid {}: {}", path.display(), e);
            Self::default()
        })
    }
}

/// Where the two backing stores live for this run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorePaths {
    pub sync: PathBuf,
    pub local: PathBuf,
}

impl StorePaths {
    pub fn resolve(
        store: Option<PathBuf>,
        local_store: Option<PathBuf>,
        config: &CliConfig,
    ) -> Result<Self, String> {
        let sync = store
            .or_else(|| config.store.clone())
            .or_else(JsonFileStore::default_sync_path)
            .ok_or("no config directory; pass --store")?;
        let local = local_store
            .or_else(|| config.local_store.clone())
            .or_else(JsonFileStore::default_local_path)
            .ok_or("no config directory; pass --local-store")?;
        Ok(Self { sync, local })
    }
}
