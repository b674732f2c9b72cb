// JSON file backing store
// Synced preferences: ~/.config/cinetube/preferences.json
// Local data (statistics): ~/.config/cinetube/local.json

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use crate::backing::{BackingStore, Entries, StoreError};

/// Backing store persisted as a single JSON object on disk.
///
/// File IO runs on the blocking pool via `smol::unblock`. Writes from one
/// process are serialized; writers in different processes are last-write-wins
/// for the whole file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Default location of the synced preferences file
    pub fn default_sync_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("cinetube").join("preferences.json"))
    }

    /// Default location of the local (per-machine) data file
    pub fn default_local_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("cinetube").join("local.json"))
    }
}

#[async_trait]
impl BackingStore for JsonFileStore {
    async fn get(&self, names: &[&str]) -> Result<Entries, StoreError> {
        let path = self.path.clone();
        let names: Vec<String> = names.iter().map(|n| n.to_string()).collect();
        smol::unblock(move || {
            let mut all = read_entries(&path)?;
            Ok(names
                .into_iter()
                .filter_map(|name| all.remove(&name).map(|value| (name, value)))
                .collect())
        })
        .await
    }

    async fn set(&self, entries: Entries) -> Result<(), StoreError> {
        let path = self.path.clone();
        let write_lock = Arc::clone(&self.write_lock);
        smol::unblock(move || {
            let _guard = write_lock.lock();
            let mut current = match read_entries(&path) {
                Ok(current) => current,
                Err(StoreError::Corrupt { reason, .. }) => {
                    // Unreadable contents are replaced so a reset can recover the file
                    log::warn!("Overwriting corrupt store {}: {}", path.display(), reason);
                    Entries::new()
                }
                Err(e) => return Err(e),
            };
            current.extend(entries);
            write_entries(&path, &current)
        })
        .await
    }
}

/// Read the whole store. A missing or empty file is an empty store.
fn read_entries(path: &Path) -> Result<Entries, StoreError> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Entries::new()),
        Err(e) => return Err(e.into()),
    };
    if contents.trim().is_empty() {
        return Ok(Entries::new());
    }

    match serde_json::from_str::<Value>(&contents) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(StoreError::Corrupt {
            path: path.to_path_buf(),
            reason: "top-level value is not an object".to_string(),
        }),
        Err(e) => Err(StoreError::Corrupt {
            path: path.to_path_buf(),
            reason: e.to_string(),
        }),
    }
}

/// Write the whole store (atomic: temp file then rename).
fn write_entries(path: &Path, entries: &Entries) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let json = serde_json::to_string_pretty(entries)?;
    let temp = path.with_extension("json.tmp");
    fs::write(&temp, json)?;
    fs::rename(&temp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn entries(pairs: &[(&str, Value)]) -> Entries {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("nothing-here.json"));
        let got = smol::block_on(store.get(&["opacity"])).unwrap();
        assert!(got.is_empty());
    }

    #[test]
    fn test_persists_across_instances() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("preferences.json");

        let first = JsonFileStore::new(&path);
        smol::block_on(first.set(entries(&[("opacity", json!(40)), ("theme", json!("dark"))])))
            .unwrap();
        smol::block_on(first.set(entries(&[("opacity", json!(60))]))).unwrap();

        // A fresh instance stands in for a restarted process
        let second = JsonFileStore::new(&path);
        let got = smol::block_on(second.get(&["opacity", "theme"])).unwrap();
        assert_eq!(got["opacity"], json!(60));
        assert_eq!(got["theme"], json!("dark"));
        assert!(!path.with_extension("json.tmp").exists(), "temp file should be renamed away");
    }

    #[test]
    fn test_unknown_keys_survive_writes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("preferences.json");
        fs::write(&path, r#"{"legacyKey": [1, 2, 3]}"#).unwrap();

        let store = JsonFileStore::new(&path);
        smol::block_on(store.set(entries(&[("ambientMode", json!(true))]))).unwrap();

        let on_disk: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(on_disk["legacyKey"], json!([1, 2, 3]));
        assert_eq!(on_disk["ambientMode"], json!(true));
    }

    #[test]
    fn test_corrupt_file_errors_on_read_and_is_replaced_on_write() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("preferences.json");
        fs::write(&path, "{ not json").unwrap();

        let store = JsonFileStore::new(&path);
        let read = smol::block_on(store.get(&["opacity"]));
        assert!(matches!(read, Err(StoreError::Corrupt { .. })));

        smol::block_on(store.set(entries(&[("opacity", json!(5))]))).unwrap();
        let got = smol::block_on(store.get(&["opacity"])).unwrap();
        assert_eq!(got["opacity"], json!(5));
    }

    #[test]
    fn test_non_object_file_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("preferences.json");
        fs::write(&path, "[true]").unwrap();

        let err = smol::block_on(JsonFileStore::new(&path).get(&["opacity"])).unwrap_err();
        assert!(err.to_string().contains("not an object"), "{}", err);
    }
}
