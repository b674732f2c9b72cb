//! Default-aware preference store
//!
//! `PreferenceStore` is a stateless wrapper over a [`BackingStore`]. Every
//! read goes to the backing store and substitutes the static default for any
//! setting that has no stored value; nothing is cached in memory, so several
//! surfaces can each hold their own instance over the same backing store.
//!
//! Reads never fail: a backing-store error is logged and the defaults are
//! returned. Writes report errors to the caller and are never retried here.

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;

use crate::backing::{BackingStore, Entries, StoreError};
use crate::settings::{Preferences, SettingName};

/// Effective value of every known setting.
#[derive(Debug, Clone, PartialEq)]
pub struct PreferenceSet {
    values: [Value; SettingName::COUNT],
}

impl PreferenceSet {
    /// The defaults table.
    pub fn defaults() -> Self {
        Self {
            values: std::array::from_fn(|i| SettingName::ALL[i].default_value()),
        }
    }

    /// Merge raw stored entries over the defaults.
    ///
    /// Keys that are not known settings are ignored, and a JSON `null` counts
    /// as "not stored".
    pub fn from_stored(stored: &Entries) -> Self {
        Self {
            values: std::array::from_fn(|i| {
                let name = SettingName::ALL[i];
                stored_value(stored, name).unwrap_or_else(|| name.default_value())
            }),
        }
    }

    pub fn get(&self, name: SettingName) -> &Value {
        &self.values[name.index()]
    }

    /// Settings in schema order.
    pub fn iter(&self) -> impl Iterator<Item = (SettingName, &Value)> {
        SettingName::ALL.into_iter().zip(self.values.iter())
    }

    /// Settings whose effective value differs from the default.
    pub fn changed(&self) -> impl Iterator<Item = (SettingName, &Value)> {
        self.iter().filter(|(name, value)| **value != name.default_value())
    }

    pub fn to_json(&self) -> Value {
        Value::Object(
            self.iter()
                .map(|(name, value)| (name.as_str().to_string(), value.clone()))
                .collect(),
        )
    }

    /// Typed view. Stored values of the wrong shape fall back to the default.
    pub fn typed(&self) -> Preferences {
        let mut prefs = Preferences::default();
        for (name, value) in self.iter() {
            if !prefs.apply(name, value) {
                log::warn!("Ignoring malformed stored value for '{}': {}", name, value);
            }
        }
        prefs
    }
}

impl Serialize for PreferenceSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(SettingName::COUNT))?;
        for (name, value) in self.iter() {
            map.serialize_entry(name.as_str(), value)?;
        }
        map.end()
    }
}

fn stored_value(stored: &Entries, name: SettingName) -> Option<Value> {
    stored
        .get(name.as_str())
        .filter(|value| !value.is_null())
        .cloned()
}

/// Typed, default-aware access to the known settings.
#[derive(Debug, Clone)]
pub struct PreferenceStore<B> {
    backing: B,
}

impl<B: BackingStore> PreferenceStore<B> {
    pub fn new(backing: B) -> Self {
        Self { backing }
    }

    pub fn backing(&self) -> &B {
        &self.backing
    }

    /// Effective value of one setting: the stored value, or its default.
    pub async fn get(&self, name: SettingName) -> Value {
        match self.backing.get(&[name.as_str()]).await {
            Ok(stored) => stored_value(&stored, name).unwrap_or_else(|| name.default_value()),
            Err(e) => {
                log::warn!("Reading '{}' failed, using default: {}", name, e);
                name.default_value()
            }
        }
    }

    /// Effective values of every setting, fetched in one batch.
    pub async fn get_all(&self) -> PreferenceSet {
        let names = SettingName::ALL.map(SettingName::as_str);
        match self.backing.get(&names).await {
            Ok(stored) => PreferenceSet::from_stored(&stored),
            Err(e) => {
                log::warn!("Reading preferences failed, using defaults: {}", e);
                PreferenceSet::defaults()
            }
        }
    }

    /// Store one setting. The value is not validated.
    pub async fn set(&self, name: SettingName, value: impl Into<Value>) -> Result<(), StoreError> {
        self.set_multiple([(name, value.into())]).await
    }

    /// Store several settings in one backing-store call.
    ///
    /// This is not atomic. If the backing store fails partway through, some
    /// settings may already hold their new value and a concurrent reader may
    /// observe the partial batch. Values are not validated.
    pub async fn set_multiple<I>(&self, values: I) -> Result<(), StoreError>
    where
        I: IntoIterator<Item = (SettingName, Value)>,
    {
        let entries: Entries = values
            .into_iter()
            .map(|(name, value)| (name.as_str().to_string(), value))
            .collect();
        if entries.is_empty() {
            return Ok(());
        }

        let count = entries.len();
        self.backing.set(entries).await?;
        log::debug!("Stored {} preference(s)", count);
        Ok(())
    }

    /// Overwrite every setting with its default, in one batch.
    pub async fn reset(&self) -> Result<(), StoreError> {
        self.set_multiple(SettingName::ALL.map(|name| (name, name.default_value())))
            .await
    }
}
