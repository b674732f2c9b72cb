// Cinema mode usage statistics
// Stored as one object under `cinemaStats` in the local (non-synced) store

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::backing::{BackingStore, Entries, StoreError};

/// Key of the statistics object in the local store
pub const STATS_KEY: &str = "cinemaStats";

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CinemaStats {
    /// Total cinema mode activations
    pub activations: u64,
    /// Total time spent in cinema mode, in seconds
    pub total_time: u64,
    pub last_activation: Option<DateTime<Utc>>,
    /// Activations on `last_reset_date`
    pub today_activations: u64,
    #[serde(deserialize_with = "lenient_day")]
    pub last_reset_date: Option<NaiveDate>,
}

/// Day formats found in stored statistics: ISO dates, and the
/// `Sun Oct 18 2026` form the extension popup writes.
const DAY_FORMATS: [&str; 2] = ["%Y-%m-%d", "%a %b %d %Y"];

/// An unrecognised day string reads as no day; the next activation then
/// starts a fresh daily count instead of losing the other counters.
fn lenient_day<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<NaiveDate>, D::Error> {
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    let parsed = DAY_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw.trim(), format).ok());
    if parsed.is_none() {
        log::warn!("Ignoring unrecognised lastResetDate '{}'", raw);
    }
    Ok(parsed)
}

impl CinemaStats {
    /// Fresh counters whose daily count starts on `today`.
    pub fn starting(today: NaiveDate) -> Self {
        Self {
            last_reset_date: Some(today),
            ..Self::default()
        }
    }

    /// Start a new daily count if `today` is not the day being counted.
    pub fn roll_over(&mut self, today: NaiveDate) {
        if self.last_reset_date != Some(today) {
            self.today_activations = 0;
            self.last_reset_date = Some(today);
        }
    }

    /// Count one activation. The day boundary follows `now`'s time zone.
    pub fn record_activation<Tz: TimeZone>(&mut self, now: DateTime<Tz>) {
        self.roll_over(now.date_naive());
        self.activations = self.activations.saturating_add(1);
        self.today_activations = self.today_activations.saturating_add(1);
        self.last_activation = Some(now.with_timezone(&Utc));
    }

    pub fn add_watch_time(&mut self, seconds: u64) {
        self.total_time = self.total_time.saturating_add(seconds);
    }

    pub fn summary(&self) -> StatsSummary {
        let total_minutes = self.total_time / 60;
        let average_minutes = if self.activations > 0 {
            self.total_time / self.activations / 60
        } else {
            0
        };
        let info = (self.activations > 0).then(|| {
            format!(
                "You've used cinema mode {} times, watching for {} minutes total.",
                self.activations, total_minutes
            )
        });
        StatsSummary {
            today_activations: self.today_activations,
            activations: self.activations,
            total_minutes,
            average_minutes,
            info,
        }
    }
}

/// Display-ready figures derived from `CinemaStats`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatsSummary {
    pub today_activations: u64,
    pub activations: u64,
    pub total_minutes: u64,
    pub average_minutes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<String>,
}

/// Reads and updates `CinemaStats` in a backing store.
///
/// Like preference reads, `load` never fails: errors and malformed data
/// give zeroed statistics. Updates read through `load_for_update` instead,
/// so a failed or malformed read aborts the update rather than saving zeroed
/// counters over the stored ones.
#[derive(Debug, Clone)]
pub struct StatsStore<B> {
    backing: B,
}

impl<B: BackingStore> StatsStore<B> {
    pub fn new(backing: B) -> Self {
        Self { backing }
    }

    pub async fn load(&self) -> CinemaStats {
        let stored = match self.backing.get(&[STATS_KEY]).await {
            Ok(mut entries) => entries.remove(STATS_KEY),
            Err(e) => {
                log::warn!("Reading statistics failed: {}", e);
                None
            }
        };
        match stored {
            None | Some(Value::Null) => CinemaStats::default(),
            Some(value) => serde_json::from_value(value).unwrap_or_else(|e| {
                log::warn!("Ignoring malformed statistics: {}", e);
                CinemaStats::default()
            }),
        }
    }

    /// Current statistics for a read-modify-write.
    ///
    /// Absence is zeroed statistics; a read error or an undecodable object
    /// is an error.
    pub async fn load_for_update(&self) -> Result<CinemaStats, StoreError> {
        let stored = self.backing.get(&[STATS_KEY]).await?.remove(STATS_KEY);
        match stored {
            None | Some(Value::Null) => Ok(CinemaStats::default()),
            Some(value) => serde_json::from_value(value).map_err(|e| StoreError::Malformed {
                key: STATS_KEY.to_string(),
                reason: e.to_string(),
            }),
        }
    }

    pub async fn save(&self, stats: &CinemaStats) -> Result<(), StoreError> {
        let mut entries = Entries::new();
        entries.insert(STATS_KEY.to_string(), serde_json::to_value(stats)?);
        self.backing.set(entries).await
    }

    /// Count an activation and persist the result.
    pub async fn record_activation<Tz: TimeZone>(
        &self,
        now: DateTime<Tz>,
    ) -> Result<CinemaStats, StoreError> {
        let mut stats = self.load_for_update().await?;
        stats.record_activation(now);
        self.save(&stats).await?;
        Ok(stats)
    }

    pub async fn record_watch_time(&self, seconds: u64) -> Result<CinemaStats, StoreError> {
        let mut stats = self.load_for_update().await?;
        stats.add_watch_time(seconds);
        self.save(&stats).await?;
        Ok(stats)
    }

    /// Zero every counter.
    pub async fn reset(&self, today: NaiveDate) -> Result<CinemaStats, StoreError> {
        let stats = CinemaStats::starting(today);
        self.save(&stats).await?;
        log::debug!("Statistics reset");
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backing::MemoryStore;
    use chrono::FixedOffset;
    use serde_json::json;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn test_empty_store_gives_zeroes() {
        let store = StatsStore::new(MemoryStore::new());
        let stats = smol::block_on(store.load());
        assert_eq!(stats, CinemaStats::default());
        assert_eq!(stats.summary().info, None);
    }

    #[test]
    fn test_activations_roll_over_daily() {
        let store = StatsStore::new(MemoryStore::new());
        smol::block_on(async {
            store.record_activation(at(2026, 3, 1, 9)).await.unwrap();
            let stats = store.record_activation(at(2026, 3, 1, 21)).await.unwrap();
            assert_eq!(stats.activations, 2);
            assert_eq!(stats.today_activations, 2);

            let stats = store.record_activation(at(2026, 3, 2, 8)).await.unwrap();
            assert_eq!(stats.activations, 3);
            assert_eq!(stats.today_activations, 1);
            assert_eq!(stats.last_reset_date, Some(day(2026, 3, 2)));
            assert_eq!(stats.last_activation, Some(at(2026, 3, 2, 8)));
        });
    }

    #[test]
    fn test_day_boundary_follows_callers_zone() {
        let mut stats = CinemaStats::default();
        let tokyo = FixedOffset::east_opt(9 * 3600).unwrap();
        // 20:00 UTC on the 1st is already the 2nd in Tokyo
        stats.record_activation(at(2026, 3, 1, 20).with_timezone(&tokyo));
        assert_eq!(stats.last_reset_date, Some(day(2026, 3, 2)));
        assert_eq!(stats.last_activation, Some(at(2026, 3, 1, 20)));
    }

    #[test]
    fn test_summary_math() {
        let stats = CinemaStats {
            activations: 4,
            total_time: 1500,
            today_activations: 1,
            ..CinemaStats::default()
        };
        let summary = stats.summary();
        assert_eq!(summary.total_minutes, 25);
        // 1500s / 4 = 375s = 6 whole minutes
        assert_eq!(summary.average_minutes, 6);
        assert_eq!(
            summary.info.as_deref(),
            Some("You've used cinema mode 4 times, watching for 25 minutes total.")
        );
    }

    #[test]
    fn test_watch_time_and_reset() {
        let store = StatsStore::new(MemoryStore::new());
        smol::block_on(async {
            store.record_activation(at(2026, 3, 1, 9)).await.unwrap();
            let stats = store.record_watch_time(600).await.unwrap();
            assert_eq!(stats.total_time, 600);
            assert_eq!(stats.activations, 1);

            let stats = store.reset(day(2026, 3, 5)).await.unwrap();
            assert_eq!(stats, CinemaStats::starting(day(2026, 3, 5)));
            assert_eq!(store.load().await, stats);
        });
    }

    #[test]
    fn test_wire_shape() {
        let store = StatsStore::new(MemoryStore::new());
        smol::block_on(store.record_activation(at(2026, 3, 1, 9))).unwrap();
        let raw = smol::block_on(store.backing.get(&[STATS_KEY])).unwrap();
        assert_eq!(
            raw[STATS_KEY],
            json!({
                "activations": 1,
                "totalTime": 0,
                "lastActivation": "2026-03-01T09:00:00Z",
                "todayActivations": 1,
                "lastResetDate": "2026-03-01"
            })
        );
    }

    #[test]
    fn test_malformed_or_unreachable_stats_load_as_default() {
        let store = StatsStore::new(MemoryStore::with_entries([(STATS_KEY, json!("garbage"))]));
        assert_eq!(smol::block_on(store.load()), CinemaStats::default());

        let partial = StatsStore::new(MemoryStore::with_entries([(
            STATS_KEY,
            json!({"activations": 7}),
        )]));
        assert_eq!(smol::block_on(partial.load()).activations, 7);

        let down = MemoryStore::new();
        down.fail_with("offline");
        let store = StatsStore::new(down);
        assert_eq!(smol::block_on(store.load()), CinemaStats::default());
        assert!(smol::block_on(store.reset(day(2026, 1, 1))).is_err());
    }

    #[test]
    fn test_popup_day_format_keeps_counters() {
        let store = StatsStore::new(MemoryStore::with_entries([(
            STATS_KEY,
            json!({
                "activations": 7,
                "totalTime": 3600,
                "lastActivation": null,
                "todayActivations": 2,
                "lastResetDate": "Sun Mar 01 2026"
            }),
        )]));
        smol::block_on(async {
            let loaded = store.load().await;
            assert_eq!(loaded.last_reset_date, Some(day(2026, 3, 1)));

            let stats = store.record_activation(at(2026, 3, 1, 12)).await.unwrap();
            assert_eq!(stats.activations, 8);
            assert_eq!(stats.total_time, 3600);
            assert_eq!(stats.today_activations, 3);
        });
    }

    #[test]
    fn test_unknown_day_string_restarts_daily_count_only() {
        let store = StatsStore::new(MemoryStore::with_entries([(
            STATS_KEY,
            json!({"activations": 7, "totalTime": 3600, "todayActivations": 2, "lastResetDate": "yesterday"}),
        )]));
        let stats = smol::block_on(store.record_activation(at(2026, 3, 1, 12))).unwrap();
        assert_eq!(stats.activations, 8);
        assert_eq!(stats.total_time, 3600);
        assert_eq!(stats.today_activations, 1);
        assert_eq!(stats.last_reset_date, Some(day(2026, 3, 1)));
    }

    #[test]
    fn test_updates_never_overwrite_unreadable_stats() {
        let stored = json!({"activations": "seven", "totalTime": 3600});
        let store = StatsStore::new(MemoryStore::with_entries([(STATS_KEY, stored.clone())]));
        smol::block_on(async {
            let err = store.record_activation(at(2026, 3, 1, 12)).await.unwrap_err();
            assert!(matches!(err, StoreError::Malformed { .. }));
            assert!(store.record_watch_time(60).await.is_err());
        });
        assert_eq!(store.backing.raw(STATS_KEY), Some(stored));

        let down = MemoryStore::with_entries([(STATS_KEY, json!({"activations": 7}))]);
        down.fail_with("offline");
        let store = StatsStore::new(down);
        assert!(smol::block_on(store.record_activation(at(2026, 3, 1, 12))).is_err());
        store.backing.restore();
        assert_eq!(smol::block_on(store.load()).activations, 7);
    }
}
