use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

/// Daily history window, in days.
const HISTORY_WINDOW: u64 = 14;

/// Aggregate usage counters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UsageStats {
    pub total_enhanced: u64,
    pub total_bytes_in: u64,
    pub last_used: Option<DateTime<Utc>>,
    /// Consecutive days with at least one enhancement.
    pub streak: u32,
    pub last_streak_date: Option<NaiveDate>,
    /// Per-MIME-type enhancement counts.
    pub formats_used: BTreeMap<String, u64>,
    /// Enhancements per day, pruned to the last `HISTORY_WINDOW` days.
    pub daily_history: BTreeMap<NaiveDate, u64>,
}

impl UsageStats {
    fn record(&mut self, content_type: &str, bytes_in: u64, now: DateTime<Utc>) {
        let today = now.date_naive();

        self.total_enhanced += 1;
        self.total_bytes_in += bytes_in;
        self.last_used = Some(now);
        *self.formats_used.entry(content_type.to_string()).or_default() += 1;
        *self.daily_history.entry(today).or_default() += 1;

        if let Some(cutoff) = today.checked_sub_days(Days::new(HISTORY_WINDOW)) {
            self.daily_history.retain(|day, _| *day >= cutoff);
        }

        let yesterday = today.checked_sub_days(Days::new(1));
        match self.last_streak_date {
            Some(d) if d == today => {}
            Some(d) if Some(d) == yesterday => self.streak += 1,
            _ => self.streak = 1,
        }
        self.last_streak_date = Some(today);
    }
}

/// JSON-file-backed usage statistics, mirroring the gallery store layout.
pub struct StatsStore {
    path: PathBuf,
    stats: Mutex<UsageStats>,
}

impl StatsStore {
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self, StatsError> {
        let path = path.into();
        let stats = match tokio::fs::read(&path).await {
            Ok(raw) => serde_json::from_slice(&raw).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), error = %e, "Discarding corrupt stats file");
                UsageStats::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => UsageStats::default(),
            Err(e) => return Err(StatsError::Io(e)),
        };
        Ok(Self {
            path,
            stats: Mutex::new(stats),
        })
    }

    /// Record one completed enhancement.
    pub async fn record(&self, content_type: &str, bytes_in: u64) -> Result<(), StatsError> {
        let mut stats = self.stats.lock().await;
        stats.record(content_type, bytes_in, Utc::now());
        let raw = serde_json::to_vec_pretty(&*stats)?;
        tokio::fs::write(&self.path, raw).await?;
        Ok(())
    }

    pub async fn snapshot(&self) -> UsageStats {
        self.stats.lock().await.clone()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StatsError {
    #[error("stats file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("stats serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(date: &str) -> DateTime<Utc> {
        let d: NaiveDate = date.parse().unwrap();
        Utc.from_utc_datetime(&d.and_hms_opt(12, 0, 0).unwrap())
    }

    #[test]
    fn record_accumulates_totals_and_formats() {
        let mut stats = UsageStats::default();
        stats.record("image/jpeg", 1000, at("2026-08-30"));
        stats.record("image/png", 500, at("2026-08-30"));
        stats.record("image/jpeg", 2000, at("2026-08-30"));

        assert_eq!(stats.total_enhanced, 3);
        assert_eq!(stats.total_bytes_in, 3500);
        assert_eq!(stats.formats_used["image/jpeg"], 2);
        assert_eq!(stats.formats_used["image/png"], 1);
        assert_eq!(
            stats.daily_history[&"2026-08-30".parse::<NaiveDate>().unwrap()],
            3
        );
    }

    #[test]
    fn streak_grows_on_consecutive_days_and_resets_on_gaps() {
        let mut stats = UsageStats::default();
        stats.record("image/png", 1, at("2026-08-01"));
        assert_eq!(stats.streak, 1);

        stats.record("image/png", 1, at("2026-08-02"));
        assert_eq!(stats.streak, 2);

        // Same day again: unchanged.
        stats.record("image/png", 1, at("2026-08-02"));
        assert_eq!(stats.streak, 2);

        // Two-day gap resets.
        stats.record("image/png", 1, at("2026-08-05"));
        assert_eq!(stats.streak, 1);
    }

    #[test]
    fn daily_history_is_pruned_to_window() {
        let mut stats = UsageStats::default();
        stats.record("image/png", 1, at("2026-08-01"));
        stats.record("image/png", 1, at("2026-08-30"));

        assert!(!stats
            .daily_history
            .contains_key(&"2026-08-01".parse::<NaiveDate>().unwrap()));
        assert!(stats
            .daily_history
            .contains_key(&"2026-08-30".parse::<NaiveDate>().unwrap()));
    }

    #[tokio::test]
    async fn store_persists_across_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats.json");

        {
            let store = StatsStore::load(path.clone()).await.unwrap();
            store.record("image/webp", 4096).await.unwrap();
        }

        let reloaded = StatsStore::load(path).await.unwrap();
        let stats = reloaded.snapshot().await;
        assert_eq!(stats.total_enhanced, 1);
        assert_eq!(stats.total_bytes_in, 4096);
        assert_eq!(stats.formats_used["image/webp"], 1);
    }
}
