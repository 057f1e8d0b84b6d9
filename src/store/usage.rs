//! Free-tier usage records.

use std::path::PathBuf;

use chrono::{Local, NaiveDateTime, TimeDelta};
use serde::Serialize;
use serde_json::Value;
use teloxide::types::UserId;
use tracing::debug;

use super::{FlatStore, StoreError, user_key};
use crate::config::MAX_FREE_COOLDOWN_HOURS;

/// Date-time format of a last-use record.
pub const LAST_USE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Status of a single usage record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageStatus {
    /// Still inside the cooldown; holds the moment free use reopens.
    CoolingDown(NaiveDateTime),
    /// Cooldown elapsed.
    Available(NaiveDateTime),
    /// The value is not a timestamp. Treated as never used.
    Malformed,
}

impl UsageStatus {
    /// Classifies a raw record against `now`.
    #[must_use]
    pub fn classify(value: &Value, now: NaiveDateTime, cooldown: TimeDelta) -> Self {
        let Some(last) = parse_last_use(value) else {
            return Self::Malformed;
        };
        // A window reaching past the calendar never reopens.
        let reopens = last
            .checked_add_signed(cooldown)
            .unwrap_or(NaiveDateTime::MAX);
        if now < reopens {
            Self::CoolingDown(reopens)
        } else {
            Self::Available(last)
        }
    }

    /// Whether this record permits a free use.
    #[must_use]
    pub const fn allows_use(self) -> bool {
        !matches!(self, Self::CoolingDown(_))
    }
}

fn parse_last_use(value: &Value) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value.as_str()?, LAST_USE_FORMAT).ok()
}

/// Per-user timestamp of the last free-tier delivery.
#[derive(Debug)]
pub struct UsageTracker {
    store: FlatStore,
    cooldown: TimeDelta,
}

impl UsageTracker {
    /// Creates a tracker backed by the given file with the given cooldown.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, cooldown: TimeDelta) -> Self {
        Self {
            store: FlatStore::new(path),
            cooldown,
        }
    }

    /// Creates a tracker with a cooldown expressed in hours.
    ///
    /// The count is clamped to `1..=MAX_FREE_COOLDOWN_HOURS`.
    #[must_use]
    pub fn with_hours(path: impl Into<PathBuf>, hours: i64) -> Self {
        let hours = hours.clamp(1, MAX_FREE_COOLDOWN_HOURS);
        Self::new(path, TimeDelta::try_hours(hours).unwrap_or(TimeDelta::MAX))
    }

    /// Returns the cooldown window.
    #[must_use]
    pub const fn cooldown(&self) -> TimeDelta {
        self.cooldown
    }

    /// Checks whether the user may use the free tier now (local clock).
    pub async fn can_use_free(&self, user: UserId) -> bool {
        self.can_use_free_at(user, Local::now().naive_local()).await
    }

    /// Checks whether the user may use the free tier at `now`.
    ///
    /// No record, or an unparsable one, always permits use.
    pub async fn can_use_free_at(&self, user: UserId, now: NaiveDateTime) -> bool {
        let Some(value) = self.store.get(&user_key(user)).await else {
            return true;
        };
        let status = UsageStatus::classify(&value, now, self.cooldown);
        if status == UsageStatus::Malformed {
            debug!("Ignoring malformed usage record for user {}", user.0);
        }
        status.allows_use()
    }

    /// Records a free-tier use now (local clock).
    pub async fn record_use(&self, user: UserId) {
        self.record_use_at(user, Local::now().naive_local()).await;
    }

    /// Records a free-tier use at `now`, replacing any previous record.
    pub async fn record_use_at(&self, user: UserId, now: NaiveDateTime) {
        let value = Value::String(now.format(LAST_USE_FORMAT).to_string());
        self.store
            .update(|map| map.insert(user_key(user), value))
            .await;
        debug!("Recorded free use for user {} at {}", user.0, now);
    }

    /// Lists every record with its status at `now`.
    pub async fn records_at(&self, now: NaiveDateTime) -> Result<Vec<(String, UsageStatus)>, StoreError> {
        Ok(self
            .store
            .try_load()
            .await?
            .iter()
            .map(|(key, value)| (key.clone(), UsageStatus::classify(value, now, self.cooldown)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    const USER: UserId = UserId(77);

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 6, 1)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    fn tracker_in(dir: &tempfile::TempDir) -> UsageTracker {
        UsageTracker::with_hours(dir.path().join("usage_tracker.json"), 24)
    }

    #[tokio::test]
    async fn test_never_used_is_allowed() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = tracker_in(&dir);

        assert!(tracker.can_use_free(USER).await);
        assert!(tracker.can_use_free_at(USER, at(0, 0, 0)).await);
    }

    #[tokio::test]
    async fn test_cooldown_boundary() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = tracker_in(&dir);
        let used = at(10, 30, 0);
        tracker.record_use_at(USER, used).await;

        assert!(!tracker.can_use_free_at(USER, used).await);
        assert!(!tracker.can_use_free_at(USER, used + TimeDelta::minutes(1)).await);
        assert!(
            !tracker
                .can_use_free_at(USER, used + TimeDelta::hours(24) - TimeDelta::seconds(1))
                .await
        );
        assert!(tracker.can_use_free_at(USER, used + TimeDelta::hours(24)).await);
        assert!(tracker.can_use_free_at(USER, used + TimeDelta::days(3)).await);
    }

    #[tokio::test]
    async fn test_record_use_now_blocks_immediately() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = tracker_in(&dir);

        tracker.record_use(USER).await;

        assert!(!tracker.can_use_free(USER).await);
        assert!(tracker.can_use_free(UserId(78)).await);
    }

    #[tokio::test]
    async fn test_record_format_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = tracker_in(&dir);

        tracker.record_use_at(USER, at(8, 5, 9)).await;

        let raw = std::fs::read_to_string(dir.path().join("usage_tracker.json")).unwrap();
        assert_eq!(raw, r#"{"77":"2026-06-01 08:05:09"}"#);
    }

    #[tokio::test]
    async fn test_unparsable_timestamp_is_allowed() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("usage_tracker.json"),
            r#"{"77":"yesterday-ish","78":null}"#,
        )
        .unwrap();
        let tracker = tracker_in(&dir);

        assert!(tracker.can_use_free_at(USER, at(12, 0, 0)).await);
        assert!(tracker.can_use_free_at(UserId(78), at(12, 0, 0)).await);
    }

    #[tokio::test]
    async fn test_custom_cooldown() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = UsageTracker::with_hours(dir.path().join("usage.json"), 1);
        tracker.record_use_at(USER, at(9, 0, 0)).await;

        assert_eq!(tracker.cooldown(), TimeDelta::hours(1));
        assert!(!tracker.can_use_free_at(USER, at(9, 59, 59)).await);
        assert!(tracker.can_use_free_at(USER, at(10, 0, 0)).await);
    }

    #[tokio::test]
    async fn test_huge_cooldown_keeps_blocking() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = UsageTracker::with_hours(dir.path().join("usage.json"), 10_000_000_000);
        let used = at(9, 0, 0);
        tracker.record_use_at(USER, used).await;

        assert_eq!(tracker.cooldown(), TimeDelta::hours(MAX_FREE_COOLDOWN_HOURS));
        assert!(!tracker.can_use_free_at(USER, used + TimeDelta::minutes(1)).await);
        assert!(!tracker.can_use_free_at(USER, used + TimeDelta::days(365)).await);
    }

    #[test]
    fn test_overflowing_window_never_reopens() {
        let value = Value::String("2026-06-01 09:00:00".to_owned());
        let status = UsageStatus::classify(&value, at(9, 1, 0), TimeDelta::MAX);

        assert_eq!(status, UsageStatus::CoolingDown(NaiveDateTime::MAX));
        assert!(!status.allows_use());
    }

    #[tokio::test]
    async fn test_non_positive_hours_clamp_to_one() {
        let dir = tempfile::tempdir().unwrap();

        for hours in [0, -5] {
            let tracker = UsageTracker::with_hours(dir.path().join("usage.json"), hours);
            assert_eq!(tracker.cooldown(), TimeDelta::hours(1));
        }
    }

    #[tokio::test]
    async fn test_records_classify_each_entry() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("usage_tracker.json"),
            r#"{"1":"2026-06-01 11:00:00","2":"2026-05-30 11:00:00","3":7}"#,
        )
        .unwrap();
        let tracker = tracker_in(&dir);

        let records = tracker.records_at(at(12, 0, 0)).await.unwrap();

        assert_eq!(
            records,
            vec![
                (
                    "1".to_owned(),
                    UsageStatus::CoolingDown(
                        NaiveDate::from_ymd_opt(2026, 6, 2)
                            .unwrap()
                            .and_hms_opt(11, 0, 0)
                            .unwrap()
                    )
                ),
                (
                    "2".to_owned(),
                    UsageStatus::Available(
                        NaiveDate::from_ymd_opt(2026, 5, 30)
                            .unwrap()
                            .and_hms_opt(11, 0, 0)
                            .unwrap()
                    )
                ),
                ("3".to_owned(), UsageStatus::Malformed),
            ]
        );
    }
}
