//! Premium entitlement records.

use std::path::PathBuf;

use chrono::{Local, NaiveDate, NaiveDateTime, TimeDelta};
use serde::Serialize;
use serde_json::Value;
use teloxide::types::UserId;
use tracing::{debug, info};

use super::{FlatStore, StoreError, user_key};

/// Date format of an expiry record.
pub const EXPIRY_FORMAT: &str = "%Y-%m-%d";

/// Status of a single entitlement record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PremiumStatus {
    /// Expiry date is today or later.
    Active(NaiveDate),
    /// Expiry date has passed. The record stays on disk.
    Expired(NaiveDate),
    /// The value is not a date.
    Malformed,
}

impl PremiumStatus {
    /// Classifies a raw record against `today`.
    #[must_use]
    pub fn classify(value: &Value, today: NaiveDate) -> Self {
        match parse_expiry(value) {
            Some(expiry) if expiry >= today => Self::Active(expiry),
            Some(expiry) => Self::Expired(expiry),
            None => Self::Malformed,
        }
    }
}

fn parse_expiry(value: &Value) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.as_str()?, EXPIRY_FORMAT).ok()
}

/// Per-user premium expiry dates.
#[derive(Debug)]
pub struct EntitlementStore {
    store: FlatStore,
}

impl EntitlementStore {
    /// Creates a store backed by the given file.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            store: FlatStore::new(path),
        }
    }

    /// Checks whether the user is entitled today (local clock).
    pub async fn is_premium(&self, user: UserId) -> bool {
        self.is_premium_on(user, Local::now().date_naive()).await
    }

    /// Checks whether the user is entitled on `today`.
    ///
    /// Missing or malformed records are never premium.
    pub async fn is_premium_on(&self, user: UserId, today: NaiveDate) -> bool {
        self.status_on(user, today)
            .await
            .is_some_and(|status| matches!(status, PremiumStatus::Active(_)))
    }

    /// Returns the classified record for the user, if any.
    pub async fn status_on(&self, user: UserId, today: NaiveDate) -> Option<PremiumStatus> {
        let value = self.store.get(&user_key(user)).await?;
        let status = PremiumStatus::classify(&value, today);
        if status == PremiumStatus::Malformed {
            debug!("Ignoring malformed premium record for user {}", user.0);
        }
        Some(status)
    }

    /// Grants `days` of premium starting now (local clock).
    pub async fn grant_premium(&self, user: UserId, days: i64) -> Result<NaiveDate, StoreError> {
        self.grant_premium_from(user, days, Local::now().naive_local())
            .await
    }

    /// Grants `days` of premium starting at `now`, replacing any existing record.
    ///
    /// `days` is not validated here; callers reject non-positive values.
    pub async fn grant_premium_from(
        &self,
        user: UserId,
        days: i64,
        now: NaiveDateTime,
    ) -> Result<NaiveDate, StoreError> {
        let expiry = TimeDelta::try_days(days)
            .and_then(|delta| now.checked_add_signed(delta))
            .ok_or(StoreError::DateOverflow { days })?
            .date();

        let value = Value::String(expiry.format(EXPIRY_FORMAT).to_string());
        self.store
            .update(|map| map.insert(user_key(user), value))
            .await;

        info!("Premium for user {} now expires on {}", user.0, expiry);
        Ok(expiry)
    }

    /// Lists every record with its status on `today`.
    pub async fn records_on(&self, today: NaiveDate) -> Result<Vec<(String, PremiumStatus)>, StoreError> {
        Ok(self
            .store
            .try_load()
            .await?
            .iter()
            .map(|(key, value)| (key.clone(), PremiumStatus::classify(value, today)))
            .collect())
    }
}
