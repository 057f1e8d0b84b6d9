//! Persistent state for entitlements and free-tier usage.
//!
//! Each store is one JSON object in one file, read fully before a query and
//! rewritten fully after a mutation. Read failures degrade to an empty map,
//! write failures are logged and swallowed.

mod flat;
mod premium;
mod usage;

pub use flat::{FlatStore, StoreError};
pub use premium::{EXPIRY_FORMAT, EntitlementStore, PremiumStatus};
pub use usage::{LAST_USE_FORMAT, UsageStatus, UsageTracker};

/// Key under which a user's record is stored.
fn user_key(user: teloxide::types::UserId) -> String {
    user.0.to_string()
}
