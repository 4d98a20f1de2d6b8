//! Persistence seams.
//!
//! The auth core only needs [`UserStore::find_by_email`] and the
//! [`RevocationLedger`]; the rest of [`UserStore`] backs the CRUD routes.

pub mod memory;
pub mod mongo;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use crate::{
    errors::AppError,
    models::user::{NewUser, UserDoc, UserUpdate},
};

pub use memory::MemoryStore;
pub use mongo::MongoStore;

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn list(&self) -> Result<Vec<UserDoc>, AppError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<UserDoc>, AppError>;

    /// `email` must already be normalised (trimmed, lower-cased).
    async fn find_by_email(&self, email: &str) -> Result<Option<UserDoc>, AppError>;

    /// Returns the new id. Fails with [`AppError::Conflict`] if the email is taken.
    async fn create(&self, user: NewUser) -> Result<i64, AppError>;

    /// `Ok(None)` when no user has `id`.
    async fn update(&self, id: i64, update: UserUpdate) -> Result<Option<UserDoc>, AppError>;

    /// `Ok(false)` when there was nothing to delete.
    async fn delete(&self, id: i64) -> Result<bool, AppError>;
}

/// When a ledger entry for a token expiring at `expires_at` may be dropped.
///
/// Token expiry is checked against whole seconds with no leeway, so a token
/// whose `exp` is `E` still verifies until `E + 1s`. The entry must outlive that.
pub fn retain_until(expires_at: DateTime<Utc>) -> DateTime<Utc> {
    expires_at + Duration::seconds(1)
}

/// Durable set of revoked bearer tokens.
///
/// Entries are matched on the exact token string. Each one is kept until
/// [`retain_until`] of its token's expiry and can be pruned after that point.
#[async_trait]
pub trait RevocationLedger: Send + Sync {
    /// Idempotent. Re-revoking keeps the later of the two expiry times.
    async fn revoke(&self, token: &str, expires_at: DateTime<Utc>) -> Result<(), AppError>;

    async fn is_revoked(&self, token: &str) -> Result<bool, AppError>;

    /// Drops entries whose retention ended before `now`. Returns how many went.
    async fn prune_expired(&self, now: DateTime<Utc>) -> Result<u64, AppError>;
}
