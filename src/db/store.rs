use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::db::models::{ProfileUpdate, User};
use crate::Result;

/// System of record for user accounts.
///
/// Implementations must keep `username` and `email` unique, reporting a
/// collision as `DatabaseError::Duplicate`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    async fn create(&self, user: &User) -> Result<User>;

    /// Applies a profile edit, returning the updated record.
    async fn update_profile(&self, id: Uuid, update: &ProfileUpdate) -> Result<User>;

    async fn touch_last_seen(&self, id: Uuid, at: DateTime<Utc>) -> Result<()>;
}
