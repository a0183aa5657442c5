use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::db::models::{ProfileUpdate, User};
use crate::db::store::UserStore;
use crate::error::DatabaseError;
use crate::Result;

/// In-process user store for tests and local runs (`database.url = "memory://"`).
#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<Uuid, User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.username == username).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn create(&self, user: &User) -> Result<User> {
        let mut users = self.users.write().await;
        let taken = users.values().any(|u| {
            u.id == user.id || u.username == user.username || u.email == user.email
        });
        if taken {
            return Err(DatabaseError::Duplicate.into());
        }
        users.insert(user.id, user.clone());
        Ok(user.clone())
    }

    async fn update_profile(&self, id: Uuid, update: &ProfileUpdate) -> Result<User> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.id != id && u.username == update.username) {
            return Err(DatabaseError::Duplicate.into());
        }
        let user = users.get_mut(&id).ok_or(DatabaseError::NotFound)?;
        user.username = update.username.clone();
        user.about_me = update.about_me.clone();
        Ok(user.clone())
    }

    async fn touch_last_seen(&self, id: Uuid, at: DateTime<Utc>) -> Result<()> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(&id)
            .ok_or_else(|| DatabaseError::QueryError(format!("no user {id} to mark as seen")))?;
        user.last_seen = Some(at);
        Ok(())
    }
}
