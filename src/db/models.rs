use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::auth::password;
use crate::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub about_me: Option<String>,
    pub last_seen: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Builds a new account, hashing `password` on the way in.
    pub fn new(username: String, email: String, password: &str) -> Result<Self> {
        Ok(Self {
            id: Uuid::new_v4(),
            username,
            email,
            password_hash: password::hash_password(password)?,
            about_me: None,
            last_seen: None,
            created_at: Utc::now(),
        })
    }

    pub fn check_password(&self, password: &str) -> bool {
        password::verify_password(password, &self.password_hash)
    }
}

/// Fields a user may change from the profile editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub username: String,
    pub about_me: Option<String>,
}
