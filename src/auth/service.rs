use actix_web::cookie::{time, Cookie, SameSite};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::db::{User, UserStore};
use crate::error::AuthError;
use crate::Result;

pub const SESSION_COOKIE: &str = "session";

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,    // User ID
    pub exp: i64,       // Expiration time
    pub iat: i64,       // Issued at
    pub remember: bool,
}

/// A signed session bound to one user, ready to be handed to the client.
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: Uuid,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub remember: bool,
}

/// Credential checks, session issuing and per-request session upkeep.
pub struct SessionGateway {
    users: Arc<dyn UserStore>,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    session_ttl: Duration,
    remember_ttl: Duration,
    secure_cookies: bool,
}

impl SessionGateway {
    pub fn new(users: Arc<dyn UserStore>, config: &AuthConfig) -> Self {
        Self {
            users,
            encoding_key: EncodingKey::from_secret(config.session_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.session_secret.as_bytes()),
            session_ttl: Duration::hours(config.session_ttl_hours),
            remember_ttl: Duration::days(config.remember_days),
            secure_cookies: config.secure_cookies,
        }
    }

    /// Checks a username/password pair.
    ///
    /// An unknown username and a wrong password fail with the same
    /// `AuthError::InvalidCredentials`.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<User> {
        match self.users.find_by_username(username).await? {
            Some(user) if user.check_password(password) => {
                info!("Credentials accepted for user {}", user.id);
                Ok(user)
            }
            Some(user) => {
                warn!("Password mismatch for user {}", user.id);
                Err(AuthError::InvalidCredentials.into())
            }
            None => {
                warn!("Login attempt for unknown username");
                Err(AuthError::InvalidCredentials.into())
            }
        }
    }

    /// Issues a signed session for `user`. Remembered sessions outlive the
    /// browser session; the others expire after the configured TTL.
    pub fn establish_session(&self, user: &User, remember: bool) -> Result<Session> {
        let now = Utc::now();
        let ttl = if remember { self.remember_ttl } else { self.session_ttl };
        let expires_at = now + ttl;
        let claims = Claims {
            sub: user.id.to_string(),
            exp: expires_at.timestamp(),
            iat: now.timestamp(),
            remember,
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;
        info!("Session established for user {} (remember: {})", user.id, remember);

        Ok(Session {
            user_id: user.id,
            token,
            expires_at,
            remember,
        })
    }

    /// Builds the cookie carrying `session`.
    pub fn session_cookie(&self, session: &Session) -> Cookie<'static> {
        let mut cookie = Cookie::build(SESSION_COOKIE, session.token.clone())
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure_cookies)
            .finish();
        if session.remember {
            cookie.set_max_age(time::Duration::seconds(self.remember_ttl.num_seconds()));
        }
        cookie
    }

    /// Cookie that unbinds whatever session the client holds. Safe to send
    /// when there is none.
    pub fn terminate_session(&self) -> Cookie<'static> {
        let mut cookie = Cookie::build(SESSION_COOKIE, "")
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure_cookies)
            .finish();
        cookie.make_removal();
        cookie
    }

    /// Verifies a session token and loads its user. `Ok(None)` means the
    /// token was well-signed but its user is gone.
    pub async fn resolve_session(&self, token: &str) -> Result<Option<User>> {
        let claims = decode::<Claims>(token, &self.decoding_key, &Validation::new(Algorithm::HS256))?.claims;
        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AuthError::InvalidSession)?;
        debug!("Resolving session for user {} (remember: {})", user_id, claims.remember);
        self.users.find_by_id(user_id).await
    }

    /// Records that `user` was just active, persisting the timestamp.
    pub async fn refresh_last_seen(&self, user: &mut User) -> Result<()> {
        let now = Utc::now();
        self.users.touch_last_seen(user.id, now).await.map_err(|e| {
            warn!("Failed to record last seen for user {}: {}", user.id, e);
            e
        })?;
        user.last_seen = Some(now);
        Ok(())
    }
}
