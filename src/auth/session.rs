//! Request-scoped session handling

use actix_web::body::MessageBody;
use actix_web::dev::{Payload, ServiceRequest, ServiceResponse};
use actix_web::error::ErrorInternalServerError;
use actix_web::middleware::Next;
use actix_web::{web, Error, FromRequest, HttpMessage, HttpRequest};
use futures::future::{ready, Ready};
use tracing::{debug, warn};

use crate::auth::service::SESSION_COOKIE;
use crate::db::User;
use crate::error::AppError;
use crate::AppState;

/// The user bound to the current request's session.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl std::ops::Deref for CurrentUser {
    type Target = User;

    fn deref(&self) -> &User {
        &self.0
    }
}

/// Fails with `AppError::LoginRequired` for anonymous requests. Take an
/// `Option<CurrentUser>` on routes open to everyone.
impl FromRequest for CurrentUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let user = req.extensions().get::<CurrentUser>().cloned();
        ready(user.ok_or_else(|| AppError::LoginRequired {
            next: req
                .uri()
                .path_and_query()
                .map(|pq| pq.as_str().to_string())
                .unwrap_or_else(|| req.path().to_string()),
        }))
    }
}

/// Resolves the session cookie before any route runs.
///
/// A valid session refreshes the user's last-seen time and makes the user
/// available as `CurrentUser`. An invalid or orphaned session cookie is
/// cleared and the request continues anonymously.
pub async fn load_session<B>(
    req: ServiceRequest,
    next: Next<B>,
) -> Result<ServiceResponse<B>, Error>
where
    B: MessageBody + 'static,
{
    let state: web::Data<AppState> = req
        .app_data()
        .cloned()
        .ok_or_else(|| ErrorInternalServerError("Missing application state"))?;

    let mut stale_cookie = false;
    if let Some(cookie) = req.cookie(SESSION_COOKIE) {
        match state.gateway.resolve_session(cookie.value()).await {
            Ok(Some(mut user)) => {
                state.gateway.refresh_last_seen(&mut user).await?;
                req.extensions_mut().insert(CurrentUser(user));
            }
            Ok(None) => {
                debug!("Session refers to a user that no longer exists");
                stale_cookie = true;
            }
            Err(AppError::AuthError(e)) => {
                debug!("Discarding session cookie: {}", e);
                stale_cookie = true;
            }
            Err(e) => return Err(e.into()),
        }
    }

    let mut response = next.call(req).await?;
    // Handlers that just issued a fresh session (login) take precedence.
    let reissued = response
        .response()
        .cookies()
        .any(|c| c.name() == SESSION_COOKIE);
    if stale_cookie && !reissued {
        let removal = state.gateway.terminate_session();
        if let Err(e) = response.response_mut().add_cookie(&removal) {
            warn!("Failed to clear stale session cookie: {}", e);
        }
    }
    Ok(response)
}
