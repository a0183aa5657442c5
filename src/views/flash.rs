//! One-shot notices carried across a redirect.
//!
//! Pending messages travel in a cookie holding base64 JSON; the next
//! rendered page shows them and clears the cookie.

use actix_web::cookie::{Cookie, SameSite};
use actix_web::{HttpMessage, HttpRequest, HttpResponse};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use tracing::debug;

use crate::views::redirect;

pub const FLASH_COOKIE: &str = "_flashes";

/// Messages queued by earlier responses and not yet shown.
pub fn pending(req: &HttpRequest) -> Vec<String> {
    let Some(cookie) = req.cookie(FLASH_COOKIE) else {
        return Vec::new();
    };
    match decode(cookie.value()) {
        Some(messages) => messages,
        None => {
            debug!("Ignoring unreadable flash cookie");
            Vec::new()
        }
    }
}

/// Redirects to `location`, queueing `message` for the next page.
pub fn redirect_with(req: &HttpRequest, location: &str, message: impl Into<String>) -> HttpResponse {
    let mut messages = pending(req);
    messages.push(message.into());

    let mut response = redirect(location);
    if let Err(e) = response.add_cookie(&cookie(&messages)) {
        tracing::warn!("Failed to queue flash message: {}", e);
    }
    response
}

pub fn cookie(messages: &[String]) -> Cookie<'static> {
    Cookie::build(FLASH_COOKIE, encode(messages))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .finish()
}

pub fn clear() -> Cookie<'static> {
    let mut cookie = Cookie::build(FLASH_COOKIE, "").path("/").finish();
    cookie.make_removal();
    cookie
}

fn encode(messages: &[String]) -> String {
    // Serializing a slice of strings cannot fail.
    let json = serde_json::to_vec(messages).unwrap_or_default();
    URL_SAFE_NO_PAD.encode(json)
}

fn decode(value: &str) -> Option<Vec<String>> {
    let bytes = URL_SAFE_NO_PAD.decode(value).ok()?;
    serde_json::from_slice(&bytes).ok()
}
