//! Post-login redirect validation.

use url::{ParseError, Url};

/// Two unrelated origins a target is resolved against. A target that
/// stays on both is host-relative; one that names its own host can only
/// match one of them.
const PROBE_ORIGINS: [&str; 2] = ["http://origin-a.invalid/", "http://origin-b.invalid/"];

/// Picks where to send a client after login.
///
/// Returns `requested_next` unchanged when it is a same-origin reference
/// (`/user/alice`, `edit/profile?x=1`). Anything empty or carrying a
/// network location (`https://evil.example/x`, `//evil.example`,
/// `/\evil.example`) or control characters yields `fallback`.
pub fn safe_redirect_target(requested_next: Option<&str>, fallback: &str) -> String {
    match requested_next {
        Some(next) if !next.trim().is_empty() && is_same_origin(next) => next.to_string(),
        _ => fallback.to_string(),
    }
}

fn is_same_origin(target: &str) -> bool {
    // The parser drops tabs and newlines, so check the raw text first.
    if target.chars().any(char::is_control) {
        return false;
    }

    match Url::parse(target) {
        // Anything with a scheme of its own is never ours to follow.
        Ok(_) => return false,
        Err(ParseError::RelativeUrlWithoutBase) => {}
        Err(_) => return false,
    }

    PROBE_ORIGINS.iter().all(|origin| {
        let Ok(base) = Url::parse(origin) else {
            return false;
        };
        match base.join(target) {
            Ok(resolved) => {
                resolved.host_str() == base.host_str()
                    && resolved.port() == base.port()
                    && resolved.username().is_empty()
                    && resolved.password().is_none()
            }
            Err(_) => false,
        }
    })
}
