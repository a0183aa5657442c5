//! Authentication module for the microblog server
//!
//! Credential checks, signed session cookies, post-login redirect
//! validation and the per-request session middleware.

pub mod handlers;
pub mod password;
mod redirect;
mod service;
pub mod session;

pub use redirect::safe_redirect_target;
pub use service::{Claims, Session, SessionGateway, SESSION_COOKIE};
pub use session::{load_session, CurrentUser};
