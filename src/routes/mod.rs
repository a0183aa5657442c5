//! HTTP routes

pub mod posts;
pub mod profile;

use actix_web::web;

use crate::auth::handlers::{login, login_form, logout, register, register_form};
use crate::error::AppError;
use profile::{edit_profile, edit_profile_form, index, user_profile};

/// Where clients land after logging in or out.
pub const HOME: &str = "/";

/// Registers every page route. The session middleware is wrapped around
/// the `App` by the caller.
pub fn configure(cfg: &mut web::ServiceConfig) {
    let form_config = web::FormConfig::default()
        .error_handler(|err, _req| AppError::ValidationError(err.to_string()).into());

    cfg.app_data(form_config)
        .route("/", web::get().to(index))
        .route("/index", web::get().to(index))
        .service(
            web::resource("/login")
                .route(web::get().to(login_form))
                .route(web::post().to(login)),
        )
        .route("/logout", web::get().to(logout))
        .service(
            web::resource("/register")
                .route(web::get().to(register_form))
                .route(web::post().to(register)),
        )
        .route("/user/{username}", web::get().to(user_profile))
        .service(
            web::resource("/edit/profile")
                .route(web::get().to(edit_profile_form))
                .route(web::post().to(edit_profile)),
        );
}
