use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info, warn};

use crate::auth::{safe_redirect_target, CurrentUser};
use crate::db::User;
use crate::error::{AppError, AuthError, DatabaseError};
use crate::forms::{LoginForm, RegistrationForm};
use crate::routes::HOME;
use crate::views::{flash, redirect, View};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

fn login_page() -> View {
    View::new("login.html").title("Sign In")
}

fn register_page() -> View {
    View::new("register.html").title("Register")
}

pub async fn login_form(req: HttpRequest, user: Option<CurrentUser>) -> HttpResponse {
    if user.is_some() {
        return redirect(HOME);
    }
    login_page()
        .context(json!({ "form": LoginForm::default().echo(), "errors": {} }))
        .render(&req)
}

pub async fn login(
    req: HttpRequest,
    user: Option<CurrentUser>,
    query: web::Query<NextQuery>,
    form: web::Form<LoginForm>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    if user.is_some() {
        return Ok(redirect(HOME));
    }

    let form = form.into_inner();
    let errors = form.validate();
    if !errors.is_empty() {
        return Ok(login_page()
            .context(json!({ "form": form.echo(), "errors": errors }))
            .render(&req));
    }

    info!("Received login request for username: {}", form.username);
    match state.gateway.authenticate(&form.username, &form.password).await {
        Ok(user) => {
            let session = state.gateway.establish_session(&user, form.remember())?;
            let target = safe_redirect_target(query.next.as_deref(), HOME);
            info!("Login successful for {}, redirecting to {}", user.username, target);

            let mut response = redirect(&target);
            response
                .add_cookie(&state.gateway.session_cookie(&session))
                .map_err(|e| AppError::InternalError(e.to_string()))?;
            Ok(response)
        }
        Err(AppError::AuthError(e @ AuthError::InvalidCredentials)) => {
            warn!("Login failed for username: {}", form.username);
            Ok(login_page()
                .context(json!({ "form": form.echo(), "errors": {} }))
                .notice(e.to_string())
                .render(&req))
        }
        Err(e) => {
            error!("Login errored for username: {}: {}", form.username, e);
            Err(e)
        }
    }
}

pub async fn logout(user: Option<CurrentUser>, state: web::Data<AppState>) -> HttpResponse {
    if let Some(user) = user {
        info!("Logging out {}", user.username);
    }
    HttpResponse::Found()
        .insert_header((actix_web::http::header::LOCATION, HOME))
        .cookie(state.gateway.terminate_session())
        .finish()
}

pub async fn register_form(req: HttpRequest, user: Option<CurrentUser>) -> HttpResponse {
    if user.is_some() {
        return redirect(HOME);
    }
    register_page()
        .context(json!({ "form": RegistrationForm::default().echo(), "errors": {} }))
        .render(&req)
}

pub async fn register(
    req: HttpRequest,
    user: Option<CurrentUser>,
    form: web::Form<RegistrationForm>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    if user.is_some() {
        return Ok(redirect(HOME));
    }

    let form = form.into_inner().normalized();
    let mut errors = form.validate(state.users.as_ref()).await?;
    if errors.is_empty() {
        info!("Received registration request for username: {}", form.username);
        let new_user = User::new(form.username.clone(), form.email.clone(), &form.password)?;
        match state.users.create(&new_user).await {
            Ok(user) => {
                info!("Registration successful for username: {}", user.username);
                return Ok(flash::redirect_with(
                    &req,
                    "/login",
                    format!("Congratulations, {}, you are now a registered user!", user.username),
                ));
            }
            // Lost a race with a concurrent registration.
            Err(AppError::DatabaseError(DatabaseError::Duplicate)) => {
                warn!("Registration collided for username: {}", form.username);
                errors.add("username", "Please use a different username or email address.");
            }
            Err(e) => {
                error!("Registration failed for username: {}: {}", form.username, e);
                return Err(e);
            }
        }
    }

    Ok(register_page()
        .context(json!({ "form": form.echo(), "errors": errors }))
        .render(&req))
}
