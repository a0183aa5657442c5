use actix_web::{web, HttpRequest, HttpResponse};
use serde_json::json;
use tracing::{info, warn};
use url::Url;

use crate::auth::CurrentUser;
use crate::db::ProfileUpdate;
use crate::error::{AppError, DatabaseError};
use crate::forms::EditProfileForm;
use crate::routes::posts::{profile_posts, sample_timeline};
use crate::views::{flash, View};
use crate::AppState;

/// Path of a user's profile page, with the username percent-encoded.
pub fn profile_path(username: &str) -> String {
    if let Ok(mut url) = Url::parse("http://localhost/user/") {
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(username);
        }
        return url.path().to_string();
    }
    format!("/user/{}", username)
}

fn edit_profile_page() -> View {
    View::new("edit_profile.html").title("Edit Profile")
}

pub async fn index(req: HttpRequest, _user: CurrentUser) -> HttpResponse {
    View::new("index.html")
        .title("Home")
        .context(json!({ "posts": sample_timeline() }))
        .render(&req)
}

pub async fn user_profile(
    req: HttpRequest,
    _viewer: CurrentUser,
    username: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let username = username.into_inner();
    let user = state
        .users
        .find_by_username(&username)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {}", username)))?;

    let posts = profile_posts(&user.username);
    Ok(View::new("user.html")
        .context(json!({ "user": user, "posts": posts }))
        .render(&req))
}

pub async fn edit_profile_form(req: HttpRequest, user: CurrentUser) -> HttpResponse {
    let form = EditProfileForm::from_user(&user);
    edit_profile_page()
        .context(json!({ "form": form.echo(), "errors": {} }))
        .render(&req)
}

pub async fn edit_profile(
    req: HttpRequest,
    user: CurrentUser,
    form: web::Form<EditProfileForm>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let form = form.into_inner().normalized();
    let mut errors = form.validate(state.users.as_ref(), &user).await?;

    if errors.is_empty() {
        let update = ProfileUpdate {
            username: form.username.clone(),
            about_me: form.about_me(),
        };
        match state.users.update_profile(user.id, &update).await {
            Ok(updated) => {
                info!("Profile updated for user {}", updated.id);
                return Ok(flash::redirect_with(
                    &req,
                    &profile_path(&updated.username),
                    "Your changes have been saved",
                ));
            }
            Err(AppError::DatabaseError(DatabaseError::Duplicate)) => {
                warn!("Profile update collided for user {}", user.id);
                errors.add("username", "Please use a different username.");
            }
            Err(e) => return Err(e),
        }
    }

    Ok(edit_profile_page()
        .context(json!({ "form": form.echo(), "errors": errors }))
        .render(&req))
}
