//! Page rendering.
//!
//! A page is a named template plus its data context, delivered as a JSON
//! document: `{template, title, current_user, flashes, context}`.

pub mod flash;

use actix_web::http::header;
use actix_web::{HttpMessage, HttpRequest, HttpResponse};
use serde::Serialize;
use serde_json::Value;

use crate::auth::CurrentUser;
use crate::db::User;

#[derive(Debug, Serialize)]
struct Page<'a> {
    template: &'a str,
    title: Option<&'a str>,
    current_user: Option<&'a User>,
    flashes: Vec<String>,
    context: &'a Value,
}

#[derive(Debug, Clone)]
pub struct View {
    template: &'static str,
    title: Option<String>,
    context: Value,
    notices: Vec<String>,
}

impl View {
    pub fn new(template: &'static str) -> Self {
        Self {
            template,
            title: None,
            context: Value::Object(Default::default()),
            notices: Vec::new(),
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn context(mut self, context: Value) -> Self {
        self.context = context;
        self
    }

    /// Adds a notice shown on this page only.
    pub fn notice(mut self, message: impl Into<String>) -> Self {
        self.notices.push(message.into());
        self
    }

    /// Renders the page, consuming any queued flash messages.
    pub fn render(self, req: &HttpRequest) -> HttpResponse {
        let clear_flashes = req.cookie(flash::FLASH_COOKIE).is_some();
        let mut flashes = flash::pending(req);
        flashes.extend(self.notices);

        let extensions = req.extensions();
        let current_user = extensions.get::<CurrentUser>().map(|u| &u.0);
        let page = Page {
            template: self.template,
            title: self.title.as_deref(),
            current_user,
            flashes,
            context: &self.context,
        };

        let mut response = HttpResponse::Ok();
        if clear_flashes {
            response.cookie(flash::clear());
        }
        response.json(page)
    }
}

/// Plain 302 redirect.
pub fn redirect(location: &str) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location))
        .finish()
}
