//! Submitted forms and their field validation.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;

use crate::db::{User, UserStore};
use crate::Result;

pub const ABOUT_ME_MAX_CHARS: usize = 140;

const REQUIRED: &str = "This field is required.";

/// Field name to error messages. Empty means the form is valid.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FormErrors(BTreeMap<&'static str, Vec<String>>);

impl FormErrors {
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn field(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    fn require(&mut self, field: &'static str, value: &str) {
        if value.trim().is_empty() {
            self.add(field, REQUIRED);
        }
    }
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub remember_me: Option<String>,
}

impl LoginForm {
    pub fn validate(&self) -> FormErrors {
        let mut errors = FormErrors::default();
        errors.require("username", &self.username);
        errors.require("password", &self.password);
        errors
    }

    /// Checkbox semantics: any value other than empty or `false` is ticked.
    pub fn remember(&self) -> bool {
        matches!(self.remember_me.as_deref(), Some(v) if !v.is_empty() && !v.eq_ignore_ascii_case("false"))
    }

    /// Field values safe to send back with a re-rendered form.
    pub fn echo(&self) -> Value {
        json!({ "username": self.username, "remember_me": self.remember() })
    }
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct RegistrationForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub password2: String,
}

impl RegistrationForm {
    pub fn normalized(mut self) -> Self {
        self.username = self.username.trim().to_string();
        self.email = self.email.trim().to_string();
        self
    }

    pub async fn validate(&self, users: &dyn UserStore) -> Result<FormErrors> {
        let mut errors = FormErrors::default();
        errors.require("username", &self.username);
        errors.require("email", &self.email);
        errors.require("password", &self.password);
        errors.require("password2", &self.password2);

        if !self.email.is_empty() && !is_email_shaped(&self.email) {
            errors.add("email", "Invalid email address.");
        }
        if self.password2 != self.password {
            errors.add("password2", "Field must be equal to password.");
        }

        if !self.username.is_empty() && users.find_by_username(&self.username).await?.is_some() {
            errors.add("username", "Please use a different username.");
        }
        if !self.email.is_empty() && users.find_by_email(&self.email).await?.is_some() {
            errors.add("email", "Please use a different email address.");
        }
        Ok(errors)
    }

    pub fn echo(&self) -> Value {
        json!({ "username": self.username, "email": self.email })
    }
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct EditProfileForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub about_me: String,
}

impl EditProfileForm {
    /// Form pre-filled from the stored profile.
    pub fn from_user(user: &User) -> Self {
        Self {
            username: user.username.clone(),
            about_me: user.about_me.clone().unwrap_or_default(),
        }
    }

    pub fn normalized(mut self) -> Self {
        self.username = self.username.trim().to_string();
        self
    }

    /// `current` is the user being edited; keeping one's own name is allowed.
    pub async fn validate(&self, users: &dyn UserStore, current: &User) -> Result<FormErrors> {
        let mut errors = FormErrors::default();
        errors.require("username", &self.username);
        if self.about_me.chars().count() > ABOUT_ME_MAX_CHARS {
            errors.add(
                "about_me",
                format!("Field cannot be longer than {} characters.", ABOUT_ME_MAX_CHARS),
            );
        }

        if !self.username.is_empty() && self.username != current.username {
            if let Some(other) = users.find_by_username(&self.username).await? {
                if other.id != current.id {
                    errors.add("username", "Please use a different username.");
                }
            }
        }
        Ok(errors)
    }

    pub fn about_me(&self) -> Option<String> {
        if self.about_me.is_empty() {
            None
        } else {
            Some(self.about_me.clone())
        }
    }

    pub fn echo(&self) -> Value {
        json!({ "username": self.username, "about_me": self.about_me })
    }
}

fn is_email_shaped(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.rsplit_once('@') else {
        return false;
    };
    !local.is_empty()
        && !local.contains('@')
        && domain.contains('.')
        && domain.split('.').all(|label| !label.is_empty())
}
