use serde::{Deserialize, Serialize};

/// The authenticated principal, passed explicitly into every service call.
///
/// `user_id` is the stable id issued by the external auth provider; profiles
/// key off it.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct AuthenticatedIdentity {
    pub user_id: String,
    pub email: Option<String>,
    pub name: Option<String>,
}

impl AuthenticatedIdentity {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            email: None,
            name: None,
        }
    }

    /// Identity addressed by email, as the CSV driver sees operators.
    pub fn from_email(email: &str) -> Self {
        Self {
            user_id: email.to_string(),
            email: Some(email.to_string()),
            name: None,
        }
    }

    /// Display name for a freshly created profile: the explicit name when
    /// present, otherwise the local part of the email.
    pub fn display_name(&self) -> Option<String> {
        if let Some(name) = &self.name {
            return Some(name.clone());
        }
        self.email
            .as_deref()
            .map(|email| email.split('@').next().unwrap_or(email).to_string())
    }
}
