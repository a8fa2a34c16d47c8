//! Admin login.

use aaa_core::api::Enveloped;
use aaa_core::{AdminId, AdminRole, AdminStatus};
use reqwest::Method;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::BackendError;
use super::client::{BackendClient, read_json};

#[derive(Serialize)]
struct LoginBody<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct RawLogin {
    access: String,
    #[serde(default)]
    refresh: Option<String>,
    user: LoginUser,
}

/// The account that just logged in.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginUser {
    pub id: AdminId,
    pub email: String,
    pub admin_type: AdminRole,
    pub status: AdminStatus,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

impl LoginUser {
    /// "First Last", falling back to the email.
    #[must_use]
    pub fn display_name(&self) -> String {
        let name = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if name.is_empty() { self.email.clone() } else { name }
    }
}

/// Tokens and profile returned by a successful login.
pub struct LoginSession {
    pub access: SecretString,
    pub refresh: Option<SecretString>,
    pub user: LoginUser,
}

impl std::fmt::Debug for LoginSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginSession")
            .field("access", &"[REDACTED]")
            .field("user", &self.user)
            .finish_non_exhaustive()
    }
}

impl BackendClient {
    /// Exchange email and password for backend tokens.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Unauthorized` for bad credentials and
    /// `BackendError::Forbidden` when the account is not active.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginSession, BackendError> {
        let response = self
            .request(Method::POST, "api/auth/login/")?
            .json(&LoginBody { email, password })
            .send()
            .await?;
        let raw: Enveloped<RawLogin> = read_json(response).await?;
        let raw = raw.into_inner();

        Ok(LoginSession {
            access: SecretString::from(raw.access),
            refresh: raw.refresh.map(SecretString::from),
            user: raw.user,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_login_envelope_parses() {
        let body = r#"{
            "success": true,
            "message": "Login successful",
            "data": {
                "access": "a.b.c",
                "refresh": "d.e.f",
                "user": {
                    "id": 7,
                    "email": "ops@aaa-as.co.uk",
                    "admin_type": "super_admin",
                    "status": "active",
                    "first_name": "Sam",
                    "last_name": "",
                    "is_email_verified": true
                }
            }
        }"#;
        let raw: Enveloped<RawLogin> = serde_json::from_str(body).unwrap();
        let raw = raw.into_inner();
        assert_eq!(raw.access, "a.b.c");
        assert_eq!(raw.user.admin_type, AdminRole::SuperAdmin);
        assert_eq!(raw.user.display_name(), "Sam");
    }

    #[test]
    fn test_display_name_falls_back_to_email() {
        let user = LoginUser {
            id: AdminId::new(1),
            email: "a@b.co".to_string(),
            admin_type: AdminRole::Admin,
            status: AdminStatus::Active,
            first_name: None,
            last_name: Some("  ".to_string()),
        };
        assert_eq!(user.display_name(), "a@b.co");
    }
}
