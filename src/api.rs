//! Typed wrappers for the auth API endpoints. Request bodies carrying
//! passwords or tokens must never be logged; responses other than login and
//! refresh are passed back as opaque JSON.

use crate::{error::Result, transport::Transport};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::sync::Arc;

pub const LOGIN_PATH: &str = "/auth/login/";
pub const PROFILE_PATH: &str = "/auth/profile/";
pub const REGISTER_PATH: &str = "/auth/register/";
pub const VERIFY_EMAIL_PATH: &str = "/auth/verify-email/";
pub const RESET_PASSWORD_REQUEST_PATH: &str = "/auth/reset-password-request/";
pub const RESET_PASSWORD_CONFIRM_PATH: &str = "/auth/reset-password-confirm/";
pub const SETUP_2FA_PATH: &str = "/auth/setup-2fa/";
pub const VERIFY_2FA_PATH: &str = "/auth/verify-2fa/";
pub const DISABLE_2FA_PATH: &str = "/auth/disable-2fa/";
pub const DELETE_ACCOUNT_PATH: &str = "/auth/delete-account/";
pub const CREATE_ADMIN_PATH: &str = "/auth/create-admin/";

fn expose<S: Serializer>(secret: &SecretString, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

/// Login form. `username` is sent only when supplied.
#[derive(Debug, Serialize)]
pub struct Credentials {
    pub email: String,
    #[serde(serialize_with = "expose")]
    pub password: SecretString,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl Credentials {
    #[must_use]
    pub fn new(email: impl Into<String>, password: SecretString) -> Self {
        Self {
            email: email.into(),
            password,
            username: None,
        }
    }

    #[must_use]
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }
}

/// Login response. Both tokens are required for a usable session; the
/// profile may be omitted.
#[derive(Debug, Default, Deserialize)]
pub struct LoginResponse {
    pub access: Option<String>,
    pub refresh: Option<String>,
    pub user: Option<Value>,
}

#[derive(Serialize)]
struct TokenRequest<'a> {
    token: &'a str,
}

#[derive(Serialize)]
struct EmailRequest<'a> {
    email: &'a str,
}

#[derive(Serialize)]
struct ResetPasswordRequest<'a> {
    token: &'a str,
    new_password: &'a str,
}

#[derive(Serialize)]
struct Disable2faRequest<'a> {
    token: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct PasswordRequest<'a> {
    password: &'a str,
}

/// Endpoint helpers over a shared [`Transport`].
#[derive(Clone, Debug)]
pub struct AuthApi {
    transport: Arc<Transport>,
}

impl AuthApi {
    #[must_use]
    pub fn new(transport: Arc<Transport>) -> Self {
        Self { transport }
    }

    #[must_use]
    pub fn transport(&self) -> &Arc<Transport> {
        &self.transport
    }

    /// # Errors
    /// Propagates transport errors; a `401` here carries the backend's `detail`.
    pub async fn login(&self, credentials: &Credentials) -> Result<LoginResponse> {
        self.transport.post(LOGIN_PATH, credentials).await
    }

    /// # Errors
    /// Propagates transport errors.
    pub async fn get_user_profile(&self) -> Result<Value> {
        self.transport.get(PROFILE_PATH).await
    }

    /// # Errors
    /// Propagates transport errors.
    pub async fn update_user_profile(&self, fields: &Value) -> Result<Value> {
        self.transport.patch(PROFILE_PATH, fields).await
    }

    /// # Errors
    /// Propagates transport errors.
    pub async fn register(&self, data: &Value) -> Result<Value> {
        self.transport.post(REGISTER_PATH, data).await
    }

    /// # Errors
    /// Propagates transport errors.
    pub async fn verify_email(&self, token: &str) -> Result<Value> {
        self.transport
            .post(VERIFY_EMAIL_PATH, &TokenRequest { token })
            .await
    }

    /// # Errors
    /// Propagates transport errors.
    pub async fn request_password_reset(&self, email: &str) -> Result<Value> {
        self.transport
            .post(RESET_PASSWORD_REQUEST_PATH, &EmailRequest { email })
            .await
    }

    /// # Errors
    /// Propagates transport errors.
    pub async fn reset_password(&self, token: &str, new_password: &SecretString) -> Result<Value> {
        self.transport
            .post(
                RESET_PASSWORD_CONFIRM_PATH,
                &ResetPasswordRequest {
                    token,
                    new_password: new_password.expose_secret(),
                },
            )
            .await
    }

    /// # Errors
    /// Propagates transport errors.
    pub async fn setup_2fa(&self) -> Result<Value> {
        self.transport.post_empty(SETUP_2FA_PATH).await
    }

    /// # Errors
    /// Propagates transport errors.
    pub async fn verify_2fa(&self, token: &str) -> Result<Value> {
        self.transport
            .post(VERIFY_2FA_PATH, &TokenRequest { token })
            .await
    }

    /// # Errors
    /// Propagates transport errors.
    pub async fn disable_2fa(&self, token: &str, password: &SecretString) -> Result<Value> {
        self.transport
            .post(
                DISABLE_2FA_PATH,
                &Disable2faRequest {
                    token,
                    password: password.expose_secret(),
                },
            )
            .await
    }

    /// # Errors
    /// Propagates transport errors.
    pub async fn delete_account(&self, password: &SecretString) -> Result<Value> {
        self.transport
            .post(
                DELETE_ACCOUNT_PATH,
                &PasswordRequest {
                    password: password.expose_secret(),
                },
            )
            .await
    }

    /// # Errors
    /// Propagates transport errors.
    pub async fn create_admin_account(&self, data: &Value) -> Result<Value> {
        self.transport.post(CREATE_ADMIN_PATH, data).await
    }
}
