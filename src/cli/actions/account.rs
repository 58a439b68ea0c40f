use crate::cli::{actions::print_json, globals::GlobalArgs};
use anyhow::Result;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};

/// Registration and admin signup share one form.
#[derive(Debug)]
pub struct SignupArgs {
    pub globals: GlobalArgs,
    pub email: String,
    pub password: SecretString,
    pub password_confirm: Option<SecretString>,
    pub username: Option<String>,
}

impl SignupArgs {
    /// Request body; the confirmation defaults to the password.
    fn body(&self) -> Value {
        let password = self.password.expose_secret();
        let confirmation = self
            .password_confirm
            .as_ref()
            .map_or(password, |confirm| confirm.expose_secret());

        let mut body = json!({
            "email": self.email,
            "password": password,
            "password2": confirmation,
        });
        if let Some(username) = &self.username {
            body["username"] = json!(username);
        }
        body
    }
}

#[derive(Debug)]
pub struct TokenArgs {
    pub globals: GlobalArgs,
    pub token: String,
}

#[derive(Debug)]
pub struct EmailArgs {
    pub globals: GlobalArgs,
    pub email: String,
}

#[derive(Debug)]
pub struct ResetPasswordArgs {
    pub globals: GlobalArgs,
    pub token: String,
    pub new_password: SecretString,
}

#[derive(Debug)]
pub struct PasswordArgs {
    pub globals: GlobalArgs,
    pub password: SecretString,
}

/// # Errors
/// Returns validation or API errors.
pub async fn register(args: SignupArgs) -> Result<()> {
    let store = args.globals.store()?;
    let response = store.register(&args.body()).await?;
    print_json(&response)
}

/// # Errors
/// Returns API errors.
pub async fn create_admin(args: SignupArgs) -> Result<()> {
    let store = args.globals.store()?;
    let response = store.create_admin_account(&args.body()).await?;
    print_json(&response)
}

/// # Errors
/// Returns API errors.
pub async fn verify_email(args: TokenArgs) -> Result<()> {
    let store = args.globals.store()?;
    let response = store.verify_email(&args.token).await?;
    print_json(&response)
}

/// # Errors
/// Returns validation or API errors.
pub async fn request_password_reset(args: EmailArgs) -> Result<()> {
    let store = args.globals.store()?;
    let response = store.request_password_reset(&args.email).await?;
    print_json(&response)
}

/// # Errors
/// Returns validation or API errors.
pub async fn reset_password(args: ResetPasswordArgs) -> Result<()> {
    let store = args.globals.store()?;
    let response = store
        .reset_password(&args.token, &args.new_password)
        .await?;
    print_json(&response)
}

/// # Errors
/// Returns API errors; the session is kept if deletion fails.
pub async fn delete_account(args: PasswordArgs) -> Result<()> {
    let store = args.globals.store()?;
    store.delete_account(&args.password).await?;
    print_json(&json!({ "deleted": true }))
}
