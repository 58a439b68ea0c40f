use crate::{
    api::Credentials,
    cli::{actions::print_json, globals::GlobalArgs},
    renew::{self, RenewOptions},
    store::{AuthStore, LOGIN_FAILED_MESSAGE},
    token,
};
use anyhow::{bail, Result};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Map, Value};
use std::time::Duration;
use tokio::signal;
use tracing::info;

/// Tokens expiring within this window are reported as expiring soon.
const EXPIRY_WARNING_SECONDS: i64 = 60;

#[derive(Debug)]
pub struct LoginArgs {
    pub globals: GlobalArgs,
    pub email: String,
    pub password: SecretString,
    pub username: Option<String>,
}

#[derive(Debug)]
pub struct ProfileArgs {
    pub globals: GlobalArgs,
    /// Fields to PATCH; empty means read only.
    pub updates: Map<String, Value>,
}

#[derive(Debug)]
pub struct WatchArgs {
    pub globals: GlobalArgs,
    pub min_delay: Duration,
}

/// # Errors
/// Returns the login failure message.
pub async fn login(args: LoginArgs) -> Result<()> {
    let store = args.globals.store()?;

    let mut credentials = Credentials::new(args.email, args.password);
    if let Some(username) = args.username {
        credentials = credentials.with_username(username);
    }

    if let Err(err) = store.login(&credentials).await {
        let message = store
            .last_error()
            .unwrap_or_else(|| LOGIN_FAILED_MESSAGE.to_string());
        return Err(anyhow::Error::new(err).context(message));
    }

    print_json(&json!({
        "authenticated": true,
        "user": store.user().map(|user| user.into_value()),
    }))
}

/// # Errors
/// Returns an error only if the store cannot be built.
pub fn logout(globals: &GlobalArgs) -> Result<()> {
    let store = globals.store()?;
    store.logout();
    print_json(&json!({ "authenticated": false }))
}

/// Reports the stored session without touching the network.
/// # Errors
/// Returns an error if the store cannot be built.
pub fn status(globals: &GlobalArgs) -> Result<()> {
    let store = globals.store()?;
    print_json(&session_status(&store, globals))
}

fn session_status(store: &AuthStore, globals: &GlobalArgs) -> Value {
    let session = store.snapshot();
    let describe = |secret: Option<&SecretString>| {
        secret.map(|secret| {
            let raw = secret.expose_secret();
            json!({
                "expires_at": token::expiry_date(raw).map(|expiry| expiry.to_rfc3339()),
                "expired": token::is_expired(raw),
                "expiring_soon": token::expires_within(
                    raw,
                    chrono::Duration::seconds(EXPIRY_WARNING_SECONDS),
                ),
            })
        })
    };

    json!({
        "authenticated": session.is_authenticated(),
        "token_file": globals.token_file(),
        "access_token": describe(session.access_token.as_ref()),
        "refresh_token": describe(session.refresh_token.as_ref()),
    })
}

/// # Errors
/// Returns an error if the profile cannot be fetched or updated.
pub async fn profile(args: ProfileArgs) -> Result<()> {
    let store = args.globals.store()?;
    if !store.is_authenticated() {
        bail!("not logged in");
    }

    let user = if args.updates.is_empty() {
        store.fetch_user_profile().await?
    } else {
        store
            .update_user_profile(&Value::Object(args.updates))
            .await?
    };

    print_json(&user)
}

/// # Errors
/// Returns an error if the refresh fails; the stored session is cleared then.
pub async fn refresh(globals: &GlobalArgs) -> Result<()> {
    let store = globals.store()?;
    let access = store.refresh_access_token().await?;

    print_json(&json!({
        "refreshed": true,
        "expires_at": token::expiry_date(access.expose_secret()).map(|expiry| expiry.to_rfc3339()),
    }))
}

/// Runs proactive renewal until Ctrl-C or until the session ends.
/// # Errors
/// Returns an error if the session ends while watching.
pub async fn watch(args: WatchArgs) -> Result<()> {
    let store = args.globals.store()?;
    if !store.is_authenticated() {
        bail!("not logged in");
    }

    let mut handle = renew::spawn(
        store.clone(),
        RenewOptions {
            min_delay: args.min_delay,
        },
    );

    tokio::select! {
        _ = signal::ctrl_c() => {
            info!("interrupted, stopping token renewal");
            handle.abort();
            Ok(())
        }
        joined = &mut handle => {
            joined?;
            if store.is_authenticated() {
                Ok(())
            } else {
                bail!("session ended, log in again")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{FileStorage, TokenStorage, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};
    use chrono::Utc;

    #[test]
    fn status_reports_token_expiry() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("tokens.json");
        let storage = FileStorage::new(path.clone());
        let access = token::encode_for_tests(&json!({"exp": Utc::now().timestamp() + 30}));
        storage.set(ACCESS_TOKEN_KEY, &access)?;
        storage.set(REFRESH_TOKEN_KEY, "opaque")?;

        let mut globals = GlobalArgs::default();
        globals.token_file = Some(path);
        let store = globals.store()?;

        let status = session_status(&store, &globals);
        assert_eq!(status["authenticated"], json!(true));
        assert_eq!(status["access_token"]["expired"], json!(false));
        assert_eq!(status["access_token"]["expiring_soon"], json!(true));
        assert_eq!(status["refresh_token"]["expires_at"], Value::Null);
        assert_eq!(status["refresh_token"]["expired"], json!(true));
        Ok(())
    }

    #[test]
    fn status_without_session() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let mut globals = GlobalArgs::default();
        globals.token_file = Some(dir.path().join("tokens.json"));
        let store = globals.store()?;

        let status = session_status(&store, &globals);
        assert_eq!(status["authenticated"], json!(false));
        assert_eq!(status["access_token"], Value::Null);
        Ok(())
    }
}
