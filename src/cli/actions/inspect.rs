use crate::{
    cli::{actions::print_json, globals::GlobalArgs},
    navigation::{guard, GuardDecision, View},
    store::AuthStore,
    token,
};
use anyhow::{Context, Result};
use secrecy::ExposeSecret;
use serde_json::{json, Value};
use tracing::warn;

#[derive(Debug)]
pub struct DecodeArgs {
    pub globals: GlobalArgs,
    /// Explicit token; the stored access token otherwise.
    pub token: Option<String>,
}

#[derive(Debug)]
pub struct RouteArgs {
    pub globals: GlobalArgs,
    pub path: String,
}

/// # Errors
/// Returns an error if there is no token or it cannot be decoded.
pub fn decode_token(args: &DecodeArgs) -> Result<()> {
    let raw = match &args.token {
        Some(raw) => raw.clone(),
        None => args
            .globals
            .store()?
            .session()
            .access_token()
            .map(|secret| secret.expose_secret().to_string())
            .context("no stored access token, pass one explicitly")?,
    };

    print_json(&describe_token(&raw)?)
}

fn describe_token(raw: &str) -> Result<Value> {
    let claims = token::decode_payload(raw).context("token payload could not be decoded")?;
    Ok(json!({
        "claims": claims,
        "expires_at": token::expiry_date(raw).map(|expiry| expiry.to_rfc3339()),
        "expired": token::is_expired(raw),
    }))
}

/// Evaluates the guard against the stored session. Admin-only views load the
/// profile first, since the stored session carries tokens only.
/// # Errors
/// Returns an error if the store cannot be built.
pub async fn check_route(args: &RouteArgs) -> Result<()> {
    let store = args.globals.store()?;
    print_json(&resolve_route(&store, &args.path).await)
}

async fn resolve_route(store: &AuthStore, path: &str) -> Value {
    let meta = View::from_path(path).meta();
    if meta.requires_admin && store.is_authenticated() && store.user().is_none() {
        // a failed fetch ends the session, so the guard then redirects to login
        if let Err(err) = store.fetch_user_profile().await {
            warn!("could not load profile for route check: {err}");
        }
    }
    route_decision(path, &store.snapshot())
}

fn route_decision(path: &str, session: &crate::session::Session) -> Value {
    let view = View::from_path(path);
    let meta = view.meta();
    let (allowed, redirect) = match guard(meta, session) {
        GuardDecision::Allow => (true, None),
        GuardDecision::Redirect(target) => (false, Some(target.path())),
    };

    json!({
        "view": view.path(),
        "requires_auth": meta.requires_auth,
        "requires_admin": meta.requires_admin,
        "guest_only": meta.guest_only,
        "allowed": allowed,
        "redirect": redirect,
    })
}
