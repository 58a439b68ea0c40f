use crate::cli::{
    actions::{account, inspect, session, two_factor, Action},
    commands::{
        self, account as account_args, inspect as inspect_args, two_factor as two_factor_args,
    },
    globals::GlobalArgs,
};
use anyhow::{anyhow, Context, Result};
use clap::ArgMatches;
use secrecy::SecretString;
use serde_json::{Map, Value};
use std::{path::PathBuf, time::Duration};

fn globals(matches: &ArgMatches) -> GlobalArgs {
    let mut globals = matches
        .get_one::<String>(commands::ARG_API_URL)
        .cloned()
        .map_or_else(GlobalArgs::default, GlobalArgs::new);
    globals.token_file = matches.get_one::<PathBuf>(commands::ARG_TOKEN_FILE).cloned();
    if let Some(timeout) = matches.get_one::<u64>(commands::ARG_TIMEOUT).copied() {
        globals.timeout = timeout;
    }
    globals
}

fn string(matches: &ArgMatches, id: &str) -> Result<String> {
    matches
        .get_one::<String>(id)
        .cloned()
        .with_context(|| format!("missing required argument: --{id}"))
}

fn secret(matches: &ArgMatches, id: &str) -> Result<SecretString> {
    string(matches, id).map(SecretString::from)
}

/// Parses `key=value` pairs; values that are valid JSON keep their type.
fn profile_updates(matches: &ArgMatches) -> Result<Map<String, Value>> {
    let mut updates = Map::new();
    for pair in matches
        .get_many::<String>(account_args::ARG_SET)
        .into_iter()
        .flatten()
    {
        let (key, value) = pair
            .split_once('=')
            .filter(|(key, _)| !key.trim().is_empty())
            .ok_or_else(|| anyhow!("invalid --set {pair}, expected key=value"))?;
        let value =
            serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
        updates.insert(key.trim().to_string(), value);
    }
    Ok(updates)
}

fn signup(globals: GlobalArgs, matches: &ArgMatches) -> Result<account::SignupArgs> {
    Ok(account::SignupArgs {
        globals,
        email: string(matches, account_args::ARG_EMAIL)?,
        password: secret(matches, account_args::ARG_PASSWORD)?,
        password_confirm: matches
            .get_one::<String>(account_args::ARG_PASSWORD_CONFIRM)
            .cloned()
            .map(SecretString::from),
        username: matches.get_one::<String>(account_args::ARG_USERNAME).cloned(),
    })
}

/// # Errors
/// Returns an error if required arguments are missing or malformed.
pub fn handler(matches: &ArgMatches) -> Result<Action> {
    let (name, sub) = matches.subcommand().context("no subcommand given")?;
    let globals = globals(sub);

    let action = match name {
        "login" => Action::Login(session::LoginArgs {
            globals,
            email: string(sub, account_args::ARG_EMAIL)?,
            password: secret(sub, account_args::ARG_PASSWORD)?,
            username: sub.get_one::<String>(account_args::ARG_USERNAME).cloned(),
        }),
        "logout" => Action::Logout(globals),
        "status" => Action::Status(globals),
        "profile" => Action::Profile(session::ProfileArgs {
            globals,
            updates: profile_updates(sub)?,
        }),
        "refresh" => Action::Refresh(globals),
        "watch" => Action::Watch(session::WatchArgs {
            globals,
            min_delay: Duration::from_secs(
                sub.get_one::<u64>(account_args::ARG_MIN_DELAY)
                    .copied()
                    .unwrap_or(1),
            ),
        }),
        "register" => Action::Register(signup(globals, sub)?),
        "create-admin" => Action::CreateAdmin(signup(globals, sub)?),
        "verify-email" => Action::VerifyEmail(account::TokenArgs {
            globals,
            token: string(sub, account_args::ARG_TOKEN)?,
        }),
        "reset-password-request" => Action::RequestPasswordReset(account::EmailArgs {
            globals,
            email: string(sub, account_args::ARG_EMAIL)?,
        }),
        "reset-password" => Action::ResetPassword(account::ResetPasswordArgs {
            globals,
            token: string(sub, account_args::ARG_TOKEN)?,
            new_password: secret(sub, account_args::ARG_NEW_PASSWORD)?,
        }),
        "delete-account" => Action::DeleteAccount(account::PasswordArgs {
            globals,
            password: secret(sub, account_args::ARG_PASSWORD)?,
        }),
        "setup-2fa" => Action::Setup2fa(globals),
        "verify-2fa" => Action::Verify2fa(two_factor::VerifyArgs {
            globals,
            code: string(sub, two_factor_args::ARG_CODE)?,
        }),
        "disable-2fa" => Action::Disable2fa(two_factor::DisableArgs {
            globals,
            code: string(sub, two_factor_args::ARG_CODE)?,
            password: secret(sub, account_args::ARG_PASSWORD)?,
        }),
        "decode-token" => Action::DecodeToken(inspect::DecodeArgs {
            globals,
            token: sub.get_one::<String>(inspect_args::ARG_TOKEN).cloned(),
        }),
        "check-route" => Action::CheckRoute(inspect::RouteArgs {
            globals,
            path: string(sub, inspect_args::ARG_PATH)?,
        }),
        other => return Err(anyhow!("unknown subcommand: {other}")),
    };

    Ok(action)
}
