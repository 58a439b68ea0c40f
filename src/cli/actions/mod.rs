pub mod account;
pub mod inspect;
pub mod session;
pub mod two_factor;

// Internal "interpreter" for `Action`.
// We keep the match in a separate module so `mod.rs` stays small as more actions are added.
mod run;

use crate::cli::globals::GlobalArgs;
use anyhow::Result;
use serde::Serialize;

#[derive(Debug)]
pub enum Action {
    Login(session::LoginArgs),
    Logout(GlobalArgs),
    Status(GlobalArgs),
    Profile(session::ProfileArgs),
    Refresh(GlobalArgs),
    Watch(session::WatchArgs),
    Register(account::SignupArgs),
    VerifyEmail(account::TokenArgs),
    RequestPasswordReset(account::EmailArgs),
    ResetPassword(account::ResetPasswordArgs),
    DeleteAccount(account::PasswordArgs),
    CreateAdmin(account::SignupArgs),
    Setup2fa(GlobalArgs),
    Verify2fa(two_factor::VerifyArgs),
    Disable2fa(two_factor::DisableArgs),
    DecodeToken(inspect::DecodeArgs),
    CheckRoute(inspect::RouteArgs),
}

impl Action {
    // Convenience wrapper so call sites can do `action.execute().await`.
    /// Execute the action.
    /// # Errors
    /// Returns an error if the action fails.
    pub async fn execute(self) -> Result<()> {
        run::execute(self).await
    }
}

/// Writes a command result to stdout.
fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
