use crate::cli::actions::{account, inspect, session, two_factor, Action};
use anyhow::Result;

/// Execute the provided action.
// This is the single dispatch point for all CLI actions.
/// # Errors
/// Returns an error if the action fails.
pub async fn execute(action: Action) -> Result<()> {
    match action {
        Action::Login(args) => session::login(args).await,
        Action::Logout(globals) => session::logout(&globals),
        Action::Status(globals) => session::status(&globals),
        Action::Profile(args) => session::profile(args).await,
        Action::Refresh(globals) => session::refresh(&globals).await,
        Action::Watch(args) => session::watch(args).await,
        Action::Register(args) => account::register(args).await,
        Action::VerifyEmail(args) => account::verify_email(args).await,
        Action::RequestPasswordReset(args) => account::request_password_reset(args).await,
        Action::ResetPassword(args) => account::reset_password(args).await,
        Action::DeleteAccount(args) => account::delete_account(args).await,
        Action::CreateAdmin(args) => account::create_admin(args).await,
        Action::Setup2fa(globals) => two_factor::setup(&globals).await,
        Action::Verify2fa(args) => two_factor::verify(args).await,
        Action::Disable2fa(args) => two_factor::disable(args).await,
        Action::DecodeToken(args) => inspect::decode_token(&args),
        Action::CheckRoute(args) => inspect::check_route(&args).await,
    }
}
