use crate::cli::{actions::print_json, globals::GlobalArgs};
use anyhow::Result;
use secrecy::SecretString;

#[derive(Debug)]
pub struct VerifyArgs {
    pub globals: GlobalArgs,
    pub code: String,
}

#[derive(Debug)]
pub struct DisableArgs {
    pub globals: GlobalArgs,
    pub code: String,
    pub password: SecretString,
}

/// Prints the enrollment secret and QR payload.
/// # Errors
/// Returns API errors.
pub async fn setup(globals: &GlobalArgs) -> Result<()> {
    let store = globals.store()?;
    let response = store.setup_2fa().await?;
    print_json(&response)
}

/// # Errors
/// Returns API errors.
pub async fn verify(args: VerifyArgs) -> Result<()> {
    let store = args.globals.store()?;
    let response = store.verify_2fa(&args.code).await?;
    print_json(&response)
}

/// # Errors
/// Returns API errors.
pub async fn disable(args: DisableArgs) -> Result<()> {
    let store = args.globals.store()?;
    let response = store.disable_2fa(&args.code, &args.password).await?;
    print_json(&response)
}
