use super::account::ARG_PASSWORD;
use clap::{Arg, Command};

pub const ARG_CODE: &str = "code";

fn code() -> Arg {
    Arg::new(ARG_CODE)
        .help("Six digit code from the authenticator app")
        .required(true)
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .subcommand(Command::new("setup-2fa").about("Start two-factor enrollment"))
        .subcommand(
            Command::new("verify-2fa")
                .about("Confirm two-factor enrollment")
                .arg(code()),
        )
        .subcommand(
            Command::new("disable-2fa")
                .about("Turn off two-factor authentication")
                .arg(code())
                .arg(
                    Arg::new(ARG_PASSWORD)
                        .short('P')
                        .long("password")
                        .help("Account password")
                        .env("AUTHKEEPER_PASSWORD")
                        .hide_env_values(true)
                        .required(true),
                ),
        )
}
