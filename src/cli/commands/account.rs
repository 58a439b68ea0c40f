//! Session and account subcommands.

use clap::{Arg, ArgAction, Command};

pub const ARG_EMAIL: &str = "email";
pub const ARG_PASSWORD: &str = "password";
pub const ARG_PASSWORD_CONFIRM: &str = "password-confirm";
pub const ARG_NEW_PASSWORD: &str = "new-password";
pub const ARG_USERNAME: &str = "username";
pub const ARG_TOKEN: &str = "token";
pub const ARG_SET: &str = "set";
pub const ARG_MIN_DELAY: &str = "min-delay";

fn email(required: bool) -> Arg {
    Arg::new(ARG_EMAIL)
        .short('e')
        .long("email")
        .help("Account email address")
        .env("AUTHKEEPER_EMAIL")
        .required(required)
}

fn password() -> Arg {
    Arg::new(ARG_PASSWORD)
        .short('P')
        .long("password")
        .help("Account password")
        .env("AUTHKEEPER_PASSWORD")
        .hide_env_values(true)
        .required(true)
}

fn username() -> Arg {
    Arg::new(ARG_USERNAME)
        .short('u')
        .long("username")
        .help("Username")
}

fn token(help: &'static str) -> Arg {
    Arg::new(ARG_TOKEN).help(help).required(true)
}

fn signup(name: &'static str, about: &'static str) -> Command {
    Command::new(name)
        .about(about)
        .arg(email(true))
        .arg(password())
        .arg(
            Arg::new(ARG_PASSWORD_CONFIRM)
                .long("password-confirm")
                .help("Password confirmation, defaults to --password")
                .hide_env_values(true),
        )
        .arg(username())
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .subcommand(
            Command::new("login")
                .about("Log in and persist the token pair")
                .arg(email(true))
                .arg(password())
                .arg(username()),
        )
        .subcommand(Command::new("logout").about("Forget the stored tokens"))
        .subcommand(Command::new("status").about("Show the current session"))
        .subcommand(
            Command::new("profile")
                .about("Show or update the user profile")
                .arg(
                    Arg::new(ARG_SET)
                        .long("set")
                        .help("Profile field to update, as key=value")
                        .value_name("KEY=VALUE")
                        .action(ArgAction::Append),
                ),
        )
        .subcommand(
            Command::new("refresh").about("Exchange the refresh token for a new access token"),
        )
        .subcommand(
            Command::new("watch")
                .about("Keep the access token fresh until interrupted")
                .arg(
                    Arg::new(ARG_MIN_DELAY)
                        .long("min-delay")
                        .help("Minimum seconds between renewals")
                        .default_value("1")
                        .value_parser(clap::value_parser!(u64)),
                ),
        )
        .subcommand(signup("register", "Create a new account"))
        .subcommand(
            Command::new("verify-email")
                .about("Confirm an email address")
                .arg(token("Verification token from the email link")),
        )
        .subcommand(
            Command::new("reset-password-request")
                .about("Send a password reset email")
                .arg(email(true)),
        )
        .subcommand(
            Command::new("reset-password")
                .about("Set a new password with a reset token")
                .arg(token("Reset token from the email link"))
                .arg(
                    Arg::new(ARG_NEW_PASSWORD)
                        .short('n')
                        .long("new-password")
                        .help("New password")
                        .env("AUTHKEEPER_NEW_PASSWORD")
                        .hide_env_values(true)
                        .required(true),
                ),
        )
        .subcommand(
            Command::new("delete-account")
                .about("Delete the account and end the session")
                .arg(password()),
        )
        .subcommand(signup("create-admin", "Create an admin account (staff only)"))
}
