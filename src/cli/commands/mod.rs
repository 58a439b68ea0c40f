pub mod account;
pub mod inspect;
pub mod logging;
pub mod two_factor;

use crate::config::{DEFAULT_API_BASE_URL, DEFAULT_TIMEOUT_SECONDS};
use clap::{
    builder::styling::{AnsiColor, Effects, Styles},
    Arg, ColorChoice, Command,
};

pub const ARG_API_URL: &str = "api-url";
pub const ARG_TOKEN_FILE: &str = "token-file";
pub const ARG_TIMEOUT: &str = "timeout";

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let long_version: &'static str = Box::leak(
        format!("{} - {}", env!("CARGO_PKG_VERSION"), crate::GIT_COMMIT_HASH).into_boxed_str(),
    );

    let command = Command::new("authkeeper")
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new(ARG_API_URL)
                .long("api-url")
                .help("Base URL of the auth API")
                .default_value(DEFAULT_API_BASE_URL)
                .env("AUTHKEEPER_API_BASE_URL")
                .global(true),
        )
        .arg(
            Arg::new(ARG_TOKEN_FILE)
                .long("token-file")
                .help("Where the token pair is persisted")
                .long_help(
                    "Where the token pair is persisted. Defaults to $XDG_CONFIG_HOME/authkeeper/tokens.json.",
                )
                .env("AUTHKEEPER_TOKEN_FILE")
                .global(true)
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(
            Arg::new(ARG_TIMEOUT)
                .long("timeout")
                .help("Request timeout in seconds")
                .default_value("10")
                .env("AUTHKEEPER_TIMEOUT")
                .global(true)
                .value_parser(clap::value_parser!(u64).range(1..)),
        );

    let command = account::with_args(command);
    let command = two_factor::with_args(command);
    let command = inspect::with_args(command);
    logging::with_args(command)
}
