use clap::{Arg, Command};

pub const ARG_TOKEN: &str = "token";
pub const ARG_PATH: &str = "path";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .subcommand(
            Command::new("decode-token")
                .about("Print a token's claims without verifying it")
                .arg(
                    Arg::new(ARG_TOKEN)
                        .help("Token to decode, defaults to the stored access token"),
                ),
        )
        .subcommand(
            Command::new("check-route")
                .about("Evaluate the navigation guard for a path")
                .arg(Arg::new(ARG_PATH).help("View path, e.g. /dashboard").required(true)),
        )
}
