use clap::{Arg, ArgAction, Command};

pub const CMD_PROPERTIES: &str = "properties";
pub const CMD_ROUTE: &str = "route";

pub const ARG_JSON: &str = "json";
pub const ARG_PATH: &str = "path";

#[must_use]
pub fn with_subcommands(command: Command) -> Command {
    command
        .subcommand(
            Command::new(CMD_PROPERTIES)
                .about("List active properties")
                .arg(
                    Arg::new(ARG_JSON)
                        .long(ARG_JSON)
                        .help("Print the raw listing page as JSON")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new(CMD_ROUTE)
                .about("Check whether an app route may be entered with the current session")
                .arg(
                    Arg::new(ARG_PATH)
                        .help("App path, example: /favorites")
                        .required(true),
                ),
        )
}
