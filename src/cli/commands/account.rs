use clap::{Arg, Command};

pub const CMD_LOGIN: &str = "login";
pub const CMD_LOGOUT: &str = "logout";
pub const CMD_WHOAMI: &str = "whoami";
pub const CMD_REGISTER: &str = "register";
pub const CMD_VERIFY: &str = "verify";
pub const CMD_RESEND_CODE: &str = "resend-code";
pub const CMD_FORGOT_PASSWORD: &str = "forgot-password";
pub const CMD_RESET_PASSWORD: &str = "reset-password";

pub const ARG_EMAIL: &str = "email";
pub const ARG_PASSWORD: &str = "password";
pub const ARG_CONFIRM_PASSWORD: &str = "confirm-password";
pub const ARG_NAME: &str = "name";
pub const ARG_ROLE: &str = "role";
pub const ARG_CODE: &str = "code";
pub const ARG_TOKEN: &str = "token";

fn email(required: bool) -> Arg {
    Arg::new(ARG_EMAIL)
        .short('e')
        .long(ARG_EMAIL)
        .help("Account email address")
        .env("HOGAR_EMAIL")
        .required(required)
}

fn password() -> Arg {
    Arg::new(ARG_PASSWORD)
        .short('p')
        .long(ARG_PASSWORD)
        .help("Account password")
        .env("HOGAR_PASSWORD")
        .hide_env_values(true)
        .required(true)
}

#[must_use]
pub fn with_subcommands(command: Command) -> Command {
    command
        .subcommand(
            Command::new(CMD_LOGIN)
                .about("Sign in and store the session cookie")
                .arg(email(true))
                .arg(password()),
        )
        .subcommand(Command::new(CMD_LOGOUT).about("Sign out and forget the session cookie"))
        .subcommand(Command::new(CMD_WHOAMI).about("Show the signed-in user"))
        .subcommand(
            Command::new(CMD_REGISTER)
                .about("Create an account")
                .arg(
                    Arg::new(ARG_NAME)
                        .short('n')
                        .long(ARG_NAME)
                        .help("Full name")
                        .required(true),
                )
                .arg(email(true))
                .arg(password())
                .arg(
                    Arg::new(ARG_ROLE)
                        .short('r')
                        .long(ARG_ROLE)
                        .help("Account role")
                        .value_parser(["buyer", "seller"])
                        .default_value("buyer"),
                ),
        )
        .subcommand(
            Command::new(CMD_VERIFY)
                .about("Confirm an account with the emailed 6-digit code")
                .arg(
                    Arg::new(ARG_CODE)
                        .help("Verification code")
                        .required(true),
                )
                .arg(email(false).help("Account email (default: the pending registration)")),
        )
        .subcommand(
            Command::new(CMD_RESEND_CODE)
                .about("Send a new verification code")
                .arg(email(false).help("Account email (default: the pending registration)")),
        )
        .subcommand(
            Command::new(CMD_FORGOT_PASSWORD)
                .about("Request a password reset link")
                .arg(email(true)),
        )
        .subcommand(
            Command::new(CMD_RESET_PASSWORD)
                .about("Set a new password with a reset token")
                .arg(
                    Arg::new(ARG_TOKEN)
                        .short('t')
                        .long(ARG_TOKEN)
                        .help("Reset token from the emailed link")
                        .required(true),
                )
                .arg(password().help("New password"))
                .arg(
                    Arg::new(ARG_CONFIRM_PASSWORD)
                        .long(ARG_CONFIRM_PASSWORD)
                        .help("New password, again")
                        .env("HOGAR_CONFIRM_PASSWORD")
                        .hide_env_values(true)
                        .required(true),
                ),
        )
}
