//! Maps validated CLI matches to an action and the shared client settings.

use crate::cli::{
    actions::Action,
    commands::{account, api, browse},
    globals::GlobalArgs,
};
use crate::validation::Role;
use anyhow::{Context, Result};
use clap::ArgMatches;
use secrecy::SecretString;

fn required(matches: &ArgMatches, id: &str) -> Result<String> {
    matches
        .get_one::<String>(id)
        .cloned()
        .with_context(|| format!("missing required argument: --{id}"))
}

fn optional(matches: &ArgMatches, id: &str) -> Option<String> {
    matches
        .get_one::<String>(id)
        .cloned()
        .filter(|v| !v.trim().is_empty())
}

fn secret(matches: &ArgMatches, id: &str) -> Result<SecretString> {
    required(matches, id).map(SecretString::from)
}

/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &ArgMatches) -> Result<(Action, GlobalArgs)> {
    let config = api::Options::parse(matches)?
        .into_config()
        .context("invalid HOGAR_API_URL")?;

    let action = match matches.subcommand() {
        Some((account::CMD_LOGIN, sub)) => Action::Login {
            email: required(sub, account::ARG_EMAIL)?,
            password: secret(sub, account::ARG_PASSWORD)?,
        },
        Some((account::CMD_LOGOUT, _)) => Action::Logout,
        Some((account::CMD_WHOAMI, _)) => Action::Whoami,
        Some((account::CMD_REGISTER, sub)) => Action::Register {
            name: required(sub, account::ARG_NAME)?,
            email: required(sub, account::ARG_EMAIL)?,
            password: secret(sub, account::ARG_PASSWORD)?,
            role: required(sub, account::ARG_ROLE)?
                .parse::<Role>()
                .context("invalid --role")?,
        },
        Some((account::CMD_VERIFY, sub)) => Action::Verify {
            email: optional(sub, account::ARG_EMAIL),
            code: required(sub, account::ARG_CODE)?,
        },
        Some((account::CMD_RESEND_CODE, sub)) => Action::ResendCode {
            email: optional(sub, account::ARG_EMAIL),
        },
        Some((account::CMD_FORGOT_PASSWORD, sub)) => Action::ForgotPassword {
            email: required(sub, account::ARG_EMAIL)?,
        },
        Some((account::CMD_RESET_PASSWORD, sub)) => Action::ResetPassword {
            token: required(sub, account::ARG_TOKEN)?,
            password: secret(sub, account::ARG_PASSWORD)?,
            confirm_password: secret(sub, account::ARG_CONFIRM_PASSWORD)?,
        },
        Some((browse::CMD_PROPERTIES, sub)) => Action::Properties {
            json: sub.get_flag(browse::ARG_JSON),
        },
        Some((browse::CMD_ROUTE, sub)) => Action::Route {
            path: required(sub, browse::ARG_PATH)?,
        },
        Some((other, _)) => anyhow::bail!("unknown command: {other}"),
        None => anyhow::bail!("missing command"),
    };

    Ok((action, GlobalArgs::new(config)))
}
