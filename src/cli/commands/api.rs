use crate::config::{default_state_dir, ClientConfig, DEFAULT_TIMEOUT_SECS};
use clap::{Arg, ArgMatches, Command};
use std::{path::PathBuf, time::Duration};

pub const ARG_API_URL: &str = "api-url";
pub const ARG_STATE_DIR: &str = "state-dir";
pub const ARG_TIMEOUT: &str = "timeout";

#[derive(Debug)]
pub struct Options {
    pub api_url: String,
    pub state_dir: PathBuf,
    pub timeout: u64,
}

impl Options {
    /// Parse API connection arguments from matches.
    ///
    /// # Errors
    /// Returns an error if the API URL is missing or blank.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        let api_url = matches
            .get_one::<String>(ARG_API_URL)
            .cloned()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| anyhow::anyhow!("missing required argument: --{ARG_API_URL}"))?;

        // clap may pass through an empty HOGAR_STATE_DIR
        let state_dir = matches
            .get_one::<String>(ARG_STATE_DIR)
            .filter(|v| !v.trim().is_empty())
            .map_or_else(default_state_dir, PathBuf::from);

        Ok(Self {
            api_url,
            state_dir,
            timeout: matches
                .get_one::<u64>(ARG_TIMEOUT)
                .copied()
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
        })
    }

    /// # Errors
    /// Returns an error if the API URL is not a usable http(s) URL.
    pub fn into_config(self) -> crate::Result<ClientConfig> {
        Ok(ClientConfig::new(&self.api_url, self.state_dir)?
            .with_timeout(Duration::from_secs(self.timeout)))
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_API_URL)
                .short('u')
                .long(ARG_API_URL)
                .help("Marketplace API base URL, example: https://api.hogar.app")
                .env("HOGAR_API_URL")
                .global(true),
        )
        .arg(
            Arg::new(ARG_STATE_DIR)
                .long(ARG_STATE_DIR)
                .help("Directory for the session cookie and local markers (default: $HOME/.hogar)")
                .env("HOGAR_STATE_DIR")
                .global(true),
        )
        .arg(
            Arg::new(ARG_TIMEOUT)
                .long(ARG_TIMEOUT)
                .help("Request timeout in seconds")
                .env("HOGAR_TIMEOUT")
                .default_value("10")
                .global(true)
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
}
