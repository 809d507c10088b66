//! Client configuration: API origin, request timeout and the directory that
//! holds client-local state (session cookies and markers). Values come from
//! CLI flags or `HOGAR_*` environment variables; nothing here is secret.

use crate::error::{Error, Result};
use std::{
    env,
    path::{Path, PathBuf},
    time::Duration,
};
use url::Url;

/// Default request timeout applied by the HTTP transport.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

const STATE_DIR_NAME: &str = ".hogar";
const COOKIE_FILE: &str = "cookies";
const MARKER_FILE: &str = "markers.json";

#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub api_base_url: Url,
    pub timeout: Duration,
    pub state_dir: PathBuf,
}

impl ClientConfig {
    /// # Errors
    /// Returns an error if the base URL is blank, unparsable, or not http(s).
    pub fn new(api_base_url: &str, state_dir: impl Into<PathBuf>) -> Result<Self> {
        let raw = normalize_value(api_base_url)
            .ok_or_else(|| Error::Config("API base URL is not configured.".to_string()))?;
        let api_base_url = Url::parse(&raw)
            .map_err(|err| Error::Config(format!("Invalid API base URL {raw}: {err}")))?;

        match api_base_url.scheme() {
            "http" | "https" => {}
            scheme => {
                return Err(Error::Config(format!(
                    "Unsupported API base URL scheme: {scheme}"
                )))
            }
        }

        Ok(Self {
            api_base_url,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            state_dir: state_dir.into(),
        })
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Absolute URL for an API path.
    #[must_use]
    pub fn endpoint_url(&self, path: &str) -> String {
        build_url_with_base(self.api_base_url.as_str(), path)
    }

    #[must_use]
    pub fn cookie_file(&self) -> PathBuf {
        self.state_dir.join(COOKIE_FILE)
    }

    #[must_use]
    pub fn marker_file(&self) -> PathBuf {
        self.state_dir.join(MARKER_FILE)
    }
}

/// `$HOME/.hogar`, or `.hogar` in the working directory when `HOME` is unset.
#[must_use]
pub fn default_state_dir() -> PathBuf {
    env::var_os("HOME")
        .filter(|home| !home.is_empty())
        .map_or_else(
            || PathBuf::from(STATE_DIR_NAME),
            |home| Path::new(&home).join(STATE_DIR_NAME),
        )
}

/// Joins a base URL and a path with exactly one slash between them.
#[must_use]
pub fn build_url_with_base(base_url: &str, path: &str) -> String {
    let base = base_url.trim().trim_end_matches('/');
    let path = path.trim();

    if base.is_empty() {
        path.to_string()
    } else {
        format!("{}/{}", base, path.trim_start_matches('/'))
    }
}

fn normalize_value(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
