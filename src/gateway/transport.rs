//! Credential transport. Requests carry the session cookie through the
//! client's cookie jar; nothing in the gateway reads or writes the credential
//! itself. The CLI persists the jar between runs through
//! [`HttpTransport::load_cookies`] and [`HttpTransport::save_cookies`].

use super::request::{ApiRequest, ApiResponse};
use crate::{
    api::paths,
    config::ClientConfig,
    error::{Error, Result},
    APP_USER_AGENT,
};
use async_trait::async_trait;
use reqwest::{
    cookie::{CookieStore, Jar},
    Client,
};
use std::{
    fs,
    io::{ErrorKind, Write},
    path::Path,
    sync::Arc,
};
use tracing::{debug, info_span, Instrument};
use url::Url;

const PATH_ATTRIBUTE: &str = "; Path=";

/// Sends one request and returns the upstream answer, whatever its status.
#[async_trait]
pub trait Transport: Send + Sync {
    /// # Errors
    /// Returns an error only when no HTTP response was obtained.
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse>;
}

pub struct HttpTransport {
    client: Client,
    config: ClientConfig,
    jar: Arc<Jar>,
}

impl HttpTransport {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let jar = Arc::new(Jar::default());
        let client = Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(config.timeout)
            .cookie_provider(Arc::clone(&jar))
            .build()
            .map_err(|err| Error::Config(format!("Failed to build HTTP client: {err}")))?;

        Ok(Self {
            client,
            config,
            jar,
        })
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Restores cookies saved by [`Self::save_cookies`]. A missing file is not an error.
    /// Lines without a path scope apply to the whole origin.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read.
    pub fn load_cookies(&self, path: &Path) -> Result<usize> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(0),
            Err(err) => return Err(err.into()),
        };

        let mut restored = 0;
        for line in contents.lines().map(str::trim).filter(|line| !line.is_empty()) {
            let cookie = if line.contains(PATH_ATTRIBUTE) {
                line.to_string()
            } else {
                format!("{line}{PATH_ATTRIBUTE}/")
            };
            self.jar.add_cookie_str(&cookie, &self.config.api_base_url);
            restored += 1;
        }

        debug!("restored {} cookies from {}", restored, path.display());

        Ok(restored)
    }

    /// Writes the cookies the jar holds for the API origin, one
    /// `name=value; Path=...` per line, readable only by the owner. An empty
    /// jar removes the file.
    ///
    /// The jar only reveals cookies per request URL, so every path the client
    /// calls is queried, shallowest first, and each cookie is stored with the
    /// first path it showed up on.
    ///
    /// # Errors
    /// Returns an error if the file cannot be written.
    pub fn save_cookies(&self, path: &Path) -> Result<usize> {
        let mut lines: Vec<String> = Vec::new();
        let mut seen: Vec<String> = Vec::new();

        for scope in cookie_scopes(&self.config.api_base_url) {
            let mut url = self.config.api_base_url.clone();
            url.set_path(&scope);

            for pair in self.cookie_pairs(&url) {
                if seen.contains(&pair) {
                    continue;
                }
                lines.push(format!("{pair}{PATH_ATTRIBUTE}{scope}"));
                seen.push(pair);
            }
        }

        if lines.is_empty() {
            remove_cookie_file(path)?;
            return Ok(0);
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut file = owner_only_file(path)?;
        file.write_all(lines.join("\n").as_bytes())?;
        file.write_all(b"\n")?;

        Ok(lines.len())
    }

    fn cookie_pairs(&self, url: &Url) -> Vec<String> {
        self.jar
            .cookies(url)
            .as_ref()
            .and_then(|value| value.to_str().ok())
            .map(|value| {
                value
                    .split(';')
                    .map(str::trim)
                    .filter(|pair| !pair.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Paths a cookie may be scoped to: the root, the base path, every endpoint
/// and each of their parents. Sorted by length, so a prefix always comes
/// before the paths it covers.
fn cookie_scopes(base_url: &Url) -> Vec<String> {
    let base = base_url.path().trim_end_matches('/');
    let mut scopes = vec!["/".to_string()];

    for endpoint in paths::ALL {
        let mut prefix = String::new();
        for segment in format!("{base}{endpoint}")
            .split('/')
            .filter(|segment| !segment.is_empty())
        {
            prefix.push('/');
            prefix.push_str(segment);
            if !scopes.contains(&prefix) {
                scopes.push(prefix.clone());
            }
        }
    }

    scopes.sort_by_key(String::len);
    scopes
}

/// Deletes persisted cookies; a missing file is fine.
///
/// # Errors
/// Returns an error if the file exists but cannot be removed.
pub fn remove_cookie_file(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err.into()),
    }
}

#[cfg(unix)]
fn owner_only_file(path: &Path) -> std::io::Result<fs::File> {
    use std::os::unix::fs::OpenOptionsExt;

    fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
}

#[cfg(not(unix))]
fn owner_only_file(path: &Path) -> std::io::Result<fs::File> {
    fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
}

/// Maps transport failures into `Error` variants with timeout detection.
fn map_request_error(err: &reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::Timeout("Request timed out. Please try again.".to_string())
    } else {
        Error::Network(format!("Unable to reach the server: {err}"))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse> {
        let url = self.config.endpoint_url(request.path());

        let span = info_span!(
            "http.request",
            http.method = %request.method(),
            url = %url,
            operation = %request.operation(),
            request_id = %request.id(),
            retried = request.is_retried()
        );

        let mut builder = self.client.request(request.method().clone(), &url);
        if let Some(body) = request.body() {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .instrument(span)
            .await
            .map_err(|err| map_request_error(&err))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| map_request_error(&err))?;

        debug!(
            "{} {} -> {} ({})",
            request.method(),
            request.path(),
            status,
            request.id()
        );

        Ok(ApiResponse::new(status, body))
    }
}
