use crate::config::ClientConfig;
use std::path::PathBuf;

/// Settings shared by every action.
#[derive(Debug, Clone)]
pub struct GlobalArgs {
    pub config: ClientConfig,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn cookie_file(&self) -> PathBuf {
        self.config.cookie_file()
    }

    #[must_use]
    pub fn marker_file(&self) -> PathBuf {
        self.config.marker_file()
    }
}
