//! # Hogar (marketplace API client)
//!
//! `hogar` talks to the Hogar real-estate marketplace API on behalf of a user.
//! Sessions are cookie based: the server sets an `HttpOnly` session cookie on
//! login and rotates it through `POST /auth/refresh`.
//!
//! ## Authenticated Request Gateway
//!
//! Every call goes through [`gateway::Gateway::submit`]. When a request comes
//! back `401 Unauthorized` the gateway asks the [`gateway::RefreshCoordinator`]
//! for a fresh session:
//!
//! - Only one refresh call is in flight at a time. Requests that fail while a
//!   refresh is running wait for its outcome instead of starting another one.
//! - After a successful refresh each waiting request is replayed exactly once.
//!   A replay that fails with `401` again surfaces as
//!   [`Error::SessionExpired`].
//! - When the refresh fails every waiting request fails with
//!   [`Error::SessionExpired`], the [`session::SessionStore`] is cleared, the
//!   persisted markers are wiped and a [`gateway::SessionEvent::Terminated`]
//!   notification is broadcast so the host can navigate to the login entry.
//!
//! Login, refresh and identity lookups never trigger a refresh themselves.
//!
//! ## Route Guard
//!
//! [`guard::RouteGuard`] waits for the session to be initialized before
//! deciding whether a route may be entered. It is a UX aid; the API remains
//! the only real access control.

pub mod api;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod gateway;
pub mod guard;
pub mod session;
pub mod validation;

#[cfg(test)]
pub(crate) mod test_support;

pub use self::client::Client;
pub use self::error::{Error, Result};

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
        assert!(
            GIT_COMMIT_HASH.len() >= 7,
            "GIT_COMMIT_HASH should be at least 7 characters long, got: {GIT_COMMIT_HASH}"
        );
    }

    #[test]
    fn test_app_user_agent_format() {
        assert!(APP_USER_AGENT.starts_with(env!("CARGO_PKG_NAME")));
        assert!(APP_USER_AGENT.contains(env!("CARGO_PKG_VERSION")));
    }
}
