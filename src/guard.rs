//! Route gating on the session store. The guard never trusts
//! `is_authenticated` before the session is initialized; it runs the identity
//! check first. UX-only: real access control lives on the API.

use crate::{api::paths, client::Client};
use std::fmt;
use tracing::debug;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Route {
    Start,
    Login,
    Register,
    VerifyAccount,
    ForgotPassword,
    ResetPassword { token: String },
    Home,
    Favorites,
    Settings,
    Chats,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Access {
    /// Requires an authenticated session.
    Protected,
    /// Only for signed-out visitors; signed-in users go home.
    GuestOnly,
    /// Open regardless of session state.
    Public,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Redirect(Route),
}

impl Route {
    /// Where signed-out visitors are sent.
    pub const ENTRY: Self = Self::Login;

    /// Parses an application path, ignoring query strings, fragments and a
    /// trailing slash. The reset token is percent-decoded.
    #[must_use]
    pub fn parse(path: &str) -> Option<Self> {
        let path = path.split(['?', '#']).next().unwrap_or_default().trim();
        let path = path.trim_end_matches('/');

        let route = match path {
            "" => Self::Home,
            "/start" => Self::Start,
            "/login" => Self::Login,
            "/register" => Self::Register,
            "/verify-account" => Self::VerifyAccount,
            "/forgot-password" => Self::ForgotPassword,
            "/favorites" => Self::Favorites,
            "/settings" => Self::Settings,
            "/chats" => Self::Chats,
            other => {
                let token = other.strip_prefix("/reset-password/")?;
                if token.is_empty() || token.contains('/') {
                    return None;
                }
                Self::ResetPassword {
                    token: paths::decode_segment(token),
                }
            }
        };

        Some(route)
    }

    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Self::Start => "/start".to_string(),
            Self::Login => "/login".to_string(),
            Self::Register => "/register".to_string(),
            Self::VerifyAccount => "/verify-account".to_string(),
            Self::ForgotPassword => "/forgot-password".to_string(),
            Self::ResetPassword { token } => {
                format!("/reset-password/{}", paths::encode_segment(token))
            }
            Self::Home => "/".to_string(),
            Self::Favorites => "/favorites".to_string(),
            Self::Settings => "/settings".to_string(),
            Self::Chats => "/chats".to_string(),
        }
    }

    #[must_use]
    pub const fn access(&self) -> Access {
        match self {
            Self::Home | Self::Favorites | Self::Settings | Self::Chats => Access::Protected,
            Self::Start | Self::Login | Self::Register | Self::ForgotPassword => Access::GuestOnly,
            Self::VerifyAccount | Self::ResetPassword { .. } => Access::Public,
        }
    }

    /// Path safe to log: reset tokens are redacted.
    fn log_label(&self) -> String {
        match self {
            Self::ResetPassword { .. } => "/reset-password/***".to_string(),
            other => other.path(),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

#[derive(Clone)]
pub struct RouteGuard {
    client: Client,
}

impl RouteGuard {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Decides whether `route` may be entered, initializing the session first
    /// when needed.
    pub async fn before_enter(&self, route: &Route) -> Decision {
        let session = self.client.ensure_initialized().await;

        let decision = match route.access() {
            Access::Protected if !session.is_authenticated => Decision::Redirect(Route::ENTRY),
            Access::GuestOnly if session.is_authenticated => Decision::Redirect(Route::Home),
            _ => Decision::Allow,
        };

        let decision = match (decision, route) {
            (Decision::Allow, Route::ResetPassword { token }) => {
                if self.client.verify_reset_token(token).await.is_ok() {
                    Decision::Allow
                } else {
                    Decision::Redirect(Route::ENTRY)
                }
            }
            (decision, _) => decision,
        };

        debug!("route {} -> {:?}", route.log_label(), decision);

        decision
    }

    /// Same as [`Self::before_enter`] for a raw path; unknown paths are `None`.
    pub async fn navigate(&self, path: &str) -> Option<Decision> {
        let route = Route::parse(path)?;
        Some(self.before_enter(&route).await)
    }
}
