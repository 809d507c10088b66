//! Process-wide auth state. The store is the single source of truth for "who
//! is logged in"; readers take synchronous snapshots or subscribe to changes,
//! and only the operations below mutate it. Only non-sensitive identity
//! metadata is kept in memory; the session cookie stays in the transport.

pub mod markers;

use crate::{error::Result, validation::Role};
use serde::{Deserialize, Serialize};
use std::{
    future::Future,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};
use tokio::sync::watch;
use tracing::debug;
use uuid::Uuid;

/// The signed-in user as reported by the identity endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub profile_picture: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Session {
    pub user: Option<Identity>,
    pub is_authenticated: bool,
    /// Set once the first identity check has finished; guards wait for it.
    pub is_initialized: bool,
    pub is_loading: bool,
}

#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<Inner>,
}

struct Inner {
    state: watch::Sender<Session>,
    in_flight: AtomicUsize,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    #[must_use]
    pub fn new() -> Self {
        let (state, _) = watch::channel(Session::default());
        Self {
            inner: Arc::new(Inner {
                state,
                in_flight: AtomicUsize::new(0),
            }),
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> Session {
        self.inner.state.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.inner.state.subscribe()
    }

    /// Resolves the current identity with `fetch` and records the outcome.
    /// Any failure is absorbed into an unauthenticated, initialized session.
    pub async fn check_auth<F>(&self, fetch: F) -> Session
    where
        F: Future<Output = Result<Identity>>,
    {
        let loading = LoadingGuard::begin(&self.inner);

        let result = fetch.await;

        self.inner.state.send_modify(|session| {
            match result {
                Ok(user) => {
                    debug!("session hydrated for user {}", user.id);
                    session.user = Some(user);
                    session.is_authenticated = true;
                }
                Err(err) => {
                    debug!("no active session: {}", err);
                    session.user = None;
                    session.is_authenticated = false;
                }
            }
            session.is_initialized = true;
        });

        drop(loading);
        self.snapshot()
    }

    /// Resets to unauthenticated; `is_initialized` is left as is.
    pub fn clear_auth(&self) {
        self.inner.state.send_modify(|session| {
            session.user = None;
            session.is_authenticated = false;
        });
    }

    pub fn set_user(&self, user: Option<Identity>) {
        self.inner.state.send_modify(|session| {
            session.is_authenticated = user.is_some();
            session.user = user;
            session.is_initialized = true;
        });
    }

    pub fn login(&self, user: Identity) {
        self.set_user(Some(user));
    }

    pub fn logout(&self) {
        self.clear_auth();
    }

    /// Waits until the first identity check has completed.
    pub async fn wait_initialized(&self) -> Session {
        let mut receiver = self.subscribe();
        let initialized = receiver
            .wait_for(|session| session.is_initialized)
            .await
            .map(|session| session.clone());
        // the sender lives in `self`, so the channel cannot close here
        initialized.unwrap_or_else(|_| self.snapshot())
    }
}

/// Keeps `is_loading` true while at least one identity check is running,
/// including checks that are cancelled mid-flight.
struct LoadingGuard<'a> {
    inner: &'a Inner,
}

impl<'a> LoadingGuard<'a> {
    fn begin(inner: &'a Inner) -> Self {
        inner.state.send_modify(|session| {
            inner.in_flight.fetch_add(1, Ordering::SeqCst);
            session.is_loading = true;
        });
        Self { inner }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        let inner = self.inner;
        inner.state.send_modify(|session| {
            let previous = inner.in_flight.fetch_sub(1, Ordering::SeqCst);
            session.is_loading = previous > 1;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::time::Duration;
    use tokio::time::sleep;

    fn identity() -> Identity {
        Identity {
            id: Uuid::new_v4(),
            name: "Ana Pérez".to_string(),
            email: "ana@hogar.app".to_string(),
            role: Some(Role::Buyer),
            profile_picture: None,
        }
    }

    #[tokio::test]
    async fn check_auth_success_authenticates() {
        let store = SessionStore::new();
        let user = identity();
        let expected = user.clone();

        let session = store.check_auth(async move { Ok(user) }).await;

        assert_eq!(session.user, Some(expected));
        assert!(session.is_authenticated);
        assert!(session.is_initialized);
        assert!(!session.is_loading);
    }

    #[tokio::test]
    async fn check_auth_failure_is_absorbed() {
        let store = SessionStore::new();
        store.login(identity());

        let session = store
            .check_auth(async {
                Err(Error::Http {
                    status: 401,
                    message: "No autorizado".to_string(),
                })
            })
            .await;

        assert_eq!(session.user, None);
        assert!(!session.is_authenticated);
        assert!(session.is_initialized);
        assert!(!session.is_loading);
    }

    #[tokio::test]
    async fn clear_auth_keeps_initialized() {
        let store = SessionStore::new();
        store.set_user(Some(identity()));
        store.clear_auth();

        let session = store.snapshot();
        assert!(!session.is_authenticated);
        assert!(session.user.is_none());
        assert!(session.is_initialized);

        let fresh = SessionStore::new();
        fresh.clear_auth();
        assert!(!fresh.snapshot().is_initialized);
    }

    #[tokio::test]
    async fn overlapping_checks_do_not_leave_loading_stuck() {
        let store = SessionStore::new();

        let slow = {
            let store = store.clone();
            tokio::spawn(async move {
                store
                    .check_auth(async {
                        sleep(Duration::from_millis(40)).await;
                        Ok(identity())
                    })
                    .await
            })
        };
        let fast = {
            let store = store.clone();
            tokio::spawn(async move {
                store
                    .check_auth(async {
                        sleep(Duration::from_millis(5)).await;
                        Err(Error::Network("down".to_string()))
                    })
                    .await
            })
        };

        let fast = fast.await.unwrap();
        // the slow check is still running
        assert!(fast.is_loading);
        let slow = slow.await.unwrap();

        assert!(!slow.is_loading);
        // last write wins
        assert!(slow.is_authenticated);
        assert!(!store.snapshot().is_loading);
    }

    #[tokio::test]
    async fn cancelled_check_releases_loading() {
        let store = SessionStore::new();
        let check = store.check_auth(std::future::pending::<Result<Identity>>());
        let _ = tokio::time::timeout(Duration::from_millis(10), check).await;

        let session = store.snapshot();
        assert!(!session.is_loading);
        assert!(!session.is_initialized);
    }

    #[tokio::test]
    async fn wait_initialized_resolves_after_first_check() {
        let store = SessionStore::new();
        let waiter = {
            let store = store.clone();
            tokio::spawn(async move { store.wait_initialized().await })
        };

        sleep(Duration::from_millis(5)).await;
        assert!(!waiter.is_finished());

        store.set_user(None);
        let session = waiter.await.unwrap();
        assert!(session.is_initialized);
        assert!(!session.is_authenticated);
    }
}
