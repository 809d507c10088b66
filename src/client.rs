use crate::{
    gateway::{Gateway, SessionEvent, Transport},
    session::{
        markers::{MarkerStore, PENDING_VERIFICATION_EMAIL},
        Session, SessionStore,
    },
};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::warn;

/// Entry point for applications: owns the gateway, the session store and the
/// marker store, and exposes the marketplace operations (see [`crate::api`]).
#[derive(Clone)]
pub struct Client {
    gateway: Gateway,
    session: SessionStore,
    markers: Arc<dyn MarkerStore>,
}

impl Client {
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, markers: Arc<dyn MarkerStore>) -> Self {
        let session = SessionStore::new();
        let gateway = Gateway::new(transport, session.clone(), Arc::clone(&markers));
        Self {
            gateway,
            session,
            markers,
        }
    }

    #[must_use]
    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    #[must_use]
    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    #[must_use]
    pub fn markers(&self) -> &Arc<dyn MarkerStore> {
        &self.markers
    }

    /// Forced-logout notifications.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.gateway.subscribe()
    }

    /// Hydrates the session from the identity endpoint. Never fails.
    pub async fn check_auth(&self) -> Session {
        self.session.check_auth(self.current_user()).await
    }

    /// Returns the session, running the first identity check if it has not
    /// happened yet.
    pub async fn ensure_initialized(&self) -> Session {
        let session = self.session.snapshot();
        if session.is_initialized {
            session
        } else {
            self.check_auth().await
        }
    }

    /// The email address waiting for its verification code, if any.
    #[must_use]
    pub fn pending_verification_email(&self) -> Option<String> {
        match self.markers.get(PENDING_VERIFICATION_EMAIL) {
            Ok(email) => email,
            Err(err) => {
                warn!("failed to read pending verification marker: {}", err);
                None
            }
        }
    }

    pub(crate) fn remember_pending_verification(&self, email: &str) {
        if let Err(err) = self.markers.set(PENDING_VERIFICATION_EMAIL, email) {
            warn!("failed to store pending verification marker: {}", err);
        }
    }

    pub(crate) fn forget_pending_verification(&self) {
        if let Err(err) = self.markers.remove(PENDING_VERIFICATION_EMAIL) {
            warn!("failed to remove pending verification marker: {}", err);
        }
    }
}
