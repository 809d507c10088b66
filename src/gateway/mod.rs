//! Authenticated request gateway: sends requests through the credential
//! transport and recovers from expired sessions through the refresh
//! coordinator. Callers only ever see their own request's outcome.

mod coordinator;
mod request;
mod transport;


pub use self::coordinator::{RefreshCoordinator, RefreshOutcome, SessionEvent};
pub use self::request::{ApiRequest, ApiResponse, Operation};
pub use self::transport::{remove_cookie_file, HttpTransport, Transport};

use crate::{
    error::{Error, Result},
    session::{markers::MarkerStore, SessionStore},
};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, warn};

#[derive(Clone)]
pub struct Gateway {
    transport: Arc<dyn Transport>,
    coordinator: RefreshCoordinator,
}

impl Gateway {
    #[must_use]
    pub fn new(
        transport: Arc<dyn Transport>,
        session: SessionStore,
        markers: Arc<dyn MarkerStore>,
    ) -> Self {
        let coordinator = RefreshCoordinator::new(Arc::clone(&transport), session, markers);
        Self {
            transport,
            coordinator,
        }
    }

    #[must_use]
    pub fn coordinator(&self) -> &RefreshCoordinator {
        &self.coordinator
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.coordinator.subscribe()
    }

    /// Sends `request`, refreshing the session and replaying once on `401`.
    ///
    /// Non-`401` answers of any status are returned as they are; callers turn
    /// them into errors with [`ApiResponse::error_for_status`].
    ///
    /// # Errors
    /// Returns [`Error::SessionExpired`] when the session cannot be refreshed
    /// or the replay is rejected again, and transport errors unchanged.
    pub async fn submit(&self, mut request: ApiRequest) -> Result<ApiResponse> {
        loop {
            let response = self.transport.send(&request).await?;

            if !response.is_unauthorized() || request.operation().exempt_from_refresh() {
                return Ok(response);
            }

            if request.is_retried() {
                warn!(
                    "{} {} rejected after session refresh ({})",
                    request.method(),
                    request.path(),
                    request.id()
                );
                return Err(Error::SessionExpired);
            }

            request.mark_retried();
            debug!(
                "{} {} unauthorized, waiting for session refresh ({})",
                request.method(),
                request.path(),
                request.id()
            );

            if self.coordinator.await_refresh().await == RefreshOutcome::Expired {
                return Err(Error::SessionExpired);
            }
        }
    }
}
