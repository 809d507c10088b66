//! Single-flight session refresh.
//!
//! The coordinator is either `Idle` or `Refreshing` with a queue of waiters.
//! The first `401` moves it to `Refreshing` and spawns one refresh task;
//! every later `401` only joins the queue. The task owns a drop guard that
//! settles the queue and returns to `Idle` on every exit path, so a panicking
//! or aborted refresh can never leave the flag set. A refresh dropped without
//! panicking (runtime shutdown) fails its waiters but does not force a logout.

use super::{
    request::{ApiRequest, Operation},
    transport::Transport,
};
use crate::{
    api::paths,
    guard::Route,
    session::{markers::MarkerStore, SessionStore},
};
use std::{
    mem,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, MutexGuard, PoisonError,
    },
    thread,
};
use tokio::sync::{broadcast, oneshot};
use tracing::{debug, error, info, warn};

const EVENT_CAPACITY: usize = 16;

/// Notifications for the embedding host.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    /// The session could not be refreshed. Local state has been wiped; the
    /// host should perform a full navigation to `redirect`.
    Terminated { redirect: Route },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RefreshOutcome {
    Refreshed,
    Expired,
}

enum RefreshState {
    Idle,
    Refreshing {
        waiters: Vec<oneshot::Sender<RefreshOutcome>>,
    },
}

#[derive(Clone)]
pub struct RefreshCoordinator {
    inner: Arc<Inner>,
}

struct Inner {
    state: Mutex<RefreshState>,
    transport: Arc<dyn Transport>,
    session: SessionStore,
    markers: Arc<dyn MarkerStore>,
    events: broadcast::Sender<SessionEvent>,
    refreshes: AtomicU64,
}

impl RefreshCoordinator {
    #[must_use]
    pub fn new(
        transport: Arc<dyn Transport>,
        session: SessionStore,
        markers: Arc<dyn MarkerStore>,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(RefreshState::Idle),
                transport,
                session,
                markers,
                events,
                refreshes: AtomicU64::new(0),
            }),
        }
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }

    #[must_use]
    pub fn is_refreshing(&self) -> bool {
        matches!(*self.inner.lock_state(), RefreshState::Refreshing { .. })
    }

    /// Number of callers waiting on the in-flight refresh.
    #[must_use]
    pub fn pending(&self) -> usize {
        match &*self.inner.lock_state() {
            RefreshState::Idle => 0,
            RefreshState::Refreshing { waiters } => waiters.len(),
        }
    }

    /// Refresh calls issued since the coordinator was created.
    #[must_use]
    pub fn refresh_count(&self) -> u64 {
        self.inner.refreshes.load(Ordering::SeqCst)
    }

    /// Waits for a refresh outcome, starting a refresh only if none is in flight.
    pub async fn await_refresh(&self) -> RefreshOutcome {
        let (sender, receiver) = oneshot::channel();

        let leader = {
            let mut state = self.inner.lock_state();
            match &mut *state {
                RefreshState::Refreshing { waiters } => {
                    waiters.push(sender);
                    debug!("joined in-flight refresh, {} waiting", waiters.len());
                    false
                }
                RefreshState::Idle => {
                    *state = RefreshState::Refreshing {
                        waiters: vec![sender],
                    };
                    true
                }
            }
        };

        if leader {
            // the guard exists before the task is first polled
            let guard = SettleGuard {
                inner: Arc::clone(&self.inner),
                settled: false,
            };
            tokio::spawn(drive_refresh(guard));
        }

        // a dropped sender means the refresh never settled cleanly
        receiver.await.unwrap_or(RefreshOutcome::Expired)
    }
}

impl Inner {
    fn lock_state(&self) -> MutexGuard<'_, RefreshState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn take_waiters(&self) -> Vec<oneshot::Sender<RefreshOutcome>> {
        match mem::replace(&mut *self.lock_state(), RefreshState::Idle) {
            RefreshState::Refreshing { waiters } => waiters,
            RefreshState::Idle => Vec::new(),
        }
    }

    /// Returns to `Idle` and resolves every waiter, in arrival order. An
    /// `Expired` outcome forces a logout before anyone resumes.
    fn settle(&self, outcome: RefreshOutcome) {
        let waiters = self.take_waiters();

        if outcome == RefreshOutcome::Expired {
            self.force_logout();
        }

        info!(
            "session refresh settled as {:?}, resuming {} requests",
            outcome,
            waiters.len()
        );

        resume(waiters, outcome);
    }

    /// The refresh task was dropped before it finished, e.g. at runtime
    /// shutdown. Waiters fail as `Expired`; the session and markers stay, as
    /// nothing rejected them.
    fn abandon(&self) {
        let waiters = self.take_waiters();
        warn!(
            "session refresh abandoned, failing {} requests",
            waiters.len()
        );
        resume(waiters, RefreshOutcome::Expired);
    }

    fn force_logout(&self) {
        self.session.clear_auth();

        if let Err(err) = self.markers.clear() {
            warn!("failed to clear persisted markers: {}", err);
        }

        // no subscribers is fine
        let _ = self.events.send(SessionEvent::Terminated {
            redirect: Route::Login,
        });
    }
}

fn resume(waiters: Vec<oneshot::Sender<RefreshOutcome>>, outcome: RefreshOutcome) {
    for waiter in waiters {
        // the caller may have gone away; nothing to resume then
        let _ = waiter.send(outcome);
    }
}

struct SettleGuard {
    inner: Arc<Inner>,
    settled: bool,
}

impl SettleGuard {
    fn settle(&mut self, outcome: RefreshOutcome) {
        self.settled = true;
        self.inner.settle(outcome);
    }
}

impl Drop for SettleGuard {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        if thread::panicking() {
            error!("session refresh panicked");
            self.inner.settle(RefreshOutcome::Expired);
        } else {
            warn!("session refresh dropped before settling");
            self.inner.abandon();
        }
    }
}

async fn drive_refresh(mut guard: SettleGuard) {
    let inner = Arc::clone(&guard.inner);

    inner.refreshes.fetch_add(1, Ordering::SeqCst);
    let request = ApiRequest::post(Operation::Refresh, paths::REFRESH);
    debug!("refreshing session ({})", request.id());

    let outcome = match inner.transport.send(&request).await {
        Ok(response) if response.is_success() => RefreshOutcome::Refreshed,
        Ok(response) => {
            warn!("session refresh rejected: {}", response.status());
            RefreshOutcome::Expired
        }
        Err(err) => {
            warn!("session refresh failed: {}", err);
            RefreshOutcome::Expired
        }
    };

    guard.settle(outcome);
}
