//! In-process fake of the marketplace API for unit tests. It tracks a single
//! "authorized" flag standing in for the session cookie, and lets tests hold
//! the refresh call open, script its outcome, and inspect every call made.

use crate::{
    api::paths,
    client::Client,
    error::{Error, Result},
    gateway::{ApiRequest, ApiResponse, Operation, RefreshCoordinator, Transport},
    session::markers::MemoryMarkerStore,
};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::json;
use std::{
    collections::{HashMap, HashSet, VecDeque},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};
use tokio::{sync::Semaphore, time::sleep};

pub(crate) const USER_ID: &str = "3f1f7e3c-5b6a-4c4d-9e2f-1a2b3c4d5e6f";
pub(crate) const GOOD_PASSWORD: &str = "correct-horse";

#[derive(Clone, Copy, Debug)]
pub(crate) enum RefreshPlan {
    Succeed,
    Reject,
    Unreachable,
    Panic,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Call {
    pub operation: Operation,
    pub path: String,
    pub retried: bool,
}

/// Refresh gate; starts closed.
struct Gate(Semaphore);

impl Default for Gate {
    fn default() -> Self {
        Self(Semaphore::new(0))
    }
}

#[derive(Default)]
pub(crate) struct FakeApi {
    authorized: AtomicBool,
    gated: AtomicBool,
    gate: Gate,
    plans: Mutex<VecDeque<RefreshPlan>>,
    calls: Mutex<Vec<Call>>,
    bodies: Mutex<HashMap<String, String>>,
    replies: Mutex<HashMap<String, (StatusCode, String)>>,
    always_unauthorized: Mutex<HashSet<String>>,
    unreachable: Mutex<HashSet<String>>,
}

impl FakeApi {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn sign_in(&self) {
        self.authorized.store(true, Ordering::SeqCst);
    }

    pub(crate) fn expire_session(&self) {
        self.authorized.store(false, Ordering::SeqCst);
    }

    /// Holds refresh calls until [`Self::release_refresh`].
    pub(crate) fn gate_refresh(&self) {
        self.gated.store(true, Ordering::SeqCst);
    }

    pub(crate) fn release_refresh(&self) {
        self.gate.0.add_permits(1);
    }

    pub(crate) fn plan_refresh(&self, plan: RefreshPlan) {
        self.plans.lock().unwrap().push_back(plan);
    }

    /// Body returned for `path` while authorized.
    pub(crate) fn body(&self, path: &str, body: &str) {
        self.bodies
            .lock()
            .unwrap()
            .insert(path.to_string(), body.to_string());
    }

    /// Fixed answer for `path`, regardless of the session.
    pub(crate) fn reply(&self, path: &str, status: StatusCode, body: &str) {
        self.replies
            .lock()
            .unwrap()
            .insert(path.to_string(), (status, body.to_string()));
    }

    pub(crate) fn always_unauthorized(&self, path: &str) {
        self.always_unauthorized
            .lock()
            .unwrap()
            .insert(path.to_string());
    }

    pub(crate) fn unreachable(&self, path: &str) {
        self.unreachable.lock().unwrap().insert(path.to_string());
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn calls_to(&self, path: &str) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|call| call.path == path)
            .collect()
    }

    pub(crate) fn refresh_calls(&self) -> usize {
        self.calls_to(paths::REFRESH).len()
    }

    async fn refresh(&self) -> Result<ApiResponse> {
        if self.gated.load(Ordering::SeqCst) {
            self.gate.0.acquire().await.unwrap().forget();
        }

        let plan = self
            .plans
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(RefreshPlan::Succeed);

        match plan {
            RefreshPlan::Succeed => {
                self.sign_in();
                Ok(ApiResponse::new(StatusCode::OK, r#""Sesión renovada""#))
            }
            RefreshPlan::Reject => Ok(unauthorized()),
            RefreshPlan::Unreachable => Err(Error::Network("connection reset".to_string())),
            RefreshPlan::Panic => panic!("refresh transport blew up"),
        }
    }

    fn login(&self, request: &ApiRequest) -> ApiResponse {
        let password = request
            .body()
            .and_then(|body| body.get("password"))
            .and_then(|password| password.as_str());

        if password == Some(GOOD_PASSWORD) {
            self.sign_in();
            ApiResponse::new(StatusCode::OK, r#""Bienvenido""#)
        } else {
            ApiResponse::new(
                StatusCode::UNAUTHORIZED,
                r#"{"error":"Credenciales inválidas"}"#,
            )
        }
    }
}

fn unauthorized() -> ApiResponse {
    ApiResponse::new(StatusCode::UNAUTHORIZED, r#"{"error":"No autorizado"}"#)
}

pub(crate) fn identity_body() -> String {
    json!({
        "user": {
            "id": USER_ID,
            "name": "Ana Pérez",
            "email": "ana@hogar.app",
            "role": "buyer",
            "profilePicture": null
        }
    })
    .to_string()
}

#[async_trait]
impl Transport for FakeApi {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse> {
        self.calls.lock().unwrap().push(Call {
            operation: request.operation(),
            path: request.path().to_string(),
            retried: request.is_retried(),
        });
        // let concurrent callers interleave like real I/O would
        tokio::task::yield_now().await;

        let path = request.path();

        if self.unreachable.lock().unwrap().contains(path) {
            return Err(Error::Network("connection refused".to_string()));
        }
        if let Some((status, body)) = self.replies.lock().unwrap().get(path).cloned() {
            return Ok(ApiResponse::new(status, body));
        }

        match request.operation() {
            Operation::Refresh => return self.refresh().await,
            Operation::Login => return Ok(self.login(request)),
            _ => {}
        }

        let authorized = self.authorized.load(Ordering::SeqCst)
            && !self.always_unauthorized.lock().unwrap().contains(path);
        if !authorized {
            return Ok(unauthorized());
        }

        if request.operation() == Operation::CurrentUser {
            return Ok(ApiResponse::new(StatusCode::OK, identity_body()));
        }
        if request.operation() == Operation::Logout {
            self.expire_session();
        }

        let body = self
            .bodies
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .unwrap_or_else(|| r#""ok""#.to_string());

        Ok(ApiResponse::new(StatusCode::OK, body))
    }
}

pub(crate) fn client(api: &Arc<FakeApi>) -> Client {
    Client::new(
        Arc::clone(api) as Arc<dyn Transport>,
        Arc::new(MemoryMarkerStore::new()),
    )
}

/// Waits until `count` callers are queued behind the in-flight refresh.
pub(crate) async fn wait_for_pending(coordinator: &RefreshCoordinator, count: usize) {
    for _ in 0..500 {
        if coordinator.pending() == count {
            return;
        }
        sleep(Duration::from_millis(2)).await;
    }
    panic!(
        "expected {count} pending requests, found {}",
        coordinator.pending()
    );
}
