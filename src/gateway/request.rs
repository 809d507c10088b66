use crate::error::{Error, Result};
use reqwest::{Method, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::fmt;
use ulid::Ulid;

/// Maximum number of error body characters surfaced to callers.
const MAX_ERROR_CHARS: usize = 200;

/// Logical identity of an upstream call.
///
/// The refresh coordinator decides by operation, not by URL, whether a `401`
/// may trigger a refresh.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    Login,
    Logout,
    Register,
    VerifyAccount,
    ResendVerificationCode,
    ForgotPassword,
    VerifyResetToken,
    ResetPassword,
    Refresh,
    CurrentUser,
    /// Any marketplace resource (properties, favorites, ...).
    Resource,
}

impl Operation {
    /// Calls whose `401` means "bad credentials" or "no session" rather than
    /// "stale session". Refreshing on them would loop.
    #[must_use]
    pub const fn exempt_from_refresh(self) -> bool {
        matches!(self, Self::Login | Self::Refresh | Self::CurrentUser)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::Logout => "logout",
            Self::Register => "register",
            Self::VerifyAccount => "verify_account",
            Self::ResendVerificationCode => "resend_verification_code",
            Self::ForgotPassword => "forgot_password",
            Self::VerifyResetToken => "verify_reset_token",
            Self::ResetPassword => "reset_password",
            Self::Refresh => "refresh",
            Self::CurrentUser => "current_user",
            Self::Resource => "resource",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A replayable outbound call.
#[derive(Clone, Debug)]
pub struct ApiRequest {
    id: Ulid,
    operation: Operation,
    method: Method,
    path: String,
    body: Option<Value>,
    retried: bool,
}

impl ApiRequest {
    #[must_use]
    pub fn new(operation: Operation, method: Method, path: impl Into<String>) -> Self {
        Self {
            id: Ulid::new(),
            operation,
            method,
            path: path.into(),
            body: None,
            retried: false,
        }
    }

    #[must_use]
    pub fn get(operation: Operation, path: impl Into<String>) -> Self {
        Self::new(operation, Method::GET, path)
    }

    #[must_use]
    pub fn post(operation: Operation, path: impl Into<String>) -> Self {
        Self::new(operation, Method::POST, path)
    }

    /// # Errors
    /// Returns an error if the body cannot be encoded as JSON.
    pub fn with_json<B: Serialize>(mut self, body: &B) -> Result<Self> {
        let value = serde_json::to_value(body)
            .map_err(|err| Error::Serialization(format!("Failed to encode request: {err}")))?;
        self.body = Some(value);
        Ok(self)
    }

    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    #[must_use]
    pub fn id(&self) -> Ulid {
        self.id
    }

    #[must_use]
    pub fn operation(&self) -> Operation {
        self.operation
    }

    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    /// Whether this request has already been replayed after a refresh.
    #[must_use]
    pub fn is_retried(&self) -> bool {
        self.retried
    }

    pub(crate) fn mark_retried(&mut self) {
        self.retried = true;
    }
}

/// An upstream answer of any status. Only network failures are errors at the
/// transport boundary.
#[derive(Clone, Debug)]
pub struct ApiResponse {
    status: StatusCode,
    body: String,
}

impl ApiResponse {
    #[must_use]
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        self.status == StatusCode::UNAUTHORIZED
    }

    /// Converts non-2xx answers into [`Error::Http`] carrying the server's message.
    ///
    /// # Errors
    /// Returns an error when the status is not a success.
    pub fn error_for_status(self) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(Error::Http {
                status: self.status.as_u16(),
                message: error_message(&self.body),
            })
        }
    }

    /// # Errors
    /// Returns an error if the body does not decode into `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_str(&self.body)?)
    }

    /// Human readable message from a success body: a JSON string,
    /// `{"message": ..}` or plain text.
    #[must_use]
    pub fn message(&self) -> String {
        match serde_json::from_str::<Value>(&self.body) {
            Ok(Value::String(message)) => message,
            Ok(Value::Object(object)) => object
                .get("message")
                .and_then(Value::as_str)
                .map_or_else(|| sanitize_body(&self.body), str::to_string),
            _ => sanitize_body(&self.body),
        }
    }
}

/// Extracts `{"error": ..}` (or `{"message": ..}`) from an error body, falling
/// back to the sanitized body.
pub(crate) fn error_message(body: &str) -> String {
    if let Ok(Value::Object(object)) = serde_json::from_str::<Value>(body) {
        let message = object
            .get("error")
            .and_then(Value::as_str)
            .or_else(|| object.get("message").and_then(Value::as_str));
        if let Some(message) = message {
            return sanitize_body(message);
        }
    }
    sanitize_body(body)
}

/// Trims and truncates bodies before they reach a user-facing message.
fn sanitize_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "Request failed.".to_string()
    } else {
        trimmed.chars().take(MAX_ERROR_CHARS).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn exempt_operations() {
        assert!(Operation::Login.exempt_from_refresh());
        assert!(Operation::Refresh.exempt_from_refresh());
        assert!(Operation::CurrentUser.exempt_from_refresh());
        assert!(!Operation::Resource.exempt_from_refresh());
        assert!(!Operation::Logout.exempt_from_refresh());
        assert!(!Operation::ResetPassword.exempt_from_refresh());
    }

    #[test]
    fn error_for_status_prefers_server_error_field() {
        let response = ApiResponse::new(
            StatusCode::CONFLICT,
            r#"{"error":"El usuario ya está registrado"}"#,
        );
        assert_eq!(
            response.error_for_status().unwrap_err(),
            Error::Http {
                status: 409,
                message: "El usuario ya está registrado".to_string()
            }
        );
    }

    #[test]
    fn error_for_status_sanitizes_plain_bodies() {
        let response = ApiResponse::new(StatusCode::BAD_GATEWAY, "   ");
        assert_eq!(
            response.error_for_status().unwrap_err(),
            Error::Http {
                status: 502,
                message: "Request failed.".to_string()
            }
        );

        let long = "x".repeat(500);
        let response = ApiResponse::new(StatusCode::INTERNAL_SERVER_ERROR, long);
        let Err(Error::Http { message, .. }) = response.error_for_status() else {
            panic!("expected http error");
        };
        assert_eq!(message.len(), MAX_ERROR_CHARS);
    }

    #[test]
    fn message_accepts_string_object_or_text() {
        assert_eq!(
            ApiResponse::new(StatusCode::OK, r#""Cuenta creada""#).message(),
            "Cuenta creada"
        );
        assert_eq!(
            ApiResponse::new(StatusCode::OK, r#"{"message":"Código reenviado"}"#).message(),
            "Código reenviado"
        );
        assert_eq!(
            ApiResponse::new(StatusCode::OK, " listo \n").message(),
            "listo"
        );
    }

    #[test]
    fn requests_start_unretried_with_unique_ids() {
        let first = ApiRequest::get(Operation::Resource, "/properties");
        let second = ApiRequest::post(Operation::Login, "/auth/login")
            .with_json(&json!({"email": "ana@hogar.app"}))
            .unwrap();

        assert!(!first.is_retried());
        assert_ne!(first.id(), second.id());
        assert_eq!(second.method(), &Method::POST);
        assert_eq!(second.body(), Some(&json!({"email": "ana@hogar.app"})));

        let mut replay = first.clone();
        replay.mark_retried();
        assert!(replay.is_retried());
        assert_eq!(replay.id(), first.id());
    }
}
