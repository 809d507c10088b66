//! Auth endpoints. Passwords are only exposed while the request body is
//! built and are never logged; email addresses stay out of span fields.

use super::paths;
use crate::{
    client::Client,
    error::{Error, Result},
    gateway::{ApiRequest, Operation},
    session::{Identity, Session},
    validation::{
        validate_email, validate_verification_code, LoginForm, RegisterForm, ResetPasswordForm,
        ValidationError,
    },
};
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};

/// The identity endpoint answers either `{ "user": {..} }` or the bare user.
#[derive(Deserialize)]
#[serde(untagged)]
enum IdentityEnvelope {
    Wrapped { user: Identity },
    Bare(Identity),
}

impl From<IdentityEnvelope> for Identity {
    fn from(envelope: IdentityEnvelope) -> Self {
        match envelope {
            IdentityEnvelope::Wrapped { user } | IdentityEnvelope::Bare(user) => user,
        }
    }
}

impl Client {
    /// Signs in and hydrates the session from the identity endpoint.
    ///
    /// # Errors
    /// Returns an error if the form is invalid or the credentials are rejected.
    #[instrument(skip_all)]
    pub async fn login(&self, form: &LoginForm) -> Result<Session> {
        form.validate()?;

        let request = ApiRequest::post(Operation::Login, paths::LOGIN).with_body(json!({
            "email": form.email.trim(),
            "password": form.password.expose_secret(),
        }));
        self.gateway().submit(request).await?.error_for_status()?;

        let session = self.check_auth().await;
        info!("signed in, authenticated: {}", session.is_authenticated);

        Ok(session)
    }

    /// Ends the session upstream. The local session is cleared even when the
    /// server call fails.
    ///
    /// # Errors
    /// Returns the upstream failure after the local session has been cleared.
    #[instrument(skip_all)]
    pub async fn logout(&self) -> Result<()> {
        let request = ApiRequest::post(Operation::Logout, paths::LOGOUT);
        let result = self
            .gateway()
            .submit(request)
            .await
            .and_then(|response| response.error_for_status());

        self.session().logout();

        result.map(|_| ())
    }

    /// Creates an account and remembers the email for verification.
    ///
    /// # Errors
    /// Returns an error if the form is invalid or the API rejects the account.
    #[instrument(skip_all, fields(role = %form.role))]
    pub async fn register(&self, form: &RegisterForm) -> Result<String> {
        form.validate()?;

        let email = form.email.trim();
        let request = ApiRequest::post(Operation::Register, paths::REGISTER).with_body(json!({
            "name": form.name.trim(),
            "email": email,
            "password": form.password.expose_secret(),
            "role": form.role,
        }));
        let response = self.gateway().submit(request).await?.error_for_status()?;

        self.remember_pending_verification(email);

        Ok(response.message())
    }

    /// Confirms an account with the emailed code. `email` defaults to the
    /// pending verification marker.
    ///
    /// # Errors
    /// Returns an error if no email is known, the code is malformed, or the
    /// API rejects the code.
    #[instrument(skip_all)]
    pub async fn verify_account(&self, email: Option<&str>, code: &str) -> Result<String> {
        let email = self.verification_email(email)?;
        validate_verification_code(code)?;

        let request = ApiRequest::post(Operation::VerifyAccount, paths::VERIFY_ACCOUNT)
            .with_body(json!({
                "email": email,
                "token": code.trim(),
            }));
        let response = self.gateway().submit(request).await?.error_for_status()?;

        self.forget_pending_verification();

        Ok(response.message())
    }

    /// Sends a new verification code. On success the email becomes the
    /// pending verification marker; on failure the marker is dropped.
    ///
    /// # Errors
    /// Returns an error if no valid email is known or the API rejects it.
    #[instrument(skip_all)]
    pub async fn resend_verification_code(&self, email: Option<&str>) -> Result<String> {
        let email = self.verification_email(email)?;

        let request = ApiRequest::post(
            Operation::ResendVerificationCode,
            paths::RESEND_VERIFICATION_CODE,
        )
        .with_body(json!({ "email": email }));

        match self
            .gateway()
            .submit(request)
            .await
            .and_then(|response| response.error_for_status())
        {
            Ok(response) => {
                self.remember_pending_verification(&email);
                Ok(response.message())
            }
            Err(err) => {
                self.forget_pending_verification();
                Err(err)
            }
        }
    }

    /// # Errors
    /// Returns an error if the email is invalid or the API rejects the request.
    #[instrument(skip_all)]
    pub async fn forgot_password(&self, email: &str) -> Result<String> {
        validate_email(email)?;

        let request = ApiRequest::post(Operation::ForgotPassword, paths::FORGOT_PASSWORD)
            .with_body(json!({ "email": email.trim() }));
        let response = self.gateway().submit(request).await?.error_for_status()?;

        Ok(response.message())
    }

    /// Checks that a password reset token is still valid.
    ///
    /// # Errors
    /// Returns an error if the token is blank, unknown or expired.
    #[instrument(skip_all)]
    pub async fn verify_reset_token(&self, token: &str) -> Result<()> {
        if token.trim().is_empty() {
            return Err(ValidationError::Required("reset token").into());
        }

        let request = ApiRequest::get(Operation::VerifyResetToken, paths::reset_password(token));
        self.gateway().submit(request).await?.error_for_status()?;

        Ok(())
    }

    /// # Errors
    /// Returns an error if the form is invalid or the API rejects the token.
    #[instrument(skip_all)]
    pub async fn reset_password(&self, token: &str, form: &ResetPasswordForm) -> Result<String> {
        if token.trim().is_empty() {
            return Err(ValidationError::Required("reset token").into());
        }
        form.validate()?;

        let request = ApiRequest::post(Operation::ResetPassword, paths::reset_password(token))
            .with_body(json!({ "password": form.password.expose_secret() }));
        let response = self.gateway().submit(request).await?.error_for_status()?;

        Ok(response.message())
    }

    /// The signed-in user. A `401` here means "no session" and is returned
    /// as [`Error::Http`] without attempting a refresh.
    ///
    /// # Errors
    /// Returns an error if there is no session or the body is malformed.
    #[instrument(skip_all)]
    pub async fn current_user(&self) -> Result<Identity> {
        let request = ApiRequest::get(Operation::CurrentUser, paths::CURRENT_USER);
        let response = self.gateway().submit(request).await?.error_for_status()?;
        let envelope: IdentityEnvelope = response.json()?;

        Ok(envelope.into())
    }

    fn verification_email(&self, email: Option<&str>) -> Result<String> {
        let email = email
            .map(|email| email.trim().to_string())
            .filter(|email| !email.is_empty())
            .or_else(|| self.pending_verification_email())
            .ok_or(Error::Validation(ValidationError::Required("email")))?;
        validate_email(&email)?;

        Ok(email)
    }
}
