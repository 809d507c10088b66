//! Client-side form rules for the auth flows. These mirror what the API
//! enforces so obviously bad input never leaves the client; the API stays the
//! authority. Errors never echo the submitted values.

use regex::Regex;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;

/// Minimum password length accepted by the register, login and reset forms.
pub const MIN_PASSWORD_CHARS: usize = 8;
/// Length of the email verification code.
pub const VERIFICATION_CODE_DIGITS: usize = 6;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} is required")]
    Required(&'static str),
    #[error("email address is invalid")]
    InvalidEmail,
    #[error("password must be at least {MIN_PASSWORD_CHARS} characters")]
    PasswordTooShort,
    #[error("passwords do not match")]
    PasswordMismatch,
    #[error("verification code must be {VERIFICATION_CODE_DIGITS} digits")]
    InvalidCode,
    #[error("role must be one of: buyer, seller")]
    InvalidRole,
}

/// Marketplace role chosen at registration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Buyer,
    Seller,
}

impl Role {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Buyer => "buyer",
            Self::Seller => "seller",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "buyer" => Ok(Self::Buyer),
            "seller" => Ok(Self::Seller),
            _ => Err(ValidationError::InvalidRole),
        }
    }
}

#[must_use]
pub fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").is_ok_and(|re| re.is_match(email))
}

/// # Errors
/// Returns an error if the email is blank or malformed.
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(ValidationError::Required("email"));
    }
    if !valid_email(email) {
        return Err(ValidationError::InvalidEmail);
    }
    Ok(())
}

/// # Errors
/// Returns an error if the password is empty or shorter than [`MIN_PASSWORD_CHARS`].
pub fn validate_password(password: &SecretString) -> Result<(), ValidationError> {
    let password = password.expose_secret();
    if password.is_empty() {
        return Err(ValidationError::Required("password"));
    }
    if password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(ValidationError::PasswordTooShort);
    }
    Ok(())
}

/// # Errors
/// Returns an error unless the code is exactly six ASCII digits.
pub fn validate_verification_code(code: &str) -> Result<(), ValidationError> {
    let code = code.trim();
    if code.is_empty() {
        return Err(ValidationError::Required("verification code"));
    }
    if code.len() != VERIFICATION_CODE_DIGITS || !code.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidCode);
    }
    Ok(())
}

pub struct LoginForm {
    pub email: String,
    pub password: SecretString,
}

impl LoginForm {
    /// # Errors
    /// Returns the first rule the form breaks.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_email(&self.email)?;
        validate_password(&self.password)
    }
}

pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub password: SecretString,
    pub role: Role,
}

impl RegisterForm {
    /// # Errors
    /// Returns the first rule the form breaks.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::Required("name"));
        }
        validate_email(&self.email)?;
        validate_password(&self.password)
    }
}

pub struct ResetPasswordForm {
    pub password: SecretString,
    pub confirm_password: SecretString,
}

impl ResetPasswordForm {
    /// # Errors
    /// Returns the first rule the form breaks.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_password(&self.password)?;
        if self.confirm_password.expose_secret().is_empty() {
            return Err(ValidationError::Required("password confirmation"));
        }
        if self.password.expose_secret() != self.confirm_password.expose_secret() {
            return Err(ValidationError::PasswordMismatch);
        }
        Ok(())
    }
}
