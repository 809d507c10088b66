use crate::{
    validation::{LoginForm, RegisterForm, ResetPasswordForm, Role},
    Client,
};
use anyhow::{bail, Result};
use secrecy::SecretString;

/// # Errors
/// Returns an error if the credentials are invalid or rejected.
pub async fn login(client: &Client, email: String, password: SecretString) -> Result<()> {
    let session = client.login(&LoginForm { email, password }).await?;

    match session.user {
        Some(user) if session.is_authenticated => println!("Signed in as {}", user.name),
        _ => bail!("signed in, but the session could not be loaded"),
    }

    Ok(())
}

/// # Errors
/// Returns an error if the API could not end the session; the local session
/// is removed regardless.
pub async fn logout(client: &Client) -> Result<()> {
    client.logout().await?;
    println!("Signed out");

    Ok(())
}

/// # Errors
/// Returns an error if there is no active session.
pub async fn whoami(client: &Client) -> Result<()> {
    let session = client.check_auth().await;

    let Some(user) = session.user.filter(|_| session.is_authenticated) else {
        bail!("not signed in");
    };

    match user.role {
        Some(role) => println!("{} <{}> ({role})", user.name, user.email),
        None => println!("{} <{}>", user.name, user.email),
    }

    Ok(())
}

/// # Errors
/// Returns an error if the form is invalid or the API rejects the account.
pub async fn register(
    client: &Client,
    name: String,
    email: String,
    password: SecretString,
    role: Role,
) -> Result<()> {
    let form = RegisterForm {
        name,
        email,
        password,
        role,
    };
    println!("{}", client.register(&form).await?);
    println!("Enter the code with: hogar verify <CODE>");

    Ok(())
}

/// # Errors
/// Returns an error if the code is malformed or rejected.
pub async fn verify(client: &Client, email: Option<&str>, code: &str) -> Result<()> {
    println!("{}", client.verify_account(email, code).await?);

    Ok(())
}

/// # Errors
/// Returns an error if no email is known or the API rejects the request.
pub async fn resend_code(client: &Client, email: Option<&str>) -> Result<()> {
    println!("{}", client.resend_verification_code(email).await?);

    Ok(())
}

/// # Errors
/// Returns an error if the email is invalid or the API rejects the request.
pub async fn forgot_password(client: &Client, email: &str) -> Result<()> {
    println!("{}", client.forgot_password(email).await?);

    Ok(())
}

/// # Errors
/// Returns an error if the token is no longer valid or the passwords do not match.
pub async fn reset_password(
    client: &Client,
    token: &str,
    password: SecretString,
    confirm_password: SecretString,
) -> Result<()> {
    let form = ResetPasswordForm {
        password,
        confirm_password,
    };
    println!("{}", client.reset_password(token, &form).await?);

    Ok(())
}
