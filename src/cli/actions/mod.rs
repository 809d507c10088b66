pub mod account;
pub mod browse;

// Internal "interpreter" for `Action`.
// We keep the match in a separate module so `mod.rs` stays small as more actions are added.
mod run;

use crate::{cli::globals::GlobalArgs, validation::Role};
use secrecy::SecretString;

#[derive(Debug)]
pub enum Action {
    Login {
        email: String,
        password: SecretString,
    },
    Logout,
    Whoami,
    Register {
        name: String,
        email: String,
        password: SecretString,
        role: Role,
    },
    Verify {
        email: Option<String>,
        code: String,
    },
    ResendCode {
        email: Option<String>,
    },
    ForgotPassword {
        email: String,
    },
    ResetPassword {
        token: String,
        password: SecretString,
        confirm_password: SecretString,
    },
    Properties {
        json: bool,
    },
    Route {
        path: String,
    },
}

impl Action {
    /// Execute the action.
    /// # Errors
    /// Returns an error if the action fails.
    pub async fn execute(self, globals: &GlobalArgs) -> anyhow::Result<()> {
        run::execute(self, globals).await
    }
}
