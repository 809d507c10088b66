use crate::{
    cli::{
        actions::{account, browse, Action},
        globals::GlobalArgs,
    },
    gateway::{remove_cookie_file, HttpTransport, SessionEvent, Transport},
    session::markers::FileMarkerStore,
    Client,
};
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::{debug, warn};

/// Client wired to the on-disk state of one CLI run.
struct Workspace {
    transport: Arc<HttpTransport>,
    client: Client,
    events: broadcast::Receiver<SessionEvent>,
}

impl Workspace {
    fn open(globals: &GlobalArgs) -> Result<Self> {
        let transport = Arc::new(
            HttpTransport::new(globals.config.clone()).context("failed to build HTTP client")?,
        );
        transport
            .load_cookies(&globals.cookie_file())
            .context("failed to read saved session")?;

        let markers = Arc::new(FileMarkerStore::new(globals.marker_file()));
        let client = Client::new(Arc::clone(&transport) as Arc<dyn Transport>, markers);

        Ok(Self::new(transport, client))
    }

    /// `transport` owns the cookie jar that gets persisted; `client` is what
    /// the command runs against.
    fn new(transport: Arc<HttpTransport>, client: Client) -> Self {
        let events = client.subscribe();
        Self {
            transport,
            client,
            events,
        }
    }

    /// Persists the cookie jar, or wipes it when the session was terminated.
    fn close(mut self, signed_out: bool) -> Result<()> {
        let cookie_file = self.transport.config().cookie_file();

        match self.events.try_recv() {
            Ok(SessionEvent::Terminated { redirect }) => {
                remove_cookie_file(&cookie_file).context("failed to remove saved session")?;
                eprintln!("Your session has expired. Sign in again (hogar login, {redirect}).");
            }
            Err(TryRecvError::Lagged(skipped)) => {
                warn!("missed {} session events", skipped);
                remove_cookie_file(&cookie_file).context("failed to remove saved session")?;
            }
            Err(TryRecvError::Empty | TryRecvError::Closed) if signed_out => {
                remove_cookie_file(&cookie_file).context("failed to remove saved session")?;
            }
            Err(TryRecvError::Empty | TryRecvError::Closed) => {
                let saved = self
                    .transport
                    .save_cookies(&cookie_file)
                    .context("failed to save session")?;
                debug!("saved {} cookies", saved);
            }
        }

        Ok(())
    }
}

/// Execute the provided action.
// This is the single dispatch point for all CLI actions.
/// # Errors
/// Returns an error if the action fails.
pub async fn execute(action: Action, globals: &GlobalArgs) -> Result<()> {
    let workspace = Workspace::open(globals)?;
    let client = &workspace.client;
    let signed_out = matches!(action, Action::Logout);

    let result = match action {
        Action::Login { email, password } => account::login(client, email, password).await,
        Action::Logout => account::logout(client).await,
        Action::Whoami => account::whoami(client).await,
        Action::Register {
            name,
            email,
            password,
            role,
        } => account::register(client, name, email, password, role).await,
        Action::Verify { email, code } => account::verify(client, email.as_deref(), &code).await,
        Action::ResendCode { email } => account::resend_code(client, email.as_deref()).await,
        Action::ForgotPassword { email } => account::forgot_password(client, &email).await,
        Action::ResetPassword {
            token,
            password,
            confirm_password,
        } => account::reset_password(client, &token, password, confirm_password).await,
        Action::Properties { json } => browse::properties(client, json).await,
        Action::Route { path } => browse::route(client, &path).await,
    };

    // state is persisted even when the command failed
    workspace.close(signed_out)?;

    result
}
