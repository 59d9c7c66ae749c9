//! TMDb session management: the request-token approval dance, session
//! restore from storage, and logout.
//!
//! The decision logic lives in [`machine`] as a pure transition function;
//! [`AuthFlow`] owns the current state and executes the commands the
//! machine emits (API calls via `AccountApi`, persistence via `KvStore`).

mod machine;

pub use machine::{transition, AuthCommand, AuthEvent, AuthSession, AuthState};

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::store::KvStore;
use crate::tmdb::{authorize_url, AccountApi, AccountDetails};

const KEY_SESSION_ID: &str = "auth.session_id";
const KEY_REQUEST_TOKEN: &str = "auth.request_token";
const KEY_ACCOUNT: &str = "auth.account";

#[derive(Debug, Error)]
pub enum AuthError {
    /// The token/session handshake failed; the machine is in `AuthError`
    /// state and local storage has been cleared.
    #[error("authentication failed: {0}")]
    Handshake(String),

    /// An operation that needs a session was called without one.
    #[error("not authenticated")]
    NotAuthenticated,
}

/// What a caller needs to continue a freshly started login: send the user
/// to `approval_url`, then call [`AuthFlow::complete_login`] when they
/// return.
#[derive(Debug, Clone)]
pub struct LoginStart {
    pub request_token: String,
    pub approval_url: String,
}

/// Orchestrates the auth state machine against the real world.
pub struct AuthFlow {
    api: Arc<dyn AccountApi>,
    store: Arc<dyn KvStore>,
    state: Mutex<AuthState>,
}

impl AuthFlow {
    pub fn new(api: Arc<dyn AccountApi>, store: Arc<dyn KvStore>) -> Self {
        Self {
            api,
            store,
            state: Mutex::new(AuthState::Unauthenticated),
        }
    }

    /// Current machine state.
    pub fn state(&self) -> AuthState {
        self.state.lock().unwrap().clone()
    }

    /// The active session, if authenticated.
    pub fn session(&self) -> Option<AuthSession> {
        match &*self.state.lock().unwrap() {
            AuthState::Authenticated { session } => Some(session.clone()),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.lock().unwrap().is_authenticated()
    }

    /// Rehydrate a persisted session at startup. Missing or unreadable
    /// storage means staying unauthenticated; it is never an error.
    pub async fn restore(&self) -> AuthState {
        let session_id = match self.store.get(KEY_SESSION_ID) {
            Ok(Some(id)) if !id.is_empty() => id,
            Ok(_) => return self.state(),
            Err(e) => {
                warn!("Failed to read persisted session: {}", e);
                return self.state();
            }
        };
        let account = self
            .store
            .get(KEY_ACCOUNT)
            .ok()
            .flatten()
            .and_then(|json| serde_json::from_str::<AccountDetails>(&json).ok());

        self.dispatch(AuthEvent::SessionRestored {
            session_id,
            account,
        })
        .await;

        // The persisted account record may predate a profile change; refresh
        // it in place when the API agrees the session is still good.
        if let Some(session) = self.session() {
            if session.account.is_none() {
                match self.api.account_details(&session.session_id).await {
                    Ok(account) => {
                        self.dispatch(AuthEvent::AccountFetched { account }).await;
                    }
                    Err(e) => warn!("Failed to refresh account details: {}", e),
                }
            }
        }
        self.state()
    }

    /// Start a login: mint a request token and return the TMDb approval
    /// URL. `redirect_to` is appended so TMDb sends the user back with the
    /// approved token.
    pub async fn begin_login(&self, redirect_to: Option<&str>) -> Result<LoginStart, AuthError> {
        self.dispatch(AuthEvent::LoginRequested).await;
        match self.state() {
            AuthState::Authenticating {
                request_token: Some(token),
            } => Ok(LoginStart {
                approval_url: authorize_url(&token, redirect_to),
                request_token: token,
            }),
            AuthState::AuthError { message } => Err(AuthError::Handshake(message)),
            other => Err(AuthError::Handshake(format!(
                "unexpected state after token request: {:?}",
                other
            ))),
        }
    }

    /// Finish a login after the user approved the token. The token comes
    /// from the return redirect when present, otherwise from storage.
    pub async fn complete_login(
        &self,
        request_token: Option<&str>,
    ) -> Result<AccountDetails, AuthError> {
        // Resuming in a fresh process: the pending token only exists in
        // storage, so re-enter the authenticating state from it.
        if !matches!(self.state(), AuthState::Authenticating { .. }) {
            let stored = self.store.get(KEY_REQUEST_TOKEN).ok().flatten();
            let mut state = self.state.lock().unwrap();
            *state = AuthState::Authenticating {
                request_token: stored,
            };
        }

        self.dispatch(AuthEvent::ApprovalReturned {
            request_token: request_token.map(str::to_string),
        })
        .await;

        match self.state() {
            AuthState::Authenticated { session } => {
                info!("TMDb session established");
                session
                    .account
                    .ok_or_else(|| AuthError::Handshake("account details unavailable".to_string()))
            }
            AuthState::AuthError { message } => Err(AuthError::Handshake(message)),
            other => Err(AuthError::Handshake(format!(
                "unexpected state after session creation: {:?}",
                other
            ))),
        }
    }

    /// End the session. The remote deletion is best-effort; local state and
    /// storage are always cleared.
    pub async fn logout(&self) {
        self.dispatch(AuthEvent::LogoutRequested).await;
        info!("Signed out");
    }

    /// Feed an event through the machine, executing emitted commands and
    /// looping their follow-up events back in until the machine is quiet.
    async fn dispatch(&self, event: AuthEvent) {
        let mut queue = VecDeque::new();
        queue.push_back(event);
        while let Some(event) = queue.pop_front() {
            debug!("Auth event: {:?}", event);
            let commands = {
                let mut state = self.state.lock().unwrap();
                let (next, commands) = transition(state.clone(), event);
                *state = next;
                commands
            };
            for command in commands {
                if let Some(followup) = self.execute(command).await {
                    queue.push_back(followup);
                }
            }
        }
    }

    /// Run one command. API failures become `Failed` events so the machine
    /// records them; storage failures are logged and swallowed, persistence
    /// being best-effort.
    async fn execute(&self, command: AuthCommand) -> Option<AuthEvent> {
        match command {
            AuthCommand::CreateRequestToken => match self.api.create_request_token().await {
                Ok(token) => Some(AuthEvent::TokenCreated { token }),
                Err(e) => Some(AuthEvent::Failed {
                    message: e.to_string(),
                }),
            },
            AuthCommand::CreateSession { request_token } => {
                match self.api.create_session(&request_token).await {
                    Ok(session_id) => Some(AuthEvent::SessionCreated { session_id }),
                    Err(e) => Some(AuthEvent::Failed {
                        message: e.to_string(),
                    }),
                }
            }
            AuthCommand::FetchAccount { session_id } => {
                match self.api.account_details(&session_id).await {
                    Ok(account) => Some(AuthEvent::AccountFetched { account }),
                    Err(e) => Some(AuthEvent::Failed {
                        message: e.to_string(),
                    }),
                }
            }
            AuthCommand::DeleteSession { session_id } => {
                if let Err(e) = self.api.delete_session(&session_id).await {
                    warn!("Failed to delete remote session: {}", e);
                }
                None
            }
            AuthCommand::PersistRequestToken { token } => {
                if let Err(e) = self.store.set(KEY_REQUEST_TOKEN, &token) {
                    warn!("Failed to persist request token: {}", e);
                }
                None
            }
            AuthCommand::PersistSession { session_id } => {
                if let Err(e) = self.store.set(KEY_SESSION_ID, &session_id) {
                    warn!("Failed to persist session id: {}", e);
                }
                None
            }
            AuthCommand::PersistAccount { account } => {
                match serde_json::to_string(&account) {
                    Ok(json) => {
                        if let Err(e) = self.store.set(KEY_ACCOUNT, &json) {
                            warn!("Failed to persist account details: {}", e);
                        }
                    }
                    Err(e) => warn!("Failed to serialize account details: {}", e),
                }
                None
            }
            AuthCommand::ClearRequestToken => {
                if let Err(e) = self.store.remove(KEY_REQUEST_TOKEN) {
                    warn!("Failed to clear request token: {}", e);
                }
                None
            }
            AuthCommand::ClearStorage => {
                for key in [KEY_REQUEST_TOKEN, KEY_SESSION_ID, KEY_ACCOUNT] {
                    if let Err(e) = self.store.remove(key) {
                        warn!("Failed to clear {}: {}", key, e);
                    }
                }
                None
            }
        }
    }
}
