//! Pure state machine for the TMDb token/session handshake.
//!
//! `transition` performs no I/O: it maps (state, event) to the next state
//! plus the commands the orchestrator must run (network calls, storage
//! writes). Every side effect reports back as another event, so the whole
//! login/logout/restore flow is a table that tests can walk synchronously.

use serde::{Deserialize, Serialize};

use crate::tmdb::{AccountDetails, RequestToken};

/// An established session, with the account record once it has loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthSession {
    pub session_id: String,
    pub account: Option<AccountDetails>,
}

/// Authentication lifecycle states.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthState {
    Unauthenticated,
    /// Login started; the request token is present once minted.
    Authenticating { request_token: Option<String> },
    Authenticated { session: AuthSession },
    AuthError { message: String },
}

impl AuthState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::Authenticated { .. })
    }
}

/// Inputs to the machine: user intents and command results.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthEvent {
    LoginRequested,
    TokenCreated { token: RequestToken },
    /// The user came back from the approval page, possibly carrying the
    /// token in the redirect; otherwise the persisted one is used.
    ApprovalReturned { request_token: Option<String> },
    SessionCreated { session_id: String },
    AccountFetched { account: AccountDetails },
    SessionRestored { session_id: String, account: Option<AccountDetails> },
    Failed { message: String },
    LogoutRequested,
}

/// Side effects requested by a transition, executed by the orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthCommand {
    CreateRequestToken,
    PersistRequestToken { token: String },
    CreateSession { request_token: String },
    PersistSession { session_id: String },
    FetchAccount { session_id: String },
    PersistAccount { account: AccountDetails },
    ClearRequestToken,
    DeleteSession { session_id: String },
    ClearStorage,
}

/// The transition function. Unexpected (state, event) pairs are inert:
/// state unchanged, no commands.
pub fn transition(state: AuthState, event: AuthEvent) -> (AuthState, Vec<AuthCommand>) {
    use AuthCommand as Cmd;

    match (state, event) {
        (_, AuthEvent::LoginRequested) => (
            AuthState::Authenticating {
                request_token: None,
            },
            vec![Cmd::CreateRequestToken],
        ),

        (AuthState::Authenticating { .. }, AuthEvent::TokenCreated { token }) => (
            AuthState::Authenticating {
                request_token: Some(token.request_token.clone()),
            },
            vec![Cmd::PersistRequestToken {
                token: token.request_token,
            }],
        ),

        (
            AuthState::Authenticating { request_token },
            AuthEvent::ApprovalReturned {
                request_token: from_url,
            },
        ) => match from_url.or(request_token) {
            Some(token) => (
                AuthState::Authenticating {
                    request_token: Some(token.clone()),
                },
                vec![Cmd::CreateSession {
                    request_token: token,
                }],
            ),
            None => (
                AuthState::AuthError {
                    message: "no request token found".to_string(),
                },
                vec![Cmd::ClearStorage],
            ),
        },

        (AuthState::Authenticating { .. }, AuthEvent::SessionCreated { session_id }) => (
            AuthState::Authenticated {
                session: AuthSession {
                    session_id: session_id.clone(),
                    account: None,
                },
            },
            vec![
                Cmd::PersistSession {
                    session_id: session_id.clone(),
                },
                Cmd::ClearRequestToken,
                Cmd::FetchAccount { session_id },
            ],
        ),

        (AuthState::Authenticated { session }, AuthEvent::AccountFetched { account }) => (
            AuthState::Authenticated {
                session: AuthSession {
                    session_id: session.session_id,
                    account: Some(account.clone()),
                },
            },
            vec![Cmd::PersistAccount { account }],
        ),

        (_, AuthEvent::SessionRestored {
            session_id,
            account,
        }) => (
            AuthState::Authenticated {
                session: AuthSession {
                    session_id,
                    account,
                },
            },
            vec![],
        ),

        (_, AuthEvent::Failed { message }) => (
            AuthState::AuthError { message },
            vec![Cmd::ClearStorage],
        ),

        (AuthState::Authenticated { session }, AuthEvent::LogoutRequested) => (
            AuthState::Unauthenticated,
            vec![
                Cmd::DeleteSession {
                    session_id: session.session_id,
                },
                Cmd::ClearStorage,
            ],
        ),

        (_, AuthEvent::LogoutRequested) => {
            (AuthState::Unauthenticated, vec![Cmd::ClearStorage])
        }

        // Anything else is a stale or out-of-order event: ignore it.
        (state, _) => (state, vec![]),
    }
}
