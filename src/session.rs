//! Session context: who is signed in, with which role, and what they may do.
//!
//! A single `Session` value is shared (behind an `Arc`) by the board store and
//! the HTTP repository, replacing any ambient global token.

use std::fmt;

use parking_lot::RwLock;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::types::{Role, UserId};

/// Board operations gated by role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Move,
    Create,
    Edit,
    Delete,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Move => "move",
            Action::Create => "create",
            Action::Edit => "edit",
            Action::Delete => "delete",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Role {
    /// Authorization table. Guests may drag tickets between columns but may
    /// not create, edit or delete them.
    pub fn permits(&self, action: Action) -> bool {
        match self {
            Role::Admin | Role::User => true,
            Role::Guest => matches!(action, Action::Move),
        }
    }
}

/// The authenticated identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: UserId,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub role: Role,
}

impl SessionUser {
    pub fn new(id: impl Into<UserId>, username: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            role,
        }
    }
}

#[derive(Default)]
struct SessionState {
    user: Option<SessionUser>,
    token: Option<SecretString>,
}

/// Shared session context
#[derive(Default)]
pub struct Session {
    state: RwLock<SessionState>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read();
        f.debug_struct("Session")
            .field("user", &state.user)
            .field("token", &state.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl Session {
    /// A session with nobody signed in
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// A session already bound to a user and token
    pub fn authenticated(user: SessionUser, token: impl Into<String>) -> Self {
        let session = Self::default();
        session.login(user, token);
        session
    }

    pub fn login(&self, user: SessionUser, token: impl Into<String>) {
        tracing::debug!(user = %user.username, role = %user.role, "session login");
        let mut state = self.state.write();
        state.user = Some(user);
        state.token = Some(SecretString::from(token.into()));
    }

    /// Attach a token before the identity is known, e.g. to fetch the
    /// profile it belongs to. Nothing is authorized until `login`.
    pub fn set_token(&self, token: impl Into<String>) {
        self.state.write().token = Some(SecretString::from(token.into()));
    }

    pub fn logout(&self) {
        tracing::debug!("session logout");
        let mut state = self.state.write();
        state.user = None;
        state.token = None;
    }

    pub fn current_user(&self) -> Option<SessionUser> {
        self.state.read().user.clone()
    }

    pub fn role(&self) -> Option<Role> {
        self.state.read().user.as_ref().map(|u| u.role)
    }

    /// Bearer token for outgoing requests
    pub fn token(&self) -> Option<String> {
        self.state
            .read()
            .token
            .as_ref()
            .map(|t| t.expose_secret().to_string())
    }

    /// Nobody signed in means nothing is authorized.
    pub fn is_authorized(&self, action: Action) -> bool {
        self.role().is_some_and(|role| role.permits(action))
    }
}
