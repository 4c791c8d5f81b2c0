//! Authentication state.
//!
//! A [`Session`] starts in [`AuthPhase::Loading`] until whoever owns it
//! decides (restored token, fresh login, or nothing). The guard renders a
//! placeholder while loading. `Session` doubles as the HTTP client's
//! [`TokenSource`], so requests always carry the current token.

use std::sync::{Arc, PoisonError, RwLock};

use msp_client::{ApiError, TokenSource};

use crate::model::{Role, User};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthPhase {
    Loading,
    Anonymous,
    Authenticated,
}

/// Point-in-time view of a session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub phase: AuthPhase,
    pub user: Option<User>,
}

impl SessionSnapshot {
    pub fn role(&self) -> Option<Role> {
        self.user.as_ref().map(|u| u.role)
    }
}

#[derive(Debug)]
struct State {
    phase: AuthPhase,
    user: Option<User>,
    token: Option<String>,
}

/// Shared session handle. Clones observe the same state.
#[derive(Clone)]
pub struct Session {
    state: Arc<RwLock<State>>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(State {
                phase: AuthPhase::Loading,
                user: None,
                token: None,
            })),
        }
    }

    /// A session already signed in, e.g. from a saved token.
    pub fn authenticated(user: User, token: impl Into<String>) -> Self {
        let session = Self::new();
        session.establish(user, token);
        session
    }

    pub fn establish(&self, user: User, token: impl Into<String>) {
        let mut s = self.state.write().unwrap_or_else(PoisonError::into_inner);
        s.phase = AuthPhase::Authenticated;
        s.user = Some(user);
        s.token = Some(token.into());
    }

    /// Finish loading with nobody signed in.
    pub fn resolve_anonymous(&self) {
        let mut s = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if s.phase == AuthPhase::Loading {
            s.phase = AuthPhase::Anonymous;
        }
    }

    pub fn logout(&self) {
        let mut s = self.state.write().unwrap_or_else(PoisonError::into_inner);
        s.phase = AuthPhase::Anonymous;
        s.user = None;
        s.token = None;
    }

    pub fn phase(&self) -> AuthPhase {
        self.state.read().unwrap_or_else(PoisonError::into_inner).phase
    }

    pub fn user(&self) -> Option<User> {
        self.state.read().unwrap_or_else(PoisonError::into_inner).user.clone()
    }

    pub fn token(&self) -> Option<String> {
        self.state.read().unwrap_or_else(PoisonError::into_inner).token.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.phase() == AuthPhase::Authenticated
    }

    pub fn is_loading(&self) -> bool {
        self.phase() == AuthPhase::Loading
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let s = self.state.read().unwrap_or_else(PoisonError::into_inner);
        SessionSnapshot {
            phase: s.phase,
            user: s.user.clone(),
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl TokenSource for Session {
    async fn token(&self) -> Result<Option<String>, ApiError> {
        Ok(Session::token(self))
    }
}
