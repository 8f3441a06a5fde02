//! Identity Value Objects
//!
//! What the auth provider tells us about the current user.

use kernel::id::UserId;
use std::fmt;

/// Authenticated user as reported by the auth provider
#[derive(Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: UserId,
    /// Session token presented to the backend
    pub access_token: String,
    pub email: Option<String>,
}

impl Identity {
    pub fn new(user_id: UserId, access_token: impl Into<String>) -> Self {
        Self {
            user_id,
            access_token: access_token.into(),
            email: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("user_id", &self.user_id)
            .field("access_token", &"<redacted>")
            .field("email", &self.email)
            .finish()
    }
}

/// Authentication state passed explicitly to the components that route
/// on it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AuthState {
    #[default]
    SignedOut,
    SignedIn(Identity),
}

impl AuthState {
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            AuthState::SignedIn(identity) => Some(identity),
            AuthState::SignedOut => None,
        }
    }

    pub fn is_signed_in(&self) -> bool {
        matches!(self, AuthState::SignedIn(_))
    }

    /// The identity that signed in between `previous` and `self`
    ///
    /// A switch to a different account counts as a sign-in; a token
    /// refresh for the same user does not.
    pub fn signed_in_since(&self, previous: &AuthState) -> Option<&Identity> {
        match (previous, self) {
            (AuthState::SignedOut, AuthState::SignedIn(current)) => Some(current),
            (AuthState::SignedIn(before), AuthState::SignedIn(current))
                if before.user_id != current.user_id =>
            {
                Some(current)
            }
            _ => None,
        }
    }
}

impl From<Option<Identity>> for AuthState {
    fn from(identity: Option<Identity>) -> Self {
        match identity {
            Some(identity) => AuthState::SignedIn(identity),
            None => AuthState::SignedOut,
        }
    }
}
