//! Auth Context
//!
//! The current authentication state as an explicit object. The auth
//! collaborator feeds it through [`AuthContext::apply`]; everything that
//! routes on sign-in state either reads [`AuthContext::current`] or
//! subscribes.

use std::sync::Arc;

use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

use crate::domain::repository::AuthProvider;
use crate::domain::value_object::{AuthState, Identity};

/// Shared, observable authentication state
#[derive(Debug, Clone)]
pub struct AuthContext {
    sender: Arc<watch::Sender<AuthState>>,
}

impl Default for AuthContext {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthContext {
    /// Signed-out context
    pub fn new() -> Self {
        let (sender, _) = watch::channel(AuthState::SignedOut);
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn current(&self) -> AuthState {
        self.sender.borrow().clone()
    }

    /// Record the identity reported by the auth provider
    ///
    /// Returns `true` if the state changed. Observers are woken only on
    /// change.
    pub fn apply(&self, identity: Option<Identity>) -> bool {
        let next = AuthState::from(identity);
        let changed = self.sender.send_if_modified(|state| {
            if *state == next {
                false
            } else {
                *state = next;
                true
            }
        });
        if changed {
            tracing::debug!(signed_in = self.sender.borrow().is_signed_in(), "Auth state changed");
        }
        changed
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.sender.subscribe()
    }

    /// Keep this context in sync with `provider` until its event stream ends
    pub fn follow<P>(&self, provider: Arc<P>) -> JoinHandle<()>
    where
        P: AuthProvider + Sync + 'static,
    {
        let context = self.clone();
        let mut events = provider.events();
        tokio::spawn(async move {
            context.apply(provider.current_user().await);
            loop {
                match events.recv().await {
                    Ok(identity) => {
                        context.apply(identity);
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Auth events lagged, re-reading session");
                        context.apply(provider.current_user().await);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel::id::UserId;

    fn identity(user: &str) -> Identity {
        Identity::new(UserId::new(user).unwrap(), "token")
    }

    struct FakeProvider {
        initial: Option<Identity>,
        events: broadcast::Sender<Option<Identity>>,
    }

    impl AuthProvider for FakeProvider {
        async fn current_user(&self) -> Option<Identity> {
            self.initial.clone()
        }

        fn events(&self) -> broadcast::Receiver<Option<Identity>> {
            self.events.subscribe()
        }
    }

    #[test]
    fn test_apply_reports_changes_only() {
        let context = AuthContext::new();
        assert!(!context.apply(None));
        assert!(context.apply(Some(identity("u1"))));
        assert!(!context.apply(Some(identity("u1"))));
        assert!(context.current().is_signed_in());
        assert!(context.apply(None));
        assert_eq!(context.current(), AuthState::SignedOut);
    }

    #[tokio::test]
    async fn test_follow_tracks_provider_events() {
        let (events, _) = broadcast::channel(8);
        let provider = Arc::new(FakeProvider {
            initial: Some(identity("u1")),
            events: events.clone(),
        });
        let context = AuthContext::new();
        let mut rx = context.subscribe();

        let handle = context.follow(provider);
        rx.changed().await.unwrap();
        assert_eq!(
            rx.borrow_and_update().identity().map(|i| i.user_id.as_str().to_string()),
            Some("u1".to_string())
        );

        events.send(None).unwrap();
        rx.changed().await.unwrap();
        assert!(!rx.borrow_and_update().is_signed_in());

        handle.abort();
    }
}
