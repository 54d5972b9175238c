use tokio::sync::watch;

use super::model::{Session, User, UserContract};
use crate::address::Address;

/// Single-writer container for the application [`Session`].
///
/// All mutation goes through the setters below. Each call runs as one
/// critical section inside the channel's lock, so observers never see a
/// half-applied update. Observers get cheap snapshots through
/// [`SessionStore::snapshot`] or a change feed through
/// [`SessionStore::subscribe`]; only modifications that actually change the
/// session wake subscribers.
#[derive(Debug)]
pub struct SessionStore {
    tx: watch::Sender<Session>,
}

impl SessionStore {
    /// Creates a store holding an empty session.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Session::default());
        Self { tx }
    }

    /// Returns a copy of the current session.
    pub fn snapshot(&self) -> Session {
        self.tx.borrow().clone()
    }

    /// Returns a receiver notified after every effective change.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.tx.subscribe()
    }

    /// Applies several field changes as one observable update.
    ///
    /// Returns whether the session changed.
    pub fn update(&self, f: impl FnOnce(&mut Session)) -> bool {
        self.tx.send_if_modified(|session| {
            let before = session.clone();
            f(session);
            *session != before
        })
    }

    pub fn set_user(&self, user: Option<User>) {
        self.update(|s| s.user = user);
    }

    pub fn set_user_contract(&self, user_contract: Option<UserContract>) {
        self.update(|s| s.user_contract = user_contract);
    }

    pub fn set_connected(&self, is_connected: bool) {
        self.update(|s| s.is_connected = is_connected);
    }

    pub fn set_wallet_address(&self, wallet_address: Option<Address>) {
        self.update(|s| s.wallet_address = wallet_address);
    }

    pub fn set_correct_network(&self, is_correct_network: bool) {
        self.update(|s| s.is_correct_network = is_correct_network);
    }

    pub fn set_loading(&self, is_loading: bool) {
        self.update(|s| s.is_loading = is_loading);
    }

    pub fn set_error(&self, error: Option<String>) {
        self.update(|s| s.error = error);
    }

    /// Restores the initial empty session.
    pub fn reset(&self) {
        self.update(|s| *s = Session::default());
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
