// security/src/session.rs

//! Session state as a single-writer, multi-reader cell. Views receive a
//! `SessionWatcher` from whoever owns the session instead of reading ambient
//! global state.

use std::sync::Arc;

use log::debug;
use models::medical::Principal;
use tokio::sync::watch;

#[derive(Debug, Clone)]
pub struct SessionCell {
    sender: Arc<watch::Sender<Option<Principal>>>,
}

impl SessionCell {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(None);
        SessionCell { sender: Arc::new(sender) }
    }

    /// Replaces the current principal and notifies every watcher, even when
    /// the value is unchanged.
    pub fn publish(&self, principal: Option<Principal>) {
        match &principal {
            Some(p) => debug!("Session now held by {} ({})", p.uid(), p.role()),
            None => debug!("Session cleared"),
        }
        self.sender.send_replace(principal);
    }

    pub fn clear(&self) {
        self.publish(None);
    }

    pub fn current(&self) -> Option<Principal> {
        self.sender.borrow().clone()
    }

    pub fn subscribe(&self) -> SessionWatcher {
        SessionWatcher { receiver: self.sender.subscribe() }
    }
}

impl Default for SessionCell {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
pub struct SessionWatcher {
    receiver: watch::Receiver<Option<Principal>>,
}

impl SessionWatcher {
    pub fn current(&self) -> Option<Principal> {
        self.receiver.borrow().clone()
    }

    /// Waits for the next publish. `None` once the cell is gone.
    pub async fn changed(&mut self) -> Option<Option<Principal>> {
        self.receiver.changed().await.ok()?;
        Some(self.receiver.borrow_and_update().clone())
    }

    /// Resolves once nobody is signed in, or the cell has been dropped.
    pub async fn signed_out(&mut self) {
        loop {
            if self.receiver.borrow_and_update().is_none() {
                return;
            }
            if self.receiver.changed().await.is_err() {
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use models::identifiers::Email;
    use models::medical::DoctorPrincipal;
    use std::time::Duration;
    use tokio::time::timeout;

    fn doctor() -> Principal {
        Principal::Doctor(DoctorPrincipal {
            uid: "d1".into(),
            email: Email::parse("house@clinic.org").unwrap(),
            display_name: "house".into(),
        })
    }

    #[tokio::test]
    async fn watchers_see_every_publish() {
        let cell = SessionCell::new();
        let mut watcher = cell.subscribe();
        assert!(watcher.current().is_none());

        cell.publish(Some(doctor()));
        let seen = timeout(Duration::from_secs(1), watcher.changed()).await.unwrap();
        assert_eq!(seen, Some(Some(doctor())));

        cell.clear();
        cell.clear();
        assert_eq!(timeout(Duration::from_secs(1), watcher.changed()).await.unwrap(), Some(None));
    }

    #[tokio::test]
    async fn signed_out_waits_for_clear() {
        let cell = SessionCell::new();
        cell.publish(Some(doctor()));
        let mut watcher = cell.subscribe();

        assert!(timeout(Duration::from_millis(100), watcher.signed_out()).await.is_err());
        cell.clear();
        timeout(Duration::from_secs(1), watcher.signed_out()).await.unwrap();
    }

    #[tokio::test]
    async fn dropping_the_cell_counts_as_sign_out() {
        let cell = SessionCell::new();
        cell.publish(Some(doctor()));
        let mut watcher = cell.subscribe();
        drop(cell);
        timeout(Duration::from_secs(1), watcher.signed_out()).await.unwrap();
    }
}
