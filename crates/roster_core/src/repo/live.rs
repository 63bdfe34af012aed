//! Push-updated subscriber list.
//!
//! # Responsibility
//! - Let stores publish the current table contents after each mutation.
//! - Let any number of readers observe the latest list without re-querying.
//!
//! # Invariants
//! - Readers always see a complete list, never a partial update.
//! - Publishing never blocks and succeeds even when no reader is attached.

use crate::model::subscriber::Subscriber;
use tokio::sync::watch;

/// Publishing half of the live list, owned by a `SubscriberStore`.
#[derive(Debug)]
pub struct SubscriberFeed {
    tx: watch::Sender<Vec<Subscriber>>,
}

impl SubscriberFeed {
    pub fn new(initial: Vec<Subscriber>) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    /// Replaces the published list and wakes every live view.
    pub fn publish(&self, subscribers: Vec<Subscriber>) {
        self.tx.send_replace(subscribers);
    }

    /// Creates a new live view starting at the current list.
    pub fn subscribe(&self) -> LiveSubscribers {
        LiveSubscribers {
            rx: self.tx.subscribe(),
        }
    }
}

impl Default for SubscriberFeed {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

/// Read-only, continuously updated view of all subscribers.
#[derive(Debug, Clone)]
pub struct LiveSubscribers {
    rx: watch::Receiver<Vec<Subscriber>>,
}

impl LiveSubscribers {
    /// Returns a copy of the latest published list.
    pub fn snapshot(&self) -> Vec<Subscriber> {
        self.rx.borrow().clone()
    }

    /// Returns the latest list and marks it as seen for `has_changed`.
    pub fn snapshot_and_mark_seen(&mut self) -> Vec<Subscriber> {
        self.rx.borrow_and_update().clone()
    }

    pub fn len(&self) -> usize {
        self.rx.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.borrow().is_empty()
    }

    /// Returns whether a list newer than the last seen one has been published.
    ///
    /// A closed feed reports `false`.
    pub fn has_changed(&self) -> bool {
        self.rx.has_changed().unwrap_or(false)
    }

    /// Waits for the next publish.
    ///
    /// Returns `false` once the owning store has been dropped.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }
}
