//! Repository facade over a subscriber store.
//!
//! # Responsibility
//! - Give the controller one storage-agnostic handle to persistence.
//! - Allow any `SubscriberStore` to be substituted (e.g. test doubles).
//!
//! # Invariants
//! - Every call delegates unchanged: no retries, no transformation.

use crate::model::subscriber::{Subscriber, SubscriberId};
use crate::repo::live::LiveSubscribers;
use crate::repo::subscriber_store::{StoreResult, SubscriberStore};
use std::sync::Arc;

/// Cheaply cloneable pass-through to a shared `SubscriberStore`.
#[derive(Debug)]
pub struct SubscriberRepository<S: SubscriberStore> {
    store: Arc<S>,
}

impl<S: SubscriberStore> Clone for SubscriberRepository<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: SubscriberStore> SubscriberRepository<S> {
    pub fn new(store: S) -> Self {
        Self::from_shared(Arc::new(store))
    }

    /// Wraps a store that is also used elsewhere.
    pub fn from_shared(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn subscribers(&self) -> LiveSubscribers {
        self.store.subscribers()
    }

    pub fn insert(&self, subscriber: &Subscriber) -> StoreResult<SubscriberId> {
        self.store.insert(subscriber)
    }

    pub fn update(&self, subscriber: &Subscriber) -> StoreResult<usize> {
        self.store.update(subscriber)
    }

    pub fn delete(&self, subscriber: &Subscriber) -> StoreResult<usize> {
        self.store.delete(subscriber)
    }

    pub fn delete_all(&self) -> StoreResult<usize> {
        self.store.delete_all()
    }
}
