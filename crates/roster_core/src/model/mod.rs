//! Subscriber domain model.
//!
//! # Responsibility
//! - Define the canonical contact record shared by storage and controller.
//!
//! # Invariants
//! - Every persisted subscriber is identified by a storage-assigned
//!   `SubscriberId`; `0` means "not yet assigned".

pub mod subscriber;
