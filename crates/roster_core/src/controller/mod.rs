//! Mediation layer between presentation and storage.
//!
//! # Responsibility
//! - Hold transient form state and the create/edit mode.
//! - Decide which storage operation a user action maps to.
//! - Apply asynchronous completions and publish one-shot status messages.
//!
//! # Invariants
//! - Controller state only changes on the owning context (`&mut self`).
//! - A failed operation leaves mode and form untouched.

pub mod observable;
pub mod subscriber_controller;
