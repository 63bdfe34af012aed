//! Storage gateway contracts, SQLite implementation and repository facade.
//!
//! # Responsibility
//! - Define the four mutating subscriber operations plus the live list.
//! - Keep SQL details inside the core persistence boundary.
//! - Give the controller a storage-agnostic repository to talk to.
//!
//! # Invariants
//! - Write paths validate records before SQL mutations.
//! - Every successful mutation republishes the full list to live views.

pub mod live;
pub mod subscriber_repo;
pub mod subscriber_store;
