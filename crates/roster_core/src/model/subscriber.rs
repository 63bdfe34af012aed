//! Subscriber record and field validation.
//!
//! # Responsibility
//! - Define the single stored contact shape (`id`, `name`, `email`).
//! - Reject records with blank required fields before persistence.
//!
//! # Invariants
//! - `id == UNASSIGNED_ID` only for records that have not been inserted yet.
//! - `name` and `email` are non-blank for every valid record.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Storage-assigned row identifier.
pub type SubscriberId = i64;

/// Sentinel id for records whose identity has not been assigned by storage.
pub const UNASSIGNED_ID: SubscriberId = 0;

/// Required input field of a subscriber form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Name,
    Email,
}

impl Field {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Email => "email",
        }
    }
}

impl Display for Field {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validation error for subscriber write paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriberValidationError {
    MissingField(Field),
}

impl Display for SubscriberValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingField(field) => write!(f, "subscriber {field} is required"),
        }
    }
}

impl Error for SubscriberValidationError {}

/// A stored contact entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscriber {
    /// Row id; `UNASSIGNED_ID` until storage assigns one on insert.
    pub id: SubscriberId,
    pub name: String,
    pub email: String,
}

impl Subscriber {
    /// Creates a not-yet-persisted subscriber. Storage assigns the id.
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self::with_id(UNASSIGNED_ID, name, email)
    }

    /// Creates a subscriber with a known id, e.g. one read back from storage.
    pub fn with_id(id: SubscriberId, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            email: email.into(),
        }
    }

    /// Returns whether storage has assigned this record an identity.
    pub fn is_persisted(&self) -> bool {
        self.id != UNASSIGNED_ID
    }

    /// Checks the required-field invariant.
    ///
    /// # Errors
    /// - `MissingField(Field::Name)` when `name` is blank.
    /// - `MissingField(Field::Email)` when `email` is blank.
    pub fn validate(&self) -> Result<(), SubscriberValidationError> {
        if self.name.trim().is_empty() {
            return Err(SubscriberValidationError::MissingField(Field::Name));
        }
        if self.email.trim().is_empty() {
            return Err(SubscriberValidationError::MissingField(Field::Email));
        }
        Ok(())
    }
}
