//! One-shot notification wrapper.
//!
//! # Responsibility
//! - Carry a status value from the controller to exactly one observer read.
//!
//! # Invariants
//! - `consume` yields the value at most once; later calls return `None`.
//! - `peek` never changes the handled flag.
//! - Consumption requires `&mut self`, so a single owner is enforced by the
//!   borrow checker rather than by locking.

/// Single-value, single-consumption cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event<T> {
    content: T,
    has_been_handled: bool,
}

impl<T> Event<T> {
    pub fn new(content: T) -> Self {
        Self {
            content,
            has_been_handled: false,
        }
    }

    /// Returns the content regardless of whether it was already handled.
    pub fn peek(&self) -> &T {
        &self.content
    }

    /// Returns whether `consume` (or `take`) has already handed the value out.
    pub fn has_been_handled(&self) -> bool {
        self.has_been_handled
    }

    /// Transfers ownership of the content out of the wrapper, ignoring the flag.
    pub fn into_inner(self) -> T {
        self.content
    }
}

impl<T: Clone> Event<T> {
    /// Returns the content once, then `None` on every later call.
    pub fn consume(&mut self) -> Option<T> {
        if self.has_been_handled {
            return None;
        }
        self.has_been_handled = true;
        Some(self.content.clone())
    }
}

impl<T> From<T> for Event<T> {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}
