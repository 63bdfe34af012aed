//! Optional property-change observation capability.
//!
//! Presentation layers that bind to controller properties may register
//! callbacks. Implementors that do not push property changes keep the no-op
//! defaults; callers must then read properties directly.

/// Controller property that a presentation layer may bind to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Property {
    InputName,
    InputEmail,
    ButtonLabels,
    StatusMessage,
}

/// Identifies a registered callback for later removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallbackId(pub u64);

pub type PropertyChangedCallback = Box<dyn FnMut(Property) + Send>;

pub trait Observable {
    /// Registers a callback; `None` means observation is not supported.
    fn add_on_property_changed_callback(
        &mut self,
        _callback: PropertyChangedCallback,
    ) -> Option<CallbackId> {
        None
    }

    /// Unregisters a callback; returns whether one was removed.
    fn remove_on_property_changed_callback(&mut self, _id: CallbackId) -> bool {
        false
    }
}
