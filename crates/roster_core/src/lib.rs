//! Core logic for the subscriber roster.
//! Storage, repository and the form controller live here; presentation
//! layers only talk to `SubscriberController`.

pub mod config;
pub mod controller;
pub mod db;
pub mod event;
pub mod logging;
pub mod model;
pub mod repo;

pub use config::{ConfigError, RosterConfig};
pub use controller::observable::{CallbackId, Observable, Property, PropertyChangedCallback};
pub use controller::subscriber_controller::{
    ButtonLabels, ControllerError, FormState, Mode, Operation, OperationError, Outcome,
    SubscriberController,
};
pub use event::Event;
pub use logging::{default_log_level, init_logging, logging_status, LogLevel};
pub use model::subscriber::{
    Field, Subscriber, SubscriberId, SubscriberValidationError, UNASSIGNED_ID,
};
pub use repo::live::{LiveSubscribers, SubscriberFeed};
pub use repo::subscriber_repo::SubscriberRepository;
pub use repo::subscriber_store::{
    SqliteSubscriberStore, StoreError, StoreResult, SubscriberStore,
};

/// Minimal health-check API for host integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
