//! Subscriber form controller.
//!
//! # Responsibility
//! - Track the form (`name`, `email`) and whether it creates or edits.
//! - Map `submit` / `clear_or_delete` to insert, update, delete or delete-all.
//! - Run storage calls off the owning context and apply their completions
//!   back on it.
//!
//! # Invariants
//! - At most one storage operation is in flight per controller.
//! - `Editing` always carries exactly one target record.
//! - Every applied completion publishes exactly one status message.
//! - An affected-row count of `0` is a failure, never a silent success.

use crate::controller::observable::Observable;
use crate::event::Event;
use crate::model::subscriber::{
    Field, Subscriber, SubscriberId, SubscriberValidationError, UNASSIGNED_ID,
};
use crate::repo::live::LiveSubscribers;
use crate::repo::subscriber_repo::SubscriberRepository;
use crate::repo::subscriber_store::{StoreError, StoreResult, SubscriberStore};
use log::{debug, error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use tokio::runtime::Handle;
use tokio::sync::mpsc;

pub const SAVE_LABEL: &str = "Save";
pub const UPDATE_LABEL: &str = "Update";
pub const CLEAR_ALL_LABEL: &str = "Clear All";
pub const DELETE_LABEL: &str = "Delete";

/// Whether the form creates a new subscriber or edits an existing one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Creating,
    /// Carries the record being edited as it was when editing began.
    Editing(Subscriber),
}

impl Mode {
    pub fn is_editing(&self) -> bool {
        matches!(self, Self::Editing(_))
    }

    /// Returns the id of the edit target, if any.
    pub fn target_id(&self) -> Option<SubscriberId> {
        match self {
            Self::Creating => None,
            Self::Editing(subscriber) => Some(subscriber.id),
        }
    }
}

/// Raw form input as last set by the presentation layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormState {
    pub name: Option<String>,
    pub email: Option<String>,
}

impl FormState {
    fn from_subscriber(subscriber: &Subscriber) -> Self {
        Self {
            name: Some(subscriber.name.clone()),
            email: Some(subscriber.email.clone()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none()
    }

    fn clear(&mut self) {
        self.name = None;
        self.email = None;
    }

    /// Builds a record with the given id from the current input.
    fn to_subscriber(&self, id: SubscriberId) -> Result<Subscriber, SubscriberValidationError> {
        let subscriber = Subscriber::with_id(
            id,
            self.name.clone().unwrap_or_default(),
            self.email.clone().unwrap_or_default(),
        );
        subscriber.validate()?;
        Ok(subscriber)
    }
}

/// Button captions for the two form actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonLabels {
    pub save_or_update: &'static str,
    pub clear_all_or_delete: &'static str,
}

impl ButtonLabels {
    pub const CREATING: Self = Self {
        save_or_update: SAVE_LABEL,
        clear_all_or_delete: CLEAR_ALL_LABEL,
    };

    pub const EDITING: Self = Self {
        save_or_update: UPDATE_LABEL,
        clear_all_or_delete: DELETE_LABEL,
    };
}

impl Default for ButtonLabels {
    fn default() -> Self {
        Self::CREATING
    }
}

/// Storage operation dispatched by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Insert,
    Update,
    Delete,
    DeleteAll,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::DeleteAll => "delete_all",
        }
    }

    fn failure(self) -> OperationError {
        match self {
            Self::Insert => OperationError::InsertFailed,
            Self::Update => OperationError::UpdateFailed,
            Self::Delete => OperationError::DeleteFailed,
            Self::DeleteAll => OperationError::DeleteAllFailed,
        }
    }
}

/// Non-fatal failure of an asynchronous storage operation.
///
/// `Display` renders the status message shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationError {
    InsertFailed,
    UpdateFailed,
    DeleteFailed,
    DeleteAllFailed,
}

impl Display for OperationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InsertFailed => f.write_str("Error Occurred during Insert."),
            Self::UpdateFailed => f.write_str("Error Occurred during Update."),
            Self::DeleteFailed | Self::DeleteAllFailed => {
                f.write_str("Error Occurred during Delete.")
            }
        }
    }
}

impl Error for OperationError {}

/// Result of one applied completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Inserted { id: SubscriberId },
    Updated { affected: usize },
    Deleted { affected: usize },
    DeletedAll { affected: usize },
    Failed(OperationError),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Failed(_))
    }

    /// Human-readable status message for this outcome.
    pub fn message(&self) -> String {
        match self {
            Self::Inserted { id } => format!("Subscriber Inserted Successfully {id}"),
            Self::Updated { affected } => format!("{affected} Subscriber Updated Successfully"),
            Self::Deleted { affected } => format!("{affected} Subscriber Deleted Successfully"),
            Self::DeletedAll { affected } => {
                format!("All {affected} Subscribers Deleted Successfully")
            }
            Self::Failed(err) => err.to_string(),
        }
    }
}

/// Synchronous rejection of a controller action; nothing was dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerError {
    MissingField(Field),
    /// Another storage operation from this controller has not completed yet.
    Busy(Operation),
    /// The controller was created outside a tokio runtime.
    NoRuntime,
}

impl Display for ControllerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingField(field) => write!(f, "subscriber {field} is required"),
            Self::Busy(operation) => {
                write!(f, "a {} operation is still in progress", operation.as_str())
            }
            Self::NoRuntime => f.write_str("no tokio runtime available for storage calls"),
        }
    }
}

impl Error for ControllerError {}

impl From<SubscriberValidationError> for ControllerError {
    fn from(value: SubscriberValidationError) -> Self {
        match value {
            SubscriberValidationError::MissingField(field) => Self::MissingField(field),
        }
    }
}

/// Result of a storage call, sent from the worker back to the owner.
#[derive(Debug)]
enum Completion {
    Inserted(StoreResult<SubscriberId>),
    Updated(StoreResult<usize>),
    Deleted(StoreResult<usize>),
    DeletedAll(StoreResult<usize>),
    /// The worker died before producing a result.
    Aborted(Operation),
}

/// Stateful controller driving one subscriber form.
pub struct SubscriberController<S: SubscriberStore + 'static> {
    repository: SubscriberRepository<S>,
    runtime: Handle,
    mode: Mode,
    form: FormState,
    labels: ButtonLabels,
    status_message: Option<Event<String>>,
    in_flight: Option<Operation>,
    completion_tx: mpsc::UnboundedSender<Completion>,
    completion_rx: mpsc::UnboundedReceiver<Completion>,
}

impl<S: SubscriberStore + 'static> SubscriberController<S> {
    /// Creates a controller that runs storage calls on the current runtime.
    ///
    /// # Errors
    /// - `ControllerError::NoRuntime` when called outside a tokio runtime.
    pub fn new(repository: SubscriberRepository<S>) -> Result<Self, ControllerError> {
        let runtime = Handle::try_current().map_err(|_| ControllerError::NoRuntime)?;
        Ok(Self::with_runtime(repository, runtime))
    }

    /// Creates a controller that runs storage calls on `runtime`.
    pub fn with_runtime(repository: SubscriberRepository<S>, runtime: Handle) -> Self {
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();
        Self {
            repository,
            runtime,
            mode: Mode::Creating,
            form: FormState::default(),
            labels: ButtonLabels::CREATING,
            status_message: None,
            in_flight: None,
            completion_tx,
            completion_rx,
        }
    }

    pub fn subscribers(&self) -> LiveSubscribers {
        self.repository.subscribers()
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn form(&self) -> &FormState {
        &self.form
    }

    pub fn input_name(&self) -> Option<&str> {
        self.form.name.as_deref()
    }

    pub fn input_email(&self) -> Option<&str> {
        self.form.email.as_deref()
    }

    pub fn set_input_name(&mut self, name: Option<String>) {
        self.form.name = name;
    }

    pub fn set_input_email(&mut self, email: Option<String>) {
        self.form.email = email;
    }

    pub fn labels(&self) -> ButtonLabels {
        self.labels
    }

    /// Returns the operation currently waiting for completion, if any.
    pub fn pending_operation(&self) -> Option<Operation> {
        self.in_flight
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Latest status notification, without consuming it.
    pub fn status_message(&self) -> Option<&Event<String>> {
        self.status_message.as_ref()
    }

    /// Consumes the latest status notification.
    ///
    /// Returns `None` when there is none or it was already consumed.
    pub fn take_status_message(&mut self) -> Option<String> {
        self.status_message.as_mut().and_then(Event::consume)
    }

    /// Switches the form to edit `subscriber`.
    pub fn begin_edit(&mut self, subscriber: Subscriber) -> Result<(), ControllerError> {
        self.ensure_idle()?;
        debug!(
            "event=controller_begin_edit module=controller status=ok id={}",
            subscriber.id
        );
        self.form = FormState::from_subscriber(&subscriber);
        self.labels = ButtonLabels::EDITING;
        self.mode = Mode::Editing(subscriber);
        Ok(())
    }

    /// Saves the form: inserts when creating, updates the target when editing.
    ///
    /// # Errors
    /// - `MissingField` when name or email is unset or blank.
    /// - `Busy` while a previous operation is pending.
    pub fn submit(&mut self) -> Result<(), ControllerError> {
        self.ensure_idle()?;
        match &self.mode {
            Mode::Creating => {
                let subscriber = self.form.to_subscriber(UNASSIGNED_ID)?;
                self.dispatch(Operation::Insert, move |repository| {
                    Completion::Inserted(repository.insert(&subscriber))
                });
            }
            Mode::Editing(target) => {
                let subscriber = self.form.to_subscriber(target.id)?;
                self.dispatch(Operation::Update, move |repository| {
                    Completion::Updated(repository.update(&subscriber))
                });
            }
        }
        Ok(())
    }

    /// Clears everything when creating, deletes the target when editing.
    ///
    /// # Errors
    /// - `Busy` while a previous operation is pending.
    pub fn clear_or_delete(&mut self) -> Result<(), ControllerError> {
        self.ensure_idle()?;
        match &self.mode {
            Mode::Creating => {
                self.dispatch(Operation::DeleteAll, |repository| {
                    Completion::DeletedAll(repository.delete_all())
                });
            }
            Mode::Editing(target) => {
                let subscriber = target.clone();
                self.dispatch(Operation::Delete, move |repository| {
                    Completion::Deleted(repository.delete(&subscriber))
                });
            }
        }
        Ok(())
    }

    /// Waits for the pending operation and applies its completion.
    ///
    /// Returns `None` when nothing is in flight.
    pub async fn next_completion(&mut self) -> Option<Outcome> {
        self.in_flight?;
        let completion = self.completion_rx.recv().await?;
        Some(self.apply(completion))
    }

    /// Applies every completion that has already arrived, without waiting.
    pub fn drain_completions(&mut self) -> Vec<Outcome> {
        let mut outcomes = Vec::new();
        while let Ok(completion) = self.completion_rx.try_recv() {
            outcomes.push(self.apply(completion));
        }
        outcomes
    }

    fn ensure_idle(&self) -> Result<(), ControllerError> {
        match self.in_flight {
            Some(operation) => {
                warn!(
                    "event=controller_reject module=controller status=error error_code=busy pending_op={}",
                    operation.as_str()
                );
                Err(ControllerError::Busy(operation))
            }
            None => Ok(()),
        }
    }

    fn dispatch<F>(&mut self, operation: Operation, job: F)
    where
        F: FnOnce(&SubscriberRepository<S>) -> Completion + Send + 'static,
    {
        info!(
            "event=controller_dispatch module=controller status=start op={}",
            operation.as_str()
        );
        self.in_flight = Some(operation);

        let repository = self.repository.clone();
        let completion_tx = self.completion_tx.clone();
        let worker = self.runtime.spawn_blocking(move || job(&repository));
        self.runtime.spawn(async move {
            let completion = match worker.await {
                Ok(completion) => completion,
                Err(err) => {
                    error!(
                        "event=controller_dispatch module=controller status=error op={} error_code=worker_failed error={err}",
                        operation.as_str()
                    );
                    Completion::Aborted(operation)
                }
            };
            // A closed channel means the controller was dropped; nobody is
            // left to apply the result.
            let _ = completion_tx.send(completion);
        });
    }

    fn apply(&mut self, completion: Completion) -> Outcome {
        self.in_flight = None;
        let outcome = match completion {
            Completion::Inserted(Ok(id)) => {
                self.form.clear();
                Outcome::Inserted { id }
            }
            Completion::Updated(Ok(affected)) if affected > 0 => {
                self.reset_to_creating();
                Outcome::Updated { affected }
            }
            Completion::Deleted(Ok(affected)) if affected > 0 => {
                self.reset_to_creating();
                Outcome::Deleted { affected }
            }
            Completion::DeletedAll(Ok(affected)) if affected > 0 => {
                Outcome::DeletedAll { affected }
            }
            Completion::Inserted(Err(err)) => failed(Operation::Insert, Some(&err)),
            Completion::Updated(result) => failed(Operation::Update, result.err().as_ref()),
            Completion::Deleted(result) => failed(Operation::Delete, result.err().as_ref()),
            Completion::DeletedAll(result) => {
                failed(Operation::DeleteAll, result.err().as_ref())
            }
            Completion::Aborted(operation) => failed(operation, None),
        };

        if outcome.is_success() {
            info!("event=controller_apply module=controller status=ok outcome={outcome:?}");
        }
        self.status_message = Some(Event::new(outcome.message()));
        outcome
    }

    fn reset_to_creating(&mut self) {
        self.form.clear();
        self.mode = Mode::Creating;
        self.labels = ButtonLabels::CREATING;
    }
}

impl<S: SubscriberStore + 'static> Observable for SubscriberController<S> {}

impl<S: SubscriberStore + 'static> std::fmt::Debug for SubscriberController<S> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriberController")
            .field("mode", &self.mode)
            .field("form", &self.form)
            .field("labels", &self.labels)
            .field("in_flight", &self.in_flight)
            .finish()
    }
}

fn failed(operation: Operation, cause: Option<&StoreError>) -> Outcome {
    match cause {
        Some(err) => error!(
            "event=controller_apply module=controller status=error op={} error_code=store_error error={err}",
            operation.as_str()
        ),
        None => warn!(
            "event=controller_apply module=controller status=error op={} error_code=no_rows_affected",
            operation.as_str()
        ),
    }
    Outcome::Failed(operation.failure())
}
