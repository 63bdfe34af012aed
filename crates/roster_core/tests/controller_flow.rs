use roster_core::{
    ButtonLabels, ControllerError, Field, LiveSubscribers, Mode, Observable, Operation,
    OperationError, Outcome, Property, SqliteSubscriberStore, StoreError, StoreResult, Subscriber,
    SubscriberController, SubscriberFeed, SubscriberId, SubscriberRepository, SubscriberStore,
};
use std::time::Duration;

fn sqlite_controller() -> SubscriberController<SqliteSubscriberStore> {
    let store = SqliteSubscriberStore::open_in_memory().unwrap();
    SubscriberController::new(SubscriberRepository::new(store)).unwrap()
}

fn fill(
    controller: &mut SubscriberController<impl SubscriberStore + 'static>,
    name: &str,
    email: &str,
) {
    controller.set_input_name(Some(name.to_string()));
    controller.set_input_email(Some(email.to_string()));
}

async fn insert_via(
    controller: &mut SubscriberController<SqliteSubscriberStore>,
    name: &str,
    email: &str,
) -> SubscriberId {
    fill(controller, name, email);
    controller.submit().unwrap();
    match controller.next_completion().await {
        Some(Outcome::Inserted { id }) => id,
        other => panic!("unexpected outcome: {other:?}"),
    }
}

/// Store whose every call fails: inserts error out, other calls match no rows.
struct FailingStore {
    feed: SubscriberFeed,
}

impl SubscriberStore for FailingStore {
    fn insert(&self, _subscriber: &Subscriber) -> StoreResult<SubscriberId> {
        Err(StoreError::Unavailable("disk full".to_string()))
    }

    fn update(&self, _subscriber: &Subscriber) -> StoreResult<usize> {
        Ok(0)
    }

    fn delete(&self, _subscriber: &Subscriber) -> StoreResult<usize> {
        Ok(0)
    }

    fn delete_all(&self) -> StoreResult<usize> {
        Err(StoreError::Unavailable("disk full".to_string()))
    }

    fn subscribers(&self) -> LiveSubscribers {
        self.feed.subscribe()
    }
}

#[tokio::test]
async fn starts_in_creating_mode_with_default_labels() {
    let controller = sqlite_controller();

    assert_eq!(controller.mode(), &Mode::Creating);
    assert!(controller.form().is_empty());
    assert_eq!(controller.labels(), ButtonLabels::CREATING);
    assert!(controller.status_message().is_none());
    assert!(!controller.is_busy());
}

#[tokio::test]
async fn submit_in_creating_mode_inserts_one_record_and_clears_form() {
    let mut controller = sqlite_controller();
    let live = controller.subscribers();

    let id = insert_via(&mut controller, "Ada", "ada@example.com").await;

    assert_eq!(
        live.snapshot(),
        vec![Subscriber::with_id(id, "Ada", "ada@example.com")]
    );
    assert_eq!(controller.mode(), &Mode::Creating);
    assert_eq!(controller.input_name(), None);
    assert_eq!(controller.input_email(), None);
    assert_eq!(
        controller.take_status_message().as_deref(),
        Some(format!("Subscriber Inserted Successfully {id}").as_str())
    );
}

#[tokio::test]
async fn status_message_is_consumed_exactly_once() {
    let mut controller = sqlite_controller();
    insert_via(&mut controller, "Ada", "ada@example.com").await;

    let peeked = controller
        .status_message()
        .map(|event| event.peek().clone())
        .unwrap();
    assert_eq!(
        controller.status_message().map(|event| event.peek().clone()),
        Some(peeked.clone())
    );

    assert_eq!(controller.take_status_message(), Some(peeked.clone()));
    assert_eq!(controller.take_status_message(), None);
    assert!(controller.status_message().unwrap().has_been_handled());
    assert_eq!(controller.status_message().unwrap().peek(), &peeked);
}

#[tokio::test]
async fn submit_rejects_missing_fields_without_dispatching() {
    let mut controller = sqlite_controller();

    controller.set_input_email(Some("ada@example.com".to_string()));
    assert_eq!(
        controller.submit(),
        Err(ControllerError::MissingField(Field::Name))
    );

    controller.set_input_name(Some("Ada".to_string()));
    controller.set_input_email(Some("   ".to_string()));
    assert_eq!(
        controller.submit(),
        Err(ControllerError::MissingField(Field::Email))
    );

    assert!(!controller.is_busy());
    assert_eq!(controller.next_completion().await, None);
    assert!(controller.subscribers().is_empty());
    assert_eq!(controller.input_name(), Some("Ada"));
}

#[tokio::test]
async fn begin_edit_populates_form_and_switches_labels() {
    let mut controller = sqlite_controller();
    let id = insert_via(&mut controller, "Ada", "ada@example.com").await;
    let record = controller.subscribers().snapshot()[0].clone();

    controller.begin_edit(record.clone()).unwrap();

    assert_eq!(controller.mode(), &Mode::Editing(record));
    assert_eq!(controller.mode().target_id(), Some(id));
    assert_eq!(controller.input_name(), Some("Ada"));
    assert_eq!(controller.input_email(), Some("ada@example.com"));
    assert_eq!(controller.labels(), ButtonLabels::EDITING);
}

#[tokio::test]
async fn edit_then_submit_updates_record_in_place() {
    let mut controller = sqlite_controller();
    let id = insert_via(&mut controller, "Ada", "ada@example.com").await;
    insert_via(&mut controller, "Linus", "linus@example.com").await;
    let live = controller.subscribers();
    let target = live.snapshot()[0].clone();

    controller.begin_edit(target).unwrap();
    fill(&mut controller, "Ada Lovelace", "ada@lovelace.org");
    controller.submit().unwrap();

    assert_eq!(
        controller.next_completion().await,
        Some(Outcome::Updated { affected: 1 })
    );
    let all = live.snapshot();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0], Subscriber::with_id(id, "Ada Lovelace", "ada@lovelace.org"));
    assert_eq!(controller.mode(), &Mode::Creating);
    assert!(controller.form().is_empty());
    assert_eq!(controller.labels(), ButtonLabels::CREATING);
    assert_eq!(
        controller.take_status_message().as_deref(),
        Some("1 Subscriber Updated Successfully")
    );
}

#[tokio::test]
async fn clear_or_delete_in_creating_mode_empties_the_list() {
    let mut controller = sqlite_controller();
    insert_via(&mut controller, "Ada", "ada@example.com").await;
    insert_via(&mut controller, "Linus", "linus@example.com").await;
    insert_via(&mut controller, "Grace", "grace@example.com").await;

    controller.clear_or_delete().unwrap();
    assert_eq!(
        controller.next_completion().await,
        Some(Outcome::DeletedAll { affected: 3 })
    );
    assert!(controller.subscribers().is_empty());
    assert_eq!(
        controller.take_status_message().as_deref(),
        Some("All 3 Subscribers Deleted Successfully")
    );
}

#[tokio::test]
async fn clear_or_delete_in_editing_mode_removes_exactly_the_target() {
    let mut controller = sqlite_controller();
    let keep = insert_via(&mut controller, "Ada", "ada@example.com").await;
    let remove = insert_via(&mut controller, "Linus", "linus@example.com").await;
    let target = controller
        .subscribers()
        .snapshot()
        .into_iter()
        .find(|subscriber| subscriber.id == remove)
        .unwrap();

    controller.begin_edit(target).unwrap();
    controller.clear_or_delete().unwrap();

    assert_eq!(
        controller.next_completion().await,
        Some(Outcome::Deleted { affected: 1 })
    );
    let ids: Vec<_> = controller
        .subscribers()
        .snapshot()
        .iter()
        .map(|subscriber| subscriber.id)
        .collect();
    assert_eq!(ids, vec![keep]);
    assert_eq!(controller.mode(), &Mode::Creating);
    assert_eq!(controller.labels(), ButtonLabels::CREATING);
    assert_eq!(
        controller.take_status_message().as_deref(),
        Some("1 Subscriber Deleted Successfully")
    );
}

#[tokio::test]
async fn update_of_missing_record_fails_and_keeps_state() {
    let mut controller = sqlite_controller();
    let ghost = Subscriber::with_id(999, "Ghost", "ghost@example.com");

    controller.begin_edit(ghost.clone()).unwrap();
    fill(&mut controller, "Ghost Writer", "ghost@example.com");
    controller.submit().unwrap();

    assert_eq!(
        controller.next_completion().await,
        Some(Outcome::Failed(OperationError::UpdateFailed))
    );
    assert_eq!(controller.mode(), &Mode::Editing(ghost));
    assert_eq!(controller.input_name(), Some("Ghost Writer"));
    assert_eq!(controller.labels(), ButtonLabels::EDITING);
    assert_eq!(
        controller.take_status_message().as_deref(),
        Some("Error Occurred during Update.")
    );
    assert!(controller.subscribers().is_empty());
}

#[tokio::test]
async fn delete_of_missing_record_fails_and_keeps_state() {
    let mut controller = sqlite_controller();
    let ghost = Subscriber::with_id(999, "Ghost", "ghost@example.com");

    controller.begin_edit(ghost.clone()).unwrap();
    controller.clear_or_delete().unwrap();

    assert_eq!(
        controller.next_completion().await,
        Some(Outcome::Failed(OperationError::DeleteFailed))
    );
    assert_eq!(controller.mode(), &Mode::Editing(ghost));
    assert_eq!(controller.input_email(), Some("ghost@example.com"));
    assert_eq!(
        controller.take_status_message().as_deref(),
        Some("Error Occurred during Delete.")
    );
}

#[tokio::test]
async fn clear_all_on_empty_table_reports_failure() {
    let mut controller = sqlite_controller();

    controller.clear_or_delete().unwrap();
    assert_eq!(
        controller.next_completion().await,
        Some(Outcome::Failed(OperationError::DeleteAllFailed))
    );
    assert_eq!(
        controller.take_status_message().as_deref(),
        Some("Error Occurred during Delete.")
    );
}

#[tokio::test]
async fn storage_errors_surface_as_notifications() {
    let store = FailingStore {
        feed: SubscriberFeed::default(),
    };
    let mut controller = SubscriberController::new(SubscriberRepository::new(store)).unwrap();

    fill(&mut controller, "Ada", "ada@example.com");
    controller.submit().unwrap();
    assert_eq!(
        controller.next_completion().await,
        Some(Outcome::Failed(OperationError::InsertFailed))
    );
    assert_eq!(controller.input_name(), Some("Ada"));
    assert_eq!(
        controller.take_status_message().as_deref(),
        Some("Error Occurred during Insert.")
    );

    controller.clear_or_delete().unwrap();
    assert_eq!(
        controller.next_completion().await,
        Some(Outcome::Failed(OperationError::DeleteAllFailed))
    );
}

#[tokio::test]
async fn mutating_calls_are_serialized_per_controller() {
    let mut controller = sqlite_controller();
    let record = Subscriber::with_id(1, "Ada", "ada@example.com");

    fill(&mut controller, "Ada", "ada@example.com");
    controller.submit().unwrap();
    assert_eq!(controller.pending_operation(), Some(Operation::Insert));

    assert_eq!(
        controller.submit(),
        Err(ControllerError::Busy(Operation::Insert))
    );
    assert_eq!(
        controller.clear_or_delete(),
        Err(ControllerError::Busy(Operation::Insert))
    );
    assert_eq!(
        controller.begin_edit(record),
        Err(ControllerError::Busy(Operation::Insert))
    );

    assert!(matches!(
        controller.next_completion().await,
        Some(Outcome::Inserted { .. })
    ));
    assert!(!controller.is_busy());
    assert_eq!(controller.subscribers().len(), 1);
}

#[tokio::test]
async fn drain_completions_applies_arrived_results() {
    let mut controller = sqlite_controller();
    assert!(controller.drain_completions().is_empty());

    fill(&mut controller, "Ada", "ada@example.com");
    controller.submit().unwrap();

    let outcomes = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let outcomes = controller.drain_completions();
            if !outcomes.is_empty() {
                return outcomes;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("insert should complete");

    assert_eq!(outcomes.len(), 1);
    assert!(outcomes[0].is_success());
    assert!(!controller.is_busy());
    assert!(controller.form().is_empty());
}

#[tokio::test]
async fn live_list_wakes_observers_after_submit() {
    let mut controller = sqlite_controller();
    let mut live = controller.subscribers();

    fill(&mut controller, "Ada", "ada@example.com");
    controller.submit().unwrap();

    assert!(live.changed().await);
    let seen = live.snapshot_and_mark_seen();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].name, "Ada");
    controller.next_completion().await;
}

#[tokio::test]
async fn property_observation_is_not_supported() {
    let mut controller = sqlite_controller();
    let id = controller.add_on_property_changed_callback(Box::new(|_property: Property| {}));
    assert_eq!(id, None);
}

#[test]
fn controller_requires_a_runtime() {
    let store = SqliteSubscriberStore::open_in_memory().unwrap();
    let result = SubscriberController::new(SubscriberRepository::new(store));
    assert!(matches!(result, Err(ControllerError::NoRuntime)));
}

#[test]
fn controller_can_use_an_explicit_runtime() {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let store = SqliteSubscriberStore::open_in_memory().unwrap();
    let mut controller =
        SubscriberController::with_runtime(SubscriberRepository::new(store), runtime.handle().clone());

    fill(&mut controller, "Ada", "ada@example.com");
    controller.submit().unwrap();
    let outcome = runtime.block_on(controller.next_completion());
    assert!(matches!(outcome, Some(Outcome::Inserted { .. })));
}
