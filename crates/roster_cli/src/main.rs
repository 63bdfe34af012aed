//! Command-line driver for the roster core.
//!
//! # Responsibility
//! - Stand in for a presentation layer: every mutating command goes through
//!   `SubscriberController` exactly as a form would.
//! - Print the one-shot status message produced by each operation.
//!
//! Configuration comes from `ROSTER_DB_PATH`, `ROSTER_LOG_LEVEL` and
//! `ROSTER_LOG_DIR`; see `roster_core::config`.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use roster_core::{
    init_logging, RosterConfig, SqliteSubscriberStore, Subscriber, SubscriberController,
    SubscriberId, SubscriberRepository, SubscriberStore,
};

#[derive(Parser, Debug)]
#[command(name = "roster", version, about = "Manage a local subscriber list")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print core linkage info
    Ping,
    /// Print all subscribers as JSON
    List,
    #[command(flatten)]
    Edit(EditCommand),
}

/// Commands that go through the controller.
#[derive(Subcommand, Debug)]
enum EditCommand {
    /// Add a subscriber
    Add { name: String, email: String },
    /// Replace name and email of an existing subscriber
    Update {
        id: SubscriberId,
        name: String,
        email: String,
    },
    /// Delete one subscriber
    Delete { id: SubscriberId },
    /// Delete every subscriber
    Clear,
}

impl EditCommand {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Add { .. } => "add",
            Self::Update { .. } => "update",
            Self::Delete { .. } => "delete",
            Self::Clear => "clear",
        }
    }

    fn target_id(&self) -> Option<SubscriberId> {
        match self {
            Self::Update { id, .. } | Self::Delete { id } => Some(*id),
            Self::Add { .. } | Self::Clear => None,
        }
    }

    /// Key-value fields for the start event. Names and emails are left out.
    fn log_fields(&self) -> String {
        match self.target_id() {
            Some(id) => format!("command={} id={id}", self.as_str()),
            None => format!("command={}", self.as_str()),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

/// Returns whether the requested operation succeeded.
async fn run(cli: Cli) -> Result<bool> {
    let edit = match cli.command {
        Command::Ping => {
            println!("roster_core ping={}", roster_core::ping());
            println!("roster_core version={}", roster_core::core_version());
            return Ok(true);
        }
        Command::List => None,
        Command::Edit(edit) => Some(edit),
    };

    let config = RosterConfig::from_env()?;
    if let Some(log_dir) = &config.log_dir {
        let log_dir = log_dir.to_string_lossy();
        init_logging(config.log_level.as_str(), &log_dir).map_err(anyhow::Error::msg)?;
    }
    let store = SqliteSubscriberStore::open(&config.db_path)
        .with_context(|| format!("failed to open {}", config.db_path.display()))?;

    match edit {
        Some(edit) => run_edit(store, edit).await,
        None => {
            info!("event=cli_start module=cli status=ok command=list");
            let subscribers = store.subscribers().snapshot();
            println!("{}", serde_json::to_string_pretty(&subscribers)?);
            Ok(true)
        }
    }
}

/// Drives one edit through the controller and prints its status message.
async fn run_edit(store: SqliteSubscriberStore, edit: EditCommand) -> Result<bool> {
    info!("event=cli_start module=cli status=ok {}", edit.log_fields());

    let mut controller = SubscriberController::new(SubscriberRepository::new(store))?;
    match edit {
        EditCommand::Add { name, email } => {
            controller.set_input_name(Some(name));
            controller.set_input_email(Some(email));
            controller.submit()?;
        }
        EditCommand::Update { id, name, email } => {
            controller.begin_edit(find_or_placeholder(&controller, id))?;
            controller.set_input_name(Some(name));
            controller.set_input_email(Some(email));
            controller.submit()?;
        }
        EditCommand::Delete { id } => {
            controller.begin_edit(find_or_placeholder(&controller, id))?;
            controller.clear_or_delete()?;
        }
        EditCommand::Clear => controller.clear_or_delete()?,
    }

    let outcome = controller
        .next_completion()
        .await
        .context("operation finished without a result")?;
    if let Some(message) = controller.take_status_message() {
        println!("{message}");
    }
    Ok(outcome.is_success())
}

/// Looks up `id` in the live list. Unknown ids still go through the
/// controller so the store reports the miss.
fn find_or_placeholder(
    controller: &SubscriberController<SqliteSubscriberStore>,
    id: SubscriberId,
) -> Subscriber {
    controller
        .subscribers()
        .snapshot()
        .into_iter()
        .find(|subscriber| subscriber.id == id)
        .unwrap_or_else(|| Subscriber::with_id(id, "unknown", "unknown"))
}

#[cfg(test)]
mod tests {
    use super::{Cli, Command, EditCommand};
    use clap::Parser;

    fn edit_from(args: &[&str]) -> EditCommand {
        let cli = Cli::try_parse_from(std::iter::once("roster").chain(args.iter().copied()))
            .expect("arguments should parse");
        match cli.command {
            Command::Edit(edit) => edit,
            other => panic!("expected an edit command, got {other:?}"),
        }
    }

    #[test]
    fn log_fields_keep_ids_and_drop_personal_data() {
        let add = edit_from(&["add", "Ada", "ada@example.com"]);
        assert_eq!(add.log_fields(), "command=add");

        let update = edit_from(&["update", "7", "Ada Lovelace", "ada@lovelace.org"]);
        let fields = update.log_fields();
        assert_eq!(fields, "command=update id=7");
        assert!(!fields.contains("Ada"));
        assert!(!fields.contains("lovelace.org"));

        assert_eq!(edit_from(&["delete", "3"]).log_fields(), "command=delete id=3");
        assert_eq!(edit_from(&["clear"]).log_fields(), "command=clear");
    }

    #[test]
    fn read_only_commands_parse_outside_the_edit_group() {
        assert!(matches!(
            Cli::try_parse_from(["roster", "ping"]).unwrap().command,
            Command::Ping
        ));
        assert!(matches!(
            Cli::try_parse_from(["roster", "list"]).unwrap().command,
            Command::List
        ));
    }
}
