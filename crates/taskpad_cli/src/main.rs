//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `taskpad_core` linkage with a deterministic ping/version probe.
//! - Drive the task store against the configured database for manual checks.
//!
//! Reminders are disabled here: a one-shot process exits long before any
//! reminder would come due.

use clap::{Parser, Subcommand, ValueEnum};
use std::process::ExitCode;
use std::sync::Arc;
use taskpad_core::{
    init_logging_from_config, open_store, AppConfig, DisabledNotifications, Outcome, Priority,
    Task, TaskId, TaskStore,
};

#[derive(Parser, Debug)]
#[command(name = "taskpad", version, about = "Taskpad core probe and task list driver")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Command {
    /// List tasks in display order
    List,
    /// Append a task
    Add {
        #[arg(required = true)]
        text: Vec<String>,
    },
    /// Replace a task's text
    Edit {
        id: TaskId,
        #[arg(required = true)]
        text: Vec<String>,
    },
    /// Flip a task between open and completed; reopening reschedules its reminder
    Toggle { id: TaskId },
    /// Delete a task
    Rm { id: TaskId },
    /// Set a task's priority
    Priority {
        id: TaskId,
        #[arg(value_enum)]
        level: PriorityArg,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum PriorityArg {
    High,
    Medium,
    Low,
}

impl From<PriorityArg> for Priority {
    fn from(value: PriorityArg) -> Self {
        match value {
            PriorityArg::High => Priority::High,
            PriorityArg::Medium => Priority::Medium,
            PriorityArg::Low => Priority::Low,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Why: a bare invocation stays a tiny probe of core crate wiring,
    // independent from config, storage and Flutter/FFI setup.
    println!("taskpad_core ping={}", taskpad_core::ping());
    println!("taskpad_core version={}", taskpad_core::core_version());
    let Some(command) = cli.command else {
        return ExitCode::SUCCESS;
    };

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("config error: {err}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(err) = init_logging_from_config(&config) {
        eprintln!("logging disabled: {err}");
    }

    let store = open_store(&config, Arc::new(DisabledNotifications)).await;
    match run(&store, command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{message}");
            ExitCode::FAILURE
        }
    }
}

async fn run(store: &TaskStore, command: Command) -> Result<(), String> {
    match command {
        Command::List => print_tasks(&store.snapshot().await),
        Command::Add { text } => {
            let id = report(store.add(text.join(" ").as_str()).await)?;
            println!("added {id}");
        }
        Command::Edit { id, text } => {
            report(store.edit(id, text.join(" ").as_str()).await)?;
            println!("edited {id}");
        }
        Command::Toggle { id } => {
            let completed = report(store.toggle_complete(id).await)?;
            println!("{id} completed={completed}");
        }
        Command::Rm { id } => {
            report(store.delete(id).await)?;
            println!("deleted {id}");
        }
        Command::Priority { id, level } => {
            let priority = Priority::from(level);
            report(store.set_priority(id, priority).await)?;
            println!("{id} priority={priority}");
        }
    }
    Ok(())
}

fn report<T>(outcome: Outcome<T>) -> Result<T, String> {
    match outcome {
        Outcome::Applied(value) => Ok(value),
        Outcome::Rejected(reason) => Err(format!("ignored: {}", reason.code())),
    }
}

fn print_tasks(tasks: &[Task]) {
    if tasks.is_empty() {
        println!("(no tasks)");
        return;
    }
    for task in tasks {
        let mark = if task.completed { "x" } else { " " };
        println!("[{mark}] {} {:<6} {}", task.id, task.priority.as_str(), task.text);
    }
}
