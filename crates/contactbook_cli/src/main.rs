//! One-shot command-line front-end for the contact book.
//!
//! # Responsibility
//! - Map subcommands onto `CommandApi` and print the returned text.
//! - Load the snapshot from the working directory before running.
//!
//! # Invariants
//! - Domain failures are printed as text and exit with status 0.
//! - Only startup failures (logging, snapshot load) exit non-zero.

use clap::{Parser, Subcommand};
use contactbook_core::{
    default_log_level, init_logging, snapshot_path_in, Command, CommandApi, ContactService,
    Directory, RestoreOutcome,
};
use log::info;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "contactbook", version, about = "Personal contact directory")]
struct Cli {
    /// Log level: trace|debug|info|warn|error.
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Absolute directory for rolling log files. Logging is off without it.
    #[arg(long, global = true)]
    log_dir: Option<String>,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Debug, Subcommand)]
enum CliCommand {
    /// Add a contact, or add a phone to an existing one.
    Add {
        name: String,
        phone: String,
        /// Birthday in YYYY-MM-DD form.
        birthday: Option<String>,
    },
    /// Replace phones of a contact matching OLD_PHONE.
    Change {
        name: String,
        old_phone: String,
        new_phone: String,
    },
    /// Remove a contact.
    Remove { name: String },
    /// Show a contact's phone numbers.
    Phone { name: String },
    /// Days until a contact's next birthday.
    NextBirthday { name: String },
    /// Contacts with a birthday in the next DAYS days.
    BirthdayList {
        #[arg(allow_hyphen_values = true)]
        days: String,
    },
    /// Search by phone digits or name fragment.
    Search { query: String },
    /// List every contact.
    ShowAll {
        /// Print records as JSON instead of text.
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Some(log_dir) = cli.log_dir.as_deref() {
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        if let Err(err) = init_logging(level, log_dir) {
            eprintln!("contactbook: {err}");
            return ExitCode::FAILURE;
        }
    }

    let snapshot_path = match std::env::current_dir() {
        Ok(dir) => snapshot_path_in(dir),
        Err(err) => {
            eprintln!("contactbook: cannot resolve working directory: {err}");
            return ExitCode::FAILURE;
        }
    };

    let mut directory = Directory::with_snapshot_file(&snapshot_path);
    match directory.restore() {
        Ok(RestoreOutcome::Restored { records }) => {
            info!("event=cli_start module=cli status=ok records={records}");
        }
        Ok(RestoreOutcome::NoExistingData) => {
            info!("event=cli_start module=cli status=ok records=0 snapshot=missing");
        }
        Err(err) => {
            eprintln!(
                "contactbook: cannot load `{}`: {err}",
                snapshot_path.display()
            );
            return ExitCode::FAILURE;
        }
    }

    let command = match cli.command {
        CliCommand::ShowAll { json: true } => {
            return match serde_json::to_string_pretty(directory.records()) {
                Ok(text) => {
                    println!("{text}");
                    ExitCode::SUCCESS
                }
                Err(err) => {
                    eprintln!("contactbook: {err}");
                    ExitCode::FAILURE
                }
            };
        }
        other => to_command(other),
    };

    let mut api = CommandApi::new(ContactService::new(directory));
    println!("{}", api.execute(command));
    ExitCode::SUCCESS
}

fn to_command(command: CliCommand) -> Command {
    match command {
        CliCommand::Add {
            name,
            phone,
            birthday,
        } => Command::Add {
            name,
            phone,
            birthday,
        },
        CliCommand::Change {
            name,
            old_phone,
            new_phone,
        } => Command::Change {
            name,
            old_phone,
            new_phone,
        },
        CliCommand::Remove { name } => Command::Remove { name },
        CliCommand::Phone { name } => Command::Phone { name },
        CliCommand::NextBirthday { name } => Command::NextBirthday { name },
        CliCommand::BirthdayList { days } => Command::BirthdayList { days },
        CliCommand::Search { query } => Command::Search { query },
        CliCommand::ShowAll { .. } => Command::ShowAll,
    }
}
