//! Global flags and subcommands.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use taskvault_core::VERSION;

use crate::constants::DIR_ENV;

/// TaskVault - an encrypted, local-first task manager
#[derive(Parser)]
#[command(name = "taskvault")]
#[command(author, version = VERSION, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Data directory (defaults to the config file, then the XDG data dir)
    #[arg(short, long, global = true, env = DIR_ENV)]
    pub dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Use ASCII symbols only
    #[arg(long, global = true)]
    pub ascii: bool,

    /// Disable interactive prompts
    #[arg(long, global = true)]
    pub no_input: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show encryption and biometric status
    Status,

    /// Turn on encryption
    Enable(EnableArgs),

    /// Turn off encryption (requires the secret)
    Disable,

    /// Check that the secret (or biometric unlock) opens the data
    Unlock,

    /// Lock the session
    Lock,

    /// Turn biometric unlock on or off
    Biometrics(BiometricsArgs),

    /// Manage projects
    Projects(ProjectsArgs),

    /// Manage tasks
    Tasks(TasksArgs),

    /// Export or import backups
    Backup(BackupArgs),

    /// Delete all data and start over
    Reset(ResetArgs),

    /// Run diagnostics
    Doctor,
}

/// Arguments for the `enable` command
#[derive(Args)]
pub struct EnableArgs {
    /// Also escrow the key for biometric unlock
    #[arg(long)]
    pub biometrics: bool,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum Toggle {
    On,
    Off,
}

/// Arguments for the `biometrics` command
#[derive(Args)]
pub struct BiometricsArgs {
    #[arg(value_enum)]
    pub state: Toggle,
}

#[derive(Args)]
pub struct ProjectsArgs {
    #[command(subcommand)]
    pub command: ProjectsSubcommand,
}

#[derive(Subcommand)]
pub enum ProjectsSubcommand {
    /// List projects
    List,

    /// Add a project
    Add {
        #[arg(value_name = "NAME")]
        name: String,
    },

    /// Rename a project
    Rename {
        /// Project id or current name
        #[arg(value_name = "PROJECT")]
        project: String,

        #[arg(value_name = "NAME")]
        name: String,
    },

    /// Delete a project; its tasks move to the inbox
    Delete {
        /// Project id or name
        #[arg(value_name = "PROJECT")]
        project: String,
    },
}

#[derive(Args)]
pub struct TasksArgs {
    #[command(subcommand)]
    pub command: TasksSubcommand,
}

#[derive(Subcommand)]
pub enum TasksSubcommand {
    /// List tasks
    List(TaskListArgs),

    /// Add a task
    Add(TaskAddArgs),

    /// Update fields of a task
    Update(TaskUpdateArgs),

    /// Mark a task completed
    Done {
        /// Task id (or unique prefix)
        #[arg(value_name = "ID")]
        id: String,
    },

    /// Mark a task not completed
    Undone {
        /// Task id (or unique prefix)
        #[arg(value_name = "ID")]
        id: String,
    },

    /// Delete a task
    Delete {
        /// Task id (or unique prefix)
        #[arg(value_name = "ID")]
        id: String,
    },
}

/// Arguments for `tasks list`
#[derive(Args)]
pub struct TaskListArgs {
    /// Only tasks in this project (id or name)
    #[arg(long)]
    pub project: Option<String>,

    /// Include completed tasks
    #[arg(long)]
    pub all: bool,

    /// Only tasks carrying this tag
    #[arg(long)]
    pub tag: Option<String>,
}

/// Arguments for `tasks add`
#[derive(Args)]
pub struct TaskAddArgs {
    #[arg(value_name = "TITLE")]
    pub title: String,

    #[arg(long)]
    pub description: Option<String>,

    /// Project id or name (defaults to the inbox)
    #[arg(long)]
    pub project: Option<String>,

    /// Due date (YYYY-MM-DD)
    #[arg(long)]
    pub due: Option<String>,

    /// Priority 0-3
    #[arg(long)]
    pub priority: Option<i64>,

    /// Add a tag (repeatable)
    #[arg(short, long = "tag", value_name = "TAG")]
    pub tags: Vec<String>,

    /// Create the task already completed
    #[arg(long)]
    pub done: bool,
}

/// Arguments for `tasks update`
#[derive(Args)]
pub struct TaskUpdateArgs {
    /// Task id (or unique prefix)
    #[arg(value_name = "ID")]
    pub id: String,

    #[arg(long)]
    pub title: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    /// Project id or name
    #[arg(long)]
    pub project: Option<String>,

    /// Due date (YYYY-MM-DD)
    #[arg(long, conflicts_with = "clear_due")]
    pub due: Option<String>,

    /// Remove the due date
    #[arg(long)]
    pub clear_due: bool,

    /// Priority 0-3
    #[arg(long)]
    pub priority: Option<i64>,

    /// Replace tags (repeatable)
    #[arg(short, long = "tag", value_name = "TAG", conflicts_with = "clear_tags")]
    pub tags: Vec<String>,

    /// Remove all tags
    #[arg(long)]
    pub clear_tags: bool,
}

#[derive(Args)]
pub struct BackupArgs {
    #[command(subcommand)]
    pub command: BackupSubcommand,
}

#[derive(Subcommand)]
pub enum BackupSubcommand {
    /// Write a backup file (no secret needed)
    Export {
        #[arg(value_name = "DEST")]
        destination: PathBuf,
    },

    /// Replace current data with a backup
    Import {
        #[arg(value_name = "SRC")]
        source: PathBuf,

        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

/// Arguments for the `reset` command
#[derive(Args)]
pub struct ResetArgs {
    /// Skip the confirmation prompt
    #[arg(long)]
    pub yes: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_task_add() {
        let cli = Cli::try_parse_from([
            "taskvault", "tasks", "add", "buy milk", "--due", "2030-01-01", "-t", "home",
        ])
        .unwrap();
        match cli.command {
            Commands::Tasks(TasksArgs {
                command: TasksSubcommand::Add(args),
            }) => {
                assert_eq!(args.title, "buy milk");
                assert_eq!(args.due.as_deref(), Some("2030-01-01"));
                assert_eq!(args.tags, vec!["home".to_string()]);
            }
            _ => panic!("expected tasks add"),
        }
    }

    #[test]
    fn test_clear_due_conflicts_with_due() {
        let result = Cli::try_parse_from([
            "taskvault", "tasks", "update", "abc", "--due", "2030-01-01", "--clear-due",
        ]);
        assert!(result.is_err());
    }
}
