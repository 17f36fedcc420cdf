//! TaskVault CLI - an encrypted, local-first task manager.
//!
//! Thin front end over `taskvault-core`: resolves config and the data
//! directory, unlocks the session when needed, and renders results.

mod app;
mod cli;
mod commands;
mod config;
mod constants;
mod errors;
mod helpers;
mod output;
mod ui;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::app::AppContext;
use crate::cli::Cli;
use crate::errors::{exit_code_for, hint_for};

/// Filter used when `RUST_LOG` is unset. Covers both `taskvault` and `taskvault_core` targets.
const DEFAULT_LOG_FILTER: &str = "taskvault=warn";

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing();

    let ctx = AppContext::new(&cli);
    if let Err(err) = commands::dispatch(&ctx) {
        eprintln!("Error: {}", err);
        if let Some(hint) = hint_for(&err) {
            eprintln!("Hint: {}", hint);
        }
        std::process::exit(exit_code_for(&err));
    }
}
