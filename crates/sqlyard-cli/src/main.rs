//! sqlyard command line shell
//!
//! Opens a SQLite database as the workspace backend and runs one command
//! against it.

mod cli;
mod commands;
mod logging;
mod output;

use anyhow::Result;
use clap::Parser;
use sqlyard_core::ConnectionId;
use sqlyard_driver_sqlite::SqliteBackend;
use sqlyard_services::WorkspaceState;
use sqlyard_settings::WorkspaceSettings;
use std::process::ExitCode;
use std::sync::Arc;

use crate::cli::{Cli, Command};
use crate::logging::LoggingConfig;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    // Held until main returns so buffered file logs are flushed
    let _log_guard = logging::init(&LoggingConfig::default().with_json_logs(cli.log_file))?;

    if run(&cli).await? {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

/// Run the selected command. `Ok(false)` means the command ran but some
/// of its work failed.
async fn run(cli: &Cli) -> Result<bool> {
    let settings = match &cli.settings {
        Some(path) => WorkspaceSettings::load_from(path)?,
        None => WorkspaceSettings::load()?,
    };

    let backend = Arc::new(SqliteBackend::new());
    let connection_id = ConnectionId::new("main");
    match &cli.db {
        Some(path) => backend.open(connection_id.clone(), path)?,
        None => backend.open_in_memory(connection_id.clone())?,
    }

    let state = WorkspaceState::new(settings, backend.clone());
    let outcome = match &cli.command {
        Command::Tables => commands::tables(&state, &connection_id).await,
        Command::Complete { text, lsp } => {
            commands::complete(&state, &connection_id, text, *lsp).await
        }
        Command::Apply { changes } => commands::apply(&state, &connection_id, changes).await,
    };

    state.disconnect(&connection_id);
    backend.close(&connection_id);
    outcome
}
