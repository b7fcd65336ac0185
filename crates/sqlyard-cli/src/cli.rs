//! Command line arguments

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "sqlyard")]
#[command(about = "Schema-aware completion and staged row edits for SQLite", long_about = None)]
#[command(version)]
pub struct Cli {
    /// SQLite database file. An empty in-memory database is used when omitted.
    #[arg(long, env = "SQLYARD_DB", global = true)]
    pub db: Option<PathBuf>,

    /// Settings file to use instead of the one in the config directory
    #[arg(long, global = true)]
    pub settings: Option<PathBuf>,

    /// Also write JSON logs to the sqlyard logs directory
    #[arg(long, global = true, default_value_t = false)]
    pub log_file: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List the tables and views of the database
    Tables,
    /// Print completion candidates for the text before the cursor
    Complete {
        /// SQL text up to the cursor
        text: String,
        /// Print LSP completion items as JSON instead of a table
        #[arg(long, default_value_t = false)]
        lsp: bool,
    },
    /// Stage the changes of a JSON file and commit them
    Apply {
        /// JSON array of changes
        changes: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn arguments_are_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_follow_the_subcommand() {
        let cli = Cli::try_parse_from([
            "sqlyard",
            "complete",
            "SELECT * FROM ",
            "--db",
            "app.db",
            "--lsp",
        ])
        .unwrap();

        assert_eq!(cli.db, Some(PathBuf::from("app.db")));
        assert!(matches!(
            cli.command,
            Command::Complete { ref text, lsp: true } if text == "SELECT * FROM "
        ));
    }

    #[test]
    fn apply_requires_a_file() {
        assert!(Cli::try_parse_from(["sqlyard", "apply"]).is_err());
    }
}
