//! Command-line interface for dbmeta-sync
//!
//! # Usage Examples
//!
//! ```bash
//! # Export the schema of a live database
//! dbmeta-sync export-scripts \
//!   --connection-string "DataSource=localhost;Port=3050;Database=/data/app.fdb;Password=pw" \
//!   --output-dir ./scripts
//!
//! # Create /data/fresh/database.fdb and load the schema into it
//! dbmeta-sync build-db --db-dir /data/fresh --scripts-dir ./scripts
//!
//! # Print the statements an update would run
//! dbmeta-sync update-db \
//!   --connection-string "Database=/data/app.fdb" \
//!   --scripts-dir ./scripts \
//!   --dry-run
//! ```
//!
//! Logging goes to stderr and is controlled with `RUST_LOG` (default `info`).

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use dbmeta_firebird::{ApplyReport, ConnectionConfig};
use dbmeta_sync::{build_database, export_scripts, update_database, FirebirdOpts};

#[derive(Parser)]
#[command(name = "dbmeta-sync")]
#[command(about = "Export Firebird schema metadata to JSON and recreate it in other databases")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a database (if missing) and apply the snapshot to it
    BuildDb {
        /// Directory holding database.fdb
        #[arg(long)]
        db_dir: PathBuf,

        /// Directory holding databaseMeta.json
        #[arg(long)]
        scripts_dir: PathBuf,

        #[command(flatten)]
        firebird: FirebirdOpts,

        /// Print the statements instead of running them
        #[arg(long)]
        dry_run: bool,
    },

    /// Export domains, tables and procedures to databaseMeta.json
    ExportScripts {
        /// ADO-style connection string (Key=Value;...)
        #[arg(long)]
        connection_string: ConnectionConfig,

        /// Directory to write databaseMeta.json to
        #[arg(long)]
        output_dir: PathBuf,
    },

    /// Apply the snapshot to an existing database
    UpdateDb {
        /// ADO-style connection string (Key=Value;...)
        #[arg(long)]
        connection_string: ConnectionConfig,

        /// Directory holding databaseMeta.json
        #[arg(long)]
        scripts_dir: PathBuf,

        /// Print the statements instead of running them
        #[arg(long)]
        dry_run: bool,
    },
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::BuildDb {
            db_dir,
            scripts_dir,
            firebird,
            dry_run,
        } => {
            let report = build_database(&db_dir, &scripts_dir, &firebird, dry_run)?;
            summarize(report.as_ref(), "The database has been built");
        }
        Commands::ExportScripts {
            connection_string,
            output_dir,
        } => {
            let path = export_scripts(&connection_string, &output_dir)?;
            println!("Metadata exported to {}", path.display());
        }
        Commands::UpdateDb {
            connection_string,
            scripts_dir,
            dry_run,
        } => {
            let report = update_database(&connection_string, &scripts_dir, dry_run)?;
            summarize(report.as_ref(), "The database has been updated");
        }
    }

    Ok(())
}

fn summarize(report: Option<&ApplyReport>, done: &str) {
    let Some(report) = report else {
        return;
    };
    eprintln!(
        "{done}: {} statements applied, {} failed, {} objects skipped",
        report.applied,
        report.failures.len(),
        report.skipped.len()
    );
    for object in &report.skipped {
        eprintln!("  skipped {object}");
    }
}
