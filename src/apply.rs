//! `build-db` and `update-db`: snapshot file to database.

use std::io;
use std::path::{Path, PathBuf};

use anyhow::Context;
use dbmeta_firebird::{
    apply_plan, ApplyReport, ConnectionConfig, DryRunExecutor, FirebirdClient, StatementExecutor,
};
use firebird_types::DdlPlan;
use meta_core::{SchemaSnapshot, SnapshotStore};
use tracing::{info, warn};

use crate::FirebirdOpts;

/// Database file created by `build-db` inside its directory.
pub const DATABASE_FILE_NAME: &str = "database.fdb";

/// Load the snapshot in `scripts_dir`.
///
/// A missing snapshot is not an error: it is reported and `None` is returned.
pub fn load_snapshot(scripts_dir: &Path) -> anyhow::Result<Option<SchemaSnapshot>> {
    let store = SnapshotStore::new(scripts_dir);
    match store.load() {
        Ok(snapshot) => Ok(Some(snapshot)),
        Err(e) if e.is_not_found() => {
            warn!("{e}");
            println!("Metadata not found");
            Ok(None)
        }
        Err(e) => Err(e)
            .with_context(|| format!("Failed to load snapshot from {}", scripts_dir.display())),
    }
}

/// Generate DDL for `snapshot` and run it through `executor`.
///
/// Objects the generator had to leave out are listed in the report's
/// `skipped` and make it unclean.
pub fn apply_snapshot<E>(executor: &mut E, snapshot: &SchemaSnapshot) -> ApplyReport
where
    E: StatementExecutor + ?Sized,
{
    apply_plan(executor, &DdlPlan::from_snapshot(snapshot))
}

/// Apply the snapshot in `scripts_dir` to an existing database.
///
/// Returns `None` when there is no snapshot to apply.
pub fn update_database(
    config: &ConnectionConfig,
    scripts_dir: &Path,
    dry_run: bool,
) -> anyhow::Result<Option<ApplyReport>> {
    let Some(snapshot) = load_snapshot(scripts_dir)? else {
        return Ok(None);
    };

    if dry_run {
        return Ok(Some(dry_run_snapshot(&snapshot)));
    }

    let mut client = FirebirdClient::connect(config)
        .with_context(|| format!("Failed to connect to {config}"))?;
    Ok(Some(apply_snapshot(&mut client, &snapshot)))
}

/// Create `db_dir` if needed and return the absolute path of the database
/// file inside it.
pub fn database_path(db_dir: &Path) -> anyhow::Result<PathBuf> {
    std::fs::create_dir_all(db_dir)
        .with_context(|| format!("Failed to create directory {}", db_dir.display()))?;
    let db_dir = std::fs::canonicalize(db_dir)
        .with_context(|| format!("Failed to resolve directory {}", db_dir.display()))?;
    Ok(db_dir.join(DATABASE_FILE_NAME))
}

/// Create `<db_dir>/database.fdb` if it does not exist, then apply the
/// snapshot in `scripts_dir` to it.
///
/// The server is assumed to run on this machine: whether the file exists is
/// checked on the local filesystem, and the server is handed the absolute
/// local path. With a remote `FIREBIRD_HOST` the path must mean the same
/// thing on both machines.
///
/// With `dry_run` nothing is created and the statements are printed instead.
pub fn build_database(
    db_dir: &Path,
    scripts_dir: &Path,
    opts: &FirebirdOpts,
    dry_run: bool,
) -> anyhow::Result<Option<ApplyReport>> {
    if dry_run {
        info!(
            "Dry run: {} is not created or modified",
            db_dir.join(DATABASE_FILE_NAME).display()
        );
        return Ok(load_snapshot(scripts_dir)?.map(|snapshot| dry_run_snapshot(&snapshot)));
    }

    let database_path = database_path(db_dir)?;
    let config = opts.config_for(database_path.to_string_lossy());

    let opened = if database_path.exists() {
        info!("Database {} already exists", database_path.display());
        FirebirdClient::connect(&config)
    } else {
        FirebirdClient::create_database(&config)
    };
    let mut client = opened.with_context(|| format!("Failed to open {config}"))?;

    let Some(snapshot) = load_snapshot(scripts_dir)? else {
        return Ok(None);
    };
    Ok(Some(apply_snapshot(&mut client, &snapshot)))
}

fn dry_run_snapshot(snapshot: &SchemaSnapshot) -> ApplyReport {
    let mut executor = DryRunExecutor::new(io::stdout().lock());
    apply_snapshot(&mut executor, snapshot)
}
