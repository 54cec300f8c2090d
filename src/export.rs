//! `export-scripts`: catalog to snapshot file.

use std::path::{Path, PathBuf};

use anyhow::Context;
use dbmeta_firebird::{CatalogSource, ConnectionConfig, FirebirdClient};
use meta_core::SnapshotStore;

/// Export the schema of the database described by `config` into
/// `<output_dir>/databaseMeta.json`.
pub fn export_scripts(config: &ConnectionConfig, output_dir: &Path) -> anyhow::Result<PathBuf> {
    let mut client = FirebirdClient::connect(config)
        .with_context(|| format!("Failed to connect to {config}"))?;
    export_to_store(&mut client, &SnapshotStore::new(output_dir))
}

/// Read a snapshot from `source` and save it to `store`.
pub fn export_to_store<S>(source: &mut S, store: &SnapshotStore) -> anyhow::Result<PathBuf>
where
    S: CatalogSource + ?Sized,
{
    let snapshot = dbmeta_firebird::export(source).context("Failed to read schema metadata")?;
    store
        .save(&snapshot)
        .with_context(|| format!("Failed to write snapshot to {}", store.dir().display()))
}
