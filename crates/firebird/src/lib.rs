//! Firebird database access for dbmeta-sync.
//!
//! - [`catalog`] - Catalog rows and the [`CatalogSource`] capability
//! - [`introspect`] - Exporting a [`meta_core::SchemaSnapshot`] from a catalog
//! - [`executor`] - Applying statements with per-statement error isolation
//! - [`client`] - [`FirebirdClient`], the rsfbclient-backed implementation
//! - [`config`] - Connection settings and connection-string parsing
//! - [`testing`] - An in-memory catalog for tests

pub mod catalog;
pub mod client;
pub mod config;
pub mod error;
pub mod executor;
pub mod introspect;
pub mod testing;

pub use catalog::{CatalogSource, FieldRow, ParameterDirection, ParameterRow, ProcedureRow};
pub use client::FirebirdClient;
pub use config::ConnectionConfig;
pub use error::{Error, Result};
pub use executor::{
    apply, apply_plan, ApplyReport, DryRunExecutor, StatementExecutor, StatementFailure,
};
pub use introspect::export;
