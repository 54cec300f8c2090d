//! Core types for dbmeta-sync.
//!
//! This crate holds the in-memory description of a database schema and
//! its durable JSON form:
//!
//! - [`SchemaSnapshot`] - Domains, tables and procedures captured in one run
//! - [`SnapshotStore`] - Directory-backed store for the snapshot file
//!
//! # Architecture
//!
//! ```text
//! meta-core (this crate)
//!    │
//!    ├─── firebird-types     (type mapping, procedure reconstruction, DDL)
//!    └─── dbmeta-firebird    (catalog introspection, statement execution)
//! ```
//!
//! # Example
//!
//! ```rust
//! use meta_core::{DomainDefinition, SchemaSnapshot};
//!
//! let mut snapshot = SchemaSnapshot::default();
//! snapshot
//!     .domains
//!     .push(DomainDefinition::new("AGE_DOMAIN", "SMALLINT").not_null());
//!
//! let json = meta_core::to_json(&snapshot).unwrap();
//! assert_eq!(meta_core::from_json(&json).unwrap(), snapshot);
//! ```

pub mod model;
pub mod snapshot;

pub use model::{
    ColumnDefinition, DomainDefinition, ProcedureDefinition, SchemaSnapshot, TableDefinition,
};
pub use snapshot::{from_json, to_json, SnapshotError, SnapshotStore, SNAPSHOT_FILE_NAME};
