//! Schema snapshot model.
//!
//! A [`SchemaSnapshot`] is built once per export run (or once per load from
//! disk) and is read-only afterwards. Collection order follows the catalog's
//! iteration order, which keeps the persisted file stable across runs.
//!
//! Field names on the wire are fixed by the snapshot file format:
//!
//! ```json
//! {
//!   "Domains": [
//!     { "name": "AGE_DOMAIN", "type": "SMALLINT", "notNull": true, "defaultValue": null }
//!   ],
//!   "Tables": [{ "name": "CUSTOMERS", "columns": [ ... ] }],
//!   "Procedures": [{ "name": "GET_CUSTOMER", "source": "RETURNS (...)\nAS\n..." }]
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::snapshot::SnapshotError;

// ============================================================================
// Snapshot
// ============================================================================

/// Complete description of a schema at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaSnapshot {
    /// User-defined domains, alphabetical by name
    #[serde(rename = "Domains", default)]
    pub domains: Vec<DomainDefinition>,

    /// User tables (views excluded), alphabetical by name
    #[serde(rename = "Tables", default)]
    pub tables: Vec<TableDefinition>,

    /// Stored procedures, alphabetical by name
    #[serde(rename = "Procedures", default)]
    pub procedures: Vec<ProcedureDefinition>,
}

impl SchemaSnapshot {
    /// Create a snapshot from its three collections.
    pub fn new(
        domains: Vec<DomainDefinition>,
        tables: Vec<TableDefinition>,
        procedures: Vec<ProcedureDefinition>,
    ) -> Self {
        Self {
            domains,
            tables,
            procedures,
        }
    }

    /// True when the snapshot describes no objects at all.
    pub fn is_empty(&self) -> bool {
        self.domains.is_empty() && self.tables.is_empty() && self.procedures.is_empty()
    }

    /// Get a domain by name.
    pub fn get_domain(&self, name: &str) -> Option<&DomainDefinition> {
        self.domains.iter().find(|d| d.name == name)
    }

    /// Get a table by name.
    pub fn get_table(&self, name: &str) -> Option<&TableDefinition> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Get a procedure by name.
    pub fn get_procedure(&self, name: &str) -> Option<&ProcedureDefinition> {
        self.procedures.iter().find(|p| p.name == name)
    }

    /// Check the naming invariants of the snapshot.
    ///
    /// Domain, table and procedure names must be unique within their
    /// collection, and column names must be unique within their table.
    pub fn validate(&self) -> Result<(), SnapshotError> {
        ensure_unique("domain", self.domains.iter().map(|d| d.name.as_str()))?;
        ensure_unique("table", self.tables.iter().map(|t| t.name.as_str()))?;
        ensure_unique(
            "procedure",
            self.procedures.iter().map(|p| p.name.as_str()),
        )?;

        for table in &self.tables {
            let kind = format!("column in table '{}'", table.name);
            ensure_unique(&kind, table.columns.iter().map(|c| c.name.as_str()))?;
        }

        Ok(())
    }
}

fn ensure_unique<'a>(
    kind: &str,
    names: impl Iterator<Item = &'a str>,
) -> Result<(), SnapshotError> {
    let mut seen = HashSet::new();
    for name in names {
        if name.is_empty() {
            return Err(SnapshotError::Invalid(format!("empty {kind} name")));
        }
        if !seen.insert(name) {
            return Err(SnapshotError::Invalid(format!("duplicate {kind} '{name}'")));
        }
    }
    Ok(())
}

// ============================================================================
// Domains and columns
// ============================================================================

/// A named, reusable column type stored in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainDefinition {
    /// Domain name
    pub name: String,

    /// Canonical type, e.g. `VARCHAR(50)` or `DECIMAL`
    #[serde(rename = "type")]
    pub data_type: String,

    /// Whether the catalog carries a not-null flag for this domain
    #[serde(rename = "notNull", default)]
    pub not_null: bool,

    /// Raw default-value source text; `None` means no default
    #[serde(rename = "defaultValue", default)]
    pub default_value: Option<String>,
}

impl DomainDefinition {
    /// Create a nullable domain without a default.
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            not_null: false,
            default_value: None,
        }
    }

    /// Mark the domain as NOT NULL.
    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    /// Attach raw default-value source text.
    pub fn with_default(mut self, default_value: impl Into<String>) -> Self {
        self.default_value = Some(default_value.into());
        self
    }
}

/// A column of a table. Same shape as a domain, scoped to its table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDefinition {
    /// Column name, unique within the owning table
    pub name: String,

    /// Canonical type
    #[serde(rename = "type")]
    pub data_type: String,

    /// Whether the catalog carries a not-null flag for this column
    #[serde(rename = "notNull", default)]
    pub not_null: bool,

    /// Raw default-value source text; `None` means no default
    #[serde(rename = "defaultValue", default)]
    pub default_value: Option<String>,
}

impl ColumnDefinition {
    /// Create a nullable column without a default.
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            not_null: false,
            default_value: None,
        }
    }

    /// Mark the column as NOT NULL.
    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    /// Attach raw default-value source text.
    pub fn with_default(mut self, default_value: impl Into<String>) -> Self {
        self.default_value = Some(default_value.into());
        self
    }
}

// ============================================================================
// Tables and procedures
// ============================================================================

/// A user table and its columns in field-position order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDefinition {
    /// Table name
    pub name: String,

    /// Columns in declared field-position order
    #[serde(default)]
    pub columns: Vec<ColumnDefinition>,
}

impl TableDefinition {
    /// Create a table definition.
    pub fn new(name: impl Into<String>, columns: Vec<ColumnDefinition>) -> Self {
        Self {
            name: name.into(),
            columns,
        }
    }

    /// Get a column by name.
    pub fn get_column(&self, name: &str) -> Option<&ColumnDefinition> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// A stored procedure.
///
/// `source` is the reconstructed body: it already contains the parameter
/// header, the `AS` keyword and any synthesized variable declarations. It is
/// persisted verbatim and wrapped with `CREATE OR ALTER PROCEDURE <name>`
/// when applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcedureDefinition {
    /// Procedure name
    pub name: String,

    /// Self-contained procedure text following the name
    #[serde(default)]
    pub source: String,
}

impl ProcedureDefinition {
    /// Create a procedure definition.
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
        }
    }
}
