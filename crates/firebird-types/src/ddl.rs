//! Firebird DDL generation from meta-core snapshots.
//!
//! Domains and tables are wrapped in an `EXECUTE BLOCK` that checks the
//! catalog first, so each statement creates its object only when it is
//! absent and never alters an existing one. Procedures are emitted as
//! `CREATE OR ALTER PROCEDURE` and always replace the stored body.
//!
//! Objects that cannot be rendered safely are left out of the plan and
//! recorded as [`SkippedObject`]s so callers can report them; everything else
//! is emitted in snapshot order.

use meta_core::{
    ColumnDefinition, DomainDefinition, ProcedureDefinition, SchemaSnapshot, TableDefinition,
};
use thiserror::Error;

use crate::identifier::{quote_identifier, quote_literal, IdentifierError};
use crate::procedure::strip_terminators;

/// Name prefix of catalog-generated objects, which are never recreated.
pub const SYSTEM_PREFIX: &str = "RDB$";

/// Why a single object could not be turned into DDL.
#[derive(Debug, Error)]
pub enum DdlError {
    #[error("invalid identifier: {0}")]
    Identifier(#[from] IdentifierError),

    #[error("table '{0}' has no columns")]
    NoColumns(String),
}

/// A snapshot object that produced no statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedObject {
    /// `domain`, `table` or `procedure`.
    pub kind: &'static str,
    pub name: String,
    pub reason: String,
}

impl std::fmt::Display for SkippedObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {:?}: {}", self.kind, self.name, self.reason)
    }
}

/// Ordered DDL for a whole snapshot: domains, then tables, then procedures.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DdlPlan {
    pub domains: Vec<String>,
    pub tables: Vec<String>,
    pub procedures: Vec<String>,
    /// Objects left out of the plan, in snapshot order.
    pub skipped: Vec<SkippedObject>,
}

impl DdlPlan {
    /// Generate every statement for a snapshot.
    pub fn from_snapshot(snapshot: &SchemaSnapshot) -> Self {
        let mut skipped = Vec::new();
        let plan = Self {
            domains: domain_statements(&snapshot.domains, &mut skipped),
            tables: table_statements(&snapshot.tables, &mut skipped),
            procedures: procedure_statements(&snapshot.procedures, &mut skipped),
            skipped,
        };
        tracing::info!(
            "Generated {} domain, {} table and {} procedure statements ({} objects skipped)",
            plan.domains.len(),
            plan.tables.len(),
            plan.procedures.len(),
            plan.skipped.len()
        );
        plan
    }

    /// All statements in execution order.
    pub fn statements(&self) -> impl Iterator<Item = &str> {
        self.domains
            .iter()
            .chain(self.tables.iter())
            .chain(self.procedures.iter())
            .map(String::as_str)
    }

    /// Total number of statements.
    pub fn len(&self) -> usize {
        self.domains.len() + self.tables.len() + self.procedures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Render each item, moving failures into `skipped`.
fn render_all<'a, T: 'a>(
    kind: &'static str,
    items: impl IntoIterator<Item = &'a T>,
    name_of: impl Fn(&T) -> &str,
    render: impl Fn(&T) -> Result<String, DdlError>,
    skipped: &mut Vec<SkippedObject>,
) -> Vec<String> {
    let mut statements = Vec::new();
    for item in items {
        match render(item) {
            Ok(sql) => statements.push(sql),
            Err(e) => {
                let object = SkippedObject {
                    kind,
                    name: name_of(item).to_string(),
                    reason: e.to_string(),
                };
                tracing::error!("Skipping {}", object);
                skipped.push(object);
            }
        }
    }
    statements
}

// ============================================================================
// Domains
// ============================================================================

/// One guarded `CREATE DOMAIN` block per user domain.
///
/// Domains named with the [`SYSTEM_PREFIX`] are left out.
pub fn generate_domain_statements(domains: &[DomainDefinition]) -> Vec<String> {
    domain_statements(domains, &mut Vec::new())
}

fn domain_statements(
    domains: &[DomainDefinition],
    skipped: &mut Vec<SkippedObject>,
) -> Vec<String> {
    render_all(
        "domain",
        domains.iter().filter(|d| !d.name.starts_with(SYSTEM_PREFIX)),
        |d| d.name.as_str(),
        |d| {
            let inner = create_domain_sql(d)?;
            Ok(guarded("RDB$FIELDS", "RDB$FIELD_NAME", &d.name, &inner))
        },
        skipped,
    )
}

/// `CREATE DOMAIN <name> AS <type>[ NOT NULL]`
pub fn create_domain_sql(domain: &DomainDefinition) -> Result<String, DdlError> {
    let mut sql = format!(
        "CREATE DOMAIN {} AS {}",
        quote_identifier(&domain.name)?,
        domain.data_type
    );
    if domain.not_null {
        sql.push_str(" NOT NULL");
    }
    Ok(sql)
}

// ============================================================================
// Tables
// ============================================================================

/// One guarded `CREATE TABLE` block per table.
pub fn generate_table_statements(tables: &[TableDefinition]) -> Vec<String> {
    table_statements(tables, &mut Vec::new())
}

fn table_statements(tables: &[TableDefinition], skipped: &mut Vec<SkippedObject>) -> Vec<String> {
    render_all(
        "table",
        tables,
        |t| t.name.as_str(),
        |t| {
            let inner = create_table_sql(t)?;
            Ok(guarded("RDB$RELATIONS", "RDB$RELATION_NAME", &t.name, &inner))
        },
        skipped,
    )
}

/// `CREATE TABLE <name> (<columns>)` with columns in snapshot order.
pub fn create_table_sql(table: &TableDefinition) -> Result<String, DdlError> {
    let name = quote_identifier(&table.name)?;
    if table.columns.is_empty() {
        return Err(DdlError::NoColumns(table.name.clone()));
    }

    let columns = table
        .columns
        .iter()
        .map(column_sql)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(format!("CREATE TABLE {} (\n{})", name, columns.join(",\n")))
}

/// `<name> <type>[ DEFAULT <value>][ NOT NULL]`
fn column_sql(column: &ColumnDefinition) -> Result<String, DdlError> {
    let mut def = format!(
        "    {} {}",
        quote_identifier(&column.name)?,
        column.data_type
    );
    if let Some(clause) = column.default_value.as_deref().and_then(default_clause) {
        def.push(' ');
        def.push_str(&clause);
    }
    if column.not_null {
        def.push_str(" NOT NULL");
    }
    Ok(def)
}

/// Render a stored default as a `DEFAULT` clause.
///
/// The catalog keeps the keyword as part of the default source, so text that
/// already starts with `DEFAULT` is used as-is. Blank text yields no clause.
fn default_clause(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let has_keyword = raw.len() > 7
        && raw.is_char_boundary(7)
        && raw[..7].eq_ignore_ascii_case("DEFAULT")
        && raw[7..].starts_with(char::is_whitespace);
    if has_keyword {
        Some(raw.to_string())
    } else {
        Some(format!("DEFAULT {raw}"))
    }
}

// ============================================================================
// Procedures
// ============================================================================

/// One `CREATE OR ALTER PROCEDURE` statement per procedure.
pub fn generate_procedure_statements(procedures: &[ProcedureDefinition]) -> Vec<String> {
    procedure_statements(procedures, &mut Vec::new())
}

fn procedure_statements(
    procedures: &[ProcedureDefinition],
    skipped: &mut Vec<SkippedObject>,
) -> Vec<String> {
    render_all("procedure", procedures, |p| p.name.as_str(), create_procedure_sql, skipped)
}

/// `CREATE OR ALTER PROCEDURE <name>\n<source>` with a terminated source.
pub fn create_procedure_sql(procedure: &ProcedureDefinition) -> Result<String, DdlError> {
    let name = quote_identifier(&procedure.name)?;

    let mut source = strip_terminators(&procedure.source);
    if !source.ends_with(';') {
        source.push(';');
    }

    Ok(format!("CREATE OR ALTER PROCEDURE {name}\n{source}"))
}

// ============================================================================
// Helpers
// ============================================================================

/// Wrap `inner` so it only runs when `name` is absent from
/// `catalog_table.name_column`.
fn guarded(catalog_table: &str, name_column: &str, name: &str, inner: &str) -> String {
    format!(
        "EXECUTE BLOCK AS\n\
         BEGIN\n  \
           IF (NOT EXISTS(SELECT 1 FROM {catalog_table} WHERE {name_column} = {})) THEN\n  \
           BEGIN\n    \
             EXECUTE STATEMENT {};\n  \
           END\n\
         END",
        quote_literal(name),
        quote_literal(inner)
    )
}
