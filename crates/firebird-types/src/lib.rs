//! Firebird-specific conversions for meta-core snapshots.
//!
//! - [`typemap`] - Catalog field descriptors to canonical type names
//! - [`procedure`] - Rebuilding compilable procedure text from catalog source
//! - [`identifier`] - Identifier validation and quoting
//! - [`ddl`] - Snapshot to idempotent DDL statements

pub mod ddl;
pub mod identifier;
pub mod procedure;
pub mod typemap;

pub use ddl::{
    generate_domain_statements, generate_procedure_statements, generate_table_statements,
    DdlPlan, SkippedObject, SYSTEM_PREFIX,
};
pub use identifier::{
    quote_identifier, quote_identifier_lossy, validate_identifier, IdentifierError,
};
pub use procedure::{reconstruct, ProcedureParameter, ProcedureSignature};
pub use typemap::{map_type, parse_canonical_type, FieldDescriptor};
