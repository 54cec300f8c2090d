//! Reading a [`SchemaSnapshot`] out of a catalog.

use firebird_types::{reconstruct, ProcedureParameter, ProcedureSignature};
use meta_core::{
    ColumnDefinition, DomainDefinition, ProcedureDefinition, SchemaSnapshot, TableDefinition,
};
use tracing::{debug, info};

use crate::catalog::{CatalogSource, FieldRow, ParameterDirection};
use crate::error::Result;

/// Export domains, tables and procedures from `source`.
///
/// Generated `RDB$` domains are kept in the snapshot; the DDL generator is
/// the one that leaves them out. Any catalog error aborts the export.
pub fn export<S>(source: &mut S) -> Result<SchemaSnapshot>
where
    S: CatalogSource + ?Sized,
{
    let domains = export_domains(source)?;
    let tables = export_tables(source)?;
    let procedures = export_procedures(source)?;

    info!(
        "Exported {} domains, {} tables and {} procedures",
        domains.len(),
        tables.len(),
        procedures.len()
    );
    Ok(SchemaSnapshot::new(domains, tables, procedures))
}

pub fn export_domains<S>(source: &mut S) -> Result<Vec<DomainDefinition>>
where
    S: CatalogSource + ?Sized,
{
    let domains = source
        .fields()?
        .into_iter()
        .map(|row| {
            let data_type = row.data_type();
            let not_null = row.is_not_null();
            debug!("Domain {} {}", row.name, data_type);
            DomainDefinition {
                name: row.name,
                data_type,
                not_null,
                default_value: row.default_source,
            }
        })
        .collect();
    Ok(domains)
}

pub fn export_tables<S>(source: &mut S) -> Result<Vec<TableDefinition>>
where
    S: CatalogSource + ?Sized,
{
    let mut tables = Vec::new();
    for relation in source.relations()? {
        let columns: Vec<ColumnDefinition> = source
            .relation_fields(&relation)?
            .into_iter()
            .map(column_from_row)
            .collect();
        debug!("Table {} with {} columns", relation, columns.len());
        tables.push(TableDefinition::new(relation, columns));
    }
    Ok(tables)
}

fn column_from_row(row: FieldRow) -> ColumnDefinition {
    ColumnDefinition {
        data_type: row.data_type(),
        not_null: row.is_not_null(),
        name: row.name,
        default_value: row.default_source,
    }
}

pub fn export_procedures<S>(source: &mut S) -> Result<Vec<ProcedureDefinition>>
where
    S: CatalogSource + ?Sized,
{
    let mut procedures = Vec::new();
    for row in source.procedures()? {
        let inputs = parameters(source, &row.name, ParameterDirection::Input)?;
        let outputs = parameters(source, &row.name, ParameterDirection::Output)?;
        let signature = ProcedureSignature::new(inputs, outputs);

        let text = reconstruct(&row.name, row.source.as_deref().unwrap_or(""), &signature);
        procedures.push(ProcedureDefinition::new(row.name, text));
    }
    Ok(procedures)
}

fn parameters<S>(
    source: &mut S,
    procedure: &str,
    direction: ParameterDirection,
) -> Result<Vec<ProcedureParameter>>
where
    S: CatalogSource + ?Sized,
{
    Ok(source
        .procedure_parameters(procedure, direction)?
        .into_iter()
        .map(|p| {
            let data_type = p.data_type();
            ProcedureParameter::new(p.name, data_type)
        })
        .collect())
}
