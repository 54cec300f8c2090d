//! Applying generated DDL to the in-memory catalog.

use dbmeta_firebird::testing::InMemoryCatalog;
use dbmeta_firebird::{apply, export, Error, FieldRow, ParameterRow, StatementExecutor};
use firebird_types::typemap::codes;
use firebird_types::{DdlPlan, FieldDescriptor};
use meta_core::{
    ColumnDefinition, DomainDefinition, ProcedureDefinition, SchemaSnapshot, TableDefinition,
};

fn sample_snapshot() -> SchemaSnapshot {
    SchemaSnapshot::new(
        vec![
            DomainDefinition::new("AGE_DOMAIN", "SMALLINT").not_null(),
            DomainDefinition::new("RDB$12", "VARCHAR(50)"),
        ],
        vec![
            TableDefinition::new(
                "CUSTOMERS",
                vec![
                    ColumnDefinition::new("ID", "INTEGER").not_null(),
                    ColumnDefinition::new("NAME", "VARCHAR(50)").with_default("'NEW'"),
                    ColumnDefinition::new("AGE", "AGE_DOMAIN"),
                ],
            ),
            TableDefinition::new("order items", vec![ColumnDefinition::new("Line No", "INTEGER")]),
        ],
        vec![ProcedureDefinition::new(
            "LIST_CUSTOMERS",
            "RETURNS (NAME VARCHAR(50))\nAS\nBEGIN\n  \
             FOR SELECT NAME FROM CUSTOMERS INTO :NAME DO SUSPEND;\nEND",
        )],
    )
}

fn count(names: &[&str], name: &str) -> usize {
    names.iter().filter(|n| **n == name).count()
}

#[test]
fn test_apply_twice_creates_each_object_once() {
    let plan = DdlPlan::from_snapshot(&sample_snapshot());
    let mut catalog = InMemoryCatalog::new();

    let first = apply(&mut catalog, plan.statements());
    assert!(first.is_clean(), "{:?}", first.failures);
    assert_eq!(first.applied, plan.len());

    let second = apply(&mut catalog, plan.statements());
    assert!(second.is_clean(), "{:?}", second.failures);

    assert_eq!(count(&catalog.domain_names(), "AGE_DOMAIN"), 1);
    assert_eq!(count(&catalog.domain_names(), "RDB$12"), 0);
    assert_eq!(count(&catalog.table_names(), "CUSTOMERS"), 1);
    assert_eq!(count(&catalog.table_names(), "order items"), 1);
    assert_eq!(count(&catalog.procedure_names(), "LIST_CUSTOMERS"), 1);
    assert_eq!(catalog.executed().len(), plan.len() * 2);
}

#[test]
fn test_applied_objects_match_snapshot() {
    let plan = DdlPlan::from_snapshot(&sample_snapshot());
    let mut catalog = InMemoryCatalog::new();
    assert!(apply(&mut catalog, plan.statements()).is_clean());

    let age = catalog.domain("AGE_DOMAIN").unwrap();
    assert_eq!(age.data_type(), "SMALLINT");
    assert!(age.is_not_null());

    let columns = catalog.table_columns("CUSTOMERS").unwrap();
    assert_eq!(columns.len(), 3);
    assert_eq!(columns[1].name, "NAME");
    assert_eq!(columns[1].data_type(), "VARCHAR(50)");
    assert_eq!(columns[1].default_source.as_deref(), Some("DEFAULT 'NEW'"));
    assert_eq!(columns[2].data_type(), "SMALLINT");

    let quoted = catalog.table_columns("order items").unwrap();
    assert_eq!(quoted[0].name, "Line No");
}

#[test]
fn test_guard_does_not_alter_existing_table() {
    let mut catalog = InMemoryCatalog::new().with_table(
        "CUSTOMERS",
        vec![FieldRow::new("ID", FieldDescriptor::of_type(codes::BIGINT))],
    );
    let plan = DdlPlan::from_snapshot(&sample_snapshot());
    assert!(apply(&mut catalog, plan.statements()).is_clean());

    let columns = catalog.table_columns("CUSTOMERS").unwrap();
    assert_eq!(columns.len(), 1);
    assert_eq!(columns[0].data_type(), "BIGINT");
}

#[test]
fn test_unguarded_duplicate_create_fails() {
    let mut catalog = InMemoryCatalog::new();
    catalog.execute("CREATE DOMAIN D AS DATE").unwrap();
    let err = catalog.execute("CREATE DOMAIN D AS DATE").unwrap_err();
    assert!(matches!(err, Error::StatementExecution(_)));

    catalog.execute("CREATE TABLE T (\n    A INTEGER)").unwrap();
    assert!(catalog.execute("CREATE TABLE T (\n    A INTEGER)").is_err());
}

#[test]
fn test_unquoted_names_fold_to_upper_case() {
    let mut catalog = InMemoryCatalog::new();
    catalog.execute("CREATE TABLE items (\n    qty INTEGER)").unwrap();
    assert_eq!(catalog.table_names(), vec!["ITEMS"]);
    assert_eq!(catalog.table_columns("ITEMS").unwrap()[0].name, "QTY");
}

#[test]
fn test_procedure_is_overwritten() {
    let mut catalog = InMemoryCatalog::new();
    let first = ProcedureDefinition::new("P", "AS\nBEGIN\n  EXIT;\nEND");
    let second = ProcedureDefinition::new("P", "AS\nBEGIN\n  SUSPEND;\nEND");

    let report = apply(
        &mut catalog,
        DdlPlan::from_snapshot(&SchemaSnapshot::new(vec![], vec![], vec![first])).statements(),
    );
    assert!(report.is_clean());
    let report = apply(
        &mut catalog,
        DdlPlan::from_snapshot(&SchemaSnapshot::new(vec![], vec![], vec![second])).statements(),
    );
    assert!(report.is_clean());

    assert_eq!(catalog.procedure_names(), vec!["P"]);
    assert_eq!(catalog.procedure_source("P"), Some("BEGIN\n  SUSPEND;\nEND"));
}

#[test]
fn test_failures_are_reported_and_skipped() {
    let mut catalog = InMemoryCatalog::new();
    let statements = [
        "CREATE DOMAIN A AS DATE",
        "DROP TABLE NOTHING",
        "CREATE DOMAIN A AS DATE",
        "CREATE DOMAIN B AS TIME",
    ];
    let report = apply(&mut catalog, statements);

    assert_eq!(report.applied, 2);
    let failed: Vec<usize> = report.failures.iter().map(|f| f.index).collect();
    assert_eq!(failed, vec![1, 2]);
    assert_eq!(catalog.domain_names(), vec!["A", "B"]);
}

#[test]
fn test_export_apply_export_round_trip() {
    let varchar = |len| FieldDescriptor {
        field_type: codes::VARCHAR,
        length: len,
        char_length: len,
        ..FieldDescriptor::default()
    };
    let mut source = InMemoryCatalog::new()
        .with_domain(
            FieldRow::new("AGE_DOMAIN", FieldDescriptor::of_type(codes::SMALLINT)).not_null(),
        )
        .with_table(
            "CUSTOMERS",
            vec![
                FieldRow::new("ID", FieldDescriptor::of_type(codes::INTEGER)).not_null(),
                FieldRow::new("NAME", varchar(50)).with_default("DEFAULT 'NEW'"),
                FieldRow::new(
                    "BALANCE",
                    FieldDescriptor {
                        field_type: codes::INTEGER,
                        scale: -2,
                        ..FieldDescriptor::default()
                    },
                ),
            ],
        )
        .with_procedure(
            "GET_NAME",
            Some(
                "BEGIN\n  SELECT NAME FROM CUSTOMERS WHERE ID = :ID INTO :TMP;\n  \
                 NAME = :TMP;\n  SUSPEND;\nEND",
            ),
            vec![ParameterRow::new("ID", "RDB$1", FieldDescriptor::of_type(codes::INTEGER))],
            vec![ParameterRow::new("NAME", "RDB$2", varchar(50))],
        );

    let exported = export(&mut source).unwrap();
    let mut target = InMemoryCatalog::new();
    assert!(apply(&mut target, DdlPlan::from_snapshot(&exported).statements()).is_clean());

    let reexported = export(&mut target).unwrap();
    assert_eq!(reexported, exported);
}

#[test]
fn test_reserved_and_mixed_case_names_round_trip() {
    let mut source = InMemoryCatalog::new()
        .with_table(
            "EVENTS",
            vec![
                FieldRow::new("DATE", FieldDescriptor::of_type(codes::DATE)).not_null(),
                FieldRow::new("VALUE", FieldDescriptor::of_type(codes::INTEGER)),
                FieldRow::new("Note", FieldDescriptor::of_type(codes::INTEGER)),
            ],
        )
        .with_procedure(
            "SUM_EVENTS",
            Some("BEGIN\n  \"Total\" = 0;\n  SUSPEND;\nEND"),
            vec![ParameterRow::new("USER", "RDB$1", FieldDescriptor::of_type(codes::INTEGER))],
            vec![ParameterRow::new("Total", "RDB$2", FieldDescriptor::of_type(codes::INTEGER))],
        );

    let exported = export(&mut source).unwrap();
    let plan = DdlPlan::from_snapshot(&exported);
    assert!(plan.tables[0].contains("\"DATE\" DATE NOT NULL"));
    assert!(plan.procedures[0].contains("(\"USER\" INTEGER)\nRETURNS (\"Total\" INTEGER)\n"));

    let mut target = InMemoryCatalog::new();
    let report = apply(&mut target, plan.statements());
    assert!(report.is_clean(), "{:?}", report.failures);

    let columns = target.table_columns("EVENTS").unwrap();
    let names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["DATE", "VALUE", "Note"]);
    assert_eq!(export(&mut target).unwrap(), exported);
}
