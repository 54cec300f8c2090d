//! Live catalog access over the Firebird wire protocol.

use rsfbclient::prelude::*;
use rsfbclient::SimpleConnection;
use tracing::{debug, info};

use firebird_types::FieldDescriptor;

use crate::catalog::{CatalogSource, FieldRow, ParameterDirection, ParameterRow, ProcedureRow};
use crate::config::ConnectionConfig;
use crate::error::{Error, Result};
use crate::executor::StatementExecutor;

const FIELDS_QUERY: &str = "
    SELECT TRIM(F.RDB$FIELD_NAME), F.RDB$FIELD_TYPE, F.RDB$FIELD_SUB_TYPE, F.RDB$FIELD_LENGTH,
           F.RDB$CHARACTER_LENGTH, F.RDB$FIELD_SCALE, F.RDB$DEFAULT_SOURCE, F.RDB$NULL_FLAG
    FROM RDB$FIELDS F
    WHERE COALESCE(F.RDB$SYSTEM_FLAG, 0) = 0
    ORDER BY F.RDB$FIELD_NAME";

const RELATIONS_QUERY: &str = "
    SELECT TRIM(R.RDB$RELATION_NAME)
    FROM RDB$RELATIONS R
    WHERE COALESCE(R.RDB$SYSTEM_FLAG, 0) = 0 AND R.RDB$VIEW_BLR IS NULL
    ORDER BY R.RDB$RELATION_NAME";

const RELATION_FIELDS_QUERY: &str = "
    SELECT TRIM(RF.RDB$FIELD_NAME), F.RDB$FIELD_TYPE, F.RDB$FIELD_SUB_TYPE, F.RDB$FIELD_LENGTH,
           F.RDB$CHARACTER_LENGTH, F.RDB$FIELD_SCALE, RF.RDB$DEFAULT_SOURCE, RF.RDB$NULL_FLAG
    FROM RDB$RELATION_FIELDS RF
    JOIN RDB$FIELDS F ON F.RDB$FIELD_NAME = RF.RDB$FIELD_SOURCE
    WHERE RF.RDB$RELATION_NAME = ?
    ORDER BY RF.RDB$FIELD_POSITION";

const PROCEDURES_QUERY: &str = "
    SELECT TRIM(P.RDB$PROCEDURE_NAME), P.RDB$PROCEDURE_SOURCE
    FROM RDB$PROCEDURES P
    WHERE COALESCE(P.RDB$SYSTEM_FLAG, 0) = 0
    ORDER BY P.RDB$PROCEDURE_NAME";

const PARAMETERS_QUERY: &str = "
    SELECT TRIM(PP.RDB$PARAMETER_NAME), TRIM(PP.RDB$FIELD_SOURCE), F.RDB$FIELD_TYPE,
           F.RDB$FIELD_SUB_TYPE, F.RDB$FIELD_LENGTH, F.RDB$CHARACTER_LENGTH, F.RDB$FIELD_SCALE
    FROM RDB$PROCEDURE_PARAMETERS PP
    LEFT JOIN RDB$FIELDS F ON F.RDB$FIELD_NAME = PP.RDB$FIELD_SOURCE
    WHERE PP.RDB$PROCEDURE_NAME = ? AND PP.RDB$PARAMETER_TYPE = ?
    ORDER BY PP.RDB$PARAMETER_NUMBER";

type FieldTuple = (
    String,
    Option<i64>,
    Option<i64>,
    Option<i64>,
    Option<i64>,
    Option<i64>,
    Option<String>,
    Option<i64>,
);

type ParameterTuple = (
    String,
    Option<String>,
    Option<i64>,
    Option<i64>,
    Option<i64>,
    Option<i64>,
    Option<i64>,
);

/// An open connection to a Firebird database.
///
/// The attachment is released when the client is dropped.
pub struct FirebirdClient {
    conn: SimpleConnection,
    target: String,
}

impl FirebirdClient {
    /// Attach to an existing database.
    pub fn connect(config: &ConnectionConfig) -> Result<Self> {
        info!("Connecting to {config}");
        let conn = rsfbclient::builder_pure_rust()
            .host(config.host.as_str())
            .port(config.port)
            .db_name(config.database.as_str())
            .user(config.user.as_str())
            .pass(config.password.as_str())
            .connect()
            .map_err(|e| Error::Connection(format!("{config}: {e}")))?;

        Ok(Self {
            conn: conn.into(),
            target: config.to_string(),
        })
    }

    /// Create a new, empty database and attach to it.
    pub fn create_database(config: &ConnectionConfig) -> Result<Self> {
        info!("Creating database {config}");
        let conn = rsfbclient::builder_pure_rust()
            .host(config.host.as_str())
            .port(config.port)
            .db_name(config.database.as_str())
            .user(config.user.as_str())
            .pass(config.password.as_str())
            .create_database()
            .map_err(|e| Error::Connection(format!("cannot create {config}: {e}")))?;

        Ok(Self {
            conn: conn.into(),
            target: config.to_string(),
        })
    }

    /// `host:port/database` this client is attached to.
    pub fn target(&self) -> &str {
        &self.target
    }
}

impl CatalogSource for FirebirdClient {
    fn fields(&mut self) -> Result<Vec<FieldRow>> {
        let rows: Vec<FieldTuple> = self
            .conn
            .query(FIELDS_QUERY, ())
            .map_err(|e| Error::catalog("domains", e))?;
        debug!("Read {} field definitions", rows.len());
        Ok(rows.into_iter().map(field_row).collect())
    }

    fn relations(&mut self) -> Result<Vec<String>> {
        let rows: Vec<(String,)> = self
            .conn
            .query(RELATIONS_QUERY, ())
            .map_err(|e| Error::catalog("relations", e))?;
        Ok(rows.into_iter().map(|(name,)| name).collect())
    }

    fn relation_fields(&mut self, relation: &str) -> Result<Vec<FieldRow>> {
        let rows: Vec<FieldTuple> = self
            .conn
            .query(RELATION_FIELDS_QUERY, (relation.to_string(),))
            .map_err(|e| Error::catalog("relation fields", e))?;
        Ok(rows.into_iter().map(field_row).collect())
    }

    fn procedures(&mut self) -> Result<Vec<ProcedureRow>> {
        let rows: Vec<(String, Option<String>)> = self
            .conn
            .query(PROCEDURES_QUERY, ())
            .map_err(|e| Error::catalog("procedures", e))?;
        Ok(rows
            .into_iter()
            .map(|(name, source)| ProcedureRow { name, source })
            .collect())
    }

    fn procedure_parameters(
        &mut self,
        procedure: &str,
        direction: ParameterDirection,
    ) -> Result<Vec<ParameterRow>> {
        let rows: Vec<ParameterTuple> = self
            .conn
            .query(
                PARAMETERS_QUERY,
                (procedure.to_string(), direction.code()),
            )
            .map_err(|e| Error::catalog("procedure parameters", e))?;

        Ok(rows
            .into_iter()
            .map(
                |(name, field_source, field_type, sub_type, length, char_length, scale)| {
                    let field = FieldDescriptor {
                        field_type: narrow(field_type).unwrap_or(0),
                        sub_type: narrow(sub_type).unwrap_or(0),
                        length: narrow(length).unwrap_or(0),
                        char_length: narrow(char_length).unwrap_or(0),
                        scale: narrow(scale).unwrap_or(0),
                    };
                    ParameterRow::new(name, field_source.unwrap_or_default(), field)
                },
            )
            .collect())
    }
}

impl StatementExecutor for FirebirdClient {
    fn execute(&mut self, sql: &str) -> Result<()> {
        self.conn
            .execute(sql, ())
            .map_err(|e| Error::StatementExecution(e.to_string()))?;
        Ok(())
    }
}

fn field_row(
    (name, field_type, sub_type, length, char_length, scale, default_source, null_flag): FieldTuple,
) -> FieldRow {
    FieldRow {
        name,
        field_type: narrow(field_type),
        sub_type: narrow(sub_type),
        length: narrow(length),
        char_length: narrow(char_length),
        scale: narrow(scale),
        default_source,
        null_flag: narrow(null_flag),
    }
}

/// Catalog integers are SMALLINT/INTEGER; anything wider is treated as NULL.
fn narrow(value: Option<i64>) -> Option<i32> {
    value.and_then(|v| i32::try_from(v).ok())
}
