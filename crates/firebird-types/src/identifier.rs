//! Identifier validation and quoting for generated DDL.
//!
//! Object names come from catalog metadata and are concatenated into DDL
//! text, since identifiers cannot be bound as statement parameters. Before
//! that happens each name is validated, and names that are not plain
//! unquoted identifiers are emitted as quoted identifiers.

use thiserror::Error;

/// Maximum identifier length in bytes (Firebird 4+ metadata limit).
pub const MAX_IDENTIFIER_LENGTH: usize = 63;

/// Reasons an identifier cannot be used in generated DDL.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdentifierError {
    #[error("identifier is empty")]
    Empty,

    #[error("identifier contains a null byte: {0:?}")]
    NullByte(String),

    #[error("identifier exceeds 63 bytes ({len} bytes): {name:?}")]
    TooLong { name: String, len: usize },
}

/// Validate an identifier.
///
/// Rejects empty identifiers, identifiers containing null bytes, and
/// identifiers longer than [`MAX_IDENTIFIER_LENGTH`] bytes.
pub fn validate_identifier(name: &str) -> Result<(), IdentifierError> {
    if name.is_empty() {
        return Err(IdentifierError::Empty);
    }
    if name.contains('\0') {
        return Err(IdentifierError::NullByte(name.to_string()));
    }
    if name.len() > MAX_IDENTIFIER_LENGTH {
        return Err(IdentifierError::TooLong {
            name: name.to_string(),
            len: name.len(),
        });
    }
    Ok(())
}

/// Firebird reserved words. These parse as keywords when bare, so a catalog
/// object that carries one of them as its name must be quoted.
pub const RESERVED_WORDS: &[&str] = &[
    "ADD", "ADMIN", "ALL", "ALTER", "AND", "ANY", "AS", "AT", "AVG", "BEGIN", "BETWEEN",
    "BIGINT", "BINARY", "BIT_LENGTH", "BLOB", "BOOLEAN", "BOTH", "BY", "CASE", "CAST", "CHAR",
    "CHARACTER", "CHARACTER_LENGTH", "CHAR_LENGTH", "CHECK", "CLOSE", "COLLATE", "COLUMN",
    "COMMENT", "COMMIT", "CONNECT", "CONSTRAINT", "CORR", "COUNT", "COVAR_POP", "COVAR_SAMP",
    "CREATE", "CROSS", "CURRENT", "CURRENT_CONNECTION", "CURRENT_DATE", "CURRENT_ROLE",
    "CURRENT_TIME", "CURRENT_TIMESTAMP", "CURRENT_TRANSACTION", "CURRENT_USER", "CURSOR",
    "DATE", "DAY", "DEC", "DECFLOAT", "DECIMAL", "DECLARE", "DEFAULT", "DELETE", "DELETING",
    "DETERMINISTIC", "DISCONNECT", "DISTINCT", "DOUBLE", "DROP", "ELSE", "END", "ESCAPE",
    "EXECUTE", "EXISTS", "EXTERNAL", "EXTRACT", "FALSE", "FETCH", "FILTER", "FLOAT", "FOR",
    "FOREIGN", "FROM", "FULL", "FUNCTION", "GDSCODE", "GLOBAL", "GRANT", "GROUP", "HAVING",
    "HOUR", "IN", "INDEX", "INNER", "INSENSITIVE", "INSERT", "INSERTING", "INT", "INT128",
    "INTEGER", "INTO", "IS", "JOIN", "LAG", "LEAD", "LEADING", "LEFT", "LIKE", "LOCAL",
    "LOCALTIME", "LOCALTIMESTAMP", "LONG", "LOWER", "MAX", "MERGE", "MIN", "MINUTE", "MONTH",
    "NATIONAL", "NATURAL", "NCHAR", "NO", "NOT", "NULL", "NUMERIC", "OCTET_LENGTH", "OF",
    "OFFSET", "ON", "ONLY", "OPEN", "OR", "ORDER", "OUTER", "OVER", "PARAMETER", "PLAN",
    "POSITION", "POST_EVENT", "PRECISION", "PRIMARY", "PROCEDURE", "PUBLICATION",
    "RDB$DB_KEY", "RDB$ERROR", "RDB$GET_CONTEXT", "RDB$GET_TRANSACTION_CN",
    "RDB$RECORD_VERSION", "RDB$ROLE_IN_USE", "RDB$SET_CONTEXT", "RDB$SYSTEM_PRIVILEGE",
    "REAL", "RECORD_VERSION", "RECREATE", "RECURSIVE", "REFERENCES", "REGR_AVGX",
    "REGR_AVGY", "REGR_COUNT", "REGR_INTERCEPT", "REGR_R2", "REGR_SLOPE", "REGR_SXX",
    "REGR_SXY", "REGR_SYY", "RELEASE", "RESETTING", "RETURN", "RETURNING_VALUES", "RETURNS",
    "REVOKE", "RIGHT", "ROLLBACK", "ROW", "ROWS", "ROW_COUNT", "SAVEPOINT", "SCROLL",
    "SECOND", "SELECT", "SENSITIVE", "SET", "SIMILAR", "SMALLINT", "SOME", "SQLCODE",
    "SQLSTATE", "START", "STDDEV_POP", "STDDEV_SAMP", "SUM", "TABLE", "THEN", "TIME",
    "TIMESTAMP", "TIMEZONE_HOUR", "TIMEZONE_MINUTE", "TO", "TRAILING", "TRIGGER", "TRIM",
    "TRUE", "UNBOUNDED", "UNION", "UNIQUE", "UNKNOWN", "UPDATE", "UPDATING", "UPPER", "USER",
    "USING", "VALUE", "VALUES", "VARBINARY", "VARCHAR", "VARIABLE", "VARYING", "VAR_POP",
    "VAR_SAMP", "VIEW", "WHEN", "WHERE", "WHILE", "WINDOW", "WITH", "WITHOUT", "YEAR",
];

/// True for upper-case names matching a Firebird reserved word.
pub fn is_reserved_word(name: &str) -> bool {
    RESERVED_WORDS.contains(&name)
}

/// True for names that survive unquoted: `[A-Z][A-Z0-9_$]*` and not a
/// reserved word.
///
/// Unquoted identifiers are folded to upper case by the server, so a stored
/// name containing lower-case letters only round-trips when quoted.
pub fn is_plain_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_uppercase() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_' || c == '$')
        && !is_reserved_word(name)
}

/// Render an identifier for DDL.
///
/// Plain identifiers are returned unchanged so the generated text matches
/// what the catalog stores. Anything else is wrapped in double quotes with
/// embedded double quotes doubled.
///
/// ```
/// use firebird_types::quote_identifier;
///
/// assert_eq!(quote_identifier("CUSTOMERS").unwrap(), "CUSTOMERS");
/// assert_eq!(quote_identifier("order items").unwrap(), "\"order items\"");
/// assert_eq!(quote_identifier("DATE").unwrap(), "\"DATE\"");
/// ```
pub fn quote_identifier(name: &str) -> Result<String, IdentifierError> {
    validate_identifier(name)?;
    if is_plain_identifier(name) {
        Ok(name.to_string())
    } else {
        Ok(format!("\"{}\"", name.replace('"', "\"\"")))
    }
}

/// Like [`quote_identifier`], but a name that fails validation is returned
/// as-is so the server reports the problem in context.
pub fn quote_identifier_lossy(name: &str) -> String {
    quote_identifier(name).unwrap_or_else(|e| {
        tracing::warn!("Emitting identifier {:?} unquoted: {}", name, e);
        name.to_string()
    })
}

/// Render text as a SQL string literal, doubling embedded single quotes.
pub fn quote_literal(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}
