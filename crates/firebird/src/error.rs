use thiserror::Error;

/// Errors raised while talking to a Firebird database.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Catalog query for {query} failed: {message}")]
    CatalogQuery {
        query: &'static str,
        message: String,
    },

    #[error("Statement failed: {0}")]
    StatementExecution(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn catalog(query: &'static str, err: impl std::fmt::Display) -> Self {
        Self::CatalogQuery {
            query,
            message: err.to_string(),
        }
    }
}
