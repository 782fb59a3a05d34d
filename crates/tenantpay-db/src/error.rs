//! Database error types

use tenantpay_types::LedgerError;
use thiserror::Error;

/// Database operation errors
#[derive(Debug, Error)]
pub enum DbError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Query error: {0}")]
    Query(#[from] sqlx::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type for database operations
pub type DbResult<T> = Result<T, DbError>;

impl From<DbError> for LedgerError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::NotFound(what) => LedgerError::not_found("Record", what),
            other => LedgerError::data_access(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_failures_become_data_access() {
        let err: LedgerError = DbError::Connection("refused".to_string()).into();
        assert!(err.is_transient());

        let err: LedgerError = DbError::Query(sqlx::Error::PoolTimedOut).into();
        assert!(matches!(err, LedgerError::DataAccess { .. }));

        let err: LedgerError = DbError::Serialization("bad status".to_string()).into();
        assert!(matches!(err, LedgerError::DataAccess { .. }));
    }

    #[test]
    fn test_not_found_is_preserved() {
        let err: LedgerError = DbError::NotFound("txn_1".to_string()).into();
        assert!(matches!(err, LedgerError::NotFound { .. }));
    }
}
