//! Unified error type for the shopkeeper ledger.
//!
//! Business-rule failures (closed store, empty shelf, duplicate names) are
//! ordinary variants so callers can show them to the operator; storage failures
//! arrive as [`Error::Database`].

use sea_orm::DbErr;
use thiserror::Error;

/// Errors returned by every catalog, ledger, store and report operation.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be loaded or parsed
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// Malformed or out-of-range input from the caller
    #[error("Invalid input: {message}")]
    InvalidInput {
        /// Which field was rejected and why
        message: String,
    },

    /// Another product already uses this normalized name
    #[error("A product named '{name}' already exists")]
    DuplicateName {
        /// The normalized name that collided
        name: String,
    },

    /// The referenced product does not exist
    #[error("Product not found: {product_id}")]
    ProductNotFound {
        /// ID that was looked up
        product_id: i64,
    },

    /// Sales are refused while the store is closed
    #[error("The store is closed")]
    StoreClosed,

    /// No units left to sell
    #[error("'{name}' is out of stock")]
    OutOfStock {
        /// Product that was sold out
        product_id: i64,
        /// Its name, for display
        name: String,
    },

    /// A write collided with a concurrent one, or a state precondition failed
    #[error("Conflict: {message}")]
    Conflict {
        /// Description of the collision
        message: String,
    },

    /// Error from the database layer
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    /// I/O error (config files)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error is transient storage contention worth retrying.
    ///
    /// `SQLite` reports lock contention as `database is locked` / `database table is locked`
    /// (`SQLITE_BUSY` / `SQLITE_LOCKED`).
    #[must_use]
    pub fn is_contention(&self) -> bool {
        match self {
            Self::Database(err) => {
                let text = err.to_string().to_lowercase();
                text.contains("database is locked")
                    || text.contains("database table is locked")
                    || text.contains("sqlite_busy")
            }
            _ => false,
        }
    }

    /// Shorthand for building an [`Error::InvalidInput`].
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locked_database_is_contention() {
        let err = Error::Database(DbErr::Custom("database is locked".to_string()));
        assert!(err.is_contention());

        let err = Error::Database(DbErr::Custom("Database table is locked: products".to_string()));
        assert!(err.is_contention());
    }

    #[test]
    fn test_business_errors_are_not_contention() {
        assert!(!Error::StoreClosed.is_contention());
        assert!(
            !Error::OutOfStock {
                product_id: 1,
                name: "OIL".to_string()
            }
            .is_contention()
        );
        assert!(!Error::Database(DbErr::RecordNotFound("x".to_string())).is_contention());
    }
}
