//! Error type shared by stores and services.

use storefront_core::DomainError;
use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

/// Failure of a store or service operation.
///
/// Business failures stay as `DomainError` so callers can map them to precise
/// HTTP responses; everything else (connection loss, bad rows) collapses into
/// `Backend`, which the API layer reports as an opaque internal error.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("storage backend failure: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }

    pub fn as_domain(&self) -> Option<&DomainError> {
        match self {
            Self::Domain(e) => Some(e),
            Self::Backend(_) => None,
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &e {
            if db.is_unique_violation() {
                let constraint = db.constraint().unwrap_or("unique constraint");
                return StoreError::Domain(DomainError::conflict(constraint.to_string()));
            }
        }
        StoreError::Backend(e.to_string())
    }
}
