//! Error types for the caching core

use std::fmt;

/// Failure of a backend port
#[derive(Debug)]
pub enum StoreError {
    /// The backend (object store, database, spreadsheet API) failed
    Backend(Box<dyn std::error::Error + Send + Sync>),
}

impl StoreError {
    /// Wrap any backend error
    pub fn backend<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        StoreError::Backend(Box::new(err))
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Backend(err) => write!(f, "Backend error: {}", err),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Backend(err) => Some(err.as_ref()),
        }
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
