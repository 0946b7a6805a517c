//! Measurement store error types

use std::fmt;
use thiserror::Error;

use core_kernel::PortError;

/// The store operation that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    GetLatest,
    GetAll,
    Save,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::GetLatest => "get latest measurement",
            Operation::GetAll => "get all measurements",
            Operation::Save => "save measurement",
            Operation::Delete => "delete measurement",
        };
        f.write_str(name)
    }
}

/// Errors returned by `MeasurementStore`
///
/// Every backend or mapping failure collapses into `OperationFailed`; the
/// original `PortError` is kept as the source.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to {operation}: {source}")]
    OperationFailed {
        operation: Operation,
        #[source]
        source: PortError,
    },
}

impl StoreError {
    pub fn failed(operation: Operation, source: PortError) -> Self {
        StoreError::OperationFailed { operation, source }
    }

    /// Returns the operation that failed
    pub fn operation(&self) -> Operation {
        match self {
            StoreError::OperationFailed { operation, .. } => *operation,
        }
    }

    /// Returns the underlying port error
    pub fn cause(&self) -> &PortError {
        match self {
            StoreError::OperationFailed { source, .. } => source,
        }
    }

    pub fn into_cause(self) -> PortError {
        match self {
            StoreError::OperationFailed { source, .. } => source,
        }
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_error_keeps_cause() {
        let error = StoreError::failed(Operation::Save, PortError::conflict("duplicate key"));

        assert_eq!(error.operation(), Operation::Save);
        assert!(matches!(error.cause(), PortError::Conflict { .. }));
        assert!(error.source().is_some());
        assert!(error.to_string().starts_with("Failed to save measurement"));
    }
}
