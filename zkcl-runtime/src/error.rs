//! Runtime error types: alignment, expansion and checking failures

use thiserror::Error;
use zkcl_spec::{FieldElement, SchemaError};

/// Errors raised while aligning, expanding or checking a trace
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// The trace lacks a column the schema requires
    #[error("trace missing column {0}")]
    MissingColumn(String),

    /// The trace contains a column the schema does not know (strict
    /// alignment only; lenient alignment trims it with a warning)
    #[error("unknown trace column {0}")]
    UnknownColumn(String),

    /// A column's length is not a multiple of its length multiplier
    #[error("column {column} has {length} value(s), not a multiple of {multiplier}")]
    RaggedColumn {
        column: String,
        length: usize,
        multiplier: usize,
    },

    /// Two columns of one module imply different heights
    #[error("module {module} has inconsistent heights ({first} vs {second})")]
    InconsistentHeight {
        module: String,
        first: usize,
        second: usize,
    },

    /// An assignment read a column that has not been populated yet
    #[error("column {0} read before it was populated")]
    UnpopulatedColumn(String),

    /// A vanishing constraint failed
    #[error("constraint \"{handle}\" does not hold (row {row})")]
    ConstraintFailure { handle: String, row: usize },

    /// A lookup constraint failed
    #[error("lookup \"{handle}\" does not hold (row {row})")]
    LookupFailure { handle: String, row: usize },

    /// A type constraint failed
    #[error("row {row} of column {column} is out-of-bounds ({value})")]
    TypeFailure {
        column: String,
        row: usize,
        value: FieldElement,
    },

    /// A range constraint failed
    #[error("range \"{handle}\" does not hold (row {row}, value {value})")]
    RangeFailure {
        handle: String,
        row: usize,
        value: FieldElement,
    },

    /// Permutation targets are not a permutation of their sources
    #[error("permutation \"{handle}\" is not a permutation of its sources")]
    NotPermutation { handle: String },

    /// Permutation targets are not sorted as declared
    #[error("permutation \"{handle}\" is not sorted (row {row})")]
    NotSorted { handle: String, row: usize },

    /// Schema-level failure
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Result type for runtime operations
pub type Result<T> = std::result::Result<T, RuntimeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constraint_failure_display() {
        let err = RuntimeError::ConstraintFailure {
            handle: "c1".to_string(),
            row: 3,
        };
        assert_eq!(err.to_string(), "constraint \"c1\" does not hold (row 3)");
    }

    #[test]
    fn test_type_failure_display() {
        let err = RuntimeError::TypeFailure {
            column: "m1.X".to_string(),
            row: 0,
            value: FieldElement::new(300),
        };
        assert_eq!(err.to_string(), "row 0 of column m1.X is out-of-bounds (300)");
    }

    #[test]
    fn test_missing_column_display() {
        let err = RuntimeError::MissingColumn("m1.X".to_string());
        assert_eq!(err.to_string(), "trace missing column m1.X");
    }
}
