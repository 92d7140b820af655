//! Error types for the zkcl core data model

use thiserror::Error;

/// Errors arising while constructing schemas or decoding interchange files
#[derive(Debug, Error)]
pub enum SchemaError {
    /// A module index outside the schema's module table
    #[error("invalid module index ({0})")]
    InvalidModule(usize),

    /// Two modules declared with the same name
    #[error("duplicate module {0}")]
    DuplicateModule(String),

    /// Two columns declared with the same name in one module
    #[error("duplicate column {0}")]
    DuplicateColumn(String),

    /// A column index outside the schema's column table
    #[error("invalid column index ({0})")]
    InvalidColumn(usize),

    /// Lookup constraint with differing numbers of source and target columns
    #[error("lookup \"{handle}\" has {sources} source(s) but {targets} target(s)")]
    LookupArity {
        handle: String,
        sources: usize,
        targets: usize,
    },

    /// Permutation whose target, source and sign lists disagree in length
    #[error("permutation \"{handle}\" has mismatched target / source columns")]
    PermutationArity { handle: String },

    /// Interleaving declared without any source columns
    #[error("interleaving \"{handle}\" has no sources")]
    EmptyInterleaving { handle: String },

    /// A list expression used where a single field value is required.
    /// This indicates a bug upstream of lowering, hence fatal.
    #[error("list expression in unit context")]
    ListInUnitContext,

    /// An assignment expression still containing non-polynomial
    /// operators when lowering to AIR. Assignment expressions are
    /// produced by lowering itself, so this is a bug.
    #[error("non-polynomial assignment expression")]
    NonPolynomialAssignment,

    /// A range constraint whose bound is not a power of two
    #[error("range bound {0} is not a power of two")]
    NonPowerOfTwoBound(u64),

    /// Malformed trace file (either JSON or binary)
    #[error("malformed trace file: {0}")]
    MalformedTrace(String),

    /// Malformed schema interchange file
    #[error("malformed schema file: {0}")]
    MalformedSchema(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, SchemaError>;
