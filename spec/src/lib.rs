//! # zkcl core data model
//!
//! Types shared by the zkcl compiler and runtime:
//!
//! - The prime field all constraint arithmetic lives in
//! - The three expression IRs (HIR, MIR, AIR) and the lowering
//!   pipeline between them
//! - The schema model: modules, columns, assignments, constraints
//! - The column-major trace model and its interchange encodings
//!
//! ## Example
//!
//! ```rust
//! use zkcl_spec::{hir, lower, Context, ColumnType, Schema};
//!
//! // A single-column schema requiring X to vanish everywhere.
//! let mut schema: hir::Schema = Schema::new();
//! let ctx = Context::new(0, 1);
//! let x = schema.add_data_column(ctx, "X", ColumnType::Field).unwrap();
//! schema.add_vanishing("c1", ctx, None, hir::Expr::column(x)).unwrap();
//!
//! // Lower it all the way down to polynomial constraints.
//! let mir = lower::lower_to_mir(&schema).unwrap();
//! let air = lower::lower_to_air(&mir).unwrap();
//! assert_eq!(air.column_count(), 1);
//! ```

pub mod air;
pub mod binfile;
pub mod encoding;
pub mod error;
pub mod field;
pub mod hir;
pub mod lower;
pub mod mir;
pub mod schema;
pub mod trace;
pub mod types;
pub mod util;

pub use error::{Result, SchemaError};
pub use field::FieldElement;
pub use schema::{
    Assignment, Column, ColumnId, Constraint, Context, Evaluable, LookupConstraint, Module,
    ModuleId, PropertyAssertion, RangeConstraint, Schema, Testable, TypeConstraint,
    VanishingConstraint,
};
pub use trace::{RawColumn, Trace, TraceColumn};
pub use types::ColumnType;
pub use util::Bounds;

/// Name of the implicit prelude module
pub const PRELUDE: &str = "";
