//! # zkcl runtime
//!
//! Everything that happens after compilation: aligning a raw trace
//! with a schema, expanding it (spillage, computed columns, padding),
//! checking constraints at any IR level, and exhaustively enumerating
//! traces in search of counter-examples.
//!
//! ## Example
//!
//! ```rust
//! use zkcl_runtime::{check_with_lowering, CheckConfig};
//! use zkcl_spec::{hir, Context, ColumnType, FieldElement, RawColumn, Schema};
//!
//! let mut schema: hir::Schema = Schema::new();
//! let ctx = Context::new(0, 1);
//! let x = schema.add_data_column(ctx, "X", ColumnType::Field).unwrap();
//! schema.add_vanishing("c", ctx, None, hir::Expr::column(x)).unwrap();
//!
//! let trace = vec![RawColumn::new("X", vec![FieldElement::zero(); 4])];
//! check_with_lowering(&schema, &trace, &CheckConfig::default()).unwrap();
//! ```

pub mod alignment;
pub mod checker;
pub mod enumerator;
pub mod error;
pub mod expander;

pub use alignment::{align, align_inputs};
pub use checker::{check_schema, check_trace, check_with_lowering, CheckConfig, CheckReport, IrLevel};
pub use enumerator::{find_level_disagreement, ElementEnumerator, TraceEnumerator};
pub use error::{Result, RuntimeError};
pub use expander::expand;
