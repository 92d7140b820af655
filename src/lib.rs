//! # zkcl
//!
//! Compiler and trace checker for an S-expression constraint
//! language. A source file declares modules, columns, constraints,
//! permutations, interleavings, lookups, functions and constants; the
//! compiler lowers it through three IRs (HIR, MIR, AIR) down to pure
//! vanishing polynomial constraints, and the runtime checks candidate
//! execution traces against the schema at any of the three levels.
//!
//! This crate is a facade over the three workspace members:
//!
//! - [`spec`]: field, expression IRs, schema model, lowering, traces
//! - [`compiler`]: reader, resolver and HIR translation
//! - [`runtime`]: alignment, expansion, checking, enumeration
//!
//! ## Example
//!
//! ```rust
//! use zkcl::compiler::compile;
//! use zkcl::runtime::{check_with_lowering, CheckConfig};
//! use zkcl::spec::{FieldElement, RawColumn};
//!
//! let schema = compile("(defcolumns X) (defconstraint c () (vanishes! X))").unwrap();
//! let trace = vec![RawColumn::new("X", vec![FieldElement::zero(); 3])];
//! check_with_lowering(&schema, &trace, &CheckConfig::default()).unwrap();
//! ```

pub use zkcl_compiler as compiler;
pub use zkcl_runtime as runtime;
pub use zkcl_spec as spec;
