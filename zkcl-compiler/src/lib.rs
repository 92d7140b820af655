//! # zkcl front end
//!
//! Compiles constraint source text into an HIR schema:
//!
//! 1. The reader turns characters into an S-expression tree
//!    ([`lexer`], [`sexp`]).
//! 2. The form parser turns the tree into a source AST ([`parser`],
//!    [`ast`]).
//! 3. The resolver binds every symbol over the declaration
//!    dependency graph, rejecting duplicates and cycles
//!    ([`resolver`]).
//! 4. The translator produces the HIR schema, inlining functions and
//!    fixing every constraint's evaluation context ([`translator`]).
//!
//! ## Example
//!
//! ```rust
//! use zkcl_compiler::compile;
//!
//! let schema = compile(
//!     ";; X repeats until it changes by one
//!      (defcolumns (X :u8))
//!      (defconstraint step () (vanishes! (* (- (shift X 1) X) (- (shift X 1) X 1))))",
//! )
//! .unwrap();
//! assert_eq!(schema.column_count(), 1);
//! ```

pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod resolver;
pub mod sexp;
pub mod translator;

pub use error::{CompileError, Span, SyntaxError};

use zkcl_spec::hir;

/// Compile constraint source text into an HIR schema
pub fn compile(source: &str) -> Result<hir::Schema, CompileError> {
    let forms = sexp::parse_all(source).map_err(CompileError::Syntax)?;
    let circuit = parser::parse_circuit(&forms).map_err(CompileError::Syntax)?;
    let env = resolver::resolve(&circuit).map_err(CompileError::Syntax)?;
    translator::translate(&circuit, &env)
}
