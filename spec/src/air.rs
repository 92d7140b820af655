//! Arithmetic IR expressions.
//!
//! The bottom of the pipeline: a pure polynomial language over
//! columns. Anything a prover backend consumes is expressed here.

use crate::field::FieldElement;
use crate::schema::{ColumnId, Evaluable, Testable};
use crate::trace::Trace;
use crate::util::Bounds;
use std::collections::BTreeSet;

/// A schema at the AIR level
pub type Schema = crate::schema::Schema<Expr>;

/// An AIR expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// A constant field value
    Const(FieldElement),
    /// Row `r + shift` of a column, evaluated at row `r`
    ColumnAccess {
        /// The accessed column
        column: ColumnId,
        /// Row offset
        shift: isize,
    },
    /// Sum of the arguments
    Add(Vec<Expr>),
    /// First argument minus the remaining ones
    Sub(Vec<Expr>),
    /// Product of the arguments
    Mul(Vec<Expr>),
}

impl Expr {
    /// Access a column at shift 0
    pub fn column(column: ColumnId) -> Expr {
        Expr::ColumnAccess { column, shift: 0 }
    }

    /// Access a column at the given shift
    pub fn shifted(column: ColumnId, shift: isize) -> Expr {
        Expr::ColumnAccess { column, shift }
    }

    /// A constant
    pub fn constant(value: u64) -> Expr {
        Expr::Const(FieldElement::new(value))
    }
}

impl Evaluable for Expr {
    fn eval_at(&self, row: isize, trace: &Trace) -> Option<FieldElement> {
        match self {
            Expr::Const(c) => Some(*c),
            Expr::ColumnAccess { column, shift } => trace.get(*column, row + shift),
            Expr::Add(args) => {
                let mut sum = FieldElement::zero();
                for arg in args {
                    sum += arg.eval_at(row, trace)?;
                }
                Some(sum)
            }
            Expr::Sub(args) => {
                let mut iter = args.iter();
                let mut acc = iter.next()?.eval_at(row, trace)?;
                for arg in iter {
                    acc -= arg.eval_at(row, trace)?;
                }
                Some(acc)
            }
            Expr::Mul(args) => {
                let mut prod = FieldElement::one();
                for arg in args {
                    prod *= arg.eval_at(row, trace)?;
                }
                Some(prod)
            }
        }
    }

    fn bounds(&self) -> Bounds {
        let mut bounds = Bounds::new();
        match self {
            Expr::Const(_) => {}
            Expr::ColumnAccess { shift, .. } => bounds.include_shift(*shift),
            Expr::Add(args) | Expr::Sub(args) | Expr::Mul(args) => {
                for arg in args {
                    bounds.union(arg.bounds());
                }
            }
        }
        bounds
    }

    fn collect_columns(&self, out: &mut BTreeSet<ColumnId>) {
        match self {
            Expr::Const(_) => {}
            Expr::ColumnAccess { column, .. } => {
                out.insert(*column);
            }
            Expr::Add(args) | Expr::Sub(args) | Expr::Mul(args) => {
                for arg in args {
                    arg.collect_columns(out);
                }
            }
        }
    }

    fn lisp(&self, names: &[String]) -> String {
        match self {
            Expr::Const(c) => c.to_string(),
            Expr::ColumnAccess { column, shift } => {
                if *shift == 0 {
                    names[*column].clone()
                } else {
                    format!("(shift {} {})", names[*column], shift)
                }
            }
            Expr::Add(args) => lisp_nary("+", args, names),
            Expr::Sub(args) => lisp_nary("-", args, names),
            Expr::Mul(args) => lisp_nary("*", args, names),
        }
    }
}

impl Testable for Expr {
    fn test_zero_at(&self, row: isize, trace: &Trace) -> Option<bool> {
        self.eval_at(row, trace).map(|v| v.is_zero())
    }
}

fn lisp_nary(op: &str, args: &[Expr], names: &[String]) -> String {
    let parts: Vec<String> = args.iter().map(|a| a.lisp(names)).collect();
    format!("({} {})", op, parts.join(" "))
}
