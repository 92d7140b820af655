//! High-level IR expressions.
//!
//! The richest of the three expression languages: it still contains
//! the non-polynomial operators (`Normalise`, `IfZero`) and the
//! list form used to package several constraints into one body.
//! Function invocations never appear here; the resolver inlines them
//! while the source AST is being translated.

use crate::field::FieldElement;
use crate::schema::{ColumnId, Evaluable, Testable};
use crate::trace::Trace;
use crate::util::Bounds;
use std::collections::BTreeSet;

/// A schema at the HIR level
pub type Schema = crate::schema::Schema<Expr>;

/// An HIR expression
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
    /// Argument raised to a constant power
    Exp(Box<Expr>, u64),
    /// 0 if the argument is 0, else 1
    Normalise(Box<Expr>),
    /// Branch on whether the condition is zero; at least one branch
    /// is present
    IfZero {
        /// The tested condition
        condition: Box<Expr>,
        /// Taken when the condition is zero
        if_zero: Option<Box<Expr>>,
        /// Taken when the condition is non-zero
        if_nonzero: Option<Box<Expr>>,
    },
    /// A tuple of expressions; legal only as a constraint-level body
    List(Vec<Expr>),
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

    /// Evaluate every value this expression produces at a row.
    ///
    /// Lists contribute one value per element; an `IfZero` contributes
    /// its selected branch's values (none, when that branch is
    /// absent). `None` entries mark undefined values from
    /// out-of-bounds accesses.
    pub fn eval_all_at(&self, row: isize, trace: &Trace, out: &mut Vec<Option<FieldElement>>) {
        match self {
            Expr::List(args) => {
                for arg in args {
                    arg.eval_all_at(row, trace, out);
                }
            }
            Expr::IfZero {
                condition,
                if_zero,
                if_nonzero,
            } => match condition.eval_at(row, trace) {
                None => out.push(None),
                Some(c) => {
                    let branch = if c.is_zero() { if_zero } else { if_nonzero };
                    if let Some(branch) = branch {
                        branch.eval_all_at(row, trace, out);
                    }
                }
            },
            _ => out.push(self.eval_at(row, trace)),
        }
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
            Expr::Exp(arg, pow) => Some(arg.eval_at(row, trace)?.pow(*pow)),
            Expr::Normalise(arg) => {
                let v = arg.eval_at(row, trace)?;
                Some(if v.is_zero() {
                    FieldElement::zero()
                } else {
                    FieldElement::one()
                })
            }
            Expr::IfZero {
                condition,
                if_zero,
                if_nonzero,
            } => {
                let c = condition.eval_at(row, trace)?;
                let branch = if c.is_zero() { if_zero } else { if_nonzero };
                branch.as_ref()?.eval_at(row, trace)
            }
            // Lists are constraint-level only; translation rejects
            // them in unit positions.
            Expr::List(_) => None,
        }
    }

    fn bounds(&self) -> Bounds {
        let mut bounds = Bounds::new();
        match self {
            Expr::Const(_) => {}
            Expr::ColumnAccess { shift, .. } => bounds.include_shift(*shift),
            Expr::Add(args) | Expr::Sub(args) | Expr::Mul(args) | Expr::List(args) => {
                for arg in args {
                    bounds.union(arg.bounds());
                }
            }
            Expr::Exp(arg, _) | Expr::Normalise(arg) => bounds.union(arg.bounds()),
            Expr::IfZero {
                condition,
                if_zero,
                if_nonzero,
            } => {
                bounds.union(condition.bounds());
                if let Some(b) = if_zero {
                    bounds.union(b.bounds());
                }
                if let Some(b) = if_nonzero {
                    bounds.union(b.bounds());
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
            Expr::Add(args) | Expr::Sub(args) | Expr::Mul(args) | Expr::List(args) => {
                for arg in args {
                    arg.collect_columns(out);
                }
            }
            Expr::Exp(arg, _) | Expr::Normalise(arg) => arg.collect_columns(out),
            Expr::IfZero {
                condition,
                if_zero,
                if_nonzero,
            } => {
                condition.collect_columns(out);
                if let Some(b) = if_zero {
                    b.collect_columns(out);
                }
                if let Some(b) = if_nonzero {
                    b.collect_columns(out);
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
            Expr::Exp(arg, pow) => format!("(^ {} {})", arg.lisp(names), pow),
            Expr::Normalise(arg) => format!("(~ {})", arg.lisp(names)),
            Expr::IfZero {
                condition,
                if_zero,
                if_nonzero,
            } => match (if_zero, if_nonzero) {
                (Some(z), None) => format!("(ifnot {} {})", condition.lisp(names), z.lisp(names)),
                (None, Some(n)) => format!("(if {} {})", condition.lisp(names), n.lisp(names)),
                (Some(z), Some(n)) => format!(
                    "(if {} {} {})",
                    condition.lisp(names),
                    n.lisp(names),
                    z.lisp(names)
                ),
                (None, None) => unreachable!("if-zero with no branch"),
            },
            Expr::List(args) => lisp_nary("begin", args, names),
        }
    }
}

impl Testable for Expr {
    /// Whether every value produced by this body vanishes at a row.
    /// Undefined values are assumed to hold.
    fn test_zero_at(&self, row: isize, trace: &Trace) -> Option<bool> {
        let mut values = Vec::new();
        self.eval_all_at(row, trace, &mut values);
        for value in values.into_iter().flatten() {
            if !value.is_zero() {
                return Some(false);
            }
        }
        Some(true)
    }
}

fn lisp_nary(op: &str, args: &[Expr], names: &[String]) -> String {
    let parts: Vec<String> = args.iter().map(|a| a.lisp(names)).collect();
    format!("({} {})", op, parts.join(" "))
}
