//! Mid-level IR expressions.
//!
//! Strictly single-valued: the conditional and list forms of the HIR
//! are gone, leaving arithmetic plus exponentiation and
//! normalisation. Constant folding runs at this level, directly after
//! lowering from HIR.

use crate::field::FieldElement;
use crate::schema::{ColumnId, Evaluable, Testable};
use crate::trace::Trace;
use crate::util::Bounds;
use std::collections::BTreeSet;

/// A schema at the MIR level
pub type Schema = crate::schema::Schema<Expr>;

/// An MIR expression
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

    /// Collapse constant sub-expressions to single constants.
    ///
    /// `Add` and `Mul` fold all-constant argument lists; `Mul` also
    /// short-circuits to zero when any argument folds to zero; `Sub`
    /// folds when every argument is constant; `Exp` folds a constant
    /// base by repeated squaring; `Normalise` of a constant becomes 0
    /// or 1.
    pub fn fold(self) -> Expr {
        match self {
            Expr::Const(_) | Expr::ColumnAccess { .. } => self,
            Expr::Add(args) => fold_add(args),
            Expr::Sub(args) => fold_sub(args),
            Expr::Mul(args) => fold_mul(args),
            Expr::Exp(arg, pow) => fold_exp(*arg, pow),
            Expr::Normalise(arg) => fold_normalise(*arg),
        }
    }

    fn as_const(&self) -> Option<FieldElement> {
        match self {
            Expr::Const(c) => Some(*c),
            _ => None,
        }
    }
}

fn fold_add(args: Vec<Expr>) -> Expr {
    let folded: Vec<Expr> = args.into_iter().map(Expr::fold).collect();
    let mut sum = Some(FieldElement::zero());
    for arg in &folded {
        sum = match (sum, arg.as_const()) {
            (Some(s), Some(c)) => Some(s + c),
            _ => None,
        };
    }
    match sum {
        Some(s) => Expr::Const(s),
        None => Expr::Add(folded),
    }
}

fn fold_sub(args: Vec<Expr>) -> Expr {
    let folded: Vec<Expr> = args.into_iter().map(Expr::fold).collect();
    let mut acc: Option<FieldElement> = None;
    for (i, arg) in folded.iter().enumerate() {
        acc = match (acc, arg.as_const()) {
            (None, Some(c)) if i == 0 => Some(c),
            (Some(a), Some(c)) => Some(a - c),
            _ => None,
        };
        if acc.is_none() {
            break;
        }
    }
    match acc {
        Some(a) => Expr::Const(a),
        None => Expr::Sub(folded),
    }
}

fn fold_mul(args: Vec<Expr>) -> Expr {
    let folded: Vec<Expr> = args.into_iter().map(Expr::fold).collect();
    let mut prod = Some(FieldElement::one());
    for arg in &folded {
        match arg.as_const() {
            Some(c) if c.is_zero() => {
                // Whatever the other factors, the product is zero.
                return Expr::Const(FieldElement::zero());
            }
            Some(c) => {
                prod = prod.map(|p| p * c);
            }
            None => prod = None,
        }
    }
    match prod {
        Some(p) => Expr::Const(p),
        None => Expr::Mul(folded),
    }
}

fn fold_exp(arg: Expr, pow: u64) -> Expr {
    let arg = arg.fold();
    match arg.as_const() {
        Some(c) => Expr::Const(c.pow(pow)),
        None => Expr::Exp(Box::new(arg), pow),
    }
}

fn fold_normalise(arg: Expr) -> Expr {
    let arg = arg.fold();
    match arg.as_const() {
        Some(c) if c.is_zero() => Expr::Const(FieldElement::zero()),
        Some(_) => Expr::Const(FieldElement::one()),
        None => Expr::Normalise(Box::new(arg)),
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
            Expr::Exp(arg, _) | Expr::Normalise(arg) => bounds.union(arg.bounds()),
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
            Expr::Exp(arg, _) | Expr::Normalise(arg) => arg.collect_columns(out),
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
