//! Source AST for the constraint language.
//!
//! The parser produces a `Circuit`: declarations in the prelude
//! followed by per-module declaration blocks. Declarations report
//! which symbols they define and which they depend on; that is the
//! interface the resolver's fixed point runs over.

use crate::error::Span;
use zkcl_spec::{ColumnType, FieldElement};

/// Root of the AST: prelude declarations plus named modules
#[derive(Debug, Clone, Default)]
pub struct Circuit {
    /// Declarations preceding any `(module ...)` form
    pub declarations: Vec<Declaration>,
    /// Named module blocks, in source order
    pub modules: Vec<ModuleBlock>,
}

/// A `(module name)` block and the declarations that follow it
#[derive(Debug, Clone)]
pub struct ModuleBlock {
    /// Module name
    pub name: String,
    /// Position of the module form
    pub span: Span,
    /// Declarations inside the module
    pub declarations: Vec<Declaration>,
}

/// A reference to a symbol, possibly qualified with a module name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolRef {
    /// Where the reference occurs
    pub span: Span,
    /// Explicit module qualifier, when written `module.name`
    pub module: Option<String>,
    /// Symbol name
    pub name: String,
}

impl SymbolRef {
    /// An unqualified reference
    pub fn local(span: Span, name: impl Into<String>) -> Self {
        SymbolRef {
            span,
            module: None,
            name: name.into(),
        }
    }
}

/// One column inside `defcolumns`, `defperspective` or a
/// `defpermutation` target list
#[derive(Debug, Clone)]
pub struct ColumnDef {
    /// Position of the declaration
    pub span: Span,
    /// Column name
    pub name: String,
    /// Declared type; `None` means the field type (or, for
    /// permutation targets, inherited from the paired source)
    pub ty: Option<ColumnType>,
    /// Length multiplier
    pub multiplier: usize,
}

/// One binding inside `defconst`
#[derive(Debug, Clone)]
pub struct ConstantDef {
    /// Position of the declaration
    pub span: Span,
    /// Constant name
    pub name: String,
    /// Defining expression; must be constant-foldable
    pub value: Expr,
}

/// A `defconstraint` declaration
#[derive(Debug, Clone)]
pub struct ConstraintDef {
    /// Position of the declaration
    pub span: Span,
    /// Constraint handle
    pub handle: String,
    /// Optional `:domain {i}` row restriction
    pub domain: Option<isize>,
    /// Optional `:guard` expression
    pub guard: Option<Expr>,
    /// Optional `:perspective` name
    pub perspective: Option<String>,
    /// Constraint body
    pub body: Expr,
}

/// A `defun` / `defpurefun` declaration
#[derive(Debug, Clone)]
pub struct FunDef {
    /// Position of the declaration
    pub span: Span,
    /// Function name
    pub name: String,
    /// Parameter names
    pub params: Vec<String>,
    /// Function body
    pub body: Expr,
    /// Whether declared with `defpurefun`
    pub pure: bool,
}

/// A top-level declaration
#[derive(Debug, Clone)]
pub enum Declaration {
    /// `defcolumns`
    Columns(Vec<ColumnDef>),
    /// `defconst`
    Constants(Vec<ConstantDef>),
    /// `defconstraint`
    Constraint(ConstraintDef),
    /// `definrange`
    InRange {
        /// Position of the declaration
        span: Span,
        /// Constrained expression
        expr: Expr,
        /// Exclusive bound; must be constant-foldable
        bound: Expr,
    },
    /// `definterleaved`
    Interleaved {
        /// Position of the declaration
        span: Span,
        /// Target column name
        target: String,
        /// Source columns
        sources: Vec<SymbolRef>,
    },
    /// `deflookup`
    Lookup {
        /// Position of the declaration
        span: Span,
        /// Lookup handle
        handle: String,
        /// Target tuple
        targets: Vec<Expr>,
        /// Source tuple
        sources: Vec<Expr>,
    },
    /// `defpermutation`
    Permutation {
        /// Position of the declaration
        span: Span,
        /// Target columns, paired with the sources
        targets: Vec<ColumnDef>,
        /// Sign-directed source columns; `true` sorts ascending
        sources: Vec<(bool, SymbolRef)>,
    },
    /// `defproperty`
    Property {
        /// Position of the declaration
        span: Span,
        /// Assertion handle
        handle: String,
        /// Asserted expression
        body: Expr,
    },
    /// `defun` / `defpurefun`
    Fun(FunDef),
    /// `defalias` / `defunalias`
    Aliases {
        /// Position of the declaration
        span: Span,
        /// Whether these alias functions rather than columns
        functions: bool,
        /// (alias, target) pairs
        aliases: Vec<(String, String)>,
    },
    /// `defperspective`
    Perspective {
        /// Position of the declaration
        span: Span,
        /// Perspective name
        name: String,
        /// Selector expression
        selector: Expr,
        /// Columns active under the selector
        columns: Vec<ColumnDef>,
    },
}

impl Declaration {
    /// The symbols this declaration defines, for duplicate detection
    pub fn defined_symbols(&self) -> Vec<(&str, Span)> {
        match self {
            Declaration::Columns(defs) => {
                defs.iter().map(|d| (d.name.as_str(), d.span)).collect()
            }
            Declaration::Constants(defs) => {
                defs.iter().map(|d| (d.name.as_str(), d.span)).collect()
            }
            Declaration::Interleaved { span, target, .. } => vec![(target.as_str(), *span)],
            Declaration::Permutation { targets, .. } => {
                targets.iter().map(|d| (d.name.as_str(), d.span)).collect()
            }
            Declaration::Fun(def) => vec![(def.name.as_str(), def.span)],
            Declaration::Aliases { aliases, span, .. } => {
                aliases.iter().map(|(a, _)| (a.as_str(), *span)).collect()
            }
            Declaration::Perspective { name, span, columns, .. } => {
                let mut out = vec![(name.as_str(), *span)];
                out.extend(columns.iter().map(|d| (d.name.as_str(), d.span)));
                out
            }
            Declaration::Constraint(_)
            | Declaration::InRange { .. }
            | Declaration::Lookup { .. }
            | Declaration::Property { .. } => Vec::new(),
        }
    }

    /// The symbols this declaration must see finalised before it can
    /// itself be finalised
    pub fn dependencies(&self) -> Vec<SymbolRef> {
        let mut out = Vec::new();
        match self {
            Declaration::Columns(_) => {}
            Declaration::Constants(defs) => {
                for def in defs {
                    def.value.collect_symbols(&mut out);
                }
                // Names bound by this defconst resolve within it,
                // whatever the pair order.
                out.retain(|s| s.module.is_some() || !defs.iter().any(|d| d.name == s.name));
            }
            Declaration::Constraint(def) => {
                if let Some(guard) = &def.guard {
                    guard.collect_symbols(&mut out);
                }
                if let Some(perspective) = &def.perspective {
                    out.push(SymbolRef::local(def.span, perspective.clone()));
                }
                def.body.collect_symbols(&mut out);
            }
            Declaration::InRange { expr, bound, .. } => {
                expr.collect_symbols(&mut out);
                bound.collect_symbols(&mut out);
            }
            Declaration::Interleaved { sources, .. } => out.extend(sources.iter().cloned()),
            Declaration::Lookup {
                targets, sources, ..
            } => {
                for expr in targets.iter().chain(sources) {
                    expr.collect_symbols(&mut out);
                }
            }
            Declaration::Permutation { sources, .. } => {
                out.extend(sources.iter().map(|(_, s)| s.clone()));
            }
            Declaration::Property { body, .. } => body.collect_symbols(&mut out),
            Declaration::Fun(def) => {
                def.body.collect_symbols(&mut out);
                // Parameters are locals, not dependencies.
                out.retain(|s| s.module.is_some() || !def.params.contains(&s.name));
            }
            Declaration::Aliases { span, aliases, .. } => {
                out.extend(
                    aliases
                        .iter()
                        .map(|(_, target)| SymbolRef::local(*span, target.clone())),
                );
            }
            Declaration::Perspective { selector, .. } => selector.collect_symbols(&mut out),
        }
        out
    }

    /// The position of this declaration
    pub fn span(&self) -> Span {
        match self {
            Declaration::Columns(defs) => defs.first().map(|d| d.span).unwrap_or_default(),
            Declaration::Constants(defs) => defs.first().map(|d| d.span).unwrap_or_default(),
            Declaration::Constraint(def) => def.span,
            Declaration::InRange { span, .. }
            | Declaration::Interleaved { span, .. }
            | Declaration::Lookup { span, .. }
            | Declaration::Permutation { span, .. }
            | Declaration::Property { span, .. }
            | Declaration::Aliases { span, .. }
            | Declaration::Perspective { span, .. } => *span,
            Declaration::Fun(def) => def.span,
        }
    }
}

/// A source expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A numeric literal
    Const(Span, FieldElement),
    /// A symbol access with a row shift
    Access(SymbolRef, isize),
    /// `(+ ...)`
    Add(Span, Vec<Expr>),
    /// `(- ...)`
    Sub(Span, Vec<Expr>),
    /// `(* ...)`
    Mul(Span, Vec<Expr>),
    /// `(^ e n)`
    Exp {
        /// Position of the form
        span: Span,
        /// Base expression
        arg: Box<Expr>,
        /// Exponent; must be constant-foldable
        pow: Box<Expr>,
    },
    /// `(~ e)`
    Normalise(Span, Box<Expr>),
    /// `(if c t [e])` / `(ifnot c t)`
    If {
        /// Position of the form
        span: Span,
        /// Tested condition
        condition: Box<Expr>,
        /// Branch enforced when the condition is non-zero
        if_nonzero: Option<Box<Expr>>,
        /// Branch enforced when the condition is zero
        if_zero: Option<Box<Expr>>,
    },
    /// `(begin ...)`
    List(Span, Vec<Expr>),
    /// `(f args...)` where `f` is not a reserved form
    Invoke {
        /// Position of the form
        span: Span,
        /// Invoked function name
        name: String,
        /// Argument expressions
        args: Vec<Expr>,
    },
}

impl Expr {
    /// The position of this expression
    pub fn span(&self) -> Span {
        match self {
            Expr::Const(span, _)
            | Expr::Add(span, _)
            | Expr::Sub(span, _)
            | Expr::Mul(span, _)
            | Expr::Normalise(span, _)
            | Expr::List(span, _) => *span,
            Expr::Access(sym, _) => sym.span,
            Expr::Exp { span, .. } | Expr::If { span, .. } | Expr::Invoke { span, .. } => *span,
        }
    }

    /// Collect every symbol this expression references, including
    /// invoked function names
    pub fn collect_symbols(&self, out: &mut Vec<SymbolRef>) {
        match self {
            Expr::Const(..) => {}
            Expr::Access(sym, _) => out.push(sym.clone()),
            Expr::Add(_, args) | Expr::Sub(_, args) | Expr::Mul(_, args) | Expr::List(_, args) => {
                for arg in args {
                    arg.collect_symbols(out);
                }
            }
            Expr::Exp { arg, pow, .. } => {
                arg.collect_symbols(out);
                pow.collect_symbols(out);
            }
            Expr::Normalise(_, arg) => arg.collect_symbols(out),
            Expr::If {
                condition,
                if_nonzero,
                if_zero,
                ..
            } => {
                condition.collect_symbols(out);
                if let Some(branch) = if_nonzero {
                    branch.collect_symbols(out);
                }
                if let Some(branch) = if_zero {
                    branch.collect_symbols(out);
                }
            }
            Expr::Invoke { span, name, args } => {
                out.push(SymbolRef::local(*span, name.clone()));
                for arg in args {
                    arg.collect_symbols(out);
                }
            }
        }
    }
}
