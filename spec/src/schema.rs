//! The schema model: modules, columns, assignments and constraints.
//!
//! One generic `Schema<E>` serves all three IR levels; the expression
//! type is the only thing that changes as the program is lowered.

use crate::error::{Result, SchemaError};
use crate::field::FieldElement;
use crate::trace::Trace;
use crate::types::ColumnType;
use crate::util::Bounds;
use std::collections::BTreeSet;

/// Index of a module within a schema
pub type ModuleId = usize;

/// Index of a column within a schema.
///
/// Ids are allocated inputs-first, then each assignment's output
/// columns in declaration order; aligned traces store their columns in
/// the same order, so an id indexes both tables directly.
pub type ColumnId = usize;

/// An evaluation context: the module an expression ranges over,
/// together with the length multiplier of the columns it touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Context {
    /// Enclosing module
    pub module: ModuleId,
    /// Length multiplier shared by every column in the context
    pub multiplier: usize,
}

impl Context {
    /// Construct a context
    pub fn new(module: ModuleId, multiplier: usize) -> Self {
        Context { module, multiplier }
    }

    /// Join two contexts; `None` signals a conflict
    pub fn join(self, other: Context) -> Option<Context> {
        if self == other {
            Some(self)
        } else {
            None
        }
    }
}

/// A named module (namespace with an observable height)
#[derive(Debug, Clone)]
pub struct Module {
    name: String,
}

impl Module {
    /// Module name; the prelude is the empty string
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A column declaration: context, name and declared type
#[derive(Debug, Clone)]
pub struct Column {
    /// Evaluation context of the column
    pub context: Context,
    /// Unqualified name
    pub name: String,
    /// Declared type
    pub ty: ColumnType,
}

impl Column {
    /// Construct a column
    pub fn new(context: Context, name: impl Into<String>, ty: ColumnType) -> Self {
        Column {
            context,
            name: name.into(),
            ty,
        }
    }
}

/// An expression that produces one field value per row.
///
/// `eval_at` returns `None` for rows where a shifted access falls
/// outside the trace; the checker turns that into a skipped row.
pub trait Evaluable: Clone {
    /// Evaluate at the given row of an (expanded) trace
    fn eval_at(&self, row: isize, trace: &Trace) -> Option<FieldElement>;

    /// The shift window touched by this expression
    fn bounds(&self) -> Bounds;

    /// Collect the columns this expression reads
    fn collect_columns(&self, out: &mut BTreeSet<ColumnId>);

    /// Render as an S-expression using the given qualified column names
    fn lisp(&self, names: &[String]) -> String;
}

/// An expression that can be tested for vanishing at a row.
///
/// This is separate from [`Evaluable`] because HIR constraint bodies
/// may be list-valued: the test covers every value in the list, while
/// `eval_at` is strictly single-valued.
pub trait Testable: Clone {
    /// Whether the expression vanishes at the given row; `None` means
    /// the row is out of the expression's defined window
    fn test_zero_at(&self, row: isize, trace: &Trace) -> Option<bool>;
}

/// A rule computing one or more columns from already-populated ones
#[derive(Debug, Clone)]
pub enum Assignment<E> {
    /// Target is the row-wise interleaving of the sources
    Interleaving {
        /// The computed column
        target: Column,
        /// Source columns, all sharing one context
        sources: Vec<ColumnId>,
    },
    /// Targets are a sorted permutation of the sources. The target
    /// data is supplied with the trace and verified; the expander
    /// never sorts anything.
    SortedPermutation {
        /// Handle used in failure reports
        handle: String,
        /// The permuted columns
        targets: Vec<Column>,
        /// Sort direction per column; `true` is ascending
        signs: Vec<bool>,
        /// Source columns
        sources: Vec<ColumnId>,
    },
    /// Target row `r` is `inverse(expr(r))`, with `inverse(0) = 0`.
    /// This is the computed-column kind introduced when lowering
    /// normalisation to AIR.
    Inverse {
        /// The computed column
        target: Column,
        /// Expression whose inverse is stored
        expr: E,
    },
    /// Targets are the little-endian base-256 digits of the source
    /// expression, introduced when lowering range constraints to AIR
    ByteDecomposition {
        /// Handle used in failure reports
        handle: String,
        /// Expression being decomposed
        expr: E,
        /// One column per byte, least significant first
        targets: Vec<Column>,
    },
}

impl<E> Assignment<E> {
    /// The columns this assignment declares
    pub fn columns(&self) -> &[Column] {
        match self {
            Assignment::Interleaving { target, .. } => std::slice::from_ref(target),
            Assignment::SortedPermutation { targets, .. } => targets,
            Assignment::Inverse { target, .. } => std::slice::from_ref(target),
            Assignment::ByteDecomposition { targets, .. } => targets,
        }
    }

    /// Whether the assignment's outputs are supplied with the trace
    /// rather than computed during expansion
    pub fn is_user_supplied(&self) -> bool {
        matches!(self, Assignment::SortedPermutation { .. })
    }
}

impl<E: Evaluable> Assignment<E> {
    /// Front rows of slack this assignment needs for shifted reads
    pub fn required_spillage(&self) -> usize {
        match self {
            Assignment::Inverse { expr, .. } => expr.bounds().start,
            Assignment::ByteDecomposition { expr, .. } => expr.bounds().start,
            _ => 0,
        }
    }
}

/// A constraint enforced when checking traces
#[derive(Debug, Clone)]
pub enum Constraint<E> {
    /// Body must evaluate to zero on every row of the domain
    Vanishing(VanishingConstraint<E>),
    /// Source tuples must be a subset of target tuples
    Lookup(LookupConstraint<E>),
    /// Column values must satisfy the type predicate
    Type(TypeConstraint),
    /// Expression values must lie below a bound; compiled away by AIR
    /// lowering
    Range(RangeConstraint<E>),
}

/// A vanishing constraint with an optional row domain.
///
/// `domain` of `None` applies to every row; `Some(0)` to the first
/// row, `Some(-1)` to the last, and any other value to that specific
/// row (negative counting from the module's end).
#[derive(Debug, Clone)]
pub struct VanishingConstraint<E> {
    /// Identifier used in failure reports
    pub handle: String,
    /// Evaluation context
    pub context: Context,
    /// Row domain
    pub domain: Option<isize>,
    /// Expression which must vanish
    pub body: E,
}

/// A lookup constraint between two (possibly distinct) contexts
#[derive(Debug, Clone)]
pub struct LookupConstraint<E> {
    /// Identifier used in failure reports
    pub handle: String,
    /// Context of the source expressions
    pub source_context: Context,
    /// Context of the target expressions
    pub target_context: Context,
    /// Source tuple, one expression per position
    pub sources: Vec<E>,
    /// Target tuple, one expression per position
    pub targets: Vec<E>,
}

/// A type constraint on a single column
#[derive(Debug, Clone)]
pub struct TypeConstraint {
    /// The constrained column
    pub column: ColumnId,
    /// Required type
    pub ty: ColumnType,
}

/// A range constraint `0 <= expr < bound` over an expression
#[derive(Debug, Clone)]
pub struct RangeConstraint<E> {
    /// Identifier used in failure reports
    pub handle: String,
    /// Evaluation context
    pub context: Context,
    /// Constrained expression
    pub expr: E,
    /// Exclusive upper bound (a power of two)
    pub bound: u64,
}

/// A property expected (but never enforced) to hold on valid traces
#[derive(Debug, Clone)]
pub struct PropertyAssertion<E> {
    /// Identifier used in reports
    pub handle: String,
    /// Evaluation context
    pub context: Context,
    /// Expression which should vanish
    pub body: E,
}

/// A complete constraint set at one IR level
#[derive(Debug, Clone)]
pub struct Schema<E> {
    modules: Vec<Module>,
    inputs: Vec<Column>,
    assignments: Vec<Assignment<E>>,
    constraints: Vec<Constraint<E>>,
    assertions: Vec<PropertyAssertion<E>>,
}

impl<E> Default for Schema<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Schema<E> {
    /// An empty schema containing only the implicit prelude module
    pub fn new() -> Self {
        Schema {
            modules: vec![Module {
                name: String::new(),
            }],
            inputs: Vec::new(),
            assignments: Vec::new(),
            constraints: Vec::new(),
            assertions: Vec::new(),
        }
    }

    /// Add a module, returning its index. Module names are unique;
    /// the empty name is the prelude registered at construction.
    pub fn add_module(&mut self, name: impl Into<String>) -> Result<ModuleId> {
        let name = name.into();
        if self.modules.iter().any(|m| m.name == name) {
            return Err(SchemaError::DuplicateModule(name));
        }
        self.modules.push(Module { name });
        Ok(self.modules.len() - 1)
    }

    /// Add a user-supplied input column
    pub fn add_data_column(
        &mut self,
        context: Context,
        name: impl Into<String>,
        ty: ColumnType,
    ) -> Result<ColumnId> {
        // Input ids precede assignment outputs, so inputs may only be
        // declared while no assignment exists yet.
        assert!(
            self.assignments.is_empty(),
            "input column declared after an assignment"
        );
        let column = Column::new(context, name, ty);
        self.check_fresh(&column)?;
        self.inputs.push(column);
        Ok(self.inputs.len() - 1)
    }

    /// Add an assignment, allocating contiguous ids for its outputs.
    /// Returns the id of the first output column.
    pub fn add_assignment(&mut self, assignment: Assignment<E>) -> Result<ColumnId> {
        match &assignment {
            Assignment::Interleaving { target, sources } => {
                if sources.is_empty() {
                    return Err(SchemaError::EmptyInterleaving {
                        handle: target.name.clone(),
                    });
                }
            }
            Assignment::SortedPermutation {
                handle,
                targets,
                signs,
                sources,
            } => {
                if targets.len() != sources.len() || signs.len() != sources.len() {
                    return Err(SchemaError::PermutationArity {
                        handle: handle.clone(),
                    });
                }
            }
            _ => {}
        }
        for column in assignment.columns() {
            self.check_fresh(column)?;
        }
        let base = self.column_count();
        self.assignments.push(assignment);
        Ok(base)
    }

    /// Add a vanishing constraint
    pub fn add_vanishing(
        &mut self,
        handle: impl Into<String>,
        context: Context,
        domain: Option<isize>,
        body: E,
    ) -> Result<()> {
        if context.module >= self.modules.len() {
            return Err(SchemaError::InvalidModule(context.module));
        }
        self.constraints
            .push(Constraint::Vanishing(VanishingConstraint {
                handle: handle.into(),
                context,
                domain,
                body,
            }));
        Ok(())
    }

    /// Add a lookup constraint; source and target tuples must have
    /// equal width
    pub fn add_lookup(
        &mut self,
        handle: impl Into<String>,
        source_context: Context,
        target_context: Context,
        sources: Vec<E>,
        targets: Vec<E>,
    ) -> Result<()> {
        let handle = handle.into();
        if sources.len() != targets.len() {
            return Err(SchemaError::LookupArity {
                handle,
                sources: sources.len(),
                targets: targets.len(),
            });
        }
        self.constraints.push(Constraint::Lookup(LookupConstraint {
            handle,
            source_context,
            target_context,
            sources,
            targets,
        }));
        Ok(())
    }

    /// Add a type constraint; a no-op for the field type, which every
    /// value satisfies
    pub fn add_type_constraint(&mut self, column: ColumnId, ty: ColumnType) {
        if !ty.is_field() {
            self.constraints
                .push(Constraint::Type(TypeConstraint { column, ty }));
        }
    }

    /// Add a range constraint over an expression
    pub fn add_range(
        &mut self,
        handle: impl Into<String>,
        context: Context,
        expr: E,
        bound: u64,
    ) -> Result<()> {
        if context.module >= self.modules.len() {
            return Err(SchemaError::InvalidModule(context.module));
        }
        self.constraints.push(Constraint::Range(RangeConstraint {
            handle: handle.into(),
            context,
            expr,
            bound,
        }));
        Ok(())
    }

    /// Add a property assertion
    pub fn add_property_assertion(
        &mut self,
        handle: impl Into<String>,
        context: Context,
        body: E,
    ) {
        self.assertions.push(PropertyAssertion {
            handle: handle.into(),
            context,
            body,
        });
    }

    /// The declared modules, prelude first
    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    /// The input column declarations
    pub fn inputs(&self) -> &[Column] {
        &self.inputs
    }

    /// The assignments, in declaration order
    pub fn assignments(&self) -> &[Assignment<E>] {
        &self.assignments
    }

    /// The constraints, in declaration order
    pub fn constraints(&self) -> &[Constraint<E>] {
        &self.constraints
    }

    /// The property assertions
    pub fn assertions(&self) -> &[PropertyAssertion<E>] {
        &self.assertions
    }

    /// Number of input columns
    pub fn input_count(&self) -> usize {
        self.inputs.len()
    }

    /// Total number of columns (inputs plus assignment outputs)
    pub fn column_count(&self) -> usize {
        self.inputs.len()
            + self
                .assignments
                .iter()
                .map(|a| a.columns().len())
                .sum::<usize>()
    }

    /// All columns in id order
    pub fn columns(&self) -> impl Iterator<Item = &Column> {
        self.inputs
            .iter()
            .chain(self.assignments.iter().flat_map(|a| a.columns().iter()))
    }

    /// Column by id; ids come from this schema, so a miss is a bug
    pub fn column(&self, id: ColumnId) -> &Column {
        self.columns().nth(id).expect("column id out of range")
    }

    /// Find a column id by module and name
    pub fn column_of(&self, module: ModuleId, name: &str) -> Option<ColumnId> {
        self.columns()
            .position(|c| c.context.module == module && c.name == name)
    }

    /// Qualified `module.column` name of a column
    pub fn qualified_name(&self, id: ColumnId) -> String {
        let col = self.column(id);
        let module = self.modules[col.context.module].name();
        if module.is_empty() {
            col.name.clone()
        } else {
            format!("{}.{}", module, col.name)
        }
    }

    /// Qualified names of every column, in id order
    pub fn column_names(&self) -> Vec<String> {
        (0..self.column_count())
            .map(|id| self.qualified_name(id))
            .collect()
    }

    /// Ids of the columns a trace must supply before expansion: the
    /// inputs plus the outputs of user-supplied assignments
    pub fn user_columns(&self) -> Vec<ColumnId> {
        let mut ids: Vec<ColumnId> = (0..self.inputs.len()).collect();
        let mut next = self.inputs.len();
        for a in &self.assignments {
            let n = a.columns().len();
            if a.is_user_supplied() {
                ids.extend(next..next + n);
            }
            next += n;
        }
        ids
    }

    fn check_fresh(&self, column: &Column) -> Result<()> {
        if column.context.module >= self.modules.len() {
            return Err(SchemaError::InvalidModule(column.context.module));
        }
        if self
            .column_of(column.context.module, &column.name)
            .is_some()
        {
            let module = self.modules[column.context.module].name();
            let qualified = if module.is_empty() {
                column.name.clone()
            } else {
                format!("{}.{}", module, column.name)
            };
            return Err(SchemaError::DuplicateColumn(qualified));
        }
        Ok(())
    }
}

impl<E: Evaluable> Schema<E> {
    /// Minimum spillage ensuring assignments can perform their
    /// shifted reads: at least one row, the "initial padding row"
    pub fn required_spillage(&self) -> usize {
        self.assignments
            .iter()
            .map(|a| a.required_spillage())
            .fold(1, usize::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hir;

    fn ctx() -> Context {
        Context::new(0, 1)
    }

    #[test]
    fn test_new_schema_has_prelude() {
        let schema: Schema<hir::Expr> = Schema::new();
        assert_eq!(schema.modules().len(), 1);
        assert_eq!(schema.modules()[0].name(), "");
    }

    #[test]
    fn test_duplicate_module_rejected() {
        let mut schema: Schema<hir::Expr> = Schema::new();
        schema.add_module("m1").unwrap();
        assert!(matches!(
            schema.add_module("m1"),
            Err(SchemaError::DuplicateModule(_))
        ));
    }

    #[test]
    fn test_column_ids_are_declaration_order() {
        let mut schema: Schema<hir::Expr> = Schema::new();
        let x = schema
            .add_data_column(ctx(), "X", ColumnType::Field)
            .unwrap();
        let y = schema
            .add_data_column(ctx(), "Y", ColumnType::Field)
            .unwrap();
        assert_eq!((x, y), (0, 1));

        let z = schema
            .add_assignment(Assignment::Interleaving {
                target: Column::new(Context::new(0, 2), "Z", ColumnType::Field),
                sources: vec![x, y],
            })
            .unwrap();
        assert_eq!(z, 2);
        assert_eq!(schema.column_count(), 3);
        assert_eq!(schema.column(2).name, "Z");
    }

    #[test]
    fn test_duplicate_column_rejected() {
        let mut schema: Schema<hir::Expr> = Schema::new();
        schema
            .add_data_column(ctx(), "X", ColumnType::Field)
            .unwrap();
        assert!(matches!(
            schema.add_data_column(ctx(), "X", ColumnType::Field),
            Err(SchemaError::DuplicateColumn(_))
        ));
    }

    #[test]
    fn test_same_name_in_distinct_modules_ok() {
        let mut schema: Schema<hir::Expr> = Schema::new();
        let m1 = schema.add_module("m1").unwrap();
        schema
            .add_data_column(ctx(), "X", ColumnType::Field)
            .unwrap();
        schema
            .add_data_column(Context::new(m1, 1), "X", ColumnType::Field)
            .unwrap();
        assert_eq!(schema.column_count(), 2);
        assert_eq!(schema.qualified_name(1), "m1.X");
    }

    #[test]
    fn test_lookup_arity_mismatch_is_fatal() {
        let mut schema: Schema<hir::Expr> = Schema::new();
        let x = schema
            .add_data_column(ctx(), "X", ColumnType::Field)
            .unwrap();
        let result = schema.add_lookup(
            "l1",
            ctx(),
            ctx(),
            vec![hir::Expr::column(x)],
            vec![],
        );
        assert!(matches!(result, Err(SchemaError::LookupArity { .. })));
    }

    #[test]
    fn test_field_type_constraint_is_noop() {
        let mut schema: Schema<hir::Expr> = Schema::new();
        let x = schema
            .add_data_column(ctx(), "X", ColumnType::Field)
            .unwrap();
        schema.add_type_constraint(x, ColumnType::Field);
        assert!(schema.constraints().is_empty());
        schema.add_type_constraint(x, ColumnType::uint(8));
        assert_eq!(schema.constraints().len(), 1);
    }

    #[test]
    fn test_user_columns_include_permutation_targets() {
        let mut schema: Schema<hir::Expr> = Schema::new();
        let x = schema
            .add_data_column(ctx(), "X", ColumnType::uint(16))
            .unwrap();
        schema
            .add_assignment(Assignment::SortedPermutation {
                handle: "p".to_string(),
                targets: vec![Column::new(ctx(), "P", ColumnType::uint(16))],
                signs: vec![true],
                sources: vec![x],
            })
            .unwrap();
        schema
            .add_assignment(Assignment::Inverse {
                target: Column::new(ctx(), "inv$2", ColumnType::Field),
                expr: hir::Expr::column(x),
            })
            .unwrap();

        assert_eq!(schema.user_columns(), vec![0, 1]);
    }
}
