//! Lowering between the three IR levels.
//!
//! HIR → MIR eliminates conditionals and lists: list-valued
//! constraint bodies are exploded into one constraint per element,
//! and `IfZero` is arithmetised through the normalisation operator.
//! Constant folding runs on every lowered expression.
//!
//! MIR → AIR eliminates normalisation and exponentiation:
//! exponentiation unrolls into products, while each `Normalise(e)`
//! introduces a computed inverse column together with the pair of
//! companion constraints forcing `e × inv_e` to be 0 or 1.

use crate::air;
use crate::error::{Result, SchemaError};
use crate::hir;
use crate::mir;
use crate::schema::{Assignment, Column, Constraint, Context, Schema};
use crate::types::ColumnType;

/// Lower an HIR schema to MIR
pub fn lower_to_mir(schema: &hir::Schema) -> Result<mir::Schema> {
    let mut lowered: mir::Schema = Schema::new();
    for module in &schema.modules()[1..] {
        lowered.add_module(module.name())?;
    }
    for input in schema.inputs() {
        lowered.add_data_column(input.context, input.name.clone(), input.ty)?;
    }
    for assignment in schema.assignments() {
        lowered.add_assignment(lower_assignment(assignment, &lower_unit)?)?;
    }
    for constraint in schema.constraints() {
        match constraint {
            Constraint::Vanishing(c) => {
                // One list-valued body becomes several constraints
                // sharing the handle.
                for part in explode(&c.body) {
                    let body = lower_unit(&part)?.fold();
                    lowered.add_vanishing(c.handle.clone(), c.context, c.domain, body)?;
                }
            }
            Constraint::Lookup(c) => {
                let sources = lower_units(&c.sources)?;
                let targets = lower_units(&c.targets)?;
                lowered.add_lookup(
                    c.handle.clone(),
                    c.source_context,
                    c.target_context,
                    sources,
                    targets,
                )?;
            }
            Constraint::Type(c) => lowered.add_type_constraint(c.column, c.ty),
            Constraint::Range(c) => {
                let expr = lower_unit(&c.expr)?.fold();
                lowered.add_range(c.handle.clone(), c.context, expr, c.bound)?;
            }
        }
    }
    for assertion in schema.assertions() {
        for part in explode(&assertion.body) {
            let body = lower_unit(&part)?.fold();
            lowered.add_property_assertion(assertion.handle.clone(), assertion.context, body);
        }
    }
    Ok(lowered)
}

/// Lower an MIR schema to AIR
pub fn lower_to_air(schema: &mir::Schema) -> Result<air::Schema> {
    let mut lowered: air::Schema = Schema::new();
    for module in &schema.modules()[1..] {
        lowered.add_module(module.name())?;
    }
    for input in schema.inputs() {
        lowered.add_data_column(input.context, input.name.clone(), input.ty)?;
    }
    // Assignments are carried over before any constraint is lowered,
    // so that the ids of pre-existing columns are preserved and fresh
    // inverse/byte columns land strictly after them.
    for assignment in schema.assignments() {
        lowered.add_assignment(lower_assignment(assignment, &strict_air)?)?;
    }
    for constraint in schema.constraints() {
        match constraint {
            Constraint::Vanishing(c) => {
                let body = lower_term(&c.body, &mut lowered, c.context)?;
                lowered.add_vanishing(c.handle.clone(), c.context, c.domain, body)?;
            }
            Constraint::Lookup(c) => {
                let sources = c
                    .sources
                    .iter()
                    .map(|e| lower_term(e, &mut lowered, c.source_context))
                    .collect::<Result<Vec<_>>>()?;
                let targets = c
                    .targets
                    .iter()
                    .map(|e| lower_term(e, &mut lowered, c.target_context))
                    .collect::<Result<Vec<_>>>()?;
                lowered.add_lookup(
                    c.handle.clone(),
                    c.source_context,
                    c.target_context,
                    sources,
                    targets,
                )?;
            }
            Constraint::Type(c) => lowered.add_type_constraint(c.column, c.ty),
            Constraint::Range(c) => lower_range(c, &mut lowered)?,
        }
    }
    // Property assertions are design hints for humans; the AIR level
    // exists for prover backends, so they stop here rather than
    // acquire inverse columns of their own.
    Ok(lowered)
}

// ============================================================================
// HIR → MIR
// ============================================================================

/// Split a constraint-level body into its individual constraints,
/// distributing `if` conditions over list-valued branches
fn explode(expr: &hir::Expr) -> Vec<hir::Expr> {
    match expr {
        hir::Expr::List(args) => args.iter().flat_map(explode).collect(),
        hir::Expr::IfZero {
            condition,
            if_zero,
            if_nonzero,
        } if branch_has_list(if_zero) || branch_has_list(if_nonzero) => {
            let mut out = Vec::new();
            if let Some(branch) = if_zero {
                for part in explode(branch) {
                    out.push(hir::Expr::IfZero {
                        condition: condition.clone(),
                        if_zero: Some(Box::new(part)),
                        if_nonzero: None,
                    });
                }
            }
            if let Some(branch) = if_nonzero {
                for part in explode(branch) {
                    out.push(hir::Expr::IfZero {
                        condition: condition.clone(),
                        if_zero: None,
                        if_nonzero: Some(Box::new(part)),
                    });
                }
            }
            out
        }
        _ => vec![expr.clone()],
    }
}

fn branch_has_list(branch: &Option<Box<hir::Expr>>) -> bool {
    match branch {
        None => false,
        Some(expr) => has_list_value(expr),
    }
}

/// Whether an expression produces multiple values at the top level
fn has_list_value(expr: &hir::Expr) -> bool {
    match expr {
        hir::Expr::List(_) => true,
        hir::Expr::IfZero {
            if_zero,
            if_nonzero,
            ..
        } => branch_has_list(if_zero) || branch_has_list(if_nonzero),
        _ => false,
    }
}

fn lower_units(exprs: &[hir::Expr]) -> Result<Vec<mir::Expr>> {
    exprs.iter().map(|e| Ok(lower_unit(e)?.fold())).collect()
}

/// Lower a single-valued HIR expression to MIR
fn lower_unit(expr: &hir::Expr) -> Result<mir::Expr> {
    match expr {
        hir::Expr::Const(c) => Ok(mir::Expr::Const(*c)),
        hir::Expr::ColumnAccess { column, shift } => Ok(mir::Expr::ColumnAccess {
            column: *column,
            shift: *shift,
        }),
        hir::Expr::Add(args) => Ok(mir::Expr::Add(lower_args(args)?)),
        hir::Expr::Sub(args) => Ok(mir::Expr::Sub(lower_args(args)?)),
        hir::Expr::Mul(args) => Ok(mir::Expr::Mul(lower_args(args)?)),
        hir::Expr::Exp(arg, pow) => Ok(mir::Expr::Exp(Box::new(lower_unit(arg)?), *pow)),
        hir::Expr::Normalise(arg) => Ok(mir::Expr::Normalise(Box::new(lower_unit(arg)?))),
        hir::Expr::IfZero {
            condition,
            if_zero,
            if_nonzero,
        } => {
            let norm = mir::Expr::Normalise(Box::new(lower_unit(condition)?));
            let one_minus_norm = mir::Expr::Sub(vec![mir::Expr::constant(1), norm.clone()]);
            match (if_zero, if_nonzero) {
                // (1 - ~c)·z + ~c·n
                (Some(z), Some(n)) => Ok(mir::Expr::Add(vec![
                    mir::Expr::Mul(vec![one_minus_norm, lower_unit(z)?]),
                    mir::Expr::Mul(vec![norm, lower_unit(n)?]),
                ])),
                (Some(z), None) => Ok(mir::Expr::Mul(vec![one_minus_norm, lower_unit(z)?])),
                (None, Some(n)) => Ok(mir::Expr::Mul(vec![norm, lower_unit(n)?])),
                (None, None) => unreachable!("if-zero with no branch"),
            }
        }
        hir::Expr::List(_) => Err(SchemaError::ListInUnitContext),
    }
}

fn lower_args(args: &[hir::Expr]) -> Result<Vec<mir::Expr>> {
    args.iter().map(lower_unit).collect()
}

fn lower_assignment<A, B, F>(assignment: &Assignment<A>, lower: &F) -> Result<Assignment<B>>
where
    F: Fn(&A) -> Result<B>,
{
    Ok(match assignment {
        Assignment::Interleaving { target, sources } => Assignment::Interleaving {
            target: target.clone(),
            sources: sources.clone(),
        },
        Assignment::SortedPermutation {
            handle,
            targets,
            signs,
            sources,
        } => Assignment::SortedPermutation {
            handle: handle.clone(),
            targets: targets.clone(),
            signs: signs.clone(),
            sources: sources.clone(),
        },
        Assignment::Inverse { target, expr } => Assignment::Inverse {
            target: target.clone(),
            expr: lower(expr)?,
        },
        Assignment::ByteDecomposition {
            handle,
            expr,
            targets,
        } => Assignment::ByteDecomposition {
            handle: handle.clone(),
            expr: lower(expr)?,
            targets: targets.clone(),
        },
    })
}

// ============================================================================
// MIR → AIR
// ============================================================================

/// Convert an already-polynomial MIR expression; assignment
/// expressions never contain normalisation or exponentiation
fn strict_air(expr: &mir::Expr) -> Result<air::Expr> {
    match expr {
        mir::Expr::Const(c) => Ok(air::Expr::Const(*c)),
        mir::Expr::ColumnAccess { column, shift } => Ok(air::Expr::ColumnAccess {
            column: *column,
            shift: *shift,
        }),
        mir::Expr::Add(args) => Ok(air::Expr::Add(strict_args(args)?)),
        mir::Expr::Sub(args) => Ok(air::Expr::Sub(strict_args(args)?)),
        mir::Expr::Mul(args) => Ok(air::Expr::Mul(strict_args(args)?)),
        mir::Expr::Exp(..) | mir::Expr::Normalise(..) => {
            Err(SchemaError::NonPolynomialAssignment)
        }
    }
}

fn strict_args(args: &[mir::Expr]) -> Result<Vec<air::Expr>> {
    args.iter().map(strict_air).collect()
}

/// Lower an MIR term to AIR, introducing computed columns as needed
fn lower_term(expr: &mir::Expr, schema: &mut air::Schema, ctx: Context) -> Result<air::Expr> {
    match expr {
        mir::Expr::Const(c) => Ok(air::Expr::Const(*c)),
        mir::Expr::ColumnAccess { column, shift } => Ok(air::Expr::ColumnAccess {
            column: *column,
            shift: *shift,
        }),
        mir::Expr::Add(args) => Ok(air::Expr::Add(lower_terms(args, schema, ctx)?)),
        mir::Expr::Sub(args) => Ok(air::Expr::Sub(lower_terms(args, schema, ctx)?)),
        mir::Expr::Mul(args) => Ok(air::Expr::Mul(lower_terms(args, schema, ctx)?)),
        mir::Expr::Exp(arg, pow) => {
            let base = lower_term(arg, schema, ctx)?;
            Ok(expand_pow(&base, *pow))
        }
        mir::Expr::Normalise(arg) => {
            let arg = lower_term(arg, schema, ctx)?;
            let inv = eliminate_normalise(&arg, schema, ctx)?;
            Ok(air::Expr::Mul(vec![arg, inv]))
        }
    }
}

fn lower_terms(
    args: &[mir::Expr],
    schema: &mut air::Schema,
    ctx: Context,
) -> Result<Vec<air::Expr>> {
    args.iter().map(|a| lower_term(a, schema, ctx)).collect()
}

/// Unroll exponentiation by repeated squaring
fn expand_pow(base: &air::Expr, pow: u64) -> air::Expr {
    match pow {
        0 => air::Expr::constant(1),
        1 => base.clone(),
        p if p % 2 == 0 => {
            let half = expand_pow(base, p / 2);
            air::Expr::Mul(vec![half.clone(), half])
        }
        p => air::Expr::Mul(vec![base.clone(), expand_pow(base, p - 1)]),
    }
}

/// Allocate an inverse column for `e` and emit the companion
/// constraints making `e × inv_e` a well-formed normalisation:
///
///   e × (1 − e × inv_e) = 0       inv_e inverts e when e ≠ 0
///   inv_e × (1 − e × inv_e) = 0   e inverts inv_e when inv_e ≠ 0
///
/// Returns the access to the fresh column.
fn eliminate_normalise(
    expr: &air::Expr,
    schema: &mut air::Schema,
    ctx: Context,
) -> Result<air::Expr> {
    let name = format!("inv${}", schema.column_count());
    let target = Column::new(ctx, name.clone(), ColumnType::Field);
    let id = schema.add_assignment(Assignment::Inverse {
        target,
        expr: expr.clone(),
    })?;
    let inv = air::Expr::column(id);
    let residue = air::Expr::Sub(vec![
        air::Expr::constant(1),
        air::Expr::Mul(vec![expr.clone(), inv.clone()]),
    ]);
    schema.add_vanishing(
        name.clone(),
        ctx,
        None,
        air::Expr::Mul(vec![expr.clone(), residue.clone()]),
    )?;
    schema.add_vanishing(name, ctx, None, air::Expr::Mul(vec![inv.clone(), residue]))?;
    Ok(inv)
}

/// Compile a range constraint into a byte decomposition: fresh byte
/// columns, their type constraints, and the recomposition identity
fn lower_range(
    constraint: &crate::schema::RangeConstraint<mir::Expr>,
    schema: &mut air::Schema,
) -> Result<()> {
    if !constraint.bound.is_power_of_two() {
        return Err(SchemaError::NonPowerOfTwoBound(constraint.bound));
    }
    let expr = lower_term(&constraint.expr, schema, constraint.context)?;
    let k = constraint.bound.trailing_zeros();
    if k == 0 {
        // Bound of 1 admits only zero.
        return schema.add_vanishing(constraint.handle.clone(), constraint.context, None, expr);
    }
    let nbytes = k.div_ceil(8);
    let mut targets = Vec::with_capacity(nbytes as usize);
    for i in 0..nbytes {
        let bits = if i == nbytes - 1 && k % 8 != 0 { k % 8 } else { 8 };
        targets.push(Column::new(
            constraint.context,
            format!("{}$byte{}", constraint.handle, i),
            ColumnType::uint(bits),
        ));
    }
    let types: Vec<ColumnType> = targets.iter().map(|c| c.ty).collect();
    let base = schema.add_assignment(Assignment::ByteDecomposition {
        handle: constraint.handle.clone(),
        expr: expr.clone(),
        targets,
    })?;
    for (i, ty) in types.into_iter().enumerate() {
        schema.add_type_constraint(base + i, ty);
    }
    // e = Σ b_i · 256^i
    let mut terms = Vec::with_capacity(nbytes as usize);
    for i in 0..nbytes {
        let access = air::Expr::column(base + i as usize);
        if i == 0 {
            terms.push(access);
        } else {
            terms.push(air::Expr::Mul(vec![
                air::Expr::constant(256u64.pow(i)),
                access,
            ]));
        }
    }
    schema.add_vanishing(
        constraint.handle.clone(),
        constraint.context,
        None,
        air::Expr::Sub(vec![expr, air::Expr::Add(terms)]),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldElement;
    use crate::schema::{Evaluable, Testable};
    use crate::trace::{Trace, TraceColumn};

    fn ctx() -> Context {
        Context::new(0, 1)
    }

    fn schema_with_columns(n: usize) -> hir::Schema {
        let mut schema = hir::Schema::new();
        for i in 0..n {
            schema
                .add_data_column(ctx(), format!("c{}", i), ColumnType::Field)
                .unwrap();
        }
        schema
    }

    fn trace_of(columns: &[&[u64]]) -> Trace {
        let mut tr = Trace::new(vec![String::new()]);
        let mut height = 0;
        for (i, data) in columns.iter().enumerate() {
            height = data.len();
            tr.push_column(TraceColumn::populated(
                ctx(),
                format!("c{}", i),
                data.iter().map(|v| FieldElement::new(*v)).collect(),
            ));
        }
        tr.set_height(0, height);
        tr
    }

    #[test]
    fn test_list_body_explodes_into_constraints() {
        let mut schema = schema_with_columns(2);
        let body = hir::Expr::List(vec![hir::Expr::column(0), hir::Expr::column(1)]);
        schema.add_vanishing("both", ctx(), None, body).unwrap();

        let mir = lower_to_mir(&schema).unwrap();
        let vanishing: Vec<_> = mir
            .constraints()
            .iter()
            .filter_map(|c| match c {
                Constraint::Vanishing(v) => Some(v),
                _ => None,
            })
            .collect();
        assert_eq!(vanishing.len(), 2);
        assert!(vanishing.iter().all(|v| v.handle == "both"));
    }

    #[test]
    fn test_if_with_list_branch_distributes() {
        let mut schema = schema_with_columns(3);
        let body = hir::Expr::IfZero {
            condition: Box::new(hir::Expr::column(0)),
            if_zero: None,
            if_nonzero: Some(Box::new(hir::Expr::List(vec![
                hir::Expr::column(1),
                hir::Expr::column(2),
            ]))),
        };
        schema.add_vanishing("c", ctx(), None, body).unwrap();

        let mir = lower_to_mir(&schema).unwrap();
        assert_eq!(mir.constraints().len(), 2);
    }

    #[test]
    fn test_if_zero_lowering_matches_hir_semantics() {
        let mut schema = schema_with_columns(3);
        let body = hir::Expr::IfZero {
            condition: Box::new(hir::Expr::column(0)),
            if_zero: Some(Box::new(hir::Expr::column(1))),
            if_nonzero: Some(Box::new(hir::Expr::column(2))),
        };
        schema.add_vanishing("c", ctx(), None, body.clone()).unwrap();
        let mir = lower_to_mir(&schema).unwrap();
        let lowered = match &mir.constraints()[0] {
            Constraint::Vanishing(v) => v.body.clone(),
            _ => unreachable!(),
        };

        // Rows exercising both sides of the condition, zero and
        // non-zero branch values.
        let tr = trace_of(&[&[0, 0, 3, 3], &[0, 5, 0, 9], &[0, 7, 0, 0]]);
        for row in 0..4 {
            assert_eq!(
                Testable::test_zero_at(&body, row, &tr),
                lowered.eval_at(row, &tr).map(|v| v.is_zero()),
                "row {}",
                row
            );
        }
    }

    #[test]
    fn test_lowered_expressions_are_folded() {
        let mut schema = schema_with_columns(1);
        let body = hir::Expr::Mul(vec![
            hir::Expr::column(0),
            hir::Expr::Add(vec![hir::Expr::constant(2), hir::Expr::constant(3)]),
        ]);
        schema.add_vanishing("c", ctx(), None, body).unwrap();
        let mir = lower_to_mir(&schema).unwrap();
        match &mir.constraints()[0] {
            Constraint::Vanishing(v) => assert_eq!(
                v.body,
                mir::Expr::Mul(vec![mir::Expr::column(0), mir::Expr::constant(5)])
            ),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_normalise_elimination_adds_inverse_column() {
        let mut schema = schema_with_columns(1);
        schema
            .add_vanishing(
                "c",
                ctx(),
                None,
                hir::Expr::Normalise(Box::new(hir::Expr::column(0))),
            )
            .unwrap();
        let air = lower_to_air(&lower_to_mir(&schema).unwrap()).unwrap();

        // One fresh column, named outside the user namespace.
        assert_eq!(air.column_count(), 2);
        assert_eq!(air.column(1).name, "inv$1");
        assert!(matches!(
            air.assignments()[0],
            Assignment::Inverse { .. }
        ));
        // Original constraint plus the two companion constraints.
        assert_eq!(air.constraints().len(), 3);
    }

    #[test]
    fn test_exp_unrolls_without_new_columns() {
        let mut schema = schema_with_columns(1);
        schema
            .add_vanishing(
                "c",
                ctx(),
                None,
                hir::Expr::Exp(Box::new(hir::Expr::column(0)), 5),
            )
            .unwrap();
        let air = lower_to_air(&lower_to_mir(&schema).unwrap()).unwrap();
        assert_eq!(air.column_count(), 1);
        assert_eq!(air.assignments().len(), 0);

        // x^5 semantics preserved
        let body = match &air.constraints()[0] {
            Constraint::Vanishing(v) => &v.body,
            _ => unreachable!(),
        };
        let tr = trace_of(&[&[3]]);
        assert_eq!(body.eval_at(0, &tr), Some(FieldElement::new(243)));
    }

    #[test]
    fn test_range_256_produces_single_byte_column() {
        let mut schema = schema_with_columns(1);
        schema
            .add_range("range#0", ctx(), hir::Expr::column(0), 256)
            .unwrap();
        let air = lower_to_air(&lower_to_mir(&schema).unwrap()).unwrap();

        assert_eq!(air.column_count(), 2);
        assert!(matches!(
            air.assignments()[0],
            Assignment::ByteDecomposition { .. }
        ));
        // Type constraint on the byte column plus the recomposition
        // identity X = b0.
        let types = air
            .constraints()
            .iter()
            .filter(|c| matches!(c, Constraint::Type(_)))
            .count();
        let vanishing = air
            .constraints()
            .iter()
            .filter(|c| matches!(c, Constraint::Vanishing(_)))
            .count();
        assert_eq!((types, vanishing), (1, 1));
    }

    #[test]
    fn test_range_2_16_produces_two_byte_columns() {
        let mut schema = schema_with_columns(1);
        schema
            .add_range("range#0", ctx(), hir::Expr::column(0), 1 << 16)
            .unwrap();
        let air = lower_to_air(&lower_to_mir(&schema).unwrap()).unwrap();
        assert_eq!(air.column_count(), 3);
    }

    #[test]
    fn test_range_rejects_non_power_of_two() {
        let mut schema = schema_with_columns(1);
        schema
            .add_range("range#0", ctx(), hir::Expr::column(0), 100)
            .unwrap();
        let mir = lower_to_mir(&schema).unwrap();
        assert!(matches!(
            lower_to_air(&mir),
            Err(SchemaError::NonPowerOfTwoBound(100))
        ));
    }

    #[test]
    fn test_normalise_of_constant_folds_away() {
        let mut schema = schema_with_columns(1);
        schema
            .add_vanishing(
                "c",
                ctx(),
                None,
                hir::Expr::Normalise(Box::new(hir::Expr::constant(7))),
            )
            .unwrap();
        let air = lower_to_air(&lower_to_mir(&schema).unwrap()).unwrap();
        // Folded to the constant 1 before AIR lowering, so no inverse
        // column appears.
        assert_eq!(air.column_count(), 1);
    }
}
