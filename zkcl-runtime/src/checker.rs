//! Constraint checking.
//!
//! Checks an expanded trace against a schema at any IR level, and
//! provides the multi-level driver that lowers the schema once per
//! requested level, re-expands, and reconciles the outcomes.

use crate::alignment;
use crate::error::{Result, RuntimeError};
use crate::expander;
use log::info;
use std::collections::HashSet;
use std::fmt;
use zkcl_spec::{
    hir, lower, Constraint, Evaluable, FieldElement, LookupConstraint, RangeConstraint, RawColumn,
    Schema, Testable, Trace, TypeConstraint, VanishingConstraint,
};

/// Parameters for a checking run, mirroring the CLI contract
#[derive(Debug, Clone)]
pub struct CheckConfig {
    /// Check at the HIR level
    pub hir: bool,
    /// Check at the MIR level
    pub mir: bool,
    /// Check at the AIR level
    pub air: bool,
    /// Expand the trace; disabled for already-expanded ("raw") traces
    pub expand: bool,
    /// Inclusive range of front paddings to check
    pub padding: (usize, usize),
    /// Spillage override; `None` infers it from the schema
    pub spillage: Option<usize>,
    /// Fail on unknown trace columns instead of trimming them
    pub strict: bool,
    /// Log failing constraint bodies
    pub report: bool,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            hir: false,
            mir: false,
            air: false,
            expand: true,
            padding: (0, 0),
            spillage: None,
            strict: true,
            report: false,
        }
    }
}

/// The IR level a failure was observed at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IrLevel {
    /// High-level IR
    Hir,
    /// Mid-level IR
    Mir,
    /// Arithmetic IR
    Air,
}

impl fmt::Display for IrLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IrLevel::Hir => write!(f, "HIR"),
            IrLevel::Mir => write!(f, "MIR"),
            IrLevel::Air => write!(f, "AIR"),
        }
    }
}

/// Outcome of a multi-level check: one entry per distinct failure.
/// An entry without a level means every checked level failed the same
/// way.
#[derive(Debug)]
pub struct CheckReport {
    /// Rendered failures
    pub failures: Vec<(Option<IrLevel>, String)>,
}

impl fmt::Display for CheckReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (level, message)) in self.failures.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            match level {
                Some(level) => write!(f, "{}: {}", level, message)?,
                None => write!(f, "{}", message)?,
            }
        }
        Ok(())
    }
}

impl std::error::Error for CheckReport {}

// ============================================================================
// Single-level checking
// ============================================================================

/// Check every constraint of a schema against an expanded trace
pub fn check_schema<E: Evaluable + Testable>(
    schema: &Schema<E>,
    trace: &Trace,
    report: bool,
) -> Result<()> {
    for constraint in schema.constraints() {
        match constraint {
            Constraint::Vanishing(c) => check_vanishing(c, trace, report)?,
            Constraint::Lookup(c) => check_lookup(c, trace)?,
            Constraint::Type(c) => check_type(c, trace)?,
            Constraint::Range(c) => check_range(c, trace)?,
        }
    }
    Ok(())
}

/// Align, optionally expand, and check a raw trace once per padding
pub fn check_trace<E: Evaluable + Testable>(
    schema: &Schema<E>,
    raw: &[RawColumn],
    cfg: &CheckConfig,
) -> Result<()> {
    let mut trace = if cfg.expand {
        let mut aligned = alignment::align_inputs(schema, raw, cfg.strict)?;
        expander::expand(schema, &mut aligned, cfg.spillage)?;
        aligned
    } else {
        alignment::align(schema, raw, cfg.strict)?
    };

    let (low, high) = cfg.padding;
    for n in low..=high {
        if n == low {
            trace.pad_front(n);
        } else {
            trace.pad_front(1);
        }
        check_schema(schema, &trace, cfg.report)?;
    }
    Ok(())
}

fn check_vanishing<E: Evaluable + Testable>(
    constraint: &VanishingConstraint<E>,
    trace: &Trace,
    report: bool,
) -> Result<()> {
    let height = trace.height(constraint.context.module) * constraint.context.multiplier;
    match constraint.domain {
        None => {
            let bounds = constraint.body.bounds();
            if bounds.end < height {
                for row in bounds.start..height - bounds.end {
                    test_vanishes(constraint, row, trace, report)?;
                }
            }
        }
        Some(domain) => {
            let row = if domain >= 0 {
                domain
            } else {
                height as isize + domain
            };
            // A domain row outside the module is vacuously satisfied,
            // the constraint-level analogue of undefined => ignored.
            if row >= 0 && (row as usize) < height {
                test_vanishes(constraint, row as usize, trace, report)?;
            }
        }
    }
    Ok(())
}

fn test_vanishes<E: Evaluable + Testable>(
    constraint: &VanishingConstraint<E>,
    row: usize,
    trace: &Trace,
    report: bool,
) -> Result<()> {
    // An undefined result means the row is outside the body's shift
    // window; such rows are skipped, not failed.
    if constraint.body.test_zero_at(row as isize, trace) == Some(false) {
        if report {
            let names: Vec<String> =
                (0..trace.width()).map(|id| trace.qualified_name(id)).collect();
            info!(
                "constraint \"{}\" = {}",
                constraint.handle,
                constraint.body.lisp(&names)
            );
        }
        return Err(RuntimeError::ConstraintFailure {
            handle: constraint.handle.clone(),
            row,
        });
    }
    Ok(())
}

fn check_lookup<E: Evaluable>(constraint: &LookupConstraint<E>, trace: &Trace) -> Result<()> {
    let tuples = |exprs: &[E], module: usize, multiplier: usize| {
        let height = trace.height(module) * multiplier;
        let mut rows = Vec::with_capacity(height);
        for row in 0..height {
            let tuple: Option<Vec<FieldElement>> = exprs
                .iter()
                .map(|e| e.eval_at(row as isize, trace))
                .collect();
            rows.push(tuple);
        }
        rows
    };

    let targets: HashSet<Vec<FieldElement>> = tuples(
        &constraint.targets,
        constraint.target_context.module,
        constraint.target_context.multiplier,
    )
    .into_iter()
    .flatten()
    .collect();

    let sources = tuples(
        &constraint.sources,
        constraint.source_context.module,
        constraint.source_context.multiplier,
    );
    for (row, tuple) in sources.into_iter().enumerate() {
        if let Some(tuple) = tuple {
            if !targets.contains(&tuple) {
                return Err(RuntimeError::LookupFailure {
                    handle: constraint.handle.clone(),
                    row,
                });
            }
        }
    }
    Ok(())
}

fn check_type(constraint: &TypeConstraint, trace: &Trace) -> Result<()> {
    let column = trace.column(constraint.column);
    for (row, value) in column.data().iter().enumerate() {
        if !constraint.ty.accepts(*value) {
            return Err(RuntimeError::TypeFailure {
                column: trace.qualified_name(constraint.column),
                row,
                value: *value,
            });
        }
    }
    Ok(())
}

fn check_range<E: Evaluable>(constraint: &RangeConstraint<E>, trace: &Trace) -> Result<()> {
    let height = trace.height(constraint.context.module) * constraint.context.multiplier;
    for row in 0..height {
        if let Some(value) = constraint.expr.eval_at(row as isize, trace) {
            if value.value() >= constraint.bound {
                return Err(RuntimeError::RangeFailure {
                    handle: constraint.handle.clone(),
                    row,
                    value,
                });
            }
        }
    }
    Ok(())
}

// ============================================================================
// Multi-level checking
// ============================================================================

/// Check a raw trace at the configured IR levels.
///
/// With no explicit level selected, all three are checked and
/// identical failures collapse into a single report; discrepancies
/// between levels are reported level by level.
pub fn check_with_lowering(
    schema: &hir::Schema,
    raw: &[RawColumn],
    cfg: &CheckConfig,
) -> std::result::Result<(), CheckReport> {
    let explicit = cfg.hir || cfg.mir || cfg.air;
    let levels: Vec<IrLevel> = if explicit {
        [
            (cfg.hir, IrLevel::Hir),
            (cfg.mir, IrLevel::Mir),
            (cfg.air, IrLevel::Air),
        ]
        .into_iter()
        .filter_map(|(enabled, level)| enabled.then_some(level))
        .collect()
    } else {
        vec![IrLevel::Hir, IrLevel::Mir, IrLevel::Air]
    };

    let mut outcomes: Vec<(IrLevel, Option<String>)> = Vec::with_capacity(levels.len());
    for level in levels {
        let outcome = check_at(schema, raw, cfg, level);
        outcomes.push((level, outcome.err().map(|e| e.to_string())));
    }

    if outcomes.iter().all(|(_, outcome)| outcome.is_none()) {
        return Ok(());
    }

    // All checked levels agreeing on one message collapse into a
    // single unattributed report.
    let messages: Vec<&String> = outcomes.iter().filter_map(|(_, o)| o.as_ref()).collect();
    if !explicit && messages.len() == outcomes.len() {
        let first = messages[0];
        if messages.iter().all(|m| *m == first) {
            return Err(CheckReport {
                failures: vec![(None, first.clone())],
            });
        }
    }

    let failures = outcomes
        .into_iter()
        .map(|(level, outcome)| match outcome {
            Some(message) => (Some(level), message),
            None => (
                Some(level),
                "trace should have been rejected".to_string(),
            ),
        })
        .collect();
    Err(CheckReport { failures })
}

fn check_at(
    schema: &hir::Schema,
    raw: &[RawColumn],
    cfg: &CheckConfig,
    level: IrLevel,
) -> Result<()> {
    match level {
        IrLevel::Hir => check_trace(schema, raw, cfg),
        IrLevel::Mir => {
            let mir = lower::lower_to_mir(schema)?;
            check_trace(&mir, raw, cfg)
        }
        IrLevel::Air => {
            let mir = lower::lower_to_mir(schema)?;
            let air = lower::lower_to_air(&mir)?;
            check_trace(&air, raw, cfg)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zkcl_spec::{ColumnType, Context};

    fn f(values: &[u64]) -> Vec<FieldElement> {
        values.iter().map(|v| FieldElement::new(*v)).collect()
    }

    fn ctx() -> Context {
        Context::new(0, 1)
    }

    fn vanishing_schema(domain: Option<isize>) -> hir::Schema {
        let mut schema = hir::Schema::new();
        let x = schema.add_data_column(ctx(), "X", ColumnType::Field).unwrap();
        schema
            .add_vanishing("c", ctx(), domain, hir::Expr::column(x))
            .unwrap();
        schema
    }

    fn check(schema: &hir::Schema, columns: &[(&str, &[u64])]) -> Result<()> {
        let raw: Vec<RawColumn> = columns
            .iter()
            .map(|(name, data)| RawColumn::new(name, f(data)))
            .collect();
        let cfg = CheckConfig {
            spillage: Some(0),
            ..CheckConfig::default()
        };
        check_trace(schema, &raw, &cfg)
    }

    #[test]
    fn test_global_vanishing() {
        let schema = vanishing_schema(None);
        check(&schema, &[("X", &[0, 0, 0])]).unwrap();
        let err = check(&schema, &[("X", &[0, 1, 0])]).unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::ConstraintFailure { row: 1, .. }
        ));
    }

    #[test]
    fn test_first_row_domain() {
        let schema = vanishing_schema(Some(0));
        check(&schema, &[("X", &[0, 9, 9])]).unwrap();
        assert!(check(&schema, &[("X", &[1, 0, 0])]).is_err());
    }

    #[test]
    fn test_last_row_domain() {
        let schema = vanishing_schema(Some(-1));
        check(&schema, &[("X", &[9, 9, 0])]).unwrap();
        assert!(check(&schema, &[("X", &[0, 0, 1])]).is_err());
    }

    #[test]
    fn test_out_of_range_domain_is_vacuous() {
        let schema = vanishing_schema(Some(10));
        check(&schema, &[("X", &[1, 1, 1])]).unwrap();
    }

    #[test]
    fn test_shifted_body_skips_boundary_rows() {
        let mut schema = hir::Schema::new();
        let x = schema.add_data_column(ctx(), "X", ColumnType::Field).unwrap();
        // X[k+1] - X[k] vanishes; the last row has no successor and
        // is outside the check window.
        schema
            .add_vanishing(
                "inc",
                ctx(),
                None,
                hir::Expr::Sub(vec![hir::Expr::shifted(x, 1), hir::Expr::column(x)]),
            )
            .unwrap();
        check(&schema, &[("X", &[5, 5, 5])]).unwrap();
        assert!(check(&schema, &[("X", &[5, 6, 6])]).is_err());
    }

    #[test]
    fn test_lookup_subset() {
        let mut schema = hir::Schema::new();
        let x = schema.add_data_column(ctx(), "X", ColumnType::Field).unwrap();
        let y = schema.add_data_column(ctx(), "Y", ColumnType::Field).unwrap();
        schema
            .add_lookup(
                "l",
                ctx(),
                ctx(),
                vec![hir::Expr::column(x)],
                vec![hir::Expr::column(y)],
            )
            .unwrap();

        check(&schema, &[("X", &[1, 2, 1]), ("Y", &[1, 2, 3])]).unwrap();
        let err = check(&schema, &[("X", &[1, 4, 1]), ("Y", &[1, 2, 3])]).unwrap_err();
        assert!(matches!(err, RuntimeError::LookupFailure { row: 1, .. }));
    }

    #[test]
    fn test_type_constraint() {
        let mut schema = hir::Schema::new();
        let x = schema
            .add_data_column(ctx(), "X", ColumnType::uint(8))
            .unwrap();
        schema.add_type_constraint(x, ColumnType::uint(8));
        check(&schema, &[("X", &[0, 255])]).unwrap();
        let err = check(&schema, &[("X", &[0, 256])]).unwrap_err();
        assert!(matches!(err, RuntimeError::TypeFailure { row: 1, .. }));
    }

    #[test]
    fn test_range_constraint() {
        let mut schema = hir::Schema::new();
        let x = schema.add_data_column(ctx(), "X", ColumnType::Field).unwrap();
        schema
            .add_range("range#0", ctx(), hir::Expr::column(x), 256)
            .unwrap();
        check(&schema, &[("X", &[0, 255, 100])]).unwrap();
        assert!(check(&schema, &[("X", &[0, 256])]).is_err());
    }

    #[test]
    fn test_padding_preserves_acceptance() {
        let mut schema = hir::Schema::new();
        let x = schema.add_data_column(ctx(), "X", ColumnType::Field).unwrap();
        schema
            .add_vanishing(
                "c",
                ctx(),
                None,
                hir::Expr::Mul(vec![
                    hir::Expr::column(x),
                    hir::Expr::Sub(vec![hir::Expr::column(x), hir::Expr::constant(1)]),
                ]),
            )
            .unwrap();
        let raw = vec![RawColumn::new("X", f(&[1, 0, 1]))];
        let cfg = CheckConfig {
            padding: (0, 3),
            ..CheckConfig::default()
        };
        check_trace(&schema, &raw, &cfg).unwrap();
    }

    #[test]
    fn test_multi_level_agreement_collapses() {
        let schema = vanishing_schema(None);
        let raw = vec![RawColumn::new("X", f(&[0, 1, 0]))];
        let cfg = CheckConfig {
            spillage: Some(0),
            ..CheckConfig::default()
        };
        let report = check_with_lowering(&schema, &raw, &cfg).unwrap_err();
        assert_eq!(report.failures.len(), 1);
        assert!(report.failures[0].0.is_none());

        let ok = vec![RawColumn::new("X", f(&[0, 0]))];
        check_with_lowering(&schema, &ok, &cfg).unwrap();
    }

    #[test]
    fn test_explicit_level_selection() {
        let schema = vanishing_schema(None);
        let raw = vec![RawColumn::new("X", f(&[1]))];
        let cfg = CheckConfig {
            air: true,
            spillage: Some(0),
            ..CheckConfig::default()
        };
        let report = check_with_lowering(&schema, &raw, &cfg).unwrap_err();
        assert_eq!(report.failures[0].0, Some(IrLevel::Air));
    }
}
