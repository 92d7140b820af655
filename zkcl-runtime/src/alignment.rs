//! Trace alignment.
//!
//! A raw trace arrives as name-keyed columns in arbitrary order;
//! alignment reorders them into schema column order so that column
//! ids index the trace directly, derives every module's height, and
//! flags missing or unexpected columns.

use crate::error::{Result, RuntimeError};
use log::warn;
use zkcl_spec::{Evaluable, RawColumn, Schema, Trace, TraceColumn};

/// Align a raw trace for expansion: the trace must supply the input
/// columns and the user-supplied assignment outputs; the remaining
/// computed columns become placeholders for the expander to fill.
pub fn align_inputs<E: Evaluable>(
    schema: &Schema<E>,
    raw: &[RawColumn],
    strict: bool,
) -> Result<Trace> {
    align_with(schema, raw, false, strict)
}

/// Align an already-expanded trace: every schema column must be
/// supplied.
pub fn align<E: Evaluable>(schema: &Schema<E>, raw: &[RawColumn], strict: bool) -> Result<Trace> {
    align_with(schema, raw, true, strict)
}

fn align_with<E: Evaluable>(
    schema: &Schema<E>,
    raw: &[RawColumn],
    expanded: bool,
    strict: bool,
) -> Result<Trace> {
    let module_names: Vec<String> = schema
        .modules()
        .iter()
        .map(|m| m.name().to_string())
        .collect();

    // Flag columns the schema knows nothing about.
    for column in raw {
        let known = module_names
            .iter()
            .position(|m| *m == column.module)
            .and_then(|mid| schema.column_of(mid, &column.name))
            .is_some();
        if !known {
            if strict {
                return Err(RuntimeError::UnknownColumn(column.qualified_name()));
            }
            warn!("unknown trace column {} (trimmed)", column.qualified_name());
        }
    }

    let expected: Vec<bool> = {
        let mut flags = vec![expanded; schema.column_count()];
        if !expanded {
            for id in schema.user_columns() {
                flags[id] = true;
            }
        }
        flags
    };

    let mut trace = Trace::new(module_names);
    for (id, column) in schema.columns().enumerate() {
        let module_name = schema.modules()[column.context.module].name();
        if !expected[id] {
            trace.push_column(TraceColumn::placeholder(
                column.context,
                column.name.clone(),
            ));
            continue;
        }
        let supplied = raw
            .iter()
            .find(|r| r.module == module_name && r.name == column.name)
            .ok_or_else(|| RuntimeError::MissingColumn(schema.qualified_name(id)))?;
        trace.push_column(TraceColumn::populated(
            column.context,
            column.name.clone(),
            supplied.data.clone(),
        ));
    }

    derive_heights(schema, &mut trace)?;
    Ok(trace)
}

/// Compute per-module heights from the populated columns, checking
/// length multipliers and cross-column consistency
fn derive_heights<E: Evaluable>(schema: &Schema<E>, trace: &mut Trace) -> Result<()> {
    for module in 0..schema.modules().len() {
        let mut height: Option<usize> = None;
        for (id, column) in schema.columns().enumerate() {
            if column.context.module != module {
                continue;
            }
            let data = trace.column(id);
            if !data.is_populated() {
                continue;
            }
            let multiplier = column.context.multiplier;
            if data.len() % multiplier != 0 {
                return Err(RuntimeError::RaggedColumn {
                    column: schema.qualified_name(id),
                    length: data.len(),
                    multiplier,
                });
            }
            let implied = data.len() / multiplier;
            match height {
                None => height = Some(implied),
                Some(h) if h != implied => {
                    return Err(RuntimeError::InconsistentHeight {
                        module: schema.modules()[module].name().to_string(),
                        first: h,
                        second: implied,
                    });
                }
                Some(_) => {}
            }
        }
        trace.set_height(module, height.unwrap_or(0));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use zkcl_spec::{hir, ColumnType, Context, FieldElement};

    fn f(values: &[u64]) -> Vec<FieldElement> {
        values.iter().map(|v| FieldElement::new(*v)).collect()
    }

    fn two_column_schema() -> hir::Schema {
        let mut schema = hir::Schema::new();
        let ctx = Context::new(0, 1);
        schema.add_data_column(ctx, "X", ColumnType::Field).unwrap();
        schema.add_data_column(ctx, "Y", ColumnType::Field).unwrap();
        schema
    }

    #[test]
    fn test_reorders_to_schema_order() {
        let schema = two_column_schema();
        let raw = vec![
            RawColumn::new("Y", f(&[3, 4])),
            RawColumn::new("X", f(&[1, 2])),
        ];
        let trace = align(&schema, &raw, true).unwrap();
        assert_eq!(trace.column(0).name, "X");
        assert_eq!(trace.column(1).name, "Y");
        assert_eq!(trace.height(0), 2);
    }

    #[test]
    fn test_missing_column_fatal() {
        let schema = two_column_schema();
        let raw = vec![RawColumn::new("X", f(&[1]))];
        assert!(matches!(
            align(&schema, &raw, true),
            Err(RuntimeError::MissingColumn(name)) if name == "Y"
        ));
    }

    #[test]
    fn test_unknown_column_strictness() {
        let schema = two_column_schema();
        let raw = vec![
            RawColumn::new("X", f(&[1])),
            RawColumn::new("Y", f(&[2])),
            RawColumn::new("Z", f(&[3])),
        ];
        assert!(matches!(
            align(&schema, &raw, true),
            Err(RuntimeError::UnknownColumn(name)) if name == "Z"
        ));
        // Lenient mode trims with a warning.
        let trace = align(&schema, &raw, false).unwrap();
        assert_eq!(trace.width(), 2);
    }

    #[test]
    fn test_inconsistent_heights_fatal() {
        let schema = two_column_schema();
        let raw = vec![
            RawColumn::new("X", f(&[1, 2])),
            RawColumn::new("Y", f(&[3])),
        ];
        assert!(matches!(
            align(&schema, &raw, true),
            Err(RuntimeError::InconsistentHeight { .. })
        ));
    }

    #[test]
    fn test_multiplier_divides_length() {
        let mut schema = hir::Schema::new();
        schema
            .add_data_column(Context::new(0, 2), "X", ColumnType::Field)
            .unwrap();
        let raw = vec![RawColumn::new("X", f(&[1, 2, 3]))];
        assert!(matches!(
            align(&schema, &raw, true),
            Err(RuntimeError::RaggedColumn { .. })
        ));

        let raw = vec![RawColumn::new("X", f(&[1, 2, 3, 4]))];
        let trace = align(&schema, &raw, true).unwrap();
        assert_eq!(trace.height(0), 2);
    }

    #[test]
    fn test_input_alignment_leaves_placeholders() {
        let mut schema = two_column_schema();
        schema
            .add_assignment(zkcl_spec::Assignment::Interleaving {
                target: zkcl_spec::Column::new(
                    Context::new(0, 2),
                    "Z",
                    ColumnType::Field,
                ),
                sources: vec![0, 1],
            })
            .unwrap();
        let raw = vec![
            RawColumn::new("X", f(&[1])),
            RawColumn::new("Y", f(&[2])),
        ];
        let trace = align_inputs(&schema, &raw, true).unwrap();
        assert_eq!(trace.width(), 3);
        assert!(!trace.column(2).is_populated());
    }
}
