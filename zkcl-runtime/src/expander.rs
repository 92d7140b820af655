//! Trace expansion.
//!
//! Three phases over an aligned trace: spillage padding (empty rows
//! up front so shifted reads have room), assignment execution in
//! declaration order, and finally whatever front padding the caller
//! asks for (applied by the checking driver, per padding amount).

use crate::error::{Result, RuntimeError};
use std::cmp::Ordering;
use zkcl_spec::{Assignment, Evaluable, FieldElement, Schema, Trace};

/// Expand a trace: apply spillage, then compute (or verify) every
/// assignment in declaration order.
pub fn expand<E: Evaluable>(
    schema: &Schema<E>,
    trace: &mut Trace,
    spillage: Option<usize>,
) -> Result<()> {
    let spillage = spillage.unwrap_or_else(|| schema.required_spillage());
    trace.prepend_zeros(spillage);

    let mut base = schema.input_count();
    for assignment in schema.assignments() {
        match assignment {
            Assignment::Interleaving { sources, .. } => {
                let data = interleave(trace, sources)?;
                trace.column_mut(base).populate(data);
            }
            Assignment::SortedPermutation {
                handle,
                targets,
                signs,
                sources,
            } => {
                let target_ids: Vec<usize> = (base..base + targets.len()).collect();
                verify_permutation(trace, handle, &target_ids, signs, sources, spillage)?;
            }
            Assignment::Inverse { target, expr } => {
                let length = trace.height(target.context.module) * target.context.multiplier;
                let mut data = Vec::with_capacity(length);
                for row in 0..length {
                    let value = expr
                        .eval_at(row as isize, trace)
                        .unwrap_or_else(FieldElement::zero);
                    data.push(value.inverse());
                }
                trace.column_mut(base).populate(data);
            }
            Assignment::ByteDecomposition { expr, targets, .. } => {
                let context = targets[0].context;
                let length = trace.height(context.module) * context.multiplier;
                let mut columns: Vec<Vec<FieldElement>> =
                    vec![Vec::with_capacity(length); targets.len()];
                for row in 0..length {
                    let value = expr
                        .eval_at(row as isize, trace)
                        .unwrap_or_else(FieldElement::zero)
                        .value();
                    for (i, column) in columns.iter_mut().enumerate() {
                        column.push(FieldElement::new((value >> (8 * i)) & 0xFF));
                    }
                }
                for (i, data) in columns.into_iter().enumerate() {
                    trace.column_mut(base + i).populate(data);
                }
            }
        }
        base += assignment.columns().len();
    }
    Ok(())
}

fn column_data<'a>(trace: &'a Trace, id: usize) -> Result<&'a [FieldElement]> {
    let column = trace.column(id);
    if !column.is_populated() {
        return Err(RuntimeError::UnpopulatedColumn(trace.qualified_name(id)));
    }
    Ok(column.data())
}

/// Row-wise interleaving: `target[i·k + j] = source_j[i]`
fn interleave(trace: &Trace, sources: &[usize]) -> Result<Vec<FieldElement>> {
    let data: Vec<&[FieldElement]> = sources
        .iter()
        .map(|id| column_data(trace, *id))
        .collect::<Result<Vec<_>>>()?;
    let rows = data.first().map(|d| d.len()).unwrap_or(0);
    let mut out = Vec::with_capacity(rows * data.len());
    for i in 0..rows {
        for column in &data {
            out.push(column[i]);
        }
    }
    Ok(out)
}

/// Check that the targets hold a sorted permutation of the sources.
///
/// The targets arrive with the trace (sorting during expansion is out
/// of scope), so execution means verification: multiset equality over
/// every row, and sign-directed ordering over the rows after the
/// spillage prefix, whose zero fill is not part of the user's data.
fn verify_permutation(
    trace: &Trace,
    handle: &str,
    targets: &[usize],
    signs: &[bool],
    sources: &[usize],
    spillage: usize,
) -> Result<()> {
    let Some(&first_target) = targets.first() else {
        return Ok(());
    };
    let source_data: Vec<&[FieldElement]> = sources
        .iter()
        .map(|id| column_data(trace, *id))
        .collect::<Result<Vec<_>>>()?;
    let target_data: Vec<&[FieldElement]> = targets
        .iter()
        .map(|id| column_data(trace, *id))
        .collect::<Result<Vec<_>>>()?;
    let rows = source_data.first().map(|d| d.len()).unwrap_or(0);

    let tuples = |data: &[&[FieldElement]]| -> Vec<Vec<FieldElement>> {
        (0..rows)
            .map(|i| data.iter().map(|column| column[i]).collect())
            .collect()
    };
    let mut source_rows = tuples(&source_data);
    let target_rows = tuples(&target_data);

    // Multiset equality.
    let mut sorted_targets = target_rows.clone();
    source_rows.sort();
    sorted_targets.sort();
    if source_rows != sorted_targets {
        return Err(RuntimeError::NotPermutation {
            handle: handle.to_string(),
        });
    }

    // Sign-directed ordering.
    let multiplier = trace.column(first_target).context.multiplier;
    let start = spillage * multiplier;
    for row in (start + 1)..rows {
        let previous = &target_rows[row - 1];
        let current = &target_rows[row];
        for (j, sign) in signs.iter().enumerate() {
            match previous[j].cmp(&current[j]) {
                Ordering::Equal => continue,
                Ordering::Less if *sign => break,
                Ordering::Greater if !*sign => break,
                _ => {
                    return Err(RuntimeError::NotSorted {
                        handle: handle.to_string(),
                        row,
                    });
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alignment::align_inputs;
    use zkcl_spec::{hir, Column, ColumnType, Context, RawColumn};

    fn f(values: &[u64]) -> Vec<FieldElement> {
        values.iter().map(|v| FieldElement::new(*v)).collect()
    }

    fn ctx() -> Context {
        Context::new(0, 1)
    }

    #[test]
    fn test_interleaving_expansion() {
        let mut schema = hir::Schema::new();
        let x = schema.add_data_column(ctx(), "X", ColumnType::Field).unwrap();
        let y = schema.add_data_column(ctx(), "Y", ColumnType::Field).unwrap();
        schema
            .add_assignment(Assignment::Interleaving {
                target: Column::new(Context::new(0, 2), "Z", ColumnType::Field),
                sources: vec![x, y],
            })
            .unwrap();

        let raw = vec![
            RawColumn::new("X", f(&[1, 2])),
            RawColumn::new("Y", f(&[3, 4])),
        ];
        let mut trace = align_inputs(&schema, &raw, true).unwrap();
        expand(&schema, &mut trace, Some(0)).unwrap();

        assert_eq!(trace.column(2).data(), f(&[1, 3, 2, 4]).as_slice());
    }

    #[test]
    fn test_spillage_prepends_zero_rows() {
        let mut schema = hir::Schema::new();
        schema.add_data_column(ctx(), "X", ColumnType::Field).unwrap();
        let raw = vec![RawColumn::new("X", f(&[5, 6]))];
        let mut trace = align_inputs(&schema, &raw, true).unwrap();
        expand(&schema, &mut trace, None).unwrap();

        // Default spillage is one row.
        assert_eq!(trace.height(0), 3);
        assert_eq!(trace.column(0).data(), f(&[0, 5, 6]).as_slice());
    }

    #[test]
    fn test_inverse_assignment() {
        let mut schema = hir::Schema::new();
        let x = schema.add_data_column(ctx(), "X", ColumnType::Field).unwrap();
        schema
            .add_assignment(Assignment::Inverse {
                target: Column::new(ctx(), "inv$1", ColumnType::Field),
                expr: hir::Expr::column(x),
            })
            .unwrap();

        let raw = vec![RawColumn::new("X", f(&[0, 2]))];
        let mut trace = align_inputs(&schema, &raw, true).unwrap();
        expand(&schema, &mut trace, Some(0)).unwrap();

        let inv = trace.column(1).data();
        assert_eq!(inv[0], FieldElement::zero());
        assert_eq!(inv[1] * FieldElement::new(2), FieldElement::one());
    }

    #[test]
    fn test_byte_decomposition_assignment() {
        let mut schema = hir::Schema::new();
        let x = schema.add_data_column(ctx(), "X", ColumnType::Field).unwrap();
        schema
            .add_assignment(Assignment::ByteDecomposition {
                handle: "range#0".to_string(),
                expr: hir::Expr::column(x),
                targets: vec![
                    Column::new(ctx(), "range#0$byte0", ColumnType::byte()),
                    Column::new(ctx(), "range#0$byte1", ColumnType::byte()),
                ],
            })
            .unwrap();

        let raw = vec![RawColumn::new("X", f(&[0x1234]))];
        let mut trace = align_inputs(&schema, &raw, true).unwrap();
        expand(&schema, &mut trace, Some(0)).unwrap();

        assert_eq!(trace.column(1).data(), f(&[0x34]).as_slice());
        assert_eq!(trace.column(2).data(), f(&[0x12]).as_slice());
    }

    fn permutation_schema() -> hir::Schema {
        let mut schema = hir::Schema::new();
        let x = schema
            .add_data_column(ctx(), "X", ColumnType::uint(16))
            .unwrap();
        schema
            .add_assignment(Assignment::SortedPermutation {
                handle: "P".to_string(),
                targets: vec![Column::new(ctx(), "P", ColumnType::uint(16))],
                signs: vec![true],
                sources: vec![x],
            })
            .unwrap();
        schema
    }

    #[test]
    fn test_permutation_accepts_sorted_targets() {
        let schema = permutation_schema();
        let raw = vec![
            RawColumn::new("X", f(&[3, 1, 2])),
            RawColumn::new("P", f(&[1, 2, 3])),
        ];
        let mut trace = align_inputs(&schema, &raw, true).unwrap();
        expand(&schema, &mut trace, None).unwrap();
    }

    #[test]
    fn test_permutation_rejects_unsorted_targets() {
        let schema = permutation_schema();
        let raw = vec![
            RawColumn::new("X", f(&[3, 1, 2])),
            RawColumn::new("P", f(&[3, 2, 1])),
        ];
        let mut trace = align_inputs(&schema, &raw, true).unwrap();
        assert!(matches!(
            expand(&schema, &mut trace, None),
            Err(RuntimeError::NotSorted { .. })
        ));
    }

    #[test]
    fn test_permutation_rejects_different_multiset() {
        let schema = permutation_schema();
        let raw = vec![
            RawColumn::new("X", f(&[3, 1, 2])),
            RawColumn::new("P", f(&[1, 2, 4])),
        ];
        let mut trace = align_inputs(&schema, &raw, true).unwrap();
        assert!(matches!(
            expand(&schema, &mut trace, None),
            Err(RuntimeError::NotPermutation { .. })
        ));
    }

    #[test]
    fn test_descending_permutation_with_spillage() {
        let mut schema = hir::Schema::new();
        let x = schema
            .add_data_column(ctx(), "X", ColumnType::uint(16))
            .unwrap();
        schema
            .add_assignment(Assignment::SortedPermutation {
                handle: "P".to_string(),
                targets: vec![Column::new(ctx(), "P", ColumnType::uint(16))],
                signs: vec![false],
                sources: vec![x],
            })
            .unwrap();

        // The zero-filled spillage row precedes larger values; the
        // ordering check must not treat that as a violation.
        let raw = vec![
            RawColumn::new("X", f(&[1, 3, 2])),
            RawColumn::new("P", f(&[3, 2, 1])),
        ];
        let mut trace = align_inputs(&schema, &raw, true).unwrap();
        expand(&schema, &mut trace, Some(1)).unwrap();
    }

    #[test]
    fn test_reading_unpopulated_column_fails() {
        let mut schema = hir::Schema::new();
        let x = schema.add_data_column(ctx(), "X", ColumnType::Field).unwrap();
        schema
            .add_assignment(Assignment::Interleaving {
                target: Column::new(ctx(), "Z", ColumnType::Field),
                sources: vec![x],
            })
            .unwrap();

        let raw = vec![RawColumn::new("X", f(&[1]))];
        let trace = align_inputs(&schema, &raw, true).unwrap();
        // Column 1 (Z) has not been computed yet.
        assert!(matches!(
            interleave(&trace, &[1]),
            Err(RuntimeError::UnpopulatedColumn(_))
        ));
    }
}
