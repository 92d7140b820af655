//! Exhaustive trace enumeration for property testing.
//!
//! Enumerates every trace whose user-supplied columns draw their
//! values from a given pool, and drives the checker over each. The
//! interesting search is for traces where the IR levels disagree:
//! accepted at one level, rejected at another.

use crate::checker::{self, CheckConfig};
use crate::error::Result;
use zkcl_spec::{hir, lower, Evaluable, FieldElement, RawColumn, Schema};

/// Odometer over all assignments of pool values to a cell sequence
#[derive(Debug, Clone)]
pub struct ElementEnumerator {
    pool: Vec<FieldElement>,
    digits: Vec<usize>,
    done: bool,
}

impl ElementEnumerator {
    /// Enumerate all `pool.len() ^ cells` sequences
    pub fn new(cells: usize, pool: Vec<FieldElement>) -> Self {
        let done = pool.is_empty() && cells > 0;
        ElementEnumerator {
            pool,
            digits: vec![0; cells],
            done,
        }
    }
}

impl Iterator for ElementEnumerator {
    type Item = Vec<FieldElement>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let current = self.digits.iter().map(|d| self.pool[*d]).collect();

        // Advance the odometer, rightmost digit fastest.
        self.done = true;
        for digit in self.digits.iter_mut().rev() {
            *digit += 1;
            if *digit < self.pool.len() {
                self.done = false;
                break;
            }
            *digit = 0;
        }
        if self.digits.is_empty() {
            self.done = true;
        }
        Some(current)
    }
}

/// Enumerates raw traces over a schema's user-supplied columns
pub struct TraceEnumerator<'a, E> {
    schema: &'a Schema<E>,
    columns: Vec<usize>,
    lines: usize,
    inner: ElementEnumerator,
}

impl<'a, E: Evaluable> TraceEnumerator<'a, E> {
    /// Enumerate all traces of the given height with cells drawn from
    /// the pool
    pub fn new(schema: &'a Schema<E>, lines: usize, pool: Vec<FieldElement>) -> Self {
        let columns = schema.user_columns();
        let cells: usize = columns
            .iter()
            .map(|id| lines * schema.column(*id).context.multiplier)
            .sum();
        TraceEnumerator {
            schema,
            columns,
            lines,
            inner: ElementEnumerator::new(cells, pool),
        }
    }
}

impl<E: Evaluable> Iterator for TraceEnumerator<'_, E> {
    type Item = Vec<RawColumn>;

    fn next(&mut self) -> Option<Self::Item> {
        let elements = self.inner.next()?;
        let mut raw = Vec::with_capacity(self.columns.len());
        let mut cursor = 0;
        for id in &self.columns {
            let column = self.schema.column(*id);
            let cells = self.lines * column.context.multiplier;
            let module = self.schema.modules()[column.context.module].name();
            raw.push(RawColumn {
                module: module.to_string(),
                name: column.name.clone(),
                data: elements[cursor..cursor + cells].to_vec(),
            });
            cursor += cells;
        }
        Some(raw)
    }
}

/// Search for a trace on which the three IR levels disagree.
///
/// Every enumerated trace is checked at HIR, MIR and AIR; the first
/// one accepted at some level but rejected at another is returned.
pub fn find_level_disagreement(
    schema: &hir::Schema,
    lines: usize,
    pool: Vec<FieldElement>,
) -> Result<Option<Vec<RawColumn>>> {
    let mir = lower::lower_to_mir(schema)?;
    let air = lower::lower_to_air(&mir)?;
    let cfg = CheckConfig::default();

    for raw in TraceEnumerator::new(schema, lines, pool) {
        let hir_ok = checker::check_trace(schema, &raw, &cfg).is_ok();
        let mir_ok = checker::check_trace(&mir, &raw, &cfg).is_ok();
        let air_ok = checker::check_trace(&air, &raw, &cfg).is_ok();
        if hir_ok != mir_ok || mir_ok != air_ok {
            return Ok(Some(raw));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use zkcl_spec::{ColumnType, Context};

    fn pool(values: &[u64]) -> Vec<FieldElement> {
        values.iter().map(|v| FieldElement::new(*v)).collect()
    }

    #[test]
    fn test_element_enumerator_counts() {
        let all: Vec<_> = ElementEnumerator::new(3, pool(&[0, 1])).collect();
        assert_eq!(all.len(), 8);
        assert_eq!(all[0], pool(&[0, 0, 0]));
        assert_eq!(all[7], pool(&[1, 1, 1]));
    }

    #[test]
    fn test_element_enumerator_empty_cells() {
        let all: Vec<_> = ElementEnumerator::new(0, pool(&[0, 1])).collect();
        assert_eq!(all.len(), 1);
        assert!(all[0].is_empty());
    }

    #[test]
    fn test_trace_enumerator_shapes() {
        let mut schema = hir::Schema::new();
        schema
            .add_data_column(Context::new(0, 1), "X", ColumnType::Field)
            .unwrap();
        schema
            .add_data_column(Context::new(0, 1), "Y", ColumnType::Field)
            .unwrap();

        let traces: Vec<_> = TraceEnumerator::new(&schema, 2, pool(&[0, 1])).collect();
        // Two columns of two cells each over a two-value pool.
        assert_eq!(traces.len(), 16);
        for raw in &traces {
            assert_eq!(raw.len(), 2);
            assert_eq!(raw[0].data.len(), 2);
        }
    }

    #[test]
    fn test_levels_agree_on_simple_schema() {
        let mut schema = hir::Schema::new();
        let ctx = Context::new(0, 1);
        let x = schema.add_data_column(ctx, "X", ColumnType::Field).unwrap();
        // X * (X - 1) = 0, with an if-zero formulation at HIR.
        schema
            .add_vanishing(
                "bit",
                ctx,
                None,
                hir::Expr::IfZero {
                    condition: Box::new(hir::Expr::column(x)),
                    if_zero: None,
                    if_nonzero: Some(Box::new(hir::Expr::Sub(vec![
                        hir::Expr::column(x),
                        hir::Expr::constant(1),
                    ]))),
                },
            )
            .unwrap();

        let found = find_level_disagreement(&schema, 2, pool(&[0, 1, 2])).unwrap();
        assert!(found.is_none());
    }
}
