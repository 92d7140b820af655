//! Column-major trace model.
//!
//! A trace maps every schema column to an array of field values, with
//! a height recorded per module. Traces arrive "raw" (keyed by
//! qualified column name, in whatever order the file had) and are
//! aligned into schema column order before any checking happens.

use crate::field::FieldElement;
use crate::schema::{ColumnId, Context, ModuleId};

/// A single named column as read from a trace file, prior to alignment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawColumn {
    /// Enclosing module name ("" for the prelude)
    pub module: String,
    /// Column name within the module
    pub name: String,
    /// Cell values
    pub data: Vec<FieldElement>,
}

impl RawColumn {
    /// Build a raw column from a qualified `module.column` name
    pub fn new(qualified: &str, data: Vec<FieldElement>) -> Self {
        let (module, name) = match qualified.split_once('.') {
            Some((m, n)) => (m.to_string(), n.to_string()),
            None => (String::new(), qualified.to_string()),
        };
        RawColumn { module, name, data }
    }

    /// Qualified `module.column` name (plain name in the prelude)
    pub fn qualified_name(&self) -> String {
        if self.module.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.module, self.name)
        }
    }
}

/// One column of an aligned trace
#[derive(Debug, Clone)]
pub struct TraceColumn {
    /// Evaluation context (module and length multiplier)
    pub context: Context,
    /// Unqualified column name
    pub name: String,
    /// Cell values; empty until populated for computed columns
    data: Vec<FieldElement>,
    /// Whether the data has been filled in yet
    populated: bool,
}

impl TraceColumn {
    /// A populated column holding the given values
    pub fn populated(context: Context, name: String, data: Vec<FieldElement>) -> Self {
        TraceColumn {
            context,
            name,
            data,
            populated: true,
        }
    }

    /// An unpopulated placeholder, to be filled by the expander
    pub fn placeholder(context: Context, name: String) -> Self {
        TraceColumn {
            context,
            name,
            data: Vec::new(),
            populated: false,
        }
    }

    /// Whether the column's values have been filled in
    pub fn is_populated(&self) -> bool {
        self.populated
    }

    /// Cell values
    pub fn data(&self) -> &[FieldElement] {
        &self.data
    }

    /// Number of cells
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the column has no cells
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Fill in the column's values
    pub fn populate(&mut self, data: Vec<FieldElement>) {
        self.data = data;
        self.populated = true;
    }

    /// Prepend `n` copies of the given value
    pub fn pad_front(&mut self, n: usize, value: FieldElement) {
        self.data.splice(0..0, std::iter::repeat(value).take(n));
    }
}

/// An aligned trace: columns in schema order plus per-module heights
#[derive(Debug, Clone)]
pub struct Trace {
    module_names: Vec<String>,
    heights: Vec<usize>,
    columns: Vec<TraceColumn>,
}

impl Trace {
    /// Create a trace with the given modules, all heights zero
    pub fn new(module_names: Vec<String>) -> Self {
        let heights = vec![0; module_names.len()];
        Trace {
            module_names,
            heights,
            columns: Vec::new(),
        }
    }

    /// Append a column; columns must be added in schema order
    pub fn push_column(&mut self, column: TraceColumn) -> ColumnId {
        self.columns.push(column);
        self.columns.len() - 1
    }

    /// Number of columns
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Column by schema index
    pub fn column(&self, id: ColumnId) -> &TraceColumn {
        &self.columns[id]
    }

    /// Mutable column by schema index
    pub fn column_mut(&mut self, id: ColumnId) -> &mut TraceColumn {
        &mut self.columns[id]
    }

    /// All columns in schema order
    pub fn columns(&self) -> &[TraceColumn] {
        &self.columns
    }

    /// Height of a module (rows at multiplier 1)
    pub fn height(&self, module: ModuleId) -> usize {
        self.heights[module]
    }

    /// Set the height of a module
    pub fn set_height(&mut self, module: ModuleId, height: usize) {
        self.heights[module] = height;
    }

    /// Name of a module
    pub fn module_name(&self, module: ModuleId) -> &str {
        &self.module_names[module]
    }

    /// Qualified name of a column
    pub fn qualified_name(&self, id: ColumnId) -> String {
        let col = &self.columns[id];
        let module = &self.module_names[col.context.module];
        if module.is_empty() {
            col.name.clone()
        } else {
            format!("{}.{}", module, col.name)
        }
    }

    /// Read the cell at the given (possibly shifted) row.
    ///
    /// Returns `None` for out-of-bounds rows: the "undefined" value
    /// which checkers turn into a skipped row.
    pub fn get(&self, id: ColumnId, row: isize) -> Option<FieldElement> {
        if row < 0 {
            return None;
        }
        self.columns[id].data().get(row as usize).copied()
    }

    /// Prepend `n` rows of zeroes to every populated column and bump
    /// the module heights. This is the spillage phase; placeholder
    /// columns are computed over the padded height afterwards.
    pub fn prepend_zeros(&mut self, n: usize) {
        if n == 0 {
            return;
        }
        for col in &mut self.columns {
            if col.is_populated() {
                col.pad_front(n * col.context.multiplier, FieldElement::zero());
            }
        }
        for h in &mut self.heights {
            *h += n;
        }
    }

    /// Front-pad every module by `n` rows.
    ///
    /// Each column gains `n × multiplier` cells at the front, set to
    /// the column's current first cell (zero when empty). Duplicating
    /// the first cell keeps computed columns consistent, since the
    /// spillage phase guarantees the first row is the all-zero row.
    pub fn pad_front(&mut self, n: usize) {
        if n == 0 {
            return;
        }
        for col in &mut self.columns {
            let value = col.data().first().copied().unwrap_or_else(FieldElement::zero);
            col.pad_front(n * col.context.multiplier, value);
        }
        for h in &mut self.heights {
            *h += n;
        }
    }
}
