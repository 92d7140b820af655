//! Binary schema format.
//!
//! JSON interchange for compiled (HIR) schemas, shared with other
//! toolchains:
//!
//! ```text
//! {"columns": [...], "constraints": [...],
//!  "computations": {"computations": [{"Sorted": {...}}, ...]}}
//! ```
//!
//! Column references are strings of the form `module:name:shift`,
//! with the shift elided when zero and the module elided in the
//! prelude. Internal IR types never appear on the wire; everything
//! goes through the `Bin*` structs below.

use crate::error::{Result, SchemaError};
use crate::hir;
use crate::schema::{Assignment, Column, Constraint, Context, Schema};
use crate::types::ColumnType;
use serde::{Deserialize, Serialize};

/// Top-level wire object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BinFile {
    /// Every column in id order
    pub columns: Vec<BinColumn>,
    /// Every constraint in declaration order
    pub constraints: Vec<BinConstraint>,
    /// Assignments, in declaration order
    pub computations: BinComputationSet,
}

/// A column on the wire
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BinColumn {
    /// Qualified `module:name` reference
    pub handle: String,
    /// Rendered column type (`field`, `u8`, `u16@prove`, ...)
    #[serde(rename = "type")]
    pub ty: String,
    /// Length multiplier
    pub multiplier: usize,
}

/// Wrapper matching the nested `computations` object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BinComputationSet {
    /// The assignments
    pub computations: Vec<BinComputation>,
}

/// An assignment on the wire
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum BinComputation {
    /// Sorted permutation
    Sorted {
        /// Source column references
        froms: Vec<String>,
        /// Target column references
        tos: Vec<String>,
        /// Sort direction per column, `true` ascending
        signs: Vec<bool>,
    },
    /// Interleaving
    Interleaved {
        /// Target column reference
        target: String,
        /// Source column references
        froms: Vec<String>,
    },
    /// Computed inverse column
    Inverse {
        /// Target column reference
        target: String,
        /// Inverted expression
        expr: BinExpr,
    },
    /// Byte decomposition
    Bytes {
        /// Handle for failure reports
        handle: String,
        /// Decomposed expression
        expr: BinExpr,
        /// Byte column references, least significant first
        targets: Vec<String>,
    },
}

/// A constraint on the wire
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum BinConstraint {
    /// Vanishing constraint
    Vanishing {
        /// Handle for failure reports
        handle: String,
        /// Enclosing module name
        module: String,
        /// Length multiplier of the context
        multiplier: usize,
        /// Row domain
        domain: Option<isize>,
        /// Constrained expression
        expr: BinExpr,
    },
    /// Lookup constraint
    Lookup {
        /// Handle for failure reports
        handle: String,
        /// Source module name and multiplier
        from_module: String,
        /// Source context multiplier
        from_multiplier: usize,
        /// Target module name
        to_module: String,
        /// Target context multiplier
        to_multiplier: usize,
        /// Source tuple
        from: Vec<BinExpr>,
        /// Target tuple
        to: Vec<BinExpr>,
    },
    /// Range constraint over an expression
    Range {
        /// Handle for failure reports
        handle: String,
        /// Enclosing module name
        module: String,
        /// Length multiplier of the context
        multiplier: usize,
        /// Constrained expression
        expr: BinExpr,
        /// Exclusive upper bound
        bound: u64,
    },
    /// Type constraint on one column
    Type {
        /// Constrained column reference
        column: String,
        /// Required type
        #[serde(rename = "type")]
        ty: String,
    },
    /// Property assertion (reported, never enforced)
    Property {
        /// Handle for reports
        handle: String,
        /// Enclosing module name
        module: String,
        /// Length multiplier of the context
        multiplier: usize,
        /// Asserted expression
        expr: BinExpr,
    },
}

/// An expression on the wire
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum BinExpr {
    /// Decimal constant
    Const(String),
    /// `module:name:shift` column reference
    Column(String),
    /// Sum
    Add(Vec<BinExpr>),
    /// Difference
    Sub(Vec<BinExpr>),
    /// Product
    Mul(Vec<BinExpr>),
    /// Power
    Exp(Box<BinExpr>, u64),
    /// Normalisation
    Norm(Box<BinExpr>),
    /// Conditional: condition, zero branch, non-zero branch
    IfZero(
        Box<BinExpr>,
        Option<Box<BinExpr>>,
        Option<Box<BinExpr>>,
    ),
    /// Constraint-level list
    List(Vec<BinExpr>),
}

// ============================================================================
// Writing
// ============================================================================

/// Serialize an HIR schema to the wire format
pub fn to_binfile(schema: &hir::Schema) -> BinFile {
    let columns = schema
        .columns()
        .map(|c| BinColumn {
            handle: column_handle(schema, c),
            ty: c.ty.to_string(),
            multiplier: c.context.multiplier,
        })
        .collect();

    let mut computations = Vec::new();
    for assignment in schema.assignments() {
        let outputs: Vec<String> = assignment
            .columns()
            .iter()
            .map(|c| column_handle(schema, c))
            .collect();
        computations.push(match assignment {
            Assignment::Interleaving { sources, .. } => BinComputation::Interleaved {
                target: outputs[0].clone(),
                froms: refs_of(schema, sources),
            },
            Assignment::SortedPermutation { signs, sources, .. } => BinComputation::Sorted {
                froms: refs_of(schema, sources),
                tos: outputs,
                signs: signs.clone(),
            },
            Assignment::Inverse { expr, .. } => BinComputation::Inverse {
                target: outputs[0].clone(),
                expr: expr_to_bin(schema, expr),
            },
            Assignment::ByteDecomposition { handle, expr, .. } => BinComputation::Bytes {
                handle: handle.clone(),
                expr: expr_to_bin(schema, expr),
                targets: outputs,
            },
        });
    }

    let mut constraints: Vec<BinConstraint> = schema
        .constraints()
        .iter()
        .map(|c| constraint_to_bin(schema, c))
        .collect();
    for assertion in schema.assertions() {
        constraints.push(BinConstraint::Property {
            handle: assertion.handle.clone(),
            module: schema.modules()[assertion.context.module].name().to_string(),
            multiplier: assertion.context.multiplier,
            expr: expr_to_bin(schema, &assertion.body),
        });
    }

    BinFile {
        columns,
        constraints,
        computations: BinComputationSet { computations },
    }
}

/// Serialize an HIR schema to a JSON string
pub fn to_json(schema: &hir::Schema) -> Result<String> {
    Ok(serde_json::to_string(&to_binfile(schema))?)
}

fn column_handle(schema: &hir::Schema, column: &Column) -> String {
    let module = schema.modules()[column.context.module].name();
    if module.is_empty() {
        column.name.clone()
    } else {
        format!("{}:{}", module, column.name)
    }
}

fn refs_of(schema: &hir::Schema, ids: &[usize]) -> Vec<String> {
    ids.iter()
        .map(|id| column_handle(schema, schema.column(*id)))
        .collect()
}

fn constraint_to_bin(schema: &hir::Schema, constraint: &Constraint<hir::Expr>) -> BinConstraint {
    match constraint {
        Constraint::Vanishing(c) => BinConstraint::Vanishing {
            handle: c.handle.clone(),
            module: schema.modules()[c.context.module].name().to_string(),
            multiplier: c.context.multiplier,
            domain: c.domain,
            expr: expr_to_bin(schema, &c.body),
        },
        Constraint::Lookup(c) => BinConstraint::Lookup {
            handle: c.handle.clone(),
            from_module: schema.modules()[c.source_context.module].name().to_string(),
            from_multiplier: c.source_context.multiplier,
            to_module: schema.modules()[c.target_context.module].name().to_string(),
            to_multiplier: c.target_context.multiplier,
            from: c.sources.iter().map(|e| expr_to_bin(schema, e)).collect(),
            to: c.targets.iter().map(|e| expr_to_bin(schema, e)).collect(),
        },
        Constraint::Range(c) => BinConstraint::Range {
            handle: c.handle.clone(),
            module: schema.modules()[c.context.module].name().to_string(),
            multiplier: c.context.multiplier,
            expr: expr_to_bin(schema, &c.expr),
            bound: c.bound,
        },
        Constraint::Type(c) => BinConstraint::Type {
            column: column_handle(schema, schema.column(c.column)),
            ty: c.ty.to_string(),
        },
    }
}

fn expr_to_bin(schema: &hir::Schema, expr: &hir::Expr) -> BinExpr {
    match expr {
        hir::Expr::Const(c) => BinExpr::Const(c.to_string()),
        hir::Expr::ColumnAccess { column, shift } => {
            let mut handle = column_handle(schema, schema.column(*column));
            if *shift != 0 {
                handle = format!("{}:{}", handle, shift);
            }
            BinExpr::Column(handle)
        }
        hir::Expr::Add(args) => BinExpr::Add(exprs_to_bin(schema, args)),
        hir::Expr::Sub(args) => BinExpr::Sub(exprs_to_bin(schema, args)),
        hir::Expr::Mul(args) => BinExpr::Mul(exprs_to_bin(schema, args)),
        hir::Expr::Exp(arg, pow) => BinExpr::Exp(Box::new(expr_to_bin(schema, arg)), *pow),
        hir::Expr::Normalise(arg) => BinExpr::Norm(Box::new(expr_to_bin(schema, arg))),
        hir::Expr::IfZero {
            condition,
            if_zero,
            if_nonzero,
        } => BinExpr::IfZero(
            Box::new(expr_to_bin(schema, condition)),
            if_zero.as_ref().map(|e| Box::new(expr_to_bin(schema, e))),
            if_nonzero.as_ref().map(|e| Box::new(expr_to_bin(schema, e))),
        ),
        hir::Expr::List(args) => BinExpr::List(exprs_to_bin(schema, args)),
    }
}

fn exprs_to_bin(schema: &hir::Schema, exprs: &[hir::Expr]) -> Vec<BinExpr> {
    exprs.iter().map(|e| expr_to_bin(schema, e)).collect()
}

// ============================================================================
// Reading
// ============================================================================

/// Reconstruct an HIR schema from the wire format
pub fn from_binfile(file: &BinFile) -> Result<hir::Schema> {
    let mut schema: hir::Schema = Schema::new();

    // Parse column metadata and register modules in order of first
    // appearance.
    let mut parsed = Vec::with_capacity(file.columns.len());
    for column in &file.columns {
        let (module, name, shift) = parse_column_ref(&column.handle)?;
        if shift != 0 {
            return Err(SchemaError::MalformedSchema(format!(
                "column declaration {} carries a shift",
                column.handle
            )));
        }
        if !module.is_empty() && module_id(&schema, &module).is_none() {
            schema.add_module(module.clone())?;
        }
        parsed.push((module, name, parse_type(&column.ty)?, column.multiplier));
    }

    // Outputs of computations are computed columns; everything else
    // is an input and must precede them in id order.
    let mut outputs = Vec::new();
    for computation in &file.computations.computations {
        match computation {
            BinComputation::Sorted { tos, .. } => outputs.extend(tos.iter().cloned()),
            BinComputation::Interleaved { target, .. } => outputs.push(target.clone()),
            BinComputation::Inverse { target, .. } => outputs.push(target.clone()),
            BinComputation::Bytes { targets, .. } => outputs.extend(targets.iter().cloned()),
        }
    }
    let is_output = |module: &str, name: &str| {
        outputs.iter().any(|o| {
            parse_column_ref(o)
                .map(|(m, n, _)| m == module && n == name)
                .unwrap_or(false)
        })
    };

    for (module, name, ty, multiplier) in &parsed {
        if is_output(module, name) {
            continue;
        }
        let mid = module_id(&schema, module)
            .ok_or_else(|| SchemaError::MalformedSchema(format!("unknown module {}", module)))?;
        schema.add_data_column(Context::new(mid, *multiplier), name.clone(), *ty)?;
    }

    for computation in &file.computations.computations {
        let assignment = match computation {
            BinComputation::Sorted { froms, tos, signs } => {
                let targets = tos
                    .iter()
                    .map(|t| column_metadata(&schema, &parsed, t))
                    .collect::<Result<Vec<_>>>()?;
                Assignment::SortedPermutation {
                    handle: tos.join(","),
                    targets,
                    signs: signs.clone(),
                    sources: resolve_refs(&schema, froms)?,
                }
            }
            BinComputation::Interleaved { target, froms } => Assignment::Interleaving {
                target: column_metadata(&schema, &parsed, target)?,
                sources: resolve_refs(&schema, froms)?,
            },
            BinComputation::Inverse { target, expr } => Assignment::Inverse {
                target: column_metadata(&schema, &parsed, target)?,
                expr: expr_from_bin(&schema, expr)?,
            },
            BinComputation::Bytes {
                handle,
                expr,
                targets,
            } => Assignment::ByteDecomposition {
                handle: handle.clone(),
                expr: expr_from_bin(&schema, expr)?,
                targets: targets
                    .iter()
                    .map(|t| column_metadata(&schema, &parsed, t))
                    .collect::<Result<Vec<_>>>()?,
            },
        };
        schema.add_assignment(assignment)?;
    }

    // The reconstructed layout must match the file's id order, or
    // every column reference inside the expressions is off.
    let names: Vec<String> = parsed
        .iter()
        .map(|(m, n, _, _)| {
            if m.is_empty() {
                n.clone()
            } else {
                format!("{}.{}", m, n)
            }
        })
        .collect();
    if schema.column_names() != names {
        return Err(SchemaError::MalformedSchema(
            "column order disagrees with computation order".to_string(),
        ));
    }

    for constraint in &file.constraints {
        add_constraint_from_bin(&mut schema, constraint)?;
    }
    Ok(schema)
}

/// Parse a JSON string into an HIR schema
pub fn from_json(text: &str) -> Result<hir::Schema> {
    let file: BinFile = serde_json::from_str(text)?;
    from_binfile(&file)
}

fn module_id(schema: &hir::Schema, name: &str) -> Option<usize> {
    schema.modules().iter().position(|m| m.name() == name)
}

/// The declared metadata of a referenced column
fn column_metadata(
    schema: &hir::Schema,
    parsed: &[(String, String, ColumnType, usize)],
    reference: &str,
) -> Result<Column> {
    let (module, name, _) = parse_column_ref(reference)?;
    let mid = module_id(schema, &module)
        .ok_or_else(|| SchemaError::MalformedSchema(format!("unknown module {}", module)))?;
    let (_, _, ty, multiplier) = parsed
        .iter()
        .find(|(m, n, _, _)| *m == module && *n == name)
        .ok_or_else(|| SchemaError::MalformedSchema(format!("undeclared column {}", reference)))?;
    Ok(Column::new(Context::new(mid, *multiplier), name, *ty))
}

fn context_of(schema: &hir::Schema, module: &str, multiplier: usize) -> Result<Context> {
    let mid = module_id(schema, module)
        .ok_or_else(|| SchemaError::MalformedSchema(format!("unknown module {}", module)))?;
    Ok(Context::new(mid, multiplier))
}

fn add_constraint_from_bin(schema: &mut hir::Schema, constraint: &BinConstraint) -> Result<()> {
    match constraint {
        BinConstraint::Vanishing {
            handle,
            module,
            multiplier,
            domain,
            expr,
        } => {
            let context = context_of(schema, module, *multiplier)?;
            let body = expr_from_bin(schema, expr)?;
            schema.add_vanishing(handle.clone(), context, *domain, body)
        }
        BinConstraint::Lookup {
            handle,
            from_module,
            from_multiplier,
            to_module,
            to_multiplier,
            from,
            to,
        } => {
            let source_context = context_of(schema, from_module, *from_multiplier)?;
            let target_context = context_of(schema, to_module, *to_multiplier)?;
            let sources = exprs_from_bin(schema, from)?;
            let targets = exprs_from_bin(schema, to)?;
            schema.add_lookup(handle.clone(), source_context, target_context, sources, targets)
        }
        BinConstraint::Range {
            handle,
            module,
            multiplier,
            expr,
            bound,
        } => {
            let context = context_of(schema, module, *multiplier)?;
            let expr = expr_from_bin(schema, expr)?;
            schema.add_range(handle.clone(), context, expr, *bound)
        }
        BinConstraint::Type { column, ty } => {
            let id = resolve_ref(schema, column)?;
            schema.add_type_constraint(id, parse_type(ty)?);
            Ok(())
        }
        BinConstraint::Property {
            handle,
            module,
            multiplier,
            expr,
        } => {
            let context = context_of(schema, module, *multiplier)?;
            let body = expr_from_bin(schema, expr)?;
            schema.add_property_assertion(handle.clone(), context, body);
            Ok(())
        }
    }
}

fn expr_from_bin(schema: &hir::Schema, expr: &BinExpr) -> Result<hir::Expr> {
    match expr {
        BinExpr::Const(text) => text
            .parse()
            .map(hir::Expr::Const)
            .map_err(SchemaError::MalformedSchema),
        BinExpr::Column(reference) => {
            let (module, name, shift) = parse_column_ref(reference)?;
            let mid = module_id(schema, &module).ok_or_else(|| {
                SchemaError::MalformedSchema(format!("unknown module {}", module))
            })?;
            let column = schema.column_of(mid, &name).ok_or_else(|| {
                SchemaError::MalformedSchema(format!("unknown column {}", reference))
            })?;
            Ok(hir::Expr::ColumnAccess { column, shift })
        }
        BinExpr::Add(args) => Ok(hir::Expr::Add(exprs_from_bin(schema, args)?)),
        BinExpr::Sub(args) => Ok(hir::Expr::Sub(exprs_from_bin(schema, args)?)),
        BinExpr::Mul(args) => Ok(hir::Expr::Mul(exprs_from_bin(schema, args)?)),
        BinExpr::Exp(arg, pow) => Ok(hir::Expr::Exp(
            Box::new(expr_from_bin(schema, arg)?),
            *pow,
        )),
        BinExpr::Norm(arg) => Ok(hir::Expr::Normalise(Box::new(expr_from_bin(schema, arg)?))),
        BinExpr::IfZero(condition, if_zero, if_nonzero) => Ok(hir::Expr::IfZero {
            condition: Box::new(expr_from_bin(schema, condition)?),
            if_zero: match if_zero {
                Some(e) => Some(Box::new(expr_from_bin(schema, e)?)),
                None => None,
            },
            if_nonzero: match if_nonzero {
                Some(e) => Some(Box::new(expr_from_bin(schema, e)?)),
                None => None,
            },
        }),
        BinExpr::List(args) => Ok(hir::Expr::List(exprs_from_bin(schema, args)?)),
    }
}

fn exprs_from_bin(schema: &hir::Schema, exprs: &[BinExpr]) -> Result<Vec<hir::Expr>> {
    exprs.iter().map(|e| expr_from_bin(schema, e)).collect()
}

fn resolve_ref(schema: &hir::Schema, reference: &str) -> Result<usize> {
    let (module, name, _) = parse_column_ref(reference)?;
    let mid = module_id(schema, &module)
        .ok_or_else(|| SchemaError::MalformedSchema(format!("unknown module {}", module)))?;
    schema
        .column_of(mid, &name)
        .ok_or_else(|| SchemaError::MalformedSchema(format!("unknown column {}", reference)))
}

fn resolve_refs(schema: &hir::Schema, references: &[String]) -> Result<Vec<usize>> {
    references.iter().map(|r| resolve_ref(schema, r)).collect()
}

/// Split a `module:name:shift` reference; the shift defaults to 0 and
/// the module to the prelude
fn parse_column_ref(reference: &str) -> Result<(String, String, isize)> {
    let parts: Vec<&str> = reference.split(':').collect();
    match parts.as_slice() {
        [name] => Ok((String::new(), name.to_string(), 0)),
        [a, b] => match b.parse::<isize>() {
            Ok(shift) => Ok((String::new(), a.to_string(), shift)),
            Err(_) => Ok((a.to_string(), b.to_string(), 0)),
        },
        [module, name, shift] => {
            let shift = shift.parse::<isize>().map_err(|_| {
                SchemaError::MalformedSchema(format!("bad column reference {}", reference))
            })?;
            Ok((module.to_string(), name.to_string(), shift))
        }
        _ => Err(SchemaError::MalformedSchema(format!(
            "bad column reference {}",
            reference
        ))),
    }
}

fn parse_type(text: &str) -> Result<ColumnType> {
    if text == "field" {
        return Ok(ColumnType::Field);
    }
    let (body, must_prove) = match text.strip_suffix("@prove") {
        Some(body) => (body, true),
        None => (text, false),
    };
    let bits = body
        .strip_prefix('u')
        .and_then(|b| b.parse::<u32>().ok())
        .ok_or_else(|| SchemaError::MalformedSchema(format!("bad column type {}", text)))?;
    Ok(ColumnType::Uint { bits, must_prove })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_schema() -> hir::Schema {
        let mut schema: hir::Schema = Schema::new();
        let m1 = schema.add_module("m1").unwrap();
        let ctx = Context::new(0, 1);
        let x = schema
            .add_data_column(ctx, "X", ColumnType::uint(16))
            .unwrap();
        let y = schema
            .add_data_column(Context::new(m1, 1), "Y", ColumnType::Field)
            .unwrap();
        schema
            .add_assignment(Assignment::SortedPermutation {
                handle: "P".to_string(),
                targets: vec![Column::new(ctx, "P", ColumnType::uint(16))],
                signs: vec![true],
                sources: vec![x],
            })
            .unwrap();
        schema
            .add_vanishing(
                "c1",
                ctx,
                Some(0),
                hir::Expr::Sub(vec![hir::Expr::column(x), hir::Expr::constant(1)]),
            )
            .unwrap();
        schema
            .add_lookup(
                "l1",
                ctx,
                Context::new(m1, 1),
                vec![hir::Expr::column(x)],
                vec![hir::Expr::column(y)],
            )
            .unwrap();
        schema.add_type_constraint(x, ColumnType::uint(16));
        schema
    }

    #[test]
    fn test_roundtrip_preserves_shape() {
        let schema = sample_schema();
        let json = to_json(&schema).unwrap();
        let restored = from_json(&json).unwrap();

        assert_eq!(restored.column_names(), schema.column_names());
        assert_eq!(restored.modules().len(), schema.modules().len());
        assert_eq!(restored.constraints().len(), schema.constraints().len());
        assert_eq!(restored.assignments().len(), schema.assignments().len());
    }

    #[test]
    fn test_sorted_computation_wire_shape() {
        let schema = sample_schema();
        let json = to_json(&schema).unwrap();
        assert!(json.contains("\"computations\":{\"computations\":[{\"Sorted\""));
        assert!(json.contains("\"froms\":[\"X\"]"));
        assert!(json.contains("\"signs\":[true]"));
    }

    #[test]
    fn test_column_ref_parsing() {
        assert_eq!(
            parse_column_ref("X").unwrap(),
            (String::new(), "X".to_string(), 0)
        );
        assert_eq!(
            parse_column_ref("m1:X").unwrap(),
            ("m1".to_string(), "X".to_string(), 0)
        );
        assert_eq!(
            parse_column_ref("X:-1").unwrap(),
            (String::new(), "X".to_string(), -1)
        );
        assert_eq!(
            parse_column_ref("m1:X:2").unwrap(),
            ("m1".to_string(), "X".to_string(), 2)
        );
        assert!(parse_column_ref("a:b:c:d").is_err());
    }

    #[test]
    fn test_shifted_access_roundtrip() {
        let mut schema: hir::Schema = Schema::new();
        let ctx = Context::new(0, 1);
        let x = schema
            .add_data_column(ctx, "X", ColumnType::Field)
            .unwrap();
        schema
            .add_vanishing(
                "c",
                ctx,
                None,
                hir::Expr::Sub(vec![hir::Expr::shifted(x, 1), hir::Expr::column(x)]),
            )
            .unwrap();

        let restored = from_json(&to_json(&schema).unwrap()).unwrap();
        match &restored.constraints()[0] {
            Constraint::Vanishing(v) => match &v.body {
                hir::Expr::Sub(args) => {
                    assert_eq!(args[0], hir::Expr::shifted(0, 1));
                }
                other => panic!("unexpected body {:?}", other),
            },
            other => panic!("unexpected constraint {:?}", other),
        }
    }

    #[test]
    fn test_type_parsing() {
        assert_eq!(parse_type("field").unwrap(), ColumnType::Field);
        assert_eq!(parse_type("u8").unwrap(), ColumnType::uint(8));
        assert_eq!(
            parse_type("u16@prove").unwrap(),
            ColumnType::Uint {
                bits: 16,
                must_prove: true
            }
        );
        assert!(parse_type("i8").is_err());
    }

    #[test]
    fn test_malformed_json_rejected() {
        assert!(from_json("{}").is_err());
        assert!(from_json("not json at all").is_err());
    }
}
