//! Translation of a resolved circuit into an HIR schema.
//!
//! Columns are allocated first (inputs, then assignment outputs in
//! declaration order), then constraints are translated. Function
//! invocations are inlined here by substituting translated arguments
//! for parameters; guards and perspective selectors are multiplied
//! into constraint bodies; and every constraint's evaluation context
//! is computed from the columns its body touches.

use crate::ast::{Circuit, ColumnDef, Declaration, Expr, ModuleBlock, SymbolRef};
use crate::error::{CompileError, Span, SyntaxError};
use crate::resolver::{self, Binding, ColumnBinding, Environment};
use std::collections::{BTreeSet, HashMap};
use zkcl_spec::{
    hir, Assignment, Column, ColumnId, ColumnType, Context, Evaluable, Schema,
};

/// Translate a resolved circuit into an HIR schema
pub fn translate(circuit: &Circuit, env: &Environment) -> Result<hir::Schema, CompileError> {
    let mut schema: hir::Schema = Schema::new();
    for block in &circuit.modules {
        schema.add_module(block.name.clone())?;
    }

    let mut translator = Translator {
        env,
        schema,
        ids: HashMap::new(),
        errors: Vec::new(),
        range_count: 0,
    };
    translator.add_input_columns(circuit)?;
    translator.add_assignments(circuit)?;
    translator.add_column_types();
    translator.add_constraints(circuit)?;

    if translator.errors.is_empty() {
        Ok(translator.schema)
    } else {
        Err(CompileError::Syntax(translator.errors))
    }
}

struct Translator<'a> {
    env: &'a Environment,
    schema: hir::Schema,
    /// (module, name) of every allocated column
    ids: HashMap<(usize, String), ColumnId>,
    errors: Vec<SyntaxError>,
    range_count: usize,
}

/// Expression translation context
struct Scope<'a> {
    /// Module the expression is being translated in
    module: usize,
    /// Whether `module.column` qualification is permitted
    qualified: bool,
    /// In-flight function parameters, innermost call only
    params: &'a HashMap<String, hir::Expr>,
}

fn blocks(circuit: &Circuit) -> Vec<(usize, &[Declaration])> {
    let mut out = vec![(0, circuit.declarations.as_slice())];
    out.extend(
        circuit
            .modules
            .iter()
            .enumerate()
            .map(|(i, block): (usize, &ModuleBlock)| (i + 1, block.declarations.as_slice())),
    );
    out
}

impl<'a> Translator<'a> {
    // ========================================================================
    // Columns and assignments
    // ========================================================================

    fn add_input_columns(&mut self, circuit: &Circuit) -> Result<(), CompileError> {
        for (module, declarations) in blocks(circuit) {
            for declaration in declarations {
                match declaration {
                    Declaration::Columns(defs) => {
                        for def in defs {
                            self.add_input_column(module, def)?;
                        }
                    }
                    Declaration::Perspective { columns, .. } => {
                        for def in columns {
                            self.add_input_column(module, def)?;
                        }
                    }
                    _ => {}
                }
            }
        }
        Ok(())
    }

    fn add_input_column(&mut self, module: usize, def: &ColumnDef) -> Result<(), CompileError> {
        let context = Context::new(module, def.multiplier);
        let ty = def.ty.unwrap_or(ColumnType::Field);
        let id = self.schema.add_data_column(context, def.name.clone(), ty)?;
        self.ids.insert((module, def.name.clone()), id);
        Ok(())
    }

    fn add_assignments(&mut self, circuit: &Circuit) -> Result<(), CompileError> {
        // Ids are handed out in declaration order, so later
        // assignments can be referenced before they are built.
        let mut next = self.schema.column_count();
        for (module, declarations) in blocks(circuit) {
            for declaration in declarations {
                match declaration {
                    Declaration::Interleaved { target, .. } => {
                        self.ids.insert((module, target.clone()), next);
                        next += 1;
                    }
                    Declaration::Permutation { targets, .. } => {
                        for target in targets {
                            self.ids.insert((module, target.name.clone()), next);
                            next += 1;
                        }
                    }
                    _ => {}
                }
            }
        }

        for (module, declarations) in blocks(circuit) {
            for declaration in declarations {
                match declaration {
                    Declaration::Interleaved {
                        span,
                        target,
                        sources,
                    } => {
                        if let Err(err) = self.add_interleaving(module, *span, target, sources) {
                            self.errors.push(err);
                        }
                    }
                    Declaration::Permutation {
                        span,
                        targets,
                        sources,
                    } => {
                        if let Err(err) = self.add_permutation(module, *span, targets, sources) {
                            self.errors.push(err);
                        }
                    }
                    _ => {}
                }
            }
        }
        Ok(())
    }

    fn add_interleaving(
        &mut self,
        module: usize,
        span: Span,
        target: &str,
        sources: &[SymbolRef],
    ) -> Result<(), SyntaxError> {
        let binding = self.target_binding(module, span, target)?;
        let column = Column::new(
            Context::new(module, binding.multiplier),
            target,
            binding.ty,
        );
        let source_ids = sources
            .iter()
            .map(|s| self.column_id(module, s).map(|(id, _)| id))
            .collect::<Result<Vec<_>, _>>()?;
        self.schema
            .add_assignment(Assignment::Interleaving {
                target: column,
                sources: source_ids,
            })
            .map_err(|e| SyntaxError::new(span, e.to_string()))?;
        Ok(())
    }

    fn add_permutation(
        &mut self,
        module: usize,
        span: Span,
        targets: &[ColumnDef],
        sources: &[(bool, SymbolRef)],
    ) -> Result<(), SyntaxError> {
        let mut columns = Vec::with_capacity(targets.len());
        for target in targets {
            let binding = self.target_binding(module, target.span, &target.name)?;
            columns.push(Column::new(
                Context::new(module, binding.multiplier),
                target.name.clone(),
                binding.ty,
            ));
        }
        let signs: Vec<bool> = sources.iter().map(|(sign, _)| *sign).collect();
        let source_ids = sources
            .iter()
            .map(|(_, s)| self.column_id(module, s).map(|(id, _)| id))
            .collect::<Result<Vec<_>, _>>()?;
        let handle = targets
            .iter()
            .map(|t| t.name.as_str())
            .collect::<Vec<_>>()
            .join(",");
        self.schema
            .add_assignment(Assignment::SortedPermutation {
                handle,
                targets: columns,
                signs,
                sources: source_ids,
            })
            .map_err(|e| SyntaxError::new(span, e.to_string()))?;
        Ok(())
    }

    fn target_binding(
        &self,
        module: usize,
        span: Span,
        name: &str,
    ) -> Result<ColumnBinding, SyntaxError> {
        match self.env.lookup_exact(module, name) {
            Some(Binding::Column(binding)) => Ok(binding.clone()),
            _ => Err(SyntaxError::new(
                span,
                format!("unknown column {}", name),
            )),
        }
    }

    /// Enforce every non-field column type with a type constraint
    fn add_column_types(&mut self) {
        let specs: Vec<(ColumnId, ColumnType)> = self
            .schema
            .columns()
            .enumerate()
            .map(|(id, c)| (id, c.ty))
            .collect();
        for (id, ty) in specs {
            self.schema.add_type_constraint(id, ty);
        }
    }

    // ========================================================================
    // Constraints
    // ========================================================================

    fn add_constraints(&mut self, circuit: &Circuit) -> Result<(), CompileError> {
        for (module, declarations) in blocks(circuit) {
            for declaration in declarations {
                let result = match declaration {
                    Declaration::Constraint(def) => self.add_constraint(module, def),
                    Declaration::InRange { span, expr, bound } => {
                        self.add_range(module, *span, expr, bound)
                    }
                    Declaration::Lookup {
                        span,
                        handle,
                        targets,
                        sources,
                    } => self.add_lookup(module, *span, handle, targets, sources),
                    Declaration::Property { span, handle, body } => {
                        self.add_property(module, *span, handle, body)
                    }
                    _ => Ok(()),
                };
                if let Err(err) = result {
                    self.errors.push(err);
                }
            }
        }
        Ok(())
    }

    fn add_constraint(
        &mut self,
        module: usize,
        def: &crate::ast::ConstraintDef,
    ) -> Result<(), SyntaxError> {
        let no_params = HashMap::new();
        let scope = Scope {
            module,
            qualified: module == 0,
            params: &no_params,
        };
        let mut body = self.translate_expr(&def.body, &scope)?;
        if let Some(guard) = &def.guard {
            let guard = self.translate_unit(guard, &scope)?;
            body = guard_wrap(&guard, body);
        }
        if let Some(perspective) = &def.perspective {
            let selector = self.perspective_selector(module, def.span, perspective)?;
            body = guard_wrap(&selector, body);
        }
        let context = self.context_of(module, def.span, &body)?;
        self.schema
            .add_vanishing(def.handle.clone(), context, def.domain, body)
            .map_err(|e| SyntaxError::new(def.span, e.to_string()))?;
        Ok(())
    }

    fn perspective_selector(
        &mut self,
        module: usize,
        span: Span,
        name: &str,
    ) -> Result<hir::Expr, SyntaxError> {
        let selector = match self.env.lookup(module, name) {
            Some(Binding::Perspective(binding)) => binding.selector.clone(),
            _ => {
                return Err(SyntaxError::new(
                    span,
                    format!("unknown perspective {}", name),
                ))
            }
        };
        let no_params = HashMap::new();
        let scope = Scope {
            module,
            qualified: module == 0,
            params: &no_params,
        };
        self.translate_unit(&selector, &scope)
    }

    fn add_range(
        &mut self,
        module: usize,
        span: Span,
        expr: &Expr,
        bound: &Expr,
    ) -> Result<(), SyntaxError> {
        let no_params = HashMap::new();
        let scope = Scope {
            module,
            qualified: module == 0,
            params: &no_params,
        };
        let expr = self.translate_unit(expr, &scope)?;
        let bound = resolver::eval_const(bound, self.env, module)?.value();
        if bound == 0 || !bound.is_power_of_two() {
            return Err(SyntaxError::new(
                span,
                format!("range bound must be a power of two, found {}", bound),
            ));
        }
        let context = self.context_of(module, span, &expr)?;
        let handle = format!("range#{}", self.range_count);
        self.range_count += 1;
        self.schema
            .add_range(handle, context, expr, bound)
            .map_err(|e| SyntaxError::new(span, e.to_string()))?;
        Ok(())
    }

    fn add_lookup(
        &mut self,
        module: usize,
        span: Span,
        handle: &str,
        targets: &[Expr],
        sources: &[Expr],
    ) -> Result<(), SyntaxError> {
        let no_params = HashMap::new();
        // Each side has its own scope: the two sides may live in
        // distinct modules, so qualification is always available.
        let scope = Scope {
            module,
            qualified: true,
            params: &no_params,
        };
        let sources = sources
            .iter()
            .map(|e| self.translate_unit(e, &scope))
            .collect::<Result<Vec<_>, _>>()?;
        let targets = targets
            .iter()
            .map(|e| self.translate_unit(e, &scope))
            .collect::<Result<Vec<_>, _>>()?;
        let source_context = self.contexts_of(module, span, &sources)?;
        let target_context = self.contexts_of(module, span, &targets)?;
        self.schema
            .add_lookup(handle, source_context, target_context, sources, targets)
            .map_err(|e| SyntaxError::new(span, e.to_string()))?;
        Ok(())
    }

    fn add_property(
        &mut self,
        module: usize,
        span: Span,
        handle: &str,
        body: &Expr,
    ) -> Result<(), SyntaxError> {
        let no_params = HashMap::new();
        let scope = Scope {
            module,
            qualified: module == 0,
            params: &no_params,
        };
        let body = self.translate_expr(body, &scope)?;
        let context = self.context_of(module, span, &body)?;
        self.schema.add_property_assertion(handle, context, body);
        Ok(())
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    fn translate_expr(&mut self, expr: &Expr, scope: &Scope) -> Result<hir::Expr, SyntaxError> {
        match expr {
            Expr::Const(_, value) => Ok(hir::Expr::Const(*value)),
            Expr::Access(symbol, shift) => self.translate_access(symbol, *shift, scope),
            Expr::Add(_, args) => Ok(hir::Expr::Add(self.translate_units(args, scope)?)),
            Expr::Sub(_, args) => Ok(hir::Expr::Sub(self.translate_units(args, scope)?)),
            Expr::Mul(_, args) => Ok(hir::Expr::Mul(self.translate_units(args, scope)?)),
            Expr::Exp { span, arg, pow } => {
                let base = self.translate_unit(arg, scope)?;
                let pow = resolver::eval_const(pow, self.env, scope.module)
                    .map_err(|_| SyntaxError::new(*span, "exponent must be constant"))?;
                Ok(hir::Expr::Exp(Box::new(base), pow.value()))
            }
            Expr::Normalise(_, arg) => Ok(hir::Expr::Normalise(Box::new(
                self.translate_unit(arg, scope)?,
            ))),
            Expr::If {
                condition,
                if_nonzero,
                if_zero,
                ..
            } => {
                let condition = Box::new(self.translate_unit(condition, scope)?);
                let if_nonzero = match if_nonzero {
                    Some(branch) => Some(Box::new(self.translate_expr(branch, scope)?)),
                    None => None,
                };
                let if_zero = match if_zero {
                    Some(branch) => Some(Box::new(self.translate_expr(branch, scope)?)),
                    None => None,
                };
                Ok(hir::Expr::IfZero {
                    condition,
                    if_zero,
                    if_nonzero,
                })
            }
            Expr::List(_, args) => {
                let args = args
                    .iter()
                    .map(|a| self.translate_expr(a, scope))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(hir::Expr::List(args))
            }
            Expr::Invoke { span, name, args } => self.translate_invoke(*span, name, args, scope),
        }
    }

    /// Translate an expression that must produce a single value
    fn translate_unit(&mut self, expr: &Expr, scope: &Scope) -> Result<hir::Expr, SyntaxError> {
        let translated = self.translate_expr(expr, scope)?;
        if is_multi_valued(&translated) {
            return Err(SyntaxError::new(
                expr.span(),
                "multi-valued expression not permitted here",
            ));
        }
        Ok(translated)
    }

    fn translate_units(
        &mut self,
        args: &[Expr],
        scope: &Scope,
    ) -> Result<Vec<hir::Expr>, SyntaxError> {
        args.iter().map(|a| self.translate_unit(a, scope)).collect()
    }

    fn translate_access(
        &mut self,
        symbol: &SymbolRef,
        shift: isize,
        scope: &Scope,
    ) -> Result<hir::Expr, SyntaxError> {
        // Function parameters shadow everything else.
        if symbol.module.is_none() {
            if let Some(argument) = scope.params.get(&symbol.name) {
                return apply_shift(symbol.span, argument.clone(), shift);
            }
        }
        if symbol.module.is_some() && !scope.qualified {
            return Err(SyntaxError::new(
                symbol.span,
                "qualified access not permitted here",
            ));
        }
        if let Some(qualifier) = &symbol.module {
            if self.env.module_id(qualifier).is_none() {
                return Err(SyntaxError::new(
                    symbol.span,
                    format!("unknown module {}", qualifier),
                ));
            }
        }
        match self.resolve_binding(scope.module, symbol) {
            Some(Binding::Constant(binding)) => match binding.value {
                Some(value) => Ok(hir::Expr::Const(value)),
                None => Err(SyntaxError::new(
                    symbol.span,
                    format!("unresolved constant {}", symbol.name),
                )),
            },
            Some(Binding::Column(_)) => {
                let (id, _) = self.column_id(scope.module, symbol)?;
                Ok(hir::Expr::ColumnAccess { column: id, shift })
            }
            Some(_) => Err(SyntaxError::new(
                symbol.span,
                format!("{} is not a column", symbol.name),
            )),
            None => Err(SyntaxError::new(
                symbol.span,
                format!("unresolved symbol {}", symbol.name),
            )),
        }
    }

    fn translate_invoke(
        &mut self,
        span: Span,
        name: &str,
        args: &[Expr],
        scope: &Scope,
    ) -> Result<hir::Expr, SyntaxError> {
        let function = match self.env.lookup(scope.module, name) {
            Some(Binding::Function(binding)) => binding.clone(),
            Some(_) => {
                return Err(SyntaxError::new(
                    span,
                    format!("{} is not a function", name),
                ))
            }
            None => {
                return Err(SyntaxError::new(span, format!("unknown function {}", name)))
            }
        };
        if function.params.len() != args.len() {
            return Err(SyntaxError::new(
                span,
                format!(
                    "{} expects {} argument(s), found {}",
                    name,
                    function.params.len(),
                    args.len()
                ),
            ));
        }
        let mut params = HashMap::new();
        for (param, arg) in function.params.iter().zip(args) {
            params.insert(param.clone(), self.translate_unit(arg, scope)?);
        }
        let inner = Scope {
            module: scope.module,
            qualified: scope.qualified,
            params: &params,
        };
        self.translate_expr(&function.body, &inner)
    }

    fn resolve_binding(&self, module: usize, symbol: &SymbolRef) -> Option<&Binding> {
        match &symbol.module {
            Some(qualifier) => {
                let mid = self.env.module_id(qualifier)?;
                self.env.lookup_exact(mid, &symbol.name)
            }
            None => self.env.lookup(module, &symbol.name),
        }
    }

    /// The id of the column a symbol resolves to, following aliases
    /// and the prelude fallback
    fn column_id(
        &self,
        module: usize,
        symbol: &SymbolRef,
    ) -> Result<(ColumnId, ColumnBinding), SyntaxError> {
        let binding = match self.resolve_binding(module, symbol) {
            Some(Binding::Column(binding)) => binding.clone(),
            _ => {
                return Err(SyntaxError::new(
                    symbol.span,
                    format!("{} is not a column", symbol.name),
                ))
            }
        };
        let home = match &symbol.module {
            Some(qualifier) => self.env.module_id(qualifier).ok_or_else(|| {
                SyntaxError::new(symbol.span, format!("unknown module {}", qualifier))
            })?,
            None => module,
        };
        let id = self
            .ids
            .get(&(home, binding.name.clone()))
            .or_else(|| self.ids.get(&(0, binding.name.clone())))
            .copied()
            .ok_or_else(|| {
                SyntaxError::new(symbol.span, format!("unresolved column {}", symbol.name))
            })?;
        Ok((id, binding))
    }

    // ========================================================================
    // Contexts
    // ========================================================================

    /// The unique context of an expression's column accesses (I1/I2)
    fn context_of(
        &self,
        module: usize,
        span: Span,
        expr: &hir::Expr,
    ) -> Result<Context, SyntaxError> {
        let mut columns = BTreeSet::new();
        expr.collect_columns(&mut columns);
        self.join_columns(module, span, &columns)
    }

    /// The unique context across several expressions
    fn contexts_of(
        &self,
        module: usize,
        span: Span,
        exprs: &[hir::Expr],
    ) -> Result<Context, SyntaxError> {
        let mut columns = BTreeSet::new();
        for expr in exprs {
            expr.collect_columns(&mut columns);
        }
        self.join_columns(module, span, &columns)
    }

    fn join_columns(
        &self,
        module: usize,
        span: Span,
        columns: &BTreeSet<ColumnId>,
    ) -> Result<Context, SyntaxError> {
        let mut joined: Option<Context> = None;
        for id in columns {
            let context = self.schema.column(*id).context;
            joined = match joined {
                None => Some(context),
                Some(current) => match current.join(context) {
                    Some(j) => Some(j),
                    None => {
                        let message = if current.module != context.module {
                            "conflicting evaluation context"
                        } else {
                            "conflicting length multiplier"
                        };
                        return Err(SyntaxError::new(span, message));
                    }
                },
            };
        }
        // An empty body falls back to the declared module.
        Ok(joined.unwrap_or_else(|| Context::new(module, 1)))
    }
}

/// Shift an inlined parameter access; only column accesses can absorb
/// a non-zero shift
fn apply_shift(span: Span, expr: hir::Expr, shift: isize) -> Result<hir::Expr, SyntaxError> {
    if shift == 0 {
        return Ok(expr);
    }
    match expr {
        hir::Expr::ColumnAccess { column, shift: s } => Ok(hir::Expr::ColumnAccess {
            column,
            shift: s + shift,
        }),
        _ => Err(SyntaxError::new(
            span,
            "only column accesses can be shifted",
        )),
    }
}

/// Multiply a guard into a body, distributing over lists and into
/// conditional branches so list-valued bodies stay constraint-level
fn guard_wrap(guard: &hir::Expr, body: hir::Expr) -> hir::Expr {
    match body {
        hir::Expr::List(args) => hir::Expr::List(
            args.into_iter()
                .map(|arg| guard_wrap(guard, arg))
                .collect(),
        ),
        hir::Expr::IfZero {
            condition,
            if_zero,
            if_nonzero,
        } => hir::Expr::IfZero {
            condition,
            if_zero: if_zero.map(|branch| Box::new(guard_wrap(guard, *branch))),
            if_nonzero: if_nonzero.map(|branch| Box::new(guard_wrap(guard, *branch))),
        },
        other => hir::Expr::Mul(vec![guard.clone(), other]),
    }
}

/// Whether an expression produces several values at the top level
fn is_multi_valued(expr: &hir::Expr) -> bool {
    match expr {
        hir::Expr::List(_) => true,
        hir::Expr::IfZero {
            if_zero,
            if_nonzero,
            ..
        } => {
            if_zero.as_deref().is_some_and(is_multi_valued)
                || if_nonzero.as_deref().is_some_and(is_multi_valued)
        }
        _ => false,
    }
}
