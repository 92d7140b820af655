//! Symbol resolution.
//!
//! Two phases per module. Initialisation allocates a binding for
//! every symbol a declaration defines, rejecting duplicates.
//! Finalisation then runs an iterative fixed point: a declaration is
//! ready once all of its dependencies are bound and finalised, and
//! finalising it fills in whatever the binding was still missing
//! (constant values, interleaving types and multipliers, and so on).
//! A pass that makes no progress means the remaining declarations
//! depend on each other, which is reported as a cyclic declaration.

use crate::ast::{Circuit, ColumnDef, ConstantDef, Declaration, Expr, SymbolRef};
use crate::error::{Span, SyntaxError};
use std::collections::HashMap;
use zkcl_spec::{ColumnType, FieldElement};

/// A resolved symbol
#[derive(Debug, Clone)]
pub enum Binding {
    /// A column (input, interleaved, permuted or perspective)
    Column(ColumnBinding),
    /// A named constant
    Constant(ConstantBinding),
    /// A function available for invocation
    Function(FunctionBinding),
    /// A perspective and its selector
    Perspective(PerspectiveBinding),
    /// An alias awaiting its target; replaced by a copy of the
    /// target's binding at finalisation
    Alias {
        /// Name of the aliased symbol
        target: String,
        /// Whether declared with `defunalias`
        functions: bool,
    },
}

/// Binding for a column
#[derive(Debug, Clone)]
pub struct ColumnBinding {
    /// Unaliased column name
    pub name: String,
    /// Declared or computed type
    pub ty: ColumnType,
    /// Length multiplier
    pub multiplier: usize,
    /// Whether the column is an assignment output
    pub computed: bool,
    /// Whether type and multiplier are final
    pub finalised: bool,
}

/// Binding for a constant
#[derive(Debug, Clone)]
pub struct ConstantBinding {
    /// Folded value; `None` until finalised
    pub value: Option<FieldElement>,
}

/// Binding for a function
#[derive(Debug, Clone)]
pub struct FunctionBinding {
    /// Parameter names
    pub params: Vec<String>,
    /// Body to inline at invocation sites
    pub body: Expr,
    /// Whether declared with `defpurefun`
    pub pure: bool,
    /// Whether the body has been resolved
    pub finalised: bool,
}

/// Binding for a perspective
#[derive(Debug, Clone)]
pub struct PerspectiveBinding {
    /// Selector expression guarding the perspective's constraints
    pub selector: Expr,
    /// Whether the selector has been resolved
    pub finalised: bool,
}

impl Binding {
    fn is_finalised(&self) -> bool {
        match self {
            Binding::Column(c) => c.finalised,
            Binding::Constant(c) => c.value.is_some(),
            Binding::Function(f) => f.finalised,
            Binding::Perspective(p) => p.finalised,
            Binding::Alias { .. } => false,
        }
    }
}

/// One module's name space
#[derive(Debug)]
pub struct ModuleScope {
    /// Module name; empty for the prelude
    pub name: String,
    bindings: HashMap<String, Binding>,
}

/// The resolved name spaces of a circuit, module by module
#[derive(Debug)]
pub struct Environment {
    modules: Vec<ModuleScope>,
}

impl Environment {
    /// Index of a module by name; the prelude is index 0
    pub fn module_id(&self, name: &str) -> Option<usize> {
        self.modules.iter().position(|m| m.name == name)
    }

    /// The module scopes, prelude first
    pub fn modules(&self) -> &[ModuleScope] {
        &self.modules
    }

    /// Look a symbol up in a module, falling back to the prelude
    pub fn lookup(&self, module: usize, name: &str) -> Option<&Binding> {
        self.modules[module]
            .bindings
            .get(name)
            .or_else(|| self.modules[0].bindings.get(name))
    }

    /// Look a symbol up in exactly one module, no fallback
    pub fn lookup_exact(&self, module: usize, name: &str) -> Option<&Binding> {
        self.modules[module].bindings.get(name)
    }

    fn declare(&mut self, module: usize, name: &str, binding: Binding) -> bool {
        if self.modules[module].bindings.contains_key(name) {
            return false;
        }
        self.modules[module].bindings.insert(name.to_string(), binding);
        true
    }

    fn resolve_ref(&self, module: usize, symbol: &SymbolRef) -> Option<&Binding> {
        match &symbol.module {
            Some(qualifier) => {
                let mid = self.module_id(qualifier)?;
                self.lookup_exact(mid, &symbol.name)
            }
            None => self.lookup(module, &symbol.name),
        }
    }
}

/// Resolve every symbol declared and used in a circuit
pub fn resolve(circuit: &Circuit) -> Result<Environment, Vec<SyntaxError>> {
    let mut env = environment_of(circuit)?;
    initialise(circuit, &mut env)?;
    finalise(circuit, &mut env)?;
    Ok(env)
}

fn environment_of(circuit: &Circuit) -> Result<Environment, Vec<SyntaxError>> {
    let mut modules = vec![ModuleScope {
        name: String::new(),
        bindings: builtins(),
    }];
    let mut errors = Vec::new();
    for block in &circuit.modules {
        if modules.iter().any(|m| m.name == block.name) {
            errors.push(SyntaxError::new(
                block.span,
                format!("module {} already declared", block.name),
            ));
            continue;
        }
        modules.push(ModuleScope {
            name: block.name.clone(),
            bindings: HashMap::new(),
        });
    }
    if errors.is_empty() {
        Ok(Environment { modules })
    } else {
        Err(errors)
    }
}

/// Functions available without declaration
fn builtins() -> HashMap<String, Binding> {
    let mut bindings = HashMap::new();
    // The canonical way to state that an expression vanishes.
    bindings.insert(
        "vanishes!".to_string(),
        Binding::Function(FunctionBinding {
            params: vec!["e".to_string()],
            body: Expr::Access(SymbolRef::local(Span::default(), "e"), 0),
            pure: true,
            finalised: true,
        }),
    );
    bindings
}

fn declarations(circuit: &Circuit) -> Vec<(usize, &Declaration)> {
    let mut out: Vec<(usize, &Declaration)> =
        circuit.declarations.iter().map(|d| (0, d)).collect();
    for (i, block) in circuit.modules.iter().enumerate() {
        out.extend(block.declarations.iter().map(move |d| (i + 1, d)));
    }
    out
}

// ============================================================================
// Phase 1: initialisation
// ============================================================================

fn initialise(circuit: &Circuit, env: &mut Environment) -> Result<(), Vec<SyntaxError>> {
    let mut errors = Vec::new();
    for (module, declaration) in declarations(circuit) {
        for (name, span, binding) in initial_bindings(declaration) {
            if !env.declare(module, &name, binding) {
                let scope = if env.modules[module].name.is_empty() {
                    "the prelude".to_string()
                } else {
                    format!("module {}", env.modules[module].name)
                };
                errors.push(SyntaxError::new(
                    span,
                    format!("symbol {} already declared in {}", name, scope),
                ));
            }
        }
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn initial_bindings(declaration: &Declaration) -> Vec<(String, Span, Binding)> {
    fn data_column(def: &ColumnDef) -> (String, Span, Binding) {
        (
            def.name.clone(),
            def.span,
            Binding::Column(ColumnBinding {
                name: def.name.clone(),
                ty: def.ty.unwrap_or(ColumnType::Field),
                multiplier: def.multiplier,
                computed: false,
                finalised: true,
            }),
        )
    }

    match declaration {
        Declaration::Columns(defs) => defs.iter().map(data_column).collect(),
        Declaration::Constants(defs) => defs
            .iter()
            .map(|d| {
                (
                    d.name.clone(),
                    d.span,
                    Binding::Constant(ConstantBinding { value: None }),
                )
            })
            .collect(),
        Declaration::Interleaved { span, target, .. } => vec![(
            target.clone(),
            *span,
            Binding::Column(ColumnBinding {
                name: target.clone(),
                ty: ColumnType::Field,
                multiplier: 1,
                computed: true,
                finalised: false,
            }),
        )],
        Declaration::Permutation { targets, .. } => targets
            .iter()
            .map(|def| {
                (
                    def.name.clone(),
                    def.span,
                    Binding::Column(ColumnBinding {
                        name: def.name.clone(),
                        ty: def.ty.unwrap_or(ColumnType::Field),
                        multiplier: 1,
                        computed: true,
                        finalised: false,
                    }),
                )
            })
            .collect(),
        Declaration::Fun(def) => vec![(
            def.name.clone(),
            def.span,
            Binding::Function(FunctionBinding {
                params: def.params.clone(),
                body: def.body.clone(),
                pure: def.pure,
                finalised: false,
            }),
        )],
        Declaration::Aliases {
            span,
            functions,
            aliases,
        } => aliases
            .iter()
            .map(|(alias, target)| {
                (
                    alias.clone(),
                    *span,
                    Binding::Alias {
                        target: target.clone(),
                        functions: *functions,
                    },
                )
            })
            .collect(),
        Declaration::Perspective {
            span,
            name,
            selector,
            columns,
        } => {
            let mut out = vec![(
                name.clone(),
                *span,
                Binding::Perspective(PerspectiveBinding {
                    selector: selector.clone(),
                    finalised: false,
                }),
            )];
            out.extend(columns.iter().map(data_column));
            out
        }
        Declaration::Constraint(_)
        | Declaration::InRange { .. }
        | Declaration::Lookup { .. }
        | Declaration::Property { .. } => Vec::new(),
    }
}

// ============================================================================
// Phase 2: finalisation
// ============================================================================

fn finalise(circuit: &Circuit, env: &mut Environment) -> Result<(), Vec<SyntaxError>> {
    let all = declarations(circuit);
    let mut finalised = vec![false; all.len()];
    let mut changed = true;
    let mut complete = false;
    let mut incomplete: Option<Span> = None;

    // Every productive pass finalises at least one declaration, so
    // the loop runs at most one pass per declaration. A pass that
    // finalises nothing while work remains means the leftovers wait
    // on each other.
    while changed && !complete {
        let mut errors = Vec::new();
        changed = false;
        complete = true;
        for (index, (module, declaration)) in all.iter().enumerate() {
            if finalised[index] {
                continue;
            }
            match readiness(env, *module, declaration) {
                Readiness::Unknown(errs) => errors.extend(errs),
                Readiness::Waiting => {
                    complete = false;
                    incomplete = Some(declaration.span());
                }
                Readiness::Ready => {
                    match finalise_declaration(env, *module, declaration) {
                        Ok(()) => {
                            finalised[index] = true;
                            changed = true;
                        }
                        Err(errs) => errors.extend(errs),
                    }
                }
            }
        }
        if !errors.is_empty() {
            return Err(errors);
        }
    }

    if !complete {
        let span = incomplete.unwrap_or_default();
        return Err(vec![SyntaxError::new(span, "cyclic declaration")]);
    }
    Ok(())
}

enum Readiness {
    Ready,
    Waiting,
    Unknown(Vec<SyntaxError>),
}

fn readiness(env: &Environment, module: usize, declaration: &Declaration) -> Readiness {
    let mut errors = Vec::new();
    let mut waiting = false;
    for symbol in declaration.dependencies() {
        match env.resolve_ref(module, &symbol) {
            None => errors.push(SyntaxError::new(
                symbol.span,
                format!("unknown symbol {}", symbol.name),
            )),
            Some(binding) if !binding.is_finalised() => waiting = true,
            Some(_) => {}
        }
    }
    if !errors.is_empty() {
        Readiness::Unknown(errors)
    } else if waiting {
        Readiness::Waiting
    } else {
        Readiness::Ready
    }
}

fn finalise_declaration(
    env: &mut Environment,
    module: usize,
    declaration: &Declaration,
) -> Result<(), Vec<SyntaxError>> {
    match declaration {
        Declaration::Constants(defs) => finalise_constants(env, module, defs),
        Declaration::Interleaved {
            span,
            target,
            sources,
        } => finalise_interleaved(env, module, *span, target, sources),
        Declaration::Permutation {
            targets, sources, ..
        } => finalise_permutation(env, module, targets, sources),
        Declaration::Fun(def) => {
            if let Some(Binding::Function(binding)) =
                env.modules[module].bindings.get_mut(&def.name)
            {
                binding.finalised = true;
            }
            Ok(())
        }
        Declaration::Perspective { name, .. } => {
            if let Some(Binding::Perspective(binding)) =
                env.modules[module].bindings.get_mut(name)
            {
                binding.finalised = true;
            }
            Ok(())
        }
        Declaration::Aliases { span, aliases, .. } => {
            finalise_aliases(env, module, *span, aliases)
        }
        // Constraint-like declarations carry no binding of their own;
        // readiness of their dependencies is all that matters here.
        Declaration::Columns(_)
        | Declaration::Constraint(_)
        | Declaration::InRange { .. }
        | Declaration::Lookup { .. }
        | Declaration::Property { .. } => Ok(()),
    }
}

/// Fold the pairs of one defconst. Pairs may reference each other in
/// any order, so evaluation repeats over the not-yet-folded values
/// until they all fold or no further value does.
fn finalise_constants(
    env: &mut Environment,
    module: usize,
    defs: &[ConstantDef],
) -> Result<(), Vec<SyntaxError>> {
    let mut pending: Vec<&ConstantDef> = defs.iter().collect();
    while !pending.is_empty() {
        let before = pending.len();
        let mut deferred = Vec::new();
        let mut failures = Vec::new();
        for def in pending {
            match eval_const(&def.value, env, module) {
                Ok(value) => {
                    if let Some(Binding::Constant(binding)) =
                        env.modules[module].bindings.get_mut(&def.name)
                    {
                        binding.value = Some(value);
                    }
                }
                Err(err) => {
                    failures.push(err);
                    deferred.push(def);
                }
            }
        }
        if deferred.len() == before {
            // Nothing folded this round: the leftovers reference each
            // other, or something genuinely non-constant.
            let unfolded: Vec<&str> = deferred.iter().map(|d| d.name.as_str()).collect();
            let errors = deferred
                .iter()
                .zip(failures)
                .map(|(def, failure)| {
                    let mut symbols = Vec::new();
                    def.value.collect_symbols(&mut symbols);
                    let cyclic = symbols
                        .iter()
                        .any(|s| s.module.is_none() && unfolded.contains(&s.name.as_str()));
                    if cyclic {
                        SyntaxError::new(def.span, "cyclic declaration")
                    } else {
                        failure
                    }
                })
                .collect();
            return Err(errors);
        }
        pending = deferred;
    }
    Ok(())
}

fn column_binding<'a>(
    env: &'a Environment,
    module: usize,
    symbol: &SymbolRef,
) -> Result<&'a ColumnBinding, SyntaxError> {
    match env.resolve_ref(module, symbol) {
        Some(Binding::Column(binding)) => Ok(binding),
        Some(_) => Err(SyntaxError::new(
            symbol.span,
            format!("{} is not a column", symbol.name),
        )),
        None => Err(SyntaxError::new(
            symbol.span,
            format!("unknown symbol {}", symbol.name),
        )),
    }
}

fn finalise_interleaved(
    env: &mut Environment,
    module: usize,
    span: Span,
    target: &str,
    sources: &[SymbolRef],
) -> Result<(), Vec<SyntaxError>> {
    let mut errors = Vec::new();
    let mut multiplier = 1;
    let mut ty = ColumnType::uint(1);
    for (i, source) in sources.iter().enumerate() {
        let binding = match column_binding(env, module, source) {
            Ok(b) => b,
            Err(e) => {
                errors.push(e);
                continue;
            }
        };
        if i == 0 {
            multiplier = binding.multiplier;
        } else if binding.multiplier != multiplier {
            errors.push(SyntaxError::new(
                source.span,
                format!(
                    "source column {} has incompatible length multiplier",
                    source.name
                ),
            ));
        }
        ty = ty.join(binding.ty);
    }
    if !errors.is_empty() {
        return Err(errors);
    }
    if let Some(Binding::Column(binding)) = env.modules[module].bindings.get_mut(target) {
        binding.multiplier = multiplier * sources.len();
        binding.ty = ty;
        binding.finalised = true;
        Ok(())
    } else {
        Err(vec![SyntaxError::new(span, "interleaving target lost")])
    }
}

fn finalise_permutation(
    env: &mut Environment,
    module: usize,
    targets: &[ColumnDef],
    sources: &[(bool, SymbolRef)],
) -> Result<(), Vec<SyntaxError>> {
    if targets.len() != sources.len() {
        return Err(vec![SyntaxError::new(
            targets.first().map(|t| t.span).unwrap_or_default(),
            "permutation requires one target per source",
        )]);
    }
    let mut errors = Vec::new();
    let mut multiplier = None;
    for (target, (_, source)) in targets.iter().zip(sources) {
        let binding = match column_binding(env, module, source) {
            Ok(b) => b.clone(),
            Err(e) => {
                errors.push(e);
                continue;
            }
        };
        // A fixed-width source is required so sortedness is
        // meaningful; an explicit target annotation supplies the
        // width when the source ranges over the whole field.
        let ty = match target.ty {
            Some(declared) => declared,
            None if binding.ty.is_field() => {
                errors.push(SyntaxError::new(
                    source.span,
                    "fixed-width type required",
                ));
                continue;
            }
            None => binding.ty,
        };
        match multiplier {
            None => multiplier = Some(binding.multiplier),
            Some(m) if m != binding.multiplier => {
                errors.push(SyntaxError::new(
                    source.span,
                    "incompatible length multiplier",
                ));
                continue;
            }
            Some(_) => {}
        }
        if let Some(Binding::Column(target_binding)) =
            env.modules[module].bindings.get_mut(&target.name)
        {
            target_binding.ty = ty;
            target_binding.multiplier = binding.multiplier;
            target_binding.finalised = true;
        }
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn finalise_aliases(
    env: &mut Environment,
    module: usize,
    span: Span,
    aliases: &[(String, String)],
) -> Result<(), Vec<SyntaxError>> {
    let mut errors = Vec::new();
    for (alias, target) in aliases {
        let functions = matches!(
            env.modules[module].bindings.get(alias),
            Some(Binding::Alias {
                functions: true,
                ..
            })
        );
        let resolved = env
            .lookup(module, target)
            .cloned()
            .ok_or_else(|| SyntaxError::new(span, format!("unknown symbol {}", target)));
        match resolved {
            Ok(binding) => {
                let matches_kind = match (&binding, functions) {
                    (Binding::Function(_), true) => true,
                    (Binding::Function(_), false) => false,
                    (_, false) => true,
                    (_, true) => false,
                };
                if !matches_kind {
                    errors.push(SyntaxError::new(
                        span,
                        format!("alias {} has the wrong kind of target", alias),
                    ));
                } else {
                    env.modules[module]
                        .bindings
                        .insert(alias.clone(), binding);
                }
            }
            Err(err) => errors.push(err),
        }
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

// ============================================================================
// Constant folding
// ============================================================================

/// Fold an expression down to a constant, or report why it cannot be
pub fn eval_const(
    expr: &Expr,
    env: &Environment,
    module: usize,
) -> Result<FieldElement, SyntaxError> {
    match expr {
        Expr::Const(_, value) => Ok(*value),
        Expr::Access(symbol, shift) => {
            if *shift != 0 {
                return Err(SyntaxError::new(
                    symbol.span,
                    "shifted access is not constant",
                ));
            }
            match env.resolve_ref(module, symbol) {
                Some(Binding::Constant(ConstantBinding { value: Some(v) })) => Ok(*v),
                Some(_) | None => Err(SyntaxError::new(
                    symbol.span,
                    format!("{} is not a constant", symbol.name),
                )),
            }
        }
        Expr::Add(_, args) => {
            let mut sum = FieldElement::zero();
            for arg in args {
                sum += eval_const(arg, env, module)?;
            }
            Ok(sum)
        }
        Expr::Sub(span, args) => {
            let mut iter = args.iter();
            let first = iter
                .next()
                .ok_or_else(|| SyntaxError::new(*span, "empty subtraction"))?;
            let mut acc = eval_const(first, env, module)?;
            for arg in iter {
                acc -= eval_const(arg, env, module)?;
            }
            Ok(acc)
        }
        Expr::Mul(_, args) => {
            let mut prod = FieldElement::one();
            for arg in args {
                prod *= eval_const(arg, env, module)?;
            }
            Ok(prod)
        }
        Expr::Exp { arg, pow, .. } => {
            let base = eval_const(arg, env, module)?;
            let exponent = eval_const(pow, env, module)?;
            Ok(base.pow(exponent.value()))
        }
        Expr::Normalise(_, arg) => {
            let value = eval_const(arg, env, module)?;
            Ok(if value.is_zero() {
                FieldElement::zero()
            } else {
                FieldElement::one()
            })
        }
        Expr::If { span, .. } | Expr::List(span, _) | Expr::Invoke { span, .. } => Err(
            SyntaxError::new(*span, "expression is not constant-foldable"),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_circuit;
    use crate::sexp::parse_all;

    fn resolve_source(source: &str) -> Result<Environment, Vec<SyntaxError>> {
        let circuit = parse_circuit(&parse_all(source).unwrap()).unwrap();
        resolve(&circuit)
    }

    fn constant(env: &Environment, name: &str) -> FieldElement {
        match env.lookup(0, name) {
            Some(Binding::Constant(ConstantBinding { value: Some(v) })) => *v,
            other => panic!("expected constant, got {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_symbol_rejected() {
        let errors = resolve_source("(defcolumns X X)").unwrap_err();
        assert!(errors[0].message.contains("already declared"));
    }

    #[test]
    fn test_unknown_symbol_reported() {
        let errors = resolve_source("(defconstraint c () (+ X 1))").unwrap_err();
        assert!(errors[0].message.contains("unknown symbol X"));
    }

    #[test]
    fn test_constants_fold_in_dependency_order() {
        let env = resolve_source("(defconst B (+ A 1) A 41)").unwrap();
        assert_eq!(constant(&env, "A"), FieldElement::new(41));
        assert_eq!(constant(&env, "B"), FieldElement::new(42));
    }

    #[test]
    fn test_cyclic_constants_rejected() {
        let errors = resolve_source("(defconst A (+ B 1) B (+ A 1))").unwrap_err();
        assert!(errors[0].message.contains("cyclic declaration"));
    }

    #[test]
    fn test_interleaved_target_finalised() {
        let env =
            resolve_source("(defcolumns (X :u8) (Y :u16)) (definterleaved Z (X Y))").unwrap();
        match env.lookup(0, "Z") {
            Some(Binding::Column(binding)) => {
                assert_eq!(binding.multiplier, 2);
                assert_eq!(binding.ty, ColumnType::uint(16));
                assert!(binding.computed);
            }
            other => panic!("expected column, got {:?}", other),
        }
    }

    #[test]
    fn test_interleaving_of_interleaving() {
        // W depends on Z, which itself is interleaved: two passes of
        // the fixed point are needed.
        let env = resolve_source(
            "(defcolumns (X :u8) (Y :u8)) (definterleaved Z (X Y)) (definterleaved W (Z Z))",
        )
        .unwrap();
        match env.lookup(0, "W") {
            Some(Binding::Column(binding)) => assert_eq!(binding.multiplier, 4),
            other => panic!("expected column, got {:?}", other),
        }
    }

    #[test]
    fn test_permutation_inherits_source_type() {
        let env =
            resolve_source("(defcolumns (X :u16)) (defpermutation (P) ((+ X)))").unwrap();
        match env.lookup(0, "P") {
            Some(Binding::Column(binding)) => {
                assert_eq!(binding.ty, ColumnType::uint(16));
                assert!(binding.finalised);
            }
            other => panic!("expected column, got {:?}", other),
        }
    }

    #[test]
    fn test_permutation_of_field_column_needs_annotation() {
        let errors = resolve_source("(defcolumns X) (defpermutation (P) ((+ X)))").unwrap_err();
        assert!(errors[0].message.contains("fixed-width type required"));

        // The annotated form is accepted.
        resolve_source("(defcolumns X) (defpermutation ((P :i16)) ((+ X)))").unwrap();
    }

    #[test]
    fn test_reverse_declared_interleaving_chain() {
        // Each pass can only finalise the next link, so resolution
        // takes as many passes as the chain is deep.
        let env = resolve_source(
            "(definterleaved E (D D)) (definterleaved D (C C)) (definterleaved C (B B)) \
             (definterleaved B (A A)) (defcolumns (A :u8))",
        )
        .unwrap();
        match env.lookup(0, "E") {
            Some(Binding::Column(binding)) => assert_eq!(binding.multiplier, 16),
            other => panic!("expected column, got {:?}", other),
        }
    }

    #[test]
    fn test_non_constant_defconst_value_rejected() {
        let errors = resolve_source("(defcolumns X) (defconst A X)").unwrap_err();
        assert!(errors[0].message.contains("not a constant"));
    }

    #[test]
    fn test_cyclic_interleaving_rejected() {
        let errors =
            resolve_source("(definterleaved A (B B)) (definterleaved B (A A))").unwrap_err();
        assert!(errors[0].message.contains("cyclic declaration"));
    }

    #[test]
    fn test_alias_resolves_to_target() {
        let env = resolve_source("(defcolumns (X :u8)) (defalias Y X)").unwrap();
        match env.lookup(0, "Y") {
            Some(Binding::Column(binding)) => assert_eq!(binding.name, "X"),
            other => panic!("expected column, got {:?}", other),
        }
    }

    #[test]
    fn test_unalias_requires_function_target() {
        let errors = resolve_source("(defcolumns X) (defunalias f X)").unwrap_err();
        assert!(errors[0].message.contains("wrong kind of target"));
    }

    #[test]
    fn test_self_recursive_function_rejected() {
        let errors =
            resolve_source("(defpurefun (f x) (f x)) (defcolumns X) (defconstraint c () (f X))")
                .unwrap_err();
        assert!(errors[0].message.contains("cyclic declaration"));
    }

    #[test]
    fn test_builtin_vanishes_is_available() {
        resolve_source("(defcolumns X) (defconstraint c () (vanishes! X))").unwrap();
    }

    #[test]
    fn test_module_scopes_are_separate() {
        let env = resolve_source(
            "(defcolumns X) (module m1) (defcolumns X)",
        )
        .unwrap();
        assert!(env.lookup_exact(0, "X").is_some());
        assert!(env.lookup_exact(1, "X").is_some());
    }

    #[test]
    fn test_qualified_dependency() {
        resolve_source(
            "(module m1) (defcolumns X) (module m2) (defcolumns Y) (deflookup l (m1.X) (Y))",
        )
        .unwrap();
    }
}
