//! Form parser: S-expressions into the source AST.
//!
//! Every top-level form is a list headed by a reserved symbol.
//! Errors accumulate across the whole file so a single run reports as
//! much as possible.

use crate::ast::{
    Circuit, ColumnDef, ConstantDef, ConstraintDef, Declaration, Expr, FunDef, ModuleBlock,
    SymbolRef,
};
use crate::error::{Span, SyntaxError};
use crate::sexp::SExp;
use zkcl_spec::{ColumnType, FieldElement};

/// Parse top-level forms into a circuit
pub fn parse_circuit(forms: &[SExp]) -> Result<Circuit, Vec<SyntaxError>> {
    let mut parser = Parser::default();
    for form in forms {
        parser.parse_form(form);
    }
    if parser.errors.is_empty() {
        Ok(parser.circuit)
    } else {
        Err(parser.errors)
    }
}

#[derive(Default)]
struct Parser {
    circuit: Circuit,
    current: Option<usize>,
    errors: Vec<SyntaxError>,
}

impl Parser {
    fn parse_form(&mut self, form: &SExp) {
        let Some(elements) = form.as_list() else {
            self.error(form.span(), "expected a declaration form");
            return;
        };
        let Some(head) = elements.first().and_then(SExp::as_symbol) else {
            self.error(form.span(), "expected a declaration form");
            return;
        };
        let rest = &elements[1..];
        let result = match head {
            "module" => {
                self.parse_module(form.span(), rest);
                return;
            }
            "defcolumns" => self.parse_defcolumns(rest),
            "defconst" => self.parse_defconst(form.span(), rest),
            "defconstraint" => self.parse_defconstraint(form.span(), rest),
            "definrange" => self.parse_definrange(form.span(), rest),
            "definterleaved" => self.parse_definterleaved(form.span(), rest),
            "deflookup" => self.parse_deflookup(form.span(), rest),
            "defpermutation" => self.parse_defpermutation(form.span(), rest),
            "defproperty" => self.parse_defproperty(form.span(), rest),
            "defun" => self.parse_defun(form.span(), rest, false),
            "defpurefun" => self.parse_defun(form.span(), rest, true),
            "defalias" => self.parse_defalias(form.span(), rest, false),
            "defunalias" => self.parse_defalias(form.span(), rest, true),
            "defperspective" => self.parse_defperspective(form.span(), rest),
            other => Err(SyntaxError::new(
                form.span(),
                format!("unknown declaration: {}", other),
            )),
        };
        match result {
            Ok(declaration) => self.push(declaration),
            Err(err) => self.errors.push(err),
        }
    }

    fn parse_module(&mut self, span: Span, rest: &[SExp]) {
        match rest {
            [SExp::Symbol(name, _)] => {
                self.circuit.modules.push(ModuleBlock {
                    name: name.clone(),
                    span,
                    declarations: Vec::new(),
                });
                self.current = Some(self.circuit.modules.len() - 1);
            }
            _ => self.error(span, "malformed module declaration"),
        }
    }

    fn parse_defcolumns(&mut self, rest: &[SExp]) -> Result<Declaration, SyntaxError> {
        let mut columns = Vec::new();
        for entry in rest {
            columns.push(parse_column_def(entry)?);
        }
        Ok(Declaration::Columns(columns))
    }

    fn parse_defconst(&mut self, span: Span, rest: &[SExp]) -> Result<Declaration, SyntaxError> {
        if rest.is_empty() || rest.len() % 2 != 0 {
            return Err(SyntaxError::new(
                span,
                "defconst expects name / value pairs",
            ));
        }
        let mut constants = Vec::new();
        for pair in rest.chunks(2) {
            let name = expect_symbol(&pair[0], "constant name")?;
            constants.push(ConstantDef {
                span: pair[0].span(),
                name: name.to_string(),
                value: parse_expr(&pair[1])?,
            });
        }
        Ok(Declaration::Constants(constants))
    }

    fn parse_defconstraint(
        &mut self,
        span: Span,
        rest: &[SExp],
    ) -> Result<Declaration, SyntaxError> {
        let [handle, options, body] = rest else {
            return Err(SyntaxError::new(
                span,
                "defconstraint expects a handle, an option list and a body",
            ));
        };
        let handle = expect_symbol(handle, "constraint handle")?;
        let (domain, guard, perspective) = parse_constraint_options(options)?;
        Ok(Declaration::Constraint(ConstraintDef {
            span,
            handle: handle.to_string(),
            domain,
            guard,
            perspective,
            body: parse_expr(body)?,
        }))
    }

    fn parse_definrange(&mut self, span: Span, rest: &[SExp]) -> Result<Declaration, SyntaxError> {
        let [expr, bound] = rest else {
            return Err(SyntaxError::new(
                span,
                "definrange expects an expression and a bound",
            ));
        };
        Ok(Declaration::InRange {
            span,
            expr: parse_expr(expr)?,
            bound: parse_expr(bound)?,
        })
    }

    fn parse_definterleaved(
        &mut self,
        span: Span,
        rest: &[SExp],
    ) -> Result<Declaration, SyntaxError> {
        let [target, sources] = rest else {
            return Err(SyntaxError::new(
                span,
                "definterleaved expects a target and a source list",
            ));
        };
        let target = expect_symbol(target, "interleaving target")?;
        let sources = sources
            .as_list()
            .ok_or_else(|| SyntaxError::new(span, "expected a source column list"))?
            .iter()
            .map(parse_symbol_ref)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Declaration::Interleaved {
            span,
            target: target.to_string(),
            sources,
        })
    }

    fn parse_deflookup(&mut self, span: Span, rest: &[SExp]) -> Result<Declaration, SyntaxError> {
        let [handle, targets, sources] = rest else {
            return Err(SyntaxError::new(
                span,
                "deflookup expects a handle, a target list and a source list",
            ));
        };
        let handle = expect_symbol(handle, "lookup handle")?;
        Ok(Declaration::Lookup {
            span,
            handle: handle.to_string(),
            targets: parse_expr_list(targets)?,
            sources: parse_expr_list(sources)?,
        })
    }

    fn parse_defpermutation(
        &mut self,
        span: Span,
        rest: &[SExp],
    ) -> Result<Declaration, SyntaxError> {
        let [targets, sources] = rest else {
            return Err(SyntaxError::new(
                span,
                "defpermutation expects a target list and a source list",
            ));
        };
        let targets = targets
            .as_list()
            .ok_or_else(|| SyntaxError::new(span, "expected a target column list"))?
            .iter()
            .map(parse_column_def)
            .collect::<Result<Vec<_>, _>>()?;
        let sources = sources
            .as_list()
            .ok_or_else(|| SyntaxError::new(span, "expected a source column list"))?
            .iter()
            .map(parse_signed_source)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Declaration::Permutation {
            span,
            targets,
            sources,
        })
    }

    fn parse_defproperty(&mut self, span: Span, rest: &[SExp]) -> Result<Declaration, SyntaxError> {
        let [handle, body] = rest else {
            return Err(SyntaxError::new(
                span,
                "defproperty expects a handle and an expression",
            ));
        };
        let handle = expect_symbol(handle, "property handle")?;
        Ok(Declaration::Property {
            span,
            handle: handle.to_string(),
            body: parse_expr(body)?,
        })
    }

    fn parse_defun(
        &mut self,
        span: Span,
        rest: &[SExp],
        pure: bool,
    ) -> Result<Declaration, SyntaxError> {
        let [signature, body] = rest else {
            return Err(SyntaxError::new(
                span,
                "function declaration expects a signature and a body",
            ));
        };
        let signature = signature
            .as_list()
            .ok_or_else(|| SyntaxError::new(span, "expected a function signature list"))?;
        // The signature is the name followed by parameters; type
        // annotations on either are accepted and ignored.
        let mut name = None;
        let mut params = Vec::new();
        for entry in signature {
            let text = match entry {
                SExp::Symbol(s, _) => s.clone(),
                SExp::List(elements, span) => elements
                    .first()
                    .and_then(SExp::as_symbol)
                    .map(str::to_string)
                    .ok_or_else(|| SyntaxError::new(*span, "malformed parameter"))?,
            };
            if text.starts_with(':') {
                continue;
            }
            if name.is_none() {
                name = Some(text);
            } else {
                params.push(text);
            }
        }
        let name =
            name.ok_or_else(|| SyntaxError::new(span, "function declaration needs a name"))?;
        Ok(Declaration::Fun(FunDef {
            span,
            name,
            params,
            body: parse_expr(body)?,
            pure,
        }))
    }

    fn parse_defalias(
        &mut self,
        span: Span,
        rest: &[SExp],
        functions: bool,
    ) -> Result<Declaration, SyntaxError> {
        if rest.is_empty() || rest.len() % 2 != 0 {
            return Err(SyntaxError::new(span, "expected alias / target pairs"));
        }
        let mut aliases = Vec::new();
        for pair in rest.chunks(2) {
            let alias = expect_symbol(&pair[0], "alias name")?;
            let target = expect_symbol(&pair[1], "alias target")?;
            aliases.push((alias.to_string(), target.to_string()));
        }
        Ok(Declaration::Aliases {
            span,
            functions,
            aliases,
        })
    }

    fn parse_defperspective(
        &mut self,
        span: Span,
        rest: &[SExp],
    ) -> Result<Declaration, SyntaxError> {
        let [name, selector, columns] = rest else {
            return Err(SyntaxError::new(
                span,
                "defperspective expects a name, a selector and a column list",
            ));
        };
        let name = expect_symbol(name, "perspective name")?;
        let columns = columns
            .as_list()
            .ok_or_else(|| SyntaxError::new(span, "expected a perspective column list"))?
            .iter()
            .map(parse_column_def)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Declaration::Perspective {
            span,
            name: name.to_string(),
            selector: parse_expr(selector)?,
            columns,
        })
    }

    fn push(&mut self, declaration: Declaration) {
        match self.current {
            Some(module) => self.circuit.modules[module].declarations.push(declaration),
            None => self.circuit.declarations.push(declaration),
        }
    }

    fn error(&mut self, span: Span, message: impl Into<String>) {
        self.errors.push(SyntaxError::new(span, message));
    }
}

// ============================================================================
// Pieces
// ============================================================================

fn expect_symbol<'a>(node: &'a SExp, what: &str) -> Result<&'a str, SyntaxError> {
    node.as_symbol()
        .ok_or_else(|| SyntaxError::new(node.span(), format!("expected {}", what)))
}

/// Parse a column entry: a bare name or `(name attributes...)`
fn parse_column_def(node: &SExp) -> Result<ColumnDef, SyntaxError> {
    match node {
        SExp::Symbol(name, span) => Ok(ColumnDef {
            span: *span,
            name: name.clone(),
            ty: None,
            multiplier: 1,
        }),
        SExp::List(elements, span) => {
            let name = elements
                .first()
                .and_then(SExp::as_symbol)
                .ok_or_else(|| SyntaxError::new(*span, "expected a column name"))?;
            let mut ty = None;
            let mut multiplier = 1;
            let mut attrs = elements[1..].iter();
            while let Some(attr) = attrs.next() {
                let text = expect_symbol(attr, "column attribute")?;
                if text == ":multiplier" {
                    let value = attrs.next().ok_or_else(|| {
                        SyntaxError::new(attr.span(), ":multiplier expects a value")
                    })?;
                    multiplier = expect_symbol(value, "multiplier value")?
                        .parse::<usize>()
                        .ok()
                        .filter(|m| *m >= 1)
                        .ok_or_else(|| {
                            SyntaxError::new(value.span(), "multiplier must be a positive integer")
                        })?;
                } else if let Some(parsed) = parse_type_token(text) {
                    ty = Some(parsed);
                } else {
                    return Err(SyntaxError::new(
                        attr.span(),
                        format!("unknown column attribute: {}", text),
                    ));
                }
            }
            Ok(ColumnDef {
                span: *span,
                name: name.to_string(),
                ty,
                multiplier,
            })
        }
    }
}

/// Parse `:uN`, `:iN`, `:byte`, each optionally suffixed `@prove`
fn parse_type_token(text: &str) -> Option<ColumnType> {
    let body = text.strip_prefix(':')?;
    let (body, must_prove) = match body.strip_suffix("@prove") {
        Some(body) => (body, true),
        None => (body, false),
    };
    if body == "byte" {
        return Some(ColumnType::Uint { bits: 8, must_prove });
    }
    let bits = body
        .strip_prefix(['u', 'i'])?
        .parse::<u32>()
        .ok()
        .filter(|b| *b >= 1 && *b <= 128)?;
    Some(ColumnType::Uint { bits, must_prove })
}

/// Parse a permutation source: `+name`, `-name` or `(± name)`
fn parse_signed_source(node: &SExp) -> Result<(bool, SymbolRef), SyntaxError> {
    let (sign_text, name_node) = match node {
        SExp::Symbol(text, span) => {
            return if let Some(name) = text.strip_prefix('+') {
                signed_source_of(*span, "+", name)
            } else if let Some(name) = text.strip_prefix('-') {
                signed_source_of(*span, "-", name)
            } else {
                Err(SyntaxError::new(
                    *span,
                    format!("sort direction (+/-) required, found: {}", text),
                ))
            };
        }
        SExp::List(elements, span) => match elements.as_slice() {
            [sign, name] => (expect_symbol(sign, "sort direction")?, name),
            _ => {
                return Err(SyntaxError::new(
                    *span,
                    "expected a signed source column",
                ))
            }
        },
    };
    let name = expect_symbol(name_node, "source column")?;
    signed_source_of(name_node.span(), sign_text, name)
}

fn signed_source_of(
    span: Span,
    sign: &str,
    name: &str,
) -> Result<(bool, SymbolRef), SyntaxError> {
    let ascending = match sign {
        "+" => true,
        "-" => false,
        _ => {
            return Err(SyntaxError::new(
                span,
                format!("sort direction (+/-) required, found: {}{}", sign, name),
            ))
        }
    };
    if name.is_empty() {
        return Err(SyntaxError::new(span, "missing source column name"));
    }
    Ok((ascending, parse_qualified(span, name)))
}

fn parse_constraint_options(
    node: &SExp,
) -> Result<(Option<isize>, Option<Expr>, Option<String>), SyntaxError> {
    let options = node
        .as_list()
        .ok_or_else(|| SyntaxError::new(node.span(), "expected an option list"))?;
    let mut domain = None;
    let mut guard = None;
    let mut perspective = None;
    let mut cursor = options.iter();
    while let Some(key) = cursor.next() {
        let key_text = expect_symbol(key, "constraint option")?;
        let value = cursor
            .next()
            .ok_or_else(|| SyntaxError::new(key.span(), format!("{} expects a value", key_text)))?;
        match key_text {
            ":domain" => {
                let text = expect_symbol(value, "domain row")?;
                let row = text
                    .strip_prefix('{')
                    .and_then(|t| t.strip_suffix('}'))
                    .and_then(|t| t.parse::<isize>().ok())
                    .ok_or_else(|| {
                        SyntaxError::new(value.span(), format!("malformed domain: {}", text))
                    })?;
                domain = Some(row);
            }
            ":guard" => guard = Some(parse_expr(value)?),
            ":perspective" => {
                perspective = Some(expect_symbol(value, "perspective name")?.to_string());
            }
            other => {
                return Err(SyntaxError::new(
                    key.span(),
                    format!("unknown constraint option: {}", other),
                ))
            }
        }
    }
    Ok((domain, guard, perspective))
}

fn parse_expr_list(node: &SExp) -> Result<Vec<Expr>, SyntaxError> {
    node.as_list()
        .ok_or_else(|| SyntaxError::new(node.span(), "expected an expression list"))?
        .iter()
        .map(parse_expr)
        .collect()
}

/// Parse an expression node
pub fn parse_expr(node: &SExp) -> Result<Expr, SyntaxError> {
    match node {
        SExp::Symbol(text, span) => parse_symbol_expr(text, *span),
        SExp::List(elements, span) => {
            let Some(head) = elements.first().and_then(SExp::as_symbol) else {
                return Err(SyntaxError::new(*span, "expected an operator or function"));
            };
            let args = &elements[1..];
            match head {
                "+" => Ok(Expr::Add(*span, parse_args(args)?)),
                "-" => Ok(Expr::Sub(*span, parse_args(args)?)),
                "*" => Ok(Expr::Mul(*span, parse_args(args)?)),
                "^" => match args {
                    [arg, pow] => Ok(Expr::Exp {
                        span: *span,
                        arg: Box::new(parse_expr(arg)?),
                        pow: Box::new(parse_expr(pow)?),
                    }),
                    _ => Err(SyntaxError::new(
                        *span,
                        format!("incorrect number of arguments: {}", args.len()),
                    )),
                },
                "~" => match args {
                    [arg] => Ok(Expr::Normalise(*span, Box::new(parse_expr(arg)?))),
                    _ => Err(SyntaxError::new(
                        *span,
                        format!("incorrect number of arguments: {}", args.len()),
                    )),
                },
                "shift" => parse_shift(*span, args),
                "if" => match args {
                    [c, t] => Ok(Expr::If {
                        span: *span,
                        condition: Box::new(parse_expr(c)?),
                        if_nonzero: Some(Box::new(parse_expr(t)?)),
                        if_zero: None,
                    }),
                    [c, t, e] => Ok(Expr::If {
                        span: *span,
                        condition: Box::new(parse_expr(c)?),
                        if_nonzero: Some(Box::new(parse_expr(t)?)),
                        if_zero: Some(Box::new(parse_expr(e)?)),
                    }),
                    _ => Err(SyntaxError::new(
                        *span,
                        format!("incorrect number of arguments: {}", args.len()),
                    )),
                },
                "ifnot" => match args {
                    [c, t] => Ok(Expr::If {
                        span: *span,
                        condition: Box::new(parse_expr(c)?),
                        if_nonzero: None,
                        if_zero: Some(Box::new(parse_expr(t)?)),
                    }),
                    _ => Err(SyntaxError::new(
                        *span,
                        format!("incorrect number of arguments: {}", args.len()),
                    )),
                },
                "begin" => Ok(Expr::List(*span, parse_args(args)?)),
                name => Ok(Expr::Invoke {
                    span: *span,
                    name: name.to_string(),
                    args: parse_args(args)?,
                }),
            }
        }
    }
}

fn parse_args(args: &[SExp]) -> Result<Vec<Expr>, SyntaxError> {
    args.iter().map(parse_expr).collect()
}

fn parse_shift(span: Span, args: &[SExp]) -> Result<Expr, SyntaxError> {
    let [column, amount] = args else {
        return Err(SyntaxError::new(
            span,
            format!("incorrect number of arguments: {}", args.len()),
        ));
    };
    let name = expect_symbol(column, "column name")?;
    let amount_text = expect_symbol(amount, "shift amount")?;
    let shift = amount_text
        .parse::<isize>()
        .map_err(|_| SyntaxError::new(amount.span(), format!("bad shift: {}", amount_text)))?;
    Ok(Expr::Access(parse_qualified(column.span(), name), shift))
}

fn parse_symbol_expr(text: &str, span: Span) -> Result<Expr, SyntaxError> {
    if let Some(value) = parse_field_literal(text) {
        return Ok(Expr::Const(span, value));
    }
    Ok(Expr::Access(parse_qualified(span, text), 0))
}

fn parse_qualified(span: Span, text: &str) -> SymbolRef {
    match text.split_once('.') {
        Some((module, name)) if !module.is_empty() && !name.is_empty() => SymbolRef {
            span,
            module: Some(module.to_string()),
            name: name.to_string(),
        },
        _ => SymbolRef::local(span, text),
    }
}

/// Parse a numeric literal: decimal of any length, or hex `0x...`,
/// optionally negated
fn parse_field_literal(text: &str) -> Option<FieldElement> {
    let (body, negative) = match text.strip_prefix('-') {
        Some(body) => (body, true),
        None => (text, false),
    };
    let value = if let Some(hex) = body.strip_prefix("0x") {
        u64::from_str_radix(hex, 16).ok().map(FieldElement::new)
    } else if body.chars().all(|c| c.is_ascii_digit()) && !body.is_empty() {
        body.parse::<FieldElement>().ok()
    } else {
        None
    }?;
    Some(if negative { -value } else { value })
}

fn parse_symbol_ref(node: &SExp) -> Result<SymbolRef, SyntaxError> {
    let name = expect_symbol(node, "column name")?;
    Ok(parse_qualified(node.span(), name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sexp::parse_all;

    fn circuit(source: &str) -> Circuit {
        parse_circuit(&parse_all(source).unwrap()).unwrap()
    }

    fn errors(source: &str) -> Vec<SyntaxError> {
        parse_circuit(&parse_all(source).unwrap()).unwrap_err()
    }

    #[test]
    fn test_columns_with_attributes() {
        let c = circuit("(defcolumns X (Y :u16) (Z :byte@prove :multiplier 2))");
        let Declaration::Columns(defs) = &c.declarations[0] else {
            panic!("expected columns");
        };
        assert_eq!(defs.len(), 3);
        assert_eq!(defs[0].ty, None);
        assert_eq!(defs[1].ty, Some(ColumnType::uint(16)));
        assert_eq!(
            defs[2].ty,
            Some(ColumnType::Uint {
                bits: 8,
                must_prove: true
            })
        );
        assert_eq!(defs[2].multiplier, 2);
    }

    #[test]
    fn test_module_scoping() {
        let c = circuit("(defcolumns A) (module m1) (defcolumns B)");
        assert_eq!(c.declarations.len(), 1);
        assert_eq!(c.modules.len(), 1);
        assert_eq!(c.modules[0].name, "m1");
        assert_eq!(c.modules[0].declarations.len(), 1);
    }

    #[test]
    fn test_constraint_with_domain() {
        let c = circuit("(defconstraint first (:domain {0}) X)");
        let Declaration::Constraint(def) = &c.declarations[0] else {
            panic!("expected constraint");
        };
        assert_eq!(def.domain, Some(0));

        let c = circuit("(defconstraint last (:domain {-1}) X)");
        let Declaration::Constraint(def) = &c.declarations[0] else {
            panic!("expected constraint");
        };
        assert_eq!(def.domain, Some(-1));
    }

    #[test]
    fn test_constraint_with_guard() {
        let c = circuit("(defconstraint c (:guard SEL) (- X Y))");
        let Declaration::Constraint(def) = &c.declarations[0] else {
            panic!("expected constraint");
        };
        assert!(def.guard.is_some());
    }

    #[test]
    fn test_if_maps_nonzero_branch_first() {
        let c = circuit("(defconstraint c () (if X (- X 1)))");
        let Declaration::Constraint(def) = &c.declarations[0] else {
            panic!("expected constraint");
        };
        let Expr::If {
            if_nonzero,
            if_zero,
            ..
        } = &def.body
        else {
            panic!("expected if");
        };
        assert!(if_nonzero.is_some());
        assert!(if_zero.is_none());
    }

    #[test]
    fn test_permutation_sources_both_syntaxes() {
        let c = circuit("(defpermutation ((P :i16)) ((+ X)))");
        let Declaration::Permutation {
            targets, sources, ..
        } = &c.declarations[0]
        else {
            panic!("expected permutation");
        };
        assert_eq!(targets[0].ty, Some(ColumnType::uint(16)));
        assert_eq!(sources[0], (true, SymbolRef::local(sources[0].1.span, "X")));

        let c = circuit("(defpermutation (P Q) (-X +Y))");
        let Declaration::Permutation { sources, .. } = &c.declarations[0] else {
            panic!("expected permutation");
        };
        assert!(!sources[0].0);
        assert!(sources[1].0);
    }

    #[test]
    fn test_shift_expression() {
        let c = circuit("(defconstraint c () (- (shift X 1) X))");
        let Declaration::Constraint(def) = &c.declarations[0] else {
            panic!("expected constraint");
        };
        let Expr::Sub(_, args) = &def.body else {
            panic!("expected sub");
        };
        assert!(matches!(args[0], Expr::Access(_, 1)));
    }

    #[test]
    fn test_qualified_access() {
        let c = circuit("(deflookup l (m1.X) (m2.Y))");
        let Declaration::Lookup { targets, .. } = &c.declarations[0] else {
            panic!("expected lookup");
        };
        let Expr::Access(sym, _) = &targets[0] else {
            panic!("expected access");
        };
        assert_eq!(sym.module.as_deref(), Some("m1"));
        assert_eq!(sym.name, "X");
    }

    #[test]
    fn test_literals() {
        assert_eq!(parse_field_literal("42"), Some(FieldElement::new(42)));
        assert_eq!(parse_field_literal("0x10"), Some(FieldElement::new(16)));
        assert_eq!(
            parse_field_literal("-1"),
            Some(-FieldElement::new(1))
        );
        assert_eq!(parse_field_literal("X"), None);
        assert_eq!(parse_field_literal("12a"), None);
    }

    #[test]
    fn test_errors_accumulate_across_forms() {
        let errs = errors("(defconstraint c) (defoops x) (definrange X)");
        assert_eq!(errs.len(), 3);
    }

    #[test]
    fn test_arity_errors_carry_span() {
        let errs = errors("(defconstraint c ()\n  (~ X Y))");
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].span.line, 2);
        assert!(errs[0].message.contains("incorrect number of arguments"));
    }

    #[test]
    fn test_defun_signature() {
        let c = circuit("(defpurefun (plus-one x) (+ x 1))");
        let Declaration::Fun(def) = &c.declarations[0] else {
            panic!("expected function");
        };
        assert_eq!(def.name, "plus-one");
        assert_eq!(def.params, vec!["x"]);
        assert!(def.pure);
    }

    #[test]
    fn test_defconst_pairs() {
        let c = circuit("(defconst A 1 B (+ A 1))");
        let Declaration::Constants(defs) = &c.declarations[0] else {
            panic!("expected constants");
        };
        assert_eq!(defs.len(), 2);
        assert_eq!(defs[1].name, "B");
    }
}
