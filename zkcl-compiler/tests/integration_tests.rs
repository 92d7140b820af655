//! Integration tests for the zkcl front end: whole programs through
//! the reader, resolver and translator.

use zkcl_compiler::compile;
use zkcl_spec::{ColumnType, Constraint};

#[test]
fn test_full_program_compiles() {
    let source = r#"
        ;; A miniature accumulator circuit.
        (defconst INIT 0)
        (defpurefun (next e) (shift e 1))

        (module acc)
        (defcolumns (ACC :u16) (DELTA :u8))
        (defconstraint boot (:domain {0}) (vanishes! (- ACC INIT)))
        (defconstraint step () (vanishes! (- (next ACC) ACC DELTA)))
    "#;

    let schema = compile(source).unwrap();
    assert_eq!(schema.modules().len(), 2);
    assert_eq!(schema.modules()[1].name(), "acc");
    assert_eq!(schema.column_count(), 2);

    // Two declared type constraints plus the two vanishing ones.
    let vanishing = schema
        .constraints()
        .iter()
        .filter(|c| matches!(c, Constraint::Vanishing(_)))
        .count();
    let types = schema
        .constraints()
        .iter()
        .filter(|c| matches!(c, Constraint::Type(_)))
        .count();
    assert_eq!((vanishing, types), (2, 2));
}

#[test]
fn test_constraint_context_is_module_scoped() {
    let source = "(module m1) (defcolumns X) (defconstraint c () (vanishes! X))";
    let schema = compile(source).unwrap();
    match &schema.constraints()[0] {
        Constraint::Vanishing(v) => assert_eq!(v.context.module, 1),
        other => panic!("unexpected constraint {:?}", other),
    }
}

#[test]
fn test_interleaved_column_metadata() {
    let source = "(defcolumns (A :u8) (B :u16)) (definterleaved C (A B))";
    let schema = compile(source).unwrap();
    let c = schema.column(2);
    assert_eq!(c.name, "C");
    assert_eq!(c.context.multiplier, 2);
    assert_eq!(c.ty, ColumnType::uint(16));
}

#[test]
fn test_permutation_allocates_targets_in_pair_order() {
    let source = "(defcolumns (A :u8) (B :u8)) (defpermutation (P Q) (-A +B))";
    let schema = compile(source).unwrap();
    assert_eq!(schema.column(2).name, "P");
    assert_eq!(schema.column(3).name, "Q");
    assert_eq!(schema.assignments().len(), 1);
}

#[test]
fn test_lookup_between_modules() {
    let source = "(module a) (defcolumns X)
                  (module b) (defcolumns Y)
                  (deflookup l (b.Y) (a.X))";
    let schema = compile(source).unwrap();
    match &schema.constraints()[0] {
        Constraint::Lookup(l) => {
            assert_eq!(l.source_context.module, 1);
            assert_eq!(l.target_context.module, 2);
        }
        other => panic!("unexpected constraint {:?}", other),
    }
}

#[test]
fn test_nested_function_invocations() {
    let source = "(defcolumns X)
                  (defpurefun (double e) (* 2 e))
                  (defpurefun (quad e) (double (double e)))
                  (defconstraint c () (vanishes! (quad X)))";
    let schema = compile(source).unwrap();
    assert_eq!(schema.constraints().len(), 1);
}

#[test]
fn test_constants_across_modules() {
    let source = "(defconst LIMIT 255)
                  (module m) (defcolumns X)
                  (defconstraint c () (vanishes! (- X LIMIT)))";
    compile(source).unwrap();
}
