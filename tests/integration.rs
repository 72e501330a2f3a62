//! End-to-end integration tests for the hyperground engine.
//!
//! These exercise instantiation and evaluation through the public `Engine`
//! facade, with the in-memory atom space, registered foreign executors and a
//! closure-backed pattern query engine working together.

use std::sync::Arc;

use hyperground::atom::{AtomType, Bindings, Handle};
use hyperground::engine::{Engine, EngineConfig};
use hyperground::error::{ExecError, ExecResult, HgError, StoreError};
use hyperground::foreign::ForeignExecutor;
use hyperground::store::GraphStore;
use hyperground::truth::TruthValue;

/// Install an env-filtered subscriber once per test binary; `RUST_LOG`
/// overrides the default `warn` level.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

fn test_engine() -> Engine {
    init_tracing();
    Engine::new(EngineConfig::default()).unwrap()
}

fn bindings(pairs: &[(&Handle, Handle)]) -> Bindings {
    pairs.iter().map(|(k, v)| ((*k).clone(), v.clone())).collect()
}

fn grounded_predicate(name: &str, args: Vec<Handle>) -> Handle {
    Handle::link(
        AtomType::Evaluation,
        vec![
            Handle::node(AtomType::GroundedPredicate, name),
            Handle::list(args),
        ],
    )
}

fn assert_exec_err(
    result: Result<impl std::fmt::Debug, HgError>,
    check: fn(&ExecError) -> bool,
) {
    match result {
        Err(HgError::Exec(err)) => assert!(check(&err), "unexpected error: {err:?}"),
        other => panic!("expected an execution error, got {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// Instantiation
// ---------------------------------------------------------------------------

#[test]
fn identity_is_preserved_without_bindings() {
    let engine = test_engine();
    let expr = Handle::link(
        AtomType::Inheritance,
        vec![
            Handle::variable("$X"),
            Handle::list(vec![Handle::concept("a"), Handle::variable("$Y")]),
        ],
    );
    let out = engine
        .instantiator()
        .ground(&expr, &bindings(&[(&Handle::variable("$Z"), Handle::number(1.0))]))
        .unwrap()
        .unwrap();
    assert!(out.ptr_eq(&expr));
}

#[test]
fn substitution_replaces_every_occurrence() {
    let engine = test_engine();
    let x = Handle::variable("X");
    let expr = Handle::list(vec![x.clone(), x.clone()]);
    let out = engine
        .instantiate(&expr, &bindings(&[(&x, Handle::number(5.0))]))
        .unwrap()
        .unwrap();
    assert_eq!(out, Handle::list(vec![Handle::number(5.0), Handle::number(5.0)]));
    assert!(engine.space().contains(&out));
}

#[test]
fn quoting_is_opaque() {
    let engine = test_engine();
    let x = Handle::variable("X");
    let quoted = Handle::link(AtomType::Quote, vec![x.clone()]);
    let out = engine
        .instantiate(&quoted, &bindings(&[(&x, Handle::number(5.0))]))
        .unwrap()
        .unwrap();
    assert_eq!(out, quoted);
}

#[test]
fn redex_is_beta_reduced() {
    let engine = test_engine();
    let y = Handle::variable("Y");
    let put = Handle::link(AtomType::Put, vec![Handle::list(vec![y]), Handle::number(7.0)]);
    let out = engine.instantiate(&put, &Bindings::new()).unwrap().unwrap();
    assert_eq!(out, Handle::list(vec![Handle::number(7.0)]));
}

#[test]
fn redex_argument_is_substituted_first() {
    let engine = test_engine();
    let x = Handle::variable("$X");
    let y = Handle::variable("$Y");
    let template = Handle::link(
        AtomType::Lambda,
        vec![y.clone(), Handle::link(AtomType::Times, vec![y, Handle::number(2.0)])],
    );
    let put = Handle::link(AtomType::Put, vec![template, x.clone()]);
    let out = engine
        .instantiate(&put, &bindings(&[(&x, Handle::number(21.0))]))
        .unwrap()
        .unwrap();
    assert_eq!(out, Handle::number(42.0));
}

#[test]
fn fold_reduces_and_is_idempotent() {
    let engine = test_engine();
    let sum = Handle::link(AtomType::Plus, vec![Handle::number(2.0), Handle::number(3.0)]);
    let five = engine.instantiate(&sum, &Bindings::new()).unwrap().unwrap();
    assert_eq!(five, Handle::number(5.0));
    let again = engine.instantiate(&five, &Bindings::new()).unwrap().unwrap();
    assert_eq!(again, five);
}

#[test]
fn delete_removes_from_store() {
    let engine = test_engine();
    let a = engine
        .space()
        .add_link(AtomType::Member, vec![Handle::concept("m"), Handle::concept("group")])
        .unwrap();
    let out = engine
        .instantiate(&Handle::link(AtomType::Delete, vec![a.clone()]), &Bindings::new())
        .unwrap();
    assert!(out.is_none());
    assert!(engine.space().get(&a).is_none());
}

#[test]
fn delete_keeps_referenced_atoms() {
    let engine = test_engine();
    let a = engine.space().add_node(AtomType::Concept, "shared");
    let parent = engine
        .space()
        .add_link(AtomType::List, vec![a.clone()])
        .unwrap();
    let out = engine
        .instantiate(&Handle::link(AtomType::Delete, vec![a.clone()]), &Bindings::new())
        .unwrap();
    assert!(out.is_none());
    assert!(engine.space().contains(&a));
    assert!(engine.space().contains(&parent));
}

#[test]
fn delete_skips_unbound_variables() {
    let engine = test_engine();
    let x = engine.space().add_node(AtomType::Variable, "X");
    let out = engine
        .instantiate(&Handle::link(AtomType::Delete, vec![x.clone()]), &Bindings::new())
        .unwrap();
    assert!(out.is_none());
    assert!(engine.space().contains(&x));
}

#[test]
fn delete_resolves_bound_variables() {
    let engine = test_engine();
    let doomed = engine.space().add_node(AtomType::Concept, "doomed");
    let x = Handle::variable("X");
    engine
        .instantiate(
            &Handle::link(AtomType::Delete, vec![x.clone()]),
            &bindings(&[(&x, doomed.clone())]),
        )
        .unwrap();
    assert!(!engine.space().contains(&doomed));
}

#[test]
fn defined_schema_is_expanded() {
    let engine = test_engine();
    let name = Handle::node(AtomType::DefinedSchema, "double");
    let a = Handle::variable("$a");
    let body = Handle::link(
        AtomType::Lambda,
        vec![a.clone(), Handle::link(AtomType::Times, vec![a, Handle::number(2.0)])],
    );
    engine.define(&name, &body).unwrap();

    let call = Handle::link(
        AtomType::ExecutionOutput,
        vec![name, Handle::list(vec![Handle::number(4.5)])],
    );
    let out = engine.instantiate(&call, &Bindings::new()).unwrap().unwrap();
    assert_eq!(out, Handle::number(9.0));
}

#[test]
fn stored_define_link_is_the_definition() {
    let engine = test_engine();
    let name = Handle::node(AtomType::DefinedSchema, "seven");
    let body = Handle::link(AtomType::Plus, vec![Handle::number(3.0), Handle::number(4.0)]);
    engine
        .space()
        .add(&Handle::link(AtomType::Define, vec![name.clone(), body]))
        .unwrap();

    let out = engine.instantiate(&name, &Bindings::new()).unwrap().unwrap();
    assert_eq!(out, Handle::number(7.0));

    assert!(matches!(
        engine.define(&name, &Handle::concept("other")).unwrap_err(),
        HgError::Store(StoreError::AlreadyDefined { .. })
    ));
    assert_eq!(engine.space().incoming(&name).len(), 1);
}

#[test]
fn undefined_expression_is_invalid() {
    let engine = test_engine();
    let err = engine
        .instantiator()
        .instantiate(None, &Bindings::new())
        .unwrap_err();
    assert!(matches!(err, ExecError::InvalidExpression { .. }));
}

#[test]
fn reentrant_grounding_is_not_walked_twice() {
    let engine = test_engine();
    let x = Handle::variable("$X");
    let y = Handle::variable("$Y");
    let pending = Handle::link(AtomType::Plus, vec![Handle::number(1.0), Handle::number(1.0)]);
    let b = bindings(&[(&x, Handle::list(vec![y.clone()])), (&y, pending.clone())]);
    let out = engine.instantiate(&x, &b).unwrap().unwrap();
    assert_eq!(out, Handle::list(vec![pending]));
}

#[test]
fn get_delegates_to_query_engine() {
    let matcher = |query: &Handle| -> ExecResult<Vec<Handle>> {
        assert!(query.is_type(AtomType::Get));
        Ok(vec![Handle::concept("cat"), Handle::concept("dog")])
    };
    let engine = test_engine().with_query_engine(Arc::new(matcher));
    let x = Handle::variable("$X");
    let clause = Handle::link(AtomType::Inheritance, vec![x.clone(), Handle::concept("animal")]);
    let get = Handle::link(AtomType::Get, vec![clause]);
    let out = engine.instantiate(&get, &Bindings::new()).unwrap().unwrap();
    assert_eq!(
        out,
        Handle::set(vec![Handle::concept("cat"), Handle::concept("dog")])
    );
}

#[test]
fn get_without_query_engine_fails() {
    let engine = test_engine();
    let get = Handle::link(AtomType::Get, vec![Handle::concept("pattern")]);
    assert_exec_err(engine.instantiate(&get, &Bindings::new()), |e| {
        matches!(e, ExecError::QueryEngineUnavailable)
    });
}

// ---------------------------------------------------------------------------
// Foreign executors
// ---------------------------------------------------------------------------

/// Scheme stand-in: `make-pair` builds a List of its arguments reversed,
/// `always` is true, `graded` is uncertain.
struct FakeScheme;

impl ForeignExecutor for FakeScheme {
    fn namespace(&self) -> &str {
        "scm"
    }

    fn execute(&self, name: &str, args: &Handle) -> ExecResult<Handle> {
        match name {
            "make-pair" => {
                let mut items = args.outgoing().to_vec();
                items.reverse();
                Ok(Handle::list(items))
            }
            other => Err(ExecError::ForeignFailure {
                namespace: "scm".into(),
                name: other.into(),
                message: "no such procedure".into(),
            }),
        }
    }

    fn evaluate(&self, name: &str, _args: &Handle) -> ExecResult<TruthValue> {
        match name {
            "graded" => Ok(TruthValue::new(0.6, 7.0)),
            other => Ok(TruthValue::crisp(other == "always")),
        }
    }
}

#[test]
fn grounded_schema_runs_foreign_executor() {
    let engine = test_engine();
    engine.register_executor(Arc::new(FakeScheme)).unwrap();
    let x = Handle::variable("$X");
    let call = Handle::link(
        AtomType::ExecutionOutput,
        vec![
            Handle::node(AtomType::GroundedSchema, "scm: make-pair"),
            Handle::list(vec![x.clone(), Handle::concept("b")]),
        ],
    );
    let out = engine
        .instantiate(&call, &bindings(&[(&x, Handle::concept("a"))]))
        .unwrap()
        .unwrap();
    assert_eq!(out, Handle::list(vec![Handle::concept("b"), Handle::concept("a")]));
    assert!(engine.space().contains(&out));
}

#[test]
fn foreign_failure_propagates() {
    let engine = test_engine();
    engine.register_executor(Arc::new(FakeScheme)).unwrap();
    let call = Handle::link(
        AtomType::ExecutionOutput,
        vec![
            Handle::node(AtomType::GroundedSchema, "scm:explode"),
            Handle::list(vec![]),
        ],
    );
    assert_exec_err(engine.instantiate(&call, &Bindings::new()), |e| {
        matches!(e, ExecError::ForeignFailure { .. })
    });
}

#[test]
fn grounded_schema_in_unknown_namespace() {
    let engine = test_engine();
    let call = Handle::link(
        AtomType::ExecutionOutput,
        vec![
            Handle::node(AtomType::GroundedSchema, "lua:thing"),
            Handle::list(vec![]),
        ],
    );
    assert_exec_err(engine.instantiate(&call, &Bindings::new()), |e| {
        matches!(e, ExecError::UnknownSchemaNamespace { .. })
    });
}

#[test]
fn grounded_predicate_runs_foreign_executor() {
    let engine = test_engine();
    engine.register_executor(Arc::new(FakeScheme)).unwrap();
    let tv = engine
        .evaluate(&grounded_predicate("scm: always", vec![]))
        .unwrap();
    assert_eq!(tv, TruthValue::TRUE);
}

#[test]
fn missing_backend_is_reported() {
    let engine = test_engine();
    assert_exec_err(
        engine.evaluate(&grounded_predicate("py:is_red", vec![])),
        |e| matches!(e, ExecError::BackendUnavailable { .. }),
    );
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

#[test]
fn exclusivity_predicate() {
    let engine = test_engine();
    let (a, b, c) = (Handle::concept("A"), Handle::concept("B"), Handle::concept("C"));
    let dup = engine
        .evaluate(&grounded_predicate("native:exclusive", vec![a.clone(), b.clone(), a.clone()]))
        .unwrap();
    assert_eq!(dup.strength(), 0.0);
    let distinct = engine
        .evaluate(&grounded_predicate("native:exclusive", vec![a, b, c]))
        .unwrap();
    assert_eq!(distinct, TruthValue::TRUE);
}

#[test]
fn greater_than_with_reduction() {
    let engine = test_engine();
    let sum = Handle::link(AtomType::Plus, vec![Handle::number(2.0), Handle::number(3.0)]);
    let gt = Handle::link(AtomType::GreaterThan, vec![sum, Handle::number(4.0)]);
    assert_eq!(engine.evaluate(&gt).unwrap(), TruthValue::TRUE);
}

#[test]
fn not_is_an_involution() {
    let engine = test_engine();
    engine.register_executor(Arc::new(FakeScheme)).unwrap();

    let predicates = [
        Handle::link(AtomType::Equal, vec![Handle::concept("a"), Handle::concept("a")]),
        Handle::link(AtomType::Equal, vec![Handle::concept("a"), Handle::concept("b")]),
        Handle::link(AtomType::GreaterThan, vec![Handle::number(1.0), Handle::number(2.0)]),
    ];
    let foreign = [
        grounded_predicate("scm:always", vec![]),
        grounded_predicate("scm:graded", vec![]),
    ];
    for p in predicates.iter().chain(&foreign) {
        let twice = Handle::link(
            AtomType::Not,
            vec![Handle::link(AtomType::Not, vec![p.clone()])],
        );
        let direct = engine.evaluate(p).unwrap();
        let negated = engine.evaluate(&twice).unwrap();
        assert!((direct.strength() - negated.strength()).abs() < 1e-12);
        assert_eq!(direct.count(), negated.count());
        assert_eq!(direct.confidence(), negated.confidence());
    }
}

#[test]
fn not_keeps_uncertain_evidence() {
    let engine = test_engine();
    engine.register_executor(Arc::new(FakeScheme)).unwrap();
    let once = Handle::link(AtomType::Not, vec![grounded_predicate("scm:graded", vec![])]);
    let tv = engine.evaluate(&once).unwrap();
    assert!((tv.strength() - 0.4).abs() < 1e-12);
    assert_eq!(tv.count(), 7.0);
}

#[test]
fn arity_errors_are_structural() {
    let engine = test_engine();
    let (a, b, c) = (Handle::concept("A"), Handle::concept("B"), Handle::concept("C"));
    assert_exec_err(
        engine.evaluate(&Handle::link(AtomType::Equal, vec![a.clone()])),
        |e| matches!(e, ExecError::StructuralError { .. }),
    );
    assert_exec_err(
        engine.evaluate(&Handle::link(AtomType::GreaterThan, vec![a, b, c])),
        |e| matches!(e, ExecError::StructuralError { .. }),
    );
}

#[test]
fn unknown_predicate_namespace() {
    let engine = test_engine();
    assert_exec_err(
        engine.evaluate(&grounded_predicate("foo:bar", vec![Handle::concept("x")])),
        |e| matches!(e, ExecError::UnknownPredicateNamespace { .. }),
    );
}

#[test]
fn non_predicates_are_not_evaluable() {
    let engine = test_engine();
    assert_exec_err(engine.evaluate(&Handle::list(vec![])), |e| {
        matches!(e, ExecError::NotEvaluable { .. })
    });
}

// ---------------------------------------------------------------------------
// Concurrency
// ---------------------------------------------------------------------------

#[test]
fn executor_registered_on_shared_engine() {
    let engine = Arc::new(test_engine());
    let call = grounded_predicate("scm:always", vec![]);
    assert_exec_err(engine.evaluate(&call), |e| {
        matches!(e, ExecError::BackendUnavailable { .. })
    });

    let registrar = {
        let engine = Arc::clone(&engine);
        std::thread::spawn(move || engine.register_executor(Arc::new(FakeScheme)))
    };
    registrar.join().unwrap().unwrap();
    assert_eq!(engine.evaluate(&call).unwrap(), TruthValue::TRUE);
}

#[test]
fn concurrent_instantiations_are_independent() {
    let engine = Arc::new(test_engine());
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let engine = Arc::clone(&engine);
            std::thread::spawn(move || {
                let x = Handle::variable("$X");
                let expr = Handle::link(AtomType::Plus, vec![x.clone(), Handle::number(1.0)]);
                let mut results = Vec::new();
                for j in 0..50 {
                    let value = Handle::number((i * 100 + j) as f64);
                    let b: Bindings = [(x.clone(), value)].into_iter().collect();
                    results.push(engine.instantiate(&expr, &b).unwrap().unwrap());
                }
                (i, results)
            })
        })
        .collect();

    for handle in handles {
        let (i, results) = handle.join().unwrap();
        for (j, result) in results.iter().enumerate() {
            assert_eq!(result.as_number(), Some((i * 100 + j + 1) as f64));
            assert!(engine.space().contains(result));
        }
    }
}
