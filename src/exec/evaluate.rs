//! Predicate evaluation: boolean-valued expressions to truth values.
//!
//! Equal, GreaterThan and Not are built in. An Evaluation link names a
//! grounded predicate as `"<namespace>:<identifier>"`; the native namespace
//! carries `greater` and `exclusive`, every other namespace is handed to the
//! matching foreign executor.

use crate::atom::{AtomType, Handle};
use crate::error::{ExecError, ExecResult};
use crate::exec::fold;
use crate::foreign::{ExecutorRegistry, ProcedureName};
use crate::truth::TruthValue;

/// Namespace of the built-in grounded predicates unless configured otherwise.
pub const DEFAULT_NATIVE_NAMESPACE: &str = "native";

/// Evaluates predicate expressions.
pub struct Evaluator<'a> {
    executors: &'a ExecutorRegistry,
    native_namespace: &'a str,
}

impl<'a> Evaluator<'a> {
    pub fn new(executors: &'a ExecutorRegistry) -> Self {
        Self {
            executors,
            native_namespace: DEFAULT_NATIVE_NAMESPACE,
        }
    }

    pub fn with_native_namespace(mut self, namespace: &'a str) -> Self {
        self.native_namespace = namespace;
        self
    }

    /// Truth value of `expr`.
    ///
    /// Fails with [`ExecError::NotEvaluable`] when `expr` is not a predicate
    /// expression at all.
    pub fn evaluate(&self, expr: &Handle) -> ExecResult<TruthValue> {
        let tv = match expr.atom_type() {
            AtomType::Evaluation => {
                let [predicate, args] = expect_arity::<2>(expr)?;
                self.evaluate_grounded(predicate, args)?
            }
            AtomType::Equal => {
                let [left, right] = expect_arity::<2>(expr)?;
                TruthValue::crisp(left == right)
            }
            AtomType::GreaterThan => {
                let [left, right] = expect_arity::<2>(expr)?;
                greater_than(left, right)?
            }
            AtomType::Not => {
                let [inner] = expect_arity::<1>(expr)?;
                self.evaluate(inner)?.negate()
            }
            _ => {
                return Err(ExecError::NotEvaluable {
                    expression: expr.to_string(),
                });
            }
        };
        tracing::debug!(expr = %expr, tv = %tv, "evaluate");
        Ok(tv)
    }

    /// Truth value of a named predicate applied to an argument list.
    pub fn evaluate_grounded(&self, predicate: &Handle, args: &Handle) -> ExecResult<TruthValue> {
        let name = match predicate.name() {
            Some(name) if predicate.is_type(AtomType::GroundedPredicate) => name,
            _ => {
                return Err(ExecError::structural(
                    AtomType::Evaluation,
                    format!("expected a grounded predicate, got {predicate}"),
                ));
            }
        };
        if !args.is_type(AtomType::List) {
            return Err(ExecError::structural(
                AtomType::Evaluation,
                format!("expected a List of arguments, got {args}"),
            ));
        }

        let procedure = ProcedureName::parse(name);
        if procedure.namespace != self.native_namespace {
            return self.executors.evaluate(name, args);
        }
        match procedure.identifier {
            "greater" => {
                let [left, right] = expect_arity::<2>(args)?;
                greater_than(left, right)
            }
            "exclusive" => Ok(TruthValue::crisp(pairwise_distinct(args.outgoing()))),
            _ => Err(ExecError::NotEvaluable {
                expression: format!("{predicate}"),
            }),
        }
    }
}

/// Children of `link` as an array, or a structural error naming the arity.
fn expect_arity<const N: usize>(link: &Handle) -> ExecResult<&[Handle; N]> {
    link.outgoing().try_into().map_err(|_| {
        ExecError::structural(
            link.atom_type(),
            format!("expects {N} argument(s), got {}", link.arity()),
        )
    })
}

fn greater_than(left: &Handle, right: &Handle) -> ExecResult<TruthValue> {
    let left = fold::numeric_value(left)?;
    let right = fold::numeric_value(right)?;
    Ok(TruthValue::crisp(left > right))
}

fn pairwise_distinct(atoms: &[Handle]) -> bool {
    for (i, a) in atoms.iter().enumerate() {
        if atoms[i + 1..].iter().any(|b| a == b) {
            return false;
        }
    }
    true
}
