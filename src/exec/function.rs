//! Generic function links, executed right after their children are
//! substituted.

use crate::atom::{FunctionOp, Handle, LinkKind};
use crate::error::{ExecError, ExecResult};
use crate::store::GraphStore;

/// Execute a generic function link against the store.
pub fn execute(link: &Handle, store: &dyn GraphStore) -> ExecResult<Handle> {
    let LinkKind::Function(op) = link.atom_type().link_kind() else {
        return Err(ExecError::structural(link.atom_type(), "not a function link"));
    };
    let args = link.outgoing();
    let result = match op {
        FunctionOp::Arity => Handle::number(args.len() as f64),
        FunctionOp::StrengthOf | FunctionOp::ConfidenceOf => {
            let [target] = args else {
                return Err(ExecError::structural(
                    link.atom_type(),
                    format!("expects exactly one argument, got {}", args.len()),
                ));
            };
            let tv = store.truth_value(target).unwrap_or_else(|| target.tv());
            if op == FunctionOp::StrengthOf {
                Handle::number(tv.strength())
            } else {
                Handle::number(tv.confidence())
            }
        }
    };
    tracing::trace!(expr = %link, result = %result, "function");
    Ok(result)
}
