//! Arithmetic folds over substituted operands.
//!
//! Plus and Times accumulate every numeric operand and keep the symbolic
//! ones, so `Plus(2, $x, 3)` becomes `Plus($x, 5)`. Minus and Divide are left
//! folds and only reduce when every operand is a number.

use crate::atom::{AtomType, FoldOp, Handle, LinkKind};
use crate::error::{ExecError, ExecResult};

impl FoldOp {
    /// Neutral element of a commutative fold.
    pub fn identity(self) -> Option<f64> {
        match self {
            FoldOp::Plus => Some(0.0),
            FoldOp::Times => Some(1.0),
            FoldOp::Minus | FoldOp::Divide => None,
        }
    }

    fn combine(self, acc: f64, value: f64) -> f64 {
        match self {
            FoldOp::Plus => acc + value,
            FoldOp::Times => acc * value,
            FoldOp::Minus => acc - value,
            FoldOp::Divide => acc / value,
        }
    }
}

/// Execute a fold link whose operands are already substituted.
pub fn execute(link: &Handle) -> ExecResult<Handle> {
    let LinkKind::Fold(op) = link.atom_type().link_kind() else {
        return Err(ExecError::structural(
            link.atom_type(),
            "not an arithmetic fold",
        ));
    };
    let result = match op.identity() {
        Some(identity) => fold_commutative(op, identity, link.outgoing()),
        None => fold_left(op, link)?,
    };
    tracing::trace!(expr = %link, result = %result, "fold");
    Ok(result)
}

fn fold_commutative(op: FoldOp, identity: f64, operands: &[Handle]) -> Handle {
    let mut acc = identity;
    let mut rest = Vec::new();
    for operand in operands {
        match operand.as_number() {
            Some(value) => acc = op.combine(acc, value),
            None => rest.push(operand.clone()),
        }
    }
    if rest.is_empty() {
        return Handle::number(acc);
    }
    if acc != identity {
        rest.push(Handle::number(acc));
    }
    if rest.len() == 1 {
        return rest.remove(0);
    }
    Handle::link(op.into(), rest)
}

fn fold_left(op: FoldOp, link: &Handle) -> ExecResult<Handle> {
    let operands = link.outgoing();
    if operands.is_empty() {
        return Err(ExecError::structural(
            link.atom_type(),
            "needs at least one operand",
        ));
    }
    let values: Option<Vec<f64>> = operands.iter().map(Handle::as_number).collect();
    let Some(values) = values else {
        return Ok(link.clone());
    };

    let check_divisor = |v: f64| -> ExecResult<()> {
        if op == FoldOp::Divide && v == 0.0 {
            return Err(ExecError::DivisionByZero {
                expression: link.to_string(),
            });
        }
        Ok(())
    };

    if values.len() == 1 {
        let v = values[0];
        return match op {
            FoldOp::Minus => Ok(Handle::number(-v)),
            _ => {
                check_divisor(v)?;
                Ok(Handle::number(1.0 / v))
            }
        };
    }

    let mut acc = values[0];
    for &v in &values[1..] {
        check_divisor(v)?;
        acc = op.combine(acc, v);
    }
    Ok(Handle::number(acc))
}

/// Reduce an operand toward a number without substitution.
///
/// A Number is returned as is. A fold link has its nested folds reduced first
/// and is then executed. Anything else is returned unchanged.
pub fn reduce(atom: &Handle) -> ExecResult<Handle> {
    if atom.is_type(AtomType::Number) {
        return Ok(atom.clone());
    }
    if !matches!(atom.atom_type().link_kind(), LinkKind::Fold(_)) {
        return Ok(atom.clone());
    }
    let operands = atom
        .outgoing()
        .iter()
        .map(reduce)
        .collect::<ExecResult<Vec<_>>>()?;
    execute(&Handle::link_with_tv(atom.atom_type(), operands, atom.tv()))
}

/// Numeric value of an operand after [`reduce`].
pub fn numeric_value(atom: &Handle) -> ExecResult<f64> {
    let reduced = reduce(atom)?;
    reduced.as_number().ok_or_else(|| ExecError::TypeMismatch {
        expected: "Number".into(),
        actual: reduced.to_string(),
    })
}
