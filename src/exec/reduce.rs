//! Beta-reduction: plugging actual arguments into declared formals.
//!
//! Formals come either from a Lambda declaration (a single Variable or a
//! VariableList) or, for a bare template, from the template's free variables
//! in order of first occurrence. Substitution is scope-aware: it never enters
//! a Quote, and an inner Lambda that re-declares a formal shadows it.

use std::borrow::Cow;
use std::collections::{HashMap, HashSet};

use crate::atom::{AtomBody, AtomType, Handle};
use crate::error::{ExecError, ExecResult};

/// Ordered formal parameters of a scope.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Variables {
    vars: Vec<Handle>,
}

impl Variables {
    pub fn new(vars: Vec<Handle>) -> Self {
        Self { vars }
    }

    /// Formals declared by a Variable or VariableList atom.
    pub fn from_declaration(decl: &Handle) -> ExecResult<Self> {
        match decl.atom_type() {
            AtomType::Variable => Ok(Self::new(vec![decl.clone()])),
            AtomType::VariableList => {
                if let Some(bad) = decl.outgoing().iter().find(|v| !v.is_type(AtomType::Variable)) {
                    return Err(ExecError::structural(
                        AtomType::VariableList,
                        format!("expected only variables, got {bad}"),
                    ));
                }
                Ok(Self::new(decl.outgoing().to_vec()))
            }
            other => Err(ExecError::structural(
                AtomType::Lambda,
                format!("expected a variable declaration, got {other}"),
            )),
        }
    }

    /// Free variables of `body`, in order of first occurrence.
    pub fn free_in(body: &Handle) -> Self {
        let mut vars = Vec::new();
        let mut seen = HashSet::new();
        collect_free(body, &HashSet::new(), &mut seen, &mut vars);
        Self::new(vars)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn as_slice(&self) -> &[Handle] {
        &self.vars
    }

    /// Replace each formal in `body` with the positional argument.
    pub fn substitute(&self, body: &Handle, args: &[Handle]) -> ExecResult<Handle> {
        if args.len() != self.vars.len() {
            return Err(ExecError::structural(
                AtomType::Lambda,
                format!(
                    "expected {} argument(s), got {}",
                    self.vars.len(),
                    args.len()
                ),
            ));
        }
        let map: HashMap<Handle, Handle> = self
            .vars
            .iter()
            .cloned()
            .zip(args.iter().cloned())
            .collect();
        Ok(substitute_scoped(body, &map))
    }
}

fn collect_free(
    atom: &Handle,
    bound: &HashSet<Handle>,
    seen: &mut HashSet<Handle>,
    out: &mut Vec<Handle>,
) {
    match atom.atom_type() {
        AtomType::Variable => {
            if !bound.contains(atom) && seen.insert(atom.clone()) {
                out.push(atom.clone());
            }
        }
        AtomType::Quote => {}
        AtomType::Lambda if atom.arity() == 2 => {
            let mut inner = bound.clone();
            if let Ok(decl) = Variables::from_declaration(&atom.outgoing()[0]) {
                inner.extend(decl.vars);
            }
            collect_free(&atom.outgoing()[1], &inner, seen, out);
        }
        _ => {
            for child in atom.outgoing() {
                collect_free(child, bound, seen, out);
            }
        }
    }
}

fn substitute_scoped(atom: &Handle, map: &HashMap<Handle, Handle>) -> Handle {
    if map.is_empty() {
        return atom.clone();
    }
    let children = match atom.body() {
        AtomBody::Name(_) => {
            if atom.is_type(AtomType::Variable) {
                if let Some(value) = map.get(atom) {
                    return value.clone();
                }
            }
            return atom.clone();
        }
        AtomBody::Outgoing(children) => children,
    };

    if atom.is_type(AtomType::Quote) {
        return atom.clone();
    }

    let mut scope: Cow<'_, HashMap<Handle, Handle>> = Cow::Borrowed(map);
    if atom.is_type(AtomType::Lambda) && children.len() == 2 {
        if let Ok(decl) = Variables::from_declaration(&children[0]) {
            for var in decl.as_slice() {
                if scope.contains_key(var) {
                    scope.to_mut().remove(var);
                }
            }
        }
    }

    let substituted: Vec<Handle> = children
        .iter()
        .map(|c| substitute_scoped(c, &scope))
        .collect();
    if substituted.iter().zip(children).all(|(s, c)| s.ptr_eq(c)) {
        atom.clone()
    } else {
        Handle::link_with_tv(atom.atom_type(), substituted, atom.tv())
    }
}

/// Split `Lambda(decl, body)` into its formals and body.
pub fn split_lambda(lambda: &Handle) -> ExecResult<(Variables, Handle)> {
    let oset = lambda.outgoing();
    if !lambda.is_type(AtomType::Lambda) || oset.len() != 2 {
        return Err(ExecError::structural(
            AtomType::Lambda,
            format!("expected (Lambda <declaration> <body>), got {lambda}"),
        ));
    }
    Ok((Variables::from_declaration(&oset[0])?, oset[1].clone()))
}

/// Beta-reduce a Put link: `Put(template, argument)`.
///
/// A Set argument maps the reduction over its members and yields a Set of
/// the results.
pub fn reduce_put(put: &Handle) -> ExecResult<Handle> {
    let oset = put.outgoing();
    if oset.len() != 2 {
        return Err(ExecError::structural(
            AtomType::Put,
            format!("expects a template and an argument, got {} children", oset.len()),
        ));
    }
    let (template, argument) = (&oset[0], &oset[1]);
    let (vars, body) = if template.is_type(AtomType::Lambda) {
        split_lambda(template)?
    } else {
        (Variables::free_in(template), template.clone())
    };

    if argument.is_type(AtomType::Set) {
        let results = argument
            .outgoing()
            .iter()
            .map(|member| apply(&vars, &body, member))
            .collect::<ExecResult<Vec<_>>>()?;
        return Ok(Handle::set(results));
    }
    apply(&vars, &body, argument)
}

fn apply(vars: &Variables, body: &Handle, argument: &Handle) -> ExecResult<Handle> {
    match vars.len() {
        0 => Ok(body.clone()),
        1 => vars.substitute(body, std::slice::from_ref(argument)),
        n => {
            if !argument.is_type(AtomType::List) {
                return Err(ExecError::structural(
                    AtomType::Put,
                    format!("expected a List of {n} arguments, got {argument}"),
                ));
            }
            vars.substitute(body, argument.outgoing())
        }
    }
}
