//! Instantiation: grounding an expression against a set of bindings.
//!
//! [`Instantiator::instantiate`] walks an expression once, substituting bound
//! variables and executing the executable links it meets along the way, then
//! inserts the grounded result into the store as a single batch. The walk
//! never modifies an atom: an unchanged subtree comes back as the very same
//! handle, a changed one is rebuilt.
//!
//! Dispatch order, first match wins:
//!
//! | atom                  | action                                              |
//! |-----------------------|-----------------------------------------------------|
//! | Quote                 | returned untouched, never entered                   |
//! | DefinedSchema node    | replaced by its definition, which is walked         |
//! | Variable node         | replaced by its walked grounding, if bound          |
//! | other node            | returned untouched                                  |
//! | Put                   | argument walked, beta-reduced, result walked        |
//! | ExecutionOutput       | arguments walked, lambda applied or foreign call    |
//! | Plus/Times/Minus/...  | operands walked, then folded                        |
//! | Delete                | operands walked and removed; yields no result       |
//! | Arity/StrengthOf/...  | operands walked, then executed                      |
//! | Get                   | operands walked and stored, query delegated         |
//! | other link            | children walked, rebuilt only if one changed        |

use crate::atom::{AtomType, Bindings, Handle, LinkKind};
use crate::error::{ExecError, ExecResult};
use crate::exec::{fold, function, reduce};
use crate::foreign::ExecutorRegistry;
use crate::query::PatternQuery;
use crate::store::GraphStore;

/// Per-call walk state. Never shared between calls.
struct WalkContext<'b> {
    bindings: &'b Bindings,
    /// Set while a variable's grounding is being walked.
    halt: bool,
    depth: usize,
    max_depth: Option<usize>,
}

impl<'b> WalkContext<'b> {
    fn new(bindings: &'b Bindings, max_depth: Option<usize>) -> Self {
        Self {
            bindings,
            halt: false,
            depth: 0,
            max_depth,
        }
    }

    fn enter(&mut self) -> ExecResult<()> {
        if let Some(max_depth) = self.max_depth {
            if self.depth >= max_depth {
                return Err(ExecError::DepthExceeded { max_depth });
            }
        }
        self.depth += 1;
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }
}

/// Grounds expressions against a store, a foreign executor registry and an
/// optional pattern query engine.
///
/// The instantiator itself is stateless; each call gets its own bindings and
/// reentrancy flag, so one instance can serve concurrent calls.
pub struct Instantiator<'a> {
    store: &'a dyn GraphStore,
    executors: &'a ExecutorRegistry,
    query: Option<&'a dyn PatternQuery>,
    max_depth: Option<usize>,
}

impl<'a> Instantiator<'a> {
    pub fn new(store: &'a dyn GraphStore, executors: &'a ExecutorRegistry) -> Self {
        Self {
            store,
            executors,
            query: None,
            max_depth: None,
        }
    }

    /// Attach the pattern matcher used for Get links.
    pub fn with_query_engine(mut self, query: &'a dyn PatternQuery) -> Self {
        self.query = Some(query);
        self
    }

    /// Bound the walk's recursion depth.
    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Ground `expr` and insert the result into the store.
    ///
    /// `None` for `expr` is the undefined atom and fails with
    /// [`ExecError::InvalidExpression`]. Returns `Ok(None)` when the
    /// expression evaluates to nothing, e.g. a Delete.
    pub fn instantiate(
        &self,
        expr: Option<&Handle>,
        bindings: &Bindings,
    ) -> ExecResult<Option<Handle>> {
        let Some(expr) = expr else {
            return Err(ExecError::InvalidExpression {
                message: "asked to ground an undefined expression".into(),
            });
        };
        tracing::debug!(expr = %expr, bindings = bindings.len(), "instantiate");

        let grounded = self.ground(expr, bindings)?;
        match grounded {
            Some(result) => {
                let stored = self.store.add(&result)?;
                tracing::debug!(result = %stored, "instantiate grounded");
                Ok(Some(stored))
            }
            None => {
                tracing::debug!("instantiate produced no result");
                Ok(None)
            }
        }
    }

    /// Walk `expr` without inserting the result into the store.
    pub fn ground(&self, expr: &Handle, bindings: &Bindings) -> ExecResult<Option<Handle>> {
        let mut cx = WalkContext::new(bindings, self.max_depth);
        self.walk(&mut cx, expr)
    }

    fn walk(&self, cx: &mut WalkContext<'_>, expr: &Handle) -> ExecResult<Option<Handle>> {
        cx.enter()?;
        let result = if expr.is_node() {
            self.walk_node(cx, expr)
        } else {
            self.walk_link(cx, expr)
        };
        cx.leave();
        result
    }

    fn walk_seq(&self, cx: &mut WalkContext<'_>, children: &[Handle]) -> ExecResult<Vec<Handle>> {
        let mut out = Vec::with_capacity(children.len());
        for child in children {
            // A child that evaluates to nothing is dropped, not replaced.
            if let Some(walked) = self.walk(cx, child)? {
                out.push(walked);
            }
        }
        Ok(out)
    }

    fn walk_node(&self, cx: &mut WalkContext<'_>, expr: &Handle) -> ExecResult<Option<Handle>> {
        match expr.atom_type() {
            AtomType::DefinedSchema => {
                let body = self.store.lookup_definition(expr)?;
                self.walk(cx, &body)
            }
            AtomType::Variable => {
                let Some(grounding) = cx.bindings.get(expr) else {
                    return Ok(Some(expr.clone()));
                };
                if cx.halt {
                    return Ok(Some(grounding.clone()));
                }
                cx.halt = true;
                let result = self.walk(cx, grounding);
                cx.halt = false;
                result
            }
            _ => Ok(Some(expr.clone())),
        }
    }

    fn walk_link(&self, cx: &mut WalkContext<'_>, expr: &Handle) -> ExecResult<Option<Handle>> {
        let kind = expr.atom_type().link_kind();
        tracing::trace!(expr = %expr, ?kind, "walk");
        match kind {
            LinkKind::Quote => Ok(Some(expr.clone())),
            LinkKind::Redex => self.walk_put(cx, expr),
            LinkKind::ExecutionOutput => self.walk_execution_output(cx, expr),
            LinkKind::Fold(_) => {
                let operands = self.walk_seq(cx, expr.outgoing())?;
                let link = Handle::link(expr.atom_type(), operands);
                fold::execute(&link).map(Some)
            }
            LinkKind::Delete => {
                self.walk_delete(cx, expr)?;
                Ok(None)
            }
            LinkKind::Function(_) => {
                let args = self.walk_seq(cx, expr.outgoing())?;
                let link = Handle::link(expr.atom_type(), args);
                function::execute(&link, self.store).map(Some)
            }
            LinkKind::Query => self.walk_get(cx, expr),
            LinkKind::Ordinary => self.walk_ordinary(cx, expr),
        }
    }

    /// Walk a child that must produce a value.
    fn walk_required(
        &self,
        cx: &mut WalkContext<'_>,
        parent: AtomType,
        child: &Handle,
    ) -> ExecResult<Handle> {
        self.walk(cx, child)?.ok_or_else(|| {
            ExecError::structural(parent, format!("argument {child} evaluated to nothing"))
        })
    }

    fn walk_put(&self, cx: &mut WalkContext<'_>, expr: &Handle) -> ExecResult<Option<Handle>> {
        let oset = expr.outgoing();
        if oset.len() != 2 {
            return Err(ExecError::structural(
                AtomType::Put,
                format!("expects a template and an argument, got {} children", oset.len()),
            ));
        }
        // Only the argument is substituted before reduction; free variables
        // of the template are left for the walk of the reduced body.
        let argument = self.walk_required(cx, AtomType::Put, &oset[1])?;
        let redex = if argument.ptr_eq(&oset[1]) {
            expr.clone()
        } else {
            Handle::link(AtomType::Put, vec![oset[0].clone(), argument])
        };
        let reduced = reduce::reduce_put(&redex)?;
        tracing::trace!(redex = %redex, reduced = %reduced, "beta-reduced");
        self.walk(cx, &reduced)
    }

    fn walk_execution_output(
        &self,
        cx: &mut WalkContext<'_>,
        expr: &Handle,
    ) -> ExecResult<Option<Handle>> {
        let oset = expr.outgoing();
        if oset.len() != 2 {
            return Err(ExecError::structural(
                AtomType::ExecutionOutput,
                format!("expects a schema and an argument list, got {} children", oset.len()),
            ));
        }
        // The schema itself is never substituted.
        let args = self.walk_required(cx, AtomType::ExecutionOutput, &oset[1])?;
        let mut schema = oset[0].clone();
        if schema.is_type(AtomType::DefinedSchema) {
            schema = self.store.lookup_definition(&schema)?;
        }

        if schema.is_type(AtomType::Lambda) {
            let (vars, body) = reduce::split_lambda(&schema)?;
            if !args.is_type(AtomType::List) {
                return Err(ExecError::structural(
                    AtomType::ExecutionOutput,
                    format!("expected a List of arguments, got {args}"),
                ));
            }
            let reduced = vars.substitute(&body, args.outgoing())?;
            tracing::trace!(schema = %schema, reduced = %reduced, "lambda applied");
            return self.walk(cx, &reduced);
        }

        match schema.name() {
            Some(name) if schema.is_type(AtomType::GroundedSchema) => {
                self.executors.execute(name, &args).map(Some)
            }
            _ => Err(ExecError::structural(
                AtomType::ExecutionOutput,
                format!("expected a grounded schema or a lambda, got {schema}"),
            )),
        }
    }

    fn walk_delete(&self, cx: &mut WalkContext<'_>, expr: &Handle) -> ExecResult<()> {
        let targets = self.walk_seq(cx, expr.outgoing())?;
        for target in &targets {
            if target.is_type(AtomType::Variable) {
                tracing::trace!(variable = %target, "unbound variable not deleted");
                continue;
            }
            let removed = self.store.remove(target, true);
            tracing::debug!(atom = %target, removed, "delete");
        }
        Ok(())
    }

    fn walk_get(&self, cx: &mut WalkContext<'_>, expr: &Handle) -> ExecResult<Option<Handle>> {
        let query_engine = self.query.ok_or(ExecError::QueryEngineUnavailable)?;
        // The query must reference store-resident atoms.
        let clauses = self
            .walk_seq(cx, expr.outgoing())?
            .iter()
            .map(|clause| self.store.add(clause))
            .collect::<Result<Vec<_>, _>>()?;
        let query = Handle::link(AtomType::Get, clauses);
        let found = query_engine.satisfy(&query)?;
        tracing::debug!(query = %query, matches = found.len(), "pattern query");
        Ok(Some(Handle::set(found)))
    }

    fn walk_ordinary(&self, cx: &mut WalkContext<'_>, expr: &Handle) -> ExecResult<Option<Handle>> {
        let children = expr.outgoing();
        let walked = self.walk_seq(cx, children)?;
        let unchanged = walked.len() == children.len()
            && walked.iter().zip(children).all(|(w, c)| w.ptr_eq(c));
        if unchanged {
            Ok(Some(expr.clone()))
        } else {
            Ok(Some(Handle::link_with_tv(expr.atom_type(), walked, expr.tv())))
        }
    }
}
