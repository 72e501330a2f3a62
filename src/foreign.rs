//! Foreign executor bridge: named procedures in embedded scripting languages.
//!
//! Grounded schema and grounded predicate nodes name a procedure as
//! `"<namespace>:<identifier>"`, e.g. `"scm: make-pair"` or `"py:is_red"`.
//! The namespace selects a [`ForeignExecutor`] from the [`ExecutorRegistry`];
//! the engine hands it the identifier and the argument list and returns
//! whatever it produces.
//!
//! A namespace that is a known scripting language but has no registered
//! executor is reported as [`ExecError::BackendUnavailable`], never silently
//! ignored.

use std::sync::Arc;

use dashmap::{DashMap, DashSet};

use crate::atom::Handle;
use crate::error::{ExecError, ExecResult};
use crate::truth::TruthValue;

/// A scripting-language backend that can run named procedures.
pub trait ForeignExecutor: Send + Sync {
    /// Namespace prefix this backend answers to (without the colon).
    fn namespace(&self) -> &str;

    /// Run a procedure in function position; returns a grounded atom.
    fn execute(&self, name: &str, args: &Handle) -> ExecResult<Handle>;

    /// Run a procedure in predicate position; returns a truth value.
    fn evaluate(&self, name: &str, args: &Handle) -> ExecResult<TruthValue>;
}

/// A parsed `"<namespace>:<identifier>"` procedure name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcedureName<'a> {
    pub namespace: &'a str,
    pub identifier: &'a str,
}

impl<'a> ProcedureName<'a> {
    /// Split at the first colon and strip leading spaces from the identifier.
    ///
    /// A name without a colon gets an empty namespace, which no backend
    /// answers to.
    pub fn parse(full: &'a str) -> Self {
        match full.split_once(':') {
            Some((namespace, identifier)) => Self {
                namespace,
                identifier: identifier.trim_start_matches(' '),
            },
            None => Self {
                namespace: "",
                identifier: full,
            },
        }
    }
}

/// Where a procedure name appeared; picks the unknown-namespace error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallPosition {
    Schema,
    Predicate,
}

/// Namespace → backend table.
pub struct ExecutorRegistry {
    backends: DashMap<String, Arc<dyn ForeignExecutor>>,
    /// Scripting namespaces the engine recognizes, registered or not.
    known: DashSet<String>,
}

impl ExecutorRegistry {
    /// Create a registry that recognizes the given scripting namespaces.
    pub fn new<I, S>(known: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            backends: DashMap::new(),
            known: known.into_iter().map(Into::into).collect(),
        }
    }

    /// Register a backend under its namespace, replacing any previous one.
    ///
    /// Registering makes the namespace known even if it was not configured.
    /// Safe to call while other threads execute through the registry.
    pub fn register(&self, executor: Arc<dyn ForeignExecutor>) {
        let namespace = executor.namespace().to_string();
        tracing::info!(namespace = %namespace, "foreign executor registered");
        self.known.insert(namespace.clone());
        self.backends.insert(namespace, executor);
    }

    /// Whether a backend is registered for `namespace`.
    pub fn has_backend(&self, namespace: &str) -> bool {
        self.backends.contains_key(namespace)
    }

    /// Whether `namespace` is a recognized scripting namespace.
    pub fn is_known(&self, namespace: &str) -> bool {
        self.known.contains(namespace)
    }

    /// Registered namespaces, sorted.
    pub fn namespaces(&self) -> Vec<String> {
        let mut names: Vec<String> = self.backends.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// Recognized scripting namespaces, sorted.
    pub fn known_namespaces(&self) -> Vec<String> {
        let mut names: Vec<String> = self.known.iter().map(|n| n.key().clone()).collect();
        names.sort();
        names
    }

    /// Find the backend for a procedure name.
    pub fn resolve(
        &self,
        procedure: &ProcedureName<'_>,
        full_name: &str,
        position: CallPosition,
    ) -> ExecResult<Arc<dyn ForeignExecutor>> {
        if let Some(backend) = self.backends.get(procedure.namespace) {
            return Ok(Arc::clone(backend.value()));
        }
        if self.known.contains(procedure.namespace) {
            return Err(ExecError::BackendUnavailable {
                namespace: procedure.namespace.to_string(),
            });
        }
        let namespace = procedure.namespace.to_string();
        let name = full_name.to_string();
        Err(match position {
            CallPosition::Schema => ExecError::UnknownSchemaNamespace { namespace, name },
            CallPosition::Predicate => ExecError::UnknownPredicateNamespace { namespace, name },
        })
    }

    /// Run a grounded schema against an argument list.
    pub fn execute(&self, full_name: &str, args: &Handle) -> ExecResult<Handle> {
        let procedure = ProcedureName::parse(full_name);
        let backend = self.resolve(&procedure, full_name, CallPosition::Schema)?;
        tracing::debug!(
            namespace = procedure.namespace,
            procedure = procedure.identifier,
            args = %args,
            "foreign execute"
        );
        backend.execute(procedure.identifier, args)
    }

    /// Run a grounded predicate against an argument list.
    pub fn evaluate(&self, full_name: &str, args: &Handle) -> ExecResult<TruthValue> {
        let procedure = ProcedureName::parse(full_name);
        let backend = self.resolve(&procedure, full_name, CallPosition::Predicate)?;
        tracing::debug!(
            namespace = procedure.namespace,
            procedure = procedure.identifier,
            args = %args,
            "foreign evaluate"
        );
        backend.evaluate(procedure.identifier, args)
    }
}

impl std::fmt::Debug for ExecutorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutorRegistry")
            .field("backends", &self.namespaces())
            .field("known", &self.known_namespaces())
            .finish()
    }
}
