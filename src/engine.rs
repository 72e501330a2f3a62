//! Engine facade: top-level API for hyperground.
//!
//! The `Engine` owns the atom space, the foreign executor registry and the
//! optional pattern query engine, and hands out instantiators and evaluators
//! wired to them.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::atom::{Bindings, Handle};
use crate::error::{EngineError, HgResult};
use crate::exec::{DEFAULT_NATIVE_NAMESPACE, Evaluator, Instantiator};
use crate::foreign::{ExecutorRegistry, ForeignExecutor};
use crate::query::PatternQuery;
use crate::store::AtomSpace;
use crate::truth::TruthValue;

/// Configuration for the hyperground engine, loadable from TOML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Maximum walk depth per instantiation. `None` for unbounded.
    #[serde(default)]
    pub max_depth: Option<usize>,
    /// Namespace of the built-in grounded predicates.
    #[serde(default = "default_native_namespace")]
    pub native_namespace: String,
    /// Scripting namespaces recognized even before a backend is registered.
    #[serde(default = "default_scripting_namespaces")]
    pub scripting_namespaces: Vec<String>,
}

fn default_native_namespace() -> String {
    DEFAULT_NATIVE_NAMESPACE.into()
}
fn default_scripting_namespaces() -> Vec<String> {
    vec!["scm".into(), "py".into()]
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_depth: None,
            native_namespace: default_native_namespace(),
            scripting_namespaces: default_scripting_namespaces(),
        }
    }
}

impl EngineConfig {
    /// Parse a config from TOML text. Missing fields take their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self, EngineError> {
        toml::from_str(content).map_err(|e| EngineError::ConfigParse {
            path: "<inline>".into(),
            message: e.to_string(),
        })
    }

    /// Load from a TOML file.
    pub fn load(path: &Path) -> Result<Self, EngineError> {
        let content = std::fs::read_to_string(path).map_err(|e| EngineError::ConfigRead {
            path: path.display().to_string(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| EngineError::ConfigParse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Check the config for values the engine cannot run with.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.max_depth == Some(0) {
            return Err(EngineError::InvalidConfig {
                message: "max_depth must be > 0".into(),
            });
        }
        check_namespace(&self.native_namespace)?;
        for namespace in &self.scripting_namespaces {
            check_namespace(namespace)?;
            if *namespace == self.native_namespace {
                return Err(EngineError::InvalidConfig {
                    message: format!(
                        "namespace \"{namespace}\" is both native and a scripting namespace"
                    ),
                });
            }
        }
        Ok(())
    }
}

fn check_namespace(namespace: &str) -> Result<(), EngineError> {
    if namespace.is_empty() {
        return Err(EngineError::InvalidConfig {
            message: "namespaces must not be empty".into(),
        });
    }
    if namespace.contains(':') {
        return Err(EngineError::InvalidConfig {
            message: format!("namespace \"{namespace}\" must not contain ':'"),
        });
    }
    Ok(())
}

/// The hyperground instantiation engine.
///
/// `Engine` is `Send + Sync`: concurrent `instantiate` and `evaluate` calls
/// each carry their own walk state and share only the atom space.
pub struct Engine {
    config: EngineConfig,
    space: Arc<AtomSpace>,
    executors: ExecutorRegistry,
    query: Option<Arc<dyn PatternQuery>>,
}

impl Engine {
    /// Create a new engine with an empty atom space.
    pub fn new(config: EngineConfig) -> HgResult<Self> {
        Self::with_space(config, Arc::new(AtomSpace::new()))
    }

    /// Create a new engine over an existing atom space.
    pub fn with_space(config: EngineConfig, space: Arc<AtomSpace>) -> HgResult<Self> {
        config.validate()?;
        tracing::info!(
            native = %config.native_namespace,
            scripting = ?config.scripting_namespaces,
            max_depth = ?config.max_depth,
            atoms = space.len(),
            "initializing hyperground engine"
        );
        let executors = ExecutorRegistry::new(config.scripting_namespaces.iter().cloned());
        Ok(Self {
            config,
            space,
            executors,
            query: None,
        })
    }

    /// Attach the pattern matcher that answers Get links.
    pub fn with_query_engine(mut self, query: Arc<dyn PatternQuery>) -> Self {
        self.query = Some(query);
        self
    }

    /// Register a scripting backend under its namespace.
    ///
    /// Takes `&self`, so backends can be added to an engine already shared
    /// between threads.
    pub fn register_executor(&self, executor: Arc<dyn ForeignExecutor>) -> HgResult<()> {
        if executor.namespace() == self.config.native_namespace {
            return Err(EngineError::InvalidConfig {
                message: format!(
                    "cannot register an executor for the native namespace \"{}\"",
                    self.config.native_namespace
                ),
            }
            .into());
        }
        self.executors.register(executor);
        Ok(())
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The shared atom space.
    pub fn space(&self) -> &Arc<AtomSpace> {
        &self.space
    }

    pub fn executors(&self) -> &ExecutorRegistry {
        &self.executors
    }

    /// Bind a DefinedSchema node to a body.
    pub fn define(&self, name: &Handle, body: &Handle) -> HgResult<Handle> {
        Ok(self.space.define(name, body)?)
    }

    /// Ground `expr` against `bindings` and store the result.
    ///
    /// Returns `Ok(None)` when the expression evaluates to nothing.
    pub fn instantiate(&self, expr: &Handle, bindings: &Bindings) -> HgResult<Option<Handle>> {
        Ok(self.instantiator().instantiate(Some(expr), bindings)?)
    }

    /// Truth value of a predicate expression.
    pub fn evaluate(&self, expr: &Handle) -> HgResult<TruthValue> {
        Ok(self.evaluator().evaluate(expr)?)
    }

    /// An instantiator wired to this engine's store, executors and query engine.
    pub fn instantiator(&self) -> Instantiator<'_> {
        let inst = Instantiator::new(self.space.as_ref(), &self.executors)
            .with_max_depth(self.config.max_depth);
        match self.query.as_deref() {
            Some(query) => inst.with_query_engine(query),
            None => inst,
        }
    }

    /// An evaluator wired to this engine's executors and native namespace.
    pub fn evaluator(&self) -> Evaluator<'_> {
        Evaluator::new(&self.executors).with_native_namespace(&self.config.native_namespace)
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("atoms", &self.space.len())
            .field("executors", &self.executors)
            .field("query_engine", &self.query.is_some())
            .finish()
    }
}
