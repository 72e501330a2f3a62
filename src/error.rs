//! Rich diagnostic error types for the hyperground engine.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]` derives,
//! providing error codes, help text, and source chains so callers (usually the
//! pattern-matching or inference layer) can tell a bad expression from a
//! missing backend and decide whether to retry with different bindings.

use miette::Diagnostic;
use thiserror::Error;

/// Top-level error type for the hyperground engine.
///
/// Each variant wraps a subsystem-specific error, preserving the full diagnostic
/// chain (error codes, help text) through to the user.
#[derive(Debug, Error, Diagnostic)]
pub enum HgError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Exec(#[from] ExecError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Engine(#[from] EngineError),
}

// ---------------------------------------------------------------------------
// Execution errors
// ---------------------------------------------------------------------------

/// Failures raised while instantiating or evaluating an expression.
///
/// All of these abort the enclosing `instantiate`/`evaluate` call. The engine
/// never retries and never returns a partial result.
#[derive(Debug, Error, Diagnostic)]
pub enum ExecError {
    #[error("invalid expression: {message}")]
    #[diagnostic(
        code(hg::exec::invalid_expression),
        help(
            "The expression handed to the engine was undefined. \
             This is a caller error: pass a constructed atom."
        )
    )]
    InvalidExpression { message: String },

    #[error("structural error in {atom_type}: {message}")]
    #[diagnostic(
        code(hg::exec::structural),
        help(
            "The expression has the wrong arity or the wrong kind of child for \
             its type. Check the shape of the expression against the link type."
        )
    )]
    StructuralError { atom_type: String, message: String },

    #[error("type mismatch: expected {expected}, got {actual}")]
    #[diagnostic(
        code(hg::exec::type_mismatch),
        help(
            "A numeric operand was required. Pass a Number node, or an arithmetic \
             link (Plus, Times, Minus, Divide) that reduces to one."
        )
    )]
    TypeMismatch { expected: String, actual: String },

    #[error("expression is not evaluable as a predicate: {expression}")]
    #[diagnostic(
        code(hg::exec::not_evaluable),
        help(
            "Only Evaluation, Equal, GreaterThan and Not links can be evaluated \
             to a truth value."
        )
    )]
    NotEvaluable { expression: String },

    #[error("unknown predicate namespace \"{namespace}\" in \"{name}\"")]
    #[diagnostic(
        code(hg::exec::unknown_predicate_namespace),
        help(
            "Grounded predicate names take the form \"<namespace>:<identifier>\". \
             Use the native namespace or a configured scripting namespace."
        )
    )]
    UnknownPredicateNamespace { namespace: String, name: String },

    #[error("unknown schema namespace \"{namespace}\" in \"{name}\"")]
    #[diagnostic(
        code(hg::exec::unknown_schema_namespace),
        help(
            "Grounded schema names take the form \"<namespace>:<identifier>\". \
             Use a configured scripting namespace."
        )
    )]
    UnknownSchemaNamespace { namespace: String, name: String },

    #[error("no backend registered for namespace \"{namespace}\"")]
    #[diagnostic(
        code(hg::exec::backend_unavailable),
        help(
            "The namespace is a known scripting language but no executor was \
             registered for it. Call `Engine::register_executor()` first."
        )
    )]
    BackendUnavailable { namespace: String },

    #[error("no pattern query engine configured")]
    #[diagnostic(
        code(hg::exec::no_query_engine),
        help(
            "Get links delegate to an external pattern matcher. \
             Attach one with `Engine::with_query_engine()`."
        )
    )]
    QueryEngineUnavailable,

    #[error("division by zero in {expression}")]
    #[diagnostic(
        code(hg::exec::division_by_zero),
        help("A Divide link reduced to a zero divisor.")
    )]
    DivisionByZero { expression: String },

    #[error("expression nesting exceeded maximum depth of {max_depth}")]
    #[diagnostic(
        code(hg::exec::depth_exceeded),
        help(
            "The walk recursed deeper than `max_depth` allows. Raise the limit in \
             EngineConfig, or check for self-referential definitions."
        )
    )]
    DepthExceeded { max_depth: usize },

    #[error("foreign procedure {namespace}:{name} failed: {message}")]
    #[diagnostic(
        code(hg::exec::foreign_failure),
        help("The scripting backend reported an error while running the procedure.")
    )]
    ForeignFailure {
        namespace: String,
        name: String,
        message: String,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Store(#[from] StoreError),
}

impl ExecError {
    /// Shorthand for a [`ExecError::StructuralError`] on an atom type.
    pub fn structural(atom_type: impl std::fmt::Display, message: impl Into<String>) -> Self {
        Self::StructuralError {
            atom_type: atom_type.to_string(),
            message: message.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Store errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum StoreError {
    #[error("no definition for {name}")]
    #[diagnostic(
        code(hg::store::definition_not_found),
        help(
            "The defined schema has no body in the store. \
             Add one with `AtomSpace::define()` before referencing it."
        )
    )]
    DefinitionNotFound { name: String },

    #[error("{name} is already defined")]
    #[diagnostic(
        code(hg::store::already_defined),
        help(
            "Definitions are unique per name. Remove the existing Define link \
             before redefining it."
        )
    )]
    AlreadyDefined { name: String },

    #[error("{name} cannot name a definition")]
    #[diagnostic(
        code(hg::store::invalid_definition_name),
        help("Only DefinedSchema nodes can be bound to a definition body.")
    )]
    InvalidDefinitionName { name: String },
}

// ---------------------------------------------------------------------------
// Engine errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum EngineError {
    #[error("invalid configuration: {message}")]
    #[diagnostic(
        code(hg::engine::invalid_config),
        help("Check the EngineConfig fields. {message}")
    )]
    InvalidConfig { message: String },

    #[error("failed to read engine config: {path}")]
    #[diagnostic(
        code(hg::engine::config_read),
        help("Ensure the config file exists and is readable.")
    )]
    ConfigRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse engine config: {path}")]
    #[diagnostic(
        code(hg::engine::config_parse),
        help("Check the TOML syntax in the engine config file. {message}")
    )]
    ConfigParse { path: String, message: String },
}

/// Result type for instantiation and evaluation.
pub type ExecResult<T> = std::result::Result<T, ExecError>;

/// Convenience alias for functions returning hyperground results.
pub type HgResult<T> = std::result::Result<T, HgError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exec_error_converts_to_hg_error() {
        let err = ExecError::QueryEngineUnavailable;
        let hg: HgError = err.into();
        assert!(matches!(hg, HgError::Exec(ExecError::QueryEngineUnavailable)));
    }

    #[test]
    fn store_error_wraps_into_exec_error() {
        let err = StoreError::DefinitionNotFound {
            name: "(DefinedSchema \"f\")".into(),
        };
        let exec: ExecError = err.into();
        assert!(matches!(
            exec,
            ExecError::Store(StoreError::DefinitionNotFound { .. })
        ));
    }

    #[test]
    fn structural_shorthand_formats_type() {
        let err = ExecError::structural("Equal", "expects two arguments, got 1");
        let msg = err.to_string();
        assert!(msg.contains("Equal"));
        assert!(msg.contains("got 1"));
    }

    #[test]
    fn namespace_errors_name_the_procedure() {
        let err = ExecError::UnknownPredicateNamespace {
            namespace: "foo".into(),
            name: "foo:bar".into(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("\"foo\""));
        assert!(msg.contains("foo:bar"));
    }
}
