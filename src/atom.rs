//! Core atom types for the hyperground engine.
//!
//! Atoms are the immutable units of the hypergraph: a [`Node`](AtomBody::Name)
//! is a type tag plus a name, a link is a type tag plus an ordered sequence of
//! child atoms. Atoms are content-addressed: two atoms with the same type and
//! the same content are the same atom, which is how the store interns them.
//!
//! Code outside the store holds [`Handle`]s, cheap shared references that
//! never allow mutation. Rewriting an expression always builds a new atom and
//! leaves the original untouched, so [`Handle::ptr_eq`] answers "did this
//! subtree change" without a deep comparison.

use std::collections::HashMap;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::truth::TruthValue;

/// Variable groundings for one instantiation call.
pub type Bindings = HashMap<Handle, Handle>;

/// Type tag of an atom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AtomType {
    // Nodes
    Concept,
    Predicate,
    Number,
    Variable,
    Type,
    DefinedSchema,
    GroundedSchema,
    GroundedPredicate,

    // Links
    List,
    Set,
    Quote,
    Lambda,
    VariableList,
    Put,
    ExecutionOutput,
    Define,
    Plus,
    Times,
    Minus,
    Divide,
    Delete,
    Arity,
    StrengthOf,
    ConfidenceOf,
    Get,
    Evaluation,
    Equal,
    GreaterThan,
    Not,
    Inheritance,
    Member,
}

/// Arithmetic accumulator applied by a fold link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FoldOp {
    Plus,
    Times,
    Minus,
    Divide,
}

/// Generic function links that are built and executed in one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionOp {
    /// Number of children.
    Arity,
    /// Strength of the single child's truth value.
    StrengthOf,
    /// Confidence of the single child's truth value.
    ConfidenceOf,
}

/// How the instantiator treats a link, by type.
///
/// This is the closed dispatch table of the walk: adding an executable link
/// type means adding a variant here and an arm in the instantiator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkKind {
    /// Opaque to substitution.
    Quote,
    /// Unreduced application (Put): template + argument.
    Redex,
    /// Schema applied to an argument list.
    ExecutionOutput,
    /// Variadic arithmetic reduction.
    Fold(FoldOp),
    /// Removes its children from the store.
    Delete,
    /// Generic function executed after substitution.
    Function(FunctionOp),
    /// Pattern query delegated to the query engine.
    Query,
    /// Everything else: rebuilt with substituted children.
    Ordinary,
}

impl AtomType {
    /// Whether atoms of this type are nodes (named leaves).
    pub fn is_node(self) -> bool {
        matches!(
            self,
            Self::Concept
                | Self::Predicate
                | Self::Number
                | Self::Variable
                | Self::Type
                | Self::DefinedSchema
                | Self::GroundedSchema
                | Self::GroundedPredicate
        )
    }

    /// Whether atoms of this type are links.
    pub fn is_link(self) -> bool {
        !self.is_node()
    }

    /// Dispatch class of a link type. Node types map to `Ordinary`.
    pub fn link_kind(self) -> LinkKind {
        match self {
            Self::Quote => LinkKind::Quote,
            Self::Put => LinkKind::Redex,
            Self::ExecutionOutput => LinkKind::ExecutionOutput,
            Self::Plus => LinkKind::Fold(FoldOp::Plus),
            Self::Times => LinkKind::Fold(FoldOp::Times),
            Self::Minus => LinkKind::Fold(FoldOp::Minus),
            Self::Divide => LinkKind::Fold(FoldOp::Divide),
            Self::Delete => LinkKind::Delete,
            Self::Arity => LinkKind::Function(FunctionOp::Arity),
            Self::StrengthOf => LinkKind::Function(FunctionOp::StrengthOf),
            Self::ConfidenceOf => LinkKind::Function(FunctionOp::ConfidenceOf),
            Self::Get => LinkKind::Query,
            _ => LinkKind::Ordinary,
        }
    }

    /// Display name of the type.
    pub fn name(self) -> &'static str {
        match self {
            Self::Concept => "Concept",
            Self::Predicate => "Predicate",
            Self::Number => "Number",
            Self::Variable => "Variable",
            Self::Type => "Type",
            Self::DefinedSchema => "DefinedSchema",
            Self::GroundedSchema => "GroundedSchema",
            Self::GroundedPredicate => "GroundedPredicate",
            Self::List => "List",
            Self::Set => "Set",
            Self::Quote => "Quote",
            Self::Lambda => "Lambda",
            Self::VariableList => "VariableList",
            Self::Put => "Put",
            Self::ExecutionOutput => "ExecutionOutput",
            Self::Define => "Define",
            Self::Plus => "Plus",
            Self::Times => "Times",
            Self::Minus => "Minus",
            Self::Divide => "Divide",
            Self::Delete => "Delete",
            Self::Arity => "Arity",
            Self::StrengthOf => "StrengthOf",
            Self::ConfidenceOf => "ConfidenceOf",
            Self::Get => "Get",
            Self::Evaluation => "Evaluation",
            Self::Equal => "Equal",
            Self::GreaterThan => "GreaterThan",
            Self::Not => "Not",
            Self::Inheritance => "Inheritance",
            Self::Member => "Member",
        }
    }
}

impl std::fmt::Display for AtomType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl From<FoldOp> for AtomType {
    fn from(op: FoldOp) -> Self {
        match op {
            FoldOp::Plus => Self::Plus,
            FoldOp::Times => Self::Times,
            FoldOp::Minus => Self::Minus,
            FoldOp::Divide => Self::Divide,
        }
    }
}

impl From<FunctionOp> for AtomType {
    fn from(op: FunctionOp) -> Self {
        match op {
            FunctionOp::Arity => Self::Arity,
            FunctionOp::StrengthOf => Self::StrengthOf,
            FunctionOp::ConfidenceOf => Self::ConfidenceOf,
        }
    }
}

/// Content of an atom: a name for nodes, children for links.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AtomBody {
    Name(String),
    Outgoing(Vec<Handle>),
}

/// An immutable hypergraph atom.
#[derive(Debug)]
pub struct Atom {
    atom_type: AtomType,
    body: AtomBody,
    tv: TruthValue,
    content_hash: u64,
}

impl Atom {
    fn new(atom_type: AtomType, body: AtomBody, tv: TruthValue) -> Self {
        let mut hasher = DefaultHasher::new();
        atom_type.hash(&mut hasher);
        match &body {
            AtomBody::Name(name) => name.hash(&mut hasher),
            AtomBody::Outgoing(children) => {
                children.len().hash(&mut hasher);
                for child in children {
                    child.0.content_hash.hash(&mut hasher);
                }
            }
        }
        Self {
            atom_type,
            body,
            tv,
            content_hash: hasher.finish(),
        }
    }
}

/// Cheap shared reference to an immutable atom.
///
/// Equality and hashing are by content, so a handle built outside the store
/// compares equal to the interned atom with the same shape.
#[derive(Debug, Clone)]
pub struct Handle(Arc<Atom>);

impl Handle {
    /// Build a node. `atom_type` must be a node type.
    pub fn node(atom_type: AtomType, name: impl Into<String>) -> Self {
        debug_assert!(atom_type.is_node(), "{atom_type} is not a node type");
        Self(Arc::new(Atom::new(
            atom_type,
            AtomBody::Name(name.into()),
            TruthValue::DEFAULT,
        )))
    }

    /// Build a link. `atom_type` must be a link type.
    pub fn link(atom_type: AtomType, outgoing: Vec<Handle>) -> Self {
        Self::link_with_tv(atom_type, outgoing, TruthValue::DEFAULT)
    }

    /// Build a link carrying a truth-value annotation.
    pub fn link_with_tv(atom_type: AtomType, outgoing: Vec<Handle>, tv: TruthValue) -> Self {
        debug_assert!(atom_type.is_link(), "{atom_type} is not a link type");
        Self(Arc::new(Atom::new(atom_type, AtomBody::Outgoing(outgoing), tv)))
    }

    /// Same content, different truth-value annotation.
    pub fn with_tv(&self, tv: TruthValue) -> Self {
        Self(Arc::new(Atom {
            atom_type: self.0.atom_type,
            body: self.0.body.clone(),
            tv,
            content_hash: self.0.content_hash,
        }))
    }

    pub fn concept(name: impl Into<String>) -> Self {
        Self::node(AtomType::Concept, name)
    }

    pub fn predicate(name: impl Into<String>) -> Self {
        Self::node(AtomType::Predicate, name)
    }

    pub fn variable(name: impl Into<String>) -> Self {
        Self::node(AtomType::Variable, name)
    }

    /// Number node; the name is the shortest decimal that round-trips `value`.
    pub fn number(value: f64) -> Self {
        Self::node(AtomType::Number, format!("{value}"))
    }

    pub fn list(outgoing: Vec<Handle>) -> Self {
        Self::link(AtomType::List, outgoing)
    }

    pub fn set(outgoing: Vec<Handle>) -> Self {
        Self::link(AtomType::Set, outgoing)
    }

    pub fn atom_type(&self) -> AtomType {
        self.0.atom_type
    }

    pub fn is_node(&self) -> bool {
        matches!(self.0.body, AtomBody::Name(_))
    }

    pub fn is_link(&self) -> bool {
        !self.is_node()
    }

    pub fn is_type(&self, atom_type: AtomType) -> bool {
        self.0.atom_type == atom_type
    }

    /// Node name, or `None` for links.
    pub fn name(&self) -> Option<&str> {
        match &self.0.body {
            AtomBody::Name(name) => Some(name.as_str()),
            AtomBody::Outgoing(_) => None,
        }
    }

    /// Children of a link; empty for nodes.
    pub fn outgoing(&self) -> &[Handle] {
        match &self.0.body {
            AtomBody::Name(_) => &[],
            AtomBody::Outgoing(children) => children,
        }
    }

    /// Number of children (0 for nodes).
    pub fn arity(&self) -> usize {
        self.outgoing().len()
    }

    pub fn body(&self) -> &AtomBody {
        &self.0.body
    }

    pub fn tv(&self) -> TruthValue {
        self.0.tv
    }

    /// Numeric value of a Number node.
    pub fn as_number(&self) -> Option<f64> {
        if self.0.atom_type != AtomType::Number {
            return None;
        }
        self.name().and_then(|n| n.parse().ok())
    }

    /// Whether both handles point at the very same allocation.
    pub fn ptr_eq(&self, other: &Handle) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for Handle {
    fn eq(&self, other: &Self) -> bool {
        if Arc::ptr_eq(&self.0, &other.0) {
            return true;
        }
        self.0.content_hash == other.0.content_hash
            && self.0.atom_type == other.0.atom_type
            && self.0.body == other.0.body
    }
}

impl Eq for Handle {}

impl Hash for Handle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.0.content_hash);
    }
}

impl std::fmt::Display for Handle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.0.body {
            AtomBody::Name(name) => write!(f, "({} {:?})", self.0.atom_type, name),
            AtomBody::Outgoing(children) => {
                write!(f, "({}", self.0.atom_type)?;
                for child in children {
                    write!(f, " {child}")?;
                }
                write!(f, ")")
            }
        }
    }
}
