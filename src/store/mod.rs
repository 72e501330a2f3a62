//! Graph store: the canonical, deduplicated table of atoms.
//!
//! The engine never owns atoms. It proposes atom shapes by content and the
//! store interns them, hands back canonical handles, removes them on request
//! and resolves defined-schema indirections by name.
//!
//! - [`GraphStore`]: the contract the engine consumes
//! - [`mem::AtomSpace`]: in-memory reference implementation

pub mod mem;

use crate::atom::Handle;
use crate::error::StoreError;
use crate::truth::TruthValue;

pub use mem::AtomSpace;

/// Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Operations the instantiator needs from the atom store.
///
/// Implementations must be safe under concurrent use: several instantiation
/// calls may share one store.
pub trait GraphStore: Send + Sync {
    /// Intern `atom` and all of its descendants, returning the canonical
    /// handle. Idempotent.
    ///
    /// A Define link naming a DefinedSchema node is the definition of that
    /// name. Adding a second one for an already defined name fails with
    /// [`StoreError::AlreadyDefined`] and stores nothing.
    fn add(&self, atom: &Handle) -> StoreResult<Handle>;

    /// Canonical handle for an atom with the same content, if stored.
    fn get(&self, atom: &Handle) -> Option<Handle>;

    /// Remove `atom` if nothing references it. With `cascade`, children left
    /// without any parent are removed too. Returns whether `atom` was removed.
    fn remove(&self, atom: &Handle, cascade: bool) -> bool;

    /// Resolve a defined-schema node to its stored body.
    fn lookup_definition(&self, name: &Handle) -> StoreResult<Handle>;

    /// Stored truth value of an atom, if stored.
    fn truth_value(&self, atom: &Handle) -> Option<TruthValue>;
}
