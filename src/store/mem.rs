//! In-memory atom table.
//!
//! Interns atoms by content, tracks each atom's incoming (parent) set so that
//! removal can refuse referenced atoms and cascade to orphaned children, and
//! keeps a name index of definitions. All data is lost on process exit.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use dashmap::DashMap;

use super::{GraphStore, StoreResult};
use crate::atom::{AtomBody, AtomType, Handle};
use crate::error::StoreError;
use crate::truth::TruthValue;

#[derive(Debug)]
struct Entry {
    canonical: Handle,
    incoming: HashSet<Handle>,
    tv: TruthValue,
}

type AtomTable = HashMap<Handle, Entry>;

/// Concurrent in-memory atom store.
#[derive(Debug, Default)]
pub struct AtomSpace {
    table: RwLock<AtomTable>,
    /// DefinedSchema node → canonical body of its stored Define link.
    /// Only written while the table write lock is held.
    definitions: DashMap<Handle, Handle>,
}

impl AtomSpace {
    /// Create an empty atom space.
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a node by type and name.
    pub fn add_node(&self, atom_type: AtomType, name: impl Into<String>) -> Handle {
        let mut table = self.table.write().expect("atom table lock poisoned");
        intern(&mut table, &self.definitions, &Handle::node(atom_type, name))
    }

    /// Intern a link by type and children.
    pub fn add_link(&self, atom_type: AtomType, outgoing: Vec<Handle>) -> StoreResult<Handle> {
        self.add(&Handle::link(atom_type, outgoing))
    }

    /// Bind a DefinedSchema node to a body by storing `Define(name, body)`.
    ///
    /// Definitions are unique: redefining a name fails until the existing
    /// Define link is removed, even when the body is the same.
    pub fn define(&self, name: &Handle, body: &Handle) -> StoreResult<Handle> {
        if !name.is_type(AtomType::DefinedSchema) {
            return Err(StoreError::InvalidDefinitionName {
                name: name.to_string(),
            });
        }
        let mut table = self.table.write().expect("atom table lock poisoned");
        if self.definitions.contains_key(name) {
            return Err(StoreError::AlreadyDefined {
                name: name.to_string(),
            });
        }
        let define = Handle::link(AtomType::Define, vec![name.clone(), body.clone()]);
        let define = self.insert(&mut table, &define)?;
        tracing::debug!(name = %name, "definition stored");
        Ok(define)
    }

    /// Check definition uniqueness for `atom`'s tree, then intern it.
    fn insert(&self, table: &mut AtomTable, atom: &Handle) -> StoreResult<Handle> {
        check_definitions(table, &self.definitions, atom, &mut HashMap::new())?;
        Ok(intern(table, &self.definitions, atom))
    }

    /// Replace the stored truth value of an atom. Returns false if not stored.
    pub fn set_truth_value(&self, atom: &Handle, tv: TruthValue) -> bool {
        let mut table = self.table.write().expect("atom table lock poisoned");
        match table.get_mut(atom) {
            Some(entry) => {
                entry.tv = tv;
                true
            }
            None => false,
        }
    }

    /// Whether an atom with this content is stored.
    pub fn contains(&self, atom: &Handle) -> bool {
        self.table
            .read()
            .expect("atom table lock poisoned")
            .contains_key(atom)
    }

    /// Parents of a stored atom (snapshot).
    pub fn incoming(&self, atom: &Handle) -> Vec<Handle> {
        self.table
            .read()
            .expect("atom table lock poisoned")
            .get(atom)
            .map(|e| e.incoming.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of stored atoms.
    pub fn len(&self) -> usize {
        self.table.read().expect("atom table lock poisoned").len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of stored definitions.
    pub fn definition_count(&self) -> usize {
        self.definitions.len()
    }
}

/// `(name, body)` of a Define link naming a DefinedSchema node.
fn definition_parts(atom: &Handle) -> Option<(&Handle, &Handle)> {
    if !atom.is_type(AtomType::Define) {
        return None;
    }
    match atom.outgoing() {
        [name, body] if name.is_type(AtomType::DefinedSchema) => Some((name, body)),
        _ => None,
    }
}

/// Refuse a tree that would add a second Define link for a name.
fn check_definitions(
    table: &AtomTable,
    definitions: &DashMap<Handle, Handle>,
    atom: &Handle,
    pending: &mut HashMap<Handle, Handle>,
) -> StoreResult<()> {
    if table.contains_key(atom) {
        return Ok(());
    }
    for child in atom.outgoing() {
        check_definitions(table, definitions, child, pending)?;
    }
    if let Some((name, body)) = definition_parts(atom) {
        let taken = definitions.contains_key(name)
            || pending.get(name).is_some_and(|other| other != body);
        if taken {
            return Err(StoreError::AlreadyDefined {
                name: name.to_string(),
            });
        }
        pending.insert(name.clone(), body.clone());
    }
    Ok(())
}

fn intern(
    table: &mut AtomTable,
    definitions: &DashMap<Handle, Handle>,
    atom: &Handle,
) -> Handle {
    if let Some(entry) = table.get_mut(atom) {
        if !atom.tv().is_default() {
            entry.tv = atom.tv();
        }
        return entry.canonical.clone();
    }

    let canonical = match atom.body() {
        AtomBody::Name(_) => atom.clone(),
        AtomBody::Outgoing(children) => {
            let interned: Vec<Handle> = children
                .iter()
                .map(|c| intern(table, definitions, c))
                .collect();
            if interned.iter().zip(children).all(|(i, c)| i.ptr_eq(c)) {
                atom.clone()
            } else {
                Handle::link_with_tv(atom.atom_type(), interned, atom.tv())
            }
        }
    };

    for child in canonical.outgoing() {
        if let Some(child_entry) = table.get_mut(child) {
            child_entry.incoming.insert(canonical.clone());
        }
    }
    table.insert(
        canonical.clone(),
        Entry {
            canonical: canonical.clone(),
            incoming: HashSet::new(),
            tv: atom.tv(),
        },
    );
    if let Some((name, body)) = definition_parts(&canonical) {
        definitions.insert(name.clone(), body.clone());
    }
    canonical
}

fn unique_children(atom: &Handle) -> Vec<Handle> {
    let mut seen = HashSet::new();
    atom.outgoing()
        .iter()
        .filter(|c| seen.insert((*c).clone()))
        .cloned()
        .collect()
}

/// Remove an unreferenced atom, unindexing it if it is a definition.
fn remove_entry(
    table: &mut AtomTable,
    definitions: &DashMap<Handle, Handle>,
    atom: &Handle,
    cascade: bool,
) -> bool {
    match table.get(atom) {
        None => return false,
        Some(entry) if !entry.incoming.is_empty() => {
            tracing::warn!(
                atom = %atom,
                parents = entry.incoming.len(),
                "refusing to remove atom that is still referenced"
            );
            return false;
        }
        Some(_) => {}
    }
    let Some(entry) = table.remove(atom) else {
        return false;
    };
    let canonical = entry.canonical;
    let children = unique_children(&canonical);
    for child in &children {
        if let Some(child_entry) = table.get_mut(child) {
            child_entry.incoming.remove(&canonical);
        }
    }
    if let Some((name, _)) = definition_parts(&canonical) {
        definitions.remove(name);
    }
    tracing::debug!(atom = %canonical, cascade, "atom removed");

    if cascade {
        for child in &children {
            let orphaned = table.get(child).is_some_and(|e| e.incoming.is_empty());
            if orphaned {
                remove_entry(table, definitions, child, true);
            }
        }
    }
    true
}

impl GraphStore for AtomSpace {
    fn add(&self, atom: &Handle) -> StoreResult<Handle> {
        let mut table = self.table.write().expect("atom table lock poisoned");
        self.insert(&mut table, atom)
    }

    fn get(&self, atom: &Handle) -> Option<Handle> {
        self.table
            .read()
            .expect("atom table lock poisoned")
            .get(atom)
            .map(|e| e.canonical.clone())
    }

    fn remove(&self, atom: &Handle, cascade: bool) -> bool {
        let mut table = self.table.write().expect("atom table lock poisoned");
        remove_entry(&mut table, &self.definitions, atom, cascade)
    }

    fn lookup_definition(&self, name: &Handle) -> StoreResult<Handle> {
        self.definitions
            .get(name)
            .map(|body| body.value().clone())
            .ok_or_else(|| StoreError::DefinitionNotFound {
                name: name.to_string(),
            })
    }

    fn truth_value(&self, atom: &Handle) -> Option<TruthValue> {
        self.table
            .read()
            .expect("atom table lock poisoned")
            .get(atom)
            .map(|e| e.tv)
    }
}
