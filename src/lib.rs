// thiserror's #[error("...{field}...")] format strings reference struct fields,
// but the compiler doesn't see through the derive macro and reports false positives.
#![allow(unused_assignments)]

//! # hyperground
//!
//! An instantiation engine for a typed, content-addressed hypergraph.
//! Given an expression and a set of variable groundings it produces the
//! grounded expression, executing executable links (beta-redexes, lambda
//! applications, arithmetic folds, deletions, pattern queries and calls into
//! foreign scripting backends) along the way, and evaluates predicate
//! expressions to probabilistic truth values.
//!
//! ## Architecture
//!
//! - **Atoms** (`atom`): immutable, interned nodes and links behind shared handles
//! - **Truth values** (`truth`): strength/count judgments
//! - **Store** (`store`): concurrent in-memory atom space with definitions
//! - **Execution** (`exec`): the instantiation walk and the predicate evaluator
//! - **Foreign executors** (`foreign`): namespace-dispatched scripting backends
//! - **Pattern query** (`query`): the contract for the external matcher behind Get
//!
//! ## Library usage
//!
//! ```no_run
//! use hyperground::atom::{AtomType, Bindings, Handle};
//! use hyperground::engine::{Engine, EngineConfig};
//!
//! let engine = Engine::new(EngineConfig::default()).unwrap();
//! let x = Handle::variable("$X");
//! let expr = Handle::link(AtomType::Plus, vec![x.clone(), Handle::number(3.0)]);
//! let bindings: Bindings = [(x, Handle::number(2.0))].into_iter().collect();
//! let five = engine.instantiate(&expr, &bindings).unwrap();
//! assert_eq!(five, Some(Handle::number(5.0)));
//! ```

pub mod atom;
pub mod engine;
pub mod error;
pub mod exec;
pub mod foreign;
pub mod query;
pub mod store;
pub mod truth;
