//! Expression execution: instantiation and predicate evaluation.
//!
//! - [`instantiate`]: the grounding walk over an expression and its bindings
//! - [`evaluate`]: truth values of predicate expressions
//! - [`reduce`]: beta-reduction of Put redexes and lambdas
//! - [`fold`]: arithmetic folds
//! - [`function`]: generic function links

pub mod evaluate;
pub mod fold;
pub mod function;
pub mod instantiate;
pub mod reduce;

pub use evaluate::{DEFAULT_NATIVE_NAMESPACE, Evaluator};
pub use instantiate::Instantiator;
pub use reduce::Variables;
