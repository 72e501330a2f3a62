//! Pattern query contract.
//!
//! The search algorithm lives outside this crate. A Get link is handed to a
//! [`PatternQuery`] implementation, and whatever set of atoms it returns is
//! the value of the Get expression.

use crate::atom::Handle;
use crate::error::ExecResult;

/// External pattern matcher: finds store atoms satisfying a query.
pub trait PatternQuery: Send + Sync {
    /// All atoms (or groundings) matching `query`, in no particular order.
    fn satisfy(&self, query: &Handle) -> ExecResult<Vec<Handle>>;
}

impl<F> PatternQuery for F
where
    F: Fn(&Handle) -> ExecResult<Vec<Handle>> + Send + Sync,
{
    fn satisfy(&self, query: &Handle) -> ExecResult<Vec<Handle>> {
        self(query)
    }
}
