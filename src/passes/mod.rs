//! CFG-to-CFG rewrite passes.
//!
//! Each pass is a total function from a well-formed CFG to a well-formed CFG,
//! independently invocable and composable in any order after lifting. A pass
//! either fully applies a rewrite at a site (replace, rewire every use,
//! discard the original) or leaves that site untouched; "this site does not
//! qualify" is a normal per-site outcome folded into the [`PassReport`],
//! never an error, and never stops processing of sibling sites.
//!
//! # Passes
//!
//! - [`ResolveMemoryPass`] - use-driven address/scalar reclassification of
//!   generic memory loads
//! - [`WriteLivenessPass`] - liveness-driven conversion of functional array
//!   writes into in-place updates
//!
//! Both passes are idempotent: rerunning one on already-rewritten IR finds no
//! remaining candidates and reports zero rewrites.

mod resolve_memory;
mod write_liveness;

pub use resolve_memory::ResolveMemoryPass;
pub use write_liveness::WriteLivenessPass;

use crate::ir::Function;
use crate::Result;

/// A rewrite pass over a single lifted function.
pub trait FunctionPass {
    /// Unique name for logging and debugging.
    fn name(&self) -> &'static str;

    /// Runs the pass on `function`.
    ///
    /// # Errors
    ///
    /// Returns an error only for fatal conditions (broken preconditions,
    /// internal invariant violations). Sites that merely decline to rewrite
    /// are counted in the report instead.
    fn run(&self, function: &mut Function) -> Result<PassReport>;
}

/// Per-run outcome counts of a rewrite pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassReport {
    /// Number of sites rewritten.
    pub rewritten: usize,
    /// Number of candidate sites inspected but left untouched.
    pub declined: usize,
}

impl PassReport {
    /// Returns `true` if the pass changed the function.
    #[must_use]
    pub const fn changed(&self) -> bool {
        self.rewritten > 0
    }
}
