//! Address/scalar resolution of generic memory loads.
//!
//! A freshly lifted load is ambiguous: its result may be a pointer consumed
//! by another memory operation, or a plain integer. This pass recovers the
//! classification from the result's use sites and specializes qualifying
//! loads to their address-producing variant.
//!
//! # Example
//!
//! Before:
//! ```text
//! v12 = load64 v1, v11
//! store32 v12, v13, v14    // v12 is the store's *base* address
//! ```
//!
//! After:
//! ```text
//! v15 = load_addr64 v1, v11
//! store32 v15, v13, v14
//! ```
//!
//! # Algorithm
//!
//! For each generic ([`LoadMode::Int`]) load whose result has at least one
//! use:
//!
//! 1. Classify every use site: **address-expected** if the consumer is itself
//!    a memory load/store and the result occupies its base-address operand;
//!    **integer-expected** for the value or offset operand of a memory
//!    operation, and for any non-memory consumer.
//! 2. Aggregate asymmetrically: any integer-expected use keeps the load
//!    generic. A load with mixed uses is never specialized or split.
//! 3. Only when every use expects an address, replace the load in its slot
//!    with the [`LoadMode::Addr`] variant carrying a fresh result, rewire
//!    every use, and discard the original.
//!
//! Already-resolved loads are not candidates, so rerunning the pass is a
//! no-op.

use crate::ir::{BlockId, Function, LoadMode, Op, UseIndex, UseSite, ValueId};
use crate::passes::{FunctionPass, PassReport};
use crate::{Error, Result};

/// Use-driven reclassification of generic loads into address-producing loads.
///
/// A conservative, purely local pass: it never changes block structure,
/// never duplicates a load, and declines any site with a conflicting use.
pub struct ResolveMemoryPass;

impl Default for ResolveMemoryPass {
    fn default() -> Self {
        Self::new()
    }
}

impl ResolveMemoryPass {
    /// Creates a new resolution pass.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Returns `true` if the consumer at `site` expects `value` to be an
    /// address: the consumer is a memory operation and `value` occupies its
    /// base operand position.
    fn address_expected(function: &Function, site: UseSite, value: ValueId) -> bool {
        match function.block(site.block).ops().get(site.op) {
            Some(Op::Load { base, .. }) | Some(Op::Store { base, .. }) => *base == value,
            _ => false,
        }
    }
}

impl FunctionPass for ResolveMemoryPass {
    fn name(&self) -> &'static str {
        "resolve-memory"
    }

    fn run(&self, function: &mut Function) -> Result<PassReport> {
        let mut report = PassReport::default();

        let mut candidates: Vec<(BlockId, usize)> = Vec::new();
        for block in function.blocks() {
            for (position, op) in block.ops().iter().enumerate() {
                if let Op::Load {
                    mode: LoadMode::Int,
                    ..
                } = op
                {
                    candidates.push((block.id(), position));
                }
            }
        }

        // Rewrites below replace operations in their slots without moving
        // anything, so positions recorded here stay valid throughout.
        let uses = UseIndex::build(function);

        for (block, position) in candidates {
            let Some(&Op::Load {
                dest,
                width,
                mode: LoadMode::Int,
                base,
                offset,
            }) = function.block(block).op(position)
            else {
                continue;
            };

            if uses.is_unused(dest) {
                return Err(Error::Internal(format!(
                    "resolving load {dest} whose result has no uses"
                )));
            }

            let all_address = uses
                .uses_of(dest)
                .iter()
                .all(|site| Self::address_expected(function, *site, dest));
            if !all_address {
                // Any integer-expected use wins; mixed uses stay generic.
                report.declined += 1;
                continue;
            }

            let replacement = function.alloc_value();
            *function
                .block_mut(block)
                .op_mut(position)
                .ok_or_else(|| Error::Internal(format!("load slot {position} vanished")))? =
                Op::Load {
                    dest: replacement,
                    width,
                    mode: LoadMode::Addr,
                    base,
                    offset,
                };
            function.replace_uses(dest, replacement);
            report.rewritten += 1;
        }

        Ok(report)
    }
}
