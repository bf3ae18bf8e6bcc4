//! Non-owning def-use index.
//!
//! Rewrite passes navigate from a value's definition to its consumers. The
//! [`UseIndex`] provides that navigation as a plain map from [`ValueId`] to
//! the positions of consuming operations. It holds indices, never references:
//! the index neither owns nor outlives the operations it describes, and it is
//! rebuilt (cheaply, one function scan) whenever a pass has mutated the IR in
//! a way that moves operations.
//!
//! Slot replacement (swapping the operation stored at a position) keeps the
//! index valid for every value other than the replaced result; reordering
//! operations within a block does not.
//!
//! # Thread Safety
//!
//! All types in this module are `Send` and `Sync`.

use std::collections::HashMap;

use crate::ir::{BlockId, Function, ValueId};

/// The position of one consuming operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UseSite {
    /// The block containing the consumer.
    pub block: BlockId,
    /// The consumer's index within the block's operation list.
    pub op: usize,
}

impl UseSite {
    /// Creates a use site.
    #[must_use]
    pub const fn new(block: BlockId, op: usize) -> Self {
        Self { block, op }
    }
}

/// Index from value identity to the positions of its consuming operations.
///
/// An operation reading the same value through several operand slots
/// contributes a single site; passes that care about the operand position
/// re-inspect the operation itself.
#[derive(Debug, Clone, Default)]
pub struct UseIndex {
    uses: HashMap<ValueId, Vec<UseSite>>,
}

impl UseIndex {
    /// Builds the index with one scan over `function`.
    #[must_use]
    pub fn build(function: &Function) -> Self {
        let mut uses: HashMap<ValueId, Vec<UseSite>> = HashMap::new();
        for block in function.blocks() {
            for (position, op) in block.ops().iter().enumerate() {
                let mut seen_in_op: Vec<ValueId> = Vec::new();
                for value in op.uses() {
                    if seen_in_op.contains(&value) {
                        continue;
                    }
                    seen_in_op.push(value);
                    uses.entry(value)
                        .or_default()
                        .push(UseSite::new(block.id(), position));
                }
            }
        }
        Self { uses }
    }

    /// Returns the use sites of `value`, in block/position order of discovery.
    #[must_use]
    pub fn uses_of(&self, value: ValueId) -> &[UseSite] {
        self.uses.get(&value).map_or(&[], Vec::as_slice)
    }

    /// Returns the single use site of `value`, or `None` if it has zero or
    /// multiple uses.
    #[must_use]
    pub fn single_use(&self, value: ValueId) -> Option<UseSite> {
        match self.uses_of(value) {
            [site] => Some(*site),
            _ => None,
        }
    }

    /// Returns `true` if `value` has no consumers.
    #[must_use]
    pub fn is_unused(&self, value: ValueId) -> bool {
        self.uses_of(value).is_empty()
    }
}
