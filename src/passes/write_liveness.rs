//! Liveness-driven conversion of functional array writes.
//!
//! A functional [`Op::Write`] models a pure array update: it returns a new
//! whole-array value equal to the input with one element replaced, which
//! preserves referential transparency during lifting. Where the old array
//! value is provably never observed after the write, the update can legally
//! be performed destructively, which downstream consumers may prefer.
//!
//! # Example
//!
//! The recognized loop-closing select idiom:
//!
//! ```text
//! v5 = read v0[v3]          // reads of the old array may follow the select
//! v6 = write v4, v0[v2]
//! v7 = select v1, v6, v0    // new array if cond, old array otherwise
//! br b1(v7, ...)
//! ```
//!
//! After conversion the reads are moved ahead of the select and the write
//! mutates in place:
//!
//! ```text
//! v5 = read v0[v3]
//! v8 = write_inplace v4, v0[v2]
//! v7 = select v1, v8, v0
//! br b1(v7, ...)
//! ```
//!
//! # Liveness test
//!
//! A write converts only when its result has exactly one use in its own
//! block, and that use is either:
//!
//! - a block-terminating branch, or
//! - a select of the form `select(cond, write_result, base_array)` (either
//!   arm order) whose other arm is literally the pre-write array and whose
//!   own result has exactly one use, a branch. Every consumer of the base
//!   array positioned after the select must be a read, and each such read is
//!   moved to just before the select so it observes the old value; any other
//!   consumer there aborts the conversion.
//!
//! Each write gets a one-shot decision - converted or left byte-for-byte
//! untouched - and a declined site is never an error.

use std::collections::HashSet;

use crate::ir::{BlockId, Function, Op, UseIndex, ValueId};
use crate::passes::{FunctionPass, PassReport};
use crate::{Error, Result};

/// The one-shot decision for a single functional write.
enum Disposition {
    /// Convert, after moving the reads at the given positions (ascending)
    /// to just before the select at `select`, when present.
    Convert {
        /// Position of the select consuming the write, if the use is the
        /// select idiom rather than a direct branch.
        select: Option<usize>,
        /// Positions of reads of the base array that must move before the
        /// select. Empty for the direct-branch shape.
        reads: Vec<usize>,
    },
    /// Leave the write untouched.
    Decline,
}

/// Converts functional array writes into in-place updates where the prior
/// array value is dead.
///
/// This is an optimization, never required for correctness: every failure
/// mode declines conservatively.
pub struct WriteLivenessPass;

impl Default for WriteLivenessPass {
    fn default() -> Self {
        Self::new()
    }
}

impl WriteLivenessPass {
    /// Creates a new liveness pass.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Decides whether the functional write at `position` of `block` is
    /// convertible.
    fn disposition(
        function: &Function,
        uses: &UseIndex,
        block: BlockId,
        position: usize,
    ) -> Result<Disposition> {
        let ops = function.block(block).ops();
        let Some(&Op::Write {
            dest,
            array,
            in_place: false,
            ..
        }) = ops.get(position)
        else {
            return Err(Error::Internal(format!(
                "liveness test on a non-write at {block}:{position}"
            )));
        };

        // More than one reader of the new array value: cannot mutate in place.
        let Some(site) = uses.single_use(dest) else {
            return Ok(Disposition::Decline);
        };
        if site.block != block {
            return Ok(Disposition::Decline);
        }

        match &function.block(block).ops()[site.op] {
            Op::Branch { .. } => Ok(Disposition::Convert {
                select: None,
                reads: Vec::new(),
            }),
            Op::Select {
                dest: select_dest,
                true_value,
                false_value,
                ..
            } => {
                // The select's own result must flow only into a terminator.
                let Some(select_use) = uses.single_use(*select_dest) else {
                    return Ok(Disposition::Decline);
                };
                if !matches!(
                    function.block(select_use.block).ops()[select_use.op],
                    Op::Branch { .. }
                ) {
                    return Ok(Disposition::Decline);
                }

                // One arm recomputes the array via the write; the other arm
                // must be literally the same pre-write array. A write result
                // feeding the condition does not qualify.
                let other = if *true_value == dest {
                    *false_value
                } else if *false_value == dest {
                    *true_value
                } else {
                    return Ok(Disposition::Decline);
                };
                if other != array {
                    return Ok(Disposition::Decline);
                }

                let Some(reads) = Self::collect_trailing_reads(function, uses, block, array, site.op)
                else {
                    return Ok(Disposition::Decline);
                };
                Ok(Disposition::Convert {
                    select: Some(site.op),
                    reads,
                })
            }
            _ => Ok(Disposition::Decline),
        }
    }

    /// Collects the positions of every consumer of `array` after the select.
    ///
    /// Returns `None` when any such consumer is not a read (soundness cannot
    /// be established) or when the array escapes to another block.
    fn collect_trailing_reads(
        function: &Function,
        uses: &UseIndex,
        block: BlockId,
        array: ValueId,
        select: usize,
    ) -> Option<Vec<usize>> {
        let mut reads = Vec::new();
        for site in uses.uses_of(array) {
            if site.block != block {
                return None;
            }
            if site.op <= select {
                // The write itself, the select, and anything already ahead of
                // the mutation point observe the old value untouched.
                continue;
            }
            match function.block(block).ops()[site.op] {
                Op::Read { .. } => reads.push(site.op),
                _ => return None,
            }
        }
        reads.sort_unstable();
        Some(reads)
    }

    /// Applies a conversion: moves reads ahead of the select, then replaces
    /// the write in its slot and rewires its uses.
    fn convert(
        function: &mut Function,
        block: BlockId,
        position: usize,
        select: Option<usize>,
        reads: Vec<usize>,
    ) -> Result<()> {
        if let Some(select) = select {
            let ops = function.block_mut(block).ops_mut();
            let mut moved = Vec::with_capacity(reads.len());
            for &read in reads.iter().rev() {
                moved.push(ops.remove(read));
            }
            moved.reverse();
            // Every removed position was after the select, so the insertion
            // point is still valid; relative read order is preserved.
            for (offset, read) in moved.into_iter().enumerate() {
                ops.insert(select + offset, read);
            }
        }

        let Some(&Op::Write {
            dest,
            array,
            index,
            value,
            in_place: false,
        }) = function.block(block).op(position)
        else {
            return Err(Error::Internal(format!(
                "write at {block}:{position} vanished during conversion"
            )));
        };
        let replacement = function.alloc_value();
        *function
            .block_mut(block)
            .op_mut(position)
            .ok_or_else(|| Error::Internal(format!("write slot {position} vanished")))? =
            Op::Write {
                dest: replacement,
                array,
                index,
                value,
                in_place: true,
            };
        function.replace_uses(dest, replacement);
        Ok(())
    }
}

impl FunctionPass for WriteLivenessPass {
    fn name(&self) -> &'static str {
        "write-liveness"
    }

    fn run(&self, function: &mut Function) -> Result<PassReport> {
        let mut report = PassReport::default();

        for block_index in 0..function.block_count() {
            let block = BlockId::new(block_index);
            let mut tested: HashSet<ValueId> = HashSet::new();

            // Conversions may reorder operations after the current write, so
            // candidates are rediscovered after every decision instead of
            // collected up front.
            loop {
                let candidate = function.block(block).ops().iter().enumerate().find_map(
                    |(position, op)| match op {
                        Op::Write {
                            dest,
                            in_place: false,
                            ..
                        } if !tested.contains(dest) => Some((position, *dest)),
                        _ => None,
                    },
                );
                let Some((position, dest)) = candidate else {
                    break;
                };
                tested.insert(dest);

                let uses = UseIndex::build(function);
                match Self::disposition(function, &uses, block, position)? {
                    Disposition::Convert { select, reads } => {
                        Self::convert(function, block, position, select, reads)?;
                        report.rewritten += 1;
                    }
                    Disposition::Decline => {
                        report.declined += 1;
                    }
                }
            }
        }

        Ok(report)
    }
}
