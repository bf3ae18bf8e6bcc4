//! Function representation - a complete lifted body as a CFG of blocks.
//!
//! A [`Function`] is the top-level container produced by the lifter. It owns
//! its basic blocks and is the sole allocator of [`ValueId`]s, so a value's
//! identity is unambiguous within its function.
//!
//! # Structure
//!
//! ```text
//! Function
//! ├── name: String          // e.g. "xdp_entry"
//! ├── blocks: Vec<Block>    // entry block first
//! └── next_value: usize     // value allocator state
//! ```
//!
//! # Invariants
//!
//! After lifting (checked by [`Function::validate`]):
//!
//! - every block ends in exactly one terminator;
//! - every branch passes as many arguments as its target has parameters;
//! - every value has exactly one definition site;
//! - a value defined by an operation is not read earlier in the same block.
//!
//! # Thread Safety
//!
//! `Function` is `Send` and `Sync` once constructed.

use std::collections::HashSet;
use std::fmt;

use crate::ir::{Block, BlockId, Op, ValueId};
use crate::{Error, Result};

/// A lifted function: a named, block-structured CFG body.
///
/// # Examples
///
/// ```rust
/// use bpflift::ir::{Function, Op, ValueId};
///
/// let mut func = Function::new("xdp_entry");
/// let entry = func.add_block(2);
/// let param = func.block(entry).params()[0];
/// func.block_mut(entry).push(Op::Return { value: param });
///
/// assert!(func.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct Function {
    /// The function name.
    name: String,

    /// Basic blocks; the entry block is first.
    blocks: Vec<Block>,

    /// Next unallocated value index.
    next_value: usize,
}

impl Function {
    /// Creates a new empty function.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            blocks: Vec::new(),
            next_value: 0,
        }
    }

    /// Creates a new function with pre-allocated block capacity.
    #[must_use]
    pub fn with_capacity(name: &str, block_capacity: usize) -> Self {
        Self {
            name: name.to_string(),
            blocks: Vec::with_capacity(block_capacity),
            next_value: 0,
        }
    }

    /// Returns the function name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Allocates a fresh value.
    pub fn alloc_value(&mut self) -> ValueId {
        let id = ValueId::new(self.next_value);
        self.next_value += 1;
        id
    }

    /// Returns the number of values allocated so far.
    #[must_use]
    pub const fn value_count(&self) -> usize {
        self.next_value
    }

    /// Appends a new block with `param_count` freshly allocated parameters and
    /// returns its id.
    pub fn add_block(&mut self, param_count: usize) -> BlockId {
        let id = BlockId::new(self.blocks.len());
        let params = (0..param_count).map(|_| self.alloc_value()).collect();
        self.blocks.push(Block::new(id, params));
        id
    }

    /// Returns all blocks.
    #[must_use]
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Returns a mutable reference to all blocks.
    pub fn blocks_mut(&mut self) -> &mut Vec<Block> {
        &mut self.blocks
    }

    /// Returns the number of blocks.
    #[must_use]
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Returns the block with the given id.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not allocated by this function.
    #[must_use]
    pub fn block(&self, id: BlockId) -> &Block {
        &self.blocks[id.index()]
    }

    /// Returns a mutable reference to the block with the given id.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not allocated by this function.
    pub fn block_mut(&mut self, id: BlockId) -> &mut Block {
        &mut self.blocks[id.index()]
    }

    /// Returns the entry block, if any block exists.
    #[must_use]
    pub fn entry(&self) -> Option<&Block> {
        self.blocks.first()
    }

    /// Replaces every read of `old` with `new` across the whole function,
    /// returning the number of operand slots rewritten.
    ///
    /// Definition sites are not renamed; this rewires uses onto a replacement
    /// definition during a rewrite.
    pub fn replace_uses(&mut self, old: ValueId, new: ValueId) -> usize {
        let mut replaced = 0;
        for block in &mut self.blocks {
            for op in block.ops_mut() {
                replaced += op.replace_use(old, new);
            }
        }
        replaced
    }

    /// Checks the structural invariants of a fully lifted function.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Internal`] naming the first violated invariant:
    /// a block without terminator, a branch whose argument count differs from
    /// its target's parameter count, a branch to an unknown block, a value
    /// with multiple definitions, or a within-block read before definition.
    pub fn validate(&self) -> Result<()> {
        let mut defined: HashSet<ValueId> = HashSet::new();
        for block in &self.blocks {
            for value in block.defined_values() {
                if !defined.insert(value) {
                    return Err(Error::Internal(format!(
                        "value {value} has multiple definitions"
                    )));
                }
            }
        }

        for block in &self.blocks {
            if !block.has_terminator() {
                return Err(Error::Internal(format!(
                    "block {} has no terminator",
                    block.id()
                )));
            }
            for (position, op) in block.ops().iter().enumerate() {
                if op.is_terminator() && position + 1 != block.op_count() {
                    return Err(Error::Internal(format!(
                        "block {} has a terminator before its last operation",
                        block.id()
                    )));
                }
                if let Op::Branch { target, args } = op {
                    let Some(target_block) = self.blocks.get(target.index()) else {
                        return Err(Error::Internal(format!(
                            "branch in block {} targets unknown block {target}",
                            block.id()
                        )));
                    };
                    if args.len() != target_block.param_count() {
                        return Err(Error::Internal(format!(
                            "branch to {target} passes {} arguments, expected {}",
                            args.len(),
                            target_block.param_count()
                        )));
                    }
                }
            }

            // Within-block ordering: an op result must not be read by an
            // earlier op of the same block.
            let mut seen: HashSet<ValueId> = block.params().iter().copied().collect();
            for op in block.ops() {
                for used in op.uses() {
                    let defined_here = block.ops().iter().any(|o| o.dest() == Some(used));
                    if defined_here && !seen.contains(&used) {
                        return Err(Error::Internal(format!(
                            "value {used} is read before its definition in block {}",
                            block.id()
                        )));
                    }
                }
                if let Some(dest) = op.dest() {
                    seen.insert(dest);
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "func @{} {{", self.name)?;
        for block in &self.blocks {
            write!(f, "{block}")?;
        }
        writeln!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::AluOp;

    #[test]
    fn test_function_creation() {
        let func = Function::new("xdp_entry");
        assert_eq!(func.name(), "xdp_entry");
        assert_eq!(func.block_count(), 0);
        assert!(func.entry().is_none());
    }

    #[test]
    fn test_add_block_allocates_params() {
        let mut func = Function::new("f");
        let b0 = func.add_block(3);
        let b1 = func.add_block(3);

        assert_eq!(func.block_count(), 2);
        assert_eq!(func.block(b0).param_count(), 3);
        assert_eq!(func.block(b1).param_count(), 3);
        // parameters are distinct values
        assert_eq!(func.value_count(), 6);
        assert_ne!(func.block(b0).params()[0], func.block(b1).params()[0]);
    }

    #[test]
    fn test_replace_uses() {
        let mut func = Function::new("f");
        let b0 = func.add_block(1);
        let param = func.block(b0).params()[0];
        let dest = func.alloc_value();
        func.block_mut(b0).push(Op::Binary {
            dest,
            op: AluOp::Add,
            left: param,
            right: param,
        });
        func.block_mut(b0).push(Op::Return { value: dest });

        let fresh = func.alloc_value();
        assert_eq!(func.replace_uses(dest, fresh), 1);
        assert!(matches!(
            func.block(b0).ops().last(),
            Some(Op::Return { value }) if *value == fresh
        ));
    }

    #[test]
    fn test_validate_ok() {
        let mut func = Function::new("f");
        let b0 = func.add_block(2);
        let b1 = func.add_block(2);
        let params: Vec<_> = func.block(b0).params().to_vec();
        func.block_mut(b0).push(Op::Branch {
            target: b1,
            args: params,
        });
        let ret = func.block(b1).params()[0];
        func.block_mut(b1).push(Op::Return { value: ret });

        assert!(func.validate().is_ok());
    }

    #[test]
    fn test_validate_missing_terminator() {
        let mut func = Function::new("f");
        let b0 = func.add_block(1);
        let param = func.block(b0).params()[0];
        let dest = func.alloc_value();
        func.block_mut(b0).push(Op::Binary {
            dest,
            op: AluOp::Add,
            left: param,
            right: param,
        });

        assert!(matches!(func.validate(), Err(Error::Internal(_))));
    }

    #[test]
    fn test_validate_arity_mismatch() {
        let mut func = Function::new("f");
        let b0 = func.add_block(2);
        let b1 = func.add_block(2);
        let first = func.block(b0).params()[0];
        func.block_mut(b0).push(Op::Branch {
            target: b1,
            args: vec![first],
        });
        let ret = func.block(b1).params()[0];
        func.block_mut(b1).push(Op::Return { value: ret });

        assert!(matches!(func.validate(), Err(Error::Internal(_))));
    }

    #[test]
    fn test_validate_double_definition() {
        let mut func = Function::new("f");
        let b0 = func.add_block(1);
        let param = func.block(b0).params()[0];
        func.block_mut(b0).push(Op::Const {
            dest: param,
            value: 1,
        });
        func.block_mut(b0).push(Op::Return { value: param });

        assert!(matches!(func.validate(), Err(Error::Internal(_))));
    }

    #[test]
    fn test_validate_use_before_def() {
        let mut func = Function::new("f");
        let b0 = func.add_block(1);
        let late = func.alloc_value();
        let early = func.alloc_value();
        func.block_mut(b0).push(Op::Unary {
            dest: early,
            op: crate::bytecode::UnaryAluOp::Neg,
            operand: late,
        });
        func.block_mut(b0).push(Op::Const {
            dest: late,
            value: 0,
        });
        func.block_mut(b0).push(Op::Return { value: early });

        assert!(matches!(func.validate(), Err(Error::Internal(_))));
    }

    #[test]
    fn test_display() {
        let mut func = Function::new("f");
        let b0 = func.add_block(1);
        let param = func.block(b0).params()[0];
        func.block_mut(b0).push(Op::Return { value: param });

        let text = format!("{func}");
        assert!(text.starts_with("func @f {"));
        assert!(text.contains("b0(v0):"));
        assert!(text.contains("  ret v0"));
        assert!(text.ends_with("}\n"));
    }
}
