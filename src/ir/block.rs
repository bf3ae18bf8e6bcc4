//! Basic blocks with formal parameters.
//!
//! A block is an ordered list of operations plus a formal parameter list.
//! Parameters replace phi instructions: each incoming branch supplies one
//! actual argument per parameter, and different predecessors may supply
//! different values for the same logical register. After lifting, every block
//! ends in exactly one terminator ([`Op::Branch`] or [`Op::Return`]).
//!
//! # Block Structure
//!
//! ```text
//! b1(v11, v12, ..., v21):      // one parameter per register
//!   v22 = const 5
//!   v23 = add v12, v22
//!   br b2(v11, v23, ..., v21)  // full register vector as arguments
//! ```
//!
//! # Thread Safety
//!
//! All types in this module are `Send` and `Sync`.

use std::fmt;

use crate::ir::{BlockId, Op, ValueId};

/// A basic block: formal parameters plus an ordered operation list.
///
/// Blocks are owned by their [`crate::ir::Function`]; predecessor/successor
/// edges are implicit in branch operands.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    /// This block's id within its function.
    id: BlockId,

    /// Formal parameters, bound afresh from each incoming branch's arguments.
    params: Vec<ValueId>,

    /// Operations in execution order.
    ops: Vec<Op>,
}

impl Block {
    /// Creates a new empty block.
    ///
    /// Callers normally go through [`crate::ir::Function::add_block`], which
    /// allocates the parameter values.
    #[must_use]
    pub fn new(id: BlockId, params: Vec<ValueId>) -> Self {
        Self {
            id,
            params,
            ops: Vec::new(),
        }
    }

    /// Returns the block id.
    #[must_use]
    pub const fn id(&self) -> BlockId {
        self.id
    }

    /// Returns the formal parameters.
    #[must_use]
    pub fn params(&self) -> &[ValueId] {
        &self.params
    }

    /// Returns the number of formal parameters.
    #[must_use]
    pub fn param_count(&self) -> usize {
        self.params.len()
    }

    /// Returns the operations in this block.
    #[must_use]
    pub fn ops(&self) -> &[Op] {
        &self.ops
    }

    /// Returns a mutable reference to the operations.
    pub fn ops_mut(&mut self) -> &mut Vec<Op> {
        &mut self.ops
    }

    /// Returns the number of operations.
    #[must_use]
    pub fn op_count(&self) -> usize {
        self.ops.len()
    }

    /// Returns `true` if this block has no operations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Appends an operation.
    pub fn push(&mut self, op: Op) {
        self.ops.push(op);
    }

    /// Gets an operation by index.
    #[must_use]
    pub fn op(&self, index: usize) -> Option<&Op> {
        self.ops.get(index)
    }

    /// Gets a mutable operation by index.
    pub fn op_mut(&mut self, index: usize) -> Option<&mut Op> {
        self.ops.get_mut(index)
    }

    /// Returns the block's terminator, if its last operation is one.
    #[must_use]
    pub fn terminator(&self) -> Option<&Op> {
        self.ops.last().filter(|op| op.is_terminator())
    }

    /// Returns `true` if the block ends in a terminator.
    #[must_use]
    pub fn has_terminator(&self) -> bool {
        self.terminator().is_some()
    }

    /// Returns all values defined in this block: parameters and op results.
    pub fn defined_values(&self) -> impl Iterator<Item = ValueId> + '_ {
        let param_defs = self.params.iter().copied();
        let op_defs = self.ops.iter().filter_map(Op::dest);
        param_defs.chain(op_defs)
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.id)?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{param}")?;
        }
        writeln!(f, "):")?;

        for op in &self.ops {
            writeln!(f, "  {op}")?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::AluOp;

    fn v(index: usize) -> ValueId {
        ValueId::new(index)
    }

    #[test]
    fn test_block_creation() {
        let block = Block::new(BlockId::new(3), vec![v(0), v(1)]);
        assert_eq!(block.id(), BlockId::new(3));
        assert_eq!(block.param_count(), 2);
        assert!(block.is_empty());
        assert!(!block.has_terminator());
    }

    #[test]
    fn test_block_push_and_access() {
        let mut block = Block::new(BlockId::new(0), vec![v(0)]);
        block.push(Op::Const { dest: v(1), value: 3 });
        block.push(Op::Return { value: v(1) });

        assert_eq!(block.op_count(), 2);
        assert!(block.op(0).is_some());
        assert!(block.op(2).is_none());
    }

    #[test]
    fn test_block_terminator() {
        let mut block = Block::new(BlockId::new(0), vec![v(0)]);
        block.push(Op::Const { dest: v(1), value: 3 });
        assert!(block.terminator().is_none());

        block.push(Op::Branch {
            target: BlockId::new(1),
            args: vec![v(1)],
        });
        assert!(block.has_terminator());
        assert!(matches!(block.terminator(), Some(Op::Branch { .. })));
    }

    #[test]
    fn test_block_defined_values() {
        let mut block = Block::new(BlockId::new(0), vec![v(0), v(1)]);
        block.push(Op::Binary {
            dest: v(2),
            op: AluOp::Add,
            left: v(0),
            right: v(1),
        });
        block.push(Op::Return { value: v(2) });

        let defs: Vec<_> = block.defined_values().collect();
        assert_eq!(defs, vec![v(0), v(1), v(2)]);
    }

    #[test]
    fn test_block_display() {
        let mut block = Block::new(BlockId::new(1), vec![v(0), v(1)]);
        block.push(Op::Binary {
            dest: v(2),
            op: AluOp::Add,
            left: v(0),
            right: v(1),
        });

        let display = format!("{block}");
        assert!(display.contains("b1(v0, v1):"));
        assert!(display.contains("  v2 = add v0, v1"));
    }
}
