//! IR operations.
//!
//! This module defines [`Op`], the closed operation set of the lifted IR.
//! Every operation is in `result = op(operands)` form with explicit
//! [`ValueId`] operands, which makes def-use chains directly constructible and
//! keeps pattern matching exhaustive: adding a new kind without updating a
//! dispatch site is a compile error.
//!
//! # Operation Categories
//!
//! - **Constants**: materialized immediates and descriptor ids
//! - **ALU**: binary and unary register arithmetic
//! - **Memory**: width-tagged loads and stores over (base, offset)
//! - **Arrays**: value-semantics reads, writes (functional or in-place), and
//!   three-way selects
//! - **Control flow**: branches carrying full block-argument vectors, returns
//!
//! # Field Documentation
//!
//! Fields follow a consistent naming convention:
//! - `dest`: the destination value for the operation result
//! - `left`, `right`: binary operands
//! - `operand`: unary operand
//! - `base`, `offset`: address computation operands of memory operations
//! - `array`, `index`: array and index for element operations
//! - `value`: a value being stored or written
//! - `target`, `args`: branch target block and its actual arguments
//!
//! # Thread Safety
//!
//! All types in this module are `Send` and `Sync`.

use std::fmt;

use crate::bytecode::{AluOp, MemWidth, UnaryAluOp};
use crate::ir::{BlockId, ValueId};

/// Classification of a memory load's result.
///
/// A freshly lifted load is [`LoadMode::Int`]: its result may be a pointer or
/// a plain integer, the bytecode does not say. The resolution pass inspects
/// the result's uses and specializes the load to [`LoadMode::Addr`] when every
/// use expects an address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMode {
    /// Generic integer result (unresolved).
    Int,
    /// Address-producing result (resolved).
    Addr,
}

/// An IR operation with explicit operands.
///
/// # Conventions
///
/// - Operations that produce a result carry it in a `dest` field; terminators
///   and stores produce none.
/// - A [`Op::Branch`] passes one actual argument per target-block parameter;
///   this is the only mechanism by which values cross block boundaries.
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    // ========================================================================
    // Constants
    // ========================================================================
    /// Materialized constant: `dest = const value`.
    Const {
        /// Result value.
        dest: ValueId,
        /// The constant.
        value: i64,
    },

    // ========================================================================
    // ALU
    // ========================================================================
    /// Binary ALU operation: `dest = op(left, right)`.
    Binary {
        /// Result value.
        dest: ValueId,
        /// The ALU operation.
        op: AluOp,
        /// Left operand (the destination register's incoming value).
        left: ValueId,
        /// Right operand (register value or materialized immediate).
        right: ValueId,
    },

    /// Unary ALU operation: `dest = op(operand)`.
    Unary {
        /// Result value.
        dest: ValueId,
        /// The unary operation.
        op: UnaryAluOp,
        /// The operand.
        operand: ValueId,
    },

    // ========================================================================
    // Memory
    // ========================================================================
    /// Width-tagged load: `dest = load{width}(base, offset)`.
    Load {
        /// Result value.
        dest: ValueId,
        /// Access width.
        width: MemWidth,
        /// Result classification (integer vs. address).
        mode: LoadMode,
        /// Base address operand.
        base: ValueId,
        /// Constant offset operand.
        offset: ValueId,
    },

    /// Width-tagged store: `store{width}(base, offset, value)`. No result.
    Store {
        /// Access width.
        width: MemWidth,
        /// Base address operand.
        base: ValueId,
        /// Constant offset operand.
        offset: ValueId,
        /// The stored value.
        value: ValueId,
    },

    /// Map-descriptor load: `dest = load_map(current, descriptor)`.
    LoadMap {
        /// Result value.
        dest: ValueId,
        /// The destination register's incoming value.
        current: ValueId,
        /// The materialized descriptor-id constant.
        descriptor: ValueId,
    },

    // ========================================================================
    // Arrays
    // ========================================================================
    /// Array element read: `dest = array[index]`.
    Read {
        /// Result value.
        dest: ValueId,
        /// The array operand.
        array: ValueId,
        /// The element index.
        index: ValueId,
    },

    /// Array write.
    ///
    /// With `in_place == false` this is a pure, value-semantics update: the
    /// result is a new whole-array value equal to `array` with `index`
    /// replaced by `value`. With `in_place == true` the update is performed
    /// destructively; the liveness pass flips the flag only after proving the
    /// prior array value is never observed again.
    Write {
        /// Result value (the updated array).
        dest: ValueId,
        /// The array being updated.
        array: ValueId,
        /// The element index.
        index: ValueId,
        /// The written value.
        value: ValueId,
        /// Mutation mode: `false` = functional, `true` = destructive.
        in_place: bool,
    },

    /// Three-way select: `dest = cond ? true_value : false_value`.
    Select {
        /// Result value.
        dest: ValueId,
        /// The condition.
        cond: ValueId,
        /// Value produced when the condition holds.
        true_value: ValueId,
        /// Value produced otherwise.
        false_value: ValueId,
    },

    // ========================================================================
    // Control flow
    // ========================================================================
    /// Unconditional branch passing `args` as the target's block arguments.
    Branch {
        /// The successor block.
        target: BlockId,
        /// Actual arguments, one per target parameter.
        args: Vec<ValueId>,
    },

    /// Function return.
    Return {
        /// The returned value.
        value: ValueId,
    },
}

impl Op {
    /// Returns the value defined by this operation, if any.
    #[must_use]
    pub fn dest(&self) -> Option<ValueId> {
        match self {
            Op::Const { dest, .. }
            | Op::Binary { dest, .. }
            | Op::Unary { dest, .. }
            | Op::Load { dest, .. }
            | Op::LoadMap { dest, .. }
            | Op::Read { dest, .. }
            | Op::Write { dest, .. }
            | Op::Select { dest, .. } => Some(*dest),
            Op::Store { .. } | Op::Branch { .. } | Op::Return { .. } => None,
        }
    }

    /// Returns the values read by this operation, in operand order.
    #[must_use]
    pub fn uses(&self) -> Vec<ValueId> {
        match self {
            Op::Const { .. } => vec![],
            Op::Binary { left, right, .. } => vec![*left, *right],
            Op::Unary { operand, .. } => vec![*operand],
            Op::Load { base, offset, .. } => vec![*base, *offset],
            Op::Store {
                base,
                offset,
                value,
                ..
            } => vec![*base, *offset, *value],
            Op::LoadMap {
                current,
                descriptor,
                ..
            } => vec![*current, *descriptor],
            Op::Read { array, index, .. } => vec![*array, *index],
            Op::Write {
                array,
                index,
                value,
                ..
            } => vec![*array, *index, *value],
            Op::Select {
                cond,
                true_value,
                false_value,
                ..
            } => vec![*cond, *true_value, *false_value],
            Op::Branch { args, .. } => args.clone(),
            Op::Return { value } => vec![*value],
        }
    }

    /// Returns `true` if this operation reads `value`.
    #[must_use]
    pub fn reads(&self, value: ValueId) -> bool {
        self.uses().contains(&value)
    }

    /// Returns `true` if this operation ends its block.
    #[must_use]
    pub fn is_terminator(&self) -> bool {
        matches!(self, Op::Branch { .. } | Op::Return { .. })
    }

    /// Replaces every read of `old` with `new`, returning the number of
    /// operand slots rewritten.
    ///
    /// The destination is never touched: rewiring moves *uses* to a new
    /// definition, it does not rename definitions.
    pub fn replace_use(&mut self, old: ValueId, new: ValueId) -> usize {
        let mut replaced = 0;
        let mut swap = |slot: &mut ValueId| {
            if *slot == old {
                *slot = new;
                replaced += 1;
            }
        };
        match self {
            Op::Const { .. } => {}
            Op::Binary { left, right, .. } => {
                swap(left);
                swap(right);
            }
            Op::Unary { operand, .. } => swap(operand),
            Op::Load { base, offset, .. } => {
                swap(base);
                swap(offset);
            }
            Op::Store {
                base,
                offset,
                value,
                ..
            } => {
                swap(base);
                swap(offset);
                swap(value);
            }
            Op::LoadMap {
                current,
                descriptor,
                ..
            } => {
                swap(current);
                swap(descriptor);
            }
            Op::Read { array, index, .. } => {
                swap(array);
                swap(index);
            }
            Op::Write {
                array,
                index,
                value,
                ..
            } => {
                swap(array);
                swap(index);
                swap(value);
            }
            Op::Select {
                cond,
                true_value,
                false_value,
                ..
            } => {
                swap(cond);
                swap(true_value);
                swap(false_value);
            }
            Op::Branch { args, .. } => {
                for arg in args {
                    swap(arg);
                }
            }
            Op::Return { value } => swap(value),
        }
        replaced
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Op::Const { dest, value } => write!(f, "{dest} = const {value}"),
            Op::Binary {
                dest,
                op,
                left,
                right,
            } => write!(f, "{dest} = {op} {left}, {right}"),
            Op::Unary { dest, op, operand } => write!(f, "{dest} = {op} {operand}"),
            Op::Load {
                dest,
                width,
                mode,
                base,
                offset,
            } => {
                let mnemonic = match mode {
                    LoadMode::Int => "load",
                    LoadMode::Addr => "load_addr",
                };
                write!(f, "{dest} = {mnemonic}{width} {base}, {offset}")
            }
            Op::Store {
                width,
                base,
                offset,
                value,
            } => write!(f, "store{width} {base}, {offset}, {value}"),
            Op::LoadMap {
                dest,
                current,
                descriptor,
            } => write!(f, "{dest} = load_map {current}, {descriptor}"),
            Op::Read { dest, array, index } => write!(f, "{dest} = read {array}[{index}]"),
            Op::Write {
                dest,
                array,
                index,
                value,
                in_place,
            } => {
                let mnemonic = if *in_place { "write_inplace" } else { "write" };
                write!(f, "{dest} = {mnemonic} {value}, {array}[{index}]")
            }
            Op::Select {
                dest,
                cond,
                true_value,
                false_value,
            } => write!(f, "{dest} = select {cond}, {true_value}, {false_value}"),
            Op::Branch { target, args } => {
                write!(f, "br {target}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ")")
            }
            Op::Return { value } => write!(f, "ret {value}"),
        }
    }
}
