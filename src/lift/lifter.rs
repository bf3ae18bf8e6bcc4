//! Bytecode-to-CFG lifter.
//!
//! The lifter turns an offset-addressed instruction stream into a
//! block-structured [`Function`]. It proceeds in three phases over the first
//! section of a decoded program:
//!
//! 1. **Boundary discovery**: one scan collects the set of block-start
//!    offsets - offset 0, every jump target, and the fallthrough successor of
//!    every conditional jump - deduplicated and sorted ascending.
//! 2. **Block allocation**: one basic block per boundary, each with one
//!    formal parameter per register (the abstract register file at block
//!    entry). A process-local index from offset to block is kept for the
//!    duration of the lift and consulted when resolving jump targets.
//! 3. **Translation**: boundaries are walked in order; for each window
//!    `[cur, next)` the register file is reset from the owning block's
//!    parameters and every instruction is dispatched on its kind. A block
//!    that ends without a terminator receives a synthesized fallthrough
//!    branch passing the *current* register vector - this is the mechanism
//!    that replaces phi instructions, since each predecessor may pass a
//!    different value for the same logical register.
//!
//! Unsupported instruction kinds are reported through [`Diagnostic`] records
//! and skipped; they never abort the lift and are never silently dropped. The
//! same holds for dead code: once a window has emitted a terminator, its
//! remaining instructions are unreachable (no boundary points at them) and
//! each is reported and skipped rather than placed after the terminator.
//!
//! # Thread Safety
//!
//! The lifter is a single-use, single-threaded builder; the produced
//! [`Function`] is `Send` and `Sync`.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::bytecode::{
    AluOp, Instruction, Label, LabeledInstruction, MemWidth, Operand, Program, Reg, UnaryAluOp,
    REGISTER_COUNT,
};
use crate::ir::{BlockId, Function, LoadMode, Op, ValueId};
use crate::{Error, Result};

/// Name given to the lifted entry function.
pub const ENTRY_FUNCTION: &str = "xdp_entry";

/// A structured diagnostic attached to a source offset.
///
/// Diagnostics report recoverable per-instruction conditions (unsupported
/// kinds); fatal conditions surface as [`Error`] instead.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    message: String,
    label: Label,
}

impl Diagnostic {
    /// Creates a diagnostic for the instruction at `label`.
    #[must_use]
    pub fn new(message: String, label: Label) -> Self {
        Self { message, label }
    }

    /// Returns the diagnostic message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the originating label.
    #[must_use]
    pub const fn label(&self) -> Label {
        self.label
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.label, self.message)
    }
}

/// The outcome of a successful lift: the function plus collected diagnostics.
#[derive(Debug, Clone)]
pub struct LiftResult {
    function: Function,
    diagnostics: Vec<Diagnostic>,
}

impl LiftResult {
    /// Returns the lifted function.
    #[must_use]
    pub fn function(&self) -> &Function {
        &self.function
    }

    /// Returns a mutable reference to the lifted function, e.g. for running
    /// rewrite passes.
    pub fn function_mut(&mut self) -> &mut Function {
        &mut self.function
    }

    /// Returns the diagnostics collected during lifting.
    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Consumes the result, returning the function.
    #[must_use]
    pub fn into_function(self) -> Function {
        self.function
    }
}

/// Lifts one instruction section into a CFG-structured function.
///
/// # Examples
///
/// ```rust
/// use bpflift::bytecode::{AluOp, Instruction, Label, LabeledInstruction, Operand, Program, Reg};
/// use bpflift::lift::Lifter;
///
/// let section = vec![LabeledInstruction::new(
///     Label::new(0, 1),
///     Instruction::Binary {
///         op: AluOp::Mov,
///         dst: Reg::new(0),
///         src: Operand::Imm(0),
///     },
/// )];
/// let lifted = Lifter::lift(&Program::new(vec![section]))?;
/// assert_eq!(lifted.function().block_count(), 1);
/// # Ok::<(), bpflift::Error>(())
/// ```
pub struct Lifter<'a> {
    /// The section being lifted (read-only decoder output).
    section: &'a [LabeledInstruction],

    /// The function under construction.
    function: Function,

    /// Offset of each discovered boundary to its owning block.
    ///
    /// Built once during lifting; not retained afterwards.
    block_at: BTreeMap<usize, BlockId>,

    /// The abstract register file: register index to its current value.
    ///
    /// Reset from the owning block's parameters at every boundary; updated
    /// after each translated instruction.
    registers: Vec<ValueId>,

    /// The block currently receiving operations.
    current: BlockId,

    /// Collected unsupported-instruction diagnostics.
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Lifter<'a> {
    /// Lifts the first section of `program` into a function.
    ///
    /// # Errors
    ///
    /// - [`Error::Empty`] if the program has no sections or the first section
    ///   has no instructions.
    /// - [`Error::Malformed`] if an instruction references a register index
    ///   outside the valid range.
    /// - [`Error::Internal`] if a jump target does not land on a discovered
    ///   block boundary (a lifter bug, not an input condition).
    pub fn lift(program: &Program) -> Result<LiftResult> {
        let section = program.first_section().ok_or(Error::Empty)?;
        if section.is_empty() {
            return Err(Error::Empty);
        }

        let boundaries = Self::collect_boundaries(section);
        let mut lifter = Lifter {
            section,
            function: Function::with_capacity(ENTRY_FUNCTION, boundaries.len()),
            block_at: BTreeMap::new(),
            registers: Vec::new(),
            current: BlockId::new(0),
            diagnostics: Vec::new(),
        };
        lifter.build_body(&boundaries)?;

        Ok(LiftResult {
            function: lifter.function,
            diagnostics: lifter.diagnostics,
        })
    }

    /// Collects the ordered set of block-start offsets.
    ///
    /// Offset 0 is always a boundary; every jump target starts a block; a
    /// conditional jump additionally makes the next offset a boundary so the
    /// taken and not-taken paths converge or diverge as separate blocks.
    fn collect_boundaries(section: &[LabeledInstruction]) -> Vec<usize> {
        let mut boundaries: BTreeSet<usize> = BTreeSet::new();
        boundaries.insert(0);
        for labeled in section {
            if let Instruction::Jump { target, condition } = &labeled.instruction {
                boundaries.insert(*target);
                if condition.is_some() {
                    boundaries.insert(labeled.label.from + 1);
                }
            }
        }
        boundaries.into_iter().collect()
    }

    /// Allocates blocks, walks boundary windows, and finishes the final block.
    fn build_body(&mut self, boundaries: &[usize]) -> Result<()> {
        for &offset in boundaries {
            let block = self.function.add_block(REGISTER_COUNT);
            self.block_at.insert(offset, block);
        }

        for (position, &start) in boundaries.iter().enumerate() {
            let next = boundaries
                .get(position + 1)
                .copied()
                .unwrap_or(self.section.len());
            self.current = self.block_at[&start];
            self.registers = self.function.block(self.current).params().to_vec();

            for offset in start..next.min(self.section.len()) {
                // A terminator closes the block; anything left in this window
                // is dead code that no boundary points at. Translating it
                // would put operations after the terminator.
                if self.function.block(self.current).has_terminator() {
                    self.report_unreachable(self.section[offset].label);
                    continue;
                }
                self.translate(offset)?;
            }

            if !self.function.block(self.current).has_terminator() {
                if let Some(next_start) = boundaries.get(position + 1) {
                    // Fallthrough into the next boundary's block, handing the
                    // current register vector across the edge.
                    let target = self.block_at[next_start];
                    let args = self.registers.clone();
                    self.function
                        .block_mut(self.current)
                        .push(Op::Branch { target, args });
                }
            }
        }

        // The final block returns R0's current value unless the program
        // already ended in an explicit control transfer.
        if !self.function.block(self.current).has_terminator() {
            let value = self.registers[Reg::R0_RETURN.index()];
            self.function.block_mut(self.current).push(Op::Return { value });
        }
        Ok(())
    }

    /// Translates one instruction, dispatching on its kind.
    fn translate(&mut self, offset: usize) -> Result<()> {
        let labeled = &self.section[offset];
        let label = labeled.label;
        match labeled.instruction.clone() {
            Instruction::Binary { op, dst, src } => self.lower_binary(op, dst, src),
            Instruction::Unary { op, dst } => self.lower_unary(op, dst),
            Instruction::Memory {
                is_load,
                width,
                base,
                offset: byte_offset,
                value,
            } => self.lower_memory(is_load, width, base, byte_offset, value),
            Instruction::LoadMapDescriptor { dst, descriptor } => {
                self.lower_load_map(dst, descriptor)
            }
            Instruction::Jump {
                target,
                condition: None,
            } => self.lower_jump(target),
            unsupported @ (Instruction::Jump {
                condition: Some(_), ..
            }
            | Instruction::Call { .. }
            | Instruction::Callx { .. }
            | Instruction::Exit
            | Instruction::Packet
            | Instruction::Atomic
            | Instruction::Assume
            | Instruction::Assert
            | Instruction::IncrementLoopCounter
            | Instruction::Undefined) => {
                self.report_unsupported(unsupported.kind_name(), label);
                Ok(())
            }
        }
    }

    /// Binary ALU: `dst = op(dst, src)`, result written back to `dst`.
    fn lower_binary(&mut self, op: AluOp, dst: Reg, src: Operand) -> Result<()> {
        let left = self.register_value(dst)?;
        let right = match src {
            Operand::Reg(reg) => self.register_value(reg)?,
            Operand::Imm(imm) => self.emit_const(imm),
        };
        let dest = self.function.alloc_value();
        self.emit(Op::Binary {
            dest,
            op,
            left,
            right,
        });
        self.set_register(dst, dest)
    }

    /// Unary ALU: `dst = op(dst)`.
    fn lower_unary(&mut self, op: UnaryAluOp, dst: Reg) -> Result<()> {
        let operand = self.register_value(dst)?;
        let dest = self.function.alloc_value();
        self.emit(Op::Unary { dest, op, operand });
        self.set_register(dst, dest)
    }

    /// Memory access: a load writes its result into `value`, a store emits a
    /// side-effecting operation and updates no register.
    fn lower_memory(
        &mut self,
        is_load: bool,
        width: MemWidth,
        base: Reg,
        byte_offset: i64,
        value: Reg,
    ) -> Result<()> {
        let base_value = self.register_value(base)?;
        let offset = self.emit_const(byte_offset);
        if is_load {
            let dest = self.function.alloc_value();
            self.emit(Op::Load {
                dest,
                width,
                mode: LoadMode::Int,
                base: base_value,
                offset,
            });
            self.set_register(value, dest)
        } else {
            let stored = self.register_value(value)?;
            self.emit(Op::Store {
                width,
                base: base_value,
                offset,
                value: stored,
            });
            Ok(())
        }
    }

    /// Map-descriptor load: combines the materialized descriptor id with the
    /// destination register's current value.
    fn lower_load_map(&mut self, dst: Reg, descriptor: i64) -> Result<()> {
        let current = self.register_value(dst)?;
        let descriptor = self.emit_const(descriptor);
        let dest = self.function.alloc_value();
        self.emit(Op::LoadMap {
            dest,
            current,
            descriptor,
        });
        self.set_register(dst, dest)
    }

    /// Unconditional jump: branch to the target offset's block, passing the
    /// full current register vector.
    fn lower_jump(&mut self, target: usize) -> Result<()> {
        let target_label = self
            .section
            .get(target)
            .map(|labeled| labeled.label)
            .ok_or_else(|| {
                Error::Internal(format!("jump target {target} is outside the section"))
            })?;
        if target_label.from != target {
            return Err(Error::Internal(format!(
                "instruction at index {target} carries label {target_label}"
            )));
        }
        let Some(&block) = self.block_at.get(&target) else {
            return Err(Error::Internal(format!(
                "jump target {target} is not at a discovered block boundary"
            )));
        };
        let args = self.registers.clone();
        self.emit(Op::Branch {
            target: block,
            args,
        });
        Ok(())
    }

    /// Appends an operation to the current block.
    fn emit(&mut self, op: Op) {
        self.function.block_mut(self.current).push(op);
    }

    /// Materializes a constant in the current block.
    fn emit_const(&mut self, value: i64) -> ValueId {
        let dest = self.function.alloc_value();
        self.emit(Op::Const { dest, value });
        dest
    }

    /// Looks up a register's current value, bounds-checked.
    fn register_value(&self, reg: Reg) -> Result<ValueId> {
        if reg.index() >= REGISTER_COUNT {
            return Err(malformed_error!(
                "register index {} is outside the valid range 0..{}",
                reg.index(),
                REGISTER_COUNT
            ));
        }
        Ok(self.registers[reg.index()])
    }

    /// Updates a register's current value, bounds-checked.
    fn set_register(&mut self, reg: Reg, value: ValueId) -> Result<()> {
        if reg.index() >= REGISTER_COUNT {
            return Err(malformed_error!(
                "register index {} is outside the valid range 0..{}",
                reg.index(),
                REGISTER_COUNT
            ));
        }
        self.registers[reg.index()] = value;
        Ok(())
    }

    /// Records an unsupported-instruction diagnostic.
    fn report_unsupported(&mut self, kind: &str, label: Label) {
        self.diagnostics.push(Diagnostic::new(
            format!("unsupported instruction kind `{kind}` skipped"),
            label,
        ));
    }

    /// Records a diagnostic for a dead instruction after a block terminator.
    fn report_unreachable(&mut self, label: Label) {
        self.diagnostics.push(Diagnostic::new(
            "unreachable instruction after a block terminator skipped".to_string(),
            label,
        ));
    }
}
