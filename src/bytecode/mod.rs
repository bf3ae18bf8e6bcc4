//! Decoded bytecode instruction model.
//!
//! This module defines the tagged instruction representation that the lifter
//! consumes. The instructions are produced by an external decoder which turns a
//! raw binary program image into an ordered sequence of
//! `(label, instruction, debug-info)` triples; this crate treats that sequence
//! as read-only input and never parses binary formats itself.
//!
//! # Structure
//!
//! ```text
//! Program
//! └── sections: Vec<Section>                  // independent entry points
//!     └── Section = Vec<LabeledInstruction>
//!         ├── label: Label                    // half-open offset range
//!         ├── instruction: Instruction        // tagged variant
//!         └── debug: Option<String>           // opaque debug info
//! ```
//!
//! Offsets are instruction indices: the decoder guarantees that the
//! instruction stored at index `i` of a section carries `label.from == i`.
//! Jump targets are expressed as the `from` offset of the target instruction.
//!
//! # Supported vs. carried kinds
//!
//! Only a subset of [`Instruction`] kinds is lowered by the lifter: binary and
//! unary ALU forms, memory loads/stores, map-descriptor loads, and
//! unconditional jumps. The remaining kinds (calls, conditional jumps, exit,
//! packet/atomic/assume/assert, loop-counter markers) are carried through
//! untranslated so that the lifter can report each occurrence with its offset.
//!
//! # Thread Safety
//!
//! All types in this module are plain data and are `Send` and `Sync`.

use std::fmt;

use strum::Display;

/// Number of registers in the instruction set (R0..R10).
pub const REGISTER_COUNT: usize = 11;

/// A register index.
///
/// The decoder is trusted to emit indices below [`REGISTER_COUNT`]; the lifter
/// re-checks the bound defensively and aborts with a malformed-input error
/// when it is violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Reg(u8);

impl Reg {
    /// Return value register R0.
    pub const R0_RETURN: Reg = Reg(0);
    /// First argument register R1.
    pub const R1_ARG: Reg = Reg(1);
    /// Stack pointer register R10.
    pub const R10_STACK: Reg = Reg(10);

    /// Creates a register from its index.
    #[must_use]
    pub const fn new(index: u8) -> Self {
        Self(index)
    }

    /// Returns the register index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Reg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

/// A half-open offset range `[from, to)` identifying an instruction's position
/// in the original stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Label {
    /// Start offset (the instruction's own index).
    pub from: usize,
    /// End offset (exclusive).
    pub to: usize,
}

impl Label {
    /// Creates a label covering `[from, to)`.
    #[must_use]
    pub const fn new(from: usize, to: usize) -> Self {
        Self { from, to }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.from, self.to)
    }
}

/// Binary ALU operations, including the plain and sign-extending move variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum AluOp {
    /// Move: `dst = src`.
    Mov,
    /// Sign-extending move from 8 bits.
    Movsx8,
    /// Sign-extending move from 16 bits.
    Movsx16,
    /// Sign-extending move from 32 bits.
    Movsx32,
    /// Addition.
    Add,
    /// Subtraction.
    Sub,
    /// Multiplication.
    Mul,
    /// Unsigned division.
    UDiv,
    /// Signed division.
    SDiv,
    /// Unsigned modulo.
    UMod,
    /// Signed modulo.
    SMod,
    /// Bitwise or.
    Or,
    /// Bitwise and.
    And,
    /// Logical shift left.
    Lsh,
    /// Logical shift right.
    Rsh,
    /// Arithmetic shift right.
    Arsh,
    /// Bitwise xor.
    Xor,
}

/// Unary ALU operations: endianness conversions, byte swaps, bitwise negate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum UnaryAluOp {
    /// Convert to big-endian, 16 bit.
    Be16,
    /// Convert to big-endian, 32 bit.
    Be32,
    /// Convert to big-endian, 64 bit.
    Be64,
    /// Convert to little-endian, 16 bit.
    Le16,
    /// Convert to little-endian, 32 bit.
    Le32,
    /// Convert to little-endian, 64 bit.
    Le64,
    /// Unconditional byte swap, 16 bit.
    Swap16,
    /// Unconditional byte swap, 32 bit.
    Swap32,
    /// Unconditional byte swap, 64 bit.
    Swap64,
    /// Bitwise negate.
    Neg,
}

/// Memory access width in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemWidth {
    /// 1 byte.
    B1,
    /// 2 bytes.
    B2,
    /// 4 bytes.
    B4,
    /// 8 bytes.
    B8,
}

impl MemWidth {
    /// Returns the access width in bytes.
    #[must_use]
    pub const fn bytes(self) -> u8 {
        match self {
            MemWidth::B1 => 1,
            MemWidth::B2 => 2,
            MemWidth::B4 => 4,
            MemWidth::B8 => 8,
        }
    }

    /// Returns the access width in bits.
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.bytes() * 8
    }
}

impl fmt::Display for MemWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bits())
    }
}

/// The right-hand operand of a binary instruction: a register or an immediate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    /// A register operand.
    Reg(Reg),
    /// An immediate operand.
    Imm(i64),
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Reg(reg) => write!(f, "{reg}"),
            Operand::Imm(imm) => write!(f, "{imm}"),
        }
    }
}

/// Comparison operator of a conditional jump.
///
/// Conditional jumps are not lowered by this core; the operator is carried for
/// diagnostics and for boundary discovery only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum CmpOp {
    /// Equal.
    Eq,
    /// Not equal.
    Ne,
    /// Less than.
    Lt,
    /// Less than or equal.
    Le,
    /// Greater than.
    Gt,
    /// Greater than or equal.
    Ge,
    /// Bit test (`left & right != 0`).
    Set,
}

/// The condition attached to a conditional jump.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JumpCondition {
    /// Comparison operator.
    pub op: CmpOp,
    /// Left comparison operand.
    pub left: Reg,
    /// Right comparison operand.
    pub right: Operand,
}

/// A decoded instruction.
///
/// A closed sum type with exhaustive matching at every dispatch site, so the
/// compiler flags newly added kinds that lack a handler.
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    /// Binary ALU instruction: `dst = dst op src`.
    Binary {
        /// The ALU operation.
        op: AluOp,
        /// Destination (and left operand) register.
        dst: Reg,
        /// Right operand: register or immediate.
        src: Operand,
    },

    /// Unary ALU instruction: `dst = op dst`.
    Unary {
        /// The unary operation.
        op: UnaryAluOp,
        /// The register that is both operand and destination.
        dst: Reg,
    },

    /// Memory access: load into `value` or store from `value`.
    Memory {
        /// `true` for a load, `false` for a store.
        is_load: bool,
        /// Access width.
        width: MemWidth,
        /// Base address register.
        base: Reg,
        /// Constant byte offset from the base.
        offset: i64,
        /// Loaded-into or stored-from register.
        value: Reg,
    },

    /// Load of a map descriptor: `dst = load_map(dst, descriptor)`.
    LoadMapDescriptor {
        /// Destination register.
        dst: Reg,
        /// The map descriptor id.
        descriptor: i64,
    },

    /// Jump to `target`, unconditional when `condition` is `None`.
    ///
    /// Only the unconditional form is lowered; conditional jumps contribute
    /// block boundaries but are reported as unsupported.
    Jump {
        /// Target offset (the `from` offset of the target instruction).
        target: usize,
        /// Optional condition.
        condition: Option<JumpCondition>,
    },

    /// Helper call. Not lowered.
    Call {
        /// The helper function id.
        helper: i64,
    },

    /// Indirect call through a register. Not lowered.
    Callx {
        /// The register holding the call target.
        reg: Reg,
    },

    /// Program exit. Not lowered.
    Exit,

    /// Packet access. Not lowered.
    Packet,

    /// Atomic memory operation. Not lowered.
    Atomic,

    /// Verifier assumption. Not lowered.
    Assume,

    /// Verifier assertion. Not lowered.
    Assert,

    /// Loop counter marker. Not lowered.
    IncrementLoopCounter,

    /// Undefined instruction slot. Not lowered.
    Undefined,
}

impl Instruction {
    /// Returns a short name for the instruction kind, used in diagnostics.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Instruction::Binary { .. } => "binary",
            Instruction::Unary { .. } => "unary",
            Instruction::Memory { .. } => "memory",
            Instruction::LoadMapDescriptor { .. } => "load-map-descriptor",
            Instruction::Jump { condition: None, .. } => "jump",
            Instruction::Jump {
                condition: Some(_), ..
            } => "conditional jump",
            Instruction::Call { .. } => "call",
            Instruction::Callx { .. } => "callx",
            Instruction::Exit => "exit",
            Instruction::Packet => "packet",
            Instruction::Atomic => "atomic",
            Instruction::Assume => "assume",
            Instruction::Assert => "assert",
            Instruction::IncrementLoopCounter => "increment-loop-counter",
            Instruction::Undefined => "undefined",
        }
    }
}

/// An instruction paired with its label and optional debug info.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledInstruction {
    /// The instruction's position in the original stream.
    pub label: Label,
    /// The decoded instruction.
    pub instruction: Instruction,
    /// Opaque debug info carried through from the decoder.
    pub debug: Option<String>,
}

impl LabeledInstruction {
    /// Creates a labeled instruction without debug info.
    #[must_use]
    pub fn new(label: Label, instruction: Instruction) -> Self {
        Self {
            label,
            instruction,
            debug: None,
        }
    }

    /// Creates a labeled instruction with debug info.
    #[must_use]
    pub fn with_debug(label: Label, instruction: Instruction, debug: String) -> Self {
        Self {
            label,
            instruction,
            debug: Some(debug),
        }
    }
}

/// An ordered sequence of labeled instructions.
pub type Section = Vec<LabeledInstruction>;

/// A decoded program: one or more independent instruction sections.
///
/// A program may have multiple sections (e.g. multiple entry points); only the
/// first is lowered into a function body by the lifter.
#[derive(Debug, Clone, Default)]
pub struct Program {
    sections: Vec<Section>,
}

impl Program {
    /// Creates a program from its decoded sections.
    #[must_use]
    pub fn new(sections: Vec<Section>) -> Self {
        Self { sections }
    }

    /// Returns all sections.
    #[must_use]
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Returns the first section, if any.
    #[must_use]
    pub fn first_section(&self) -> Option<&Section> {
        self.sections.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reg_index() {
        assert_eq!(Reg::new(3).index(), 3);
        assert_eq!(Reg::R0_RETURN.index(), 0);
        assert_eq!(Reg::R10_STACK.index(), 10);
        assert_eq!(format!("{}", Reg::new(7)), "r7");
    }

    #[test]
    fn test_label_display() {
        assert_eq!(format!("{}", Label::new(4, 5)), "[4, 5)");
    }

    #[test]
    fn test_mem_width() {
        assert_eq!(MemWidth::B1.bytes(), 1);
        assert_eq!(MemWidth::B8.bits(), 64);
        assert_eq!(format!("{}", MemWidth::B4), "32");
    }

    #[test]
    fn test_alu_op_mnemonics() {
        assert_eq!(format!("{}", AluOp::Add), "add");
        assert_eq!(format!("{}", AluOp::Movsx16), "movsx16");
        assert_eq!(format!("{}", UnaryAluOp::Be32), "be32");
        assert_eq!(format!("{}", UnaryAluOp::Neg), "neg");
    }

    #[test]
    fn test_kind_names() {
        let uncond = Instruction::Jump {
            target: 3,
            condition: None,
        };
        let cond = Instruction::Jump {
            target: 3,
            condition: Some(JumpCondition {
                op: CmpOp::Eq,
                left: Reg::new(1),
                right: Operand::Imm(0),
            }),
        };
        assert_eq!(uncond.kind_name(), "jump");
        assert_eq!(cond.kind_name(), "conditional jump");
        assert_eq!(Instruction::Exit.kind_name(), "exit");
        assert_eq!(Instruction::Atomic.kind_name(), "atomic");
    }

    #[test]
    fn test_program_sections() {
        let program = Program::new(vec![]);
        assert!(program.first_section().is_none());

        let section = vec![LabeledInstruction::new(
            Label::new(0, 1),
            Instruction::Exit,
        )];
        let program = Program::new(vec![section.clone(), vec![]]);
        assert_eq!(program.sections().len(), 2);
        assert_eq!(program.first_section(), Some(&section));
    }
}
