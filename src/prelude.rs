//! Common imports for working with lifted programs.
//!
//! A convenience module re-exporting the types most callers need: the decoded
//! instruction model, the IR, the lifter, and the rewrite passes.
//!
//! # Examples
//!
//! ```rust
//! use bpflift::prelude::*;
//!
//! let section = vec![LabeledInstruction::new(
//!     Label::new(0, 1),
//!     Instruction::Binary {
//!         op: AluOp::Mov,
//!         dst: Reg::new(0),
//!         src: Operand::Imm(0),
//!     },
//! )];
//! let lifted = Lifter::lift(&Program::new(vec![section]))?;
//! assert_eq!(lifted.function().name(), ENTRY_FUNCTION);
//! # Ok::<(), bpflift::Error>(())
//! ```

pub use crate::bytecode::{
    AluOp, CmpOp, Instruction, JumpCondition, Label, LabeledInstruction, MemWidth, Operand,
    Program, Reg, Section, UnaryAluOp, REGISTER_COUNT,
};
pub use crate::ir::{Block, BlockId, Function, LoadMode, Op, UseIndex, UseSite, ValueId};
pub use crate::lift::{Diagnostic, LiftResult, Lifter, ENTRY_FUNCTION};
pub use crate::passes::{FunctionPass, PassReport, ResolveMemoryPass, WriteLivenessPass};
pub use crate::{Error, Result};
