#![deny(missing_docs)]
#![allow(clippy::too_many_arguments)]

//! # bpflift
//!
//! Lifts a linear sequence of register-based bytecode instructions (an
//! eBPF-style virtual-machine program) into a block-structured intermediate
//! representation organized as a control-flow graph of basic blocks, and then
//! refines that representation with narrow, provably-safe local rewrite passes
//! driven by use-def and liveness facts.
//!
//! ## Features
//!
//! - **Block-argument SSA** - Registers are never modeled as mutable storage:
//!   every basic block carries one formal parameter per register, and every
//!   control transfer passes the full register vector as block arguments.
//!   This gives an SSA discipline without explicit phi instructions.
//! - **Boundary discovery** - Basic-block boundaries are computed in a single
//!   scan over the instruction stream from jump targets and conditional
//!   fallthrough successors.
//! - **Use-driven rewrites** - Two local passes illustrate the pattern:
//!   address/scalar reclassification of ambiguous memory loads, and
//!   liveness-driven conversion of functional array writes into in-place
//!   updates.
//! - **Structured diagnostics** - Unsupported instructions are reported with
//!   their originating offsets, never silently dropped.
//!
//! ## Architecture
//!
//! The crate is organized leaves-first:
//!
//! - [`bytecode`] - The decoded instruction model. Produced by an external
//!   decoder, consumed read-only by the lifter.
//! - [`ir`] - Values, operations, basic blocks, and functions, plus the
//!   non-owning use index that passes rebuild on demand.
//! - [`lift`] - The bytecode-to-CFG lifter.
//! - [`passes`] - CFG-to-CFG rewrite passes, independently invocable and
//!   idempotent on already-rewritten functions.
//!
//! ## Quick Start
//!
//! ```rust
//! use bpflift::prelude::*;
//!
//! // A straight-line section: r1 += 5; r0 = r1 (as decoded upstream)
//! let section = vec![
//!     LabeledInstruction::new(
//!         Label::new(0, 1),
//!         Instruction::Binary {
//!             op: AluOp::Add,
//!             dst: Reg::new(1),
//!             src: Operand::Imm(5),
//!         },
//!     ),
//!     LabeledInstruction::new(
//!         Label::new(1, 2),
//!         Instruction::Binary {
//!             op: AluOp::Mov,
//!             dst: Reg::new(0),
//!             src: Operand::Reg(Reg::new(1)),
//!         },
//!     ),
//! ];
//!
//! let lifted = Lifter::lift(&Program::new(vec![section]))?;
//! assert_eq!(lifted.function().block_count(), 1);
//! assert!(lifted.diagnostics().is_empty());
//! # Ok::<(), bpflift::Error>(())
//! ```
//!
//! ## Scope
//!
//! The binary decoder, the instruction schema's textual round-trip, and the
//! pass-manager wiring are external collaborators. Some instruction kinds
//! (calls, conditional jumps, packet/atomic ops, ...) are not lowered by this
//! core; each occurrence is reported through [`lift::Diagnostic`] and lifting
//! continues.

#[macro_use]
mod error;

pub mod bytecode;
pub mod ir;
pub mod lift;
pub mod passes;
pub mod prelude;

pub use error::Error;

/// Convenience alias for `Result<T, bpflift::Error>`.
pub type Result<T> = std::result::Result<T, Error>;
