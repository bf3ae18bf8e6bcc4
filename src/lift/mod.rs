//! Bytecode-to-CFG lifting.
//!
//! This module turns the decoded instruction stream of [`crate::bytecode`]
//! into the block-structured IR of [`crate::ir`]. See [`Lifter`] for the
//! algorithm: boundary discovery, block allocation with per-register
//! parameters, and per-kind instruction translation with synthesized
//! fallthrough branches.
//!
//! Rewrite passes must only run after lifting completes for the whole
//! function; the lifter is never interleaved with them, since rewrites assume
//! a fully formed, terminator-complete CFG.

mod lifter;

pub use lifter::{Diagnostic, LiftResult, Lifter, ENTRY_FUNCTION};
