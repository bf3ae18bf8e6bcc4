//! Block-structured intermediate representation.
//!
//! This module provides the IR the lifter produces: immutable SSA-style
//! values, a closed operation set, basic blocks with formal parameters, and
//! the owning function container. Registers never appear as mutable storage;
//! dataflow threads through operation results and block parameters, and every
//! control transfer carries a full actual-argument vector matching its
//! target's parameter arity.
//!
//! # Architecture
//!
//! - [`value`](ValueId) - Value and block index newtypes
//! - [`op`](Op) - The operation enum with def/use accessors
//! - [`block`](Block) - Basic blocks owning parameters and operations
//! - [`function`](Function) - The owning container and value allocator
//! - [`uses`](UseIndex) - Non-owning def-use navigation, rebuilt per pass
//!
//! # Ownership
//!
//! The function exclusively owns its blocks; each block exclusively owns its
//! operations and its parameter list. All cross-references are index-based:
//! values are identified by [`ValueId`], blocks by [`BlockId`], and the
//! [`UseIndex`] is a transient lookaside structure that never owns what it
//! points at.

mod block;
mod function;
mod op;
mod uses;
mod value;

pub use block::Block;
pub use function::Function;
pub use op::{LoadMode, Op};
pub use uses::{UseIndex, UseSite};
pub use value::{BlockId, ValueId};
