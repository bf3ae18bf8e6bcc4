//! Value and block identifiers.
//!
//! Values and blocks are referenced through index newtypes rather than
//! pointers: a [`ValueId`] is an index into the defining function's value
//! space, a [`BlockId`] an index into its block list. Index-based handles keep
//! cross-references non-owning, so discarding an operation mid-rewrite can
//! never dangle.
//!
//! # Thread Safety
//!
//! Both types are `Copy` identifiers and are `Send` and `Sync`.

use std::fmt;

/// Identifier for an SSA value.
///
/// A value is the immutable result of some operation or a block parameter; it
/// has no identity beyond its definition site. Display format is `vN`.
///
/// # Examples
///
/// ```rust
/// use bpflift::ir::ValueId;
///
/// let id = ValueId::new(42);
/// assert_eq!(id.index(), 42);
/// assert_eq!(format!("{id}"), "v42");
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ValueId(usize);

impl ValueId {
    /// Creates a new value identifier.
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Returns the underlying index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Debug for ValueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

impl fmt::Display for ValueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Identifier for a basic block within its owning function.
///
/// Display format is `bN`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(usize);

impl BlockId {
    /// Creates a new block identifier.
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Returns the underlying index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Debug for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "b{}", self.0)
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "b{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_id() {
        let id = ValueId::new(5);
        assert_eq!(id.index(), 5);
        assert_eq!(format!("{id}"), "v5");
        assert_eq!(format!("{id:?}"), "v5");
    }

    #[test]
    fn test_block_id() {
        let id = BlockId::new(2);
        assert_eq!(id.index(), 2);
        assert_eq!(format!("{id}"), "b2");
        assert_eq!(format!("{id:?}"), "b2");
    }

    #[test]
    fn test_ordering() {
        assert!(ValueId::new(1) < ValueId::new(2));
        assert!(BlockId::new(0) < BlockId::new(1));
    }
}
