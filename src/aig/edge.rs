//! An [`AigEdge`] points at an [`AigNode`] and can be complemented (indicates the presence of a NOT gate).
//!
//! [`AigNode`]: crate::AigNode

use std::{fmt::Display, ops::Not};

use super::{AigError, NodeId, Result};

/// Unambiguous fanin selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaninId {
    Fanin0,
    Fanin1,
}

impl From<bool> for FaninId {
    fn from(value: bool) -> Self {
        if value {
            FaninId::Fanin1
        } else {
            FaninId::Fanin0
        }
    }
}

impl TryFrom<usize> for FaninId {
    type Error = AigError;

    fn try_from(value: usize) -> Result<Self> {
        match value {
            0 => Ok(FaninId::Fanin0),
            1 => Ok(FaninId::Fanin1),
            _ => Err(AigError::InvalidFaninIndex(value)),
        }
    }
}

/// A directed edge representing a fanin for AIG nodes.
///
/// The edge is a plain `(node index, polarity)` pair: it does not own anything, and negating
/// it with `!` only flips the polarity bit, no node is ever allocated.
///
/// The derived order (node id first, then polarity) is the total order used to canonicalize
/// the operands of an AND gate before structural hashing.
///
/// ```rust
/// use fraig::{Aig, AigEdge};
/// let mut aig = Aig::new();
/// let a = aig.create_pi().unwrap();
/// assert_eq!(!!a, a);
/// assert_ne!((!a).is_complemented(), a.is_complemented());
/// assert_eq!((!a).regular(), a.regular());
/// assert_eq!(aig.const0(), !AigEdge::new(0, false));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AigEdge {
    /// The id of the node the edge is refering to.
    pub(super) node: NodeId,
    /// Set to true if signal should be inverted.
    pub(super) complement: bool,
}

impl Not for AigEdge {
    type Output = Self;

    fn not(mut self) -> Self::Output {
        self.complement = !self.complement;
        self
    }
}

impl From<&AigEdge> for (NodeId, bool) {
    fn from(edge: &AigEdge) -> Self {
        (edge.node, edge.complement)
    }
}

impl Display for AigEdge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", if self.complement { "~" } else { "" }, self.node)
    }
}

impl AigEdge {
    pub const fn new(node: NodeId, complement: bool) -> Self {
        AigEdge { node, complement }
    }

    /// The non-complemented edge to the given node.
    pub const fn positive(node: NodeId) -> Self {
        AigEdge::new(node, false)
    }

    /// The id of the node this edge refers to, whatever the polarity.
    pub const fn get_node_id(&self) -> NodeId {
        self.node
    }

    pub const fn is_complemented(&self) -> bool {
        self.complement
    }

    /// Strips the polarity bit.
    pub const fn regular(self) -> Self {
        AigEdge::new(self.node, false)
    }

    /// Complements the edge iff `complement` is set.
    pub const fn not_cond(self, complement: bool) -> Self {
        AigEdge::new(self.node, self.complement ^ complement)
    }

    /// The constant-1 node always has id 0, so this is the edge to `true`.
    pub const fn is_const1(&self) -> bool {
        self.node == 0 && !self.complement
    }

    /// Complemented edge to the constant-1 node.
    pub const fn is_const0(&self) -> bool {
        self.node == 0 && self.complement
    }

    pub fn is_complement_of(&self, other: &AigEdge) -> bool {
        self.node == other.node && self.complement ^ other.complement
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn not_is_involution() {
        for node in 0..4 {
            for complement in [false, true] {
                let e = AigEdge::new(node, complement);
                assert_eq!(!!e, e);
                assert_ne!((!e).is_complemented(), e.is_complemented());
                assert_eq!((!e).regular(), e.regular());
                assert!(e.is_complement_of(&!e));
                assert!(!e.is_complement_of(&e));
            }
        }
    }

    #[test]
    fn canonical_order() {
        let a = AigEdge::new(1, true);
        let b = AigEdge::new(2, false);
        assert!(a < b);
        assert!(AigEdge::new(1, false) < a);
        assert_eq!(a.not_cond(true), AigEdge::new(1, false));
        assert_eq!(a.not_cond(false), a);
    }

    #[test]
    fn constants() {
        let one = AigEdge::positive(0);
        assert!(one.is_const1());
        assert!((!one).is_const0());
        assert!(!AigEdge::positive(3).is_const1());
    }

    #[test]
    fn fanin_id_conversion() {
        assert_eq!(FaninId::try_from(0).unwrap(), FaninId::Fanin0);
        assert_eq!(FaninId::try_from(1).unwrap(), FaninId::Fanin1);
        assert!(FaninId::try_from(2).is_err());
        assert_eq!(FaninId::from(true), FaninId::Fanin1);
    }

    #[test]
    fn display() {
        assert_eq!(AigEdge::new(4, true).to_string(), "~@4");
        assert_eq!(AigEdge::new(4, false).to_string(), "@4");
    }
}
