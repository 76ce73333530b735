use std::fmt::Display;

use super::{AigEdge, AigError, FaninId, Result};

/// A node id.
///
/// Ids are indices into the arena of the owning [`Aig`], allocated densely and never reused.
/// The constant node [`AigNode::True`] has id 0 by convention.
///
/// [`Aig`]: super::Aig
pub type NodeId = usize;

/// An AIG node.
///
/// Nodes do not carry their fanouts: the owning [`Aig`] keeps the (non-owning) fanout lists
/// in a side table indexed by [`NodeId`].
///
/// [`Aig`]: super::Aig
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AigNode {
    /// The constant high/true signal. Constant false is its complemented edge.
    True,
    /// A primary input, `index` is its position in the ordered list of inputs.
    Input { id: NodeId, index: usize },
    /// A primary output. Its single fanin is bound once with [`Aig::add_fanin`].
    ///
    /// [`Aig::add_fanin`]: super::Aig::add_fanin
    Output {
        id: NodeId,
        index: usize,
        fanin: Option<AigEdge>,
    },
    /// An AND gate with two fanins, kept in canonical order (`fanin0 <= fanin1`).
    And {
        id: NodeId,
        fanin0: AigEdge,
        fanin1: AigEdge,
    },
}

/// The type tag of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Const1,
    Input,
    Output,
    And,
}

impl Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            NodeKind::Const1 => "constant",
            NodeKind::Input => "primary input",
            NodeKind::Output => "primary output",
            NodeKind::And => "and gate",
        };
        write!(f, "{}", s)
    }
}

impl AigNode {
    /// Returns a new and gate, fanins are reordered canonically.
    pub(super) fn and(id: NodeId, fanin0: AigEdge, fanin1: AigEdge) -> Self {
        let (fanin0, fanin1) = if fanin0 <= fanin1 {
            (fanin0, fanin1)
        } else {
            (fanin1, fanin0)
        };
        AigNode::And { id, fanin0, fanin1 }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            AigNode::True => NodeKind::Const1,
            AigNode::Input { .. } => NodeKind::Input,
            AigNode::Output { .. } => NodeKind::Output,
            AigNode::And { .. } => NodeKind::And,
        }
    }

    pub fn is_const(&self) -> bool {
        matches!(self, AigNode::True)
    }

    pub fn is_input(&self) -> bool {
        matches!(self, AigNode::Input { .. })
    }

    pub fn is_output(&self) -> bool {
        matches!(self, AigNode::Output { .. })
    }

    pub fn is_and(&self) -> bool {
        matches!(self, AigNode::And { .. })
    }

    pub fn get_id(&self) -> NodeId {
        match *self {
            AigNode::True => 0,
            AigNode::Input { id, .. } => id,
            AigNode::Output { id, .. } => id,
            AigNode::And { id, .. } => id,
        }
    }

    /// Returns the fanin edges: two for an and gate, at most one for an output.
    pub fn get_fanins(&self) -> Vec<AigEdge> {
        match self {
            AigNode::And { fanin0, fanin1, .. } => vec![*fanin0, *fanin1],
            AigNode::Output {
                fanin: Some(fanin), ..
            } => vec![*fanin],
            _ => vec![],
        }
    }

    /// Returns the selected fanin edge.
    ///
    /// Only valid for and gates (both fanins) and bound outputs ([`FaninId::Fanin0`] only).
    pub fn get_child(&self, fanin_id: FaninId) -> Result<AigEdge> {
        match (self, fanin_id) {
            (AigNode::And { fanin0, .. }, FaninId::Fanin0) => Ok(*fanin0),
            (AigNode::And { fanin1, .. }, FaninId::Fanin1) => Ok(*fanin1),
            (
                AigNode::Output {
                    fanin: Some(fanin), ..
                },
                FaninId::Fanin0,
            ) => Ok(*fanin),
            (AigNode::Output { id, fanin: None, .. }, FaninId::Fanin0) => {
                Err(AigError::UnboundOutput(*id))
            }
            _ => Err(AigError::NoFanin {
                id: self.get_id(),
                kind: self.kind(),
            }),
        }
    }

    /// Replaces every fanin pointing at `old` by `new` (polarity composed), returns whether
    /// something changed. And gate fanins are kept in canonical order.
    pub(super) fn redirect_fanin(&mut self, old: NodeId, new: AigEdge) -> bool {
        match self {
            AigNode::And { fanin0, fanin1, .. } => {
                let mut changed = false;
                for fanin in [&mut *fanin0, &mut *fanin1] {
                    if fanin.node == old {
                        *fanin = new.not_cond(fanin.complement);
                        changed = true;
                    }
                }
                if *fanin1 < *fanin0 {
                    std::mem::swap(fanin0, fanin1);
                }
                changed
            }
            AigNode::Output {
                fanin: Some(fanin), ..
            } if fanin.node == old => {
                *fanin = new.not_cond(fanin.complement);
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn and_fanins_are_canonical() {
        let a = AigEdge::new(2, false);
        let b = AigEdge::new(1, true);
        let n = AigNode::and(3, a, b);
        assert_eq!(n.get_fanins(), vec![b, a]);
        assert_eq!(n, AigNode::and(3, b, a));
    }

    #[test]
    fn child_contract() {
        let n = AigNode::and(3, AigEdge::new(1, false), AigEdge::new(2, true));
        assert_eq!(n.get_child(FaninId::Fanin1).unwrap(), AigEdge::new(2, true));

        let po = AigNode::Output {
            id: 4,
            index: 0,
            fanin: Some(AigEdge::new(3, true)),
        };
        assert_eq!(po.get_child(FaninId::Fanin0).unwrap(), AigEdge::new(3, true));
        assert!(po.get_child(FaninId::Fanin1).is_err());

        let unbound = AigNode::Output {
            id: 5,
            index: 1,
            fanin: None,
        };
        assert!(matches!(
            unbound.get_child(FaninId::Fanin0),
            Err(AigError::UnboundOutput(5))
        ));

        let pi = AigNode::Input { id: 1, index: 0 };
        assert!(matches!(
            pi.get_child(FaninId::Fanin0),
            Err(AigError::NoFanin {
                id: 1,
                kind: NodeKind::Input
            })
        ));
        assert!(AigNode::True.get_child(FaninId::Fanin0).is_err());
    }

    #[test]
    fn redirect_keeps_polarity_and_order() {
        let mut n = AigNode::and(5, AigEdge::new(1, false), AigEdge::new(3, true));
        assert!(n.redirect_fanin(3, AigEdge::new(0, true)));
        assert_eq!(
            n.get_fanins(),
            vec![AigEdge::new(0, false), AigEdge::new(1, false)]
        );
        assert!(!n.redirect_fanin(4, AigEdge::new(2, false)));
    }
}
