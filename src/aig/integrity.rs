use std::collections::HashMap;

use crate::{Aig, AigEdge, AigError, AigNode, NodeId, Result};

use super::{Simplified, simplify_and};

impl Aig {
    /// Checking if the AIG structure is correct.
    /// This function was written for debug purposes, as the library is supposed to maintain
    /// integrity of the AIG at any moment.
    ///
    /// It checks that:
    /// - node ids are coherent with their slot, only the constant has id 0
    /// - inputs and outputs lists agree with the nodes they refer to
    /// - fanins refer to live nodes which are not outputs, and-gate fanins are canonical
    /// - fanout lists are exactly the reverse of the fanin relation
    /// - every and gate which is still used is the structural hash entry of its fanins
    /// - the graph is acyclic
    pub fn check_integrity(&self) -> Result<()> {
        let mut expected_fanouts: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
        for (slot, node) in self.nodes.iter().enumerate() {
            let Some(node) = node else {
                continue;
            };
            if node.get_id() != slot {
                return Err(AigError::InvalidState(format!(
                    "node in slot {} has id {}",
                    slot,
                    node.get_id()
                )));
            }
            self.check_node_integrity(node)?;
            for fanin in node.get_fanins() {
                expected_fanouts.entry(fanin.node).or_default().push(slot);
            }
        }

        for (k, &id) in self.inputs.iter().enumerate() {
            match self.get_node(id) {
                Some(AigNode::Input { index, .. }) if *index == k => (),
                _ => {
                    return Err(AigError::InvalidState(format!(
                        "input {} refers to node {} which is not the matching input",
                        k, id
                    )));
                }
            }
        }
        for (k, &id) in self.outputs.iter().enumerate() {
            match self.get_node(id) {
                Some(AigNode::Output { index, .. }) if *index == k => (),
                _ => {
                    return Err(AigError::InvalidState(format!(
                        "output {} refers to node {} which is not the matching output",
                        k, id
                    )));
                }
            }
        }

        // Fanout lists are multisets
        for (id, fanouts) in self.fanouts.iter().enumerate() {
            let mut actual = fanouts.clone();
            let mut expected = expected_fanouts.remove(&id).unwrap_or_default();
            actual.sort_unstable();
            expected.sort_unstable();
            if actual != expected {
                return Err(AigError::InvalidState(format!(
                    "incoherent fanouts for node {}: {:?} in table vs {:?} in reality",
                    id, actual, expected
                )));
            }
        }

        for ((fanin0, fanin1), edge) in &self.strash {
            for id in [fanin0.node, fanin1.node, edge.node] {
                if !self.contains(id) {
                    return Err(AigError::InvalidState(format!(
                        "structural hash entry refers to node {} which is not in the AIG",
                        id
                    )));
                }
            }
        }

        for (id, edge) in &self.forwards {
            if !self.contains(*id) || !self.contains(edge.node) {
                return Err(AigError::InvalidState(format!(
                    "replacement {} -> {} refers to a node which is not in the AIG",
                    id, edge
                )));
            }
        }

        let counted = self.nodes().filter(|node| node.is_and()).count();
        if counted != self.n_ands || self.nodes().count() != self.n_live {
            return Err(AigError::InvalidState("incoherent node counters".to_string()));
        }

        // Checks for acyclicity
        self.topological_sort()?;

        Ok(())
    }

    /// Same as [`Aig::check_integrity`] but only reports a boolean, the reason is logged.
    pub fn check(&self) -> bool {
        match self.check_integrity() {
            Ok(()) => true,
            Err(e) => {
                log::warn!("network check failed: {}", e);
                false
            }
        }
    }

    /// Check the integrity for an individual node.
    fn check_node_integrity(&self, node: &AigNode) -> Result<()> {
        match node {
            AigNode::True => Ok(()),
            AigNode::Input { id, .. } | AigNode::Output { id, fanin: None, .. } => {
                if *id == 0 {
                    return Err(AigError::InvalidState(format!(
                        "{} has id 0",
                        node.kind()
                    )));
                }
                Ok(())
            }
            AigNode::Output {
                id,
                fanin: Some(fanin),
                ..
            } => {
                if *id == 0 {
                    return Err(AigError::InvalidState("output has id 0".to_string()));
                }
                self.check_edge_integrity(fanin)
            }
            AigNode::And {
                id,
                fanin0,
                fanin1,
            } => {
                if *id == 0 {
                    return Err(AigError::InvalidState("and gate has id 0".to_string()));
                }
                self.check_edge_integrity(fanin0)?;
                self.check_edge_integrity(fanin1)?;
                if fanin0 > fanin1 {
                    return Err(AigError::InvalidState(format!(
                        "fanins of node {} are not in canonical order",
                        id
                    )));
                }
                // Gates which lost their fanouts may be stale, the others must be hashed
                if !self.fanouts[*id].is_empty() {
                    match simplify_and(*fanin0, *fanin1) {
                        Simplified::Pair(a, b)
                            if self.strash.get(&(a, b)) == Some(&AigEdge::positive(*id)) =>
                        {
                            Ok(())
                        }
                        _ => Err(AigError::InvalidState(format!(
                            "and gate {} is used but is not structurally hashed",
                            id
                        ))),
                    }
                } else {
                    Ok(())
                }
            }
        }
    }

    fn check_edge_integrity(&self, fanin: &AigEdge) -> Result<()> {
        match self.get_node(fanin.node) {
            None => Err(AigError::InvalidState(format!(
                "edge pointing at node {} which is not in the AIG anymore",
                fanin.node
            ))),
            Some(AigNode::Output { .. }) => Err(AigError::InvalidState(format!(
                "edge pointing at output {}",
                fanin.node
            ))),
            Some(_) => Ok(()),
        }
    }
}
