//! Provides a DFS visitor to allow simple AIG traversal, and topological orders.
//!
//! See [`Dfs`] for details.

use std::collections::HashSet;

use crate::{Aig, AigError, NodeId, Result};

/// A simple DFS visitor over node ids.
///
/// Nodes are yielded in preorder. You can:
/// - start a DFS from a node using [`from_node`]
/// - or visit all the AIG reachable from the outputs using [`from_outputs`].
///
/// In the latter case, it will start by the fanin of the first output,
/// then explore all non-previously-explored nodes from the fanin of the second output,
/// and so on until all the outputs have been processed.
///
/// [`from_node`]: Dfs::from_node
/// [`from_outputs`]: Dfs::from_outputs
///
/// ```rust
/// use fraig::{Aig, dfs::Dfs};
/// let mut aig = Aig::new();
/// let a = aig.create_pi().unwrap();
/// let b = aig.create_pi().unwrap();
/// let n = aig.and(a, b).unwrap();
/// aig.add_output(n).unwrap();
/// let mut dfs = Dfs::from_outputs(&aig);
/// let mut count = 0;
/// while let Some(_id) = dfs.next(&aig) {
///     // The visitor does not borrow the aig, so it may be mutated here
///     count += 1;
/// }
/// assert_eq!(count, 4);
/// ```
pub struct Dfs {
    /// Must maintain the following invariant:
    /// - all nodes on the stack have not been visited yet
    /// - their `seen` flag is set to true to avoid adding them one more time to the stack
    /// - the different roots from which to start a DFS are in starts
    ///   (they might have been visited already by the time we start the DFS from them,
    ///   and will simply be discarded if that's the case).
    stack: Vec<NodeId>,
    seen: HashSet<NodeId>,
    starts: Vec<NodeId>,
}

impl Dfs {
    /// Create a DFS from the initial start node.
    /// You will only browse the fanin cone of this node.
    pub fn from_node(start: NodeId) -> Self {
        Dfs {
            stack: vec![start],
            seen: HashSet::from([start]),
            starts: Vec::new(),
        }
    }

    /// Create a DFS browsing the fanin cones of several roots, first root first.
    pub fn from_roots(roots: &[NodeId]) -> Self {
        let mut starts: Vec<NodeId> = roots.iter().rev().copied().collect();
        match starts.pop() {
            Some(start) => Dfs {
                stack: vec![start],
                seen: HashSet::from([start]),
                starts,
            },
            None => Dfs {
                stack: Vec::new(),
                seen: HashSet::new(),
                starts,
            },
        }
    }

    /// Create a DFS from the outputs of the given AIG.
    pub fn from_outputs(aig: &Aig) -> Self {
        Dfs::from_roots(aig.outputs())
    }

    /// Returns true if we are ready to start again! Else false, we are done.
    /// Should only be called when stack is empty (ie we are done with the current fanin).
    fn new_start(&mut self) -> bool {
        debug_assert!(self.stack.is_empty());

        while let Some(id) = self.starts.pop() {
            if self.seen.insert(id) {
                self.stack.push(id);
                return true;
            }
        }
        false
    }

    /// Yield the next node of the DFS, or None if it is done.
    /// Ids which are not in the aig (anymore) are skipped.
    pub fn next(&mut self, aig: &Aig) -> Option<NodeId> {
        loop {
            while let Some(id) = self.stack.pop() {
                let Some(node) = aig.get_node(id) else {
                    continue;
                };
                for child in node.get_fanins() {
                    if self.seen.insert(child.node) {
                        self.stack.push(child.node);
                    }
                }
                return Some(id);
            }

            // Maybe we can start from a different root?
            if !self.new_start() {
                return None;
            }
        }
    }
}

impl Aig {
    /// Post order from the given roots: every node comes after its fanins.
    /// Errors if a cycle is found.
    pub fn topological_order(&self, roots: &[NodeId]) -> Result<Vec<NodeId>> {
        let mut sort = Vec::new();
        let mut seen = HashSet::new();
        let mut done = HashSet::new();

        for &root in roots {
            let mut stack: Vec<(NodeId, bool)> = vec![(root, false)];
            while let Some((id, last_time)) = stack.pop() {
                // Post order
                if last_time {
                    done.insert(id);
                    sort.push(id);
                    continue;
                }

                if done.contains(&id) {
                    continue;
                } else if !seen.insert(id) {
                    // Seen but not done: the node is on the current path
                    return Err(AigError::InvalidState(format!(
                        "found a cycle through node {}",
                        id
                    )));
                }

                let node = self
                    .get_node(id)
                    .ok_or(AigError::NodeDoesNotExist(id))?;
                stack.push((id, true));
                for fanin in node.get_fanins() {
                    if !done.contains(&fanin.node) {
                        stack.push((fanin.node, false));
                    }
                }
            }
        }
        Ok(sort)
    }

    /// Returns a topological sort of all live nodes, will error if a cycle is detected.
    pub fn topological_sort(&self) -> Result<Vec<NodeId>> {
        let ids: Vec<NodeId> = self.nodes().map(|node| node.get_id()).collect();
        self.topological_order(&ids)
    }
}
