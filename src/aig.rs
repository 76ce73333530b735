//! Module defining the [`Aig`] struct, as well as [`AigNode`], [`AigEdge`] and some others relevant structs.
//!
//! To start reducing a network functionally, check [`crate::fraig`] docs.

pub mod dfs;
pub mod dot;
pub mod edge;
pub mod error;
mod integrity;
pub mod node;

use std::collections::{HashMap, HashSet};

pub use edge::{AigEdge, FaninId};
pub use error::{AigError, Result};
pub use node::{AigNode, NodeId, NodeKind};

/// Key of the structural hash table: the canonically ordered fanins of an and gate.
type StrashKey = (AigEdge, AigEdge);

/// Outcome of the local simplification rules applied before structural hashing.
enum Simplified {
    /// The conjunction collapses to an existing edge (a constant or one operand).
    Trivial(AigEdge),
    /// The conjunction needs a gate with these canonically ordered fanins.
    Pair(AigEdge, AigEdge),
}

fn simplify_and(a: AigEdge, b: AigEdge) -> Simplified {
    if a == b {
        Simplified::Trivial(a)
    } else if a.is_complement_of(&b) || a.is_const0() || b.is_const0() {
        Simplified::Trivial(AigEdge::new(0, true))
    } else if a.is_const1() {
        Simplified::Trivial(b)
    } else if b.is_const1() {
        Simplified::Trivial(a)
    } else if a < b {
        Simplified::Pair(a, b)
    } else {
        Simplified::Pair(b, a)
    }
}

/// The structural hash key of an and gate, if it is not trivial.
fn strash_key(node: &AigNode) -> Option<StrashKey> {
    match node {
        AigNode::And { fanin0, fanin1, .. } => match simplify_and(*fanin0, *fanin1) {
            Simplified::Pair(fanin0, fanin1) => Some((fanin0, fanin1)),
            Simplified::Trivial(_) => None,
        },
        _ => None,
    }
}

/// Follows a chain of replacements from `edge` until an edge which was not replaced.
fn follow<'a>(mut edge: AigEdge, next: impl Fn(NodeId) -> Option<&'a AigEdge>) -> AigEdge {
    while let Some(replacement) = next(edge.node) {
        edge = replacement.not_cond(edge.complement);
    }
    edge
}

/// Edits of a replacement cascade, staged until every allocation they need has succeeded.
#[derive(Debug, Default)]
struct Rewrite {
    nodes: HashMap<NodeId, AigNode>,
    fanouts: HashMap<NodeId, Vec<NodeId>>,
    /// `None` removes the entry.
    strash: HashMap<StrashKey, Option<AigEdge>>,
    forwards: HashMap<NodeId, AigEdge>,
}

impl Rewrite {
    fn node<'a>(&'a self, aig: &'a Aig, id: NodeId) -> Result<&'a AigNode> {
        match self.nodes.get(&id) {
            Some(node) => Ok(node),
            None => aig.node(id),
        }
    }

    /// The staged fanout list of `id`, copied from the network on first use.
    fn fanouts_mut(&mut self, aig: &Aig, id: NodeId) -> Result<&mut Vec<NodeId>> {
        if !self.fanouts.contains_key(&id) {
            let current = aig.fanouts.get(id).ok_or(AigError::NodeDoesNotExist(id))?;
            let mut copy = Vec::new();
            copy.try_reserve(current.len())?;
            copy.extend_from_slice(current);
            self.fanouts.try_reserve(1)?;
            self.fanouts.insert(id, copy);
        }
        self.fanouts
            .get_mut(&id)
            .ok_or_else(|| AigError::InvalidState(format!("lost staged fanouts of {}", id)))
    }

    fn lookup(&self, aig: &Aig, key: &StrashKey) -> Option<AigEdge> {
        match self.strash.get(key) {
            Some(staged) => *staged,
            None => aig.strash.get(key).copied(),
        }
    }

    fn set_strash(&mut self, key: StrashKey, edge: Option<AigEdge>) -> Result<()> {
        self.strash.try_reserve(1)?;
        self.strash.insert(key, edge);
        Ok(())
    }

    /// Writes the staged edits into `aig`. Nothing is written unless the tables could grow.
    fn apply(self, aig: &mut Aig) -> Result<()> {
        aig.strash.try_reserve(self.strash.len())?;
        aig.forwards.try_reserve(self.forwards.len())?;
        for (id, node) in self.nodes {
            aig.nodes[id] = Some(node);
        }
        for (id, fanouts) in self.fanouts {
            aig.fanouts[id] = fanouts;
        }
        for (key, edge) in self.strash {
            match edge {
                Some(edge) => aig.strash.insert(key, edge),
                None => aig.strash.remove(&key),
            };
        }
        aig.forwards.extend(self.forwards);
        Ok(())
    }
}

/// A whole combinational AIG.
///
/// The network is the sole owner of its nodes: they live in an arena indexed by [`NodeId`],
/// and everything else (edges, fanout lists, the structural hash table, the name table) only
/// refers to them by index. Ids are never reused, so a removed node simply leaves an empty
/// slot behind.
///
/// And gates are created through [`Aig::and`], which canonicalizes the operands and consults
/// the structural hash table so structurally identical gates are never duplicated.
/// Nodes that are not used anymore stay in the network until [`Aig::cleanup`] is called.
///
/// ```rust
/// use fraig::Aig;
/// let mut aig = Aig::new();
/// let p0 = aig.create_pi().unwrap();
/// let p1 = aig.create_pi().unwrap();
/// let n1 = aig.and(p0, p1).unwrap();
/// let n2 = aig.and(p1, p0).unwrap();
/// assert_eq!(n1, n2);
/// assert_eq!(aig.strash_len(), 1);
/// assert_eq!(aig.and(p0, !p0).unwrap(), aig.const0());
/// ```
#[derive(Debug, Clone)]
pub struct Aig {
    nodes: Vec<Option<AigNode>>,
    /// Non-owning back references: `fanouts[id]` lists the consumers of node `id`,
    /// once per fanin edge pointing at it.
    fanouts: Vec<Vec<NodeId>>,
    inputs: Vec<NodeId>,
    outputs: Vec<NodeId>,
    strash: HashMap<StrashKey, AigEdge>,
    /// Replacement of every gate given up by [`Aig::replace`] and not yet cleaned up.
    forwards: HashMap<NodeId, AigEdge>,
    names: HashMap<NodeId, String>,
    ids_by_name: HashMap<String, NodeId>,
    n_ands: usize,
    n_live: usize,
}

impl Default for Aig {
    fn default() -> Self {
        Self::new()
    }
}

impl Aig {
    /// Create a brand new AIG (constant node [`AigNode::True`] included).
    pub fn new() -> Self {
        Aig {
            nodes: vec![Some(AigNode::True)],
            fanouts: vec![Vec::new()],
            inputs: Vec::new(),
            outputs: Vec::new(),
            strash: HashMap::new(),
            forwards: HashMap::new(),
            names: HashMap::new(),
            ids_by_name: HashMap::new(),
            n_ands: 0,
            n_live: 1,
        }
    }

    /// The edge to the constant-1 node.
    pub fn const1(&self) -> AigEdge {
        AigEdge::new(0, false)
    }

    /// The complemented edge to the constant-1 node.
    pub fn const0(&self) -> AigEdge {
        AigEdge::new(0, true)
    }

    /// The constant of the given value. There is a single constant node per network,
    /// this never allocates.
    pub fn constant(&self, value: bool) -> AigEdge {
        AigEdge::new(0, !value)
    }

    /// Retrieves a node from its id.
    pub fn get_node(&self, id: NodeId) -> Option<&AigNode> {
        self.nodes.get(id)?.as_ref()
    }

    fn node(&self, id: NodeId) -> Result<&AigNode> {
        self.get_node(id).ok_or(AigError::NodeDoesNotExist(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut AigNode> {
        self.nodes
            .get_mut(id)
            .and_then(Option::as_mut)
            .ok_or(AigError::NodeDoesNotExist(id))
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.get_node(id).is_some()
    }

    /// Ids allocated so far are all strictly below this bound.
    pub fn id_bound(&self) -> usize {
        self.nodes.len()
    }

    /// Iterates over live nodes in id order.
    pub fn nodes(&self) -> impl Iterator<Item = &AigNode> {
        self.nodes.iter().flatten()
    }

    pub fn kind(&self, id: NodeId) -> Result<NodeKind> {
        Ok(self.node(id)?.kind())
    }

    /// Retrieves inputs id, in creation order.
    pub fn inputs(&self) -> &[NodeId] {
        &self.inputs
    }

    /// Retrieves outputs id, in creation order.
    pub fn outputs(&self) -> &[NodeId] {
        &self.outputs
    }

    /// The edge to the `index`-th primary input.
    pub fn pi(&self, index: usize) -> Option<AigEdge> {
        self.inputs.get(index).map(|&id| AigEdge::positive(id))
    }

    pub fn po(&self, index: usize) -> Option<NodeId> {
        self.outputs.get(index).copied()
    }

    pub fn pi_num(&self) -> usize {
        self.inputs.len()
    }

    pub fn po_num(&self) -> usize {
        self.outputs.len()
    }

    pub fn and_num(&self) -> usize {
        self.n_ands
    }

    /// Number of live nodes (constant, inputs, outputs and and gates).
    pub fn node_num(&self) -> usize {
        self.n_live
    }

    /// Number of entries in the structural hash table.
    pub fn strash_len(&self) -> usize {
        self.strash.len()
    }

    /// Consumers of the given node, one entry per fanin edge pointing at it.
    pub fn fanouts(&self, id: NodeId) -> Result<&[NodeId]> {
        self.node(id)?;
        Ok(&self.fanouts[id])
    }

    pub fn is_const(&self, edge: AigEdge) -> bool {
        edge.node == 0
    }

    /// Combinational input, ie a primary input.
    pub fn is_ci(&self, edge: AigEdge) -> bool {
        matches!(self.get_node(edge.node), Some(AigNode::Input { .. }))
    }

    pub fn is_and(&self, edge: AigEdge) -> bool {
        matches!(self.get_node(edge.node), Some(AigNode::And { .. }))
    }

    /// Returns fanin `fanin_id` of an and gate or an output.
    pub fn child(&self, id: NodeId, fanin_id: FaninId) -> Result<AigEdge> {
        self.node(id)?.get_child(fanin_id)
    }

    pub fn child0(&self, id: NodeId) -> Result<AigEdge> {
        self.child(id, FaninId::Fanin0)
    }

    pub fn child1(&self, id: NodeId) -> Result<AigEdge> {
        self.child(id, FaninId::Fanin1)
    }

    /// The node behind fanin 0, polarity stripped.
    pub fn fanin0(&self, id: NodeId) -> Result<NodeId> {
        Ok(self.child0(id)?.node)
    }

    pub fn fanin1(&self, id: NodeId) -> Result<NodeId> {
        Ok(self.child1(id)?.node)
    }

    /// Whether fanin 0 is complemented.
    pub fn fanin_c0(&self, id: NodeId) -> Result<bool> {
        Ok(self.child0(id)?.complement)
    }

    pub fn fanin_c1(&self, id: NodeId) -> Result<bool> {
        Ok(self.child1(id)?.complement)
    }

    /// Makes sure `edge` can be used as the fanin of a gate.
    fn check_operand(&self, edge: AigEdge) -> Result<()> {
        match self.node(edge.node)? {
            AigNode::Output { id, .. } => Err(AigError::UnexpectedKind {
                id: *id,
                expected: NodeKind::And,
                found: NodeKind::Output,
            }),
            _ => Ok(()),
        }
    }

    /// Allocates a slot for `make(id)`.
    /// Memory is reserved before anything is written, so on error the network is unchanged.
    fn alloc(&mut self, make: impl FnOnce(NodeId) -> AigNode) -> Result<NodeId> {
        self.nodes.try_reserve(1)?;
        self.fanouts.try_reserve(1)?;
        let id = self.nodes.len();
        self.nodes.push(Some(make(id)));
        self.fanouts.push(Vec::new());
        self.n_live += 1;
        Ok(id)
    }

    /// Create a new primary input, appended to the ordered list of inputs.
    pub fn create_pi(&mut self) -> Result<AigEdge> {
        self.inputs.try_reserve(1)?;
        let index = self.inputs.len();
        let id = self.alloc(|id| AigNode::Input { id, index })?;
        self.inputs.push(id);
        Ok(AigEdge::positive(id))
    }

    /// Create a new primary output with no fanin, appended to the ordered list of outputs.
    /// Its fanin must be bound with [`Aig::add_fanin`].
    pub fn create_po(&mut self) -> Result<NodeId> {
        self.outputs.try_reserve(1)?;
        let index = self.outputs.len();
        let id = self.alloc(|id| AigNode::Output {
            id,
            index,
            fanin: None,
        })?;
        self.outputs.push(id);
        Ok(id)
    }

    /// Binds the single fanin of an output. Rebinding is a contract violation.
    pub fn add_fanin(&mut self, po: NodeId, edge: AigEdge) -> Result<()> {
        self.check_operand(edge)?;
        match self.node(po)? {
            AigNode::Output { fanin: Some(_), .. } => return Err(AigError::OutputAlreadyBound(po)),
            AigNode::Output { fanin: None, .. } => (),
            other => {
                return Err(AigError::UnexpectedKind {
                    id: po,
                    expected: NodeKind::Output,
                    found: other.kind(),
                });
            }
        }
        self.fanouts[edge.node].try_reserve(1)?;
        if let AigNode::Output { fanin, .. } = self.node_mut(po)? {
            *fanin = Some(edge);
        }
        self.fanouts[edge.node].push(po);
        Ok(())
    }

    /// Creates an output and binds it to `edge`.
    pub fn add_output(&mut self, edge: AigEdge) -> Result<NodeId> {
        self.check_operand(edge)?;
        let po = self.create_po()?;
        self.add_fanin(po, edge)?;
        Ok(po)
    }

    /// Create a new and gate (or retrieve an existing equivalent edge).
    ///
    /// The operands are put in canonical order, so `and(a, b)` and `and(b, a)` always give the
    /// same edge. Before the table is consulted the usual rules apply: `x & x = x`,
    /// `x & !x = 0`, `x & 0 = 0`, `x & 1 = x`. None of them allocates a node.
    pub fn and(&mut self, a: AigEdge, b: AigEdge) -> Result<AigEdge> {
        self.check_operand(a)?;
        self.check_operand(b)?;

        let (fanin0, fanin1) = match simplify_and(a, b) {
            Simplified::Trivial(edge) => return Ok(edge),
            Simplified::Pair(fanin0, fanin1) => (fanin0, fanin1),
        };
        if let Some(&edge) = self.strash.get(&(fanin0, fanin1)) {
            let edge = self.forwarded(edge);
            log::trace!("strash hit: {} & {} -> {}", fanin0, fanin1, edge);
            return Ok(edge);
        }

        self.strash.try_reserve(1)?;
        self.fanouts[fanin0.node].try_reserve(1)?;
        self.fanouts[fanin1.node].try_reserve(1)?;
        let id = self.alloc(|id| AigNode::and(id, fanin0, fanin1))?;
        self.strash.insert((fanin0, fanin1), AigEdge::positive(id));
        self.fanouts[fanin0.node].push(id);
        self.fanouts[fanin1.node].push(id);
        self.n_ands += 1;
        Ok(AigEdge::positive(id))
    }

    /// `a | b`, built as `!(!a & !b)`.
    pub fn or(&mut self, a: AigEdge, b: AigEdge) -> Result<AigEdge> {
        Ok(!self.and(!a, !b)?)
    }

    /// `a ^ b`, built as `(a & !b) | (!a & b)`.
    pub fn xor(&mut self, a: AigEdge, b: AigEdge) -> Result<AigEdge> {
        let left = self.and(a, !b)?;
        let right = self.and(!a, b)?;
        self.or(left, right)
    }

    /// `if c { t } else { e }`.
    pub fn mux(&mut self, c: AigEdge, t: AigEdge, e: AigEdge) -> Result<AigEdge> {
        let left = self.and(c, t)?;
        let right = self.and(!c, e)?;
        self.or(left, right)
    }

    /// Returns the name of a node, if one was assigned.
    pub fn get_name(&self, id: NodeId) -> Option<&str> {
        self.names.get(&id).map(String::as_str)
    }

    /// Returns the name of a node, assigning a fresh default one first if needed
    /// (`pi<k>` for inputs, `po<k>` for outputs, `n<id>` otherwise).
    pub fn name(&mut self, id: NodeId) -> Result<&str> {
        if !self.names.contains_key(&id) {
            let base = match self.node(id)? {
                AigNode::True => "const1".to_string(),
                AigNode::Input { index, .. } => format!("pi{}", index),
                AigNode::Output { index, .. } => format!("po{}", index),
                AigNode::And { id, .. } => format!("n{}", id),
            };
            let mut name = base.clone();
            let mut suffix = 1;
            while self.ids_by_name.contains_key(&name) {
                name = format!("{}_{}", base, suffix);
                suffix += 1;
            }
            self.assign_name(id, &name)?;
        }
        self.names
            .get(&id)
            .map(String::as_str)
            .ok_or_else(|| AigError::InvalidState(format!("node {} lost its name", id)))
    }

    /// Assigns a name to a node, replacing its previous one.
    /// Names are unique within a network.
    pub fn assign_name(&mut self, id: NodeId, name: &str) -> Result<()> {
        self.node(id)?;
        match self.ids_by_name.get(name) {
            Some(&owner) if owner == id => return Ok(()),
            Some(&owner) => {
                return Err(AigError::DuplicateName {
                    name: name.to_string(),
                    owner,
                });
            }
            None => (),
        }
        self.names.try_reserve(1)?;
        self.ids_by_name.try_reserve(1)?;
        if let Some(old) = self.names.insert(id, name.to_string()) {
            self.ids_by_name.remove(&old);
        }
        self.ids_by_name.insert(name.to_string(), id);
        Ok(())
    }

    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        self.ids_by_name.get(name).copied()
    }

    fn remove_fanout(&mut self, id: NodeId, fanout: NodeId) {
        if let Some(fanouts) = self.fanouts.get_mut(id) {
            if let Some(pos) = fanouts.iter().position(|&f| f == fanout) {
                fanouts.swap_remove(pos);
            }
        }
    }

    /// Returns true if `target` is in the transitive fanout of `root` (or is `root`).
    fn reaches(&self, root: NodeId, target: NodeId) -> bool {
        let mut stack = vec![root];
        let mut seen = HashSet::from([root]);
        while let Some(id) = stack.pop() {
            if id == target {
                return true;
            }
            for &fanout in &self.fanouts[id] {
                if seen.insert(fanout) {
                    stack.push(fanout);
                }
            }
        }
        false
    }

    /// Follows the replacements recorded by [`Aig::replace`], composing polarities.
    fn forwarded(&self, edge: AigEdge) -> AigEdge {
        follow(edge, |id| self.forwards.get(&id))
    }

    /// Returns true if `target` is in the transitive fanout of `root` (or is `root`),
    /// staged fanout lists taking precedence.
    fn reaches_staged(&self, rewrite: &Rewrite, root: NodeId, target: NodeId) -> bool {
        let mut stack = vec![root];
        let mut seen = HashSet::from([root]);
        while let Some(id) = stack.pop() {
            if id == target {
                return true;
            }
            let fanouts = rewrite.fanouts.get(&id).unwrap_or(&self.fanouts[id]);
            for &fanout in fanouts {
                if seen.insert(fanout) {
                    stack.push(fanout);
                }
            }
        }
        false
    }

    /// Replace an and gate by an existing edge: every consumer of `old` is rewired to `new`
    /// (with polarities composed).
    ///
    /// Rewired and gates are hashed again. If one of them becomes trivial or structurally
    /// identical to an existing gate, it is itself replaced, and so on. `old` and the gates
    /// replaced on the way lose all their fanouts and are left for [`Aig::cleanup`]; every
    /// structural hash entry leading to them now leads to their replacement.
    ///
    /// The whole cascade is computed before the network is touched, so on error (out of
    /// memory included) the network is left as it was.
    ///
    /// The caller is responsible for `new` computing the same function as `old`
    /// (this is what the FRAIG manager proves before merging).
    ///
    /// Returns every replacement performed, `(old, new)` first.
    pub fn replace(&mut self, old: NodeId, new: AigEdge) -> Result<Vec<(NodeId, AigEdge)>> {
        match self.node(old)? {
            AigNode::And { .. } => (),
            other => {
                return Err(AigError::UnexpectedKind {
                    id: old,
                    expected: NodeKind::And,
                    found: other.kind(),
                });
            }
        }
        self.check_operand(new)?;
        let new = self.forwarded(new);
        if new == AigEdge::positive(old) {
            return Ok(Vec::new());
        }
        if self.reaches(old, new.node) {
            return Err(AigError::WouldCreateCycle {
                old,
                new: new.node,
            });
        }

        let mut rewrite = Rewrite::default();
        let mut replaced = Vec::new();
        let mut worklist = vec![(old, new)];
        while let Some((old, new)) = worklist.pop() {
            if rewrite.forwards.contains_key(&old) {
                continue;
            }
            log::debug!("replacing {} by {}", old, new);
            replaced.try_reserve(1)?;
            replaced.push((old, new));
            rewrite.forwards.try_reserve(1)?;
            rewrite.forwards.insert(old, new);
            if let Some(key) = strash_key(rewrite.node(self, old)?) {
                if rewrite.lookup(self, &key).is_none_or(|edge| edge.node == old) {
                    rewrite.set_strash(key, Some(new))?;
                }
            }

            let mut consumers = std::mem::take(rewrite.fanouts_mut(self, old)?);
            consumers.sort_unstable();
            consumers.dedup();
            for consumer in consumers {
                let previous = rewrite.node(self, consumer)?.clone();
                let occurrences = previous
                    .get_fanins()
                    .iter()
                    .filter(|fanin| fanin.node == old)
                    .count();
                let mut rewired = previous.clone();
                rewired.redirect_fanin(old, new);
                let fanouts = rewrite.fanouts_mut(self, new.node)?;
                fanouts.try_reserve(occurrences)?;
                fanouts.extend(std::iter::repeat_n(consumer, occurrences));

                if let Some(key) = strash_key(&previous) {
                    if rewrite.lookup(self, &key) == Some(AigEdge::positive(consumer)) {
                        rewrite.set_strash(key, None)?;
                    }
                }
                rewrite.nodes.try_reserve(1)?;
                rewrite.nodes.insert(consumer, rewired.clone());

                // Gates already replaced only follow their fanins
                if rewrite.forwards.contains_key(&consumer)
                    || self.forwards.contains_key(&consumer)
                {
                    continue;
                }
                if let AigNode::And { fanin0, fanin1, .. } = rewired {
                    match simplify_and(fanin0, fanin1) {
                        Simplified::Trivial(edge) => {
                            worklist.try_reserve(1)?;
                            worklist.push((consumer, edge));
                        }
                        Simplified::Pair(fanin0, fanin1) => {
                            let key = (fanin0, fanin1);
                            let hit = rewrite.lookup(self, &key);
                            let existing = hit.map(|edge| {
                                follow(edge, |id| {
                                    rewrite.forwards.get(&id).or_else(|| self.forwards.get(&id))
                                })
                            });
                            match existing {
                                Some(existing)
                                    if existing.node != consumer
                                        && (hit == Some(existing)
                                            || !self.reaches_staged(
                                                &rewrite,
                                                consumer,
                                                existing.node,
                                            )) =>
                                {
                                    worklist.try_reserve(1)?;
                                    worklist.push((consumer, existing));
                                }
                                Some(existing) if existing.node == consumer => (),
                                _ => rewrite.set_strash(key, Some(AigEdge::positive(consumer)))?,
                            }
                        }
                    }
                }
            }
        }

        rewrite.apply(self)?;
        Ok(replaced)
    }

    /// Deletes a node which nobody uses anymore.
    fn remove_node(&mut self, id: NodeId) {
        if let Some(node) = self.nodes[id].take() {
            for fanin in node.get_fanins() {
                self.remove_fanout(fanin.node, id);
            }
            if let Some(name) = self.names.remove(&id) {
                self.ids_by_name.remove(&name);
            }
            if node.is_and() {
                self.n_ands -= 1;
            }
            self.n_live -= 1;
        }
    }

    /// Removes all and gates which are not reachable from an output.
    /// Inputs, outputs and the constant are never removed. Returns the number of removed nodes.
    ///
    /// This is a single mark and sweep pass, so calling it twice in a row is the same as
    /// calling it once.
    pub fn cleanup(&mut self) -> usize {
        self.cleanup_keeping(&[])
    }

    /// Same as [`Aig::cleanup`], but the cones of `roots` are also kept alive.
    pub fn cleanup_keeping(&mut self, roots: &[NodeId]) -> usize {
        let mut marked = vec![false; self.nodes.len()];
        let mut stack: Vec<NodeId> = self
            .outputs
            .iter()
            .chain(roots.iter())
            .copied()
            .filter(|&id| self.contains(id))
            .collect();
        for &id in &stack {
            marked[id] = true;
        }
        while let Some(id) = stack.pop() {
            if let Some(node) = self.get_node(id) {
                for fanin in node.get_fanins() {
                    if !marked[fanin.node] {
                        marked[fanin.node] = true;
                        stack.push(fanin.node);
                    }
                }
            }
        }

        let dead: Vec<NodeId> = self
            .nodes
            .iter()
            .enumerate()
            .filter_map(|(id, node)| match node {
                Some(AigNode::And { .. }) if !marked[id] => Some(id),
                _ => None,
            })
            .collect();
        for &id in &dead {
            self.remove_node(id);
        }

        // Hash entries and replacements lead to live nodes only
        let alive = |id: NodeId| self.contains(id);
        let strash: HashMap<StrashKey, AigEdge> = self
            .strash
            .iter()
            .map(|(&key, &edge)| (key, self.forwarded(edge)))
            .filter(|((a, b), edge)| alive(a.node) && alive(b.node) && alive(edge.node))
            .collect();
        let forwards: HashMap<NodeId, AigEdge> = self
            .forwards
            .iter()
            .filter(|&(&id, _)| alive(id))
            .map(|(&id, &edge)| (id, self.forwarded(edge)))
            .filter(|(_, edge)| alive(edge.node))
            .collect();
        self.strash = strash;
        self.forwards = forwards;

        if !dead.is_empty() {
            log::debug!("cleanup removed {} nodes", dead.len());
        }
        dead.len()
    }
}
