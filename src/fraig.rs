//! Functionally reduced AIGs.
//!
//! A [`FraigManager`] owns an [`Aig`] and reduces it while it is built: every new and gate
//! is simulated, compared with the representatives sharing its signature, and merged into
//! the first one proved equal by the [`EquivalenceOracle`]. Nodes whose comparison ran out
//! of budget are never merged, they stay their own representative (or join a choice group
//! when choicing is on) and can be retried later with [`FraigManager::retry_unresolved`].
//!
//! ```rust
//! use fraig::{FraigManager, FraigParams};
//!
//! let mut fraig = FraigManager::new(FraigParams::full());
//! let a = fraig.create_pi().unwrap();
//! let b = fraig.create_pi().unwrap();
//! let c = fraig.create_pi().unwrap();
//! // (a & b) & c versus a & (b & c)
//! let ab = fraig.and(a, b).unwrap();
//! let left = fraig.and(ab, c).unwrap();
//! let bc = fraig.and(b, c).unwrap();
//! let right = fraig.and(a, bc).unwrap();
//! assert_eq!(left, right);
//! ```

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::{
    Aig, AigEdge, AigError, AigNode, FraigParams, NodeId, Result,
    dot::GraphvizStyle,
    oracle::{ClauseCheck, Equivalence, EquivalenceOracle, SatOracle},
    sat::Budget,
    sim::Simulator,
};

/// Where a node of a [`FraigManager`] stands in the reduction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    /// The last comparison of the node was inconclusive. It is its own representative
    /// until a retry decides.
    Unresolved,
    /// The node represents its class.
    Representative,
    /// The node was proved equal to `into` and its consumers now use `into`.
    Merged { into: AigEdge },
    /// The node is possibly equal to `of` and was kept aside in the choice group of `of`.
    /// It is still its own representative.
    ChoiceMember { of: AigEdge },
}

/// Counters of a [`FraigManager`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FraigStats {
    /// And gates created (merged ones included).
    pub nodes_created: usize,
    /// Oracle calls.
    pub sat_calls: u64,
    /// Oracle calls which ran out of budget.
    pub sat_failures: u64,
    /// Pairs proved equal.
    pub proofs: usize,
    /// Pairs proved different.
    pub disproofs: usize,
    /// Nodes merged, cascaded merges included.
    pub merges: usize,
    /// Nodes recorded in a choice group.
    pub choices: usize,
    /// Dynamic patterns written in the simulation.
    pub patterns_fed: usize,
}

/// An AIG reduced on the fly.
///
/// Handles returned by the manager are always representatives. Handles obtained before a
/// merge stay valid: every operation resolves its operands first.
#[derive(Debug)]
pub struct FraigManager<O: EquivalenceOracle = SatOracle> {
    aig: Aig,
    params: FraigParams,
    oracle: O,
    sim: Simulator,
    /// Indexed by node id.
    states: Vec<NodeState>,
    /// Representative and unresolved nodes by canonical signature, oldest first.
    buckets: HashMap<Vec<u64>, Vec<NodeId>>,
    /// Choice groups by representative.
    choices: HashMap<NodeId, Vec<NodeId>>,
    /// Inconclusive comparisons, to retry.
    pending: Vec<(NodeId, AigEdge)>,
    stats: FraigStats,
}

impl FraigManager<SatOracle> {
    /// A manager checking equivalences with the default [`SatOracle`].
    pub fn new(params: FraigParams) -> Self {
        FraigManager::with_oracle(params, SatOracle::default())
    }
}

impl<O: EquivalenceOracle> FraigManager<O> {
    pub fn with_oracle(params: FraigParams, oracle: O) -> Self {
        let aig = Aig::new();
        let sim = Simulator::from_params(&params);
        let mut buckets = HashMap::new();
        if let Some((key, _)) = sim.canonical(0) {
            buckets.insert(key, vec![0]);
        }
        FraigManager {
            aig,
            params,
            oracle,
            sim,
            states: vec![NodeState::Representative],
            buckets,
            choices: HashMap::new(),
            pending: Vec::new(),
            stats: FraigStats::default(),
        }
    }

    pub fn aig(&self) -> &Aig {
        &self.aig
    }

    pub fn into_aig(self) -> Aig {
        self.aig
    }

    pub fn params(&self) -> &FraigParams {
        &self.params
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    /// The oracle, to tune it between two comparisons.
    pub fn oracle_mut(&mut self) -> &mut O {
        &mut self.oracle
    }

    pub fn simulator(&self) -> &Simulator {
        &self.sim
    }

    pub fn const1(&self) -> AigEdge {
        self.aig.const1()
    }

    pub fn const0(&self) -> AigEdge {
        self.aig.const0()
    }

    pub fn constant(&self, value: bool) -> AigEdge {
        self.aig.constant(value)
    }

    /// Creates a new input. Inputs are always representatives.
    pub fn create_pi(&mut self) -> Result<AigEdge> {
        self.states.try_reserve(1)?;
        let edge = self.aig.create_pi()?;
        let id = edge.get_node_id();
        self.sim.simulate_input(id)?;
        self.set_state(id, NodeState::Representative)?;
        self.bucket_insert(id)?;
        Ok(edge)
    }

    /// The `i`-th input, creating the missing ones.
    pub fn ith_var(&mut self, i: usize) -> Result<AigEdge> {
        while self.aig.pi_num() <= i {
            self.create_pi()?;
        }
        self.aig
            .pi(i)
            .ok_or_else(|| AigError::InvalidState(format!("input {} was just created", i)))
    }

    pub fn input_num(&self) -> usize {
        self.aig.pi_num()
    }

    pub fn is_var(&self, edge: AigEdge) -> bool {
        self.aig.is_ci(edge)
    }

    pub fn is_const(&self, edge: AigEdge) -> bool {
        self.aig.is_const(edge)
    }

    /// First child of an and gate or only child of an output.
    pub fn read_one(&self, id: NodeId) -> Result<AigEdge> {
        self.aig.child0(id)
    }

    /// Second child of an and gate.
    pub fn read_two(&self, id: NodeId) -> Result<AigEdge> {
        self.aig.child1(id)
    }

    pub fn state(&self, id: NodeId) -> Option<NodeState> {
        self.states.get(id).copied()
    }

    /// The representative of the class of `edge`, with the polarity of `edge` folded in.
    /// Resolving a representative is the identity.
    pub fn read_representative_of(&self, edge: AigEdge) -> AigEdge {
        let mut edge = edge;
        while let Some(NodeState::Merged { into }) = self.state(edge.get_node_id()) {
            edge = into.not_cond(edge.is_complemented());
        }
        edge
    }

    /// Builds `a & b` and reduces it.
    pub fn and(&mut self, a: AigEdge, b: AigEdge) -> Result<AigEdge> {
        let a = self.read_representative_of(a);
        let b = self.read_representative_of(b);
        let bound = self.aig.id_bound();
        self.states.try_reserve(1)?;
        let edge = self.aig.and(a, b)?;
        let id = edge.get_node_id();
        if id < bound {
            // Simplified away, or hashed to an existing gate
            return Ok(self.read_representative_of(edge));
        }

        self.sim.simulate_node(&self.aig, id)?;
        self.set_state(id, NodeState::Unresolved)?;
        self.stats.nodes_created += 1;
        if self.params.progress && self.stats.nodes_created % 1000 == 0 {
            log::info!(
                "fraig: {} nodes created, {} merged, {} SAT calls",
                self.stats.nodes_created,
                self.stats.merges,
                self.oracle.calls()
            );
        }
        self.classify(id)
    }

    pub fn or(&mut self, a: AigEdge, b: AigEdge) -> Result<AigEdge> {
        Ok(!self.and(!a, !b)?)
    }

    pub fn xor(&mut self, a: AigEdge, b: AigEdge) -> Result<AigEdge> {
        let left = self.and(a, !b)?;
        let right = self.and(!a, b)?;
        self.or(left, right)
    }

    /// `c ? t : e`
    pub fn mux(&mut self, c: AigEdge, t: AigEdge, e: AigEdge) -> Result<AigEdge> {
        let then = self.and(c, t)?;
        let otherwise = self.and(!c, e)?;
        self.or(then, otherwise)
    }

    /// Creates an output driven by the representative of `edge`.
    pub fn add_output(&mut self, edge: AigEdge) -> Result<NodeId> {
        let edge = self.read_representative_of(edge);
        let bound = self.aig.id_bound();
        self.states.try_reserve(1)?;
        let po = self.aig.add_output(edge)?;
        if po >= bound {
            self.set_state(po, NodeState::Representative)?;
        }
        Ok(po)
    }

    /// Decides whether `a` and `b` are equal, simulation first. A disproof by simulation
    /// carries the distinguishing pattern read off the signatures.
    ///
    /// `time_limit` bounds this query only, instead of the time limit of the parameters.
    pub fn nodes_are_equal(
        &mut self,
        a: AigEdge,
        b: AigEdge,
        conflict_limit: Option<u64>,
        time_limit: Option<Duration>,
    ) -> Result<Equivalence> {
        let a = self.read_representative_of(a);
        let b = self.read_representative_of(b);
        if a == b {
            return Ok(Equivalence::Equal);
        }
        if let Some(pattern) = self.sim.distinguishing_pattern(&self.aig, a, b) {
            return Ok(Equivalence::NotEqual(pattern));
        }
        let budget = self.budget(conflict_limit, time_limit);
        let verdict = self.oracle.check_equivalence(&self.aig, a, b, &budget)?;
        self.count(&verdict);
        if let Equivalence::NotEqual(cex) = &verdict {
            self.feed(cex)?;
        }
        Ok(verdict)
    }

    /// Tries to prove `edge` constant 0, within the proof conflict limit.
    pub fn prove_constant(&mut self, edge: AigEdge) -> Result<Equivalence> {
        let zero = self.aig.const0();
        self.nodes_are_equal(
            edge,
            zero,
            self.params.proof_conflict_limit,
            self.params.time_limit,
        )
    }

    /// Whether `a | b` holds on every simulation pattern. A `true` answer is only a hint.
    pub fn check_clause_using_sim(&self, a: AigEdge, b: AigEdge) -> bool {
        let a = self.read_representative_of(a);
        let b = self.read_representative_of(b);
        self.sim.check_clause(a, b)
    }

    /// Decides whether `a | b` always holds. A violation is fed back to the simulation.
    pub fn check_clause_using_sat(
        &mut self,
        a: AigEdge,
        b: AigEdge,
        conflict_limit: Option<u64>,
    ) -> Result<ClauseCheck> {
        let a = self.read_representative_of(a);
        let b = self.read_representative_of(b);
        let budget = self.budget(conflict_limit, self.params.time_limit);
        let verdict = self.oracle.check_clause(&self.aig, &[a, b], &budget)?;
        match &verdict {
            ClauseCheck::Holds => log::debug!("clause {} | {} holds", a, b),
            ClauseCheck::Violated(cex) => {
                log::debug!("clause {} | {} violated", a, b);
                self.feed(cex)?;
            }
            ClauseCheck::Unknown => log::debug!("clause {} | {} unknown", a, b),
        }
        Ok(verdict)
    }

    /// Monotonic count of oracle calls which ran out of budget.
    pub fn failed_proofs(&self) -> u64 {
        self.oracle.failed_proofs()
    }

    /// Number of nodes whose comparison is still inconclusive.
    pub fn unresolved_num(&self) -> usize {
        self.pending.len()
    }

    /// Retries the inconclusive comparisons with another conflict limit, merging the pairs
    /// proved equal. Returns the number of nodes merged, cascades included.
    pub fn retry_unresolved(&mut self, conflict_limit: Option<u64>) -> Result<usize> {
        let pending = std::mem::take(&mut self.pending);
        let merges_before = self.stats.merges;
        for (id, target) in pending {
            let Some(state) = self.state(id) else {
                continue;
            };
            if !self.aig.contains(id) || matches!(state, NodeState::Merged { .. }) {
                continue;
            }
            let target = self.read_representative_of(target);
            if target.get_node_id() == id || !self.aig.contains(target.get_node_id()) {
                continue;
            }

            let budget = self.budget(conflict_limit, self.params.time_limit);
            let verdict =
                self.oracle
                    .check_equivalence(&self.aig, AigEdge::positive(id), target, &budget)?;
            self.count(&verdict);
            match verdict {
                Equivalence::Equal => match self.merge(id, target) {
                    Ok(()) => (),
                    Err(AigError::WouldCreateCycle { .. }) => {
                        log::debug!("cannot merge {} into {} without a cycle", id, target);
                        self.pending.try_reserve(1)?;
                        self.pending.push((id, target));
                    }
                    Err(e) => return Err(e),
                },
                Equivalence::NotEqual(cex) => {
                    self.leave_choice_group(id, state);
                    if !matches!(state, NodeState::Unresolved) {
                        self.bucket_insert(id)?;
                    }
                    self.set_state(id, NodeState::Representative)?;
                    self.feed(&cex)?;
                }
                Equivalence::Unknown => {
                    self.pending.try_reserve(1)?;
                    self.pending.push((id, target));
                }
            }
        }
        Ok(self.stats.merges - merges_before)
    }

    /// Members of the choice group of `id`, empty if it has none.
    pub fn choices_of(&self, id: NodeId) -> &[NodeId] {
        self.choices.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Removes the nodes unreachable from the outputs, except choice groups.
    /// Returns the number of nodes removed.
    pub fn cleanup(&mut self) -> usize {
        let roots: Vec<NodeId> = self
            .choices
            .iter()
            .filter(|(_, members)| !members.is_empty())
            .flat_map(|(rep, members)| std::iter::once(*rep).chain(members.iter().copied()))
            .collect();
        let removed = self.aig.cleanup_keeping(&roots);
        if removed > 0 {
            let aig = &self.aig;
            for ids in self.buckets.values_mut() {
                ids.retain(|id| aig.contains(*id));
            }
            self.buckets.retain(|_, ids| !ids.is_empty());
            self.pending.retain(|(id, _)| aig.contains(*id));
            self.choices
                .retain(|rep, members| !members.is_empty() && aig.contains(*rep));
            log::debug!("fraig cleanup removed {} nodes", removed);
        }
        removed
    }

    pub fn stats(&self) -> FraigStats {
        FraigStats {
            sat_calls: self.oracle.calls(),
            sat_failures: self.oracle.failed_proofs(),
            patterns_fed: self.sim.patterns_fed(),
            ..self.stats
        }
    }

    /// Logs the statistics at the `info` level.
    pub fn print_stats(&self) {
        let stats = self.stats();
        log::info!(
            "fraig: {} inputs, {} ands, {} created, {} merged, {} choices",
            self.aig.pi_num(),
            self.aig.and_num(),
            stats.nodes_created,
            stats.merges,
            stats.choices
        );
        log::info!(
            "fraig: {} SAT calls ({} proofs, {} disproofs, {} failed), {} patterns fed",
            stats.sat_calls,
            stats.proofs,
            stats.disproofs,
            stats.sat_failures,
            stats.patterns_fed
        );
    }

    /// DOT representation of the network, choice groups included as dashed links.
    pub fn to_dot(&self, graphviz_style: GraphvizStyle) -> String {
        let mut roots = Vec::new();
        let mut links = Vec::new();
        for (&rep, members) in &self.choices {
            for &member in members {
                if self.aig.contains(member) && self.aig.contains(rep) {
                    roots.push(member);
                    links.push((member, rep));
                }
            }
        }
        roots.sort_unstable();
        links.sort_unstable();
        self.aig.to_dot_with_links(graphviz_style, &roots, &links)
    }

    fn set_state(&mut self, id: NodeId, state: NodeState) -> Result<()> {
        if id >= self.states.len() {
            self.states.try_reserve(id + 1 - self.states.len())?;
            self.states.resize(id + 1, NodeState::Unresolved);
        }
        self.states[id] = state;
        Ok(())
    }

    fn budget(&self, conflict_limit: Option<u64>, time_limit: Option<Duration>) -> Budget {
        Budget {
            conflicts: conflict_limit,
            inspections: self.params.inspection_limit,
            deadline: time_limit.map(|limit| Instant::now() + limit),
        }
    }

    fn count(&mut self, verdict: &Equivalence) {
        match verdict {
            Equivalence::Equal => self.stats.proofs += 1,
            Equivalence::NotEqual(_) => self.stats.disproofs += 1,
            Equivalence::Unknown => (),
        }
    }

    fn bucket_insert(&mut self, id: NodeId) -> Result<()> {
        let (key, _) = self
            .sim
            .canonical(id)
            .ok_or_else(|| AigError::InvalidState(format!("node {} was not simulated", id)))?;
        let ids = self.buckets.entry(key).or_default();
        ids.try_reserve(1)?;
        ids.push(id);
        Ok(())
    }

    fn bucket_remove(&mut self, id: NodeId) {
        if let Some((key, _)) = self.sim.canonical(id) {
            if let Some(ids) = self.buckets.get_mut(&key) {
                ids.retain(|&other| other != id);
                if ids.is_empty() {
                    self.buckets.remove(&key);
                }
            }
        }
    }

    /// Signatures changed: sorts every bucketed node again, keeping ids ascending.
    fn rebucket(&mut self) -> Result<()> {
        let mut ids: Vec<NodeId> = self.buckets.drain().flat_map(|(_, ids)| ids).collect();
        ids.sort_unstable();
        for id in ids {
            self.bucket_insert(id)?;
        }
        Ok(())
    }

    /// Writes a counterexample in the simulation, if feedback is on.
    fn feed(&mut self, pattern: &[bool]) -> Result<()> {
        if !self.params.feedback {
            return Ok(());
        }
        let written = self.sim.add_pattern(&self.aig, pattern)?;
        if written > 0 {
            log::trace!("{} patterns fed to the simulation", written);
            self.rebucket()?;
        }
        Ok(())
    }

    fn leave_choice_group(&mut self, id: NodeId, state: NodeState) {
        if let NodeState::ChoiceMember { of } = state {
            if let Some(members) = self.choices.get_mut(&of.get_node_id()) {
                members.retain(|&member| member != id);
            }
        }
    }

    /// Rewires the consumers of `id` to `target`, along with every merge it cascades to.
    fn merge(&mut self, id: NodeId, target: AigEdge) -> Result<()> {
        let state = self.state(id).unwrap_or(NodeState::Unresolved);
        let replaced = self.aig.replace(id, target)?;
        for (old, new) in replaced {
            log::debug!("merged {} into {}", old, new);
            let old_state = if old == id {
                state
            } else {
                self.state(old).unwrap_or(NodeState::Unresolved)
            };
            if !matches!(old_state, NodeState::ChoiceMember { .. }) {
                self.bucket_remove(old);
            }
            if old != id || !self.params.choicing {
                self.leave_choice_group(old, old_state);
            }
            // A merged representative hands its choice group over
            if let Some(members) = self.choices.remove(&old) {
                let group = self.choices.entry(new.get_node_id()).or_default();
                group.try_reserve(members.len())?;
                group.extend(members);
            }
            self.set_state(old, NodeState::Merged { into: new })?;
            self.stats.merges += 1;
        }
        if self.params.choicing {
            self.add_choice(target.get_node_id(), id)?;
        }
        Ok(())
    }

    fn add_choice(&mut self, rep: NodeId, member: NodeId) -> Result<()> {
        let group = self.choices.entry(rep).or_default();
        if !group.contains(&member) {
            group.try_reserve(1)?;
            group.push(member);
            self.stats.choices += 1;
        }
        Ok(())
    }

    /// Finds the class of a new gate, merging it when it is proved equal to a
    /// representative. Returns its representative edge.
    fn classify(&mut self, id: NodeId) -> Result<AigEdge> {
        let node = AigEdge::positive(id);
        if !self.params.functional_reduction {
            self.set_state(id, NodeState::Representative)?;
            return Ok(node);
        }

        let mut tried: Vec<NodeId> = Vec::new();
        let mut inconclusive = None;
        loop {
            let (key, phase) = self
                .sim
                .canonical(id)
                .ok_or_else(|| AigError::InvalidState(format!("node {} was not simulated", id)))?;
            let candidate = self.buckets.get(&key).and_then(|ids| {
                ids.iter()
                    .copied()
                    .find(|rep| !tried.contains(rep) && self.aig.contains(*rep))
            });
            let Some(rep) = candidate else {
                break;
            };
            if self.params.sparse && !tried.is_empty() {
                break;
            }
            tried.push(rep);

            let rep_phase = self.sim.phase(rep).unwrap_or(false);
            let target = AigEdge::new(rep, phase != rep_phase);
            let budget = self.budget(self.params.conflict_limit, self.params.time_limit);
            let verdict = self.oracle.check_equivalence(&self.aig, node, target, &budget)?;
            self.count(&verdict);
            match verdict {
                Equivalence::Equal => {
                    self.merge(id, target)?;
                    return Ok(target);
                }
                Equivalence::NotEqual(cex) => self.feed(&cex)?,
                Equivalence::Unknown if self.params.choicing => {
                    log::debug!("{} joins the choice group of {}", id, target);
                    self.set_state(id, NodeState::ChoiceMember { of: target })?;
                    self.add_choice(rep, id)?;
                    self.pending.try_reserve(1)?;
                    self.pending.push((id, target));
                    return Ok(node);
                }
                Equivalence::Unknown => inconclusive = Some(target),
            }
        }

        match inconclusive {
            Some(target) => {
                self.set_state(id, NodeState::Unresolved)?;
                self.pending.try_reserve(1)?;
                self.pending.push((id, target));
            }
            None => self.set_state(id, NodeState::Representative)?,
        }
        self.bucket_insert(id)?;
        Ok(node)
    }
}

/// Outcome of [`fraig_network`].
#[derive(Debug)]
pub struct FraigResult {
    /// The reduced network, without dangling nodes.
    pub aig: Aig,
    /// Edge of the reduced network computing each node of the input network.
    /// Nodes whose image was removed by the final cleanup are left out.
    pub mapping: HashMap<NodeId, AigEdge>,
    /// For each output, whether it was proved constant 0. Empty unless `try_prove` is set.
    pub proved_outputs: Vec<Equivalence>,
    pub stats: FraigStats,
}

/// Rebuilds `aig` through a [`FraigManager`], in topological order.
///
/// Input and output names are carried over. With `try_prove`, outputs proved constant 0
/// are driven by the constant.
pub fn fraig_network<O: EquivalenceOracle>(
    aig: &Aig,
    params: FraigParams,
    oracle: O,
) -> Result<FraigResult> {
    let try_prove = params.try_prove;
    let verbose = params.verbose;
    let mut fraig = FraigManager::with_oracle(params, oracle);
    let mut mapping: HashMap<NodeId, AigEdge> = HashMap::new();
    mapping.insert(0, fraig.const1());

    for &input in aig.inputs() {
        let edge = fraig.create_pi()?;
        mapping.insert(input, edge);
        if let Some(name) = aig.get_name(input) {
            fraig.aig.assign_name(edge.get_node_id(), name)?;
        }
    }

    let image = |mapping: &HashMap<NodeId, AigEdge>, edge: AigEdge| -> Result<AigEdge> {
        mapping
            .get(&edge.get_node_id())
            .map(|mapped| mapped.not_cond(edge.is_complemented()))
            .ok_or_else(|| {
                AigError::InvalidState(format!("node {} used before being built", edge))
            })
    };

    for id in aig.topological_order(aig.outputs())? {
        if let Some(AigNode::And { fanin0, fanin1, .. }) = aig.get_node(id) {
            let a = image(&mapping, *fanin0)?;
            let b = image(&mapping, *fanin1)?;
            let edge = fraig.and(a, b)?;
            mapping.insert(id, edge);
        }
    }

    let mut proved_outputs = Vec::new();
    for &po in aig.outputs() {
        let fanin = match aig.get_node(po) {
            Some(AigNode::Output { fanin, .. }) => *fanin,
            _ => return Err(AigError::NodeDoesNotExist(po)),
        };
        let new_po = match fanin {
            Some(fanin) => {
                let mut edge = image(&mapping, fanin)?;
                if try_prove {
                    let verdict = fraig.prove_constant(edge)?;
                    if verdict == Equivalence::Equal {
                        log::debug!("output {} proved constant 0", po);
                        edge = fraig.const0();
                    }
                    proved_outputs.push(verdict);
                }
                fraig.add_output(edge)?
            }
            None => fraig.aig.create_po()?,
        };
        if let Some(name) = aig.get_name(po) {
            fraig.aig.assign_name(new_po, name)?;
        }
    }

    fraig.cleanup();
    if verbose {
        fraig.print_stats();
    }
    let stats = fraig.stats();
    let fraig_aig = fraig.into_aig();
    mapping.retain(|_, edge| fraig_aig.contains(edge.get_node_id()));
    Ok(FraigResult {
        aig: fraig_aig,
        mapping,
        proved_outputs,
        stats,
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::sat::{Dpll, VarisatSolver};

    /// Real answers for the allowed pairs of nodes, `Unknown` for the others.
    #[derive(Debug, Default)]
    struct Allowed {
        oracle: SatOracle,
        pairs: Vec<(NodeId, NodeId)>,
        refused: u64,
    }

    fn pair(a: AigEdge, b: AigEdge) -> (NodeId, NodeId) {
        let (a, b) = (a.get_node_id(), b.get_node_id());
        (a.min(b), a.max(b))
    }

    impl Allowed {
        fn allow(&mut self, a: AigEdge, b: AigEdge) {
            self.pairs.push(pair(a, b));
        }
    }

    impl EquivalenceOracle for Allowed {
        fn check_equivalence(
            &mut self,
            aig: &Aig,
            a: AigEdge,
            b: AigEdge,
            budget: &Budget,
        ) -> Result<Equivalence> {
            if self.pairs.contains(&pair(a, b)) {
                self.oracle.check_equivalence(aig, a, b, budget)
            } else {
                self.refused += 1;
                Ok(Equivalence::Unknown)
            }
        }

        fn check_clause(
            &mut self,
            aig: &Aig,
            lits: &[AigEdge],
            budget: &Budget,
        ) -> Result<ClauseCheck> {
            self.oracle.check_clause(aig, lits, budget)
        }

        fn calls(&self) -> u64 {
            self.oracle.calls() + self.refused
        }

        fn failed_proofs(&self) -> u64 {
            self.oracle.failed_proofs() + self.refused
        }
    }

    fn small() -> FraigParams {
        FraigParams::full()
            .with_random_patterns(64)
            .with_dynamic_patterns(64)
    }

    #[test]
    fn reduces_associativity() {
        let mut fraig = FraigManager::new(small());
        let a = fraig.create_pi().unwrap();
        let b = fraig.create_pi().unwrap();
        let c = fraig.create_pi().unwrap();
        let ab = fraig.and(a, b).unwrap();
        let left = fraig.and(ab, c).unwrap();
        let bc = fraig.and(b, c).unwrap();
        let right = fraig.and(a, bc).unwrap();
        assert_eq!(left, right);
        assert_eq!(fraig.stats().merges, 1);
        assert_eq!(fraig.stats().proofs, 1);
        // The merged gate is dangling until a cleanup
        let merged = fraig.aig().id_bound() - 1;
        assert_eq!(fraig.state(merged), Some(NodeState::Merged { into: left }));
        assert_eq!(fraig.read_representative_of(!AigEdge::positive(merged)), !left);
        fraig.add_output(left).unwrap();
        // The merged gate and b & c
        assert_eq!(fraig.cleanup(), 2);
        assert_eq!(fraig.cleanup(), 0);
        fraig.aig().check_integrity().unwrap();
    }

    #[test]
    fn merges_with_polarity() {
        let mut fraig = FraigManager::new(small());
        let a = fraig.create_pi().unwrap();
        let b = fraig.create_pi().unwrap();
        let xor = fraig.xor(a, b).unwrap();
        // xnor built as (a & b) | (!a & !b)
        let both = fraig.and(a, b).unwrap();
        let none = fraig.and(!a, !b).unwrap();
        let xnor = fraig.or(both, none).unwrap();
        assert_eq!(xnor, !xor);
    }

    #[test]
    fn constants_are_representatives() {
        let mut fraig = FraigManager::new(small());
        let a = fraig.create_pi().unwrap();
        let b = fraig.create_pi().unwrap();
        let ab = fraig.and(a, b).unwrap();
        let nab = fraig.and(a, !b).unwrap();
        // (a & b) & (a & !b) is 0 but not structurally
        let zero = fraig.and(ab, nab).unwrap();
        assert_eq!(zero, fraig.const0());
        assert!(fraig.is_const(zero));
    }

    #[test]
    fn inputs_absorb() {
        let mut fraig = FraigManager::new(small());
        let a = fraig.ith_var(0).unwrap();
        let b = fraig.ith_var(1).unwrap();
        assert_eq!(fraig.input_num(), 2);
        // a & (a | b) is a
        let a_or_b = fraig.or(a, b).unwrap();
        let x = fraig.and(a, a_or_b).unwrap();
        assert_eq!(x, a);
        assert!(fraig.is_var(x));
        assert_eq!(fraig.ith_var(4).unwrap(), fraig.aig().pi(4).unwrap());
        assert_eq!(fraig.input_num(), 5);
    }

    #[test]
    fn without_functional_reduction() {
        let mut fraig = FraigManager::new(small().with_functional_reduction(false));
        let a = fraig.create_pi().unwrap();
        let b = fraig.create_pi().unwrap();
        let c = fraig.create_pi().unwrap();
        let ab = fraig.and(a, b).unwrap();
        let left = fraig.and(ab, c).unwrap();
        let bc = fraig.and(b, c).unwrap();
        let right = fraig.and(a, bc).unwrap();
        assert_ne!(left, right);
        assert_eq!(fraig.stats().sat_calls, 0);
        // Structural hashing still applies
        assert_eq!(fraig.and(b, a).unwrap(), ab);
    }

    #[test]
    fn children() {
        let mut fraig = FraigManager::new(small());
        let a = fraig.create_pi().unwrap();
        let b = fraig.create_pi().unwrap();
        let x = fraig.and(a, !b).unwrap();
        let id = x.get_node_id();
        assert_eq!(fraig.read_one(id).unwrap(), a);
        assert_eq!(fraig.read_two(id).unwrap(), !b);
        assert!(fraig.read_one(a.get_node_id()).is_err());
    }

    #[test]
    fn clauses() {
        let mut fraig = FraigManager::new(small());
        let a = fraig.create_pi().unwrap();
        let b = fraig.create_pi().unwrap();
        let ab = fraig.and(a, b).unwrap();
        assert!(fraig.check_clause_using_sim(!ab, a));
        assert_eq!(
            fraig.check_clause_using_sat(!ab, a, None).unwrap(),
            ClauseCheck::Holds
        );
        assert!(!fraig.check_clause_using_sim(a, b));
        assert!(matches!(
            fraig.check_clause_using_sat(a, b, None).unwrap(),
            ClauseCheck::Violated(_)
        ));
    }

    #[test]
    fn proves_constants() {
        let mut fraig = FraigManager::new(small().with_functional_reduction(false));
        let a = fraig.create_pi().unwrap();
        let b = fraig.create_pi().unwrap();
        let ab = fraig.and(a, b).unwrap();
        let nab = fraig.and(a, !b).unwrap();
        let zero = fraig.and(ab, nab).unwrap();
        assert_eq!(fraig.prove_constant(zero).unwrap(), Equivalence::Equal);
        match fraig.prove_constant(ab).unwrap() {
            Equivalence::NotEqual(pattern) => assert_eq!(pattern, vec![true, true]),
            other => panic!("expected a disproof, got {:?}", other),
        }
    }

    #[test]
    fn constant_proofs_by_propagation() {
        // (a & b) & (a & !b) is refuted without a single conflict
        let params = small()
            .with_functional_reduction(false)
            .with_proof_conflict_limit(Some(0));
        let mut fraig = FraigManager::with_oracle(params, SatOracle::new(Dpll::new()));
        let a = fraig.create_pi().unwrap();
        let b = fraig.create_pi().unwrap();
        let ab = fraig.and(a, b).unwrap();
        let nab = fraig.and(a, !b).unwrap();
        let zero = fraig.and(ab, nab).unwrap();
        assert_eq!(fraig.prove_constant(zero).unwrap(), Equivalence::Equal);
        assert_eq!(fraig.failed_proofs(), 0);
    }

    #[test]
    fn per_call_time_limit() {
        let mut fraig = FraigManager::new(small().with_functional_reduction(false));
        let a = fraig.create_pi().unwrap();
        let b = fraig.create_pi().unwrap();
        let c = fraig.create_pi().unwrap();
        let ab = fraig.and(a, b).unwrap();
        let left = fraig.and(ab, c).unwrap();
        let bc = fraig.and(b, c).unwrap();
        let right = fraig.and(a, bc).unwrap();

        assert_eq!(
            fraig
                .nodes_are_equal(left, right, None, Some(Duration::ZERO))
                .unwrap(),
            Equivalence::Unknown
        );
        assert_eq!(fraig.failed_proofs(), 1);
        assert_eq!(
            fraig.nodes_are_equal(left, right, None, None).unwrap(),
            Equivalence::Equal
        );
        // Simulation answers before the limit matters
        assert!(matches!(
            fraig
                .nodes_are_equal(left, a, None, Some(Duration::ZERO))
                .unwrap(),
            Equivalence::NotEqual(_)
        ));
        assert_eq!(fraig.failed_proofs(), 1);
    }

    #[test]
    fn retry_after_earlier_merge_into_node() {
        let mut fraig = FraigManager::with_oracle(small(), Allowed::default());
        let x = fraig.create_pi().unwrap();
        let y = fraig.create_pi().unwrap();
        let z = fraig.create_pi().unwrap();
        let xy = fraig.and(x, y).unwrap();
        let r = fraig.and(xy, z).unwrap();
        let yz = fraig.and(y, z).unwrap();
        let u = fraig.and(x, yz).unwrap();
        let v = fraig.and(u, x).unwrap();
        assert_eq!(fraig.state(u.get_node_id()), Some(NodeState::Unresolved));
        assert_eq!(fraig.state(v.get_node_id()), Some(NodeState::Unresolved));

        // r & x is merged into u, which is merged into r later on
        let w_id = fraig.aig().id_bound();
        fraig.oracle_mut().allow(AigEdge::positive(w_id), u);
        assert_eq!(fraig.and(r, x).unwrap(), u);
        assert_eq!(
            fraig.state(w_id),
            Some(NodeState::Merged { into: u })
        );

        let po_v = fraig.add_output(v).unwrap();
        let po_r = fraig.add_output(r).unwrap();
        fraig.oracle_mut().allow(u, r);
        assert_eq!(fraig.retry_unresolved(None).unwrap(), 2);
        // v is structurally r & x, which now leads to r
        assert_eq!(fraig.aig().child0(po_v).unwrap(), r);
        assert_eq!(
            fraig.state(v.get_node_id()),
            Some(NodeState::Merged { into: r })
        );
        for po in [po_v, po_r] {
            let driver = fraig.aig().child0(po).unwrap();
            assert!(!matches!(
                fraig.state(driver.get_node_id()),
                Some(NodeState::Merged { .. })
            ));
        }
        fraig.aig().check_integrity().unwrap();

        // y & z, u, v and r & x
        assert_eq!(fraig.cleanup(), 4);
        assert!(!fraig.aig().contains(u.get_node_id()));
        assert!(fraig.aig().contains(r.get_node_id()));
        assert_eq!(fraig.aig().and_num(), 2);
        fraig.aig().check_integrity().unwrap();
    }

    #[test]
    fn unknown_then_retry() {
        // Proving anything takes at least one conflict
        let params = small().with_conflict_limit(Some(0)).with_feedback(false);
        let mut fraig = FraigManager::with_oracle(params, SatOracle::new(Dpll::new()));
        let a = fraig.create_pi().unwrap();
        let b = fraig.create_pi().unwrap();
        let c = fraig.create_pi().unwrap();
        let d = fraig.create_pi().unwrap();
        let ab = fraig.and(a, b).unwrap();
        let left = fraig.and(ab, c).unwrap();
        let bc = fraig.and(b, c).unwrap();
        let right = fraig.and(a, bc).unwrap();
        let top = fraig.and(right, d).unwrap();

        // Out of budget: nothing merged, the comparison is pending
        assert_ne!(left, right);
        assert_eq!(fraig.state(right.get_node_id()), Some(NodeState::Unresolved));
        assert_eq!(fraig.read_representative_of(right), right);
        assert_eq!(fraig.failed_proofs(), 1);
        assert_eq!(fraig.unresolved_num(), 1);

        assert_eq!(fraig.retry_unresolved(None).unwrap(), 1);
        assert_eq!(fraig.read_representative_of(right), left);
        assert_eq!(fraig.unresolved_num(), 0);
        let fanins = fraig
            .aig()
            .get_node(top.get_node_id())
            .unwrap()
            .get_fanins();
        assert!(fanins.contains(&left));
        assert!(!fanins.contains(&right));
        fraig.aig().check_integrity().unwrap();
    }

    #[test]
    fn choices() {
        let params = small()
            .with_choicing(true)
            .with_time_limit(Some(std::time::Duration::ZERO));
        let mut fraig = FraigManager::with_oracle(params, SatOracle::new(VarisatSolver::new()));
        let a = fraig.create_pi().unwrap();
        let b = fraig.create_pi().unwrap();
        let c = fraig.create_pi().unwrap();
        let ab = fraig.and(a, b).unwrap();
        let left = fraig.and(ab, c).unwrap();
        let bc = fraig.and(b, c).unwrap();
        let right = fraig.and(a, bc).unwrap();

        // Every query times out: right joins the group of left, unmerged
        assert_ne!(left, right);
        assert_eq!(fraig.read_representative_of(right), right);
        assert_eq!(
            fraig.state(right.get_node_id()),
            Some(NodeState::ChoiceMember { of: left })
        );
        assert_eq!(fraig.choices_of(left.get_node_id()), &[right.get_node_id()]);

        fraig.add_output(left).unwrap();
        fraig.cleanup();
        assert!(fraig.aig().contains(right.get_node_id()));
        assert!(fraig.to_dot(GraphvizStyle::default()).contains("dashed"));
    }

    #[test_log::test]
    fn network_pass() {
        let mut aig = Aig::new();
        let a = aig.create_pi().unwrap();
        let b = aig.create_pi().unwrap();
        let c = aig.create_pi().unwrap();
        aig.assign_name(a.get_node_id(), "a").unwrap();
        let ab = aig.and(a, b).unwrap();
        let left = aig.and(ab, c).unwrap();
        let bc = aig.and(b, c).unwrap();
        let right = aig.and(a, bc).unwrap();
        let miter = aig.xor(left, right).unwrap();
        let po = aig.add_output(miter).unwrap();
        aig.assign_name(po, "miter").unwrap();
        let and_num = aig.and_num();

        let oracle = SatOracle::<Dpll>::default();
        let result = fraig_network(&aig, small().with_verbose(true), oracle).unwrap();
        assert_eq!(result.proved_outputs, vec![Equivalence::Equal]);
        assert_eq!(result.aig.and_num(), 0);
        assert!(result.aig.and_num() < and_num);
        assert_eq!(result.aig.find_by_name("a"), Some(result.aig.inputs()[0]));
        let new_po = result.aig.find_by_name("miter").unwrap();
        assert_eq!(result.aig.child0(new_po).unwrap(), result.aig.const0());
        assert_eq!(result.mapping[&0], result.aig.const1());
        result.aig.check_integrity().unwrap();
    }
}
