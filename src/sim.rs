//! Bit-parallel simulation, used as a sieve before any SAT call.
//!
//! Every node carries a signature: one bit per input pattern, packed in `u64` words.
//! The first words hold random patterns, drawn once. The following words hold dynamic
//! patterns, filled with SAT counterexamples (and their distance-1 neighbours) as they are
//! found. Two nodes with different signatures are different, two nodes with the same
//! signature are only candidates.
//!
//! Signatures are compared modulo complement: the canonical form of a signature is the
//! signature itself if its first bit is 0, and its complement otherwise.

use rand::prelude::*;

use crate::{Aig, AigEdge, AigError, AigNode, FraigParams, NodeId, Result};

/// Number of words needed for `patterns` bits.
fn words_for(patterns: usize) -> usize {
    patterns.div_ceil(64)
}

#[derive(Debug, Clone)]
pub struct Simulator {
    rand_words: usize,
    dyna_words: usize,
    dist1: bool,
    rng: StdRng,
    /// Number of dynamic patterns written so far, the next one goes to slot
    /// `fed % dynamic_capacity()`.
    fed: usize,
    /// Signatures indexed by node id, empty if the node was not simulated.
    sigs: Vec<Vec<u64>>,
}

impl Simulator {
    /// A simulator with `random_patterns` random patterns (at least one word) and room for
    /// `dynamic_patterns` dynamic ones.
    pub fn new(random_patterns: usize, dynamic_patterns: usize, dist1: bool, seed: u64) -> Self {
        let rand_words = words_for(random_patterns).max(1);
        let dyna_words = words_for(dynamic_patterns);
        Simulator {
            rand_words,
            dyna_words,
            dist1,
            rng: StdRng::seed_from_u64(seed),
            fed: 0,
            // The constant is always node 0
            sigs: vec![vec![u64::MAX; rand_words + dyna_words]],
        }
    }

    pub fn from_params(params: &FraigParams) -> Self {
        Simulator::new(
            params.random_patterns,
            params.dynamic_patterns,
            params.distance1_patterns,
            params.seed,
        )
    }

    /// Number of words of a signature.
    pub fn words(&self) -> usize {
        self.rand_words + self.dyna_words
    }

    /// Number of dynamic pattern slots.
    pub fn dynamic_capacity(&self) -> usize {
        64 * self.dyna_words
    }

    /// Number of dynamic patterns written so far (including overwritten ones).
    pub fn patterns_fed(&self) -> usize {
        self.fed
    }

    fn slot(&mut self, id: NodeId) -> Result<&mut Vec<u64>> {
        if id >= self.sigs.len() {
            self.sigs.try_reserve(id + 1 - self.sigs.len())?;
            self.sigs.resize_with(id + 1, Vec::new);
        }
        Ok(&mut self.sigs[id])
    }

    /// Draws random words for a new input. Its dynamic words are 0, as if every pattern
    /// fed so far had set it to false.
    pub fn simulate_input(&mut self, id: NodeId) -> Result<()> {
        let words = self.words();
        let mut sig = Vec::new();
        sig.try_reserve_exact(words)?;
        for _ in 0..self.rand_words {
            sig.push(self.rng.random::<u64>());
        }
        sig.resize(words, 0);
        *self.slot(id)? = sig;
        Ok(())
    }

    fn edge_word(&self, edge: AigEdge, k: usize) -> Result<u64> {
        let word = self
            .sigs
            .get(edge.get_node_id())
            .and_then(|sig| sig.get(k))
            .copied()
            .ok_or_else(|| {
                AigError::InvalidState(format!("node {} was not simulated", edge.get_node_id()))
            })?;
        Ok(if edge.is_complemented() { !word } else { word })
    }

    fn and_words(&self, fanin0: AigEdge, fanin1: AigEdge, words: std::ops::Range<usize>) -> Result<Vec<u64>> {
        let mut sig = Vec::new();
        sig.try_reserve_exact(words.len())?;
        for k in words {
            sig.push(self.edge_word(fanin0, k)? & self.edge_word(fanin1, k)?);
        }
        Ok(sig)
    }

    /// Computes the signature of an and gate from the signatures of its fanins.
    pub fn simulate_and(&mut self, id: NodeId, fanin0: AigEdge, fanin1: AigEdge) -> Result<()> {
        let sig = self.and_words(fanin0, fanin1, 0..self.words())?;
        *self.slot(id)? = sig;
        Ok(())
    }

    /// Simulates a node of `aig`, whatever its kind. Outputs have no signature.
    pub fn simulate_node(&mut self, aig: &Aig, id: NodeId) -> Result<()> {
        match aig.get_node(id).ok_or(AigError::NodeDoesNotExist(id))? {
            AigNode::True => Ok(()),
            AigNode::Input { .. } => self.simulate_input(id),
            AigNode::And { fanin0, fanin1, .. } => self.simulate_and(id, *fanin0, *fanin1),
            AigNode::Output { .. } => Ok(()),
        }
    }

    pub fn signature(&self, id: NodeId) -> Option<&[u64]> {
        self.sigs
            .get(id)
            .filter(|sig| !sig.is_empty())
            .map(Vec::as_slice)
    }

    /// The phase of a node: the value of its signature on the first pattern.
    pub fn phase(&self, id: NodeId) -> Option<bool> {
        self.signature(id).map(|sig| sig[0] & 1 == 1)
    }

    /// The canonical form of the signature, and the phase of the node.
    /// Nodes equal modulo complement have the same canonical form.
    pub fn canonical(&self, id: NodeId) -> Option<(Vec<u64>, bool)> {
        let sig = self.signature(id)?;
        let phase = sig[0] & 1 == 1;
        let key = if phase {
            sig.iter().map(|word| !word).collect()
        } else {
            sig.to_vec()
        };
        Some((key, phase))
    }

    /// Whether `a | b` holds on every pattern. Nodes without signature never do.
    pub fn check_clause(&self, a: AigEdge, b: AigEdge) -> bool {
        (0..self.words()).all(|k| match (self.edge_word(a, k), self.edge_word(b, k)) {
            (Ok(wa), Ok(wb)) => wa | wb == u64::MAX,
            _ => false,
        })
    }

    /// An input pattern (indexed by input index) on which `a` and `b` differ,
    /// if their signatures tell them apart.
    pub fn distinguishing_pattern(&self, aig: &Aig, a: AigEdge, b: AigEdge) -> Option<Vec<bool>> {
        for k in 0..self.words() {
            let diff = self.edge_word(a, k).ok()? ^ self.edge_word(b, k).ok()?;
            if diff != 0 {
                let bit = diff.trailing_zeros();
                let pattern = aig
                    .inputs()
                    .iter()
                    .map(|&id| {
                        self.sigs
                            .get(id)
                            .and_then(|sig| sig.get(k))
                            .is_some_and(|word| (word >> bit) & 1 == 1)
                    })
                    .collect();
                return Some(pattern);
            }
        }
        None
    }

    /// Writes one input pattern in the next dynamic slot.
    fn write_pattern(&mut self, aig: &Aig, pattern: &[bool]) {
        let capacity = self.dynamic_capacity();
        let slot = self.fed % capacity;
        let (word, bit) = (self.rand_words + slot / 64, slot % 64);
        for (index, &id) in aig.inputs().iter().enumerate() {
            let value = pattern.get(index).copied().unwrap_or(false);
            if let Some(w) = self.sigs.get_mut(id).and_then(|sig| sig.get_mut(word)) {
                if value {
                    *w |= 1 << bit;
                } else {
                    *w &= !(1 << bit);
                }
            }
        }
        self.fed += 1;
    }

    /// Adds a counterexample (indexed by input index) to the dynamic pool, along with its
    /// distance-1 neighbours if enabled, then updates the dynamic words of every node of
    /// `aig`. Returns the number of patterns written.
    pub fn add_pattern(&mut self, aig: &Aig, pattern: &[bool]) -> Result<usize> {
        let capacity = self.dynamic_capacity();
        if capacity == 0 {
            return Ok(0);
        }

        self.write_pattern(aig, pattern);
        let mut written = 1;
        if self.dist1 {
            // Keep the counterexample itself from being overwritten by its own neighbours
            let mut neighbour = pattern.to_vec();
            neighbour.resize(aig.pi_num(), false);
            for index in 0..aig.pi_num().min(capacity - 1) {
                neighbour[index] = !neighbour[index];
                self.write_pattern(aig, &neighbour);
                neighbour[index] = !neighbour[index];
                written += 1;
            }
        }

        self.resimulate_dynamic(aig)?;
        log::trace!("{} dynamic patterns written, {} fed so far", written, self.fed);
        Ok(written)
    }

    /// Recomputes the dynamic words of all and gates, fanins first.
    fn resimulate_dynamic(&mut self, aig: &Aig) -> Result<()> {
        let words = self.rand_words..self.words();
        for id in aig.topological_sort()? {
            if let Some(AigNode::And { fanin0, fanin1, .. }) = aig.get_node(id) {
                if self.signature(id).is_none() {
                    continue;
                }
                let dynamic = self.and_words(*fanin0, *fanin1, words.clone())?;
                self.sigs[id][words.clone()].copy_from_slice(&dynamic);
            }
        }
        Ok(())
    }
}
