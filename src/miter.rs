//! Build the SAT queries asking whether two signals of the same AIG may differ.

use std::{collections::HashMap, num::TryFromIntError};

use thiserror::Error;

use crate::{
    Aig, AigEdge, AigError, AigNode, NodeId, Result,
    cnf::{Cnf, Lit, LitRes},
    sat::Model,
};

/// Error returned when an operation related to the miter fails.
#[derive(Debug, Error)]
pub enum MiterError {
    /// A node was not mapped to any SAT literal in the miter.
    #[error("node id {0} is not mapped to any literal")]
    UnmappedNodeToLit(NodeId),

    /// Only the constant, inputs and and gates carry a signal.
    #[error("node id {0} is an output, it cannot be compared")]
    NotASignal(NodeId),

    /// Conversion from a variable index to a SAT literal failed.
    #[error("conversion from variable index to Lit failed because of {0}")]
    NodeIdToLit(TryFromIntError),
}

impl From<TryFromIntError> for MiterError {
    fn from(value: TryFromIntError) -> Self {
        MiterError::NodeIdToLit(value)
    }
}

/// The struct used to decide whether signals of a single AIG are equivalent.
///
/// For background on what is a miter, please check
/// [Verification of large synthesized designs](https://doi.org/10.1109/ICCAD.1993.580110) by D. Brand.
///
/// Only the fanin cones of the compared signals are encoded. Inputs outside of these cones
/// are free, and are reported as `false` in counterexamples.
///
/// To use this struct:
/// - create a miter with [`for_pair`] (are two signals equal?) or [`for_clause`]
///   (can a disjunction of signals be false?)
/// - solve [`cnf`] with a [`SatSolver`]
/// - if it is SAT, turn the model into an input pattern with [`counterexample`].
///
/// [`for_pair`]: Miter::for_pair
/// [`for_clause`]: Miter::for_clause
/// [`cnf`]: Miter::cnf
/// [`counterexample`]: Miter::counterexample
/// [`SatSolver`]: crate::sat::SatSolver
#[derive(Debug, Clone)]
pub struct Miter {
    cnf: Cnf,
    /// Associating a SAT literal to each encoded node.
    litmap: HashMap<NodeId, Lit>,
    /// The literal of each encoded input, with its input index.
    inputs: Vec<(usize, Lit)>,
    /// Number of inputs of the AIG, ie length of counterexamples.
    n_inputs: usize,
}

impl Miter {
    fn new(aig: &Aig) -> Self {
        Miter {
            cnf: Cnf::new(),
            litmap: HashMap::new(),
            inputs: Vec::new(),
            n_inputs: aig.pi_num(),
        }
    }

    /// Encodes the fanin cone of `edge` (nodes already encoded are shared)
    /// and returns its literal.
    fn encode(&mut self, aig: &Aig, edge: AigEdge) -> Result<LitRes> {
        let id = edge.get_node_id();
        if aig.get_node(id).ok_or(AigError::NodeDoesNotExist(id))?.is_output() {
            return Err(MiterError::NotASignal(id).into());
        }

        for id in aig.topological_order(&[id])? {
            if self.litmap.contains_key(&id) {
                continue;
            }
            let node = aig.get_node(id).ok_or(AigError::NodeDoesNotExist(id))?;
            match node {
                AigNode::Input { index, .. } => {
                    let lit = self.cnf.new_var()?;
                    self.litmap.insert(id, lit);
                    self.inputs.push((*index, lit));
                }
                AigNode::And { .. } => {
                    let lit = self.cnf.new_var()?;
                    self.litmap.insert(id, lit);
                    self.cnf.add_clauses_node(node, &self.litmap)?;
                }
                _ => (),
            }
        }
        edge.get_literal_res(&self.litmap)
    }

    /// The miter of `a` and `b`: SAT iff some input assignment sets them to different values.
    pub fn for_pair(aig: &Aig, a: AigEdge, b: AigEdge) -> Result<Self> {
        let mut miter = Miter::new(aig);
        let lit_a = miter.encode(aig, a)?;
        let lit_b = miter.encode(aig, b)?;
        miter.cnf.add_xor_whose_output_is_true(lit_a, lit_b)?;
        Ok(miter)
    }

    /// SAT iff some input assignment sets all `lits` to false, ie violates their disjunction.
    pub fn for_clause(aig: &Aig, lits: &[AigEdge]) -> Result<Self> {
        let mut miter = Miter::new(aig);
        for &edge in lits {
            let lit = miter.encode(aig, edge)?;
            miter.cnf.add_unit(!lit)?;
        }
        Ok(miter)
    }

    pub fn cnf(&self) -> &Cnf {
        &self.cnf
    }

    /// Turns a model of [`Miter::cnf`] into an input pattern, indexed by input index.
    pub fn counterexample(&self, model: &Model) -> Vec<bool> {
        let mut pattern = vec![false; self.n_inputs];
        for &(index, lit) in &self.inputs {
            if let Some(value) = pattern.get_mut(index) {
                *value = model.value(lit);
            }
        }
        pattern
    }
}
