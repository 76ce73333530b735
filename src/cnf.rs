//! SAT formulas in conjunctive normal form, and the Tseitin encoding of AIG nodes.
//!
//! Queries are built by [`Miter`] and decided by a [`SatSolver`]:
//! - encode the cones of the compared signals with [`Cnf::add_clauses_node`]
//! - add the clauses asserting that the signals differ
//! - check that the CNF is **UNSAT**.
//!
//! If the resulting CNF is SAT, the model is a counterexample.
//!
//! [`Miter`]: crate::miter::Miter
//! [`SatSolver`]: crate::sat::SatSolver

use std::{collections::HashMap, fmt::Display, ops::Not};

use crate::{AigEdge, AigNode, NodeId, Result, miter::MiterError};

/// A SAT literal, in DIMACS convention: variables are numbered from 1 and a negative value
/// is the negation of the variable.
///
/// Note that all AIG nodes do not correspond to a SAT literal.
/// The [`AigNode::True`] node does not map to any literal: an edge to it is a constant,
/// which is folded away when clauses are generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Lit(i64);

impl Not for Lit {
    type Output = Self;

    fn not(self) -> Self::Output {
        Lit(-self.0)
    }
}

impl Display for Lit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Lit {
    /// The positive literal of variable `var` (starting from 1).
    fn positive(var: i64) -> Self {
        debug_assert!(var > 0);
        Lit(var)
    }

    /// The literal of variable `var` (starting from 1) with the given polarity.
    pub(crate) fn from_var(var: usize, positive: bool) -> Self {
        let lit = Lit(var as i64);
        if positive { lit } else { !lit }
    }

    /// Index of the variable, starting from 1.
    pub fn var(&self) -> usize {
        self.0.unsigned_abs() as usize
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    pub fn to_dimacs(&self) -> i64 {
        self.0
    }
}

/// A literal once constants are taken into account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LitRes {
    False,
    True,
    Lit(Lit),
}

impl Not for LitRes {
    type Output = Self;

    fn not(self) -> Self::Output {
        match self {
            LitRes::False => LitRes::True,
            LitRes::True => LitRes::False,
            LitRes::Lit(lit) => LitRes::Lit(!lit),
        }
    }
}

impl From<Lit> for LitRes {
    fn from(value: Lit) -> Self {
        LitRes::Lit(value)
    }
}

/// A SAT clause, the disjunction of its literals. The empty clause is unsatisfiable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause(Vec<Lit>);

impl Clause {
    /// Returns the true SAT clause once we got rid of `True` and `False` literals.
    /// If there is a `True`, then the Clause is obviously satisfied, so we return None.
    /// `False` literals are omitted, and real literals are added to the clause.
    /// If lits were only `False`, the empty clause is returned: it cannot be satisfied.
    pub(crate) fn from_lit_res(lits: Vec<LitRes>) -> Option<Clause> {
        let mut literals = Vec::new();

        for lit_res in lits {
            match lit_res {
                LitRes::True => return None,
                LitRes::False => (),
                LitRes::Lit(lit) => literals.push(lit),
            }
        }

        Some(Clause(literals))
    }

    pub fn lits(&self) -> &[Lit] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<Lit>> for Clause {
    fn from(value: Vec<Lit>) -> Self {
        Clause(value)
    }
}

/// A SAT CNF that can be passed to a SAT solver.
///
/// Variables are allocated by the CNF itself with [`Cnf::new_var`], so the number of
/// variables is always known.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cnf {
    clauses: Vec<Clause>,
    num_vars: usize,
}

impl Cnf {
    /// A new empty CNF.
    pub fn new() -> Self {
        Cnf::default()
    }

    /// Returns a yet unused variable, as a positive literal.
    pub fn new_var(&mut self) -> Result<Lit> {
        let var = i64::try_from(self.num_vars + 1).map_err(MiterError::from)?;
        self.num_vars += 1;
        Ok(Lit::positive(var))
    }

    pub fn num_vars(&self) -> usize {
        self.num_vars
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Whether the CNF contains the empty clause, ie is trivially UNSAT.
    pub fn has_empty_clause(&self) -> bool {
        self.clauses.iter().any(Clause::is_empty)
    }

    /// Add the given clause to the CNF.
    pub fn add_clause(&mut self, clause: Clause) -> Result<()> {
        self.clauses.try_reserve(1)?;
        self.clauses.push(clause);
        Ok(())
    }

    /// Add the given clause to the CNF, else does nothing.
    pub fn add_clause_if(&mut self, clause: Option<Clause>) -> Result<()> {
        if let Some(c) = clause {
            self.add_clause(c)?;
        }
        Ok(())
    }

    /// Add clauses induced by the node: `z = AND(a, b)` for an and gate.
    pub fn add_clauses_node(&mut self, node: &AigNode, litmap: &HashMap<NodeId, Lit>) -> Result<()> {
        match node {
            AigNode::And { id, fanin0, fanin1 } => {
                let a = fanin0.get_literal_res(litmap)?;
                let b = fanin1.get_literal_res(litmap)?;
                let z = LitRes::from(*litmap.get(id).ok_or(MiterError::UnmappedNodeToLit(*id))?);

                self.add_clause_if(Clause::from_lit_res(vec![a, !z]))?;
                self.add_clause_if(Clause::from_lit_res(vec![b, !z]))?;
                self.add_clause_if(Clause::from_lit_res(vec![!a, !b, z]))?;
            }
            // The other nodes do not induce any clause, they only generate literals
            _ => (),
        }
        Ok(())
    }

    /// Add clauses that encode `XOR(a, b) = true`.
    ///
    /// This is the function to use to compare two signals: the CNF is UNSAT iff they are
    /// equal for all input assignments (within the encoded cones).
    pub(crate) fn add_xor_whose_output_is_true(&mut self, a: LitRes, b: LitRes) -> Result<()> {
        self.add_clause_if(Clause::from_lit_res(vec![a, b]))?;
        self.add_clause_if(Clause::from_lit_res(vec![!a, !b]))
    }

    /// Add clauses that encode `lit = true`.
    pub(crate) fn add_unit(&mut self, lit: LitRes) -> Result<()> {
        self.add_clause_if(Clause::from_lit_res(vec![lit]))
    }
}

impl AigEdge {
    pub(crate) fn get_literal_res(&self, litmap: &HashMap<NodeId, Lit>) -> Result<LitRes> {
        let id = self.get_node_id();
        let lit = if id == 0 {
            LitRes::True
        } else {
            LitRes::from(*litmap.get(&id).ok_or(MiterError::UnmappedNodeToLit(id))?)
        };
        Ok(if self.is_complemented() { !lit } else { lit })
    }
}
