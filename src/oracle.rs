//! Deciding equivalence of two signals with bounded resources.
//!
//! Answers are tri-state: proved [`Equivalence::Equal`], disproved with a counterexample
//! [`Equivalence::NotEqual`], or [`Equivalence::Unknown`] when the budget ran out.
//! `Unknown` is not a disproof, and must never be taken as a proof.

use crate::{
    Aig, AigEdge, Result,
    miter::Miter,
    sat::{Budget, CadicalSolver, SatOutcome, SatSolver},
};

/// Result of an equivalence check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Equivalence {
    /// The two signals are equal for every input assignment.
    Equal,
    /// The input pattern (indexed by input index) sets the two signals to different values.
    NotEqual(Vec<bool>),
    /// The budget was exhausted before a conclusion was reached.
    Unknown,
}

/// Result of checking that a disjunction of signals always holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClauseCheck {
    /// The disjunction is true for every input assignment.
    Holds,
    /// The input pattern (indexed by input index) sets every signal to false.
    Violated(Vec<bool>),
    /// The budget was exhausted before a conclusion was reached.
    Unknown,
}

/// Something able to compare signals of an [`Aig`].
///
/// Implementations count their calls and the calls which ended without a conclusion.
/// Both counters only grow, so a caller may snapshot [`failed_proofs`] around a batch of
/// calls to know whether any of them was inconclusive.
///
/// [`failed_proofs`]: EquivalenceOracle::failed_proofs
pub trait EquivalenceOracle {
    /// Decides whether `a` and `b` are equal.
    fn check_equivalence(
        &mut self,
        aig: &Aig,
        a: AigEdge,
        b: AigEdge,
        budget: &Budget,
    ) -> Result<Equivalence>;

    /// Decides whether the disjunction of `lits` always holds.
    fn check_clause(&mut self, aig: &Aig, lits: &[AigEdge], budget: &Budget)
    -> Result<ClauseCheck>;

    /// Number of checks performed.
    fn calls(&self) -> u64;

    /// Number of checks which ended [`Equivalence::Unknown`] or [`ClauseCheck::Unknown`].
    fn failed_proofs(&self) -> u64;
}

/// The oracle backed by a SAT engine, [`CadicalSolver`] by default.
///
/// ```rust
/// use fraig::{Aig, Equivalence, EquivalenceOracle, SatOracle};
/// use fraig::sat::Budget;
///
/// let mut aig = Aig::new();
/// let a = aig.create_pi().unwrap();
/// let b = aig.create_pi().unwrap();
/// // a & b versus !(!a | !b)
/// let x = aig.and(a, b).unwrap();
/// let y = aig.or(!a, !b).unwrap();
///
/// let mut oracle: SatOracle = SatOracle::default();
/// let verdict = oracle.check_equivalence(&aig, x, !y, &Budget::unlimited()).unwrap();
/// assert_eq!(verdict, Equivalence::Equal);
/// assert!(matches!(
///     oracle.check_equivalence(&aig, x, a, &Budget::unlimited()).unwrap(),
///     Equivalence::NotEqual(_)
/// ));
/// ```
#[derive(Debug, Clone, Default)]
pub struct SatOracle<S: SatSolver = CadicalSolver> {
    solver: S,
    calls: u64,
    failed_proofs: u64,
}

impl<S: SatSolver> SatOracle<S> {
    pub fn new(solver: S) -> Self {
        SatOracle {
            solver,
            calls: 0,
            failed_proofs: 0,
        }
    }

    pub fn solver(&self) -> &S {
        &self.solver
    }

    fn solve(&mut self, miter: &Miter, budget: &Budget) -> Result<SatOutcome> {
        self.calls += 1;
        let outcome = self.solver.solve(miter.cnf(), budget)?;
        match &outcome {
            SatOutcome::Sat(model) => model.check(miter.cnf())?,
            SatOutcome::LimitReached => self.failed_proofs += 1,
            SatOutcome::Unsat => (),
        }
        Ok(outcome)
    }
}

impl<S: SatSolver> EquivalenceOracle for SatOracle<S> {
    fn check_equivalence(
        &mut self,
        aig: &Aig,
        a: AigEdge,
        b: AigEdge,
        budget: &Budget,
    ) -> Result<Equivalence> {
        // Same node: no need to ask the solver
        if a.get_node_id() == b.get_node_id() {
            return Ok(if a == b {
                Equivalence::Equal
            } else {
                Equivalence::NotEqual(vec![false; aig.pi_num()])
            });
        }

        let miter = Miter::for_pair(aig, a, b)?;
        let verdict = match self.solve(&miter, budget)? {
            SatOutcome::Unsat => Equivalence::Equal,
            SatOutcome::Sat(model) => Equivalence::NotEqual(miter.counterexample(&model)),
            SatOutcome::LimitReached => Equivalence::Unknown,
        };
        log::debug!(
            "{}: {} vs {} -> {:?}",
            self.solver.name(),
            a,
            b,
            match &verdict {
                Equivalence::NotEqual(_) => "not equal",
                Equivalence::Equal => "equal",
                Equivalence::Unknown => "unknown",
            }
        );
        Ok(verdict)
    }

    fn check_clause(
        &mut self,
        aig: &Aig,
        lits: &[AigEdge],
        budget: &Budget,
    ) -> Result<ClauseCheck> {
        let miter = Miter::for_clause(aig, lits)?;
        Ok(match self.solve(&miter, budget)? {
            SatOutcome::Unsat => ClauseCheck::Holds,
            SatOutcome::Sat(model) => ClauseCheck::Violated(miter.counterexample(&model)),
            SatOutcome::LimitReached => ClauseCheck::Unknown,
        })
    }

    fn calls(&self) -> u64 {
        self.calls
    }

    fn failed_proofs(&self) -> u64 {
        self.failed_proofs
    }
}
