//! SAT engines, seen as opaque decision procedures with resource budgets.
//!
//! A [`SatSolver`] decides a [`Cnf`] within a [`Budget`] and answers with a [`SatOutcome`].
//! Running out of budget is not an error: it is the [`SatOutcome::LimitReached`] value.
//!
//! Three engines are provided:
//! - [`CadicalSolver`], an adapter over CaDiCaL which honors conflict limits and deadlines,
//!   and is the default
//! - [`Dpll`], a small backtracking solver which also honors inspection limits
//! - [`VarisatSolver`], an adapter over the `varisat` CDCL solver, which can only honor a
//!   deadline before it starts.

pub mod cadical;
pub mod cdcl;
pub mod dpll;

use std::time::{Duration, Instant};

use thiserror::Error;

use crate::{Result, cnf::Cnf, cnf::Lit};

pub use self::cadical::CadicalSolver;
pub use self::cdcl::VarisatSolver;
pub use self::dpll::Dpll;

/// Error returned when a SAT engine fails, which is not the same as giving up.
#[derive(Debug, Error)]
pub enum SatError {
    /// The underlying solver reported a failure.
    #[error("SAT solver failed: {0}")]
    Solver(String),

    /// The model returned by the solver does not satisfy the formula.
    #[error("SAT solver returned a model violating clause {0}")]
    InvalidModel(usize),
}

/// A satisfying assignment: the value of each variable, variable `v` at index `v - 1`.
/// Variables missing from the model are false.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Model(Vec<bool>);

impl Model {
    pub fn new(values: Vec<bool>) -> Self {
        Model(values)
    }

    /// The value of `lit` under this assignment.
    pub fn value(&self, lit: Lit) -> bool {
        let var = lit
            .var()
            .checked_sub(1)
            .and_then(|index| self.0.get(index))
            .copied()
            .unwrap_or(false);
        var == lit.is_positive()
    }

    /// Checks that every clause of `cnf` has a true literal.
    pub fn check(&self, cnf: &Cnf) -> Result<()> {
        for (k, clause) in cnf.clauses().iter().enumerate() {
            if !clause.lits().iter().any(|&lit| self.value(lit)) {
                return Err(SatError::InvalidModel(k).into());
            }
        }
        Ok(())
    }
}

/// The answer of a SAT engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SatOutcome {
    /// The formula is satisfiable, here is a witness.
    Sat(Model),
    /// The formula is unsatisfiable.
    Unsat,
    /// The budget was exhausted before a conclusion was reached.
    LimitReached,
}

/// Resource limits of a single SAT query. `None` means unlimited.
///
/// Conflicts are counted as backtracks, inspections as clause visits during propagation,
/// and the deadline is polled cooperatively by the engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Budget {
    pub conflicts: Option<u64>,
    pub inspections: Option<u64>,
    pub deadline: Option<Instant>,
}

impl Budget {
    /// No limit at all: the query runs to completion.
    pub fn unlimited() -> Self {
        Budget::default()
    }

    pub fn with_conflicts(mut self, conflicts: u64) -> Self {
        self.conflicts = Some(conflicts);
        self
    }

    pub fn with_inspections(mut self, inspections: u64) -> Self {
        self.inspections = Some(inspections);
        self
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Deadline `timeout` from now.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }
}

/// A SAT engine.
pub trait SatSolver {
    /// Decides `cnf` within `budget`.
    fn solve(&mut self, cnf: &Cnf, budget: &Budget) -> Result<SatOutcome>;

    /// Short name of the engine, used in logs.
    fn name(&self) -> &'static str;
}
