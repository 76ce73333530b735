//! Adapter over the CaDiCaL CDCL solver, through the [`cadical`] bindings.

use std::time::Instant;

use crate::{Result, cnf::Cnf};

use super::{Budget, Model, SatError, SatOutcome, SatSolver};

/// Asks CaDiCaL to stop once the deadline is over. The solver polls it during the search.
#[derive(Debug, Clone, Copy, Default)]
struct Deadline(Option<Instant>);

impl cadical::Callbacks for Deadline {
    fn terminate(&mut self) -> bool {
        self.0.is_some_and(|deadline| Instant::now() >= deadline)
    }
}

/// Complete solver backed by CaDiCaL, the default engine of the oracle.
///
/// The conflict limit of a [`Budget`] is handed to the solver, and the deadline is polled
/// by its termination callback. CaDiCaL has no propagation limit, so the inspection limit
/// is not honored: use [`Dpll`] when it matters.
///
/// [`Dpll`]: super::Dpll
#[derive(Debug, Clone, Copy, Default)]
pub struct CadicalSolver;

impl CadicalSolver {
    pub fn new() -> Self {
        CadicalSolver
    }
}

impl SatSolver for CadicalSolver {
    fn solve(&mut self, cnf: &Cnf, budget: &Budget) -> Result<SatOutcome> {
        if cnf.has_empty_clause() {
            return Ok(SatOutcome::Unsat);
        }
        if budget.is_expired() {
            return Ok(SatOutcome::LimitReached);
        }

        let mut solver: cadical::Solver<Deadline> = cadical::Solver::new();
        let mut used = vec![false; cnf.num_vars()];
        for clause in cnf.clauses() {
            let mut lits = Vec::with_capacity(clause.lits().len());
            for lit in clause.lits() {
                let dimacs = i32::try_from(lit.to_dimacs()).map_err(|_| {
                    SatError::Solver(format!("literal {} does not fit CaDiCaL", lit))
                })?;
                let index = lit.var().checked_sub(1);
                if let Some(seen) = index.and_then(|index| used.get_mut(index)) {
                    *seen = true;
                }
                lits.push(dimacs);
            }
            solver.add_clause(lits);
        }

        if let Some(conflicts) = budget.conflicts {
            let limit = i32::try_from(conflicts).unwrap_or(i32::MAX);
            solver
                .set_limit("conflicts", limit)
                .map_err(|e| SatError::Solver(format!("{:?}", e)))?;
        }
        if budget.deadline.is_some() {
            solver.set_callbacks(Some(Deadline(budget.deadline)));
        }

        match solver.solve() {
            Some(true) => {
                let mut values = vec![false; cnf.num_vars()];
                for (index, value) in values.iter_mut().enumerate() {
                    if used[index] {
                        // Variables are numbered from 1, and fit since a literal used them
                        let var = index as i32 + 1;
                        *value = solver.value(var).unwrap_or(false);
                    }
                }
                Ok(SatOutcome::Sat(Model::new(values)))
            }
            Some(false) => Ok(SatOutcome::Unsat),
            None => {
                log::trace!("cadical gave up within {:?}", budget);
                Ok(SatOutcome::LimitReached)
            }
        }
    }

    fn name(&self) -> &'static str {
        "cadical"
    }
}
