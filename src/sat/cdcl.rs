//! Adapter over the [`varisat`] CDCL solver.

use varisat::ExtendFormula;

use crate::{Result, cnf::Cnf};

use super::{Budget, Model, SatError, SatOutcome, SatSolver};

/// Complete solver backed by `varisat`.
///
/// `varisat` cannot be interrupted, so only the deadline of a [`Budget`] is honored, and
/// only before the search starts. Conflict and inspection limits are ignored: use
/// [`CadicalSolver`] or [`Dpll`] when they matter.
///
/// [`CadicalSolver`]: super::CadicalSolver
/// [`Dpll`]: super::Dpll
#[derive(Debug, Clone, Copy, Default)]
pub struct VarisatSolver;

impl VarisatSolver {
    pub fn new() -> Self {
        VarisatSolver
    }
}

impl SatSolver for VarisatSolver {
    fn solve(&mut self, cnf: &Cnf, budget: &Budget) -> Result<SatOutcome> {
        if cnf.has_empty_clause() {
            return Ok(SatOutcome::Unsat);
        }
        if budget.is_expired() {
            return Ok(SatOutcome::LimitReached);
        }

        let mut solver = varisat::Solver::new();
        for clause in cnf.clauses() {
            let lits: Vec<varisat::Lit> = clause
                .lits()
                .iter()
                .map(|lit| varisat::Lit::from_dimacs(lit.to_dimacs() as isize))
                .collect();
            solver.add_clause(&lits);
        }

        let sat = solver
            .solve()
            .map_err(|e| SatError::Solver(format!("{:?}", e)))?;
        if !sat {
            return Ok(SatOutcome::Unsat);
        }

        let mut values = vec![false; cnf.num_vars()];
        for lit in solver.model().unwrap_or_default() {
            let index = lit.var().index();
            if index >= values.len() {
                values.resize(index + 1, false);
            }
            values[index] = lit.is_positive();
        }
        Ok(SatOutcome::Sat(Model::new(values)))
    }

    fn name(&self) -> &'static str {
        "varisat"
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::cnf::Clause;

    #[test]
    fn agrees_with_dpll() {
        let mut cnf = Cnf::new();
        let a = cnf.new_var().unwrap();
        let b = cnf.new_var().unwrap();
        cnf.add_clause(Clause::from(vec![a, b])).unwrap();
        cnf.add_clause(Clause::from(vec![!a])).unwrap();

        let mut solver = VarisatSolver::new();
        match solver.solve(&cnf, &Budget::unlimited()).unwrap() {
            SatOutcome::Sat(model) => {
                model.check(&cnf).unwrap();
                assert!(model.value(b));
            }
            other => panic!("expected SAT, got {:?}", other),
        }

        cnf.add_clause(Clause::from(vec![!b])).unwrap();
        assert_eq!(
            solver.solve(&cnf, &Budget::unlimited()).unwrap(),
            SatOutcome::Unsat
        );
        assert_eq!(
            super::super::Dpll::new()
                .solve(&cnf, &Budget::unlimited())
                .unwrap(),
            SatOutcome::Unsat
        );
    }
}
