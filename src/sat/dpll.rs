//! A small DPLL solver: unit propagation over occurrence lists and chronological
//! backtracking. No learning, so it is only meant for the small cones compared while
//! building a FRAIG, where its strict budget accounting matters more than raw strength.

use crate::{
    Result,
    cnf::{Cnf, Lit},
};

use super::{Budget, Model, SatOutcome, SatSolver};

/// The deadline is polled once every so many search steps.
const DEADLINE_POLL_PERIOD: u64 = 256;

/// Bounded backtracking SAT solver.
///
/// Every backtrack counts as one conflict, every clause visited during propagation counts
/// as one inspection. When a limit of the [`Budget`] is exceeded the search stops with
/// [`SatOutcome::LimitReached`].
///
/// ```rust
/// use fraig::cnf::Cnf;
/// use fraig::sat::{Budget, Dpll, SatOutcome, SatSolver};
///
/// let cnf = Cnf::new();
/// let mut solver = Dpll::new();
/// assert!(matches!(solver.solve(&cnf, &Budget::unlimited()).unwrap(), SatOutcome::Sat(_)));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Dpll {
    /// Conflicts over all queries.
    total_conflicts: u64,
    /// Inspections over all queries.
    total_inspections: u64,
}

impl Dpll {
    pub fn new() -> Self {
        Dpll::default()
    }

    pub fn total_conflicts(&self) -> u64 {
        self.total_conflicts
    }

    pub fn total_inspections(&self) -> u64 {
        self.total_inspections
    }
}

enum ClauseStatus {
    Satisfied,
    Unit(Lit),
    Conflict,
    Open,
}

/// Position of a literal in the occurrence lists.
fn code(lit: Lit) -> usize {
    2 * lit.var() + usize::from(!lit.is_positive())
}

struct Search<'a> {
    cnf: &'a Cnf,
    /// Clauses containing each literal.
    occurrences: Vec<Vec<usize>>,
    values: Vec<Option<bool>>,
    /// Assigned variables, in assignment order.
    trail: Vec<usize>,
    /// Next trail position to propagate.
    qhead: usize,
    conflicts: u64,
    inspections: u64,
}

impl<'a> Search<'a> {
    fn new(cnf: &'a Cnf) -> Self {
        let max_var = cnf
            .clauses()
            .iter()
            .flat_map(|clause| clause.lits())
            .map(Lit::var)
            .max()
            .unwrap_or(0)
            .max(cnf.num_vars());
        let mut occurrences = vec![Vec::new(); 2 * (max_var + 1)];
        for (k, clause) in cnf.clauses().iter().enumerate() {
            for &lit in clause.lits() {
                occurrences[code(lit)].push(k);
            }
        }
        Search {
            cnf,
            occurrences,
            values: vec![None; max_var + 1],
            trail: Vec::new(),
            qhead: 0,
            conflicts: 0,
            inspections: 0,
        }
    }

    fn value(&self, lit: Lit) -> Option<bool> {
        self.values[lit.var()].map(|value| value == lit.is_positive())
    }

    fn assign(&mut self, lit: Lit) {
        self.values[lit.var()] = Some(lit.is_positive());
        self.trail.push(lit.var());
    }

    fn undo(&mut self, len: usize) {
        for var in self.trail.drain(len..) {
            self.values[var] = None;
        }
        self.qhead = self.qhead.min(len);
    }

    fn clause_status(&self, k: usize) -> ClauseStatus {
        let mut unassigned = None;
        let mut count = 0;
        for &lit in self.cnf.clauses()[k].lits() {
            match self.value(lit) {
                Some(true) => return ClauseStatus::Satisfied,
                Some(false) => (),
                None => {
                    count += 1;
                    unassigned = Some(lit);
                }
            }
        }
        match (count, unassigned) {
            (0, _) => ClauseStatus::Conflict,
            (1, Some(lit)) => ClauseStatus::Unit(lit),
            _ => ClauseStatus::Open,
        }
    }

    /// Assigns the unit clauses of the formula. Returns false on conflict.
    fn assign_units(&mut self) -> bool {
        let cnf = self.cnf;
        for clause in cnf.clauses() {
            if let &[lit] = clause.lits() {
                self.inspections += 1;
                match self.value(lit) {
                    Some(false) => return false,
                    Some(true) => (),
                    None => self.assign(lit),
                }
            }
        }
        true
    }

    /// Unit propagation until fixpoint. Returns false on conflict.
    fn propagate(&mut self) -> bool {
        while self.qhead < self.trail.len() {
            let var = self.trail[self.qhead];
            self.qhead += 1;
            let Some(value) = self.values[var] else {
                continue;
            };
            // The literal of var which just became false
            let falsified = 2 * var + usize::from(value);
            for k in 0..self.occurrences[falsified].len() {
                let clause = self.occurrences[falsified][k];
                self.inspections += 1;
                match self.clause_status(clause) {
                    ClauseStatus::Unit(lit) => self.assign(lit),
                    ClauseStatus::Conflict => return false,
                    ClauseStatus::Satisfied | ClauseStatus::Open => (),
                }
            }
        }
        true
    }

    fn model(&self) -> Model {
        Model::new(
            self.values
                .iter()
                .skip(1)
                .map(|value| value.unwrap_or(false))
                .collect(),
        )
    }

    fn run(&mut self, budget: &Budget) -> SatOutcome {
        if self.cnf.has_empty_clause() || !self.assign_units() {
            return SatOutcome::Unsat;
        }

        // (trail length before the decision, decided variable, already flipped)
        let mut decisions: Vec<(usize, usize, bool)> = Vec::new();
        let mut steps: u64 = 0;
        loop {
            steps += 1;
            if steps % DEADLINE_POLL_PERIOD == 0 && budget.is_expired() {
                return SatOutcome::LimitReached;
            }
            if budget.inspections.is_some_and(|limit| self.inspections > limit) {
                return SatOutcome::LimitReached;
            }

            if self.propagate() {
                match (1..self.values.len()).find(|&var| self.values[var].is_none()) {
                    None => return SatOutcome::Sat(self.model()),
                    Some(var) => {
                        decisions.push((self.trail.len(), var, false));
                        self.assign(Lit::from_var(var, false));
                    }
                }
                continue;
            }

            // Nothing left to flip: the refutation is complete, whatever the budget
            if decisions.iter().all(|&(_, _, flipped)| flipped) {
                return SatOutcome::Unsat;
            }
            self.conflicts += 1;
            if budget.conflicts.is_some_and(|limit| self.conflicts > limit) {
                return SatOutcome::LimitReached;
            }
            // Chronological backtracking to the last decision not yet flipped
            loop {
                match decisions.pop() {
                    None => return SatOutcome::Unsat,
                    Some((_, _, true)) => (),
                    Some((len, var, false)) => {
                        self.undo(len);
                        decisions.push((len, var, true));
                        self.assign(Lit::from_var(var, true));
                        break;
                    }
                }
            }
        }
    }
}

impl SatSolver for Dpll {
    fn solve(&mut self, cnf: &Cnf, budget: &Budget) -> Result<SatOutcome> {
        if budget.is_expired() {
            return Ok(SatOutcome::LimitReached);
        }
        let mut search = Search::new(cnf);
        let outcome = search.run(budget);
        self.total_conflicts += search.conflicts;
        self.total_inspections += search.inspections;
        log::trace!(
            "dpll: {} vars, {} clauses, {} conflicts, {} inspections -> {:?}",
            cnf.num_vars(),
            cnf.len(),
            search.conflicts,
            search.inspections,
            outcome
        );
        Ok(outcome)
    }

    fn name(&self) -> &'static str {
        "dpll"
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::cnf::Clause;

    /// Pigeonhole principle: `n + 1` pigeons in `n` holes, always UNSAT.
    fn pigeonhole(n: usize) -> Cnf {
        let mut cnf = Cnf::new();
        let vars: Vec<Vec<Lit>> = (0..=n)
            .map(|_| (0..n).map(|_| cnf.new_var().unwrap()).collect())
            .collect();
        for pigeon in &vars {
            cnf.add_clause(Clause::from(pigeon.clone())).unwrap();
        }
        for hole in 0..n {
            for p in 0..=n {
                for q in (p + 1)..=n {
                    cnf.add_clause(Clause::from(vec![!vars[p][hole], !vars[q][hole]]))
                        .unwrap();
                }
            }
        }
        cnf
    }

    #[test]
    fn sat_with_valid_model() {
        let mut cnf = Cnf::new();
        let a = cnf.new_var().unwrap();
        let b = cnf.new_var().unwrap();
        let c = cnf.new_var().unwrap();
        cnf.add_clause(Clause::from(vec![a, b])).unwrap();
        cnf.add_clause(Clause::from(vec![!a, c])).unwrap();
        cnf.add_clause(Clause::from(vec![!b, !c])).unwrap();
        cnf.add_clause(Clause::from(vec![a])).unwrap();

        let mut solver = Dpll::new();
        match solver.solve(&cnf, &Budget::unlimited()).unwrap() {
            SatOutcome::Sat(model) => {
                model.check(&cnf).unwrap();
                assert!(model.value(a));
                assert!(model.value(c));
                assert!(!model.value(b));
            }
            other => panic!("expected SAT, got {:?}", other),
        }
    }

    #[test]
    fn unsat() {
        let mut cnf = Cnf::new();
        let a = cnf.new_var().unwrap();
        let b = cnf.new_var().unwrap();
        for clause in [vec![a, b], vec![a, !b], vec![!a, b], vec![!a, !b]] {
            cnf.add_clause(Clause::from(clause)).unwrap();
        }
        let mut solver = Dpll::new();
        assert_eq!(
            solver.solve(&cnf, &Budget::unlimited()).unwrap(),
            SatOutcome::Unsat
        );
        assert!(solver.total_conflicts() > 0);

        assert_eq!(
            solver.solve(&pigeonhole(3), &Budget::unlimited()).unwrap(),
            SatOutcome::Unsat
        );
    }

    #[test]
    fn empty_clause_is_unsat() {
        let mut cnf = Cnf::new();
        cnf.add_clause(Clause::from(vec![])).unwrap();
        assert_eq!(
            Dpll::new().solve(&cnf, &Budget::unlimited()).unwrap(),
            SatOutcome::Unsat
        );
    }

    #[test]
    fn propagation_refutes_without_conflict_budget() {
        let mut cnf = Cnf::new();
        let a = cnf.new_var().unwrap();
        let b = cnf.new_var().unwrap();
        let c = cnf.new_var().unwrap();
        cnf.add_clause(Clause::from(vec![a])).unwrap();
        cnf.add_clause(Clause::from(vec![!a, b])).unwrap();
        cnf.add_clause(Clause::from(vec![!b, c])).unwrap();
        cnf.add_clause(Clause::from(vec![!b, !c])).unwrap();
        let mut solver = Dpll::new();
        assert_eq!(
            solver
                .solve(&cnf, &Budget::unlimited().with_conflicts(0))
                .unwrap(),
            SatOutcome::Unsat
        );
        assert_eq!(solver.total_conflicts(), 0);
    }

    #[test]
    fn budgets_are_honored() {
        let cnf = pigeonhole(5);
        let mut solver = Dpll::new();
        assert_eq!(
            solver
                .solve(&cnf, &Budget::unlimited().with_conflicts(3))
                .unwrap(),
            SatOutcome::LimitReached
        );
        assert_eq!(solver.total_conflicts(), 4);
        assert_eq!(
            solver
                .solve(&cnf, &Budget::unlimited().with_inspections(10))
                .unwrap(),
            SatOutcome::LimitReached
        );
        assert_eq!(
            solver
                .solve(&cnf, &Budget::unlimited().with_deadline(std::time::Instant::now()))
                .unwrap(),
            SatOutcome::LimitReached
        );
    }
}
