//! Tuning of a [`FraigManager`].
//!
//! [`FraigManager`]: crate::FraigManager

use std::time::Duration;

/// Parameters of a [`FraigManager`], copied by the manager when it is created.
///
/// Two sets of defaults are available: [`FraigParams::default`], the reduced set meant for
/// quick reduction with small SAT budgets, and [`FraigParams::full`] for complete reduction.
/// Fields can be mutated directly or through the chained `with_*` setters.
///
/// ```rust
/// use fraig::FraigParams;
/// let params = FraigParams::default().with_choicing(true).with_conflict_limit(Some(1000));
/// assert!(params.choicing);
/// assert_eq!(FraigParams::full().conflict_limit, None);
/// ```
///
/// [`FraigManager`]: crate::FraigManager
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FraigParams {
    /// Number of random simulation patterns.
    pub random_patterns: usize,
    /// Number of dynamic simulation patterns, filled with SAT counterexamples.
    pub dynamic_patterns: usize,
    /// Conflicts allowed for each equivalence check, `None` for no limit.
    pub conflict_limit: Option<u64>,
    /// Wall-clock time allowed for each equivalence check, `None` for no limit.
    pub time_limit: Option<Duration>,
    /// Clause inspections allowed for each SAT query, `None` for no limit.
    pub inspection_limit: Option<u64>,
    /// Conflicts allowed when trying to prove an output constant, `None` for no limit.
    pub proof_conflict_limit: Option<u64>,
    /// Merge functionally equivalent nodes. When off, the manager is a plain structurally
    /// hashed AIG.
    pub functional_reduction: bool,
    /// Feed SAT counterexamples back to the simulation.
    pub feedback: bool,
    /// Also feed the distance-1 neighbours of counterexamples.
    pub distance1_patterns: bool,
    /// Compare a new node with a single representative of its signature class only.
    pub sparse: bool,
    /// Keep equivalent and possibly equivalent nodes together in choice groups.
    pub choicing: bool,
    /// Try to prove outputs constant when reducing a whole network.
    pub try_prove: bool,
    /// Seed of the random patterns, so runs are reproducible.
    pub seed: u64,
    /// Log statistics at the `info` level.
    pub verbose: bool,
    /// Log progress at the `info` level while nodes are built.
    pub progress: bool,
}

impl Default for FraigParams {
    /// The reduced set: small SAT budgets, sparse reduction.
    fn default() -> Self {
        FraigParams {
            random_patterns: 2048,
            dynamic_patterns: 2048,
            conflict_limit: Some(100),
            time_limit: Some(Duration::from_secs(20)),
            inspection_limit: None,
            proof_conflict_limit: None,
            functional_reduction: true,
            feedback: true,
            distance1_patterns: true,
            sparse: true,
            choicing: false,
            try_prove: false,
            seed: 0,
            verbose: false,
            progress: false,
        }
    }
}

impl FraigParams {
    /// The full set: no SAT budget, every candidate is compared, outputs are proved.
    pub fn full() -> Self {
        FraigParams {
            conflict_limit: None,
            time_limit: None,
            sparse: false,
            try_prove: true,
            ..FraigParams::default()
        }
    }

    pub fn with_random_patterns(mut self, random_patterns: usize) -> Self {
        self.random_patterns = random_patterns;
        self
    }

    pub fn with_dynamic_patterns(mut self, dynamic_patterns: usize) -> Self {
        self.dynamic_patterns = dynamic_patterns;
        self
    }

    pub fn with_conflict_limit(mut self, conflict_limit: Option<u64>) -> Self {
        self.conflict_limit = conflict_limit;
        self
    }

    pub fn with_time_limit(mut self, time_limit: Option<Duration>) -> Self {
        self.time_limit = time_limit;
        self
    }

    pub fn with_inspection_limit(mut self, inspection_limit: Option<u64>) -> Self {
        self.inspection_limit = inspection_limit;
        self
    }

    pub fn with_proof_conflict_limit(mut self, proof_conflict_limit: Option<u64>) -> Self {
        self.proof_conflict_limit = proof_conflict_limit;
        self
    }

    pub fn with_functional_reduction(mut self, functional_reduction: bool) -> Self {
        self.functional_reduction = functional_reduction;
        self
    }

    pub fn with_feedback(mut self, feedback: bool) -> Self {
        self.feedback = feedback;
        self
    }

    pub fn with_distance1_patterns(mut self, distance1_patterns: bool) -> Self {
        self.distance1_patterns = distance1_patterns;
        self
    }

    pub fn with_sparse(mut self, sparse: bool) -> Self {
        self.sparse = sparse;
        self
    }

    pub fn with_choicing(mut self, choicing: bool) -> Self {
        self.choicing = choicing;
        self
    }

    pub fn with_try_prove(mut self, try_prove: bool) -> Self {
        self.try_prove = try_prove;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }
}
