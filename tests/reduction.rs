use fraig::{
    Aig, AigEdge, AigNode, ClauseCheck, Equivalence, EquivalenceOracle, FraigManager,
    FraigParams, NodeState, Result, SatOracle, fraig_network, sat::Budget,
};
use rand::prelude::*;

/// Answers every question with the same verdict, and counts them.
#[derive(Debug, Default)]
struct Constant {
    equal: bool,
    calls: u64,
}

impl EquivalenceOracle for Constant {
    fn check_equivalence(
        &mut self,
        _aig: &Aig,
        _a: AigEdge,
        _b: AigEdge,
        _budget: &Budget,
    ) -> Result<Equivalence> {
        self.calls += 1;
        Ok(if self.equal {
            Equivalence::Equal
        } else {
            Equivalence::Unknown
        })
    }

    fn check_clause(
        &mut self,
        _aig: &Aig,
        _lits: &[AigEdge],
        _budget: &Budget,
    ) -> Result<ClauseCheck> {
        self.calls += 1;
        Ok(if self.equal {
            ClauseCheck::Holds
        } else {
            ClauseCheck::Unknown
        })
    }

    fn calls(&self) -> u64 {
        self.calls
    }

    fn failed_proofs(&self) -> u64 {
        if self.equal { 0 } else { self.calls }
    }
}

fn always_equal() -> Constant {
    Constant {
        equal: true,
        calls: 0,
    }
}

fn always_unknown() -> Constant {
    Constant {
        equal: false,
        calls: 0,
    }
}

fn small() -> FraigParams {
    FraigParams::full()
        .with_random_patterns(256)
        .with_dynamic_patterns(128)
}

/// Values of every node of `aig` under an input pattern, indexed by id.
fn evaluate(aig: &Aig, pattern: &[bool]) -> Vec<bool> {
    let value = |values: &[bool], edge: AigEdge| values[edge.get_node_id()] ^ edge.is_complemented();
    let mut values = vec![false; aig.id_bound()];
    for id in aig.topological_sort().unwrap() {
        let node_value = match aig.get_node(id).unwrap() {
            AigNode::True => true,
            AigNode::Input { index, .. } => pattern[*index],
            AigNode::And { fanin0, fanin1, .. } => {
                value(&values, *fanin0) && value(&values, *fanin1)
            }
            AigNode::Output { fanin, .. } => fanin.is_some_and(|fanin| value(&values, fanin)),
        };
        values[id] = node_value;
    }
    values
}

/// Random network with redundancy: every gate is built from earlier signals.
fn random_aig(seed: u64, inputs: usize, gates: usize) -> Aig {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut aig = Aig::new();
    let mut edges: Vec<AigEdge> = (0..inputs).map(|_| aig.create_pi().unwrap()).collect();
    for k in 0..gates {
        let a = edges[rng.random_range(0..edges.len())].not_cond(rng.random_bool(0.5));
        let b = edges[rng.random_range(0..edges.len())].not_cond(rng.random_bool(0.5));
        let x = aig.and(a, b).unwrap();
        edges.push(x);
        if k % 6 == 5 {
            aig.add_output(x).unwrap();
        }
    }
    aig
}

/// p0 & p1, and p0 & (p0 | p1) & p1 as separate outputs.
fn same_function_twice() -> Aig {
    let mut aig = Aig::new();
    let p0 = aig.create_pi().unwrap();
    let p1 = aig.create_pi().unwrap();
    let n1 = aig.and(p0, p1).unwrap();
    let p0_or_p1 = aig.or(p0, p1).unwrap();
    let left = aig.and(p0, p0_or_p1).unwrap();
    let n2 = aig.and(left, p1).unwrap();
    aig.add_output(n1).unwrap();
    aig.add_output(n2).unwrap();
    aig
}

#[test]
fn always_equal_collapses_duplicates() {
    let aig = same_function_twice();
    let before = aig.node_num();
    let result = fraig_network(&aig, small(), always_equal()).unwrap();

    let po0 = result.aig.po(0).unwrap();
    let po1 = result.aig.po(1).unwrap();
    let n1 = result.aig.child0(po0).unwrap();
    assert_eq!(n1, result.aig.child0(po1).unwrap());
    assert!(result.aig.is_and(n1));
    assert_eq!(result.aig.and_num(), 1);
    assert!(result.aig.node_num() < before);
    // Simulation tells the outputs apart from the constant without asking the oracle
    assert!(
        result
            .proved_outputs
            .iter()
            .all(|verdict| matches!(verdict, Equivalence::NotEqual(_)))
    );
    result.aig.check_integrity().unwrap();
}

#[test]
fn unknown_never_merges() {
    for choicing in [false, true] {
        let params = small().with_choicing(choicing).with_try_prove(false);
        let mut fraig = FraigManager::with_oracle(params, always_unknown());
        let p0 = fraig.create_pi().unwrap();
        let p1 = fraig.create_pi().unwrap();
        let n1 = fraig.and(p0, p1).unwrap();
        let p0_or_p1 = fraig.or(p0, p1).unwrap();
        let left = fraig.and(p0, p0_or_p1).unwrap();
        let n2 = fraig.and(left, p1).unwrap();

        assert!(fraig.oracle().calls() > 0);
        assert_ne!(left, p0);
        assert_ne!(n1, n2);
        assert_eq!(fraig.stats().merges, 0);
        assert_eq!(fraig.failed_proofs(), fraig.oracle().calls());
        for id in 0..fraig.aig().id_bound() {
            assert!(!matches!(fraig.state(id), Some(NodeState::Merged { .. })));
        }
        // Nothing was rewired
        let fanins = fraig
            .aig()
            .get_node(n2.get_node_id())
            .unwrap()
            .get_fanins();
        assert!(fanins.contains(&left));
        if choicing {
            assert_eq!(fraig.choices_of(p0.get_node_id()), &[left.get_node_id()]);
        } else {
            assert_eq!(fraig.unresolved_num(), 2);
        }
    }
}

#[test]
fn merges_are_sound() {
    for seed in 0..6 {
        let aig = random_aig(seed, 6, 120);
        let oracle: SatOracle = SatOracle::default();
        let result = fraig_network(&aig, small(), oracle).unwrap();
        assert!(result.aig.and_num() <= aig.and_num());
        result.aig.check_integrity().unwrap();

        for bits in 0..64u32 {
            let pattern: Vec<bool> = (0..6).map(|k| (bits >> k) & 1 == 1).collect();
            let old = evaluate(&aig, &pattern);
            let new = evaluate(&result.aig, &pattern);
            for (&id, &edge) in &result.mapping {
                assert_eq!(
                    old[id],
                    new[edge.get_node_id()] ^ edge.is_complemented(),
                    "node {} mapped to {} differs on {:?}",
                    id,
                    edge,
                    pattern
                );
            }
            for (k, &po) in aig.outputs().iter().enumerate() {
                assert_eq!(old[po], new[result.aig.po(k).unwrap()]);
            }
        }
    }
}

#[test]
fn reduced_networks_are_functionally_unique() {
    let aig = random_aig(42, 5, 100);
    let result = fraig_network(&aig, small(), SatOracle::<fraig::sat::Dpll>::default()).unwrap();
    let mut truth_tables: Vec<(u32, usize)> = Vec::new();
    let mut tables = vec![0u32; result.aig.id_bound()];
    for bits in 0..32u32 {
        let pattern: Vec<bool> = (0..5).map(|k| (bits >> k) & 1 == 1).collect();
        for (id, value) in evaluate(&result.aig, &pattern).into_iter().enumerate() {
            if value {
                tables[id] |= 1 << bits;
            }
        }
    }
    for id in 0..result.aig.id_bound() {
        if result.aig.get_node(id).is_some_and(|node| node.is_and()) {
            // Canonical modulo complement
            let table = if tables[id] & 1 == 1 { !tables[id] } else { tables[id] };
            truth_tables.push((table, id));
        }
    }
    truth_tables.sort_unstable();
    for pair in truth_tables.windows(2) {
        assert_ne!(pair[0].0, pair[1].0, "gates {} and {} are equal", pair[0].1, pair[1].1);
    }
}

#[test]
fn sparse_reduction_asks_once_per_node() {
    let aig = random_aig(3, 6, 150);
    let params = small().with_sparse(true).with_try_prove(false);
    let oracle: SatOracle = SatOracle::default();
    let result = fraig_network(&aig, params, oracle).unwrap();
    assert!(result.stats.sat_calls <= result.stats.nodes_created as u64);
    for bits in 0..64u32 {
        let pattern: Vec<bool> = (0..6).map(|k| (bits >> k) & 1 == 1).collect();
        let old = evaluate(&aig, &pattern);
        let new = evaluate(&result.aig, &pattern);
        for (k, &po) in aig.outputs().iter().enumerate() {
            assert_eq!(old[po], new[result.aig.po(k).unwrap()]);
        }
    }
}

#[test_log::test]
fn counterexamples_refine_the_simulation() {
    // A wide conjunction is 0 on every random pattern, yet it is not constant
    let mut aig = Aig::new();
    let mut conjunction = aig.const1();
    for _ in 0..20 {
        let input = aig.create_pi().unwrap();
        conjunction = aig.and(conjunction, input).unwrap();
    }
    aig.add_output(conjunction).unwrap();

    let params = FraigParams::full()
        .with_random_patterns(64)
        .with_dynamic_patterns(64)
        .with_try_prove(false);
    let oracle: SatOracle = SatOracle::default();
    let result = fraig_network(&aig, params, oracle).unwrap();
    assert!(result.stats.disproofs > 0);
    assert!(result.stats.patterns_fed > 0);
    assert_eq!(result.stats.merges, 0);
    assert_eq!(result.aig.and_num(), 19);
    result.aig.check_integrity().unwrap();
}
