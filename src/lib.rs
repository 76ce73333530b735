pub mod aig;
pub mod cnf;
pub mod fraig;
pub mod miter;
pub mod oracle;
pub mod params;
pub mod sat;
pub mod sim;

// Re-exporting symbols and modules.
pub use aig::dfs;
pub use aig::dot;
pub use aig::{Aig, AigEdge, AigError, AigNode, FaninId, NodeId, NodeKind, Result};
pub use fraig::{FraigManager, FraigResult, FraigStats, NodeState, fraig_network};
pub use oracle::{ClauseCheck, Equivalence, EquivalenceOracle, SatOracle};
pub use params::FraigParams;
pub use sim::Simulator;
