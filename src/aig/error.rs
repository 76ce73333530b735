use std::collections::TryReserveError;

use thiserror::Error;

use crate::{miter::MiterError, sat::SatError};

use super::{NodeId, NodeKind};

/// The result of an AIG operation.
pub type Result<T> = std::result::Result<T, AigError>;

/// Error returned when an AIG operation failed.
///
/// Every variant but the forwarded ones is a contract violation by the caller or a resource
/// failure: the network is left untouched when one is returned.
#[derive(Debug, Error)]
pub enum AigError {
    /// The node with given id does not exist (never allocated, or removed by a cleanup).
    ///
    /// Using a handle from a different network is a precondition violation which can only be
    /// detected when the id is out of range for this network.
    #[error("node with id={0} does not exist")]
    NodeDoesNotExist(NodeId),

    /// Invalid fanin access on a node which does not have such fanin.
    /// Outputs only have [`FaninId::Fanin0`], inputs and the constant have none.
    ///
    /// [`FaninId::Fanin0`]: super::FaninId::Fanin0
    #[error("node {id} ({kind}) has no such fanin")]
    NoFanin { id: NodeId, kind: NodeKind },

    /// A fanin index other than 0 or 1 was requested.
    #[error("invalid fanin index {0}")]
    InvalidFaninIndex(usize),

    /// The node was expected to be of another kind.
    #[error("node {id} is a {found}, expected a {expected}")]
    UnexpectedKind {
        id: NodeId,
        expected: NodeKind,
        found: NodeKind,
    },

    /// The fanin of an output can only be bound once.
    #[error("output {0} already has a fanin")]
    OutputAlreadyBound(NodeId),

    /// The output has no fanin yet.
    #[error("output {0} has no fanin yet")]
    UnboundOutput(NodeId),

    /// Names are bijective with ids within a network.
    #[error("name {name:?} is already used by node {owner}")]
    DuplicateName { name: String, owner: NodeId },

    /// Replacing `old` by `new` would make the graph cyclic.
    #[error("replacing node {old} by node {new} would create a cycle")]
    WouldCreateCycle { old: NodeId, new: NodeId },

    /// Allocation of nodes, tables or patterns failed.
    #[error("out of memory: {0}")]
    OutOfMemory(#[from] TryReserveError),

    /// The AIG has reached an invalid state. This should never happen.
    #[error("the AIG has reached an invalid state - this should not happen - error: {0}")]
    InvalidState(String),

    /// Just forwarding a [`MiterError`].
    #[error("{0}")]
    MiterError(#[from] MiterError),

    /// Just forwarding a [`SatError`].
    #[error("{0}")]
    SatError(#[from] SatError),
}
