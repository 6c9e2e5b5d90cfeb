// SPDX-License-Identifier: MIT OR Apache-2.0
//! Cables: directed value-carrying edges between ports.

use uuid::Uuid;

use crate::node::NodeId;
use crate::port::PortRef;

/// Unique identifier for a cable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CableId(pub Uuid);

impl CableId {
    /// Create a new random cable ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CableId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CableId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A directed edge from one node's output port to another node's input
/// port. Owned jointly by its two endpoint ports; removing either port
/// destroys the cable.
#[derive(Debug, Clone)]
pub struct Cable {
    /// Unique cable ID
    pub id: CableId,
    /// Source endpoint (always an output port)
    pub source: PortRef,
    /// Target endpoint (always an input port)
    pub target: PortRef,
}

impl Cable {
    pub(crate) fn new(source: PortRef, target: PortRef) -> Self {
        Self {
            id: CableId::new(),
            source,
            target,
        }
    }

    /// Check if this cable touches a specific node.
    pub fn involves_node(&self, node: NodeId) -> bool {
        self.source.node == node || self.target.node == node
    }
}
