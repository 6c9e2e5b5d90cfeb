// SPDX-License-Identifier: MIT OR Apache-2.0
//! Runtime error type.
//!
//! Errors surface at the call that caused them and are never caught or
//! retried by the runtime itself; hook and handler failures unwind to
//! whoever initiated the originating write or emit.

use crate::cable::CableId;
use crate::node::NodeId;
use crate::port::PortDirection;
use crate::types::ValueKind;

/// Error raised by the graph runtime.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// A value written to a port violates its declared kind.
    #[error("type mismatch on port `{port}`: expected {expected:?}, got {got}")]
    TypeMismatch {
        /// Name of the port that rejected the value
        port: String,
        /// Declared kind of the port
        expected: ValueKind,
        /// Kind of the offending value
        got: &'static str,
    },

    /// A node type key is not registered.
    #[error("unknown node type `{0}`")]
    UnknownNodeType(String),

    /// An interface type key is not registered.
    #[error("unknown interface type `{0}`")]
    UnknownInterfaceType(String),

    /// A registry key was registered twice.
    #[error("duplicate registration for `{0}`")]
    DuplicateRegistration(String),

    /// An imported cable entry names a document id or port that does not
    /// exist.
    #[error("cable entry references unknown target (id {id}, port `{port}`)")]
    DanglingCableReference {
        /// Document id of the target node
        id: u32,
        /// Target port name
        port: String,
    },

    /// A node id does not resolve to a live node.
    #[error("node not found: {0}")]
    NodeNotFound(NodeId),

    /// A cable id does not resolve to a live cable.
    #[error("cable not found: {0}")]
    CableNotFound(CableId),

    /// A port name does not exist on the addressed node side.
    #[error("no {direction:?} port named `{name}`")]
    UnknownPort {
        /// Port name that failed to resolve
        name: String,
        /// Side of the node that was searched
        direction: PortDirection,
    },

    /// A cable must run from an output port to an input port.
    #[error("cable endpoints must run output to input")]
    InvalidCableEndpoints,

    /// No binding is registered under the requested field name.
    #[error("no bound field named `{0}`")]
    UnknownDataField(String),

    /// Propagation exceeded the configured recursion depth.
    #[error("propagation exceeded the configured depth limit of {0}")]
    DepthExceeded(usize),

    /// A persisted data field holds a non-scalar literal.
    #[error("data fields must be scalar literals, got {0}")]
    MalformedField(String),

    /// The graph document failed to parse.
    #[error("malformed graph document: {0}")]
    MalformedDocument(#[from] serde_json::Error),
}
