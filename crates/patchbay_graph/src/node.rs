// SPDX-License-Identifier: MIT OR Apache-2.0
//! Nodes: computation units owning ports, a behavior and an interface.

use std::rc::Rc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cable::Cable;
use crate::engine::NodeScope;
use crate::error::GraphError;
use crate::iface::Interface;
use crate::port::{Port, PortDef, PortDirection, PortRef};
use crate::types::Value;

/// Unique identifier for a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub Uuid);

impl NodeId {
    /// Create a new random node ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle hooks of a node, invoked by the runtime.
///
/// Every method has a default body, so a behavior implements only the
/// hooks it needs. Behaviors are shared (`Rc`) and hooks take `&self`;
/// per-node mutable state lives in `Cell`/`RefCell` fields of the
/// implementing type. Hooks may freely re-enter the engine through the
/// scope — propagation is synchronous and depth-first.
pub trait NodeBehavior {
    /// Called once, after ports and interface are fully assigned and
    /// before any cable event can reach this node. The place to register
    /// interface event listeners.
    fn init(&self, node: &mut NodeScope<'_>) -> Result<(), GraphError> {
        let _ = node;
        Ok(())
    }

    /// Called whenever an input port of this node receives a pushed
    /// value via `cable`. Invoked once per contributing write.
    fn update(&self, node: &mut NodeScope<'_>, cable: &Cable) -> Result<(), GraphError> {
        let _ = (node, cable);
        Ok(())
    }

    /// Called when a downstream consumer reads this node's output `port`
    /// with no cached value. Return `Ok(false)` to signal that no new
    /// value was produced; otherwise the hook is expected to have written
    /// the output itself.
    fn request(
        &self,
        node: &mut NodeScope<'_>,
        port: &PortRef,
        requester: NodeId,
    ) -> Result<bool, GraphError> {
        let _ = (node, port, requester);
        Ok(false)
    }

    /// Called once after persisted data fields have been restored from a
    /// document import, letting the node project restored data into its
    /// own output ports.
    fn imported(&self, node: &mut NodeScope<'_>) -> Result<(), GraphError> {
        let _ = node;
        Ok(())
    }

    /// Catch-all for domain-specific hooks (`clicked`, `changed`, ...).
    /// The runtime never calls this itself; interface actions and host
    /// code dispatch through it by name. Unknown names are ignored.
    fn action(&self, node: &mut NodeScope<'_>, name: &str, arg: Value) -> Result<(), GraphError> {
        let _ = (node, name, arg);
        Ok(())
    }
}

/// Behavior for nodes that declare no hooks at all.
pub struct InertBehavior;

impl NodeBehavior for InertBehavior {}

/// Builder handed to a node factory to declare the node's shape.
pub struct NodeBuilder {
    pub(crate) title: String,
    pub(crate) iface_type: Option<String>,
    pub(crate) inputs: Vec<(String, PortDef)>,
    pub(crate) outputs: Vec<(String, PortDef)>,
    pub(crate) behavior: Option<Rc<dyn NodeBehavior>>,
}

impl NodeBuilder {
    pub(crate) fn new(type_key: &str) -> Self {
        Self {
            title: type_key.to_string(),
            iface_type: None,
            inputs: Vec::new(),
            outputs: Vec::new(),
            behavior: None,
        }
    }

    /// Set the display title.
    pub fn title(&mut self, title: impl Into<String>) -> &mut Self {
        self.title = title.into();
        self
    }

    /// Declare which registered interface type backs this node. Unset
    /// nodes get a bare generic interface.
    pub fn interface(&mut self, iface_type: impl Into<String>) -> &mut Self {
        self.iface_type = Some(iface_type.into());
        self
    }

    /// Declare an input port.
    pub fn input(&mut self, name: impl Into<String>, def: impl Into<PortDef>) -> &mut Self {
        self.inputs.push((name.into(), def.into()));
        self
    }

    /// Declare an output port.
    pub fn output(&mut self, name: impl Into<String>, def: impl Into<PortDef>) -> &mut Self {
        self.outputs.push((name.into(), def.into()));
        self
    }

    /// Install the node's behavior.
    pub fn behavior(&mut self, behavior: impl NodeBehavior + 'static) -> &mut Self {
        self.behavior = Some(Rc::new(behavior));
        self
    }
}

/// A live node in the graph.
pub struct Node {
    pub(crate) id: NodeId,
    pub(crate) type_key: String,
    pub(crate) title: String,
    pub(crate) position: [f32; 2],
    pub(crate) doc_id: Option<u32>,
    pub(crate) inputs: IndexMap<String, Port>,
    pub(crate) outputs: IndexMap<String, Port>,
    pub(crate) behavior: Rc<dyn NodeBehavior>,
    pub(crate) iface: Interface,
}

impl Node {
    pub(crate) fn from_builder(id: NodeId, type_key: &str, builder: NodeBuilder) -> Self {
        let mut inputs = IndexMap::new();
        for (name, def) in builder.inputs {
            let port = Port::from_def(name.clone(), PortDirection::Input, def);
            inputs.insert(name, port);
        }
        let mut outputs = IndexMap::new();
        for (name, def) in builder.outputs {
            let port = Port::from_def(name.clone(), PortDirection::Output, def);
            outputs.insert(name, port);
        }
        Self {
            id,
            type_key: type_key.to_string(),
            title: builder.title,
            position: [0.0, 0.0],
            doc_id: None,
            inputs,
            outputs,
            behavior: builder.behavior.unwrap_or_else(|| Rc::new(InertBehavior)),
            iface: Interface::new(builder.iface_type),
        }
    }

    /// Node ID.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// The node type key this node was instantiated from.
    pub fn type_key(&self) -> &str {
        &self.type_key
    }

    /// Display title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Position metadata, round-tripped but never interpreted.
    pub fn position(&self) -> [f32; 2] {
        self.position
    }

    /// Document id assigned by an import, if any.
    pub fn doc_id(&self) -> Option<u32> {
        self.doc_id
    }

    /// Input ports in declaration order.
    pub fn inputs(&self) -> impl Iterator<Item = &Port> {
        self.inputs.values()
    }

    /// Output ports in declaration order.
    pub fn outputs(&self) -> impl Iterator<Item = &Port> {
        self.outputs.values()
    }

    /// The node's interface.
    pub fn iface(&self) -> &Interface {
        &self.iface
    }

    /// Look up a port on one side of the node.
    pub fn port(&self, direction: PortDirection, name: &str) -> Option<&Port> {
        match direction {
            PortDirection::Input => self.inputs.get(name),
            PortDirection::Output => self.outputs.get(name),
        }
    }

    pub(crate) fn port_mut(&mut self, direction: PortDirection, name: &str) -> Option<&mut Port> {
        match direction {
            PortDirection::Input => self.inputs.get_mut(name),
            PortDirection::Output => self.outputs.get_mut(name),
        }
    }
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("type_key", &self.type_key)
            .field("title", &self.title)
            .field("inputs", &self.inputs.keys().collect::<Vec<_>>())
            .field("outputs", &self.outputs.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}
