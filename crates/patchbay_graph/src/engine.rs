// SPDX-License-Identifier: MIT OR Apache-2.0
//! The engine: registries, graph container and the propagation machinery.
//!
//! An [`Engine`] is explicit instance state — construct as many
//! independent engines per process as needed. All execution is
//! single-threaded and synchronous: every hook, listener and propagation
//! step runs to completion before its caller resumes, and a write may
//! re-enter the engine through the hooks it triggers.

use std::rc::Rc;

use indexmap::IndexMap;

use crate::cable::{Cable, CableId};
use crate::error::GraphError;
use crate::iface::{EventData, InterfaceBuilder};
use crate::node::{Node, NodeBehavior, NodeBuilder, NodeId};
use crate::port::{PortDirection, PortRef};
use crate::types::Value;

/// Topic fired on both endpoint interfaces when a cable is created.
pub const CABLE_CONNECT: &str = "cable.connect";
/// Topic fired on both endpoint interfaces when a cable is removed.
pub const CABLE_DISCONNECT: &str = "cable.disconnect";

/// Optional guards on the synchronous propagation recursion.
///
/// The runtime has no cycle detection: a cyclic graph recurses until the
/// call stack is exhausted unless a depth limit is set here.
#[derive(Debug, Clone, Copy, Default)]
pub struct PropagationLimits {
    /// Maximum nesting of in-flight writes; `None` means unbounded.
    pub max_depth: Option<usize>,
}

type NodeFactory = Rc<dyn Fn(&mut NodeBuilder)>;
type InterfaceFactory = Rc<dyn Fn(&mut InterfaceBuilder)>;

/// Registry of node/interface factories plus the live graph.
pub struct Engine {
    node_types: IndexMap<String, NodeFactory>,
    iface_types: IndexMap<String, InterfaceFactory>,
    nodes: IndexMap<NodeId, Node>,
    by_type: IndexMap<String, Vec<NodeId>>,
    cables: IndexMap<CableId, Cable>,
    limits: PropagationLimits,
    depth: usize,
    // Nodes with a pull in flight; deliveries into them skip `update`.
    pulling: Vec<NodeId>,
}

impl Engine {
    /// Create an engine with unbounded propagation.
    pub fn new() -> Self {
        Self::with_limits(PropagationLimits::default())
    }

    /// Create an engine with explicit propagation limits.
    pub fn with_limits(limits: PropagationLimits) -> Self {
        Self {
            node_types: IndexMap::new(),
            iface_types: IndexMap::new(),
            nodes: IndexMap::new(),
            by_type: IndexMap::new(),
            cables: IndexMap::new(),
            limits,
            depth: 0,
            pulling: Vec::new(),
        }
    }

    // === Registries ===

    /// Register a node type under a namespaced key
    /// (`Library/Feature/Name`). Re-registering a key fails with
    /// [`GraphError::DuplicateRegistration`].
    pub fn register_node(
        &mut self,
        type_key: impl Into<String>,
        factory: impl Fn(&mut NodeBuilder) + 'static,
    ) -> Result<(), GraphError> {
        let type_key = type_key.into();
        if self.node_types.contains_key(&type_key) {
            return Err(GraphError::DuplicateRegistration(type_key));
        }
        tracing::debug!(%type_key, "node type registered");
        self.node_types.insert(type_key, Rc::new(factory));
        Ok(())
    }

    /// Register an interface type. Re-registering a key fails with
    /// [`GraphError::DuplicateRegistration`].
    pub fn register_interface(
        &mut self,
        iface_key: impl Into<String>,
        factory: impl Fn(&mut InterfaceBuilder) + 'static,
    ) -> Result<(), GraphError> {
        let iface_key = iface_key.into();
        if self.iface_types.contains_key(&iface_key) {
            return Err(GraphError::DuplicateRegistration(iface_key));
        }
        tracing::debug!(%iface_key, "interface type registered");
        self.iface_types.insert(iface_key, Rc::new(factory));
        Ok(())
    }

    // === Graph construction ===

    /// Instantiate a node of a registered type. Runs the node factory,
    /// constructs the declared (or generic) interface, inserts the node
    /// into the graph and invokes its `init` hook.
    pub fn create_node(&mut self, type_key: &str) -> Result<NodeId, GraphError> {
        let factory = self
            .node_types
            .get(type_key)
            .cloned()
            .ok_or_else(|| GraphError::UnknownNodeType(type_key.to_string()))?;

        let mut builder = NodeBuilder::new(type_key);
        factory(&mut builder);

        // Resolve the interface factory before touching the graph so an
        // unknown key leaves no half-built node behind.
        let iface_builder = match &builder.iface_type {
            Some(key) => {
                let iface_factory = self
                    .iface_types
                    .get(key)
                    .cloned()
                    .ok_or_else(|| GraphError::UnknownInterfaceType(key.clone()))?;
                let mut iface_builder = InterfaceBuilder::new();
                iface_factory(&mut iface_builder);
                Some(iface_builder)
            }
            None => None,
        };

        let id = NodeId::new();
        let mut node = Node::from_builder(id, type_key, builder);
        if let Some(iface_builder) = iface_builder {
            node.iface.install(iface_builder);
        }
        let behavior = Rc::clone(&node.behavior);

        self.nodes.insert(id, node);
        self.by_type
            .entry(type_key.to_string())
            .or_default()
            .push(id);
        tracing::debug!(%type_key, node = %id, "node created");

        behavior.init(&mut NodeScope::new(self, id))?;
        Ok(id)
    }

    /// Remove a node from the graph, disconnecting all its cables first
    /// so no dangling cable survives it.
    pub fn remove_node(&mut self, node: NodeId) -> Result<(), GraphError> {
        if !self.nodes.contains_key(&node) {
            return Err(GraphError::NodeNotFound(node));
        }
        let attached: Vec<CableId> = self
            .cables
            .values()
            .filter(|c| c.involves_node(node))
            .map(|c| c.id)
            .collect();
        for cable in attached {
            self.disconnect(cable)?;
        }
        let removed = self
            .nodes
            .shift_remove(&node)
            .ok_or(GraphError::NodeNotFound(node))?;
        if let Some(group) = self.by_type.get_mut(&removed.type_key) {
            group.retain(|id| *id != node);
        }
        tracing::debug!(node = %node, type_key = %removed.type_key, "node removed");
        Ok(())
    }

    /// Connect an output port to an input port. Appends the cable to
    /// both ports' adjacency lists and fires [`CABLE_CONNECT`] on the
    /// source node's interface, then on the target node's.
    ///
    /// Self-loops are not rejected; they are a caller hazard.
    pub fn connect(&mut self, source: PortRef, target: PortRef) -> Result<CableId, GraphError> {
        if source.direction != PortDirection::Output || target.direction != PortDirection::Input {
            return Err(GraphError::InvalidCableEndpoints);
        }
        self.expect_port(&source)?;
        self.expect_port(&target)?;

        let cable = Cable::new(source.clone(), target.clone());
        let id = cable.id;
        self.port_mut(&source)?.attach(id);
        self.port_mut(&target)?.attach(id);
        self.cables.insert(id, cable.clone());
        tracing::debug!(%source, %target, "cable connected");

        self.emit(source.node, CABLE_CONNECT, &EventData::Cable(cable.clone()))?;
        self.emit(target.node, CABLE_CONNECT, &EventData::Cable(cable))?;
        Ok(id)
    }

    /// Remove a cable. Fires [`CABLE_DISCONNECT`] on the source node's
    /// interface, then on the target node's.
    pub fn disconnect(&mut self, cable: CableId) -> Result<(), GraphError> {
        let removed = self
            .cables
            .shift_remove(&cable)
            .ok_or(GraphError::CableNotFound(cable))?;
        if let Ok(port) = self.port_mut(&removed.source) {
            port.detach(cable);
        }
        if let Ok(port) = self.port_mut(&removed.target) {
            port.detach(cable);
        }
        tracing::debug!(source = %removed.source, target = %removed.target, "cable disconnected");

        self.emit(
            removed.source.node,
            CABLE_DISCONNECT,
            &EventData::Cable(removed.clone()),
        )?;
        self.emit(
            removed.target.node,
            CABLE_DISCONNECT,
            &EventData::Cable(removed),
        )?;
        Ok(())
    }

    // === Lookup ===

    /// Get a live node.
    pub fn node(&self, node: NodeId) -> Option<&Node> {
        self.nodes.get(&node)
    }

    /// Live nodes of a type, in instantiation order.
    pub fn nodes_of_type(&self, type_key: &str) -> &[NodeId] {
        self.by_type.get(type_key).map_or(&[], Vec::as_slice)
    }

    /// All live nodes, in instantiation order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Number of live nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Get a live cable.
    pub fn cable(&self, cable: CableId) -> Option<&Cable> {
        self.cables.get(&cable)
    }

    /// All live cables, in creation order.
    pub fn cables(&self) -> impl Iterator<Item = &Cable> {
        self.cables.values()
    }

    // === Value flow ===

    /// Write a value to a port.
    ///
    /// Runs the declared kind check, then the validator transform if
    /// present, stores the result, and — for output ports — synchronously
    /// pushes it through every outgoing cable in creation order. Each
    /// delivery runs the target port's kind check, validator and
    /// listener, then invokes the target node's `update` hook, recursing
    /// depth-first through any writes that hook performs.
    pub fn write(&mut self, port: &PortRef, value: impl Into<Value>) -> Result<(), GraphError> {
        if let Some(max) = self.limits.max_depth {
            if self.depth >= max {
                return Err(GraphError::DepthExceeded(max));
            }
        }
        self.depth += 1;
        let result = self.write_inner(port, value.into());
        self.depth -= 1;
        result
    }

    fn write_inner(&mut self, port: &PortRef, value: Value) -> Result<(), GraphError> {
        let stored = {
            let cell = self.port_mut(port)?;
            let stored = cell.admit(value)?;
            cell.store(stored.clone());
            stored
        };
        tracing::trace!(%port, value = %stored, "port written");

        if port.direction == PortDirection::Output {
            let outgoing: Vec<CableId> = {
                let cell = self.port_mut(port)?;
                cell.cables().to_vec()
            };
            for id in outgoing {
                // A hook further down may have disconnected the cable.
                let Some(cable) = self.cables.get(&id).cloned() else {
                    continue;
                };
                self.deliver(&cable, stored.clone())?;
            }
        }
        Ok(())
    }

    /// Deliver a pushed value into a cable's target input.
    fn deliver(&mut self, cable: &Cable, value: Value) -> Result<(), GraphError> {
        let (stored, listener) = {
            let cell = self.port_mut(&cable.target)?;
            let stored = cell.admit(value)?;
            cell.store(stored.clone());
            (stored, cell.listener())
        };
        tracing::trace!(source = %cable.source, target = %cable.target, value = %stored, "delivery");

        if let Some(listener) = listener {
            let mut scope = NodeScope::new(self, cable.target.node);
            listener(&mut scope, &cable.source, &stored)?;
        }

        // A node that is mid-pull asked for this value itself; storing it
        // answers the read, and running `update` as well would recompute
        // once per contributing input instead of once per push.
        if self.pulling.contains(&cable.target.node) {
            tracing::trace!(target = %cable.target, "update suppressed during pull");
            return Ok(());
        }

        let behavior = Rc::clone(
            &self
                .nodes
                .get(&cable.target.node)
                .ok_or(GraphError::NodeNotFound(cable.target.node))?
                .behavior,
        );
        behavior.update(&mut NodeScope::new(self, cable.target.node), cable)
    }

    /// Read a port's value.
    ///
    /// Returns the stored value if present. A valueless input fed by
    /// exactly one cable first invokes the upstream node's `request` hook
    /// (once per read-miss), then re-reads; if the input is still empty
    /// the upstream output's cached value is used. Anything still absent
    /// falls back to the port's literal default or its kind's zero value.
    pub fn read(&mut self, port: &PortRef) -> Result<Value, GraphError> {
        let (cached, cable_ids, fallback) = {
            let cell = self.expect_port(port)?;
            (cell.value().cloned(), cell.cables().to_vec(), cell.fallback())
        };
        if let Some(value) = cached {
            return Ok(value);
        }

        if port.direction == PortDirection::Input && cable_ids.len() == 1 {
            let cable = self
                .cables
                .get(&cable_ids[0])
                .ok_or(GraphError::CableNotFound(cable_ids[0]))?
                .clone();
            let behavior = Rc::clone(
                &self
                    .nodes
                    .get(&cable.source.node)
                    .ok_or(GraphError::NodeNotFound(cable.source.node))?
                    .behavior,
            );
            tracing::trace!(source = %cable.source, target = %port, "pull request");

            self.pulling.push(port.node);
            let outcome = behavior.request(
                &mut NodeScope::new(self, cable.source.node),
                &cable.source,
                port.node,
            );
            self.pulling.pop();
            outcome?;

            if let Some(value) = self.expect_port(port)?.value() {
                return Ok(value.clone());
            }
            // The upstream may carry an earlier cached value that never
            // traveled this cable.
            if let Some(value) = self.expect_port(&cable.source)?.value() {
                return Ok(value.clone());
            }
        }
        Ok(fallback)
    }

    /// Inspect a port's stored value without triggering a pull.
    pub fn peek(&self, port: &PortRef) -> Option<&Value> {
        self.nodes
            .get(&port.node)?
            .port(port.direction, &port.name)?
            .value()
    }

    // === Interface surface ===

    /// Emit an event on a node's interface. Handlers run synchronously
    /// in registration order; a handler error propagates to the caller.
    pub fn emit(
        &mut self,
        node: NodeId,
        topic: &str,
        data: &EventData,
    ) -> Result<(), GraphError> {
        let handlers = self
            .nodes
            .get(&node)
            .ok_or(GraphError::NodeNotFound(node))?
            .iface
            .handlers_for(topic);
        for handler in handlers {
            handler(&mut NodeScope::new(self, node), data)?;
        }
        Ok(())
    }

    /// Subscribe a handler to space-separated topics on a node's
    /// interface.
    pub fn on(
        &mut self,
        node: NodeId,
        topics: &str,
        handler: impl Fn(&mut NodeScope<'_>, &EventData) -> Result<(), GraphError> + 'static,
    ) -> Result<(), GraphError> {
        self.nodes
            .get_mut(&node)
            .ok_or(GraphError::NodeNotFound(node))?
            .iface
            .on(topics, handler);
        Ok(())
    }

    /// Invoke a named action: the interface's registered action if one
    /// exists, otherwise the behavior's `action` hook directly.
    pub fn call_action(
        &mut self,
        node: NodeId,
        name: &str,
        arg: impl Into<Value>,
    ) -> Result<(), GraphError> {
        let arg = arg.into();
        let slot = self
            .nodes
            .get(&node)
            .ok_or(GraphError::NodeNotFound(node))?;
        if let Some(action) = slot.iface.find_action(name) {
            return action(&mut NodeScope::new(self, node), arg);
        }
        let behavior = Rc::clone(&slot.behavior);
        behavior.action(&mut NodeScope::new(self, node), name, arg)
    }

    /// Read a bound interface field.
    pub fn data_get(&self, node: NodeId, field: &str) -> Result<Value, GraphError> {
        let binding = self
            .nodes
            .get(&node)
            .ok_or(GraphError::NodeNotFound(node))?
            .iface
            .binding(field)
            .ok_or_else(|| GraphError::UnknownDataField(field.to_string()))?;
        Ok((binding.get)())
    }

    /// Write a bound interface field through its setter, as a live edit.
    pub fn data_set(
        &mut self,
        node: NodeId,
        field: &str,
        value: impl Into<Value>,
    ) -> Result<(), GraphError> {
        let binding = self
            .nodes
            .get(&node)
            .ok_or(GraphError::NodeNotFound(node))?
            .iface
            .binding(field)
            .ok_or_else(|| GraphError::UnknownDataField(field.to_string()))?;
        (binding.set)(&mut NodeScope::new(self, node), value.into())
    }

    // === Internals ===

    pub(crate) fn set_importing(&mut self, node: NodeId, importing: bool) -> Result<(), GraphError> {
        self.nodes
            .get_mut(&node)
            .ok_or(GraphError::NodeNotFound(node))?
            .iface
            .set_importing(importing);
        Ok(())
    }

    pub(crate) fn node_mut(&mut self, node: NodeId) -> Result<&mut Node, GraphError> {
        self.nodes.get_mut(&node).ok_or(GraphError::NodeNotFound(node))
    }

    pub(crate) fn behavior_of(&self, node: NodeId) -> Result<Rc<dyn NodeBehavior>, GraphError> {
        Ok(Rc::clone(
            &self
                .nodes
                .get(&node)
                .ok_or(GraphError::NodeNotFound(node))?
                .behavior,
        ))
    }

    fn expect_port(&self, port: &PortRef) -> Result<&crate::port::Port, GraphError> {
        self.nodes
            .get(&port.node)
            .ok_or(GraphError::NodeNotFound(port.node))?
            .port(port.direction, &port.name)
            .ok_or_else(|| GraphError::UnknownPort {
                name: port.name.clone(),
                direction: port.direction,
            })
    }

    fn port_mut(&mut self, port: &PortRef) -> Result<&mut crate::port::Port, GraphError> {
        self.nodes
            .get_mut(&port.node)
            .ok_or(GraphError::NodeNotFound(port.node))?
            .port_mut(port.direction, &port.name)
            .ok_or_else(|| GraphError::UnknownPort {
                name: port.name.clone(),
                direction: port.direction,
            })
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

/// Hook-side handle on the engine, scoped to one node.
///
/// Every lifecycle hook, event handler, listener, action and binding
/// setter receives one of these; it exposes the owning node's ports,
/// interface and data, plus an escape hatch to the whole engine.
pub struct NodeScope<'a> {
    engine: &'a mut Engine,
    node: NodeId,
}

impl<'a> NodeScope<'a> {
    pub(crate) fn new(engine: &'a mut Engine, node: NodeId) -> Self {
        Self { engine, node }
    }

    /// The scoped node's ID.
    pub fn node_id(&self) -> NodeId {
        self.node
    }

    /// The scoped node's display title.
    pub fn title(&self) -> &str {
        self.engine
            .nodes
            .get(&self.node)
            .map_or("", |n| n.title.as_str())
    }

    /// Display title of any live node, for logging.
    pub fn node_title(&self, node: NodeId) -> Option<&str> {
        self.engine.nodes.get(&node).map(Node::title)
    }

    /// Read one of this node's input ports (pulling upstream on a miss).
    pub fn input(&mut self, name: &str) -> Result<Value, GraphError> {
        let port = PortRef::input(self.node, name);
        self.engine.read(&port)
    }

    /// Read one of this node's output ports.
    pub fn output(&mut self, name: &str) -> Result<Value, GraphError> {
        let port = PortRef::output(self.node, name);
        self.engine.read(&port)
    }

    /// Write one of this node's output ports, pushing downstream.
    pub fn write_output(
        &mut self,
        name: &str,
        value: impl Into<Value>,
    ) -> Result<(), GraphError> {
        let port = PortRef::output(self.node, name);
        self.engine.write(&port, value)
    }

    /// Subscribe a handler on this node's interface.
    pub fn on(
        &mut self,
        topics: &str,
        handler: impl Fn(&mut NodeScope<'_>, &EventData) -> Result<(), GraphError> + 'static,
    ) -> Result<(), GraphError> {
        self.engine.on(self.node, topics, handler)
    }

    /// Emit an event on this node's interface.
    pub fn emit(&mut self, topic: &str, data: &EventData) -> Result<(), GraphError> {
        self.engine.emit(self.node, topic, data)
    }

    /// True while the importer is replaying this node's persisted data.
    pub fn importing(&self) -> bool {
        self.engine
            .nodes
            .get(&self.node)
            .is_some_and(|n| n.iface.importing())
    }

    /// Read a bound interface field.
    pub fn data_get(&self, field: &str) -> Result<Value, GraphError> {
        self.engine.data_get(self.node, field)
    }

    /// Write a bound interface field through its setter.
    pub fn data_set(&mut self, field: &str, value: impl Into<Value>) -> Result<(), GraphError> {
        self.engine.data_set(self.node, field, value)
    }

    /// Dispatch a domain hook on this node's behavior by name.
    pub fn node_action(&mut self, name: &str, arg: impl Into<Value>) -> Result<(), GraphError> {
        let behavior = self.engine.behavior_of(self.node)?;
        behavior.action(&mut NodeScope::new(self.engine, self.node), name, arg.into())
    }

    /// The whole engine, for hooks that need to reach beyond their node.
    pub fn engine(&mut self) -> &mut Engine {
        self.engine
    }
}
