// SPDX-License-Identifier: MIT OR Apache-2.0
//! Interfaces: the presentation-facing facade bound 1:1 to a node.
//!
//! An interface owns an event emitter (topic -> ordered handler list), a
//! binding table of named get/set accessors, and named actions callable
//! from host code. The importer flips the `importing` flag around data
//! replay so setters can tell "restoring saved state" from "live edit".

use std::rc::Rc;

use indexmap::IndexMap;

use crate::cable::Cable;
use crate::engine::NodeScope;
use crate::error::GraphError;
use crate::types::Value;

/// Payload handed to event handlers.
#[derive(Debug, Clone)]
pub enum EventData {
    /// No payload
    None,
    /// A cable, for `cable.connect` / `cable.disconnect`
    Cable(Cable),
    /// An arbitrary value
    Value(Value),
}

/// Event handler: invoked synchronously, in registration order.
pub type EventHandler = Rc<dyn Fn(&mut NodeScope<'_>, &EventData) -> Result<(), GraphError>>;

/// Action invoked by host code through [`crate::Engine::call_action`].
pub type Action = Rc<dyn Fn(&mut NodeScope<'_>, Value) -> Result<(), GraphError>>;

/// Getter half of a binding.
pub type BindingGet = Rc<dyn Fn() -> Value>;

/// Setter half of a binding.
pub type BindingSet = Rc<dyn Fn(&mut NodeScope<'_>, Value) -> Result<(), GraphError>>;

/// A named accessor pair registered on an interface.
///
/// Persisted bindings form the node's `data` table: the importer replays
/// them from the document and the exporter reads them back. Transient
/// bindings are live get/set only.
#[derive(Clone)]
pub struct Binding {
    pub(crate) get: BindingGet,
    pub(crate) set: BindingSet,
    pub(crate) persisted: bool,
}

/// Builder handed to an interface factory.
pub struct InterfaceBuilder {
    pub(crate) bindings: IndexMap<String, Binding>,
    pub(crate) actions: IndexMap<String, Action>,
}

impl InterfaceBuilder {
    pub(crate) fn new() -> Self {
        Self {
            bindings: IndexMap::new(),
            actions: IndexMap::new(),
        }
    }

    /// Register a transient accessor: live get/set, never persisted.
    pub fn bind(
        &mut self,
        name: impl Into<String>,
        get: impl Fn() -> Value + 'static,
        set: impl Fn(&mut NodeScope<'_>, Value) -> Result<(), GraphError> + 'static,
    ) -> &mut Self {
        self.bindings.insert(
            name.into(),
            Binding {
                get: Rc::new(get),
                set: Rc::new(set),
                persisted: false,
            },
        );
        self
    }

    /// Register a persisted data accessor, replayed on import and read
    /// back on export.
    pub fn bind_data(
        &mut self,
        name: impl Into<String>,
        get: impl Fn() -> Value + 'static,
        set: impl Fn(&mut NodeScope<'_>, Value) -> Result<(), GraphError> + 'static,
    ) -> &mut Self {
        self.bindings.insert(
            name.into(),
            Binding {
                get: Rc::new(get),
                set: Rc::new(set),
                persisted: true,
            },
        );
        self
    }

    /// Register a named action callable from host code.
    pub fn action(
        &mut self,
        name: impl Into<String>,
        action: impl Fn(&mut NodeScope<'_>, Value) -> Result<(), GraphError> + 'static,
    ) -> &mut Self {
        self.actions.insert(name.into(), Rc::new(action));
        self
    }
}

/// The presentation facade of a node.
pub struct Interface {
    iface_type: Option<String>,
    handlers: IndexMap<String, Vec<EventHandler>>,
    bindings: IndexMap<String, Binding>,
    actions: IndexMap<String, Action>,
    importing: bool,
}

impl Interface {
    pub(crate) fn new(iface_type: Option<String>) -> Self {
        Self {
            iface_type,
            handlers: IndexMap::new(),
            bindings: IndexMap::new(),
            actions: IndexMap::new(),
            importing: false,
        }
    }

    pub(crate) fn install(&mut self, builder: InterfaceBuilder) {
        self.bindings = builder.bindings;
        self.actions = builder.actions;
    }

    /// The registered interface type key, if the node declared one.
    pub fn iface_type(&self) -> Option<&str> {
        self.iface_type.as_deref()
    }

    /// True while the importer is replaying persisted data into this
    /// interface.
    pub fn importing(&self) -> bool {
        self.importing
    }

    pub(crate) fn set_importing(&mut self, importing: bool) {
        self.importing = importing;
    }

    /// Subscribe a handler to one or more space-separated topics. Each
    /// topic keeps its own ordered handler list.
    pub fn on(
        &mut self,
        topics: &str,
        handler: impl Fn(&mut NodeScope<'_>, &EventData) -> Result<(), GraphError> + 'static,
    ) {
        let handler: EventHandler = Rc::new(handler);
        for topic in topics.split_whitespace() {
            self.handlers
                .entry(topic.to_string())
                .or_default()
                .push(Rc::clone(&handler));
        }
    }

    /// Handlers registered for a topic, in registration order.
    pub(crate) fn handlers_for(&self, topic: &str) -> Vec<EventHandler> {
        self.handlers.get(topic).cloned().unwrap_or_default()
    }

    pub(crate) fn binding(&self, name: &str) -> Option<Binding> {
        self.bindings.get(name).cloned()
    }

    /// Names of persisted data fields, in registration order.
    pub fn data_fields(&self) -> impl Iterator<Item = &str> {
        self.bindings
            .iter()
            .filter(|(_, b)| b.persisted)
            .map(|(name, _)| name.as_str())
    }

    pub(crate) fn find_action(&self, name: &str) -> Option<Action> {
        self.actions.get(name).cloned()
    }
}

impl std::fmt::Debug for Interface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interface")
            .field("iface_type", &self.iface_type)
            .field("topics", &self.handlers.keys().collect::<Vec<_>>())
            .field("bindings", &self.bindings.keys().collect::<Vec<_>>())
            .field("importing", &self.importing)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_on_splits_topics() {
        let mut iface = Interface::new(None);
        iface.on("cable.connect cable.disconnect", |_, _| Ok(()));
        assert_eq!(iface.handlers_for("cable.connect").len(), 1);
        assert_eq!(iface.handlers_for("cable.disconnect").len(), 1);
        assert!(iface.handlers_for("other").is_empty());
    }

    #[test]
    fn test_data_fields_skip_transient_bindings() {
        let mut builder = InterfaceBuilder::new();
        builder.bind("log", || Value::Null, |_, _| Ok(()));
        builder.bind_data("value", || Value::Null, |_, _| Ok(()));
        let mut iface = Interface::new(Some("i-test".into()));
        iface.install(builder);
        let fields: Vec<_> = iface.data_fields().collect();
        assert_eq!(fields, ["value"]);
    }
}
