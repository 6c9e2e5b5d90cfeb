// SPDX-License-Identifier: MIT OR Apache-2.0
//! Ports: named, typed value cells on a node.
//!
//! A [`PortDef`] is the declaration a node factory hands to the builder;
//! a [`Port`] is the live cell instantiated from it, holding the current
//! value and the adjacency list of cables in creation order.

use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::cable::CableId;
use crate::engine::NodeScope;
use crate::error::GraphError;
use crate::node::NodeId;
use crate::types::{Value, ValueKind};

/// Port direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PortDirection {
    /// Input port (cable target)
    Input,
    /// Output port (cable source)
    Output,
}

/// Transform applied to every value written to a port, after the kind
/// check and before storage.
pub type Validator = Rc<dyn Fn(Value) -> Result<Value, GraphError>>;

/// Side-effect callback invoked for every value delivered to a port via a
/// cable. Receives the owning node's scope, the source port and the value.
pub type Listener = Rc<dyn Fn(&mut NodeScope<'_>, &PortRef, &Value) -> Result<(), GraphError>>;

/// Declaration of a port, produced by a node factory.
#[derive(Clone)]
pub struct PortDef {
    kind: ValueKind,
    default: Option<Value>,
    validator: Option<Validator>,
    listener: Option<Listener>,
}

impl PortDef {
    /// Declare a plain port of the given kind.
    pub fn new(kind: ValueKind) -> Self {
        Self {
            kind,
            default: None,
            validator: None,
            listener: None,
        }
    }

    /// Declare a listener port: kind `Any`, with a callback observing
    /// every cable delivery in addition to normal storage.
    pub fn listener(
        callback: impl Fn(&mut NodeScope<'_>, &PortRef, &Value) -> Result<(), GraphError> + 'static,
    ) -> Self {
        Self::new(ValueKind::Any).with_listener(callback)
    }

    /// Set a literal default, returned by reads before the first write.
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Attach a validating transform run on every write.
    pub fn with_validator(
        mut self,
        transform: impl Fn(Value) -> Result<Value, GraphError> + 'static,
    ) -> Self {
        self.validator = Some(Rc::new(transform));
        self
    }

    /// Attach a delivery listener.
    pub fn with_listener(
        mut self,
        callback: impl Fn(&mut NodeScope<'_>, &PortRef, &Value) -> Result<(), GraphError> + 'static,
    ) -> Self {
        self.listener = Some(Rc::new(callback));
        self
    }
}

impl From<ValueKind> for PortDef {
    fn from(kind: ValueKind) -> Self {
        Self::new(kind)
    }
}

/// A live port on a node.
pub struct Port {
    name: String,
    direction: PortDirection,
    kind: ValueKind,
    default: Option<Value>,
    value: Option<Value>,
    validator: Option<Validator>,
    listener: Option<Listener>,
    cables: Vec<CableId>,
}

impl Port {
    pub(crate) fn from_def(name: String, direction: PortDirection, def: PortDef) -> Self {
        Self {
            name,
            direction,
            kind: def.kind,
            default: def.default,
            value: None,
            validator: def.validator,
            listener: def.listener,
            cables: Vec::new(),
        }
    }

    /// Port name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Port direction.
    pub fn direction(&self) -> PortDirection {
        self.direction
    }

    /// Declared value kind.
    pub fn kind(&self) -> &ValueKind {
        &self.kind
    }

    /// Current stored value, if any.
    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    /// The value a read returns when nothing is stored: the literal
    /// default if declared, otherwise the kind's zero value.
    pub fn fallback(&self) -> Value {
        self.default.clone().unwrap_or_else(|| self.kind.zero())
    }

    /// Cables attached to this port, in creation order.
    pub fn cables(&self) -> &[CableId] {
        &self.cables
    }

    pub(crate) fn validator(&self) -> Option<Validator> {
        self.validator.clone()
    }

    pub(crate) fn listener(&self) -> Option<Listener> {
        self.listener.clone()
    }

    /// Kind-check and transform a value, returning what should be stored.
    pub(crate) fn admit(&self, value: Value) -> Result<Value, GraphError> {
        if !self.kind.accepts(&value) {
            return Err(GraphError::TypeMismatch {
                port: self.name.clone(),
                expected: self.kind.clone(),
                got: value.kind_name(),
            });
        }
        match self.validator.clone() {
            Some(transform) => transform(value),
            None => Ok(value),
        }
    }

    pub(crate) fn store(&mut self, value: Value) {
        self.value = Some(value);
    }

    pub(crate) fn attach(&mut self, cable: CableId) {
        self.cables.push(cable);
    }

    pub(crate) fn detach(&mut self, cable: CableId) {
        self.cables.retain(|id| *id != cable);
    }
}

impl std::fmt::Debug for Port {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Port")
            .field("name", &self.name)
            .field("direction", &self.direction)
            .field("kind", &self.kind)
            .field("value", &self.value)
            .field("cables", &self.cables.len())
            .finish_non_exhaustive()
    }
}

/// Address of a port: owning node, side and name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PortRef {
    /// Owning node
    pub node: NodeId,
    /// Side of the node
    pub direction: PortDirection,
    /// Port name
    pub name: String,
}

impl PortRef {
    /// Address an input port.
    pub fn input(node: NodeId, name: impl Into<String>) -> Self {
        Self {
            node,
            direction: PortDirection::Input,
            name: name.into(),
        }
    }

    /// Address an output port.
    pub fn output(node: NodeId, name: impl Into<String>) -> Self {
        Self {
            node,
            direction: PortDirection::Output,
            name: name.into(),
        }
    }
}

impl std::fmt::Display for PortRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.node, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_prefers_literal_default() {
        let def = PortDef::new(ValueKind::String).with_default("wer");
        let port = Port::from_def("Value".into(), PortDirection::Output, def);
        assert_eq!(port.fallback(), Value::string("wer"));

        let plain = Port::from_def(
            "Out".into(),
            PortDirection::Output,
            PortDef::new(ValueKind::Number),
        );
        assert_eq!(plain.fallback(), Value::Number(0.0));
    }

    #[test]
    fn test_admit_kind_check() {
        let port = Port::from_def(
            "A".into(),
            PortDirection::Input,
            PortDef::new(ValueKind::Number),
        );
        assert!(port.admit(Value::Number(3.0)).is_ok());
        assert!(matches!(
            port.admit(Value::string("x")),
            Err(GraphError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_admit_runs_validator() {
        let def = PortDef::new(ValueKind::Any)
            .with_validator(|v| Ok(Value::Number(v.as_number().unwrap_or(0.0) + 1.0)));
        let port = Port::from_def("B".into(), PortDirection::Input, def);
        assert_eq!(port.admit(Value::Number(2.0)).unwrap(), Value::Number(3.0));
    }
}
