// SPDX-License-Identifier: MIT OR Apache-2.0
//! Math nodes: `Example/Math/Multiply` and `Example/Math/Random`.

use std::cell::Cell;

use rand::Rng;

use patchbay_graph::{
    Cable, Engine, EventData, GraphError, NodeBehavior, NodeId, NodeScope, PortDef, PortRef,
    Value, ValueKind, CABLE_CONNECT,
};

/// Recomputes `Result = A * B` on every delivery, pulling unset inputs
/// from upstream.
struct Multiply;

impl Multiply {
    fn recompute(&self, node: &mut NodeScope<'_>) -> Result<(), GraphError> {
        let a = node.input("A")?.as_number().unwrap_or(0.0);
        let b = node.input("B")?.as_number().unwrap_or(0.0);
        tracing::debug!(a, b, "multiplying");
        node.write_output("Result", a * b)
    }
}

impl NodeBehavior for Multiply {
    fn init(&self, node: &mut NodeScope<'_>) -> Result<(), GraphError> {
        node.on(CABLE_CONNECT, |scope, data| {
            if let EventData::Cable(cable) = data {
                let source = scope
                    .node_title(cable.source.node)
                    .unwrap_or_default()
                    .to_string();
                let target = scope
                    .node_title(cable.target.node)
                    .unwrap_or_default()
                    .to_string();
                tracing::debug!(
                    "cable connected from {source} ({}) to {target} ({})",
                    cable.source.name,
                    cable.target.name
                );
            }
            Ok(())
        })
    }

    fn update(&self, node: &mut NodeScope<'_>, _cable: &Cable) -> Result<(), GraphError> {
        self.recompute(node)
    }
}

/// Produces a random integer on demand, at most once; `Re-seed` forces a
/// fresh value.
struct Random {
    seeded: Cell<bool>,
}

impl Random {
    fn reseed(&self, node: &mut NodeScope<'_>) -> Result<(), GraphError> {
        self.seeded.set(true);
        let value = rand::rng().random_range(0..=100);
        node.write_output("Out", f64::from(value))
    }
}

impl NodeBehavior for Random {
    fn update(&self, node: &mut NodeScope<'_>, _cable: &Cable) -> Result<(), GraphError> {
        // Only input is the Re-seed trigger.
        self.reseed(node)
    }

    fn request(
        &self,
        node: &mut NodeScope<'_>,
        port: &PortRef,
        requester: NodeId,
    ) -> Result<bool, GraphError> {
        if self.seeded.get() {
            return Ok(false);
        }
        let from = node.node_title(requester).unwrap_or_default().to_string();
        tracing::debug!(port = %port.name, %from, "value requested");
        self.reseed(node)?;
        Ok(true)
    }
}

/// Register the math node types.
pub fn register(engine: &mut Engine) -> Result<(), GraphError> {
    engine.register_node("Example/Math/Multiply", |node| {
        node.title("Multiply");
        node.input("Exec", ValueKind::Trigger);
        node.input("A", ValueKind::Number);
        node.input(
            "B",
            PortDef::new(ValueKind::Number).with_validator(|value| {
                // Coerce whatever arrives into a number.
                tracing::debug!(value = %value, "port B got input");
                Ok(Value::Number(value.as_number().unwrap_or(0.0)))
            }),
        );
        node.output("Result", ValueKind::Number);
        node.behavior(Multiply);
    })?;

    engine.register_node("Example/Math/Random", |node| {
        node.title("Random");
        node.input("Re-seed", ValueKind::Trigger);
        node.output("Out", ValueKind::Number);
        node.behavior(Random {
            seeded: Cell::new(false),
        });
    })?;
    Ok(())
}
