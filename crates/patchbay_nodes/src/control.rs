// SPDX-License-Identifier: MIT OR Apache-2.0
//! Control nodes: `Example/Button/Simple` and `Example/Input/Simple`.

use std::cell::RefCell;
use std::rc::Rc;

use patchbay_graph::{
    Engine, GraphError, NodeBehavior, NodeScope, PortDef, Value, ValueKind,
};

/// Forwards click events to the `Clicked` trigger output.
struct Button;

impl NodeBehavior for Button {
    fn action(&self, node: &mut NodeScope<'_>, name: &str, arg: Value) -> Result<(), GraphError> {
        if name == "clicked" {
            tracing::debug!(event = %arg, "button forwarding click downstream");
            node.write_output("Clicked", arg)?;
        }
        Ok(())
    }
}

/// A text box: live edits push `Value` and fire `Changed`; restored
/// data only projects `Value`.
struct TextInput;

impl NodeBehavior for TextInput {
    fn imported(&self, node: &mut NodeScope<'_>) -> Result<(), GraphError> {
        let value = node.data_get("value")?;
        if !value.is_null() {
            tracing::debug!(value = %value, "restoring saved input data to output");
        }
        node.write_output("Value", value)
    }

    fn action(&self, node: &mut NodeScope<'_>, name: &str, arg: Value) -> Result<(), GraphError> {
        if name != "changed" {
            return Ok(());
        }
        // Restores replay through the same setter; only live edits
        // propagate.
        if node.importing() {
            return Ok(());
        }
        tracing::debug!(text = %arg, "input box has a new value");
        node.write_output("Value", arg)?;
        node.write_output("Changed", Value::Null)
    }
}

/// Register the control node and interface types.
pub fn register(engine: &mut Engine) -> Result<(), GraphError> {
    engine.register_interface("i-button", |iface| {
        iface.action("clicked", |scope, event| {
            tracing::info!("trigger button clicked, running the handler");
            scope.node_action("clicked", event)
        });
    })?;

    engine.register_interface("i-input", |iface| {
        let state = Rc::new(RefCell::new(Value::string("")));
        let get_state = Rc::clone(&state);
        iface.bind_data(
            "value",
            move || get_state.borrow().clone(),
            move |scope, value| {
                *state.borrow_mut() = value.clone();
                scope.node_action("changed", value)
            },
        );
    })?;

    engine.register_node("Example/Button/Simple", |node| {
        node.title("Button");
        node.interface("i-button");
        node.output("Clicked", ValueKind::Trigger);
        node.behavior(Button);
    })?;

    engine.register_node("Example/Input/Simple", |node| {
        node.title("Input");
        node.interface("i-input");
        node.output("Changed", ValueKind::Trigger);
        node.output("Value", PortDef::new(ValueKind::String).with_default(""));
        node.behavior(TextInput);
    })?;
    Ok(())
}
