// SPDX-License-Identifier: MIT OR Apache-2.0
//! Display nodes: `Example/Display/Logger`.
//!
//! The logger's `Any` input is a listener port: it aggregates every
//! value delivered by every connected producer, keyed by source port,
//! instead of reflecting only the most recent delivery.

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;

use patchbay_graph::{
    Engine, EventData, GraphError, NodeBehavior, NodeScope, PortDef, PortRef, Value,
    CABLE_DISCONNECT,
};

type Seen = Rc<RefCell<IndexMap<String, Value>>>;

fn source_key(port: &PortRef) -> String {
    port.to_string()
}

fn refresh(seen: &Seen, scope: &mut NodeScope<'_>) -> Result<(), GraphError> {
    let text = {
        let entries = seen.borrow();
        match entries.len() {
            0 => "...".to_string(),
            1 => entries[0].to_string(),
            _ => {
                let joined = entries
                    .values()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("[{joined}]")
            }
        }
    };
    scope.data_set("log", text)
}

struct Logger {
    seen: Seen,
}

impl NodeBehavior for Logger {
    fn init(&self, node: &mut NodeScope<'_>) -> Result<(), GraphError> {
        // Drop a departing producer's entry, then refresh on any cable
        // change; registration order keeps the removal first.
        let seen = Rc::clone(&self.seen);
        node.on(CABLE_DISCONNECT, move |_, data| {
            if let EventData::Cable(cable) = data {
                seen.borrow_mut().shift_remove(&source_key(&cable.source));
            }
            Ok(())
        })?;
        let seen = Rc::clone(&self.seen);
        node.on("cable.connect cable.disconnect", move |scope, _| {
            tracing::debug!("a cable changed on the logger, refreshing");
            refresh(&seen, scope)
        })
    }
}

/// Register the display node and interface types.
pub fn register(engine: &mut Engine) -> Result<(), GraphError> {
    engine.register_interface("i-logger", |iface| {
        let state = Rc::new(RefCell::new(Value::string("...")));
        let get_state = Rc::clone(&state);
        iface.bind(
            "log",
            move || get_state.borrow().clone(),
            move |_, value| {
                tracing::info!(log = %value, "logger");
                *state.borrow_mut() = value;
                Ok(())
            },
        );
    })?;

    engine.register_node("Example/Display/Logger", |node| {
        node.title("Logger");
        node.interface("i-logger");
        let seen: Seen = Rc::default();
        let listener_seen = Rc::clone(&seen);
        node.input(
            "Any",
            PortDef::listener(move |scope, source, value| {
                tracing::debug!(source = %source, value = %value, "logger got a delivery");
                listener_seen
                    .borrow_mut()
                    .insert(source_key(source), value.clone());
                refresh(&listener_seen, scope)
            }),
        );
        node.behavior(Logger { seen });
    })
}
