// SPDX-License-Identifier: MIT OR Apache-2.0
//! Demo driver for the patchbay graph runtime.
//!
//! Registers the sample node library, imports the reference graph
//! document, clicks the button (pulling both random sources through the
//! multiply), then live-edits the input box and watches the change
//! propagate into the logger.

use patchbay_graph::{Engine, GraphError};

/// Two Randoms feed a Multiply, whose Result feeds a Logger; a Button
/// triggers the Multiply and the Input's Changed re-seeds one Random.
const GRAPH_DOC: &str = r#"{"Example/Math/Random":[{"i":0,"x":298,"y":73,"outputs":{"Out":[{"i":2,"name":"A"}]}},{"i":1,"x":298,"y":239,"outputs":{"Out":[{"i":2,"name":"B"}]}}],"Example/Math/Multiply":[{"i":2,"x":525,"y":155,"outputs":{"Result":[{"i":3,"name":"Any"}]}}],"Example/Display/Logger":[{"i":3,"x":763,"y":169}],"Example/Button/Simple":[{"i":4,"x":41,"y":59,"outputs":{"Clicked":[{"i":2,"name":"Exec"}]}}],"Example/Input/Simple":[{"i":5,"x":38,"y":281,"data":{"value":"saved input"},"outputs":{"Changed":[{"i":1,"name":"Re-seed"}],"Value":[{"i":3,"name":"Any"}]}}]}"#;

fn run() -> Result<(), GraphError> {
    let mut engine = Engine::new();
    patchbay_nodes::register_all(&mut engine)?;
    engine.import_json(GRAPH_DOC)?;

    let button = engine.nodes_of_type("Example/Button/Simple")[0];
    let logger = engine.nodes_of_type("Example/Display/Logger")[0];
    let input = engine.nodes_of_type("Example/Input/Simple")[0];

    tracing::info!(">> clicking the button");
    engine.call_action(button, "clicked", "clicked")?;
    let log = engine.data_get(logger, "log")?;
    tracing::info!(%log, ">> logger output");

    tracing::info!(">> writing something to the input box");
    engine.data_set(input, "value", "hello wrold")?;
    let log = engine.data_get(logger, "log")?;
    tracing::info!(%log, ">> logger output");

    Ok(())
}

fn main() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    if let Err(err) = run() {
        tracing::error!(%err, "demo failed");
        std::process::exit(1);
    }
}
