// SPDX-License-Identifier: MIT OR Apache-2.0
//! Sample node and interface library for the patchbay graph runtime.
//!
//! These are plugins built *on top of* the runtime, not part of it:
//! - Math: `Example/Math/Multiply`, `Example/Math/Random`
//! - Display: `Example/Display/Logger` (listener-based fan-in)
//! - Control: `Example/Button/Simple`, `Example/Input/Simple`
//!
//! The node type keys follow the runtime's namespacing convention
//! (`Library/Feature/Name`), so the reference graph document imports
//! unchanged.

pub mod control;
pub mod display;
pub mod math;

use patchbay_graph::{Engine, GraphError};

/// Register every sample node and interface type on an engine.
pub fn register_all(engine: &mut Engine) -> Result<(), GraphError> {
    math::register(engine)?;
    display::register(engine)?;
    control::register(engine)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use patchbay_graph::{Engine, PortRef, Value};

    /// The reference graph: two Randoms feeding a Multiply, the Multiply
    /// and an Input feeding a Logger, a Button wired to Exec, and the
    /// Input's Changed wired to the second Random's Re-seed.
    const DOC: &str = r#"{"Example/Math/Random":[{"i":0,"x":298,"y":73,"outputs":{"Out":[{"i":2,"name":"A"}]}},{"i":1,"x":298,"y":239,"outputs":{"Out":[{"i":2,"name":"B"}]}}],"Example/Math/Multiply":[{"i":2,"x":525,"y":155,"outputs":{"Result":[{"i":3,"name":"Any"}]}}],"Example/Display/Logger":[{"i":3,"x":763,"y":169}],"Example/Button/Simple":[{"i":4,"x":41,"y":59,"outputs":{"Clicked":[{"i":2,"name":"Exec"}]}}],"Example/Input/Simple":[{"i":5,"x":38,"y":281,"data":{"value":"saved input"},"outputs":{"Changed":[{"i":1,"name":"Re-seed"}],"Value":[{"i":3,"name":"Any"}]}}]}"#;

    struct Rig {
        engine: Engine,
        multiply: patchbay_graph::NodeId,
        random_a: patchbay_graph::NodeId,
        random_b: patchbay_graph::NodeId,
        logger: patchbay_graph::NodeId,
        button: patchbay_graph::NodeId,
        input: patchbay_graph::NodeId,
    }

    fn import_rig() -> Rig {
        let mut engine = Engine::new();
        register_all(&mut engine).unwrap();
        engine.import_json(DOC).unwrap();
        Rig {
            multiply: engine.nodes_of_type("Example/Math/Multiply")[0],
            random_a: engine.nodes_of_type("Example/Math/Random")[0],
            random_b: engine.nodes_of_type("Example/Math/Random")[1],
            logger: engine.nodes_of_type("Example/Display/Logger")[0],
            button: engine.nodes_of_type("Example/Button/Simple")[0],
            input: engine.nodes_of_type("Example/Input/Simple")[0],
            engine,
        }
    }

    fn number(value: Option<&Value>) -> f64 {
        value.and_then(Value::as_number).expect("expected a number")
    }

    #[test]
    fn test_import_reference_document() {
        let rig = import_rig();
        assert_eq!(rig.engine.node_count(), 6);
        assert_eq!(rig.engine.cables().count(), 6);
        // Nothing has executed yet: the randoms are unseeded and the
        // logger never saw a delivery.
        assert_eq!(rig.engine.peek(&PortRef::output(rig.random_a, "Out")), None);
        assert_eq!(rig.engine.peek(&PortRef::output(rig.random_b, "Out")), None);
        assert_eq!(
            rig.engine.data_get(rig.logger, "log").unwrap(),
            Value::string("...")
        );
    }

    #[test]
    fn test_button_click_multiplies_pulled_randoms() {
        let mut rig = import_rig();
        rig.engine
            .call_action(rig.button, "clicked", "clicked")
            .unwrap();

        // Both randoms were pulled exactly once and their values were
        // delivered into the multiply inputs.
        let a = number(rig.engine.peek(&PortRef::output(rig.random_a, "Out")));
        let b = number(rig.engine.peek(&PortRef::output(rig.random_b, "Out")));
        assert_eq!(
            number(rig.engine.peek(&PortRef::input(rig.multiply, "A"))),
            a
        );
        assert_eq!(
            number(rig.engine.peek(&PortRef::input(rig.multiply, "B"))),
            b
        );

        let result = number(rig.engine.peek(&PortRef::output(rig.multiply, "Result")));
        assert_eq!(result, a * b);

        // Exactly one delivery reached the logger.
        assert_eq!(
            rig.engine.data_get(rig.logger, "log").unwrap(),
            Value::string(Value::Number(result).to_string())
        );
    }

    #[test]
    fn test_second_click_reuses_memoized_randoms() {
        let mut rig = import_rig();
        rig.engine
            .call_action(rig.button, "clicked", "clicked")
            .unwrap();
        let a = number(rig.engine.peek(&PortRef::output(rig.random_a, "Out")));
        let b = number(rig.engine.peek(&PortRef::output(rig.random_b, "Out")));

        rig.engine
            .call_action(rig.button, "clicked", "clicked")
            .unwrap();
        // The randoms refused to recompute, so the same values flow.
        assert_eq!(
            number(rig.engine.peek(&PortRef::output(rig.random_a, "Out"))),
            a
        );
        assert_eq!(
            number(rig.engine.peek(&PortRef::output(rig.random_b, "Out"))),
            b
        );
        assert_eq!(
            number(rig.engine.peek(&PortRef::output(rig.multiply, "Result"))),
            a * b
        );
    }

    #[test]
    fn test_memoized_pull_returns_identical_values() {
        let mut rig = import_rig();
        let input_a = PortRef::input(rig.multiply, "A");
        let first = rig.engine.read(&input_a).unwrap();
        let second = rig.engine.read(&input_a).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            rig.engine.peek(&PortRef::output(rig.random_a, "Out")),
            Some(&first)
        );
    }

    #[test]
    fn test_import_restores_data_without_firing_changed() {
        let rig = import_rig();
        assert_eq!(
            rig.engine.data_get(rig.input, "value").unwrap(),
            Value::string("saved input")
        );
        // imported() projected the saved data onto the Value output...
        assert_eq!(
            rig.engine.peek(&PortRef::output(rig.input, "Value")),
            Some(&Value::string("saved input"))
        );
        // ...but Changed never fired: the wired Re-seed stayed silent.
        assert_eq!(rig.engine.peek(&PortRef::output(rig.random_b, "Out")), None);
    }

    #[test]
    fn test_live_edit_pushes_value_and_fires_changed() {
        let mut rig = import_rig();
        rig.engine
            .data_set(rig.input, "value", "hello wrold")
            .unwrap();

        assert_eq!(
            rig.engine.peek(&PortRef::output(rig.input, "Value")),
            Some(&Value::string("hello wrold"))
        );
        // Changed re-seeded the second random, which recomputed the
        // multiply through its B input.
        let b = number(rig.engine.peek(&PortRef::output(rig.random_b, "Out")));
        let a = number(rig.engine.peek(&PortRef::output(rig.random_a, "Out")));
        assert_eq!(
            number(rig.engine.peek(&PortRef::output(rig.multiply, "Result"))),
            a * b
        );
    }

    #[test]
    fn test_logger_aggregates_both_producers() {
        let mut rig = import_rig();
        rig.engine
            .call_action(rig.button, "clicked", "clicked")
            .unwrap();
        rig.engine
            .data_set(rig.input, "value", "hello wrold")
            .unwrap();

        // The logger reflects every producer feeding Any, not just the
        // most recent delivery.
        let result = number(rig.engine.peek(&PortRef::output(rig.multiply, "Result")));
        let log = rig.engine.data_get(rig.logger, "log").unwrap();
        let expected = format!("[{}, hello wrold]", Value::Number(result));
        assert_eq!(log, Value::string(expected));
    }

    #[test]
    fn test_reference_document_round_trips() {
        let rig = import_rig();
        let exported = rig.engine.export_doc().unwrap();

        let mut pairs: Vec<(String, u32)> = exported
            .iter()
            .flat_map(|(key, specs)| specs.iter().map(move |s| (key.clone(), s.i)))
            .collect();
        pairs.sort();
        assert_eq!(
            pairs,
            vec![
                ("Example/Button/Simple".to_string(), 4),
                ("Example/Display/Logger".to_string(), 3),
                ("Example/Input/Simple".to_string(), 5),
                ("Example/Math/Multiply".to_string(), 2),
                ("Example/Math/Random".to_string(), 0),
                ("Example/Math/Random".to_string(), 1),
            ]
        );

        let input = &exported["Example/Input/Simple"][0];
        assert_eq!(input.data["value"], serde_json::json!("saved input"));
        assert_eq!(input.outputs["Changed"][0].i, 1);
        assert_eq!(input.outputs["Changed"][0].name, "Re-seed");
        assert_eq!(input.outputs["Value"][0].i, 3);

        let total_cables: usize = exported
            .values()
            .flatten()
            .flat_map(|s| s.outputs.values())
            .map(Vec::len)
            .sum();
        assert_eq!(total_cables, 6);
    }
}
