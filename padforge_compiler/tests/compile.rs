//! End-to-end compiles: source document in, VDF out.

use padforge_compiler::config::ControllerConfig;
use padforge_compiler::export::Exporter;
use padforge_compiler::maker::Maker;
use padforge_compiler::source::Node;
use padforge_compiler::vdf::{self, Value};

fn parse(src: &str) -> Node {
    serde_yaml::from_str(src).unwrap()
}

fn table<'a>(doc: &'a vdf::Document, key: &str) -> &'a vdf::Document {
    doc.get(key)
        .and_then(Value::as_table)
        .unwrap_or_else(|| panic!("missing table '{}'", key))
}

fn scalar<'a>(doc: &'a vdf::Document, key: &str) -> &'a str {
    doc.get(key)
        .and_then(Value::as_str)
        .unwrap_or_else(|| panic!("missing scalar '{}'", key))
}

/// Bindings of one input, as text, via the nested activator tables.
fn bindings_of(group: &vdf::Document, input: &str, signal: &str) -> Vec<String> {
    let inputs = table(group, "inputs");
    let activators = table(table(inputs, input), "activators");
    let bindings = table(table(activators, signal), "bindings");
    bindings
        .get_all("binding")
        .unwrap_or(&[])
        .iter()
        .filter_map(Value::as_str)
        .map(str::to_owned)
        .collect()
}

const SHIFTED_SOURCE: &str = r#"
name: Shifted sample
revision: 2
author: someone
action:
  - name: Default
    layer:
      - name: Default
        DP.u: (DUP)
        DP.d: (DDN)
      - name: L2
        BQ.s: <1>
        BQ.e: <2>
    shiftmap:
      shifter:
        LB: hold 1
      overlay:
        1: [L2]
"#;

#[test]
fn shifted_document_compiles_and_round_trips() {
    let mut exporter = Exporter::new();
    let config = exporter.export_config(&parse(SHIFTED_SOURCE)).unwrap();
    let doc = config.encode_kv();

    // The emitted stream parses back to an equal document.
    let text = vdf::dumps(&doc);
    assert_eq!(vdf::loads(&text).unwrap(), doc);

    let mapping = table(&doc, "controller_mappings");
    assert_eq!(scalar(mapping, "title"), "Shifted sample");
    assert_eq!(scalar(mapping, "revision"), "2");
    assert_eq!(scalar(mapping, "creator"), "someone");

    // Layers: Default (set), then L2 and Shift_1 (layers).
    let actions = table(mapping, "actions");
    assert!(actions.contains_key("Default"));
    let layers = table(mapping, "action_layers");
    assert_eq!(layers.len(), 2);
    assert!(layers.contains_key("Preset_1000001"));
    assert!(layers.contains_key("Preset_1000002"));
    assert_eq!(
        scalar(table(layers, "Preset_1000002"), "parent_set_name"),
        "Default"
    );

    // One preset per layer, repeated keys in id order.
    let presets = mapping.get_all("preset").unwrap();
    assert_eq!(presets.len(), 3);
    for (n, preset) in presets.iter().enumerate() {
        let preset = preset.as_table().unwrap();
        assert_eq!(scalar(preset, "id"), n.to_string());
    }

    // The base switches group holds the press transition: apply the
    // stable shift (layer id 3), then the overlay (layer id 2).
    let groups = mapping.get_all("group").unwrap();
    let base_switches = groups
        .iter()
        .filter_map(Value::as_table)
        .find(|g| {
            g.get("mode").and_then(Value::as_str) == Some("switches")
                && scalar(g, "id").parse::<i64>().unwrap_or(i64::MAX) < 2
        })
        .expect("base switches group");
    let press = bindings_of(base_switches, "left_bumper", "Start_Press");
    assert_eq!(
        press,
        vec![
            "controller_action add_layer 3 0 0, goto 1",
            "controller_action add_layer 2 0 0, goto 1",
        ]
    );

    // The stable shift layer's switches group peels in reverse.
    let shift_switches = groups
        .iter()
        .filter_map(Value::as_table)
        .filter(|g| g.get("mode").and_then(Value::as_str) == Some("switches"))
        .last()
        .expect("shift switches group");
    let release = bindings_of(shift_switches, "left_bumper", "release");
    assert_eq!(
        release,
        vec![
            "controller_action remove_layer 2 0 0, goto 0",
            "controller_action remove_layer 3 0 0, goto 0",
        ]
    );
}

const MODESHIFT_SOURCE: &str = r#"
action:
  - name: Default
    layer:
      - name: Default
        BQ:
          n: <Y>
          e: <B>
          w: <X>
          s: <A>
        BQ&LB:
          "01": <1>
          "02": <2>
"#;

#[test]
fn mode_shift_emits_gated_group_and_marked_binding() {
    let mut exporter = Exporter::new();
    let config = exporter.export_config(&parse(MODESHIFT_SOURCE)).unwrap();
    let doc = config.encode_kv();
    let mapping = table(&doc, "controller_mappings");

    let preset = mapping.get("preset").and_then(Value::as_table).unwrap();
    let gsb = table(preset, "group_source_bindings");
    let marked: Vec<&str> = gsb
        .iter()
        .filter_map(|(_, v)| v.as_str())
        .filter(|v| v.ends_with("modeshift"))
        .collect();
    assert_eq!(marked, vec!["button_diamond active modeshift"]);

    // The gate binding names the gated group's id.
    let groups = mapping.get_all("group").unwrap();
    let gated_id = gsb
        .iter()
        .find(|(_, v)| v.as_str() == Some("button_diamond active modeshift"))
        .map(|(k, _)| k.to_owned())
        .unwrap();
    let switches = groups
        .iter()
        .filter_map(Value::as_table)
        .find(|g| g.get("mode").and_then(Value::as_str) == Some("switches"))
        .unwrap();
    let gate = bindings_of(switches, "left_bumper", "Full_Press");
    assert_eq!(gate, vec![format!("mode_shift button_diamond {}", gated_id)]);
}

const MAKER_SOURCE: &str = r#"
name: Maker sample
aliases:
  Jump: (B)
actions:
  - name: Default
    layers:
      - name: Base
        BQ.s: $Jump
        LT: (LT)
        LB: "+<Up> -<Down>"
"#;

#[test]
fn maker_document_compiles() {
    let maker = Maker::load(&parse(MAKER_SOURCE)).unwrap();
    let doc = maker.export_config().unwrap().encode_kv();
    let mapping = table(&doc, "controller_mappings");
    assert_eq!(scalar(mapping, "title"), "Maker sample");

    let groups = mapping.get_all("group").unwrap();
    assert_eq!(groups.len(), 3);

    let switches = groups
        .iter()
        .filter_map(Value::as_table)
        .find(|g| g.get("mode").and_then(Value::as_str) == Some("switches"))
        .unwrap();
    assert_eq!(
        bindings_of(switches, "left_bumper", "Start_Press"),
        vec!["key_press Up"]
    );
    assert_eq!(
        bindings_of(switches, "left_bumper", "release"),
        vec!["key_press Down"]
    );

    let diamond = groups
        .iter()
        .filter_map(Value::as_table)
        .find(|g| g.get("mode").and_then(Value::as_str) == Some("four_buttons"))
        .unwrap();
    assert_eq!(
        bindings_of(diamond, "button_a", "Full_Press"),
        vec!["xinput_button B, Jump"]
    );

    let trigger = groups
        .iter()
        .filter_map(Value::as_table)
        .find(|g| g.get("mode").and_then(Value::as_str) == Some("trigger"))
        .unwrap();
    let settings = table(trigger, "settings");
    assert_eq!(scalar(settings, "output_trigger"), "1");

    let text = vdf::dumps(&doc);
    assert_eq!(vdf::loads(&text).unwrap(), doc);
}

const CANONICAL_SOURCE: &str = r#"
controller_mappings:
  version: 3
  revision: 5
  title: Canonical sample
  description: canonical round trip
  creator: nobody
  controller_type: controller_steamcontroller_gordon
  Timestamp: 123
  actions:
    Default:
      title: Default
      legacy_set: 1
  group:
    - id: 0
      mode: dpad
      inputs:
        dpad_north:
          activators:
            Full_Press:
              bindings:
                binding: key_press Up
              settings:
                toggle: 1
  preset:
    - id: 0
      name: Default
      group_source_bindings:
        "0": dpad active
  settings:
    left_trackpad_mode: 0
"#;

#[test]
fn canonical_schema_round_trips_through_model() {
    let config = ControllerConfig::from_node(&parse(CANONICAL_SOURCE)).unwrap();
    let doc = config.encode_kv();
    let mapping = table(&doc, "controller_mappings");

    assert_eq!(scalar(mapping, "revision"), "5");
    assert_eq!(scalar(mapping, "Timestamp"), "123");

    let group = mapping.get("group").and_then(Value::as_table).unwrap();
    assert_eq!(
        bindings_of(group, "dpad_north", "Full_Press"),
        vec!["key_press Up"]
    );
    let activators = table(table(table(group, "inputs"), "dpad_north"), "activators");
    let settings = table(table(activators, "Full_Press"), "settings");
    assert_eq!(scalar(settings, "toggle"), "1");

    assert_eq!(scalar(table(mapping, "settings"), "left_trackpad_mode"), "0");

    let text = vdf::dumps(&doc);
    assert_eq!(vdf::loads(&text).unwrap(), doc);
}
