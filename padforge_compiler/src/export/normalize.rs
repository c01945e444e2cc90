//! Short-hand resolution.
//!
//! The source tree mixes cluster-level short-hands (`DP`, `BQ&LB`),
//! pole-level short-hands (`DP.u`, `SW.LB`, inline `LB`), the canonical
//! `cluster`/`pole`/`synthesis` tree, and symbolic settings. Everything
//! is folded into the exporter's working `Layer`/`Cluster`/`Pole` shape.

use log::debug;

use crate::config::activator::HAPTIC_INTENSITY;
use crate::config::group::{Mode, DPAD_LAYOUT};
use crate::config::settings::Scalar;
use crate::error::{CodeKind, Error, Result};
use crate::evspec::{Actsig, Evfrob};
use crate::export::{
    auto_style, normalize_srcsym, pole_input, table_get, Cluster, Event, Exporter, Layer,
    Pole, Synthesis, CHORD_MAP, GRPSRC_MAP, MODESHIFT_MAP,
};
use crate::source::{self, Node};
use crate::LOG_TARGET_COMPILE;

fn truthy(node: &Node) -> bool {
    match node {
        Node::Bool(b) => *b,
        _ => source::as_i64(node).map(|n| n != 0).unwrap_or(false),
    }
}

fn actsig_from_name(name: &str) -> Actsig {
    match name {
        "start" | "+" | "start_press" => Actsig::Start,
        "long" | "_" | "long_press" => Actsig::Long,
        "double" | ":" | "=" | "double_press" => Actsig::Double,
        "release" | "-" => Actsig::Release,
        "chord" | "&" => Actsig::Chord,
        _ => Actsig::Full,
    }
}

fn event_from_node(node: &Node) -> Event {
    let evtype = source::text(node, "evtype").unwrap_or_default();
    let evcode = source::attr(node, "evcode");

    let scalar_code =
        || evcode.and_then(source::scalar_text).unwrap_or_default();
    let pair_code = || -> Option<(String, String)> {
        let seq = evcode?.as_sequence()?;
        let first = seq.first().and_then(source::scalar_text)?;
        let second = seq.get(1).and_then(source::scalar_text)?;
        Some((first, second))
    };

    match evtype.as_str() {
        "keyboard" => Event::Keyboard(scalar_code()),
        "gamepad" => Event::Gamepad(scalar_code()),
        "mouse" => Event::Mouse(scalar_code()),
        "host" => match evcode {
            Some(Node::Sequence(seq)) => {
                let words: Vec<String> =
                    seq.iter().filter_map(source::scalar_text).collect();
                Event::Host(words.join(" "))
            },
            _ => Event::Host(scalar_code()),
        },
        "overlay" => match pair_code() {
            Some((action, layer)) => Event::Overlay { action, layer },
            None => Event::Empty,
        },
        "mode_shift" | "modeshift" => match pair_code() {
            Some((cluster, token)) => match token.parse() {
                Ok(token) => Event::ModeShift { cluster, token },
                Err(_) => Event::Empty,
            },
            None => Event::Empty,
        },
        _ => Event::Empty,
    }
}

fn frob_from_node(node: &Node) -> Evfrob {
    let mut frob = Evfrob::default();

    if let Some(value) = source::attr(node, "specific") {
        frob.specific = source::as_i64(value).or_else(|| {
            let name = source::scalar_text(value)?;
            CHORD_MAP.iter().find(|(k, _)| *k == name).map(|(_, v)| *v)
        });
    }
    if let Some(value) = source::attr(node, "toggle") {
        frob.toggle = truthy(value);
    }
    if let Some(value) = source::attr(node, "interrupt")
        .or_else(|| source::attr(node, "interruptible"))
    {
        frob.interrupt = truthy(value);
    }
    frob.delay_start =
        source::int(node, "start").or_else(|| source::int(node, "delay_start"));
    frob.delay_end = source::int(node, "end").or_else(|| source::int(node, "delay_end"));
    frob.haptic = source::int(node, "haptic")
        .or_else(|| source::int(node, "haptic_intensity"));
    if let Some(value) = source::attr(node, "cycle") {
        frob.cycle = truthy(value);
    }
    frob.repeat =
        source::int(node, "repeat").or_else(|| source::int(node, "repeat_rate"));
    frob
}

/// Canonical synthesis subtree to the working shape.
fn synthesis_from_node(node: &Node) -> Synthesis {
    let actsig =
        actsig_from_name(&source::text(node, "actsig").unwrap_or_default());
    let events = source::children(node, "event").into_iter().map(event_from_node).collect();
    let frob = source::attr(node, "settings")
        .or_else(|| source::attr(node, "frob"))
        .map(frob_from_node)
        .unwrap_or_default();
    let label = source::text(node, "label");
    Synthesis { actsig, events, frob, label }
}

/// Coerce a pole value: a string parses as shorthand syntheses, anything
/// else is the canonical synthesis list. An alias that cannot be
/// resolved degrades to an invalid-binding placeholder so the rest of
/// the document still compiles.
fn syntheses_from_value(exporter: &Exporter, value: &Node) -> Result<Vec<Synthesis>> {
    match value {
        Node::String(text) => match exporter.expand_syntheses(text) {
            Ok(syntheses) => Ok(syntheses),
            Err(err @ Error::UnresolvedAlias(_)) => {
                log::warn!(
                    target: LOG_TARGET_COMPILE,
                    "{}; emitting placeholder binding", err
                );
                Ok(vec![Synthesis {
                    events: vec![Event::Invalid(text.clone())],
                    ..Synthesis::default()
                }])
            },
            Err(err) => Err(err),
        },
        Node::Sequence(seq) => Ok(seq.iter().map(synthesis_from_node).collect()),
        Node::Mapping(_) => Ok(vec![synthesis_from_node(value)]),
        _ => Ok(Vec::new()),
    }
}

fn pole_from_node(node: &Node) -> Pole {
    let sym = source::text(node, "sym").unwrap_or_default();
    let syntheses =
        source::children(node, "synthesis").into_iter().map(synthesis_from_node).collect();
    Pole { sym, syntheses }
}

/// Resolve one cluster subtree, expanding pole short-hands.
pub(crate) fn normalize_cluster(exporter: &Exporter, node: &Node) -> Result<Cluster> {
    let mut cluster = Cluster::default();

    // Whole-stick shorthand.
    if let Some(text) = source::scalar_text(node) {
        match text.as_str() {
            "LJ" | "(LJ)" => cluster.style = Some(Mode::JoystickMove),
            "RJ" | "(RJ)" => cluster.style = Some(Mode::JoystickCamera),
            other => return Err(Error::MalformedExpression(other.to_owned())),
        }
        return Ok(cluster);
    }

    // Style first: pole shorthand resolution depends on it.
    if let Some(style) = source::text(node, "style") {
        cluster.style = Some(Mode::from_name(&style).ok_or(Error::UnknownCode {
            kind: CodeKind::GroupMode,
            raw: style,
        })?);
    }

    for (key, value) in source::entries(node) {
        let pole_sym = if let Some((_, (_, pole))) =
            crate::export::UNIQUE_POLE_SYMS.iter().find(|(sym, _)| *sym == key)
        {
            Some((*pole).to_owned())
        } else if key.chars().count() == 1 {
            Some(key.clone())
        } else if let Some(mapped) =
            cluster.style.and_then(|style| pole_input(style, &key))
        {
            Some(mapped)
        } else if key.parse::<i64>().map(|n| n >= 0).unwrap_or(false) {
            Some(key.clone())
        } else {
            None
        };

        if let Some(pole_sym) = pole_sym {
            let syntheses = syntheses_from_value(exporter, value)?;
            cluster.merge_pole(Pole { sym: pole_sym, syntheses });
            continue;
        }

        match key.as_str() {
            "style" => {},
            "sym" => cluster.sym = source::scalar_text(value).unwrap_or_default(),
            "modeshift" => cluster.modeshift = source::scalar_text(value),
            "settings" => cluster.settings = Some(value.clone()),
            "pole" => {
                for pole_node in value.as_sequence().map(|s| s.iter()).into_iter().flatten()
                {
                    cluster.merge_pole(pole_from_node(pole_node));
                }
            },
            other => {
                debug!(target: LOG_TARGET_COMPILE, "ignoring cluster key '{}'", other);
            },
        }
    }

    if cluster.style.is_none() {
        cluster.style = auto_style(&cluster.pole_syms(), false);
    }
    Ok(cluster)
}

/// Resolve one layer subtree: cluster short-hands, `cluster&gate` keys,
/// pole short-hands, inline switch poles, and the canonical tree.
pub(crate) fn normalize_layer(exporter: &mut Exporter, node: &Node) -> Result<Layer> {
    let mut layer = Layer::default();
    layer.name = source::text(node, "name");

    for (key, value) in source::entries(node) {
        let (base, gate) = match key.split_once('&') {
            Some((base, gate)) => (base.to_owned(), Some(gate.to_owned())),
            None => (key.clone(), None),
        };

        if GRPSRC_MAP.iter().any(|(sym, _)| *sym == base) {
            // Cluster shorthand, possibly mode-shifted.
            let mut cluster = normalize_cluster(exporter, value)?;
            cluster.sym = base.clone();
            if matches!(base.as_str(), "LT" | "RT") {
                cluster.style = Some(Mode::Trigger);
            }
            if let Some(gate) = gate {
                let gate_input = table_get(MODESHIFT_MAP, &gate)
                    .map(str::to_owned)
                    .unwrap_or(gate);
                let token = exporter.allocate_token();
                cluster.modeshift = Some(gate_input.clone());
                cluster.token = Some(token);

                // The gate binding lives in the switches cluster.
                let gate_synthesis = Synthesis {
                    actsig: Actsig::Full,
                    events: vec![Event::ModeShift { cluster: base, token }],
                    frob: Evfrob::default(),
                    label: None,
                };
                layer.merge_cluster(cluster);
                layer.merge_cluster_pole(
                    "SW",
                    Some(Mode::Switches),
                    Pole { sym: gate_input, syntheses: vec![gate_synthesis] },
                );
            } else {
                layer.merge_cluster(cluster);
            }
            continue;
        }

        if base == "cluster" {
            for cluster_node in value.as_sequence().map(|s| s.iter()).into_iter().flatten() {
                let cluster = normalize_cluster(exporter, cluster_node)?;
                layer.merge_cluster(cluster);
            }
            continue;
        }
        if base == "name" {
            continue;
        }

        let (cluster_sym, pole_sym) = normalize_srcsym(&base);
        if let Some(cluster_sym) = cluster_sym {
            let syntheses = syntheses_from_value(exporter, value)?;
            let style = match cluster_sym.as_str() {
                "LT" | "RT" => Some(Mode::Trigger),
                _ => None,
            };
            layer.merge_cluster_pole(
                &cluster_sym,
                style,
                Pole { sym: pole_sym, syntheses },
            );
        } else {
            debug!(target: LOG_TARGET_COMPILE, "ignoring layer key '{}'", key);
        }
    }

    // Styles left open resolve from the assembled pole sets.
    for cluster in &mut layer.clusters {
        if cluster.style.is_none() {
            cluster.style = match cluster.sym.as_str() {
                "LT" | "RT" => Some(Mode::Trigger),
                _ => auto_style(
                    &cluster.poles.iter().map(|p| p.sym.as_str()).collect::<Vec<_>>(),
                    false,
                ),
            };
        }
    }
    Ok(layer)
}

/// A fraction (0..=1) scales to percent; whole numbers pass through.
fn percent(node: &Node) -> Option<i64> {
    let scale = |f: f64| {
        if f <= 1.0 {
            (f * 100.0).round() as i64
        } else {
            f.round() as i64
        }
    };
    match node {
        Node::Number(n) => match n.as_i64() {
            Some(i) => Some(i),
            None => n.as_f64().map(scale),
        },
        Node::String(s) => {
            let s = s.trim();
            match s.parse::<i64>() {
                Ok(i) => Some(i),
                Err(_) => s.parse::<f64>().ok().map(scale),
            }
        },
        _ => None,
    }
}

fn position_pair(node: &Node) -> Option<(i64, i64)> {
    match node {
        Node::Sequence(seq) => {
            let x = seq.first().and_then(source::as_i64)?;
            let y = seq.get(1).and_then(source::as_i64)?;
            Some((x, y))
        },
        Node::String(s) => {
            let mut words = s.split_whitespace();
            let x = words.next()?.parse().ok()?;
            let y = words.next()?.parse().ok()?;
            Some((x, y))
        },
        _ => None,
    }
}

/// `"WxH+X+Y"` in percent units.
fn parse_rect(text: &str) -> Result<(i64, i64, i64, i64)> {
    let fail = || Error::MalformedExpression(text.to_owned());
    let (size, offset) = text.split_once('+').ok_or_else(fail)?;
    let (w, h) = size.split_once('x').ok_or_else(fail)?;
    let (x, y) = offset.split_once('+').ok_or_else(fail)?;
    Ok((
        w.parse().map_err(|_| fail())?,
        h.parse().map_err(|_| fail())?,
        x.parse().map_err(|_| fail())?,
        y.parse().map_err(|_| fail())?,
    ))
}

/// Translate symbolic settings short-hands into canonical numeric keys.
/// Canonical keys pass through untouched; validation happens when the
/// result is written onto the group.
pub(crate) fn normalize_settings(
    node: &Node,
    mode: Mode,
) -> Result<Vec<(String, Scalar)>> {
    let mut out: Vec<(String, Scalar)> = Vec::new();
    let menu = matches!(mode, Mode::RadialMenu | Mode::TouchMenu);

    for (key, value) in source::entries(node) {
        match key.as_str() {
            "layout" => {
                let layout = source::as_i64(value).or_else(|| {
                    let name = source::scalar_text(value)?;
                    DPAD_LAYOUT.iter().find(|(k, _)| *k == name).map(|(_, v)| *v)
                });
                match layout {
                    Some(layout) => out.push(("layout".to_owned(), Scalar::Int(layout))),
                    None => {
                        return Err(Error::InvalidValue {
                            key,
                            value: source::scalar_text(value).unwrap_or_default(),
                            constraint: "dpad layout".to_owned(),
                        })
                    },
                }
            },
            "period" => {
                if let Some(n) = source::as_i64(value) {
                    out.push(("analog_emulation_period".to_owned(), Scalar::Int(n)));
                }
            },
            "duty" => {
                if let Some(n) = source::as_i64(value) {
                    out.push(("analog_emulation_duty_cycle_pct".to_owned(), Scalar::Int(n)));
                }
            },
            "haptics" => {
                let level = source::as_i64(value).or_else(|| {
                    let name = source::scalar_text(value)?.to_lowercase();
                    HAPTIC_INTENSITY.iter().find(|(k, _)| *k == name).map(|(_, v)| *v)
                });
                if let Some(level) = level {
                    let key = if mode == Mode::Dpad {
                        "haptic_intensity_override"
                    } else {
                        "haptic_intensity"
                    };
                    out.push((key.to_owned(), Scalar::Int(level)));
                }
            },
            "rect" if mode == Mode::MouseRegion => {
                let text = source::scalar_text(value).unwrap_or_default();
                let (w, h, x, y) = parse_rect(&text)?;
                out.push(("position_x".to_owned(), Scalar::Int(x + w / 2)));
                out.push(("position_y".to_owned(), Scalar::Int(y + h / 2)));
                out.push(("scale".to_owned(), Scalar::Int(w / 2)));
                out.push(("sensitivity_horiz_scale".to_owned(), Scalar::Int(100)));
                let vert = if w > 0 { 100 * h / w } else { 100 };
                out.push(("sensitivity_vert_scale".to_owned(), Scalar::Int(vert)));
            },
            "opacity" if menu => {
                if let Some(n) = percent(value) {
                    out.push(("touch_menu_opacity".to_owned(), Scalar::Int(n)));
                }
            },
            "position" if menu => {
                if let Some((x, y)) = position_pair(value) {
                    out.push(("touch_menu_position_x".to_owned(), Scalar::Int(x)));
                    out.push(("touch_menu_position_y".to_owned(), Scalar::Int(y)));
                }
            },
            "scale" if menu => {
                if let Some(n) = percent(value) {
                    out.push(("touch_menu_scale".to_owned(), Scalar::Int(n)));
                }
            },
            _ => {
                if let Some(scalar) = source::scalar(value) {
                    out.push((key, scalar));
                }
            },
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> Node {
        serde_yaml::from_str(src).unwrap()
    }

    fn settings_vec(src: &str, mode: Mode) -> Vec<(String, Scalar)> {
        normalize_settings(&parse(src), mode).unwrap()
    }

    #[test]
    fn dpad_symbolic_settings() {
        let out = settings_vec(
            "layout: analog\nperiod: 50\nduty: 25\nhaptics: off",
            Mode::Dpad,
        );
        assert_eq!(
            out,
            vec![
                ("layout".to_owned(), Scalar::Int(2)),
                ("analog_emulation_period".to_owned(), Scalar::Int(50)),
                ("analog_emulation_duty_cycle_pct".to_owned(), Scalar::Int(25)),
                ("haptic_intensity_override".to_owned(), Scalar::Int(0)),
            ]
        );
    }

    #[test]
    fn region_rect_square() {
        let out = settings_vec("rect: 10x10+45+45", Mode::MouseRegion);
        assert_eq!(
            out,
            vec![
                ("position_x".to_owned(), Scalar::Int(50)),
                ("position_y".to_owned(), Scalar::Int(50)),
                ("scale".to_owned(), Scalar::Int(5)),
                ("sensitivity_horiz_scale".to_owned(), Scalar::Int(100)),
                ("sensitivity_vert_scale".to_owned(), Scalar::Int(100)),
            ]
        );
    }

    #[test]
    fn region_rect_wide() {
        let out = settings_vec("rect: 16x4+22+30", Mode::MouseRegion);
        assert_eq!(
            out,
            vec![
                ("position_x".to_owned(), Scalar::Int(30)),
                ("position_y".to_owned(), Scalar::Int(32)),
                ("scale".to_owned(), Scalar::Int(8)),
                ("sensitivity_horiz_scale".to_owned(), Scalar::Int(100)),
                ("sensitivity_vert_scale".to_owned(), Scalar::Int(25)),
            ]
        );
    }

    #[test]
    fn menu_position_and_fractions() {
        let out = settings_vec(
            "opacity: 33\nposition: 30 25\nscale: 100",
            Mode::RadialMenu,
        );
        assert_eq!(
            out,
            vec![
                ("touch_menu_opacity".to_owned(), Scalar::Int(33)),
                ("touch_menu_position_x".to_owned(), Scalar::Int(30)),
                ("touch_menu_position_y".to_owned(), Scalar::Int(25)),
                ("touch_menu_scale".to_owned(), Scalar::Int(100)),
            ]
        );

        let out = settings_vec(
            "position: [20, 10]\nopacity: 0.25\nscale: \"0.75\"",
            Mode::RadialMenu,
        );
        assert_eq!(
            out,
            vec![
                ("touch_menu_position_x".to_owned(), Scalar::Int(20)),
                ("touch_menu_position_y".to_owned(), Scalar::Int(10)),
                ("touch_menu_opacity".to_owned(), Scalar::Int(25)),
                ("touch_menu_scale".to_owned(), Scalar::Int(75)),
            ]
        );
    }

    #[test]
    fn canonical_keys_pass_through() {
        let out = settings_vec(
            "layout: 2\nanalog_emulation_period: 50\nanalog_emulation_duty_cycle_pct: 15",
            Mode::Dpad,
        );
        assert_eq!(
            out,
            vec![
                ("layout".to_owned(), Scalar::Int(2)),
                ("analog_emulation_period".to_owned(), Scalar::Int(50)),
                ("analog_emulation_duty_cycle_pct".to_owned(), Scalar::Int(15)),
            ]
        );
    }

    #[test]
    fn cluster_normalization_maps_poles() {
        let exporter = Exporter::new();
        let cluster = normalize_cluster(
            &exporter,
            &parse("u: (DUP)\nd: (DDN)\nl: (DLT)\nr: (DRT)"),
        )
        .unwrap();
        assert_eq!(cluster.style, Some(Mode::Dpad));
        assert_eq!(cluster.poles.len(), 4);
        assert_eq!(cluster.poles[0].sym, "u");
        assert_eq!(
            cluster.poles[0].syntheses[0].events,
            vec![Event::Gamepad("DUP".into())]
        );
    }

    #[test]
    fn canonical_cluster_tree() {
        let exporter = Exporter::new();
        let cluster = normalize_cluster(
            &exporter,
            &parse(
                r#"
sym: DP
style: dpad
pole:
  - sym: u
    synthesis:
      - actsig: full
        event:
          - { evtype: keyboard, evcode: "3" }
          - { evtype: keyboard, evcode: Left_Shift }
"#,
            ),
        )
        .unwrap();
        assert_eq!(cluster.sym, "DP");
        assert_eq!(cluster.style, Some(Mode::Dpad));
        assert_eq!(cluster.poles[0].syntheses[0].events.len(), 2);
    }

    #[test]
    fn layer_collects_inline_and_dotted_keys() {
        let mut exporter = Exporter::new();
        let layer = normalize_layer(
            &mut exporter,
            &parse(
                r#"
name: Layer1
LJ.c: "[1]"
DP.u: (DUP)
DP.d: (DDN)
SW.LB: (LB)
LB: (LB)
BQ:
  s: (A)
  w: (X)
"#,
            ),
        )
        .unwrap();
        assert_eq!(layer.name.as_deref(), Some("Layer1"));
        let syms: Vec<&str> = layer.clusters.iter().map(|c| c.sym.as_str()).collect();
        assert_eq!(syms, vec!["LJ", "DP", "SW", "BQ"]);

        let sw = layer.clusters.iter().find(|c| c.sym == "SW").unwrap();
        // SW.LB and inline LB merge onto the same pole.
        assert_eq!(sw.poles.len(), 1);
        assert_eq!(sw.poles[0].syntheses.len(), 2);
        let bq = layer.clusters.iter().find(|c| c.sym == "BQ").unwrap();
        assert_eq!(bq.style, Some(Mode::FourButtons));
    }

    #[test]
    fn gated_cluster_allocates_token_and_gate_pole() {
        let mut exporter = Exporter::new();
        let layer = normalize_layer(
            &mut exporter,
            &parse("name: Default\nBQ&LB:\n  \"01\": <1>\n  \"02\": <2>"),
        )
        .unwrap();
        let gated = layer.clusters.iter().find(|c| c.modeshift.is_some()).unwrap();
        assert_eq!(gated.sym, "BQ");
        assert_eq!(gated.modeshift.as_deref(), Some("left_bumper"));
        assert_eq!(gated.token, Some(0));

        let sw = layer.clusters.iter().find(|c| c.sym == "SW").unwrap();
        assert_eq!(sw.poles[0].sym, "left_bumper");
        assert_eq!(
            sw.poles[0].syntheses[0].events,
            vec![Event::ModeShift { cluster: "BQ".into(), token: 0 }]
        );
    }
}
