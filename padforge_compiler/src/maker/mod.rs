//! The stricter short-hand front end.
//!
//! This adapter accepts the `actions`/`layers` grammar: every cluster is
//! named by its two-letter symbol, poles by fixed subpart letters, and
//! bindings by the expression shorthand. It keeps its own intermediate
//! model and shift compiler and lowers into the same configuration model
//! as the DOM exporter.

pub(crate) mod shift;

use std::collections::HashMap;

use log::warn;

use crate::config::activator::Activator;
use crate::config::evgen::{mangle, Binding, Evgen};
use crate::config::group::Mode;
use crate::config::mapping::{ControllerConfig, Mapping, Overlay};
use crate::error::{CodeKind, Error, Result};
use crate::evspec::{Evspec, Evsym};
use crate::source::{self, Node};
use crate::LOG_TARGET_COMPILE;

/// Cluster symbol to preset group source, in emission order.
const CLUSTERS: &[(&str, &str)] = &[
    ("SW", "switch"),
    ("BQ", "button_diamond"),
    ("LP", "left_trackpad"),
    ("RP", "right_trackpad"),
    ("LJ", "joystick"),
    ("LT", "left_trigger"),
    ("RT", "right_trigger"),
    ("RJ", "right_joystick"),
    ("DP", "dpad"),
];

pub(crate) const SW_SYMS: &[&str] = &["BK", "ST", "LB", "RB", "LG", "RG"];

/// The cluster kinds this dialect can spell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ClusterKind {
    Pen,
    Dpad,
    Face,
    JsMove,
    JsCam,
    JsMouse,
    MouseJs,
    Region,
    Pie,
    Scroll,
    Single,
    Switches,
    Menu,
    Trigger,
}

impl ClusterKind {
    pub(crate) fn from_name(name: &str) -> Option<ClusterKind> {
        match name {
            "pen" => Some(ClusterKind::Pen),
            "dpad" => Some(ClusterKind::Dpad),
            "face" => Some(ClusterKind::Face),
            "jsmove" | "js-move" => Some(ClusterKind::JsMove),
            "jscam" | "js-cam" => Some(ClusterKind::JsCam),
            "jsmouse" | "js-mouse" => Some(ClusterKind::JsMouse),
            "mousejs" | "mouse-js" => Some(ClusterKind::MouseJs),
            "region" => Some(ClusterKind::Region),
            "pie" => Some(ClusterKind::Pie),
            "scroll" => Some(ClusterKind::Scroll),
            "single" => Some(ClusterKind::Single),
            "switches" => Some(ClusterKind::Switches),
            "menu" => Some(ClusterKind::Menu),
            "trigger" => Some(ClusterKind::Trigger),
            _ => None,
        }
    }

    pub(crate) fn mode(self) -> Mode {
        match self {
            ClusterKind::Pen => Mode::AbsoluteMouse,
            ClusterKind::Dpad => Mode::Dpad,
            ClusterKind::Face => Mode::FourButtons,
            ClusterKind::JsMove => Mode::JoystickMove,
            ClusterKind::JsCam => Mode::JoystickCamera,
            ClusterKind::JsMouse => Mode::JoystickMouse,
            ClusterKind::MouseJs => Mode::MouseJoystick,
            ClusterKind::Region => Mode::MouseRegion,
            ClusterKind::Pie => Mode::RadialMenu,
            ClusterKind::Scroll => Mode::Scrollwheel,
            ClusterKind::Single => Mode::SingleButton,
            ClusterKind::Switches => Mode::Switches,
            ClusterKind::Menu => Mode::TouchMenu,
            ClusterKind::Trigger => Mode::Trigger,
        }
    }

    /// Input symbol for one subpart letter.
    pub(crate) fn subpart_input(self, sub: &str) -> Option<String> {
        let fixed = |name: &str| Some(name.to_owned());
        match self {
            ClusterKind::Pen => match sub {
                "c" => fixed("click"),
                "2" => fixed("doubletap"),
                "t" => fixed("touch"),
                _ => None,
            },
            ClusterKind::Dpad => match sub {
                "u" => fixed("dpad_north"),
                "d" => fixed("dpad_south"),
                "l" => fixed("dpad_west"),
                "r" => fixed("dpad_east"),
                "c" => fixed("click"),
                "o" => fixed("edge"),
                _ => None,
            },
            ClusterKind::Face => match sub {
                "s" => fixed("button_a"),
                "e" => fixed("button_b"),
                "w" => fixed("button_x"),
                "n" => fixed("button_y"),
                _ => None,
            },
            ClusterKind::JsMove | ClusterKind::JsMouse | ClusterKind::Trigger => match sub {
                "c" => fixed("click"),
                "o" => fixed("edge"),
                _ => None,
            },
            // The camera stick has no edge input.
            ClusterKind::JsCam => match sub {
                "c" => fixed("click"),
                _ => None,
            },
            ClusterKind::MouseJs => match sub {
                "c" => fixed("click"),
                "2" => fixed("doubletap"),
                _ => None,
            },
            ClusterKind::Region => match sub {
                "c" => fixed("click"),
                "e" => fixed("edge"),
                "t" => fixed("touch"),
                _ => None,
            },
            ClusterKind::Pie => match sub {
                "c" => fixed("click"),
                _ => menu_subpart(sub, 0, 20),
            },
            ClusterKind::Scroll => match sub {
                "i" => fixed("scroll_clockwise"),
                "o" => fixed("scroll_counterclockwise"),
                "c" => fixed("click"),
                _ => {
                    let n: i64 = sub.parse().ok()?;
                    if sub.len() == 1 && (0..=9).contains(&n) {
                        Some(format!("scroll_wheel_list_{}", n))
                    } else {
                        None
                    }
                },
            },
            ClusterKind::Single => match sub {
                "c" => fixed("click"),
                "t" => fixed("touch"),
                _ => None,
            },
            ClusterKind::Switches => match sub {
                "BK" => fixed("button_escape"),
                "ST" => fixed("button_menu"),
                "LB" => fixed("left_bumper"),
                "RB" => fixed("right_bumper"),
                "LG" => fixed("button_back_left"),
                "RG" => fixed("button_back_right"),
                _ => None,
            },
            ClusterKind::Menu => menu_subpart(sub, 1, 16),
        }
    }

    /// Subpart emission order.
    fn ordering(self) -> Vec<String> {
        let letters = |s: &str| s.chars().map(String::from).collect::<Vec<_>>();
        match self {
            ClusterKind::Pen => letters("c2t"),
            ClusterKind::Dpad => letters("udlrco"),
            ClusterKind::Face => letters("sewn"),
            ClusterKind::JsMove | ClusterKind::JsMouse | ClusterKind::Trigger => {
                letters("co")
            },
            ClusterKind::JsCam => letters("c"),
            ClusterKind::MouseJs => letters("c2"),
            ClusterKind::Region => letters("cet"),
            ClusterKind::Pie => {
                let mut out: Vec<String> = (0..=20).map(|n| format!("{:02}", n)).collect();
                out.push("c".to_owned());
                out
            },
            ClusterKind::Scroll => letters("ioc0123456789"),
            ClusterKind::Single => letters("ct"),
            ClusterKind::Switches => SW_SYMS.iter().map(|s| (*s).to_owned()).collect(),
            ClusterKind::Menu => (1..=16).map(|n| format!("{:02}", n)).collect(),
        }
    }
}

fn menu_subpart(sub: &str, lo: i64, hi: i64) -> Option<String> {
    if sub.len() != 2 || !sub.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let n: i64 = sub.parse().ok()?;
    if lo <= n && n <= hi {
        Some(format!("touch_menu_button_{}", n))
    } else {
        None
    }
}

/// Infer a cluster kind from subpart letters.
fn auto_kind(subparts: &[&str]) -> Option<ClusterKind> {
    if subparts.iter().any(|s| matches!(*s, "u" | "d" | "l" | "r")) {
        return Some(ClusterKind::Dpad);
    }
    if subparts
        .iter()
        .any(|s| matches!(*s, "s" | "e" | "w" | "n" | "a" | "b" | "x" | "y"))
    {
        return Some(ClusterKind::Face);
    }
    let nums: Vec<i64> =
        subparts.iter().filter_map(|s| s.parse::<i64>().ok()).collect();
    if !nums.is_empty() {
        let max = nums.iter().copied().max().unwrap_or(-1);
        if nums.contains(&0) || max > 16 {
            return Some(ClusterKind::Pie);
        }
        if matches!(max, 2 | 4 | 7 | 9 | 12 | 13 | 16) {
            return Some(ClusterKind::Menu);
        }
        return Some(ClusterKind::Pie);
    }
    None
}

/// One cluster: a kind, bound subparts, and an optional analog output.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct MakerCluster {
    pub kind: ClusterKind,
    pub subparts: Vec<(String, Vec<Evspec>)>,
    pub output: Option<i64>,
}

impl MakerCluster {
    fn new(kind: ClusterKind) -> MakerCluster {
        MakerCluster { kind, subparts: Vec::new(), output: None }
    }

    pub(crate) fn bind_subpart(&mut self, sub: &str, specs: Vec<Evspec>) {
        match self.subparts.iter_mut().find(|(s, _)| s == sub) {
            Some((_, extant)) => extant.extend(specs),
            None => self.subparts.push((sub.to_owned(), specs)),
        }
    }

    pub(crate) fn subpart(&self, sub: &str) -> Option<&[Evspec]> {
        self.subparts.iter().find(|(s, _)| s == sub).map(|(_, v)| v.as_slice())
    }
}

/// One layer: named clusters keyed by their two-letter symbol.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct MakerLayer {
    pub name: Option<String>,
    pub clusters: Vec<(String, MakerCluster)>,
}

impl MakerLayer {
    pub(crate) fn named(name: impl Into<String>) -> MakerLayer {
        MakerLayer { name: Some(name.into()), clusters: Vec::new() }
    }

    fn cluster_mut(&mut self, sym: &str) -> Option<&mut MakerCluster> {
        self.clusters.iter_mut().find(|(s, _)| s == sym).map(|(_, c)| c)
    }

    pub(crate) fn cluster(&self, sym: &str) -> Option<&MakerCluster> {
        self.clusters.iter().find(|(s, _)| s == sym).map(|(_, c)| c)
    }

    /// Ensure `sym` exists, with `kind` if it must be created.
    fn pave(&mut self, sym: &str, kind: ClusterKind) -> &mut MakerCluster {
        if let Some(pos) = self.clusters.iter().position(|(s, _)| s == sym) {
            return &mut self.clusters[pos].1;
        }
        self.clusters.push((sym.to_owned(), MakerCluster::new(kind)));
        &mut self.clusters.last_mut().expect("just pushed").1
    }

    /// Bind specs at a source symbol like `LB`, `DP.u` or `LT.c`.
    pub(crate) fn bind_srcsym(&mut self, srcsym: &str, specs: Vec<Evspec>) -> Result<()> {
        if let Some((cluster, sub)) = srcsym.split_once('.') {
            let kind = match cluster {
                "LT" | "RT" => ClusterKind::Trigger,
                _ => auto_kind(&[sub]).ok_or_else(|| {
                    Error::MalformedExpression(srcsym.to_owned())
                })?,
            };
            self.pave(cluster, kind).bind_subpart(sub, specs);
            return Ok(());
        }
        if SW_SYMS.contains(&srcsym) {
            self.pave("SW", ClusterKind::Switches).bind_subpart(srcsym, specs);
            return Ok(());
        }
        Err(Error::MalformedExpression(srcsym.to_owned()))
    }
}

fn parse_bind(
    aliases: &HashMap<String, Evspec>,
    text: &str,
) -> Result<Vec<Evspec>> {
    let mut out = Vec::new();
    for word in text.split_whitespace() {
        if let Some(term) = word.strip_prefix('$') {
            let term = term
                .strip_prefix('{')
                .and_then(|t| t.strip_suffix('}'))
                .unwrap_or(term);
            let spec = aliases
                .get(term)
                .cloned()
                .ok_or_else(|| Error::UnresolvedAlias(term.to_owned()))?;
            out.push(spec);
        } else {
            out.push(Evspec::parse(word)?);
        }
    }
    Ok(out)
}

fn load_cluster(
    aliases: &HashMap<String, Evspec>,
    node: &Node,
) -> Result<MakerCluster> {
    let mode_name = source::text(node, "mode").unwrap_or_default();
    let kind = ClusterKind::from_name(&mode_name).ok_or(Error::UnknownCode {
        kind: CodeKind::GroupMode,
        raw: mode_name,
    })?;
    let mut cluster = MakerCluster::new(kind);

    for (key, value) in source::entries(node) {
        if key == "mode" {
            continue;
        }
        if key == ">" {
            cluster.output = source::as_i64(value);
            continue;
        }
        if kind.subpart_input(&key).is_some() {
            if let Some(text) = source::scalar_text(value) {
                cluster.bind_subpart(&key, parse_bind(aliases, &text)?);
            }
        } else {
            warn!(target: LOG_TARGET_COMPILE, "ignoring subpart '{}'", key);
        }
    }
    Ok(cluster)
}

fn load_layer(
    aliases: &HashMap<String, Evspec>,
    node: &Node,
) -> Result<MakerLayer> {
    let mut layer = MakerLayer::default();
    layer.name = source::text(node, "name");

    for (key, value) in source::entries(node) {
        if key == "name" {
            continue;
        }
        if source::scalar_text(value).as_deref() == Some("") {
            continue;
        }

        if CLUSTERS.iter().any(|(sym, _)| *sym == key) {
            if value.is_mapping() {
                let cluster = load_cluster(aliases, value)?;
                layer.clusters.push((key.clone(), cluster));
                continue;
            }
            let text = source::scalar_text(value).unwrap_or_default();
            let plain = text.trim_start_matches('(').trim_end_matches(')');
            match key.as_str() {
                "LT" | "RT" => {
                    if matches!(plain, "LT" | "RT") {
                        // Analog trigger assignment.
                        let output = if plain == "LT" { 1 } else { 2 };
                        layer.pave(&key, ClusterKind::Trigger).output = Some(output);
                    } else {
                        let specs = parse_bind(aliases, &text)?;
                        layer.pave(&key, ClusterKind::Trigger).bind_subpart("c", specs);
                    }
                },
                "LJ" | "RJ" => {
                    if plain.len() == 2 && plain.ends_with('J') {
                        let output =
                            if key.starts_with(plain.chars().next().unwrap_or('L')) {
                                0
                            } else {
                                1
                            };
                        let kind = if key == "RJ" {
                            ClusterKind::JsCam
                        } else {
                            ClusterKind::JsMove
                        };
                        layer.pave(&key, kind).output = Some(output);
                    }
                },
                "LP" | "RP" => {
                    if plain.len() == 2 && plain.ends_with('J') {
                        let output =
                            if key.starts_with(plain.chars().next().unwrap_or('L')) {
                                0
                            } else {
                                1
                            };
                        layer.pave(&key, ClusterKind::JsMove).output = Some(output);
                    } else {
                        let specs = parse_bind(aliases, &text)?;
                        layer.pave(&key, ClusterKind::Single).bind_subpart("c", specs);
                    }
                },
                _ => {
                    warn!(
                        target: LOG_TARGET_COMPILE,
                        "whole-cluster bind for '{}' not recognized", key
                    );
                },
            }
            continue;
        }

        if SW_SYMS.contains(&key.as_str())
            || key.split_once('.').map(|(c, _)| {
                CLUSTERS.iter().any(|(sym, _)| *sym == c)
            }) == Some(true)
        {
            if let Some(text) = source::scalar_text(value) {
                layer.bind_srcsym(&key, parse_bind(aliases, &text)?)?;
            }
            continue;
        }

        warn!(target: LOG_TARGET_COMPILE, "ignoring layer key '{}'", key);
    }
    Ok(layer)
}

struct MakerAction {
    name: String,
    layers: Vec<MakerLayer>,
}

/// The front end root.
#[derive(Default)]
pub struct Maker {
    name: Option<String>,
    revision: Option<i64>,
    description: Option<String>,
    author: Option<String>,
    devtype: Option<String>,
    timestamp: Option<i64>,
    aliases: HashMap<String, Evspec>,
    actions: Vec<MakerAction>,
}

impl Maker {
    pub fn load(root: &Node) -> Result<Maker> {
        let mut maker = Maker::default();

        if let Some(aliases) = source::attr(root, "aliases") {
            for (name, value) in source::entries(aliases) {
                if let Some(text) = source::scalar_text(value) {
                    let mut spec = Evspec::parse(&text)?;
                    if spec.label.is_none() {
                        // Auto-label, reminiscent of in-game actions.
                        spec.label = Some(name.clone());
                    }
                    maker.aliases.insert(name, spec);
                }
            }
        }

        maker.name =
            source::text(root, "name").or_else(|| source::text(root, "title"));
        maker.revision = source::int(root, "revision");
        maker.description =
            source::text(root, "desc").or_else(|| source::text(root, "description"));
        maker.author =
            source::text(root, "author").or_else(|| source::text(root, "creator"));
        maker.devtype = source::text(root, "devtype");
        maker.timestamp = source::int(root, "timestamp")
            .or_else(|| source::int(root, "Timestamp"));

        for action_node in source::children(root, "actions") {
            let name =
                source::text(action_node, "name").unwrap_or_else(|| "Default".to_owned());
            let mut layers = Vec::new();
            for layer_node in source::children(action_node, "layers") {
                layers.push(load_layer(&maker.aliases, layer_node)?);
            }
            if let Some(mut shifters) = shift::Shifters::load(action_node)? {
                shifters.generate_layers(&mut layers);
                shifters.bind_shifters(&mut layers)?;
            }
            maker.actions.push(MakerAction { name, layers });
        }
        Ok(maker)
    }

    /// Lower one evspec to an activator, resolving overlay operations
    /// against the global layer list.
    fn export_evspec(
        &self,
        spec: &Evspec,
        resolve: &dyn Fn(&str) -> Option<usize>,
    ) -> Result<Activator> {
        let mut activator = Activator::new(spec.actsig.to_signal());
        spec.frob.apply(&mut activator)?;

        for sym in &spec.syms {
            let evgen = match sym {
                Evsym::Key(code) => Ok(Evgen::keystroke(code.clone())),
                Evsym::Gamepad(code) => Evgen::gamepad(code),
                Evsym::Mouse(code) => Evgen::mouse_switch(code),
                Evsym::Brace(content) => {
                    let parts: Vec<&str> = content.split(',').collect();
                    if parts.first() == Some(&"overlay") && parts.len() >= 3 {
                        match resolve(parts[2]) {
                            Some(id) => {
                                Evgen::overlay(parts[1], id.to_string(), "0", "0")
                            },
                            None => {
                                warn!(
                                    target: LOG_TARGET_COMPILE,
                                    "overlay reference to unknown layer '{}'", parts[2]
                                );
                                Ok(Evgen::Empty)
                            },
                        }
                    } else {
                        Evgen::host(&parts.join(" "))
                    }
                },
            };
            let binding = match evgen {
                Ok(evgen) => Binding::with_label(evgen, spec.label.clone()),
                Err(err @ Error::UnknownCode { .. }) => {
                    warn!(
                        target: LOG_TARGET_COMPILE,
                        "{}; emitting placeholder binding", err
                    );
                    Binding::with_label(
                        Evgen::Invalid(mangle(&sym.to_string())),
                        spec.label.clone(),
                    )
                },
                Err(err) => return Err(err),
            };
            activator.add_binding(binding);
        }
        Ok(activator)
    }

    fn export_layer(
        &self,
        layer: &MakerLayer,
        mapping: &mut Mapping,
        resolve: &dyn Fn(&str) -> Option<usize>,
        title: &str,
        parent: Option<&str>,
    ) -> Result<String> {
        let preset_pos = mapping.presets.len();
        let key = mapping.add_preset().name.clone();

        for (sym, source_name) in CLUSTERS {
            let Some(cluster) = layer.cluster(sym) else {
                continue;
            };
            let group_id = mapping.add_group(cluster.kind.mode()).id;
            mapping.presets[preset_pos].add_binding(group_id, source_name, true, false)?;

            let group = mapping.group_mut(group_id).expect("group just added");
            for sub in cluster.kind.ordering() {
                let Some(specs) = cluster.subpart(&sub) else {
                    continue;
                };
                let Some(symbol) = cluster.kind.subpart_input(&sub) else {
                    continue;
                };
                let input = group.input_mut(&symbol)?;
                for spec in specs {
                    let activator = self.export_evspec(spec, resolve)?;
                    input.activators.push(activator);
                }
            }
            if let Some(output) = cluster.output {
                let setting = match cluster.kind {
                    ClusterKind::Trigger => "output_trigger",
                    _ => "output_joystick",
                };
                group.set_setting(setting, output)?;
            }
        }

        if parent.is_none() {
            mapping.actions.push(Overlay::set(key.clone(), title));
        } else {
            mapping.layers.push(Overlay::layer(
                key.clone(),
                title,
                parent.unwrap_or("Default"),
            ));
        }
        Ok(key)
    }

    pub fn export_mapping(&self) -> Result<Mapping> {
        let mut mapping = Mapping::new();
        if let Some(revision) = self.revision {
            mapping.revision = revision;
        }
        if let Some(name) = &self.name {
            mapping.title = name.clone();
        }
        if let Some(description) = &self.description {
            mapping.description = description.clone();
        }
        if let Some(author) = &self.author {
            mapping.creator = author.clone();
        }
        if let Some(devtype) = &self.devtype {
            mapping.controller_type = devtype.clone();
        }
        if let Some(timestamp) = self.timestamp {
            mapping.timestamp = timestamp;
        }

        // Global layer list, bases first; overlay operations address
        // entries 1-based.
        let mut layer_list: Vec<(usize, String)> = Vec::new();
        for (index, action) in self.actions.iter().enumerate() {
            if let Some(base) = action.layers.first() {
                layer_list.push((index, base.name.clone().unwrap_or_default()));
            }
        }
        for (index, action) in self.actions.iter().enumerate() {
            for layer in action.layers.iter().skip(1) {
                layer_list.push((index, layer.name.clone().unwrap_or_default()));
            }
        }

        let mut base_keys: Vec<String> = Vec::new();
        for (index, action) in self.actions.iter().enumerate() {
            let resolve = |name: &str| {
                layer_list
                    .iter()
                    .position(|(i, n)| *i == index && n == name)
                    .map(|pos| pos + 1)
            };
            if let Some(base) = action.layers.first() {
                let key = self.export_layer(
                    base,
                    &mut mapping,
                    &resolve,
                    &action.name,
                    None,
                )?;
                base_keys.push(key);
            } else {
                base_keys.push("Default".to_owned());
            }
        }
        for (index, action) in self.actions.iter().enumerate() {
            let resolve = |name: &str| {
                layer_list
                    .iter()
                    .position(|(i, n)| *i == index && n == name)
                    .map(|pos| pos + 1)
            };
            for layer in action.layers.iter().skip(1) {
                let title = layer.name.clone().unwrap_or_default();
                self.export_layer(
                    layer,
                    &mut mapping,
                    &resolve,
                    &title,
                    Some(&base_keys[index]),
                )?;
            }
        }
        Ok(mapping)
    }

    pub fn export_config(&self) -> Result<ControllerConfig> {
        let mut config = ControllerConfig::new();
        config.mappings.push(self.export_mapping()?);
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::activator::Signal;
    use crate::config::settings::Scalar;

    fn parse(src: &str) -> Node {
        serde_yaml::from_str(src).unwrap()
    }

    #[test]
    fn inline_and_dotted_keys_build_clusters() {
        let maker = Maker::load(&parse(
            r#"
name: Sample
actions:
  - name: Default
    layers:
      - name: Base
        LB: <Space>
        DP.u: <Up>
        DP.d: <Down>
        LT.c: "[1]"
"#,
        ))
        .unwrap();
        let mapping = maker.export_mapping().unwrap();
        assert_eq!(mapping.title, "Sample");
        assert_eq!(mapping.groups.len(), 3);

        let sw = mapping.groups.iter().find(|g| g.mode == Mode::Switches).unwrap();
        assert_eq!(
            sw.input("left_bumper").unwrap().activators[0].bindings[0].to_string(),
            "key_press Space"
        );
        let dpad = mapping.groups.iter().find(|g| g.mode == Mode::Dpad).unwrap();
        assert!(dpad.input("dpad_north").is_some());
        assert!(dpad.input("dpad_south").is_some());
        let trigger = mapping.groups.iter().find(|g| g.mode == Mode::Trigger).unwrap();
        assert_eq!(
            trigger.input("click").unwrap().activators[0].bindings[0].to_string(),
            "mouse_button LEFT"
        );
    }

    #[test]
    fn analog_assignments_set_outputs() {
        let maker = Maker::load(&parse(
            r#"
actions:
  - name: Default
    layers:
      - name: Base
        LT: (LT)
        RT: (LT)
        LJ: (LJ)
        RJ: (LJ)
"#,
        ))
        .unwrap();
        let mapping = maker.export_mapping().unwrap();

        // Both triggers answer as the left trigger.
        let triggers: Vec<_> =
            mapping.groups.iter().filter(|g| g.mode == Mode::Trigger).collect();
        assert_eq!(triggers.len(), 2);
        for trigger in &triggers {
            assert_eq!(trigger.setting("output_trigger"), Some(&Scalar::Int(1)));
        }

        let lj = mapping
            .groups
            .iter()
            .find(|g| g.mode == Mode::JoystickMove)
            .unwrap();
        assert_eq!(lj.setting("output_joystick"), Some(&Scalar::Int(0)));
        let rj = mapping
            .groups
            .iter()
            .find(|g| g.mode == Mode::JoystickCamera)
            .unwrap();
        assert_eq!(rj.setting("output_joystick"), Some(&Scalar::Int(1)));
    }

    #[test]
    fn aliases_resolve_with_auto_label() {
        let maker = Maker::load(&parse(
            r#"
aliases:
  Jump: (B)
actions:
  - name: Default
    layers:
      - name: Base
        BQ.s: $Jump
"#,
        ))
        .unwrap();
        let mapping = maker.export_mapping().unwrap();
        let bq = &mapping.groups[0];
        let binding = &bq.input("button_a").unwrap().activators[0].bindings[0];
        assert_eq!(binding.to_string(), "xinput_button B, Jump");

        let missing = Maker::load(&parse(
            "actions:\n  - name: Default\n    layers:\n      - name: Base\n        BQ.s: $Fly",
        ));
        assert!(matches!(missing, Err(Error::UnresolvedAlias(name)) if name == "Fly"));
    }

    #[test]
    fn each_layer_gets_its_own_preset() {
        let maker = Maker::load(&parse(
            r#"
actions:
  - name: Default
    layers:
      - name: Base
        BQ.s: (A)
      - name: Upper
        BQ.s: (X)
"#,
        ))
        .unwrap();
        let mapping = maker.export_mapping().unwrap();
        assert_eq!(mapping.presets.len(), 2);
        assert_eq!(mapping.presets[0].name, "Default");
        assert_eq!(mapping.presets[1].name, "Preset_1000001");
        assert_eq!(mapping.actions.len(), 1);
        assert_eq!(mapping.actions[0].title, "Default");
        assert_eq!(mapping.layers.len(), 1);
        assert_eq!(mapping.layers[0].parent_set_name.as_deref(), Some("Default"));
    }

    #[test]
    fn cluster_dict_with_mode() {
        let maker = Maker::load(&parse(
            r#"
actions:
  - name: Default
    layers:
      - name: Base
        LP:
          mode: region
          c: "[1]"
          e: "[3]"
"#,
        ))
        .unwrap();
        let mapping = maker.export_mapping().unwrap();
        let region = &mapping.groups[0];
        assert_eq!(region.mode, Mode::MouseRegion);
        assert!(region.input("click").is_some());
        assert!(region.input("edge").is_some());
    }

    #[test]
    fn hold_shifter_binds_transitions() {
        let maker = Maker::load(&parse(
            r#"
actions:
  - name: Default
    layers:
      - name: Base
        DP.u: <Up>
      - name: Upper
        BQ.s: (A)
    shifters:
      LB: hold 1
    shiftlayers:
      1: [Upper]
"#,
        ))
        .unwrap();
        let action = &maker.actions[0];
        let names: Vec<&str> =
            action.layers.iter().map(|l| l.name.as_deref().unwrap_or("")).collect();
        assert_eq!(names, vec!["Base", "Upper", "Shift_1"]);

        let mapping = maker.export_mapping().unwrap();
        // Base, Upper, Shift_1 presets in the shared pool.
        assert_eq!(mapping.presets.len(), 3);

        // The base switches group carries the press transition:
        // apply Shift_1 (layer 3), then apply Upper (layer 2).
        let sw = mapping.groups.iter().find(|g| g.mode == Mode::Switches).unwrap();
        let lb = sw.input("left_bumper").unwrap();
        assert_eq!(lb.activators[0].signal, Signal::StartPress);
        let texts: Vec<String> =
            lb.activators[0].bindings.iter().map(|b| b.evgen.to_string()).collect();
        assert_eq!(
            texts,
            vec![
                "controller_action add_layer 3 0 0",
                "controller_action add_layer 2 0 0",
            ]
        );
    }
}
