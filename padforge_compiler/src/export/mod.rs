//! DOM-level exporter.
//!
//! Accepts the action/layer source tree (short-hand or canonical),
//! normalizes every cluster and pole key into one internal shape, runs
//! the shift-state compiler over each action, and lowers the result into
//! the configuration model.

mod modeshift;
pub(crate) mod normalize;
mod shift;

pub use modeshift::TokenPool;
pub use shift::ShiftStyle;

use std::collections::HashMap;

use log::warn;

use crate::config::activator::Activator;
use crate::config::evgen::{mangle, Binding, Evgen, GroupRef};
use crate::config::group::Mode;
use crate::config::mapping::{ControllerConfig, Mapping, Overlay};
use crate::error::{CodeKind, Error, Result};
use crate::evspec::{Actsig, Evfrob, Evspec, Evsym};
use crate::source::{self, Node};
use crate::LOG_TARGET_COMPILE;

/// Cluster shorthand symbol to preset group source.
pub(crate) const GRPSRC_MAP: &[(&str, &str)] = &[
    ("SW", "switch"),
    ("BQ", "button_diamond"),
    ("LP", "left_trackpad"),
    ("RP", "right_trackpad"),
    ("LJ", "joystick"),
    ("LT", "left_trigger"),
    ("RT", "right_trigger"),
    ("GY", "gyro"),
    ("DP", "dpad"),
    ("RJ", "right_joystick"),
];

/// Pole symbols that identify their cluster on their own.
pub(crate) const UNIQUE_POLE_SYMS: &[(&str, (&str, &str))] = &[
    ("BK", ("SW", "BK")),
    ("ST", ("SW", "ST")),
    ("LB", ("SW", "LB")),
    ("RB", ("SW", "RB")),
    ("LG", ("SW", "LG")),
    ("RG", ("SW", "RG")),
    ("INF", ("SW", "INF")),
    ("LS", ("LJ", "c")),
    ("RS", ("RJ", "c")),
];

/// Mode-shift gate symbol to switches-group input name.
pub(crate) const MODESHIFT_MAP: &[(&str, &str)] = &[
    ("BK", "button_escape"),
    ("ST", "button_menu"),
    ("LB", "left_bumper"),
    ("RB", "right_bumper"),
    ("LG", "button_back_left"),
    ("RG", "button_back_right"),
    ("LT", "left_trigger"),
    ("LTf", "left_trigger"),
    ("LT.c", "left_trigger"),
    ("RT", "right_trigger"),
    ("RTf", "right_trigger"),
    ("RT.c", "right_trigger"),
    ("LT.o", "left_trigger_threshold"),
    ("LTs", "left_trigger_threshold"),
    ("RT.o", "right_trigger_threshold"),
    ("RTs", "right_trigger_threshold"),
    ("LP", "left_click"),
    ("RP", "right_click"),
    ("LS", "left_stick_click"),
    ("A", "button_a"),
    ("a", "button_a"),
    ("B", "button_b"),
    ("b", "button_b"),
    ("X", "button_x"),
    ("x", "button_x"),
    ("Y", "button_y"),
    ("y", "button_y"),
];

/// Chord-button shorthand symbols.
pub(crate) const CHORD_MAP: &[(&str, i64)] = &[
    ("LB", 1),
    ("RB", 2),
    ("LG", 3),
    ("RG", 4),
    ("LT", 5),
    ("RT", 6),
    ("LS", 9),
    ("A", 10),
    ("B", 11),
    ("X", 12),
    ("Y", 13),
    ("BK", 14),
    ("LP", 18),
    ("RP", 19),
];

pub(crate) fn table_get<'a>(table: &[(&'a str, &'a str)], key: &str) -> Option<&'a str> {
    table.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
}

/// Resolve a source symbol into `(cluster, pole)`.
pub(crate) fn normalize_srcsym(srcsym: &str) -> (Option<String>, String) {
    if let Some((cluster, pole)) = srcsym.split_once('.') {
        return (Some(cluster.to_owned()), pole.to_owned());
    }
    if let Some((_, (cluster, pole))) =
        UNIQUE_POLE_SYMS.iter().find(|(sym, _)| *sym == srcsym)
    {
        return (Some((*cluster).to_owned()), (*pole).to_owned());
    }
    (None, srcsym.to_owned())
}

const SWITCH_SYMS: &[&str] = &["BK", "ST", "LB", "RB", "LG", "RG", "INF"];

/// Infer a cluster style from its pole symbols. The lax first pass may
/// guess; the strict second pass returns `None` when the poles are
/// ambiguous.
pub(crate) fn auto_style(syms: &[&str], strict: bool) -> Option<Mode> {
    if syms.iter().any(|s| matches!(*s, "u" | "d" | "l" | "r")) {
        return Some(Mode::Dpad);
    }
    if syms
        .iter()
        .any(|s| matches!(*s, "a" | "b" | "x" | "y" | "s" | "e" | "w" | "n"))
    {
        return Some(Mode::FourButtons);
    }
    if strict && syms.iter().any(|s| matches!(*s, "c" | "o")) {
        return Some(Mode::JoystickMove);
    }
    if let [sym] = syms {
        if SWITCH_SYMS.contains(sym) {
            return Some(Mode::Switches);
        }
    }

    let nums: Vec<i64> =
        syms.iter().map(|s| s.parse::<i64>().unwrap_or(-1)).collect();
    let max = nums.iter().copied().max().unwrap_or(-1);
    if nums.contains(&0) {
        return Some(Mode::RadialMenu);
    }
    if nums.iter().any(|n| matches!(n, 2 | 4 | 7 | 9 | 12 | 13 | 16)) {
        if !strict {
            return Some(Mode::TouchMenu);
        }
    } else if max > 0 {
        return Some(Mode::RadialMenu);
    }

    if strict {
        None
    } else {
        Some(Mode::Dpad)
    }
}

/// Pole shorthand to the mode's real input symbol.
pub(crate) fn pole_input(mode: Mode, sym: &str) -> Option<String> {
    let fixed = |name: &str| Some(name.to_owned());
    match mode {
        Mode::AbsoluteMouse => match sym {
            "c" => fixed("click"),
            "2" => fixed("doubletap"),
            "t" => fixed("touch"),
            _ => None,
        },
        Mode::Dpad => match sym {
            "u" => fixed("dpad_north"),
            "d" => fixed("dpad_south"),
            "l" => fixed("dpad_west"),
            "r" => fixed("dpad_east"),
            "c" => fixed("click"),
            "o" => fixed("edge"),
            _ => None,
        },
        Mode::FourButtons => match sym {
            "s" | "a" | "A" => fixed("button_a"),
            "e" | "b" | "B" => fixed("button_b"),
            "w" | "x" | "X" => fixed("button_x"),
            "n" | "y" | "Y" => fixed("button_y"),
            _ => None,
        },
        Mode::JoystickCamera | Mode::MouseJoystick => match sym {
            "c" => fixed("click"),
            "2" if mode == Mode::MouseJoystick => fixed("doubletap"),
            _ => None,
        },
        Mode::JoystickMove | Mode::JoystickMouse | Mode::Trigger => match sym {
            "c" => fixed("click"),
            "o" => fixed("edge"),
            _ => None,
        },
        Mode::MouseRegion => match sym {
            "c" => fixed("click"),
            "o" => fixed("edge"),
            "t" => fixed("touch"),
            _ => None,
        },
        Mode::RadialMenu => match sym {
            "c" => fixed("click"),
            _ => menu_button(sym, 0, 20),
        },
        Mode::Scrollwheel => match sym {
            "c" => fixed("click"),
            "u" => fixed("scroll_clockwise"),
            "d" => fixed("scroll_counterclockwise"),
            _ => None,
        },
        Mode::SingleButton => match sym {
            "c" => fixed("click"),
            "t" => fixed("touch"),
            _ => None,
        },
        Mode::Switches => match sym {
            "BK" | "4" => fixed("button_escape"),
            "ST" | "1" => fixed("button_menu"),
            "LB" | "2" => fixed("left_bumper"),
            "RB" | "5" => fixed("right_bumper"),
            "LG" | "3" => fixed("button_back_left"),
            "RG" | "6" => fixed("button_back_right"),
            "INF" => fixed("always_on_action"),
            _ => None,
        },
        Mode::TouchMenu => menu_button(sym, 1, 16),
    }
}

fn menu_button(sym: &str, lo: i64, hi: i64) -> Option<String> {
    if sym.len() != 2 || !sym.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let n: i64 = sym.parse().ok()?;
    if lo <= n && n <= hi {
        Some(format!("touch_menu_button_{}", n))
    } else {
        None
    }
}

/// One synthesized event inside a normalized synthesis.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Event {
    Keyboard(String),
    Gamepad(String),
    Mouse(String),
    Host(String),
    Overlay { action: String, layer: String },
    ModeShift { cluster: String, token: usize },
    /// Unexpandable source text carried through as a placeholder.
    Invalid(String),
    Empty,
}

impl Event {
    /// Shorthand text, used when mangling an invalid binding.
    pub(crate) fn shorthand(&self) -> String {
        match self {
            Event::Keyboard(code) => format!("<{}>", code),
            Event::Gamepad(code) => format!("({})", code),
            Event::Mouse(code) => format!("[{}]", code),
            Event::Host(code) => format!("{{{}}}", code),
            Event::Overlay { action, layer } => format!("{{overlay,{},{}}}", action, layer),
            Event::ModeShift { cluster, token } => {
                format!("{{mode_shift,{},{}}}", cluster, token)
            },
            Event::Invalid(raw) => raw.clone(),
            Event::Empty => "{}".to_owned(),
        }
    }

    pub(crate) fn apply(layer: impl Into<String>) -> Event {
        Event::Overlay { action: "apply".to_owned(), layer: layer.into() }
    }

    pub(crate) fn peel(layer: impl Into<String>) -> Event {
        Event::Overlay { action: "peel".to_owned(), layer: layer.into() }
    }
}

/// One normalized synthesis: an activator-to-be.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct Synthesis {
    pub actsig: Actsig,
    pub events: Vec<Event>,
    pub frob: Evfrob,
    pub label: Option<String>,
}

impl Synthesis {
    pub(crate) fn from_evspec(spec: Evspec) -> Synthesis {
        let events = spec.syms.into_iter().map(event_from_sym).collect();
        Synthesis { actsig: spec.actsig, events, frob: spec.frob, label: spec.label }
    }
}

fn event_from_sym(sym: Evsym) -> Event {
    match sym {
        Evsym::Key(code) => Event::Keyboard(code),
        Evsym::Gamepad(code) => Event::Gamepad(code),
        Evsym::Mouse(code) => Event::Mouse(code),
        Evsym::Brace(content) => {
            if content.is_empty() {
                return Event::Empty;
            }
            let parts: Vec<&str> = content.split(',').collect();
            match parts[0] {
                "overlay" if parts.len() >= 3 => Event::Overlay {
                    action: parts[1].to_owned(),
                    layer: parts[2].to_owned(),
                },
                "mode_shift" | "modeshift" if parts.len() >= 3 => {
                    match parts[2].parse() {
                        Ok(token) => {
                            Event::ModeShift { cluster: parts[1].to_owned(), token }
                        },
                        Err(_) => Event::Host(parts.join(" ")),
                    }
                },
                _ => Event::Host(parts.join(" ")),
            }
        },
    }
}

/// Working copy of one pole.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct Pole {
    pub sym: String,
    pub syntheses: Vec<Synthesis>,
}

/// Working copy of one cluster.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct Cluster {
    pub sym: String,
    pub style: Option<Mode>,
    /// Switches input gating this cluster, when mode-shifted.
    pub modeshift: Option<String>,
    /// Token awaiting this cluster's group id.
    pub token: Option<usize>,
    pub poles: Vec<Pole>,
    pub settings: Option<Node>,
}

impl Cluster {
    fn pole_mut(&mut self, sym: &str) -> &mut Pole {
        if let Some(pos) = self.poles.iter().position(|p| p.sym == sym) {
            return &mut self.poles[pos];
        }
        self.poles.push(Pole { sym: sym.to_owned(), syntheses: Vec::new() });
        self.poles.last_mut().expect("just pushed")
    }

    fn merge_pole(&mut self, pole: Pole) {
        self.pole_mut(&pole.sym.clone()).syntheses.extend(pole.syntheses);
    }

    fn pole_syms(&self) -> Vec<&str> {
        self.poles.iter().map(|p| p.sym.as_str()).collect()
    }
}

/// Working copy of one layer.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct Layer {
    pub name: Option<String>,
    pub clusters: Vec<Cluster>,
}

impl Layer {
    pub(crate) fn named(name: impl Into<String>) -> Layer {
        Layer { name: Some(name.into()), clusters: Vec::new() }
    }

    fn cluster_position(&self, sym: &str, modeshift: Option<&str>) -> Option<usize> {
        self.clusters
            .iter()
            .position(|c| c.sym == sym && c.modeshift.as_deref() == modeshift)
    }

    pub(crate) fn merge_cluster(&mut self, cluster: Cluster) {
        match self.cluster_position(&cluster.sym, cluster.modeshift.as_deref()) {
            Some(pos) => {
                let extant = &mut self.clusters[pos];
                if cluster.style.is_some() {
                    extant.style = cluster.style;
                }
                if cluster.token.is_some() {
                    extant.token = cluster.token;
                }
                if cluster.settings.is_some() {
                    extant.settings = cluster.settings;
                }
                for pole in cluster.poles {
                    extant.merge_pole(pole);
                }
            },
            None => self.clusters.push(cluster),
        }
    }

    /// Merge one pole into the (plain, non-modeshifted) cluster `sym`,
    /// creating it with `style` when absent.
    pub(crate) fn merge_cluster_pole(
        &mut self,
        sym: &str,
        style: Option<Mode>,
        pole: Pole,
    ) {
        let pos = match self.cluster_position(sym, None) {
            Some(pos) => pos,
            None => {
                self.clusters.push(Cluster {
                    sym: sym.to_owned(),
                    style,
                    ..Cluster::default()
                });
                self.clusters.len() - 1
            },
        };
        self.clusters[pos].merge_pole(pole);
    }

    /// Bind syntheses at a source symbol like `LB` or `DP.u`.
    pub(crate) fn bind(&mut self, srcsym: &str, syntheses: Vec<Synthesis>) -> Result<()> {
        let (cluster, pole) = normalize_srcsym(srcsym);
        let Some(cluster) = cluster else {
            return Err(Error::MalformedExpression(srcsym.to_owned()));
        };
        let style = match cluster.as_str() {
            "LT" | "RT" => Some(Mode::Trigger),
            _ => auto_style(&[pole.as_str()], false),
        };
        self.merge_cluster_pole(&cluster, style, Pole { sym: pole, syntheses });
        Ok(())
    }
}

/// Number of `$name` substitutions allowed in one expression before the
/// expansion is declared cyclic.
const MAX_ALIAS_ROUNDS: usize = 64;

/// The DOM exporter.
#[derive(Debug, Default)]
pub struct Exporter {
    aliases: HashMap<String, String>,
    /// Normalized layer names in final overlay order (bases first).
    layer_names: Vec<String>,
    tokens: TokenPool,
}

impl Exporter {
    pub fn new() -> Exporter {
        Exporter::default()
    }

    pub fn load_aliases(&mut self, node: &Node) {
        for (name, value) in source::entries(node) {
            if let Some(value) = source::scalar_text(value) {
                self.aliases.insert(name, value);
            }
        }
    }

    /// Run `$name`/`${name}` substitution to fixpoint. The outermost
    /// unbraced alias leaves its name behind as an auto-label.
    pub(crate) fn expand_aliases(&self, text: &str) -> Result<String> {
        let mut current = text.to_owned();
        let mut autolabel: Option<String> = None;
        let mut rounds = 0;

        while let Some(pos) = current.find('$') {
            rounds += 1;
            if rounds > MAX_ALIAS_ROUNDS {
                return Err(Error::UnresolvedAlias(text.to_owned()));
            }

            let rest = &current[pos + 1..];
            let (name, span_len, braced) = if let Some(stripped) = rest.strip_prefix('{') {
                let Some(end) = stripped.find('}') else {
                    return Err(Error::MalformedExpression(text.to_owned()));
                };
                (stripped[..end].to_owned(), end + 3, true)
            } else {
                let end = rest
                    .char_indices()
                    .find(|(i, c)| {
                        if *i == 0 {
                            !(c.is_ascii_alphabetic() || *c == '_')
                        } else {
                            !(c.is_ascii_alphanumeric() || *c == '_')
                        }
                    })
                    .map(|(i, _)| i)
                    .unwrap_or(rest.len());
                if end == 0 {
                    return Err(Error::MalformedExpression(text.to_owned()));
                }
                (rest[..end].to_owned(), end + 1, false)
            };

            let Some(value) = self.aliases.get(&name) else {
                return Err(Error::UnresolvedAlias(name));
            };
            current.replace_range(pos..pos + span_len, value);
            autolabel = if braced { None } else { Some(name) };
        }

        if let Some(label) = autolabel {
            current.push('#');
            current.push_str(&label);
        }
        Ok(current)
    }

    /// Expand a (possibly space-delimited) shorthand string into
    /// normalized syntheses.
    pub(crate) fn expand_syntheses(&self, text: &str) -> Result<Vec<Synthesis>> {
        let expanded = self.expand_aliases(text)?;
        Ok(Evspec::parse_list(&expanded)?
            .into_iter()
            .map(Synthesis::from_evspec)
            .collect())
    }

    pub(crate) fn allocate_token(&mut self) -> usize {
        self.tokens.allocate()
    }

    /// Lower one event to its generator. Unknown overlay names degrade to
    /// an empty binding; unknown codes bubble up for the caller to turn
    /// into an invalid-binding placeholder.
    fn translate_event(&self, event: &Event) -> Result<Evgen> {
        match event {
            Event::Keyboard(code) => Ok(Evgen::keystroke(code.clone())),
            Event::Gamepad(code) => Evgen::gamepad(code),
            Event::Mouse(code) => Evgen::mouse_switch(code),
            Event::Host(code) => Evgen::host(code),
            Event::Overlay { action, layer } => {
                match self.layer_names.iter().position(|name| name == layer) {
                    // Overlay operations address layers 1-based.
                    Some(pos) => Evgen::overlay(action, (pos + 1).to_string(), "0", "0"),
                    None => {
                        warn!(
                            target: LOG_TARGET_COMPILE,
                            "overlay reference to unknown layer '{}'", layer
                        );
                        Ok(Evgen::Empty)
                    },
                }
            },
            Event::ModeShift { cluster, token } => {
                let source = table_get(GRPSRC_MAP, cluster)
                    .map(str::to_owned)
                    .unwrap_or_else(|| cluster.clone());
                Evgen::mode_shift(&source, GroupRef::Token(*token))
            },
            Event::Invalid(raw) => Ok(Evgen::Invalid(mangle(raw))),
            Event::Empty => Ok(Evgen::Empty),
        }
    }

    /// Lower one synthesis to an activator on `input`.
    fn export_synthesis(
        &self,
        synthesis: &Synthesis,
        input: &mut crate::config::activator::Input,
    ) -> Result<()> {
        let mut activator = Activator::new(synthesis.actsig.to_signal());
        synthesis.frob.apply(&mut activator)?;

        for event in &synthesis.events {
            let binding = match self.translate_event(event) {
                Ok(evgen) => Binding::with_label(evgen, synthesis.label.clone()),
                Err(err @ Error::UnknownCode { .. }) => {
                    warn!(
                        target: LOG_TARGET_COMPILE,
                        "{}; emitting placeholder binding", err
                    );
                    Binding::with_label(
                        Evgen::Invalid(mangle(&event.shorthand())),
                        synthesis.label.clone(),
                    )
                },
                Err(err) => return Err(err),
            };
            activator.add_binding(binding);
        }
        input.activators.push(activator);
        Ok(())
    }

    fn export_cluster(
        &self,
        cluster: &Cluster,
        group: &mut crate::config::group::Group,
    ) -> Result<()> {
        for pole in &cluster.poles {
            let symbol = pole_input(group.mode, &pole.sym)
                .unwrap_or_else(|| pole.sym.clone());
            let input = group.input_mut(&symbol)?;
            for synthesis in &pole.syntheses {
                self.export_synthesis(synthesis, input)?;
            }
        }
        if let Some(settings) = &cluster.settings {
            for (key, value) in normalize::normalize_settings(settings, group.mode)? {
                group.set_setting(&key, value)?;
            }
        }
        Ok(())
    }

    /// Lower one normalized layer into a preset, its groups, and an
    /// overlay entry.
    fn export_layer(
        &mut self,
        layer: &Layer,
        mapping: &mut Mapping,
        tier: u8,
        parent: Option<&str>,
    ) -> Result<String> {
        let preset_pos = mapping.presets.len();
        let key = mapping.add_preset().name.clone();

        for cluster in &layer.clusters {
            let source = table_get(GRPSRC_MAP, &cluster.sym)
                .ok_or_else(|| Error::UnknownCode {
                    kind: CodeKind::GroupSource,
                    raw: cluster.sym.clone(),
                })?
                .to_owned();
            let modeshift = cluster.modeshift.is_some();

            let existing = mapping.presets[preset_pos]
                .bindings
                .iter()
                .find(|(_, gsb)| gsb.source == source && gsb.modeshift == modeshift)
                .map(|(id, _)| *id);

            let group_id = match existing {
                Some(id) => id,
                None => {
                    let style = match cluster.style {
                        Some(style) => style,
                        None => auto_style(&cluster.pole_syms(), true).ok_or_else(
                            || Error::UnknownCode {
                                kind: CodeKind::GroupMode,
                                raw: cluster.sym.clone(),
                            },
                        )?,
                    };
                    let id = mapping.add_group(style).id;
                    mapping.presets[preset_pos].add_binding(id, &source, true, modeshift)?;
                    if let Some(token) = cluster.token {
                        self.tokens.assign(token, id);
                    }
                    id
                },
            };

            let group = mapping.group_mut(group_id).expect("group just resolved");
            self.export_cluster(cluster, group)?;
        }

        let title = layer.name.clone().unwrap_or_else(|| key.clone());
        if tier == 0 {
            // The first action set is always titled Default.
            let title = if mapping.actions.is_empty() { "Default".to_owned() } else { title };
            mapping.actions.push(Overlay::set(key.clone(), title));
        } else {
            let parent = parent.unwrap_or("Default");
            mapping.layers.push(Overlay::layer(key.clone(), title, parent));
        }
        Ok(key)
    }

    /// Normalize one action's layers and run the shift compiler.
    fn prepare_action(&mut self, action: &Node) -> Result<Vec<Layer>> {
        let mut layers = Vec::new();
        for layer_node in source::children(action, "layer") {
            layers.push(normalize::normalize_layer(self, layer_node)?);
        }
        shift::apply_shiftmap(self, action, layers)
    }

    /// Lower the whole source document into one mapping.
    pub fn export_mapping(&mut self, root: &Node) -> Result<Mapping> {
        if let Some(aliases) = source::attr(root, "aliases") {
            self.load_aliases(aliases);
        }

        let mut mapping = Mapping::new();
        if let Some(title) =
            source::text(root, "name").or_else(|| source::text(root, "title"))
        {
            mapping.title = title;
        }
        if let Some(revision) =
            source::int(root, "rev").or_else(|| source::int(root, "revision"))
        {
            mapping.revision = revision;
        }
        if let Some(description) = source::text(root, "desc")
            .or_else(|| source::text(root, "descr"))
            .or_else(|| source::text(root, "description"))
        {
            mapping.description = description;
        }
        if let Some(creator) =
            source::text(root, "creator").or_else(|| source::text(root, "author"))
        {
            mapping.creator = creator;
        }
        if let Some(devtype) = source::text(root, "devtype")
            .or_else(|| source::text(root, "controller_type"))
        {
            mapping.controller_type = devtype;
        }
        if let Some(timestamp) = source::int(root, "Timestamp")
            .or_else(|| source::int(root, "timestamp"))
        {
            mapping.timestamp = timestamp;
        }

        let mut actions: Vec<Vec<Layer>> = Vec::new();
        for action in source::children(root, "action") {
            actions.push(self.prepare_action(action)?);
        }

        // Overlay ids resolve against the final order: bases first.
        self.layer_names.clear();
        for layers in &actions {
            if let Some(base) = layers.first() {
                self.layer_names.push(base.name.clone().unwrap_or_default());
            }
        }
        for layers in &actions {
            for layer in layers.iter().skip(1) {
                self.layer_names.push(layer.name.clone().unwrap_or_default());
            }
        }

        let mut base_keys = Vec::new();
        for layers in &actions {
            match layers.first() {
                Some(base) => {
                    let key = self.export_layer(base, &mut mapping, 0, None)?;
                    base_keys.push(key);
                },
                None => base_keys.push("Default".to_owned()),
            }
        }
        for (layers, base_key) in actions.iter().zip(&base_keys) {
            for layer in layers.iter().skip(1) {
                self.export_layer(layer, &mut mapping, 1, Some(base_key))?;
            }
        }

        modeshift::resolve_mapping(&self.tokens, &mut mapping);
        Ok(mapping)
    }

    pub fn export_config(&mut self, root: &Node) -> Result<ControllerConfig> {
        let mut config = ControllerConfig::new();
        config.mappings.push(self.export_mapping(root)?);
        Ok(config)
    }
}
