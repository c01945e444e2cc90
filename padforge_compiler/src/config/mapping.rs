//! Overlays, presets, and the mapping root.

use log::warn;

use crate::config::activator::{Activator, Signal};
use crate::config::evgen::Binding;
use crate::config::group::{Group, Mode};
use crate::config::settings::{Constraint, Scalar, Settings};
use crate::error::{CodeKind, Error, Result};
use crate::source::{self, Node};
use crate::vdf::Document;
use crate::LOG_TARGET_COMPILE;

/// Group sources a preset may bind a group to. Mode shifts gate on a
/// wider set (the gyro included); that list lives with the generator.
pub const GROUP_SOURCES: &[&str] = &[
    "switch",
    "dpad",
    "button_diamond",
    "left_trackpad",
    "right_trackpad",
    "left_trigger",
    "right_trigger",
    "joystick",
    "right_joystick",
];

const MAPPING_SETTINGS: &[(&str, Constraint)] = &[];

/// An action set (tier 0) or action layer (tier 1).
///
/// Sets and layers share one naming pool: the first overlay is keyed
/// `Default` and later ones `Preset_<1000000+n>`, zero-padded to seven
/// digits. The key doubles as the internal id Steam sorts on.
#[derive(Clone, Debug, PartialEq)]
pub struct Overlay {
    /// Key under `actions`/`action_layers`.
    pub index: String,
    pub title: String,
    pub tier: u8,
    pub legacy: bool,
    pub parent_set_name: Option<String>,
}

impl Overlay {
    pub fn set(index: impl Into<String>, title: impl Into<String>) -> Overlay {
        Overlay {
            index: index.into(),
            title: title.into(),
            tier: 0,
            legacy: true,
            parent_set_name: None,
        }
    }

    pub fn layer(
        index: impl Into<String>,
        title: impl Into<String>,
        parent: impl Into<String>,
    ) -> Overlay {
        Overlay {
            index: index.into(),
            title: title.into(),
            tier: 1,
            legacy: true,
            parent_set_name: Some(parent.into()),
        }
    }

    pub fn encode_kv(&self) -> Document {
        let mut kv = Document::new();
        kv.insert("title", self.title.clone());
        kv.insert("legacy_set", i64::from(self.legacy));
        if self.tier == 1 {
            kv.insert("set_layer", "1");
        }
        if let Some(parent) = &self.parent_set_name {
            kv.insert("parent_set_name", parent.clone());
        }
        kv
    }
}

/// Name for the `n`-th overlay in the shared pool.
pub fn overlay_key(n: usize) -> String {
    if n == 0 {
        "Default".to_owned()
    } else {
        format!("Preset_{:07}", 1_000_000 + n)
    }
}

/// One entry of a preset's `group_source_bindings`.
#[derive(Clone, Debug, PartialEq)]
pub struct GroupSourceBinding {
    pub source: String,
    pub active: bool,
    pub modeshift: bool,
}

impl GroupSourceBinding {
    pub fn new(source: &str, active: bool, modeshift: bool) -> Result<GroupSourceBinding> {
        if !GROUP_SOURCES.contains(&source) {
            return Err(Error::UnknownCode {
                kind: CodeKind::GroupSource,
                raw: source.to_owned(),
            });
        }
        Ok(GroupSourceBinding { source: source.to_owned(), active, modeshift })
    }

    /// Parse the VDF form `<source> active|inactive [modeshift]`.
    pub fn parse(text: &str) -> Result<GroupSourceBinding> {
        let mut words = text.split_whitespace();
        let source = words.next().unwrap_or_default();
        let active = words.next() == Some("active");
        let modeshift = words.next() == Some("modeshift");
        GroupSourceBinding::new(source, active, modeshift)
    }

    pub fn encode(&self) -> String {
        let mut words = vec![self.source.as_str()];
        words.push(if self.active { "active" } else { "inactive" });
        if self.modeshift {
            words.push("modeshift");
        }
        words.join(" ")
    }
}

/// A binding of groups to group sources for one overlay.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Preset {
    pub id: i64,
    pub name: String,
    pub bindings: Vec<(i64, GroupSourceBinding)>,
}

impl Preset {
    pub fn new(id: i64, name: impl Into<String>) -> Preset {
        Preset { id, name: name.into(), bindings: Vec::new() }
    }

    pub fn add_binding(
        &mut self,
        group_id: i64,
        source: &str,
        active: bool,
        modeshift: bool,
    ) -> Result<()> {
        self.bindings.push((group_id, GroupSourceBinding::new(source, active, modeshift)?));
        Ok(())
    }

    pub fn encode_kv(&self) -> Document {
        let mut kv = Document::new();
        kv.insert("id", self.id);
        kv.insert("name", self.name.clone());
        let mut gsb = Document::new();
        for (group_id, binding) in &self.bindings {
            gsb.insert(group_id.to_string(), binding.encode());
        }
        kv.insert("group_source_bindings", gsb);
        kv
    }
}

/// One controller mapping: header fields plus the owned overlays,
/// groups, and presets.
#[derive(Clone, Debug, PartialEq)]
pub struct Mapping {
    pub version: i64,
    pub revision: i64,
    pub title: String,
    pub description: String,
    pub creator: String,
    pub controller_type: String,
    pub timestamp: i64,
    pub actions: Vec<Overlay>,
    pub layers: Vec<Overlay>,
    pub groups: Vec<Group>,
    pub presets: Vec<Preset>,
    settings: Settings,
}

impl Default for Mapping {
    fn default() -> Self {
        Mapping {
            version: 3,
            revision: 1,
            title: "Unnamed".to_owned(),
            description: "Unnamed configuration".to_owned(),
            creator: "(Auto-Generator)".to_owned(),
            controller_type: "controller_steamcontroller_gordon".to_owned(),
            timestamp: -1,
            actions: Vec::new(),
            layers: Vec::new(),
            groups: Vec::new(),
            presets: Vec::new(),
            settings: Settings::new(),
        }
    }
}

impl Mapping {
    pub fn new() -> Mapping {
        Mapping::default()
    }

    /// Append a new group; ids are assigned contiguously.
    pub fn add_group(&mut self, mode: Mode) -> &mut Group {
        let id = self.groups.len() as i64;
        self.groups.push(Group::new(id, mode));
        self.groups.last_mut().expect("just pushed")
    }

    pub fn group_mut(&mut self, id: i64) -> Option<&mut Group> {
        self.groups.iter_mut().find(|g| g.id == id)
    }

    /// Append a new preset keyed into the shared overlay naming pool.
    pub fn add_preset(&mut self) -> &mut Preset {
        let id = self.presets.len();
        self.presets.push(Preset::new(id as i64, overlay_key(id)));
        self.presets.last_mut().expect("just pushed")
    }

    pub fn set_setting(&mut self, key: &str, value: impl Into<Scalar>) -> Result<()> {
        self.settings.set(MAPPING_SETTINGS, key, value)
    }

    pub fn encode_kv(&self) -> Document {
        let mut kv = Document::new();
        kv.insert("version", self.version);
        kv.insert("revision", self.revision);
        kv.insert("title", self.title.clone());
        kv.insert("description", self.description.clone());
        kv.insert("creator", self.creator.clone());
        kv.insert("controller_type", self.controller_type.clone());
        kv.insert("Timestamp", self.timestamp);

        if !self.actions.is_empty() {
            let mut actions = Document::new();
            for overlay in &self.actions {
                actions.insert(overlay.index.clone(), overlay.encode_kv());
            }
            kv.insert("actions", actions);
        }
        if !self.layers.is_empty() {
            let mut layers = Document::new();
            for overlay in &self.layers {
                layers.insert(overlay.index.clone(), overlay.encode_kv());
            }
            kv.insert("action_layers", layers);
        }
        for group in &self.groups {
            kv.insert("group", group.encode_kv());
        }
        for preset in &self.presets {
            kv.insert("preset", preset.encode_kv());
        }
        // The settings table is always written, even when empty.
        kv.insert("settings", self.settings.encode_kv());
        kv
    }

    /// Build from a canonical `controller_mappings` tree.
    pub fn from_node(node: &Node) -> Result<Mapping> {
        let mut mapping = Mapping::new();

        if let Some(n) = source::int(node, "version") {
            mapping.version = n;
        }
        if let Some(n) = source::int(node, "revision") {
            mapping.revision = n;
        }
        if let Some(s) = source::text(node, "title") {
            mapping.title = s;
        }
        if let Some(s) = source::text(node, "description") {
            mapping.description = s;
        }
        if let Some(s) = source::text(node, "creator") {
            mapping.creator = s;
        }
        if let Some(s) = source::text(node, "controller_type") {
            mapping.controller_type = s;
        }
        if let Some(n) =
            source::int(node, "Timestamp").or_else(|| source::int(node, "timestamp"))
        {
            mapping.timestamp = n;
        }

        if let Some(actions) = source::attr(node, "actions") {
            for (index, overlay) in source::entries(actions) {
                mapping.actions.push(overlay_from_node(index, overlay, 0));
            }
        }
        if let Some(layers) = source::attr(node, "action_layers") {
            for (index, overlay) in source::entries(layers) {
                mapping.layers.push(overlay_from_node(index, overlay, 1));
            }
        }
        for group in source::children(node, "group") {
            let parsed = group_from_node(group)?;
            mapping.groups.push(parsed);
        }
        for preset in source::children(node, "preset") {
            let parsed = preset_from_node(preset)?;
            mapping.presets.push(parsed);
        }
        if let Some(settings) = source::attr(node, "settings") {
            for (key, value) in source::entries(settings) {
                if let Some(value) = source::scalar(value) {
                    mapping.set_setting(&key, value)?;
                }
            }
        }
        Ok(mapping)
    }
}

fn overlay_from_node(index: String, node: &Node, tier: u8) -> Overlay {
    Overlay {
        index,
        title: source::text(node, "title").unwrap_or_default(),
        tier,
        legacy: source::int(node, "legacy_set").map(|n| n != 0).unwrap_or(true),
        parent_set_name: source::text(node, "parent_set_name"),
    }
}

fn group_from_node(node: &Node) -> Result<Group> {
    let mode_name = source::text(node, "mode").unwrap_or_default();
    let mode = Mode::from_name(&mode_name)
        .ok_or(Error::UnknownCode { kind: CodeKind::GroupMode, raw: mode_name })?;
    let id = source::int(node, "id").unwrap_or(0);
    let mut group = Group::new(id, mode);

    if let Some(inputs) = source::attr(node, "inputs") {
        for (symbol, input_node) in source::entries(inputs) {
            let input = group.input_mut(&symbol)?;
            if let Some(activators) = source::attr(input_node, "activators") {
                for (signal_name, act_node) in source::entries(activators) {
                    let Some(signal) = Signal::from_vdf_name(&signal_name) else {
                        warn!(
                            target: LOG_TARGET_COMPILE,
                            "skipping activator with unknown signal '{}'", signal_name
                        );
                        continue;
                    };
                    let mut activator = Activator::new(signal);
                    if let Some(bindings) = source::attr(act_node, "bindings") {
                        for binding in source::children(bindings, "binding") {
                            if let Some(text) = source::scalar_text(binding) {
                                activator.add_binding(Binding::parse(&text));
                            }
                        }
                    }
                    if let Some(settings) = source::attr(act_node, "settings") {
                        for (key, value) in source::entries(settings) {
                            if let Some(value) = source::scalar(value) {
                                activator.set_setting(&key, value)?;
                            }
                        }
                    }
                    input.activators.push(activator);
                }
            }
        }
    }
    if let Some(settings) = source::attr(node, "settings") {
        for (key, value) in source::entries(settings) {
            if let Some(value) = source::scalar(value) {
                group.set_setting(&key, value)?;
            }
        }
    }
    Ok(group)
}

fn preset_from_node(node: &Node) -> Result<Preset> {
    let id = source::int(node, "id").unwrap_or(0);
    let name = source::text(node, "name").unwrap_or_default();
    let mut preset = Preset::new(id, name);
    if let Some(gsb) = source::attr(node, "group_source_bindings") {
        for (group_id, value) in source::entries(gsb) {
            let group_id = group_id.parse().unwrap_or(-1);
            if let Some(text) = source::scalar_text(value) {
                preset.bindings.push((group_id, GroupSourceBinding::parse(&text)?));
            }
        }
    }
    Ok(preset)
}

/// Top-level configuration: one value per mapping under repeated
/// `controller_mappings` keys.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ControllerConfig {
    pub mappings: Vec<Mapping>,
}

impl ControllerConfig {
    pub fn new() -> ControllerConfig {
        ControllerConfig::default()
    }

    pub fn encode_kv(&self) -> Document {
        let mut kv = Document::new();
        for mapping in &self.mappings {
            kv.insert("controller_mappings", mapping.encode_kv());
        }
        kv
    }

    /// Build from a canonical tree rooted at `controller_mappings`.
    pub fn from_node(root: &Node) -> Result<ControllerConfig> {
        let mut config = ControllerConfig::new();
        for mapping in source::children(root, "controller_mappings") {
            config.mappings.push(Mapping::from_node(mapping)?);
        }
        Ok(config)
    }
}
