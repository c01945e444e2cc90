//! Shift-state compiler.
//!
//! Shifters toggle bits of a shift level; overlays are action layers
//! applied while their level is active. For every source level and every
//! shifter this module synthesizes the transition binding that applies
//! the next level's layers and peels the old level's, plus the debounce
//! (`Preshift_*`) layers with their advancer binds, the stable
//! (`Shift_*`) layers, and the sanity reset.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use log::warn;

use crate::config::group::Mode;
use crate::error::{CodeKind, Error, Result};
use crate::evspec::{Actsig, Evfrob};
use crate::export::{normalize_srcsym, Event, Exporter, Layer, Pole, Synthesis};
use crate::source::{self, Node};

/// Per-shifter emission style.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShiftStyle {
    /// Shifted while held.
    Hold,
    /// Press toggles the level.
    Toggle,
    /// Reserved.
    Latch,
    /// Held, debounced through a preshift layer.
    Bounce,
    /// Same debounced compilation as `Bounce`.
    Lazy,
    /// Reserved.
    Eager,
    /// Peels every involved layer.
    Sanity,
    /// `Bounce` whose alternative emission comes from the hermit table.
    Hermit,
}

impl ShiftStyle {
    pub fn from_name(name: &str) -> Option<ShiftStyle> {
        match name {
            "hold" => Some(ShiftStyle::Hold),
            "toggle" | "lock" => Some(ShiftStyle::Toggle),
            "latch" => Some(ShiftStyle::Latch),
            "bounce" => Some(ShiftStyle::Bounce),
            "lazy" => Some(ShiftStyle::Lazy),
            "eager" => Some(ShiftStyle::Eager),
            "sanity" => Some(ShiftStyle::Sanity),
            "hermit" => Some(ShiftStyle::Hermit),
            _ => None,
        }
    }

    /// Styles that enter a level through its preshift layer.
    fn debounces(self) -> bool {
        matches!(self, ShiftStyle::Bounce | ShiftStyle::Lazy | ShiftStyle::Hermit)
    }
}

#[derive(Clone, Debug)]
struct Shifter {
    srcsym: String,
    style: ShiftStyle,
    bitmask: u32,
}

#[derive(Clone, Debug, Default)]
struct ShiftMap {
    shifters: Vec<Shifter>,
    /// Level to the layer names applied at that level.
    overlays: BTreeMap<u32, Vec<String>>,
    /// Level to the emission fired on release-without-chord.
    hermits: BTreeMap<u32, String>,
    /// Level to extender expressions prepended to its transitions.
    extents: BTreeMap<u32, String>,
    sanity: Option<String>,
    maxshift: u32,
}

fn parse_level(raw: &str) -> Result<u32> {
    raw.trim()
        .parse()
        .map_err(|_| Error::UnknownCode { kind: CodeKind::ShiftLevel, raw: raw.to_owned() })
}

fn parse_style(name: &str) -> Result<ShiftStyle> {
    match ShiftStyle::from_name(name) {
        // Named but reserved until they have a concrete semantics.
        Some(ShiftStyle::Latch) | Some(ShiftStyle::Eager) | None => {
            Err(Error::UnknownShiftStyle(name.to_owned()))
        },
        Some(style) => Ok(style),
    }
}

impl ShiftMap {
    fn from_node(action: &Node) -> Result<Option<ShiftMap>> {
        let nodes = source::children(action, "shiftmap");
        let Some(node) = nodes.first().copied() else {
            return Ok(None);
        };
        let mut map = ShiftMap::default();

        for shifter in source::children(node, "shifter") {
            if let Some(srcsym) = source::text(shifter, "srcsym") {
                let style_name = source::text(shifter, "cmd")
                    .or_else(|| source::text(shifter, "style"))
                    .unwrap_or_else(|| "hold".to_owned());
                let bitmask = source::int(shifter, "bitmask").unwrap_or(0).max(0) as u32;
                map.push_shifter(srcsym, parse_style(&style_name)?, bitmask);
            } else {
                for (srcsym, spec) in source::entries(shifter) {
                    let spec = source::scalar_text(spec).unwrap_or_default();
                    let mut words = spec.split_whitespace();
                    let style = parse_style(words.next().unwrap_or("hold"))?;
                    let bitmask =
                        words.next().and_then(|w| w.parse().ok()).unwrap_or(0);
                    map.push_shifter(srcsym, style, bitmask);
                }
            }
        }

        for overlay in source::children(node, "overlay") {
            if let Some(level) = source::int(overlay, "level") {
                let names = source::children(overlay, "layer")
                    .into_iter()
                    .filter_map(source::scalar_text)
                    .collect();
                map.overlays.insert(level.max(0) as u32, names);
            } else {
                for (level, value) in source::entries(overlay) {
                    let level = parse_level(&level)?;
                    if level == 0 {
                        continue;
                    }
                    let names = match value {
                        Node::Sequence(seq) => {
                            seq.iter().filter_map(source::scalar_text).collect()
                        },
                        _ => source::scalar_text(value)
                            .map(|s| {
                                s.split_whitespace().map(str::to_owned).collect()
                            })
                            .unwrap_or_default(),
                    };
                    map.overlays.insert(level, names);
                }
            }
        }

        for hermit in source::children(node, "hermit") {
            for (level, value) in source::entries(hermit) {
                if let Some(spec) = source::scalar_text(value) {
                    map.hermits.insert(parse_level(&level)?, spec);
                }
            }
        }
        for extend in source::children(node, "extend") {
            for (level, value) in source::entries(extend) {
                if let Some(spec) = source::scalar_text(value) {
                    map.extents.insert(parse_level(&level)?, spec);
                }
            }
        }

        if let Some(sanity) = source::text(node, "sanity") {
            map.sanity = Some(sanity);
        }
        Ok(Some(map))
    }

    fn push_shifter(&mut self, srcsym: String, style: ShiftStyle, bitmask: u32) {
        if style == ShiftStyle::Sanity {
            self.sanity = Some(srcsym);
            return;
        }
        self.maxshift |= bitmask;
        self.shifters.push(Shifter { srcsym, style, bitmask });
    }
}

/// Transition out of `from` for one shifter: extenders first, then the
/// apply/peel sequence.
fn make_transition(
    exporter: &Exporter,
    map: &ShiftMap,
    from: u32,
    shifter: &Shifter,
    preshift_levels: &BTreeSet<u32>,
) -> Result<Vec<Synthesis>> {
    let bits = shifter.bitmask;
    let (next, rising, actsig) = match shifter.style {
        ShiftStyle::Toggle => {
            let next = from ^ bits;
            (next, next & bits == bits, Actsig::Start)
        },
        _ => {
            if from & bits == bits {
                (from & !bits, false, Actsig::Release)
            } else {
                (from | bits, true, Actsig::Start)
            }
        },
    };

    let mut syntheses = Vec::new();
    if let Some(extension) = map.extents.get(&from) {
        syntheses.extend(exporter.expand_syntheses(extension)?);
    }

    // A layer listed at both levels stays applied through the
    // transition rather than being applied and peeled in one binding.
    let next_names: Vec<&String> =
        map.overlays.get(&next).into_iter().flatten().collect();
    let from_names: Vec<&String> = if from != 0 {
        map.overlays.get(&from).into_iter().flatten().collect()
    } else {
        Vec::new()
    };

    let mut events = Vec::new();
    if rising && shifter.style.debounces() {
        events.push(Event::apply(format!("Preshift_{}", next)));
    } else if next != 0 {
        events.push(Event::apply(format!("Shift_{}", next)));
    }
    for name in next_names.iter().copied().filter(|n| !from_names.contains(n)) {
        events.push(Event::apply(name.clone()));
    }
    if from != 0 {
        // Peel the old level, overlays in reverse declaration order.
        for name in from_names.iter().copied().rev().filter(|n| !next_names.contains(n)) {
            events.push(Event::peel(name.clone()));
        }
        if preshift_levels.contains(&from) {
            events.push(Event::peel(format!("Preshift_{}", from)));
        }
        events.push(Event::peel(format!("Shift_{}", from)));
    }

    syntheses.push(Synthesis {
        actsig,
        events,
        frob: Evfrob::default(),
        label: Some(format!("goto {}", next)),
    });
    Ok(syntheses)
}

/// Default poles per cluster shape for preshift advancer binds.
fn advancing_template(sym: &str) -> Option<(Mode, &'static [&'static str])> {
    match sym {
        "LT" | "RT" => Some((Mode::Trigger, &["c", "o"])),
        "DP" => Some((Mode::Dpad, &["u", "d", "l", "r"])),
        "BQ" => Some((Mode::FourButtons, &["a", "b", "x", "y"])),
        "LJ" => Some((Mode::JoystickMove, &["c", "o"])),
        // The camera stick has no edge input.
        "RJ" => Some((Mode::JoystickCamera, &["c"])),
        "LP" | "RP" => Some((Mode::SingleButton, &["t", "c"])),
        "SW" => Some((Mode::Switches, &["BK", "ST", "LB", "RB", "LG", "RG"])),
        _ => None,
    }
}

/// A pole already serving as a shifter or sanity key must keep that
/// binding instead of an advancer.
fn is_reserved_pole(map: &ShiftMap, cluster: &str, pole: &str) -> bool {
    let dotted = format!("{}.{}", cluster, pole);
    let matches_sym = |sym: &str| {
        if sym == pole || sym == dotted {
            return true;
        }
        let (c, p) = normalize_srcsym(sym);
        c.as_deref() == Some(cluster) && p == pole
    };
    map.shifters.iter().any(|s| matches_sym(&s.srcsym))
        || map.sanity.as_deref().map(matches_sym).unwrap_or(false)
}

/// Bind advancers over every cluster the level's overlays write to.
fn bind_advancers(
    map: &ShiftMap,
    layers: &[Layer],
    level: u32,
    pre: &mut Layer,
) -> Result<()> {
    let mut involved: BTreeSet<String> = BTreeSet::new();
    for name in map.overlays.get(&level).into_iter().flatten() {
        if let Some(layer) =
            layers.iter().find(|l| l.name.as_deref() == Some(name.as_str()))
        {
            for cluster in &layer.clusters {
                involved.insert(cluster.sym.clone());
            }
        }
    }

    for sym in involved {
        let Some((style, poles)) = advancing_template(&sym) else {
            continue;
        };
        for pole in poles {
            if is_reserved_pole(map, &sym, pole) {
                continue;
            }
            let mut events = vec![Event::apply(format!("Shift_{}", level))];
            for name in map.overlays.get(&level).into_iter().flatten() {
                events.push(Event::apply(name.clone()));
            }
            let advancer = Synthesis {
                actsig: Actsig::Start,
                events,
                frob: Evfrob::default(),
                label: Some(format!("advance Shift_{}", level)),
            };
            pre.merge_cluster_pole(
                &sym,
                Some(style),
                Pole { sym: (*pole).to_owned(), syntheses: vec![advancer] },
            );
        }
    }
    Ok(())
}

/// Expand an action's layer list with its shift map: shifter binds on
/// the base layer, `(Preshift_k, Shift_k)` pairs for every level, and
/// the sanity reset.
pub(crate) fn apply_shiftmap(
    exporter: &mut Exporter,
    action: &Node,
    mut layers: Vec<Layer>,
) -> Result<Vec<Layer>> {
    let Some(map) = ShiftMap::from_node(action)? else {
        return Ok(layers);
    };
    if layers.is_empty() {
        layers.push(Layer::default());
    }
    diagnose_levels(&map);

    let preshift_levels: BTreeSet<u32> = (1..=map.maxshift)
        .filter(|level| {
            map.shifters
                .iter()
                .any(|s| s.style.debounces() && s.bitmask != 0 && level & s.bitmask != 0)
        })
        .collect();

    for shifter in &map.shifters {
        let syntheses = make_transition(exporter, &map, 0, shifter, &preshift_levels)?;
        layers[0].bind(&shifter.srcsym, syntheses)?;
    }

    // Everything the sanity key will peel, overlays first.
    let mut involved: Vec<String> = Vec::new();
    for names in map.overlays.values() {
        involved.extend(names.iter().cloned());
    }

    for level in 1..=map.maxshift {
        if preshift_levels.contains(&level) {
            let name = format!("Preshift_{}", level);
            let mut pre = Layer::named(&name);
            for shifter in &map.shifters {
                let mut syntheses =
                    make_transition(exporter, &map, level, shifter, &preshift_levels)?;
                if let Some(hermit) = map.hermits.get(&level) {
                    if level & shifter.bitmask == shifter.bitmask {
                        let mut emissions = exporter.expand_syntheses(hermit)?;
                        for emission in &mut emissions {
                            if emission.label.is_none() {
                                emission.label = Some(format!("hermit({})", level));
                            }
                        }
                        syntheses.extend(emissions);
                    }
                }
                pre.bind(&shifter.srcsym, syntheses)?;
            }
            bind_advancers(&map, &layers, level, &mut pre)?;
            involved.push(name);
            layers.push(pre);
        }

        let name = format!("Shift_{}", level);
        let mut stable = Layer::named(&name);
        for shifter in &map.shifters {
            let syntheses =
                make_transition(exporter, &map, level, shifter, &preshift_levels)?;
            stable.bind(&shifter.srcsym, syntheses)?;
        }
        involved.push(name);
        layers.push(stable);
    }

    if let Some(sanity_sym) = map.sanity.clone() {
        let mut seen = HashSet::new();
        let mut events = Vec::new();
        for name in &involved {
            if seen.insert(name.clone()) {
                events.push(Event::peel(name.clone()));
            }
        }
        if !events.is_empty() {
            let synthesis = Synthesis {
                actsig: Actsig::Start,
                events,
                frob: Evfrob::default(),
                label: Some("sanity".to_owned()),
            };
            layers[0].bind(&sanity_sym, vec![synthesis])?;
        }
    }
    Ok(layers)
}

/// Flag levels the declared shifters can never reach, and overlays
/// declared on them; both would otherwise fail silently at runtime.
fn diagnose_levels(map: &ShiftMap) {
    let mut reachable: BTreeSet<u32> = BTreeSet::new();
    reachable.insert(0);
    loop {
        let mut grew = false;
        for level in reachable.clone() {
            for shifter in &map.shifters {
                if shifter.bitmask != 0 && reachable.insert(level ^ shifter.bitmask) {
                    grew = true;
                }
            }
        }
        if !grew {
            break;
        }
    }

    for level in 1..=map.maxshift {
        if !reachable.contains(&level) && map.overlays.contains_key(&level) {
            warn!(
                target: crate::LOG_TARGET_COMPILE,
                "shift level {} is unreachable from the declared shifters", level
            );
        }
    }
}
