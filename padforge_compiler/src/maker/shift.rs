//! Shift compiler for the short-hand front end.
//!
//! Same level arithmetic as the DOM exporter's compiler, but the
//! synthesized transitions are expressed in the binding shorthand
//! (overlay operations in braces referencing layer names) and bound into
//! the maker's intermediate layers.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{Error, Result};
use crate::evspec::{Actsig, Evfrob, Evspec, Evsym};
use crate::export::ShiftStyle;
use crate::maker::{MakerLayer, SW_SYMS};
use crate::source::{self, Node};

fn apply_sym(layer: &str) -> Evsym {
    Evsym::Brace(format!("overlay,apply,{}", layer))
}

fn peel_sym(layer: &str) -> Evsym {
    Evsym::Brace(format!("overlay,peel,{}", layer))
}

fn parse_style(name: &str) -> Result<ShiftStyle> {
    match ShiftStyle::from_name(name) {
        Some(ShiftStyle::Latch) | Some(ShiftStyle::Eager) | None => {
            Err(Error::UnknownShiftStyle(name.to_owned()))
        },
        Some(style) => Ok(style),
    }
}

fn debounces(style: ShiftStyle) -> bool {
    matches!(style, ShiftStyle::Bounce | ShiftStyle::Lazy | ShiftStyle::Hermit)
}

#[derive(Debug, Default)]
pub(crate) struct Shifters {
    shifters: Vec<(String, ShiftStyle, u32)>,
    overlays: BTreeMap<u32, Vec<String>>,
    sanity: Option<String>,
    /// Everything the sanity key peels, overlays first.
    involved: Vec<String>,
    maxshift: u32,
}

impl Shifters {
    pub(crate) fn load(action: &Node) -> Result<Option<Shifters>> {
        let Some(shifters_node) = source::attr(action, "shifters") else {
            return Ok(None);
        };
        let mut out = Shifters::default();

        for (srcsym, spec) in source::entries(shifters_node) {
            let spec = source::scalar_text(spec).unwrap_or_default();
            let mut words = spec.split_whitespace();
            let style = parse_style(words.next().unwrap_or("hold"))?;
            let bitmask: u32 = words.next().and_then(|w| w.parse().ok()).unwrap_or(0);
            if style == ShiftStyle::Sanity {
                out.sanity = Some(srcsym);
                continue;
            }
            out.maxshift |= bitmask;
            out.shifters.push((srcsym, style, bitmask));
        }

        if let Some(levels) = source::attr(action, "shiftlayers") {
            for (level, value) in source::entries(levels) {
                let Ok(level) = level.trim().parse::<u32>() else {
                    continue;
                };
                if level == 0 {
                    continue;
                }
                let names: Vec<String> = match value {
                    Node::Sequence(seq) => {
                        seq.iter().filter_map(source::scalar_text).collect()
                    },
                    _ => source::scalar_text(value)
                        .map(|s| s.split_whitespace().map(str::to_owned).collect())
                        .unwrap_or_default(),
                };
                out.involved.extend(names.iter().cloned());
                out.overlays.insert(level, names);
            }
        }
        Ok(Some(out))
    }

    fn preshift_levels(&self) -> BTreeSet<u32> {
        (1..=self.maxshift)
            .filter(|level| {
                self.shifters
                    .iter()
                    .any(|(_, style, bits)| {
                        debounces(*style) && *bits != 0 && level & bits != 0
                    })
            })
            .collect()
    }

    /// Append the `Preshift_k`/`Shift_k` layers this map needs.
    pub(crate) fn generate_layers(&mut self, layers: &mut Vec<MakerLayer>) {
        if layers.is_empty() {
            layers.push(MakerLayer::default());
        }
        let preshift_levels = self.preshift_levels();
        for level in 1..=self.maxshift {
            if preshift_levels.contains(&level) {
                let name = format!("Preshift_{}", level);
                if !has_layer(layers, &name) {
                    layers.push(MakerLayer::named(&name));
                    self.involved.push(name);
                }
            }
            let name = format!("Shift_{}", level);
            if !has_layer(layers, &name) {
                layers.push(MakerLayer::named(&name));
                self.involved.push(name);
            }
        }
    }

    fn make_transition(
        &self,
        from: u32,
        style: ShiftStyle,
        bits: u32,
        preshift_levels: &BTreeSet<u32>,
    ) -> Evspec {
        let (next, rising, actsig) = match style {
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

        let empty = Vec::new();
        let next_names = self.overlays.get(&next).unwrap_or(&empty);
        let from_names =
            if from != 0 { self.overlays.get(&from).unwrap_or(&empty) } else { &empty };

        let mut syms = Vec::new();
        if rising && debounces(style) {
            syms.push(apply_sym(&format!("Preshift_{}", next)));
        } else if next != 0 {
            syms.push(apply_sym(&format!("Shift_{}", next)));
        }
        for name in next_names.iter().filter(|n| !from_names.contains(*n)) {
            syms.push(apply_sym(name));
        }
        if from != 0 {
            for name in from_names.iter().rev().filter(|n| !next_names.contains(*n)) {
                syms.push(peel_sym(name));
            }
            if preshift_levels.contains(&from) {
                syms.push(peel_sym(&format!("Preshift_{}", from)));
            }
            syms.push(peel_sym(&format!("Shift_{}", from)));
        }

        Evspec {
            actsig,
            syms,
            frob: Evfrob::default(),
            label: Some(format!("goto {}", next)),
        }
    }

    fn is_reserved(&self, srcsym: &str) -> bool {
        self.shifters.iter().any(|(sym, _, _)| sym == srcsym)
            || self.sanity.as_deref() == Some(srcsym)
    }

    /// Advancer binds: every pole of every cluster the level's overlays
    /// write to debounces into the stable shift.
    fn bind_advancers(
        &self,
        layers: &mut [MakerLayer],
        preshift_pos: usize,
        level: u32,
    ) -> Result<()> {
        use crate::maker::ClusterKind;

        let mut switch_proxies: BTreeSet<String> = BTreeSet::new();
        let mut cluster_proxies: Vec<(String, ClusterKind)> = Vec::new();
        for name in self.overlays.get(&level).into_iter().flatten() {
            let Some(layer) =
                layers.iter().find(|l| l.name.as_deref() == Some(name.as_str()))
            else {
                continue;
            };
            for (sym, cluster) in &layer.clusters {
                if sym == "SW" {
                    for (sub, _) in &cluster.subparts {
                        if SW_SYMS.contains(&sub.as_str()) {
                            switch_proxies.insert(sub.clone());
                        }
                    }
                } else if !cluster_proxies.iter().any(|(s, _)| s == sym) {
                    cluster_proxies.push((sym.clone(), cluster.kind));
                }
            }
        }

        let mut syms = vec![apply_sym(&format!("Shift_{}", level))];
        for name in self.overlays.get(&level).into_iter().flatten() {
            syms.push(apply_sym(name));
        }
        let advancer = Evspec {
            actsig: Actsig::Start,
            syms,
            frob: Evfrob::default(),
            label: Some(format!("advance Shift_{}", level)),
        };

        let mut targets: Vec<String> = Vec::new();
        for (sym, kind) in &cluster_proxies {
            for sub in advancer_subparts(*kind) {
                targets.push(format!("{}.{}", sym, sub));
            }
        }
        targets.extend(switch_proxies);

        for target in targets {
            if self.is_reserved(&target) {
                continue;
            }
            layers[preshift_pos].bind_srcsym(&target, vec![advancer.clone()])?;
        }
        Ok(())
    }

    /// Bind shifter transitions in every level, the preshift advancers,
    /// and the sanity reset.
    pub(crate) fn bind_shifters(&self, layers: &mut Vec<MakerLayer>) -> Result<()> {
        let preshift_levels = self.preshift_levels();

        for level in 0..=self.maxshift {
            let position = if level == 0 {
                0
            } else {
                match layer_position(layers, &format!("Shift_{}", level)) {
                    Some(pos) => pos,
                    None => continue,
                }
            };
            for (srcsym, style, bits) in &self.shifters {
                let spec = self.make_transition(level, *style, *bits, &preshift_levels);
                layers[position].bind_srcsym(srcsym, vec![spec])?;
            }

            if level > 0 && preshift_levels.contains(&level) {
                if let Some(pre_pos) =
                    layer_position(layers, &format!("Preshift_{}", level))
                {
                    for (srcsym, style, bits) in &self.shifters {
                        let spec =
                            self.make_transition(level, *style, *bits, &preshift_levels);
                        layers[pre_pos].bind_srcsym(srcsym, vec![spec])?;
                    }
                    self.bind_advancers(layers, pre_pos, level)?;
                }
            }
        }

        if let Some(sanity_sym) = &self.sanity {
            let mut seen = BTreeSet::new();
            let mut syms = Vec::new();
            for name in &self.involved {
                if seen.insert(name.clone()) {
                    syms.push(peel_sym(name));
                }
            }
            if !syms.is_empty() {
                let spec = Evspec {
                    actsig: Actsig::Start,
                    syms,
                    frob: Evfrob::default(),
                    label: Some("sanity".to_owned()),
                };
                layers[0].bind_srcsym(sanity_sym, vec![spec])?;
            }
        }
        Ok(())
    }
}

/// Poles an advancer defaults onto, per cluster shape.
fn advancer_subparts(kind: crate::maker::ClusterKind) -> &'static [&'static str] {
    use crate::maker::ClusterKind;
    match kind {
        ClusterKind::Dpad => &["u", "d", "l", "r"],
        ClusterKind::Face => &["s", "e", "w", "n"],
        ClusterKind::Trigger | ClusterKind::JsMove | ClusterKind::JsMouse => &["c", "o"],
        // The camera stick has no edge input.
        ClusterKind::JsCam => &["c"],
        ClusterKind::Single => &["t", "c"],
        ClusterKind::Pen => &["c", "2", "t"],
        ClusterKind::MouseJs => &["c", "2"],
        ClusterKind::Region => &["c", "e", "t"],
        ClusterKind::Pie
        | ClusterKind::Scroll
        | ClusterKind::Switches
        | ClusterKind::Menu => &[],
    }
}

fn has_layer(layers: &[MakerLayer], name: &str) -> bool {
    layer_position(layers, name).is_some()
}

fn layer_position(layers: &[MakerLayer], name: &str) -> Option<usize> {
    layers.iter().position(|l| l.name.as_deref() == Some(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> Node {
        serde_yaml::from_str(src).unwrap()
    }

    fn spec_strings(layer: &MakerLayer, cluster: &str, sub: &str) -> Vec<String> {
        layer
            .cluster(cluster)
            .unwrap_or_else(|| panic!("cluster {} missing", cluster))
            .subpart(sub)
            .unwrap_or_else(|| panic!("subpart {} missing", sub))
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn build(src: &str) -> Vec<MakerLayer> {
        let action = parse(src);
        let mut layers = Vec::new();
        for node in source::children(&action, "layers") {
            layers
                .push(crate::maker::load_layer(&Default::default(), node).unwrap());
        }
        let mut shifters = Shifters::load(&action).unwrap().unwrap();
        shifters.generate_layers(&mut layers);
        shifters.bind_shifters(&mut layers).unwrap();
        layers
    }

    #[test]
    fn hold_transitions_land_in_base_and_shift_layers() {
        let layers = build(
            r#"
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
        );
        let names: Vec<&str> =
            layers.iter().map(|l| l.name.as_deref().unwrap_or("")).collect();
        assert_eq!(names, vec!["Base", "Upper", "Shift_1"]);

        assert_eq!(
            spec_strings(&layers[0], "SW", "LB"),
            vec!["+{overlay,apply,Shift_1}{overlay,apply,Upper}#goto#1"]
        );
        assert_eq!(
            spec_strings(&layers[2], "SW", "LB"),
            vec!["-{overlay,peel,Upper}{overlay,peel,Shift_1}#goto#0"]
        );
    }

    #[test]
    fn bounce_generates_preshift_with_advancers() {
        let layers = build(
            r#"
layers:
  - name: Base
    DP.u: <Up>
  - name: Upper
    BQ.s: (A)
    RB: (X)
shifters:
  LB: bounce 1
shiftlayers:
  1: [Upper]
"#,
        );
        let names: Vec<&str> =
            layers.iter().map(|l| l.name.as_deref().unwrap_or("")).collect();
        assert_eq!(names, vec!["Base", "Upper", "Preshift_1", "Shift_1"]);

        // Press enters through the preshift.
        assert_eq!(
            spec_strings(&layers[0], "SW", "LB"),
            vec!["+{overlay,apply,Preshift_1}{overlay,apply,Upper}#goto#1"]
        );

        let pre = &layers[2];
        // Involved clusters: BQ poles and the RB switch advance.
        for target in ["s", "e", "w", "n"] {
            let specs = spec_strings(pre, "BQ", target);
            assert_eq!(
                specs,
                vec!["+{overlay,apply,Shift_1}{overlay,apply,Upper}#advance#Shift_1"]
            );
        }
        assert_eq!(
            spec_strings(pre, "SW", "RB"),
            vec!["+{overlay,apply,Shift_1}{overlay,apply,Upper}#advance#Shift_1"]
        );
        // The shifter key itself keeps its transition, not an advancer.
        let lb = spec_strings(pre, "SW", "LB");
        assert_eq!(lb.len(), 1);
        assert!(lb[0].starts_with('-'));
    }

    #[test]
    fn sanity_key_peels_involved_layers() {
        let layers = build(
            r#"
layers:
  - name: Base
    DP.u: <Up>
  - name: Upper
    BQ.s: (A)
shifters:
  LB: hold 1
  RG: sanity
shiftlayers:
  1: [Upper]
"#,
        );
        assert_eq!(
            spec_strings(&layers[0], "SW", "RG"),
            vec!["+{overlay,peel,Upper}{overlay,peel,Shift_1}#sanity"]
        );
    }

    #[test]
    fn reserved_styles_rejected() {
        let action = parse("shifters:\n  LB: latch 1");
        assert!(matches!(
            Shifters::load(&action),
            Err(Error::UnknownShiftStyle(name)) if name == "latch"
        ));
    }
}
