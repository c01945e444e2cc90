//! Activators: temporal patterns over one input pole.

use crate::config::evgen::Binding;
use crate::config::settings::{Constraint, Scalar, Settings};
use crate::error::Result;
use crate::vdf::Document;

/// Well-known activator settings keys.
pub mod keys {
    pub const TOGGLE: &str = "toggle";
    // Steam's own spelling.
    pub const INTERRUPTABLE: &str = "interruptable";
    pub const DELAY_START: &str = "delay_start";
    pub const DELAY_END: &str = "delay_end";
    pub const HAPTIC_INTENSITY: &str = "haptic_intensity";
    pub const CYCLE: &str = "cycle";
    pub const HOLD_REPEATS: &str = "hold_repeats";
    pub const REPEAT_RATE: &str = "repeat_rate";
    pub const DOUBLE_TAP_TIME: &str = "double_tap_time";
    pub const LONG_PRESS_TIME: &str = "long_press_time";
    pub const CHORD_BUTTON: &str = "chord_button";
}

pub const HAPTIC_INTENSITY: &[(&str, i64)] =
    &[("off", 0), ("low", 1), ("medium", 2), ("high", 3)];

pub const CHORD_BUTTON: &[(&str, i64)] = &[
    ("none", 0),
    ("left_bumper", 1),
    ("right_bumper", 2),
    ("left_grip", 3),
    ("right_grip", 4),
    ("left_trigger_full", 5),
    ("right_trigger_full", 6),
    ("left_trigger_soft", 7),
    ("right_trigger_soft", 8),
    ("joystick_click", 9),
    ("button_a", 10),
    ("button_b", 11),
    ("button_x", 12),
    ("button_y", 13),
    ("select", 14),
    ("start", 15),
    ("left_pad_touch", 16),
    ("right_pad_touch", 17),
    ("left_pad_click", 18),
    ("right_pad_click", 19),
];

const FULL_PRESS: &[(&str, Constraint)] = &[
    (keys::TOGGLE, Constraint::Bool),
    (keys::INTERRUPTABLE, Constraint::Bool),
    (keys::DELAY_START, Constraint::Int),
    (keys::DELAY_END, Constraint::Int),
    (keys::HAPTIC_INTENSITY, Constraint::Enum(HAPTIC_INTENSITY)),
    (keys::CYCLE, Constraint::Bool),
    (keys::HOLD_REPEATS, Constraint::Bool),
    (keys::REPEAT_RATE, Constraint::IntRange(1, 9999)),
];

const DOUBLE_PRESS: &[(&str, Constraint)] = &[
    (keys::DOUBLE_TAP_TIME, Constraint::Int),
    (keys::TOGGLE, Constraint::Bool),
    (keys::INTERRUPTABLE, Constraint::Bool),
    (keys::DELAY_START, Constraint::Int),
    (keys::DELAY_END, Constraint::Int),
    (keys::HAPTIC_INTENSITY, Constraint::Enum(HAPTIC_INTENSITY)),
    (keys::CYCLE, Constraint::Bool),
    (keys::HOLD_REPEATS, Constraint::Bool),
    (keys::REPEAT_RATE, Constraint::IntRange(1, 9999)),
];

const LONG_PRESS: &[(&str, Constraint)] = &[
    (keys::LONG_PRESS_TIME, Constraint::Int),
    (keys::TOGGLE, Constraint::Bool),
    (keys::INTERRUPTABLE, Constraint::Bool),
    (keys::DELAY_START, Constraint::Int),
    (keys::DELAY_END, Constraint::Int),
    (keys::HAPTIC_INTENSITY, Constraint::Enum(HAPTIC_INTENSITY)),
    (keys::CYCLE, Constraint::Bool),
    (keys::HOLD_REPEATS, Constraint::Bool),
    (keys::REPEAT_RATE, Constraint::IntRange(1, 9999)),
];

const START_PRESS: &[(&str, Constraint)] = &[
    (keys::TOGGLE, Constraint::Bool),
    (keys::DELAY_START, Constraint::Int),
    (keys::DELAY_END, Constraint::Int),
    (keys::HAPTIC_INTENSITY, Constraint::Enum(HAPTIC_INTENSITY)),
    (keys::CYCLE, Constraint::Bool),
];

const RELEASE: &[(&str, Constraint)] = &[
    (keys::TOGGLE, Constraint::Bool),
    (keys::INTERRUPTABLE, Constraint::Bool),
    (keys::DELAY_START, Constraint::Int),
    (keys::DELAY_END, Constraint::Int),
    (keys::HAPTIC_INTENSITY, Constraint::Enum(HAPTIC_INTENSITY)),
];

const CHORD: &[(&str, Constraint)] = &[
    (keys::CHORD_BUTTON, Constraint::Enum(CHORD_BUTTON)),
    (keys::TOGGLE, Constraint::Bool),
    (keys::INTERRUPTABLE, Constraint::Bool),
    (keys::DELAY_START, Constraint::Int),
    (keys::DELAY_END, Constraint::Int),
    (keys::HAPTIC_INTENSITY, Constraint::Enum(HAPTIC_INTENSITY)),
    (keys::HOLD_REPEATS, Constraint::Bool),
    (keys::REPEAT_RATE, Constraint::IntRange(1, 9999)),
];

/// The trigger pattern an activator listens for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Signal {
    FullPress,
    DoublePress,
    LongPress,
    StartPress,
    Release,
    Chord,
}

impl Signal {
    /// Signal name as it appears in the VDF `activators` table.
    pub fn vdf_name(self) -> &'static str {
        match self {
            Signal::FullPress => "Full_Press",
            Signal::DoublePress => "Double_Press",
            Signal::LongPress => "Long_Press",
            Signal::StartPress => "Start_Press",
            Signal::Release => "release",
            Signal::Chord => "chord",
        }
    }

    pub fn from_vdf_name(name: &str) -> Option<Signal> {
        match name {
            "Full_Press" => Some(Signal::FullPress),
            "Double_Press" => Some(Signal::DoublePress),
            "Long_Press" => Some(Signal::LongPress),
            "Start_Press" => Some(Signal::StartPress),
            "release" | "Release" => Some(Signal::Release),
            "chord" | "Chord" => Some(Signal::Chord),
            _ => None,
        }
    }

    /// Constraint table for this variant's settings.
    pub fn constraints(self) -> &'static [(&'static str, Constraint)] {
        match self {
            Signal::FullPress => FULL_PRESS,
            Signal::DoublePress => DOUBLE_PRESS,
            Signal::LongPress => LONG_PRESS,
            Signal::StartPress => START_PRESS,
            Signal::Release => RELEASE,
            Signal::Chord => CHORD,
        }
    }

    /// The key the `:N` shorthand frob writes for this variant.
    pub fn specific_key(self) -> Option<&'static str> {
        match self {
            Signal::LongPress => Some(keys::LONG_PRESS_TIME),
            Signal::DoublePress => Some(keys::DOUBLE_TAP_TIME),
            Signal::Chord => Some(keys::CHORD_BUTTON),
            _ => None,
        }
    }
}

/// Activator: a signal, the bindings it fires, and validated settings.
#[derive(Clone, Debug, PartialEq)]
pub struct Activator {
    pub signal: Signal,
    pub bindings: Vec<Binding>,
    settings: Settings,
}

impl Activator {
    pub fn new(signal: Signal) -> Activator {
        Activator { signal, bindings: Vec::new(), settings: Settings::new() }
    }

    pub fn add_binding(&mut self, binding: Binding) {
        self.bindings.push(binding);
    }

    pub fn set_setting(&mut self, key: &str, value: impl Into<Scalar>) -> Result<()> {
        self.settings.set(self.signal.constraints(), key, value)
    }

    pub fn setting(&self, key: &str) -> Option<&Scalar> {
        self.settings.get(key)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn encode_kv(&self) -> Document {
        let mut kv = Document::new();
        let mut bindings = Document::new();
        for binding in &self.bindings {
            bindings.insert("binding", binding.to_string());
        }
        kv.insert("bindings", bindings);
        if !self.settings.is_empty() {
            kv.insert("settings", self.settings.encode_kv());
        }
        kv
    }
}

/// An input pole within a group, holding its activators.
#[derive(Clone, Debug, PartialEq)]
pub struct Input {
    pub symbol: String,
    pub activators: Vec<Activator>,
}

impl Input {
    pub fn new(symbol: impl Into<String>) -> Input {
        Input { symbol: symbol.into(), activators: Vec::new() }
    }

    pub fn encode_kv(&self) -> Document {
        let mut activators = Document::new();
        for activator in &self.activators {
            activators.insert(activator.signal.vdf_name(), activator.encode_kv());
        }
        let mut kv = Document::new();
        kv.insert("activators", activators);
        kv
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::evgen::Evgen;
    use crate::config::settings::Scalar;
    use crate::error::Error;
    use crate::vdf::Value;

    #[test]
    fn signal_names_round_trip() {
        for signal in [
            Signal::FullPress,
            Signal::DoublePress,
            Signal::LongPress,
            Signal::StartPress,
            Signal::Release,
            Signal::Chord,
        ] {
            assert_eq!(Signal::from_vdf_name(signal.vdf_name()), Some(signal));
        }
    }

    #[test]
    fn settings_follow_variant_constraints() {
        let mut act = Activator::new(Signal::LongPress);
        act.set_setting(keys::LONG_PRESS_TIME, 180i64).unwrap();
        act.set_setting(keys::REPEAT_RATE, 250i64).unwrap();
        assert!(matches!(
            act.set_setting(keys::REPEAT_RATE, 0i64),
            Err(Error::InvalidValue { .. })
        ));
        assert_eq!(act.setting(keys::REPEAT_RATE), Some(&Scalar::Int(250)));
    }

    #[test]
    fn chord_button_accepts_symbolic_names() {
        let mut act = Activator::new(Signal::Chord);
        act.set_setting(keys::CHORD_BUTTON, "left_bumper").unwrap();
        assert_eq!(act.setting(keys::CHORD_BUTTON), Some(&Scalar::Int(1)));
    }

    #[test]
    fn encode_emits_bindings_then_settings() {
        let mut act = Activator::new(Signal::FullPress);
        act.add_binding(Binding::new(Evgen::keystroke("A")));
        act.add_binding(Binding::new(Evgen::keystroke("B")));
        act.set_setting(keys::TOGGLE, true).unwrap();

        let kv = act.encode_kv();
        let bindings = kv.get("bindings").and_then(Value::as_table).unwrap();
        let all: Vec<&str> =
            bindings.get_all("binding").unwrap().iter().filter_map(Value::as_str).collect();
        assert_eq!(all, vec!["key_press A", "key_press B"]);
        let settings = kv.get("settings").and_then(Value::as_table).unwrap();
        assert_eq!(settings.get("toggle").and_then(Value::as_str), Some("1"));
    }
}
