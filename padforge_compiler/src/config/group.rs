//! Input groups: one mode configuration of a physical cluster.

use crate::config::activator::{Input, HAPTIC_INTENSITY};
use crate::config::settings::{Constraint, Scalar, Settings};
use crate::error::{CodeKind, Error, Result};
use crate::vdf::Document;

const ACCELERATION: &[(&str, i64)] = &[("off", 0), ("low", 1), ("medium", 2), ("high", 3)];

const CURVE_EXPONENT: &[(&str, i64)] = &[
    ("linear", 0),
    ("aggressive", 1),
    ("relaxed", 2),
    ("wide", 3),
    ("extra_wide", 4),
    ("custom", 5),
];

const FRICTION: &[(&str, i64)] =
    &[("off", 0), ("low", 1), ("medium", 2), ("high", 3), ("default", 2)];

/// Trackball friction for the absolute-mouse pad; `none` spins forever.
const FRICTION_SPIN: &[(&str, i64)] =
    &[("off", 0), ("low", 1), ("medium", 2), ("high", 3), ("none", 4)];

const GYRO_BUTTON: &[(&str, i64)] = &[
    ("right_pad_touch", 1),
    ("left_pad_touch", 2),
    ("right_pad_click", 3),
    ("left_pad_click", 4),
    ("right_bumper", 5),
    ("left_bumper", 6),
    ("right_grip", 7),
    ("left_grip", 8),
    ("right_trigger_full", 9),
    ("left_trigger_full", 10),
    ("right_trigger_soft", 11),
    ("left_trigger_soft", 12),
    ("a", 13),
    ("b", 14),
    ("x", 15),
    ("y", 16),
    ("left_stick_click", 17),
];

const MOUSE_DAMPENING_TRIGGER: &[(&str, i64)] = &[
    ("no", 0),
    ("right_trigger_soft_pull", 1),
    ("left_trigger_soft_pull", 2),
    ("both_trigger_soft_pull", 3),
    ("right_trigger_full_pull", 4),
    ("left_trigger_full_pull", 5),
    ("both_trigger_full_pull", 6),
];

const SWIPE_DURATION: &[(&str, i64)] = &[("off", 0), ("low", 1), ("medium", 2), ("high", 3)];

pub(crate) const DPAD_LAYOUT: &[(&str, i64)] = &[
    ("four_way", 0),
    ("eight_way", 1),
    ("analog_emulation", 2),
    ("analog", 2),
    ("cross_gate", 3),
];

const TOUCHMENU_BUTTON_FIRE_TYPE: &[(&str, i64)] = &[
    ("button_click", 0),
    ("button_release", 1),
    ("touch_release_modeshift_end", 2),
    ("touch_release", 2),
    ("modeshift_end", 2),
    ("always", 3),
];

const SCROLL_TYPE: &[(&str, i64)] = &[("circular", 0), ("horizontal", 1), ("vertical", 2)];

const ADAPTIVE_THRESHOLD: &[(&str, i64)] = &[
    ("simple_threshold", 0),
    ("hair_trigger", 1),
    ("hip_fire_aggressive", 2),
    ("hip_fire_normal", 3),
    ("hip_fire_relaxed", 4),
    ("hip_fire_exclusive", 5),
];

const OUTPUT_AXIS: &[(&str, i64)] = &[("horizontal", 0), ("vertical", 1), ("both", 2)];

const OUTPUT_TRIGGER: &[(&str, i64)] =
    &[("no_analog", 0), ("left_trigger", 1), ("right_trigger", 2)];

const CAMERA_OUTPUT_JOYSTICK: &[(&str, i64)] =
    &[("matched_side", 0), ("opposite_side", 1), ("relative_mouse", 2)];

const MOUSE_OUTPUT_JOYSTICK: &[(&str, i64)] = &[("matched_side", 0), ("opposite_side", 1)];

const MOVE_OUTPUT_JOYSTICK: &[(&str, i64)] =
    &[("left_joystick", 0), ("right_joystick", 1), ("relative_joystick", 2)];

const REGION_OUTPUT_JOYSTICK: &[(&str, i64)] = &[("left", 0), ("right", 1), ("mouse", 2)];

const ABSOLUTE_MOUSE: &[(&str, Constraint)] = &[
    ("sensitivity", Constraint::IntRange(1, 1000)),
    ("trackball", Constraint::Bool),
    ("doubletap_beep", Constraint::Bool),
    ("invert_x", Constraint::Bool),
    ("invert_y", Constraint::Bool),
    ("haptic_intensity", Constraint::Enum(HAPTIC_INTENSITY)),
    ("rotation", Constraint::IntRange(-30, 30)),
    ("friction", Constraint::Enum(FRICTION_SPIN)),
    ("friction_vert_scale", Constraint::IntRange(0, 200)),
    ("sensitivity_vert_scale", Constraint::IntRange(0, 200)),
    ("acceleration", Constraint::Enum(ACCELERATION)),
    ("mouse_move_threshold", Constraint::IntRange(0, 40)),
    ("mouse_smoothing", Constraint::IntRange(0, 40)),
    ("edge_spin_velocity", Constraint::IntRange(0, 1000)),
    ("edge_spin_radius", Constraint::IntRange(0, 32767)),
    // Steam's own misspelling.
    ("doubetap_max_duration", Constraint::IntRange(20, 500)),
    ("mouse_dampening_trigger", Constraint::Enum(MOUSE_DAMPENING_TRIGGER)),
    ("mouse_trigger_clamp_amount", Constraint::IntRange(0, 100)),
    ("gyro_axis", Constraint::OneOf(&[0, 1])),
    ("gyro_button", Constraint::Enum(GYRO_BUTTON)),
    ("gyro_button_invert", Constraint::OneOf(&[1, 2])),
    ("deadzone_outer_radius", Constraint::IntRange(0, 32000)),
];

const DPAD: &[(&str, Constraint)] = &[
    ("requires_click", Constraint::Bool),
    ("layout", Constraint::Enum(DPAD_LAYOUT)),
    ("deadzone", Constraint::IntRange(0, 32767)),
    ("edge_binding_radius", Constraint::IntRange(10000, 32000)),
    ("edge_binding_invert", Constraint::Bool),
    ("analog_emulation_period", Constraint::IntRange(1, 500)),
    ("overlap_region", Constraint::IntRange(2000, 16000)),
    ("gyro_button_invert", Constraint::Bool),
    ("gyro_button", Constraint::Enum(GYRO_BUTTON)),
    ("haptic_intensity_override", Constraint::Enum(HAPTIC_INTENSITY)),
    ("gyro_neutral", Constraint::IntRange(0, 32767)),
];

const FOUR_BUTTONS: &[(&str, Constraint)] = &[
    ("requires_click", Constraint::Bool),
    ("button_size", Constraint::IntRange(1, 32767)),
    ("button_dist", Constraint::IntRange(1, 32767)),
];

const JOYSTICK_CAMERA: &[(&str, Constraint)] = &[
    ("curve_exponent", Constraint::Enum(CURVE_EXPONENT)),
    ("swipe_duration", Constraint::Enum(SWIPE_DURATION)),
    ("haptic_intensity", Constraint::Enum(HAPTIC_INTENSITY)),
    ("output_joystick", Constraint::Enum(CAMERA_OUTPUT_JOYSTICK)),
    ("sensitivity_vert_scale", Constraint::IntRange(25, 175)),
    ("anti_deadzone", Constraint::IntRange(0, 32767)),
    ("anti_deadzone_buffer", Constraint::IntRange(0, 32767)),
    ("invert_x", Constraint::Bool),
    ("invert_y", Constraint::Bool),
    ("joystick_smoothing", Constraint::Bool),
    ("sensitivity", Constraint::IntRange(10, 1000)),
    ("gyro_button", Constraint::Enum(GYRO_BUTTON)),
    ("gyro_neutral", Constraint::IntRange(0, 32767)),
];

const JOYSTICK_MOUSE: &[(&str, Constraint)] = &[
    ("curve_exponent", Constraint::Enum(CURVE_EXPONENT)),
    ("custom_curve_exponent", Constraint::Int),
    ("edge_binding_radius", Constraint::IntRange(0, 32767)),
    ("edge_binding_invert", Constraint::Bool),
    ("anti_deadzone", Constraint::IntRange(0, 32767)),
    ("anti_deadzone_buffer", Constraint::IntRange(0, 32767)),
    ("output_joystick", Constraint::Enum(MOUSE_OUTPUT_JOYSTICK)),
];

const JOYSTICK_MOVE: &[(&str, Constraint)] = &[
    ("curve_exponent", Constraint::Enum(CURVE_EXPONENT)),
    ("custom_curve_exponent", Constraint::IntRange(25, 375)),
    ("edge_binding_radius", Constraint::IntRange(0, 32767)),
    ("edge_binding_invert", Constraint::Bool),
    ("output_joystick", Constraint::Enum(MOVE_OUTPUT_JOYSTICK)),
    ("anti_deadzone", Constraint::IntRange(0, 32767)),
    ("anti_deadzone_buffer", Constraint::IntRange(0, 32767)),
    ("haptic_intensity", Constraint::Enum(HAPTIC_INTENSITY)),
    ("deadzone_inner_radius", Constraint::IntRange(0, 32000)),
    ("deadzone_outer_radius", Constraint::IntRange(0, 32000)),
    ("output_axis", Constraint::Enum(OUTPUT_AXIS)),
    ("gyro_lock_extents", Constraint::Bool),
    ("invert_x", Constraint::Bool),
    ("invert_y", Constraint::Bool),
    ("sensitivity", Constraint::IntRange(1, 100)),
    ("sensitivity_vert_scale", Constraint::IntRange(1, 100)),
    ("sensitivity_horiz_scale", Constraint::IntRange(1, 100)),
    ("gyro_neutral", Constraint::IntRange(0, 32767)),
    ("gyro_button", Constraint::Enum(GYRO_BUTTON)),
    ("gyro_button_invert", Constraint::Bool),
];

const MOUSE_JOYSTICK: &[(&str, Constraint)] = &[
    ("trackball", Constraint::Bool),
    ("doubletap_beep", Constraint::Bool),
    ("invert_x", Constraint::Bool),
    ("invert_y", Constraint::Bool),
    ("haptic_intensity", Constraint::Enum(HAPTIC_INTENSITY)),
    ("rotation", Constraint::IntRange(-30, 30)),
    ("friction", Constraint::Enum(FRICTION)),
    ("sensitivity_vert_scale", Constraint::IntRange(0, 200)),
    ("mouse_move_threshold", Constraint::IntRange(0, 40)),
    ("edge_spin_velocity", Constraint::IntRange(0, 1000)),
    ("edge_spin_radius", Constraint::IntRange(0, 32767)),
    ("doubetap_max_duration", Constraint::IntRange(20, 500)),
    ("mouse_dampening_trigger", Constraint::Enum(MOUSE_DAMPENING_TRIGGER)),
    ("mouse_trigger_clamp_amount", Constraint::Int),
    ("mousejoystick_deadzone_x", Constraint::IntRange(0, 32767)),
    ("mousejoystick_deadzone_y", Constraint::IntRange(0, 32767)),
    ("mousejoystick_precision", Constraint::IntRange(1, 100)),
    ("custom_curve_exponent", Constraint::IntRange(100, 300)),
    ("gyro_button", Constraint::Enum(GYRO_BUTTON)),
    ("gyro_button_invert", Constraint::OneOf(&[1, 2])),
    ("gyro_axis", Constraint::OneOf(&[0, 1])),
    ("gyro_sensitivity_scale", Constraint::Int),
];

const MOUSE_REGION: &[(&str, Constraint)] = &[
    ("edge_binding_radius", Constraint::IntRange(1, 32767)),
    ("edge_binding_invert", Constraint::Bool),
    ("haptic_intensity", Constraint::Enum(HAPTIC_INTENSITY)),
    ("output_joystick", Constraint::Enum(REGION_OUTPUT_JOYSTICK)),
    ("scale", Constraint::IntRange(1, 100)),
    ("position_x", Constraint::IntRange(0, 100)),
    ("position_y", Constraint::IntRange(0, 100)),
    ("sensitivity_vert_scale", Constraint::IntRange(0, 200)),
    ("sensitivity_horiz_scale", Constraint::IntRange(0, 200)),
    ("teleport_stop", Constraint::Bool),
    ("mouse_dampening_trigger", Constraint::Enum(MOUSE_DAMPENING_TRIGGER)),
    ("mouse_trigger_clamp_amount", Constraint::IntRange(100, 8000)),
];

const RADIAL_MENU: &[(&str, Constraint)] = &[
    ("touchmenu_button_fire_type", Constraint::Enum(TOUCHMENU_BUTTON_FIRE_TYPE)),
    ("touch_menu_opacity", Constraint::IntRange(40, 100)),
    ("touch_menu_position_x", Constraint::IntRange(0, 100)),
    ("touch_menu_position_y", Constraint::IntRange(0, 100)),
    ("touch_menu_scale", Constraint::IntRange(50, 150)),
    ("touch_menu_show_labels", Constraint::Bool),
];

const SCROLLWHEEL: &[(&str, Constraint)] = &[
    ("scroll_angle", Constraint::IntRange(1, 180)),
    ("haptic_intensity", Constraint::Enum(HAPTIC_INTENSITY)),
    ("scroll_type", Constraint::Enum(SCROLL_TYPE)),
    ("scroll_invert", Constraint::Bool),
    ("scroll_wrap", Constraint::Bool),
    ("scroll_friction", Constraint::Enum(FRICTION)),
];

const TOUCH_MENU: &[(&str, Constraint)] = &[
    ("touch_menu_button_count", Constraint::OneOf(&[2, 4, 7, 9, 12, 13, 16])),
    ("touch_menu_opacity", Constraint::IntRange(40, 100)),
    ("touch_menu_position_x", Constraint::IntRange(0, 100)),
    ("touch_menu_position_y", Constraint::IntRange(0, 100)),
    ("touch_menu_scale", Constraint::IntRange(50, 150)),
    ("touch_menu_show_labels", Constraint::Bool),
    ("touchmenu_button_fire_type", Constraint::Enum(TOUCHMENU_BUTTON_FIRE_TYPE)),
];

const TRIGGER: &[(&str, Constraint)] = &[
    ("output_trigger", Constraint::Enum(OUTPUT_TRIGGER)),
    ("deadzone_outer_radius", Constraint::IntRange(0, 32767)),
    ("deadzone_inner_radius", Constraint::IntRange(0, 32767)),
    ("edge_binding_radius", Constraint::IntRange(0, 32767)),
    ("adaptive_threshold", Constraint::Enum(ADAPTIVE_THRESHOLD)),
    ("curve_exponent", Constraint::Enum(CURVE_EXPONENT)),
    ("custom_curve_exponent", Constraint::IntRange(25, 4000)),
];

const UNCONSTRAINED: &[(&str, Constraint)] = &[];

/// The fourteen group modes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Mode {
    AbsoluteMouse,
    Dpad,
    FourButtons,
    JoystickCamera,
    JoystickMove,
    JoystickMouse,
    MouseJoystick,
    MouseRegion,
    RadialMenu,
    Scrollwheel,
    SingleButton,
    Switches,
    TouchMenu,
    Trigger,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::AbsoluteMouse => "absolute_mouse",
            Mode::Dpad => "dpad",
            Mode::FourButtons => "four_buttons",
            Mode::JoystickCamera => "joystick_camera",
            Mode::JoystickMove => "joystick_move",
            Mode::JoystickMouse => "joystick_mouse",
            Mode::MouseJoystick => "mouse_joystick",
            Mode::MouseRegion => "mouse_region",
            Mode::RadialMenu => "radial_menu",
            Mode::Scrollwheel => "scrollwheel",
            Mode::SingleButton => "single_button",
            Mode::Switches => "switches",
            Mode::TouchMenu => "touch_menu",
            Mode::Trigger => "trigger",
        }
    }

    /// Resolve a mode name, accepting the canonical names plus the
    /// ergonomic aliases the source dialects use.
    pub fn from_name(name: &str) -> Option<Mode> {
        match name {
            "absolute_mouse" | "pen" | "absolute" => Some(Mode::AbsoluteMouse),
            "dpad" => Some(Mode::Dpad),
            "four_buttons" | "4buttons" | "face_buttons" | "face" => Some(Mode::FourButtons),
            "joystick_camera" | "camera" | "jscam" => Some(Mode::JoystickCamera),
            "joystick_move" | "joystick" | "jsmove" => Some(Mode::JoystickMove),
            "joystick_mouse" | "jsmouse" => Some(Mode::JoystickMouse),
            "mouse_joystick" | "mousejs" => Some(Mode::MouseJoystick),
            "mouse_region" | "region" => Some(Mode::MouseRegion),
            "radial_menu" | "radial" | "piemenu" | "pie_menu" | "pie" => Some(Mode::RadialMenu),
            "scrollwheel" | "scroll_wheel" | "scroll" => Some(Mode::Scrollwheel),
            "single_button" | "singlebutton" | "one_button" | "onebutton" | "single" => {
                Some(Mode::SingleButton)
            },
            "switches" | "switch" => Some(Mode::Switches),
            "touch_menu" | "touchmenu" | "menu" => Some(Mode::TouchMenu),
            "trigger" => Some(Mode::Trigger),
            _ => None,
        }
    }

    /// Settings constraint table for this mode.
    pub fn constraints(self) -> &'static [(&'static str, Constraint)] {
        match self {
            Mode::AbsoluteMouse => ABSOLUTE_MOUSE,
            Mode::Dpad => DPAD,
            Mode::FourButtons => FOUR_BUTTONS,
            Mode::JoystickCamera => JOYSTICK_CAMERA,
            Mode::JoystickMove => JOYSTICK_MOVE,
            Mode::JoystickMouse => JOYSTICK_MOUSE,
            Mode::MouseJoystick => MOUSE_JOYSTICK,
            Mode::MouseRegion => MOUSE_REGION,
            Mode::RadialMenu => RADIAL_MENU,
            Mode::Scrollwheel => SCROLLWHEEL,
            Mode::SingleButton | Mode::Switches => UNCONSTRAINED,
            Mode::TouchMenu => TOUCH_MENU,
            Mode::Trigger => TRIGGER,
        }
    }

    /// Fixed input symbols legal for this mode.
    pub fn inputs(self) -> &'static [&'static str] {
        match self {
            Mode::AbsoluteMouse => &["click", "doubletap", "touch"],
            Mode::Dpad => {
                &["dpad_north", "dpad_south", "dpad_west", "dpad_east", "click", "edge"]
            },
            Mode::FourButtons => &["button_a", "button_b", "button_x", "button_y"],
            Mode::JoystickCamera => &["click"],
            Mode::JoystickMove | Mode::JoystickMouse | Mode::Trigger => &["click", "edge"],
            Mode::MouseJoystick => &["click", "doubletap"],
            Mode::MouseRegion => &["click", "edge", "touch"],
            Mode::RadialMenu => &["click"],
            Mode::Scrollwheel => &["click", "scroll_clockwise", "scroll_counterclockwise"],
            Mode::SingleButton => &["click", "touch"],
            Mode::Switches => &[
                "button_escape",
                "button_menu",
                "left_bumper",
                "right_bumper",
                "button_back_left",
                "button_back_right",
                "always_on_action",
            ],
            Mode::TouchMenu => &[],
        }
    }

    /// Whether `symbol` is a legal input for this mode, counting the
    /// numbered families the fixed lists cannot spell out.
    pub fn legal_input(self, symbol: &str) -> bool {
        if self.inputs().contains(&symbol) {
            return true;
        }
        match self {
            Mode::RadialMenu | Mode::TouchMenu => symbol.starts_with("touch_menu_button_"),
            Mode::Scrollwheel => symbol.starts_with("scroll_wheel_list_"),
            // Older exports prefix the dpad's own click and edge.
            Mode::Dpad => matches!(symbol, "dpad_click" | "dpad_edge"),
            Mode::Switches => {
                // Mode-shift gates bind into the switches group under
                // their source input's name.
                symbol.ends_with("_modeshift")
                    || matches!(
                        symbol,
                        "left_trigger"
                            | "right_trigger"
                            | "left_trigger_threshold"
                            | "right_trigger_threshold"
                            | "left_click"
                            | "right_click"
                            | "left_stick_click"
                            | "button_a"
                            | "button_b"
                            | "button_x"
                            | "button_y"
                    )
            },
            _ => false,
        }
    }
}

/// A mode configuration of one cluster.
#[derive(Clone, Debug, PartialEq)]
pub struct Group {
    pub id: i64,
    pub mode: Mode,
    pub inputs: Vec<Input>,
    settings: Settings,
}

impl Group {
    pub fn new(id: i64, mode: Mode) -> Group {
        Group { id, mode, inputs: Vec::new(), settings: Settings::new() }
    }

    /// Find or create the input slot for `symbol`; a symbol outside the
    /// mode's legal set is rejected.
    pub fn input_mut(&mut self, symbol: &str) -> Result<&mut Input> {
        if !self.mode.legal_input(symbol) {
            return Err(Error::UnknownCode {
                kind: CodeKind::Input,
                raw: symbol.to_owned(),
            });
        }
        if let Some(pos) = self.inputs.iter().position(|i| i.symbol == symbol) {
            return Ok(&mut self.inputs[pos]);
        }
        self.inputs.push(Input::new(symbol));
        Ok(self.inputs.last_mut().expect("just pushed"))
    }

    pub fn input(&self, symbol: &str) -> Option<&Input> {
        self.inputs.iter().find(|i| i.symbol == symbol)
    }

    pub fn set_setting(&mut self, key: &str, value: impl Into<Scalar>) -> Result<()> {
        self.settings.set(self.mode.constraints(), key, value)
    }

    pub fn setting(&self, key: &str) -> Option<&Scalar> {
        self.settings.get(key)
    }

    pub fn encode_kv(&self) -> Document {
        let mut kv = Document::new();
        kv.insert("id", self.id);
        kv.insert("mode", self.mode.as_str());
        let mut inputs = Document::new();
        for input in &self.inputs {
            inputs.insert(input.symbol.clone(), input.encode_kv());
        }
        kv.insert("inputs", inputs);
        if !self.settings.is_empty() {
            kv.insert("settings", self.settings.encode_kv());
        }
        kv
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::settings::Scalar;
    use crate::vdf::Value;

    #[test]
    fn mode_aliases_resolve() {
        assert_eq!(Mode::from_name("jsmove"), Some(Mode::JoystickMove));
        assert_eq!(Mode::from_name("face"), Some(Mode::FourButtons));
        assert_eq!(Mode::from_name("pie_menu"), Some(Mode::RadialMenu));
        assert_eq!(Mode::from_name("warp"), None);
    }

    #[test]
    fn settings_validated_per_mode() {
        let mut grp = Group::new(0, Mode::Dpad);
        grp.set_setting("layout", "analog").unwrap();
        assert_eq!(grp.setting("layout"), Some(&Scalar::Int(2)));
        assert!(grp.set_setting("deadzone", 40_000i64).is_err());
    }

    #[test]
    fn numbered_input_families() {
        assert!(Mode::TouchMenu.legal_input("touch_menu_button_7"));
        assert!(Mode::Scrollwheel.legal_input("scroll_wheel_list_3"));
        assert!(Mode::Switches.legal_input("left_trigger_modeshift"));
        assert!(Mode::Switches.legal_input("left_trigger"));
        assert!(!Mode::Dpad.legal_input("touch_menu_button_1"));
    }

    #[test]
    fn illegal_inputs_are_rejected() {
        let mut grp = Group::new(0, Mode::JoystickMove);
        assert!(grp.input_mut("click").is_ok());
        assert!(matches!(
            grp.input_mut("dpad_north"),
            Err(crate::error::Error::UnknownCode { kind: CodeKind::Input, .. })
        ));
        assert!(grp.input("dpad_north").is_none());
    }

    #[test]
    fn encode_layout() {
        let mut grp = Group::new(2, Mode::Dpad);
        grp.input_mut("dpad_north").unwrap();
        let kv = grp.encode_kv();
        assert_eq!(kv.get("id").and_then(Value::as_str), Some("2"));
        assert_eq!(kv.get("mode").and_then(Value::as_str), Some("dpad"));
        assert!(kv.get("inputs").and_then(Value::as_table).is_some());
        assert!(kv.get("settings").is_none());
    }
}
