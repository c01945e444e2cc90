//! Event generators and bindings.
//!
//! An event generator is the "what gets synthesized" half of a binding:
//! a keystroke, a mouse switch, a gamepad button, a host call, an overlay
//! operation, a mode shift, or nothing at all. Codes pass through fixed
//! translation tables; a code the table does not know fails with
//! `UnknownCode` so the caller can degrade to an `Invalid` placeholder.

use std::fmt::{self, Display, Formatter};

use crate::error::{CodeKind, Error, Result};

const MOUSE_BUTTONS: &[(&str, &str)] = &[
    ("1", "LEFT"),
    ("2", "MIDDLE"),
    ("3", "RIGHT"),
    ("4", "BACK"),
    ("5", "FORWARD"),
];

const MOUSE_WHEEL: &[(&str, &str)] = &[("u", "SCROLL_UP"), ("d", "SCROLL_DOWN")];

const GAMEPAD_BUTTONS: &[(&str, &str)] = &[
    ("A", "A"),
    ("B", "B"),
    ("X", "X"),
    ("Y", "Y"),
    ("LB", "SHOULDER_LEFT"),
    ("RB", "SHOULDER_RIGHT"),
    ("LT", "TRIGGER_LEFT"),
    ("RT", "TRIGGER_RIGHT"),
    ("DUP", "DPAD_UP"),
    ("DDN", "DPAD_DOWN"),
    ("DLT", "DPAD_LEFT"),
    ("DRT", "DPAD_RIGHT"),
    ("BK", "SELECT"),
    ("ST", "START"),
    ("LS", "JOYSTICK_LEFT"),
    ("RS", "JOYSTICK_RIGHT"),
    ("LJx", "LSTICK_LEFT"),
    ("LJX", "LSTICK_RIGHT"),
    ("LJy", "LSTICK_UP"),
    ("LJY", "LSTICK_DOWN"),
    ("RJx", "RSTICK_LEFT"),
    ("RJX", "RSTICK_RIGHT"),
    ("RJy", "RSTICK_UP"),
    ("RJY", "RSTICK_DOWN"),
];

const HOST_ACTIONS: &[(&str, &str)] = &[
    ("keyboard", "show_keyboard"),
    ("screenshot", "screenshot"),
    ("magnifier", "toggle_magnifier"),
    ("magnify", "toggle_magnifier"),
    ("music", "steammusic_playpause"),
    ("music_play/pause", "steammusic_playpause"),
    ("music_play", "steammusic_playpause"),
    ("music_pause", "steammusic_playpause"),
    ("music_next", "steammusic_next"),
    ("music_prev", "steammusic_prev"),
    ("music_previous", "steammusic_previous"),
    ("volume_up", "steammusic_volup"),
    ("volume_down", "steammusic_voldown"),
    ("volume_mute", "steammusic_volmute"),
    ("steam_hangup", "controller_poweroff"),
    ("steam_kill", "quit_application"),
    ("steam_terminate", "quit_application"),
    ("steam_forcequit", "quit_application"),
    ("steam_open", "bigpicture_open"),
    ("steam_hide", "bigpicture_minimize"),
    ("steam_exit", "bigpicture_quit"),
    ("host_suspend", "host_suspend"),
    ("host_restart", "host_restart"),
    ("host_poweroff", "host_poweroff"),
];

const OVERLAY_ACTIONS: &[(&str, &str)] = &[
    ("apply_layer", "add_layer"),
    ("apply", "add_layer"),
    ("peel_layer", "remove_layer"),
    ("peel", "remove_layer"),
    ("hold_layer", "hold_layer"),
    ("hold", "hold_layer"),
    ("change", "change_preset"),
];

/// Input sources a mode shift may gate on.
pub const MODE_SHIFT_SOURCES: &[&str] = &[
    "left_trackpad",
    "right_trackpad",
    "left_trigger",
    "right_trigger",
    "dpad",
    "button_diamond",
    "joystick",
    "right_joystick",
    "gyro",
];

/// Accept a code already in final form (as given, lowercased, or
/// uppercased), else translate it through the table.
fn filter_enum(table: &[(&str, &str)], raw: &str) -> Option<String> {
    let lower = raw.to_lowercase();
    let upper = raw.to_uppercase();
    for candidate in [raw, lower.as_str(), upper.as_str()] {
        if table.iter().any(|(_, v)| *v == candidate) {
            return Some(candidate.to_owned());
        }
    }
    for candidate in [raw, lower.as_str(), upper.as_str()] {
        if let Some((_, v)) = table.iter().find(|(k, _)| *k == candidate) {
            return Some((*v).to_owned());
        }
    }
    None
}

fn filter_list(list: &[&str], raw: &str) -> Option<String> {
    let lower = raw.to_lowercase();
    let upper = raw.to_uppercase();
    for candidate in [raw, lower.as_str(), upper.as_str()] {
        if list.contains(&candidate) {
            return Some(candidate.to_owned());
        }
    }
    None
}

/// Mangle text destined for an invalid-binding placeholder so the output
/// stays parseable by the Steam client.
pub fn mangle(text: &str) -> String {
    text.replace('"', "'").replace("//", "/").replace(',', ";")
}

/// Reference to a mode-shifted group: either the final group id, or a
/// token into the exporter's late-binding pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GroupRef {
    Id(i64),
    Token(usize),
}

impl GroupRef {
    /// Id for serialization; an unresolved token keeps the placeholder
    /// value `-1`.
    pub fn id(&self) -> i64 {
        match self {
            GroupRef::Id(id) => *id,
            GroupRef::Token(_) => -1,
        }
    }
}

/// Which of the two mouse devices a translated code landed on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MouseDevice {
    Button,
    Wheel,
}

/// One synthesized event.
#[derive(Clone, Debug, PartialEq)]
pub enum Evgen {
    Empty,
    Keystroke(String),
    MouseSwitch { device: MouseDevice, code: String },
    GamepadButton(String),
    Host(String),
    Light { red: i64, green: i64, blue: i64, x: i64, brightness: i64, mode: i64 },
    Overlay { action: String, target: String, frob0: String, frob1: String },
    ModeShift { source: String, group: GroupRef },
    Invalid(String),
}

impl Evgen {
    pub fn keystroke(code: impl Into<String>) -> Evgen {
        Evgen::Keystroke(code.into())
    }

    pub fn mouse_switch(raw: &str) -> Result<Evgen> {
        if let Some(code) = filter_enum(MOUSE_BUTTONS, raw) {
            return Ok(Evgen::MouseSwitch { device: MouseDevice::Button, code });
        }
        if let Some(code) = filter_enum(MOUSE_WHEEL, raw) {
            return Ok(Evgen::MouseSwitch { device: MouseDevice::Wheel, code });
        }
        Err(Error::UnknownCode { kind: CodeKind::Mouse, raw: raw.to_owned() })
    }

    pub fn gamepad(raw: &str) -> Result<Evgen> {
        match filter_enum(GAMEPAD_BUTTONS, raw) {
            Some(code) => Ok(Evgen::GamepadButton(code)),
            None => Err(Error::UnknownCode { kind: CodeKind::Gamepad, raw: raw.to_owned() }),
        }
    }

    pub fn host(raw: &str) -> Result<Evgen> {
        match filter_enum(HOST_ACTIONS, raw) {
            Some(action) => Ok(Evgen::Host(action)),
            None => Err(Error::UnknownCode { kind: CodeKind::Host, raw: raw.to_owned() }),
        }
    }

    pub fn overlay(
        action: &str,
        target: impl Into<String>,
        frob0: impl Into<String>,
        frob1: impl Into<String>,
    ) -> Result<Evgen> {
        match filter_enum(OVERLAY_ACTIONS, action) {
            Some(action) => Ok(Evgen::Overlay {
                action,
                target: target.into(),
                frob0: frob0.into(),
                frob1: frob1.into(),
            }),
            None => {
                Err(Error::UnknownCode { kind: CodeKind::OverlayAction, raw: action.to_owned() })
            },
        }
    }

    pub fn mode_shift(source: &str, group: GroupRef) -> Result<Evgen> {
        match filter_list(MODE_SHIFT_SOURCES, source) {
            Some(source) => Ok(Evgen::ModeShift { source, group }),
            None => Err(Error::UnknownCode {
                kind: CodeKind::ModeShiftSource,
                raw: source.to_owned(),
            }),
        }
    }

    /// Parse the VDF text form back into a generator. Unknown text maps
    /// to `Invalid` so editing an existing file never loses data.
    pub fn parse(text: &str) -> Evgen {
        let words: Vec<&str> = text.split_whitespace().collect();
        let invalid = || Evgen::Invalid(mangle(text));

        match words.first().copied() {
            None => Evgen::Empty,
            Some("key_press") if words.len() >= 2 => Evgen::Keystroke(words[1].to_owned()),
            Some("mouse_button") | Some("mouse_wheel") if words.len() >= 2 => {
                Evgen::mouse_switch(words[1]).unwrap_or_else(|_| invalid())
            },
            Some("xinput_button") if words.len() >= 2 => {
                Evgen::gamepad(words[1]).unwrap_or_else(|_| invalid())
            },
            Some("mode_shift") if words.len() >= 3 => {
                let group = GroupRef::Id(words[2].parse().unwrap_or(-1));
                Evgen::mode_shift(words[1], group).unwrap_or_else(|_| invalid())
            },
            Some("controller_action") if words.len() >= 2 => match words[1] {
                "empty_binding" => Evgen::Empty,
                "set_led" if words.len() >= 8 => {
                    let mut nums = words[2..8].iter().map(|w| w.parse().unwrap_or(0));
                    let mut next = || nums.next().unwrap_or(0);
                    Evgen::Light {
                        red: next(),
                        green: next(),
                        blue: next(),
                        x: next(),
                        brightness: next(),
                        mode: next(),
                    }
                },
                action if words.len() >= 4
                    && OVERLAY_ACTIONS.iter().any(|(k, v)| *k == action || *v == action) =>
                {
                    let frob1 = words.get(4).copied().unwrap_or("0");
                    Evgen::overlay(action, words[2], words[3], frob1)
                        .unwrap_or_else(|_| invalid())
                },
                _ => Evgen::host(&words[1..].join(" ")).unwrap_or_else(|_| invalid()),
            },
            Some(_) => invalid(),
        }
    }
}

impl Display for Evgen {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Evgen::Empty => write!(f, "controller_action empty_binding"),
            Evgen::Keystroke(code) => write!(f, "key_press {}", code),
            Evgen::MouseSwitch { device: MouseDevice::Button, code } => {
                write!(f, "mouse_button {}", code)
            },
            Evgen::MouseSwitch { device: MouseDevice::Wheel, code } => {
                write!(f, "mouse_wheel {}", code)
            },
            Evgen::GamepadButton(code) => write!(f, "xinput_button {}", code),
            Evgen::Host(action) => write!(f, "controller_action {}", action),
            Evgen::Light { red, green, blue, x, brightness, mode } => write!(
                f,
                "controller_action set_led {} {} {} {} {} {}",
                red, green, blue, x, brightness, mode
            ),
            Evgen::Overlay { action, target, frob0, frob1 } => {
                write!(f, "controller_action {} {} {} {}", action, target, frob0, frob1)
            },
            Evgen::ModeShift { source, group } => {
                write!(f, "mode_shift {} {}", source, group.id())
            },
            Evgen::Invalid(raw) => f.write_str(raw),
        }
    }
}

/// Icon info, the third portion of a binding, used by radial menus.
#[derive(Clone, Debug, PartialEq)]
pub struct IconInfo {
    pub path: String,
    pub bg: String,
    pub fg: String,
}

impl IconInfo {
    pub fn parse(text: &str) -> Option<IconInfo> {
        let mut words = text.split_whitespace();
        let path = words.next()?.to_owned();
        let bg = words.next().unwrap_or_default().to_owned();
        let fg = words.next().unwrap_or_default().to_owned();
        Some(IconInfo { path, bg, fg })
    }
}

impl Display for IconInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.path, self.bg, self.fg)
    }
}

/// One synthesized event paired with an optional label and icon.
#[derive(Clone, Debug, PartialEq)]
pub struct Binding {
    pub evgen: Evgen,
    pub label: Option<String>,
    pub icon: Option<IconInfo>,
}

impl Binding {
    pub fn new(evgen: Evgen) -> Binding {
        Binding { evgen, label: None, icon: None }
    }

    pub fn with_label(evgen: Evgen, label: Option<String>) -> Binding {
        Binding { evgen, label, icon: None }
    }

    /// Parse the comma-separated VDF binding text.
    pub fn parse(text: &str) -> Binding {
        let mut phrases = text.split(", ");
        let evgen = Evgen::parse(phrases.next().unwrap_or(""));
        let label = phrases.next().map(str::to_owned).filter(|s| !s.is_empty());
        let icon = phrases.next().and_then(IconInfo::parse);
        Binding { evgen, label, icon }
    }
}

impl Display for Binding {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.evgen)?;
        if let Some(label) = &self.label {
            write!(f, ", {}", label)?;
        }
        if let Some(icon) = &self.icon {
            if self.label.is_none() {
                write!(f, ", ")?;
            }
            write!(f, ", {}", icon)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gamepad_translation() {
        assert_eq!(
            Evgen::gamepad("DUP").unwrap(),
            Evgen::GamepadButton("DPAD_UP".into())
        );
        // Already in final form.
        assert_eq!(
            Evgen::gamepad("DPAD_UP").unwrap(),
            Evgen::GamepadButton("DPAD_UP".into())
        );
        assert!(matches!(
            Evgen::gamepad("NOPE"),
            Err(Error::UnknownCode { kind: CodeKind::Gamepad, .. })
        ));
    }

    #[test]
    fn mouse_translation_picks_device() {
        assert_eq!(
            Evgen::mouse_switch("1").unwrap().to_string(),
            "mouse_button LEFT"
        );
        assert_eq!(
            Evgen::mouse_switch("u").unwrap().to_string(),
            "mouse_wheel SCROLL_UP"
        );
        assert!(Evgen::mouse_switch("9").is_err());
    }

    #[test]
    fn host_aliases() {
        assert_eq!(
            Evgen::host("magnify").unwrap().to_string(),
            "controller_action toggle_magnifier"
        );
        assert!(Evgen::host("reboot_moon").is_err());
    }

    #[test]
    fn overlay_text_form() {
        let ev = Evgen::overlay("apply", "2", "0", "0").unwrap();
        assert_eq!(ev.to_string(), "controller_action add_layer 2 0 0");
    }

    #[test]
    fn mode_shift_token_serializes_placeholder() {
        let ev = Evgen::mode_shift("button_diamond", GroupRef::Token(3)).unwrap();
        assert_eq!(ev.to_string(), "mode_shift button_diamond -1");
        let ev = Evgen::mode_shift("button_diamond", GroupRef::Id(7)).unwrap();
        assert_eq!(ev.to_string(), "mode_shift button_diamond 7");
    }

    #[test]
    fn parse_round_trips_text() {
        for text in [
            "key_press Return",
            "xinput_button DPAD_UP",
            "mouse_button LEFT",
            "controller_action empty_binding",
            "controller_action add_layer 2 0 0",
            "controller_action set_led 255 0 0 100 128 1",
            "mode_shift button_diamond 4",
        ] {
            assert_eq!(Evgen::parse(text).to_string(), text);
        }
    }

    #[test]
    fn unknown_text_becomes_invalid() {
        match Evgen::parse("warp_drive engage, now") {
            Evgen::Invalid(raw) => assert_eq!(raw, "warp_drive engage; now"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn binding_text_includes_optional_parts() {
        let mut binding = Binding::new(Evgen::keystroke("Space"));
        assert_eq!(binding.to_string(), "key_press Space");

        binding.label = Some("Jump".into());
        assert_eq!(binding.to_string(), "key_press Space, Jump");

        binding.icon = IconInfo::parse("icon.png #000000 #ffffff");
        assert_eq!(
            binding.to_string(),
            "key_press Space, Jump, icon.png #000000 #ffffff"
        );
    }

    #[test]
    fn binding_parse_inverse() {
        let parsed = Binding::parse("key_press Space, Jump, icon.png #000000 #ffffff");
        assert_eq!(parsed.evgen, Evgen::Keystroke("Space".into()));
        assert_eq!(parsed.label.as_deref(), Some("Jump"));
        assert_eq!(parsed.icon.as_ref().map(|i| i.path.as_str()), Some("icon.png"));
    }

    #[test]
    fn mangling_rules() {
        assert_eq!(mangle("a \"b\" //c, d"), "a 'b' /c; d");
    }
}
