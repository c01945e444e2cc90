//! The binding expression shorthand.
//!
//! One expression describes one synthesized activator:
//!
//! ```text
//! spec  := sig? sym+ frob* label?
//! sig   := '+' | '-' | '_' | ':' | '=' | '&' | '/'
//! sym   := '<key>' | '(gamepad)' | '[mouse]' | '{anything}'
//! frob  := ':' int | '%' | '^' | '|' | '@' int ',' int | '~' int | '/' int
//! label := '#' text      ; later '#' turn into spaces
//! ```
//!
//! Parsing is a hand-written scan over the fixed token families; the
//! `Display` impls emit the canonical shorthand back out.

use std::fmt::{self, Display, Formatter};

use crate::config::activator::{keys, Activator, Signal};
use crate::error::{Error, Result};

/// Activator signal shorthand.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Actsig {
    #[default]
    Full,
    Start,
    Long,
    Double,
    Release,
    Chord,
}

impl Actsig {
    pub fn from_char(ch: char) -> Option<Actsig> {
        match ch {
            '/' => Some(Actsig::Full),
            '+' => Some(Actsig::Start),
            '_' => Some(Actsig::Long),
            ':' | '=' => Some(Actsig::Double),
            '-' => Some(Actsig::Release),
            '&' => Some(Actsig::Chord),
            _ => None,
        }
    }

    /// Canonical prefix character; full press has none.
    pub fn prefix(self) -> Option<char> {
        match self {
            Actsig::Full => None,
            Actsig::Start => Some('+'),
            Actsig::Long => Some('_'),
            Actsig::Double => Some(':'),
            Actsig::Release => Some('-'),
            Actsig::Chord => Some('&'),
        }
    }

    pub fn to_signal(self) -> Signal {
        match self {
            Actsig::Full => Signal::FullPress,
            Actsig::Start => Signal::StartPress,
            Actsig::Long => Signal::LongPress,
            Actsig::Double => Signal::DoublePress,
            Actsig::Release => Signal::Release,
            Actsig::Chord => Signal::Chord,
        }
    }
}

/// One bracketed event symbol.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Evsym {
    /// `<...>` keyboard
    Key(String),
    /// `(...)` gamepad
    Gamepad(String),
    /// `[...]` mouse
    Mouse(String),
    /// `{...}` host call or comma-separated directive
    Brace(String),
}

impl Display for Evsym {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Evsym::Key(code) => write!(f, "<{}>", code),
            Evsym::Gamepad(code) => write!(f, "({})", code),
            Evsym::Mouse(code) => write!(f, "[{}]", code),
            Evsym::Brace(code) => write!(f, "{{{}}}", code),
        }
    }
}

/// Behavior modifiers that lower to activator settings.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Evfrob {
    /// `:N` - activator-specific time or chord button.
    pub specific: Option<i64>,
    pub toggle: bool,
    pub interrupt: bool,
    pub delay_start: Option<i64>,
    pub delay_end: Option<i64>,
    pub haptic: Option<i64>,
    pub cycle: bool,
    pub repeat: Option<i64>,
}

impl Evfrob {
    pub fn is_empty(&self) -> bool {
        *self == Evfrob::default()
    }

    /// Translate to settings writes on `activator`.
    pub fn apply(&self, activator: &mut Activator) -> Result<()> {
        if let Some(value) = self.specific {
            if let Some(key) = activator.signal.specific_key() {
                activator.set_setting(key, value)?;
            }
        }
        if self.toggle {
            activator.set_setting(keys::TOGGLE, true)?;
        }
        if self.interrupt {
            activator.set_setting(keys::INTERRUPTABLE, true)?;
        }
        if self.delay_start.is_some() || self.delay_end.is_some() {
            activator.set_setting(keys::DELAY_START, self.delay_start.unwrap_or(0))?;
            activator.set_setting(keys::DELAY_END, self.delay_end.unwrap_or(0))?;
        }
        if let Some(haptic) = self.haptic {
            activator.set_setting(keys::HAPTIC_INTENSITY, haptic)?;
        }
        if self.cycle {
            activator.set_setting(keys::CYCLE, true)?;
        }
        if let Some(rate) = self.repeat {
            if rate > 0 {
                activator.set_setting(keys::HOLD_REPEATS, true)?;
                activator.set_setting(keys::REPEAT_RATE, rate)?;
            } else {
                activator.set_setting(keys::HOLD_REPEATS, false)?;
            }
        }
        Ok(())
    }
}

impl Display for Evfrob {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if let Some(n) = self.specific {
            write!(f, ":{}", n)?;
        }
        if self.toggle {
            write!(f, "%")?;
        }
        if self.interrupt {
            write!(f, "^")?;
        }
        if self.delay_start.is_some() || self.delay_end.is_some() {
            write!(f, "@{},{}", self.delay_start.unwrap_or(0), self.delay_end.unwrap_or(0))?;
        }
        if let Some(n) = self.haptic {
            write!(f, "~{}", n)?;
        }
        if self.cycle {
            write!(f, "|")?;
        }
        if let Some(n) = self.repeat {
            write!(f, "/{}", n)?;
        }
        Ok(())
    }
}

/// One parsed binding expression.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Evspec {
    pub actsig: Actsig,
    pub syms: Vec<Evsym>,
    pub frob: Evfrob,
    pub label: Option<String>,
}

struct Scanner<'a> {
    src: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(src: &'a str) -> Self {
        Scanner { src, chars: src.chars().collect(), pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    fn fail(&self) -> Error {
        Error::MalformedExpression(self.src.to_owned())
    }

    /// Characters up to (consuming) `close`.
    fn until(&mut self, close: char) -> Result<String> {
        let mut out = String::new();
        loop {
            match self.bump() {
                Some(c) if c == close => return Ok(out),
                Some(c) => out.push(c),
                None => return Err(self.fail()),
            }
        }
    }

    fn integer(&mut self) -> Result<i64> {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.pos += 1;
        }
        if self.pos == start {
            return Err(self.fail());
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        text.parse().map_err(|_| self.fail())
    }
}

impl Evspec {
    pub fn parse(src: &str) -> Result<Evspec> {
        let mut scan = Scanner::new(src);
        let mut spec = Evspec::default();

        // Signal prefix.
        if let Some(sig) = scan.peek().and_then(Actsig::from_char) {
            scan.bump();
            spec.actsig = sig;
        }

        // Event symbols.
        loop {
            match scan.peek() {
                Some('<') => {
                    scan.bump();
                    spec.syms.push(Evsym::Key(scan.until('>')?));
                },
                Some('(') => {
                    scan.bump();
                    spec.syms.push(Evsym::Gamepad(scan.until(')')?));
                },
                Some('[') => {
                    scan.bump();
                    spec.syms.push(Evsym::Mouse(scan.until(']')?));
                },
                Some('{') => {
                    scan.bump();
                    spec.syms.push(Evsym::Brace(scan.until('}')?));
                },
                _ => break,
            }
        }
        if spec.syms.is_empty() {
            return Err(scan.fail());
        }

        // Frobs.
        loop {
            match scan.peek() {
                Some('%') => {
                    scan.bump();
                    spec.frob.toggle = true;
                },
                Some('^') => {
                    scan.bump();
                    spec.frob.interrupt = true;
                },
                Some('|') => {
                    scan.bump();
                    spec.frob.cycle = true;
                },
                Some(':') => {
                    scan.bump();
                    spec.frob.specific = Some(scan.integer()?);
                },
                Some('~') => {
                    scan.bump();
                    spec.frob.haptic = Some(scan.integer()?);
                },
                Some('/') => {
                    scan.bump();
                    spec.frob.repeat = Some(scan.integer()?);
                },
                Some('@') => {
                    scan.bump();
                    spec.frob.delay_start = Some(scan.integer()?);
                    match scan.bump() {
                        Some(',') | Some('+') => {},
                        _ => return Err(scan.fail()),
                    }
                    spec.frob.delay_end = Some(scan.integer()?);
                },
                _ => break,
            }
        }

        // Label: the remainder, with '#' as the space character.
        if let Some('#') = scan.peek() {
            scan.bump();
            let rest: String = scan.chars[scan.pos..].iter().collect();
            scan.pos = scan.chars.len();
            spec.label = Some(rest.replace('#', " "));
        }

        if scan.peek().is_some() {
            return Err(scan.fail());
        }
        Ok(spec)
    }

    /// Parse a space-delimited run of expressions.
    pub fn parse_list(src: &str) -> Result<Vec<Evspec>> {
        src.split_whitespace().map(Evspec::parse).collect()
    }
}

impl Display for Evspec {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if let Some(prefix) = self.actsig.prefix() {
            write!(f, "{}", prefix)?;
        }
        for sym in &self.syms {
            write!(f, "{}", sym)?;
        }
        write!(f, "{}", self.frob)?;
        if let Some(label) = &self.label {
            write!(f, "#{}", label.replace(' ', "#"))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::settings::Scalar;

    #[test]
    fn long_press_shorthand_with_all_frobs() {
        let spec = Evspec::parse("_<LeftControl><C>:180%^|~1@10,50/250").unwrap();
        assert_eq!(spec.actsig, Actsig::Long);
        assert_eq!(
            spec.syms,
            vec![Evsym::Key("LeftControl".into()), Evsym::Key("C".into())]
        );
        assert_eq!(spec.frob.specific, Some(180));
        assert!(spec.frob.toggle && spec.frob.interrupt && spec.frob.cycle);
        assert_eq!(spec.frob.delay_start, Some(10));
        assert_eq!(spec.frob.delay_end, Some(50));
        assert_eq!(spec.frob.haptic, Some(1));
        assert_eq!(spec.frob.repeat, Some(250));
    }

    #[test]
    fn frob_settings_translation() {
        let spec = Evspec::parse("_<LeftControl><C>:180%^|~1@10,50/250").unwrap();
        let mut act = Activator::new(spec.actsig.to_signal());
        assert_eq!(act.signal, Signal::LongPress);
        spec.frob.apply(&mut act).unwrap();

        for (key, expect) in [
            (keys::TOGGLE, Scalar::Bool(true)),
            (keys::INTERRUPTABLE, Scalar::Bool(true)),
            (keys::CYCLE, Scalar::Bool(true)),
            (keys::HAPTIC_INTENSITY, Scalar::Int(1)),
            (keys::DELAY_START, Scalar::Int(10)),
            (keys::DELAY_END, Scalar::Int(50)),
            (keys::HOLD_REPEATS, Scalar::Bool(true)),
            (keys::REPEAT_RATE, Scalar::Int(250)),
            (keys::LONG_PRESS_TIME, Scalar::Int(180)),
        ] {
            assert_eq!(act.setting(key), Some(&expect), "key {}", key);
        }
    }

    #[test]
    fn zero_repeat_disables_hold_repeats() {
        let spec = Evspec::parse("<A>/0").unwrap();
        let mut act = Activator::new(spec.actsig.to_signal());
        spec.frob.apply(&mut act).unwrap();
        assert_eq!(act.setting(keys::HOLD_REPEATS), Some(&Scalar::Bool(false)));
        assert_eq!(act.setting(keys::REPEAT_RATE), None);
    }

    #[test]
    fn labels_turn_hashes_into_spaces() {
        let spec = Evspec::parse("<A>#First#Button").unwrap();
        assert_eq!(spec.label.as_deref(), Some("First Button"));
        let spec = Evspec::parse("<A>#First###Button").unwrap();
        assert_eq!(spec.label.as_deref(), Some("First   Button"));
    }

    #[test]
    fn braces_take_anything_but_close() {
        let spec = Evspec::parse("{overlay,apply,Shift_1}").unwrap();
        assert_eq!(spec.syms, vec![Evsym::Brace("overlay,apply,Shift_1".into())]);
    }

    #[test]
    fn canonical_display_round_trips() {
        for src in [
            "<A>",
            "+<Up>",
            "-<Down>",
            ":<Space>:250",
            "&(LB):1",
            "_<LeftControl><C>:180%^@10,50~1|/250#combo",
            "{screenshot}#snap",
            "[1]%",
        ] {
            let spec = Evspec::parse(src).unwrap();
            assert_eq!(Evspec::parse(&spec.to_string()).unwrap(), spec);
        }
    }

    #[test]
    fn malformed_specs_fail() {
        for src in ["", "%<A>", "<A", "<A>~", "<A>@5", "<A>junk"] {
            assert!(Evspec::parse(src).is_err(), "should fail: {}", src);
        }
    }

    #[test]
    fn list_splits_on_whitespace() {
        let list = Evspec::parse_list("+<Up> -<Down>").unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].actsig, Actsig::Start);
        assert_eq!(list[1].actsig, Actsig::Release);
    }
}
