//! Uniform settings validation.
//!
//! Every settings block (activator, group, mapping) is a small ordered
//! scalar map whose writes are checked against a per-key constraint
//! descriptor. Keys missing from a constraint table are unconstrained.

use std::fmt::{self, Display, Formatter};

use crate::error::{Error, Result};
use crate::vdf::Document;

/// A settings value.
#[derive(Clone, Debug, PartialEq)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    Str(String),
}

impl Scalar {
    /// VDF form: booleans as `1`/`0`, integers in decimal.
    pub fn encode(&self) -> String {
        match self {
            Scalar::Bool(b) => if *b { "1".to_owned() } else { "0".to_owned() },
            Scalar::Int(n) => n.to_string(),
            Scalar::Str(s) => s.clone(),
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Scalar::Bool(b) => Some(i64::from(*b)),
            Scalar::Int(n) => Some(*n),
            Scalar::Str(s) => s.parse().ok(),
        }
    }
}

impl From<bool> for Scalar {
    fn from(val: bool) -> Self {
        Scalar::Bool(val)
    }
}

impl From<i64> for Scalar {
    fn from(val: i64) -> Self {
        Scalar::Int(val)
    }
}

impl From<&str> for Scalar {
    fn from(val: &str) -> Self {
        Scalar::Str(val.to_owned())
    }
}

impl From<String> for Scalar {
    fn from(val: String) -> Self {
        Scalar::Str(val)
    }
}

impl Display for Scalar {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

/// Constraint descriptor for one settings key.
#[derive(Clone, Copy, Debug)]
pub enum Constraint {
    /// Boolean; integer 0/1 is accepted and canonicalized.
    Bool,
    /// Any integer.
    Int,
    /// Integer within an inclusive range.
    IntRange(i64, i64),
    /// Integer drawn from a fixed list.
    OneOf(&'static [i64]),
    /// Integer from a symbolic namespace; names are accepted on input,
    /// the integer is what gets serialized.
    Enum(&'static [(&'static str, i64)]),
}

impl Display for Constraint {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Constraint::Bool => write!(f, "bool"),
            Constraint::Int => write!(f, "int"),
            Constraint::IntRange(lo, hi) => write!(f, "{}..={}", lo, hi),
            Constraint::OneOf(list) => write!(f, "one of {:?}", list),
            Constraint::Enum(names) => {
                write!(f, "one of ")?;
                for (i, (name, _)) in names.iter().enumerate() {
                    if i > 0 {
                        write!(f, "|")?;
                    }
                    write!(f, "{}", name)?;
                }
                Ok(())
            },
        }
    }
}

impl Constraint {
    /// Validate `value` for `key`, returning the canonicalized scalar.
    pub fn check(&self, key: &str, value: &Scalar) -> Result<Scalar> {
        let fail = || Error::InvalidValue {
            key: key.to_owned(),
            value: value.encode(),
            constraint: self.to_string(),
        };

        match self {
            Constraint::Bool => match value {
                Scalar::Bool(b) => Ok(Scalar::Bool(*b)),
                Scalar::Int(0) => Ok(Scalar::Bool(false)),
                Scalar::Int(1) => Ok(Scalar::Bool(true)),
                _ => Err(fail()),
            },
            Constraint::Int => match value.as_i64() {
                Some(n) => Ok(Scalar::Int(n)),
                None => Err(fail()),
            },
            Constraint::IntRange(lo, hi) => match value.as_i64() {
                Some(n) if *lo <= n && n <= *hi => Ok(Scalar::Int(n)),
                _ => Err(fail()),
            },
            Constraint::OneOf(list) => match value.as_i64() {
                Some(n) if list.contains(&n) => Ok(Scalar::Int(n)),
                _ => Err(fail()),
            },
            Constraint::Enum(names) => {
                if let Scalar::Str(s) = value {
                    let lower = s.to_lowercase();
                    if let Some((_, n)) = names.iter().find(|(name, _)| *name == lower) {
                        return Ok(Scalar::Int(*n));
                    }
                }
                match value.as_i64() {
                    Some(n) if names.iter().any(|(_, v)| *v == n) => Ok(Scalar::Int(n)),
                    _ => Err(fail()),
                }
            },
        }
    }
}

pub(crate) fn lookup(
    table: &[(&'static str, Constraint)],
    key: &str,
) -> Option<Constraint> {
    table.iter().find(|(k, _)| *k == key).map(|(_, c)| *c)
}

/// Ordered scalar map with constraint-checked writes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Settings {
    entries: Vec<(String, Scalar)>,
}

impl Settings {
    pub fn new() -> Self {
        Settings::default()
    }

    /// Write `key`; the value is validated against `table` first, and on
    /// failure the previously stored value is untouched.
    pub fn set(
        &mut self,
        table: &[(&'static str, Constraint)],
        key: &str,
        value: impl Into<Scalar>,
    ) -> Result<()> {
        let value = value.into();
        let value = match lookup(table, key) {
            Some(constraint) => constraint.check(key, &value)?,
            None => value,
        };
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key.to_owned(), value)),
        }
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&Scalar> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Scalar)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn encode_kv(&self) -> Document {
        self.entries.iter().map(|(k, v)| (k.clone(), v.encode())).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &[(&str, Constraint)] = &[
        ("toggle", Constraint::Bool),
        ("repeat_rate", Constraint::IntRange(1, 9999)),
        ("haptic_intensity", Constraint::Enum(&[("off", 0), ("low", 1), ("high", 3)])),
        ("count", Constraint::OneOf(&[2, 4, 7])),
    ];

    #[test]
    fn accepted_value_reads_back() {
        let mut settings = Settings::new();
        settings.set(TABLE, "repeat_rate", 250i64).unwrap();
        assert_eq!(settings.get("repeat_rate"), Some(&Scalar::Int(250)));
    }

    #[test]
    fn rejected_value_preserves_prior() {
        let mut settings = Settings::new();
        settings.set(TABLE, "repeat_rate", 100i64).unwrap();
        let err = settings.set(TABLE, "repeat_rate", 10_000i64).unwrap_err();
        assert!(matches!(err, Error::InvalidValue { .. }));
        assert_eq!(settings.get("repeat_rate"), Some(&Scalar::Int(100)));
    }

    #[test]
    fn enum_accepts_names_and_serializes_integers() {
        let mut settings = Settings::new();
        settings.set(TABLE, "haptic_intensity", "high").unwrap();
        assert_eq!(settings.get("haptic_intensity"), Some(&Scalar::Int(3)));
        assert!(settings.set(TABLE, "haptic_intensity", "loud").is_err());
    }

    #[test]
    fn bool_canonicalizes_and_encodes() {
        let mut settings = Settings::new();
        settings.set(TABLE, "toggle", 1i64).unwrap();
        assert_eq!(settings.get("toggle"), Some(&Scalar::Bool(true)));
        let kv = settings.encode_kv();
        assert_eq!(kv.get("toggle").and_then(crate::vdf::Value::as_str), Some("1"));
    }

    #[test]
    fn unconstrained_keys_pass_through() {
        let mut settings = Settings::new();
        settings.set(TABLE, "free_form", "anything").unwrap();
        assert_eq!(settings.get("free_form"), Some(&Scalar::Str("anything".into())));
    }

    #[test]
    fn one_of_rejects_outsiders() {
        let mut settings = Settings::new();
        assert!(settings.set(TABLE, "count", 4i64).is_ok());
        assert!(settings.set(TABLE, "count", 5i64).is_err());
    }
}
