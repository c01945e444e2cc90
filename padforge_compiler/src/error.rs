//! Compiler-wide error type.

use std::fmt::{self, Display, Formatter};
use std::io;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors occurring while compiling a controller configuration.
#[derive(Debug)]
pub enum Error {
    /// The tokenizer met a character it cannot represent.
    Lex { position: usize },

    /// The key/value stream is structurally broken.
    Parse(ParseErrorKind),

    /// A code outside one of the fixed translation tables.
    UnknownCode { kind: CodeKind, raw: String },

    /// A settings write violated its constraint; the prior value is kept.
    InvalidValue { key: String, value: String, constraint: String },

    /// A shifter declared a style outside the recognized set.
    UnknownShiftStyle(String),

    /// `$name` substitution failed.
    UnresolvedAlias(String),

    /// A binding expression that does not match the shorthand grammar.
    MalformedExpression(String),

    /// The source document does not match any accepted schema.
    UnknownSchema,

    /// Underlying stream failure.
    Io(io::Error),

    /// The structured source tree could not be read.
    Yaml(serde_yaml::Error),

    /// Ditto, for JSON input.
    Json(serde_json::Error),
}

/// Fatal structural errors from the key/value parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// A key with no value at end of stream.
    UnpairedKey,

    /// `}` at nesting depth zero.
    StrayClose,

    /// End of stream inside a nested table.
    UnbalancedNesting,
}

/// Which translation table rejected a code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeKind {
    Mouse,
    Gamepad,
    Host,
    OverlayAction,
    ModeShiftSource,
    GroupSource,
    GroupMode,
    Input,
    ShiftLevel,
}

impl Display for ParseErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ParseErrorKind::UnpairedKey => write!(f, "unpaired key"),
            ParseErrorKind::StrayClose => write!(f, "'}}' outside of any table"),
            ParseErrorKind::UnbalancedNesting => write!(f, "end of stream inside nested table"),
        }
    }
}

impl Display for CodeKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            CodeKind::Mouse => "mouse",
            CodeKind::Gamepad => "gamepad",
            CodeKind::Host => "host action",
            CodeKind::OverlayAction => "overlay action",
            CodeKind::ModeShiftSource => "mode shift source",
            CodeKind::GroupSource => "group source",
            CodeKind::GroupMode => "group mode",
            CodeKind::Input => "input",
            CodeKind::ShiftLevel => "shift level",
        };
        f.write_str(name)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Error::Lex { position } => write!(f, "invalid input at byte {}", position),
            Error::Parse(kind) => write!(f, "malformed key/value stream: {}", kind),
            Error::UnknownCode { kind, raw } => write!(f, "unknown {} code '{}'", kind, raw),
            Error::InvalidValue { key, value, constraint } => {
                write!(f, "value {} for '{}' violates constraint {}", value, key, constraint)
            },
            Error::UnknownShiftStyle(name) => write!(f, "unknown shift style '{}'", name),
            Error::UnresolvedAlias(name) => write!(f, "unresolved alias '{}'", name),
            Error::MalformedExpression(raw) => write!(f, "malformed binding expression '{}'", raw),
            Error::UnknownSchema => write!(f, "source document matches no known schema"),
            Error::Io(err) => write!(f, "error reading stream: {}", err),
            Error::Yaml(err) => write!(f, "problem with source document: {}", err),
            Error::Json(err) => write!(f, "problem with source document: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => err.source(),
            Error::Yaml(err) => err.source(),
            Error::Json(err) => err.source(),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(val: io::Error) -> Self {
        Error::Io(val)
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(val: serde_yaml::Error) -> Self {
        Error::Yaml(val)
    }
}

impl From<serde_json::Error> for Error {
    fn from(val: serde_json::Error) -> Self {
        Error::Json(val)
    }
}
