//! padforge_compiler - compiling Steam Controller configurations
//!
//! The library turns a human-authored controller description (a tree of
//! maps, sequences, and scalars) into the key/value document the Steam
//! client stores for the Steam Controller. The pipeline, leaves first:
//!
//! * [`vdf`] - the Valve key/value codec and its multi-valued ordered map.
//! * [`config`] - the configuration model: bindings, activators, groups,
//!   presets, overlays, and the `Mapping` that owns them.
//! * [`evspec`] - the compact binding expression language.
//! * [`export`] - the DOM-level exporter, including the shift-state and
//!   mode-shift compilers.
//! * [`maker`] - the stricter short-hand front end retained for the
//!   `actions`/`layers` grammar.
//!
//! The command-line driver lives in the `padforge` crate.

pub mod config;
pub mod error;
pub mod evspec;
pub mod export;
pub mod maker;
pub mod source;
pub mod vdf;

pub use crate::error::{Error, Result};

/// Log target for diagnostics emitted while lowering bindings.
pub const LOG_TARGET_COMPILE: &str = "padforge_compile";
