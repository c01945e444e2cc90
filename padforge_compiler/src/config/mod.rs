//! Configuration model for a Steam Controller mapping.
//!
//! Bindings, activators, groups, presets and overlays, plus the
//! `Mapping`/`ControllerConfig` roots that own them and encode to VDF.

pub mod activator;
pub mod evgen;
pub mod group;
pub mod mapping;
pub mod settings;

pub use activator::{Activator, Input, Signal};
pub use evgen::{Binding, Evgen, GroupRef, IconInfo};
pub use group::{Group, Mode};
pub use mapping::{ControllerConfig, GroupSourceBinding, Mapping, Overlay, Preset};
pub use settings::{Constraint, Scalar, Settings};
