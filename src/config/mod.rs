//! Module: config
//!
//! Purpose: Keymap configuration. Turns `config.json` on the storage volume
//! into a validated page set and commits it to the page registry.
//!
//! Architecture:
//! - keyname: key string grammar (`"shift+a"`, `"page 3"`)
//! - parser: document validation, all-or-nothing
//! - loader: change-driven reload with fault signalling
//! - settings: firmware tunables
//!
//! Safety: Runs on the config core only. The registry is the sole shared state.

pub mod error;
pub mod keyname;
pub mod loader;
pub mod parser;
pub mod settings;

pub use error::{LoadError, ReadError, ValidationError};
pub use keyname::parse_key;
pub use loader::ConfigLoader;
pub use parser::{parse, parse_color, parse_document};
pub use settings::Settings;
