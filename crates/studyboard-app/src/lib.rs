//! StudyBoard command-line host
//!
//! Drives the canvas engine headlessly over a recording surface: scene
//! inspection, diagram import, pointer-script replay and layout preferences.

pub mod commands;
pub mod script;

pub use commands::{CliError, CliResult};
pub use script::{ScriptError, ScriptStep, parse_script, run_script};
