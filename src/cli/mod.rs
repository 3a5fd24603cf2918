//! Command-line interface for doclabel.

mod commands;
pub mod icons;

pub use commands::{is_verbose, run};
