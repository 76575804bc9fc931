//! Command-line interface for clickrank.

mod commands;
mod helpers;

pub use commands::{is_verbose, run};
