//! Command-line interface.

mod commands;
mod helpers;

pub use commands::run;
