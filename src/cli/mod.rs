//! Command-line interface for flashscrape.

mod commands;

pub use commands::{is_verbose, run};
