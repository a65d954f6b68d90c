//! CLI module for chloop - command-line options for the demo binary.

pub mod commands;

pub use commands::Cli;
