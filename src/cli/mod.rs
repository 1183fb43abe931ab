//! CLI module for the robot binary - command-line interface.
//!
//! Provides the entry point options for running the demo robot once.

pub mod commands;

pub use commands::Cli;
