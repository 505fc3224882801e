//! Configuration for the `generate` command.
//!
//! Values are layered with the precedence CLI flag > `--set` > config file >
//! built-in defaults.

pub mod builder;
pub mod file;
pub mod models;
