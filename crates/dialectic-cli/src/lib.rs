//! Dialectic path codec CLI
//!
//! Library half of the `dialectic-paths` binary: configuration, command
//! implementations, and output rendering.

#![allow(missing_docs)]

pub mod commands;
pub mod config;

pub use config::{CliConfig, OutputFormat};
