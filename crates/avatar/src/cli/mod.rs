//! Subcommand implementations.

pub mod config;
pub mod crop;
pub mod inspect;
