//! CLI command implementations.

pub mod configs;
pub mod run;
