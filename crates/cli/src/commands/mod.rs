//! Subcommand implementations

pub mod recommend;
pub mod reload;
pub mod status;
