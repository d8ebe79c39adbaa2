//! CLI for picrelay: the orchestrator command plus the entry points of
//! the individually supervised services.

pub mod commands;
pub mod orchestrate;
pub mod parser;
pub mod services;

pub use commands::Commands;
pub use parser::Cli;
