//! CLI argument definitions and handlers

pub mod commands;

pub use commands::Args;
