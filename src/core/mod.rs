//! Core types shared across the translation pipeline

pub mod config;
pub mod errors;
pub mod models;
pub mod rate_limit;
pub mod wrap;
