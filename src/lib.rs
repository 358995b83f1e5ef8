//! Sheet Translator - batch translation for spreadsheet-exported texts
//!
//! This library translates one language column of a sheet export into
//! another, with pluggable translation backends, chunked concurrent
//! dispatch, caching and per-item retry handling.

#![forbid(unsafe_code)]

pub mod cache;
pub mod cli;
pub mod core;
pub mod io;
pub mod pipeline;
pub mod services;

// Re-export key types for convenience
pub use crate::core::{
    config::{CacheKind, ServiceKind, TranslatorConfig},
    errors::TranslationError,
    models::{Row, RowResult, RunSummary, TranslationRequest},
};

pub use crate::cache::{build_cache, TranslationCache};
pub use crate::pipeline::Pipeline;
pub use crate::services::{create_service, TranslationService};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
