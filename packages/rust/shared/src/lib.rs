//! Shared types, error model, and configuration for IntelScout.
//!
//! This crate is the foundation depended on by all other IntelScout crates.
//! It provides:
//! - [`IntelScoutError`]: the unified error type
//! - Domain types ([`SeedEntity`], [`CacheEntry`], [`ExtractedFields`], [`EnrichedRecord`])
//! - Configuration ([`AppConfig`], [`RunConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, CatalogConfig, DefaultsConfig, DirectoryConfig, FetchConfig, RunConfig,
    TechnologySpec, browserless_token, config_dir, config_file_path, init_config, load_config,
    load_config_from,
};
pub use error::{IntelScoutError, Result};
pub use types::{
    CacheEntry, EnrichedRecord, ExtractedFields, Failure, FailureStage, FetchedPage, Fields,
    LIST_SEPARATOR, Mode, RunId, SeedEntity, Status, is_blank, join_list, split_list,
};
