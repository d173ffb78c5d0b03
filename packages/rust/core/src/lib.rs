//! Enrichment pipeline for IntelScout.
//!
//! This crate ties the fetch capability and the fact extractor together:
//! - [`normalizer`]: raw rows → canonical seeds
//! - [`cache`]: per-run dedup cache with in-flight sharing
//! - [`scheduler`]: bounded-concurrency batches with cooldown
//! - [`resolver`]: company and catalog resolution strategies
//! - [`merge`]: field merge policies
//! - [`pipeline`]: the end-to-end `enrich` run
//! - [`report`]: summaries, CSV export, and output files

pub mod cache;
pub mod merge;
pub mod normalizer;
pub mod pipeline;
pub mod report;
pub mod resolver;
pub mod scheduler;

pub use cache::DedupCache;
pub use merge::MergePolicy;
pub use normalizer::{Normalizer, RawRow};
pub use pipeline::{
    EnrichRun, Enricher, ProgressReporter, RunStats, SilentProgress, discover_companies,
    item_timeout, placeholder_records,
};
pub use report::{
    ExportColumn, PlatformPresence, ReportPaths, SummaryReport, TechnologyCount, columns_for,
    summarize, to_csv, write_report,
};
pub use resolver::{
    CatalogResolver, CompanyResolver, Registries, Resolver, build_resolver, website_url,
};
pub use scheduler::{BatchScheduler, TaskOutcome};
