//! End-to-end enrichment: seeds → dedup → scheduled resolution → merged records.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use intelscout_fetcher::{DirectoryQuery, Fetcher, search_directory};
use intelscout_shared::{
    CacheEntry, EnrichedRecord, Failure, IntelScoutError, Result, RunId, SeedEntity, Status,
    is_blank,
};

use crate::cache::DedupCache;
use crate::merge::MergePolicy;
use crate::normalizer::RawRow;
use crate::resolver::Resolver;
use crate::scheduler::{BatchScheduler, TaskOutcome};

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called before a batch is dispatched.
    fn batch_started(&self, batch: usize, batches: usize, size: usize);
    /// Called each time a scheduled item settles.
    fn item_settled(&self, done: usize, total: usize);
    /// Called when the run completes.
    fn done(&self, stats: &RunStats);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn batch_started(&self, _batch: usize, _batches: usize, _size: usize) {}
    fn item_settled(&self, _done: usize, _total: usize) {}
    fn done(&self, _stats: &RunStats) {}
}

/// Counters for one enrichment run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunStats {
    pub total: usize,
    /// Distinct keys dispatched to the resolver.
    pub resolved: usize,
    /// Seeds answered from an earlier seed's outcome.
    pub cache_hits: usize,
    pub skipped: usize,
    pub errors: usize,
    /// Successful records where at least one sub-extractor failed.
    pub partial: usize,
    pub cancelled: usize,
    pub elapsed: Duration,
}

/// Result of [`Enricher::enrich`]: one record per input seed, in input order.
#[derive(Debug, Clone)]
pub struct EnrichRun {
    pub run_id: RunId,
    pub records: Vec<EnrichedRecord>,
    pub stats: RunStats,
}

/// What to do with one seed before any network work.
enum Plan {
    Skip(Status),
    Resolve,
}

/// Drives a [`Resolver`] over a seed list under a [`BatchScheduler`].
pub struct Enricher {
    resolver: Arc<dyn Resolver>,
    scheduler: BatchScheduler,
    merge: MergePolicy,
}

impl Enricher {
    pub fn new(resolver: Arc<dyn Resolver>, scheduler: BatchScheduler, merge: MergePolicy) -> Self {
        Self {
            resolver,
            scheduler,
            merge,
        }
    }

    /// Enrich every seed. Never drops or reorders seeds.
    ///
    /// Each distinct key is resolved at most once; later seeds with the same
    /// key reuse the stored outcome.
    #[instrument(skip_all, fields(resolver = self.resolver.name(), seeds = seeds.len()))]
    pub async fn enrich(
        &self,
        seeds: Vec<SeedEntity>,
        cancel: &CancellationToken,
        progress: &dyn ProgressReporter,
    ) -> EnrichRun {
        let start = Instant::now();
        let run_id = RunId::new();
        let cache = Arc::new(DedupCache::new());

        info!(%run_id, merge = %self.merge, "starting enrichment run");

        // --- Phase 1: plan ---
        progress.phase("Planning");
        let plans: Vec<Plan> = seeds.iter().map(|seed| self.plan(seed)).collect();

        let mut first_index: HashMap<String, usize> = HashMap::new();
        let mut unique: Vec<SeedEntity> = Vec::new();
        for (seed, plan) in seeds.iter().zip(&plans) {
            if matches!(plan, Plan::Resolve) && !first_index.contains_key(&seed.key) {
                first_index.insert(seed.key.clone(), seed.index);
                unique.push(seed.clone());
            }
        }

        // --- Phase 2: resolve distinct keys ---
        progress.phase("Resolving");
        let keys: Vec<String> = unique.iter().map(|s| s.key.clone()).collect();
        let resolver = self.resolver.clone();
        let task_cache = cache.clone();

        let outcomes = self
            .scheduler
            .run(unique, cancel, progress, move |seed: SeedEntity| {
                let resolver = resolver.clone();
                let cache = task_cache.clone();
                async move {
                    let key = seed.key.clone();
                    cache
                        .resolve_with(&key, || async { resolver.resolve(&seed).await })
                        .await
                }
            })
            .await;

        let mut never_dispatched: HashSet<String> = HashSet::new();
        for (key, outcome) in keys.iter().zip(outcomes) {
            let failure = match outcome {
                TaskOutcome::Settled(_) => continue,
                TaskOutcome::Cancelled => {
                    never_dispatched.insert(key.clone());
                    continue;
                }
                TaskOutcome::TimedOut => Failure::detail(
                    IntelScoutError::Timeout {
                        millis: self.scheduler_item_timeout_ms(),
                    }
                    .to_string(),
                ),
                TaskOutcome::Failed(reason) => Failure::detail(format!("task failed: {reason}")),
            };
            warn!(%key, reason = %failure.reason, "resolution did not settle normally");
            cache.record(key, CacheEntry::Error(failure)).await;
        }

        // --- Phase 3: assemble in input order ---
        progress.phase("Merging");
        let mut stats = RunStats {
            total: seeds.len(),
            resolved: first_index.len() - never_dispatched.len(),
            ..RunStats::default()
        };
        let mut records = Vec::with_capacity(seeds.len());

        for (seed, plan) in seeds.iter().zip(plans) {
            let record = match plan {
                Plan::Skip(status) => {
                    stats.skipped += 1;
                    EnrichedRecord::from_seed(seed, status)
                }
                Plan::Resolve => {
                    let fresh = first_index.get(&seed.key) == Some(&seed.index);
                    let entry = cache.lookup(&seed.key).await;
                    let record = self.apply(seed, entry, fresh);
                    if !fresh && record.status != Status::Cancelled {
                        stats.cache_hits += 1;
                    }
                    record
                }
            };
            if record.status.is_error() {
                stats.errors += 1;
            }
            if record.is_partial() {
                stats.partial += 1;
            }
            if record.status == Status::Cancelled {
                stats.cancelled += 1;
            }
            records.push(record);
        }

        stats.elapsed = start.elapsed();
        progress.done(&stats);

        info!(
            %run_id,
            total = stats.total,
            resolved = stats.resolved,
            cache_hits = stats.cache_hits,
            skipped = stats.skipped,
            errors = stats.errors,
            partial = stats.partial,
            cancelled = stats.cancelled,
            elapsed_ms = stats.elapsed.as_millis() as u64,
            "enrichment run complete"
        );

        EnrichRun {
            run_id,
            records,
            stats,
        }
    }

    fn plan(&self, seed: &SeedEntity) -> Plan {
        if !seed.has_usable_key() {
            return Plan::Skip(Status::SkippedEmptyKey);
        }
        let targets = self.resolver.target_fields();
        if !targets.is_empty() && targets.iter().all(|t| !is_blank(seed.raw_fields.get(t))) {
            return Plan::Skip(Status::SkippedAlreadyComplete);
        }
        Plan::Resolve
    }

    fn apply(&self, seed: &SeedEntity, entry: Option<CacheEntry>, fresh: bool) -> EnrichedRecord {
        let Some(entry) = entry else {
            return EnrichedRecord::from_seed(seed, Status::Cancelled);
        };

        let mut record = EnrichedRecord::from_seed(seed, entry.status(fresh));
        record.processed_at = Some(Utc::now());
        match entry {
            CacheEntry::Found(extracted) => {
                self.merge.apply(&mut record.fields, &extracted.values);
                record.issues = extracted.issues;
            }
            CacheEntry::NotFound => {}
            CacheEntry::Error(failure) => record.issues.push(failure.reason),
        }
        record
    }

    fn scheduler_item_timeout_ms(&self) -> u64 {
        self.scheduler
            .item_timeout()
            .map(|t| t.as_millis() as u64)
            .unwrap_or_default()
    }
}

/// Per-item budget: one fetch timeout per sequential fetch the resolver may make.
pub fn item_timeout(fetch_timeout: Duration, resolver: &dyn Resolver) -> Duration {
    fetch_timeout * resolver.fetch_budget().max(1)
}

// ---------------------------------------------------------------------------
// Directory search
// ---------------------------------------------------------------------------

/// Search the company directory and turn listings into raw rows.
///
/// Failure is fatal: without listings there is nothing to enrich.
#[instrument(skip_all, fields(industry = %query.industry))]
pub async fn discover_companies(
    fetcher: &dyn Fetcher,
    template: &str,
    query: &DirectoryQuery,
) -> Result<Vec<RawRow>> {
    let listings = search_directory(fetcher, template, query).await?;
    if listings.is_empty() {
        warn!("directory search returned no companies");
    }
    Ok(listings
        .into_iter()
        .map(|listing| listing.into_row(&query.industry))
        .collect())
}

// ---------------------------------------------------------------------------
// Placeholder
// ---------------------------------------------------------------------------

/// Stand-in records for a run that could not be performed.
///
/// Same length and order as `seeds`; every record is flagged and carries `reason`.
pub fn placeholder_records(seeds: &[SeedEntity], reason: &str) -> Vec<EnrichedRecord> {
    seeds
        .iter()
        .map(|seed| {
            let mut record = EnrichedRecord::from_seed(seed, Status::ErrorDetail);
            record.placeholder = true;
            record.issues.push(reason.to_string());
            record
        })
        .collect()
}
