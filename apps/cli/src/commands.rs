//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use intelscout_core::{
    BatchScheduler, Enricher, MergePolicy, Normalizer, ProgressReporter, Registries, RunStats,
    build_resolver, columns_for, discover_companies, item_timeout, placeholder_records, summarize,
    write_report,
};
use intelscout_fetcher::{DirectoryQuery, build_fetcher};
use intelscout_shared::{
    AppConfig, EnrichedRecord, Mode, RunConfig, SeedEntity, init_config, load_config,
};

use crate::input::read_rows;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// IntelScout: enrich company and catalog seeds from the web.
#[derive(Parser)]
#[command(
    name = "intelscout",
    version,
    about = "Enrich company and catalog seed lists with facts extracted from their web pages.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Search the company directory and enrich every listed company.
    Search {
        /// Industry to search for.
        #[arg(long)]
        industry: String,

        /// Country filter.
        #[arg(long, default_value = "")]
        country: String,

        /// City filter.
        #[arg(long, default_value = "")]
        city: String,

        #[command(flatten)]
        run: RunOverrides,
    },

    /// Enrich seed rows read from a JSON file (an array of objects).
    Enrich {
        /// Input file with the seed rows.
        #[arg(short, long)]
        input: PathBuf,

        /// Seed kind: company or catalog.
        #[arg(short, long, default_value = "company")]
        mode: Mode,

        #[command(flatten)]
        run: RunOverrides,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

/// Per-run overrides; anything unset falls back to the config file.
#[derive(Args, Debug, Default)]
pub(crate) struct RunOverrides {
    /// Concurrent lookups per batch.
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Pause between batches in milliseconds.
    #[arg(long)]
    pub delay_ms: Option<u64>,

    /// Per-fetch timeout in milliseconds.
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Skip the about/team sub-page pass.
    #[arg(long)]
    pub no_deep: bool,

    /// Render pages through the headless service.
    #[arg(long)]
    pub headless: bool,

    /// Output directory.
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Number of technologies in the top ranking.
    #[arg(long)]
    pub top_n: Option<usize>,

    /// Merge policy: auto, safe, or conservative.
    #[arg(long)]
    pub merge: Option<String>,

    /// Write a labeled placeholder report if enrichment cannot start (search still aborts when the directory lookup itself fails).
    #[arg(long)]
    pub placeholder_on_failure: bool,
}

impl RunOverrides {
    fn apply(&self, run: &mut RunConfig) {
        if let Some(concurrency) = self.concurrency {
            run.concurrency = concurrency.max(1);
        }
        if let Some(delay_ms) = self.delay_ms {
            run.delay_ms = delay_ms;
        }
        if let Some(timeout_ms) = self.timeout_ms {
            run.timeout_ms = timeout_ms;
        }
        if self.no_deep {
            run.deep_analysis = false;
        }
        if self.headless {
            run.headless = true;
        }
        if let Some(out) = &self.out {
            run.output_dir = out.clone();
        }
        if let Some(top_n) = self.top_n {
            run.top_n = top_n;
        }
        if let Some(merge) = &self.merge {
            run.merge_policy = merge.clone();
        }
    }
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "intelscout=info",
        1 => "intelscout=debug",
        _ => "intelscout=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Search {
            industry,
            country,
            city,
            run,
        } => {
            let query = DirectoryQuery {
                industry,
                country,
                city,
            };
            cmd_search(&query, &run).await
        }
        Command::Enrich { input, mode, run } => cmd_enrich(&input, mode, &run).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_search(query: &DirectoryQuery, overrides: &RunOverrides) -> Result<()> {
    let config = load_config()?;
    let mut run = RunConfig::from(&config);
    overrides.apply(&mut run);

    info!(
        industry = %query.industry,
        country = %query.country,
        city = %query.city,
        "searching company directory"
    );

    let fetcher = build_fetcher(
        &config.fetch,
        run.headless,
        Duration::from_millis(run.timeout_ms),
    )?;
    let rows = discover_companies(fetcher.as_ref(), &config.directory.search_url, query).await?;
    println!("  Found {} companies", rows.len());

    let seeds = Normalizer::for_mode(Mode::Company).normalize(&rows);
    let base_name = format!(
        "intelligent_{}_{}_{}",
        file_part(&query.industry),
        file_part(&query.city),
        timestamp()
    );
    execute(&config, &run, Mode::Company, seeds, &base_name, overrides.placeholder_on_failure).await
}

async fn cmd_enrich(input: &Path, mode: Mode, overrides: &RunOverrides) -> Result<()> {
    let config = load_config()?;
    let mut run = RunConfig::from(&config);
    overrides.apply(&mut run);

    let rows = read_rows(input)?;
    let seeds = Normalizer::for_mode(mode).normalize(&rows);
    info!(input = %input.display(), mode = mode.as_str(), seeds = seeds.len(), "enriching rows");

    let base_name = format!("enriched_{}_{}", mode.as_str(), timestamp());
    execute(&config, &run, mode, seeds, &base_name, overrides.placeholder_on_failure).await
}

/// Set up the run, enrich, and write the report.
///
/// A fatal setup error either propagates or, when `placeholder` is set,
/// is replaced by a clearly flagged placeholder report.
async fn execute(
    config: &AppConfig,
    run: &RunConfig,
    mode: Mode,
    seeds: Vec<SeedEntity>,
    base_name: &str,
    placeholder: bool,
) -> Result<()> {
    let registries = Registries::from_config(config)?;

    let enricher = match build_enricher(config, run, mode, &registries) {
        Ok(enricher) => enricher,
        Err(e) if placeholder && e.is_fatal() => {
            warn!(error = %e, "run could not start, writing placeholder report");
            let records = placeholder_records(&seeds, &e.to_string());
            write_and_print(run, mode, &registries, &records, base_name, None)?;
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, finishing current batch");
            ctrl_c.cancel();
        }
    });

    let reporter = CliProgress::new();
    let result = enricher.enrich(seeds, &cancel, &reporter).await;

    write_and_print(
        run,
        mode,
        &registries,
        &result.records,
        base_name,
        Some(&result.stats),
    )
}

fn build_enricher(
    config: &AppConfig,
    run: &RunConfig,
    mode: Mode,
    registries: &Registries,
) -> intelscout_shared::Result<Enricher> {
    let fetch_timeout = Duration::from_millis(run.timeout_ms);
    let fetcher = build_fetcher(&config.fetch, run.headless, fetch_timeout)?;
    let resolver = build_resolver(mode, config, registries, fetcher, run.deep_analysis)?;
    let merge = MergePolicy::resolve(&run.merge_policy, mode)?;

    let scheduler = BatchScheduler::new(run.concurrency, Duration::from_millis(run.delay_ms))
        .with_item_timeout(item_timeout(fetch_timeout, resolver.as_ref()));

    info!(
        mode = mode.as_str(),
        resolver = resolver.name(),
        concurrency = run.concurrency,
        delay_ms = run.delay_ms,
        merge = %merge,
        "run configured"
    );

    Ok(Enricher::new(resolver, scheduler, merge))
}

fn write_and_print(
    run: &RunConfig,
    mode: Mode,
    registries: &Registries,
    records: &[EnrichedRecord],
    base_name: &str,
    stats: Option<&RunStats>,
) -> Result<()> {
    let summary = summarize(records, &registries.technologies, &registries.social, run.top_n);
    let paths = write_report(&run.output_dir, base_name, records, &summary, columns_for(mode))?;

    println!();
    match stats {
        Some(stats) => {
            println!("  Enrichment complete!");
            println!("  Seeds:      {}", stats.total);
            println!("  Resolved:   {}", stats.resolved);
            println!("  From cache: {}", stats.cache_hits);
            println!("  Skipped:    {}", stats.skipped);
            println!("  Errors:     {}", stats.errors);
            if stats.partial > 0 {
                println!("  Partial:    {}", stats.partial);
            }
            if stats.cancelled > 0 {
                println!("  Cancelled:  {}", stats.cancelled);
            }
            println!("  Time:       {:.1}s", stats.elapsed.as_secs_f64());
        }
        None => println!("  Placeholder report written ({} records)", records.len()),
    }
    if !summary.top_technologies.is_empty() {
        println!("  Top technologies:");
        for tech in &summary.top_technologies {
            println!("    {:<20} {}", tech.technology, tech.count);
        }
    }
    println!("  JSON:       {}", paths.records.display());
    println!("  CSV:        {}", paths.csv.display());
    println!("  Summary:    {}", paths.summary.display());
    println!();

    Ok(())
}

fn timestamp() -> String {
    Utc::now().format("%Y-%m-%dT%H-%M-%S").to_string()
}

/// Make a user-supplied value safe for a file name.
fn file_part(value: &str) -> String {
    let part: String = value
        .trim()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect();
    if part.is_empty() { "all".to_string() } else { part }
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap()
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn batch_started(&self, batch: usize, batches: usize, size: usize) {
        self.spinner
            .set_message(format!("Batch [{batch}/{batches}] {size} lookups"));
    }

    fn item_settled(&self, done: usize, total: usize) {
        self.spinner.set_message(format!("Resolved [{done}/{total}]"));
    }

    fn done(&self, _stats: &RunStats) {
        self.spinner.finish_and_clear();
    }
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
