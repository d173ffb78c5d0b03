//! Application configuration for IntelScout.
//!
//! User config lives at `~/.intelscout/intelscout.toml`.
//! CLI flags override config file values, which override defaults.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{IntelScoutError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "intelscout.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".intelscout";

// ---------------------------------------------------------------------------
// Config structs (matching intelscout.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Fetch transport settings.
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Company directory search.
    #[serde(default)]
    pub directory: DirectoryConfig,

    /// Library catalog lookup.
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Extra technology signatures appended to the built-in registry.
    #[serde(default)]
    pub technologies: Vec<TechnologySpec>,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Where result artifacts are written.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Seeds resolved concurrently per batch.
    #[serde(default = "default_concurrency")]
    pub concurrency: u32,

    /// Cooldown between batches, in milliseconds.
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,

    /// Per-item time budget, in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Visit about/team pages after the landing page (company mode).
    #[serde(default = "default_true")]
    pub deep_analysis: bool,

    /// Number of entries in the technology ranking.
    #[serde(default = "default_top_n")]
    pub top_n: usize,

    /// Merge policy: "auto", "safe", or "conservative".
    #[serde(default = "default_merge_policy")]
    pub merge_policy: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            concurrency: default_concurrency(),
            delay_ms: default_delay_ms(),
            timeout_ms: default_timeout_ms(),
            deep_analysis: true,
            top_n: default_top_n(),
            merge_policy: default_merge_policy(),
        }
    }
}

fn default_output_dir() -> String {
    "./company_intelligence".into()
}
fn default_concurrency() -> u32 {
    2
}
fn default_delay_ms() -> u64 {
    3000
}
fn default_timeout_ms() -> u64 {
    45_000
}
fn default_top_n() -> usize {
    10
}
fn default_merge_policy() -> String {
    "auto".into()
}
fn default_true() -> bool {
    true
}

/// `[fetch]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Render pages through a headless browser service instead of plain HTTP.
    #[serde(default)]
    pub headless: bool,

    /// Base URL of the Browserless-compatible rendering service.
    #[serde(default)]
    pub browserless_url: String,

    /// Name of the env var holding the rendering service token (never store the token itself).
    #[serde(default = "default_token_env")]
    pub browserless_token_env: String,

    /// Fixed settle delay after render, used only when the service cannot report readiness.
    #[serde(default)]
    pub settle_ms: u64,

    /// User agents rotated across requests.
    #[serde(default = "default_user_agents")]
    pub user_agents: Vec<String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            headless: false,
            browserless_url: String::new(),
            browserless_token_env: default_token_env(),
            settle_ms: 0,
            user_agents: default_user_agents(),
        }
    }
}

fn default_token_env() -> String {
    "BROWSERLESS_TOKEN".into()
}

fn default_user_agents() -> Vec<String> {
    vec![
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".into(),
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Safari/605.1.15".into(),
        "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".into(),
    ]
}

/// `[directory]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DirectoryConfig {
    /// Search URL template with `{industry}`, `{country}` and `{city}` placeholders.
    #[serde(default)]
    pub search_url: String,
}

/// `[catalog]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Search URL template with a `{query}` placeholder.
    #[serde(default)]
    pub search_url: String,

    /// CSS selector for the links of the search result list.
    #[serde(default = "default_result_selector")]
    pub result_selector: String,

    /// Canonical field name → row labels to look for on the detail page.
    #[serde(default = "default_catalog_labels")]
    pub labels: BTreeMap<String, Vec<String>>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            search_url: String::new(),
            result_selector: default_result_selector(),
            labels: default_catalog_labels(),
        }
    }
}

fn default_result_selector() -> String {
    ".result-title a, a.result-title, .search-result a[href]".into()
}

fn default_catalog_labels() -> BTreeMap<String, Vec<String>> {
    let table: [(&str, &[&str]); 8] = [
        ("author", &["Pengarang", "Author"]),
        ("publication", &["Penerbitan", "Publikasi", "Publication", "Imprint"]),
        ("isbn", &["ISBN"]),
        ("edition", &["Edisi", "Edition"]),
        ("physical_description", &["Deskripsi Fisik", "Physical Description"]),
        ("subject", &["Subjek", "Subject"]),
        ("call_number", &["No. Panggil", "Call Number"]),
        ("language", &["Bahasa", "Language"]),
    ];
    table
        .into_iter()
        .map(|(field, labels)| {
            (
                field.to_string(),
                labels.iter().map(|l| l.to_string()).collect(),
            )
        })
        .collect()
}

/// `[[technologies]]` entry: an extra fingerprint for the technology registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TechnologySpec {
    /// Display name (e.g. "Webflow").
    pub name: String,
    /// Category bucket (cms, analytics, marketing, ecommerce, frontend, payment, hosting).
    #[serde(default = "default_category")]
    pub category: String,
    /// Regular expressions, matched case-insensitively against the page source.
    pub patterns: Vec<String>,
}

fn default_category() -> String {
    "other".into()
}

// ---------------------------------------------------------------------------
// Run config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime configuration: merged from config file + CLI flags.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Seeds resolved concurrently per batch (at least 1).
    pub concurrency: usize,
    /// Cooldown between batches in ms.
    pub delay_ms: u64,
    /// Per-item timeout in ms.
    pub timeout_ms: u64,
    /// Output directory for artifacts.
    pub output_dir: PathBuf,
    /// Whether the deep analysis pass runs.
    pub deep_analysis: bool,
    /// Whether pages are rendered by the headless service.
    pub headless: bool,
    /// Technology ranking size.
    pub top_n: usize,
    /// Merge policy name: "auto", "safe", or "conservative".
    pub merge_policy: String,
}

impl From<&AppConfig> for RunConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            concurrency: (config.defaults.concurrency as usize).max(1),
            delay_ms: config.defaults.delay_ms,
            timeout_ms: config.defaults.timeout_ms,
            output_dir: PathBuf::from(&config.defaults.output_dir),
            deep_analysis: config.defaults.deep_analysis,
            headless: config.fetch.headless,
            top_n: config.defaults.top_n,
            merge_policy: config.defaults.merge_policy.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.intelscout/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| IntelScoutError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.intelscout/intelscout.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| IntelScoutError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        IntelScoutError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| IntelScoutError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| IntelScoutError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| IntelScoutError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Read the rendering service token from the configured env var, if set.
pub fn browserless_token(config: &FetchConfig) -> Option<String> {
    std::env::var(&config.browserless_token_env)
        .ok()
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("output_dir"));
        assert!(toml_str.contains("BROWSERLESS_TOKEN"));
        assert!(toml_str.contains("Pengarang"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.defaults.concurrency, 2);
        assert_eq!(parsed.defaults.delay_ms, 3000);
        assert_eq!(parsed.fetch.user_agents.len(), 3);
        assert_eq!(parsed.catalog.labels.len(), 8);
    }

    #[test]
    fn config_with_technologies() {
        let toml_str = r#"
[defaults]
concurrency = 4
deep_analysis = false

[[technologies]]
name = "Webflow"
category = "cms"
patterns = ["webflow\\.com", "wf-page"]

[[technologies]]
name = "Plausible"
patterns = ["plausible\\.io"]
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.defaults.concurrency, 4);
        assert!(!config.defaults.deep_analysis);
        assert_eq!(config.defaults.timeout_ms, 45_000);
        assert_eq!(config.technologies.len(), 2);
        assert_eq!(config.technologies[0].category, "cms");
        assert_eq!(config.technologies[1].category, "other");
    }

    #[test]
    fn run_config_from_app_config() {
        let mut app = AppConfig::default();
        app.defaults.concurrency = 0;
        let run = RunConfig::from(&app);
        assert_eq!(run.concurrency, 1);
        assert_eq!(run.timeout_ms, 45_000);
        assert!(run.deep_analysis);
        assert!(!run.headless);
        assert_eq!(run.output_dir, PathBuf::from("./company_intelligence"));
    }

    #[test]
    fn missing_token_env_yields_none() {
        let config = FetchConfig {
            browserless_token_env: "IS_TEST_NONEXISTENT_TOKEN_12345".into(),
            ..FetchConfig::default()
        };
        assert!(browserless_token(&config).is_none());
    }
}
