//! Core domain types shared by the fetcher, extractor, and pipeline crates.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Separator used when a list-valued fact is stored in a single field.
pub const LIST_SEPARATOR: &str = "; ";

/// Canonical field name → value. An empty string means "no value".
pub type Fields = BTreeMap<String, String>;

/// Whether a field value counts as empty (unset, empty, or whitespace-only).
pub fn is_blank(value: Option<&String>) -> bool {
    value.is_none_or(|v| v.trim().is_empty())
}

/// Join list values into the single-string field representation.
pub fn join_list<S: AsRef<str>>(items: &[S]) -> String {
    items
        .iter()
        .map(|s| s.as_ref())
        .collect::<Vec<_>>()
        .join(LIST_SEPARATOR)
}

/// Split a list-valued field back into its items, ignoring blanks.
pub fn split_list(value: &str) -> Vec<&str> {
    value
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

// ---------------------------------------------------------------------------
// RunId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper identifying one enrichment run (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub Uuid);

impl RunId {
    /// Generate a new time-sortable run identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Mode
// ---------------------------------------------------------------------------

/// Which kind of seed is being enriched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Company profiles, resolved by visiting the company website.
    Company,
    /// Bibliographic titles, resolved through a library catalog.
    Catalog,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Company => "company",
            Self::Catalog => "catalog",
        }
    }
}

impl std::str::FromStr for Mode {
    type Err = crate::IntelScoutError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "company" | "companies" => Ok(Self::Company),
            "catalog" | "book" | "books" => Ok(Self::Catalog),
            other => Err(crate::IntelScoutError::validation(format!(
                "unknown mode '{other}': expected 'company' or 'catalog'"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// SeedEntity
// ---------------------------------------------------------------------------

/// One input row resolved into the canonical identity schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedEntity {
    /// Position in the input sequence.
    pub index: usize,
    /// Normalized identity (trimmed, case-folded). Empty when the row has no usable key.
    pub key: String,
    /// Human-readable identity as it appeared in the input.
    pub display_name: String,
    /// Where the remote detail resource can be reached (URL or query text).
    pub locator: String,
    /// Input columns under canonical names.
    pub raw_fields: Fields,
}

impl SeedEntity {
    /// Whether this seed can be resolved at all.
    pub fn has_usable_key(&self) -> bool {
        !self.key.trim().is_empty()
    }
}

// ---------------------------------------------------------------------------
// FetchedPage
// ---------------------------------------------------------------------------

/// A fetched remote document, ready for fact extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchedPage {
    /// Final URL after redirects.
    pub url: String,
    /// HTTP status code, when the transport exposes one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    /// Full document source.
    pub html: String,
    /// Visible body text (scripts and styles excluded).
    pub text: String,
    /// Absolute outbound links, in document order.
    pub links: Vec<String>,
    /// When the page was fetched.
    pub fetched_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// ExtractedFields
// ---------------------------------------------------------------------------

/// Facts produced by the extractor for a single seed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedFields {
    /// Canonical field name → value ("" when nothing was found).
    pub values: Fields,
    /// Sub-extractors that failed; non-empty means the result is partial.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<String>,
}

impl ExtractedFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, replacing any previous value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    /// Get a field value ("" when absent).
    pub fn get(&self, name: &str) -> &str {
        self.values.get(name).map(String::as_str).unwrap_or("")
    }

    /// Fold another extraction result into this one.
    pub fn absorb(&mut self, other: ExtractedFields) {
        self.values.extend(other.values);
        self.issues.extend(other.issues);
    }

    pub fn is_partial(&self) -> bool {
        !self.issues.is_empty()
    }
}

// ---------------------------------------------------------------------------
// CacheEntry
// ---------------------------------------------------------------------------

/// Which remote step failed while resolving a seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    /// Locating the detail resource (catalog search page).
    Search,
    /// Fetching or evaluating the detail resource itself.
    Detail,
}

/// A recorded per-item failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    pub stage: FailureStage,
    pub reason: String,
}

impl Failure {
    pub fn search(reason: impl Into<String>) -> Self {
        Self {
            stage: FailureStage::Search,
            reason: reason.into(),
        }
    }

    pub fn detail(reason: impl Into<String>) -> Self {
        Self {
            stage: FailureStage::Detail,
            reason: reason.into(),
        }
    }
}

/// Memoized outcome of resolving one identity key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CacheEntry {
    /// The detail resource was found and evaluated.
    Found(ExtractedFields),
    /// The lookup succeeded but no matching resource exists.
    NotFound,
    /// The lookup failed.
    Error(Failure),
}

impl CacheEntry {
    /// Status for a seed that triggered this resolution (`fresh`) or reused it.
    pub fn status(&self, fresh: bool) -> Status {
        match (self, fresh) {
            (Self::Found(_), true) => Status::Complete,
            (Self::Found(_), false) => Status::UpdatedFromCache,
            (Self::NotFound, true) => Status::NotFound,
            (Self::NotFound, false) => Status::NotFoundCached,
            (Self::Error(f), _) => match f.stage {
                FailureStage::Search => Status::ErrorSearch,
                FailureStage::Detail => Status::ErrorDetail,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Status & EnrichedRecord
// ---------------------------------------------------------------------------

/// Final per-seed outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Complete,
    UpdatedFromCache,
    NotFound,
    NotFoundCached,
    SkippedEmptyKey,
    SkippedAlreadyComplete,
    ErrorDetail,
    ErrorSearch,
    /// Never dispatched because the run was cancelled.
    Cancelled,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Complete => "complete",
            Self::UpdatedFromCache => "updated_from_cache",
            Self::NotFound => "not_found",
            Self::NotFoundCached => "not_found_cached",
            Self::SkippedEmptyKey => "skipped_empty_key",
            Self::SkippedAlreadyComplete => "skipped_already_complete",
            Self::ErrorDetail => "error_detail",
            Self::ErrorSearch => "error_search",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::ErrorDetail | Self::ErrorSearch)
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A seed after enrichment: its input fields merged with extracted facts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichedRecord {
    pub index: usize,
    pub key: String,
    pub display_name: String,
    pub locator: String,
    pub fields: Fields,
    pub status: Status,
    /// Sub-extractor failures or the failure reason for error statuses.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed_at: Option<DateTime<Utc>>,
    /// Set on records standing in for a run that could not be performed.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub placeholder: bool,
}

impl EnrichedRecord {
    /// A record that carries the seed's own fields unchanged.
    pub fn from_seed(seed: &SeedEntity, status: Status) -> Self {
        Self {
            index: seed.index,
            key: seed.key.clone(),
            display_name: seed.display_name.clone(),
            locator: seed.locator.clone(),
            fields: seed.raw_fields.clone(),
            status,
            issues: Vec::new(),
            processed_at: None,
            placeholder: false,
        }
    }

    /// Field value ("" when absent).
    pub fn field(&self, name: &str) -> &str {
        self.fields.get(name).map(String::as_str).unwrap_or("")
    }

    /// Whether extraction for this record was only partially successful.
    pub fn is_partial(&self) -> bool {
        matches!(self.status, Status::Complete | Status::UpdatedFromCache)
            && !self.issues.is_empty()
    }
}
