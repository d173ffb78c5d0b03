//! Run summaries and flat exports.
//!
//! Technology counts follow registry order, so rankings are deterministic:
//! ties in the top-N list fall back to registry order, then to the order in
//! which an unregistered technology was first seen.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, instrument};

use intelscout_extract::{SocialRegistry, TECHNOLOGIES_FIELD, TechnologyRegistry};
use intelscout_shared::{EnrichedRecord, IntelScoutError, Mode, Result, split_list};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TechnologyCount {
    pub technology: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlatformPresence {
    pub platform: String,
    pub count: usize,
}

/// Aggregate view over one run's records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryReport {
    pub total_count: usize,
    /// Records mentioning each technology; registry order, zero counts omitted.
    pub technology_counts: Vec<TechnologyCount>,
    /// Records with a profile link per platform; every platform listed.
    pub platform_presence: Vec<PlatformPresence>,
    pub top_technologies: Vec<TechnologyCount>,
    pub status_counts: BTreeMap<String, usize>,
    pub industry_breakdown: BTreeMap<String, usize>,
}

/// Compute the summary for a set of records.
pub fn summarize(
    records: &[EnrichedRecord],
    technologies: &TechnologyRegistry,
    social: &SocialRegistry,
    top_n: usize,
) -> SummaryReport {
    // Per-technology tally keyed by first-seen order for unregistered names.
    let mut seen: Vec<String> = Vec::new();
    let mut tally: BTreeMap<String, usize> = BTreeMap::new();
    for record in records {
        let mut in_record: Vec<&str> = Vec::new();
        for name in split_list(record.field(TECHNOLOGIES_FIELD)) {
            if in_record.contains(&name) {
                continue;
            }
            in_record.push(name);
            if !tally.contains_key(name) {
                seen.push(name.to_string());
            }
            *tally.entry(name.to_string()).or_default() += 1;
        }
    }

    let mut technology_counts: Vec<TechnologyCount> = technologies
        .iter()
        .filter_map(|sig| {
            tally.get(&sig.name).map(|&count| TechnologyCount {
                technology: sig.name.clone(),
                count,
            })
        })
        .collect();
    technology_counts.extend(
        seen.iter()
            .filter(|name| technologies.position(name).is_none())
            .map(|name| TechnologyCount {
                technology: name.clone(),
                count: tally[name],
            }),
    );

    // sort_by is stable: equal counts keep registry / first-seen order.
    let mut top_technologies = technology_counts.clone();
    top_technologies.sort_by(|a, b| b.count.cmp(&a.count));
    top_technologies.truncate(top_n);

    let platform_presence = social
        .iter()
        .map(|platform| PlatformPresence {
            platform: platform.name.clone(),
            count: records
                .iter()
                .filter(|r| !r.field(&platform.name).trim().is_empty())
                .count(),
        })
        .collect();

    let mut status_counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut industry_breakdown: BTreeMap<String, usize> = BTreeMap::new();
    for record in records {
        *status_counts.entry(record.status.as_str().to_string()).or_default() += 1;
        let industry = record.field("industry").trim();
        if !industry.is_empty() {
            *industry_breakdown.entry(industry.to_string()).or_default() += 1;
        }
    }

    SummaryReport {
        total_count: records.len(),
        technology_counts,
        platform_presence,
        top_technologies,
        status_counts,
        industry_breakdown,
    }
}

// ---------------------------------------------------------------------------
// CSV export
// ---------------------------------------------------------------------------

/// Field name that renders the record status instead of a stored field.
const STATUS_FIELD: &str = "status";

/// One CSV column: header text, source field, optional character cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportColumn {
    pub header: &'static str,
    pub field: &'static str,
    pub max_chars: Option<usize>,
}

const fn col(header: &'static str, field: &'static str) -> ExportColumn {
    ExportColumn {
        header,
        field,
        max_chars: None,
    }
}

const COMPANY_COLUMNS: &[ExportColumn] = &[
    col("Company Name", "name"),
    col("Website", "website"),
    col("Description", "description"),
    col("Industry", "industry"),
    col("Email", "emails"),
    col("Phone", "phones"),
    col("LinkedIn", "linkedin"),
    col("Twitter", "twitter"),
    col("Facebook", "facebook"),
    col("Instagram", "instagram"),
    col("YouTube", "youtube"),
    col("GitHub", "github"),
    col("Technologies", "technologies"),
    col("CMS", "tech_cms"),
    col("Analytics Tools", "tech_analytics"),
    col("Marketing Tools", "tech_marketing"),
    col("E-commerce Tools", "tech_ecommerce"),
    col("Has Google Analytics", "has_google_analytics"),
    col("Has Facebook Pixel", "has_facebook_pixel"),
    ExportColumn {
        header: "Meta Description",
        field: "meta_description",
        max_chars: Some(100),
    },
    col("Team", "team"),
    col("Status", STATUS_FIELD),
];

const CATALOG_COLUMNS: &[ExportColumn] = &[
    col("Title", "title"),
    col("Author", "author"),
    col("Place", "place"),
    col("Publisher", "publisher"),
    col("Year", "year"),
    col("ISBN", "isbn"),
    col("Edition", "edition"),
    col("Physical Description", "physical_description"),
    col("Subject", "subject"),
    col("Call Number", "call_number"),
    col("Language", "language"),
    col("Detail URL", "detail_url"),
    col("Status", STATUS_FIELD),
];

/// Export columns for a mode.
pub fn columns_for(mode: Mode) -> &'static [ExportColumn] {
    match mode {
        Mode::Company => COMPANY_COLUMNS,
        Mode::Catalog => CATALOG_COLUMNS,
    }
}

/// Render records as CSV. The header row is always present.
///
/// Headers are written bare; every data cell is quoted with `"` doubled.
pub fn to_csv(records: &[EnrichedRecord], columns: &[ExportColumn]) -> Result<String> {
    let mut header = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Necessary)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    header
        .write_record(columns.iter().map(|c| c.header))
        .map_err(csv_error)?;
    let buffer = header.into_inner().map_err(|e| csv_error(e.into_error()))?;

    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(buffer);
    for record in records {
        writer
            .write_record(columns.iter().map(|column| cell(record, column)))
            .map_err(csv_error)?;
    }
    let bytes = writer.into_inner().map_err(|e| csv_error(e.into_error()))?;

    String::from_utf8(bytes)
        .map_err(|e| IntelScoutError::validation(format!("CSV output is not UTF-8: {e}")))
}

fn csv_error(e: impl std::fmt::Display) -> IntelScoutError {
    IntelScoutError::validation(format!("CSV serialization failed: {e}"))
}

fn cell(record: &EnrichedRecord, column: &ExportColumn) -> String {
    let value = if column.field == STATUS_FIELD {
        record.status.as_str()
    } else {
        record.field(column.field)
    };
    match column.max_chars {
        Some(max) => value.chars().take(max).collect(),
        None => value.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Artifacts
// ---------------------------------------------------------------------------

/// Files written for one run.
#[derive(Debug, Clone)]
pub struct ReportPaths {
    pub records: PathBuf,
    pub csv: PathBuf,
    pub summary: PathBuf,
}

/// Write `<base>.json`, `<base>.csv` and `<base>_tech_summary.json` into `dir`.
#[instrument(skip_all, fields(dir = %dir.display(), base = %base_name))]
pub fn write_report(
    dir: &Path,
    base_name: &str,
    records: &[EnrichedRecord],
    summary: &SummaryReport,
    columns: &[ExportColumn],
) -> Result<ReportPaths> {
    std::fs::create_dir_all(dir).map_err(|e| IntelScoutError::io(dir, e))?;

    let paths = ReportPaths {
        records: dir.join(format!("{base_name}.json")),
        csv: dir.join(format!("{base_name}.csv")),
        summary: dir.join(format!("{base_name}_tech_summary.json")),
    };

    write_atomic(&paths.records, &to_json(records)?)?;
    write_atomic(&paths.csv, &to_csv(records, columns)?)?;
    write_atomic(&paths.summary, &to_json(summary)?)?;

    info!(records = records.len(), "report written");
    Ok(paths)
}

fn to_json<T: Serialize + ?Sized>(data: &T) -> Result<String> {
    serde_json::to_string_pretty(data)
        .map_err(|e| IntelScoutError::validation(format!("JSON serialization failed: {e}")))
}

/// Write through a temp file and rename into place.
fn write_atomic(target: &Path, content: &str) -> Result<()> {
    let file_name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp = target.with_file_name(format!(".{file_name}.tmp"));
    std::fs::write(&temp, content).map_err(|e| IntelScoutError::io(&temp, e))?;
    std::fs::rename(&temp, target).map_err(|e| IntelScoutError::io(target, e))?;
    debug!(path = %target.display(), size = content.len(), "wrote file");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use intelscout_extract::TechnologySignature;
    use intelscout_shared::{SeedEntity, Status};

    fn record(index: usize, status: Status, fields: &[(&str, &str)]) -> EnrichedRecord {
        let seed = SeedEntity {
            index,
            key: format!("k{index}"),
            display_name: format!("Company {index}"),
            locator: String::new(),
            raw_fields: fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        };
        EnrichedRecord::from_seed(&seed, status)
    }

    fn registry(names: &[&str]) -> TechnologyRegistry {
        TechnologyRegistry::from_signatures(
            names
                .iter()
                .map(|n| TechnologySignature::new(n, "other", &[n.to_lowercase().as_str()]).unwrap())
                .collect(),
        )
    }

    #[test]
    fn counts_and_ranking() {
        let records = vec![
            record(0, Status::Complete, &[("technologies", "React; Stripe; Fathom"), ("industry", "Marketing")]),
            record(1, Status::Complete, &[("technologies", "Stripe; Plausible; React; React")]),
            record(2, Status::Complete, &[("technologies", "Stripe"), ("industry", "Marketing")]),
            record(3, Status::NotFound, &[("industry", "Retail")]),
        ];
        let summary = summarize(
            &records,
            &registry(&["WordPress", "React", "Stripe"]),
            &SocialRegistry::builtin(),
            3,
        );

        assert_eq!(summary.total_count, 4);
        let counts: Vec<(&str, usize)> = summary
            .technology_counts
            .iter()
            .map(|t| (t.technology.as_str(), t.count))
            .collect();
        assert_eq!(
            counts,
            vec![("React", 2), ("Stripe", 3), ("Fathom", 1), ("Plausible", 1)]
        );

        let top: Vec<&str> = summary
            .top_technologies
            .iter()
            .map(|t| t.technology.as_str())
            .collect();
        // Fathom beats Plausible on the tie: seen first.
        assert_eq!(top, vec!["Stripe", "React", "Fathom"]);

        assert_eq!(summary.status_counts["complete"], 3);
        assert_eq!(summary.status_counts["not_found"], 1);
        assert_eq!(summary.industry_breakdown["Marketing"], 2);
        assert_eq!(summary.industry_breakdown["Retail"], 1);
    }

    #[test]
    fn ties_follow_registry_order() {
        let records = vec![record(0, Status::Complete, &[("technologies", "Stripe; React")])];
        let summary = summarize(
            &records,
            &registry(&["React", "Stripe"]),
            &SocialRegistry::builtin(),
            10,
        );
        assert_eq!(summary.top_technologies[0].technology, "React");
        assert_eq!(summary.top_technologies[1].technology, "Stripe");
    }

    #[test]
    fn platform_presence_lists_every_platform() {
        let records = vec![
            record(0, Status::Complete, &[("linkedin", "https://linkedin.com/company/a")]),
            record(1, Status::Complete, &[("linkedin", "https://linkedin.com/company/b"), ("github", "  ")]),
        ];
        let summary = summarize(&records, &registry(&[]), &SocialRegistry::builtin(), 10);
        assert_eq!(summary.platform_presence.len(), 7);
        assert_eq!(summary.platform_presence[0].platform, "linkedin");
        assert_eq!(summary.platform_presence[0].count, 2);
        assert!(summary.platform_presence[1..].iter().all(|p| p.count == 0));
    }

    #[test]
    fn csv_header_for_zero_records() {
        let csv = to_csv(&[], columns_for(Mode::Catalog)).unwrap();
        assert_eq!(
            csv,
            "Title,Author,Place,Publisher,Year,ISBN,Edition,Physical Description,Subject,Call Number,Language,Detail URL,Status\n"
        );
    }

    #[test]
    fn company_csv_header_for_zero_records() {
        let csv = to_csv(&[], columns_for(Mode::Company)).unwrap();
        assert_eq!(csv.lines().count(), 1);
        let headers: Vec<&str> = csv.trim_end().split(',').collect();
        let expected: Vec<&str> = columns_for(Mode::Company).iter().map(|c| c.header).collect();
        assert_eq!(headers, expected);
        assert_eq!(headers.first(), Some(&"Company Name"));
        assert_eq!(headers.last(), Some(&"Status"));
    }

    #[test]
    fn csv_quotes_every_cell_and_doubles_quotes() {
        let columns = [col("Name", "name"), col("Note", "note"), col("Status", STATUS_FIELD)];
        let records = vec![record(
            0,
            Status::UpdatedFromCache,
            &[("name", "Acme, Inc."), ("note", "the \"best\" agency")],
        )];
        let csv = to_csv(&records, &columns).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "Name,Note,Status");
        assert_eq!(
            lines[1],
            r#""Acme, Inc.","the ""best"" agency","updated_from_cache""#
        );
    }

    #[test]
    fn csv_truncates_meta_description() {
        let long = "é".repeat(150);
        let records = vec![record(0, Status::Complete, &[("meta_description", long.as_str())])];
        let csv = to_csv(&records, columns_for(Mode::Company)).unwrap();
        let row = csv.lines().nth(1).unwrap();
        assert!(row.contains(&format!("\"{}\"", "é".repeat(100))));
        assert!(!row.contains(&"é".repeat(101)));
    }

    #[test]
    fn writes_all_three_files() {
        let dir = std::env::temp_dir().join(format!("intelscout-report-{}", unique_suffix()));
        let records = vec![record(0, Status::Complete, &[("title", "Laskar Pelangi")])];
        let summary = summarize(&records, &registry(&[]), &SocialRegistry::builtin(), 10);

        let paths = write_report(&dir, "enriched_catalog_test", &records, &summary, columns_for(Mode::Catalog))
            .unwrap();

        let csv = std::fs::read_to_string(&paths.csv).unwrap();
        assert!(csv.starts_with("Title,"));
        assert!(csv.contains("\"Laskar Pelangi\""));
        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&paths.records).unwrap()).unwrap();
        assert_eq!(json.as_array().unwrap().len(), 1);
        assert!(paths.summary.ends_with("enriched_catalog_test_tech_summary.json"));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    fn unique_suffix() -> String {
        format!(
            "{}-{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        )
    }
}
