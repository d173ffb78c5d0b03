//! Raw input rows → canonical [`SeedEntity`] records.
//!
//! Rows arrive with free-form, case-varying column names ("Judul Buku",
//! "Company Name", "WEBSITE"). Column names are resolved here, once, into a
//! fixed per-mode schema so nothing downstream guesses at names again.

use tracing::debug;

use intelscout_shared::{Fields, Mode, SeedEntity};

/// One input row: ordered (column name, value) pairs.
pub type RawRow = Vec<(String, String)>;

/// Canonical name → aliases, matched as case-insensitive substrings of the column name.
type AliasTable = &'static [(&'static str, &'static [&'static str])];

const CATALOG_ALIASES: AliasTable = &[
    ("title", &["title", "judul"]),
    ("author", &["author", "pengarang", "penulis"]),
    ("publisher", &["publisher", "penerbit"]),
    ("place", &["place", "tempat", "kota"]),
    ("year", &["year", "tahun"]),
    ("isbn", &["isbn"]),
];

const COMPANY_ALIASES: AliasTable = &[
    ("website", &["website", "url", "domain"]),
    ("name", &["company name", "company", "name", "nama"]),
    ("description", &["description", "deskripsi"]),
    ("industry", &["industry", "industri", "sector"]),
];

/// Resolves raw rows into seeds for one [`Mode`].
#[derive(Debug, Clone)]
pub struct Normalizer {
    mode: Mode,
    identity_markers: &'static [&'static str],
    locator_markers: &'static [&'static str],
    display_field: &'static str,
    aliases: AliasTable,
}

impl Normalizer {
    pub fn for_mode(mode: Mode) -> Self {
        match mode {
            Mode::Catalog => Self {
                mode,
                identity_markers: &["title", "judul"],
                locator_markers: &[],
                display_field: "title",
                aliases: CATALOG_ALIASES,
            },
            Mode::Company => Self {
                mode,
                identity_markers: &["website", "url", "domain"],
                locator_markers: &["website", "url", "domain"],
                display_field: "name",
                aliases: COMPANY_ALIASES,
            },
        }
    }

    /// One seed per row, in input order. Rows without a usable key are kept.
    pub fn normalize(&self, rows: &[RawRow]) -> Vec<SeedEntity> {
        let seeds: Vec<SeedEntity> = rows
            .iter()
            .enumerate()
            .map(|(index, row)| self.normalize_row(index, row))
            .collect();

        let unusable = seeds.iter().filter(|s| !s.has_usable_key()).count();
        debug!(mode = self.mode.as_str(), rows = seeds.len(), unusable, "rows normalized");
        seeds
    }

    pub fn normalize_row(&self, index: usize, row: &RawRow) -> SeedEntity {
        let identity = find_marked(row, self.identity_markers);

        // A present-but-blank identity column means no key, not a fallback.
        let identity_value = match identity {
            Some(value) => value.trim().to_string(),
            None => row
                .iter()
                .map(|(_, v)| v.trim())
                .find(|v| !v.is_empty())
                .unwrap_or("")
                .to_string(),
        };

        let raw_fields = self.canonical_fields(row);

        let display_name = raw_fields
            .get(self.display_field)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .unwrap_or(&identity_value)
            .to_string();

        let locator = find_marked(row, self.locator_markers)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| display_name.clone());

        SeedEntity {
            index,
            key: identity_value.to_lowercase(),
            display_name,
            locator,
            raw_fields,
        }
    }

    /// Map every column to its canonical name; the first non-blank value wins.
    fn canonical_fields(&self, row: &RawRow) -> Fields {
        let mut fields = Fields::new();
        for (position, (column, value)) in row.iter().enumerate() {
            let name = self
                .canonical_name(column)
                .map(str::to_string)
                .unwrap_or_else(|| snake_case(column, position));
            let value = value.trim().to_string();
            match fields.get(&name) {
                Some(existing) if !existing.is_empty() => {}
                _ => {
                    fields.insert(name, value);
                }
            }
        }
        fields
    }

    fn canonical_name(&self, column: &str) -> Option<&'static str> {
        let column = column.trim().to_lowercase();
        self.aliases
            .iter()
            .find(|(_, aliases)| aliases.iter().any(|a| column.contains(a)))
            .map(|(name, _)| *name)
    }
}

/// Value of the first column whose name contains any marker.
fn find_marked<'r>(row: &'r RawRow, markers: &[&str]) -> Option<&'r str> {
    row.iter()
        .find(|(column, _)| {
            let column = column.to_lowercase();
            markers.iter().any(|m| column.contains(m))
        })
        .map(|(_, value)| value.as_str())
}

fn snake_case(column: &str, position: usize) -> String {
    let mut out = String::with_capacity(column.len());
    for c in column.trim().chars() {
        if c.is_alphanumeric() {
            out.extend(c.to_lowercase());
        } else if !out.ends_with('_') {
            out.push('_');
        }
    }
    let out = out.trim_matches('_').to_string();
    if out.is_empty() {
        format!("column_{position}")
    } else {
        out
    }
}
