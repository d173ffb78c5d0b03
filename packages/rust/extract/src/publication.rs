//! Parser for "Place : Publisher, Year" publication statements.

use std::sync::LazyLock;

use regex::Regex;

use intelscout_shared::ExtractedFields;

static PUBLICATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([^:]+?)\s*:\s*(.+?)\s*,\s*[\[(]?c?(\d{4})[\])]?\s*\.?\s*$")
        .expect("valid regex")
});

static YEAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\[(]?\bc?(\d{4})\b[\])]?").expect("valid regex"));

/// Components of a publication statement. Any part may be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Publication {
    pub place: String,
    pub publisher: String,
    pub year: String,
}

impl Publication {
    pub fn into_fields(self) -> ExtractedFields {
        let mut fields = ExtractedFields::new();
        fields.set("place", self.place);
        fields.set("publisher", self.publisher);
        fields.set("year", self.year);
        fields
    }
}

/// Split a publication statement into place, publisher and year.
///
/// Never fails: unparseable input degrades to partially or fully empty parts.
pub fn parse_publication(input: &str) -> Publication {
    let input = input.trim();
    if input.is_empty() {
        return Publication::default();
    }

    if let Some(caps) = PUBLICATION_RE.captures(input) {
        return Publication {
            place: caps[1].trim().to_string(),
            publisher: caps[2].trim().to_string(),
            year: caps[3].to_string(),
        };
    }

    let (place, rest) = match input.split_once(':') {
        Some((place, rest)) => (clean(place), rest),
        None => (String::new(), input),
    };

    let year = YEAR_RE
        .captures(rest)
        .map(|c| c[1].to_string())
        .unwrap_or_default();
    let publisher = clean(&YEAR_RE.replace(rest, ""));

    Publication {
        place,
        publisher,
        year,
    }
}

fn clean(s: &str) -> String {
    s.trim_matches(|c: char| c.is_whitespace() || matches!(c, ',' | '.' | ';' | ':' | '-'))
        .to_string()
}
