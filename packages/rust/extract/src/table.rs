//! Label/value lookup over a detail page's key/value rows.
//!
//! Catalog detail pages lay out bibliographic data as a two-column table
//! (`<tr><th>Pengarang</th><td>...</td></tr>`) or as a definition list. Row
//! order is preserved so the first matching label wins.

use scraper::{ElementRef, Html, Selector};

/// Ordered key/value rows read from a document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeyValueTable {
    rows: Vec<(String, String)>,
}

impl KeyValueTable {
    /// Read `tr` rows; falls back to `dt`/`dd` pairs when no table rows exist.
    pub fn from_document(doc: &Html) -> Self {
        let rows = table_rows(doc);
        if !rows.is_empty() {
            return Self { rows };
        }
        Self {
            rows: definition_rows(doc),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Value of the first row whose label contains `label`, ignoring case.
    ///
    /// Returns "" for a missing row or an empty `label`.
    pub fn lookup(&self, label: &str) -> &str {
        let needle = label.trim().to_lowercase();
        if needle.is_empty() {
            return "";
        }
        self.rows
            .iter()
            .find(|(l, _)| l.to_lowercase().contains(&needle))
            .map(|(_, v)| v.as_str())
            .unwrap_or("")
    }

    /// First non-empty lookup over a list of alternative labels.
    pub fn lookup_any(&self, labels: &[String]) -> &str {
        labels
            .iter()
            .map(|l| self.lookup(l))
            .find(|v| !v.is_empty())
            .unwrap_or("")
    }
}

fn table_rows(doc: &Html) -> Vec<(String, String)> {
    let row_sel = Selector::parse("tr").expect("valid selector");
    let cell_sel = Selector::parse("th, td").expect("valid selector");

    doc.select(&row_sel)
        .filter_map(|row| {
            let cells: Vec<String> = row.select(&cell_sel).map(cell_text).collect();
            let (label, rest) = cells.split_first()?;
            let label = label.trim_end_matches(':').trim().to_string();
            if label.is_empty() {
                return None;
            }
            let value = rest
                .iter()
                .map(String::as_str)
                .filter(|c| !c.is_empty() && *c != ":")
                .collect::<Vec<_>>()
                .join(" ");
            Some((label, value))
        })
        .collect()
}

fn definition_rows(doc: &Html) -> Vec<(String, String)> {
    let dt_sel = Selector::parse("dt").expect("valid selector");
    doc.select(&dt_sel)
        .filter_map(|dt| {
            let label = cell_text(dt).trim_end_matches(':').trim().to_string();
            let dd = dt
                .next_siblings()
                .filter_map(ElementRef::wrap)
                .find(|el| el.value().name() == "dd" || el.value().name() == "dt")
                .filter(|el| el.value().name() == "dd")?;
            (!label.is_empty()).then(|| (label, cell_text(dd)))
        })
        .collect()
}

fn cell_text(el: ElementRef<'_>) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const DETAIL: &str = r#"<html><body><table>
        <tr><th>Judul</th><td>Laskar Pelangi</td></tr>
        <tr><th>Pengarang</th><td>:</td><td>Andrea  Hirata</td></tr>
        <tr><th>Penerbitan:</th><td>Yogyakarta : Bentang Pustaka, 2005</td></tr>
        <tr><th>ISBN</th><td>979-3062-79-7</td></tr>
        <tr><th>ISBN Lain</th><td>978-0000000000</td></tr>
    </table></body></html>"#;

    fn table() -> KeyValueTable {
        KeyValueTable::from_document(&Html::parse_document(DETAIL))
    }

    #[test]
    fn lookup_is_case_insensitive_substring() {
        let t = table();
        assert_eq!(t.lookup("pengarang"), "Andrea Hirata");
        assert_eq!(t.lookup("TERBIT"), "Yogyakarta : Bentang Pustaka, 2005");
    }

    #[test]
    fn first_matching_row_wins() {
        assert_eq!(table().lookup("ISBN"), "979-3062-79-7");
    }

    #[test]
    fn missing_or_empty_label_is_empty() {
        let t = table();
        assert_eq!(t.lookup("Edisi"), "");
        assert_eq!(t.lookup(""), "");
        assert_eq!(t.lookup("   "), "");
    }

    #[test]
    fn alternative_labels() {
        let labels = vec!["Author".to_string(), "Pengarang".to_string()];
        assert_eq!(table().lookup_any(&labels), "Andrea Hirata");
    }

    #[test]
    fn definition_list_fallback() {
        let html = r#"<dl>
            <dt>Author</dt><dd>Pramoedya Ananta Toer</dd>
            <dt>Orphan</dt>
            <dt>Publication</dt><dd>Jakarta : Hasta Mitra, 1980</dd>
        </dl>"#;
        let t = KeyValueTable::from_document(&Html::parse_document(html));
        assert_eq!(t.len(), 2);
        assert_eq!(t.lookup("author"), "Pramoedya Ananta Toer");
        assert_eq!(t.lookup("orphan"), "");
        assert_eq!(t.lookup("publication"), "Jakarta : Hasta Mitra, 1980");
    }

    #[test]
    fn no_rows_is_empty() {
        let t = KeyValueTable::from_document(&Html::parse_document("<p>nothing</p>"));
        assert!(t.is_empty());
    }
}
