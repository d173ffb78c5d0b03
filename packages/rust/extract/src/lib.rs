//! Fact extraction from fetched pages.
//!
//! This crate provides:
//! - [`FactExtractor`]: company-mode extraction built from independent [`SubExtractor`]s
//! - [`CatalogExtractor`]: catalog-mode label lookup plus publication parsing
//! - [`signatures`]: immutable technology and social-platform registries
//!
//! Sub-extractors are fault-isolated: one failing never discards the output
//! of the others, it only marks the result as partial.

pub mod contact;
pub mod metadata;
pub mod publication;
pub mod signatures;
pub mod social;
pub mod table;
pub mod team;
pub mod technology;

use std::collections::BTreeMap;
use std::sync::Arc;

use scraper::Html;
use tracing::{debug, warn};

use intelscout_shared::{ExtractedFields, FetchedPage, IntelScoutError, Result};

pub use publication::{Publication, parse_publication};
pub use signatures::{
    CATEGORIES, SocialPlatform, SocialRegistry, TechnologyRegistry, TechnologySignature,
};
pub use table::KeyValueTable;
pub use team::{extract_team_members, is_team_page};
pub use technology::{TECHNOLOGIES_FIELD, category_field, detect_technologies};

/// A fetched page with its parsed document, valid for one extraction pass.
pub struct PageView<'a> {
    pub page: &'a FetchedPage,
    pub doc: Html,
}

impl<'a> PageView<'a> {
    pub fn new(page: &'a FetchedPage) -> Self {
        Self {
            page,
            doc: Html::parse_document(&page.html),
        }
    }
}

/// One independent extraction rule over a page.
pub trait SubExtractor: Send + Sync {
    fn name(&self) -> &str;

    fn extract(&self, view: &PageView<'_>) -> Result<ExtractedFields>;
}

// ---------------------------------------------------------------------------
// Company sub-extractors
// ---------------------------------------------------------------------------

pub struct TechnologyExtractor {
    registry: Arc<TechnologyRegistry>,
}

impl TechnologyExtractor {
    pub fn new(registry: Arc<TechnologyRegistry>) -> Self {
        Self { registry }
    }
}

impl SubExtractor for TechnologyExtractor {
    fn name(&self) -> &str {
        "technologies"
    }

    fn extract(&self, view: &PageView<'_>) -> Result<ExtractedFields> {
        if view.page.html.trim().is_empty() {
            return Err(IntelScoutError::parse("page source is empty"));
        }
        Ok(technology::technology_fields(&self.registry, &view.page.html))
    }
}

pub struct SocialExtractor {
    registry: Arc<SocialRegistry>,
}

impl SocialExtractor {
    pub fn new(registry: Arc<SocialRegistry>) -> Self {
        Self { registry }
    }
}

impl SubExtractor for SocialExtractor {
    fn name(&self) -> &str {
        "social"
    }

    fn extract(&self, view: &PageView<'_>) -> Result<ExtractedFields> {
        Ok(social::social_fields(&self.registry, &view.page.links))
    }
}

pub struct ContactExtractor;

impl SubExtractor for ContactExtractor {
    fn name(&self) -> &str {
        "contacts"
    }

    fn extract(&self, view: &PageView<'_>) -> Result<ExtractedFields> {
        Ok(contact::contact_fields(&view.page.text))
    }
}

pub struct MetadataExtractor;

impl SubExtractor for MetadataExtractor {
    fn name(&self) -> &str {
        "metadata"
    }

    fn extract(&self, view: &PageView<'_>) -> Result<ExtractedFields> {
        Ok(metadata::metadata_fields(&view.doc, &view.page.html))
    }
}

// ---------------------------------------------------------------------------
// FactExtractor
// ---------------------------------------------------------------------------

/// Runs every registered sub-extractor over a page and merges their fields.
pub struct FactExtractor {
    extractors: Vec<Box<dyn SubExtractor>>,
}

impl FactExtractor {
    /// The company-profile extractor: technologies, social links, contacts, metadata.
    pub fn company(technologies: Arc<TechnologyRegistry>, social: Arc<SocialRegistry>) -> Self {
        Self::with_extractors(vec![
            Box::new(TechnologyExtractor::new(technologies)),
            Box::new(SocialExtractor::new(social)),
            Box::new(ContactExtractor),
            Box::new(MetadataExtractor),
        ])
    }

    pub fn with_extractors(extractors: Vec<Box<dyn SubExtractor>>) -> Self {
        Self { extractors }
    }

    /// Extract all facts from a page. Sub-extractor failures become issues.
    pub fn extract(&self, page: &FetchedPage) -> ExtractedFields {
        let view = PageView::new(page);
        let mut out = ExtractedFields::new();

        for extractor in &self.extractors {
            match extractor.extract(&view) {
                Ok(fields) => out.absorb(fields),
                Err(e) => {
                    warn!(url = %page.url, extractor = extractor.name(), error = %e, "sub-extractor failed");
                    out.issues.push(format!("{}: {e}", extractor.name()));
                }
            }
        }

        debug!(url = %page.url, fields = out.values.len(), issues = out.issues.len(), "page extracted");
        out
    }
}

// ---------------------------------------------------------------------------
// CatalogExtractor
// ---------------------------------------------------------------------------

/// Field whose value is split into place, publisher and year.
const PUBLICATION_FIELD: &str = "publication";

/// Reads labelled rows from a catalog detail page.
pub struct CatalogExtractor {
    labels: BTreeMap<String, Vec<String>>,
}

impl CatalogExtractor {
    /// `labels` maps canonical field name → row labels to try, in order.
    pub fn new(labels: BTreeMap<String, Vec<String>>) -> Self {
        Self { labels }
    }

    pub fn extract(&self, page: &FetchedPage) -> ExtractedFields {
        let doc = Html::parse_document(&page.html);
        let table = KeyValueTable::from_document(&doc);
        let mut out = ExtractedFields::new();

        if table.is_empty() {
            out.issues
                .push("table: no label/value rows on detail page".to_string());
        }

        for (field, labels) in &self.labels {
            out.set(field.clone(), table.lookup_any(labels));
        }

        let publication = parse_publication(out.get(PUBLICATION_FIELD));
        out.absorb(publication.into_fields());
        out.set("detail_url", page.url.clone());

        debug!(url = %page.url, rows = table.len(), "catalog detail extracted");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn page(html: &str, text: &str, links: &[&str]) -> FetchedPage {
        FetchedPage {
            url: "https://acme.test/".into(),
            status_code: Some(200),
            html: html.into(),
            text: text.into(),
            links: links.iter().map(|s| s.to_string()).collect(),
            fetched_at: Utc::now(),
        }
    }

    fn company_extractor() -> FactExtractor {
        FactExtractor::company(
            Arc::new(TechnologyRegistry::builtin()),
            Arc::new(SocialRegistry::builtin()),
        )
    }

    #[test]
    fn company_extraction_combines_all_rules() {
        let html = r#"<html lang="en"><head><title>Acme</title>
            <script src="https://js.stripe.com/v3"></script></head>
            <body>Contact hello@acme.test</body></html>"#;
        let fields = company_extractor().extract(&page(
            html,
            "Contact hello@acme.test or (555) 123-4567",
            &["https://www.linkedin.com/company/acme"],
        ));

        assert!(!fields.is_partial());
        assert_eq!(fields.get("technologies"), "Stripe");
        assert_eq!(fields.get("linkedin"), "https://www.linkedin.com/company/acme");
        assert_eq!(fields.get("emails"), "hello@acme.test");
        assert_eq!(fields.get("phones"), "(555) 123-4567");
        assert_eq!(fields.get("title"), "Acme");
        assert_eq!(fields.get("language"), "en");
    }

    struct Failing;

    impl SubExtractor for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        fn extract(&self, _view: &PageView<'_>) -> Result<ExtractedFields> {
            Err(IntelScoutError::parse("boom"))
        }
    }

    #[test]
    fn failing_sub_extractor_marks_partial_and_keeps_others() {
        let extractor =
            FactExtractor::with_extractors(vec![Box::new(Failing), Box::new(ContactExtractor)]);
        let fields = extractor.extract(&page("<p>x</p>", "mail: a@b.test", &[]));

        assert!(fields.is_partial());
        assert_eq!(fields.issues, vec!["failing: parse error: boom".to_string()]);
        assert_eq!(fields.get("emails"), "a@b.test");
    }

    #[test]
    fn empty_source_fails_only_technology_rule() {
        let fields = company_extractor().extract(&page("", "", &["https://github.com/acme"]));
        assert!(fields.is_partial());
        assert!(fields.issues[0].starts_with("technologies:"));
        assert_eq!(fields.get("github"), "https://github.com/acme");
    }

    fn catalog_labels() -> BTreeMap<String, Vec<String>> {
        BTreeMap::from([
            ("author".to_string(), vec!["Pengarang".to_string(), "Author".to_string()]),
            ("publication".to_string(), vec!["Penerbitan".to_string()]),
            ("isbn".to_string(), vec!["ISBN".to_string()]),
        ])
    }

    #[test]
    fn catalog_detail_fields() {
        let html = r#"<table>
            <tr><td>Pengarang</td><td>Andrea Hirata</td></tr>
            <tr><td>Penerbitan</td><td>Yogyakarta : Bentang Pustaka, 2005</td></tr>
        </table>"#;
        let fields = CatalogExtractor::new(catalog_labels()).extract(&page(html, "", &[]));

        assert!(!fields.is_partial());
        assert_eq!(fields.get("author"), "Andrea Hirata");
        assert_eq!(fields.get("place"), "Yogyakarta");
        assert_eq!(fields.get("publisher"), "Bentang Pustaka");
        assert_eq!(fields.get("year"), "2005");
        assert_eq!(fields.get("isbn"), "");
        assert_eq!(fields.get("detail_url"), "https://acme.test/");
    }

    #[test]
    fn catalog_page_without_rows_is_partial() {
        let fields =
            CatalogExtractor::new(catalog_labels()).extract(&page("<p>Not a record</p>", "", &[]));
        assert!(fields.is_partial());
        assert_eq!(fields.get("author"), "");
        assert!(fields.values.contains_key("publisher"));
    }
}
