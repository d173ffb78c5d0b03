//! Page metadata and SEO presence flags.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};

use intelscout_shared::ExtractedFields;

static GOOGLE_ANALYTICS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"google-analytics|gtag|ga\(").expect("valid regex"));

static FACEBOOK_PIXEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"facebook\.com/tr|fbq\(").expect("valid regex"));

static STRUCTURED_DATA_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""@type"|"@context"|application/ld\+json|itemscope|itemtype="https?://schema\.org"#)
        .expect("valid regex")
});

/// Title, meta tags, document language and tracking flags.
pub fn metadata_fields(doc: &Html, source: &str) -> ExtractedFields {
    let mut fields = ExtractedFields::new();

    fields.set("title", title(doc));
    fields.set("meta_description", meta_content(doc, "description"));
    fields.set("meta_keywords", meta_content(doc, "keywords"));
    fields.set("language", language(doc));

    fields.set("has_google_analytics", yes_no(GOOGLE_ANALYTICS_RE.is_match(source)));
    fields.set("has_facebook_pixel", yes_no(FACEBOOK_PIXEL_RE.is_match(source)));
    fields.set("has_structured_data", yes_no(STRUCTURED_DATA_RE.is_match(source)));

    fields
}

fn title(doc: &Html) -> String {
    let sel = Selector::parse("title").expect("valid selector");
    doc.select(&sel)
        .next()
        .map(|t| t.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}

fn meta_content(doc: &Html, name: &str) -> String {
    let sel = Selector::parse("meta[name]").expect("valid selector");
    doc.select(&sel)
        .find(|m| {
            m.value()
                .attr("name")
                .is_some_and(|n| n.eq_ignore_ascii_case(name))
        })
        .and_then(|m| m.value().attr("content"))
        .map(|c| c.trim().to_string())
        .unwrap_or_default()
}

fn language(doc: &Html) -> String {
    let sel = Selector::parse("html").expect("valid selector");
    doc.select(&sel)
        .next()
        .and_then(|h| h.value().attr("lang"))
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .unwrap_or("unknown")
        .to_string()
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "Yes" } else { "No" }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_metadata_and_flags() {
        let source = r#"<html lang="en"><head>
            <title> Acme | Growth Marketing </title>
            <meta name="Description" content="We grow brands.">
            <meta name="keywords" content="marketing, seo">
            <script type="application/ld+json">{"@type":"Organization"}</script>
            <script>gtag('config', 'G-1');</script>
        </head><body></body></html>"#;
        let doc = Html::parse_document(source);
        let fields = metadata_fields(&doc, source);

        assert_eq!(fields.get("title"), "Acme | Growth Marketing");
        assert_eq!(fields.get("meta_description"), "We grow brands.");
        assert_eq!(fields.get("meta_keywords"), "marketing, seo");
        assert_eq!(fields.get("language"), "en");
        assert_eq!(fields.get("has_google_analytics"), "Yes");
        assert_eq!(fields.get("has_facebook_pixel"), "No");
        assert_eq!(fields.get("has_structured_data"), "Yes");
    }

    #[test]
    fn absent_metadata_uses_defaults() {
        let source = "<html><body><p>bare</p></body></html>";
        let doc = Html::parse_document(source);
        let fields = metadata_fields(&doc, source);

        assert_eq!(fields.get("title"), "");
        assert_eq!(fields.get("meta_description"), "");
        assert_eq!(fields.get("language"), "unknown");
        assert_eq!(fields.get("has_google_analytics"), "No");
    }

    #[test]
    fn inline_json_ld_without_script_type_counts_as_structured_data() {
        let source = r#"<html><body>
            <script>window.__SCHEMA__ = {"@context": "https://schema.org", "name": "Acme"};</script>
        </body></html>"#;
        let doc = Html::parse_document(source);
        let fields = metadata_fields(&doc, source);
        assert_eq!(fields.get("has_structured_data"), "Yes");

        let plain = "<html><body><p>@type and @context in prose</p></body></html>";
        let doc = Html::parse_document(plain);
        assert_eq!(metadata_fields(&doc, plain).get("has_structured_data"), "No");
    }
}
