//! HTML → [`FetchedPage`] conversion shared by every fetcher.

use chrono::Utc;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use intelscout_shared::FetchedPage;

/// Elements whose text never counts as visible.
const INVISIBLE_TAGS: &[&str] = &["script", "style", "noscript", "template", "head"];

/// Build a [`FetchedPage`] from a response body.
pub fn parse_page(url: &Url, status_code: Option<u16>, body: String) -> FetchedPage {
    let doc = Html::parse_document(&body);
    let text = visible_text(&doc);
    let links = extract_links(&doc, url);

    FetchedPage {
        url: url.to_string(),
        status_code,
        html: body,
        text,
        links,
        fetched_at: Utc::now(),
    }
}

/// Elements that start a new line of visible text.
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "body", "dd", "div", "dl", "dt", "fieldset",
    "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "li",
    "main", "nav", "ol", "p", "pre", "section", "table", "td", "th", "tr", "ul",
];

/// Collect the visible body text.
///
/// Runs inside the same block element are joined with a space, so text split
/// across inline tags (`<span>(555)</span> 123-4567`) stays contiguous; each
/// new block starts a new line.
pub fn visible_text(doc: &Html) -> String {
    let body_sel = Selector::parse("body").expect("valid selector");
    let Some(body) = doc.select(&body_sel).next() else {
        return String::new();
    };

    let mut out = String::new();
    let mut last_block = None;
    for node in body.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };

        let mut hidden = false;
        let mut block = None;
        for ancestor in node.ancestors() {
            let Some(el) = ElementRef::wrap(ancestor) else {
                continue;
            };
            let name = el.value().name();
            if INVISIBLE_TAGS.contains(&name) {
                hidden = true;
                break;
            }
            if block.is_none() && BLOCK_TAGS.contains(&name) {
                block = Some(ancestor.id());
            }
        }
        if hidden {
            continue;
        }

        let trimmed = text.trim();
        if trimmed.is_empty() {
            continue;
        }
        if !out.is_empty() {
            out.push(if block == last_block { ' ' } else { '\n' });
        }
        out.push_str(trimmed);
        last_block = block;
    }

    out
}

/// Extract all outbound links from a document, resolved against the base URL.
pub fn extract_links(doc: &Html, base_url: &Url) -> Vec<String> {
    let link_sel = Selector::parse("a[href]").expect("valid selector");
    let mut links = Vec::new();

    for el in doc.select(&link_sel) {
        if let Some(href) = el.value().attr("href") {
            let href = href.trim();
            // Skip anchors and non-navigational schemes
            if href.is_empty()
                || href.starts_with('#')
                || href.starts_with("javascript:")
                || href.starts_with("mailto:")
                || href.starts_with("tel:")
            {
                continue;
            }

            if let Ok(mut resolved) = base_url.join(href) {
                resolved.set_fragment(None);
                links.push(resolved.to_string());
            }
        }
    }

    links
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visible_text_skips_scripts_and_styles() {
        let html = r#"<html><head><title>Acme</title></head><body>
            <h1>Acme Corp</h1>
            <script>var email = "hidden@example.com";</script>
            <style>.x { color: red }</style>
            <p>Contact: sales@acme.test</p>
        </body></html>"#;
        let doc = Html::parse_document(html);
        let text = visible_text(&doc);

        assert!(text.contains("Acme Corp"));
        assert!(text.contains("sales@acme.test"));
        assert!(!text.contains("hidden@example.com"));
        assert!(!text.contains("color: red"));
        assert!(!text.contains("Acme\n"), "head title must not leak into body text");
    }

    #[test]
    fn inline_runs_share_a_line_and_blocks_break() {
        let html = r#"<html><body>
            <p>Call us: <span>(555)</span> 123-4567</p>
            <div>Mon<b>-</b>Fri</div>
        </body></html>"#;
        let doc = Html::parse_document(html);
        let text = visible_text(&doc);

        assert_eq!(text, "Call us: (555) 123-4567\nMon - Fri");
    }

    #[test]
    fn links_are_resolved_and_filtered() {
        let html = r##"<html><body>
            <a href="/about">About</a>
            <a href="https://www.linkedin.com/company/acme">LinkedIn</a>
            <a href="#top">Top</a>
            <a href="mailto:hi@acme.test">Mail</a>
            <a href="tel:+15551234567">Call</a>
            <a href="team.html#lead">Team</a>
        </body></html>"##;
        let doc = Html::parse_document(html);
        let base = Url::parse("https://acme.test/home/").unwrap();
        let links = extract_links(&doc, &base);

        assert_eq!(
            links,
            vec![
                "https://acme.test/about".to_string(),
                "https://www.linkedin.com/company/acme".to_string(),
                "https://acme.test/home/team.html".to_string(),
            ]
        );
    }

    #[test]
    fn parse_page_without_body_is_empty_text() {
        let url = Url::parse("https://acme.test/").unwrap();
        let page = parse_page(&url, Some(200), String::new());
        assert!(page.text.is_empty());
        assert!(page.links.is_empty());
        assert_eq!(page.status_code, Some(200));
    }
}
