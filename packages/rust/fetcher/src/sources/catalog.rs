//! Library catalog search: title → search URL → first result's detail link.

use scraper::{Html, Selector};
use url::Url;

use intelscout_shared::{IntelScoutError, Result};

use super::fill_template;

/// Build the catalog search URL for a title query.
pub fn catalog_search_url(template: &str, query: &str) -> Result<Url> {
    if template.trim().is_empty() {
        return Err(IntelScoutError::config("catalog.search_url is not configured"));
    }
    fill_template(template, &[("query", query)])
}

/// Find the detail link of the first search result, if any.
///
/// `Ok(None)` means the search worked but matched nothing.
pub fn first_result_link(html: &str, base: &Url, selector: &str) -> Result<Option<Url>> {
    let sel = Selector::parse(selector).map_err(|e| {
        IntelScoutError::config(format!("invalid catalog result selector '{selector}': {e:?}"))
    })?;
    let doc = Html::parse_document(html);

    let link = doc
        .select(&sel)
        .filter_map(|el| el.value().attr("href"))
        .map(str::trim)
        .filter(|href| !href.is_empty() && !href.starts_with('#') && !href.starts_with("javascript:"))
        .find_map(|href| base.join(href).ok());

    Ok(link)
}
