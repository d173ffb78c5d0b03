//! Company directory search: query → result page → company listings.

use chrono::{DateTime, Utc};
use scraper::{ElementRef, Html, Selector};
use tracing::{info, instrument};
use url::Url;

use intelscout_shared::{IntelScoutError, Result};

use super::fill_template;
use crate::Fetcher;

/// Free-text directory search parameters.
#[derive(Debug, Clone, Default)]
pub struct DirectoryQuery {
    pub industry: String,
    pub country: String,
    pub city: String,
}

/// One company card from the directory result page.
#[derive(Debug, Clone, PartialEq)]
pub struct CompanyListing {
    /// 1-based position on the result page.
    pub position: usize,
    pub name: String,
    pub website: String,
    pub description: String,
    pub extracted_at: DateTime<Utc>,
}

impl CompanyListing {
    /// Flatten into an ordered raw row for the seed normalizer.
    pub fn into_row(self, industry: &str) -> Vec<(String, String)> {
        vec![
            ("Company Name".into(), self.name),
            ("Website".into(), self.website),
            ("Description".into(), self.description),
            ("Industry".into(), industry.to_string()),
            ("Extracted At".into(), self.extracted_at.to_rfc3339()),
        ]
    }
}

/// Run a directory search and parse the listed companies.
///
/// Failure here means there is nothing to enrich, so it propagates to the caller.
#[instrument(skip_all, fields(industry = %query.industry, country = %query.country, city = %query.city))]
pub async fn search_directory(
    fetcher: &dyn Fetcher,
    template: &str,
    query: &DirectoryQuery,
) -> Result<Vec<CompanyListing>> {
    if template.trim().is_empty() {
        return Err(IntelScoutError::config(
            "directory.search_url is not configured",
        ));
    }

    let url = fill_template(
        template,
        &[
            ("industry", query.industry.as_str()),
            ("country", query.country.as_str()),
            ("city", query.city.as_str()),
        ],
    )?;

    info!(%url, "searching company directory");
    let page = fetcher.fetch(&url).await?;
    let base = Url::parse(&page.url).unwrap_or(url);
    let listings = parse_company_cards(&page.html, &base);

    info!(companies = listings.len(), "directory search completed");
    Ok(listings)
}

/// Parse `.company-card` entries; cards without a name or website are dropped.
pub fn parse_company_cards(html: &str, base: &Url) -> Vec<CompanyListing> {
    let doc = Html::parse_document(html);
    let card_sel = Selector::parse(".company-card").expect("valid selector");
    let name_sel = Selector::parse("h3.company-name").expect("valid selector");
    let link_sel = Selector::parse("a.company-website-link").expect("valid selector");
    let desc_sel = Selector::parse("p.company-description").expect("valid selector");

    let now = Utc::now();

    doc.select(&card_sel)
        .enumerate()
        .filter_map(|(i, card)| {
            let name = first_text(&card, &name_sel)?;
            let website = card
                .select(&link_sel)
                .next()
                .and_then(|a| a.value().attr("href"))
                .and_then(|href| base.join(href.trim()).ok())?
                .to_string();
            let description = first_text(&card, &desc_sel).unwrap_or_default();

            Some(CompanyListing {
                position: i + 1,
                name,
                website,
                description,
                extracted_at: now,
            })
        })
        .collect()
}

fn first_text(el: &ElementRef<'_>, sel: &Selector) -> Option<String> {
    el.select(sel)
        .next()
        .map(|n| n.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}
