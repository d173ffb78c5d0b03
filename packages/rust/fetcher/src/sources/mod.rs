//! Page sources that locate seeds or detail resources before extraction.
//!
//! Each source knows the markup of one remote site family: the company
//! directory's result cards, or a library catalog's search result list.

mod catalog;
mod directory;

use url::Url;

use intelscout_shared::{IntelScoutError, Result};

pub use catalog::{catalog_search_url, first_result_link};
pub use directory::{CompanyListing, DirectoryQuery, parse_company_cards, search_directory};

/// Substitute `{name}` placeholders with URL-encoded values and parse the result.
pub(crate) fn fill_template(template: &str, values: &[(&str, &str)]) -> Result<Url> {
    let mut filled = template.trim().to_string();
    for (name, value) in values {
        let encoded: String = url::form_urlencoded::byte_serialize(value.trim().as_bytes()).collect();
        filled = filled.replace(&format!("{{{name}}}"), &encoded);
    }
    Url::parse(&filled)
        .map_err(|e| IntelScoutError::config(format!("invalid URL template '{template}': {e}")))
}
