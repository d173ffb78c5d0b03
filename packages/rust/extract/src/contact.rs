//! Best-effort e-mail and phone number extraction from visible text.

use std::sync::LazyLock;

use regex::Regex;

use intelscout_shared::{ExtractedFields, join_list};

/// Maximum e-mail addresses kept per page.
pub const MAX_EMAILS: usize = 5;

/// Maximum phone numbers kept per page.
pub const MAX_PHONES: usize = 3;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}").expect("valid regex")
});

static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\+?\d{1,3}[-.\s]?)?\(?\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{4}").expect("valid regex")
});

/// Contact details found in a page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Contacts {
    pub emails: Vec<String>,
    pub phones: Vec<String>,
}

/// Scan text for contacts; deduplicated in first-seen order and capped.
pub fn extract_contacts(text: &str) -> Contacts {
    Contacts {
        emails: unique_matches(&EMAIL_RE, text, MAX_EMAILS),
        phones: unique_matches(&PHONE_RE, text, MAX_PHONES),
    }
}

pub fn contact_fields(text: &str) -> ExtractedFields {
    let contacts = extract_contacts(text);
    let mut fields = ExtractedFields::new();
    fields.set("emails", join_list(&contacts.emails));
    fields.set("phones", join_list(&contacts.phones));
    fields
}

fn unique_matches(re: &Regex, text: &str, cap: usize) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for m in re.find_iter(text) {
        let value = m.as_str().trim().to_string();
        if !out.contains(&value) {
            out.push(value);
        }
        if out.len() == cap {
            break;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emails_are_deduplicated_and_capped() {
        let text = "a@acme.test b@acme.test a@acme.test c@acme.test d@acme.test e@acme.test f@acme.test";
        let contacts = extract_contacts(text);
        assert_eq!(contacts.emails.len(), MAX_EMAILS);
        assert_eq!(contacts.emails[0], "a@acme.test");
        assert_eq!(contacts.emails[1], "b@acme.test");
        assert!(!contacts.emails.contains(&"f@acme.test".to_string()));
    }

    #[test]
    fn phones_in_common_shapes() {
        let text = "Call (555) 123-4567 or +1 555.987.6543. Fax 555 222 3333. Alt 555-000-1111.";
        let contacts = extract_contacts(text);
        assert_eq!(contacts.phones.len(), MAX_PHONES);
        assert!(contacts.phones[0].contains("123-4567"));
        assert!(contacts.phones[1].contains("987.6543"));
    }

    #[test]
    fn nothing_found_yields_empty_fields() {
        let fields = contact_fields("No contact details here.");
        assert_eq!(fields.get("emails"), "");
        assert_eq!(fields.get("phones"), "");
    }
}
