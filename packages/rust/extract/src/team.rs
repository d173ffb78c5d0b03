//! Team member names on "about" and "team" pages.

use std::sync::LazyLock;

use regex::Regex;

/// Maximum names kept per page.
pub const MAX_TEAM_MEMBERS: usize = 5;

/// How much leading page text is scanned.
const SCAN_CHARS: usize = 500;

static TEAM_MEMBER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b([A-Z][a-z]+\s+[A-Z][a-z]+)\s+(?:CEO|CTO|COO|Founder|Director|Manager|Lead)")
        .expect("valid regex")
});

/// Whether a sub-page path is one where team members are listed.
pub fn is_team_page(path: &str) -> bool {
    let path = path.to_lowercase();
    path.contains("team") || path.contains("about")
}

/// "Firstname Lastname" immediately followed by a role keyword.
pub fn extract_team_members(text: &str) -> Vec<String> {
    let head: String = text.chars().take(SCAN_CHARS).collect();
    let mut names: Vec<String> = Vec::new();
    for caps in TEAM_MEMBER_RE.captures_iter(&head) {
        let name = caps[1].split_whitespace().collect::<Vec<_>>().join(" ");
        if !names.contains(&name) {
            names.push(name);
        }
        if names.len() == MAX_TEAM_MEMBERS {
            break;
        }
    }
    names
}
