//! Social profile detection over outbound links.

use intelscout_shared::ExtractedFields;

use crate::signatures::SocialRegistry;

/// First matching link per platform, in registry order.
///
/// Later links for an already-resolved platform are ignored.
pub fn detect_social<'r>(registry: &'r SocialRegistry, links: &[String]) -> Vec<(&'r str, String)> {
    let mut found: Vec<(&str, String)> = Vec::new();

    for link in links {
        let lowered = link.to_lowercase();
        for platform in registry.iter() {
            if found.iter().any(|(name, _)| *name == platform.name) {
                continue;
            }
            if platform.matches(&lowered) {
                found.push((platform.name.as_str(), link.clone()));
            }
        }
    }

    found.sort_by_key(|(name, _)| registry.iter().position(|p| p.name == *name));
    found
}

/// One field per platform; platforms without a profile link get "".
pub fn social_fields(registry: &SocialRegistry, links: &[String]) -> ExtractedFields {
    let detected = detect_social(registry, links);
    let mut fields = ExtractedFields::new();
    for platform in registry.iter() {
        let link = detected
            .iter()
            .find(|(name, _)| *name == platform.name)
            .map(|(_, l)| l.clone())
            .unwrap_or_default();
        fields.set(platform.name.clone(), link);
    }
    fields
}
