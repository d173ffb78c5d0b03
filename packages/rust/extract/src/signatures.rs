//! Technology and social-platform signature registries.
//!
//! Registries are built once per run and handed to the extractor; they are
//! never mutated afterwards. Registry order is the output order of every
//! detection result and the tie-break order of every ranking.

use regex::{Regex, RegexBuilder};

use intelscout_shared::{IntelScoutError, Result, TechnologySpec};

/// Category buckets, in export order.
pub const CATEGORIES: &[&str] = &[
    "cms",
    "analytics",
    "marketing",
    "ecommerce",
    "frontend",
    "payment",
    "hosting",
    "other",
];

// ---------------------------------------------------------------------------
// Technologies
// ---------------------------------------------------------------------------

/// A named technology and the markers that reveal it in page source.
#[derive(Debug, Clone)]
pub struct TechnologySignature {
    pub name: String,
    pub category: String,
    patterns: Vec<Regex>,
}

impl TechnologySignature {
    /// Compile a signature; patterns match case-insensitively.
    pub fn new(name: &str, category: &str, patterns: &[&str]) -> Result<Self> {
        let patterns = patterns
            .iter()
            .map(|p| compile(p).map_err(|e| {
                IntelScoutError::config(format!("invalid pattern for technology '{name}': {e}"))
            }))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            name: name.to_string(),
            category: category.trim().to_lowercase(),
            patterns,
        })
    }

    /// Whether any marker occurs anywhere in `source`.
    pub fn matches(&self, source: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(source))
    }
}

/// Built-in fingerprints: (name, category, patterns).
const BUILTIN_TECHNOLOGIES: &[(&str, &str, &[&str])] = &[
    // CMS & e-commerce
    ("WordPress", "cms", &[r"wp-content", r"wp-includes", r"wordpress", r#""wp-"#]),
    ("Shopify", "ecommerce", &[r"shopify", r"cdn\.shopify\.com", r"myshopify\.com"]),
    ("WooCommerce", "ecommerce", &[r"woocommerce", r"wc-"]),
    ("Magento", "ecommerce", &[r"magento", r"mage/"]),
    ("Drupal", "cms", &[r"drupal", r"sites/all"]),
    // JavaScript frameworks
    ("React", "frontend", &[r#""react""#, r"react\.js", r"__REACT_DEVTOOLS_GLOBAL_HOOK__", r"data-reactroot"]),
    ("Vue.js", "frontend", &[r#""vue""#, r"vue\.js", r"data-v-", r"__VUE__"]),
    ("Angular", "frontend", &[r#""angular""#, r"angular\.js", r"ng-", r"_ngcontent"]),
    ("Next.js", "frontend", &[r#""next""#, r"next\.js", r"__NEXT_DATA__", r"_next/"]),
    // Analytics & tracking
    ("Google Analytics", "analytics", &[r"google-analytics", r"gtag\(", r"ga\('", r"googletagmanager"]),
    ("Facebook Pixel", "analytics", &[r"facebook\.com/tr", r"fbq\(", r"facebook\.net"]),
    ("Hotjar", "analytics", &[r"hotjar", r"hj\(", r"static\.hotjar\.com"]),
    ("Mixpanel", "analytics", &[r"mixpanel", r"cdn\.mxpnl\.com"]),
    // Marketing & CRM
    ("HubSpot", "marketing", &[r"hubspot", r"#hubspot-messages-iframe-container", r"hs-scripts", r"hubspot\.com"]),
    ("Salesforce", "marketing", &[r"salesforce", r"force\.com", r"sfdcstatic"]),
    ("Mailchimp", "marketing", &[r"mailchimp", r"mc\.us", r"chimpstatic"]),
    ("Intercom", "marketing", &[r"intercom", r"intercomcdn", r"widget\.intercom\.io"]),
    ("Zendesk", "marketing", &[r"zendesk", r"zdassets", r"zdchat"]),
    ("Drift", "marketing", &[r"drift", r"driftt", r"js\.driftt\.com"]),
    // Payments
    ("Stripe", "payment", &[r"stripe", r"js\.stripe\.com"]),
    ("PayPal", "payment", &[r"paypal", r"paypalobjects"]),
    ("Square", "payment", &[r"squareup", r"square\.com", r#""square""#]),
    // CDN & hosting
    ("Cloudflare", "hosting", &[r"cloudflare", r"cf-ray", r"cdnjs\.cloudflare\.com"]),
    ("AWS", "hosting", &[r"amazonaws\.com", r"aws", r"cloudfront"]),
    ("Vercel", "hosting", &[r"vercel", r"now\.sh", r"_vercel"]),
    // Front-end tooling
    ("jQuery", "frontend", &[r"jquery", r"\$\(", r"jquery\.js"]),
    ("Bootstrap", "frontend", &[r"bootstrap", r"btn-", r"col-"]),
    ("Font Awesome", "frontend", &[r"font-awesome", r"fa-", r"fontawesome"]),
];

/// Ordered, immutable set of technology signatures.
#[derive(Debug, Clone)]
pub struct TechnologyRegistry {
    signatures: Vec<TechnologySignature>,
}

impl TechnologyRegistry {
    /// Registry with the built-in fingerprints only.
    pub fn builtin() -> Self {
        let signatures = BUILTIN_TECHNOLOGIES
            .iter()
            .map(|(name, category, patterns)| {
                TechnologySignature::new(name, category, patterns)
                    .expect("built-in technology patterns are valid")
            })
            .collect();
        Self { signatures }
    }

    /// Built-in fingerprints followed by configured extras.
    pub fn with_extra(extra: &[TechnologySpec]) -> Result<Self> {
        let mut registry = Self::builtin();
        for spec in extra {
            let patterns: Vec<&str> = spec.patterns.iter().map(String::as_str).collect();
            if patterns.is_empty() {
                return Err(IntelScoutError::config(format!(
                    "technology '{}' has no patterns",
                    spec.name
                )));
            }
            registry
                .signatures
                .push(TechnologySignature::new(&spec.name, &spec.category, &patterns)?);
        }
        Ok(registry)
    }

    /// Build a registry from explicit signatures (registry order = slice order).
    pub fn from_signatures(signatures: Vec<TechnologySignature>) -> Self {
        Self { signatures }
    }

    pub fn iter(&self) -> impl Iterator<Item = &TechnologySignature> {
        self.signatures.iter()
    }

    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }

    /// Registry position of a technology name, for tie-breaking.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.signatures.iter().position(|s| s.name == name)
    }

    /// Known categories followed by any extra categories used in this registry.
    pub fn categories(&self) -> Vec<String> {
        let mut categories: Vec<String> = CATEGORIES.iter().map(|c| c.to_string()).collect();
        for sig in &self.signatures {
            if !categories.contains(&sig.category) {
                categories.push(sig.category.clone());
            }
        }
        categories
    }
}

impl Default for TechnologyRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

// ---------------------------------------------------------------------------
// Social platforms
// ---------------------------------------------------------------------------

/// A social platform and the link shapes that identify a profile on it.
#[derive(Debug, Clone)]
pub struct SocialPlatform {
    pub name: String,
    patterns: Vec<Regex>,
}

impl SocialPlatform {
    pub fn new(name: &str, patterns: &[&str]) -> Result<Self> {
        let patterns = patterns
            .iter()
            .map(|p| compile(p).map_err(|e| {
                IntelScoutError::config(format!("invalid pattern for platform '{name}': {e}"))
            }))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            name: name.to_string(),
            patterns,
        })
    }

    pub fn matches(&self, link: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(link))
    }
}

const BUILTIN_PLATFORMS: &[(&str, &[&str])] = &[
    ("linkedin", &[r"linkedin\.com/company/", r"linkedin\.com/in/", r"linkedin\.com/school/"]),
    ("twitter", &[r"twitter\.com/", r"(?:^|[/.])x\.com/"]),
    ("facebook", &[r"facebook\.com/", r"(?:^|[/.])fb\.com/"]),
    ("instagram", &[r"instagram\.com/"]),
    ("youtube", &[r"youtube\.com/channel/", r"youtube\.com/c/", r"youtube\.com/user/", r"youtube\.com/@", r"youtu\.be/"]),
    ("tiktok", &[r"tiktok\.com/"]),
    ("github", &[r"github\.com/"]),
];

/// Ordered, immutable set of social platforms.
#[derive(Debug, Clone)]
pub struct SocialRegistry {
    platforms: Vec<SocialPlatform>,
}

impl SocialRegistry {
    pub fn builtin() -> Self {
        let platforms = BUILTIN_PLATFORMS
            .iter()
            .map(|(name, patterns)| {
                SocialPlatform::new(name, patterns).expect("built-in platform patterns are valid")
            })
            .collect();
        Self { platforms }
    }

    pub fn iter(&self) -> impl Iterator<Item = &SocialPlatform> {
        self.platforms.iter()
    }
}

impl Default for SocialRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

fn compile(pattern: &str) -> std::result::Result<Regex, regex::Error> {
    RegexBuilder::new(pattern).case_insensitive(true).build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_registries_compile() {
        let tech = TechnologyRegistry::builtin();
        assert_eq!(tech.len(), BUILTIN_TECHNOLOGIES.len());
        assert_eq!(tech.position("WordPress"), Some(0));
        assert_eq!(tech.position("Font Awesome"), Some(tech.len() - 1));

        let social = SocialRegistry::builtin();
        let names: Vec<&str> = social.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names[0], "linkedin");
        assert_eq!(names.len(), 7);
    }

    #[test]
    fn extras_append_in_order() {
        let extra = vec![TechnologySpec {
            name: "Webflow".into(),
            category: "CMS".into(),
            patterns: vec![r"webflow\.com".into()],
        }];
        let registry = TechnologyRegistry::with_extra(&extra).unwrap();
        assert_eq!(registry.position("Webflow"), Some(BUILTIN_TECHNOLOGIES.len()));
        let webflow = registry.iter().last().unwrap();
        assert_eq!(webflow.category, "cms");
        assert!(webflow.matches("<script src=\"https://assets.WEBFLOW.com/x.js\">"));
    }

    #[test]
    fn invalid_extra_pattern_is_config_error() {
        let extra = vec![TechnologySpec {
            name: "Broken".into(),
            category: "other".into(),
            patterns: vec!["(unclosed".into()],
        }];
        let err = TechnologyRegistry::with_extra(&extra).unwrap_err();
        assert!(matches!(err, IntelScoutError::Config { .. }));
        assert!(err.to_string().contains("Broken"));
    }

    #[test]
    fn extra_category_is_listed_after_known_ones() {
        let sig = TechnologySignature::new("Fathom", "privacy-analytics", &["usefathom"]).unwrap();
        let registry = TechnologyRegistry::from_signatures(vec![sig]);
        let categories = registry.categories();
        assert_eq!(categories.len(), CATEGORIES.len() + 1);
        assert_eq!(categories.last().unwrap(), "privacy-analytics");
    }

    #[test]
    fn short_domain_patterns_do_not_match_inside_other_domains() {
        let social = SocialRegistry::builtin();
        let twitter = social.iter().find(|p| p.name == "twitter").unwrap();
        assert!(twitter.matches("https://x.com/acme"));
        assert!(twitter.matches("https://www.x.com/acme"));
        assert!(!twitter.matches("https://dropbox.com/s/abc"));
    }
}
