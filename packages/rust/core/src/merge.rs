//! How extracted facts are combined into a seed's existing fields.

use std::str::FromStr;

use intelscout_shared::{Fields, IntelScoutError, Mode, is_blank};

/// Field merge policy; both variants are always available.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergePolicy {
    /// Any non-empty extracted value overwrites the field. Newest observation wins.
    Safe,
    /// A field is written only while its current value is blank.
    Conservative,
}

impl MergePolicy {
    /// Default policy per mode: company profiles refresh, catalog records keep input.
    pub fn for_mode(mode: Mode) -> Self {
        match mode {
            Mode::Company => Self::Safe,
            Mode::Catalog => Self::Conservative,
        }
    }

    /// Parse a configured policy name; "auto" picks the mode default.
    pub fn resolve(name: &str, mode: Mode) -> intelscout_shared::Result<Self> {
        match name.trim().to_lowercase().as_str() {
            "" | "auto" => Ok(Self::for_mode(mode)),
            other => other.parse(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Safe => "safe",
            Self::Conservative => "conservative",
        }
    }

    /// Merge `extracted` into `fields` in place.
    ///
    /// Extracted keys missing from `fields` are always added, even when blank,
    /// so every record of a run shares one schema.
    pub fn apply(&self, fields: &mut Fields, extracted: &Fields) {
        for (name, value) in extracted {
            let incoming_blank = value.trim().is_empty();
            let write = match self {
                Self::Safe => !incoming_blank,
                Self::Conservative => !incoming_blank && is_blank(fields.get(name)),
            };
            if write {
                fields.insert(name.clone(), value.clone());
            } else if !fields.contains_key(name) {
                fields.insert(name.clone(), value.clone());
            }
        }
    }
}

impl FromStr for MergePolicy {
    type Err = IntelScoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "safe" | "fill-empty-only" => Ok(Self::Safe),
            "conservative" | "preserve-existing" => Ok(Self::Conservative),
            other => Err(IntelScoutError::validation(format!(
                "unknown merge policy '{other}': expected 'safe', 'conservative' or 'auto'"
            ))),
        }
    }
}

impl std::fmt::Display for MergePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
