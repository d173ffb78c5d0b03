//! Technology fingerprinting: an existence test per registered signature.

use intelscout_shared::{ExtractedFields, join_list};

use crate::signatures::{TechnologyRegistry, TechnologySignature};

/// Field holding every detected technology.
pub const TECHNOLOGIES_FIELD: &str = "technologies";

/// Field name for one category bucket.
pub fn category_field(category: &str) -> String {
    format!("tech_{category}")
}

/// Signatures with at least one marker present in `source`, in registry order.
pub fn detect_technologies<'r>(
    registry: &'r TechnologyRegistry,
    source: &str,
) -> Vec<&'r TechnologySignature> {
    registry.iter().filter(|sig| sig.matches(source)).collect()
}

/// Render detections as the `technologies` field plus one field per category.
pub fn technology_fields(registry: &TechnologyRegistry, source: &str) -> ExtractedFields {
    let detected = detect_technologies(registry, source);
    let mut fields = ExtractedFields::new();

    let names: Vec<&str> = detected.iter().map(|s| s.name.as_str()).collect();
    fields.set(TECHNOLOGIES_FIELD, join_list(&names));

    for category in registry.categories() {
        let in_category: Vec<&str> = detected
            .iter()
            .filter(|s| s.category == category)
            .map(|s| s.name.as_str())
            .collect();
        fields.set(category_field(&category), join_list(&in_category));
    }

    fields
}
