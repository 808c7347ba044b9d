use std::collections::HashSet;

use crate::model::{Indicator, Section};

/// Validate a loaded indicator catalog.
/// Returns all validation errors at once (not just the first).
pub fn validate_catalog(indicators: &[Indicator], sections: &[Section]) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();
    let section_ids: HashSet<_> = sections.iter().map(|s| s.id).collect();
    let mut seen = HashSet::new();

    for indicator in indicators {
        if !seen.insert(indicator.id) {
            errors.push(format!("indicator {}: duplicate id", indicator.id));
        }

        if indicator.max_weight.is_nan() || indicator.max_weight < 0.0 {
            errors.push(format!(
                "indicator {} ('{}'): max_weight must be non-negative, got {}",
                indicator.id, indicator.name, indicator.max_weight
            ));
        }

        if !section_ids.contains(&indicator.section_id) {
            errors.push(format!(
                "indicator {} ('{}'): unknown section {}",
                indicator.id, indicator.name, indicator.section_id
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
