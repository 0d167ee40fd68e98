//! The fixed catalog of named effect presets.
//!
//! The set is closed and small, so it lives in a static table. Templates are
//! parsed once, on first access, and shared for the life of the process.

use super::expression::FilterExpression;
use std::sync::LazyLock;

/// Name and template text of every preset, in display order.
const CATALOG: &[(&str, &str)] = &[
    ("Vintage", "sepia(0.5) contrast(1.2)"),
    ("Dramatic", "contrast(1.4) saturate(1.4) brightness(0.9)"),
    ("Vivid", "saturate(2) contrast(1.1)"),
    ("Cool", "saturate(0.8) hue-rotate(30deg)"),
    ("Warm", "sepia(0.3) saturate(1.3) hue-rotate(-30deg)"),
    ("Noir", "grayscale(1) contrast(1.4) brightness(0.9)"),
];

/// A named, immutable filter expression template.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectPreset {
    pub name: &'static str,
    pub expression: FilterExpression,
}

static PRESETS: LazyLock<Vec<EffectPreset>> = LazyLock::new(|| {
    CATALOG
        .iter()
        .filter_map(|&(name, template)| match template.parse() {
            Ok(expression) => Some(EffectPreset { name, expression }),
            Err(e) => {
                log::error!("preset {name} has an invalid template: {e}");
                None
            }
        })
        .collect()
});

/// All presets in display order.
pub fn presets() -> &'static [EffectPreset] {
    &PRESETS
}

/// Case-insensitive lookup by name.
pub fn find_preset(name: &str) -> Option<&'static EffectPreset> {
    PRESETS.iter().find(|p| p.name.eq_ignore_ascii_case(name))
}
