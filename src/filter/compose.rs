//! Filter string compiler: editing mode in, one composed expression out.
//!
//! Pure and total. It never clamps; the values it receives were already
//! clamped by [`FilterState::merge`](super::FilterState::merge) or
//! [`EditMode::set_intensity`].

use super::expression::{FilterExpression, FilterFunction, FilterKind};
use super::presets::EffectPreset;
use super::state::{FilterState, Rotation};

pub const INTENSITY_MAX: f32 = 100.0;

/// The two mutually exclusive ways of editing an image.
#[derive(Debug, Clone, PartialEq)]
pub enum EditMode {
    /// Slider adjustments and toggles.
    Adjust(FilterState),
    /// One preset (or none yet) blended over the source at `intensity` %.
    Effect {
        preset: Option<&'static EffectPreset>,
        intensity: f32,
    },
}

impl EditMode {
    pub fn adjust() -> Self {
        EditMode::Adjust(FilterState::default())
    }

    pub fn effect() -> Self {
        EditMode::Effect {
            preset: None,
            intensity: INTENSITY_MAX,
        }
    }

    /// The same kind of mode with every value back at its default.
    pub fn defaults(&self) -> Self {
        match self {
            EditMode::Adjust(_) => Self::adjust(),
            EditMode::Effect { .. } => Self::effect(),
        }
    }

    /// Set the preset intensity, clamped to 0–100. No-op in Adjust mode.
    pub fn set_intensity(&mut self, value: f32) {
        if let EditMode::Effect { intensity, .. } = self {
            *intensity = if value.is_nan() {
                0.0
            } else {
                value.clamp(0.0, INTENSITY_MAX)
            };
        }
    }

    /// Rotation to draw with. Effects always render unrotated.
    pub fn rotation(&self) -> Rotation {
        match self {
            EditMode::Adjust(state) => state.rotation(),
            EditMode::Effect { .. } => Rotation::None,
        }
    }

    /// Whether this mode has something worth saving: always in Adjust mode,
    /// only once a preset is chosen in Effect mode.
    pub fn has_selection(&self) -> bool {
        match self {
            EditMode::Adjust(_) => true,
            EditMode::Effect { preset, .. } => preset.is_some(),
        }
    }
}

/// Compile the active mode into a single filter expression.
pub fn compose(mode: &EditMode) -> FilterExpression {
    match mode {
        EditMode::Adjust(state) => compose_adjustments(state),
        EditMode::Effect { preset, intensity } => match preset {
            Some(preset) => compose_preset(preset, *intensity),
            None => FilterExpression::none(),
        },
    }
}

/// Fixed order: brightness, contrast, saturate, blur, then the enabled
/// toggles as sepia, grayscale, invert.
pub fn compose_adjustments(state: &FilterState) -> FilterExpression {
    let mut expr = FilterExpression::from_functions(vec![
        FilterFunction::percent(FilterKind::Brightness, state.brightness()),
        FilterFunction::percent(FilterKind::Contrast, state.contrast()),
        FilterFunction::percent(FilterKind::Saturate, state.saturation()),
        FilterFunction::blur_px(state.blur()),
    ]);
    let toggles = [
        (state.sepia(), FilterKind::Sepia),
        (state.grayscale(), FilterKind::Grayscale),
        (state.invert(), FilterKind::Invert),
    ];
    for (enabled, kind) in toggles {
        if enabled {
            expr.push(FilterFunction::percent(kind, 100.0));
        }
    }
    expr
}

/// The preset template followed by `opacity(intensity%)`.
pub fn compose_preset(preset: &EffectPreset, intensity: f32) -> FilterExpression {
    let mut expr = preset.expression.clone();
    expr.push(FilterFunction::percent(FilterKind::Opacity, intensity));
    expr
}
