//! Filter model and compiler. Pure data, no pixels.
//!
//! - **State**: [`FilterState`] adjustment values and [`FilterPatch`] partial updates
//! - **Expression**: [`FilterExpression`] parsing and printing the CSS filter grammar
//! - **Presets**: the static [`EffectPreset`] catalog
//! - **Compose**: [`compose`] turns an [`EditMode`] into one expression

pub mod compose;
pub mod expression;
pub mod presets;
pub mod state;

pub use compose::{EditMode, INTENSITY_MAX, compose};
pub use expression::{Argument, ExpressionError, FilterExpression, FilterFunction, FilterKind};
pub use presets::{EffectPreset, find_preset, presets};
pub use state::{FilterPatch, FilterState, Rotation};
