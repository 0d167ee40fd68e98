//! Adjustment values edited in the Adjust view.
//!
//! [`FilterState`] is the full set of values; [`FilterPatch`] is a partial
//! update coming from an input control. Clamping into each field's domain
//! happens when a patch is applied, never later: the compiler and the render
//! pipeline trust that a `FilterState` is always in range.
//!
//! | Field | Domain | Default |
//! |---|---|---|
//! | `brightness` | 0–200 % | 100 |
//! | `contrast` | 0–200 % | 100 |
//! | `saturation` | 0–200 % | 100 |
//! | `blur` | 0–20 px | 0 |
//! | `rotation` | 0, 90, 180, 270° | 0 |
//! | `sepia`, `grayscale`, `invert` | on/off | off |

use serde::{Deserialize, Serialize};

pub const PERCENT_MAX: f32 = 200.0;
pub const BLUR_MAX: f32 = 20.0;

/// Quarter-turn rotation applied about the surface centre.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Rotation {
    #[default]
    None,
    Quarter,
    Half,
    ThreeQuarter,
}

impl Rotation {
    pub fn degrees(self) -> u32 {
        match self {
            Rotation::None => 0,
            Rotation::Quarter => 90,
            Rotation::Half => 180,
            Rotation::ThreeQuarter => 270,
        }
    }

    /// Exact quarter turns only, modulo 360: `-90` is 270, `450` is 90.
    /// Any other angle is `None`.
    pub fn from_degrees(degrees: i32) -> Option<Self> {
        match degrees.rem_euclid(360) {
            0 => Some(Rotation::None),
            90 => Some(Rotation::Quarter),
            180 => Some(Rotation::Half),
            270 => Some(Rotation::ThreeQuarter),
            _ => None,
        }
    }

    /// One quarter turn clockwise, wrapping 270 back to 0.
    pub fn clockwise(self) -> Self {
        match self {
            Rotation::None => Rotation::Quarter,
            Rotation::Quarter => Rotation::Half,
            Rotation::Half => Rotation::ThreeQuarter,
            Rotation::ThreeQuarter => Rotation::None,
        }
    }
}

impl std::str::FromStr for Rotation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let degrees: i32 = s
            .trim()
            .parse()
            .map_err(|_| format!("`{s}` is not a whole number of degrees"))?;
        Self::from_degrees(degrees)
            .ok_or_else(|| format!("rotation must be a multiple of 90, got {degrees}"))
    }
}

/// Adjustment values for the Adjust view.
///
/// Fields are read through accessors and written only through
/// [`merge`](Self::merge) and [`rotate_clockwise`](Self::rotate_clockwise).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FilterState {
    brightness: f32,
    contrast: f32,
    saturation: f32,
    blur: f32,
    rotation: Rotation,
    sepia: bool,
    grayscale: bool,
    invert: bool,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            brightness: 100.0,
            contrast: 100.0,
            saturation: 100.0,
            blur: 0.0,
            rotation: Rotation::None,
            sepia: false,
            grayscale: false,
            invert: false,
        }
    }
}

impl FilterState {
    pub fn brightness(&self) -> f32 {
        self.brightness
    }

    pub fn contrast(&self) -> f32 {
        self.contrast
    }

    pub fn saturation(&self) -> f32 {
        self.saturation
    }

    pub fn blur(&self) -> f32 {
        self.blur
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    pub fn sepia(&self) -> bool {
        self.sepia
    }

    pub fn grayscale(&self) -> bool {
        self.grayscale
    }

    pub fn invert(&self) -> bool {
        self.invert
    }

    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    pub fn rotate_clockwise(&mut self) {
        self.rotation = self.rotation.clockwise();
    }

    /// Apply a partial update, clamping numeric values into their domains.
    pub fn merge(&mut self, patch: &FilterPatch) {
        if let Some(v) = patch.brightness {
            self.brightness = clamp_percent(v);
        }
        if let Some(v) = patch.contrast {
            self.contrast = clamp_percent(v);
        }
        if let Some(v) = patch.saturation {
            self.saturation = clamp_percent(v);
        }
        if let Some(v) = patch.blur {
            self.blur = clamp_finite(v, BLUR_MAX);
        }
        if let Some(r) = patch.rotation {
            self.rotation = r;
        }
        if let Some(on) = patch.sepia {
            self.sepia = on;
        }
        if let Some(on) = patch.grayscale {
            self.grayscale = on;
        }
        if let Some(on) = patch.invert {
            self.invert = on;
        }
    }
}

fn clamp_percent(v: f32) -> f32 {
    clamp_finite(v, PERCENT_MAX)
}

// NaN from a misbehaving control collapses to 0 instead of poisoning the state.
fn clamp_finite(v: f32, max: f32) -> f32 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, max) }
}

/// A partial update to a [`FilterState`]. Unset fields are left untouched.
///
/// ```
/// use smart_photo::filter::{FilterPatch, FilterState};
///
/// let mut state = FilterState::default();
/// state.merge(&FilterPatch::new().brightness(250.0).sepia(true));
/// assert_eq!(state.brightness(), 200.0);
/// assert!(state.sepia());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FilterPatch {
    pub brightness: Option<f32>,
    pub contrast: Option<f32>,
    pub saturation: Option<f32>,
    pub blur: Option<f32>,
    pub rotation: Option<Rotation>,
    pub sepia: Option<bool>,
    pub grayscale: Option<bool>,
    pub invert: Option<bool>,
}

impl FilterPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn brightness(mut self, v: f32) -> Self {
        self.brightness = Some(v);
        self
    }

    pub fn contrast(mut self, v: f32) -> Self {
        self.contrast = Some(v);
        self
    }

    pub fn saturation(mut self, v: f32) -> Self {
        self.saturation = Some(v);
        self
    }

    pub fn blur(mut self, v: f32) -> Self {
        self.blur = Some(v);
        self
    }

    pub fn rotation(mut self, r: Rotation) -> Self {
        self.rotation = Some(r);
        self
    }

    pub fn sepia(mut self, on: bool) -> Self {
        self.sepia = Some(on);
        self
    }

    pub fn grayscale(mut self, on: bool) -> Self {
        self.grayscale = Some(on);
        self
    }

    pub fn invert(mut self, on: bool) -> Self {
        self.invert = Some(on);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
