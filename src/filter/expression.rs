//! Declarative filter expressions.
//!
//! An expression is an ordered list of filter functions written in the CSS
//! filter grammar, e.g. `sepia(0.5) contrast(1.2)`, or the keyword `none`.
//! Functions apply left to right, each to the output of the previous one, so
//! order matters: `sepia(100%) invert(100%)` and `invert(100%) sepia(100%)`
//! are different images.
//!
//! ## Grammar
//!
//! ```text
//! expression := "none" | function (ws function)*
//! function   := name "(" number unit? ")"
//! unit       := "%" | "px" | "deg"
//! ```
//!
//! | Function | Argument | Identity |
//! |---|---|---|
//! | `brightness`, `contrast`, `saturate` | number or % (`1.2` = `120%`) | 1 |
//! | `grayscale`, `sepia`, `invert` | number or %, capped at 1 | 0 |
//! | `opacity` | number or %, capped at 1 | 1 |
//! | `blur` | length in `px` | 0 |
//! | `hue-rotate` | angle in `deg` | 0 |
//!
//! A trailing `opacity()` has a special role in rendering: it is the blend
//! weight of the filtered layer against the unmodified source. See
//! [`FilterExpression::split_blend`].

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExpressionError {
    #[error("unknown filter function: {0}")]
    UnknownFunction(String),
    #[error("malformed filter expression: {0}")]
    Malformed(String),
    #[error("{function}() does not accept the argument `{argument}`")]
    BadUnit {
        function: &'static str,
        argument: String,
    },
    #[error("{function}() does not accept negative values")]
    Negative { function: &'static str },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterKind {
    Brightness,
    Contrast,
    Saturate,
    Blur,
    Grayscale,
    Sepia,
    Invert,
    HueRotate,
    Opacity,
}

impl FilterKind {
    pub fn name(self) -> &'static str {
        match self {
            FilterKind::Brightness => "brightness",
            FilterKind::Contrast => "contrast",
            FilterKind::Saturate => "saturate",
            FilterKind::Blur => "blur",
            FilterKind::Grayscale => "grayscale",
            FilterKind::Sepia => "sepia",
            FilterKind::Invert => "invert",
            FilterKind::HueRotate => "hue-rotate",
            FilterKind::Opacity => "opacity",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let kind = match name.to_ascii_lowercase().as_str() {
            "brightness" => FilterKind::Brightness,
            "contrast" => FilterKind::Contrast,
            "saturate" => FilterKind::Saturate,
            "blur" => FilterKind::Blur,
            "grayscale" => FilterKind::Grayscale,
            "sepia" => FilterKind::Sepia,
            "invert" => FilterKind::Invert,
            "hue-rotate" => FilterKind::HueRotate,
            "opacity" => FilterKind::Opacity,
            _ => return None,
        };
        Some(kind)
    }

    /// Functions whose amount saturates at 1 (100%).
    fn capped_at_one(self) -> bool {
        matches!(
            self,
            FilterKind::Grayscale | FilterKind::Sepia | FilterKind::Invert | FilterKind::Opacity
        )
    }
}

/// A filter function argument, kept in the unit it was written in so that
/// printing reproduces the original text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Argument {
    Number(f32),
    Percent(f32),
    Px(f32),
    Deg(f32),
}

impl Argument {
    fn raw(self) -> f32 {
        match self {
            Argument::Number(v) | Argument::Percent(v) | Argument::Px(v) | Argument::Deg(v) => v,
        }
    }
}

impl fmt::Display for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Argument::Number(v) => write!(f, "{v}"),
            Argument::Percent(v) => write!(f, "{v}%"),
            Argument::Px(v) => write!(f, "{v}px"),
            Argument::Deg(v) => write!(f, "{v}deg"),
        }
    }
}

impl FromStr for Argument {
    type Err = ExpressionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (digits, make): (&str, fn(f32) -> Argument) = if let Some(d) = s.strip_suffix('%') {
            (d, Argument::Percent)
        } else if let Some(d) = s.strip_suffix("px") {
            (d, Argument::Px)
        } else if let Some(d) = s.strip_suffix("deg") {
            (d, Argument::Deg)
        } else {
            (s, Argument::Number)
        };
        match digits.trim().parse::<f32>() {
            Ok(v) if v.is_finite() => Ok(make(v)),
            _ => Err(ExpressionError::Malformed(format!("bad number `{s}`"))),
        }
    }
}

/// One filter function with its argument.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterFunction {
    pub kind: FilterKind,
    pub arg: Argument,
}

impl FilterFunction {
    /// Build a function, checking the argument's unit and sign.
    pub fn new(kind: FilterKind, arg: Argument) -> Result<Self, ExpressionError> {
        let bad_unit = || ExpressionError::BadUnit {
            function: kind.name(),
            argument: arg.to_string(),
        };
        let arg = match (kind, arg) {
            (FilterKind::Blur, Argument::Px(_)) => arg,
            (FilterKind::Blur, Argument::Number(v)) if v == 0.0 => Argument::Px(0.0),
            (FilterKind::Blur, _) => return Err(bad_unit()),
            (FilterKind::HueRotate, Argument::Deg(_)) => arg,
            (FilterKind::HueRotate, Argument::Number(v)) if v == 0.0 => Argument::Deg(0.0),
            (FilterKind::HueRotate, _) => return Err(bad_unit()),
            (_, Argument::Number(_) | Argument::Percent(_)) => arg,
            _ => return Err(bad_unit()),
        };
        if kind != FilterKind::HueRotate && arg.raw() < 0.0 {
            return Err(ExpressionError::Negative {
                function: kind.name(),
            });
        }
        Ok(Self { kind, arg })
    }

    /// Percentage argument, e.g. `brightness(120%)`. The caller guarantees the
    /// value is in range.
    pub fn percent(kind: FilterKind, value: f32) -> Self {
        Self {
            kind,
            arg: Argument::Percent(value),
        }
    }

    pub fn blur_px(radius: f32) -> Self {
        Self {
            kind: FilterKind::Blur,
            arg: Argument::Px(radius),
        }
    }

    /// Normalised amount used by the pixel math: a multiplier for the
    /// number/percent functions, pixels for `blur`, degrees for `hue-rotate`.
    pub fn amount(&self) -> f32 {
        let v = match self.arg {
            Argument::Percent(v) => v / 100.0,
            other => other.raw(),
        };
        if self.kind.capped_at_one() {
            v.min(1.0)
        } else {
            v
        }
    }

    /// Whether applying this function leaves every pixel unchanged.
    pub fn is_identity(&self) -> bool {
        let a = self.amount();
        match self.kind {
            FilterKind::Brightness | FilterKind::Contrast | FilterKind::Saturate => a == 1.0,
            FilterKind::Opacity => a == 1.0,
            FilterKind::HueRotate => a % 360.0 == 0.0,
            FilterKind::Blur | FilterKind::Grayscale | FilterKind::Sepia | FilterKind::Invert => {
                a == 0.0
            }
        }
    }
}

impl fmt::Display for FilterFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.kind.name(), self.arg)
    }
}

/// An ordered composition of filter functions. Empty means `none`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterExpression {
    functions: Vec<FilterFunction>,
}

impl FilterExpression {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn from_functions(functions: Vec<FilterFunction>) -> Self {
        Self { functions }
    }

    pub fn push(&mut self, function: FilterFunction) {
        self.functions.push(function);
    }

    pub fn functions(&self) -> &[FilterFunction] {
        &self.functions
    }

    pub fn is_none(&self) -> bool {
        self.functions.is_empty()
    }

    /// Separate a trailing `opacity()` term from the rest.
    ///
    /// Returns the filter chain to apply and the weight with which the
    /// filtered layer is blended over the unmodified source (1.0 when there is
    /// no trailing opacity).
    pub fn split_blend(&self) -> (&[FilterFunction], f32) {
        match self.functions.split_last() {
            Some((last, rest)) if last.kind == FilterKind::Opacity => (rest, last.amount()),
            _ => (&self.functions, 1.0),
        }
    }

    /// Whether rendering this expression reproduces the source exactly.
    pub fn is_identity(&self) -> bool {
        let (chain, weight) = self.split_blend();
        weight == 0.0 || chain.iter().all(FilterFunction::is_identity)
    }
}

impl fmt::Display for FilterExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.functions.is_empty() {
            return f.write_str("none");
        }
        for (i, function) in self.functions.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{function}")?;
        }
        Ok(())
    }
}

impl FromStr for FilterExpression {
    type Err = ExpressionError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        if trimmed.eq_ignore_ascii_case("none") {
            return Ok(Self::none());
        }
        if trimmed.is_empty() {
            return Err(ExpressionError::Malformed("empty expression".into()));
        }

        let mut functions = Vec::new();
        let mut rest = trimmed;
        while !rest.is_empty() {
            let open = rest
                .find('(')
                .ok_or_else(|| ExpressionError::Malformed(format!("expected `(` in `{rest}`")))?;
            let name = &rest[..open];
            if name.is_empty() || name.contains(char::is_whitespace) {
                return Err(ExpressionError::Malformed(format!(
                    "bad function name `{name}`"
                )));
            }
            let kind = FilterKind::from_name(name)
                .ok_or_else(|| ExpressionError::UnknownFunction(name.to_string()))?;

            let after_open = &rest[open + 1..];
            let close = after_open.find(')').ok_or_else(|| {
                ExpressionError::Malformed(format!("unclosed `{}(`", kind.name()))
            })?;
            let arg: Argument = after_open[..close].parse()?;
            functions.push(FilterFunction::new(kind, arg)?);

            let tail = &after_open[close + 1..];
            if !tail.is_empty() && !tail.starts_with(char::is_whitespace) {
                return Err(ExpressionError::Malformed(format!(
                    "expected whitespace before `{tail}`"
                )));
            }
            rest = tail.trim_start();
        }
        Ok(Self { functions })
    }
}
