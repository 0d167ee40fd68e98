//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Effects
//!
//! ```text
//! 001 Vintage   sepia(0.5) contrast(1.2)
//! 002 Dramatic  contrast(1.4) saturate(1.4) brightness(0.9)
//! ```
//!
//! ## Edit
//!
//! ```text
//! photo.png (640x480)
//!     render 1: brightness(100%) contrast(100%) saturate(100%) blur(0px)
//!     render 2: brightness(50%) contrast(100%) saturate(100%) blur(0px)
//!     Saved: out.jpg (48213 bytes)
//! ```
//!
//! # Architecture
//!
//! Each output has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions do no I/O.

use crate::filter::EffectPreset;
use crate::imaging::Dimensions;
use crate::session::RenderEvent;
use serde::Serialize;
use std::path::Path;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

fn dims(d: Dimensions) -> String {
    format!("{}x{}", d.width, d.height)
}

// ============================================================================
// Effects catalog
// ============================================================================

/// One line per preset, names padded into a column.
pub fn format_effects(presets: &[EffectPreset]) -> Vec<String> {
    let width = presets.iter().map(|p| p.name.len()).max().unwrap_or(0);
    presets
        .iter()
        .enumerate()
        .map(|(i, p)| {
            format!(
                "{} {:<width$}  {}",
                format_index(i + 1),
                p.name,
                p.expression
            )
        })
        .collect()
}

pub fn print_effects(presets: &[EffectPreset]) {
    for line in format_effects(presets) {
        println!("{}", line);
    }
}

#[derive(Serialize)]
struct EffectEntry<'a> {
    name: &'a str,
    expression: String,
}

/// The catalog as a JSON array of `{name, expression}` objects.
pub fn format_effects_json(presets: &[EffectPreset]) -> Result<String, serde_json::Error> {
    let entries: Vec<EffectEntry> = presets
        .iter()
        .map(|p| EffectEntry {
            name: p.name,
            expression: p.expression.to_string(),
        })
        .collect();
    serde_json::to_string_pretty(&entries)
}

// ============================================================================
// Edit
// ============================================================================

/// Header line for the image being edited.
pub fn format_edit_header(input: &Path, dimensions: Dimensions) -> String {
    let name = input
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| input.display().to_string());
    format!("{} ({})", name, dims(dimensions))
}

/// A render, as reported to render observers.
pub fn format_render_event(event: &RenderEvent) -> String {
    format!("    render {}: {}", event.generation, event.expression)
}

/// Where the result went.
pub fn format_edit_result(verb: &str, destination: &Path, bytes: usize) -> String {
    format!("    {}: {} ({} bytes)", verb, destination.display(), bytes)
}

// ============================================================================
// Server
// ============================================================================

pub fn format_server_banner(port: u16, root: &Path) -> Vec<String> {
    vec![
        format!("Server is running on port {}", port),
        format!("    Root: {}", root.display()),
    ]
}

pub fn print_server_banner(port: u16, root: &Path) {
    for line in format_server_banner(port, root) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::presets;

    #[test]
    fn effects_are_numbered_and_aligned() {
        let lines = format_effects(presets());
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[0], "001 Vintage   sepia(0.5) contrast(1.2)");
        assert_eq!(
            lines[5],
            "006 Noir      grayscale(1) contrast(1.4) brightness(0.9)"
        );
    }

    #[test]
    fn effects_json_lists_names_and_expressions() {
        let json = format_effects_json(presets()).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        let list = parsed.as_array().unwrap();
        assert_eq!(list.len(), 6);
        assert_eq!(list[3]["name"], "Cool");
        assert_eq!(list[3]["expression"], "saturate(0.8) hue-rotate(30deg)");
    }

    #[test]
    fn edit_lines() {
        let d = Dimensions {
            width: 640,
            height: 480,
        };
        assert_eq!(
            format_edit_header(Path::new("/tmp/photo.png"), d),
            "photo.png (640x480)"
        );
        let event = RenderEvent {
            generation: 2,
            expression: "none".into(),
            dimensions: d,
        };
        assert_eq!(format_render_event(&event), "    render 2: none");
        assert_eq!(
            format_edit_result("Saved", Path::new("out.jpg"), 10),
            "    Saved: out.jpg (10 bytes)"
        );
    }

    #[test]
    fn server_banner() {
        let lines = format_server_banner(3000, Path::new("dist"));
        assert_eq!(lines[0], "Server is running on port 3000");
        assert_eq!(lines[1], "    Root: dist");
    }
}
