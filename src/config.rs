//! Application configuration module.
//!
//! Handles loading, validating, and layering configuration. Values are
//! resolved in three layers, each overriding the one before:
//!
//! 1. Stock defaults ([`AppConfig::default`]).
//! 2. An optional `config.toml` named with `--config`.
//! 3. Environment variables (`PORT`, `HOST`, `APP_TITLE`, ...).
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [app]
//! title = "Smart Photo Editor"
//! description = "Modern photo editing web application"
//!
//! [server]
//! port = 3000
//! host = "0.0.0.0"
//! asset_root = "dist"       # Directory of built assets to serve
//!
//! [features]
//! enable_effects = true     # Effects view and presets
//! enable_pro_features = true
//!
//! [image]
//! max_size = 10485760       # Upload limit in bytes
//! enable_compression = true # Lossy JPEG saves; false saves lossless PNG
//! default_quality = 0.8
//! supported_types = ["image/jpeg", "image/png", "image/webp"]
//!
//! [api]
//! url = "http://localhost:3000"
//! timeout_ms = 30000
//!
//! [editor]
//! render_policy = "immediate" # or "coalesced"
//! save_quality = 92
//! download_quality = 90
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse. Override just the values you want:
//!
//! ```toml
//! [server]
//! port = 8080
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::session::RenderPolicy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
    #[error("Invalid value for {var}: {value:?}")]
    Env { var: &'static str, value: String },
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Application configuration.
///
/// All fields have sensible defaults. User config files need only specify
/// the values they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Display metadata.
    pub app: AppInfoConfig,
    /// Static asset server.
    pub server: ServerConfig,
    /// Feature toggles.
    pub features: FeaturesConfig,
    /// Upload limits and export compression.
    pub image: ImageConfig,
    /// Remote API endpoint settings.
    pub api: ApiConfig,
    /// Edit session behaviour.
    pub editor: EditorConfig,
}

impl AppConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("server.port must be non-zero".into()));
        }
        if self.image.max_size == 0 {
            return Err(ConfigError::Validation(
                "image.max_size must be non-zero".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.image.default_quality) {
            return Err(ConfigError::Validation(
                "image.default_quality must be 0.0-1.0".into(),
            ));
        }
        if self.image.supported_types.is_empty() {
            return Err(ConfigError::Validation(
                "image.supported_types must not be empty".into(),
            ));
        }
        if let Some(bad) = self
            .image
            .supported_types
            .iter()
            .find(|t| !t.starts_with("image/"))
        {
            return Err(ConfigError::Validation(format!(
                "image.supported_types entry {bad:?} is not an image MIME type"
            )));
        }
        for (key, value) in [
            ("editor.save_quality", self.editor.save_quality),
            ("editor.download_quality", self.editor.download_quality),
        ] {
            if !(1..=100).contains(&value) {
                return Err(ConfigError::Validation(format!("{key} must be 1-100")));
            }
        }
        if self.api.timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "api.timeout_ms must be non-zero".into(),
            ));
        }
        Ok(())
    }

    /// Overlay environment variables using `lookup` to read them.
    ///
    /// Feature toggles are on unless the variable is exactly `false`.
    pub fn apply_env_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(v) = lookup("PORT") {
            self.server.port = parse_env("PORT", v)?;
        }
        if let Some(v) = lookup("HOST") {
            self.server.host = v;
        }
        if let Some(v) = lookup("APP_TITLE") {
            self.app.title = v;
        }
        if let Some(v) = lookup("APP_DESCRIPTION") {
            self.app.description = v;
        }
        if let Some(v) = lookup("ENABLE_EFFECTS") {
            self.features.enable_effects = v != "false";
        }
        if let Some(v) = lookup("ENABLE_PRO_FEATURES") {
            self.features.enable_pro_features = v != "false";
        }
        if let Some(v) = lookup("MAX_IMAGE_SIZE") {
            self.image.max_size = parse_env("MAX_IMAGE_SIZE", v)?;
        }
        if let Some(v) = lookup("ENABLE_IMAGE_COMPRESSION") {
            self.image.enable_compression = v != "false";
        }
        if let Some(v) = lookup("API_URL") {
            self.api.url = v;
        }
        if let Some(v) = lookup("API_TIMEOUT") {
            self.api.timeout_ms = parse_env("API_TIMEOUT", v)?;
        }
        Ok(())
    }

    /// `host:port` for the asset server.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn parse_env<T: std::str::FromStr>(var: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Env { var, value })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppInfoConfig {
    pub title: String,
    pub description: String,
}

impl Default for AppInfoConfig {
    fn default() -> Self {
        Self {
            title: "Smart Photo Editor".to_string(),
            description: "Modern photo editing web application".to_string(),
        }
    }
}

/// Static asset server settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    /// Directory of built assets; must contain `index.html`.
    pub asset_root: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            host: "0.0.0.0".to_string(),
            asset_root: "dist".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FeaturesConfig {
    /// When off, the Effects view and preset operations are refused.
    pub enable_effects: bool,
    pub enable_pro_features: bool,
}

impl Default for FeaturesConfig {
    fn default() -> Self {
        Self {
            enable_effects: true,
            enable_pro_features: true,
        }
    }
}

/// Upload and export image settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImageConfig {
    /// Largest accepted upload, in bytes.
    pub max_size: u64,
    /// Lossy JPEG saves when on; lossless PNG saves when off.
    pub enable_compression: bool,
    /// Quality hint as a 0.0–1.0 fraction.
    pub default_quality: f32,
    /// MIME types accepted at upload (matched against sniffed content).
    pub supported_types: Vec<String>,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            max_size: 10_485_760,
            enable_compression: true,
            default_quality: 0.8,
            supported_types: vec![
                "image/jpeg".to_string(),
                "image/png".to_string(),
                "image/webp".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ApiConfig {
    pub url: String,
    pub timeout_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:3000".to_string(),
            timeout_ms: 30_000,
        }
    }
}

/// Edit session behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EditorConfig {
    /// When renders happen relative to state changes.
    pub render_policy: RenderPolicy,
    /// JPEG quality for saves into the gallery (1-100).
    pub save_quality: u32,
    /// JPEG quality for downloads (1-100).
    pub download_quality: u32,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            render_policy: RenderPolicy::default(),
            save_quality: 92,
            download_quality: 90,
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(AppConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Read a config file as a raw TOML value.
pub fn load_raw_config(path: &Path) -> Result<toml::Value, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Merge an optional overlay onto a base value and deserialize it.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<AppConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    Ok(merged.try_into()?)
}

/// Resolve the full configuration: stock defaults, then the file at `path`
/// (if given), then environment variables read through `lookup`.
///
/// The result is validated after every layer has been applied.
pub fn load_config(
    path: Option<&Path>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<AppConfig, ConfigError> {
    let overlay = path.map(load_raw_config).transpose()?;
    let mut config = resolve_config(stock_defaults_value()?, overlay)?;
    config.apply_env_overrides(lookup)?;
    config.validate()?;
    Ok(config)
}

/// Environment lookup backed by the process environment.
pub fn process_env(var: &str) -> Option<String> {
    std::env::var(var).ok()
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Smart Photo Editor Configuration
# ================================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Environment variables override this file:
#   PORT, HOST, APP_TITLE, APP_DESCRIPTION, ENABLE_EFFECTS,
#   ENABLE_PRO_FEATURES, MAX_IMAGE_SIZE, ENABLE_IMAGE_COMPRESSION,
#   API_URL, API_TIMEOUT
#
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Application
# ---------------------------------------------------------------------------
[app]
title = "Smart Photo Editor"
description = "Modern photo editing web application"

# ---------------------------------------------------------------------------
# Static asset server
# ---------------------------------------------------------------------------
[server]
port = 3000
host = "0.0.0.0"

# Directory of built assets. Paths without a file extension, and files that
# do not exist, are answered with index.html from this directory.
asset_root = "dist"

# ---------------------------------------------------------------------------
# Feature toggles
# ---------------------------------------------------------------------------
[features]
# Effects view and preset operations.
enable_effects = true
enable_pro_features = true

# ---------------------------------------------------------------------------
# Images
# ---------------------------------------------------------------------------
[image]
# Largest accepted upload in bytes (10 MB).
max_size = 10485760

# Save edited images as lossy JPEG. When false, saves are lossless PNG.
enable_compression = true

# Quality hint as a fraction (0.0 - 1.0).
default_quality = 0.8

# Upload MIME types, matched against the file's content.
supported_types = ["image/jpeg", "image/png", "image/webp"]

# ---------------------------------------------------------------------------
# API
# ---------------------------------------------------------------------------
[api]
url = "http://localhost:3000"
timeout_ms = 30000

# ---------------------------------------------------------------------------
# Editor
# ---------------------------------------------------------------------------
[editor]
# "immediate" redraws on every change.
# "coalesced" redraws once per flush, drawing only the latest state.
render_policy = "immediate"

# JPEG quality (1 - 100) for saves into the gallery and for downloads.
save_quality = 92
download_quality = 90
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn default_config_matches_application_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.app.title, "Smart Photo Editor");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert!(config.features.enable_effects);
        assert!(config.features.enable_pro_features);
        assert_eq!(config.image.max_size, 10_485_760);
        assert_eq!(config.image.default_quality, 0.8);
        assert_eq!(config.api.url, "http://localhost:3000");
        assert_eq!(config.api.timeout_ms, 30_000);
        assert_eq!(config.editor.save_quality, 92);
        assert_eq!(config.editor.download_quality, 90);
        assert_eq!(config.editor.render_policy, RenderPolicy::Immediate);
    }

    #[test]
    fn parse_partial_config() {
        let config: AppConfig = toml::from_str("[server]\nport = 8080\n").unwrap();
        assert_eq!(config.server.port, 8080);
        // Default values preserved
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.image.max_size, 10_485_760);
    }

    #[test]
    fn parse_render_policy() {
        let config: AppConfig =
            toml::from_str("[editor]\nrender_policy = \"coalesced\"\n").unwrap();
        assert_eq!(config.editor.render_policy, RenderPolicy::Coalesced);
    }

    // =========================================================================
    // load_config tests
    // =========================================================================

    #[test]
    fn load_config_without_file_is_default() {
        let config = load_config(None, no_env).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(
            &path,
            r#"
[app]
title = "Darkroom"

[editor]
save_quality = 80
"#,
        )
        .unwrap();

        let config = load_config(Some(&path), no_env).unwrap();
        assert_eq!(config.app.title, "Darkroom");
        assert_eq!(config.editor.save_quality, 80);
        // Unspecified values should be defaults
        assert_eq!(config.editor.download_quality, 90);
    }

    #[test]
    fn load_config_missing_file_is_io_error() {
        let tmp = TempDir::new().unwrap();
        let result = load_config(Some(&tmp.path().join("nope.toml")), no_env);
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "this is not valid toml [[[").unwrap();

        let result = load_config(Some(&path), no_env);
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn env_overrides_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "[server]\nport = 8080\n").unwrap();

        let config = load_config(Some(&path), env(&[("PORT", "9090")])).unwrap();
        assert_eq!(config.server.port, 9090);
    }

    // =========================================================================
    // Environment override tests
    // =========================================================================

    #[test]
    fn env_overrides_every_variable() {
        let mut config = AppConfig::default();
        config
            .apply_env_overrides(env(&[
                ("PORT", "4000"),
                ("HOST", "127.0.0.1"),
                ("APP_TITLE", "T"),
                ("APP_DESCRIPTION", "D"),
                ("ENABLE_EFFECTS", "false"),
                ("ENABLE_PRO_FEATURES", "false"),
                ("MAX_IMAGE_SIZE", "2048"),
                ("ENABLE_IMAGE_COMPRESSION", "false"),
                ("API_URL", "http://api"),
                ("API_TIMEOUT", "500"),
            ]))
            .unwrap();
        assert_eq!(config.bind_address(), "127.0.0.1:4000");
        assert_eq!(config.app.title, "T");
        assert_eq!(config.app.description, "D");
        assert!(!config.features.enable_effects);
        assert!(!config.features.enable_pro_features);
        assert_eq!(config.image.max_size, 2048);
        assert!(!config.image.enable_compression);
        assert_eq!(config.api.url, "http://api");
        assert_eq!(config.api.timeout_ms, 500);
    }

    #[test]
    fn feature_toggle_only_disabled_by_exact_false() {
        let mut config = AppConfig::default();
        config
            .apply_env_overrides(env(&[("ENABLE_EFFECTS", "0"), ("ENABLE_PRO_FEATURES", "FALSE")]))
            .unwrap();
        assert!(config.features.enable_effects);
        assert!(config.features.enable_pro_features);
    }

    #[test]
    fn bad_port_is_env_error() {
        let mut config = AppConfig::default();
        let err = config
            .apply_env_overrides(env(&[("PORT", "eighty")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Env { var: "PORT", .. }));
        assert!(err.to_string().contains("eighty"));
    }

    // =========================================================================
    // merge_toml tests
    // =========================================================================

    #[test]
    fn merge_toml_scalar_override() {
        let base: toml::Value = toml::from_str(r#"quality = 90"#).unwrap();
        let overlay: toml::Value = toml::from_str(r#"quality = 70"#).unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged.get("quality").unwrap().as_integer(), Some(70));
    }

    #[test]
    fn merge_toml_table_merge_preserves_base_keys() {
        let base: toml::Value = toml::from_str(
            r#"
[editor]
save_quality = 92
download_quality = 90
"#,
        )
        .unwrap();
        let overlay: toml::Value = toml::from_str("[editor]\nsave_quality = 70\n").unwrap();
        let merged = merge_toml(base, overlay);
        let editor = merged.get("editor").unwrap();
        assert_eq!(editor.get("save_quality").unwrap().as_integer(), Some(70));
        assert_eq!(editor.get("download_quality").unwrap().as_integer(), Some(90));
    }

    // =========================================================================
    // Unknown key rejection tests
    // =========================================================================

    #[test]
    fn unknown_key_rejected() {
        let result: Result<AppConfig, _> = toml::from_str("[server]\nprot = 3000\n");
        let err = result.unwrap_err().to_string();
        assert!(err.contains("unknown field"));
    }

    #[test]
    fn unknown_section_rejected() {
        let result: Result<AppConfig, _> = toml::from_str("[serverz]\nport = 3000\n");
        assert!(result.is_err());
    }

    // =========================================================================
    // Validation tests
    // =========================================================================

    #[test]
    fn validate_default_config_passes() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn validate_quality_out_of_range() {
        let mut config = AppConfig::default();
        config.editor.download_quality = 101;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
        config.editor.download_quality = 90;
        config.image.default_quality = 1.5;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validate_rejects_non_image_types() {
        let mut config = AppConfig::default();
        config.image.supported_types = vec!["text/plain".into()];
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("text/plain"));
    }

    #[test]
    fn load_config_validates_after_env() {
        let result = load_config(None, env(&[("MAX_IMAGE_SIZE", "0")]));
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    // =========================================================================
    // stock_config_toml tests
    // =========================================================================

    #[test]
    fn stock_config_toml_roundtrips_to_defaults() {
        let config: AppConfig = toml::from_str(stock_config_toml()).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn stock_defaults_value_has_all_sections() {
        let val = stock_defaults_value().unwrap();
        for section in ["app", "server", "features", "image", "api", "editor"] {
            assert!(val.get(section).is_some(), "missing [{section}]");
        }
    }
}
