//! Project configuration module.
//!
//! Handles loading, validating, and merging `slideset.toml`. Stock defaults
//! describe a standard Storybook project (`stories/slides/N.mdx`, a static
//! build's `index.json`), and a `slideset.toml` in the project root overrides
//! just the keys it names.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! slides_dir = "stories/slides"               # Where new slide files are created
//! component = "Slide"                         # Name of the content block element
//! extension = "mdx"                           # Slide file extension
//! index_path = "storybook-static/index.json"  # Flat page index read by link resolution
//!
//! [template]
//! title = "Slide {n}"                         # Title directive for new slides
//! imports = [
//!     'import { Meta } from "@storybook/addon-docs/blocks";',
//!     '',
//!     'import "../../src/base.css";',
//!     'import { Slide } from "../../src/components/Slide";',
//! ]
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Name of the config file looked up in the project root.
pub const CONFIG_FILENAME: &str = "slideset.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Project configuration loaded from `slideset.toml`.
///
/// All fields have defaults. User config files need only specify the values
/// they want to override.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeckConfig {
    /// Directory (relative to the project root) that holds numbered slides.
    pub slides_dir: String,
    /// Element name of the designated content block.
    pub component: String,
    /// File extension of slide files, without the dot.
    pub extension: String,
    /// Location of the host's flat page index, relative to the project root.
    pub index_path: String,
    /// Template used when a new slide file is created.
    pub template: TemplateConfig,
}

impl Default for DeckConfig {
    fn default() -> Self {
        Self {
            slides_dir: "stories/slides".to_string(),
            component: "Slide".to_string(),
            extension: "mdx".to_string(),
            index_path: "storybook-static/index.json".to_string(),
            template: TemplateConfig::default(),
        }
    }
}

impl DeckConfig {
    /// Validate config values are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let starts_upper = self
            .component
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_uppercase());
        if !starts_upper
            || !self
                .component
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
        {
            return Err(ConfigError::Validation(
                "component must be a capitalized JSX element name".into(),
            ));
        }
        if self.extension.is_empty() || self.extension.contains('.') {
            return Err(ConfigError::Validation(
                "extension must be non-empty and must not contain a dot".into(),
            ));
        }
        if self.slides_dir.trim_matches('/').is_empty() {
            return Err(ConfigError::Validation(
                "slides_dir must not be empty".into(),
            ));
        }
        if Path::new(&self.slides_dir).is_absolute() {
            return Err(ConfigError::Validation(
                "slides_dir must be relative to the project root".into(),
            ));
        }
        Ok(())
    }
}

/// New-slide template settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TemplateConfig {
    /// Title directive text; `{n}` is replaced by the slide number.
    pub title: String,
    /// ESM lines emitted at the top of every new slide file.
    pub imports: Vec<String>,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            title: "Slide {n}".to_string(),
            imports: vec![
                r#"import { Meta } from "@storybook/addon-docs/blocks";"#.to_string(),
                String::new(),
                r#"import "../../src/base.css";"#.to_string(),
                r#"import { Slide } from "../../src/components/Slide";"#.to_string(),
            ],
        }
    }
}

/// Stock defaults as a TOML value, the base layer every overlay merges onto.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(DeckConfig::default()).expect("default config must serialize")
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

/// Load `slideset.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(root: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = root.join(CONFIG_FILENAME);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<DeckConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: DeckConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `slideset.toml` in the project root.
pub fn load_config(root: &Path) -> Result<DeckConfig, ConfigError> {
    let overlay = load_raw_config(root)?;
    if overlay.is_some() {
        tracing::debug!(root = %root.display(), "loaded {CONFIG_FILENAME}");
    }
    resolve_config(stock_defaults_value(), overlay)
}

/// Returns a fully-commented stock `slideset.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# slideset configuration
# ======================
#
# Place this file in the Storybook project root. Every key is optional;
# omitted keys keep the values shown here.

# Directory holding the numbered slide files (1.mdx, 2.mdx, ...).
# New slides are always created here as {max + 1}.mdx.
slides_dir = "stories/slides"

# Name of the JSX element whose children are the slide's visible content.
# Only the first block-level occurrence in each file is read or written.
component = "Slide"

# Extension of slide files, without the dot.
extension = "mdx"

# Flat page index produced by the host (`storybook build` writes
# storybook-static/index.json). Used to resolve decks and prev/next links.
index_path = "storybook-static/index.json"

[template]
# Title directive for new slides. {n} becomes the slide number.
title = "Slide {n}"

# Lines written at the top of each new slide file. An empty string
# produces a blank line.
imports = [
    'import { Meta } from "@storybook/addon-docs/blocks";',
    '',
    'import "../../src/base.css";',
    'import { Slide } from "../../src/components/Slide";',
]
"##
}
