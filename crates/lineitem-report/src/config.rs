//! Configuration for the line item performance report

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use lineitem_core::DEFAULT_LINE_ITEM_FIELD;

use crate::constants;

// =============================================================================
// File-based Configuration (report.toml)
// =============================================================================

/// Configuration loaded from report.toml. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub extraction: ExtractionConfig,
    pub loader: LoaderConfig,
    pub output: OutputConfig,
}

/// Impression payload parsing
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Field holding the line item id inside each impression record
    pub line_item_field: String,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            line_item_field: DEFAULT_LINE_ITEM_FIELD.to_string(),
        }
    }
}

/// Workbook sheet selection
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    pub transaction_sheet: String,
    pub lookup_sheets: Vec<String>,
    /// Zero-based row holding the lookup header in workbooks
    pub lookup_header_row: usize,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            transaction_sheet: constants::TRANSACTION_SHEET.to_string(),
            lookup_sheets: constants::LOOKUP_SHEETS.iter().map(|s| s.to_string()).collect(),
            lookup_header_row: constants::LOOKUP_HEADER_ROW,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub top_n: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            top_n: constants::DEFAULT_TOP_N,
        }
    }
}

impl FileConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Load the config file if it exists, otherwise fall back to defaults
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        Self::load(path)
    }
}
