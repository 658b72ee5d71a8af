//! Error types for input validation and payload parsing

use std::fmt;

/// Which input table a validation error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    Transactions,
    Lookup,
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableKind::Transactions => write!(f, "transaction"),
            TableKind::Lookup => write!(f, "NXN lookup"),
        }
    }
}

/// Hard input validation failure. Stops the run before any output is produced.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error(
        "{table} table is missing required columns: {}. Available columns: {}",
        .missing.join(", "),
        .available.join(", ")
    )]
    MissingColumns {
        table: TableKind,
        missing: Vec<String>,
        available: Vec<String>,
    },
}

/// Why an impressions payload produced no line items
#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    #[error("malformed impressions payload: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("impressions payload is a JSON {found}, expected an array")]
    NotAnArray { found: &'static str },
}
