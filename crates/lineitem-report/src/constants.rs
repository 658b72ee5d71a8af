//! Centralized constants for the line item performance report
//!
//! File names, sheet names and ranking weights live here so they are easy to
//! find and update.

// =============================================================================
// Paths
// =============================================================================

/// Default config file path (optional; defaults apply when absent)
pub const CONFIG_FILE: &str = "report.toml";

/// Default directory for generated reports
pub const DEFAULT_OUTPUT_DIR: &str = "./output";

// =============================================================================
// Output Files
// =============================================================================

pub const PERFORMANCE_FILENAME: &str = "line_item_performance.csv";
pub const UNMATCHED_LOOKUP_FILENAME: &str = "unmatched_lookup.csv";
pub const SUMMARY_FILENAME: &str = "summary.csv";
pub const REVENUE_BY_SOURCE_FILENAME: &str = "revenue_by_source.csv";
pub const SUMMARY_JSON_FILENAME: &str = "summary.json";
pub const WORKBOOK_FILENAME: &str = "line_item_report.xlsx";

// =============================================================================
// Workbook Sheets
// =============================================================================

/// Transaction exports keep their rows on this sheet (matched case-insensitively)
pub const TRANSACTION_SHEET: &str = "DATA";

/// Lookup sheet candidates, in priority order. The second is the first name
/// truncated to Excel's 31-character sheet name limit.
pub const LOOKUP_SHEETS: [&str; 3] = [
    "NXN LINE ITEM ID DELIVERY LOOKUP",
    "NXN LINE ITEM ID DELIVERY LOOKU",
    "Programmatic",
];

/// Lookup sheets carry a title row above the header
pub const LOOKUP_HEADER_ROW: usize = 1;

/// Sheet names used when exporting to a workbook
pub const PERFORMANCE_SHEET: &str = "Line Item Performance";
pub const UNMATCHED_LOOKUP_SHEET: &str = "Unmatched NXN Lookup";
pub const SUMMARY_SHEET: &str = "Summary";
pub const REVENUE_BY_SOURCE_SHEET: &str = "Revenue by Source";

/// Excel rejects cell text longer than this many characters
pub const EXCEL_MAX_CELL_CHARS: usize = 32_767;

// =============================================================================
// Ranking
// =============================================================================

/// Default number of line items shown per ranking
pub const DEFAULT_TOP_N: usize = 10;

/// Weight of normalized revenue in the combined score
pub const COMBINED_REVENUE_WEIGHT: f64 = 0.6;

/// Weight of normalized ROAS in the combined score
pub const COMBINED_ROAS_WEIGHT: f64 = 0.4;
