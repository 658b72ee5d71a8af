//! Report generation (CSV, XLSX and JSON outputs)

use anyhow::{Context, Result};
use csv::Writer;
use rust_xlsxwriter::Workbook;
use std::borrow::Cow;
use std::path::{Path, PathBuf};

use lineitem_core::{LineItemPerformanceRow, LineItemReport, LookupEntry, ReportSummary, SourceRevenue};

use crate::constants;

/// Performance table columns, in export order
pub const PERFORMANCE_HEADERS: [&str; 14] = [
    "Advertiser Name",
    "Insertion Order ID",
    "Insertion Order Name",
    "Package ID",
    "Package Name",
    "LINEITEMID",
    "NXN Line Item Name",
    "Unique Transaction Count",
    "Total Transaction Amount",
    "NXN Impressions",
    "NXN Spend",
    "Influenced ROAS (Not Deduplicated)",
    "Transaction IDs",
    "Match Status",
];

pub const UNMATCHED_LOOKUP_HEADERS: [&str; 9] = [
    "Advertiser Name",
    "Insertion Order ID",
    "Insertion Order Name",
    "Package ID",
    "Package Name",
    "LINEITEMID",
    "NXN Line Item Name",
    "NXN Impressions",
    "NXN Spend",
];

/// A single exported cell. Numbers stay numeric in workbooks.
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    Text(Option<String>),
    Number(Option<f64>),
}

impl Field {
    fn text(value: &Option<String>) -> Self {
        Field::Text(value.clone())
    }

    /// Rendering used in CSV files. Absent values are empty.
    pub fn to_csv(&self) -> String {
        match self {
            Field::Text(value) => value.clone().unwrap_or_default(),
            Field::Number(value) => value.map(|n| n.to_string()).unwrap_or_default(),
        }
    }
}

/// One exported table: a sheet in the workbook, a file in the CSV output
#[derive(Debug, Clone)]
pub struct ExportTable {
    pub sheet_name: &'static str,
    pub file_name: &'static str,
    pub headers: Vec<&'static str>,
    pub rows: Vec<Vec<Field>>,
}

/// Build the four report tables. `performance` is the (possibly filtered and
/// sorted) view to export; the summary always covers the whole report.
pub fn report_tables(report: &LineItemReport, performance: &[&LineItemPerformanceRow]) -> Vec<ExportTable> {
    vec![
        ExportTable {
            sheet_name: constants::PERFORMANCE_SHEET,
            file_name: constants::PERFORMANCE_FILENAME,
            headers: PERFORMANCE_HEADERS.to_vec(),
            rows: performance.iter().map(|row| performance_record(row)).collect(),
        },
        ExportTable {
            sheet_name: constants::UNMATCHED_LOOKUP_SHEET,
            file_name: constants::UNMATCHED_LOOKUP_FILENAME,
            headers: UNMATCHED_LOOKUP_HEADERS.to_vec(),
            rows: report.unmatched_lookup.iter().map(unmatched_record).collect(),
        },
        ExportTable {
            sheet_name: constants::SUMMARY_SHEET,
            file_name: constants::SUMMARY_FILENAME,
            headers: vec!["Metric", "Value"],
            rows: summary_records(report),
        },
        ExportTable {
            sheet_name: constants::REVENUE_BY_SOURCE_SHEET,
            file_name: constants::REVENUE_BY_SOURCE_FILENAME,
            headers: vec!["Source File Name", "Total Transaction Amount"],
            rows: report.revenue_by_source.iter().map(revenue_record).collect(),
        },
    ]
}

fn performance_record(row: &LineItemPerformanceRow) -> Vec<Field> {
    let lookup = &row.lookup;
    vec![
        Field::text(&lookup.advertiser_name),
        Field::text(&lookup.insertion_order_id),
        Field::text(&lookup.insertion_order_name),
        Field::text(&lookup.package_id),
        Field::text(&lookup.package_name),
        Field::Text(Some(row.line_item_id.clone())),
        Field::text(&lookup.line_item_name),
        Field::Number(Some(row.unique_transaction_count as f64)),
        Field::Number(Some(row.total_transaction_amount)),
        Field::Number(lookup.impressions),
        Field::Number(lookup.spend),
        Field::Number(row.influenced_roas),
        Field::Text(Some(row.transaction_ids.clone())),
        Field::Text(Some(row.match_status.to_string())),
    ]
}

fn unmatched_record(entry: &LookupEntry) -> Vec<Field> {
    vec![
        Field::text(&entry.advertiser_name),
        Field::text(&entry.insertion_order_id),
        Field::text(&entry.insertion_order_name),
        Field::text(&entry.package_id),
        Field::text(&entry.package_name),
        Field::Text(Some(entry.line_item_id.clone())),
        Field::text(&entry.line_item_name),
        Field::Number(Some(entry.impressions)),
        Field::Number(Some(entry.advertiser_invoice)),
    ]
}

/// Summary metrics. The three spend parts add up to the lookup total.
fn summary_records(report: &LineItemReport) -> Vec<Vec<Field>> {
    let summary = &report.summary;
    let metric = |name: &str, value: Option<f64>| vec![Field::Text(Some(name.to_string())), Field::Number(value)];
    vec![
        metric("Total Line Items", Some(summary.total_line_items as f64)),
        metric("Matched Line Items", Some(summary.matched_line_items as f64)),
        metric("Unmatched Line Items", Some(summary.unmatched_line_items as f64)),
        metric("Total Transactions", Some(summary.total_transactions as f64)),
        metric("Total Revenue", Some(summary.total_revenue)),
        metric("Total NXN Spend (Matched)", Some(summary.total_spend)),
        metric("NXN Spend (No Match Found)", Some(report.unnamed_lookup_spend())),
        metric("Unmatched Lookup Spend", Some(report.unmatched_lookup_spend())),
        metric("Total NXN Spend (Lookup)", Some(summary.total_lookup_spend)),
        metric("Overall ROAS", summary.overall_roas),
    ]
}

fn revenue_record(source: &SourceRevenue) -> Vec<Field> {
    vec![
        Field::Text(Some(source.source_file_name.clone())),
        Field::Number(Some(source.total_transaction_amount)),
    ]
}

/// Write one CSV file per table into `output_dir`
pub fn write_csv_reports(output_dir: &Path, tables: &[ExportTable]) -> Result<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(tables.len());

    for table in tables {
        let path = output_dir.join(table.file_name);
        let mut wtr =
            Writer::from_path(&path).with_context(|| format!("Failed to create {}", path.display()))?;

        wtr.write_record(&table.headers)?;
        for row in &table.rows {
            wtr.write_record(row.iter().map(Field::to_csv))?;
        }

        wtr.flush()?;
        println!("  Generated: {}", path.display());
        written.push(path);
    }

    Ok(written)
}

/// Write every table as a sheet of a single workbook
pub fn write_workbook(path: &Path, tables: &[ExportTable]) -> Result<()> {
    let mut workbook = Workbook::new();

    for table in tables {
        let sheet = workbook
            .add_worksheet()
            .set_name(table.sheet_name)
            .with_context(|| format!("Failed to create sheet '{}'", table.sheet_name))?;

        for (col, header) in table.headers.iter().enumerate() {
            sheet.write_string(0, col as u16, *header)?;
        }

        for (row_idx, row) in table.rows.iter().enumerate() {
            let excel_row = row_idx as u32 + 1;
            for (col, field) in row.iter().enumerate() {
                let col = col as u16;
                match field {
                    Field::Text(Some(text)) => {
                        let cell = fit_cell_text(text, constants::EXCEL_MAX_CELL_CHARS);
                        if matches!(cell, Cow::Owned(_)) {
                            tracing::warn!(
                                sheet = table.sheet_name,
                                row = excel_row,
                                column = table.headers.get(col as usize).copied().unwrap_or_default(),
                                chars = text.chars().count(),
                                "cell text truncated in workbook; the CSV export keeps the full value"
                            );
                        }
                        sheet.write_string(excel_row, col, cell.as_ref())?;
                    }
                    Field::Number(Some(n)) if n.is_finite() => {
                        sheet.write_number(excel_row, col, *n)?;
                    }
                    _ => {}
                }
            }
        }
    }

    workbook
        .save(path)
        .with_context(|| format!("Failed to save workbook: {}", path.display()))?;
    println!("  Generated: {}", path.display());

    Ok(())
}

/// Shorten `text` to at most `max_chars` characters for a workbook cell.
///
/// Comma-separated lists are cut at an item boundary and end with a
/// `…(+N more)` marker naming how many items were left out. Text that fits is
/// borrowed unchanged.
fn fit_cell_text(text: &str, max_chars: usize) -> Cow<'_, str> {
    if text.chars().count() <= max_chars {
        return Cow::Borrowed(text);
    }

    let items: Vec<&str> = text.split(LIST_SEPARATOR).collect();
    // Room for the separator plus the widest possible marker
    let marker_room = LIST_SEPARATOR.len() + more_marker(items.len()).chars().count();
    let budget = max_chars.saturating_sub(marker_room);

    let mut kept = String::new();
    let mut kept_chars = 0;
    let mut kept_items = 0;
    for item in &items {
        let sep = if kept_items == 0 { 0 } else { LIST_SEPARATOR.len() };
        let item_chars = item.chars().count();
        if kept_chars + sep + item_chars > budget {
            break;
        }
        if sep > 0 {
            kept.push_str(LIST_SEPARATOR);
        }
        kept.push_str(item);
        kept_chars += sep + item_chars;
        kept_items += 1;
    }

    if kept_items == 0 {
        // A single oversized value: cut it mid-text
        let head: String = text.chars().take(max_chars.saturating_sub(1)).collect();
        return Cow::Owned(format!("{}…", head));
    }

    kept.push_str(LIST_SEPARATOR);
    kept.push_str(&more_marker(items.len() - kept_items));
    Cow::Owned(kept)
}

const LIST_SEPARATOR: &str = ", ";

fn more_marker(omitted: usize) -> String {
    format!("…(+{} more)", omitted)
}

/// Write the summary statistics as pretty-printed JSON
pub fn write_summary_json(path: &Path, summary: &ReportSummary) -> Result<()> {
    let json = serde_json::to_string_pretty(summary)?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    println!("  Generated: {}", path.display());
    Ok(())
}
