//! CSV and Excel loading for transaction and lookup files

use anyhow::{Context, Result};
use calamine::{open_workbook_auto, Data, Range, Reader};
use std::path::Path;

use lineitem_core::transactions::SOURCE_FILE_COLUMN;
use lineitem_core::{dedupe_transactions, transactions_from_table, CellValue, LookupTable, RawTable, TableKind, Transaction};

use crate::config::LoaderConfig;

/// Largest float that still converts to an integer without losing digits
const MAX_EXACT_INT: f64 = 9_007_199_254_740_992.0;

/// Load a CSV or Excel file into a raw table
pub fn load_table(path: &Path, kind: TableKind, config: &LoaderConfig) -> Result<RawTable> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    let table = match extension.as_str() {
        "csv" => load_csv(path)?,
        "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => load_workbook(path, kind, config)?,
        _ => anyhow::bail!(
            "Unsupported file format: {}. Please upload CSV or Excel files.",
            path.display()
        ),
    };

    tracing::debug!(
        path = %path.display(),
        rows = table.len(),
        columns = table.headers().len(),
        "loaded {} table",
        kind
    );
    Ok(table)
}

/// Load, tag and de-duplicate transaction files.
///
/// A file that fails to load is skipped with a warning. The batch fails only
/// when no file loads at all.
pub fn load_transactions(paths: &[impl AsRef<Path>], config: &LoaderConfig) -> Result<Vec<Transaction>> {
    let mut batches = Vec::with_capacity(paths.len());

    for path in paths {
        let path = path.as_ref();
        match load_transaction_file(path, config) {
            Ok(transactions) => {
                println!("  Loaded {} transactions from {}", transactions.len(), path.display());
                batches.push(transactions);
            }
            Err(err) => {
                let error = format!("{err:#}");
                tracing::warn!(path = %path.display(), %error, "skipping transaction file");
            }
        }
    }

    if batches.is_empty() {
        anyhow::bail!("No transaction files could be loaded successfully");
    }

    Ok(dedupe_transactions(batches))
}

fn load_transaction_file(path: &Path, config: &LoaderConfig) -> Result<Vec<Transaction>> {
    let source = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let table = load_table(path, TableKind::Transactions, config)?
        .with_constant_column(SOURCE_FILE_COLUMN, CellValue::Text(source));

    transactions_from_table(&table).with_context(|| format!("Invalid transaction file: {}", path.display()))
}

/// Load and validate the NXN lookup file
pub fn load_lookup(path: &Path, config: &LoaderConfig) -> Result<LookupTable> {
    let table = load_table(path, TableKind::Lookup, config)?;
    LookupTable::from_table(&table).with_context(|| format!("Invalid lookup file: {}", path.display()))
}

// =============================================================================
// CSV
// =============================================================================

fn load_csv(path: &Path) -> Result<RawTable> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open CSV file: {}", path.display()))?;

    let headers: Vec<String> = reader
        .headers()
        .with_context(|| format!("Failed to read CSV header: {}", path.display()))?
        .iter()
        .map(String::from)
        .collect();

    let mut rows = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("Failed to read CSV row {} of {}", line + 2, path.display()))?;
        let row: Vec<CellValue> = record.iter().map(CellValue::from).collect();
        if !is_blank(&row) {
            rows.push(row);
        }
    }

    Ok(RawTable::new(headers, rows))
}

// =============================================================================
// Excel
// =============================================================================

fn load_workbook(path: &Path, kind: TableKind, config: &LoaderConfig) -> Result<RawTable> {
    let mut workbook =
        open_workbook_auto(path).with_context(|| format!("Failed to open Excel file: {}", path.display()))?;

    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
    let (sheet, header_row) = match kind {
        TableKind::Transactions => (
            select_transaction_sheet(&sheet_names, &config.transaction_sheet),
            0,
        ),
        TableKind::Lookup => (
            select_lookup_sheet(&sheet_names, &config.lookup_sheets),
            config.lookup_header_row,
        ),
    };
    let Some(sheet) = sheet else {
        anyhow::bail!("Excel file contains no sheets: {}", path.display());
    };
    tracing::debug!(sheet = %sheet, header_row, "reading {} sheet", kind);

    let range = workbook
        .worksheet_range(&sheet)
        .with_context(|| format!("Failed to read sheet '{}' in {}", sheet, path.display()))?;

    Ok(range_to_table(&range, header_row))
}

/// `DATA` sheet if present (any case), otherwise the first sheet
fn select_transaction_sheet(sheet_names: &[String], preferred: &str) -> Option<String> {
    sheet_names
        .iter()
        .find(|name| name.eq_ignore_ascii_case(preferred))
        .or_else(|| sheet_names.first())
        .cloned()
}

/// First candidate sheet that exists, otherwise the first sheet
fn select_lookup_sheet(sheet_names: &[String], candidates: &[String]) -> Option<String> {
    candidates
        .iter()
        .find(|candidate| sheet_names.contains(candidate))
        .or_else(|| sheet_names.first())
        .cloned()
}

/// Convert a worksheet range into a raw table with the header on `header_row`
/// (counted from the top of the sheet).
fn range_to_table(range: &Range<Data>, header_row: usize) -> RawTable {
    // Ranges begin at the first used row, not necessarily row 0
    let first_used_row = range.start().map(|(row, _)| row as usize).unwrap_or(0);
    let skip = header_row.saturating_sub(first_used_row);

    let mut rows = range.rows().skip(skip);
    let Some(header) = rows.next() else {
        return RawTable::default();
    };

    let headers: Vec<String> = header
        .iter()
        .map(|cell| cell_from_data(cell).as_text().unwrap_or_default())
        .collect();

    let rows: Vec<Vec<CellValue>> = rows
        .map(|row| row.iter().map(cell_from_data).collect::<Vec<_>>())
        .filter(|row| !is_blank(row))
        .collect();

    RawTable::new(headers, rows)
}

fn cell_from_data(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Empty,
        Data::String(s) => CellValue::from(s.as_str()),
        Data::Int(n) => CellValue::Int(*n),
        // Excel stores every number as a float; keep whole numbers integral
        // so ids never pass through float formatting
        Data::Float(f) if f.fract() == 0.0 && f.abs() < MAX_EXACT_INT => CellValue::Int(*f as i64),
        Data::Float(f) => CellValue::Float(*f),
        Data::Bool(b) => CellValue::Text(if *b { "TRUE" } else { "FALSE" }.to_string()),
        Data::DateTime(dt) => CellValue::Float(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::from(s.as_str()),
        Data::Error(e) => {
            tracing::debug!(error = ?e, "treating Excel error cell as empty");
            CellValue::Empty
        }
    }
}

fn is_blank(row: &[CellValue]) -> bool {
    row.iter().all(|cell| cell.as_text().is_none())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::Workbook;

    fn write_file(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_csv_headers_are_trimmed_and_blank_rows_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "tx.csv",
            "Transaction ID , Transaction Total,Impressions\nT1,$10.00,\"[{\"\"LINEITEMID\"\":\"\"L1\"\"}]\"\n,,\n",
        );

        let table = load_table(&path, TableKind::Transactions, &LoaderConfig::default()).unwrap();
        assert_eq!(table.headers(), ["Transaction ID", "Transaction Total", "Impressions"]);
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows()[0][2], CellValue::Text(r#"[{"LINEITEMID":"L1"}]"#.to_string()));
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "notes.txt", "hello");
        let err = load_table(&path, TableKind::Lookup, &LoaderConfig::default()).unwrap_err();
        assert!(err.to_string().contains("Unsupported file format"));
    }

    #[test]
    fn test_transactions_skip_bad_files_and_dedupe() {
        let dir = tempfile::tempdir().unwrap();
        let good = write_file(
            dir.path(),
            "jan.csv",
            "Transaction ID,Transaction Total,Impressions\nT1,10,[]\nT2,20,[]\n",
        );
        let overlap = write_file(
            dir.path(),
            "feb.csv",
            "Transaction ID,Transaction Total,Impressions\nT2,99,[]\nT3,30,[]\n",
        );
        let broken = write_file(dir.path(), "broken.csv", "Order,Total\n1,2\n");

        let transactions = load_transactions(&[good, broken, overlap], &LoaderConfig::default()).unwrap();
        let ids: Vec<&str> = transactions.iter().map(|t| t.transaction_id.as_str()).collect();
        assert_eq!(ids, vec!["T1", "T2", "T3"]);
        assert_eq!(transactions[1].source_file_name.as_deref(), Some("jan.csv"));
        assert_eq!(transactions[2].source_file_name.as_deref(), Some("feb.csv"));
    }

    #[test]
    fn test_no_loadable_transaction_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let broken = write_file(dir.path(), "broken.csv", "Order,Total\n1,2\n");
        let missing = dir.path().join("missing.csv");

        let err = load_transactions(&[broken, missing], &LoaderConfig::default()).unwrap_err();
        assert_eq!(err.to_string(), "No transaction files could be loaded successfully");
    }

    #[test]
    fn test_lookup_workbook_sheet_and_header_row() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lookup.xlsx");

        let mut workbook = Workbook::new();
        let notes = workbook.add_worksheet();
        notes.set_name("Notes").unwrap();
        notes.write_string(0, 0, "ignore me").unwrap();

        let sheet = workbook.add_worksheet();
        sheet.set_name("Programmatic").unwrap();
        sheet.write_string(0, 0, "Delivery lookup export").unwrap();
        for (col, name) in ["line_item_id", "line_item_name", "impressions", "advertiser_invoice", "packag_id"]
            .iter()
            .enumerate()
        {
            sheet.write_string(1, col as u16, *name).unwrap();
        }
        sheet.write_number(2, 0, 123456789012345.0).unwrap();
        sheet.write_string(2, 1, "Big").unwrap();
        sheet.write_number(2, 2, 1000.0).unwrap();
        sheet.write_number(2, 3, 12.5).unwrap();
        sheet.write_string(2, 4, "PKG-1").unwrap();
        workbook.save(&path).unwrap();

        let lookup = load_lookup(&path, &LoaderConfig::default()).unwrap();
        assert_eq!(lookup.len(), 1);

        let entry = lookup.get("123456789012345").unwrap();
        assert_eq!(entry.line_item_name.as_deref(), Some("Big"));
        assert_eq!(entry.advertiser_invoice, 12.5);
        assert_eq!(entry.package_id.as_deref(), Some("PKG-1"));
    }

    #[test]
    fn test_lookup_missing_column_message() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "lookup.csv",
            "line_item_id,line_item_name,impressions\n1,One,10\n",
        );

        let err = load_lookup(&path, &LoaderConfig::default()).unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("missing required columns: advertiser_invoice"));
        assert!(message.contains("Available columns: line_item_id, line_item_name, impressions"));
    }

    #[test]
    fn test_sheet_selection() {
        let names = vec!["Summary".to_string(), "data".to_string()];
        assert_eq!(select_transaction_sheet(&names, "DATA").as_deref(), Some("data"));
        assert_eq!(
            select_transaction_sheet(&["Only".to_string()], "DATA").as_deref(),
            Some("Only")
        );

        let candidates: Vec<String> = crate::constants::LOOKUP_SHEETS.iter().map(|s| s.to_string()).collect();
        let names = vec![
            "Programmatic".to_string(),
            "NXN LINE ITEM ID DELIVERY LOOKU".to_string(),
        ];
        assert_eq!(
            select_lookup_sheet(&names, &candidates).as_deref(),
            Some("NXN LINE ITEM ID DELIVERY LOOKU")
        );
        assert_eq!(select_lookup_sheet(&[], &candidates), None);
    }
}
