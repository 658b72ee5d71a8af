//! Transaction table mapping and batch de-duplication

use std::collections::HashSet;

use crate::error::{ReportError, TableKind};
use crate::model::Transaction;
use crate::table::{cell, RawTable};

pub const TRANSACTION_ID_COLUMN: &str = "Transaction ID";
pub const TRANSACTION_TOTAL_COLUMN: &str = "Transaction Total";
pub const IMPRESSIONS_COLUMN: &str = "Impressions";
pub const SOURCE_FILE_COLUMN: &str = "Source File Name";

const REQUIRED_COLUMNS: [&str; 3] = [TRANSACTION_ID_COLUMN, TRANSACTION_TOTAL_COLUMN, IMPRESSIONS_COLUMN];

/// Map a raw transaction table to typed transactions.
///
/// Rows without a transaction id are skipped. `Source File Name` is optional.
pub fn transactions_from_table(table: &RawTable) -> Result<Vec<Transaction>, ReportError> {
    let (Some(id_col), Some(total_col), Some(impressions_col)) = (
        table.column_index(TRANSACTION_ID_COLUMN),
        table.column_index(TRANSACTION_TOTAL_COLUMN),
        table.column_index(IMPRESSIONS_COLUMN),
    ) else {
        let missing = REQUIRED_COLUMNS
            .iter()
            .filter(|col| table.column_index(col).is_none())
            .map(|col| col.to_string())
            .collect();
        return Err(ReportError::MissingColumns {
            table: TableKind::Transactions,
            missing,
            available: table.headers().to_vec(),
        });
    };
    let source_col = table.column_index(SOURCE_FILE_COLUMN);

    let mut transactions = Vec::with_capacity(table.len());
    let mut skipped = 0usize;

    for row in table.rows() {
        let Some(transaction_id) = cell(row, id_col).as_text() else {
            skipped += 1;
            continue;
        };

        transactions.push(Transaction {
            transaction_id,
            transaction_total: cell(row, total_col).as_number(),
            impressions: cell(row, impressions_col).as_text(),
            source_file_name: source_col.and_then(|idx| cell(row, idx).as_text()),
        });
    }

    if skipped > 0 {
        tracing::warn!(skipped, "skipped transaction rows without a Transaction ID");
    }

    Ok(transactions)
}

/// Concatenate batches and keep the first occurrence of each transaction id
pub fn dedupe_transactions<I>(batches: I) -> Vec<Transaction>
where
    I: IntoIterator<Item = Vec<Transaction>>,
{
    let mut seen: HashSet<String> = HashSet::new();
    let mut unique = Vec::new();
    let mut duplicates = 0usize;

    for transaction in batches.into_iter().flatten() {
        if seen.insert(transaction.transaction_id.clone()) {
            unique.push(transaction);
        } else {
            duplicates += 1;
        }
    }

    if duplicates > 0 {
        tracing::info!(duplicates, kept = unique.len(), "dropped duplicate transaction ids");
    }

    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::CellValue;

    fn tx(id: &str, total: f64, source: &str) -> Transaction {
        Transaction {
            transaction_id: id.to_string(),
            transaction_total: Some(total),
            impressions: None,
            source_file_name: Some(source.to_string()),
        }
    }

    #[test]
    fn test_dedupe_first_occurrence_wins() {
        let a = vec![tx("T1", 10.0, "a.csv"), tx("T2", 20.0, "a.csv")];
        let b = vec![tx("T2", 99.0, "b.csv"), tx("T3", 30.0, "b.csv")];

        let unique = dedupe_transactions([a, b]);
        assert_eq!(unique.len(), 3);
        assert_eq!(unique[1].transaction_id, "T2");
        assert_eq!(unique[1].transaction_total, Some(20.0));
        assert_eq!(unique[1].source_file_name.as_deref(), Some("a.csv"));
    }

    #[test]
    fn test_from_table_maps_columns() {
        let table = RawTable::new(
            vec![
                "Impressions".into(),
                "Transaction ID".into(),
                "Transaction Total".into(),
                "Source File Name".into(),
            ],
            vec![
                vec![
                    CellValue::Text(r#"[{"LINEITEMID":"L1"}]"#.into()),
                    CellValue::Float(1001.0),
                    CellValue::Text("$12.50".into()),
                    CellValue::Text("jan.xlsx".into()),
                ],
                vec![CellValue::Empty, CellValue::Empty, CellValue::Float(5.0)],
                vec![CellValue::Empty, CellValue::Text("T-9".into())],
            ],
        );

        let transactions = transactions_from_table(&table).unwrap();
        assert_eq!(transactions.len(), 2);
        assert_eq!(transactions[0].transaction_id, "1001");
        assert_eq!(transactions[0].transaction_total, Some(12.5));
        assert_eq!(transactions[0].source_file_name.as_deref(), Some("jan.xlsx"));
        assert_eq!(transactions[1].transaction_id, "T-9");
        assert_eq!(transactions[1].transaction_total, None);
        assert_eq!(transactions[1].impressions, None);
    }

    #[test]
    fn test_from_table_requires_columns() {
        let table = RawTable::new(vec!["Transaction ID".into()], Vec::new());
        match transactions_from_table(&table) {
            Err(ReportError::MissingColumns { table, missing, .. }) => {
                assert_eq!(table, TableKind::Transactions);
                assert_eq!(missing, vec!["Transaction Total", "Impressions"]);
            }
            other => panic!("expected missing columns, got {other:?}"),
        }
    }
}
