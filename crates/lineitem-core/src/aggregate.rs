use std::collections::BTreeMap;

use crate::impressions::extract_line_item_ids;
use crate::model::{LineItemAggregate, Transaction};

#[derive(Default)]
struct LineItemAccumulator {
    transaction_ids: Vec<String>,
    total_amount: f64,
}

/// Explode each transaction into one pair per line item it touched, then
/// group the pairs by line item.
///
/// A transaction shared by several line items adds its full total to each of
/// them. Returns an empty vector when no transaction yields a line item.
pub fn aggregate(transactions: &[Transaction], field: &str) -> Vec<LineItemAggregate> {
    let mut groups: BTreeMap<String, LineItemAccumulator> = BTreeMap::new();
    let mut pairs = 0usize;

    for transaction in transactions {
        let line_item_ids = extract_line_item_ids(transaction.impressions.as_deref(), field);
        let amount = transaction.transaction_total.unwrap_or(0.0);

        for line_item_id in line_item_ids {
            let entry = groups.entry(line_item_id).or_default();
            entry.transaction_ids.push(transaction.transaction_id.clone());
            entry.total_amount += amount;
            pairs += 1;
        }
    }

    tracing::debug!(
        transactions = transactions.len(),
        pairs,
        line_items = groups.len(),
        "expanded transactions into line item pairs"
    );

    groups
        .into_iter()
        .map(|(line_item_id, acc)| {
            let unique_transaction_count = acc.transaction_ids.len();
            let mut ids = acc.transaction_ids;
            ids.sort();
            ids.dedup();

            LineItemAggregate {
                line_item_id,
                unique_transaction_count,
                transaction_ids: ids.join(", "),
                total_transaction_amount: acc.total_amount,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impressions::DEFAULT_LINE_ITEM_FIELD;

    fn tx(id: &str, total: Option<f64>, impressions: &str) -> Transaction {
        Transaction {
            transaction_id: id.to_string(),
            transaction_total: total,
            impressions: Some(impressions.to_string()),
            source_file_name: None,
        }
    }

    #[test]
    fn test_shared_transactions_count_once_per_line_item() {
        let transactions = vec![
            tx(
                "T1",
                Some(100.0),
                r#"[{"LINEITEMID":"L1"},{"LINEITEMID":"L2"},{"LINEITEMID":"L1"}]"#,
            ),
            tx("T2", Some(50.0), r#"[{"LINEITEMID":"L2"}]"#),
        ];

        let aggs = aggregate(&transactions, DEFAULT_LINE_ITEM_FIELD);
        assert_eq!(aggs.len(), 2);

        assert_eq!(aggs[0].line_item_id, "L1");
        assert_eq!(aggs[0].unique_transaction_count, 1);
        assert_eq!(aggs[0].total_transaction_amount, 100.0);
        assert_eq!(aggs[0].transaction_ids, "T1");

        assert_eq!(aggs[1].line_item_id, "L2");
        assert_eq!(aggs[1].unique_transaction_count, 2);
        assert_eq!(aggs[1].total_transaction_amount, 150.0);
        assert_eq!(aggs[1].transaction_ids, "T1, T2");
    }

    #[test]
    fn test_transaction_ids_sorted_as_strings() {
        let transactions = vec![
            tx("9", Some(1.0), r#"[{"LINEITEMID":"L"}]"#),
            tx("10", Some(1.0), r#"[{"LINEITEMID":"L"}]"#),
            tx("100", Some(1.0), r#"[{"LINEITEMID":"L"}]"#),
        ];
        let aggs = aggregate(&transactions, DEFAULT_LINE_ITEM_FIELD);
        assert_eq!(aggs[0].transaction_ids, "10, 100, 9");
    }

    #[test]
    fn test_missing_total_contributes_zero() {
        let transactions = vec![
            tx("T1", None, r#"[{"LINEITEMID":"L1"}]"#),
            tx("T2", Some(7.5), r#"[{"LINEITEMID":"L1"}]"#),
        ];
        let aggs = aggregate(&transactions, DEFAULT_LINE_ITEM_FIELD);
        assert_eq!(aggs[0].unique_transaction_count, 2);
        assert_eq!(aggs[0].total_transaction_amount, 7.5);
    }

    #[test]
    fn test_no_line_items_yields_empty() {
        let transactions = vec![tx("T1", Some(5.0), "[]"), tx("T2", Some(5.0), "{broken")];
        assert!(aggregate(&transactions, DEFAULT_LINE_ITEM_FIELD).is_empty());
        assert!(aggregate(&[], DEFAULT_LINE_ITEM_FIELD).is_empty());
    }

    #[test]
    fn test_bad_payload_does_not_stop_batch() {
        let transactions = vec![
            tx("T1", Some(5.0), "{broken"),
            tx("T2", Some(3.0), r#"[{"LINEITEMID":"L7"}]"#),
        ];
        let aggs = aggregate(&transactions, DEFAULT_LINE_ITEM_FIELD);
        assert_eq!(aggs.len(), 1);
        assert_eq!(aggs[0].transaction_ids, "T2");
    }
}
