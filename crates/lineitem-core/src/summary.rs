//! Report-wide statistics and revenue by source file

use std::collections::HashMap;

use crate::lookup::LookupTable;
use crate::metrics::influenced_roas;
use crate::model::{LineItemPerformanceRow, MatchStatus, ReportSummary, SourceRevenue, Transaction};

/// Label for transactions that carry no source file tag
pub const UNKNOWN_SOURCE: &str = "Unknown";

/// Summarize the joined performance table.
///
/// `total_transactions` and `total_revenue` are not deduplicated: a
/// transaction attributed to three line items is counted three times.
pub fn summarize(performance: &[LineItemPerformanceRow], lookup: &LookupTable) -> ReportSummary {
    let matched: Vec<&LineItemPerformanceRow> = performance
        .iter()
        .filter(|row| row.match_status == MatchStatus::Matched)
        .collect();

    let total_revenue: f64 = performance.iter().map(|r| r.total_transaction_amount).sum();
    let total_spend: f64 = matched.iter().filter_map(|r| r.lookup.spend).sum();

    ReportSummary {
        total_line_items: performance.len(),
        matched_line_items: matched.len(),
        unmatched_line_items: performance.len() - matched.len(),
        total_transactions: performance.iter().map(|r| r.unique_transaction_count).sum(),
        total_revenue,
        total_spend,
        total_lookup_spend: lookup.total_spend(),
        overall_roas: influenced_roas(total_revenue, Some(total_spend)),
    }
}

/// Total transaction amount per source file, largest first
pub fn revenue_by_source(transactions: &[Transaction]) -> Vec<SourceRevenue> {
    let mut totals: HashMap<&str, f64> = HashMap::new();

    for transaction in transactions {
        let source = transaction.source_file_name.as_deref().unwrap_or(UNKNOWN_SOURCE);
        *totals.entry(source).or_insert(0.0) += transaction.transaction_total.unwrap_or(0.0);
    }

    let mut result: Vec<SourceRevenue> = totals
        .into_iter()
        .map(|(source, amount)| SourceRevenue {
            source_file_name: source.to_string(),
            total_transaction_amount: amount,
        })
        .collect();
    result.sort_by(|a, b| {
        b.total_transaction_amount
            .total_cmp(&a.total_transaction_amount)
            .then_with(|| a.source_file_name.cmp(&b.source_file_name))
    });
    result
}
