use std::collections::HashSet;

use crate::lookup::LookupTable;
use crate::metrics::influenced_roas;
use crate::model::{LineItemAggregate, LineItemPerformanceRow, LookupAttributes, LookupEntry, MatchStatus};

/// Joined performance rows plus the lookup entries no transaction touched
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    pub performance: Vec<LineItemPerformanceRow>,
    pub unmatched_lookup: Vec<LookupEntry>,
}

/// Left-join aggregated transaction metrics onto the lookup table.
///
/// Every aggregated line item appears exactly once in `performance`. Lookup
/// line items absent from the aggregation appear exactly once in
/// `unmatched_lookup`.
pub fn reconcile(aggregated: &[LineItemAggregate], lookup: &LookupTable) -> Reconciliation {
    let performance: Vec<LineItemPerformanceRow> = aggregated.iter().map(|agg| join_row(agg, lookup)).collect();

    let seen: HashSet<&str> = aggregated.iter().map(|agg| agg.line_item_id.as_str()).collect();
    let unmatched_lookup: Vec<LookupEntry> = lookup
        .entries()
        .filter(|entry| !seen.contains(entry.line_item_id.as_str()))
        .cloned()
        .collect();

    let matched = performance
        .iter()
        .filter(|row| row.match_status == MatchStatus::Matched)
        .count();
    tracing::info!(
        line_items = performance.len(),
        matched,
        unmatched_lookup = unmatched_lookup.len(),
        "reconciled transactions against lookup"
    );

    Reconciliation {
        performance,
        unmatched_lookup,
    }
}

fn join_row(agg: &LineItemAggregate, lookup: &LookupTable) -> LineItemPerformanceRow {
    let attributes = lookup.get(&agg.line_item_id).map(LookupAttributes::from).unwrap_or_default();

    let match_status = if attributes.line_item_name.is_some() {
        MatchStatus::Matched
    } else {
        MatchStatus::NoMatchFound
    };

    LineItemPerformanceRow {
        line_item_id: agg.line_item_id.clone(),
        unique_transaction_count: agg.unique_transaction_count,
        transaction_ids: agg.transaction_ids.clone(),
        total_transaction_amount: agg.total_transaction_amount,
        influenced_roas: influenced_roas(agg.total_transaction_amount, attributes.spend),
        lookup: attributes,
        match_status,
    }
}
