//! Line item performance reporting
//!
//! Attributes purchase transactions to the ad line items recorded in their
//! impressions payload, aggregates revenue per line item, and reconciles the
//! result against an NXN delivery lookup to report spend and influenced ROAS.
//!
//! The pipeline is pure: loaders produce [`RawTable`]s, and [`build_report`]
//! turns typed transactions plus a [`LookupTable`] into a [`LineItemReport`].

pub mod aggregate;
pub mod error;
pub mod impressions;
pub mod lookup;
pub mod metrics;
pub mod model;
pub mod reconcile;
pub mod summary;
pub mod table;
pub mod transactions;

pub use aggregate::aggregate;
pub use error::{PayloadError, ReportError, TableKind};
pub use impressions::{extract_line_item_ids, parse_impressions, DEFAULT_LINE_ITEM_FIELD};
pub use lookup::LookupTable;
pub use metrics::influenced_roas;
pub use model::{
    LineItemAggregate, LineItemPerformanceRow, LineItemReport, LookupAttributes, LookupEntry, MatchStatus,
    ReportSummary, SourceRevenue, Transaction,
};
pub use reconcile::{reconcile, Reconciliation};
pub use summary::{revenue_by_source, summarize};
pub use table::{CellValue, RawTable};
pub use transactions::{dedupe_transactions, transactions_from_table};

/// Run aggregation, reconciliation and summary over a de-duplicated batch.
///
/// Returns `None` when no transaction references any line item; there is
/// nothing to report in that case.
pub fn build_report(transactions: &[Transaction], lookup: &LookupTable, field: &str) -> Option<LineItemReport> {
    let aggregated = aggregate(transactions, field);
    if aggregated.is_empty() {
        tracing::warn!(
            transactions = transactions.len(),
            "no line items found in transaction impressions"
        );
        return None;
    }

    let Reconciliation {
        performance,
        unmatched_lookup,
    } = reconcile(&aggregated, lookup);
    let summary = summarize(&performance, lookup);

    Some(LineItemReport {
        performance,
        unmatched_lookup,
        summary,
        revenue_by_source: revenue_by_source(transactions),
    })
}
