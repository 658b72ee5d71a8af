//! Filtering, sorting, totals and top line item rankings over the performance table

use clap::ValueEnum;
use std::cmp::Ordering;

use lineitem_core::{influenced_roas, LineItemPerformanceRow};

use crate::constants::{COMBINED_REVENUE_WEIGHT, COMBINED_ROAS_WEIGHT};

/// Row filter applied to views, exports and rankings
#[derive(Debug, Clone, Default)]
pub struct ReportFilter {
    /// Keep only these insertion order names (empty keeps everything)
    pub insertion_orders: Vec<String>,
    /// Case-insensitive substring over ids, names and insertion order fields
    pub search: Option<String>,
}

impl ReportFilter {
    pub fn matches(&self, row: &LineItemPerformanceRow) -> bool {
        self.matches_insertion_order(row) && self.matches_search(row)
    }

    pub fn apply<'a>(&self, rows: &'a [LineItemPerformanceRow]) -> Vec<&'a LineItemPerformanceRow> {
        rows.iter().filter(|row| self.matches(row)).collect()
    }

    fn matches_insertion_order(&self, row: &LineItemPerformanceRow) -> bool {
        if self.insertion_orders.is_empty() {
            return true;
        }
        row.lookup
            .insertion_order_name
            .as_ref()
            .is_some_and(|name| self.insertion_orders.contains(name))
    }

    fn matches_search(&self, row: &LineItemPerformanceRow) -> bool {
        let Some(needle) = self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) else {
            return true;
        };
        let needle = needle.to_lowercase();
        let lookup = &row.lookup;

        std::iter::once(Some(&row.line_item_id))
            .chain([
                lookup.line_item_name.as_ref(),
                lookup.insertion_order_id.as_ref(),
                lookup.insertion_order_name.as_ref(),
                lookup.advertiser_name.as_ref(),
                lookup.package_id.as_ref(),
                lookup.package_name.as_ref(),
            ])
            .flatten()
            .any(|field| field.to_lowercase().contains(&needle))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortKey {
    LineItemId,
    Transactions,
    Amount,
    Impressions,
    Spend,
    Roas,
}

/// Sort a view in place. Rows with no value for the key always sort last.
pub fn sort_rows(rows: &mut [&LineItemPerformanceRow], key: SortKey, ascending: bool) {
    let directed = |ord: Ordering| if ascending { ord } else { ord.reverse() };

    rows.sort_by(|a, b| match key {
        SortKey::LineItemId => directed(a.line_item_id.cmp(&b.line_item_id)),
        SortKey::Transactions => directed(a.unique_transaction_count.cmp(&b.unique_transaction_count)),
        SortKey::Amount => directed(a.total_transaction_amount.total_cmp(&b.total_transaction_amount)),
        SortKey::Impressions => compare_optional(a.lookup.impressions, b.lookup.impressions, directed),
        SortKey::Spend => compare_optional(a.lookup.spend, b.lookup.spend, directed),
        SortKey::Roas => compare_optional(a.influenced_roas, b.influenced_roas, directed),
    });
}

fn compare_optional(a: Option<f64>, b: Option<f64>, directed: impl Fn(Ordering) -> Ordering) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => directed(a.total_cmp(&b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Totals row for a filtered view
#[derive(Debug, Clone, PartialEq)]
pub struct ViewTotals {
    pub line_items: usize,
    pub transactions: usize,
    pub amount: f64,
    pub impressions: f64,
    pub spend: f64,
    pub roas: Option<f64>,
}

pub fn totals(rows: &[&LineItemPerformanceRow]) -> ViewTotals {
    let amount: f64 = rows.iter().map(|r| r.total_transaction_amount).sum();
    let spend: f64 = rows.iter().filter_map(|r| r.lookup.spend).sum();

    ViewTotals {
        line_items: rows.len(),
        transactions: rows.iter().map(|r| r.unique_transaction_count).sum(),
        amount,
        impressions: rows.iter().filter_map(|r| r.lookup.impressions).sum(),
        spend,
        roas: influenced_roas(amount, Some(spend)),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RankBy {
    Revenue,
    Roas,
    Combined,
}

impl std::fmt::Display for RankBy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RankBy::Revenue => write!(f, "Revenue"),
            RankBy::Roas => write!(f, "ROAS"),
            RankBy::Combined => write!(f, "Combined (60% revenue, 40% ROAS)"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankedLineItem<'a> {
    pub rank: usize,
    pub row: &'a LineItemPerformanceRow,
    /// Ranking score: amount, ROAS or combined score depending on `RankBy`
    pub score: f64,
}

/// Rank line items, best first.
///
/// Scores are computed over all eligible rows; `filter` then narrows the
/// ranked list and `top` limits its length.
pub fn rank<'a>(
    rows: &'a [LineItemPerformanceRow],
    by: RankBy,
    filter: &ReportFilter,
    top: usize,
) -> Vec<RankedLineItem<'a>> {
    let mut scored: Vec<(&LineItemPerformanceRow, f64)> = match by {
        RankBy::Revenue => rows
            .iter()
            .filter(|r| r.total_transaction_amount > 0.0)
            .map(|r| (r, r.total_transaction_amount))
            .collect(),
        RankBy::Roas => rows
            .iter()
            .filter_map(|r| r.influenced_roas.filter(|roas| *roas > 0.0).map(|roas| (r, roas)))
            .collect(),
        RankBy::Combined => combined_scores(rows),
    };

    scored.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.line_item_id.cmp(&b.0.line_item_id)));

    scored
        .into_iter()
        .filter(|(row, _)| filter.matches(row))
        .take(top)
        .enumerate()
        .map(|(idx, (row, score))| RankedLineItem {
            rank: idx + 1,
            row,
            score,
        })
        .collect()
}

/// Weighted min-max score over rows with both positive revenue and positive ROAS
fn combined_scores(rows: &[LineItemPerformanceRow]) -> Vec<(&LineItemPerformanceRow, f64)> {
    let eligible: Vec<(&LineItemPerformanceRow, f64, f64)> = rows
        .iter()
        .filter(|r| r.total_transaction_amount > 0.0)
        .filter_map(|r| {
            r.influenced_roas
                .filter(|roas| *roas > 0.0)
                .map(|roas| (r, r.total_transaction_amount, roas))
        })
        .collect();

    if eligible.is_empty() {
        return Vec::new();
    }

    let revenue = MinMax::new(eligible.iter().map(|(_, amount, _)| *amount));
    let roas = MinMax::new(eligible.iter().map(|(_, _, roas)| *roas));

    eligible
        .into_iter()
        .map(|(row, amount, row_roas)| {
            let score =
                revenue.normalize(amount) * COMBINED_REVENUE_WEIGHT + roas.normalize(row_roas) * COMBINED_ROAS_WEIGHT;
            (row, score)
        })
        .collect()
}

/// Min-max normalization with the maximum floored at 1
struct MinMax {
    min: f64,
    range: f64,
}

impl MinMax {
    fn new(values: impl Iterator<Item = f64> + Clone) -> Self {
        let min = values.clone().fold(f64::INFINITY, f64::min);
        let max = values.fold(1.0, f64::max);
        Self { min, range: max - min }
    }

    fn normalize(&self, value: f64) -> f64 {
        if self.range > 0.0 {
            (value - self.min) / self.range
        } else {
            0.5
        }
    }
}
