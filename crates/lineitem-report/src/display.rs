//! Console output: summary block and tables

use tabled::settings::Style;
use tabled::{Table, Tabled};

use lineitem_core::{LineItemPerformanceRow, LineItemReport, LookupTable, SourceRevenue};

use crate::ranking::{RankBy, RankedLineItem, ViewTotals};

/// Longest line item name shown in console tables
const MAX_NAME_WIDTH: usize = 40;

#[derive(Tabled)]
struct PerformanceLine {
    #[tabled(rename = "LINEITEMID")]
    line_item_id: String,
    #[tabled(rename = "Line Item Name")]
    name: String,
    #[tabled(rename = "Insertion Order")]
    insertion_order: String,
    #[tabled(rename = "Txns")]
    transactions: String,
    #[tabled(rename = "Amount")]
    amount: String,
    #[tabled(rename = "Impressions")]
    impressions: String,
    #[tabled(rename = "Spend")]
    spend: String,
    #[tabled(rename = "ROAS")]
    roas: String,
    #[tabled(rename = "Status")]
    status: String,
}

#[derive(Tabled)]
struct RankedLine {
    #[tabled(rename = "#")]
    rank: usize,
    #[tabled(rename = "LINEITEMID")]
    line_item_id: String,
    #[tabled(rename = "Line Item Name")]
    name: String,
    #[tabled(rename = "Amount")]
    amount: String,
    #[tabled(rename = "ROAS")]
    roas: String,
    #[tabled(rename = "Score")]
    score: String,
}

#[derive(Tabled)]
struct SourceLine {
    #[tabled(rename = "Source File")]
    source: String,
    #[tabled(rename = "Revenue")]
    revenue: String,
}

/// Print the report summary to console
pub fn print_summary(report: &LineItemReport) {
    let summary = &report.summary;

    println!("\n============================================================");
    println!("              LINE ITEM PERFORMANCE SUMMARY");
    println!("============================================================\n");

    println!("LINE ITEMS:");
    println!("  Total:                {:>12}", summary.total_line_items);
    println!("  Matched:              {:>12}", summary.matched_line_items);
    println!("  No Match Found:       {:>12}", summary.unmatched_line_items);
    println!("  Lookup only:          {:>12}", report.unmatched_lookup.len());

    println!("\nTRANSACTIONS:");
    println!("  Attributed:           {:>12}", summary.total_transactions);
    println!("  Revenue:              {:>12}", money(summary.total_revenue));

    println!("\nNXN SPEND:");
    println!("  Matched Line Items:   {:>12}", money(summary.total_spend));
    println!("  No Match Found:       {:>12}", money(report.unnamed_lookup_spend()));
    println!("  Lookup only:          {:>12}", money(report.unmatched_lookup_spend()));
    println!("  ─────────────────────────────────────────────");
    println!("  Total Lookup Spend:   {:>12}", money(summary.total_lookup_spend));

    println!("\nPERFORMANCE:");
    println!("  Overall ROAS:         {:>12}", roas(summary.overall_roas));
    println!("  (transactions shared by several line items count once per line item)");

    println!("============================================================");
}

/// Print a filtered performance view with a totals row
pub fn print_performance(rows: &[&LineItemPerformanceRow], totals: &ViewTotals) {
    if rows.is_empty() {
        println!("No line items match the current filters.");
        return;
    }

    let mut lines: Vec<PerformanceLine> = rows
        .iter()
        .map(|row| PerformanceLine {
            line_item_id: row.line_item_id.clone(),
            name: truncate(row.lookup.line_item_name.as_deref().unwrap_or("-"), MAX_NAME_WIDTH),
            insertion_order: row.lookup.insertion_order_name.clone().unwrap_or_else(|| "-".to_string()),
            transactions: row.unique_transaction_count.to_string(),
            amount: money(row.total_transaction_amount),
            impressions: row.lookup.impressions.map(count).unwrap_or_else(|| "-".to_string()),
            spend: row.lookup.spend.map(money).unwrap_or_else(|| "-".to_string()),
            roas: roas(row.influenced_roas),
            status: row.match_status.to_string(),
        })
        .collect();

    lines.push(PerformanceLine {
        line_item_id: "TOTAL".to_string(),
        name: format!("{} line item(s)", totals.line_items),
        insertion_order: String::new(),
        transactions: totals.transactions.to_string(),
        amount: money(totals.amount),
        impressions: count(totals.impressions),
        spend: money(totals.spend),
        roas: roas(totals.roas),
        status: String::new(),
    });

    println!("{}", Table::new(lines).with(Style::rounded()));
}

pub fn print_revenue_by_source(sources: &[SourceRevenue]) {
    if sources.is_empty() {
        return;
    }

    println!("\nREVENUE BY SOURCE FILE:");
    println!("{}", Table::new(source_lines(sources)).with(Style::rounded()));
}

/// One line per source file plus a closing TOTAL line
fn source_lines(sources: &[SourceRevenue]) -> Vec<SourceLine> {
    let mut lines: Vec<SourceLine> = sources
        .iter()
        .map(|s| SourceLine {
            source: s.source_file_name.clone(),
            revenue: money(s.total_transaction_amount),
        })
        .collect();

    lines.push(SourceLine {
        source: "TOTAL".to_string(),
        revenue: money(sources.iter().map(|s| s.total_transaction_amount).sum()),
    });
    lines
}

pub fn print_ranking(by: RankBy, ranked: &[RankedLineItem]) {
    println!("\nTOP LINE ITEMS BY {}", by.to_string().to_uppercase());

    if ranked.is_empty() {
        println!("  No line items qualify for this ranking.");
        return;
    }

    let lines = ranked.iter().map(|item| RankedLine {
        rank: item.rank,
        line_item_id: item.row.line_item_id.clone(),
        name: truncate(item.row.lookup.line_item_name.as_deref().unwrap_or("-"), MAX_NAME_WIDTH),
        amount: money(item.row.total_transaction_amount),
        roas: roas(item.row.influenced_roas),
        score: match by {
            RankBy::Combined => format!("{:.3}", item.score),
            RankBy::Revenue | RankBy::Roas => String::new(),
        },
    });

    println!("{}", Table::new(lines).with(Style::rounded()));
}

/// Print the result of validating a lookup file
pub fn print_lookup_check(lookup: &LookupTable) {
    let named = lookup.entries().filter(|e| e.line_item_name.is_some()).count();

    println!("Lookup file is valid.\n");
    println!("  Rows read:            {:>12}", lookup.raw_rows());
    println!("  Rows without id:      {:>12}", lookup.dropped_rows());
    println!(
        "  Duplicate rows:       {:>12}",
        lookup.raw_rows() - lookup.dropped_rows() - lookup.len()
    );
    println!("  Line items:           {:>12}", lookup.len());
    println!("  With line item name:  {:>12}", named);
    println!("  Total spend:          {:>12}", money(lookup.total_spend()));
}

fn money(value: f64) -> String {
    format!("${:.2}", normalize_zero(value))
}

fn count(value: f64) -> String {
    format!("{:.0}", normalize_zero(value))
}

fn roas(value: Option<f64>) -> String {
    value
        .map(|r| format!("{:.2}x", normalize_zero(r)))
        .unwrap_or_else(|| "-".to_string())
}

/// Truncate string for display
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{}...", head)
    }
}

/// Normalize -0.0 to 0.0 for cleaner display
fn normalize_zero(val: f64) -> f64 {
    if val == 0.0 { 0.0 } else { val }
}
