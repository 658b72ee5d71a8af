use serde::Serialize;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// One row of the transaction table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    pub transaction_id: String,
    pub transaction_total: Option<f64>,
    /// Serialized JSON array of impression records
    pub impressions: Option<String>,
    pub source_file_name: Option<String>,
}

/// One logical NXN lookup entry after duplicate rows are collapsed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LookupEntry {
    pub line_item_id: String,
    pub advertiser_name: Option<String>,
    pub insertion_order_id: Option<String>,
    pub insertion_order_name: Option<String>,
    pub package_id: Option<String>,
    pub package_name: Option<String>,
    pub line_item_name: Option<String>,
    pub impressions: f64,
    /// Spend
    pub advertiser_invoice: f64,
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Transaction metrics for a single line item
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineItemAggregate {
    pub line_item_id: String,
    pub unique_transaction_count: usize,
    /// Sorted, de-duplicated, comma-joined transaction ids
    pub transaction_ids: String,
    pub total_transaction_amount: f64,
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MatchStatus {
    Matched,
    NoMatchFound,
}

impl std::fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchStatus::Matched => write!(f, "Matched"),
            MatchStatus::NoMatchFound => write!(f, "No Match Found"),
        }
    }
}

/// Lookup attributes carried onto a performance row by the join
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LookupAttributes {
    pub advertiser_name: Option<String>,
    pub insertion_order_id: Option<String>,
    pub insertion_order_name: Option<String>,
    pub package_id: Option<String>,
    pub package_name: Option<String>,
    pub line_item_name: Option<String>,
    pub impressions: Option<f64>,
    pub spend: Option<f64>,
}

impl From<&LookupEntry> for LookupAttributes {
    fn from(entry: &LookupEntry) -> Self {
        Self {
            advertiser_name: entry.advertiser_name.clone(),
            insertion_order_id: entry.insertion_order_id.clone(),
            insertion_order_name: entry.insertion_order_name.clone(),
            package_id: entry.package_id.clone(),
            package_name: entry.package_name.clone(),
            line_item_name: entry.line_item_name.clone(),
            impressions: Some(entry.impressions),
            spend: Some(entry.advertiser_invoice),
        }
    }
}

/// One row of the line item performance report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineItemPerformanceRow {
    pub line_item_id: String,
    pub unique_transaction_count: usize,
    pub transaction_ids: String,
    pub total_transaction_amount: f64,
    #[serde(flatten)]
    pub lookup: LookupAttributes,
    /// Influenced ROAS (not deduplicated)
    pub influenced_roas: Option<f64>,
    pub match_status: MatchStatus,
}

/// Whole-report statistics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSummary {
    pub total_line_items: usize,
    pub matched_line_items: usize,
    pub unmatched_line_items: usize,
    /// Sum of per-line-item transaction counts. Transactions shared across
    /// line items are counted once per line item.
    pub total_transactions: usize,
    pub total_revenue: f64,
    /// Spend of matched line items only
    pub total_spend: f64,
    /// Spend across the whole de-duplicated lookup table
    pub total_lookup_spend: f64,
    pub overall_roas: Option<f64>,
}

/// Transaction revenue attributed to one uploaded file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceRevenue {
    pub source_file_name: String,
    pub total_transaction_amount: f64,
}

/// Everything produced by one report run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineItemReport {
    pub performance: Vec<LineItemPerformanceRow>,
    pub unmatched_lookup: Vec<LookupEntry>,
    pub summary: ReportSummary,
    pub revenue_by_source: Vec<SourceRevenue>,
}

impl LineItemReport {
    /// Spend sitting on lookup line items that no transaction touched
    pub fn unmatched_lookup_spend(&self) -> f64 {
        self.unmatched_lookup.iter().map(|e| e.advertiser_invoice).sum()
    }

    /// Spend on lookup entries joined by a transaction but lacking a line
    /// item name. Such rows are "No Match Found" yet their spend is in the
    /// lookup total.
    pub fn unnamed_lookup_spend(&self) -> f64 {
        self.performance
            .iter()
            .filter(|row| row.match_status == MatchStatus::NoMatchFound)
            .filter_map(|row| row.lookup.spend)
            .sum()
    }
}
