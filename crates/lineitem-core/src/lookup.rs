//! NXN lookup table: column resolution, validation and de-duplication
//!
//! Raw lookup exports can carry several rows for the same line item (one per
//! beacon, for instance). They are collapsed into a single `LookupEntry` per
//! canonical id before any join: impressions and spend are summed, every
//! other attribute keeps the first non-empty value.

use std::collections::BTreeMap;

use crate::error::{ReportError, TableKind};
use crate::model::LookupEntry;
use crate::table::{cell, RawTable};

pub const LINE_ITEM_ID: &str = "line_item_id";
pub const LINE_ITEM_NAME: &str = "line_item_name";
pub const IMPRESSIONS: &str = "impressions";
pub const ADVERTISER_INVOICE: &str = "advertiser_invoice";
pub const ADVERTISER_NAME: &str = "advertiser_name";
pub const INSERTION_ORDER_ID: &str = "insertion_order_id";
pub const INSERTION_ORDER_NAME: &str = "insertion_order_name";
/// Primary raw name of the package id column (sic)
pub const PACKAGE_ID_PRIMARY: &str = "packag_id";
pub const PACKAGE_ID_ALTERNATE: &str = "package_id";
pub const PACKAGE_NAME: &str = "package_name";

/// Columns that must be present in every lookup file
pub const REQUIRED_COLUMNS: [&str; 4] = [LINE_ITEM_ID, LINE_ITEM_NAME, IMPRESSIONS, ADVERTISER_INVOICE];

/// Resolved positions of the lookup columns in a raw table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupColumns {
    pub line_item_id: usize,
    pub line_item_name: usize,
    pub impressions: usize,
    pub advertiser_invoice: usize,
    pub advertiser_name: Option<usize>,
    pub insertion_order_id: Option<usize>,
    pub insertion_order_name: Option<usize>,
    pub package_id: Option<usize>,
    pub package_name: Option<usize>,
}

impl LookupColumns {
    /// Map raw headers onto the lookup schema, failing if a required column is absent
    pub fn resolve(table: &RawTable) -> Result<Self, ReportError> {
        let (Some(line_item_id), Some(line_item_name), Some(impressions), Some(advertiser_invoice)) = (
            table.column_index(LINE_ITEM_ID),
            table.column_index(LINE_ITEM_NAME),
            table.column_index(IMPRESSIONS),
            table.column_index(ADVERTISER_INVOICE),
        ) else {
            let missing = REQUIRED_COLUMNS
                .iter()
                .filter(|col| table.column_index(col).is_none())
                .map(|col| col.to_string())
                .collect();
            return Err(ReportError::MissingColumns {
                table: TableKind::Lookup,
                missing,
                available: table.headers().to_vec(),
            });
        };

        Ok(Self {
            line_item_id,
            line_item_name,
            impressions,
            advertiser_invoice,
            advertiser_name: table.column_index(ADVERTISER_NAME),
            insertion_order_id: table.column_index(INSERTION_ORDER_ID),
            insertion_order_name: table.column_index(INSERTION_ORDER_NAME),
            package_id: table
                .column_index(PACKAGE_ID_PRIMARY)
                .or_else(|| table.column_index(PACKAGE_ID_ALTERNATE)),
            package_name: table.column_index(PACKAGE_NAME),
        })
    }
}

/// De-duplicated lookup entries keyed by canonical line item id
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LookupTable {
    entries: BTreeMap<String, LookupEntry>,
    raw_rows: usize,
    dropped_rows: usize,
}

impl LookupTable {
    /// Validate and collapse a raw lookup table.
    ///
    /// Rows without a line item id are dropped: they cannot match anything
    /// and are excluded from every total.
    pub fn from_table(table: &RawTable) -> Result<Self, ReportError> {
        let columns = LookupColumns::resolve(table)?;
        let mut entries: BTreeMap<String, LookupEntry> = BTreeMap::new();
        let mut dropped_rows = 0usize;

        for row in table.rows() {
            let Some(line_item_id) = cell(row, columns.line_item_id).as_line_item_id() else {
                dropped_rows += 1;
                continue;
            };

            let text = |idx: Option<usize>| idx.and_then(|i| cell(row, i).as_text());
            let impressions = cell(row, columns.impressions).as_number().unwrap_or(0.0);
            let spend = cell(row, columns.advertiser_invoice).as_number().unwrap_or(0.0);

            let entry = entries
                .entry(line_item_id.clone())
                .or_insert_with(|| LookupEntry {
                    line_item_id,
                    advertiser_name: None,
                    insertion_order_id: None,
                    insertion_order_name: None,
                    package_id: None,
                    package_name: None,
                    line_item_name: None,
                    impressions: 0.0,
                    advertiser_invoice: 0.0,
                });

            entry.impressions += impressions;
            entry.advertiser_invoice += spend;
            keep_first(&mut entry.line_item_name, text(Some(columns.line_item_name)));
            keep_first(&mut entry.advertiser_name, text(columns.advertiser_name));
            keep_first(&mut entry.insertion_order_id, text(columns.insertion_order_id));
            keep_first(&mut entry.insertion_order_name, text(columns.insertion_order_name));
            keep_first(&mut entry.package_id, text(columns.package_id));
            keep_first(&mut entry.package_name, text(columns.package_name));
        }

        if dropped_rows > 0 {
            tracing::warn!(dropped_rows, "dropped lookup rows without a line_item_id");
        }
        tracing::debug!(
            raw_rows = table.len(),
            line_items = entries.len(),
            "de-duplicated lookup table"
        );

        Ok(Self {
            entries,
            raw_rows: table.len(),
            dropped_rows,
        })
    }

    /// Build directly from entries, collapsing duplicates the same way as [`Self::from_table`]
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = LookupEntry>,
    {
        let mut table = Self::default();
        for entry in entries {
            table.raw_rows += 1;
            match table.entries.get_mut(&entry.line_item_id) {
                Some(existing) => {
                    existing.impressions += entry.impressions;
                    existing.advertiser_invoice += entry.advertiser_invoice;
                    keep_first(&mut existing.line_item_name, entry.line_item_name);
                    keep_first(&mut existing.advertiser_name, entry.advertiser_name);
                    keep_first(&mut existing.insertion_order_id, entry.insertion_order_id);
                    keep_first(&mut existing.insertion_order_name, entry.insertion_order_name);
                    keep_first(&mut existing.package_id, entry.package_id);
                    keep_first(&mut existing.package_name, entry.package_name);
                }
                None => {
                    table.entries.insert(entry.line_item_id.clone(), entry);
                }
            }
        }
        table
    }

    pub fn get(&self, line_item_id: &str) -> Option<&LookupEntry> {
        self.entries.get(line_item_id)
    }

    pub fn contains(&self, line_item_id: &str) -> bool {
        self.entries.contains_key(line_item_id)
    }

    /// Entries in canonical id order
    pub fn entries(&self) -> impl Iterator<Item = &LookupEntry> {
        self.entries.values()
    }

    /// Number of distinct line items
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rows read from the raw table, including duplicates and dropped rows
    pub fn raw_rows(&self) -> usize {
        self.raw_rows
    }

    /// Rows discarded for having no line item id
    pub fn dropped_rows(&self) -> usize {
        self.dropped_rows
    }

    /// Spend across every line item in the lookup
    pub fn total_spend(&self) -> f64 {
        self.entries.values().map(|e| e.advertiser_invoice).sum()
    }
}

fn keep_first(slot: &mut Option<String>, value: Option<String>) {
    if slot.is_none() {
        *slot = value;
    }
}
