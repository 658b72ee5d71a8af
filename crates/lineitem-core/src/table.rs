//! Raw tabular input and cell normalization
//!
//! Loaders hand the pipeline a `RawTable`: a header row plus loosely typed
//! cells. Everything typed downstream (transactions, lookup entries) is
//! mapped from here through an explicit column resolution step.

use serde_json::Value;

/// A single loosely typed cell from a CSV or spreadsheet
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Int(i64),
    Float(f64),
}

impl CellValue {
    /// Cell rendered as trimmed text. Integer-valued floats print without a
    /// fractional part so numeric ids read the same as their text form.
    pub fn as_text(&self) -> Option<String> {
        match self {
            CellValue::Empty => None,
            CellValue::Text(s) => {
                let trimmed = s.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            CellValue::Int(n) => Some(n.to_string()),
            CellValue::Float(f) if !f.is_finite() => None,
            CellValue::Float(f) if f.fract() == 0.0 => Some(format!("{:.0}", normalize_zero(*f))),
            CellValue::Float(f) => Some(f.to_string()),
        }
    }

    /// Cell parsed as a number. Text accepts currency symbols and thousands
    /// separators ("$1,234.50").
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Empty => None,
            CellValue::Int(n) => Some(*n as f64),
            CellValue::Float(f) => f.is_finite().then_some(*f),
            CellValue::Text(s) => parse_amount(s),
        }
    }

    /// Cell as a canonical line item id (see [`normalize_id_text`])
    pub fn as_line_item_id(&self) -> Option<String> {
        match self {
            CellValue::Empty => None,
            CellValue::Int(n) => Some(n.to_string()),
            CellValue::Float(f) => float_id(*f),
            CellValue::Text(s) => normalize_id_text(s),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        if s.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(s.to_string())
        }
    }
}

/// Header row plus data rows, as produced by a loader
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    headers: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

impl RawTable {
    /// Build a table. Header names are trimmed.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        let headers = headers.into_iter().map(|h| h.trim().to_string()).collect();
        Self { headers, rows }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column by exact (trimmed) header name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Append a constant column, replacing an existing one of the same name
    pub fn with_constant_column(mut self, name: &str, value: CellValue) -> Self {
        match self.column_index(name) {
            Some(idx) => {
                for row in &mut self.rows {
                    if row.len() <= idx {
                        row.resize(idx + 1, CellValue::Empty);
                    }
                    row[idx] = value.clone();
                }
            }
            None => {
                let width = self.headers.len();
                self.headers.push(name.to_string());
                for row in &mut self.rows {
                    row.resize(width, CellValue::Empty);
                    row.push(value.clone());
                }
            }
        }
        self
    }
}

static EMPTY_CELL: CellValue = CellValue::Empty;

/// Cell at `idx` in `row`; short rows read as empty
pub fn cell(row: &[CellValue], idx: usize) -> &CellValue {
    row.get(idx).unwrap_or(&EMPTY_CELL)
}

/// Canonical textual form of a line item id.
///
/// Numeric-looking ids are truncated to an integer and printed in plain
/// decimal, so `"123456789012345"`, `123456789012345.0` and
/// `"1.23456789012345e+14"` all become `"123456789012345"`. Integer text too
/// wide for `i128` and any other text are kept as-is (trimmed). Blank input
/// has no id.
pub fn normalize_id_text(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(n) = trimmed.parse::<i128>() {
        return Some(n.to_string());
    }
    // Integer text too wide for i128 would lose digits through f64
    if is_integer_text(trimmed) {
        return Some(trimmed.to_string());
    }

    match trimmed.parse::<f64>() {
        Ok(f) if f.is_finite() => float_id(f),
        _ => Some(trimmed.to_string()),
    }
}

/// Canonical id for a JSON scalar found in an impression record
pub fn json_line_item_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => normalize_id_text(s),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(i.to_string())
            } else if let Some(u) = n.as_u64() {
                Some(u.to_string())
            } else {
                n.as_f64().and_then(float_id)
            }
        }
        _ => None,
    }
}

fn is_integer_text(s: &str) -> bool {
    let digits = s.strip_prefix(['-', '+']).unwrap_or(s);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// Truncate toward zero and print without exponent
fn float_id(f: f64) -> Option<String> {
    if !f.is_finite() {
        return None;
    }
    Some(format!("{:.0}", normalize_zero(f.trunc())))
}

/// Parse a monetary or count value from text
pub fn parse_amount(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | ' '))
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|f| f.is_finite())
}

/// Normalize -0.0 to 0.0 for cleaner display
fn normalize_zero(val: f64) -> f64 {
    if val == 0.0 { 0.0 } else { val }
}
