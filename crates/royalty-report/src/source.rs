//! Transaction line loading and selection
//!
//! Lines arrive as an export of the sales ledger (CSV with a header row, or a
//! JSON array). Selection applies the same rules the ledger query would:
//! non-negative rate, optional category, subsidiary and inclusive date range.

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use serde::Deserialize;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::amount::parse_float;
use crate::constants::DATE_FORMATS;
use crate::types::{RawAmount, RoyaltyCategory, TransactionLineRaw, TransactionType};

// ── Loading ─────────────────────────────────────────────────────────────────

/// CSV row shape. Amount columns stay text so the export keeps its formatting.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CsvLineRecord {
    id: String,
    #[serde(rename = "type")]
    transaction_type: String,
    #[serde(default)]
    royalty_category_id: Option<String>,
    #[serde(default)]
    royalty_category: Option<String>,
    #[serde(default)]
    product: Option<String>,
    #[serde(default)]
    order_number: Option<String>,
    #[serde(default)]
    tran_date: Option<String>,
    #[serde(default)]
    subsidiary: Option<String>,
    #[serde(default)]
    quantity: Option<String>,
    #[serde(default)]
    rate: Option<String>,
    #[serde(default)]
    gross_amount: Option<String>,
    #[serde(default)]
    net_amount: Option<String>,
    #[serde(default)]
    tax_amount: Option<String>,
    #[serde(default)]
    discount_amount: Option<String>,
    #[serde(default)]
    cost_estimate: Option<String>,
    #[serde(default)]
    total_sales: Option<String>,
}

impl CsvLineRecord {
    fn into_line(self) -> Result<TransactionLineRaw> {
        let transaction_type = self.transaction_type.parse::<TransactionType>()?;
        Ok(TransactionLineRaw {
            id: self.id,
            transaction_type,
            royalty_category_id: self.royalty_category_id,
            royalty_category: self.royalty_category,
            product: self.product,
            order_number: self.order_number,
            tran_date: self.tran_date,
            subsidiary: self.subsidiary,
            quantity: self.quantity.map(RawAmount::new),
            rate: self.rate.map(RawAmount::new),
            gross_amount: self.gross_amount.map(RawAmount::new),
            net_amount: self.net_amount.map(RawAmount::new),
            tax_amount: self.tax_amount.map(RawAmount::new),
            discount_amount: self.discount_amount.map(RawAmount::new),
            cost_estimate: self.cost_estimate.map(RawAmount::new),
            total_sales: self.total_sales.map(RawAmount::new),
        })
    }
}

/// Read lines from a CSV export with a header row.
pub fn read_csv_lines<R: Read>(reader: R) -> Result<Vec<TransactionLineRaw>> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::Headers).from_reader(reader);
    let mut lines = Vec::new();

    for (index, record) in rdr.deserialize::<CsvLineRecord>().enumerate() {
        // Header is line 1, so the first record is line 2
        let row = index + 2;
        let record = record.with_context(|| format!("Malformed CSV record at line {}", row))?;
        lines.push(record.into_line().with_context(|| format!("Invalid transaction line at line {}", row))?);
    }

    Ok(lines)
}

/// Parse lines from a JSON array.
pub fn parse_json_lines(content: &str) -> Result<Vec<TransactionLineRaw>> {
    serde_json::from_str(content).context("Expected a JSON array of transaction lines")
}

/// Load lines from a `.csv` or `.json` export.
pub fn load_lines(path: &Path) -> Result<Vec<TransactionLineRaw>> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let lines = match extension.as_str() {
        "csv" => {
            let file =
                std::fs::File::open(path).with_context(|| format!("Failed to open input file: {}", path.display()))?;
            read_csv_lines(file).with_context(|| format!("Failed to read {}", path.display()))?
        }
        "json" => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read input file: {}", path.display()))?;
            parse_json_lines(&content).with_context(|| format!("Failed to parse {}", path.display()))?
        }
        other => bail!(
            "Unsupported input format '{}' for {} (expected .csv or .json)",
            other,
            path.display()
        ),
    };

    info!(lines = lines.len(), path = %path.display(), "loaded transaction lines");
    Ok(lines)
}

// ── Selection ───────────────────────────────────────────────────────────────

/// Parse a date in any of the accepted input formats.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
}

/// Category a line must belong to.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryMatch {
    pub id: String,
    /// Known only when the id resolved to a configured category
    pub name: Option<String>,
}

/// Selection criteria for report lines.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineFilter {
    pub category: Option<CategoryMatch>,
    pub subsidiary: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl LineFilter {
    /// Build a filter from user-supplied values.
    ///
    /// `category` is the looked-up category for `category_id`, if it resolved.
    pub fn new(
        category_id: Option<&str>,
        category: Option<&RoyaltyCategory>,
        subsidiary: Option<&str>,
        from: Option<&str>,
        to: Option<&str>,
    ) -> Result<Self> {
        let from = from.map(parse_bound).transpose()?;
        let to = to.map(parse_bound).transpose()?;
        if let (Some(from), Some(to)) = (from, to)
            && from > to
        {
            bail!("Date range is empty: {} is after {}", from, to);
        }

        Ok(Self {
            category: category_id.map(|id| CategoryMatch {
                id: id.trim().to_string(),
                name: category.map(|c| c.name.clone()),
            }),
            subsidiary: subsidiary.map(|s| s.trim().to_string()),
            from,
            to,
        })
    }

    fn has_date_bounds(&self) -> bool {
        self.from.is_some() || self.to.is_some()
    }

    /// Whether a line passes the eligibility rules and this filter.
    pub fn matches(&self, line: &TransactionLineRaw) -> bool {
        // Rate below zero marks adjustment lines. A missing rate never compares as >= 0
        let rate = line.rate.as_ref().and_then(|r| parse_float(r.as_str()));
        if !rate.is_some_and(|r| r >= 0.0) {
            return false;
        }

        if let Some(ref category) = self.category {
            let matched = match (&line.royalty_category_id, &category.name) {
                (Some(line_id), _) => line_id.trim() == category.id,
                (None, Some(name)) => line.royalty_category.as_deref().map(str::trim) == Some(name.as_str()),
                (None, None) => false,
            };
            if !matched {
                return false;
            }
        }

        if let Some(ref subsidiary) = self.subsidiary
            && line.subsidiary.as_deref().map(str::trim) != Some(subsidiary.as_str())
        {
            return false;
        }

        if self.has_date_bounds() {
            let Some(date) = line.tran_date.as_deref().and_then(parse_date) else {
                return false;
            };
            if self.from.is_some_and(|from| date < from) || self.to.is_some_and(|to| date > to) {
                return false;
            }
        }

        true
    }
}

fn parse_bound(text: &str) -> Result<NaiveDate> {
    parse_date(text).with_context(|| format!("Invalid date '{}' (expected YYYY-MM-DD or MM/DD/YYYY)", text))
}

/// Keep the lines matching `filter`, preserving their order.
pub fn select_lines(lines: Vec<TransactionLineRaw>, filter: &LineFilter) -> Vec<TransactionLineRaw> {
    let total = lines.len();
    let mut unparseable_dates = 0usize;

    let selected: Vec<TransactionLineRaw> = lines
        .into_iter()
        .filter(|line| {
            if filter.has_date_bounds() && line.tran_date.as_deref().and_then(parse_date).is_none() {
                unparseable_dates += 1;
            }
            filter.matches(line)
        })
        .collect();

    debug!(total, selected = selected.len(), "selected report lines");
    if unparseable_dates > 0 {
        warn!(
            count = unparseable_dates,
            "lines with missing or unparseable dates were excluded by the date range"
        );
    }

    selected
}
