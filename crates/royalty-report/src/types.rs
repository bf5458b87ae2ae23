//! Report data types
//!
//! Raw transaction lines as delivered by the upstream export, the normalized
//! report line shape, totals, royalty categories and the assembled report.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::amount::{format_amount_text, to_number};

// ── Transaction types ───────────────────────────────────────────────────────

/// Sales transaction kinds that contribute lines to a royalty report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TransactionType {
    CashSale,
    Invoice,
    CreditMemo,
    CashRefund,
}

impl TransactionType {
    pub const ALL: [TransactionType; 4] = [Self::CashSale, Self::Invoice, Self::CreditMemo, Self::CashRefund];

    /// Record type code used by the upstream ledger
    pub fn code(self) -> &'static str {
        match self {
            Self::CashSale => "CashSale",
            Self::Invoice => "CustInvc",
            Self::CreditMemo => "CustCred",
            Self::CashRefund => "CashRfnd",
        }
    }

    /// Human-readable label
    pub fn label(self) -> &'static str {
        match self {
            Self::CashSale => "Cash Sale",
            Self::Invoice => "Invoice",
            Self::CreditMemo => "Credit Memo",
            Self::CashRefund => "Cash Refund",
        }
    }

    /// Credit memos and cash refunds are economically negative sales.
    pub fn is_return(self) -> bool {
        matches!(self, Self::CreditMemo | Self::CashRefund)
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown transaction type '{0}' (expected CashSale, CustInvc, CustCred or CashRfnd)")]
pub struct ParseTransactionTypeError(pub String);

impl FromStr for TransactionType {
    type Err = ParseTransactionTypeError;

    /// Accepts both the record type code and the display label.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|t| t.code().eq_ignore_ascii_case(trimmed) || t.label().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ParseTransactionTypeError(s.to_string()))
    }
}

impl<'de> Deserialize<'de> for TransactionType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

// ── Calculation method ──────────────────────────────────────────────────────

/// Basis the royalty percentage is applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CalculationMethod {
    /// Code `1`: percentage of total gross sales
    GrossSales,
    /// Code `2`: percentage of total profit (net sales minus cost)
    NetProfit,
}

impl CalculationMethod {
    pub fn code(self) -> u8 {
        match self {
            Self::GrossSales => 1,
            Self::NetProfit => 2,
        }
    }

    /// Upper-case label used in the royalty split row
    pub fn display_name(self) -> &'static str {
        match self {
            Self::GrossSales => "GROSS SALES",
            Self::NetProfit => "NET PROFIT",
        }
    }

    /// Parse a stored method selector.
    ///
    /// Blank means "not configured" and yields `Ok(None)`.
    pub fn parse_selector(s: &str) -> Result<Option<Self>, ParseMethodError> {
        if s.trim().is_empty() {
            return Ok(None);
        }
        s.parse().map(Some)
    }

    pub fn from_code(code: i64) -> Result<Self, ParseMethodError> {
        match code {
            1 => Ok(Self::GrossSales),
            2 => Ok(Self::NetProfit),
            other => Err(ParseMethodError(other.to_string())),
        }
    }
}

impl fmt::Display for CalculationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown calculation method '{0}' (expected 1 = gross sales or 2 = net profit)")]
pub struct ParseMethodError(pub String);

impl FromStr for CalculationMethod {
    type Err = ParseMethodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1" | "gross_sales" | "gross sales" | "grosssales" => Ok(Self::GrossSales),
            "2" | "net_profit" | "net profit" | "netprofit" => Ok(Self::NetProfit),
            _ => Err(ParseMethodError(s.to_string())),
        }
    }
}

// ── Raw amounts ─────────────────────────────────────────────────────────────

/// A numeric column exactly as the upstream export delivered it.
///
/// The text is kept verbatim so exports show what the ledger reported; the
/// numeric value is derived on demand and is never NaN.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct RawAmount(String);

impl RawAmount {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn zero() -> Self {
        Self("0".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Numeric value for summation (unparseable → 0)
    pub fn value(&self) -> f64 {
        to_number(&self.0)
    }

    /// Two-decimal, comma-grouped display string
    pub fn formatted(&self) -> String {
        format_amount_text(&self.0)
    }
}

impl fmt::Display for RawAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<f64> for RawAmount {
    fn from(value: f64) -> Self {
        Self(value.to_string())
    }
}

impl From<&str> for RawAmount {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl<'de> Deserialize<'de> for RawAmount {
    /// Accepts JSON/TOML numbers as well as strings.
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RawAmountVisitor;

        impl Visitor<'_> for RawAmountVisitor {
            type Value = RawAmount;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a number or numeric string")
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                Ok(RawAmount(v.to_string()))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                Ok(RawAmount(v.to_string()))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
                Ok(RawAmount::from(v))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                Ok(RawAmount(v.to_string()))
            }
        }

        deserializer.deserialize_any(RawAmountVisitor)
    }
}

// ── Lines ───────────────────────────────────────────────────────────────────

/// One matched transaction line as exported by the upstream query.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionLineRaw {
    pub id: String,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    /// Category record id, when the export carries it
    #[serde(default)]
    pub royalty_category_id: Option<String>,
    #[serde(default)]
    pub royalty_category: Option<String>,
    #[serde(default)]
    pub product: Option<String>,
    #[serde(default)]
    pub order_number: Option<String>,
    #[serde(default)]
    pub tran_date: Option<String>,
    #[serde(default)]
    pub subsidiary: Option<String>,
    #[serde(default)]
    pub quantity: Option<RawAmount>,
    #[serde(default)]
    pub rate: Option<RawAmount>,
    #[serde(default)]
    pub gross_amount: Option<RawAmount>,
    #[serde(default)]
    pub net_amount: Option<RawAmount>,
    #[serde(default)]
    pub tax_amount: Option<RawAmount>,
    #[serde(default)]
    pub discount_amount: Option<RawAmount>,
    #[serde(default)]
    pub cost_estimate: Option<RawAmount>,
    /// Net of tax plus tax, computed upstream
    #[serde(default)]
    pub total_sales: Option<RawAmount>,
}

/// A transaction line in report shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportLine {
    pub id: String,
    pub transaction_type: TransactionType,
    pub royalty_category: String,
    pub product: String,
    pub order_number: String,
    pub tran_date: String,
    pub quantity: RawAmount,
    pub rate: RawAmount,
    pub gross_sale: RawAmount,
    pub net_sales: RawAmount,
    pub amount_tax: RawAmount,
    pub amount_discount: RawAmount,
    pub total_sales: RawAmount,
    pub total_cost: RawAmount,
    pub is_return: bool,
}

// ── Totals and report ───────────────────────────────────────────────────────

/// Report-wide running sums.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ReportTotals {
    pub gross_sales: f64,
    pub net_sales: f64,
    pub total_sales: f64,
    pub total_cost: f64,
    /// Net sales minus total cost, set once after all lines are folded
    pub total_profit: f64,
}

/// Royalty configuration for one category, as consumed by the engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoyaltyCategory {
    pub id: String,
    pub name: String,
    /// Whole-number percentage (15 means 15%)
    pub percentage: f64,
    /// `None` when no method is configured; no royalty is computed then
    pub method: Option<CalculationMethod>,
}

/// Filters the report was produced with; used for report headings only.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ReportFilters {
    pub from_date: Option<String>,
    pub to_date: Option<String>,
    pub category_id: Option<String>,
    pub subsidiary: Option<String>,
}

impl ReportFilters {
    /// "A to B", "From A", "To B", or `None` when no date bound is set.
    pub fn date_range_text(&self) -> Option<String> {
        match (self.from_date.as_deref(), self.to_date.as_deref()) {
            (Some(from), Some(to)) => Some(format!("{} to {}", from, to)),
            (Some(from), None) => Some(format!("From {}", from)),
            (None, Some(to)) => Some(format!("To {}", to)),
            (None, None) => None,
        }
    }
}

/// Assembled royalty report, ready for rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub lines: Vec<ReportLine>,
    pub totals: ReportTotals,
    pub royalty_amount: f64,
    pub category: Option<RoyaltyCategory>,
    pub filters: ReportFilters,
}

impl Report {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Category name for headings, falling back to "All Categories".
    pub fn category_label(&self) -> &str {
        self.category
            .as_ref()
            .map(|c| c.name.as_str())
            .unwrap_or(crate::constants::ALL_CATEGORIES_LABEL)
    }

    /// `(GROSS SALES) 15% Royalty Split` style label.
    pub fn royalty_split_label(&self) -> String {
        let (method, percentage) = match &self.category {
            Some(c) => (c.method.map(|m| m.display_name()).unwrap_or(""), c.percentage),
            None => ("", 0.0),
        };
        format!("({}) {}% Royalty Split", method, percentage)
    }
}
