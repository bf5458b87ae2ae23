//! Line normalization and running totals

use crate::types::{RawAmount, ReportLine, ReportTotals, TransactionLineRaw};

/// Map one exported transaction line into report shape.
///
/// Missing text becomes empty; missing or blank numeric columns display as
/// `0`. Numeric text is otherwise kept verbatim and only coerced when summed.
pub fn normalize(raw: TransactionLineRaw) -> ReportLine {
    ReportLine {
        id: raw.id,
        is_return: raw.transaction_type.is_return(),
        transaction_type: raw.transaction_type,
        royalty_category: raw.royalty_category.unwrap_or_default(),
        product: raw.product.unwrap_or_default(),
        order_number: raw.order_number.unwrap_or_default(),
        tran_date: raw.tran_date.unwrap_or_default(),
        quantity: display_amount(raw.quantity),
        rate: display_amount(raw.rate),
        gross_sale: display_amount(raw.gross_amount),
        net_sales: display_amount(raw.net_amount),
        amount_tax: display_amount(raw.tax_amount),
        amount_discount: display_amount(raw.discount_amount),
        total_sales: display_amount(raw.total_sales),
        total_cost: display_amount(raw.cost_estimate),
    }
}

fn display_amount(value: Option<RawAmount>) -> RawAmount {
    match value {
        Some(amount) if !amount.is_blank() => amount,
        _ => RawAmount::zero(),
    }
}

/// Add one line's amounts to the running totals.
///
/// Unparseable amounts count as zero so a bad cell can never poison the sums.
/// Profit is not touched here; see [`close_totals`].
pub fn fold(mut totals: ReportTotals, line: &ReportLine) -> ReportTotals {
    totals.gross_sales += line.gross_sale.value();
    totals.net_sales += line.net_sales.value();
    totals.total_sales += line.total_sales.value();
    totals.total_cost += line.total_cost.value();
    totals
}

/// Derive profit once all lines are folded.
pub fn close_totals(mut totals: ReportTotals) -> ReportTotals {
    totals.total_profit = totals.net_sales - totals.total_cost;
    totals
}

/// Accumulates normalized lines in arrival order alongside their totals.
#[derive(Debug, Default)]
pub struct Aggregator {
    lines: Vec<ReportLine>,
    totals: ReportTotals,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            lines: Vec::with_capacity(capacity),
            totals: ReportTotals::default(),
        }
    }

    pub fn push(&mut self, line: ReportLine) {
        self.totals = fold(self.totals, &line);
        self.lines.push(line);
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Retained lines and closed totals (profit computed).
    pub fn finish(self) -> (Vec<ReportLine>, ReportTotals) {
        (self.lines, close_totals(self.totals))
    }
}
