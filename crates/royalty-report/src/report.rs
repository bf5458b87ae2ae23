//! Report assembly and console summary

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::aggregate::{Aggregator, normalize};
use crate::amount::format_amount;
use crate::constants;
use crate::royalty::calculate_royalty;
use crate::types::{Report, ReportFilters, RoyaltyCategory, TransactionLineRaw};

/// Build a royalty report from exported transaction lines.
///
/// Lines are normalized and folded in input order; profit is derived once
/// the fold completes and the royalty is computed from the final totals.
/// Without a category nothing is owed. Empty input yields an all-zero report.
pub fn build_report<I>(lines: I, category: Option<RoyaltyCategory>) -> Report
where
    I: IntoIterator<Item = TransactionLineRaw>,
{
    let lines = lines.into_iter();
    let mut aggregator = Aggregator::with_capacity(lines.size_hint().0);
    for raw in lines {
        aggregator.push(normalize(raw));
    }
    let (lines, totals) = aggregator.finish();

    let royalty_amount = match &category {
        Some(c) => calculate_royalty(totals.gross_sales, totals.total_profit, Some(c.percentage), c.method),
        None => 0.0,
    };

    let returns = lines.iter().filter(|l| l.is_return).count();
    info!(
        lines = lines.len(),
        returns,
        gross_sales = totals.gross_sales,
        total_profit = totals.total_profit,
        royalty_amount,
        "royalty report built"
    );

    Report {
        lines,
        totals,
        royalty_amount,
        category,
        filters: ReportFilters::default(),
    }
}

impl Report {
    /// Attach the filters the lines were selected with (used in headings).
    pub fn with_filters(mut self, filters: ReportFilters) -> Self {
        self.filters = filters;
        self
    }
}

/// Write the report as pretty-printed JSON (`royalty_report.json`).
pub fn write_json_report(output_dir: &Path, report: &Report) -> Result<PathBuf> {
    let path = output_dir.join(constants::JSON_REPORT_FILENAME);
    let json = serde_json::to_string_pretty(report).context("Failed to serialize report")?;
    std::fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    println!("  Generated: {}", path.display());
    Ok(path)
}

/// Print summary to console
pub fn print_summary(report: &Report) {
    println!("\n============================================================");
    println!("                  ROYALTY SUMMARY");
    println!("============================================================\n");

    println!("  Category:        {}", report.category_label());
    if let Some(range) = report.filters.date_range_text() {
        println!("  Date range:      {}", range);
    }
    if let Some(ref subsidiary) = report.filters.subsidiary {
        println!("  Subsidiary:      {}", subsidiary);
    }

    let returns = report.lines.iter().filter(|l| l.is_return).count();
    println!("  Lines:           {} ({} returns)", report.lines.len(), returns);

    if report.is_empty() {
        println!("\n  No results found for the selected criteria.");
        return;
    }

    println!("\n  TOTALS");
    println!("  ─────────────────────────────────────────────");
    println!("    {:<22} ${:>16}", "Gross Sales", format_amount(report.totals.gross_sales));
    println!("    {:<22} ${:>16}", "Net Sales", format_amount(report.totals.net_sales));
    println!("    {:<22} ${:>16}", "Total Sales", format_amount(report.totals.total_sales));
    println!("    {:<22} ${:>16}", "Total Cost", format_amount(report.totals.total_cost));
    println!("    {:<22} ${:>16}", "Total Profit", format_amount(report.totals.total_profit));
    println!("  ─────────────────────────────────────────────");
    println!("    {}", report.royalty_split_label());
    println!("    {:<22} ${:>16}", "Royalty owed", format_amount(report.royalty_amount));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CalculationMethod, TransactionType};

    fn line(id: &str, transaction_type: TransactionType, gross: &str, net: &str, cost: &str) -> TransactionLineRaw {
        TransactionLineRaw {
            id: id.to_string(),
            transaction_type,
            royalty_category_id: None,
            royalty_category: Some("Music".to_string()),
            product: Some("Vinyl LP".to_string()),
            order_number: Some(format!("INV-{}", id)),
            tran_date: Some("2025-03-01".to_string()),
            subsidiary: None,
            quantity: Some("1".into()),
            rate: Some(gross.into()),
            gross_amount: Some(gross.into()),
            net_amount: Some(net.into()),
            tax_amount: None,
            discount_amount: None,
            cost_estimate: Some(cost.into()),
            total_sales: Some(net.into()),
        }
    }

    fn category(percentage: f64, method: Option<CalculationMethod>) -> RoyaltyCategory {
        RoyaltyCategory {
            id: "7".to_string(),
            name: "Music".to_string(),
            percentage,
            method,
        }
    }

    #[test]
    fn test_empty_input_is_a_valid_zero_report() {
        let report = build_report(Vec::<TransactionLineRaw>::new(), Some(category(15.0, Some(CalculationMethod::GrossSales))));
        assert!(report.is_empty());
        assert_eq!(report.totals.gross_sales, 0.0);
        assert_eq!(report.totals.total_profit, 0.0);
        assert_eq!(report.royalty_amount, 0.0);
    }

    #[test]
    fn test_gross_sales_royalty() {
        let lines = vec![
            line("1", TransactionType::Invoice, "600", "550", "200"),
            line("2", TransactionType::CashSale, "400", "350", "100"),
        ];
        let report = build_report(lines, Some(category(20.0, Some(CalculationMethod::GrossSales))));
        assert_eq!(report.totals.gross_sales, 1000.0);
        assert_eq!(report.totals.net_sales, 900.0);
        assert_eq!(report.totals.total_cost, 300.0);
        assert_eq!(report.totals.total_profit, 600.0);
        assert_eq!(report.royalty_amount, 200.0);
    }

    #[test]
    fn test_net_profit_royalty_with_return() {
        let lines = vec![
            line("1", TransactionType::Invoice, "1000", "900", "300"),
            line("2", TransactionType::CreditMemo, "-100", "-100", "-25"),
        ];
        let report = build_report(lines, Some(category(10.0, Some(CalculationMethod::NetProfit))));
        assert_eq!(report.totals.total_profit, 525.0);
        assert_eq!(report.royalty_amount, 52.5);
        assert!(report.lines[1].is_return);
    }

    #[test]
    fn test_no_category_owes_nothing() {
        let lines = vec![line("1", TransactionType::Invoice, "1000", "900", "300")];
        let report = build_report(lines, None);
        assert_eq!(report.royalty_amount, 0.0);
        assert_eq!(report.category_label(), "All Categories");
    }

    #[test]
    fn test_unset_method_owes_nothing() {
        let lines = vec![line("1", TransactionType::Invoice, "1000", "900", "300")];
        let report = build_report(lines, Some(category(25.0, None)));
        assert_eq!(report.royalty_amount, 0.0);
        assert_eq!(report.royalty_split_label(), "() 25% Royalty Split");
    }

    #[test]
    fn test_lines_keep_input_order() {
        let lines = vec![
            line("b", TransactionType::Invoice, "1", "1", "0"),
            line("a", TransactionType::Invoice, "2", "2", "0"),
            line("c", TransactionType::Invoice, "3", "3", "0"),
        ];
        let report = build_report(lines, None);
        let ids: Vec<&str> = report.lines.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, ["b", "a", "c"]);
    }

    #[test]
    fn test_with_filters_sets_headings() {
        let filters = ReportFilters {
            from_date: Some("2025-01-01".to_string()),
            ..Default::default()
        };
        let report = build_report(Vec::<TransactionLineRaw>::new(), None).with_filters(filters.clone());
        assert_eq!(report.filters, filters);
    }

    #[test]
    fn test_write_json_report() {
        let dir = tempfile::tempdir().unwrap();
        let lines = vec![line("1", TransactionType::CashRefund, "-40", "-40", "-10")];
        let report = build_report(lines, Some(category(50.0, Some(CalculationMethod::NetProfit))));

        let path = write_json_report(dir.path(), &report).unwrap();
        let value: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();

        assert_eq!(value["totals"]["gross_sales"], -40.0);
        assert_eq!(value["totals"]["total_profit"], -30.0);
        assert_eq!(value["royalty_amount"], -15.0);
        assert_eq!(value["lines"][0]["gross_sale"], "-40");
        assert_eq!(value["lines"][0]["is_return"], true);
        assert_eq!(value["category"]["name"], "Music");
    }
}
