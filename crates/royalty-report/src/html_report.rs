//! HTML royalty report
//!
//! Produces a self-contained `royalty_report.html`: a heading block with the
//! category and date range, then a single table with one row per line and a
//! bold block of totals underneath.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::amount::format_amount;
use crate::constants;
use crate::types::{RawAmount, Report, ReportLine};

const CELL_STYLE: &str = "border: 1px solid #ddd; padding: 8px;";
const HEADER_STYLE: &str = "border: 1px solid #ddd; padding: 8px; background-color: #f5f7fa; text-align: left;";
const AMOUNT_STYLE: &str = "border: 1px solid #ddd; padding: 8px; text-align: right;";
const TOTAL_STYLE: &str = "border: 1px solid #ddd; padding: 8px; text-align: right; font-weight: bold;";
const EMPTY_STYLE: &str = "border: 1px solid #ddd; padding: 8px; text-align: center;";

/// Escape text for use in element content and attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn dollars(value: f64) -> String {
    format!("${}", format_amount(value))
}

fn text_cell(text: &str) -> String {
    format!("<td style=\"{}\">{}</td>", CELL_STYLE, escape_html(text))
}

fn amount_cell(amount: &RawAmount) -> String {
    format!("<td style=\"{}\">${}</td>", AMOUNT_STYLE, amount.formatted())
}

fn line_row(line: &ReportLine) -> String {
    let cells = [
        text_cell(&line.royalty_category),
        text_cell(&line.product),
        text_cell(&line.order_number),
        text_cell(&line.tran_date),
        // Quantity is a count, shown as exported
        format!("<td style=\"{}\">{}</td>", AMOUNT_STYLE, escape_html(line.quantity.as_str())),
        amount_cell(&line.rate),
        amount_cell(&line.gross_sale),
        amount_cell(&line.amount_discount),
        amount_cell(&line.net_sales),
        amount_cell(&line.amount_tax),
        amount_cell(&line.total_sales),
        amount_cell(&line.total_cost),
    ];
    format!("<tr>{}</tr>", cells.concat())
}

fn total_row(label: &str, value: f64) -> String {
    format!(
        "<tr><td colspan=\"{}\" style=\"{}\">{}:</td><td style=\"{}\">{}</td></tr>",
        constants::REPORT_COLUMNS.len() - 1,
        TOTAL_STYLE,
        escape_html(label),
        TOTAL_STYLE,
        dollars(value)
    )
}

/// Table header cells, one `<th>` per report column.
pub fn render_header_cells() -> String {
    constants::REPORT_COLUMNS
        .iter()
        .map(|title| format!("<th style=\"{}\">{}</th>", HEADER_STYLE, escape_html(title)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Body rows of the results table.
///
/// An empty report renders a single full-width placeholder row and no totals.
pub fn render_table_rows(report: &Report) -> String {
    if report.is_empty() {
        return format!(
            "<tr><td colspan=\"{}\" style=\"{}\">{}</td></tr>",
            constants::REPORT_COLUMNS.len(),
            EMPTY_STYLE,
            constants::HTML_NO_RESULTS_MESSAGE
        );
    }

    let totals = &report.totals;
    let mut rows: Vec<String> = report.lines.iter().map(line_row).collect();
    rows.push(total_row("Total Gross Sales", totals.gross_sales));
    rows.push(total_row("Total Net Sales", totals.net_sales));
    rows.push(total_row("Total Sales", totals.total_sales));
    rows.push(total_row("Total Cost", totals.total_cost));
    rows.push(total_row("Total Profit", totals.total_profit));
    rows.push(total_row(&report.royalty_split_label(), report.royalty_amount));
    rows.join("\n")
}

/// Replace `__MARKER__` placeholders in a single left-to-right pass.
///
/// Substituted text is never rescanned, so report data that happens to look
/// like a marker is emitted as-is. Unknown markers are left in place.
fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len() + values.iter().map(|(_, v)| v.len()).sum::<usize>());
    let mut rest = template;
    while let Some(start) = rest.find("__") {
        let Some(len) = rest[start + 2..].find("__") else {
            break;
        };
        let marker = &rest[start..start + 2 + len + 2];
        out.push_str(&rest[..start]);
        match values.iter().find(|(name, _)| *name == marker) {
            Some((_, value)) => {
                out.push_str(value);
                rest = &rest[start + marker.len()..];
            }
            None => {
                out.push_str("__");
                rest = &rest[start + 2..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Full page for a report.
pub fn build_html(report: &Report) -> String {
    let template = include_str!("html_report_template.html");
    let date_range = report
        .filters
        .date_range_text()
        .map(|range| format!("<p class=\"meta\">Date Range: {}</p>", escape_html(&range)))
        .unwrap_or_default();

    fill_template(
        template,
        &[
            ("__REPORT_TITLE__", constants::REPORT_TITLE),
            ("__CATEGORY__", &escape_html(report.category_label())),
            ("__DATE_RANGE__", &date_range),
            ("__HEADER_CELLS__", &render_header_cells()),
            ("__RESULTS_ROWS__", &render_table_rows(report)),
        ],
    )
}

/// Write `royalty_report.html` to `output_dir`.
pub fn write_html_report(output_dir: &Path, report: &Report) -> Result<PathBuf> {
    let path = output_dir.join(constants::HTML_REPORT_FILENAME);
    std::fs::write(&path, build_html(report)).with_context(|| format!("Failed to write {}", path.display()))?;
    println!("  Generated: {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::build_report;
    use crate::types::{CalculationMethod, ReportFilters, RoyaltyCategory, TransactionLineRaw, TransactionType};

    fn line(product: &str, gross: &str) -> TransactionLineRaw {
        TransactionLineRaw {
            id: "7".to_string(),
            transaction_type: TransactionType::CashSale,
            royalty_category_id: Some("2".to_string()),
            royalty_category: Some("Music".to_string()),
            product: Some(product.to_string()),
            order_number: Some("CS-7".to_string()),
            tran_date: Some("03/04/2025".to_string()),
            subsidiary: None,
            quantity: Some("3".into()),
            rate: Some("411.50".into()),
            gross_amount: Some(gross.into()),
            net_amount: Some(gross.into()),
            tax_amount: Some("0".into()),
            discount_amount: None,
            cost_estimate: Some("234.50".into()),
            total_sales: Some(gross.into()),
        }
    }

    fn music() -> RoyaltyCategory {
        RoyaltyCategory {
            id: "2".to_string(),
            name: "Music".to_string(),
            percentage: 15.0,
            method: Some(CalculationMethod::GrossSales),
        }
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("Tom & Jerry <DVD>"), "Tom &amp; Jerry &lt;DVD&gt;");
        assert_eq!(escape_html("\"quoted\" 'single'"), "&quot;quoted&quot; &#39;single&#39;");
        assert_eq!(escape_html("plain"), "plain");
    }

    #[test]
    fn test_rows_format_amounts_with_dollar_sign() {
        let report = build_report(vec![line("LP", "1234.5")], Some(music()));
        let rows = render_table_rows(&report);

        assert!(rows.contains(">$1,234.50</td>"));
        assert!(rows.contains(">$411.50</td>"));
        assert!(rows.contains(">$0.00</td>"));
        // Quantity is not currency
        assert!(rows.contains(">3</td>"));
        assert!(!rows.contains("$3.00"));
    }

    #[test]
    fn test_total_rows_in_fixed_order() {
        let report = build_report(vec![line("LP", "1000"), line("EP", "240")], Some(music()));
        let rows = render_table_rows(&report);

        let labels = [
            "Total Gross Sales:",
            "Total Net Sales:",
            "Total Sales:",
            "Total Cost:",
            "Total Profit:",
            "(GROSS SALES) 15% Royalty Split:",
        ];
        let positions: Vec<usize> = labels.iter().map(|l| rows.find(l).unwrap()).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));

        assert!(rows.contains("Total Gross Sales:</td><td style=\"border: 1px solid #ddd; padding: 8px; text-align: right; font-weight: bold;\">$1,240.00</td>"));
        assert!(rows.contains("Total Profit:</td><td style=\"border: 1px solid #ddd; padding: 8px; text-align: right; font-weight: bold;\">$771.00</td>"));
        // 15% of gross
        assert!(rows.contains("Royalty Split:</td><td style=\"border: 1px solid #ddd; padding: 8px; text-align: right; font-weight: bold;\">$186.00</td>"));
        assert!(rows.contains("colspan=\"11\""));
    }

    #[test]
    fn test_empty_report_renders_placeholder_only() {
        let report = build_report(Vec::<TransactionLineRaw>::new(), Some(music()));
        let rows = render_table_rows(&report);

        assert!(rows.contains("No results found for the selected criteria."));
        assert!(rows.contains("colspan=\"12\""));
        assert!(!rows.contains("Total"));
        assert_eq!(rows.matches("<tr>").count(), 1);
    }

    #[test]
    fn test_text_cells_are_escaped() {
        let report = build_report(vec![line("<b>Live</b> & Loud", "10")], None);
        let rows = render_table_rows(&report);
        assert!(rows.contains("&lt;b&gt;Live&lt;/b&gt; &amp; Loud"));
        assert!(!rows.contains("<b>Live"));
    }

    #[test]
    fn test_build_html_fills_every_marker() {
        let report = build_report(vec![line("LP", "10")], Some(music())).with_filters(ReportFilters {
            from_date: Some("2025-01-01".to_string()),
            ..Default::default()
        });
        let html = build_html(&report);

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>Royalty Report</title>"));
        assert!(html.contains("Category: Music"));
        assert!(html.contains("Date Range: From 2025-01-01"));
        assert!(html.contains("<th style=\"border: 1px solid #ddd; padding: 8px; background-color: #f5f7fa; text-align: left;\">Order #</th>"));
        assert!(!html.contains("__"));
    }

    #[test]
    fn test_write_html_report() {
        let dir = tempfile::tempdir().unwrap();
        let report = build_report(vec![line("LP", "10")], None);
        let path = write_html_report(dir.path(), &report).unwrap();
        assert_eq!(path.file_name().unwrap(), "royalty_report.html");
        let html = std::fs::read_to_string(path).unwrap();
        assert!(html.contains("Category: All Categories"));
        assert!(html.contains("() 0% Royalty Split:"));
    }

    #[test]
    fn test_marker_text_in_data_is_not_substituted() {
        let mut category = music();
        category.name = "__RESULTS_ROWS__ __DATE_RANGE__".to_string();
        let report = build_report(vec![line("__HEADER_CELLS__", "10")], Some(category));
        let html = build_html(&report);

        assert!(html.contains("Category: __RESULTS_ROWS__ __DATE_RANGE__</p>"));
        assert!(html.contains(">__HEADER_CELLS__</td>"));
        // Real rows landed inside the table body
        let body = html.split("<tbody>").nth(1).unwrap();
        assert!(body.contains(">$10.00</td>"));
        assert_eq!(html.matches("<th ").count(), 12);
    }

    #[test]
    fn test_fill_template_leaves_unknown_markers() {
        let filled = fill_template("a __X__ b __Y__ c__", &[("__X__", "1")]);
        assert_eq!(filled, "a 1 b __Y__ c__");
    }
}
