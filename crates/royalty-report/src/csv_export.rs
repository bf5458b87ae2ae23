//! CSV export of a royalty report
//!
//! Layout: a short preamble (title, category, date range), the column header,
//! one row per line with the amounts exactly as exported, then the totals and
//! the royalty split. Totals sit in the last column so spreadsheets line them
//! up under "Total Cost".

use anyhow::{Context, Result};
use csv::{Writer, WriterBuilder};
use std::path::{Path, PathBuf};

use crate::amount::normalize_zero;
use crate::constants;
use crate::types::Report;

/// Preamble rows and total rows are shorter than the 12 data columns.
fn new_writer(buf: Vec<u8>) -> Writer<Vec<u8>> {
    WriterBuilder::new().flexible(true).from_writer(buf)
}

/// The writer quotes an empty record as `""`, so separators go straight to the buffer.
fn blank_line(wtr: Writer<Vec<u8>>) -> Result<Writer<Vec<u8>>> {
    let mut buf = wtr.into_inner().map_err(|e| e.into_error())?;
    buf.push(b'\n');
    Ok(new_writer(buf))
}

/// Label in the first column, value in the last.
fn write_summary_row(wtr: &mut Writer<Vec<u8>>, label: &str, value: f64) -> Result<()> {
    let mut record = vec![String::new(); constants::REPORT_COLUMNS.len()];
    record[0] = label.to_string();
    if let Some(last) = record.last_mut() {
        *last = normalize_zero(value).to_string();
    }
    wtr.write_record(&record)?;
    Ok(())
}

/// Render the report as CSV text.
pub fn render_csv(report: &Report) -> Result<String> {
    let mut wtr = new_writer(Vec::with_capacity(256 + report.lines.len() * 128));

    wtr.write_record([constants::REPORT_TITLE])?;
    wtr.write_record([format!("Category: {}", report.category_label())])?;
    if let Some(range) = report.filters.date_range_text() {
        wtr.write_record([format!("Date Range: {}", range)])?;
    }
    wtr = blank_line(wtr)?;

    wtr.write_record(constants::REPORT_COLUMNS)?;

    if report.is_empty() {
        wtr.write_record([constants::CSV_NO_DATA_MESSAGE])?;
    } else {
        for line in &report.lines {
            wtr.write_record([
                line.royalty_category.as_str(),
                line.product.as_str(),
                line.order_number.as_str(),
                line.tran_date.as_str(),
                line.quantity.as_str(),
                line.rate.as_str(),
                line.gross_sale.as_str(),
                line.amount_discount.as_str(),
                line.net_sales.as_str(),
                line.amount_tax.as_str(),
                line.total_sales.as_str(),
                line.total_cost.as_str(),
            ])?;
        }

        let totals = &report.totals;
        wtr = blank_line(wtr)?;
        write_summary_row(&mut wtr, "Total Gross Sales", totals.gross_sales)?;
        write_summary_row(&mut wtr, "Total Net Sales", totals.net_sales)?;
        write_summary_row(&mut wtr, "Total Sales", totals.total_sales)?;
        write_summary_row(&mut wtr, "Total Cost", totals.total_cost)?;
        write_summary_row(&mut wtr, "Total Profit", totals.total_profit)?;

        // The split row only makes sense with a configured percentage
        if report.category.as_ref().is_some_and(|c| c.percentage > 0.0) {
            write_summary_row(&mut wtr, &report.royalty_split_label(), report.royalty_amount)?;
        }
    }

    let buf = wtr.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8(buf)?)
}

/// Write `royalty_report.csv` to `output_dir`.
pub fn write_csv_report(output_dir: &Path, report: &Report) -> Result<PathBuf> {
    let path = output_dir.join(constants::CSV_REPORT_FILENAME);
    let csv = render_csv(report)?;
    std::fs::write(&path, csv).with_context(|| format!("Failed to write {}", path.display()))?;
    println!("  Generated: {}", path.display());
    Ok(path)
}
