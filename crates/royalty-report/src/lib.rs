//! Royalty aggregation and reporting
//!
//! Takes exported sales transaction lines (invoices, cash sales and their
//! returns), sums them per report, computes the royalty owed for a category's
//! configured split, and renders the result as HTML, CSV or JSON.
//!
//! ```text
//! load_lines -> select_lines -> build_report -> write_{html,csv,json}_report
//! ```

pub mod aggregate;
pub mod amount;
pub mod config;
pub mod constants;
pub mod csv_export;
pub mod html_report;
pub mod report;
pub mod royalty;
pub mod source;
pub mod types;

pub use amount::format_amount;
pub use config::Config;
pub use report::{build_report, print_summary};
pub use royalty::calculate_royalty;
pub use source::{LineFilter, load_lines, select_lines};
pub use types::{CalculationMethod, Report, ReportFilters, ReportTotals, RoyaltyCategory, TransactionLineRaw};
