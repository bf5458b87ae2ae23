//! Shared constants (file names, column headers, display labels)

/// CSV export output filename
pub const CSV_REPORT_FILENAME: &str = "royalty_report.csv";

/// HTML report output filename
pub const HTML_REPORT_FILENAME: &str = "royalty_report.html";

/// JSON report output filename
pub const JSON_REPORT_FILENAME: &str = "royalty_report.json";

/// Default config file looked up when `--config` is not given
pub const DEFAULT_CONFIG_FILENAME: &str = "royalty.toml";

/// Environment variable holding the tracing filter directive
pub const LOG_ENV_VAR: &str = "ROYALTY_LOG";

/// Report title (first line of the CSV preamble, page heading in HTML)
pub const REPORT_TITLE: &str = "Royalty Report";

/// Category label used when no category filter is applied
pub const ALL_CATEGORIES_LABEL: &str = "All Categories";

/// Line-level columns shared by the CSV export and the HTML table
pub const REPORT_COLUMNS: [&str; 12] = [
    "Royalty Category",
    "Product",
    "Order #",
    "Date",
    "Quantity",
    "Rate",
    "Gross Sales",
    "Discounts",
    "Net Sales",
    "Taxes",
    "Total Sales",
    "Total Cost",
];

/// Placeholder row in the CSV export when no lines matched
pub const CSV_NO_DATA_MESSAGE: &str = "No data found for the selected criteria";

/// Placeholder row in the HTML table when no lines matched
pub const HTML_NO_RESULTS_MESSAGE: &str = "No results found for the selected criteria.";

/// Accepted input date formats (ISO first, then US short form)
pub const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%m/%d/%Y"];
