//! Configuration for the royalty reporter

use anyhow::{Context, Result};
use serde::de;
use serde::{Deserialize, Deserializer};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::constants;
use crate::types::{CalculationMethod, RoyaltyCategory};

// =============================================================================
// File-based Configuration (royalty.toml)
// =============================================================================

/// Configuration loaded from royalty.toml
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub report: ReportSection,
    #[serde(default)]
    pub categories: Vec<CategoryRecord>,
}

/// Report defaults, overridable from the command line
#[derive(Debug, Default, Deserialize)]
pub struct ReportSection {
    /// Directory reports are written to (default: current directory)
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
    /// Category applied when `--category` is not given
    #[serde(default)]
    pub default_category: Option<String>,
    /// Subsidiary applied when `--subsidiary` is not given
    #[serde(default)]
    pub subsidiary: Option<String>,
}

/// One royalty category record
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryRecord {
    pub id: String,
    pub name: String,
    /// Royalty split stored as a fraction (0.15 = 15%)
    #[serde(default)]
    pub royalty_percent: Option<f64>,
    /// Split in effect before the last change, as a fraction (display only)
    #[serde(default)]
    pub previous_percent: Option<f64>,
    /// `1` = gross sales, `2` = net profit; blank or absent = not configured
    #[serde(default, deserialize_with = "deserialize_method")]
    pub calc_method: Option<CalculationMethod>,
    /// Inactive categories are hidden from listings but still resolve by id
    #[serde(default)]
    pub inactive: bool,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MethodField {
    Code(i64),
    Text(String),
}

/// Method selectors arrive as `1`, `"1"`, `"net_profit"` or `""`.
fn deserialize_method<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<CalculationMethod>, D::Error> {
    match Option::<MethodField>::deserialize(deserializer)? {
        None => Ok(None),
        Some(MethodField::Code(code)) => CalculationMethod::from_code(code).map(Some).map_err(de::Error::custom),
        Some(MethodField::Text(text)) => CalculationMethod::parse_selector(&text).map_err(de::Error::custom),
    }
}

impl FileConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content).with_context(|| {
            format!(
                "Failed to parse {}. Check for:\n\
                 - Missing required fields (categories.id, categories.name)\n\
                 - Invalid TOML syntax (missing quotes, brackets, etc.)\n\
                 - calc_method values other than 1 or 2\n\n\
                 See royalty.toml.example for the expected format.",
                path.display()
            )
        })
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

// =============================================================================
// Runtime Configuration
// =============================================================================

/// Category display row for listings
#[derive(Debug, Clone, PartialEq)]
pub struct CategorySummary {
    pub id: String,
    pub name: String,
    /// Whole-number percentages
    pub split_percent: Option<f64>,
    pub previous_percent: Option<f64>,
    pub method: Option<CalculationMethod>,
}

/// Main configuration struct with parsed values
#[derive(Debug, Default)]
pub struct Config {
    /// All categories, inactive included, sorted by name
    categories: Vec<CategoryRecord>,
    /// Output directory for generated reports
    pub output_dir: PathBuf,
    /// Category applied when none is requested explicitly
    pub default_category: Option<String>,
    /// Subsidiary applied when none is requested explicitly
    pub default_subsidiary: Option<String>,
}

impl Config {
    /// Create config from file config
    pub fn from_file(file_config: FileConfig) -> Result<Self> {
        let mut categories: Vec<CategoryRecord> = Vec::with_capacity(file_config.categories.len());
        for record in file_config.categories {
            anyhow::ensure!(
                !categories.iter().any(|c| c.id == record.id),
                "Duplicate category id '{}' in config",
                record.id
            );
            categories.push(record);
        }
        categories.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(Self {
            categories,
            output_dir: file_config.report.output_dir.unwrap_or_else(|| PathBuf::from(".")),
            default_category: file_config.report.default_category.filter(|c| !c.trim().is_empty()),
            default_subsidiary: file_config.report.subsidiary.filter(|s| !s.trim().is_empty()),
        })
    }

    /// Load from an explicit path, or from `royalty.toml` in the working
    /// directory when present. No file at the default location means no
    /// categories are configured.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(FileConfig::load(path)?),
            None => {
                let default_path = Path::new(constants::DEFAULT_CONFIG_FILENAME);
                if default_path.exists() {
                    Self::from_file(FileConfig::load(default_path)?)
                } else {
                    warn!("no {} found, running without royalty categories", constants::DEFAULT_CONFIG_FILENAME);
                    Ok(Self::default().with_output_dir("."))
                }
            }
        }
    }

    fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Royalty details for a category id.
    ///
    /// Unknown ids yield `None`: the report is still produced but no royalty
    /// is owed. Inactive categories resolve like any other.
    pub fn lookup(&self, category_id: &str) -> Option<RoyaltyCategory> {
        let id = category_id.trim();
        let record = self.categories.iter().find(|c| c.id == id)?;
        if record.inactive {
            debug!(id, "resolving inactive category");
        }
        Some(RoyaltyCategory {
            id: record.id.clone(),
            name: record.name.clone(),
            percentage: record.royalty_percent.map(fraction_to_percent).unwrap_or(0.0),
            method: record.calc_method,
        })
    }

    /// Active categories sorted by name
    pub fn categories(&self) -> Vec<CategorySummary> {
        self.categories
            .iter()
            .filter(|c| !c.inactive)
            .map(|c| CategorySummary {
                id: c.id.clone(),
                name: c.name.clone(),
                split_percent: c.royalty_percent.map(fraction_to_percent),
                previous_percent: c.previous_percent.map(fraction_to_percent),
                method: c.calc_method,
            })
            .collect()
    }
}

/// Convert a stored fraction to a whole-number percentage (0.15 → 15).
///
/// Rounded to six decimals so binary noise (15.000000000000002) never reaches
/// report labels.
pub fn fraction_to_percent(fraction: f64) -> f64 {
    (fraction * 100.0 * 1_000_000.0).round() / 1_000_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        [report]
        output_dir = "out"
        default_category = "2"

        [[categories]]
        id = "2"
        name = "Music"
        royalty_percent = 0.15
        previous_percent = 0.1
        calc_method = 1

        [[categories]]
        id = "5"
        name = "Books"
        royalty_percent = 0.125
        calc_method = "2"

        [[categories]]
        id = "9"
        name = "Archived"
        royalty_percent = 0.5
        calc_method = "1"
        inactive = true

        [[categories]]
        id = "11"
        name = "Apparel"
        calc_method = ""
    "#;

    fn sample_config() -> Config {
        Config::from_file(FileConfig::parse(SAMPLE).unwrap()).unwrap()
    }

    #[test]
    fn test_fraction_to_percent_removes_binary_noise() {
        assert_eq!(fraction_to_percent(0.15), 15.0);
        assert_eq!(fraction_to_percent(0.07), 7.0);
        assert_eq!(fraction_to_percent(0.125), 12.5);
        assert_eq!(fraction_to_percent(0.0), 0.0);
    }

    #[test]
    fn test_lookup_converts_fraction_and_method() {
        let config = sample_config();

        let music = config.lookup("2").unwrap();
        assert_eq!(music.name, "Music");
        assert_eq!(music.percentage, 15.0);
        assert_eq!(music.method, Some(CalculationMethod::GrossSales));

        let books = config.lookup(" 5 ").unwrap();
        assert_eq!(books.percentage, 12.5);
        assert_eq!(books.method, Some(CalculationMethod::NetProfit));
    }

    #[test]
    fn test_lookup_missing_values_default() {
        let apparel = sample_config().lookup("11").unwrap();
        assert_eq!(apparel.percentage, 0.0);
        assert_eq!(apparel.method, None);
    }

    #[test]
    fn test_lookup_unknown_is_none() {
        assert!(sample_config().lookup("404").is_none());
    }

    #[test]
    fn test_lookup_resolves_inactive_category() {
        let archived = sample_config().lookup("9").unwrap();
        assert_eq!(archived.name, "Archived");
        assert_eq!(archived.percentage, 50.0);
        assert_eq!(archived.method, Some(CalculationMethod::GrossSales));

        let only_inactive = r#"
            [[categories]]
            id = "9"
            name = "Retired"
            royalty_percent = 0.5
            calc_method = 1
            inactive = true
        "#;
        let config = Config::from_file(FileConfig::parse(only_inactive).unwrap()).unwrap();
        assert_eq!(config.lookup("9").map(|c| c.percentage), Some(50.0));
        assert!(config.categories().is_empty());
    }

    #[test]
    fn test_categories_sorted_by_name_and_active_only() {
        let names: Vec<String> = sample_config().categories().into_iter().map(|c| c.name).collect();
        assert_eq!(names, ["Apparel", "Books", "Music"]);
    }

    #[test]
    fn test_report_section_defaults() {
        let config = sample_config();
        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert_eq!(config.default_category.as_deref(), Some("2"));
        assert_eq!(config.default_subsidiary, None);

        let empty = Config::from_file(FileConfig::parse("").unwrap()).unwrap();
        assert_eq!(empty.output_dir, PathBuf::from("."));
        assert!(empty.categories().is_empty());
    }

    #[test]
    fn test_invalid_method_is_rejected() {
        let toml = r#"
            [[categories]]
            id = "1"
            name = "Bad"
            calc_method = 7
        "#;
        assert!(FileConfig::parse(toml).is_err());
    }

    #[test]
    fn test_duplicate_ids_are_rejected() {
        let toml = r#"
            [[categories]]
            id = "1"
            name = "A"

            [[categories]]
            id = "1"
            name = "B"
        "#;
        assert!(Config::from_file(FileConfig::parse(toml).unwrap()).is_err());
    }

    #[test]
    fn test_load_reports_missing_file() {
        let err = Config::load(Some(Path::new("/nonexistent/royalty.toml"))).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to read config file"));
    }
}
