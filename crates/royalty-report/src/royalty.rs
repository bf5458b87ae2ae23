//! Royalty split calculation

use tracing::debug;

use crate::types::CalculationMethod;

/// Royalty owed on the report totals.
///
/// `percentage` is a whole-number percentage (15 means 15%). A missing,
/// zero, negative or NaN percentage means nothing is owed, as does an
/// unconfigured method.
pub fn calculate_royalty(
    gross_sales: f64,
    total_profit: f64,
    percentage: Option<f64>,
    method: Option<CalculationMethod>,
) -> f64 {
    debug!(gross_sales, total_profit, ?percentage, ?method, "calculating royalty");

    let Some(percentage) = percentage else {
        return 0.0;
    };
    if percentage.is_nan() || percentage <= 0.0 {
        return 0.0;
    }

    let fraction = percentage / 100.0;
    match method {
        Some(CalculationMethod::GrossSales) => gross_sales * fraction,
        Some(CalculationMethod::NetProfit) => total_profit * fraction,
        None => 0.0,
    }
}
