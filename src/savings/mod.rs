//! Savings calculator.
//!
//! Pure arithmetic: a congestion reading plus a timeframe window becomes
//! dollar estimates for time and fuel saved by AI-optimized signals.

use chrono::{Duration, NaiveDate};

use crate::registry::TimeframeConfig;

/// Average hourly wage used to price saved time, USD.
const HOURLY_WAGE: f64 = 20.0;
/// Fuel burned while idling, gallons per vehicle-minute.
const FUEL_CONSUMPTION_PER_MIN: f64 = 0.016;
/// Fuel price, USD per gallon.
const FUEL_COST_PER_GALLON: f64 = 3.0;
/// Fraction of delay the signal optimization removes.
const AI_REDUCTION_PERCENT: f64 = 0.20;

/// Computed savings for one intersection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Savings {
    pub time_savings_usd: f64,
    pub fuel_savings_usd: f64,
    pub adjusted_delay: f64,
    pub total_vehicles: i64,
}

/// Weather-impact multiplier over the analysis window.
///
/// The window start is derived from the same day count that normalizes the
/// ratio, so this currently evaluates to a constant 1.0137. Kept in this
/// form deliberately: the multiplier is defined over the date range, and
/// decoupling the window bounds from the config would reactivate it.
fn weather_impact(config: &TimeframeConfig, evaluation_date: NaiveDate) -> f64 {
    let start_date = evaluation_date - Duration::days(config.days);
    let elapsed_days = (evaluation_date - start_date).num_days();
    1.0 + 0.10 * 0.137 * elapsed_days as f64 / config.days as f64
}

/// Estimate savings for a single intersection.
pub fn calculate(
    base_delay: f64,
    total_vehicles: i64,
    config: &TimeframeConfig,
    evaluation_date: NaiveDate,
) -> Savings {
    let adjusted_delay = base_delay * weather_impact(config, evaluation_date);

    let total_delay_minutes = total_vehicles as f64 * adjusted_delay;
    let saved_minutes = total_delay_minutes * AI_REDUCTION_PERCENT;
    let time_savings_usd = saved_minutes / 60.0 * HOURLY_WAGE;
    let fuel_savings_usd = saved_minutes * FUEL_CONSUMPTION_PER_MIN * FUEL_COST_PER_GALLON;

    Savings {
        time_savings_usd,
        fuel_savings_usd,
        adjusted_delay,
        total_vehicles,
    }
}

/// Round to two decimal places for display/persistence.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
