//! Town analysis orchestrator.
//!
//! Walks the static registry in order, fetching a flow reading and
//! computing savings per intersection, then asks the narrative analyzer
//! for a per-town summary. The run never fails: broken intersections are
//! logged and skipped, and every provider failure has a degraded fallback.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{error, info};

use crate::narrative::NarrativeAnalyzer;
use crate::registry::{Registry, Timeframe};
use crate::savings::{self, round2};
use crate::traffic::FlowClient;

/// Narrative stored for towns where every intersection was skipped.
const NO_DATA_NARRATIVE: &str = "No traffic data available for analysis.";

/// Savings estimate for one intersection. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntersectionResult {
    pub name: String,
    pub delay_minutes: f64,
    pub total_vehicles: i64,
    pub time_savings_usd: f64,
    pub fuel_savings_usd: f64,
}

/// Aggregated results for one town.
///
/// Field names match the persisted snapshot format consumed by the
/// front-end, including the historical `xai_analysis` key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TownResult {
    pub timeframe: String,
    pub intersections: Vec<IntersectionResult>,
    pub total_time_savings: f64,
    pub total_fuel_savings: f64,
    pub xai_analysis: String,
}

impl TownResult {
    fn new(timeframe: Timeframe) -> Self {
        Self {
            timeframe: timeframe.label().to_string(),
            intersections: Vec::new(),
            total_time_savings: 0.0,
            total_fuel_savings: 0.0,
            xai_analysis: String::new(),
        }
    }
}

/// One full orchestration run: every town's result, tagged with the
/// timeframe it was computed for.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisSnapshot {
    pub timeframe: Timeframe,
    /// Town name to result; `BTreeMap` keeps the persisted JSON stable.
    pub towns: BTreeMap<String, TownResult>,
}

/// Runs the per-town analysis pipeline.
pub struct Orchestrator {
    flow: Arc<dyn FlowClient>,
    analyzer: Arc<NarrativeAnalyzer>,
    evaluation_date: NaiveDate,
}

impl Orchestrator {
    pub fn new(
        flow: Arc<dyn FlowClient>,
        analyzer: Arc<NarrativeAnalyzer>,
        evaluation_date: NaiveDate,
    ) -> Self {
        Self {
            flow,
            analyzer,
            evaluation_date,
        }
    }

    /// Analyze every town in the registry for the given timeframe.
    ///
    /// Sequential by design: one intersection, one town, one provider call
    /// at a time, in registry order.
    pub async fn run(&self, registry: &Registry, timeframe: Timeframe) -> AnalysisSnapshot {
        let config = timeframe.config();
        let mut towns = BTreeMap::new();

        for town in registry.towns() {
            let mut result = TownResult::new(timeframe);

            for intersection in &town.intersections {
                let reading = match self
                    .flow
                    .fetch(timeframe, town.coordinate.lat, town.coordinate.lon)
                    .await
                {
                    Ok(reading) => reading,
                    Err(err) => {
                        // Skipped entirely: no zeroed record, no contribution
                        // to totals. Logged so the gap is observable.
                        error!(
                            town = %town.name,
                            intersection = %intersection,
                            error = %err,
                            "skipping intersection"
                        );
                        continue;
                    }
                };

                let savings = savings::calculate(
                    reading.delay_minutes,
                    reading.total_vehicles,
                    &config,
                    self.evaluation_date,
                );

                result.intersections.push(IntersectionResult {
                    name: intersection.clone(),
                    delay_minutes: round2(savings.adjusted_delay),
                    total_vehicles: savings.total_vehicles,
                    time_savings_usd: round2(savings.time_savings_usd),
                    fuel_savings_usd: round2(savings.fuel_savings_usd),
                });
                result.total_time_savings += savings.time_savings_usd;
                result.total_fuel_savings += savings.fuel_savings_usd;
            }

            result.xai_analysis = if result.intersections.is_empty() {
                NO_DATA_NARRATIVE.to_string()
            } else {
                let rendered = render_town_data(&town.name, &result);
                let fingerprint = fingerprint(&rendered);
                self.analyzer
                    .analyze(&town.name, timeframe, &fingerprint, &rendered)
                    .await
            };

            info!(
                town = %town.name,
                %timeframe,
                intersections = result.intersections.len(),
                "town analysis complete"
            );
            towns.insert(town.name.clone(), result);
        }

        AnalysisSnapshot { timeframe, towns }
    }
}

/// Render a town's per-intersection data as the text the narrative prompt
/// (and its fingerprint) is built from.
pub fn render_town_data(town: &str, result: &TownResult) -> String {
    let mut out = format!(
        "Traffic Data for {town} (Timeframe: {}):\n",
        result.timeframe
    );
    for item in &result.intersections {
        let _ = writeln!(
            out,
            "- Intersection: {}, Delay: {} min/vehicle, Vehicles: {}, \
             Time Savings: ${}, Fuel Savings: ${}",
            item.name,
            item.delay_minutes,
            item.total_vehicles,
            item.time_savings_usd,
            item.fuel_savings_usd
        );
    }
    out
}

/// Stable hash of rendered town data, used as the narrative cache key.
pub fn fingerprint(rendered: &str) -> String {
    let digest = Sha256::digest(rendered.as_bytes());
    hex::encode(digest)
}

/// Human-readable summary of a snapshot, used for logging after a run.
pub fn render_summary(snapshot: &AnalysisSnapshot) -> String {
    let mut out = format!("Traffic analysis summary ({}):\n", snapshot.timeframe);
    let mut grand_total = 0.0;
    for (town, result) in &snapshot.towns {
        let town_total = result.total_time_savings + result.total_fuel_savings;
        let _ = writeln!(
            out,
            "  {town}: {} intersections, total savings ${:.2}",
            result.intersections.len(),
            town_total
        );
        grand_total += town_total;
    }
    let _ = write!(out, "Total savings across all towns: ${grand_total:.2}");
    out
}
