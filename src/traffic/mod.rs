//! Traffic data fetcher.
//!
//! Wraps the flow-data provider behind the [`FlowClient`] trait so the
//! orchestrator can be exercised with in-memory fakes. The HTTP
//! implementation is total over its inputs: any provider failure degrades
//! to fixed defaults rather than surfacing an error.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{error, warn};

use crate::config::FlowConfig;
use crate::registry::Timeframe;

/// Delay scale applied to the provider's 0-10 jam factor.
const JAM_FACTOR_DELAY_SCALE: f64 = 0.5;
/// Baseline vehicle count assumed per intersection window.
const BASELINE_VEHICLES: i64 = 8000;
/// Fallback delay when no usable reading is available, minutes per vehicle.
const DEFAULT_DELAY_MINUTES: f64 = 2.0;
/// Provider request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// A congestion reading for one coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlowReading {
    /// Average delay in minutes per vehicle.
    pub delay_minutes: f64,
    /// Assumed vehicle count over the window.
    pub total_vehicles: i64,
}

impl FlowReading {
    /// The fixed default used whenever the provider gives us nothing usable.
    pub fn fallback() -> Self {
        Self {
            delay_minutes: DEFAULT_DELAY_MINUTES,
            total_vehicles: BASELINE_VEHICLES,
        }
    }
}

/// Trait for flow-data sources.
///
/// Implementations may fail; the HTTP client never does (it degrades to
/// defaults internally), but fakes in tests use `Err` to exercise the
/// orchestrator's skip path.
#[async_trait]
pub trait FlowClient: Send + Sync {
    /// Fetch a reading for the given coordinate and lookback window.
    async fn fetch(&self, timeframe: Timeframe, lat: f64, lon: f64)
        -> anyhow::Result<FlowReading>;
}

#[derive(Debug, Deserialize)]
struct FlowResponse {
    #[serde(default)]
    results: Vec<FlowResult>,
}

#[derive(Debug, Deserialize)]
struct FlowResult {
    #[serde(rename = "currentFlow", default)]
    current_flow: Option<CurrentFlow>,
}

#[derive(Debug, Deserialize)]
struct CurrentFlow {
    #[serde(rename = "jamFactor", default)]
    jam_factor: f64,
}

/// HTTP client for the HERE-style `/v7/flow` endpoint.
pub struct HereFlowClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    radius_m: u32,
}

impl HereFlowClient {
    pub fn new(config: &FlowConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            radius_m: config.radius_m,
        })
    }

    async fn request(&self, lat: f64, lon: f64) -> Result<FlowResponse, reqwest::Error> {
        let url = format!(
            "{}?locationReferencing=shape&in=circle:{lat},{lon};r={}&apiKey={}",
            self.base_url, self.radius_m, self.api_key
        );
        let response = self.client.get(url).send().await?.error_for_status()?;
        response.json::<FlowResponse>().await
    }
}

#[async_trait]
impl FlowClient for HereFlowClient {
    async fn fetch(
        &self,
        timeframe: Timeframe,
        lat: f64,
        lon: f64,
    ) -> anyhow::Result<FlowReading> {
        // Known limitation: the provider only serves real-time flow.
        warn!(
            timeframe = %timeframe,
            "historical data not supported by flow provider; using real-time reading"
        );

        let reading = match self.request(lat, lon).await {
            Ok(response) => match reading_from_response(&response, timeframe) {
                Some(reading) => reading,
                None => {
                    warn!(lat, lon, "no traffic data in flow response; using defaults");
                    FlowReading::fallback()
                }
            },
            Err(err) => {
                error!(lat, lon, error = %err, "flow request failed; using defaults");
                FlowReading::fallback()
            }
        };
        Ok(reading)
    }
}

/// Extract and adjust a reading from a provider response.
///
/// Returns `None` when the response carries no results at all; the fallback
/// substitution happens at the call site so it can be logged.
fn reading_from_response(response: &FlowResponse, timeframe: Timeframe) -> Option<FlowReading> {
    let first = response.results.first()?;
    let jam_factor = first
        .current_flow
        .as_ref()
        .map(|flow| flow.jam_factor)
        .unwrap_or(0.0);
    Some(adjust_for_timeframe(
        jam_factor * JAM_FACTOR_DELAY_SCALE,
        BASELINE_VEHICLES,
        timeframe,
    ))
}

/// Apply the per-timeframe confidence adjustment to a real-time reading.
///
/// The vehicle count truncates toward zero, matching the persisted integer
/// counts downstream consumers expect.
fn adjust_for_timeframe(delay_minutes: f64, vehicles: i64, timeframe: Timeframe) -> FlowReading {
    let adjustment = timeframe.flow_adjustment();
    FlowReading {
        delay_minutes: delay_minutes * adjustment.delay_factor,
        total_vehicles: (vehicles as f64 * adjustment.vehicle_factor) as i64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response_from(json: &str) -> FlowResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn empty_results_yield_no_reading() {
        let response = response_from(r#"{"results": []}"#);
        assert_eq!(reading_from_response(&response, Timeframe::PastDay), None);

        let response = response_from("{}");
        assert_eq!(reading_from_response(&response, Timeframe::PastDay), None);
    }

    #[test]
    fn jam_factor_maps_to_delay() {
        let response =
            response_from(r#"{"results": [{"currentFlow": {"jamFactor": 4.0}}]}"#);
        let reading = reading_from_response(&response, Timeframe::PastDay).unwrap();
        // 4.0 * 0.5 = 2.0 raw delay, then day adjustment 1.1 / 0.9
        assert!((reading.delay_minutes - 2.2).abs() < 1e-9);
        assert_eq!(reading.total_vehicles, 7200);
    }

    #[test]
    fn missing_current_flow_is_zero_jam_factor() {
        let response = response_from(r#"{"results": [{}]}"#);
        let reading = reading_from_response(&response, Timeframe::PastWeek).unwrap();
        assert_eq!(reading.delay_minutes, 0.0);
        assert_eq!(reading.total_vehicles, 6400);
    }

    #[test]
    fn adjustment_table_is_exact() {
        let cases = [
            (Timeframe::PastDay, 1.1, 7200),
            (Timeframe::PastWeek, 1.2, 6400),
            (Timeframe::PastMonth, 1.3, 5600),
            (Timeframe::PastYear, 1.4, 4800),
        ];
        for (timeframe, delay_factor, vehicles) in cases {
            let reading = adjust_for_timeframe(2.0, 8000, timeframe);
            assert!(
                (reading.delay_minutes - 2.0 * delay_factor).abs() < 1e-9,
                "{timeframe}"
            );
            assert_eq!(reading.total_vehicles, vehicles, "{timeframe}");
        }
    }

    #[tokio::test]
    async fn network_error_yields_fallback_reading() {
        // Nothing listens on this port; the request fails fast with a
        // connection error and the client must degrade to defaults.
        let client = HereFlowClient::new(&FlowConfig {
            base_url: "http://127.0.0.1:9/v7/flow".to_string(),
            api_key: "test".to_string(),
            radius_m: 500,
        })
        .unwrap();

        let reading = client
            .fetch(Timeframe::PastDay, 42.8864, -78.8784)
            .await
            .unwrap();
        assert_eq!(reading, FlowReading::fallback());
    }
}
