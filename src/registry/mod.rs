//! Static town/intersection registry and timeframe tables.
//!
//! The registry is configuration, not computed data: it is constructed once
//! at startup, never mutated, and passed explicitly to the orchestrator.

use serde::{Deserialize, Serialize};

/// Lookback window for an analysis run.
///
/// The flow provider only serves real-time data; each timeframe maps to a
/// fixed set of adjustment factors that simulate degraded confidence over
/// longer windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Timeframe {
    PastDay,
    PastWeek,
    PastMonth,
    PastYear,
}

/// Per-timeframe window configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeframeConfig {
    pub days: i64,
    pub workdays: u32,
    pub peak_hours: u32,
}

/// Multiplicative adjustment applied to a real-time flow reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlowAdjustment {
    pub delay_factor: f64,
    pub vehicle_factor: f64,
}

impl Timeframe {
    pub const ALL: [Timeframe; 4] = [
        Timeframe::PastDay,
        Timeframe::PastWeek,
        Timeframe::PastMonth,
        Timeframe::PastYear,
    ];

    /// The wire/file label for this timeframe.
    pub fn label(&self) -> &'static str {
        match self {
            Timeframe::PastDay => "past_day",
            Timeframe::PastWeek => "past_week",
            Timeframe::PastMonth => "past_month",
            Timeframe::PastYear => "past_year",
        }
    }

    /// Parse a label back into a timeframe.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "past_day" => Some(Timeframe::PastDay),
            "past_week" => Some(Timeframe::PastWeek),
            "past_month" => Some(Timeframe::PastMonth),
            "past_year" => Some(Timeframe::PastYear),
            _ => None,
        }
    }

    /// Window configuration (day count, workdays, peak hours).
    pub fn config(&self) -> TimeframeConfig {
        match self {
            Timeframe::PastDay => TimeframeConfig { days: 1, workdays: 1, peak_hours: 8 },
            Timeframe::PastWeek => TimeframeConfig { days: 7, workdays: 5, peak_hours: 8 },
            Timeframe::PastMonth => TimeframeConfig { days: 30, workdays: 22, peak_hours: 8 },
            Timeframe::PastYear => TimeframeConfig { days: 365, workdays: 250, peak_hours: 8 },
        }
    }

    /// Adjustment factors applied to the real-time reading for this window.
    pub fn flow_adjustment(&self) -> FlowAdjustment {
        match self {
            Timeframe::PastDay => FlowAdjustment { delay_factor: 1.1, vehicle_factor: 0.9 },
            Timeframe::PastWeek => FlowAdjustment { delay_factor: 1.2, vehicle_factor: 0.8 },
            Timeframe::PastMonth => FlowAdjustment { delay_factor: 1.3, vehicle_factor: 0.7 },
            Timeframe::PastYear => FlowAdjustment { delay_factor: 1.4, vehicle_factor: 0.6 },
        }
    }
}

impl std::fmt::Display for Timeframe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Geographic coordinate (WGS84).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

/// A town with its monitored intersections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Town {
    pub name: String,
    pub coordinate: Coordinate,
    /// Intersection names, in analysis order.
    pub intersections: Vec<String>,
}

/// Read-only registry of towns under analysis.
#[derive(Debug, Clone)]
pub struct Registry {
    towns: Vec<Town>,
}

impl Registry {
    pub fn new(towns: Vec<Town>) -> Self {
        Self { towns }
    }

    /// Towns in registry (analysis) order.
    pub fn towns(&self) -> &[Town] {
        &self.towns
    }

    /// Look up a town by name.
    pub fn get(&self, name: &str) -> Option<&Town> {
        self.towns.iter().find(|t| t.name == name)
    }

    /// The deployed Buffalo-area registry: ten towns, five intersections each.
    pub fn buffalo_region() -> Self {
        fn town(name: &str, lat: f64, lon: f64, intersections: [&str; 5]) -> Town {
            Town {
                name: name.to_string(),
                coordinate: Coordinate { lat, lon },
                intersections: intersections.iter().map(|s| s.to_string()).collect(),
            }
        }

        Self::new(vec![
            town("Amherst", 42.9784, -78.7998, [
                "Transit Road (NY-78) & Maple Road",
                "Sheridan Drive (NY-324) & Niagara Falls Boulevard (US-62)",
                "Main Street (NY-5) & Eggert Road",
                "Millersport Highway (NY-263) & Sheridan Drive",
                "Maple Road & North Forest Road",
            ]),
            town("Buffalo", 42.8864, -78.8784, [
                "Delaware Avenue (NY-384) & Niagara Square",
                "Main Street (NY-5) & Bailey Avenue (US-62)",
                "Elmwood Avenue & Hertel Avenue",
                "Kensington Avenue (NY-33) & Harlem Road",
                "Jefferson Avenue & Best Street",
            ]),
            town("Cheektowaga", 42.9034, -78.7548, [
                "Walden Avenue & Union Road (NY-277)",
                "Genesee Street (NY-33) & Transit Road",
                "Harlem Road (NY-240) & Walden Avenue",
                "Union Road & George Urban Boulevard",
                "Dick Road & Genesee Street",
            ]),
            town("Evans", 42.6384, -79.0278, [
                "US-20 (Southwestern Boulevard) & NY-5",
                "NY-5 & Sturgeon Point Road",
                "US-20 & Kennedy Avenue",
                "NY-5 & Derby Road",
                "US-20 & Bennett Road",
            ]),
            town("Grand Island", 43.0130, -78.9654, [
                "Grand Island Boulevard (NY-324) & I-190 Ramps",
                "Staley Road & Grand Island Boulevard",
                "Baseline Road & Grand Island Boulevard",
                "Whitehaven Road & East River Road",
                "I-190 & West River Parkway",
            ]),
            town("Hamburg", 42.7159, -78.8295, [
                "US-62 (South Park Avenue) & McKinley Parkway",
                "NY-5 & Camp Road",
                "US-20 & NY-75 (Camp Road)",
                "McKinley Parkway & Southwestern Boulevard (US-20)",
                "NY-5 & Sowles Road",
            ]),
            town("Lancaster", 42.9006, -78.6700, [
                "Transit Road (NY-78) & Walden Avenue",
                "Broadway (US-20) & Bowen Road",
                "Transit Road & Genesee Street",
                "Aurora Street & Pavement Road",
                "Walden Avenue & Central Avenue",
            ]),
            town("Orchard Park", 42.7675, -78.7440, [
                "US-20A & NY-240 (Orchard Park Road)",
                "US-219 & Milestrip Road",
                "NY-277 & Southwestern Boulevard (US-20)",
                "Big Tree Road (NY-20A) & California Road",
                "US-20 & Powers Road",
            ]),
            town("Tonawanda", 43.0203, -78.8803, [
                "Niagara Falls Boulevard (US-62) & Sheridan Drive",
                "Delaware Avenue (NY-384) & Sheridan Drive",
                "Young Street & Colvin Boulevard",
                "Niagara Falls Boulevard & Ellicott Creek Road",
                "Kenmore Avenue & Military Road",
            ]),
            town("West Seneca", 42.8303, -78.7498, [
                "Union Road (NY-277) & Seneca Street (NY-16)",
                "Transit Road (NY-78) & Clinton Street",
                "Ridge Road & Orchard Park Road",
                "Seneca Street & Harlem Road",
                "Union Road & Center Road",
            ]),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeframe_labels_round_trip() {
        for tf in Timeframe::ALL {
            assert_eq!(Timeframe::from_label(tf.label()), Some(tf));
        }
        assert_eq!(Timeframe::from_label("realtime"), None);
    }

    #[test]
    fn timeframe_serde_uses_snake_case_labels() {
        let json = serde_json::to_string(&Timeframe::PastWeek).unwrap();
        assert_eq!(json, "\"past_week\"");
        let parsed: Timeframe = serde_json::from_str("\"past_year\"").unwrap();
        assert_eq!(parsed, Timeframe::PastYear);
    }

    #[test]
    fn timeframe_configs_match_table() {
        assert_eq!(Timeframe::PastDay.config().days, 1);
        assert_eq!(Timeframe::PastWeek.config().workdays, 5);
        assert_eq!(Timeframe::PastMonth.config().days, 30);
        assert_eq!(Timeframe::PastYear.config().workdays, 250);
        for tf in Timeframe::ALL {
            assert_eq!(tf.config().peak_hours, 8);
        }
    }

    #[test]
    fn buffalo_registry_is_complete() {
        let registry = Registry::buffalo_region();
        assert_eq!(registry.towns().len(), 10);
        for town in registry.towns() {
            assert_eq!(town.intersections.len(), 5, "{}", town.name);
        }
        let buffalo = registry.get("Buffalo").unwrap();
        assert!((buffalo.coordinate.lat - 42.8864).abs() < 1e-9);
    }
}
