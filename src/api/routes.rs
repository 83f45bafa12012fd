//! Route definitions and handlers.

use std::fmt::Write as _;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Html,
    routing::{get, post},
    Json, Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use crate::analysis::{self, Orchestrator, TownResult};
use crate::config::Config;
use crate::registry::{Registry, Timeframe};
use crate::store::ResultStore;

/// Shared state for all handlers.
pub struct AppState {
    pub config: Config,
    pub registry: Registry,
    pub orchestrator: Orchestrator,
    pub store: ResultStore,
}

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/health", get(health))
        .route("/api/analyze/:timeframe", post(trigger_analysis))
        .route("/api/results/:timeframe/:town", get(town_results))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind and serve until the process is stopped.
pub async fn serve(state: Arc<AppState>) -> anyhow::Result<()> {
    let addr = state.config.bind_addr;
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "listening");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

fn parse_timeframe(label: &str) -> Result<Timeframe, (StatusCode, String)> {
    Timeframe::from_label(label)
        .ok_or_else(|| (StatusCode::BAD_REQUEST, format!("unknown timeframe: {label}")))
}

/// Run a full orchestration for one timeframe and persist the snapshot.
async fn trigger_analysis(
    State(state): State<Arc<AppState>>,
    Path(timeframe): Path<String>,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    let timeframe = parse_timeframe(&timeframe)?;

    let snapshot = state.orchestrator.run(&state.registry, timeframe).await;
    info!("{}", analysis::render_summary(&snapshot));

    let path = state
        .store
        .write(&snapshot)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    Ok(Json(serde_json::json!({
        "timeframe": timeframe.label(),
        "exported_to": path.to_string_lossy(),
        "towns": snapshot.towns,
    })))
}

/// Read back a previously persisted town result.
async fn town_results(
    State(state): State<Arc<AppState>>,
    Path((timeframe, town)): Path<(String, String)>,
) -> Result<Json<TownResult>, (StatusCode, String)> {
    let timeframe = parse_timeframe(&timeframe)?;

    let result = state
        .store
        .read_town(timeframe, &town)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    match result {
        Some(result) => Ok(Json(result)),
        None => Err((
            StatusCode::NOT_FOUND,
            format!("no snapshot for {town} ({})", timeframe.label()),
        )),
    }
}

/// Server-rendered index page: towns, intersections, and timeframe filters.
async fn index(State(state): State<Arc<AppState>>) -> Html<String> {
    let mut body = String::from(
        "<!DOCTYPE html>\n<html>\n<head><title>AI Traffic Signal Savings</title></head>\n<body>\n\
         <h1>AI-Optimized Traffic Signal Savings</h1>\n<h2>Timeframes</h2>\n<ul>\n",
    );
    for timeframe in Timeframe::ALL {
        let _ = writeln!(body, "  <li>{}</li>", timeframe.label());
    }
    body.push_str("</ul>\n<h2>Towns</h2>\n");
    for town in state.registry.towns() {
        let _ = writeln!(body, "<h3>{}</h3>\n<ul>", town.name);
        for intersection in &town.intersections {
            let _ = writeln!(body, "  <li>{intersection}</li>");
        }
        body.push_str("</ul>\n");
    }
    body.push_str("</body>\n</html>\n");
    Html(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::narrative::NarrativeAnalyzer;
    use crate::traffic::{FlowClient, FlowReading};
    use async_trait::async_trait;
    use chrono::NaiveDate;

    struct StaticFlowClient;

    #[async_trait]
    impl FlowClient for StaticFlowClient {
        async fn fetch(
            &self,
            _timeframe: Timeframe,
            _lat: f64,
            _lon: f64,
        ) -> anyhow::Result<FlowReading> {
            Ok(FlowReading {
                delay_minutes: 2.0,
                total_vehicles: 8000,
            })
        }
    }

    fn test_state(data_dir: &std::path::Path) -> Arc<AppState> {
        let config = Config::default();
        let orchestrator = Orchestrator::new(
            Arc::new(StaticFlowClient),
            Arc::new(NarrativeAnalyzer::disabled()),
            NaiveDate::from_ymd_opt(2025, 3, 9).unwrap(),
        );
        Arc::new(AppState {
            config,
            registry: Registry::buffalo_region(),
            orchestrator,
            store: ResultStore::new(data_dir),
        })
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let Json(body) = health().await;
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn unknown_timeframe_is_a_bad_request() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());

        let err = trigger_analysis(State(state.clone()), Path("realtime".to_string()))
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);

        let err = town_results(
            State(state),
            Path(("yesterday".to_string(), "Buffalo".to_string())),
        )
        .await
        .unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn missing_snapshot_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());

        let err = town_results(
            State(state),
            Path(("past_day".to_string(), "Buffalo".to_string())),
        )
        .await
        .unwrap_err();
        assert_eq!(err.0, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn trigger_then_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());

        let Json(body) = trigger_analysis(State(state.clone()), Path("past_day".to_string()))
            .await
            .unwrap();
        assert_eq!(body["timeframe"], "past_day");
        assert!(body["towns"]["Buffalo"]["intersections"].is_array());

        let Json(result) = town_results(
            State(state.clone()),
            Path(("past_day".to_string(), "Buffalo".to_string())),
        )
        .await
        .unwrap();
        assert_eq!(result.timeframe, "past_day");
        assert_eq!(result.intersections.len(), 5);
        assert_eq!(result.intersections[0].time_savings_usd, 1081.28);

        // A town that was never in the registry stays a 404.
        let err = town_results(
            State(state),
            Path(("past_day".to_string(), "Rochester".to_string())),
        )
        .await
        .unwrap_err();
        assert_eq!(err.0, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn index_lists_towns_and_filters() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());

        let Html(body) = index(State(state)).await;
        assert!(body.contains("past_day"));
        assert!(body.contains("past_year"));
        assert!(body.contains("Buffalo"));
        assert!(body.contains("Delaware Avenue (NY-384) &amp; Niagara Square")
            || body.contains("Delaware Avenue (NY-384) & Niagara Square"));
    }
}
