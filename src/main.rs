//! Service entry point: config, tracing, and the HTTP server.

use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use signal_savings::analysis::Orchestrator;
use signal_savings::api::{self, AppState};
use signal_savings::config::Config;
use signal_savings::narrative::{NarrativeAnalyzer, XaiClient};
use signal_savings::registry::Registry;
use signal_savings::store::ResultStore;
use signal_savings::traffic::{FlowClient, HereFlowClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env().context("loading configuration")?;
    let registry = Registry::buffalo_region();

    let flow: Arc<dyn FlowClient> =
        Arc::new(HereFlowClient::new(&config.flow).context("building flow client")?);

    let analyzer = if config.narrative.enabled {
        let client = XaiClient::new(&config.narrative).context("building completion client")?;
        NarrativeAnalyzer::new(Arc::new(client))
    } else {
        warn!("narrative generation disabled; towns will get placeholder analyses");
        NarrativeAnalyzer::disabled()
    };

    let orchestrator = Orchestrator::new(flow, Arc::new(analyzer), config.evaluation_date);
    let store = ResultStore::new(config.data_dir.clone());

    info!(
        towns = registry.towns().len(),
        data_dir = %store.data_dir().display(),
        "starting signal-savings service"
    );

    let state = Arc::new(AppState {
        config,
        registry,
        orchestrator,
        store,
    });
    api::serve(state).await
}
