//! Traffic-delay savings estimation for AI-optimized traffic signals.
//!
//! # Pipeline
//! - **traffic**: fetch a live congestion reading per intersection
//! - **savings**: turn the reading into dollar estimates
//! - **narrative**: optional LLM summary per town, with retry/backoff
//! - **analysis**: orchestrate the above across the static town registry
//! - **store**: persist per-timeframe JSON snapshots
//! - **api**: HTTP surface (health, trigger, read-back, index page)

pub mod analysis;
pub mod api;
pub mod config;
pub mod narrative;
pub mod registry;
pub mod savings;
pub mod store;
pub mod traffic;
