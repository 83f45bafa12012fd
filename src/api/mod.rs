//! HTTP API for the savings service.
//!
//! ## Endpoints
//!
//! - `GET /` - Index page listing towns and timeframe filters
//! - `GET /api/health` - Health check
//! - `POST /api/analyze/:timeframe` - Run analysis and persist the snapshot
//! - `GET /api/results/:timeframe/:town` - Read back a persisted town result

mod routes;

pub use routes::{router, serve, AppState};
