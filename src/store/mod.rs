//! Result store: per-timeframe JSON snapshot files.
//!
//! One file per timeframe, overwritten wholesale on each run. The file is
//! the sole durable record; there is no history and no coordination between
//! concurrent writers (last writer wins).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use crate::analysis::{AnalysisSnapshot, TownResult};
use crate::registry::Timeframe;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("snapshot serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("snapshot i/o failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Reads and writes persisted analysis snapshots.
pub struct ResultStore {
    data_dir: PathBuf,
}

impl ResultStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Path of the snapshot file for a timeframe.
    pub fn snapshot_path(&self, timeframe: Timeframe) -> PathBuf {
        self.data_dir
            .join(format!("traffic_results_{}.json", timeframe.label()))
    }

    /// Persist a snapshot, replacing any prior file for its timeframe.
    pub async fn write(&self, snapshot: &AnalysisSnapshot) -> Result<PathBuf, StoreError> {
        tokio::fs::create_dir_all(&self.data_dir).await?;
        let path = self.snapshot_path(snapshot.timeframe);
        let body = serde_json::to_string_pretty(&snapshot.towns)?;
        tokio::fs::write(&path, body).await?;
        info!(path = %path.display(), "snapshot exported");
        Ok(path)
    }

    /// Read back the snapshot for a timeframe; `None` if never written.
    pub async fn read(&self, timeframe: Timeframe) -> Result<Option<AnalysisSnapshot>, StoreError> {
        let path = self.snapshot_path(timeframe);
        let body = match tokio::fs::read_to_string(&path).await {
            Ok(body) => body,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let towns: BTreeMap<String, TownResult> = serde_json::from_str(&body)?;
        Ok(Some(AnalysisSnapshot { timeframe, towns }))
    }

    /// Read a single town's result for a timeframe.
    pub async fn read_town(
        &self,
        timeframe: Timeframe,
        town: &str,
    ) -> Result<Option<TownResult>, StoreError> {
        let snapshot = self.read(timeframe).await?;
        Ok(snapshot.and_then(|mut s| s.towns.remove(town)))
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::IntersectionResult;

    fn sample_snapshot(timeframe: Timeframe) -> AnalysisSnapshot {
        let mut towns = BTreeMap::new();
        towns.insert(
            "Buffalo".to_string(),
            TownResult {
                timeframe: timeframe.label().to_string(),
                intersections: vec![IntersectionResult {
                    name: "Delaware Avenue (NY-384) & Niagara Square".to_string(),
                    delay_minutes: 2.03,
                    total_vehicles: 7200,
                    time_savings_usd: 973.15,
                    fuel_savings_usd: 140.13,
                }],
                total_time_savings: 973.1519,
                total_fuel_savings: 140.1338,
                xai_analysis: "Signals on Delaware are the bottleneck.".to_string(),
            },
        );
        AnalysisSnapshot { timeframe, towns }
    }

    #[tokio::test]
    async fn write_then_read_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResultStore::new(dir.path());

        let snapshot = sample_snapshot(Timeframe::PastDay);
        let path = store.write(&snapshot).await.unwrap();
        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "traffic_results_past_day.json"
        );

        let loaded = store.read(Timeframe::PastDay).await.unwrap().unwrap();
        assert_eq!(loaded, snapshot);
    }

    #[tokio::test]
    async fn missing_snapshot_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResultStore::new(dir.path());

        assert!(store.read(Timeframe::PastYear).await.unwrap().is_none());
        assert!(store
            .read_town(Timeframe::PastYear, "Buffalo")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn read_town_distinguishes_missing_town_from_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResultStore::new(dir.path());
        store.write(&sample_snapshot(Timeframe::PastWeek)).await.unwrap();

        let buffalo = store
            .read_town(Timeframe::PastWeek, "Buffalo")
            .await
            .unwrap();
        assert!(buffalo.is_some());

        let nowhere = store
            .read_town(Timeframe::PastWeek, "Nowhere")
            .await
            .unwrap();
        assert!(nowhere.is_none());
    }

    #[tokio::test]
    async fn rewrite_overwrites_prior_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResultStore::new(dir.path());

        let mut snapshot = sample_snapshot(Timeframe::PastMonth);
        store.write(&snapshot).await.unwrap();

        snapshot
            .towns
            .get_mut("Buffalo")
            .unwrap()
            .xai_analysis = "Updated analysis.".to_string();
        store.write(&snapshot).await.unwrap();

        let loaded = store.read(Timeframe::PastMonth).await.unwrap().unwrap();
        assert_eq!(
            loaded.towns["Buffalo"].xai_analysis,
            "Updated analysis."
        );
    }
}
