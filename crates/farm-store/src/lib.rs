#![deny(warnings)]

//! Flat-file JSON persistence for the simulated farm.
//!
//! Four documents live under one directory: the farm, the sensor history,
//! the alert log and the current forecast. The two logs are capped; every
//! document is replaced atomically through a temp file and a rename.

use chrono::{DateTime, Utc};
use farm_core::{Alert, Farm, ForecastDay, PlotStatus, SensorReading, SimConfig};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::{debug, warn};
use uuid::Uuid;

pub const FARM_FILE: &str = "farm_data.json";
pub const SENSOR_FILE: &str = "sensor_data.json";
pub const ALERTS_FILE: &str = "alerts.json";
pub const FORECAST_FILE: &str = "weather_forecast.json";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed json in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, StoreError>;

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> StoreError + '_ {
    move |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Caps on the two append-only logs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Retention {
    pub sensors: usize,
    pub alerts: usize,
}

impl Default for Retention {
    fn default() -> Self {
        Self {
            sensors: 1000,
            alerts: 100,
        }
    }
}

impl From<&SimConfig> for Retention {
    fn from(cfg: &SimConfig) -> Self {
        Self {
            sensors: cfg.sensor_retention,
            alerts: cfg.alert_retention,
        }
    }
}

/// Keep only the newest `cap` items.
fn truncate_front<T>(items: &mut Vec<T>, cap: usize) {
    if items.len() > cap {
        items.drain(..items.len() - cap);
    }
}

#[derive(Clone, Debug)]
pub struct FarmStore {
    dir: PathBuf,
    retention: Retention,
}

impl FarmStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    pub async fn open(dir: impl Into<PathBuf>, retention: Retention) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await.map_err(io_err(&dir))?;
        debug!(dir = %dir.display(), "opened farm store");
        Ok(Self { dir, retention })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn retention(&self) -> Retention {
        self.retention
    }

    fn path(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }

    async fn write_json<T: Serialize + ?Sized>(&self, file: &str, value: &T) -> Result<()> {
        let path = self.path(file);
        let body = serde_json::to_vec_pretty(value).map_err(|source| StoreError::Json {
            path: path.clone(),
            source,
        })?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, body).await.map_err(io_err(&tmp))?;
        fs::rename(&tmp, &path).await.map_err(io_err(&path))?;
        Ok(())
    }

    /// Read a document; `Ok(None)` when the file does not exist.
    async fn read_json<T: DeserializeOwned>(&self, file: &str) -> Result<Option<T>> {
        let path = self.path(file);
        let bytes = match fs::read(&path).await {
            Ok(b) => b,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_err(&path)(e)),
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| StoreError::Json { path, source })
    }

    /// Read a collection, treating a missing or corrupt file as empty.
    async fn read_collection<T: DeserializeOwned>(&self, file: &str) -> Result<Vec<T>> {
        match self.read_json(file).await {
            Ok(v) => Ok(v.unwrap_or_default()),
            Err(StoreError::Json { path, source }) => {
                warn!(path = %path.display(), error = %source, "corrupt collection, reading as empty");
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }

    pub async fn load_farm(&self) -> Result<Option<Farm>> {
        self.read_json(FARM_FILE).await
    }

    pub async fn save_farm(&self, farm: &Farm) -> Result<()> {
        self.write_json(FARM_FILE, farm).await
    }

    /// The newest `limit` readings, oldest first, optionally for one sensor.
    pub async fn sensor_readings(
        &self,
        sensor_id: Option<Uuid>,
        limit: usize,
    ) -> Result<Vec<SensorReading>> {
        let mut readings: Vec<SensorReading> = self.read_collection(SENSOR_FILE).await?;
        if let Some(id) = sensor_id {
            readings.retain(|r| r.sensor_id == id);
        }
        truncate_front(&mut readings, limit);
        Ok(readings)
    }

    /// Append readings, dropping the oldest beyond the sensor cap.
    pub async fn append_readings(&self, new: &[SensorReading]) -> Result<usize> {
        let mut readings: Vec<SensorReading> = self.read_collection(SENSOR_FILE).await?;
        readings.extend_from_slice(new);
        truncate_front(&mut readings, self.retention.sensors);
        self.write_json(SENSOR_FILE, &readings).await?;
        Ok(readings.len())
    }

    /// The full alert log, oldest first.
    pub async fn alerts(&self) -> Result<Vec<Alert>> {
        self.read_collection(ALERTS_FILE).await
    }

    /// Append alerts, dropping the oldest beyond the alert cap.
    pub async fn append_alerts(&self, new: &[Alert]) -> Result<usize> {
        let mut alerts: Vec<Alert> = self.read_collection(ALERTS_FILE).await?;
        alerts.extend_from_slice(new);
        truncate_front(&mut alerts, self.retention.alerts);
        self.write_json(ALERTS_FILE, &alerts).await?;
        Ok(alerts.len())
    }

    /// Replace the alert log wholesale, still honouring the cap.
    pub async fn replace_alerts(&self, alerts: &[Alert]) -> Result<()> {
        let keep = &alerts[alerts.len().saturating_sub(self.retention.alerts)..];
        self.write_json(ALERTS_FILE, keep).await
    }

    /// Replace the sensor history wholesale, still honouring the cap.
    pub async fn replace_readings(&self, readings: &[SensorReading]) -> Result<()> {
        let keep = &readings[readings.len().saturating_sub(self.retention.sensors)..];
        self.write_json(SENSOR_FILE, keep).await
    }

    pub async fn forecast(&self) -> Result<Vec<ForecastDay>> {
        self.read_collection(FORECAST_FILE).await
    }

    pub async fn save_forecast(&self, forecast: &[ForecastDay]) -> Result<()> {
        self.write_json(FORECAST_FILE, forecast).await
    }

    /// Set a plot's status. `Ok(false)` when there is no farm or no such plot.
    pub async fn update_plot_status(
        &self,
        plot_id: Uuid,
        status: PlotStatus,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let Some(mut farm) = self.load_farm().await? else {
            return Ok(false);
        };
        let Some(plot) = farm.plot_mut(plot_id) else {
            return Ok(false);
        };
        plot.status = status;
        plot.last_updated = now;
        self.save_farm(&farm).await?;
        Ok(true)
    }

    /// Flip a plot's irrigation and return the new state.
    pub async fn toggle_irrigation(&self, plot_id: Uuid, now: DateTime<Utc>) -> Result<Option<bool>> {
        let Some(mut farm) = self.load_farm().await? else {
            return Ok(None);
        };
        let Some(plot) = farm.plot_mut(plot_id) else {
            return Ok(None);
        };
        plot.irrigation_status = !plot.irrigation_status;
        plot.last_updated = now;
        let state = plot.irrigation_status;
        self.save_farm(&farm).await?;
        Ok(Some(state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    async fn store(dir: &Path, retention: Retention) -> FarmStore {
        FarmStore::open(dir.join("data"), retention).await.unwrap()
    }

    fn sample_farm(seed: u64) -> Farm {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        farm_sim::farm::generate(&mut rng, None, Utc::now())
    }

    #[tokio::test]
    async fn empty_store_reads_as_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let s = store(tmp.path(), Retention::default()).await;
        assert!(s.load_farm().await.unwrap().is_none());
        assert!(s.sensor_readings(None, 100).await.unwrap().is_empty());
        assert!(s.alerts().await.unwrap().is_empty());
        assert!(s.forecast().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn farm_roundtrip_and_plot_mutations() {
        let tmp = tempfile::tempdir().unwrap();
        let s = store(tmp.path(), Retention::default()).await;
        let farm = sample_farm(3);
        s.save_farm(&farm).await.unwrap();
        assert_eq!(s.load_farm().await.unwrap().as_ref(), Some(&farm));

        let plot = &farm.plots[0];
        let later = Utc::now() + chrono::Duration::minutes(5);
        assert!(s
            .update_plot_status(plot.id, PlotStatus::Harvesting, later)
            .await
            .unwrap());
        let toggled = s.toggle_irrigation(plot.id, later).await.unwrap();
        assert_eq!(toggled, Some(!plot.irrigation_status));

        let stored = s.load_farm().await.unwrap().unwrap();
        let p = stored.plot(plot.id).unwrap();
        assert_eq!(p.status, PlotStatus::Harvesting);
        assert_eq!(p.last_updated, later);
        assert_eq!(p.irrigation_status, !plot.irrigation_status);

        let missing = Uuid::from_u128(404);
        assert!(!s.update_plot_status(missing, PlotStatus::Idle, later).await.unwrap());
        assert_eq!(s.toggle_irrigation(missing, later).await.unwrap(), None);
        assert!(!tmp.path().join("data").join("farm_data.json.tmp").exists());
    }

    #[tokio::test]
    async fn readings_are_capped_oldest_first() {
        let tmp = tempfile::tempdir().unwrap();
        let s = store(
            tmp.path(),
            Retention {
                sensors: 10,
                alerts: 5,
            },
        )
        .await;
        let farm = sample_farm(4);
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let history = farm_sim::sensor::farm_history(&mut rng, &farm, Utc::now(), 2, 6);
        assert!(history.len() > 10);

        let kept = s.append_readings(&history).await.unwrap();
        assert_eq!(kept, 10);
        let stored = s.sensor_readings(None, 1000).await.unwrap();
        assert_eq!(stored, history[history.len() - 10..].to_vec());

        let last = stored.last().unwrap().sensor_id;
        let mine = s.sensor_readings(Some(last), 2).await.unwrap();
        assert!(!mine.is_empty() && mine.len() <= 2);
        assert!(mine.iter().all(|r| r.sensor_id == last));
    }

    #[tokio::test]
    async fn alerts_are_capped() {
        let tmp = tempfile::tempdir().unwrap();
        let s = store(
            tmp.path(),
            Retention {
                sensors: 10,
                alerts: 3,
            },
        )
        .await;
        let farm = sample_farm(5);
        let mut fleet: Vec<_> = farm.equipment().cloned().collect();
        for e in &mut fleet {
            e.efficiency = 50.0;
        }
        let now = Utc::now();
        let mut all = Vec::new();
        for i in 0..3 {
            let batch = farm_sim::alerts::derive(&fleet, now + chrono::Duration::seconds(i));
            s.append_alerts(&batch).await.unwrap();
            all.extend(batch);
        }
        let stored = s.alerts().await.unwrap();
        assert_eq!(stored, all[all.len() - 3..].to_vec());
    }

    #[tokio::test]
    async fn corrupt_collection_reads_empty_but_corrupt_farm_errors() {
        let tmp = tempfile::tempdir().unwrap();
        let s = store(tmp.path(), Retention::default()).await;
        tokio::fs::write(s.dir().join(SENSOR_FILE), b"{not json").await.unwrap();
        tokio::fs::write(s.dir().join(FARM_FILE), b"[1, 2").await.unwrap();
        assert!(s.sensor_readings(None, 10).await.unwrap().is_empty());
        assert!(matches!(s.load_farm().await, Err(StoreError::Json { .. })));
    }

    #[tokio::test]
    async fn forecast_roundtrip() {
        let tmp = tempfile::tempdir().unwrap();
        let s = store(tmp.path(), Retention::default()).await;
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        let farm = sample_farm(6);
        let f = farm_sim::forecast::generate(&mut rng, &farm.coordinates, 7, Utc::now());
        s.save_forecast(&f).await.unwrap();
        assert_eq!(s.forecast().await.unwrap(), f);
    }
}
