#![deny(warnings)]

//! Live simulation runtime.
//!
//! [`FarmRuntime`] owns the store and the seeded simulator and performs one
//! tick at a time: fresh readings, crop growth, periodic alerts and
//! forecasts. Every write happens under a single async mutex, so the runtime
//! is the only writer of the store. Results are fanned out to subscribers
//! over a broadcast channel as [`LiveEvent`]s.
//!
//! [`FarmRuntime::spawn`] drives ticks on a tokio interval and returns a
//! [`SimulationHandle`] that cancels the loop through a watch channel.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use farm_core::{
    region_by_name, Alert, ConfigError, Farm, ForecastDay, PlotStatus, SensorReading, Severity,
    SimConfig,
};
use farm_sim::{alerts, Simulator};
use farm_store::{FarmStore, Retention, StoreError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{broadcast, watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, trace};
use uuid::Uuid;

/// Buffered events per subscriber before the slowest one starts lagging.
pub const EVENT_CAPACITY: usize = 256;
/// Stored alerts attached to every live update.
pub const LIVE_ALERTS: usize = 5;
/// Readings older than this make the data stale.
pub const FRESHNESS_SECS: i64 = 300;
/// Alerts inspected by the health check.
pub const HEALTH_ALERT_WINDOW: usize = 10;
/// Active alerts at which the health check turns to warning.
pub const HEALTH_ALERT_LIMIT: usize = 5;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("plot not found: {0}")]
    PlotNotFound(Uuid),
    #[error("no farm document in the store")]
    NoFarm,
    #[error("simulation task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, RuntimeError>;

/// Messages pushed to subscribers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LiveEvent {
    LiveUpdate {
        timestamp: DateTime<Utc>,
        sensor_data: Vec<SensorReading>,
        alerts: Vec<Alert>,
    },
    PlotUpdate {
        timestamp: DateTime<Utc>,
        plot_id: Uuid,
        status: PlotStatus,
    },
    IrrigationUpdate {
        timestamp: DateTime<Utc>,
        plot_id: Uuid,
        irrigation_status: bool,
    },
    WeatherUpdate {
        timestamp: DateTime<Utc>,
        forecast: Vec<ForecastDay>,
    },
    NewAlerts {
        timestamp: DateTime<Utc>,
        alerts: Vec<Alert>,
    },
    FarmRegenerated {
        timestamp: DateTime<Utc>,
        farm_id: Uuid,
        farm_name: String,
    },
}

/// What one tick did.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TickReport {
    pub tick: u64,
    pub readings: usize,
    pub alerts: usize,
    pub crops_advanced: usize,
    pub forecast_refreshed: bool,
}

/// Counts from a full dataset regeneration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DatasetSummary {
    pub farm_name: String,
    pub plots: usize,
    pub sensors: usize,
    pub equipment: usize,
    pub readings_generated: usize,
    pub readings_kept: usize,
    pub alerts: usize,
    pub forecast_days: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceStatus {
    Healthy,
    Warning,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: ServiceStatus,
    pub timestamp: DateTime<Utc>,
    pub simulation_running: bool,
    pub data_fresh: bool,
    pub last_reading: Option<DateTime<Utc>>,
    pub active_alerts: usize,
}

/// Health from the newest reading time and the recent alert log.
pub fn assess_health(
    last_reading: Option<DateTime<Utc>>,
    alerts: &[Alert],
    running: bool,
    now: DateTime<Utc>,
) -> HealthReport {
    let data_fresh =
        last_reading.map_or(false, |t| now - t <= ChronoDuration::seconds(FRESHNESS_SECS));
    let recent = &alerts[alerts.len().saturating_sub(HEALTH_ALERT_WINDOW)..];
    let active_alerts = recent
        .iter()
        .filter(|a| matches!(a.severity, Severity::High | Severity::Medium))
        .count();
    let status = if data_fresh && active_alerts < HEALTH_ALERT_LIMIT {
        ServiceStatus::Healthy
    } else {
        ServiceStatus::Warning
    };
    HealthReport {
        status,
        timestamp: now,
        simulation_running: running,
        data_fresh,
        last_reading,
        active_alerts,
    }
}

pub struct FarmRuntime {
    config: SimConfig,
    store: FarmStore,
    sim: Mutex<Simulator>,
    events: broadcast::Sender<LiveEvent>,
}

impl FarmRuntime {
    /// Open the store and seed a farm and forecast if none exist yet.
    pub async fn new(config: SimConfig) -> Result<Self> {
        config.validate()?;
        let store = FarmStore::open(&config.data_dir, Retention::from(&config)).await?;
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let runtime = Self {
            sim: Mutex::new(Simulator::from_config(&config)),
            config,
            store,
            events,
        };
        runtime.bootstrap(Utc::now()).await?;
        Ok(runtime)
    }

    async fn bootstrap(&self, now: DateTime<Utc>) -> Result<()> {
        let mut sim = self.sim.lock().await;
        let farm = match self.store.load_farm().await? {
            Some(farm) => farm,
            None => {
                let farm = sim.farm(self.region(), now);
                self.store.save_farm(&farm).await?;
                info!(farm = %farm.name, plots = farm.plots.len(), "seeded new farm");
                farm
            }
        };
        if self.store.forecast().await?.is_empty() {
            let days = sim.forecast(&farm.coordinates, self.config.forecast_days, now);
            self.store.save_forecast(&days).await?;
        }
        Ok(())
    }

    fn region(&self) -> Option<&'static farm_core::Region> {
        self.config.region.as_deref().and_then(region_by_name)
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn store(&self) -> &FarmStore {
        &self.store
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LiveEvent> {
        self.events.subscribe()
    }

    fn publish(&self, event: LiveEvent) {
        if self.events.send(event).is_err() {
            trace!("no subscribers for live event");
        }
    }

    pub async fn farm(&self) -> Result<Farm> {
        self.store.load_farm().await?.ok_or(RuntimeError::NoFarm)
    }

    /// Run tick number `n` (1-based) at the current time.
    pub async fn tick(&self, n: u64) -> Result<TickReport> {
        self.tick_at(n, Utc::now()).await
    }

    pub async fn tick_at(&self, n: u64, now: DateTime<Utc>) -> Result<TickReport> {
        let mut sim = self.sim.lock().await;
        let mut farm = self.farm().await?;

        let readings = sim.live_readings(&farm, now);
        self.store.append_readings(&readings).await?;

        let mut crops_advanced = 0;
        if self.config.apply_growth {
            let history = self
                .store
                .sensor_readings(None, self.config.sensor_retention)
                .await?;
            farm_growth::simulate_farm(&mut farm, &history, now);
            crops_advanced = farm.plots.iter().filter(|p| p.crop.is_some()).count();
            self.store.save_farm(&farm).await?;
        }

        let mut alert_count = 0;
        if n % u64::from(self.config.alert_every_ticks) == 0 {
            let new_alerts = alerts::derive(farm.equipment(), now);
            alert_count = new_alerts.len();
            if !new_alerts.is_empty() {
                self.store.append_alerts(&new_alerts).await?;
                self.publish(LiveEvent::NewAlerts {
                    timestamp: now,
                    alerts: new_alerts,
                });
            }
        }

        let forecast_refreshed = n % u64::from(self.config.forecast_every_ticks) == 0;
        if forecast_refreshed {
            let days = sim.forecast(&farm.coordinates, self.config.forecast_days, now);
            self.store.save_forecast(&days).await?;
            self.publish(LiveEvent::WeatherUpdate {
                timestamp: now,
                forecast: days,
            });
        }

        let stored_alerts = self.store.alerts().await?;
        let recent = stored_alerts[stored_alerts.len().saturating_sub(LIVE_ALERTS)..].to_vec();
        let report = TickReport {
            tick: n,
            readings: readings.len(),
            alerts: alert_count,
            crops_advanced,
            forecast_refreshed,
        };
        self.publish(LiveEvent::LiveUpdate {
            timestamp: now,
            sensor_data: readings,
            alerts: recent,
        });
        debug!(?report, "tick complete");
        Ok(report)
    }

    /// Start the periodic loop on the current tokio runtime.
    pub fn spawn(self: &Arc<Self>) -> SimulationHandle {
        self.spawn_with_period(Duration::from_secs(self.config.tick_interval_secs))
    }

    pub fn spawn_with_period(self: &Arc<Self>, period: Duration) -> SimulationHandle {
        let (cancel, mut cancelled) = watch::channel(false);
        let runtime = Arc::clone(self);
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!(period_ms = period.as_millis() as u64, "simulation started");
            let mut n: u64 = 0;
            loop {
                tokio::select! {
                    // a dropped handle also ends the loop
                    _ = cancelled.changed() => break,
                    _ = ticker.tick() => {
                        n += 1;
                        if let Err(e) = runtime.tick(n).await {
                            error!(tick = n, error = %e, "tick failed");
                        }
                    }
                }
            }
            info!(ticks = n, "simulation stopped");
            n
        });
        SimulationHandle { cancel, task }
    }

    pub async fn set_plot_status(&self, plot_id: Uuid, status: PlotStatus) -> Result<()> {
        let _guard = self.sim.lock().await;
        let now = Utc::now();
        if !self.store.update_plot_status(plot_id, status, now).await? {
            return Err(RuntimeError::PlotNotFound(plot_id));
        }
        info!(%plot_id, status = status.as_str(), "plot status updated");
        self.publish(LiveEvent::PlotUpdate {
            timestamp: now,
            plot_id,
            status,
        });
        Ok(())
    }

    /// Flip irrigation on a plot and return the new state.
    pub async fn toggle_irrigation(&self, plot_id: Uuid) -> Result<bool> {
        let _guard = self.sim.lock().await;
        let now = Utc::now();
        let state = self
            .store
            .toggle_irrigation(plot_id, now)
            .await?
            .ok_or(RuntimeError::PlotNotFound(plot_id))?;
        info!(%plot_id, irrigation = state, "irrigation toggled");
        self.publish(LiveEvent::IrrigationUpdate {
            timestamp: now,
            plot_id,
            irrigation_status: state,
        });
        Ok(state)
    }

    /// Replace the farm with a freshly generated one.
    pub async fn regenerate_farm(&self) -> Result<Farm> {
        let mut sim = self.sim.lock().await;
        let now = Utc::now();
        let farm = sim.farm(self.region(), now);
        self.store.save_farm(&farm).await?;
        info!(farm = %farm.name, plots = farm.plots.len(), "farm regenerated");
        self.publish(LiveEvent::FarmRegenerated {
            timestamp: now,
            farm_id: farm.id,
            farm_name: farm.name.clone(),
        });
        Ok(farm)
    }

    /// Regenerate the whole dataset: farm, sensor history, alerts and forecast.
    pub async fn generate_dataset(&self) -> Result<DatasetSummary> {
        let mut sim = self.sim.lock().await;
        let now = Utc::now();
        let cfg = &self.config;

        let farm = sim.farm(self.region(), now);
        let history = sim.history(&farm, now, cfg.history_days, cfg.history_step_hours);
        let derived = alerts::derive(farm.equipment(), now);
        let days = sim.forecast(&farm.coordinates, cfg.forecast_days, now);

        self.store.save_farm(&farm).await?;
        self.store.replace_readings(&history).await?;
        self.store.replace_alerts(&derived).await?;
        self.store.save_forecast(&days).await?;

        let summary = DatasetSummary {
            farm_name: farm.name.clone(),
            plots: farm.plots.len(),
            sensors: farm.sensor_count(),
            equipment: farm.equipment().count(),
            readings_generated: history.len(),
            readings_kept: history.len().min(cfg.sensor_retention),
            alerts: derived.len(),
            forecast_days: days.len(),
        };
        info!(?summary, "dataset generated");
        self.publish(LiveEvent::FarmRegenerated {
            timestamp: now,
            farm_id: farm.id,
            farm_name: farm.name,
        });
        Ok(summary)
    }

    pub async fn health(&self, running: bool) -> Result<HealthReport> {
        let last = self.store.sensor_readings(None, 1).await?;
        let alerts = self.store.alerts().await?;
        Ok(assess_health(
            last.last().map(|r| r.timestamp),
            &alerts,
            running,
            Utc::now(),
        ))
    }
}

/// Handle to a spawned simulation loop. Dropping it also stops the loop.
pub struct SimulationHandle {
    cancel: watch::Sender<bool>,
    task: JoinHandle<u64>,
}

impl SimulationHandle {
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Cancel the loop and wait for it; returns the number of ticks run.
    pub async fn stop(self) -> Result<u64> {
        let _ = self.cancel.send(true);
        Ok(self.task.await?)
    }
}
