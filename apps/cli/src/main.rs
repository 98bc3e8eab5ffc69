#![deny(warnings)]

//! Headless CLI: seed the sample dataset, run live ticks and print KPIs.

use anyhow::{Context, Result};
use farm_core::SimConfig;
use farm_runtime::{FarmRuntime, LiveEvent};
use farm_sim::analytics;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Default)]
struct Args {
    config: Option<PathBuf>,
    seed: Option<u64>,
    data_dir: Option<PathBuf>,
    region: Option<String>,
    generate: bool,
    ticks: Option<u64>,
    interval_secs: Option<u64>,
}

fn parse_args() -> Args {
    let mut args = Args::default();
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--config" => args.config = it.next().map(PathBuf::from),
            "--seed" => args.seed = it.next().and_then(|s| s.parse().ok()),
            "--data-dir" => args.data_dir = it.next().map(PathBuf::from),
            "--region" => args.region = it.next(),
            "--generate" => args.generate = true,
            "--ticks" => args.ticks = it.next().and_then(|s| s.parse().ok()),
            "--interval-secs" => args.interval_secs = it.next().and_then(|s| s.parse().ok()),
            other => warn!(arg = other, "ignoring unknown argument"),
        }
    }
    args
}

fn build_config(args: &Args) -> Result<SimConfig> {
    let mut cfg = match &args.config {
        Some(path) => SimConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => SimConfig::default(),
    };
    if args.seed.is_some() {
        cfg.rng_seed = args.seed;
    }
    if let Some(dir) = &args.data_dir {
        cfg.data_dir = dir.clone();
    }
    if args.region.is_some() {
        cfg.region = args.region.clone();
    }
    if let Some(secs) = args.interval_secs {
        cfg.tick_interval_secs = secs;
    }
    cfg.validate()?;
    Ok(cfg)
}

fn event_kind(event: &LiveEvent) -> &'static str {
    match event {
        LiveEvent::LiveUpdate { .. } => "live_update",
        LiveEvent::PlotUpdate { .. } => "plot_update",
        LiveEvent::IrrigationUpdate { .. } => "irrigation_update",
        LiveEvent::WeatherUpdate { .. } => "weather_update",
        LiveEvent::NewAlerts { .. } => "new_alerts",
        LiveEvent::FarmRegenerated { .. } => "farm_regenerated",
    }
}

async fn run_ticks(runtime: &Arc<FarmRuntime>, ticks: u64) -> Result<()> {
    let mut rx = runtime.subscribe();
    let handle = runtime.spawn();
    let mut seen = 0;
    while seen < ticks {
        match rx.recv().await {
            Ok(event) => {
                if let LiveEvent::LiveUpdate { sensor_data, alerts, .. } = &event {
                    seen += 1;
                    info!(
                        tick = seen,
                        readings = sensor_data.len(),
                        recent_alerts = alerts.len(),
                        "live_update"
                    );
                } else {
                    info!(event = event_kind(&event), "event");
                }
            }
            Err(RecvError::Lagged(n)) => warn!(skipped = n, "event stream lagged"),
            Err(RecvError::Closed) => break,
        }
    }
    let ran = handle.stop().await?;
    info!(ticks = ran, "live loop finished");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = parse_args();
    info!(?args, "starting CLI");
    let cfg = build_config(&args)?;
    let runtime = Arc::new(FarmRuntime::new(cfg).await?);

    if args.generate {
        let s = runtime.generate_dataset().await?;
        println!(
            "Dataset | farm: {} | plots: {} | sensors: {} | equipment: {} | readings: {} (kept {}) | alerts: {} | forecast days: {}",
            s.farm_name,
            s.plots,
            s.sensors,
            s.equipment,
            s.readings_generated,
            s.readings_kept,
            s.alerts,
            s.forecast_days
        );
    }

    if let Some(ticks) = args.ticks.filter(|&n| n > 0) {
        run_ticks(&runtime, ticks).await?;
    }

    let farm = runtime.farm().await?;
    let readings = runtime.store().sensor_readings(None, 200).await?;
    let summary = analytics::farm_summary(&farm);
    let perf = analytics::performance_report(&farm, &readings, chrono::Utc::now());
    let health = runtime.health(false).await?;

    println!(
        "Farm OK | {} ({}) | plots: {} (active {}) | area: {:.2} ha | equipment: {} | sensors: {} | health: {:?}",
        summary.farm_name,
        summary.location,
        summary.total_plots,
        summary.active_plots,
        summary.total_area,
        summary.total_equipment,
        summary.total_sensors,
        health.status
    );
    println!(
        "KPI | yield: {} kg | yield/ha: {} | equipment operational: {:.1}% | irrigation: {:.1}% | env score: {:.1} | grade: {:?}",
        perf.total_yield_estimate,
        perf.avg_yield_per_hectare,
        perf.equipment_efficiency,
        perf.irrigation_coverage,
        perf.environmental_score,
        perf.performance_grade
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_apply_on_top_of_defaults() {
        let args = Args {
            seed: Some(9),
            region: Some("Johor".to_string()),
            interval_secs: Some(5),
            ..Args::default()
        };
        let cfg = build_config(&args).unwrap();
        assert_eq!(cfg.rng_seed, Some(9));
        assert_eq!(cfg.region.as_deref(), Some("Johor"));
        assert_eq!(cfg.tick_interval_secs, 5);
        assert_eq!(cfg.sensor_retention, 1000);
    }

    #[test]
    fn bad_overrides_are_rejected() {
        let args = Args {
            region: Some("Atlantis".to_string()),
            ..Args::default()
        };
        assert!(build_config(&args).is_err());
        let args = Args {
            interval_secs: Some(0),
            ..Args::default()
        };
        assert!(build_config(&args).is_err());
    }

    #[test]
    fn event_kinds_match_wire_tags() {
        let ev = LiveEvent::NewAlerts {
            timestamp: chrono::Utc::now(),
            alerts: vec![],
        };
        assert_eq!(event_kind(&ev), "new_alerts");
    }
}
