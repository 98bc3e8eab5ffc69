//! Read-side summaries over a farm, its readings and its alert log.
//!
//! Every ratio over an empty denominator is reported as 0.

use chrono::{DateTime, Duration, Utc};
use farm_core::{Alert, EquipmentStatus, Farm, PlotStatus, SensorReading, Severity};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::round_to;

/// Readings considered by [`current_conditions`].
pub const CURRENT_WINDOW: usize = 10;
/// Alerts considered by the severity breakdown.
pub const ALERT_WINDOW: usize = 30;
/// Readings considered by [`environmental_score`].
pub const ENVIRONMENT_WINDOW: usize = 50;
pub const WEATHER_LOOKBACK_DAYS: i64 = 7;

fn mean<I: IntoIterator<Item = f64>>(values: I) -> f64 {
    let (sum, n) = values
        .into_iter()
        .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 {
        0.0
    } else {
        sum / n as f64
    }
}

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

fn tail<T>(items: &[T], n: usize) -> &[T] {
    &items[items.len().saturating_sub(n)..]
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FarmSummary {
    pub farm_name: String,
    pub location: String,
    pub total_plots: usize,
    pub active_plots: usize,
    pub total_area: f64,
    pub total_equipment: usize,
    pub total_sensors: usize,
}

pub fn farm_summary(farm: &Farm) -> FarmSummary {
    FarmSummary {
        farm_name: farm.name.clone(),
        location: farm.location.clone(),
        total_plots: farm.plots.len(),
        active_plots: farm
            .plots
            .iter()
            .filter(|p| p.status == PlotStatus::Active)
            .count(),
        total_area: farm.total_area,
        total_equipment: farm.equipment().count(),
        total_sensors: farm.sensor_count(),
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SensorSummary {
    pub total_readings: usize,
    pub unique_sensors: usize,
    pub avg_temperature: f64,
    pub avg_humidity: f64,
    pub avg_soil_moisture: f64,
    pub avg_ph_level: f64,
    pub total_rainfall: f64,
    pub last_reading: DateTime<Utc>,
}

pub fn sensor_summary(readings: &[SensorReading]) -> Option<SensorSummary> {
    let last_reading = readings.iter().map(|r| r.timestamp).max()?;
    let unique: BTreeSet<_> = readings.iter().map(|r| r.sensor_id).collect();
    Some(SensorSummary {
        total_readings: readings.len(),
        unique_sensors: unique.len(),
        avg_temperature: round_to(mean(readings.iter().map(|r| r.temperature)), 1),
        avg_humidity: round_to(mean(readings.iter().map(|r| r.humidity)), 1),
        avg_soil_moisture: round_to(mean(readings.iter().map(|r| r.soil_moisture)), 1),
        avg_ph_level: round_to(mean(readings.iter().map(|r| r.ph_level)), 1),
        total_rainfall: round_to(readings.iter().map(|r| r.rainfall).sum(), 1),
        last_reading,
    })
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub temperature: f64,
    pub humidity: f64,
    pub rainfall: f64,
    pub light_intensity: f64,
    pub last_updated: DateTime<Utc>,
    pub data_points: usize,
}

/// Conditions averaged over the newest [`CURRENT_WINDOW`] readings.
pub fn current_conditions(readings: &[SensorReading]) -> Option<CurrentConditions> {
    let recent = tail(readings, CURRENT_WINDOW);
    let last_updated = recent.iter().map(|r| r.timestamp).max()?;
    Some(CurrentConditions {
        temperature: round_to(mean(recent.iter().map(|r| r.temperature)), 1),
        humidity: round_to(mean(recent.iter().map(|r| r.humidity)), 1),
        rainfall: round_to(recent.iter().map(|r| r.rainfall).sum(), 1),
        light_intensity: mean(recent.iter().map(|r| r.light_intensity)).round(),
        last_updated,
        data_points: recent.len(),
    })
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquipmentStatusCounts {
    pub operational: usize,
    pub maintenance: usize,
    pub idle: usize,
    pub repair: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlotStatusCounts {
    pub active: usize,
    pub maintenance: usize,
    pub harvesting: usize,
    pub idle: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FarmOverview {
    pub name: String,
    pub location: String,
    pub total_area: f64,
    pub total_plots: usize,
    pub established: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WeatherSummary {
    pub avg_temperature: f64,
    pub avg_humidity: f64,
    pub avg_soil_moisture: f64,
    pub total_rainfall_7days: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Productivity {
    pub total_estimated_yield: f64,
    pub avg_yield_per_hectare: f64,
    /// Share of plots with irrigation on, in %.
    pub irrigation_coverage: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsReport {
    pub generated_at: DateTime<Utc>,
    pub farm_overview: FarmOverview,
    pub weather_summary: WeatherSummary,
    pub equipment_status: EquipmentStatusCounts,
    pub plot_status: PlotStatusCounts,
    pub alert_summary: SeverityCounts,
    pub productivity_metrics: Productivity,
}

fn total_yield(farm: &Farm) -> f64 {
    farm.plots
        .iter()
        .filter_map(|p| p.crop.as_ref())
        .map(|c| c.yield_estimate)
        .sum()
}

fn irrigation_coverage(farm: &Farm) -> f64 {
    let irrigated = farm.plots.iter().filter(|p| p.irrigation_status).count();
    round_to(percent(irrigated, farm.plots.len()), 1)
}

pub fn equipment_status_counts(farm: &Farm) -> EquipmentStatusCounts {
    let mut counts = EquipmentStatusCounts::default();
    for e in farm.equipment() {
        match e.status {
            EquipmentStatus::Operational => counts.operational += 1,
            EquipmentStatus::Maintenance => counts.maintenance += 1,
            EquipmentStatus::Idle => counts.idle += 1,
            EquipmentStatus::Repair => counts.repair += 1,
        }
    }
    counts
}

pub fn plot_status_counts(farm: &Farm) -> PlotStatusCounts {
    let mut counts = PlotStatusCounts::default();
    for p in &farm.plots {
        match p.status {
            PlotStatus::Active => counts.active += 1,
            PlotStatus::Maintenance => counts.maintenance += 1,
            PlotStatus::Harvesting => counts.harvesting += 1,
            PlotStatus::Idle => counts.idle += 1,
        }
    }
    counts
}

/// Severity breakdown of the newest [`ALERT_WINDOW`] alerts.
pub fn severity_counts(alerts: &[Alert]) -> SeverityCounts {
    let mut counts = SeverityCounts::default();
    for a in tail(alerts, ALERT_WINDOW) {
        match a.severity {
            Severity::High => counts.high += 1,
            Severity::Medium => counts.medium += 1,
            Severity::Low => counts.low += 1,
        }
    }
    counts
}

pub fn analytics_report(
    farm: &Farm,
    readings: &[SensorReading],
    alerts: &[Alert],
    now: DateTime<Utc>,
) -> AnalyticsReport {
    let horizon = now - Duration::days(WEATHER_LOOKBACK_DAYS);
    let recent: Vec<&SensorReading> = readings.iter().filter(|r| r.timestamp >= horizon).collect();

    let per_hectare: f64 = farm
        .plots
        .iter()
        .filter_map(|p| p.crop.as_ref())
        .map(|c| c.yield_per_hectare)
        .sum();
    let avg_yield_per_hectare = if farm.plots.is_empty() {
        0.0
    } else {
        (per_hectare / farm.plots.len() as f64).round()
    };

    AnalyticsReport {
        generated_at: now,
        farm_overview: FarmOverview {
            name: farm.name.clone(),
            location: farm.location.clone(),
            total_area: farm.total_area,
            total_plots: farm.plots.len(),
            established: farm.established_date,
        },
        weather_summary: WeatherSummary {
            avg_temperature: round_to(mean(recent.iter().map(|r| r.temperature)), 1),
            avg_humidity: round_to(mean(recent.iter().map(|r| r.humidity)), 1),
            avg_soil_moisture: round_to(mean(recent.iter().map(|r| r.soil_moisture)), 1),
            total_rainfall_7days: round_to(recent.iter().map(|r| r.rainfall).sum(), 1),
        },
        equipment_status: equipment_status_counts(farm),
        plot_status: plot_status_counts(farm),
        alert_summary: severity_counts(alerts),
        productivity_metrics: Productivity {
            total_estimated_yield: total_yield(farm),
            avg_yield_per_hectare,
            irrigation_coverage: irrigation_coverage(farm),
        },
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
}

impl Grade {
    pub fn for_score(score: f64) -> Grade {
        if score >= 80.0 {
            Grade::A
        } else if score >= 60.0 {
            Grade::B
        } else {
            Grade::C
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PerformanceReport {
    pub total_yield_estimate: f64,
    pub avg_yield_per_hectare: f64,
    /// Share of equipment that is operational, in %.
    pub equipment_efficiency: f64,
    pub irrigation_coverage: f64,
    pub environmental_score: f64,
    pub performance_grade: Grade,
    pub calculated_at: DateTime<Utc>,
}

/// Score a mean value: 100 inside `band`, else `100 - |value - centre| * penalty`
/// floored at 0.
fn band_score(value: f64, band: (f64, f64), centre: f64, penalty: f64) -> f64 {
    if (band.0..=band.1).contains(&value) {
        100.0
    } else {
        (100.0 - (value - centre).abs() * penalty).max(0.0)
    }
}

/// Environmental score in `[0, 100]` over the newest [`ENVIRONMENT_WINDOW`]
/// readings; 0 when there are none.
pub fn environmental_score(readings: &[SensorReading]) -> f64 {
    let recent = tail(readings, ENVIRONMENT_WINDOW);
    if recent.is_empty() {
        return 0.0;
    }
    let temp = mean(recent.iter().map(|r| r.temperature));
    let humidity = mean(recent.iter().map(|r| r.humidity));
    let moisture = mean(recent.iter().map(|r| r.soil_moisture));
    let score = (band_score(temp, (26.0, 32.0), 29.0, 10.0)
        + band_score(humidity, (70.0, 85.0), 77.5, 2.0)
        + band_score(moisture, (70.0, 90.0), 80.0, 3.0))
        / 3.0;
    round_to(score, 1)
}

pub fn performance_report(
    farm: &Farm,
    readings: &[SensorReading],
    now: DateTime<Utc>,
) -> PerformanceReport {
    let total = total_yield(farm);
    let per_hectare = if farm.total_area > 0.0 {
        total / farm.total_area
    } else {
        0.0
    };
    let equipment_total = farm.equipment().count();
    let operational = farm
        .equipment()
        .filter(|e| e.status == EquipmentStatus::Operational)
        .count();
    let score = environmental_score(readings);

    PerformanceReport {
        total_yield_estimate: total.round(),
        avg_yield_per_hectare: per_hectare.round(),
        equipment_efficiency: round_to(percent(operational, equipment_total), 1),
        irrigation_coverage: irrigation_coverage(farm),
        environmental_score: score,
        performance_grade: Grade::for_score(score),
        calculated_at: now,
    }
}
