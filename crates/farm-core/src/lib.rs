#![deny(warnings)]

//! Core domain records and invariants for the farm simulation.
//!
//! This crate defines the serializable entity types exchanged between the
//! generators, the growth simulator, the store and the runtime, together
//! with validation helpers for the structural invariants of a farm.

pub mod config;
pub mod profiles;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

pub use config::{ConfigError, SimConfig};
pub use profiles::{crop_profile, region_by_name, CropProfile, Region, SeasonClimate, REGIONS};

/// Geographic point in decimal degrees.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
}

impl Location {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Coarse climate regime derived from the calendar month.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Season {
    /// June to September.
    Dry,
    /// October to March.
    Wet,
    /// April and May.
    Transition,
}

impl Season {
    /// Season for a calendar month in `1..=12`.
    ///
    /// Panics on a month outside that range: callers obtain months from
    /// `chrono`, which never produces one.
    pub fn for_month(month: u32) -> Season {
        match month {
            6..=9 => Season::Dry,
            1..=3 | 10..=12 => Season::Wet,
            4 | 5 => Season::Transition,
            m => panic!("month {m} is outside 1..=12"),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Season::Dry => "dry",
            Season::Wet => "wet",
            Season::Transition => "transition",
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The six crop types with static profiles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CropType {
    Rice,
    PalmOil,
    Rubber,
    Durian,
    Banana,
    Coconut,
}

impl CropType {
    pub const ALL: [CropType; 6] = [
        CropType::Rice,
        CropType::PalmOil,
        CropType::Rubber,
        CropType::Durian,
        CropType::Banana,
        CropType::Coconut,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CropType::Rice => "rice",
            CropType::PalmOil => "palm_oil",
            CropType::Rubber => "rubber",
            CropType::Durian => "durian",
            CropType::Banana => "banana",
            CropType::Coconut => "coconut",
        }
    }

    /// Human-readable name used in plot names, e.g. "Palm Oil".
    pub fn display_name(&self) -> &'static str {
        match self {
            CropType::Rice => "Rice",
            CropType::PalmOil => "Palm Oil",
            CropType::Rubber => "Rubber",
            CropType::Durian => "Durian",
            CropType::Banana => "Banana",
            CropType::Coconut => "Coconut",
        }
    }

    /// Lenient lookup: an unknown identifier falls back to rice.
    pub fn lookup(name: &str) -> CropType {
        name.parse().unwrap_or_else(|_| {
            tracing::warn!(crop_type = name, "unknown crop type, falling back to rice");
            CropType::Rice
        })
    }
}

impl fmt::Display for CropType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CropType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CropType::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownCropType(s.to_string()))
    }
}

/// Kinds of farm equipment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquipmentType {
    Irrigation,
    Tractor,
    Harvester,
    Drone,
    Sensor,
}

impl EquipmentType {
    pub const ALL: [EquipmentType; 5] = [
        EquipmentType::Irrigation,
        EquipmentType::Tractor,
        EquipmentType::Harvester,
        EquipmentType::Drone,
        EquipmentType::Sensor,
    ];

    /// Only fuel-burning machines report a fuel level.
    pub fn uses_fuel(&self) -> bool {
        matches!(self, EquipmentType::Tractor | EquipmentType::Harvester)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquipmentStatus {
    Operational,
    Maintenance,
    Idle,
    Repair,
}

impl EquipmentStatus {
    pub const ALL: [EquipmentStatus; 4] = [
        EquipmentStatus::Operational,
        EquipmentStatus::Maintenance,
        EquipmentStatus::Idle,
        EquipmentStatus::Repair,
    ];
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlotStatus {
    Active,
    Maintenance,
    Harvesting,
    Idle,
}

impl PlotStatus {
    pub const ALL: [PlotStatus; 4] = [
        PlotStatus::Active,
        PlotStatus::Maintenance,
        PlotStatus::Harvesting,
        PlotStatus::Idle,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PlotStatus::Active => "active",
            PlotStatus::Maintenance => "maintenance",
            PlotStatus::Harvesting => "harvesting",
            PlotStatus::Idle => "idle",
        }
    }
}

impl FromStr for PlotStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PlotStatus::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownPlotStatus(s.to_string()))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    Maintenance,
    Fuel,
    Efficiency,
}

impl AlertType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertType::Maintenance => "maintenance",
            AlertType::Fuel => "fuel",
            AlertType::Efficiency => "efficiency",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl HealthStatus {
    pub const ALL: [HealthStatus; 4] = [
        HealthStatus::Excellent,
        HealthStatus::Good,
        HealthStatus::Fair,
        HealthStatus::Poor,
    ];
}

/// Three-step qualitative level used for disease risk and irrigation needs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Low,
    Medium,
    High,
}

impl Level {
    pub const ALL: [Level; 3] = [Level::Low, Level::Medium, Level::High];
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PestPressure {
    Minimal,
    Moderate,
    High,
}

impl PestPressure {
    pub const ALL: [PestPressure; 3] = [
        PestPressure::Minimal,
        PestPressure::Moderate,
        PestPressure::High,
    ];
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataQuality {
    Excellent,
    Good,
    Fair,
}

impl DataQuality {
    pub const ALL: [DataQuality; 3] = [DataQuality::Excellent, DataQuality::Good, DataQuality::Fair];
}

/// Projection state of a crop's harvest date after a growth update.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HarvestOutlook {
    /// Harvest date lies within the normal horizon.
    OnTrack,
    /// Adjusted progress already reached the cycle length.
    Overdue,
    /// Growth is so slow that the projection was capped.
    Stalled,
}

/// One weather draw. Always recomputed, never persisted on its own.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WeatherSample {
    /// Air temperature in °C.
    pub temperature: f64,
    /// Relative humidity in %.
    pub humidity: f64,
    /// Rainfall in mm.
    pub rainfall: f64,
    /// Light intensity in lux.
    pub light_intensity: f64,
    pub season: Season,
    pub timestamp: DateTime<Utc>,
}

/// Soil conditions derived from a crop profile and a weather sample.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SoilSample {
    /// Soil moisture in %, always within [20, 100].
    pub soil_moisture: f64,
    pub ph_level: f64,
    /// Nitrogen in mg/kg.
    pub nitrogen: f64,
    /// Phosphorus in mg/kg.
    pub phosphorus: f64,
    /// Potassium in mg/kg.
    pub potassium: f64,
    /// Organic matter in %.
    pub organic_matter: f64,
}

/// A timestamped multi-field reading from one sensor on one plot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    pub sensor_id: Uuid,
    pub plot_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub location: Location,

    pub temperature: f64,
    pub humidity: f64,
    pub rainfall: f64,
    pub light_intensity: f64,

    pub soil_moisture: f64,
    pub ph_level: f64,
    pub nitrogen: f64,
    pub phosphorus: f64,
    pub potassium: f64,
    pub organic_matter: f64,

    /// Wind speed in km/h.
    pub wind_speed: f64,
    /// Wind direction in degrees.
    pub wind_direction: u16,
    pub uv_index: u8,
    /// CO2 concentration in ppm.
    pub co2_level: u16,

    pub season: Season,
    pub data_quality: DataQuality,
    /// Sensor battery in %.
    pub battery_level: u8,
}

/// A piece of equipment owned by exactly one plot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Equipment {
    pub id: Uuid,
    /// Catalogue model name, e.g. "Kubota M7040".
    pub name: String,
    #[serde(rename = "type")]
    pub equipment_type: EquipmentType,
    /// Model year and serial, e.g. "2022-417".
    pub model: String,
    pub status: EquipmentStatus,
    /// Position jittered around the owning plot.
    pub location: Location,
    /// Lifetime running hours.
    pub operational_hours: f64,
    /// Last service; drives maintenance alerts.
    pub last_maintenance: DateTime<Utc>,
    /// Next scheduled service.
    pub next_maintenance: DateTime<Utc>,
    /// Present only for tractors and harvesters.
    pub fuel_level: Option<u8>,
    /// Efficiency in %.
    pub efficiency: f64,
    /// Running cost in MYR.
    pub cost_per_hour: Decimal,
}

/// The live crop on a plot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Crop {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub crop_type: CropType,
    /// One of the profile's varieties.
    pub variety: String,
    pub planted_date: DateTime<Utc>,
    /// Projected harvest; moved by growth updates.
    pub expected_harvest: DateTime<Utc>,
    /// A stage name from the crop type's profile.
    pub growth_stage: String,
    /// Progress through the cycle in %, within [0, 100].
    pub growth_progress: f64,
    /// Estimated yield in kg for the whole plot.
    pub yield_estimate: f64,
    /// Estimated yield in kg per hectare.
    pub yield_per_hectare: f64,
    pub health_status: HealthStatus,
    pub disease_risk: Level,
    pub pest_pressure: PestPressure,
    pub irrigation_needs: Level,
    /// Last fertilizer application, 7 to 60 days back at generation.
    pub fertilizer_last_applied: DateTime<Utc>,
    /// Last pesticide application, 14 to 90 days back at generation.
    pub pesticide_last_applied: DateTime<Utc>,
    /// Yield before any growth adjustment; set by the first growth update.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yield_baseline: Option<f64>,
    /// Multiplier applied by the latest growth update, in [0.1, 2.0].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub growth_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_growth_update: Option<DateTime<Utc>>,
    /// How the harvest projection was resolved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub harvest_outlook: Option<HarvestOutlook>,
}

/// A bounded land parcel; the unit of crop, equipment and sensor assignment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Plot {
    pub id: Uuid,
    /// "Plot {n} - {crop}".
    pub name: String,
    /// Centre of the plot, near the farm coordinates.
    pub location: Location,
    /// Area in hectares (> 0).
    pub area: f64,
    pub status: PlotStatus,
    /// At most one live crop.
    pub crop: Option<Crop>,
    pub equipment: Vec<Equipment>,
    /// Ids of the sensors installed on this plot.
    pub sensors: Vec<Uuid>,
    /// Whether irrigation is currently switched on.
    pub irrigation_status: bool,
    pub soil_type: String,
    /// Drainage class, e.g. "good" or "poor".
    pub drainage: String,
    /// Slope in degrees.
    pub slope: f64,
    /// Elevation in metres above sea level.
    pub elevation: u16,
    /// Stamped by status and irrigation changes.
    pub last_updated: DateTime<Utc>,
    pub created_date: DateTime<Utc>,
}

impl Plot {
    /// Crop type of the live crop, or rice when the plot is fallow.
    pub fn crop_type(&self) -> CropType {
        self.crop.as_ref().map(|c| c.crop_type).unwrap_or(CropType::Rice)
    }
}

/// Farm office contact details.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub phone: String,
    pub email: String,
}

/// Root aggregate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Farm {
    pub id: Uuid,
    pub name: String,
    /// Human-readable place, e.g. "Kedah, Malaysia".
    pub location: String,
    /// Region centre.
    pub coordinates: Location,
    /// Operating organisation.
    pub owner: String,
    /// Sum of plot areas at generation time, in hectares.
    pub total_area: f64,
    pub plots: Vec<Plot>,
    pub established_date: DateTime<Utc>,
    /// Operating model, e.g. "commercial" or "estate".
    pub farm_type: String,
    /// Sustainability certification held by the farm.
    pub certification: String,
    /// Number of workers.
    pub labor_force: u16,
    /// Annual revenue in MYR.
    pub annual_revenue: Decimal,
    pub contact: Contact,
}

impl Farm {
    /// All equipment across every plot.
    pub fn equipment(&self) -> impl Iterator<Item = &Equipment> {
        self.plots.iter().flat_map(|p| p.equipment.iter())
    }

    pub fn plot(&self, id: Uuid) -> Option<&Plot> {
        self.plots.iter().find(|p| p.id == id)
    }

    pub fn plot_mut(&mut self, id: Uuid) -> Option<&mut Plot> {
        self.plots.iter_mut().find(|p| p.id == id)
    }

    pub fn sensor_count(&self) -> usize {
        self.plots.iter().map(|p| p.sensors.len()).sum()
    }
}

/// Threshold alert derived from an equipment record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub alert_type: AlertType,
    pub severity: Severity,
    /// Equipment the alert was derived from.
    pub equipment_id: Uuid,
    pub equipment_name: String,
    pub message: String,
    /// Derivation instant.
    pub timestamp: DateTime<Utc>,
    /// Suggested operator action.
    pub action_required: String,
}

/// One day of a weather forecast.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ForecastDay {
    pub date: NaiveDate,
    pub day_name: String,
    pub temperature_min: f64,
    pub temperature_max: f64,
    pub humidity: f64,
    /// Chance of rain in %.
    pub rainfall_probability: u8,
    pub rainfall_amount: f64,
    pub wind_speed: f64,
    pub uv_index: u8,
    pub conditions: String,
}

/// Validation errors for domain invariants.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// Unknown crop type identifier.
    #[error("unknown crop type: {0}")]
    UnknownCropType(String),
    /// Unknown plot status identifier.
    #[error("unknown plot status: {0}")]
    UnknownPlotStatus(String),
    /// Plot area must be strictly positive.
    #[error("plot area must be > 0")]
    NonPositiveArea,
    /// Farm total area differs from the sum of its plots.
    #[error("farm total area {declared} does not match plot sum {computed}")]
    AreaMismatch { declared: f64, computed: f64 },
    /// Growth progress outside [0, 100].
    #[error("growth progress {0} is outside [0, 100]")]
    ProgressOutOfRange(f64),
    /// Growth stage not declared for the crop type.
    #[error("growth stage {stage} is not a {crop_type} stage")]
    UnknownGrowthStage { crop_type: CropType, stage: String },
    /// Soil moisture outside [20, 100].
    #[error("soil moisture {0} is outside [20, 100]")]
    MoistureOutOfRange(f64),
    /// An id appears more than once in the farm.
    #[error("duplicate id: {0}")]
    DuplicateId(Uuid),
    /// Numeric field must be finite.
    #[error("non-finite numeric value encountered")]
    NonFinite,
}

/// Validate a crop against its profile.
pub fn validate_crop(crop: &Crop) -> Result<(), ValidationError> {
    if !crop.growth_progress.is_finite() || !crop.yield_estimate.is_finite() {
        return Err(ValidationError::NonFinite);
    }
    if !(0.0..=100.0).contains(&crop.growth_progress) {
        return Err(ValidationError::ProgressOutOfRange(crop.growth_progress));
    }
    let profile = crop_profile(crop.crop_type);
    if !profile.growth_stages.contains(&crop.growth_stage.as_str()) {
        return Err(ValidationError::UnknownGrowthStage {
            crop_type: crop.crop_type,
            stage: crop.growth_stage.clone(),
        });
    }
    Ok(())
}

/// Validate a plot and its crop.
pub fn validate_plot(plot: &Plot) -> Result<(), ValidationError> {
    if !plot.area.is_finite() {
        return Err(ValidationError::NonFinite);
    }
    if plot.area <= 0.0 {
        return Err(ValidationError::NonPositiveArea);
    }
    if let Some(crop) = &plot.crop {
        validate_crop(crop)?;
    }
    Ok(())
}

/// Validate a sensor reading's bounded fields.
pub fn validate_reading(r: &SensorReading) -> Result<(), ValidationError> {
    if !(r.temperature.is_finite() && r.humidity.is_finite() && r.soil_moisture.is_finite()) {
        return Err(ValidationError::NonFinite);
    }
    if !(20.0..=100.0).contains(&r.soil_moisture) {
        return Err(ValidationError::MoistureOutOfRange(r.soil_moisture));
    }
    Ok(())
}

/// Validate the farm, including area consistency and id ownership.
///
/// Every plot, equipment, crop and sensor id must appear exactly once.
pub fn validate_farm(farm: &Farm) -> Result<(), ValidationError> {
    let mut ids: BTreeSet<Uuid> = BTreeSet::new();
    let mut claim = |id: Uuid| {
        if ids.insert(id) {
            Ok(())
        } else {
            Err(ValidationError::DuplicateId(id))
        }
    };
    for plot in &farm.plots {
        validate_plot(plot)?;
        claim(plot.id)?;
        for eq in &plot.equipment {
            claim(eq.id)?;
        }
        for sensor in &plot.sensors {
            claim(*sensor)?;
        }
        if let Some(crop) = &plot.crop {
            claim(crop.id)?;
        }
    }
    let computed: f64 = farm.plots.iter().map(|p| p.area).sum();
    if (computed - farm.total_area).abs() > 1e-9 {
        return Err(ValidationError::AreaMismatch {
            declared: farm.total_area,
            computed,
        });
    }
    Ok(())
}
