//! Whole-farm generator: plots with crops, equipment and sensors.

use chrono::{DateTime, Duration, Utc};
use farm_core::profiles::is_harvest_stage;
use farm_core::{
    Contact, Crop, CropType, Equipment, EquipmentStatus, Farm, Location, Plot, PlotStatus, Region,
    REGIONS,
};
use rand::Rng;
use rust_decimal::Decimal;
use tracing::debug;

use crate::{crop, equipment, pick, random_id, round_to};

/// Operating organisations.
pub const OWNERS: [&str; 5] = [
    "Malaysian Agricultural Cooperative",
    "Federal Land Development Authority (FELDA)",
    "Sime Darby Plantation",
    "IOI Corporation",
    "Private Smallholder Cooperative",
];
pub const FARM_TYPES: [&str; 4] = ["commercial", "smallholder", "cooperative", "estate"];
pub const CERTIFICATIONS: [&str; 4] = ["RSPO", "MyGAP", "Organic", "None"];
pub const SOIL_TYPES: [&str; 5] = ["clay", "loam", "sandy", "peat", "alluvial"];
pub const DRAINAGE: [&str; 4] = ["excellent", "good", "moderate", "poor"];

/// Share of plots planted with the region's primary crop.
const PRIMARY_CROP_SHARE: f64 = 0.6;
const ACTIVE_SHARE: f64 = 0.8;

/// Plot status from its equipment and crop. Repair beats harvest; otherwise
/// the plot is active 80% of the time.
pub fn plot_status<R: Rng + ?Sized>(
    rng: &mut R,
    equipment: &[Equipment],
    crop: Option<&Crop>,
) -> PlotStatus {
    if equipment.iter().any(|e| e.status == EquipmentStatus::Repair) {
        PlotStatus::Maintenance
    } else if crop.map_or(false, |c| is_harvest_stage(&c.growth_stage)) {
        PlotStatus::Harvesting
    } else if rng.gen_bool(ACTIVE_SHARE) {
        PlotStatus::Active
    } else {
        PlotStatus::Idle
    }
}

pub fn generate_plot<R: Rng + ?Sized>(
    rng: &mut R,
    index: usize,
    region: &Region,
    now: DateTime<Utc>,
) -> Plot {
    let area = round_to(rng.gen_range(0.5..=5.0), 2);
    let crop_type = if rng.gen_bool(PRIMARY_CROP_SHARE) {
        region.primary_crop
    } else {
        pick(rng, &CropType::ALL)
    };
    let location = Location::new(
        region.lat + rng.gen_range(-0.01..=0.01),
        region.lng + rng.gen_range(-0.01..=0.01),
    );

    let crop = crop::generate(rng, crop_type, area, now);
    let sensor_count = rng.gen_range(2..=5);
    let sensors = (0..sensor_count).map(|_| random_id(rng)).collect();
    let equipment_count = rng.gen_range(1..=4);
    let equipment: Vec<Equipment> = (0..equipment_count)
        .map(|_| {
            let kind = equipment::random_type(rng);
            equipment::generate(rng, kind, &location, now)
        })
        .collect();
    let status = plot_status(rng, &equipment, Some(&crop));

    Plot {
        id: random_id(rng),
        name: format!("Plot {} - {}", index + 1, crop_type.display_name()),
        location,
        area,
        status,
        crop: Some(crop),
        equipment,
        sensors,
        irrigation_status: rng.gen_bool(0.5),
        soil_type: pick(rng, &SOIL_TYPES).to_string(),
        drainage: pick(rng, &DRAINAGE).to_string(),
        slope: round_to(rng.gen_range(0.0..=15.0), 1),
        elevation: rng.gen_range(5..=200),
        last_updated: now,
        created_date: now - Duration::days(rng.gen_range(30..=1000)),
    }
}

/// Generate a farm in `region`, or in a random region when none is given.
pub fn generate<R: Rng + ?Sized>(
    rng: &mut R,
    region: Option<&Region>,
    now: DateTime<Utc>,
) -> Farm {
    let region = match region {
        Some(r) => r,
        None => &REGIONS[rng.gen_range(0..REGIONS.len())],
    };
    let plot_count = rng.gen_range(3..=8);
    let plots: Vec<Plot> = (0..plot_count)
        .map(|i| generate_plot(rng, i, region, now))
        .collect();
    let total_area = plots.iter().map(|p| p.area).sum();

    let farm = Farm {
        id: random_id(rng),
        name: region.name.to_string(),
        location: format!("{}, Malaysia", region.state),
        coordinates: region.location(),
        owner: pick(rng, &OWNERS).to_string(),
        total_area,
        plots,
        established_date: now - Duration::days(365 * rng.gen_range(3..=25)),
        farm_type: pick(rng, &FARM_TYPES).to_string(),
        certification: pick(rng, &CERTIFICATIONS).to_string(),
        labor_force: rng.gen_range(5..=50),
        annual_revenue: Decimal::new(rng.gen_range(10_000_000..=200_000_000), 2),
        contact: Contact {
            phone: format!("+60{}", rng.gen_range(10_000_000..=99_999_999)),
            email: format!(
                "info@{}.com.my",
                region.name.to_lowercase().replace(' ', "")
            ),
        },
    };
    debug!(
        farm = %farm.name,
        plots = farm.plots.len(),
        total_area = farm.total_area,
        "generated farm"
    );
    farm
}
