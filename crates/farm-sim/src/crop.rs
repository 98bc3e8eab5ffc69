//! Crop generator.

use chrono::{DateTime, Duration, Utc};
use farm_core::profiles::is_harvest_stage;
use farm_core::{
    crop_profile, Crop, CropProfile, CropType, HealthStatus, Level, PestPressure,
};
use rand::Rng;

use crate::{pick, random_id, round_to};

/// Days after planting the generator never samples into the last month.
const PLANTING_MARGIN_DAYS: u32 = 30;
const MIN_DAYS_PLANTED: u32 = 10;

/// Stage for a crop `days_since_planted` into its cycle, splitting the cycle
/// into equal buckets per stage. Days past the cycle map to the last stage.
pub fn bucket_stage(profile: &CropProfile, days_since_planted: u32) -> &'static str {
    let stages = profile.growth_stages;
    let width = profile.cycle_days as f64 / stages.len() as f64;
    let idx = (days_since_planted as f64 / width) as usize;
    stages[idx.min(stages.len() - 1)]
}

pub fn generate<R: Rng + ?Sized>(
    rng: &mut R,
    crop_type: CropType,
    plot_area: f64,
    now: DateTime<Utc>,
) -> Crop {
    let profile = crop_profile(crop_type);
    let days = rng.gen_range(MIN_DAYS_PLANTED..=profile.cycle_days - PLANTING_MARGIN_DAYS);
    let stage = bucket_stage(profile, days);

    let base_yield = rng.gen_range(profile.yield_range.0..=profile.yield_range.1);
    let yield_modifier = if is_harvest_stage(stage) {
        rng.gen_range(0.9..=1.1)
    } else {
        rng.gen_range(0.3..=0.8)
    };
    let yield_estimate = (base_yield * yield_modifier * plot_area).round();
    let yield_per_hectare = if plot_area > 0.0 {
        (yield_estimate / plot_area).round()
    } else {
        0.0
    };

    let planted_date = now - Duration::days(i64::from(days));
    Crop {
        id: random_id(rng),
        crop_type,
        variety: pick(rng, profile.varieties).to_string(),
        planted_date,
        expected_harvest: planted_date + Duration::days(i64::from(profile.cycle_days)),
        growth_stage: stage.to_string(),
        growth_progress: round_to(days as f64 / profile.cycle_days as f64 * 100.0, 1),
        yield_estimate,
        yield_per_hectare,
        health_status: pick(rng, &HealthStatus::ALL),
        disease_risk: pick(rng, &Level::ALL),
        pest_pressure: pick(rng, &PestPressure::ALL),
        irrigation_needs: pick(rng, &Level::ALL),
        fertilizer_last_applied: now - Duration::days(rng.gen_range(7..=60)),
        pesticide_last_applied: now - Duration::days(rng.gen_range(14..=90)),
        yield_baseline: None,
        growth_rate: None,
        last_growth_update: None,
        harvest_outlook: None,
    }
}
