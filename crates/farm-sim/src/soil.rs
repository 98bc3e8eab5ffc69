//! Soil model conditioned on crop profile, recent rain and season.

use farm_core::{crop_profile, CropType, SoilSample, WeatherSample};
use rand::Rng;

use crate::round_to;

pub const MOISTURE_MIN: f64 = 20.0;
pub const MOISTURE_MAX: f64 = 100.0;

fn rain_moisture_shift<R: Rng + ?Sized>(rng: &mut R, rainfall: f64) -> f64 {
    if rainfall > 20.0 {
        rng.gen_range(5.0..=15.0)
    } else if rainfall == 0.0 {
        rng.gen_range(-10.0..=-5.0)
    } else {
        rng.gen_range(-2.0..=5.0)
    }
}

pub fn sample<R: Rng + ?Sized>(
    rng: &mut R,
    crop_type: CropType,
    weather: &WeatherSample,
) -> SoilSample {
    let profile = crop_profile(crop_type);
    let (m_lo, m_hi) = profile.optimal_moisture;
    let base = rng.gen_range(m_lo..=m_hi);
    let moisture = base
        + rain_moisture_shift(rng, weather.rainfall)
        + weather.season.climate().soil_moisture_modifier;

    let (ph_lo, ph_hi) = profile.optimal_ph;
    SoilSample {
        soil_moisture: round_to(moisture.clamp(MOISTURE_MIN, MOISTURE_MAX), 1),
        ph_level: round_to(rng.gen_range(ph_lo - 0.5..=ph_hi + 0.5), 1),
        nitrogen: round_to(rng.gen_range(20.0..=80.0), 1),
        phosphorus: round_to(rng.gen_range(10.0..=50.0), 1),
        potassium: round_to(rng.gen_range(100.0..=300.0), 1),
        organic_matter: round_to(rng.gen_range(2.0..=8.0), 1),
    }
}
