//! Seasonal weather model.
//!
//! The season comes from the local calendar month; temperature gets a
//! diurnal adjustment, humidity falls as temperature rises above 27 °C,
//! rain falls with a season-dependent probability and light follows a
//! noon-peaked parabola attenuated by heavy rain.

use chrono::{DateTime, Datelike, Duration, NaiveDateTime, Timelike, Utc};
use farm_core::{Location, Season, WeatherSample};
use rand::Rng;
use std::f64::consts::PI;

use crate::round_to;

/// Malaysia keeps UTC+8 all year.
pub const LOCAL_UTC_OFFSET_HOURS: i64 = 8;

const HUMIDITY_FLOOR: f64 = 50.0;
const HUMIDITY_PIVOT_TEMP: f64 = 27.0;
const HEAVY_RAIN_MM: f64 = 10.0;

/// Local farm wall-clock time for an instant.
pub fn local_time(at: DateTime<Utc>) -> NaiveDateTime {
    (at + Duration::hours(LOCAL_UTC_OFFSET_HOURS)).naive_utc()
}

pub fn season_at(at: DateTime<Utc>) -> Season {
    Season::for_month(local_time(at).month())
}

fn is_daytime(hour: u32) -> bool {
    (6..=18).contains(&hour)
}

/// Daytime temperature bump: 0 at 06:00 and 18:00, +3 °C at noon.
pub fn diurnal_bump(hour: u32) -> f64 {
    (PI * (hour as f64 - 6.0) / 12.0).sin() * 3.0
}

/// Humidity falls 2 points per °C above the pivot, never below the floor.
pub fn humidity_for(base: f64, temperature: f64) -> f64 {
    (base - (temperature - HUMIDITY_PIVOT_TEMP) * 2.0).max(HUMIDITY_FLOOR)
}

/// Clear-sky light in lux, peaking at noon. Negative near the day edges.
pub fn daylight_lux(hour: u32) -> f64 {
    50_000.0 - (hour as f64 - 12.0).powi(2) * 2_000.0
}

/// Draw one weather sample at `now` shifted by `time_offset_hours`.
///
/// The model is region-wide; `_location` does not influence the draw.
pub fn sample<R: Rng + ?Sized>(
    rng: &mut R,
    _location: &Location,
    now: DateTime<Utc>,
    time_offset_hours: i64,
) -> WeatherSample {
    let at = now + Duration::hours(time_offset_hours);
    let local = local_time(at);
    let hour = local.hour();
    let season = Season::for_month(local.month());
    let climate = season.climate();

    let base_temp = rng.gen_range(climate.temp_range.0..=climate.temp_range.1);
    let temp_modifier = if is_daytime(hour) {
        diurnal_bump(hour)
    } else {
        -rng.gen_range(2.0..=5.0)
    };
    let temperature = round_to(base_temp + temp_modifier, 1);

    let humidity_base = rng.gen_range(climate.humidity_range.0..=climate.humidity_range.1);
    let humidity = round_to(humidity_for(humidity_base, temperature), 1);

    let rainfall = if rng.gen_bool(climate.rain_chance) {
        round_to(
            rng.gen_range(climate.rainfall_range.0..=climate.rainfall_range.1),
            1,
        )
    } else {
        0.0
    };

    let light = if is_daytime(hour) {
        let clear = daylight_lux(hour);
        if rainfall > HEAVY_RAIN_MM {
            clear * 0.3
        } else {
            clear
        }
    } else {
        rng.gen_range(0.0..100.0)
    };

    WeatherSample {
        temperature,
        humidity,
        rainfall,
        light_intensity: light.max(0.0).round(),
        season,
        timestamp: at,
    }
}
