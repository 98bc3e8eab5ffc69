//! Daily weather forecast built from the weather model.

use chrono::{DateTime, Datelike, Utc, Weekday};
use farm_core::{ForecastDay, Location};
use rand::Rng;

use crate::weather::{self, local_time};
use crate::{pick, round_to};

pub const CONDITIONS: [&str; 7] = [
    "Sunny",
    "Partly Cloudy",
    "Cloudy",
    "Light Rain",
    "Heavy Rain",
    "Thunderstorms",
    "Hazy",
];

fn day_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Forecast for the `days` local days following `now`.
pub fn generate<R: Rng + ?Sized>(
    rng: &mut R,
    location: &Location,
    days: u32,
    now: DateTime<Utc>,
) -> Vec<ForecastDay> {
    (1..=days)
        .map(|day| {
            let w = weather::sample(rng, location, now, i64::from(day) * 24);
            let date = local_time(w.timestamp).date();
            let low = w.temperature - rng.gen_range(3.0..=8.0);
            let high = w.temperature + rng.gen_range(2.0..=6.0);
            ForecastDay {
                date,
                day_name: day_name(date.weekday()).to_string(),
                temperature_min: round_to(low, 1),
                temperature_max: round_to(high, 1),
                humidity: w.humidity,
                rainfall_probability: rng.gen_range(20..=80),
                rainfall_amount: w.rainfall,
                wind_speed: round_to(rng.gen_range(5.0..=20.0), 1),
                uv_index: rng.gen_range(6..=12),
                conditions: pick(rng, &CONDITIONS).to_string(),
            }
        })
        .collect()
}
