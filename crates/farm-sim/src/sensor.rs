//! Sensor readings: one weather draw plus one soil draw plus device telemetry.

use chrono::{DateTime, Utc};
use farm_core::{CropType, DataQuality, Farm, Location, Plot, SensorReading};
use rand::Rng;
use uuid::Uuid;

use crate::{pick, round_to, soil, weather};

/// What a reading needs to know about the plot it belongs to.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlotContext {
    pub plot_id: Uuid,
    pub crop_type: CropType,
    pub location: Location,
}

impl PlotContext {
    pub fn for_plot(plot: &Plot) -> Self {
        Self {
            plot_id: plot.id,
            crop_type: plot.crop_type(),
            location: plot.location,
        }
    }
}

pub fn reading<R: Rng + ?Sized>(
    rng: &mut R,
    sensor_id: Uuid,
    ctx: &PlotContext,
    now: DateTime<Utc>,
    time_offset_hours: i64,
) -> SensorReading {
    let w = weather::sample(rng, &ctx.location, now, time_offset_hours);
    let s = soil::sample(rng, ctx.crop_type, &w);
    SensorReading {
        sensor_id,
        plot_id: ctx.plot_id,
        timestamp: w.timestamp,
        location: ctx.location,
        temperature: w.temperature,
        humidity: w.humidity,
        rainfall: w.rainfall,
        light_intensity: w.light_intensity,
        soil_moisture: s.soil_moisture,
        ph_level: s.ph_level,
        nitrogen: s.nitrogen,
        phosphorus: s.phosphorus,
        potassium: s.potassium,
        organic_matter: s.organic_matter,
        wind_speed: round_to(rng.gen_range(0.0..=15.0), 1),
        wind_direction: rng.gen_range(0..=360),
        uv_index: rng.gen_range(6..=12),
        co2_level: rng.gen_range(380..=420),
        season: w.season,
        data_quality: pick(rng, &DataQuality::ALL),
        battery_level: rng.gen_range(60..=100),
    }
}

/// Backfill `days` days of readings every `step_hours` hours for each sensor,
/// ending at `now`. Output is in chronological order.
pub fn historical<R: Rng + ?Sized>(
    rng: &mut R,
    sensor_ids: &[Uuid],
    ctx: &PlotContext,
    now: DateTime<Utc>,
    days: u32,
    step_hours: u32,
) -> Vec<SensorReading> {
    let step = step_hours.max(1) as usize;
    let mut out = Vec::with_capacity(sensor_ids.len() * days as usize * (24 / step + 1));
    for day in 0..days {
        for hour in (0..24u32).step_by(step) {
            let offset = -i64::from(days - day) * 24 + i64::from(hour);
            for &sensor_id in sensor_ids {
                out.push(reading(rng, sensor_id, ctx, now, offset));
            }
        }
    }
    out
}

/// One current reading for every sensor on the farm.
pub fn live_readings<R: Rng + ?Sized>(
    rng: &mut R,
    farm: &Farm,
    now: DateTime<Utc>,
) -> Vec<SensorReading> {
    let mut out = Vec::with_capacity(farm.sensor_count());
    for plot in &farm.plots {
        let ctx = PlotContext::for_plot(plot);
        for &sensor_id in &plot.sensors {
            out.push(reading(rng, sensor_id, &ctx, now, 0));
        }
    }
    out
}

/// History for every plot, merged into one chronological series.
pub fn farm_history<R: Rng + ?Sized>(
    rng: &mut R,
    farm: &Farm,
    now: DateTime<Utc>,
    days: u32,
    step_hours: u32,
) -> Vec<SensorReading> {
    let mut out = Vec::new();
    for plot in &farm.plots {
        let ctx = PlotContext::for_plot(plot);
        out.extend(historical(rng, &plot.sensors, &ctx, now, days, step_hours));
    }
    out.sort_by_key(|r| r.timestamp);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use farm_core::validate_reading;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn ctx() -> PlotContext {
        PlotContext {
            plot_id: Uuid::from_u128(7),
            crop_type: CropType::Durian,
            location: Location::new(3.8126, 103.3256),
        }
    }

    #[test]
    fn reading_carries_plot_identity() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let now = Utc::now();
        let r = reading(&mut rng, Uuid::from_u128(1), &ctx(), now, -3);
        assert_eq!(r.plot_id, Uuid::from_u128(7));
        assert_eq!(r.sensor_id, Uuid::from_u128(1));
        assert_eq!(r.timestamp, now - chrono::Duration::hours(3));
        assert_eq!(r.location, ctx().location);
    }

    #[test]
    fn history_covers_days_at_step() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let now = Utc::now();
        let sensors = [Uuid::from_u128(1), Uuid::from_u128(2)];
        let rs = historical(&mut rng, &sensors, &ctx(), now, 3, 6);
        assert_eq!(rs.len(), 3 * 4 * 2);
        assert_eq!(rs[0].timestamp, now - chrono::Duration::hours(72));
        assert!(rs.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
        assert!(rs.iter().all(|r| r.timestamp < now));
    }

    proptest! {
        #[test]
        fn readings_are_within_bounds(seed in any::<u64>(), offset in -720i64..0) {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let r = reading(&mut rng, Uuid::from_u128(1), &ctx(), Utc::now(), offset);
            prop_assert!(validate_reading(&r).is_ok());
            prop_assert!(r.wind_direction <= 360);
            prop_assert!((6..=12).contains(&r.uv_index));
            prop_assert!((380..=420).contains(&r.co2_level));
            prop_assert!((60..=100).contains(&r.battery_level));
            prop_assert!((0.0..=15.0).contains(&r.wind_speed));
        }
    }
}
