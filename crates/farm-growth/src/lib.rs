#![deny(warnings)]

//! Crop growth simulation.
//!
//! Converts a window of recent sensor readings into a growth-rate
//! multiplier and advances a crop's stage, progress, yield and harvest
//! projection with it. Stages here come from hand-authored day thresholds,
//! which differ from the equal buckets used when a crop is first generated.

use chrono::{DateTime, Duration, Utc};
use farm_core::{crop_profile, Crop, CropType, Farm, HarvestOutlook, SensorReading};
use tracing::debug;

/// Readings considered by [`growth_rate`]; a week at hourly cadence.
pub const WINDOW_LEN: usize = 168;
pub const MIN_RATE: f64 = 0.1;
pub const MAX_RATE: f64 = 2.0;
/// Projections further out than this many cycles are capped and flagged.
pub const MAX_CYCLES_AHEAD: f64 = 2.0;

/// One weighted environmental factor with its optimal band.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GrowthFactor {
    pub name: &'static str,
    pub optimal: (f64, f64),
    pub weight: f64,
}

pub const GROWTH_FACTORS: [GrowthFactor; 5] = [
    GrowthFactor {
        name: "temperature",
        optimal: (26.0, 30.0),
        weight: 0.25,
    },
    GrowthFactor {
        name: "humidity",
        optimal: (70.0, 85.0),
        weight: 0.15,
    },
    GrowthFactor {
        name: "soil_moisture",
        optimal: (70.0, 90.0),
        weight: 0.30,
    },
    GrowthFactor {
        name: "ph_level",
        optimal: (6.0, 7.0),
        weight: 0.15,
    },
    GrowthFactor {
        name: "rainfall",
        optimal: (10.0, 30.0),
        weight: 0.15,
    },
];

pub fn crop_modifier(crop_type: CropType) -> f64 {
    match crop_type {
        CropType::Rice => 1.0,
        CropType::PalmOil => 0.8,
        CropType::Rubber => 0.6,
        CropType::Durian => 1.2,
        CropType::Banana => 1.1,
        CropType::Coconut => 0.7,
    }
}

/// 1.0 inside the band, otherwise `1 - 0.5 * relative deviation` from the
/// nearer bound, floored at 0.1.
pub fn factor_score(value: f64, optimal: (f64, f64)) -> f64 {
    let (lo, hi) = optimal;
    if (lo..=hi).contains(&value) {
        return 1.0;
    }
    let deviation = if value < lo {
        (lo - value) / lo
    } else {
        (value - hi) / hi
    };
    (1.0 - deviation * 0.5).max(0.1)
}

/// Growth multiplier in `[0.1, 2.0]` from the newest [`WINDOW_LEN`] readings.
///
/// Temperature, humidity, soil moisture and pH are averaged over the window;
/// rainfall is summed. An empty window gives 1.0.
pub fn growth_rate(readings: &[SensorReading], crop_type: CropType) -> f64 {
    let window = &readings[readings.len().saturating_sub(WINDOW_LEN)..];
    if window.is_empty() {
        return 1.0;
    }
    let n = window.len() as f64;
    let avg = |f: fn(&SensorReading) -> f64| window.iter().map(f).sum::<f64>() / n;
    let values = [
        avg(|r| r.temperature),
        avg(|r| r.humidity),
        avg(|r| r.soil_moisture),
        avg(|r| r.ph_level),
        window.iter().map(|r| r.rainfall).sum(),
    ];

    let (weighted, total_weight) = GROWTH_FACTORS
        .iter()
        .zip(values)
        .fold((0.0, 0.0), |(acc, w), (factor, value)| {
            (acc + factor_score(value, factor.optimal) * factor.weight, w + factor.weight)
        });
    let rate = weighted / total_weight * crop_modifier(crop_type);
    // max/min rather than clamp so a NaN average lands on the floor
    rate.max(MIN_RATE).min(MAX_RATE)
}

/// Stage name and the adjusted day it begins, in lifecycle order.
pub fn stage_thresholds(crop_type: CropType) -> &'static [(&'static str, u32)] {
    match crop_type {
        CropType::Rice => &[
            ("seedling", 0),
            ("tillering", 30),
            ("panicle_initiation", 60),
            ("flowering", 90),
            ("grain_filling", 105),
            ("maturity", 120),
        ],
        CropType::PalmOil => &[
            ("nursery", 0),
            ("immature", 90),
            ("young_mature", 180),
            ("prime_mature", 270),
            ("old_mature", 300),
        ],
        CropType::Rubber => &[
            ("immature", 0),
            ("young_tapping", 120),
            ("peak_production", 240),
            ("declining", 300),
        ],
        CropType::Durian => &[
            ("flowering", 0),
            ("fruit_set", 30),
            ("fruit_development", 90),
            ("ripening", 120),
            ("harvest", 150),
        ],
        CropType::Banana => &[
            ("sucker", 0),
            ("vegetative", 60),
            ("flowering", 180),
            ("bunch_development", 240),
            ("harvest", 300),
        ],
        CropType::Coconut => &[
            ("seedling", 0),
            ("juvenile", 90),
            ("flowering", 180),
            ("bearing", 270),
            ("mature", 365),
        ],
    }
}

/// Last stage whose threshold is at or below `adjusted_days`.
pub fn stage_for(crop_type: CropType, adjusted_days: f64) -> &'static str {
    let table = stage_thresholds(crop_type);
    table
        .iter()
        .take_while(|(_, day)| f64::from(*day) <= adjusted_days)
        .last()
        .unwrap_or(&table[0])
        .0
}

fn yield_modifier(rate: f64) -> f64 {
    if rate > 1.2 {
        1.1
    } else if rate < 0.8 {
        0.9
    } else {
        1.0
    }
}

/// Project the harvest date from the remaining adjusted days.
///
/// A non-positive remainder is overdue and pinned to `now`; a remainder
/// beyond [`MAX_CYCLES_AHEAD`] cycles is stalled and capped there.
pub fn project_harvest(
    remaining_days: f64,
    cycle_days: u32,
    now: DateTime<Utc>,
) -> (DateTime<Utc>, HarvestOutlook) {
    let cap = f64::from(cycle_days) * MAX_CYCLES_AHEAD;
    if !(remaining_days > 0.0) {
        (now, HarvestOutlook::Overdue)
    } else if remaining_days > cap {
        (now + days_f64(cap), HarvestOutlook::Stalled)
    } else {
        (now + days_f64(remaining_days), HarvestOutlook::OnTrack)
    }
}

fn days_f64(days: f64) -> Duration {
    Duration::seconds((days * 86_400.0).round() as i64)
}

/// Advance a crop growing on `area` hectares with a growth rate observed at
/// `now`.
///
/// The rate is clamped to `[0.1, 2.0]` before use. The yield adjustment is
/// applied to the crop's baseline yield, so repeated updates do not compound,
/// and the per-hectare yield is recomputed from the adjusted total.
pub fn advance(crop: &Crop, growth_rate: f64, area: f64, now: DateTime<Utc>) -> Crop {
    let rate = growth_rate.max(MIN_RATE).min(MAX_RATE);
    let cycle_days = crop_profile(crop.crop_type).cycle_days;
    let elapsed = (now - crop.planted_date).num_days().max(0) as f64;
    let adjusted = elapsed * rate;

    let remaining = (f64::from(cycle_days) - adjusted) / rate;
    let (expected_harvest, outlook) = project_harvest(remaining, cycle_days, now);
    let progress = (adjusted / f64::from(cycle_days) * 100.0).clamp(0.0, 100.0);
    let baseline = crop.yield_baseline.unwrap_or(crop.yield_estimate);
    let yield_estimate = (baseline * yield_modifier(rate)).round();
    let yield_per_hectare = if area > 0.0 {
        (yield_estimate / area).round()
    } else {
        0.0
    };

    Crop {
        growth_stage: stage_for(crop.crop_type, adjusted).to_string(),
        growth_progress: (progress * 10.0).round() / 10.0,
        yield_estimate,
        yield_per_hectare,
        yield_baseline: Some(baseline),
        expected_harvest,
        growth_rate: Some((rate * 100.0).round() / 100.0),
        last_growth_update: Some(now),
        harvest_outlook: Some(outlook),
        ..crop.clone()
    }
}

/// Advance every planted plot using the readings that belong to it.
///
/// `readings` is expected in chronological order; each plot's window is the
/// newest [`WINDOW_LEN`] of its own readings.
pub fn simulate_farm(farm: &mut Farm, readings: &[SensorReading], now: DateTime<Utc>) {
    for plot in &mut farm.plots {
        let Some(crop) = plot.crop.as_ref() else {
            continue;
        };
        let own: Vec<SensorReading> = readings
            .iter()
            .filter(|r| r.plot_id == plot.id)
            .cloned()
            .collect();
        let rate = growth_rate(&own, crop.crop_type);
        let updated = advance(crop, rate, plot.area, now);
        debug!(
            plot = %plot.name,
            rate,
            stage = %updated.growth_stage,
            progress = updated.growth_progress,
            "advanced crop"
        );
        plot.crop = Some(updated);
        plot.last_updated = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use farm_core::{validate_crop, Location};
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use uuid::Uuid;

    fn ideal_reading() -> SensorReading {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let ctx = farm_sim::PlotContext {
            plot_id: Uuid::from_u128(1),
            crop_type: CropType::Rice,
            location: Location::new(3.0, 101.0),
        };
        let mut r = farm_sim::sensor::reading(&mut rng, Uuid::from_u128(2), &ctx, Utc::now(), 0);
        r.temperature = 28.0;
        r.humidity = 75.0;
        r.soil_moisture = 80.0;
        r.ph_level = 6.5;
        r.rainfall = 20.0;
        r
    }

    const AREA: f64 = 2.0;

    fn crop_planted(crop_type: CropType, days_ago: i64, now: DateTime<Utc>) -> Crop {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut c = farm_sim::crop::generate(&mut rng, crop_type, AREA, now);
        c.planted_date = now - Duration::days(days_ago);
        c
    }

    #[test]
    fn empty_window_is_neutral() {
        assert_eq!(growth_rate(&[], CropType::Rice), 1.0);
        assert_eq!(growth_rate(&[], CropType::Rubber), 1.0);
    }

    #[test]
    fn in_band_window_yields_crop_modifier() {
        // rainfall is summed, so a single reading keeps it in band
        let window = vec![ideal_reading()];
        for ct in CropType::ALL {
            assert!((growth_rate(&window, ct) - crop_modifier(ct)).abs() < 1e-12);
        }
        assert!((growth_rate(&window, CropType::Rubber) - 0.6).abs() < 1e-12);
    }

    #[test]
    fn only_newest_window_counts() {
        let mut stale = ideal_reading();
        stale.temperature = 60.0;
        let mut window = vec![stale; 50];
        let mut fresh = vec![ideal_reading(); WINDOW_LEN];
        for r in &mut fresh {
            r.rainfall = 0.1;
        }
        window.extend(fresh);
        // 168 * 0.1 mm keeps the summed rainfall in band
        assert!((growth_rate(&window, CropType::Rice) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn factor_penalty_is_relative_to_nearer_bound() {
        assert_eq!(factor_score(28.0, (26.0, 30.0)), 1.0);
        assert!((factor_score(33.0, (26.0, 30.0)) - 0.95).abs() < 1e-12);
        assert!((factor_score(13.0, (26.0, 30.0)) - 0.75).abs() < 1e-12);
        assert_eq!(factor_score(0.0, (10.0, 30.0)), 0.5);
        assert_eq!(factor_score(1_000.0, (10.0, 30.0)), 0.1);
    }

    #[test]
    fn stage_table_agrees_with_profile_names() {
        for ct in CropType::ALL {
            let stages = crop_profile(ct).growth_stages;
            for (name, _) in stage_thresholds(ct) {
                assert!(stages.contains(name), "{name} is not a {ct} stage");
            }
        }
    }

    #[test]
    fn stage_lookup_takes_last_reached_threshold() {
        assert_eq!(stage_for(CropType::Rice, 0.0), "seedling");
        assert_eq!(stage_for(CropType::Rice, 59.9), "tillering");
        assert_eq!(stage_for(CropType::Rice, 105.0), "grain_filling");
        assert_eq!(stage_for(CropType::Rice, 900.0), "maturity");
        assert_eq!(stage_for(CropType::Durian, 120.0), "ripening");
    }

    #[test]
    fn advance_on_track() {
        let now = Utc::now();
        let c = crop_planted(CropType::Rice, 40, now);
        let base_yield = c.yield_estimate;
        let next = advance(&c, 1.0, AREA, now);
        assert_eq!(next.growth_stage, "tillering");
        assert_eq!(next.growth_progress, 33.3);
        assert_eq!(next.yield_estimate, base_yield);
        assert_eq!(next.harvest_outlook, Some(HarvestOutlook::OnTrack));
        assert_eq!(next.expected_harvest, now + Duration::days(80));
        assert_eq!(next.growth_rate, Some(1.0));
        assert_eq!(next.last_growth_update, Some(now));
        assert_eq!(next.id, c.id);
        assert!(validate_crop(&next).is_ok());
    }

    #[test]
    fn fast_growth_boosts_yield_and_can_finish() {
        let now = Utc::now();
        let c = crop_planted(CropType::Rice, 70, now);
        let next = advance(&c, 1.9, AREA, now);
        assert_eq!(next.yield_estimate, (c.yield_estimate * 1.1).round());
        assert_eq!(next.growth_progress, 100.0);
        assert_eq!(next.growth_stage, "maturity");
        assert_eq!(next.harvest_outlook, Some(HarvestOutlook::Overdue));
        assert_eq!(next.expected_harvest, now);
    }

    #[test]
    fn slow_growth_is_stalled_and_capped() {
        let now = Utc::now();
        let c = crop_planted(CropType::Rice, 1, now);
        let next = advance(&c, 0.1, AREA, now);
        assert_eq!(next.yield_estimate, (c.yield_estimate * 0.9).round());
        // (120 - 0.1) / 0.1 far exceeds two cycles
        assert_eq!(next.harvest_outlook, Some(HarvestOutlook::Stalled));
        assert_eq!(next.expected_harvest, now + Duration::days(240));
    }

    #[test]
    fn repeated_updates_do_not_compound_yield() {
        let now = Utc::now();
        let c = crop_planted(CropType::Durian, 60, now);
        let once = advance(&c, 1.5, AREA, now);
        let twice = advance(&once, 1.5, AREA, now);
        assert_eq!(once.yield_baseline, Some(c.yield_estimate));
        assert_eq!(twice.yield_estimate, once.yield_estimate);
        let slowed = advance(&twice, 0.5, AREA, now);
        assert_eq!(slowed.yield_estimate, (c.yield_estimate * 0.9).round());
    }

    #[test]
    fn per_hectare_yield_follows_adjusted_total() {
        let now = Utc::now();
        let c = crop_planted(CropType::Banana, 90, now);
        let fast = advance(&c, 1.6, AREA, now);
        assert_eq!(fast.yield_estimate, (c.yield_estimate * 1.1).round());
        assert_eq!(fast.yield_per_hectare, (fast.yield_estimate / AREA).round());
        let slow = advance(&fast, 0.3, AREA, now);
        assert_eq!(slow.yield_per_hectare, (slow.yield_estimate / AREA).round());
        assert_eq!(advance(&c, 1.6, 0.0, now).yield_per_hectare, 0.0);
    }

    #[test]
    fn out_of_range_rates_are_clamped() {
        let now = Utc::now();
        let c = crop_planted(CropType::Banana, 30, now);
        assert_eq!(advance(&c, 9.0, AREA, now).growth_rate, Some(2.0));
        assert_eq!(advance(&c, 0.0, AREA, now).growth_rate, Some(0.1));
        assert_eq!(advance(&c, f64::NAN, AREA, now).growth_rate, Some(0.1));
    }

    #[test]
    fn farm_simulation_touches_every_planted_plot() {
        let mut rng = ChaCha8Rng::seed_from_u64(31);
        let now = Utc::now();
        let mut farm = farm_sim::farm::generate(&mut rng, None, now);
        let readings = farm_sim::sensor::farm_history(&mut rng, &farm, now, 7, 1);
        simulate_farm(&mut farm, &readings, now);
        for plot in &farm.plots {
            let crop = plot.crop.as_ref().unwrap();
            assert!(crop.growth_rate.is_some());
            assert_eq!(crop.last_growth_update, Some(now));
            assert_eq!(crop.yield_per_hectare, (crop.yield_estimate / plot.area).round());
            assert!(validate_crop(crop).is_ok());
        }
    }

    fn arb_reading() -> impl Strategy<Value = (f64, f64, f64, f64, f64)> {
        (
            -10.0f64..60.0,
            0.0f64..100.0,
            20.0f64..100.0,
            3.0f64..10.0,
            0.0f64..100.0,
        )
    }

    proptest! {
        #[test]
        fn rate_is_always_bounded(
            fields in prop::collection::vec(arb_reading(), 0..300),
            t in 0usize..6,
        ) {
            let base = ideal_reading();
            let window: Vec<SensorReading> = fields
                .into_iter()
                .map(|(temp, hum, moist, ph, rain)| SensorReading {
                    temperature: temp,
                    humidity: hum,
                    soil_moisture: moist,
                    ph_level: ph,
                    rainfall: rain,
                    ..base.clone()
                })
                .collect();
            let rate = growth_rate(&window, CropType::ALL[t]);
            prop_assert!((MIN_RATE..=MAX_RATE).contains(&rate));
        }

        #[test]
        fn advanced_crops_stay_valid(
            seed in any::<u64>(),
            t in 0usize..6,
            days in 0i64..800,
            rate in 0.0f64..3.0,
        ) {
            let now = Utc::now();
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let mut c = farm_sim::crop::generate(&mut rng, CropType::ALL[t], 1.5, now);
            c.planted_date = now - Duration::days(days);
            let next = advance(&c, rate, 1.5, now);
            prop_assert!(validate_crop(&next).is_ok());
            prop_assert!(next.expected_harvest >= now);
            let cap = now + Duration::days(i64::from(crop_profile(c.crop_type).cycle_days) * 2);
            prop_assert!(next.expected_harvest <= cap);
        }
    }
}
