//! Equipment generator.

use chrono::{DateTime, Duration, Utc};
use farm_core::profiles::equipment_models;
use farm_core::{Equipment, EquipmentStatus, EquipmentType, Location};
use rand::Rng;
use rust_decimal::Decimal;

use crate::{pick, random_id, round_to};

/// Status weights, cumulative in this order.
pub const STATUS_WEIGHTS: [(EquipmentStatus, f64); 4] = [
    (EquipmentStatus::Operational, 0.70),
    (EquipmentStatus::Maintenance, 0.15),
    (EquipmentStatus::Idle, 0.10),
    (EquipmentStatus::Repair, 0.05),
];

/// Map a uniform roll in `[0, 1)` onto [`STATUS_WEIGHTS`].
pub fn status_for_roll(roll: f64) -> EquipmentStatus {
    let mut cumulative = 0.0;
    for (status, weight) in STATUS_WEIGHTS {
        cumulative += weight;
        if roll < cumulative {
            return status;
        }
    }
    EquipmentStatus::Repair
}

pub fn random_type<R: Rng + ?Sized>(rng: &mut R) -> EquipmentType {
    pick(rng, &EquipmentType::ALL)
}

pub fn generate<R: Rng + ?Sized>(
    rng: &mut R,
    equipment_type: EquipmentType,
    plot_location: &Location,
    now: DateTime<Utc>,
) -> Equipment {
    let name = pick(rng, equipment_models(equipment_type));
    let status = status_for_roll(rng.gen::<f64>());

    let mut hours = rng.gen_range(100.0..=3000.0);
    if status == EquipmentStatus::Repair {
        hours += rng.gen_range(500.0..=1000.0);
    }
    let model = format!("{}-{}", rng.gen_range(2020..=2023), rng.gen_range(100..=999));
    let location = Location::new(
        plot_location.lat + rng.gen_range(-0.002..=0.002),
        plot_location.lng + rng.gen_range(-0.002..=0.002),
    );
    let last_maintenance = now - Duration::days(rng.gen_range(1..=90));
    let next_maintenance = now + Duration::days(rng.gen_range(30..=180));
    let fuel_level = if equipment_type.uses_fuel() {
        Some(rng.gen_range(20..=100))
    } else {
        None
    };

    Equipment {
        id: random_id(rng),
        name: name.to_string(),
        equipment_type,
        model,
        status,
        location,
        operational_hours: round_to(hours, 1),
        last_maintenance,
        next_maintenance,
        fuel_level,
        efficiency: round_to(rng.gen_range(75.0..=98.0), 1),
        cost_per_hour: Decimal::new(rng.gen_range(5_000..=20_000), 2),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn roll_boundaries() {
        assert_eq!(status_for_roll(0.0), EquipmentStatus::Operational);
        assert_eq!(status_for_roll(0.69), EquipmentStatus::Operational);
        assert_eq!(status_for_roll(0.70), EquipmentStatus::Maintenance);
        assert_eq!(status_for_roll(0.90), EquipmentStatus::Idle);
        assert_eq!(status_for_roll(0.96), EquipmentStatus::Repair);
        assert_eq!(status_for_roll(0.999_999), EquipmentStatus::Repair);
    }

    #[test]
    fn weights_sum_to_one() {
        let total: f64 = STATUS_WEIGHTS.iter().map(|(_, w)| w).sum();
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn status_distribution_is_roughly_weighted() {
        let mut rng = ChaCha8Rng::seed_from_u64(21);
        let loc = Location::new(2.0, 102.0);
        let now = Utc::now();
        let n = 4_000;
        let operational = (0..n)
            .filter(|_| {
                generate(&mut rng, EquipmentType::Drone, &loc, now).status
                    == EquipmentStatus::Operational
            })
            .count();
        let share = operational as f64 / n as f64;
        assert!((0.65..0.75).contains(&share), "operational share {share}");
    }

    proptest! {
        #[test]
        fn equipment_fields_in_range(seed in any::<u64>(), t in 0usize..5) {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let now = Utc::now();
            let kind = EquipmentType::ALL[t];
            let loc = Location::new(4.0, 101.0);
            let e = generate(&mut rng, kind, &loc, now);
            prop_assert_eq!(e.fuel_level.is_some(), kind.uses_fuel());
            if let Some(f) = e.fuel_level {
                prop_assert!((20..=100).contains(&f));
            }
            prop_assert!((75.0..=98.0).contains(&e.efficiency));
            prop_assert!(e.last_maintenance < now && e.next_maintenance > now);
            prop_assert!((e.location.lat - loc.lat).abs() <= 0.002 + 1e-12);
            prop_assert!(e.cost_per_hour >= Decimal::new(50, 0));
            prop_assert!(e.cost_per_hour <= Decimal::new(200, 0));
            let max_hours = if e.status == EquipmentStatus::Repair { 4000.0 } else { 3000.0 };
            prop_assert!(e.operational_hours >= 100.0 && e.operational_hours <= max_hours);
            prop_assert!(equipment_models(kind).contains(&e.name.as_str()));
        }
    }
}
