//! Threshold alerts derived from equipment state.
//!
//! Derivation is a pure function of the equipment records and the supplied
//! clock, so repeated calls with the same inputs agree, ids included.

use chrono::{DateTime, Utc};
use farm_core::{Alert, AlertType, Equipment, Severity};
use uuid::Uuid;

/// Days since maintenance after which an alert is raised.
pub const MAINTENANCE_DUE_DAYS: i64 = 60;
/// Days since maintenance after which the alert is high severity.
pub const MAINTENANCE_CRITICAL_DAYS: i64 = 90;
pub const LOW_FUEL: u8 = 25;
pub const CRITICAL_FUEL: u8 = 15;
pub const MIN_EFFICIENCY: f64 = 80.0;

fn alert_id(equipment_id: Uuid, alert_type: AlertType, now: DateTime<Utc>) -> Uuid {
    let name = format!("{}:{}", alert_type.as_str(), now.timestamp_millis());
    Uuid::new_v5(&equipment_id, name.as_bytes())
}

fn alert(
    equipment: &Equipment,
    alert_type: AlertType,
    severity: Severity,
    message: String,
    action: &str,
    now: DateTime<Utc>,
) -> Alert {
    Alert {
        id: alert_id(equipment.id, alert_type, now),
        alert_type,
        severity,
        equipment_id: equipment.id,
        equipment_name: equipment.name.clone(),
        message,
        timestamp: now,
        action_required: action.to_string(),
    }
}

/// Alerts for one piece of equipment, in maintenance, fuel, efficiency order.
pub fn for_equipment(equipment: &Equipment, now: DateTime<Utc>) -> Vec<Alert> {
    let mut out = Vec::new();

    let since_maintenance = (now - equipment.last_maintenance).num_days();
    if since_maintenance > MAINTENANCE_DUE_DAYS {
        let severity = if since_maintenance > MAINTENANCE_CRITICAL_DAYS {
            Severity::High
        } else {
            Severity::Medium
        };
        out.push(alert(
            equipment,
            AlertType::Maintenance,
            severity,
            format!(
                "Maintenance overdue by {} days",
                since_maintenance - MAINTENANCE_DUE_DAYS
            ),
            "Schedule maintenance",
            now,
        ));
    }

    if let Some(fuel) = equipment.fuel_level {
        if fuel < LOW_FUEL {
            let severity = if fuel <= CRITICAL_FUEL {
                Severity::High
            } else {
                Severity::Medium
            };
            out.push(alert(
                equipment,
                AlertType::Fuel,
                severity,
                format!("Low fuel level: {fuel}%"),
                "Refuel equipment",
                now,
            ));
        }
    }

    if equipment.efficiency < MIN_EFFICIENCY {
        out.push(alert(
            equipment,
            AlertType::Efficiency,
            Severity::Medium,
            format!("Low efficiency: {}%", equipment.efficiency),
            "Check equipment performance",
            now,
        ));
    }

    out
}

/// Alerts for every piece of equipment, in input order.
pub fn derive<'a, I>(equipment: I, now: DateTime<Utc>) -> Vec<Alert>
where
    I: IntoIterator<Item = &'a Equipment>,
{
    equipment
        .into_iter()
        .flat_map(|e| for_equipment(e, now))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use farm_core::{EquipmentStatus, EquipmentType, Location};
    use rust_decimal::Decimal;

    fn tractor(now: DateTime<Utc>, days_since: i64, fuel: Option<u8>, efficiency: f64) -> Equipment {
        Equipment {
            id: Uuid::from_u128(5),
            name: "Kubota M7040".to_string(),
            equipment_type: EquipmentType::Tractor,
            model: "2021-404".to_string(),
            status: EquipmentStatus::Operational,
            location: Location::new(3.0, 101.0),
            operational_hours: 1200.0,
            last_maintenance: now - Duration::days(days_since),
            next_maintenance: now + Duration::days(40),
            fuel_level: fuel,
            efficiency,
            cost_per_hour: Decimal::new(9_950, 2),
        }
    }

    #[test]
    fn maintenance_thresholds() {
        let now = Utc::now();
        assert!(for_equipment(&tractor(now, 60, None, 90.0), now).is_empty());

        let a = for_equipment(&tractor(now, 75, None, 90.0), now);
        assert_eq!(a.len(), 1);
        assert_eq!(a[0].alert_type, AlertType::Maintenance);
        assert_eq!(a[0].severity, Severity::Medium);
        assert_eq!(a[0].message, "Maintenance overdue by 15 days");

        let a = for_equipment(&tractor(now, 95, None, 90.0), now);
        assert_eq!(a.len(), 1);
        assert_eq!(a[0].alert_type, AlertType::Maintenance);
        assert_eq!(a[0].severity, Severity::High);
        assert_eq!(a[0].message, "Maintenance overdue by 35 days");
    }

    #[test]
    fn fuel_thresholds() {
        let now = Utc::now();
        assert!(for_equipment(&tractor(now, 1, Some(25), 90.0), now).is_empty());
        let a = for_equipment(&tractor(now, 1, Some(20), 90.0), now);
        assert_eq!((a[0].alert_type, a[0].severity), (AlertType::Fuel, Severity::Medium));
        assert_eq!(a[0].message, "Low fuel level: 20%");
        let a = for_equipment(&tractor(now, 1, Some(15), 90.0), now);
        assert_eq!(a[0].severity, Severity::High);
        // an empty tank still counts
        let a = for_equipment(&tractor(now, 1, Some(0), 90.0), now);
        assert_eq!(a[0].severity, Severity::High);
    }

    #[test]
    fn low_efficiency_is_medium() {
        let now = Utc::now();
        let a = for_equipment(&tractor(now, 1, None, 77.5), now);
        assert_eq!(a.len(), 1);
        assert_eq!(a[0].severity, Severity::Medium);
        assert_eq!(a[0].message, "Low efficiency: 77.5%");
        assert_eq!(a[0].action_required, "Check equipment performance");
    }

    #[test]
    fn all_three_in_order() {
        let now = Utc::now();
        let a = for_equipment(&tractor(now, 100, Some(10), 70.0), now);
        let types: Vec<_> = a.iter().map(|x| x.alert_type).collect();
        assert_eq!(
            types,
            vec![AlertType::Maintenance, AlertType::Fuel, AlertType::Efficiency]
        );
    }

    #[test]
    fn derivation_is_idempotent() {
        let now = Utc::now();
        let fleet = vec![tractor(now, 100, Some(10), 70.0), tractor(now, 3, None, 95.0)];
        let first = derive(&fleet, now);
        let second = derive(fleet.iter(), now);
        assert_eq!(first, second);
        assert_eq!(first.len(), 3);

        let later = derive(&fleet, now + Duration::seconds(30));
        assert_ne!(first[0].id, later[0].id);
    }
}
