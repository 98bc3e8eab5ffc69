//! Static reference data: crop profiles, seasonal climate bands, farm regions
//! and the equipment catalogue.

use crate::{CropType, EquipmentType, Location, Season};

/// Immutable reference data for one crop type.
#[derive(Clone, Debug, PartialEq)]
pub struct CropProfile {
    pub crop_type: CropType,
    pub varieties: &'static [&'static str],
    /// Growth stages in lifecycle order.
    pub growth_stages: &'static [&'static str],
    /// Total cycle length in days.
    pub cycle_days: u32,
    /// Yield range in kg per hectare.
    pub yield_range: (f64, f64),
    pub optimal_ph: (f64, f64),
    pub optimal_moisture: (f64, f64),
    pub optimal_temp: (f64, f64),
}

static PROFILES: [CropProfile; 6] = [
    CropProfile {
        crop_type: CropType::Rice,
        varieties: &["MR220", "MR219", "MR297", "Bario", "Fragrant Rice"],
        growth_stages: &[
            "seedling",
            "tillering",
            "panicle_initiation",
            "flowering",
            "grain_filling",
            "maturity",
        ],
        cycle_days: 120,
        yield_range: (3000.0, 7000.0),
        optimal_ph: (5.5, 7.0),
        optimal_moisture: (80.0, 95.0),
        optimal_temp: (26.0, 32.0),
    },
    CropProfile {
        crop_type: CropType::PalmOil,
        varieties: &["Dura", "Pisifera", "Tenera", "MPOB Yangambi", "FELDA"],
        growth_stages: &[
            "nursery",
            "immature",
            "young_mature",
            "prime_mature",
            "old_mature",
        ],
        cycle_days: 365,
        yield_range: (15000.0, 25000.0),
        optimal_ph: (4.5, 6.5),
        optimal_moisture: (60.0, 80.0),
        optimal_temp: (24.0, 28.0),
    },
    CropProfile {
        crop_type: CropType::Rubber,
        varieties: &["RRIM 600", "RRIM 2020", "RRIM 3001", "PB 260", "GT 1"],
        growth_stages: &["immature", "young_tapping", "peak_production", "declining"],
        cycle_days: 365,
        yield_range: (1200.0, 2500.0),
        optimal_ph: (4.5, 6.0),
        optimal_moisture: (70.0, 85.0),
        optimal_temp: (24.0, 30.0),
    },
    CropProfile {
        crop_type: CropType::Durian,
        varieties: &["Musang King", "D24", "Red Prawn", "IOI", "Tekka"],
        growth_stages: &[
            "flowering",
            "fruit_set",
            "fruit_development",
            "ripening",
            "harvest",
        ],
        cycle_days: 150,
        yield_range: (8000.0, 15000.0),
        optimal_ph: (6.0, 7.5),
        optimal_moisture: (70.0, 90.0),
        optimal_temp: (26.0, 32.0),
    },
    CropProfile {
        crop_type: CropType::Banana,
        varieties: &["Cavendish", "Pisang Mas", "Pisang Raja", "Berangan", "Rastali"],
        growth_stages: &[
            "sucker",
            "vegetative",
            "flowering",
            "bunch_development",
            "harvest",
        ],
        cycle_days: 300,
        yield_range: (20000.0, 40000.0),
        optimal_ph: (5.5, 7.0),
        optimal_moisture: (75.0, 85.0),
        optimal_temp: (26.0, 30.0),
    },
    CropProfile {
        crop_type: CropType::Coconut,
        varieties: &["Malayan Dwarf", "Malayan Tall", "MATAG", "MAWA", "Hybrid"],
        growth_stages: &["seedling", "juvenile", "flowering", "bearing", "mature"],
        cycle_days: 365,
        yield_range: (6000.0, 12000.0),
        optimal_ph: (5.2, 8.0),
        optimal_moisture: (60.0, 80.0),
        optimal_temp: (27.0, 32.0),
    },
];

/// Profile for a crop type.
pub fn crop_profile(crop_type: CropType) -> &'static CropProfile {
    match crop_type {
        CropType::Rice => &PROFILES[0],
        CropType::PalmOil => &PROFILES[1],
        CropType::Rubber => &PROFILES[2],
        CropType::Durian => &PROFILES[3],
        CropType::Banana => &PROFILES[4],
        CropType::Coconut => &PROFILES[5],
    }
}

/// Stage names that put a plot into the harvesting state.
pub const HARVEST_STAGES: [&str; 3] = ["harvest", "maturity", "ripening"];

pub fn is_harvest_stage(stage: &str) -> bool {
    HARVEST_STAGES.contains(&stage)
}

/// Climate bands for one season.
#[derive(Clone, Debug, PartialEq)]
pub struct SeasonClimate {
    /// Air temperature in °C.
    pub temp_range: (f64, f64),
    pub humidity_range: (f64, f64),
    /// Rainfall per event in mm.
    pub rainfall_range: (f64, f64),
    /// Probability that any rain falls in a sample.
    pub rain_chance: f64,
    /// Additive soil moisture shift in percentage points.
    pub soil_moisture_modifier: f64,
}

static DRY: SeasonClimate = SeasonClimate {
    temp_range: (26.0, 35.0),
    humidity_range: (60.0, 80.0),
    rainfall_range: (0.0, 15.0),
    rain_chance: 0.3,
    soil_moisture_modifier: -10.0,
};

static WET: SeasonClimate = SeasonClimate {
    temp_range: (24.0, 32.0),
    humidity_range: (70.0, 95.0),
    rainfall_range: (10.0, 80.0),
    rain_chance: 0.7,
    soil_moisture_modifier: 15.0,
};

static TRANSITION: SeasonClimate = SeasonClimate {
    temp_range: (25.0, 33.0),
    humidity_range: (65.0, 85.0),
    rainfall_range: (5.0, 40.0),
    rain_chance: 0.7,
    soil_moisture_modifier: 0.0,
};

impl Season {
    pub fn climate(&self) -> &'static SeasonClimate {
        match self {
            Season::Dry => &DRY,
            Season::Wet => &WET,
            Season::Transition => &TRANSITION,
        }
    }
}

/// A named farming region with its centre and dominant crop.
#[derive(Clone, Debug, PartialEq)]
pub struct Region {
    pub state: &'static str,
    pub name: &'static str,
    pub lat: f64,
    pub lng: f64,
    pub primary_crop: CropType,
}

impl Region {
    pub fn location(&self) -> Location {
        Location::new(self.lat, self.lng)
    }
}

pub static REGIONS: [Region; 8] = [
    Region {
        state: "Kedah",
        name: "Kedah Rice Bowl",
        lat: 6.1254,
        lng: 100.3673,
        primary_crop: CropType::Rice,
    },
    Region {
        state: "Johor",
        name: "Johor Palm Estate",
        lat: 1.4927,
        lng: 103.7414,
        primary_crop: CropType::PalmOil,
    },
    Region {
        state: "Perak",
        name: "Perak Rubber Plantation",
        lat: 4.5921,
        lng: 101.0901,
        primary_crop: CropType::Rubber,
    },
    Region {
        state: "Pahang",
        name: "Pahang Durian Orchard",
        lat: 3.8126,
        lng: 103.3256,
        primary_crop: CropType::Durian,
    },
    Region {
        state: "Negeri Sembilan",
        name: "NS Mixed Farm",
        lat: 2.7297,
        lng: 101.9381,
        primary_crop: CropType::Banana,
    },
    Region {
        state: "Terengganu",
        name: "Terengganu Coconut Farm",
        lat: 5.3117,
        lng: 103.1324,
        primary_crop: CropType::Coconut,
    },
    Region {
        state: "Selangor",
        name: "Selangor Agro Park",
        lat: 3.0738,
        lng: 101.5183,
        primary_crop: CropType::Rice,
    },
    Region {
        state: "Melaka",
        name: "Melaka Heritage Farm",
        lat: 2.1896,
        lng: 102.2501,
        primary_crop: CropType::Durian,
    },
];

/// Find a region by farm name or state, case-insensitively.
pub fn region_by_name(name: &str) -> Option<&'static Region> {
    REGIONS
        .iter()
        .find(|r| r.name.eq_ignore_ascii_case(name) || r.state.eq_ignore_ascii_case(name))
}

/// Model names available for an equipment type.
pub fn equipment_models(equipment_type: EquipmentType) -> &'static [&'static str] {
    match equipment_type {
        EquipmentType::Irrigation => &[
            "Drip System",
            "Sprinkler System",
            "Flood Irrigation",
            "Smart Irrigation",
        ],
        EquipmentType::Tractor => &[
            "Kubota M7040",
            "John Deere 5E",
            "Massey Ferguson 385",
            "New Holland TD5",
        ],
        EquipmentType::Harvester => &["Rice Harvester", "Palm Oil Harvester", "Multi-crop Harvester"],
        EquipmentType::Drone => &[
            "DJI Agras",
            "Yamaha RMAX",
            "AgEagle RX60",
            "PrecisionHawk Lancaster",
        ],
        EquipmentType::Sensor => &[
            "Weather Station",
            "Soil Sensor",
            "Crop Monitor",
            "Water Level Sensor",
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_crop_has_a_matching_profile() {
        for ct in CropType::ALL {
            let p = crop_profile(ct);
            assert_eq!(p.crop_type, ct);
            assert!(!p.varieties.is_empty());
            assert!(p.growth_stages.len() >= 4);
            assert!(p.cycle_days > 40, "cycle must leave room for the planting window");
            assert!(p.yield_range.0 < p.yield_range.1);
        }
    }

    #[test]
    fn regions_resolve_by_name_or_state() {
        assert_eq!(region_by_name("johor").map(|r| r.primary_crop), Some(CropType::PalmOil));
        assert_eq!(
            region_by_name("Pahang Durian Orchard").map(|r| r.state),
            Some("Pahang")
        );
        assert!(region_by_name("Atlantis").is_none());
    }

    #[test]
    fn dry_season_rains_less_often() {
        assert!(Season::Dry.climate().rain_chance < Season::Wet.climate().rain_chance);
        assert_eq!(Season::Transition.climate().soil_moisture_modifier, 0.0);
    }
}
