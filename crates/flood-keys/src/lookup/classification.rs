use super::domain::{BuildingCategory, LocationRecord, FFH_UNSET};
use crate::reference::ReferenceTables;

/// Occupancy codes below this are residential.
pub const RESIDENTIAL_OCCUPANCY_LIMIT: i64 = 1100;
const MOBILE_HOME_CONSTRUCTION: std::ops::Range<i64> = 5350..5400;
const FEET_TO_METRES: f64 = 0.3048;
const FEET_UNIT: i64 = 1;
const MAX_STOREYS: i64 = 6;
const MAX_FLOORS_OCCUPIED: i64 = 3;

const FFH_BUCKETS: [f64; 8] = [0.0, 0.05, 0.15, 0.25, 0.35, 0.65, 1.35, 2.65];
const NONRES_BIPOI_STEPS: [f64; 12] = [
    0.0, 137.0, 228.0, 319.0, 411.0, 502.0, 593.0, 684.0, 776.0, 867.0, 958.0, 1049.0,
];
const RES_BIPOI_BREAK: f64 = 183.0;

struct Subject<'a> {
    record: &'a LocationRecord,
    mobile_home: bool,
}

type CategoryRule = (fn(&Subject<'_>) -> bool, BuildingCategory);

/// Evaluated in order; the first matching rule assigns the category.
const RESIDENTIAL_CASCADE: [CategoryRule; 7] = [
    (|s| s.mobile_home, BuildingCategory::Bungalow),
    (
        |s| s.record.building_type == 1 && s.record.number_of_storeys == 1,
        BuildingCategory::Bungalow,
    ),
    (|s| s.record.building_type == 1, BuildingCategory::Detached),
    (|s| s.record.building_type == 2, BuildingCategory::Semidetached),
    (
        |s| matches!(s.record.building_type, 3 | 4),
        BuildingCategory::Terraced,
    ),
    (
        |s| s.record.building_type == 5 && s.record.number_of_storeys > 1,
        BuildingCategory::Detached,
    ),
    (|s| s.record.building_type == 5, BuildingCategory::Bungalow),
];

/// Applied after the cascade regardless of what it assigned.
const RESIDENTIAL_OVERRIDES: [CategoryRule; 2] = [
    (
        |s| matches!(s.record.occupancy_code, 1052 | 1055),
        BuildingCategory::Flat,
    ),
    (|s| s.record.occupancy_code == 1056, BuildingCategory::Terraced),
];

type McmFixup = (fn(i64, Option<BuildingCategory>) -> bool, i64, BuildingCategory);

/// Applied after the MCM join, in order.
const RESIDENTIAL_MCM_FIXUPS: [McmFixup; 3] = [
    (|occupancy, _| occupancy == 1053, 51, BuildingCategory::Nonres),
    (|occupancy, _| occupancy == 1054, 6, BuildingCategory::Nonres),
    (
        |occupancy, category| matches!(occupancy, 1050 | 1051 | 1000) && category.is_none(),
        1,
        BuildingCategory::GeneralRes,
    ),
];

/// Everything the classification rules derive for one location.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub mobile_home: bool,
    pub building_category: Option<BuildingCategory>,
    pub mcm_code: Option<i64>,
    pub number_of_storeys: i64,
    pub floors_occupied: i64,
    pub bipoi_cat: Option<i64>,
    pub ffh_cat: Option<f64>,
}

pub fn is_mobile_home(record: &LocationRecord) -> bool {
    MOBILE_HOME_CONSTRUCTION.contains(&record.construction_code)
        && record.occupancy_code < RESIDENTIAL_OCCUPANCY_LIMIT
}

pub(crate) fn classify(record: &LocationRecord, tables: &ReferenceTables) -> Classification {
    let subject = Subject {
        record,
        mobile_home: is_mobile_home(record),
    };

    let (building_category, mcm_code) = if record.occupancy_code < RESIDENTIAL_OCCUPANCY_LIMIT {
        classify_residential(&subject, tables)
    } else {
        (
            Some(BuildingCategory::Nonres),
            tables.mcm_nonresidential.mcm_code(record.occupancy_code),
        )
    };

    let height = first_floor_height_metres(record, subject.mobile_home, building_category);

    Classification {
        mobile_home: subject.mobile_home,
        building_category,
        mcm_code,
        number_of_storeys: number_of_storeys(building_category, record.number_of_storeys),
        floors_occupied: floors_occupied(&record.floors_occupied),
        bipoi_cat: bipoi_category(building_category, record.bipoi),
        ffh_cat: ffh_category(height),
    }
}

fn classify_residential(
    subject: &Subject<'_>,
    tables: &ReferenceTables,
) -> (Option<BuildingCategory>, Option<i64>) {
    let mut category = RESIDENTIAL_CASCADE
        .iter()
        .find(|(applies, _)| applies(subject))
        .map(|(_, category)| *category);

    for (applies, overridden) in RESIDENTIAL_OVERRIDES.iter() {
        if applies(subject) {
            category = Some(*overridden);
        }
    }

    let mut mcm_code = category.and_then(|category| {
        tables
            .year_built
            .category(subject.record.year_built)
            .and_then(|year_category| tables.mcm_residential.mcm_code(category, year_category))
    });

    for (applies, fixed_code, fixed_category) in RESIDENTIAL_MCM_FIXUPS.iter() {
        if applies(subject.record.occupancy_code, category) {
            mcm_code = Some(*fixed_code);
            category = Some(*fixed_category);
        }
    }

    (category, mcm_code)
}

pub fn number_of_storeys(category: Option<BuildingCategory>, storeys: i64) -> i64 {
    use BuildingCategory::*;

    let derived = match category {
        Some(Bungalow | GeneralRes) => 0,
        Some(Detached | Semidetached | Terraced) if storeys == 0 => 2,
        Some(Flat | Nonres) if storeys == 0 => 1,
        _ => storeys,
    };
    derived.min(MAX_STOREYS)
}

/// Lowest listed floor, clamped to 0..=3. Tokens that are not integers are ignored.
pub fn floors_occupied(value: &str) -> i64 {
    value
        .split(';')
        .filter_map(|token| token.trim().parse::<i64>().ok())
        .min()
        .unwrap_or(0)
        .clamp(0, MAX_FLOORS_OCCUPIED)
}

pub fn first_floor_height_metres(
    record: &LocationRecord,
    mobile_home: bool,
    category: Option<BuildingCategory>,
) -> f64 {
    let mut height = record.first_floor_height;
    if record.first_floor_height_unit == FEET_UNIT && height != FFH_UNSET {
        height *= FEET_TO_METRES;
    }

    if height != FFH_UNSET {
        height
    } else if mobile_home || category == Some(BuildingCategory::Nonres) {
        0.6
    } else {
        0.3
    }
}

/// Lower bound of the height bucket; negative heights fall outside every bucket.
pub fn ffh_category(height: f64) -> Option<f64> {
    if height.is_nan() || height < 0.0 {
        return None;
    }
    FFH_BUCKETS
        .iter()
        .rev()
        .find(|lower| height >= **lower)
        .copied()
}

pub fn bipoi_category(category: Option<BuildingCategory>, bipoi: f64) -> Option<i64> {
    match category? {
        BuildingCategory::Nonres => {
            if bipoi.is_nan() || bipoi < 0.0 {
                return None;
            }
            NONRES_BIPOI_STEPS
                .iter()
                .rev()
                .find(|lower| bipoi >= **lower)
                .map(|lower| *lower as i64)
        }
        _ if bipoi > RES_BIPOI_BREAK => Some(RES_BIPOI_BREAK as i64),
        _ if bipoi > 0.0 => Some(1),
        _ => None,
    }
}
