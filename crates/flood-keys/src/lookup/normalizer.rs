use super::domain::{LocationRecord, FFH_UNSET};
use std::collections::HashMap;

/// Column the user vulnerability override is read from unless configured otherwise.
pub const DEFAULT_USER_VULNERABILITY_COLUMN: &str = "locuserdef1";

/// Untyped location row with lower-cased column names.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawLocation {
    ordinal: i64,
    fields: HashMap<String, String>,
}

impl RawLocation {
    /// `ordinal` stands in for `loc_id` when the row does not carry one.
    pub fn new(ordinal: i64) -> Self {
        Self {
            ordinal,
            fields: HashMap::new(),
        }
    }

    pub fn with(mut self, column: &str, value: impl Into<String>) -> Self {
        self.insert(column, value);
        self
    }

    pub fn insert(&mut self, column: &str, value: impl Into<String>) {
        self.fields
            .insert(column.trim().to_ascii_lowercase(), value.into());
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields
            .get(&column.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn ordinal(&self) -> i64 {
        self.ordinal
    }
}

pub(crate) fn normalize_location(raw: &RawLocation, user_column: &str) -> LocationRecord {
    let loc_id = raw
        .get("loc_id")
        .and_then(parse_int)
        .unwrap_or_else(|| raw.ordinal());

    LocationRecord {
        loc_id,
        acc_number: identifier_field(raw, "accnumber"),
        port_number: identifier_field(raw, "portnumber"),
        loc_number: identifier_field(raw, "locnumber"),
        user_vulnerability_id: raw.get(user_column).and_then(parse_int).unwrap_or(0),
        loc_perils_covered: text_field(raw, "locperilscovered", "ORF;OSF;WSS"),
        building_type: int_field(raw, "buildingtype", 0),
        occupancy_code: int_field(raw, "occupancycode", 1000),
        construction_code: int_field(raw, "constructioncode", 5000),
        number_of_storeys: int_field(raw, "numberofstoreys", 0),
        floors_occupied: text_field(raw, "floorsoccupied", "0"),
        first_floor_height: float_field(raw, "firstfloorheight", FFH_UNSET),
        first_floor_height_unit: int_field(raw, "firstfloorheightunit", 1),
        year_built: int_field(raw, "yearbuilt", 0),
        bipoi: float_field(raw, "bipoi", 365.0),
        latitude: coordinate_field(raw, "latitude"),
        longitude: coordinate_field(raw, "longitude"),
        postal_code: text_field(raw, "postalcode", "-1"),
    }
}

fn identifier_field(raw: &RawLocation, column: &str) -> String {
    raw.get(column).map(str::trim).unwrap_or_default().to_string()
}

fn text_field(raw: &RawLocation, column: &str, default: &str) -> String {
    match raw.get(column).map(str::trim) {
        Some(value) if !value.is_empty() => value.to_string(),
        _ => default.to_string(),
    }
}

fn int_field(raw: &RawLocation, column: &str, default: i64) -> i64 {
    match raw.get(column).and_then(parse_int) {
        Some(0) | None => default,
        Some(value) => value,
    }
}

fn float_field(raw: &RawLocation, column: &str, default: f64) -> f64 {
    raw.get(column)
        .and_then(parse_float)
        .filter(|value| value.is_finite())
        .unwrap_or(default)
}

fn coordinate_field(raw: &RawLocation, column: &str) -> Option<f64> {
    match raw.get(column).map(str::trim) {
        None | Some("") => Some(0.0),
        Some(value) => parse_float(value).filter(|value| value.is_finite()),
    }
}

pub(crate) fn parse_int(value: &str) -> Option<i64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(parsed) = trimmed.parse::<i64>() {
        return Some(parsed);
    }

    trimmed
        .parse::<f64>()
        .ok()
        .filter(|parsed| parsed.is_finite())
        .map(|parsed| parsed.trunc() as i64)
}

fn parse_float(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_fields_take_documented_defaults() {
        let record = normalize_location(&RawLocation::new(7), DEFAULT_USER_VULNERABILITY_COLUMN);

        assert_eq!(record.loc_id, 7);
        assert_eq!(record.loc_perils_covered, "ORF;OSF;WSS");
        assert_eq!(record.building_type, 0);
        assert_eq!(record.occupancy_code, 1000);
        assert_eq!(record.construction_code, 5000);
        assert_eq!(record.floors_occupied, "0");
        assert_eq!(record.first_floor_height, -999.0);
        assert_eq!(record.first_floor_height_unit, 1);
        assert_eq!(record.bipoi, 365.0);
        assert_eq!(record.latitude, Some(0.0));
        assert_eq!(record.longitude, Some(0.0));
        assert_eq!(record.postal_code, "-1");
        assert_eq!(record.user_vulnerability_id, 0);
    }

    #[test]
    fn empty_sentinels_are_replaced_by_defaults() {
        let raw = RawLocation::new(1)
            .with("OccupancyCode", "0")
            .with("ConstructionCode", "")
            .with("LocPerilsCovered", "  ")
            .with("FirstFloorHeightUnit", "0")
            .with("BIPOI", "0");
        let record = normalize_location(&raw, DEFAULT_USER_VULNERABILITY_COLUMN);

        assert_eq!(record.occupancy_code, 1000);
        assert_eq!(record.construction_code, 5000);
        assert_eq!(record.loc_perils_covered, "ORF;OSF;WSS");
        assert_eq!(record.first_floor_height_unit, 1);
        // float fields keep an explicit zero
        assert_eq!(record.bipoi, 0.0);
    }

    #[test]
    fn columns_match_case_insensitively_and_coerce_types() {
        let raw = RawLocation::new(1)
            .with("LOC_ID", "42")
            .with("NumberOfStoreys", "3.0")
            .with("Latitude", "51.5")
            .with("LocUserDef1", "12");
        let record = normalize_location(&raw, "LocUserDef1");

        assert_eq!(record.loc_id, 42);
        assert_eq!(record.number_of_storeys, 3);
        assert_eq!(record.latitude, Some(51.5));
        assert_eq!(record.user_vulnerability_id, 12);
    }

    #[test]
    fn unreadable_coordinates_are_undefined() {
        let raw = RawLocation::new(1)
            .with("latitude", "north")
            .with("longitude", "NaN");
        let record = normalize_location(&raw, DEFAULT_USER_VULNERABILITY_COLUMN);

        assert_eq!(record.latitude, None);
        assert_eq!(record.longitude, None);
    }
}
