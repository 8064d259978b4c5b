use serde::{Deserialize, Serialize};
use std::fmt;

/// Marker written into suppressed classification fields so they never take part in a join.
pub const SUPPRESSED: i64 = -9999;
/// Vulnerability, catchment and area-peril ids that could not be resolved.
pub const UNMATCHED: i64 = -1;
/// First floor height value meaning "not supplied".
pub const FFH_UNSET: f64 = -999.0;

/// Flood perils carried by the model, in key expansion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Peril {
    #[serde(rename = "ORF")]
    Fluvial,
    #[serde(rename = "OSF")]
    Pluvial,
    #[serde(rename = "WSS")]
    Coastal,
}

impl Peril {
    pub const fn ordered() -> [Self; 3] {
        [Self::Fluvial, Self::Pluvial, Self::Coastal]
    }

    /// OED peril code.
    pub const fn code(self) -> &'static str {
        match self {
            Self::Fluvial => "ORF",
            Self::Pluvial => "OSF",
            Self::Coastal => "WSS",
        }
    }

    pub fn from_code(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "ORF" => Some(Self::Fluvial),
            "OSF" => Some(Self::Pluvial),
            "WSS" => Some(Self::Coastal),
            _ => None,
        }
    }

    /// Semicolon group naming every flood peril, used for peril-independent vulnerabilities.
    pub fn all_codes() -> String {
        Self::ordered()
            .iter()
            .map(|peril| peril.code())
            .collect::<Vec<_>>()
            .join(";")
    }
}

impl fmt::Display for Peril {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Coverage types keyed by the OED coverage type id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Coverage {
    Buildings,
    Contents,
    Bi,
}

impl Coverage {
    pub const fn ordered() -> [Self; 3] {
        [Self::Buildings, Self::Contents, Self::Bi]
    }

    pub const fn id(self) -> u8 {
        match self {
            Self::Buildings => 1,
            Self::Contents => 3,
            Self::Bi => 4,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Buildings => "buildings",
            Self::Contents => "contents",
            Self::Bi => "bi",
        }
    }

    pub fn from_id(id: i64) -> Option<Self> {
        match id {
            1 => Some(Self::Buildings),
            3 => Some(Self::Contents),
            4 => Some(Self::Bi),
            _ => None,
        }
    }
}

/// Building category derived by the classification rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildingCategory {
    Bungalow,
    Detached,
    Semidetached,
    Terraced,
    Flat,
    GeneralRes,
    Nonres,
}

impl BuildingCategory {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Bungalow => "bungalow",
            Self::Detached => "detached",
            Self::Semidetached => "semidetached",
            Self::Terraced => "terraced",
            Self::Flat => "flat",
            Self::GeneralRes => "general_res",
            Self::Nonres => "nonres",
        }
    }

    pub fn from_label(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "bungalow" => Some(Self::Bungalow),
            "detached" => Some(Self::Detached),
            "semidetached" => Some(Self::Semidetached),
            "terraced" => Some(Self::Terraced),
            "flat" => Some(Self::Flat),
            "general_res" => Some(Self::GeneralRes),
            "nonres" => Some(Self::Nonres),
            _ => None,
        }
    }
}

/// Outcome of resolving one peril × coverage key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyStatus {
    #[serde(rename = "success")]
    Success,
    #[serde(rename = "notatrisk")]
    NotAtRisk,
    #[serde(rename = "fail")]
    Fail,
    #[serde(rename = "fail_v")]
    FailVulnerability,
    #[serde(rename = "fail_ap")]
    FailAreaPeril,
}

impl KeyStatus {
    pub const fn ordered() -> [Self; 5] {
        [
            Self::Success,
            Self::NotAtRisk,
            Self::Fail,
            Self::FailVulnerability,
            Self::FailAreaPeril,
        ]
    }

    pub const fn id(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::NotAtRisk => "notatrisk",
            Self::Fail => "fail",
            Self::FailVulnerability => "fail_v",
            Self::FailAreaPeril => "fail_ap",
        }
    }

    pub const fn message(self) -> &'static str {
        match self {
            Self::Success => "",
            Self::NotAtRisk => {
                "area-peril and vulnerability valid, but location not exposed to this peril"
            }
            Self::Fail => "area-peril and vulnerability invalid",
            Self::FailVulnerability => "area-peril valid, vulnerability invalid",
            Self::FailAreaPeril => "vulnerability valid, area-peril invalid",
        }
    }
}

impl fmt::Display for KeyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Location attributes after defaulting and typing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationRecord {
    pub loc_id: i64,
    pub acc_number: String,
    pub port_number: String,
    pub loc_number: String,
    pub user_vulnerability_id: i64,
    pub loc_perils_covered: String,
    pub building_type: i64,
    pub occupancy_code: i64,
    pub construction_code: i64,
    pub number_of_storeys: i64,
    pub floors_occupied: String,
    pub first_floor_height: f64,
    pub first_floor_height_unit: i64,
    pub year_built: i64,
    pub bipoi: f64,
    /// `None` when the supplied value could not be read as a finite number.
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub postal_code: String,
}

/// Location plus everything the classification stages derive from it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedLocation {
    pub record: LocationRecord,
    /// Covered perils with group codes expanded.
    pub perils_covered: String,
    pub mobile_home: bool,
    pub building_category: Option<BuildingCategory>,
    pub mcm_code: Option<i64>,
    pub number_of_storeys: i64,
    pub floors_occupied: i64,
    pub bipoi_cat: Option<i64>,
    pub ffh_cat: Option<f64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// One peril × coverage combination with the suppression rules applied.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateKey<'a> {
    pub location: &'a EnrichedLocation,
    pub peril: Peril,
    pub coverage: Coverage,
    pub peril_type: String,
    pub mcm_code: i64,
    pub number_of_storeys: i64,
    pub floors_occupied: i64,
    pub bipoi_cat: i64,
    pub ffh_cat: Option<f64>,
}

/// Row of the keys output consumed by the loss engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultKey {
    pub loc_id: i64,
    pub peril_id: Peril,
    pub coverage_type: u8,
    pub vulnerability_id: i64,
    pub status: KeyStatus,
    pub message: String,
    pub model_data: String,
    pub catchment_id: i64,
    pub lat_id: Option<i64>,
    pub lon_id: Option<i64>,
    pub area_peril_id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_codes_joins_perils_in_expansion_order() {
        assert_eq!(Peril::all_codes(), "ORF;OSF;WSS");
    }

    #[test]
    fn status_messages_are_stable() {
        assert_eq!(KeyStatus::Success.message(), "");
        assert_eq!(
            KeyStatus::FailAreaPeril.message(),
            "vulnerability valid, area-peril invalid"
        );
        assert_eq!(
            serde_json::to_string(&KeyStatus::FailVulnerability).expect("serialize"),
            "\"fail_v\""
        );
    }

    #[test]
    fn coverage_ids_round_trip() {
        for coverage in Coverage::ordered() {
            assert_eq!(Coverage::from_id(coverage.id() as i64), Some(coverage));
        }
        assert_eq!(Coverage::from_id(2), None);
    }
}
