use super::domain::{CandidateKey, Coverage, KeyStatus, Peril, ResultKey, UNMATCHED};
use super::normalizer::parse_int;
use super::spatial::{cell_ids, grid_cell};
use crate::reference::{AtRiskView, CatchmentSampler};
use serde::Serialize;
use tracing::debug;

pub const CATCHMENT_NOT_FOUND: &str = "could not find catchment for lat/lon";

/// Status table over vulnerability validity, coordinate availability and exposure.
pub fn classify_status(vulnerability_valid: bool, coordinates_defined: bool, at_risk: bool) -> KeyStatus {
    match (vulnerability_valid, coordinates_defined) {
        (true, true) if at_risk => KeyStatus::Success,
        (true, true) => KeyStatus::NotAtRisk,
        (false, true) => KeyStatus::FailVulnerability,
        (true, false) => KeyStatus::FailAreaPeril,
        (false, false) => KeyStatus::Fail,
    }
}

pub(crate) fn resolve_key(
    candidate: &CandidateKey<'_>,
    vulnerability_id: i64,
    view: &AtRiskView,
    sampler: &mut CatchmentSampler<'_>,
) -> ResultKey {
    let location = candidate.location;
    let cell = cell_ids(location);
    let at_risk = cell.is_some_and(|ids| view.contains(&grid_cell(candidate.peril, ids)));
    let status = classify_status(vulnerability_id != UNMATCHED, cell.is_some(), at_risk);

    let mut key = ResultKey {
        loc_id: location.record.loc_id,
        peril_id: candidate.peril,
        coverage_type: candidate.coverage.id(),
        vulnerability_id,
        status,
        message: status.message().to_string(),
        model_data: String::new(),
        catchment_id: UNMATCHED,
        lat_id: cell.map(|(lat_id, _)| lat_id),
        lon_id: cell.map(|(_, lon_id)| lon_id),
        area_peril_id: UNMATCHED,
    };

    if status != KeyStatus::Success {
        return key;
    }

    let catchment = match (location.latitude, location.longitude, cell) {
        (Some(latitude), Some(longitude), Some(_)) => {
            match sampler.catchment_at(longitude, latitude) {
                Ok(catchment) => catchment,
                Err(err) => {
                    debug!(loc_id = key.loc_id, error = %err, "catchment raster read failed");
                    None
                }
            }
        }
        _ => None,
    };

    match (catchment, cell) {
        (Some(catchment_id), Some((lat_id, lon_id))) => {
            key.catchment_id = catchment_id;
            key.model_data = serde_json::to_string(&ModelData {
                lat_id,
                lon_id,
                catchment_id,
                vulnerability_id,
                user_vulnerability_id: location.record.user_vulnerability_id,
                peril_id: candidate.peril,
                coverage: candidate.coverage,
                coverage_type_id: candidate.coverage.id(),
                loc_number: Identifier::parse(&location.record.loc_number),
                port_number: Identifier::parse(&location.record.port_number),
                acc_number: Identifier::parse(&location.record.acc_number),
            })
            .unwrap_or_default();
        }
        _ => {
            debug!(
                loc_id = key.loc_id,
                peril = %candidate.peril,
                coverage = candidate.coverage.label(),
                "no catchment under location, key demoted"
            );
            key.status = KeyStatus::Fail;
            key.message = CATCHMENT_NOT_FOUND.to_string();
        }
    }
    key
}

/// Payload the loss engine reads back; field order is part of the format.
#[derive(Debug, Serialize)]
struct ModelData<'a> {
    lat_id: i64,
    lon_id: i64,
    catchment_id: i64,
    vulnerability_id: i64,
    user_vulnerability_id: i64,
    peril_id: Peril,
    coverage: Coverage,
    coverage_type_id: u8,
    loc_number: Identifier<'a>,
    port_number: Identifier<'a>,
    acc_number: Identifier<'a>,
}

/// Account identifiers are written as numbers when they are integral, `11.0` included.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Identifier<'a> {
    Number(i64),
    Text(&'a str),
}

impl<'a> Identifier<'a> {
    fn parse(value: &'a str) -> Self {
        let integral = value
            .trim()
            .parse::<f64>()
            .map(|parsed| parsed.fract() == 0.0)
            .unwrap_or(false);
        match parse_int(value) {
            Some(number) if integral => Self::Number(number),
            _ => Self::Text(value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::domain::BuildingCategory;
    use crate::lookup::fixtures::{enriched, tables, AT_RISK_LATITUDE};
    use crate::lookup::keys::expand;
    use crate::lookup::spatial::batch_view;

    #[test]
    fn status_table_is_total() {
        for vulnerability_valid in [true, false] {
            for coordinates_defined in [true, false] {
                for at_risk in [true, false] {
                    let status = classify_status(vulnerability_valid, coordinates_defined, at_risk);
                    if !vulnerability_valid {
                        assert!(matches!(
                            status,
                            KeyStatus::FailVulnerability | KeyStatus::Fail
                        ));
                    }
                    if !coordinates_defined {
                        assert!(matches!(status, KeyStatus::FailAreaPeril | KeyStatus::Fail));
                    }
                }
            }
        }
        assert_eq!(classify_status(true, true, true), KeyStatus::Success);
        assert_eq!(classify_status(true, true, false), KeyStatus::NotAtRisk);
    }

    #[test]
    fn success_keys_carry_catchment_and_model_data() {
        let tables = tables();
        let location = enriched(BuildingCategory::Detached, "ORF");
        let view = batch_view(&tables.at_risk, [&location]);
        let mut sampler = tables.catchments.sampler().expect("sampler");
        let candidates = expand(&location);

        let key = resolve_key(&candidates[0], 101, &view, &mut sampler);
        assert_eq!(key.status, KeyStatus::Success);
        assert_eq!(key.catchment_id, 42);
        assert_eq!(key.area_peril_id, UNMATCHED);
        assert_eq!(
            key.model_data,
            concat!(
                r#"{"lat_id":185400,"lon_id":-900,"catchment_id":42,"vulnerability_id":101,"#,
                r#""user_vulnerability_id":0,"peril_id":"ORF","coverage":"buildings","#,
                r#""coverage_type_id":1,"loc_number":11,"port_number":1,"acc_number":"A-7"}"#
            )
        );
    }

    #[test]
    fn missing_catchment_demotes_to_fail() {
        let tables = tables();
        let mut location = enriched(BuildingCategory::Detached, "ORF");
        // cell on the grid, nodata pixel in the raster
        location.latitude = Some(AT_RISK_LATITUDE + 0.25);
        location.longitude = Some(-0.75);
        let view = batch_view(&tables.at_risk, [&location]);
        let mut sampler = tables.catchments.sampler().expect("sampler");
        let candidates = expand(&location);

        let key = resolve_key(&candidates[0], 101, &view, &mut sampler);
        assert_eq!(key.status, KeyStatus::Fail);
        assert_eq!(key.message, CATCHMENT_NOT_FOUND);
        assert_eq!(key.catchment_id, UNMATCHED);
        assert!(key.model_data.is_empty());
    }

    #[test]
    fn non_success_keys_are_not_sampled() {
        let tables = tables();
        let mut location = enriched(BuildingCategory::Detached, "ORF");
        location.latitude = None;
        let view = batch_view(&tables.at_risk, [&location]);
        let mut sampler = tables.catchments.sampler().expect("sampler");
        let candidates = expand(&location);

        let key = resolve_key(&candidates[0], UNMATCHED, &view, &mut sampler);
        assert_eq!(key.status, KeyStatus::Fail);
        assert_eq!(key.message, KeyStatus::Fail.message());
        assert_eq!(key.lat_id, None);
        assert_eq!(key.lon_id, None);

        let key = resolve_key(&candidates[0], 101, &view, &mut sampler);
        assert_eq!(key.status, KeyStatus::FailAreaPeril);
    }

    #[test]
    fn identifiers_written_as_float_text_become_numbers() {
        let render = |value| serde_json::to_string(&Identifier::parse(value)).expect("serialize");
        assert_eq!(render("11.0"), "11");
        assert_eq!(render(" 42 "), "42");
        assert_eq!(render("11.5"), r#""11.5""#);
        assert_eq!(render("A-7"), r#""A-7""#);
        assert_eq!(render(""), r#""""#);
    }
}
