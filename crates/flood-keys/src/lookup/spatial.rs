use super::domain::{EnrichedLocation, Peril};
use crate::reference::{AtRiskGrid, AtRiskView, GridCell};
use std::collections::HashSet;

pub const ARC_SECONDS_PER_DEGREE: f64 = 3600.0;

/// Arc-second id of a coordinate, `floor(degrees × 3600)`.
pub fn quantize(degrees: f64) -> Option<i64> {
    let scaled = (degrees * ARC_SECONDS_PER_DEGREE).floor();
    scaled.is_finite().then_some(scaled as i64)
}

/// `(lat_id, lon_id)` when both coordinates are known.
pub(crate) fn cell_ids(location: &EnrichedLocation) -> Option<(i64, i64)> {
    Some((quantize(location.latitude?)?, quantize(location.longitude?)?))
}

pub(crate) fn grid_cell(peril: Peril, (lat_id, lon_id): (i64, i64)) -> GridCell {
    GridCell {
        peril,
        lat_id,
        lon_id,
    }
}

/// Private view of the at-risk grid restricted to the ids seen in this batch.
pub(crate) fn batch_view<'a, I>(grid: &AtRiskGrid, locations: I) -> AtRiskView
where
    I: IntoIterator<Item = &'a EnrichedLocation>,
{
    let mut lat_ids = HashSet::new();
    let mut lon_ids = HashSet::new();
    for (lat_id, lon_id) in locations.into_iter().filter_map(cell_ids) {
        lat_ids.insert(lat_id);
        lon_ids.insert(lon_id);
    }
    grid.narrowed(&lat_ids, &lon_ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::domain::BuildingCategory;
    use crate::lookup::fixtures::{enriched, AT_RISK_LATITUDE, AT_RISK_LONGITUDE};

    #[test]
    fn quantization_floors_towards_negative_infinity() {
        assert_eq!(quantize(51.5), Some(185_400));
        assert_eq!(quantize(-0.25), Some(-900));
        assert_eq!(quantize(-0.0001), Some(-1));
        assert_eq!(quantize(f64::NAN), None);
    }

    #[test]
    fn undefined_coordinates_have_no_cell() {
        let mut location = enriched(BuildingCategory::Detached, "ORF");
        assert_eq!(cell_ids(&location), Some((185_400, -900)));
        location.longitude = None;
        assert_eq!(cell_ids(&location), None);
    }

    #[test]
    fn batch_view_keeps_only_cells_in_the_batch() {
        let grid = AtRiskGrid::from_cells([
            grid_cell(Peril::Fluvial, (185_400, -900)),
            grid_cell(Peril::Coastal, (185_400, -900)),
            grid_cell(Peril::Fluvial, (185_401, -900)),
        ]);
        let location = enriched(BuildingCategory::Detached, "ORF");
        assert_eq!(location.latitude, Some(AT_RISK_LATITUDE));
        assert_eq!(location.longitude, Some(AT_RISK_LONGITUDE));

        let view = batch_view(&grid, [&location]);
        assert_eq!(view.len(), 2);
        assert!(view.contains(&grid_cell(Peril::Coastal, (185_400, -900))));
        assert!(!view.contains(&grid_cell(Peril::Fluvial, (185_401, -900))));
        // the shared grid is untouched
        assert_eq!(grid.len(), 3);
    }
}
