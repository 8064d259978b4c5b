use super::domain::LocationRecord;
use crate::reference::PostcodeCentroids;

/// Coordinates to resolve the location at. A supplied (0, 0) is treated as missing and
/// replaced by the postcode centroid when one is known; otherwise it is kept as given.
pub(crate) fn resolve_coordinates(
    record: &LocationRecord,
    postcodes: &PostcodeCentroids,
) -> (Option<f64>, Option<f64>) {
    match (record.latitude, record.longitude) {
        (Some(latitude), Some(longitude)) if latitude == 0.0 && longitude == 0.0 => postcodes
            .centroid(&record.postal_code)
            .map(|(lat, lon)| (Some(lat), Some(lon)))
            .unwrap_or((Some(latitude), Some(longitude))),
        coordinates => coordinates,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::normalizer::{normalize_location, RawLocation};

    fn postcodes() -> PostcodeCentroids {
        PostcodeCentroids::from_entries([("SW1A 1AA", 51.50135, -0.14189)])
    }

    fn record(raw: RawLocation) -> LocationRecord {
        normalize_location(&raw, "locuserdef1")
    }

    #[test]
    fn zero_coordinates_fall_back_to_postcode_centroid() {
        let record = record(RawLocation::new(1).with("postalcode", "sw1a 1aa"));
        assert_eq!(
            resolve_coordinates(&record, &postcodes()),
            (Some(51.50135), Some(-0.14189))
        );
    }

    #[test]
    fn supplied_coordinates_are_kept() {
        let record = record(
            RawLocation::new(1)
                .with("latitude", "0")
                .with("longitude", "-1.5")
                .with("postalcode", "SW1A1AA"),
        );
        assert_eq!(
            resolve_coordinates(&record, &postcodes()),
            (Some(0.0), Some(-1.5))
        );
    }

    #[test]
    fn unknown_postcode_keeps_origin() {
        let record = record(RawLocation::new(1).with("postalcode", "ZZ9 9ZZ"));
        assert_eq!(
            resolve_coordinates(&record, &postcodes()),
            (Some(0.0), Some(0.0))
        );
    }

    #[test]
    fn undefined_coordinates_are_not_geocoded() {
        let record = record(
            RawLocation::new(1)
                .with("latitude", "bad")
                .with("postalcode", "SW1A1AA"),
        );
        assert_eq!(resolve_coordinates(&record, &postcodes()), (None, Some(0.0)));
    }
}
