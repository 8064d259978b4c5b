//! Location-to-key resolution: normalisation, classification, key expansion and status
//! assignment over immutable [`ReferenceTables`].

mod classification;
pub mod domain;
mod geocoder;
mod keys;
mod normalizer;
mod parser;
mod perils;
mod spatial;
mod status;
mod vulnerability;

pub use classification::{
    bipoi_category, ffh_category, first_floor_height_metres, floors_occupied, is_mobile_home,
    number_of_storeys, Classification, RESIDENTIAL_OCCUPANCY_LIMIT,
};
pub use domain::{
    BuildingCategory, Coverage, EnrichedLocation, KeyStatus, LocationRecord, Peril, ResultKey,
    FFH_UNSET, SUPPRESSED, UNMATCHED,
};
pub use normalizer::{RawLocation, DEFAULT_USER_VULNERABILITY_COLUMN};
pub use parser::{LocationReadError, LocationReader};
pub use perils::resolve_covered_perils;
pub use spatial::{quantize, ARC_SECONDS_PER_DEGREE};
pub use status::{classify_status, CATCHMENT_NOT_FOUND};

pub(crate) use normalizer::parse_int;

use crate::reference::{RasterError, ReferenceTables};
use rayon::prelude::*;
use std::collections::BTreeMap;
use tracing::{debug, info};

#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("could not open catchment raster for sampling: {0}")]
    Raster(#[from] RasterError),
    #[error("chunk size must be greater than zero")]
    InvalidChunkSize,
}

/// Resolves location rows into keys. Holds only read-only state, so one instance can
/// serve any number of concurrent calls on disjoint row sets.
#[derive(Debug, Clone)]
pub struct KeysLookup {
    tables: ReferenceTables,
    user_vulnerability_column: String,
}

impl KeysLookup {
    pub fn new(tables: ReferenceTables) -> Self {
        Self {
            tables,
            user_vulnerability_column: DEFAULT_USER_VULNERABILITY_COLUMN.to_string(),
        }
    }

    /// Location column the user vulnerability override is read from.
    pub fn with_user_vulnerability_column(mut self, column: impl Into<String>) -> Self {
        self.user_vulnerability_column = column.into().trim().to_ascii_lowercase();
        self
    }

    pub fn tables(&self) -> &ReferenceTables {
        &self.tables
    }

    pub fn enrich(&self, raw: &RawLocation) -> EnrichedLocation {
        let record = normalizer::normalize_location(raw, &self.user_vulnerability_column);
        let classification = classification::classify(&record, &self.tables);
        let (latitude, longitude) = geocoder::resolve_coordinates(&record, &self.tables.postcodes);

        EnrichedLocation {
            perils_covered: resolve_covered_perils(&record.loc_perils_covered),
            mobile_home: classification.mobile_home,
            building_category: classification.building_category,
            mcm_code: classification.mcm_code,
            number_of_storeys: classification.number_of_storeys,
            floors_occupied: classification.floors_occupied,
            bipoi_cat: classification.bipoi_cat,
            ffh_cat: classification.ffh_cat,
            latitude,
            longitude,
            record,
        }
    }

    /// Keys for every covered peril × coverage of every row, in row order.
    pub fn process_locations(&self, records: &[RawLocation]) -> Result<Vec<ResultKey>, LookupError> {
        let keys = self.resolve_chunk(records)?;
        log_summary(records.len(), &keys);
        Ok(keys)
    }

    /// Same output as [`KeysLookup::process_locations`], resolved in fixed-size chunks on the
    /// rayon pool.
    pub fn process_locations_parallel(
        &self,
        records: &[RawLocation],
        chunk_size: usize,
    ) -> Result<Vec<ResultKey>, LookupError> {
        if chunk_size == 0 {
            return Err(LookupError::InvalidChunkSize);
        }

        let chunks = records
            .par_chunks(chunk_size)
            .map(|chunk| self.resolve_chunk(chunk))
            .collect::<Result<Vec<_>, _>>()?;
        let keys = chunks.into_iter().flatten().collect::<Vec<_>>();

        log_summary(records.len(), &keys);
        Ok(keys)
    }

    fn resolve_chunk(&self, records: &[RawLocation]) -> Result<Vec<ResultKey>, LookupError> {
        let locations = records
            .iter()
            .map(|raw| self.enrich(raw))
            .collect::<Vec<_>>();
        let view = spatial::batch_view(&self.tables.at_risk, &locations);
        let mut sampler = self.tables.catchments.sampler()?;

        let mut results = Vec::with_capacity(locations.len() * 9);
        for location in &locations {
            for candidate in keys::expand(location) {
                let vulnerability_id =
                    vulnerability::resolve_vulnerability(&candidate, &self.tables.vulnerability);
                results.push(status::resolve_key(
                    &candidate,
                    vulnerability_id,
                    &view,
                    &mut sampler,
                ));
            }
        }

        debug!(
            locations = locations.len(),
            at_risk_cells = view.len(),
            keys = results.len(),
            "resolved location chunk"
        );
        Ok(results)
    }
}

/// Number of keys per status, in status order.
pub fn status_counts(keys: &[ResultKey]) -> BTreeMap<&'static str, usize> {
    let mut counts = KeyStatus::ordered()
        .into_iter()
        .map(|status| (status.id(), 0))
        .collect::<BTreeMap<_, _>>();
    for key in keys {
        *counts.entry(key.status.id()).or_default() += 1;
    }
    counts
}

fn log_summary(locations: usize, keys: &[ResultKey]) {
    let counts = status_counts(keys);
    let count = |status: KeyStatus| counts.get(status.id()).copied().unwrap_or_default();
    info!(
        locations,
        keys = keys.len(),
        success = count(KeyStatus::Success),
        notatrisk = count(KeyStatus::NotAtRisk),
        fail = count(KeyStatus::Fail),
        fail_v = count(KeyStatus::FailVulnerability),
        fail_ap = count(KeyStatus::FailAreaPeril),
        "keys lookup complete"
    );
}


#[cfg(test)]
mod tests {
    use super::*;

    fn lookup() -> KeysLookup {
        KeysLookup::new(fixtures::tables())
    }

    fn detached(ordinal: i64) -> RawLocation {
        RawLocation::new(ordinal)
            .with("accnumber", "A-7")
            .with("portnumber", "1")
            .with("locnumber", "11")
            .with("occupancycode", "1050")
            .with("buildingtype", "1")
            .with("numberofstoreys", "2")
            .with("bipoi", "30")
            .with("latitude", "51.5")
            .with("longitude", "-0.25")
    }

    #[test]
    fn detached_house_resolves_each_status() {
        let keys = lookup()
            .process_locations(&[detached(1)])
            .expect("lookup");

        assert_eq!(keys.len(), 9);
        let summary = keys
            .iter()
            .map(|key| (key.peril_id, key.coverage_type, key.status))
            .collect::<Vec<_>>();
        assert_eq!(
            &summary[..3],
            &[
                (Peril::Fluvial, 1, KeyStatus::Success),
                (Peril::Fluvial, 3, KeyStatus::Success),
                (Peril::Fluvial, 4, KeyStatus::Success),
            ]
        );
        // OSF buildings is at risk, contents has no vulnerability row
        assert_eq!(summary[3], (Peril::Pluvial, 1, KeyStatus::Success));
        assert_eq!(summary[4], (Peril::Pluvial, 3, KeyStatus::FailVulnerability));
        // bi vulnerability is shared across perils; WSS is not at risk here
        assert_eq!(summary[8], (Peril::Coastal, 4, KeyStatus::NotAtRisk));
        assert!(keys.iter().all(|key| key.loc_id == 1));
    }

    #[test]
    fn postcode_fills_zero_coordinates() {
        let raw = detached(3)
            .with("latitude", "0")
            .with("longitude", "0")
            .with("postalcode", "sw1a 1aa")
            .with("locperilscovered", "ORF");
        let keys = lookup().process_locations(&[raw]).expect("lookup");
        assert_eq!(keys[0].status, KeyStatus::Success);
        assert_eq!(keys[0].lat_id, Some(185_400));
    }

    #[test]
    fn unreadable_coordinates_fail_the_area_peril() {
        let raw = detached(4)
            .with("latitude", "north")
            .with("locperilscovered", "ORF");
        let keys = lookup().process_locations(&[raw]).expect("lookup");
        assert_eq!(keys[0].status, KeyStatus::FailAreaPeril);
        assert_eq!(keys[0].lat_id, None);
    }

    #[test]
    fn custom_user_vulnerability_column() {
        let raw = detached(5)
            .with("flexilocuvid", "7")
            .with("locperilscovered", "ORF");
        let keys = lookup()
            .with_user_vulnerability_column("FlexiLocUVID")
            .process_locations(&[raw])
            .expect("lookup");
        assert_eq!(keys[0].vulnerability_id, 701);
    }

    #[test]
    fn parallel_matches_sequential() {
        let records = (1..=7).map(detached).collect::<Vec<_>>();
        let lookup = lookup();
        let sequential = lookup.process_locations(&records).expect("sequential");
        let parallel = lookup
            .process_locations_parallel(&records, 2)
            .expect("parallel");
        assert_eq!(sequential, parallel);
        assert!(matches!(
            lookup.process_locations_parallel(&records, 0),
            Err(LookupError::InvalidChunkSize)
        ));
    }

    #[test]
    fn status_counts_cover_every_status() {
        let keys = lookup()
            .process_locations(&[detached(1)])
            .expect("lookup");
        let counts = status_counts(&keys);
        assert_eq!(counts.len(), 5);
        assert_eq!(counts.values().sum::<usize>(), 9);
        assert_eq!(counts["fail"], 0);
    }
}
