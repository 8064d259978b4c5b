use super::domain::{
    BuildingCategory, CandidateKey, Coverage, EnrichedLocation, Peril, SUPPRESSED, UNMATCHED,
};

/// One candidate per covered peril × coverage, perils outermost.
pub(crate) fn expand(location: &EnrichedLocation) -> Vec<CandidateKey<'_>> {
    let mut keys = Vec::with_capacity(Peril::ordered().len() * Coverage::ordered().len());
    for peril in Peril::ordered() {
        if !location.perils_covered.contains(peril.code()) {
            continue;
        }
        for coverage in Coverage::ordered() {
            keys.push(candidate(location, peril, coverage));
        }
    }
    keys
}

fn candidate(location: &EnrichedLocation, peril: Peril, coverage: Coverage) -> CandidateKey<'_> {
    let category = location.building_category;
    let is_bi = coverage == Coverage::Bi;
    let is_contents = coverage == Coverage::Contents;

    let floors_occupied = if is_contents
        && matches!(
            category,
            Some(BuildingCategory::Flat | BuildingCategory::Nonres)
        ) {
        location.floors_occupied
    } else {
        SUPPRESSED
    };

    let bipoi_cat = if is_bi {
        location.bipoi_cat.unwrap_or(UNMATCHED)
    } else {
        SUPPRESSED
    };

    let number_of_storeys = if is_bi || (is_contents && category == Some(BuildingCategory::Flat)) {
        0
    } else {
        location.number_of_storeys
    };

    let mcm_code = if is_bi && category == Some(BuildingCategory::Nonres) {
        0
    } else {
        location.mcm_code.unwrap_or(UNMATCHED)
    };

    // business interruption vulnerability does not depend on the peril
    let peril_type = if is_bi {
        Peril::all_codes()
    } else {
        peril.code().to_string()
    };

    CandidateKey {
        location,
        peril,
        coverage,
        peril_type,
        mcm_code,
        number_of_storeys,
        floors_occupied,
        bipoi_cat,
        ffh_cat: location.ffh_cat,
    }
}
