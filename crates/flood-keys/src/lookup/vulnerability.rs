use super::domain::{CandidateKey, UNMATCHED};
use crate::reference::{VulnerabilityQuery, VulnerabilityTable};

pub(crate) fn resolve_vulnerability(candidate: &CandidateKey<'_>, table: &VulnerabilityTable) -> i64 {
    let query = VulnerabilityQuery {
        mcm_code: candidate.mcm_code,
        coverage: candidate.coverage,
        peril_type: &candidate.peril_type,
        user_vulnerability_id: candidate.location.record.user_vulnerability_id,
        number_of_storeys: candidate.number_of_storeys,
        floors_occupied: candidate.floors_occupied,
        bipoi_cat: candidate.bipoi_cat,
        ffh_cat: candidate.ffh_cat,
    };
    table
        .find(&query)
        .map(|entry| entry.vulnerability_id)
        .unwrap_or(UNMATCHED)
}
