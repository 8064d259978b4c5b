use super::domain::Peril;

/// OED peril group codes the model understands.
const PERIL_GROUPS: [(&str, &[Peril]); 3] = [
    // all perils
    ("AA1", &[Peril::Fluvial, Peril::Pluvial, Peril::Coastal]),
    // flood w/o storm surge
    ("OO1", &[Peril::Fluvial, Peril::Pluvial]),
    // windstorm w/ storm surge
    ("WW1", &[Peril::Coastal]),
];

/// Expands a peril group code; anything else is taken as an explicit peril list.
pub fn resolve_covered_perils(value: &str) -> String {
    let trimmed = value.trim();
    PERIL_GROUPS
        .iter()
        .find(|(code, _)| code.eq_ignore_ascii_case(trimmed))
        .map(|(_, perils)| {
            perils
                .iter()
                .map(|peril| peril.code())
                .collect::<Vec<_>>()
                .join(";")
        })
        .unwrap_or_else(|| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_expand_to_flood_perils() {
        assert_eq!(resolve_covered_perils("AA1"), "ORF;OSF;WSS");
        assert_eq!(resolve_covered_perils("OO1"), "ORF;OSF");
        assert_eq!(resolve_covered_perils("WW1"), "WSS");
    }

    #[test]
    fn explicit_lists_pass_through() {
        assert_eq!(resolve_covered_perils("ORF;WSS"), "ORF;WSS");
        assert_eq!(resolve_covered_perils("WTC"), "WTC");
    }
}
