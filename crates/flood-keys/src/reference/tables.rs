use super::parser::{
    McmNonResidentialRow, McmResidentialRow, PostcodeRow, VulnerabilityRow, YearBuiltRow,
};
use crate::lookup::domain::{BuildingCategory, Coverage, Peril};
use std::collections::HashMap;

/// Postcode → centroid (latitude, longitude), keyed by the normalised postcode.
#[derive(Debug, Clone, Default)]
pub struct PostcodeCentroids {
    centroids: HashMap<String, (f64, f64)>,
}

impl PostcodeCentroids {
    pub(crate) fn from_rows(rows: Vec<PostcodeRow>) -> Self {
        let mut centroids = HashMap::with_capacity(rows.len());
        for row in rows {
            centroids
                .entry(normalize_postcode(&row.postcode))
                .or_insert((row.latitude, row.longitude));
        }
        Self { centroids }
    }

    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, f64, f64)>,
        S: AsRef<str>,
    {
        let rows = entries
            .into_iter()
            .map(|(postcode, latitude, longitude)| PostcodeRow {
                postcode: postcode.as_ref().to_string(),
                latitude,
                longitude,
            })
            .collect();
        Self::from_rows(rows)
    }

    pub fn centroid(&self, postcode: &str) -> Option<(f64, f64)> {
        self.centroids.get(&normalize_postcode(postcode)).copied()
    }

    pub fn len(&self) -> usize {
        self.centroids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.centroids.is_empty()
    }
}

pub fn normalize_postcode(value: &str) -> String {
    value
        .chars()
        .filter(|ch| !ch.is_whitespace())
        .collect::<String>()
        .to_uppercase()
}

/// Year built → year-built category label.
#[derive(Debug, Clone, Default)]
pub struct YearBuiltCategories {
    categories: HashMap<i64, String>,
}

impl YearBuiltCategories {
    pub(crate) fn from_rows(rows: Vec<YearBuiltRow>) -> Self {
        let mut categories = HashMap::with_capacity(rows.len());
        for row in rows {
            categories.entry(row.yearbuilt).or_insert(row.yearbuilt_cat);
        }
        Self { categories }
    }

    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (i64, S)>,
        S: Into<String>,
    {
        Self::from_rows(
            entries
                .into_iter()
                .map(|(yearbuilt, category)| YearBuiltRow {
                    yearbuilt,
                    yearbuilt_cat: category.into(),
                })
                .collect(),
        )
    }

    pub fn category(&self, year_built: i64) -> Option<&str> {
        self.categories.get(&year_built).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }
}

/// (building category, year-built category) → MCM code for residential risks.
#[derive(Debug, Clone, Default)]
pub struct McmResidentialRules {
    codes: HashMap<(BuildingCategory, String), i64>,
}

impl McmResidentialRules {
    /// Rows naming a category the classifier never produces are skipped.
    pub(crate) fn from_rows(rows: Vec<McmResidentialRow>) -> Self {
        let mut codes = HashMap::with_capacity(rows.len());
        for row in rows {
            if let Some(category) = BuildingCategory::from_label(&row.building_cat) {
                codes
                    .entry((category, row.yearbuilt_cat))
                    .or_insert(row.mcm_code);
            }
        }
        Self { codes }
    }

    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (BuildingCategory, S, i64)>,
        S: Into<String>,
    {
        let mut codes = HashMap::new();
        for (category, year_category, mcm_code) in entries {
            codes
                .entry((category, year_category.into()))
                .or_insert(mcm_code);
        }
        Self { codes }
    }

    pub fn mcm_code(&self, category: BuildingCategory, year_category: &str) -> Option<i64> {
        self.codes
            .get(&(category, year_category.to_string()))
            .copied()
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }
}

/// OED occupancy code → MCM code for non-residential risks.
#[derive(Debug, Clone, Default)]
pub struct McmNonResidentialRules {
    codes: HashMap<i64, i64>,
}

impl McmNonResidentialRules {
    pub(crate) fn from_rows(rows: Vec<McmNonResidentialRow>) -> Self {
        let mut codes = HashMap::with_capacity(rows.len());
        for row in rows {
            codes.entry(row.occupancycode).or_insert(row.mcm_code);
        }
        Self { codes }
    }

    pub fn from_entries<I: IntoIterator<Item = (i64, i64)>>(entries: I) -> Self {
        let mut codes = HashMap::new();
        for (occupancy_code, mcm_code) in entries {
            codes.entry(occupancy_code).or_insert(mcm_code);
        }
        Self { codes }
    }

    pub fn mcm_code(&self, occupancy_code: i64) -> Option<i64> {
        self.codes.get(&occupancy_code).copied()
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }
}

/// Row of the vulnerability dictionary after normalising coverage and peril encodings.
#[derive(Debug, Clone, PartialEq)]
pub struct VulnerabilityEntry {
    pub mcm_code: i64,
    pub coverage: Coverage,
    pub peril_type: String,
    pub user_vulnerability_id: Option<i64>,
    pub number_of_storeys: Option<i64>,
    pub floors_occupied: Option<i64>,
    pub bipoi_cat: Option<i64>,
    pub ffh_cat: Option<f64>,
    pub vulnerability_id: i64,
}

/// Classification attributes a key is matched on.
#[derive(Debug, Clone, PartialEq)]
pub struct VulnerabilityQuery<'a> {
    pub mcm_code: i64,
    pub coverage: Coverage,
    pub peril_type: &'a str,
    pub user_vulnerability_id: i64,
    pub number_of_storeys: i64,
    pub floors_occupied: i64,
    pub bipoi_cat: i64,
    pub ffh_cat: Option<f64>,
}

/// Optional join columns present in the dictionary file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VulnerabilityColumns {
    pub user_vulnerability_id: bool,
    pub number_of_storeys: bool,
    pub floors_occupied: bool,
    pub bipoi_cat: bool,
    pub ffh_cat: bool,
}

impl VulnerabilityColumns {
    pub(crate) fn from_headers(headers: &[String]) -> Self {
        let has = |name: &str| headers.iter().any(|header| header == name);
        Self {
            user_vulnerability_id: has("user_vulnerability_id"),
            number_of_storeys: has("numberofstoreys"),
            floors_occupied: has("floorsoccupied"),
            bipoi_cat: has("bipoi_cat"),
            ffh_cat: has("ffh_cat"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct VulnerabilityTable {
    columns: VulnerabilityColumns,
    entries: Vec<VulnerabilityEntry>,
    index: HashMap<(i64, Coverage, String), Vec<usize>>,
}

impl VulnerabilityTable {
    /// Returns the rows whose coverage id is not a modelled coverage alongside the table.
    pub(crate) fn from_rows(
        columns: VulnerabilityColumns,
        rows: Vec<VulnerabilityRow>,
    ) -> (Self, usize) {
        let mut skipped = 0;
        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            let Some(coverage) = Coverage::from_id(row.coveragetype_id) else {
                skipped += 1;
                continue;
            };
            entries.push(VulnerabilityEntry {
                mcm_code: row.mcm_code,
                coverage,
                peril_type: normalize_peril_type(&row.peril_type),
                user_vulnerability_id: row.user_vulnerability_id,
                number_of_storeys: row.numberofstoreys,
                floors_occupied: row.floorsoccupied,
                bipoi_cat: row.bipoi_cat,
                ffh_cat: row.ffh_cat,
                vulnerability_id: row.vulnerability_id,
            });
        }
        (Self::new(columns, entries), skipped)
    }

    pub fn new(columns: VulnerabilityColumns, entries: Vec<VulnerabilityEntry>) -> Self {
        let mut index: HashMap<(i64, Coverage, String), Vec<usize>> = HashMap::new();
        for (position, entry) in entries.iter().enumerate() {
            index
                .entry((entry.mcm_code, entry.coverage, entry.peril_type.clone()))
                .or_default()
                .push(position);
        }
        Self {
            columns,
            entries,
            index,
        }
    }

    /// First row in file order satisfying every join column the table carries.
    pub fn find(&self, query: &VulnerabilityQuery<'_>) -> Option<&VulnerabilityEntry> {
        let key = (
            query.mcm_code,
            query.coverage,
            normalize_peril_type(query.peril_type),
        );
        self.index
            .get(&key)?
            .iter()
            .map(|position| &self.entries[*position])
            .find(|entry| self.matches(entry, query))
    }

    fn matches(&self, entry: &VulnerabilityEntry, query: &VulnerabilityQuery<'_>) -> bool {
        let columns = &self.columns;
        optional_matches(
            columns.user_vulnerability_id,
            entry.user_vulnerability_id,
            query.user_vulnerability_id,
        ) && optional_matches(
            columns.number_of_storeys,
            entry.number_of_storeys,
            query.number_of_storeys,
        ) && optional_matches(
            columns.floors_occupied,
            entry.floors_occupied,
            query.floors_occupied,
        ) && optional_matches(columns.bipoi_cat, entry.bipoi_cat, query.bipoi_cat)
            && (!columns.ffh_cat
                || match (entry.ffh_cat, query.ffh_cat) {
                    (Some(expected), Some(actual)) => (expected - actual).abs() < 1e-9,
                    _ => false,
                })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn optional_matches(present: bool, expected: Option<i64>, actual: i64) -> bool {
    !present || expected == Some(actual)
}

/// Canonical peril-type text: legacy numeric codes expanded, semicolon groups ordered by peril.
pub fn normalize_peril_type(value: &str) -> String {
    let trimmed = value.trim();
    match trimmed {
        "1" | "1.0" => return Peril::Fluvial.code().to_string(),
        "2" | "2.0" => return Peril::Pluvial.code().to_string(),
        "3" | "3.0" => return Peril::Coastal.code().to_string(),
        "-9999" | "-9999.0" => return Peril::all_codes(),
        _ => {}
    }

    let parts = trimmed
        .split(';')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>();
    let mut perils = parts
        .iter()
        .map(|part| Peril::from_code(part))
        .collect::<Option<Vec<_>>>();

    match perils.as_mut() {
        Some(perils) if !perils.is_empty() => {
            perils.sort();
            perils.dedup();
            perils
                .iter()
                .map(|peril| peril.code())
                .collect::<Vec<_>>()
                .join(";")
        }
        _ => parts.join(";").to_ascii_uppercase(),
    }
}
