use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use std::io::Read;

pub(crate) fn parse_rows<R, T>(reader: R) -> Result<Vec<T>, csv::Error>
where
    R: Read,
    T: DeserializeOwned,
{
    let mut csv_reader = csv_reader(reader);
    let mut rows = Vec::new();

    for record in csv_reader.deserialize::<T>() {
        rows.push(record?);
    }

    Ok(rows)
}

/// Same as [`parse_rows`] but also returns the lower-cased header names.
pub(crate) fn parse_rows_with_headers<R, T>(reader: R) -> Result<(Vec<String>, Vec<T>), csv::Error>
where
    R: Read,
    T: DeserializeOwned,
{
    let mut csv_reader = csv_reader(reader);
    let headers = csv_reader
        .headers()?
        .iter()
        .map(|header| header.to_ascii_lowercase())
        .collect::<Vec<_>>();
    csv_reader.set_headers(csv::StringRecord::from(headers.clone()));

    let mut rows = Vec::new();
    for record in csv_reader.deserialize::<T>() {
        rows.push(record?);
    }

    Ok((headers, rows))
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader)
}

#[derive(Debug, Deserialize)]
pub(crate) struct PostcodeRow {
    #[serde(alias = "postalcode")]
    pub(crate) postcode: String,
    pub(crate) latitude: f64,
    pub(crate) longitude: f64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct YearBuiltRow {
    #[serde(deserialize_with = "lenient_int")]
    pub(crate) yearbuilt: i64,
    pub(crate) yearbuilt_cat: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct McmResidentialRow {
    pub(crate) building_cat: String,
    pub(crate) yearbuilt_cat: String,
    #[serde(deserialize_with = "lenient_int")]
    pub(crate) mcm_code: i64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct McmNonResidentialRow {
    #[serde(deserialize_with = "lenient_int")]
    pub(crate) occupancycode: i64,
    #[serde(deserialize_with = "lenient_int")]
    pub(crate) mcm_code: i64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VulnerabilityRow {
    #[serde(deserialize_with = "lenient_int")]
    pub(crate) mcm_code: i64,
    #[serde(deserialize_with = "lenient_int")]
    pub(crate) coveragetype_id: i64,
    pub(crate) peril_type: String,
    #[serde(deserialize_with = "lenient_int")]
    pub(crate) vulnerability_id: i64,
    #[serde(default, deserialize_with = "lenient_optional_int")]
    pub(crate) user_vulnerability_id: Option<i64>,
    #[serde(default, deserialize_with = "lenient_optional_int")]
    pub(crate) numberofstoreys: Option<i64>,
    #[serde(default, deserialize_with = "lenient_optional_int")]
    pub(crate) floorsoccupied: Option<i64>,
    #[serde(default, deserialize_with = "lenient_optional_int")]
    pub(crate) bipoi_cat: Option<i64>,
    #[serde(default)]
    pub(crate) ffh_cat: Option<f64>,
}

/// `peril_id` is `None` when the grid carries no peril column at all.
#[derive(Debug, Deserialize)]
pub(crate) struct AtRiskRow {
    #[serde(default, deserialize_with = "present_text")]
    pub(crate) peril_id: Option<String>,
    #[serde(deserialize_with = "lenient_int")]
    pub(crate) lat_id: i64,
    #[serde(deserialize_with = "lenient_int")]
    pub(crate) lon_id: i64,
}

fn present_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer).map(Some)
}

/// Accepts integral values written as floats (`51.0`), as produced by dataframe exports.
fn lenient_int<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    crate::lookup::parse_int(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("expected an integer, found '{raw}'")))
}

fn lenient_optional_int<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    match opt.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => crate::lookup::parse_int(raw)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("expected an integer, found '{raw}'"))),
    }
}
