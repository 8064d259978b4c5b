//! Keys output for the loss engine: successful keys, rejected keys and the list of catchment
//! files the execution stage has to fetch.

use crate::lookup::{KeyStatus, Peril, ResultKey};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::info;

pub const KEYS_FILE: &str = "keys.csv";
pub const KEYS_ERRORS_FILE: &str = "keys-errors.csv";
pub const MODEL_DATA_FILES: &str = "model_data_files.csv";

#[derive(Debug, thiserror::Error)]
pub enum KeysFileError {
    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

/// Row counts of the files written by [`write_keys_files`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeysFileSummary {
    pub successes: usize,
    pub errors: usize,
    pub model_files: usize,
}

const SUCCESS_HEADERS: [&str; 6] = [
    "LocID",
    "PerilID",
    "CoverageTypeID",
    "AreaPerilID",
    "VulnerabilityID",
    "ModelData",
];
const ERROR_HEADERS: [&str; 5] = ["LocID", "PerilID", "CoverageTypeID", "Status", "Message"];

#[derive(Debug, Serialize)]
struct SuccessRow<'a> {
    loc_id: i64,
    peril_id: Peril,
    coverage_type: u8,
    area_peril_id: i64,
    vulnerability_id: i64,
    model_data: &'a str,
}

#[derive(Debug, Serialize)]
struct ErrorRow<'a> {
    loc_id: i64,
    peril_id: Peril,
    coverage_type: u8,
    status: KeyStatus,
    message: &'a str,
}

/// Catchment files referenced by the resolved keys, sorted and unique.
pub fn model_data_files(keys: &[ResultKey]) -> Vec<String> {
    let mut files = BTreeSet::new();
    for catchment_id in keys
        .iter()
        .map(|key| key.catchment_id)
        .filter(|id| *id >= 1)
    {
        files.insert(format!("catchments/catchment_{catchment_id}.parquet"));
        files.insert(format!(
            "catchment_events/catchment_{catchment_id}_events.parquet"
        ));
    }
    files.into_iter().collect()
}

pub fn write_keys_files<P: AsRef<Path>>(
    output_dir: P,
    keys: &[ResultKey],
) -> Result<KeysFileSummary, KeysFileError> {
    let output_dir = output_dir.as_ref();
    fs::create_dir_all(output_dir).map_err(|source| KeysFileError::Io {
        path: output_dir.to_path_buf(),
        source,
    })?;

    let (successes, errors): (Vec<_>, Vec<_>) = keys
        .iter()
        .partition(|key| key.status == KeyStatus::Success);

    write_rows(
        &output_dir.join(KEYS_FILE),
        Some(&SUCCESS_HEADERS[..]),
        successes.iter().map(|key| SuccessRow {
            loc_id: key.loc_id,
            peril_id: key.peril_id,
            coverage_type: key.coverage_type,
            area_peril_id: key.area_peril_id,
            vulnerability_id: key.vulnerability_id,
            model_data: &key.model_data,
        }),
    )?;
    write_rows(
        &output_dir.join(KEYS_ERRORS_FILE),
        Some(&ERROR_HEADERS[..]),
        errors.iter().map(|key| ErrorRow {
            loc_id: key.loc_id,
            peril_id: key.peril_id,
            coverage_type: key.coverage_type,
            status: key.status,
            message: &key.message,
        }),
    )?;

    let model_files = model_data_files(keys);
    write_rows(
        &output_dir.join(MODEL_DATA_FILES),
        None,
        model_files.iter().map(|file| [file.as_str()]),
    )?;

    let summary = KeysFileSummary {
        successes: successes.len(),
        errors: errors.len(),
        model_files: model_files.len(),
    };
    info!(
        dir = %output_dir.display(),
        successes = summary.successes,
        errors = summary.errors,
        model_files = summary.model_files,
        "wrote keys files"
    );
    Ok(summary)
}

/// Headers are written even when there are no rows.
fn write_rows<S, I>(path: &Path, headers: Option<&[&str]>, rows: I) -> Result<(), KeysFileError>
where
    S: Serialize,
    I: IntoIterator<Item = S>,
{
    let file = File::create(path).map_err(|source| KeysFileError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let csv_error = |source| KeysFileError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);
    if let Some(headers) = headers {
        writer.write_record(headers).map_err(csv_error)?;
    }
    for row in rows {
        writer.serialize(row).map_err(csv_error)?;
    }
    writer.flush().map_err(|source| KeysFileError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(loc_id: i64, status: KeyStatus, catchment_id: i64) -> ResultKey {
        ResultKey {
            loc_id,
            peril_id: Peril::Fluvial,
            coverage_type: 1,
            vulnerability_id: 101,
            status,
            message: status.message().to_string(),
            model_data: if status == KeyStatus::Success {
                format!(r#"{{"catchment_id":{catchment_id}}}"#)
            } else {
                String::new()
            },
            catchment_id,
            lat_id: Some(185_400),
            lon_id: Some(-900),
            area_peril_id: -1,
        }
    }

    #[test]
    fn model_files_skip_unknown_catchments_and_deduplicate() {
        let keys = vec![
            key(1, KeyStatus::Success, 42),
            key(2, KeyStatus::Success, 42),
            key(3, KeyStatus::Success, 7),
            key(4, KeyStatus::NotAtRisk, -1),
            key(5, KeyStatus::Success, 0),
        ];
        let files = model_data_files(&keys);
        assert_eq!(
            files,
            vec![
                "catchment_events/catchment_42_events.parquet",
                "catchment_events/catchment_7_events.parquet",
                "catchments/catchment_42.parquet",
                "catchments/catchment_7.parquet",
            ]
        );
    }

    #[test]
    fn writes_success_and_error_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let output = dir.path().join("run");
        let keys = vec![
            key(1, KeyStatus::Success, 42),
            key(2, KeyStatus::FailVulnerability, -1),
        ];

        let summary = write_keys_files(&output, &keys).expect("write");
        assert_eq!(
            summary,
            KeysFileSummary {
                successes: 1,
                errors: 1,
                model_files: 2,
            }
        );

        let success = fs::read_to_string(output.join(KEYS_FILE)).expect("keys file");
        assert_eq!(
            success,
            "LocID,PerilID,CoverageTypeID,AreaPerilID,VulnerabilityID,ModelData\n\
             1,ORF,1,-1,101,\"{\"\"catchment_id\"\":42}\"\n"
        );
        let errors = fs::read_to_string(output.join(KEYS_ERRORS_FILE)).expect("errors file");
        assert_eq!(
            errors,
            "LocID,PerilID,CoverageTypeID,Status,Message\n\
             2,ORF,1,fail_v,\"area-peril valid, vulnerability invalid\"\n"
        );
        let model_files = fs::read_to_string(output.join(MODEL_DATA_FILES)).expect("model files");
        assert_eq!(
            model_files,
            "catchment_events/catchment_42_events.parquet\ncatchments/catchment_42.parquet\n"
        );
    }
}
