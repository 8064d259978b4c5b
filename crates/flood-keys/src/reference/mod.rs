//! Static model data loaded once per worker and shared read-only by every lookup call.

mod columnar;
mod grid;
mod parser;
mod raster;
mod tables;
mod user_data;

pub use grid::{AtRiskGrid, AtRiskView, GridCell};
pub use raster::{CatchmentRaster, CatchmentSampler, GeoTransform, RasterError};
pub use tables::{
    normalize_peril_type, normalize_postcode, McmNonResidentialRules, McmResidentialRules,
    PostcodeCentroids, VulnerabilityColumns, VulnerabilityEntry, VulnerabilityQuery,
    VulnerabilityTable, YearBuiltCategories,
};
pub use user_data::{
    UserDataError, UserDataFiles, USER_SUPPLIED_VULNERABILITY_PREFIX,
    VULNERABILITY_SCALE_FACTOR_PREFIX,
};

use serde::de::DeserializeOwned;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const VULNERABILITY_FILE: &str = "vulnerability_dict.csv";
pub const MCM_RESIDENTIAL_FILE: &str = "MCM_OED_residential.csv";
pub const MCM_NONRESIDENTIAL_FILE: &str = "MCM_OED_nonresidential.csv";
pub const POSTCODE_FILE: &str = "postcode_dict.csv";
pub const YEAR_BUILT_FILE: &str = "yearbuilt.csv";
pub const AT_RISK_FILE: &str = "wet_area_peril.parquet";
/// Delimited export of the at-risk grid, read when the Parquet file is absent.
pub const AT_RISK_CSV_FILE: &str = "wet_area_peril.csv";
pub const CATCHMENT_RASTER_FILE: &str = "uk.tif";

#[derive(Debug, thiserror::Error)]
pub enum ReferenceDataError {
    #[error("failed to open reference file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid reference table {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("invalid at-risk grid {}: {source}", path.display())]
    Parquet {
        path: PathBuf,
        #[source]
        source: parquet::errors::ParquetError,
    },
    #[error("{}: {source}", path.display())]
    Raster {
        path: PathBuf,
        #[source]
        source: RasterError,
    },
}

/// Every table the lookup consults. Immutable once built.
#[derive(Debug, Clone)]
pub struct ReferenceTables {
    pub postcodes: PostcodeCentroids,
    pub year_built: YearBuiltCategories,
    pub mcm_residential: McmResidentialRules,
    pub mcm_nonresidential: McmNonResidentialRules,
    pub vulnerability: VulnerabilityTable,
    pub at_risk: AtRiskGrid,
    pub catchments: CatchmentRaster,
}

impl ReferenceTables {
    pub fn load<P: AsRef<Path>>(dir: P) -> Result<Self, ReferenceDataError> {
        let dir = dir.as_ref();

        let (vulnerability_headers, vulnerability_rows) =
            read_table_with_headers(&dir.join(VULNERABILITY_FILE))?;
        let (vulnerability, skipped) = VulnerabilityTable::from_rows(
            VulnerabilityColumns::from_headers(&vulnerability_headers),
            vulnerability_rows,
        );
        if skipped > 0 {
            warn!(skipped, "ignored vulnerability rows with unmodelled coverage types");
        }

        let (at_risk, skipped) = AtRiskGrid::from_rows(read_at_risk(dir)?);
        if skipped > 0 {
            warn!(skipped, "ignored at-risk rows with unknown perils");
        }

        let raster_path = dir.join(CATCHMENT_RASTER_FILE);
        let catchments =
            CatchmentRaster::open(&raster_path).map_err(|source| ReferenceDataError::Raster {
                path: raster_path.clone(),
                source,
            })?;

        let tables = Self {
            postcodes: PostcodeCentroids::from_rows(read_table(&dir.join(POSTCODE_FILE))?),
            year_built: YearBuiltCategories::from_rows(read_table(&dir.join(YEAR_BUILT_FILE))?),
            mcm_residential: McmResidentialRules::from_rows(read_table(
                &dir.join(MCM_RESIDENTIAL_FILE),
            )?),
            mcm_nonresidential: McmNonResidentialRules::from_rows(read_table(
                &dir.join(MCM_NONRESIDENTIAL_FILE),
            )?),
            vulnerability,
            at_risk,
            catchments,
        };

        info!(
            dir = %dir.display(),
            postcodes = tables.postcodes.len(),
            vulnerabilities = tables.vulnerability.len(),
            at_risk_cells = tables.at_risk.len(),
            raster = ?tables.catchments.dimensions(),
            "loaded keys reference data"
        );
        Ok(tables)
    }
}

fn open(path: &Path) -> Result<File, ReferenceDataError> {
    File::open(path).map_err(|source| ReferenceDataError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn read_table<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, ReferenceDataError> {
    parser::parse_rows(open(path)?).map_err(|source| ReferenceDataError::Csv {
        path: path.to_path_buf(),
        source,
    })
}

fn read_at_risk(dir: &Path) -> Result<Vec<parser::AtRiskRow>, ReferenceDataError> {
    let parquet_path = dir.join(AT_RISK_FILE);
    let csv_path = dir.join(AT_RISK_CSV_FILE);
    if !parquet_path.exists() && csv_path.exists() {
        return read_table(&csv_path);
    }
    columnar::read_at_risk_rows(open(&parquet_path)?).map_err(|source| {
        ReferenceDataError::Parquet {
            path: parquet_path,
            source,
        }
    })
}

fn read_table_with_headers<T: DeserializeOwned>(
    path: &Path,
) -> Result<(Vec<String>, Vec<T>), ReferenceDataError> {
    parser::parse_rows_with_headers(open(path)?).map_err(|source| ReferenceDataError::Csv {
        path: path.to_path_buf(),
        source,
    })
}
