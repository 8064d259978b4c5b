use super::normalizer::RawLocation;
use std::io::Read;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum LocationReadError {
    #[error("failed to read location file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid location CSV data: {0}")]
    Csv(#[from] csv::Error),
}

/// Reads an OED location file into untyped rows. Headers are matched case-insensitively;
/// rows are numbered from 1 in file order.
pub struct LocationReader;

impl LocationReader {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Vec<RawLocation>, LocationReadError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<RawLocation>, LocationReadError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);
        let headers = csv_reader
            .headers()?
            .iter()
            .map(|header| header.trim_start_matches('\u{feff}').to_string())
            .collect::<Vec<_>>();

        let mut locations = Vec::new();
        for (index, record) in csv_reader.records().enumerate() {
            let record = record?;
            let mut location = RawLocation::new(index as i64 + 1);
            for (header, value) in headers.iter().zip(record.iter()) {
                location.insert(header, value);
            }
            locations.push(location);
        }

        Ok(locations)
    }
}
