//! At-risk grid in its distributed Parquet form.

use super::parser::AtRiskRow;
use parquet::errors::ParquetError;
use parquet::file::reader::{FileReader, SerializedFileReader};
use parquet::record::Field;
use std::fs::File;

/// Reads `peril_id,lat_id,lon_id` rows. Column names are matched case-insensitively and a grid
/// without a peril column yields rows with no peril.
pub(crate) fn read_at_risk_rows(file: File) -> Result<Vec<AtRiskRow>, ParquetError> {
    let reader = SerializedFileReader::new(file)?;
    let columns = reader
        .metadata()
        .file_metadata()
        .schema_descr()
        .columns()
        .iter()
        .map(|column| column.name().to_ascii_lowercase())
        .collect::<Vec<_>>();
    for required in ["lat_id", "lon_id"] {
        if !columns.iter().any(|name| name == required) {
            return Err(ParquetError::General(format!("missing column {required}")));
        }
    }
    let has_peril = columns.iter().any(|name| name == "peril_id");

    let mut rows = Vec::new();
    for (index, row) in reader.get_row_iter(None)?.enumerate() {
        let row = row?;
        let mut peril_id = has_peril.then(String::new);
        let mut lat_id = None;
        let mut lon_id = None;
        for (name, field) in row.get_column_iter() {
            match name.to_ascii_lowercase().as_str() {
                "peril_id" => peril_id = Some(field_text(field)),
                "lat_id" => lat_id = field_int(field),
                "lon_id" => lon_id = field_int(field),
                _ => {}
            }
        }
        match (lat_id, lon_id) {
            (Some(lat_id), Some(lon_id)) => rows.push(AtRiskRow {
                peril_id,
                lat_id,
                lon_id,
            }),
            _ => {
                return Err(ParquetError::General(format!(
                    "row {} has no integral lat_id/lon_id",
                    index + 1
                )))
            }
        }
    }
    Ok(rows)
}

fn field_text(field: &Field) -> String {
    match field {
        Field::Str(value) => value.clone(),
        Field::Null => String::new(),
        other => field_int(other)
            .map(|value| value.to_string())
            .unwrap_or_default(),
    }
}

fn field_int(field: &Field) -> Option<i64> {
    match field {
        Field::Byte(value) => Some(i64::from(*value)),
        Field::Short(value) => Some(i64::from(*value)),
        Field::Int(value) => Some(i64::from(*value)),
        Field::Long(value) => Some(*value),
        Field::UByte(value) => Some(i64::from(*value)),
        Field::UShort(value) => Some(i64::from(*value)),
        Field::UInt(value) => Some(i64::from(*value)),
        Field::ULong(value) => i64::try_from(*value).ok(),
        Field::Float(value) => integral(f64::from(*value)),
        Field::Double(value) => integral(*value),
        Field::Str(value) => crate::lookup::parse_int(value),
        _ => None,
    }
}

fn integral(value: f64) -> Option<i64> {
    (value.is_finite() && value.fract() == 0.0).then_some(value as i64)
}
