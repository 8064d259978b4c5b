use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tiff::decoder::{Decoder, DecodingResult};
use tiff::tags::Tag;
use tiff::ColorType;

/// North-up affine georeferencing: origin is the top-left corner of pixel (0, 0).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoTransform {
    pub origin_lon: f64,
    pub origin_lat: f64,
    pub pixel_width: f64,
    pub pixel_height: f64,
}

impl GeoTransform {
    /// Pixel (column, row) containing the coordinate, or `None` outside the raster.
    pub fn pixel(&self, longitude: f64, latitude: f64, width: u32, height: u32) -> Option<(u32, u32)> {
        let col = ((longitude - self.origin_lon) / self.pixel_width).floor();
        let row = ((self.origin_lat - latitude) / self.pixel_height).floor();
        if !col.is_finite() || !row.is_finite() {
            return None;
        }
        if col < 0.0 || row < 0.0 || col >= f64::from(width) || row >= f64::from(height) {
            return None;
        }
        Some((col as u32, row as u32))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RasterError {
    #[error("failed to open catchment raster: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid catchment raster: {0}")]
    Tiff(#[from] tiff::TiffError),
    #[error("catchment raster is missing the {0} georeferencing tag")]
    MissingTag(&'static str),
    #[error("catchment raster georeferencing is degenerate")]
    InvalidTransform,
    #[error("catchment raster must have a single band, found {0:?}")]
    UnsupportedColorType(ColorType),
    #[error("catchment raster uses an unsupported sample format")]
    UnsupportedSampleFormat,
    #[error("expected {expected} raster values, found {actual}")]
    ValueCount { expected: usize, actual: usize },
}

#[derive(Debug, Clone, Copy)]
enum ChunkLayout {
    Stripped {
        chunk_height: u32,
    },
    Tiled {
        tile_width: u32,
        tile_height: u32,
        tiles_per_row: u32,
    },
}

#[derive(Debug, Clone)]
enum Backing {
    GeoTiff { path: PathBuf, layout: ChunkLayout },
    Memory(Vec<f64>),
}

/// Single-band raster of catchment ids. Holds only metadata for file-backed rasters;
/// pixels are read by a [`CatchmentSampler`] owned by one resolution call.
#[derive(Debug, Clone)]
pub struct CatchmentRaster {
    width: u32,
    height: u32,
    transform: GeoTransform,
    backing: Backing,
}

impl CatchmentRaster {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, RasterError> {
        let path = path.as_ref().to_path_buf();
        let mut decoder = open_decoder(&path)?;

        let color_type = decoder.colortype()?;
        if !matches!(color_type, ColorType::Gray(_)) {
            return Err(RasterError::UnsupportedColorType(color_type));
        }

        let (width, height) = decoder.dimensions()?;
        let scale = decoder
            .find_tag(Tag::ModelPixelScaleTag)?
            .ok_or(RasterError::MissingTag("ModelPixelScale"))?
            .into_f64_vec()?;
        let tiepoint = decoder
            .find_tag(Tag::ModelTiepointTag)?
            .ok_or(RasterError::MissingTag("ModelTiepoint"))?
            .into_f64_vec()?;
        if scale.len() < 2 || tiepoint.len() < 6 || scale[0] <= 0.0 || scale[1] <= 0.0 {
            return Err(RasterError::InvalidTransform);
        }

        let transform = GeoTransform {
            origin_lon: tiepoint[3] - tiepoint[0] * scale[0],
            origin_lat: tiepoint[4] + tiepoint[1] * scale[1],
            pixel_width: scale[0],
            pixel_height: scale[1],
        };

        let (chunk_width, chunk_height) = decoder.chunk_dimensions();
        let layout = if chunk_width == width {
            ChunkLayout::Stripped { chunk_height }
        } else {
            ChunkLayout::Tiled {
                tile_width: chunk_width,
                tile_height: chunk_height,
                tiles_per_row: width.div_ceil(chunk_width),
            }
        };

        Ok(Self {
            width,
            height,
            transform,
            backing: Backing::GeoTiff { path, layout },
        })
    }

    /// Row-major raster held in memory.
    pub fn from_values(
        transform: GeoTransform,
        width: u32,
        height: u32,
        values: Vec<f64>,
    ) -> Result<Self, RasterError> {
        if transform.pixel_width <= 0.0 || transform.pixel_height <= 0.0 {
            return Err(RasterError::InvalidTransform);
        }
        let expected = width as usize * height as usize;
        if values.len() != expected {
            return Err(RasterError::ValueCount {
                expected,
                actual: values.len(),
            });
        }
        Ok(Self {
            width,
            height,
            transform,
            backing: Backing::Memory(values),
        })
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn sampler(&self) -> Result<CatchmentSampler<'_>, RasterError> {
        let decoder = match &self.backing {
            Backing::GeoTiff { path, .. } => Some(open_decoder(path)?),
            Backing::Memory(_) => None,
        };
        Ok(CatchmentSampler {
            raster: self,
            decoder,
            cache: HashMap::new(),
        })
    }
}

fn open_decoder(path: &Path) -> Result<Decoder<BufReader<File>>, RasterError> {
    let file = File::open(path)?;
    Ok(Decoder::new(BufReader::new(file))?)
}

struct Chunk {
    stride: usize,
    values: Vec<f64>,
}

/// Nearest-pixel reader for one resolution call. Decoded chunks are cached for the
/// sampler's lifetime only.
pub struct CatchmentSampler<'a> {
    raster: &'a CatchmentRaster,
    decoder: Option<Decoder<BufReader<File>>>,
    cache: HashMap<u32, Chunk>,
}

impl CatchmentSampler<'_> {
    /// Catchment id under the coordinate; `None` outside the raster or on a negative/nodata pixel.
    pub fn catchment_at(&mut self, longitude: f64, latitude: f64) -> Result<Option<i64>, RasterError> {
        let raster = self.raster;
        let Some((col, row)) =
            raster
                .transform
                .pixel(longitude, latitude, raster.width, raster.height)
        else {
            return Ok(None);
        };

        let value = match &raster.backing {
            Backing::Memory(values) => {
                values.get(row as usize * raster.width as usize + col as usize).copied()
            }
            Backing::GeoTiff { layout, .. } => self.read_pixel(*layout, col, row)?,
        };

        Ok(value.and_then(catchment_id))
    }

    fn read_pixel(&mut self, layout: ChunkLayout, col: u32, row: u32) -> Result<Option<f64>, RasterError> {
        let (chunk_index, local_row, local_col) = match layout {
            ChunkLayout::Stripped { chunk_height } => (row / chunk_height, row % chunk_height, col),
            ChunkLayout::Tiled {
                tile_width,
                tile_height,
                tiles_per_row,
            } => (
                (row / tile_height) * tiles_per_row + col / tile_width,
                row % tile_height,
                col % tile_width,
            ),
        };

        if !self.cache.contains_key(&chunk_index) {
            let Some(decoder) = self.decoder.as_mut() else {
                return Ok(None);
            };
            let (chunk_width, chunk_height) = decoder.chunk_dimensions();
            let (data_width, _) = decoder.chunk_data_dimensions(chunk_index);
            let values = decoded_values(decoder.read_chunk(chunk_index)?)?;
            let stride = if values.len() == chunk_width as usize * chunk_height as usize {
                chunk_width as usize
            } else {
                data_width as usize
            };
            self.cache.insert(chunk_index, Chunk { stride, values });
        }

        let chunk = &self.cache[&chunk_index];
        let position = local_row as usize * chunk.stride + local_col as usize;
        Ok(chunk.values.get(position).copied())
    }
}

fn catchment_id(value: f64) -> Option<i64> {
    if !value.is_finite() {
        return None;
    }
    let id = value.trunc() as i64;
    (id >= 0).then_some(id)
}

#[allow(unreachable_patterns)]
fn decoded_values(result: DecodingResult) -> Result<Vec<f64>, RasterError> {
    let values = match result {
        DecodingResult::U8(data) => data.into_iter().map(f64::from).collect(),
        DecodingResult::U16(data) => data.into_iter().map(f64::from).collect(),
        DecodingResult::U32(data) => data.into_iter().map(f64::from).collect(),
        DecodingResult::U64(data) => data.into_iter().map(|v| v as f64).collect(),
        DecodingResult::I8(data) => data.into_iter().map(f64::from).collect(),
        DecodingResult::I16(data) => data.into_iter().map(f64::from).collect(),
        DecodingResult::I32(data) => data.into_iter().map(f64::from).collect(),
        DecodingResult::I64(data) => data.into_iter().map(|v| v as f64).collect(),
        DecodingResult::F32(data) => data.into_iter().map(f64::from).collect(),
        DecodingResult::F64(data) => data,
        _ => return Err(RasterError::UnsupportedSampleFormat),
    };
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transform() -> GeoTransform {
        GeoTransform {
            origin_lon: -2.0,
            origin_lat: 52.0,
            pixel_width: 0.5,
            pixel_height: 0.5,
        }
    }

    #[test]
    fn pixel_lookup_is_floor_based_and_bounded() {
        let transform = transform();
        assert_eq!(transform.pixel(-2.0, 52.0, 4, 2), Some((0, 0)));
        assert_eq!(transform.pixel(-0.01, 51.49, 4, 2), Some((3, 1)));
        assert_eq!(transform.pixel(0.0, 51.5, 4, 2), None);
        assert_eq!(transform.pixel(-1.0, 52.01, 4, 2), None);
        assert_eq!(transform.pixel(f64::NAN, 51.5, 4, 2), None);
    }

    #[test]
    fn in_memory_sampler_rejects_negative_pixels() {
        let raster =
            CatchmentRaster::from_values(transform(), 2, 1, vec![17.0, -9999.0]).expect("raster");
        let mut sampler = raster.sampler().expect("sampler");

        assert_eq!(sampler.catchment_at(-1.9, 51.9).expect("sample"), Some(17));
        assert_eq!(sampler.catchment_at(-1.4, 51.9).expect("sample"), None);
        assert_eq!(sampler.catchment_at(5.0, 51.9).expect("sample"), None);
    }

    #[test]
    fn value_count_must_match_dimensions() {
        let error = CatchmentRaster::from_values(transform(), 2, 2, vec![1.0])
            .expect_err("size mismatch");
        assert!(matches!(
            error,
            RasterError::ValueCount {
                expected: 4,
                actual: 1
            }
        ));
    }
}
