// Pixel sources - decoding image and mask files into arrays
//
// The pipeline only sees `Image` and `ObjectMask`; the on-disk encoding sits
// behind `PixelSource`. The shipped source reads 2-D JSON arrays, either bare
// (`[[1.0, 2.0], ...]`) or wrapped (`{"data": [[...]]}`). `null` stands for a
// blank pixel: NaN in images, background in masks.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use ndarray::Array2;
use serde::Deserialize;

use crate::analysis::{Image, ObjectMask};

/// Decodes pixel grids from files
pub trait PixelSource: Send + Sync {
    fn read_image(&self, path: &Path) -> Result<Image>;

    fn read_mask(&self, path: &Path) -> Result<ObjectMask>;
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ArrayDocument {
    Bare(Vec<Vec<Option<f64>>>),
    Wrapped { data: Vec<Vec<Option<f64>>> },
}

impl ArrayDocument {
    fn into_rows(self) -> Vec<Vec<Option<f64>>> {
        match self {
            ArrayDocument::Bare(rows) | ArrayDocument::Wrapped { data: rows } => rows,
        }
    }
}

/// Reads images and masks stored as JSON 2-D arrays
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonArraySource;

impl JsonArraySource {
    fn read_grid(path: &Path, blank: f64) -> Result<Array2<f64>> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let document: ArrayDocument = serde_json::from_str(&contents)
            .with_context(|| format!("{} is not a 2-D JSON array", path.display()))?;
        to_array(document.into_rows(), blank)
            .with_context(|| format!("Invalid pixel grid in {}", path.display()))
    }
}

impl PixelSource for JsonArraySource {
    fn read_image(&self, path: &Path) -> Result<Image> {
        Self::read_grid(path, f64::NAN)
    }

    fn read_mask(&self, path: &Path) -> Result<ObjectMask> {
        let labels = Self::read_grid(path, 0.0)?;
        Ok(ObjectMask::from_labels(&labels))
    }
}

fn to_array(rows: Vec<Vec<Option<f64>>>, blank: f64) -> Result<Array2<f64>> {
    let height = rows.len();
    let width = rows.first().map_or(0, Vec::len);
    if height == 0 || width == 0 {
        bail!("pixel grid is empty");
    }
    if let Some((index, row)) = rows.iter().enumerate().find(|(_, row)| row.len() != width) {
        bail!(
            "row {} has {} columns, expected {}",
            index,
            row.len(),
            width
        );
    }

    let values: Vec<f64> = rows
        .into_iter()
        .flatten()
        .map(|value| value.unwrap_or(blank))
        .collect();
    Ok(Array2::from_shape_vec((height, width), values)?)
}

/// Write `array` as a bare JSON 2-D array (non-finite values become `null`)
pub fn write_array(path: &Path, array: &Array2<f64>) -> Result<()> {
    let rows: Vec<Vec<Option<f64>>> = array
        .rows()
        .into_iter()
        .map(|row| {
            row.iter()
                .map(|&v| if v.is_finite() { Some(v) } else { None })
                .collect()
        })
        .collect();
    let json = serde_json::to_string(&rows)?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
}
