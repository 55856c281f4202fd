// Mask module - per-object masks and their union
//
// Source masks carry arbitrary label values; any nonzero label marks an object
// pixel. The combined mask is the logical OR of every available object mask and
// splits the image into the object population (true) and the background
// population (false).

use ndarray::{Array2, Zip};

use super::types::Image;
use crate::error::SampleError;

/// Boolean footprint of one detected object
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectMask {
    pixels: Array2<bool>,
}

impl ObjectMask {
    /// Convert a label grid, treating every nonzero label as an object pixel
    pub fn from_labels<T: PartialEq + Default>(labels: &Array2<T>) -> Self {
        let zero = T::default();
        Self {
            pixels: labels.map(|label| *label != zero),
        }
    }

    pub fn from_pixels(pixels: Array2<bool>) -> Self {
        Self { pixels }
    }

    pub fn shape(&self) -> (usize, usize) {
        self.pixels.dim()
    }

    pub fn pixels(&self) -> &Array2<bool> {
        &self.pixels
    }

    pub fn pixel_count(&self) -> usize {
        self.pixels.iter().filter(|&&p| p).count()
    }
}

/// Union of all object masks of one image
#[derive(Debug, Clone, PartialEq)]
pub struct CombinedMask {
    pixels: Array2<bool>,
}

impl CombinedMask {
    /// All-false mask (no objects known)
    pub fn empty(shape: (usize, usize)) -> Self {
        Self {
            pixels: Array2::from_elem(shape, false),
        }
    }

    pub fn shape(&self) -> (usize, usize) {
        self.pixels.dim()
    }

    pub fn pixels(&self) -> &Array2<bool> {
        &self.pixels
    }

    pub fn is_object(&self, row: usize, col: usize) -> bool {
        self.pixels.get((row, col)).copied().unwrap_or(false)
    }

    pub fn has_objects(&self) -> bool {
        self.pixels.iter().any(|&p| p)
    }

    pub fn object_count(&self) -> usize {
        self.pixels.iter().filter(|&&p| p).count()
    }

    pub fn background_count(&self) -> usize {
        self.pixels.len() - self.object_count()
    }

    /// Fail unless the image shares this mask's grid
    pub fn check_image(&self, image: &Image) -> Result<(), SampleError> {
        if image.dim() != self.shape() {
            return Err(SampleError::ShapeMismatch {
                expected: image.dim(),
                found: self.shape(),
            });
        }
        Ok(())
    }

    /// Finite intensities of pixels outside every object
    pub fn background_values(&self, image: &Image) -> Result<Vec<f64>, SampleError> {
        self.check_image(image)?;
        Ok(self.select(image, false))
    }

    /// Finite intensities of pixels inside at least one object
    pub fn object_values(&self, image: &Image) -> Result<Vec<f64>, SampleError> {
        self.check_image(image)?;
        Ok(self.select(image, true))
    }

    fn select(&self, image: &Image, object: bool) -> Vec<f64> {
        image
            .iter()
            .zip(self.pixels.iter())
            .filter(|&(value, &is_object)| is_object == object && value.is_finite())
            .map(|(&value, _)| value)
            .collect()
    }

    fn union_with(&mut self, mask: &ObjectMask) {
        Zip::from(&mut self.pixels)
            .and(mask.pixels())
            .for_each(|acc, &m| *acc |= m);
    }
}

/// Folds object masks into a [`CombinedMask`]
pub struct MaskAggregator;

impl MaskAggregator {
    /// OR every mask into an all-false accumulator of the image's shape
    ///
    /// An empty sequence yields an all-false mask. A mask whose shape differs
    /// from `shape` fails the whole sample.
    pub fn combine<'a, I>(shape: (usize, usize), masks: I) -> Result<CombinedMask, SampleError>
    where
        I: IntoIterator<Item = &'a ObjectMask>,
    {
        let mut combined = CombinedMask::empty(shape);
        for mask in masks {
            if mask.shape() != shape {
                return Err(SampleError::ShapeMismatch {
                    expected: shape,
                    found: mask.shape(),
                });
            }
            combined.union_with(mask);
        }
        Ok(combined)
    }
}
