// Flux module - object flux from the combined mask
//
// Peak flux is the brightest finite pixel inside the combined mask. When header
// geometry is available the summed object flux is also converted to an
// integrated flux through the beam area.

use serde::{Deserialize, Serialize};

use super::mask::CombinedMask;
use super::types::Image;
use crate::error::SampleError;

/// Pixel scale and beam extents read from the image header
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BeamGeometry {
    #[serde(alias = "CDELT1")]
    pub pixel_scale_x: f64,
    #[serde(alias = "CDELT2")]
    pub pixel_scale_y: f64,
    #[serde(alias = "BMAJ")]
    pub beam_major: f64,
    #[serde(alias = "BMIN")]
    pub beam_minor: f64,
}

impl BeamGeometry {
    pub fn new(pixel_scale_x: f64, pixel_scale_y: f64, beam_major: f64, beam_minor: f64) -> Self {
        Self {
            pixel_scale_x,
            pixel_scale_y,
            beam_major,
            beam_minor,
        }
    }

    pub fn validate(&self) -> Result<(), SampleError> {
        let fields = [
            ("pixel_scale_x", self.pixel_scale_x),
            ("pixel_scale_y", self.pixel_scale_y),
            ("beam_major", self.beam_major),
            ("beam_minor", self.beam_minor),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value == 0.0 {
                return Err(SampleError::InvalidBeamGeometry {
                    reason: format!("{} must be finite and nonzero (got {})", name, value),
                });
            }
        }
        Ok(())
    }

    /// `(pixel_scale_x * pixel_scale_y) / (beam_major * beam_minor)`
    pub fn beam_area(&self) -> Result<f64, SampleError> {
        self.validate()?;
        Ok((self.pixel_scale_x * self.pixel_scale_y) / (self.beam_major * self.beam_minor))
    }

    /// Convert a pixel-summed flux into integrated flux
    pub fn integrate(&self, flux_sum: f64) -> Result<f64, SampleError> {
        Ok(flux_sum / self.beam_area()?)
    }
}

/// Flux measured over the object population of one sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FluxMeasurement {
    pub peak_flux: f64,
    pub flux_sum: f64,
    pub object_pixels: usize,
    pub integrated_flux: Option<f64>,
}

/// Maximum finite intensity among object pixels
///
/// Background pixels are never considered; an empty object population is
/// reported instead of falling back to the whole image.
pub fn peak_flux(image: &Image, mask: &CombinedMask) -> Result<f64, SampleError> {
    mask.object_values(image)?
        .into_iter()
        .reduce(f64::max)
        .ok_or(SampleError::UndefinedPeakFlux)
}

/// Peak, summed and (with geometry) integrated flux in one pass over the mask
pub fn measure_flux(
    image: &Image,
    mask: &CombinedMask,
    beam: Option<&BeamGeometry>,
) -> Result<FluxMeasurement, SampleError> {
    let objects = mask.object_values(image)?;
    let peak_flux = objects
        .iter()
        .copied()
        .reduce(f64::max)
        .ok_or(SampleError::UndefinedPeakFlux)?;
    let flux_sum: f64 = objects.iter().sum();

    let integrated_flux = match beam {
        Some(geometry) => Some(geometry.integrate(flux_sum)?),
        None => None,
    };

    Ok(FluxMeasurement {
        peak_flux,
        flux_sum,
        object_pixels: objects.len(),
        integrated_flux,
    })
}
