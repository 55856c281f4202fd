// Types module - data model shared by the SNR pipeline stages

use std::fmt;

use ndarray::Array2;
use serde::{Serialize, Serializer};

use super::flux::BeamGeometry;
use super::mask::ObjectMask;

/// Image intensities, shape (rows, cols)
pub type Image = Array2<f64>;

/// One labelled image handed to the pipeline
///
/// Masks whose source files were missing are simply not present, so the mask
/// list may be shorter than the object list of the original label.
#[derive(Debug, Clone)]
pub struct Sample {
    /// Opaque identifier (the label file path when loaded from disk)
    pub identifier: String,
    /// Key for the per-image SNR mapping; falls back to `identifier`
    pub image_key: Option<String>,
    pub image: Image,
    pub masks: Vec<ObjectMask>,
    /// Header geometry, present when integrated flux is wanted
    pub beam: Option<BeamGeometry>,
}

impl Sample {
    pub fn new(identifier: impl Into<String>, image: Image) -> Self {
        Self {
            identifier: identifier.into(),
            image_key: None,
            image,
            masks: Vec::new(),
            beam: None,
        }
    }

    pub fn with_mask(mut self, mask: ObjectMask) -> Self {
        self.masks.push(mask);
        self
    }

    pub fn with_masks(mut self, masks: Vec<ObjectMask>) -> Self {
        self.masks = masks;
        self
    }

    pub fn with_image_key(mut self, key: impl Into<String>) -> Self {
        self.image_key = Some(key.into());
        self
    }

    pub fn with_beam(mut self, beam: BeamGeometry) -> Self {
        self.beam = Some(beam);
        self
    }

    pub fn output_key(&self) -> &str {
        self.image_key.as_deref().unwrap_or(&self.identifier)
    }
}

/// Signal-to-noise ratio of one sample
///
/// `Unbounded` only appears when the zero-noise policy asks for it; it sorts
/// above every finite value and serializes as the string `"inf"`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SnrValue {
    Finite(f64),
    Unbounded,
}

impl SnrValue {
    pub fn as_f64(&self) -> f64 {
        match self {
            SnrValue::Finite(value) => *value,
            SnrValue::Unbounded => f64::INFINITY,
        }
    }

    pub fn is_unbounded(&self) -> bool {
        matches!(self, SnrValue::Unbounded)
    }
}

impl fmt::Display for SnrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnrValue::Finite(value) => write!(f, "{}", value),
            SnrValue::Unbounded => write!(f, "inf"),
        }
    }
}

impl Serialize for SnrValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            SnrValue::Finite(value) => serializer.serialize_f64(*value),
            SnrValue::Unbounded => serializer.serialize_str("inf"),
        }
    }
}

/// Result of processing one sample
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnrRecord {
    pub sample_identifier: String,
    pub image_key: String,
    pub background_noise: f64,
    pub peak_flux: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub integrated_flux: Option<f64>,
    pub snr: SnrValue,
}
