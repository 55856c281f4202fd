// Classifier - SNR reporting views over the full record set
//
// Three independent views are built in one sequential pass after every sample
// has been processed:
//
// 1. Coarse counts: disjoint counters, [0,2) [2,5) [5,10) [10,inf) by default
// 2. Threshold manifests: snr < 5, snr < 10, snr >= 10 (overlapping on purpose,
//    the <5 list is a subset of the <10 list)
// 3. Fine bins: disjoint identifier lists, [0,2) ... [100,200) [200,inf)
//
// Negative ratios land in the lowest bin; unbounded ratios in the highest.

use serde::Serialize;

use super::types::{SnrRecord, SnrValue};
use crate::error::ConfigError;

/// Default coarse edges: [0,2) [2,5) [5,10) [10,inf)
pub const DEFAULT_COARSE_EDGES: [f64; 3] = [2.0, 5.0, 10.0];

/// Default fine edges: eight bins up to [200,inf)
pub const DEFAULT_FINE_EDGES: [f64; 7] = [2.0, 5.0, 10.0, 20.0, 50.0, 100.0, 200.0];

pub const DEFAULT_THRESHOLD_LOW: f64 = 5.0;
pub const DEFAULT_THRESHOLD_HIGH: f64 = 10.0;

/// Strictly increasing, finite interior edges; `n` edges give `n + 1` bins
#[derive(Debug, Clone, PartialEq)]
pub struct BinEdges {
    edges: Vec<f64>,
}

impl BinEdges {
    pub fn new(edges: Vec<f64>) -> Result<Self, ConfigError> {
        if edges.is_empty() {
            return Err(ConfigError::InvalidBinEdges {
                reason: "at least one edge is required".to_string(),
            });
        }
        if let Some(bad) = edges.iter().find(|e| !e.is_finite()) {
            return Err(ConfigError::InvalidBinEdges {
                reason: format!("edge {} is not finite", bad),
            });
        }
        if edges.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(ConfigError::InvalidBinEdges {
                reason: format!("edges must be strictly increasing: {:?}", edges),
            });
        }
        Ok(Self { edges })
    }

    pub fn edges(&self) -> &[f64] {
        &self.edges
    }

    pub fn bin_count(&self) -> usize {
        self.edges.len() + 1
    }

    /// Index of the half-open bin `[lower, upper)` holding `snr`
    pub fn bin_index(&self, snr: SnrValue) -> usize {
        match snr {
            SnrValue::Finite(value) => self.edges.partition_point(|&edge| edge <= value),
            SnrValue::Unbounded => self.edges.len(),
        }
    }

    /// Lower bound of bin `index`, `None` for the open lowest bin
    pub fn lower(&self, index: usize) -> Option<f64> {
        index.checked_sub(1).and_then(|i| self.edges.get(i).copied())
    }

    /// Upper bound of bin `index`, `None` for the open highest bin
    pub fn upper(&self, index: usize) -> Option<f64> {
        self.edges.get(index).copied()
    }

    /// Human label: `0-2`, `2-5`, ..., `200+`
    pub fn label(&self, index: usize) -> String {
        match (self.lower(index), self.upper(index)) {
            (None, Some(upper)) => format!("0-{}", upper),
            (Some(lower), Some(upper)) => format!("{}-{}", lower, upper),
            (Some(lower), None) => format!("{}+", lower),
            (None, None) => "all".to_string(),
        }
    }
}

/// One coarse counter
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BinCount {
    pub label: String,
    pub count: usize,
}

/// One fine bin with its members
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnrBin {
    pub label: String,
    pub lower: Option<f64>,
    pub upper: Option<f64>,
    pub members: Vec<String>,
}

/// Threshold lists kept for comparison with other pipelines' SNR cuts
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThresholdManifests {
    pub low: f64,
    pub high: f64,
    /// snr < low
    pub below_low: Vec<String>,
    /// snr < high
    pub below_high: Vec<String>,
    /// snr >= high
    pub at_or_above_high: Vec<String>,
}

/// All three views, keyed by sample identifier in record order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationTables {
    pub coarse: Vec<BinCount>,
    pub thresholds: ThresholdManifests,
    pub fine: Vec<SnrBin>,
}

impl ClassificationTables {
    /// Records that landed in the coarse counters
    pub fn classified_count(&self) -> usize {
        self.coarse.iter().map(|bin| bin.count).sum()
    }

    pub fn fine_bin(&self, label: &str) -> Option<&SnrBin> {
        self.fine.iter().find(|bin| bin.label == label)
    }
}

/// Builds [`ClassificationTables`] from processed records
#[derive(Debug, Clone, PartialEq)]
pub struct ResultClassifier {
    coarse: BinEdges,
    fine: BinEdges,
    threshold_low: f64,
    threshold_high: f64,
}

impl Default for ResultClassifier {
    fn default() -> Self {
        Self {
            coarse: BinEdges {
                edges: DEFAULT_COARSE_EDGES.to_vec(),
            },
            fine: BinEdges {
                edges: DEFAULT_FINE_EDGES.to_vec(),
            },
            threshold_low: DEFAULT_THRESHOLD_LOW,
            threshold_high: DEFAULT_THRESHOLD_HIGH,
        }
    }
}

impl ResultClassifier {
    pub fn new(
        coarse: BinEdges,
        fine: BinEdges,
        threshold_low: f64,
        threshold_high: f64,
    ) -> Result<Self, ConfigError> {
        if !threshold_low.is_finite() || !threshold_high.is_finite() {
            return Err(ConfigError::InvalidBinEdges {
                reason: "thresholds must be finite".to_string(),
            });
        }
        if threshold_low > threshold_high {
            return Err(ConfigError::InvalidBinEdges {
                reason: format!(
                    "low threshold {} exceeds high threshold {}",
                    threshold_low, threshold_high
                ),
            });
        }
        Ok(Self {
            coarse,
            fine,
            threshold_low,
            threshold_high,
        })
    }

    pub fn coarse_edges(&self) -> &BinEdges {
        &self.coarse
    }

    pub fn fine_edges(&self) -> &BinEdges {
        &self.fine
    }

    pub fn thresholds(&self) -> (f64, f64) {
        (self.threshold_low, self.threshold_high)
    }

    /// Single pass over `records`, filling every view
    pub fn classify(&self, records: &[SnrRecord]) -> ClassificationTables {
        let mut coarse: Vec<BinCount> = (0..self.coarse.bin_count())
            .map(|i| BinCount {
                label: self.coarse.label(i),
                count: 0,
            })
            .collect();

        let mut fine: Vec<SnrBin> = (0..self.fine.bin_count())
            .map(|i| SnrBin {
                label: self.fine.label(i),
                lower: self.fine.lower(i),
                upper: self.fine.upper(i),
                members: Vec::new(),
            })
            .collect();

        let mut thresholds = ThresholdManifests {
            low: self.threshold_low,
            high: self.threshold_high,
            below_low: Vec::new(),
            below_high: Vec::new(),
            at_or_above_high: Vec::new(),
        };

        for record in records {
            let id = &record.sample_identifier;
            let snr = record.snr.as_f64();

            coarse[self.coarse.bin_index(record.snr)].count += 1;
            fine[self.fine.bin_index(record.snr)].members.push(id.clone());

            if snr < self.threshold_low {
                thresholds.below_low.push(id.clone());
            }
            if snr < self.threshold_high {
                thresholds.below_high.push(id.clone());
            } else {
                thresholds.at_or_above_high.push(id.clone());
            }
        }

        ClassificationTables {
            coarse,
            thresholds,
            fine,
        }
    }
}

#[cfg(test)]
#[path = "classifier_tests.rs"]
mod tests;
