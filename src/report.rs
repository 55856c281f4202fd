// Report module - writes a batch outcome to disk
//
// Output layout (one directory per run):
// - images_to_snr.json          image key -> SNR ("inf" when unbounded)
// - json_snr_list.txt           "<identifier> <snr>" per record
// - snr_less_<lo>.txt           threshold manifests
// - snr_less_<hi>.txt
// - snr_more_<hi>.txt
// - snr_<label>.txt             one per fine bin (snr_0-2.txt ... snr_200+.txt)
// - summary.json                totals, coarse counts, failures

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Serialize, Serializer};

use crate::analysis::{SnrRecord, SnrValue};
use crate::batch::BatchOutcome;

/// Image key -> SNR in sample-list order
///
/// A key seen twice keeps its first position and takes the later value.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageSnrMap<'a> {
    entries: Vec<(&'a str, SnrValue)>,
}

impl<'a> ImageSnrMap<'a> {
    pub fn from_records(records: &'a [SnrRecord]) -> Self {
        let mut entries: Vec<(&'a str, SnrValue)> = Vec::with_capacity(records.len());
        let mut positions: HashMap<&'a str, usize> = HashMap::new();

        for record in records {
            let key = record.image_key.as_str();
            match positions.get(key) {
                Some(&index) => {
                    log::warn!(
                        "[Report] Duplicate image key {}, keeping SNR of {}",
                        key,
                        record.sample_identifier
                    );
                    entries[index].1 = record.snr;
                }
                None => {
                    positions.insert(key, entries.len());
                    entries.push((key, record.snr));
                }
            }
        }
        Self { entries }
    }

    pub fn entries(&self) -> &[(&'a str, SnrValue)] {
        &self.entries
    }
}

impl Serialize for ImageSnrMap<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.entries.iter().map(|(key, snr)| (key, snr)))
    }
}

/// Writes report files into one output directory
#[derive(Debug, Clone)]
pub struct ReportWriter {
    output_dir: PathBuf,
}

impl ReportWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Write every report file, returning the paths in write order
    pub fn write(&self, outcome: &BatchOutcome) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(&self.output_dir).with_context(|| {
            format!("creating output directory {}", self.output_dir.display())
        })?;
        let mut written = Vec::new();

        let images_to_snr = ImageSnrMap::from_records(&outcome.records);
        written.push(self.write_file(
            "images_to_snr.json",
            serde_json::to_string_pretty(&images_to_snr)?,
        )?);

        let snr_list: Vec<String> = outcome
            .records
            .iter()
            .map(|record| format!("{} {}", record.sample_identifier, record.snr))
            .collect();
        written.push(self.write_file("json_snr_list.txt", lines(&snr_list))?);

        let thresholds = &outcome.tables.thresholds;
        for (name, members) in [
            (format!("snr_less_{}.txt", thresholds.low), &thresholds.below_low),
            (format!("snr_less_{}.txt", thresholds.high), &thresholds.below_high),
            (
                format!("snr_more_{}.txt", thresholds.high),
                &thresholds.at_or_above_high,
            ),
        ] {
            written.push(self.write_file(&name, lines(members))?);
        }

        for bin in &outcome.tables.fine {
            let name = format!("snr_{}.txt", bin.label);
            written.push(self.write_file(&name, lines(&bin.members))?);
        }

        written.push(self.write_file(
            "summary.json",
            serde_json::to_string_pretty(&outcome.summary())?,
        )?);

        log::info!(
            "[Report] Wrote {} files to {}",
            written.len(),
            self.output_dir.display()
        );
        Ok(written)
    }

    fn write_file(&self, name: &str, contents: String) -> Result<PathBuf> {
        let path = self.output_dir.join(name);
        fs::write(&path, contents).with_context(|| format!("writing {}", path.display()))?;
        Ok(path)
    }
}

/// Newline-terminated lines, empty string for no entries
fn lines(entries: &[String]) -> String {
    entries.iter().map(|entry| format!("{entry}\n")).collect()
}
