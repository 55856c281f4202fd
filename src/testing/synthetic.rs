//! Deterministic synthetic sky images for tests and smoke runs.
//!
//! Images are pure Gaussian background of a known sigma with an optional
//! point source of `k * sigma` at the centre, so the expected SNR is `k` by
//! construction. Everything is seeded through `StdRng`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ndarray::Array2;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde_json::json;

use crate::analysis::{BeamGeometry, Image, ObjectMask, Sample};
use crate::loader::write_array;

/// Source strengths (in units of sigma) cycled through by [`write_dataset`]
pub const SOURCE_STRENGTHS: [f64; 8] = [1.5, 3.0, 7.0, 15.0, 30.0, 75.0, 150.0, 300.0];

/// Parameters of a synthetic dataset
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticDataset {
    /// Images are `size x size`
    pub size: usize,
    /// Background standard deviation
    pub sigma: f64,
    pub seed: u64,
    /// Header geometry written into every label
    pub beam: Option<BeamGeometry>,
}

impl Default for SyntheticDataset {
    fn default() -> Self {
        Self {
            size: 64,
            sigma: 1.0,
            seed: 42,
            beam: None,
        }
    }
}

/// Standard normal draw (Box-Muller)
fn standard_normal(rng: &mut StdRng) -> f64 {
    // 1 - gen() keeps u1 in (0, 1] so ln(u1) is finite
    let u1: f64 = 1.0 - rng.gen::<f64>();
    let u2: f64 = rng.gen::<f64>();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

/// Zero-mean Gaussian background
pub fn gaussian_noise_image(shape: (usize, usize), sigma: f64, seed: u64) -> Image {
    let mut rng = StdRng::seed_from_u64(seed);
    Array2::from_shape_simple_fn(shape, || sigma * standard_normal(&mut rng))
}

/// `size x size` Gaussian image with one `k * sigma` pixel at the centre,
/// masked by a single-pixel object mask
pub fn single_source_sample(
    identifier: impl Into<String>,
    size: usize,
    sigma: f64,
    k: f64,
    seed: u64,
) -> Sample {
    let centre = (size / 2, size / 2);
    let mut image = gaussian_noise_image((size, size), sigma, seed);
    image[centre] = sigma * k;

    let mut pixels = Array2::from_elem((size, size), false);
    pixels[centre] = true;
    Sample::new(identifier, image).with_mask(ObjectMask::from_pixels(pixels))
}

/// Write `count` samples under `dir` in the on-disk dataset layout
///
/// Each sample gets `sample<i>/{labels,imgs,masks}` with a 3x3 object mask
/// around the source. Returns the path of the generated sample list.
pub fn write_dataset(dir: &Path, count: usize, dataset: &SyntheticDataset) -> Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let mut labels = Vec::with_capacity(count);

    for i in 0..count {
        let name = format!("sample{i}");
        let sample_dir = dir.join(&name);
        for sub in ["labels", "imgs", "masks"] {
            fs::create_dir_all(sample_dir.join(sub))
                .with_context(|| format!("creating {}", sample_dir.join(sub).display()))?;
        }

        let k = SOURCE_STRENGTHS[i % SOURCE_STRENGTHS.len()];
        let seed = dataset.seed.wrapping_add(i as u64);
        let size = dataset.size.max(3);
        let centre = size / 2;

        let mut image = gaussian_noise_image((size, size), dataset.sigma, seed);
        image[(centre, centre)] = dataset.sigma * k;
        write_array(&sample_dir.join("imgs").join(format!("{name}.json")), &image)?;

        let mask = Array2::from_shape_fn((size, size), |(r, c)| {
            if r.abs_diff(centre) <= 1 && c.abs_diff(centre) <= 1 {
                1.0
            } else {
                0.0
            }
        });
        let mask_name = format!("{name}_obj1.json");
        write_array(&sample_dir.join("masks").join(&mask_name), &mask)?;

        let mut label = json!({
            "img": format!("../imgs/{name}.json"),
            "objs": [{ "mask": mask_name, "class": "source" }],
            "injected_snr": k,
        });
        if let Some(beam) = &dataset.beam {
            label["beam"] = serde_json::to_value(beam)?;
        }
        let label_path = sample_dir.join("labels").join(format!("{name}.json"));
        fs::write(&label_path, serde_json::to_string_pretty(&label)?)
            .with_context(|| format!("writing {}", label_path.display()))?;
        labels.push(label_path.display().to_string());
    }

    let list_path = dir.join("samples.dat");
    let mut contents = labels.join("\n");
    contents.push('\n');
    fs::write(&list_path, contents).with_context(|| format!("writing {}", list_path.display()))?;

    log::info!(
        "[Synth] Wrote {} samples and {}",
        count,
        list_path.display()
    );
    Ok(list_path)
}
