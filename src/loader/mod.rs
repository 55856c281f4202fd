// Loader module - sample lists, label documents and pixel files
//
// Everything that knows about the dataset's directory conventions lives here.
// The rest of the crate only sees fully-populated `Sample` values.

pub mod label;
pub mod source;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::analysis::Sample;
use crate::error::SampleError;

pub use label::{output_key, resolve_image_path, resolve_mask_path, ObjectLabel, SampleLabel};
pub use source::{write_array, JsonArraySource, PixelSource};

/// Prefix substitution applied to sample-list entries
///
/// Lets a list written on one machine be replayed on another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathRewrite {
    pub from: String,
    pub to: String,
}

impl PathRewrite {
    pub fn apply(&self, line: &str) -> String {
        match line.strip_prefix(self.from.as_str()) {
            Some(rest) => format!("{}{}", self.to, rest),
            None => line.to_string(),
        }
    }
}

/// Read one label path per line, skipping blank lines
pub fn read_sample_list(path: &Path, rewrite: Option<&PathRewrite>) -> Result<Vec<PathBuf>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read sample list {}", path.display()))?;

    let labels: Vec<PathBuf> = contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| match rewrite {
            Some(rewrite) => PathBuf::from(rewrite.apply(line)),
            None => PathBuf::from(line),
        })
        .map(|path| label::normalize(&path))
        .collect();

    log::info!(
        "[Loader] Collected {} label paths from {}",
        labels.len(),
        path.display()
    );
    Ok(labels)
}

/// Builds [`Sample`]s from label files through a [`PixelSource`]
pub struct SampleLoader<S: PixelSource> {
    source: S,
    output_root_marker: Option<String>,
}

impl<S: PixelSource> SampleLoader<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            output_root_marker: None,
        }
    }

    pub fn with_output_root_marker(mut self, marker: Option<String>) -> Self {
        self.output_root_marker = marker;
        self
    }

    /// Load the label at `label_path` with its image and every mask found
    ///
    /// A missing image fails the sample; a missing mask is skipped with a
    /// warning so the remaining objects still count.
    pub fn load(&self, label_path: &Path) -> Result<Sample, SampleError> {
        let identifier = label_path.display().to_string();

        let contents = fs::read_to_string(label_path).map_err(|err| SampleError::LoadFailed {
            path: identifier.clone(),
            reason: err.to_string(),
        })?;
        let label = SampleLabel::from_json(&contents).map_err(|err| SampleError::LoadFailed {
            path: identifier.clone(),
            reason: err.to_string(),
        })?;

        let image_path = resolve_image_path(label_path, &label.img);
        if !image_path.is_file() {
            return Err(SampleError::MissingImage {
                path: image_path.display().to_string(),
            });
        }
        let image = self
            .source
            .read_image(&image_path)
            .map_err(|err| load_failed(&image_path, err))?;

        let mut masks = Vec::with_capacity(label.objs.len());
        for object in &label.objs {
            let mask_path = resolve_mask_path(&image_path, &object.mask);
            match self.source.read_mask(&mask_path) {
                Ok(mask) => masks.push(mask),
                Err(_) if is_missing(&mask_path) => {
                    log::warn!(
                        "[Loader] File {} not found on disk, skipping mask",
                        mask_path.display()
                    );
                }
                Err(err) => return Err(load_failed(&mask_path, err)),
            }
        }

        let key = output_key(&image_path, self.output_root_marker.as_deref());
        let mut sample = Sample::new(identifier, image)
            .with_masks(masks)
            .with_image_key(key);
        if let Some(beam) = label.beam {
            sample = sample.with_beam(beam);
        }
        Ok(sample)
    }
}

fn is_missing(path: &Path) -> bool {
    matches!(fs::metadata(path), Err(err) if err.kind() == io::ErrorKind::NotFound)
}

fn load_failed(path: &Path, err: anyhow::Error) -> SampleError {
    SampleError::LoadFailed {
        path: path.display().to_string(),
        reason: format!("{err:#}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::Image;
    use ndarray::Array2;

    /// Lay out `<root>/s1/{labels,imgs,masks}` with one 4x4 image
    fn dataset(name: &str) -> PathBuf {
        let root = std::env::temp_dir().join(format!(
            "astro_snr_loader_{}_{}",
            name,
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&root);
        for dir in ["labels", "imgs", "masks"] {
            fs::create_dir_all(root.join("s1").join(dir)).unwrap();
        }
        let image = Image::from_shape_fn((4, 4), |(r, c)| (r * 4 + c) as f64);
        write_array(&root.join("s1/imgs/a.json"), &image).unwrap();

        let mut mask = Array2::<f64>::zeros((4, 4));
        mask[(3, 3)] = 1.0;
        write_array(&root.join("s1/masks/a_obj1.json"), &mask).unwrap();
        root
    }

    fn write_label(root: &Path, contents: &str) -> PathBuf {
        let path = root.join("s1/labels/a.json");
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_sample_list_skips_blank_lines_and_rewrites() {
        let root = dataset("list");
        let list = root.join("samples.dat");
        fs::write(&list, "/old/s1/labels/a.json\n\n  /old/s2/labels/b.json  \n").unwrap();

        let rewrite = PathRewrite {
            from: "/old".to_string(),
            to: "/new".to_string(),
        };
        let paths = read_sample_list(&list, Some(&rewrite)).unwrap();
        assert_eq!(
            paths,
            vec![
                PathBuf::from("/new/s1/labels/a.json"),
                PathBuf::from("/new/s2/labels/b.json")
            ]
        );

        let unchanged = read_sample_list(&list, None).unwrap();
        assert_eq!(unchanged[0], PathBuf::from("/old/s1/labels/a.json"));
    }

    #[test]
    fn test_missing_sample_list_is_an_error() {
        let err = read_sample_list(Path::new("/nonexistent/samples.dat"), None).unwrap_err();
        assert!(err.to_string().contains("Failed to read sample list"));
    }

    #[test]
    fn test_load_resolves_image_and_masks() {
        let root = dataset("load");
        let label = write_label(
            &root,
            r#"{"img": "../imgs/a.json", "objs": [{"mask": "a_obj1.json"}]}"#,
        );

        let sample = SampleLoader::new(JsonArraySource)
            .with_output_root_marker(Some("s1".to_string()))
            .load(&label)
            .unwrap();

        assert_eq!(sample.identifier, label.display().to_string());
        assert_eq!(sample.output_key(), "s1/imgs/a.json");
        assert_eq!(sample.image.dim(), (4, 4));
        assert_eq!(sample.masks.len(), 1);
        assert_eq!(sample.masks[0].pixel_count(), 1);
    }

    #[test]
    fn test_missing_mask_is_skipped() {
        let root = dataset("mask");
        let label = write_label(
            &root,
            r#"{"img": "../imgs/a.json", "objs": [{"mask": "gone.json"}, {"mask": "a_obj1.json"}]}"#,
        );

        let sample = SampleLoader::new(JsonArraySource).load(&label).unwrap();
        assert_eq!(sample.masks.len(), 1);
    }

    #[test]
    fn test_missing_image_fails_sample() {
        let root = dataset("image");
        let label = write_label(&root, r#"{"img": "../imgs/missing.json", "objs": []}"#);

        match SampleLoader::new(JsonArraySource).load(&label) {
            Err(SampleError::MissingImage { path }) => assert!(path.ends_with("missing.json")),
            other => panic!("expected MissingImage, got {other:?}"),
        }
    }

    #[test]
    fn test_corrupt_mask_fails_sample() {
        let root = dataset("corrupt");
        fs::write(root.join("s1/masks/bad.json"), "not json").unwrap();
        let label = write_label(&root, r#"{"img": "../imgs/a.json", "objs": [{"mask": "bad.json"}]}"#);

        assert!(matches!(
            SampleLoader::new(JsonArraySource).load(&label),
            Err(SampleError::LoadFailed { .. })
        ));
    }

    #[test]
    fn test_malformed_label_fails_sample() {
        let root = dataset("label");
        let label = write_label(&root, r#"{"objs": []}"#);

        assert!(matches!(
            SampleLoader::new(JsonArraySource).load(&label),
            Err(SampleError::LoadFailed { .. })
        ));
    }
}
