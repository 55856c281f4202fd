// Label module - per-image label documents and dataset path conventions
//
// A label names one image and the mask files of the objects detected in it.
// Paths inside labels are relative to the dataset layout:
//
//   <sample>/labels/<name>.json   label
//   <sample>/imgs/<name>.fits     image  ("img": "../imgs/<name>.fits")
//   <sample>/masks/<mask>         masks  ("objs": [{"mask": "<mask>"}])

use std::path::{Component, Path, PathBuf};

use serde::Deserialize;

use crate::analysis::BeamGeometry;

/// One object entry; fields other than `mask` are ignored
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ObjectLabel {
    pub mask: String,
}

/// Label document as stored next to each image
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SampleLabel {
    pub img: String,
    #[serde(default)]
    pub objs: Vec<ObjectLabel>,
    #[serde(default)]
    pub beam: Option<BeamGeometry>,
}

impl SampleLabel {
    pub fn from_json(contents: &str) -> serde_json::Result<Self> {
        serde_json::from_str(contents)
    }
}

/// Resolve the `img` field of the label stored at `label_path`
///
/// A leading `..` refers to the directory two levels above the label file
/// (the sample directory). Other relative paths are taken relative to the
/// label's own directory; absolute paths are used as-is.
pub fn resolve_image_path(label_path: &Path, img: &str) -> PathBuf {
    let img = Path::new(img);
    if img.is_absolute() {
        return normalize(img);
    }

    let label_dir = label_path.parent().unwrap_or_else(|| Path::new(""));
    let mut components = img.components();
    let resolved = match components.next() {
        Some(Component::ParentDir) => label_dir
            .parent()
            .unwrap_or_else(|| Path::new(""))
            .join(components.as_path()),
        _ => label_dir.join(img),
    };
    normalize(&resolved)
}

/// `<image grandparent>/masks/<mask>`
pub fn resolve_mask_path(image_path: &Path, mask: &str) -> PathBuf {
    let sample_dir = image_path
        .parent()
        .and_then(Path::parent)
        .unwrap_or_else(|| Path::new(""));
    sample_dir.join("masks").join(mask)
}

/// Key under which an image's SNR is reported
///
/// With a marker, the suffix of `image_path` starting at the first component
/// equal to it; without one (or when absent), the full path.
pub fn output_key(image_path: &Path, marker: Option<&str>) -> String {
    if let Some(marker) = marker {
        let components: Vec<Component> = image_path.components().collect();
        if let Some(start) = components
            .iter()
            .position(|c| c.as_os_str() == marker)
        {
            let suffix: PathBuf = components[start..].iter().collect();
            return suffix.display().to_string();
        }
    }
    image_path.display().to_string()
}

/// Lexically drop `.` and fold `..` into the preceding component
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let folded = matches!(
                    out.components().next_back(),
                    Some(Component::Normal(_))
                );
                if folded {
                    out.pop();
                } else if !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
