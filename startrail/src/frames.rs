//! Frame enumeration.

use std::path::{Path, PathBuf};

use common::file_utils::{files_with_extensions, has_extension};
use serde::{Deserialize, Serialize};
use strum_macros::Display;

use crate::error::{Error, Result};

/// Accepted image file extensions, matched case-insensitively.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "tiff", "tif", "bmp", "png"];

/// Kind of frame being processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
pub enum FrameType {
    /// Calibration frame shot with the lens capped.
    Dark,
    /// Star field frame stacked into the trail.
    Light,
}

/// A frame in traversal order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameRef {
    /// 0-based position in traversal order.
    pub index: usize,
    pub path: PathBuf,
}

pub fn is_image_file(path: &Path) -> bool {
    has_extension(path, IMAGE_EXTENSIONS)
}

/// Lists the image files of `dir` sorted by file name, reversed if `reverse` is set.
///
/// File names are expected to sort in capture order. Non-image files are skipped.
pub fn enumerate_frames(dir: &Path, reverse: bool) -> Result<Vec<FrameRef>> {
    let mut paths =
        files_with_extensions(dir, IMAGE_EXTENSIONS).map_err(|source| Error::ReadDir {
            path: dir.to_path_buf(),
            source,
        })?;

    if reverse {
        paths.reverse();
    }

    Ok(paths
        .into_iter()
        .enumerate()
        .map(|(index, path)| FrameRef { index, path })
        .collect())
}
