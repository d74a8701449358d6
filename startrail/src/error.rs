//! Error types for star trail compositing.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::backend::ImageDimensions;
use crate::frames::FrameType;

/// Boxed error from an image backend (codec, file system, ...).
pub type BackendError = Box<dyn std::error::Error + Send + Sync>;

/// Invalid run configuration. Always detected before any image is loaded.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("No light frame path provided.")]
    MissingLightFramePath,

    #[error("Light frame path doesn't exist.")]
    LightFramePathNotFound(PathBuf),

    #[error("Dark frame path doesn't exist.")]
    DarkFramePathNotFound(PathBuf),

    #[error("Intermediate frame save path doesn't exist.")]
    IntermediatePathNotFound(PathBuf),

    #[error("Invalid {name} value {value}, expected {expected}")]
    InvalidOption {
        name: &'static str,
        value: u32,
        expected: &'static str,
    },

    #[error("Failed to read config file '{path}': {source}")]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse YAML config '{path}': {source}")]
    ParseYaml {
        path: PathBuf,
        #[source]
        source: serde_yml::Error,
    },

    #[error("Failed to parse JSON config '{path}': {source}")]
    ParseJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unsupported config file format: '{0}'")]
    UnsupportedConfigFormat(PathBuf),
}

/// Errors that can occur during a compositing run.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to read frame directory '{path}': {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to load image '{path}': {source}")]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: BackendError,
    },

    #[error("Failed to save image '{path}': {source}")]
    ImageSave {
        path: PathBuf,
        #[source]
        source: BackendError,
    },

    #[error("Unsupported image file '{path}'")]
    UnsupportedImage { path: PathBuf },

    #[error(
        "Dimension mismatch for {frame_type} frame {index}: expected {expected:?}, got {actual:?}"
    )]
    DimensionMismatch {
        frame_type: FrameType,
        index: usize,
        expected: ImageDimensions,
        actual: ImageDimensions,
    },

    #[error("Layer size {actual:?} does not match image size {expected:?}")]
    LayerSizeMismatch {
        expected: ImageDimensions,
        actual: ImageDimensions,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
