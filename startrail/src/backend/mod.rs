//! Image backend capability interface.
//!
//! The compositing core never touches pixels directly. It drives a backend through the
//! small set of layer operations below, so any image library able to load, layer, blur
//! and flatten images can host it. [`cpu::CpuBackend`] is the in-process implementation.

pub mod cpu;

use std::path::Path;

use serde::{Deserialize, Serialize};
use strum_macros::Display;

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageDimensions {
    pub width: usize,
    pub height: usize,
}

impl ImageDimensions {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }
}

/// How a layer combines with the content beneath it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BlendMode {
    /// result = src
    #[default]
    Normal,
    /// result = max(dst - src, 0)
    Subtract,
    /// result = max(src, dst), per channel
    LightenOnly,
}

/// Blend mode and layer opacity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Blend {
    pub mode: BlendMode,
    /// Layer opacity in percent, 0-100.
    pub opacity: f32,
}

impl Default for Blend {
    fn default() -> Self {
        Self::NORMAL
    }
}

impl Blend {
    pub const NORMAL: Blend = Blend {
        mode: BlendMode::Normal,
        opacity: 100.0,
    };

    pub fn new(mode: BlendMode, opacity: f32) -> Self {
        Self { mode, opacity }
    }

    /// Opacity as a [0, 1] mixing factor.
    pub fn alpha(&self) -> f32 {
        (self.opacity / 100.0).clamp(0.0, 1.0)
    }
}

/// What a fresh canvas starts with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Background {
    /// No layers at all.
    #[default]
    Empty,
    /// One opaque black layer at the bottom of the stack.
    Black,
}

/// Layer-based image operations the compositor relies on.
///
/// Images are opaque handles. Operations that read image content (`duplicate`,
/// `add_layer` sources, `save`, `accumulate`) see the visible result of the whole layer
/// stack.
pub trait ImageBackend {
    type Image;

    /// Loads a single-layer image from disk.
    fn load(&mut self, path: &Path) -> Result<Self::Image>;

    /// Writes the visible composite of `image` to `path`, format chosen by extension.
    fn save(&mut self, image: &Self::Image, path: &Path) -> Result<()>;

    fn dimensions(&self, image: &Self::Image) -> ImageDimensions;

    /// Creates a blank image with the size and bit depth of `like`.
    fn new_canvas(&mut self, like: &Self::Image, background: Background) -> Result<Self::Image>;

    /// Creates a single-layer copy of the visible content of `image`.
    fn duplicate(&mut self, image: &Self::Image) -> Result<Self::Image>;

    /// Puts the content of `source` on top of `target`'s layer stack.
    fn add_layer(
        &mut self,
        target: &mut Self::Image,
        source: &Self::Image,
        blend: Blend,
        name: Option<&str>,
    ) -> Result<()>;

    /// Gaussian blur of the given radius, applied to the flattened image.
    fn blur(&mut self, image: &mut Self::Image, radius: f32) -> Result<()>;

    /// Merges the layer stack into a single layer.
    fn flatten(&mut self, image: &mut Self::Image) -> Result<()>;

    /// Adds `frame` to `sum` pixel by pixel without clamping.
    fn accumulate(&mut self, sum: &mut Self::Image, frame: &Self::Image) -> Result<()>;

    /// Multiplies every pixel of `image` by `factor`.
    fn scale(&mut self, image: &mut Self::Image, factor: f32) -> Result<()>;

    /// Refreshes the live preview with the current state of `image`.
    fn present(&mut self, _image: &Self::Image) -> Result<()> {
        Ok(())
    }

    /// Releases an image.
    fn free(&mut self, image: Self::Image) {
        drop(image);
    }
}
