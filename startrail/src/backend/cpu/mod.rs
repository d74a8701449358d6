//! In-process image backend.
//!
//! Pixels are stored as interleaved RGB f32 normalized to [0, 1]. Each image is a stack
//! of layers, bottom first, composited over black when flattened or read.

mod blend;
mod blur;
mod io;


use std::path::{Path, PathBuf};

use strum_macros::Display;

use super::{Background, Blend, ImageBackend, ImageDimensions};
use crate::error::{Error, Result};

/// Samples per pixel.
pub const CHANNELS: usize = 3;

/// Bit depth of the source file, kept so output matches input precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Precision {
    #[default]
    U8,
    U16,
    F32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageDesc {
    pub width: usize,
    pub height: usize,
    pub precision: Precision,
}

impl ImageDesc {
    pub fn new(width: usize, height: usize, precision: Precision) -> Self {
        Self {
            width,
            height,
            precision,
        }
    }

    pub fn dimensions(&self) -> ImageDimensions {
        ImageDimensions::new(self.width, self.height)
    }

    pub fn sample_count(&self) -> usize {
        self.width * self.height * CHANNELS
    }
}

#[derive(Debug, Clone)]
pub struct Layer {
    pub name: String,
    pub blend: Blend,
    pixels: Vec<f32>,
}

impl Layer {
    fn background(pixels: Vec<f32>) -> Self {
        Self {
            name: "background".to_string(),
            blend: Blend::NORMAL,
            pixels,
        }
    }

    /// Layer content as it was added, before blending.
    pub fn pixels(&self) -> &[f32] {
        &self.pixels
    }
}

/// An image made of a stack of layers. `layers()[0]` is the bottom.
///
/// The visible composite is kept up to date as layers are added, so reading it never
/// re-blends the stack.
#[derive(Debug, Clone)]
pub struct LayeredImage {
    desc: ImageDesc,
    layers: Vec<Layer>,
    /// Layers blended bottom to top over black.
    projection: Vec<f32>,
}

impl LayeredImage {
    /// Single-layer image from interleaved RGB samples.
    ///
    /// # Panics
    /// Panics if `pixels` does not hold `width * height * 3` samples.
    pub fn from_pixels(desc: ImageDesc, pixels: Vec<f32>) -> Self {
        assert_eq!(
            pixels.len(),
            desc.sample_count(),
            "Pixel count mismatch for {}x{} image",
            desc.width,
            desc.height
        );
        Self {
            desc,
            projection: pixels.clone(),
            layers: vec![Layer::background(pixels)],
        }
    }

    /// Single-layer image with every sample set to `value`.
    pub fn filled(desc: ImageDesc, value: f32) -> Self {
        Self::from_pixels(desc, vec![value; desc.sample_count()])
    }

    fn empty(desc: ImageDesc) -> Self {
        Self {
            desc,
            layers: Vec::new(),
            projection: vec![0.0; desc.sample_count()],
        }
    }

    pub fn desc(&self) -> &ImageDesc {
        &self.desc
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn layer_names(&self) -> Vec<&str> {
        self.layers.iter().map(|l| l.name.as_str()).collect()
    }

    /// Visible result of the layer stack over black.
    pub fn composite(&self) -> &[f32] {
        &self.projection
    }

    /// Visible RGB value at one pixel.
    pub fn composite_pixel(&self, x: usize, y: usize) -> [f32; CHANNELS] {
        assert!(
            x < self.desc.width && y < self.desc.height,
            "Pixel ({x}, {y}) out of bounds"
        );
        let offset = (y * self.desc.width + x) * CHANNELS;
        let mut out = [0.0f32; CHANNELS];
        out.copy_from_slice(&self.projection[offset..offset + CHANNELS]);
        out
    }

    fn push_layer(&mut self, name: &str, blend: Blend, pixels: Vec<f32>) {
        blend::blend_into(&mut self.projection, &pixels, blend);
        self.layers.push(Layer {
            name: name.to_string(),
            blend,
            pixels,
        });
    }

    fn is_flat(&self) -> bool {
        self.layers.len() == 1 && self.layers[0].blend == Blend::NORMAL
    }

    fn flatten(&mut self) {
        if !self.is_flat() {
            self.layers = vec![Layer::background(self.projection.clone())];
        }
    }

    /// Edits the visible pixels and keeps the result as the only layer.
    fn edit_flat(&mut self, edit: impl FnOnce(&mut [f32])) {
        edit(&mut self.projection);
        self.layers = vec![Layer::background(self.projection.clone())];
    }
}

/// CPU implementation of [`ImageBackend`].
///
/// With a preview path set, [`ImageBackend::present`] writes the visible composite there,
/// replacing the previous preview.
#[derive(Debug, Default)]
pub struct CpuBackend {
    preview_path: Option<PathBuf>,
    presented: usize,
}

impl CpuBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_preview<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.preview_path = Some(path.into());
        self
    }

    /// Number of preview refreshes so far.
    pub fn presented(&self) -> usize {
        self.presented
    }

    fn check_same_size(target: &LayeredImage, other: &LayeredImage) -> Result<()> {
        let expected = target.desc.dimensions();
        let actual = other.desc.dimensions();
        if expected != actual {
            return Err(Error::LayerSizeMismatch { expected, actual });
        }
        Ok(())
    }
}

impl ImageBackend for CpuBackend {
    type Image = LayeredImage;

    fn load(&mut self, path: &Path) -> Result<LayeredImage> {
        io::load(path)
    }

    fn save(&mut self, image: &LayeredImage, path: &Path) -> Result<()> {
        io::save(&image.desc, image.composite(), path)
    }

    fn dimensions(&self, image: &LayeredImage) -> ImageDimensions {
        image.desc.dimensions()
    }

    fn new_canvas(&mut self, like: &LayeredImage, background: Background) -> Result<LayeredImage> {
        let mut canvas = LayeredImage::empty(like.desc);
        if background == Background::Black {
            let black = vec![0.0; like.desc.sample_count()];
            canvas.push_layer("layer_black", Blend::NORMAL, black);
        }
        Ok(canvas)
    }

    fn duplicate(&mut self, image: &LayeredImage) -> Result<LayeredImage> {
        Ok(LayeredImage::from_pixels(image.desc, image.composite().to_vec()))
    }

    fn add_layer(
        &mut self,
        target: &mut LayeredImage,
        source: &LayeredImage,
        blend: Blend,
        name: Option<&str>,
    ) -> Result<()> {
        Self::check_same_size(target, source)?;
        target.push_layer(name.unwrap_or("layer"), blend, source.composite().to_vec());
        Ok(())
    }

    fn blur(&mut self, image: &mut LayeredImage, radius: f32) -> Result<()> {
        let (width, height) = (image.desc.width, image.desc.height);
        image.edit_flat(|pixels| blur::gaussian_blur(pixels, width, height, radius));
        Ok(())
    }

    fn flatten(&mut self, image: &mut LayeredImage) -> Result<()> {
        image.flatten();
        Ok(())
    }

    fn accumulate(&mut self, sum: &mut LayeredImage, frame: &LayeredImage) -> Result<()> {
        Self::check_same_size(sum, frame)?;
        sum.edit_flat(|pixels| blend::accumulate(pixels, frame.composite()));
        Ok(())
    }

    fn scale(&mut self, image: &mut LayeredImage, factor: f32) -> Result<()> {
        image.edit_flat(|pixels| blend::scale(pixels, factor));
        Ok(())
    }

    fn present(&mut self, image: &LayeredImage) -> Result<()> {
        if let Some(path) = &self.preview_path {
            io::save(&image.desc, image.composite(), path)?;
        }
        self.presented += 1;
        tracing::debug!(refresh = self.presented, "Preview updated");
        Ok(())
    }
}
