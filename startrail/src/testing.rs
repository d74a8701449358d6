//! Test fixtures shared across modules.

use std::path::{Path, PathBuf};

use crate::backend::cpu::{CpuBackend, LayeredImage};
use crate::backend::{Background, Blend, ImageBackend, ImageDimensions};
use crate::error::Result;

/// Initialize tracing subscriber for tests.
/// Safe to call multiple times - will only initialize once.
/// Respects RUST_LOG env var, defaults to "info".
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

/// Writes an 8-bit RGB image whose pixels come from `f(x, y)`.
pub fn write_rgb(path: &Path, width: u32, height: u32, f: impl Fn(u32, u32) -> [u8; 3]) -> PathBuf {
    image::RgbImage::from_fn(width, height, |x, y| image::Rgb(f(x, y)))
        .save(path)
        .unwrap();
    path.to_path_buf()
}

/// Writes a single-color 8-bit RGB image.
pub fn write_solid(path: &Path, width: u32, height: u32, value: u8) -> PathBuf {
    write_rgb(path, width, height, |_, _| [value; 3])
}

/// Reads an image back as 8-bit RGB samples.
pub fn read_rgb8(path: &Path) -> Vec<u8> {
    image::open(path).unwrap().to_rgb8().into_raw()
}

/// Quantizes a composite to 8-bit, the way it would be written to a JPEG or PNG.
pub fn to_rgb8(image: &LayeredImage) -> Vec<u8> {
    image
        .composite()
        .iter()
        .map(|v| (v.clamp(0.0, 1.0) * 255.0).round() as u8)
        .collect()
}

/// CPU backend that records how it is driven.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    pub inner: CpuBackend,
    pub loads: Vec<PathBuf>,
    pub canvases: usize,
    pub blurs: usize,
    pub presents: usize,
    pub frees: usize,
}

impl ImageBackend for RecordingBackend {
    type Image = LayeredImage;

    fn load(&mut self, path: &Path) -> Result<LayeredImage> {
        self.loads.push(path.to_path_buf());
        self.inner.load(path)
    }

    fn save(&mut self, image: &LayeredImage, path: &Path) -> Result<()> {
        self.inner.save(image, path)
    }

    fn dimensions(&self, image: &LayeredImage) -> ImageDimensions {
        self.inner.dimensions(image)
    }

    fn new_canvas(&mut self, like: &LayeredImage, background: Background) -> Result<LayeredImage> {
        self.canvases += 1;
        self.inner.new_canvas(like, background)
    }

    fn duplicate(&mut self, image: &LayeredImage) -> Result<LayeredImage> {
        self.inner.duplicate(image)
    }

    fn add_layer(
        &mut self,
        target: &mut LayeredImage,
        source: &LayeredImage,
        blend: Blend,
        name: Option<&str>,
    ) -> Result<()> {
        self.inner.add_layer(target, source, blend, name)
    }

    fn blur(&mut self, image: &mut LayeredImage, radius: f32) -> Result<()> {
        self.blurs += 1;
        self.inner.blur(image, radius)
    }

    fn flatten(&mut self, image: &mut LayeredImage) -> Result<()> {
        self.inner.flatten(image)
    }

    fn accumulate(&mut self, sum: &mut LayeredImage, frame: &LayeredImage) -> Result<()> {
        self.inner.accumulate(sum, frame)
    }

    fn scale(&mut self, image: &mut LayeredImage, factor: f32) -> Result<()> {
        self.inner.scale(image, factor)
    }

    fn present(&mut self, image: &LayeredImage) -> Result<()> {
        self.presents += 1;
        self.inner.present(image)
    }

    fn free(&mut self, image: LayeredImage) {
        self.frees += 1;
        self.inner.free(image);
    }
}
