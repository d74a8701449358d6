use std::path::Path;

use image::{DynamicImage, Rgb32FImage};

use super::{ImageDesc, LayeredImage, Precision};
use crate::error::{Error, Result};

pub(super) fn load(path: &Path) -> Result<LayeredImage> {
    let img = image::open(path).map_err(|e| Error::ImageLoad {
        path: path.to_path_buf(),
        source: Box::new(e),
    })?;

    let color = img.color();
    let bits_per_channel = color.bits_per_pixel() / color.channel_count() as u16;
    let precision = match bits_per_channel {
        8 => Precision::U8,
        16 => Precision::U16,
        _ => Precision::F32,
    };

    let desc = ImageDesc {
        width: img.width() as usize,
        height: img.height() as usize,
        precision,
    };
    let pixels = img.into_rgb32f().into_raw();

    Ok(LayeredImage::from_pixels(desc, pixels))
}

/// Saves normalized RGB pixels. JPEG and BMP are always written as 8 bit; PNG and TIFF
/// keep 16 bit sources at 16 bit and store float sources as 16 bit.
pub(super) fn save(desc: &ImageDesc, pixels: &[f32], path: &Path) -> Result<()> {
    let extension = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_ascii_lowercase())
        .ok_or_else(|| Error::UnsupportedImage {
            path: path.to_path_buf(),
        })?;

    let buffer = Rgb32FImage::from_raw(desc.width as u32, desc.height as u32, pixels.to_vec())
        .ok_or_else(|| Error::ImageSave {
            path: path.to_path_buf(),
            source: "pixel buffer does not match image size".into(),
        })?;
    let img = DynamicImage::ImageRgb32F(buffer);

    let encoded = match (extension.as_str(), desc.precision) {
        ("jpg" | "jpeg" | "bmp", _) | ("png" | "tif" | "tiff", Precision::U8) => {
            DynamicImage::ImageRgb8(img.to_rgb8())
        }
        ("png" | "tif" | "tiff", Precision::U16 | Precision::F32) => {
            DynamicImage::ImageRgb16(img.to_rgb16())
        }
        _ => {
            return Err(Error::UnsupportedImage {
                path: path.to_path_buf(),
            });
        }
    };

    encoded.save(path).map_err(|e| Error::ImageSave {
        path: path.to_path_buf(),
        source: Box::new(e),
    })
}
