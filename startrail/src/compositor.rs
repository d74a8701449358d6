//! Lighten-only frame compositor.
//!
//! Each light frame is calibrated (dark subtraction, skyglow suppression) and laid over
//! the running composite in lighten-only mode, so every pixel keeps the brightest value
//! seen so far. That is what turns moving stars into trails.

use serde::{Deserialize, Serialize};

use crate::backend::{Background, Blend, BlendMode, ImageBackend, ImageDimensions};
use crate::error::{Error, Result};
use crate::frames::{FrameRef, FrameType};
use crate::opacity::{FULL_OPACITY, FadeMode};
use crate::skyglow::{SkyglowLevel, suppress_skyglow};

/// Per-run compositor options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CompositorSettings {
    /// Flatten the composite after every frame instead of keeping one layer per frame.
    pub merge_layers: bool,
    pub skyglow: SkyglowLevel,
    pub fade_mode: FadeMode,
}

/// Name of the layer holding the frame at `index` (0-based) in an unmerged composite.
pub fn frame_layer_name(index: usize) -> String {
    format!("layer {:05}", index + 1)
}

/// Stateful fold of light frames into one composite.
///
/// The composite is allocated from the first frame added, so a compositor that never
/// sees a frame never allocates anything.
pub struct FrameCompositor<I> {
    settings: CompositorSettings,
    composite: Option<(I, ImageDimensions)>,
    frames_added: usize,
}

impl<I> FrameCompositor<I> {
    pub fn new(settings: CompositorSettings) -> Self {
        Self {
            settings,
            composite: None,
            frames_added: 0,
        }
    }

    pub fn frames_added(&self) -> usize {
        self.frames_added
    }

    /// Current composite, `None` before the first frame.
    pub fn composite(&self) -> Option<&I> {
        self.composite.as_ref().map(|(image, _)| image)
    }

    /// Loads, calibrates and merges one frame at `opacity` percent.
    ///
    /// The loaded frame is released whether or not merging succeeds.
    pub fn add_frame<B: ImageBackend<Image = I>>(
        &mut self,
        backend: &mut B,
        dark: Option<&I>,
        frame: &FrameRef,
        opacity: f32,
    ) -> Result<()> {
        tracing::debug!(
            index = frame.index,
            opacity,
            path = %frame.path.display(),
            "Compositing light frame"
        );

        let mut image = backend.load(&frame.path)?;
        let result = self.merge(backend, dark, &mut image, frame.index, opacity);
        backend.free(image);
        result?;

        self.frames_added += 1;
        Ok(())
    }

    fn merge<B: ImageBackend<Image = I>>(
        &mut self,
        backend: &mut B,
        dark: Option<&I>,
        image: &mut I,
        index: usize,
        opacity: f32,
    ) -> Result<()> {
        let dims = backend.dimensions(image);

        if let Some((_, expected)) = &self.composite {
            if *expected != dims {
                return Err(Error::DimensionMismatch {
                    frame_type: FrameType::Light,
                    index,
                    expected: *expected,
                    actual: dims,
                });
            }
        }

        if let Some(dark) = dark {
            let dark_dims = backend.dimensions(dark);
            if dark_dims != dims {
                return Err(Error::DimensionMismatch {
                    frame_type: FrameType::Dark,
                    index,
                    expected: dims,
                    actual: dark_dims,
                });
            }
            backend.add_layer(
                image,
                dark,
                Blend::new(BlendMode::Subtract, FULL_OPACITY),
                Some("dark"),
            )?;
            backend.flatten(image)?;
        }

        suppress_skyglow(backend, image, self.settings.skyglow)?;

        if self.composite.is_none() {
            let background = if self.settings.fade_mode.needs_black_base() {
                Background::Black
            } else {
                Background::Empty
            };
            let canvas = backend.new_canvas(image, background)?;
            self.composite = Some((canvas, dims));
        }
        if let Some((composite, _)) = self.composite.as_mut() {
            let name = frame_layer_name(index);
            backend.add_layer(
                composite,
                image,
                Blend::new(BlendMode::LightenOnly, opacity),
                Some(&name),
            )?;

            if self.settings.merge_layers {
                backend.flatten(composite)?;
            }
        }

        Ok(())
    }

    /// Takes the finished composite. `None` if no frame was added.
    pub fn finish(self) -> Option<I> {
        self.composite.map(|(image, _)| image)
    }
}
