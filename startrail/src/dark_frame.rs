//! Dark frame averaging.
//!
//! Frames are loaded one at a time and added to a float sum which is divided by the
//! frame count once at the end, so only the sum and the current frame are ever held.

use crate::backend::{ImageBackend, ImageDimensions};
use crate::error::{Error, Result};
use crate::frames::{FrameRef, FrameType};
use crate::progress::{ProgressCallback, StackingStage, report_progress};

/// Running pixel-wise sum of dark frames.
pub struct DarkFrameAverager<I> {
    sum: Option<(I, ImageDimensions)>,
    count: usize,
}

impl<I> Default for DarkFrameAverager<I> {
    fn default() -> Self {
        Self {
            sum: None,
            count: 0,
        }
    }
}

impl<I> DarkFrameAverager<I> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Adds a frame to the sum and releases it.
    ///
    /// The first frame becomes the sum and fixes the expected dimensions.
    pub fn push<B: ImageBackend<Image = I>>(
        &mut self,
        backend: &mut B,
        frame: I,
        index: usize,
    ) -> Result<()> {
        let dims = backend.dimensions(&frame);

        let Some((sum, expected)) = self.sum.as_mut() else {
            self.sum = Some((frame, dims));
            self.count = 1;
            return Ok(());
        };

        if dims != *expected {
            let expected = *expected;
            backend.free(frame);
            return Err(Error::DimensionMismatch {
                frame_type: FrameType::Dark,
                index,
                expected,
                actual: dims,
            });
        }
        let result = backend.accumulate(sum, &frame);
        backend.free(frame);
        result?;

        self.count += 1;
        Ok(())
    }

    /// Divides the sum by the frame count. `None` if nothing was pushed.
    pub fn finish<B: ImageBackend<Image = I>>(self, backend: &mut B) -> Result<Option<I>> {
        let Some((mut sum, _)) = self.sum else {
            return Ok(None);
        };

        if self.count > 1 {
            let inv_count = 1.0 / self.count as f32;
            if let Err(e) = backend.scale(&mut sum, inv_count) {
                backend.free(sum);
                return Err(e);
            }
        }

        Ok(Some(sum))
    }

    /// Releases a partial sum after a failure.
    fn discard<B: ImageBackend<Image = I>>(self, backend: &mut B) {
        if let Some((sum, _)) = self.sum {
            backend.free(sum);
        }
    }
}

/// Averages `frames` into a single dark model.
///
/// Returns `None` for an empty frame list, which disables dark subtraction.
pub fn average_dark_frames<B: ImageBackend>(
    backend: &mut B,
    frames: &[FrameRef],
    progress: &ProgressCallback,
) -> Result<Option<B::Image>> {
    if frames.is_empty() {
        tracing::warn!("No dark frames found, dark frame subtraction disabled");
        return Ok(None);
    }

    let total = frames.len();
    let mut averager = DarkFrameAverager::new();

    for frame in frames {
        tracing::debug!(index = frame.index, path = %frame.path.display(), "Adding dark frame");

        let pushed = backend
            .load(&frame.path)
            .and_then(|image| averager.push(backend, image, frame.index));
        if let Err(e) = pushed {
            averager.discard(backend);
            return Err(e);
        }

        report_progress(progress, averager.count(), total, StackingStage::DarkFrames);
    }

    tracing::info!(frame_count = total, "Dark frames averaged");

    averager.finish(backend)
}
