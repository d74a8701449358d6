//! Entry operation: one full star trail run.

use std::path::{Path, PathBuf};

use crate::backend::ImageBackend;
use crate::compositor::FrameCompositor;
use crate::config::StartrailConfig;
use crate::dark_frame::average_dark_frames;
use crate::error::Result;
use crate::frames::{FrameRef, enumerate_frames};
use crate::opacity::compute_opacities;
use crate::progress::{ProgressCallback, StackingStage, report_progress};

/// Reason reported when a run finds nothing to stack.
pub const NO_IMAGES_REASON: &str = "No images found to stack";

/// Result of a run that did not fail.
#[derive(Debug)]
pub enum StackOutcome<I> {
    Composite(I),
    /// The light frame directory held no image files.
    NoImages,
}

impl<I> StackOutcome<I> {
    pub fn into_composite(self) -> Option<I> {
        match self {
            Self::Composite(image) => Some(image),
            Self::NoImages => None,
        }
    }

    /// User-facing explanation for an empty outcome.
    pub fn reason(&self) -> Option<&'static str> {
        match self {
            Self::Composite(_) => None,
            Self::NoImages => Some(NO_IMAGES_REASON),
        }
    }
}

/// Name of the intermediate file written after the frame at `index` (0-based).
pub fn intermediate_file_name(index: usize) -> String {
    format!("trail{:05}.jpg", index + 1)
}

/// Runs the whole pipeline without progress reporting.
pub fn run<B: ImageBackend>(
    backend: &mut B,
    config: &StartrailConfig,
) -> Result<StackOutcome<B::Image>> {
    run_with_progress(backend, config, &ProgressCallback::default())
}

/// Validates `config`, builds the dark model, then composites every light frame.
///
/// Configuration errors are returned before any image is touched. Any failure after
/// that aborts the run; no partial composite is returned.
pub fn run_with_progress<B: ImageBackend>(
    backend: &mut B,
    config: &StartrailConfig,
    progress: &ProgressCallback,
) -> Result<StackOutcome<B::Image>> {
    config.validate()?;

    tracing::info!(
        light_frames = %config.light_frames.display(),
        dark_frames = config.dark_frames.is_some(),
        skyglow = %config.skyglow,
        fade = %config.fade.mode,
        merge_layers = config.merge_layers,
        "Starting star trail run"
    );

    let dark = match &config.dark_frames {
        Some(dir) => {
            let frames = enumerate_frames(dir, false)?;
            tracing::info!(frame_count = frames.len(), "Averaging dark frames");
            average_dark_frames(backend, &frames, progress)?
        }
        None => None,
    };

    let result = enumerate_frames(&config.light_frames, config.fade.mode.reverses_frames())
        .and_then(|frames| composite_frames(backend, config, dark.as_ref(), &frames, progress));

    if let Some(dark) = dark {
        backend.free(dark);
    }

    let outcome = result?;
    match &outcome {
        StackOutcome::Composite(_) => tracing::info!("Star trail run finished"),
        StackOutcome::NoImages => tracing::warn!("{NO_IMAGES_REASON}"),
    }
    Ok(outcome)
}

fn composite_frames<B: ImageBackend>(
    backend: &mut B,
    config: &StartrailConfig,
    dark: Option<&B::Image>,
    frames: &[FrameRef],
    progress: &ProgressCallback,
) -> Result<StackOutcome<B::Image>> {
    let total = frames.len();
    let opacities = compute_opacities(&config.fade, total);

    tracing::info!(frame_count = total, "Compositing light frames");

    let mut compositor = FrameCompositor::new(config.compositor_settings());

    for (frame, &opacity) in frames.iter().zip(&opacities) {
        if let Err(e) = compositor.add_frame(backend, dark, frame, opacity) {
            discard(backend, compositor);
            return Err(e);
        }

        if let Some(composite) = compositor.composite() {
            let after = after_frame(backend, config, composite, frame);
            if let Err(e) = after {
                discard(backend, compositor);
                return Err(e);
            }
        }

        report_progress(
            progress,
            compositor.frames_added(),
            total,
            StackingStage::LightFrames,
        );
    }

    let Some(composite) = compositor.finish() else {
        return Ok(StackOutcome::NoImages);
    };

    if config.live_display {
        if let Err(e) = backend.present(&composite) {
            backend.free(composite);
            return Err(e);
        }
    }

    Ok(StackOutcome::Composite(composite))
}

/// Intermediate save and live preview for the composite after `frame`.
fn after_frame<B: ImageBackend>(
    backend: &mut B,
    config: &StartrailConfig,
    composite: &B::Image,
    frame: &FrameRef,
) -> Result<()> {
    if let Some(dir) = &config.intermediate_dir {
        save_intermediate(backend, composite, dir, frame.index)?;
    }
    if config.live_display {
        backend.present(composite)?;
    }
    Ok(())
}

fn save_intermediate<B: ImageBackend>(
    backend: &mut B,
    composite: &B::Image,
    dir: &Path,
    index: usize,
) -> Result<PathBuf> {
    let path = dir.join(intermediate_file_name(index));
    // saving reads the visible composite, so unmerged stacks need no explicit flatten
    backend.save(composite, &path)?;
    tracing::debug!(path = %path.display(), "Saved intermediate frame");
    Ok(path)
}

fn discard<B: ImageBackend>(backend: &mut B, compositor: FrameCompositor<B::Image>) {
    if let Some(image) = compositor.finish() {
        backend.free(image);
    }
}

#[cfg(test)]
mod tests;
