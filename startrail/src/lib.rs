//! Star trail compositing.
//!
//! Stacks an ordered sequence of night sky frames into a single trail image with a
//! lighten-only blend, optionally subtracting an averaged dark frame and the ambient
//! skyglow, and optionally fading the trails in and out across the sequence.
//!
//! The pipeline drives an [`ImageBackend`]; [`CpuBackend`] is the in-process one.

pub mod backend;
pub mod compositor;
pub mod config;
pub mod dark_frame;
pub mod error;
pub mod frames;
pub mod opacity;
pub mod progress;
pub mod run;
pub mod skyglow;

#[cfg(test)]
pub(crate) mod testing;

pub use backend::cpu::{CpuBackend, ImageDesc, LayeredImage, Precision};
pub use backend::{Background, Blend, BlendMode, ImageBackend, ImageDimensions};
pub use compositor::{CompositorSettings, FrameCompositor};
pub use config::{StartrailConfig, StartrailRequest};
pub use dark_frame::{DarkFrameAverager, average_dark_frames};
pub use error::{ConfigError, Error, Result};
pub use frames::{FrameRef, FrameType, IMAGE_EXTENSIONS, enumerate_frames};
pub use opacity::{FadeMode, FadeSettings, compute_opacities, opacities_from_fade_amount};
pub use progress::{ProgressCallback, StackingProgress, StackingStage};
pub use run::{StackOutcome, run, run_with_progress};
pub use skyglow::{SkyglowLevel, suppress_skyglow};
