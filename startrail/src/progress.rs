//! Per-frame progress of the dark and light passes.

use common::SharedFn;

/// Where a run is: which pass, and how many of its frames are done.
#[derive(Debug, Clone)]
pub struct StackingProgress {
    /// Frames already folded into the dark model or the trail.
    pub current: usize,
    /// Frames the pass will read.
    pub total: usize,
    pub stage: StackingStage,
}

/// The two passes of a run. Darks are averaged before any light frame is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackingStage {
    /// Summing dark frames, then dividing by their count.
    DarkFrames,
    /// Calibrating each light frame and layering it onto the trail.
    LightFrames,
}

/// Receives one update after every dark or light frame.
pub type ProgressCallback = SharedFn<dyn Fn(StackingProgress) + Send + Sync>;

/// Sends an update for `stage` unless no receiver is installed.
pub fn report_progress(
    callback: &ProgressCallback,
    current: usize,
    total: usize,
    stage: StackingStage,
) {
    if let Some(f) = callback.as_ref() {
        f(StackingProgress {
            current,
            total,
            stage,
        });
    }
}
