//! Per-frame opacity curves for fading trails in and out.
//!
//! Every curve is expressed for a fade-out traversal: full strength first, dimmer
//! towards the end. A fade-in is obtained by walking the frames backwards and
//! applying the same curve, which is why [`FadeMode::In`] reverses the frame order.

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter};

/// Maximum layer opacity.
pub const FULL_OPACITY: f32 = 100.0;

/// How trail brightness ramps across the sequence.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumIter, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FadeMode {
    /// Every frame at full strength.
    #[default]
    None,
    /// Trails start faint and brighten.
    In,
    /// Trails start bright and fade towards the end.
    Out,
    /// Trails brighten, then fade.
    InAndOut,
}

impl FadeMode {
    /// Maps the legacy option index (0-3).
    pub fn from_index(index: u32) -> Option<Self> {
        match index {
            0 => Some(Self::None),
            1 => Some(Self::In),
            2 => Some(Self::Out),
            3 => Some(Self::InAndOut),
            _ => None,
        }
    }

    /// Fade-in is computed as a fade-out over the reversed sequence.
    pub fn reverses_frames(self) -> bool {
        self == Self::In
    }

    /// Partially transparent first frames need an opaque black floor.
    pub fn needs_black_base(self) -> bool {
        self == Self::InAndOut
    }
}

/// Fade mode plus the share of the sequence (in percent) each ramp covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FadeSettings {
    pub mode: FadeMode,
    /// Fade-in amount, 1-100.
    pub in_amount: u32,
    /// Fade-out amount, 1-100.
    pub out_amount: u32,
}

impl Default for FadeSettings {
    fn default() -> Self {
        Self {
            mode: FadeMode::None,
            in_amount: 100,
            out_amount: 100,
        }
    }
}

impl FadeSettings {
    pub fn new(mode: FadeMode, in_amount: u32, out_amount: u32) -> Self {
        Self {
            mode,
            in_amount,
            out_amount,
        }
    }

    /// Fade-in amount actually used.
    ///
    /// For [`FadeMode::InAndOut`] the two ramps may not overlap: when they add up to more
    /// than 100% the fade-out wins and the fade-in is cut down to the remainder.
    pub fn effective_in_amount(&self) -> u32 {
        if self.mode == FadeMode::InAndOut && self.in_amount.saturating_add(self.out_amount) > 100 {
            100u32.saturating_sub(self.out_amount)
        } else {
            self.in_amount
        }
    }
}

/// Fade-out curve covering `fade_amount` percent of `n_images` frames.
///
/// Returns the opacities and the ramp length `N = floor(fade_amount * n_images / 100)`.
/// When the ramp covers every frame the opacity drops linearly from 100 to `100 / n`.
/// Otherwise the first `n - N - 1` frames stay at 100 and the last `N + 1` frames
/// ramp down to `100 / (N + 1)`. No frame ever reaches 0.
///
/// `n_images == 0` yields an empty curve.
pub fn opacities_from_fade_amount(fade_amount: u32, n_images: usize) -> (Vec<f32>, usize) {
    if n_images == 0 {
        return (Vec::new(), 0);
    }

    let ramp_len = (fade_amount as usize * n_images) / 100;

    let opacities = if ramp_len >= n_images {
        let step = FULL_OPACITY / n_images as f32;
        (0..n_images)
            .map(|i| FULL_OPACITY - i as f32 * step)
            .collect()
    } else {
        let ramp_start = n_images - ramp_len - 1;
        let step = FULL_OPACITY / (ramp_len + 1) as f32;
        (0..n_images)
            .map(|i| {
                if i < ramp_start {
                    FULL_OPACITY
                } else {
                    FULL_OPACITY - (i - ramp_start) as f32 * step
                }
            })
            .collect()
    };

    (opacities, ramp_len.min(n_images))
}

/// Opacity of every frame, index-aligned with the traversal order.
pub fn compute_opacities(fade: &FadeSettings, n_images: usize) -> Vec<f32> {
    match fade.mode {
        FadeMode::None => vec![FULL_OPACITY; n_images],
        FadeMode::In => opacities_from_fade_amount(fade.in_amount, n_images).0,
        FadeMode::Out => opacities_from_fade_amount(fade.out_amount, n_images).0,
        FadeMode::InAndOut => {
            let (mut opacities_in, _) =
                opacities_from_fade_amount(fade.effective_in_amount(), n_images);
            let (opacities_out, ramp_out) =
                opacities_from_fade_amount(fade.out_amount, n_images);

            // ramp up instead of down
            opacities_in.reverse();

            let switch = n_images - ramp_out;
            opacities_in
                .into_iter()
                .zip(opacities_out)
                .enumerate()
                .map(|(i, (fade_in, fade_out))| if i < switch { fade_in } else { fade_out })
                .collect()
        }
    }
}
