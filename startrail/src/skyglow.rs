//! Skyglow suppression.
//!
//! A heavily blurred copy of the frame keeps only the slow brightness gradient of the
//! sky. Subtracting it flattens the glow while point sources (stars) survive.

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter};

use crate::backend::{Blend, BlendMode, ImageBackend};
use crate::error::Result;

/// Blur radius of the glow estimate, in pixels.
pub const SKYGLOW_BLUR_RADIUS: f32 = 500.0;

/// Strength of the glow subtraction.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumIter, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SkyglowLevel {
    #[default]
    None,
    Light,
    Moderate,
    Heavy,
    Full,
}

impl SkyglowLevel {
    /// Maps the legacy option index (0-4).
    pub fn from_index(index: u32) -> Option<Self> {
        match index {
            0 => Some(Self::None),
            1 => Some(Self::Light),
            2 => Some(Self::Moderate),
            3 => Some(Self::Heavy),
            4 => Some(Self::Full),
            _ => None,
        }
    }

    /// Opacity of the subtraction layer in percent.
    pub fn opacity(self) -> f32 {
        match self {
            Self::None => 0.0,
            Self::Light => 25.0,
            Self::Moderate => 50.0,
            Self::Heavy => 75.0,
            Self::Full => 100.0,
        }
    }
}

/// Subtracts the blurred glow from `frame` in place and leaves it flattened.
///
/// Every level except [`SkyglowLevel::None`] pays for the full blur.
pub fn suppress_skyglow<B: ImageBackend>(
    backend: &mut B,
    frame: &mut B::Image,
    level: SkyglowLevel,
) -> Result<()> {
    if level == SkyglowLevel::None {
        return Ok(());
    }

    let mut glow = backend.duplicate(frame)?;
    let result = backend.blur(&mut glow, SKYGLOW_BLUR_RADIUS).and_then(|()| {
        backend.add_layer(
            frame,
            &glow,
            Blend::new(BlendMode::Subtract, level.opacity()),
            Some("skyglow"),
        )
    });
    backend.free(glow);
    result?;

    backend.flatten(frame)
}
