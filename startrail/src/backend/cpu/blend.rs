//! Per-channel layer blending on normalized f32 pixels.

use rayon::prelude::*;

use crate::backend::{Blend, BlendMode};

/// Samples per parallel chunk (16KB of f32s).
const CHUNK_SIZE: usize = 4096;

/// Blend two normalized [0, 1] values using the specified mode.
#[inline]
pub(super) fn blend_normalized(src: f32, dst: f32, mode: BlendMode, alpha: f32) -> f32 {
    let blended = match mode {
        BlendMode::Normal => src,
        BlendMode::Subtract => (dst - src).max(0.0),
        BlendMode::LightenOnly => src.max(dst),
    };
    // result = blended * alpha + dst * (1 - alpha)
    (blended * alpha + dst * (1.0 - alpha)).clamp(0.0, 1.0)
}

/// Composites `src` onto `dst` in place.
pub(super) fn blend_into(dst: &mut [f32], src: &[f32], blend: Blend) {
    assert_eq!(dst.len(), src.len(), "blend buffer size mismatch");

    let mode = blend.mode;
    let alpha = blend.alpha();

    dst.par_chunks_mut(CHUNK_SIZE)
        .zip(src.par_chunks(CHUNK_SIZE))
        .for_each(|(dst_chunk, src_chunk)| {
            for (d, &s) in dst_chunk.iter_mut().zip(src_chunk) {
                *d = blend_normalized(s, *d, mode, alpha);
            }
        });
}

/// Adds `src` to `dst` without clamping.
pub(super) fn accumulate(dst: &mut [f32], src: &[f32]) {
    assert_eq!(dst.len(), src.len(), "accumulate buffer size mismatch");

    dst.par_chunks_mut(CHUNK_SIZE)
        .zip(src.par_chunks(CHUNK_SIZE))
        .for_each(|(dst_chunk, src_chunk)| {
            for (d, &s) in dst_chunk.iter_mut().zip(src_chunk) {
                *d += s;
            }
        });
}

pub(super) fn scale(data: &mut [f32], factor: f32) {
    data.par_chunks_mut(CHUNK_SIZE).for_each(|chunk| {
        for v in chunk {
            *v *= factor;
        }
    });
}
