//! Large-radius Gaussian blur for interleaved RGB buffers.
//!
//! A true Gaussian kernel at skyglow radii (hundreds of pixels) is far too expensive, so
//! the blur is approximated by three successive box blurs whose widths are chosen to
//! match the target sigma. Each box pass is a running sum, O(1) per sample regardless of
//! radius. Passes are separable: rows are blurred directly, columns via a transpose.
//! Samples past the image border repeat the edge pixel.

use rayon::prelude::*;

use super::CHANNELS;

const BOX_PASSES: usize = 3;

/// Converts a blur radius to a Gaussian sigma.
///
/// The radius is where the kernel falls to 1/255 of its peak, i.e. below one 8-bit step.
pub(super) fn radius_to_sigma(radius: f32) -> f32 {
    radius / (2.0 * 255f32.ln()).sqrt()
}

/// Widths of the box filters whose repeated application approximates a Gaussian.
fn box_widths(sigma: f32, passes: usize) -> Vec<usize> {
    let n = passes as f32;
    let w_ideal = (12.0 * sigma * sigma / n + 1.0).sqrt();

    let mut w_low = w_ideal.floor().max(1.0) as usize;
    if w_low % 2 == 0 {
        w_low -= 1;
    }
    let w_high = w_low + 2;

    let wl = w_low as f32;
    let m_ideal = (12.0 * sigma * sigma - n * wl * wl - 4.0 * n * wl - 3.0 * n) / (-4.0 * wl - 4.0);
    let m = m_ideal.round().clamp(0.0, n) as usize;

    (0..passes)
        .map(|i| if i < m { w_low } else { w_high })
        .collect()
}

/// Blurs `pixels` in place. Radii too small to matter leave the buffer untouched.
pub(super) fn gaussian_blur(pixels: &mut [f32], width: usize, height: usize, radius: f32) {
    assert_eq!(pixels.len(), width * height * CHANNELS, "Pixel count mismatch");

    let sigma = radius_to_sigma(radius);
    if sigma < 0.5 || width == 0 || height == 0 {
        return;
    }

    let mut scratch = vec![0.0f32; pixels.len()];

    for box_width in box_widths(sigma, BOX_PASSES) {
        let r = box_width / 2;
        if r == 0 {
            continue;
        }

        box_blur_rows(pixels, &mut scratch, width, r);

        transpose(&scratch, pixels, width, height);
        box_blur_rows(pixels, &mut scratch, height, r);
        transpose(&scratch, pixels, height, width);
    }
}

/// Horizontal box blur of radius `r` on every row of `input`.
fn box_blur_rows(input: &[f32], output: &mut [f32], width: usize, r: usize) {
    let row_len = width * CHANNELS;

    output
        .par_chunks_mut(row_len)
        .zip(input.par_chunks(row_len))
        .for_each(|(out_row, in_row)| {
            for c in 0..CHANNELS {
                box_blur_channel(in_row, out_row, width, c, r);
            }
        });
}

fn box_blur_channel(input: &[f32], output: &mut [f32], width: usize, c: usize, r: usize) {
    let last = width - 1;
    let sample = |x: isize| -> f32 {
        let x = x.clamp(0, last as isize) as usize;
        input[x * CHANNELS + c]
    };

    let r = r as isize;
    let inv = 1.0 / (2 * r + 1) as f32;

    // f64 running sum keeps drift negligible over long rows
    let mut sum: f64 = (-r..=r).map(|k| sample(k) as f64).sum();

    for x in 0..width {
        output[x * CHANNELS + c] = sum as f32 * inv;
        let xi = x as isize;
        sum += sample(xi + r + 1) as f64 - sample(xi - r) as f64;
    }
}

/// Transposes a `width` x `height` interleaved image into `height` x `width`.
fn transpose(input: &[f32], output: &mut [f32], width: usize, height: usize) {
    let out_row_len = height * CHANNELS;

    output
        .par_chunks_mut(out_row_len)
        .enumerate()
        .for_each(|(x, out_row)| {
            for y in 0..height {
                let src = (y * width + x) * CHANNELS;
                out_row[y * CHANNELS..(y + 1) * CHANNELS]
                    .copy_from_slice(&input[src..src + CHANNELS]);
            }
        });
}
