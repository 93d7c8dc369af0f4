use prize_watch_types::{LumaImage, RGB_CHANNELS};

use crate::error::PipelineError;
use crate::roi::RgbCrop;

// CLAHE runs over an 8x8 tile grid with the contrast slope clipped at 2.0,
// a conservative setting for glossy prize displays that keeps glare from
// blowing out the digits.
const TILE_GRID: usize = 8;
const CLIP_LIMIT: f32 = 2.0;
const HISTOGRAM_BINS: usize = 256;

// Non-local means: 7x7 patches compared across a 21x21 search window.
const NLM_PATCH_RADIUS: usize = 3;
const NLM_SEARCH_RADIUS: usize = 10;
const NLM_FILTER_STRENGTH: f32 = 3.0;

/// Prepares a cropped display region for recognition: luminance conversion,
/// then contrast-limited adaptive histogram equalization, then a
/// non-local-means denoise pass. The order is fixed; equalization before
/// denoising keeps the filter from smearing amplified noise across digits.
pub fn normalize_crop(crop: &RgbCrop) -> Result<LumaImage, PipelineError> {
    let width = crop.width as usize;
    let height = crop.height as usize;
    let luma = luminance(&crop.data, width, height);
    let equalized = clahe(&luma, width, height);
    let denoised = nl_means_denoise(&equalized, width, height);
    Ok(LumaImage::from_raw(crop.width, crop.height, denoised)?)
}

/// BT.601 luminance over interleaved RGB24.
pub fn luminance(rgb: &[u8], width: usize, height: usize) -> Vec<u8> {
    assert_eq!(rgb.len(), width * height * RGB_CHANNELS);
    let mut output = Vec::with_capacity(width * height);
    for pixel in rgb.chunks_exact(RGB_CHANNELS) {
        let y = 0.299 * pixel[0] as f32 + 0.587 * pixel[1] as f32 + 0.114 * pixel[2] as f32;
        output.push(y.round().min(255.0) as u8);
    }
    output
}

/// Contrast-limited adaptive histogram equalization.
///
/// The image is split into a grid of up to TILE_GRID x TILE_GRID tiles;
/// each tile gets a clipped-histogram lookup table and every pixel blends
/// the tables of its four surrounding tiles bilinearly.
pub fn clahe(pixels: &[u8], width: usize, height: usize) -> Vec<u8> {
    assert_eq!(pixels.len(), width * height);
    if width == 0 || height == 0 {
        return Vec::new();
    }

    let tile_w = width.div_ceil(TILE_GRID.min(width));
    let tile_h = height.div_ceil(TILE_GRID.min(height));
    // trailing tiles may be narrower than the nominal pitch, never empty
    let tiles_x = width.div_ceil(tile_w);
    let tiles_y = height.div_ceil(tile_h);

    let mut luts = vec![[0u8; HISTOGRAM_BINS]; tiles_x * tiles_y];
    for ty in 0..tiles_y {
        for tx in 0..tiles_x {
            let x0 = tx * tile_w;
            let x1 = ((tx + 1) * tile_w).min(width);
            let y0 = ty * tile_h;
            let y1 = ((ty + 1) * tile_h).min(height);
            let mut histogram = [0u32; HISTOGRAM_BINS];
            for y in y0..y1 {
                for x in x0..x1 {
                    histogram[pixels[y * width + x] as usize] += 1;
                }
            }
            let area = ((x1 - x0) * (y1 - y0)) as u32;
            build_tile_lut(&mut luts[ty * tiles_x + tx], &histogram, area);
        }
    }

    let mut output = vec![0u8; pixels.len()];
    for y in 0..height {
        let gy = (y as f32 + 0.5) / tile_h as f32 - 0.5;
        let ty0 = gy.floor().clamp(0.0, (tiles_y - 1) as f32) as usize;
        let ty1 = (ty0 + 1).min(tiles_y - 1);
        let wy = (gy - ty0 as f32).clamp(0.0, 1.0);
        for x in 0..width {
            let gx = (x as f32 + 0.5) / tile_w as f32 - 0.5;
            let tx0 = gx.floor().clamp(0.0, (tiles_x - 1) as f32) as usize;
            let tx1 = (tx0 + 1).min(tiles_x - 1);
            let wx = (gx - tx0 as f32).clamp(0.0, 1.0);

            let value = pixels[y * width + x] as usize;
            let top = luts[ty0 * tiles_x + tx0][value] as f32 * (1.0 - wx)
                + luts[ty0 * tiles_x + tx1][value] as f32 * wx;
            let bottom = luts[ty1 * tiles_x + tx0][value] as f32 * (1.0 - wx)
                + luts[ty1 * tiles_x + tx1][value] as f32 * wx;
            output[y * width + x] = (top * (1.0 - wy) + bottom * wy).round().min(255.0) as u8;
        }
    }
    output
}

fn build_tile_lut(lut: &mut [u8; HISTOGRAM_BINS], histogram: &[u32; HISTOGRAM_BINS], area: u32) {
    if area == 0 {
        return;
    }

    let clip = (CLIP_LIMIT * area as f32 / HISTOGRAM_BINS as f32).max(1.0) as u32;
    let mut clipped = [0u32; HISTOGRAM_BINS];
    let mut excess = 0u32;
    for (bin, &count) in clipped.iter_mut().zip(histogram.iter()) {
        if count > clip {
            excess += count - clip;
            *bin = clip;
        } else {
            *bin = count;
        }
    }

    // spread the clipped mass evenly, remainder onto the lowest bins
    let bonus = excess / HISTOGRAM_BINS as u32;
    let mut leftover = excess % HISTOGRAM_BINS as u32;
    for bin in clipped.iter_mut() {
        *bin += bonus;
        if leftover > 0 {
            *bin += 1;
            leftover -= 1;
        }
    }

    let scale = (HISTOGRAM_BINS - 1) as f32 / area as f32;
    let mut cumulative = 0u32;
    for (entry, &count) in lut.iter_mut().zip(clipped.iter()) {
        cumulative += count;
        *entry = (cumulative as f32 * scale).round().min(255.0) as u8;
    }
}

/// Non-local-means denoise: every pixel becomes the similarity-weighted
/// average of the pixels in its search window, where similarity is the mean
/// squared difference between the surrounding patches.
pub fn nl_means_denoise(pixels: &[u8], width: usize, height: usize) -> Vec<u8> {
    assert_eq!(pixels.len(), width * height);
    if width == 0 || height == 0 {
        return Vec::new();
    }

    let h2 = NLM_FILTER_STRENGTH * NLM_FILTER_STRENGTH;
    let mut output = vec![0u8; pixels.len()];
    for y in 0..height {
        let sy_lo = y.saturating_sub(NLM_SEARCH_RADIUS);
        let sy_hi = (y + NLM_SEARCH_RADIUS + 1).min(height);
        for x in 0..width {
            let sx_lo = x.saturating_sub(NLM_SEARCH_RADIUS);
            let sx_hi = (x + NLM_SEARCH_RADIUS + 1).min(width);

            let mut weight_sum = 0.0f32;
            let mut value_sum = 0.0f32;
            for sy in sy_lo..sy_hi {
                for sx in sx_lo..sx_hi {
                    let d2 = patch_distance(pixels, width, height, x, y, sx, sy);
                    let weight = (-d2 / h2).exp();
                    weight_sum += weight;
                    value_sum += weight * pixels[sy * width + sx] as f32;
                }
            }

            output[y * width + x] = if weight_sum > 0.0 {
                (value_sum / weight_sum).round().min(255.0) as u8
            } else {
                pixels[y * width + x]
            };
        }
    }
    output
}

fn patch_distance(
    pixels: &[u8],
    width: usize,
    height: usize,
    x0: usize,
    y0: usize,
    x1: usize,
    y1: usize,
) -> f32 {
    let radius = NLM_PATCH_RADIUS as isize;
    let mut sum = 0.0f32;
    let mut count = 0u32;
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            let a = sample_clamped(pixels, width, height, x0 as isize + dx, y0 as isize + dy);
            let b = sample_clamped(pixels, width, height, x1 as isize + dx, y1 as isize + dy);
            let diff = a as f32 - b as f32;
            sum += diff * diff;
            count += 1;
        }
    }
    sum / count as f32
}

fn sample_clamped(pixels: &[u8], width: usize, height: usize, x: isize, y: isize) -> u8 {
    let x = x.clamp(0, width as isize - 1) as usize;
    let y = y.clamp(0, height as isize - 1) as usize;
    pixels[y * width + x]
}
