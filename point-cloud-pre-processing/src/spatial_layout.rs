/// Z-order layout of planar points for cache-friendly incremental insertion
use crate::constants::MORTON_GRID_RESOLUTION;

/// Morton encoding for 2D coordinates (32-bit version)
/// This version can handle coordinates up to 65535x65535 (16 bits each)
pub fn morton_encode_2d(x: u32, y: u32) -> u32 {
    spread_bits(x) | (spread_bits(y) << 1)
}

/// Interleave the low 16 bits of `v` with zeros
fn spread_bits(v: u32) -> u32 {
    let mut v = v & 0x0000_ffff;
    v = (v | (v << 8)) & 0x00ff_00ff;
    v = (v | (v << 4)) & 0x0f0f_0f0f;
    v = (v | (v << 2)) & 0x3333_3333;
    v = (v | (v << 1)) & 0x5555_5555;
    v
}

/// Indices of `points` sorted along the Z-order curve of their bounding box.
/// Ties keep input order.
pub fn z_order(points: &[[f64; 2]]) -> Vec<usize> {
    let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
    let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
    for p in points {
        min_x = min_x.min(p[0]);
        max_x = max_x.max(p[0]);
        min_y = min_y.min(p[1]);
        max_y = max_y.max(p[1]);
    }

    let cells = (MORTON_GRID_RESOLUTION - 1) as f64;
    let quantise = |v: f64, min: f64, max: f64| {
        let span = max - min;
        if span > 0.0 {
            (((v - min) / span) * cells).clamp(0.0, cells) as u32
        } else {
            0
        }
    };

    let mut keyed: Vec<(u32, usize)> = points
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let gx = quantise(p[0], min_x, max_x);
            let gy = quantise(p[1], min_y, max_y);
            (morton_encode_2d(gx, gy), i)
        })
        .collect();
    keyed.sort_by_key(|&(code, i)| (code, i));
    keyed.into_iter().map(|(_, i)| i).collect()
}
