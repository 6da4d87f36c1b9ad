use crate::config::HdrConfig;
use crate::error::{Exposure, HdrError};
use crate::image::Image;

use super::{Alignment, Offset, Patch};

/// Marks a cache slot whose luma has not been computed yet; luma is never
/// negative.
const UNCACHED: f32 = -1.0;

/// Lazily filled luma values of the comparison image around the patch.
///
/// Covers the unclamped search window, `(block + 2 * radius)^2` samples
/// starting at `(top - radius, left - radius)`. Slots outside the image are
/// never touched.
struct LumaCache<'a> {
    image: &'a Image,
    values: Vec<f32>,
    span: usize,
    origin_top: isize,
    origin_left: isize,
}

impl<'a> LumaCache<'a> {
    fn new(image: &'a Image, patch: Patch, block: usize, radius: usize) -> Self {
        let span = block + 2 * radius;

        Self {
            image,
            values: vec![UNCACHED; span * span],
            span,
            origin_top: patch.top as isize - radius as isize,
            origin_left: patch.left as isize - radius as isize,
        }
    }

    #[inline]
    fn luma(&mut self, x: usize, y: usize) -> f32 {
        let row = (y as isize - self.origin_top) as usize;
        let col = (x as isize - self.origin_left) as usize;
        let slot = &mut self.values[row * self.span + col];

        if *slot < 0.0 {
            *slot = self.image.luma(x, y);
        }

        *slot
    }
}

/// Inclusive range of displacements along one axis that keep a `block`-wide
/// patch starting at `start` inside `[0, len)`.
#[inline]
fn displacement_range(start: usize, block: usize, len: usize, radius: usize) -> (i32, i32) {
    let back = start.min(radius);
    let forward = (len - block - start).min(radius);

    (-(back as i32), forward as i32)
}

/// Finds the translation of `other` that best matches the `patch` of `base`.
///
/// Every displacement within `max_offset` whose patch lies inside `other` is
/// scored with `Σ|dP·dQ| / sqrt(ΣdP² · ΣdQ²)`, where `dP`/`dQ` are luma
/// deviations from each patch's mean. Candidates are visited row by row and
/// only a strictly better score replaces the current best, so ties resolve
/// to the first candidate in that order. Candidates with a flat patch on
/// either side have no score and are skipped.
///
/// Fails with [`HdrError::InconsistentResolutions`], naming `which`, when
/// `other` and `base` differ in size.
pub fn find_offset(
    config: &HdrConfig,
    base: &Image,
    other: &Image,
    which: Exposure,
    patch: Patch,
) -> Result<Alignment, HdrError> {
    if other.dimensions() != base.dimensions() {
        return Err(HdrError::InconsistentResolutions {
            which,
            expected: base.dimensions(),
            actual: other.dimensions(),
        });
    }

    let (width, height) = base.dimensions();
    let block = config.effective_block_size(width, height);
    let patch = Patch {
        top: patch.top.min(height - block),
        left: patch.left.min(width - block),
    };
    // no displacement can exceed the spare room along the longer axis
    let radius = config.max_offset.min(width.max(height) - block);
    let count = (block * block) as f64;

    let mut base_luma = Vec::with_capacity(block * block);
    for m in 0..block {
        for n in 0..block {
            base_luma.push(base.luma(patch.left + n, patch.top + m));
        }
    }

    let base_mean = base_luma.iter().map(|&v| v as f64).sum::<f64>() / count;
    let base_dev: Vec<f64> = base_luma.iter().map(|&v| v as f64 - base_mean).collect();
    let base_var = base_dev.iter().map(|d| d * d).sum::<f64>();

    let (top_min, top_max) = displacement_range(patch.top, block, height, radius);
    let (left_min, left_max) = displacement_range(patch.left, block, width, radius);

    let mut cache = LumaCache::new(other, patch, block, radius);
    let mut best = Alignment::default();

    for dy in top_min..=top_max {
        let top = (patch.top as i32 + dy) as usize;

        for dx in left_min..=left_max {
            let left = (patch.left as i32 + dx) as usize;

            let mut sum = 0.0f64;
            for m in 0..block {
                for n in 0..block {
                    sum += cache.luma(left + n, top + m) as f64;
                }
            }
            let mean = sum / count;

            let mut num = 0.0f64;
            let mut var = 0.0f64;
            for m in 0..block {
                for n in 0..block {
                    let dq = cache.luma(left + n, top + m) as f64 - mean;
                    let dp = base_dev[m * block + n];
                    num += (dp * dq).abs();
                    var += dq * dq;
                }
            }

            let den = base_var * var;
            if den <= 0.0 {
                continue;
            }

            let similarity = (num / den.sqrt()) as f32;
            if !similarity.is_finite() {
                continue;
            }

            if best.similarity.map_or(true, |s| similarity > s) {
                best = Alignment {
                    offset: Offset::new(dy, dx),
                    similarity: Some(similarity),
                };
            }
        }
    }

    if best.similarity.is_none() {
        log::warn!(
            "every candidate around ({}, {}) has a flat patch, assuming no offset",
            patch.top,
            patch.left
        );
    }

    Ok(best)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(block_size: usize, max_offset: usize) -> HdrConfig {
        HdrConfig {
            block_size,
            max_offset,
        }
    }

    fn search(config: &HdrConfig, base: &Image, other: &Image, patch: Patch) -> Alignment {
        find_offset(config, base, other, Exposure::Mid, patch).unwrap()
    }

    fn noise(x: i64, y: i64) -> u8 {
        let mut h = (x.wrapping_mul(374_761_393) ^ y.wrapping_mul(668_265_263)) as u64;
        h = (h ^ (h >> 13)).wrapping_mul(1_274_126_177);
        (h >> 24) as u8
    }

    /// Noise scene sampled so that `other(x + dx, y + dy) == base(x, y)`.
    fn shifted(width: usize, height: usize, dy: i64, dx: i64) -> Image {
        Image::from_fn(width, height, |x, y| {
            let v = noise(x as i64 - dx, y as i64 - dy);
            [v, v / 2, 255 - v, 255]
        })
        .unwrap()
    }

    #[test]
    fn displacement_range_clamps_at_borders() {
        assert_eq!(displacement_range(20, 10, 100, 5), (-5, 5));
        assert_eq!(displacement_range(2, 10, 100, 5), (-2, 5));
        assert_eq!(displacement_range(88, 10, 100, 5), (-5, 2));
        assert_eq!(displacement_range(0, 4, 4, 50), (0, 0));
    }

    #[test]
    fn identical_images_align_at_zero() {
        let img = shifted(48, 48, 0, 0);
        let found = search(&config(12, 6), &img, &img.clone(), Patch { top: 18, left: 18 });

        assert_eq!(found.offset, Offset::ZERO);
        let similarity = found.similarity.unwrap();
        assert!((similarity - 1.0).abs() < 1e-5, "similarity {similarity}");
    }

    #[test]
    fn recovers_known_shifts() {
        let base = shifted(64, 64, 0, 0);
        for &(dy, dx) in &[(3, -2), (-7, 7), (0, 5), (-1, 0), (7, 7)] {
            let other = shifted(64, 64, dy, dx);
            let found = search(&config(16, 7), &base, &other, Patch { top: 24, left: 24 });
            assert_eq!(
                found.offset,
                Offset::new(dy as i32, dx as i32),
                "shift ({dy}, {dx})"
            );
        }
    }

    #[test]
    fn recovers_shift_with_window_clamped_at_border() {
        let base = shifted(40, 40, 0, 0);
        let other = shifted(40, 40, -2, 3);
        let found = search(&config(10, 6), &base, &other, Patch { top: 2, left: 27 });

        assert_eq!(found.offset, Offset::new(-2, 3));
    }

    #[test]
    fn ties_keep_the_first_candidate() {
        // period-4 pattern: displacements that are multiples of 4 match exactly
        const COLS: [u8; 4] = [10, 200, 60, 130];
        const ROWS: [u8; 4] = [0, 40, 5, 25];
        let img = Image::from_fn(40, 40, |x, y| {
            let v = COLS[x % 4] + ROWS[y % 4];
            [v, v, v, 255]
        })
        .unwrap();

        let found = search(&config(8, 6), &img, &img.clone(), Patch { top: 16, left: 16 });
        assert_eq!(found.offset, Offset::new(-4, -4));
    }

    #[test]
    fn flat_patches_never_win() {
        let flat = Image::new(32, 32, [90, 90, 90, 255]).unwrap();
        let textured = shifted(32, 32, 0, 0);

        let found = search(&config(8, 4), &flat, &textured, Patch { top: 12, left: 12 });
        assert_eq!(found, Alignment::default());

        let found = search(&config(8, 4), &textured, &flat, Patch { top: 12, left: 12 });
        assert_eq!(found.offset, Offset::ZERO);
        assert_eq!(found.similarity, None);
    }

    #[test]
    fn oversized_max_offset_is_capped_by_the_image() {
        let base = shifted(16, 16, 0, 0);
        let other = shifted(16, 16, 2, -1);
        let huge = search(&config(8, 1 << 40), &base, &other, Patch { top: 4, left: 4 });
        let fitted = search(&config(8, 8), &base, &other, Patch { top: 4, left: 4 });

        assert_eq!(huge, fitted);
        assert_eq!(huge.offset, Offset::new(2, -1));
    }

    #[test]
    fn mismatched_sizes_are_rejected() {
        let base = shifted(32, 32, 0, 0);
        let other = shifted(32, 16, 0, 0);

        assert!(matches!(
            find_offset(&config(8, 4), &base, &other, Exposure::Mid, Patch { top: 12, left: 12 }),
            Err(HdrError::InconsistentResolutions {
                which: Exposure::Mid,
                expected: (32, 32),
                actual: (32, 16),
            })
        ));
    }

    #[test]
    fn each_luma_is_computed_once() {
        let img = shifted(32, 32, 0, 0);
        let patch = Patch { top: 10, left: 10 };
        let mut cache = LumaCache::new(&img, patch, 8, 4);

        assert_eq!(cache.values.len(), 16 * 16);
        let first = cache.luma(6, 6);
        assert_eq!(cache.values[0], first);
        assert_eq!(cache.luma(6, 6), first);
        assert!(cache.values[1..].iter().all(|&v| v == UNCACHED));
    }
}
