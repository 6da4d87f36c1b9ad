use crate::config::HdrConfig;
use crate::image::Image;

use super::Patch;

/// Sliding sum over the last `N` luma differences.
struct DiffRing {
    diffs: Vec<f32>,
    head: usize,
    sum: f32,
}

impl DiffRing {
    fn new(len: usize) -> Self {
        Self {
            diffs: vec![0.0; len.max(1)],
            head: 0,
            sum: 0.0,
        }
    }

    /// Pushes `diff`, evicting the oldest value, and returns the new sum.
    #[inline]
    fn push(&mut self, diff: f32) -> f32 {
        self.sum -= self.diffs[self.head];
        self.sum += diff;
        self.diffs[self.head] = diff;

        self.head += 1;
        if self.head == self.diffs.len() {
            self.head = 0;
        }

        self.sum
    }
}

/// Keeps a patch corner far enough from the borders that the whole search
/// window, `radius` on each side, stays inside `[0, len)`. Images too small
/// for that split the spare room evenly.
#[inline]
fn clamp_corner(pos: usize, block: usize, len: usize, radius: usize) -> usize {
    let margin = radius.min((len - block) / 2);
    pos.clamp(margin, len - block - margin)
}

/// Picks the alignment patch on `base`.
///
/// Walks the main diagonal of the largest centered square, keeping a
/// windowed sum of absolute luma differences between consecutive samples.
/// The diagonal position where that sum peaks (first strict maximum) is the
/// patch corner, clamped so the patch and its search window fit inside the
/// image.
pub fn select_block(config: &HdrConfig, base: &Image) -> Patch {
    let (width, height) = base.dimensions();
    let block = config.effective_block_size(width, height);

    let (x0, y0) = if width > height {
        ((width - height) / 2, 0)
    } else {
        (0, (height - width) / 2)
    };

    let mut ring = DiffRing::new(block.saturating_sub(1));
    let mut best = Patch { top: y0, left: x0 };
    let mut max_diff = 0.0f32;
    let mut prev_gray = 0.0f32;

    for step in 0..width.min(height) {
        let (x, y) = (x0 + step, y0 + step);
        let gray = base.luma(x, y);
        let windowed = ring.push((gray - prev_gray).abs());

        if windowed > max_diff {
            max_diff = windowed;
            best = Patch { top: y, left: x };
        }

        prev_gray = gray;
    }

    let patch = Patch {
        top: clamp_corner(best.top, block, height, config.max_offset),
        left: clamp_corner(best.left, block, width, config.max_offset),
    };

    log::debug!(
        "selected block at ({}, {}) with diagonal variation {:.4} (peak at ({}, {}))",
        patch.top,
        patch.left,
        max_diff,
        best.top,
        best.left,
    );

    patch
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(block_size: usize) -> HdrConfig {
        HdrConfig {
            block_size,
            max_offset: 4,
        }
    }

    #[test]
    fn ring_keeps_a_trailing_window() {
        let mut ring = DiffRing::new(3);
        assert_eq!(ring.push(1.0), 1.0);
        assert_eq!(ring.push(2.0), 3.0);
        assert_eq!(ring.push(4.0), 7.0);
        assert_eq!(ring.push(8.0), 14.0);
        assert_eq!(ring.push(0.0), 12.0);
    }

    #[test]
    fn step_on_diagonal_is_selected() {
        // black until the diagonal reaches 20, white afterwards
        let img = Image::from_fn(64, 64, |x, y| {
            if x.min(y) >= 20 {
                [255, 255, 255, 255]
            } else {
                [0, 0, 0, 255]
            }
        })
        .unwrap();

        assert_eq!(select_block(&config(8), &img), Patch { top: 20, left: 20 });
    }

    #[test]
    fn landscape_images_scan_the_centered_square() {
        // 80x40: crop margin of 20 on the left
        let img = Image::from_fn(80, 40, |x, y| {
            if x == 20 + 10 && y == 10 {
                [200, 200, 200, 255]
            } else {
                [0, 0, 0, 255]
            }
        })
        .unwrap();

        // the spike contributes two differences, the window peaks one step later
        assert_eq!(select_block(&config(8), &img), Patch { top: 11, left: 31 });
    }

    #[test]
    fn portrait_images_scan_the_centered_square() {
        let img = Image::from_fn(30, 50, |x, y| {
            if x >= 5 && y >= 15 {
                [90, 90, 90, 255]
            } else {
                [0, 0, 0, 255]
            }
        })
        .unwrap();

        assert_eq!(select_block(&config(8), &img), Patch { top: 15, left: 5 });
    }

    #[test]
    fn clamp_leaves_room_for_the_search_window() {
        assert_eq!(clamp_corner(0, 10, 100, 5), 5);
        assert_eq!(clamp_corner(40, 10, 100, 5), 40);
        assert_eq!(clamp_corner(99, 10, 100, 5), 85);
        // not enough room for the full radius
        assert_eq!(clamp_corner(0, 10, 14, 5), 2);
        assert_eq!(clamp_corner(9, 10, 14, 5), 2);
        assert_eq!(clamp_corner(3, 4, 4, 50), 0);
    }

    #[test]
    fn corner_is_clamped_away_from_the_border() {
        let img = Image::from_fn(32, 32, |x, y| {
            if x.min(y) >= 30 {
                [255, 255, 255, 255]
            } else {
                [0, 0, 0, 255]
            }
        })
        .unwrap();

        assert_eq!(select_block(&config(8), &img), Patch { top: 20, left: 20 });
    }

    #[test]
    fn black_image_falls_back_to_diagonal_start() {
        let img = Image::new(40, 20, [0, 0, 0, 255]).unwrap();
        assert_eq!(select_block(&config(8), &img), Patch { top: 4, left: 10 });
    }
}
