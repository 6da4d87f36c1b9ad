//! Per-row averaging of an aligned exposure triple.

use crate::align::Offset;
use crate::color::{self, Rgb, Rgba8};
use crate::image::Image;

/// The three input exposures of one merge cycle, all of the same size.
#[derive(Debug, Clone, Copy)]
pub struct Exposures<'a> {
    pub low: &'a Image,
    pub mid: &'a Image,
    pub hi: &'a Image,
}

impl<'a> Exposures<'a> {
    #[inline]
    pub fn dimensions(&self) -> (usize, usize) {
        self.low.dimensions()
    }
}

/// Shifts `coord` by `offset` along an axis of length `len`.
///
/// A zero offset always succeeds. Otherwise the shifted coordinate must
/// satisfy `coord > -offset` and `coord + offset < len`; both bounds are
/// strict, so a shift landing exactly on index 0 is rejected as well.
#[inline]
pub fn shift(coord: usize, offset: i32, len: usize) -> Option<usize> {
    if offset == 0 {
        return Some(coord);
    }

    let coord = coord as i64;
    let offset = offset as i64;

    if coord > -offset && coord + offset < len as i64 {
        Some((coord + offset) as usize)
    } else {
        None
    }
}

#[inline]
fn sample(image: &Image, row: Option<usize>, col: Option<usize>) -> Option<Rgb> {
    Some(color::unpack(image.pixel(col?, row?)))
}

/// Merges row `y` into `out`, which holds exactly one output row.
///
/// Mid and high samples are read at the offset position; where that
/// position is rejected by [`shift`] the low-exposure sample stands in.
pub fn merge_row(exposures: &Exposures<'_>, mid: Offset, hi: Offset, y: usize, out: &mut [Rgba8]) {
    let (width, height) = exposures.dimensions();
    debug_assert_eq!(out.len(), width);

    let row_mid = shift(y, mid.top, height);
    let row_hi = shift(y, hi.top, height);
    let row_low = exposures.low.row(y);

    for (x, (px, &low)) in out.iter_mut().zip(row_low).enumerate() {
        let low = color::unpack(low);
        let px_mid = sample(exposures.mid, row_mid, shift(x, mid.left, width)).unwrap_or(low);
        let px_hi = sample(exposures.hi, row_hi, shift(x, hi.left, width)).unwrap_or(low);

        *px = color::pack([
            (low[0] + px_mid[0] + px_hi[0]) / 3.0,
            (low[1] + px_mid[1] + px_hi[1]) / 3.0,
            (low[2] + px_mid[2] + px_hi[2]) / 3.0,
        ]);
    }
}
