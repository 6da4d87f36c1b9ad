//! Translation-only alignment of one exposure against another.
//!
//! A texture-rich square patch is picked on the base image ([`select_block`]),
//! then every displacement within the search radius is scored against the
//! comparison image ([`find_offset`]).

pub mod block;
pub mod offset;

pub use block::select_block;
pub use offset::find_offset;

/// Top-left corner of the square patch used for alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Patch {
    pub top: usize,
    pub left: usize,
}

/// Integer translation mapping a comparison image onto the base image:
/// base pixel `(x, y)` corresponds to `(x + left, y + top)` in the other one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Offset {
    pub top: i32,
    pub left: i32,
}

impl Offset {
    pub const ZERO: Offset = Offset { top: 0, left: 0 };

    #[inline]
    pub fn new(top: i32, left: i32) -> Self {
        Self { top, left }
    }
}

/// Result of an offset search.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Alignment {
    pub offset: Offset,
    /// Best similarity found, `None` if every candidate patch was flat.
    pub similarity: Option<f32>,
}
