//! Alignment and merging of three exposure-bracketed photos.
//!
//! The low exposure is the reference frame. A texture-rich patch is picked on
//! it, mid and high exposures are aligned against that patch by a bounded
//! translation search, and the three are averaged pixel by pixel with the
//! offsets applied.

pub mod align;
pub mod backend;
pub mod color;
pub mod config;
pub mod error;
pub mod hdr;
pub mod image;
pub mod merge;

pub use crate::align::{Alignment, Offset, Patch};
pub use crate::backend::{Backend, CpuBackend, MergeBackend, WgpuBackend};
pub use crate::config::HdrConfig;
pub use crate::error::{Exposure, HdrError};
pub use crate::hdr::{CycleContext, HdrMerger};
pub use crate::image::Image;
