use std::convert::Infallible;

use rayon::prelude::*;

use super::{Backend, MergeBackend};
use crate::hdr::CycleContext;
use crate::image::Image;
use crate::merge::{self, Exposures};

/// Merges rows in parallel on the rayon thread pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct CpuBackend;

impl Backend for CpuBackend {
    type Error = Infallible;

    fn name(&self) -> &'static str {
        "cpu"
    }
}

impl MergeBackend for CpuBackend {
    fn merge(
        &self,
        ctx: &CycleContext,
        exposures: &Exposures<'_>,
        output: &mut Image,
    ) -> Result<(), Self::Error> {
        let width = output.width();
        let (mid, hi) = (ctx.mid.offset, ctx.hi.offset);

        output
            .pixels_mut()
            .par_chunks_mut(width)
            .enumerate()
            .for_each(|(y, row)| merge::merge_row(exposures, mid, hi, y, row));

        Ok(())
    }
}
