mod cpu;
pub mod wgpu;

pub use self::cpu::CpuBackend;
pub use self::wgpu::WgpuBackend;

use crate::hdr::CycleContext;
use crate::image::Image;
use crate::merge::Exposures;

pub trait Backend {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Short name used in logs.
    fn name(&self) -> &'static str;
}

pub trait MergeBackend: Backend {
    /// Runs [`crate::merge::merge_row`] once for every row of `output`,
    /// returning only after all rows are written.
    fn merge(
        &self,
        ctx: &CycleContext,
        exposures: &Exposures<'_>,
        output: &mut Image,
    ) -> Result<(), Self::Error>;
}
