//! One exposure-bracket merge cycle: select a patch, align mid and high
//! against low, then merge row by row.

use crate::align::{self, Alignment, Patch};
use crate::backend::{CpuBackend, MergeBackend};
use crate::config::HdrConfig;
use crate::error::{Exposure, HdrError};
use crate::image::Image;
use crate::merge::Exposures;

/// Everything the merge stage needs from alignment, for a single cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleContext {
    pub width: usize,
    pub height: usize,
    pub patch: Patch,
    pub mid: Alignment,
    pub hi: Alignment,
}

pub struct HdrMerger<B: MergeBackend = CpuBackend> {
    config: HdrConfig,
    backend: B,
}

impl HdrMerger<CpuBackend> {
    pub fn cpu(config: HdrConfig) -> Result<Self, HdrError> {
        Self::new(config, CpuBackend)
    }
}

impl<B: MergeBackend> HdrMerger<B> {
    pub fn new(config: HdrConfig, backend: B) -> Result<Self, HdrError> {
        config.validate()?;

        Ok(Self { config, backend })
    }

    #[inline]
    pub fn config(&self) -> &HdrConfig {
        &self.config
    }

    #[inline]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Merges the three exposures into a newly allocated image.
    pub fn compute(
        &self,
        low: Option<&Image>,
        mid: Option<&Image>,
        hi: Option<&Image>,
    ) -> Result<Image, HdrError> {
        let (low, mid, hi) = require_inputs(low, mid, hi)?;
        let exposures = check_resolutions(low, mid, hi)?;
        let mut output = exposures.low.copy_zeroed();
        self.run(&exposures, &mut output)?;

        Ok(output)
    }

    /// Merges the three exposures into `output`, overwriting every pixel.
    pub fn compute_into(
        &self,
        low: Option<&Image>,
        mid: Option<&Image>,
        hi: Option<&Image>,
        output: Option<&mut Image>,
    ) -> Result<(), HdrError> {
        let (low, mid, hi) = require_inputs(low, mid, hi)?;
        let output = output.ok_or_else(|| missing(Exposure::Output))?;

        let exposures = check_resolutions(low, mid, hi)?;
        check_resolution(Exposure::Output, exposures.dimensions(), output)?;

        self.run(&exposures, output)
    }

    /// Runs only the alignment stages.
    pub fn align(
        &self,
        low: Option<&Image>,
        mid: Option<&Image>,
        hi: Option<&Image>,
    ) -> Result<CycleContext, HdrError> {
        let (low, mid, hi) = require_inputs(low, mid, hi)?;
        let exposures = check_resolutions(low, mid, hi)?;

        self.align_exposures(&exposures)
    }

    fn align_exposures(&self, exposures: &Exposures<'_>) -> Result<CycleContext, HdrError> {
        let (width, height) = exposures.dimensions();
        let config = &self.config;
        let patch = align::select_block(config, exposures.low);

        let (mid, hi) = rayon::join(
            || align::find_offset(config, exposures.low, exposures.mid, Exposure::Mid, patch),
            || align::find_offset(config, exposures.low, exposures.hi, Exposure::High, patch),
        );
        let (mid, hi) = (mid?, hi?);

        log::info!(
            "offset mid: ({}, {}) similarity {:?}",
            mid.offset.top,
            mid.offset.left,
            mid.similarity
        );
        log::info!(
            "offset hi: ({}, {}) similarity {:?}",
            hi.offset.top,
            hi.offset.left,
            hi.similarity
        );

        Ok(CycleContext {
            width,
            height,
            patch,
            mid,
            hi,
        })
    }

    fn run(&self, exposures: &Exposures<'_>, output: &mut Image) -> Result<(), HdrError> {
        let (width, height) = exposures.dimensions();
        log::info!(
            "merging {}x{} exposures on the {} backend",
            width,
            height,
            self.backend.name()
        );

        let ctx = self.align_exposures(exposures)?;

        self.backend
            .merge(&ctx, exposures, output)
            .map_err(|err| HdrError::Backend(Box::new(err)))
    }
}

fn missing(which: Exposure) -> HdrError {
    log::warn!("{} is missing, skipping merge", which);
    HdrError::MissingInput(which)
}

fn require_inputs<'a>(
    low: Option<&'a Image>,
    mid: Option<&'a Image>,
    hi: Option<&'a Image>,
) -> Result<(&'a Image, &'a Image, &'a Image), HdrError> {
    Ok((
        low.ok_or_else(|| missing(Exposure::Low))?,
        mid.ok_or_else(|| missing(Exposure::Mid))?,
        hi.ok_or_else(|| missing(Exposure::High))?,
    ))
}

fn check_resolutions<'a>(
    low: &'a Image,
    mid: &'a Image,
    hi: &'a Image,
) -> Result<Exposures<'a>, HdrError> {
    check_resolution(Exposure::Mid, low.dimensions(), mid)?;
    check_resolution(Exposure::High, low.dimensions(), hi)?;

    Ok(Exposures { low, mid, hi })
}

fn check_resolution(
    which: Exposure,
    expected: (usize, usize),
    image: &Image,
) -> Result<(), HdrError> {
    if image.dimensions() != expected {
        return Err(HdrError::InconsistentResolutions {
            which,
            expected,
            actual: image.dimensions(),
        });
    }

    Ok(())
}
