//! End-to-end slicing and rebuilding driven by one [`PipelineConfig`].

use std::path::Path;

use tracing::{debug, info};

use crate::config::{NormalizeConfig, PipelineConfig};
use crate::decomposer::Decomposer;
use crate::error::Result;
use crate::format::PNG_MAX_VALUE;
use crate::intensity::IntensityRange;
use crate::manifest::SliceManifest;
use crate::reconstructor::{Reconstruction, Reconstructor};
use crate::volume::Volume;

pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Apply the configured intensity transform, if any.
    ///
    /// The result always fits a PNG slice: when the transformed values fall
    /// outside `0..=65535` (or contain NaN) they are normalized into the
    /// default output range.
    pub fn prepare(&self, volume: &Volume) -> Result<Volume> {
        let transformed = if let Some(contrast) = &self.config.contrast {
            volume.contrast_adjusted(contrast)?
        } else if let Some(normalize) = &self.config.normalize {
            volume.normalized(normalize)
        } else {
            volume.clone()
        };

        if fits_slice_range(&transformed) {
            return Ok(transformed);
        }
        debug!("Values exceed the slice range, normalizing to defaults");
        Ok(transformed.normalized(&NormalizeConfig::default()))
    }

    /// Read `input`, prepare its intensities and write its slices to `outdir`
    pub fn slice_volume(
        &self,
        input: impl AsRef<Path>,
        outdir: impl AsRef<Path>,
    ) -> Result<SliceManifest> {
        let input = input.as_ref();
        let volume = Volume::read(input)?;
        info!(input = %input.display(), dim = ?volume.dim(), "Slicing volume");
        let prepared = self.prepare(&volume)?;
        Decomposer::decompose(&prepared, input, outdir, &self.config.slice)
    }

    /// Rebuild the volume `stem` from `slice_dir` with the shape and header
    /// of `reference`, and write it to `output`
    pub fn rebuild_volume(
        &self,
        stem: &str,
        slice_dir: impl AsRef<Path>,
        reference: impl AsRef<Path>,
        output: impl AsRef<Path>,
    ) -> Result<Reconstruction> {
        let reference = Volume::read(reference)?;
        let reconstruction = Reconstructor::reconstruct(stem, slice_dir, &reference)?;
        reconstruction.volume.write(output)?;
        Ok(reconstruction)
    }

    /// Rebuild into `outdir/<stem>.<output_extension>`
    pub fn rebuild_into(
        &self,
        stem: &str,
        slice_dir: impl AsRef<Path>,
        reference: impl AsRef<Path>,
        outdir: impl AsRef<Path>,
    ) -> Result<Reconstruction> {
        let reference = Volume::read(reference)?;
        let (_, reconstruction) = Reconstructor::reconstruct_into(
            stem,
            slice_dir,
            &reference,
            outdir,
            &self.config.output_extension,
        )?;
        Ok(reconstruction)
    }
}

fn fits_slice_range(volume: &Volume) -> bool {
    if volume.data().iter().any(|v| v.is_nan()) {
        return false;
    }
    IntensityRange::of(volume.data())
        .is_none_or(|range| range.min >= 0.0 && range.max <= PNG_MAX_VALUE)
}
