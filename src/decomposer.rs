use std::fs;
use std::path::Path;

use ndarray::Axis;
use rayon::prelude::*;
use tracing::info;
use web_time::Instant;

use crate::config::SliceConfig;
use crate::error::Result;
use crate::interpolator::resize_2d;
use crate::manifest::{SliceManifest, SliceRecord};
use crate::slice::{Slice, volume_stem};
use crate::volume::Volume;

pub struct Decomposer;

impl Decomposer {
    /// Write every slice of `volume` along its third axis as a PNG
    ///
    /// # Arguments
    ///
    /// * `volume` - Volume to cut into slices
    /// * `filename` - Source file name; its part before the first `.` becomes the slice stem
    /// * `outdir` - Directory receiving `<stem>_<z>.png` and the slice manifest
    /// * `config` - Canonical in-plane size slices are resampled to
    ///
    /// # Errors
    ///
    /// Returns error if the configuration is invalid, a slice holds values a
    /// PNG cannot store, or any file cannot be written
    pub fn decompose(
        volume: &Volume,
        filename: impl AsRef<Path>,
        outdir: impl AsRef<Path>,
        config: &SliceConfig,
    ) -> Result<SliceManifest> {
        config.validate()?;
        let stem = volume_stem(filename)?;
        let outdir = outdir.as_ref();
        fs::create_dir_all(outdir)?;

        let start = Instant::now();
        let (width, height, depth) = volume.dim();

        // slices are independent; each z owns its own file
        let slices: Vec<SliceRecord> = volume
            .data()
            .axis_iter(Axis(2))
            .into_par_iter()
            .enumerate()
            .map(|(index, lane)| -> Result<SliceRecord> {
                let resized = resize_2d(&lane, config.width, config.height)?;
                let file = Slice::new(resized, stem.as_str(), index).write(outdir)?;
                Ok(SliceRecord { index, file })
            })
            .collect::<Result<_>>()?;

        let manifest = SliceManifest {
            stem,
            source_shape: [width, height, depth],
            slice_size: [config.width, config.height],
            slices,
        };
        manifest.save(outdir)?;

        info!(
            stem = %manifest.stem,
            slices = depth,
            outdir = %outdir.display(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Decomposed volume"
        );
        Ok(manifest)
    }
}
