use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use ndarray::{Array3, Axis};
use rayon::prelude::*;
use tracing::{debug, info, warn};
use web_time::Instant;

use crate::error::{Error, Result};
use crate::format::FileFormat;
use crate::interpolator::resize_2d;
use crate::manifest::{MANIFEST_SUFFIX, SliceManifest};
use crate::slice::{parse_slice_name, read_slice};
use crate::volume::Volume;

/// A slice file that did not contribute to the rebuilt volume, and why.
#[derive(Debug)]
pub struct SkippedSlice {
    pub path: PathBuf,
    pub reason: Error,
}

/// Rebuilt volume plus a report of which slices were used.
#[derive(Debug)]
pub struct Reconstruction {
    pub volume: Volume,
    /// Indices written from a slice file, ascending
    pub filled: Vec<usize>,
    pub skipped: Vec<SkippedSlice>,
}

impl Reconstruction {
    /// Indices left at zero because no slice file covered them
    pub fn missing(&self) -> Vec<usize> {
        let filled: HashSet<usize> = self.filled.iter().copied().collect();
        (0..self.volume.depth())
            .filter(|index| !filled.contains(index))
            .collect()
    }
}

/// Where a slice file's index came from.
#[derive(Debug)]
struct Candidate {
    path: PathBuf,
    index: Result<usize>,
}

pub struct Reconstructor;

impl Reconstructor {
    /// Rebuild a volume from the slices of `stem` found in `dir`
    ///
    /// # Arguments
    ///
    /// * `stem` - Stem the slices were written with
    /// * `dir` - Directory holding the (possibly processed) slice files
    /// * `original` - Volume providing the target shape and header; its voxels are never read
    ///
    /// # Errors
    ///
    /// Returns error if `dir` cannot be listed or its manifest cannot be
    /// parsed. Individual slice failures are reported in
    /// [`Reconstruction::skipped`] instead.
    pub fn reconstruct(
        stem: &str,
        dir: impl AsRef<Path>,
        original: &Volume,
    ) -> Result<Reconstruction> {
        let dir = dir.as_ref();
        let start = Instant::now();
        let (width, height, depth) = original.dim();

        let candidates = Self::discover(stem, dir)?;

        // first claim of an index wins; files are only read once claimed
        let mut claimed: Vec<Option<PathBuf>> = vec![None; depth];
        let mut skipped = Vec::new();
        for Candidate { path, index } in candidates {
            match index.and_then(|index| Self::check_range(&path, index, depth)) {
                Ok(index) if claimed[index].is_none() => claimed[index] = Some(path),
                Ok(index) => skipped.push(SkippedSlice {
                    reason: Error::DuplicateSliceIndex {
                        path: path.clone(),
                        index,
                    },
                    path,
                }),
                Err(reason) => skipped.push(SkippedSlice { path, reason }),
            }
        }

        // each lane along z is written by exactly one task
        let mut data = Array3::<f32>::zeros((width, height, depth));
        let outcomes: Vec<(usize, Option<SkippedSlice>)> = data
            .axis_iter_mut(Axis(2))
            .into_par_iter()
            .zip(claimed.par_iter())
            .enumerate()
            .filter_map(|(index, (mut lane, path))| {
                let path = path.as_ref()?;
                let failure = read_slice(path)
                    .and_then(|slice| resize_2d(&slice, width, height))
                    .map(|resized| lane.assign(&resized))
                    .err()
                    .map(|reason| SkippedSlice {
                        path: path.clone(),
                        reason,
                    });
                Some((index, failure))
            })
            .collect();

        let mut filled = Vec::new();
        for (index, failure) in outcomes {
            match failure {
                None => filled.push(index),
                Some(skip) => skipped.push(skip),
            }
        }

        for skip in &skipped {
            warn!(path = %skip.path.display(), reason = %skip.reason, "Skipped slice");
        }
        info!(
            stem,
            filled = filled.len(),
            skipped = skipped.len(),
            depth,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Reconstructed volume"
        );

        Ok(Reconstruction {
            volume: original.with_data(data),
            filled,
            skipped,
        })
    }

    /// Rebuild a volume and write it to `outdir/<stem>.<extension>`
    ///
    /// # Errors
    ///
    /// Same as [`Reconstructor::reconstruct`], plus any error writing the
    /// output file.
    pub fn reconstruct_into(
        stem: &str,
        dir: impl AsRef<Path>,
        original: &Volume,
        outdir: impl AsRef<Path>,
        extension: &str,
    ) -> Result<(PathBuf, Reconstruction)> {
        let reconstruction = Self::reconstruct(stem, dir, original)?;
        let outdir = outdir.as_ref();
        fs::create_dir_all(outdir)?;
        let output = outdir.join(format!("{stem}.{}", extension.trim_start_matches('.')));
        reconstruction.volume.write(&output)?;
        Ok((output, reconstruction))
    }

    /// Slice files of `stem`, from its manifest when present and from file
    /// names otherwise
    fn discover(stem: &str, dir: &Path) -> Result<Vec<Candidate>> {
        if let Some(manifest) = SliceManifest::find(dir, stem)? {
            debug!(stem, slices = manifest.slices.len(), "Using slice manifest");
            return Ok(manifest
                .entries(dir)
                .map(|(path, index)| Candidate {
                    path,
                    index: Ok(index),
                })
                .collect());
        }

        debug!(stem, dir = %dir.display(), "No slice manifest, parsing file names");
        let mut paths: Vec<_> = fs::read_dir(dir)?
            .filter_map(std::result::Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .filter(|path| {
                path.file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| name.starts_with(stem) && !name.ends_with(MANIFEST_SUFFIX))
            })
            .filter(|path| FileFormat::from_path(path).is_ok())
            .collect();
        paths.sort();

        Ok(paths
            .into_iter()
            .map(|path| {
                let index = Self::index_from_name(stem, &path);
                Candidate { path, index }
            })
            .collect())
    }

    fn index_from_name(stem: &str, path: &Path) -> Result<usize> {
        let (found, index) = parse_slice_name(path)?;
        if found != stem {
            return Err(Error::StemMismatch {
                path: path.to_path_buf(),
                stem: stem.to_string(),
            });
        }
        Ok(index)
    }

    fn check_range(path: &Path, index: usize, depth: usize) -> Result<usize> {
        if index >= depth {
            return Err(Error::SliceIndexOutOfRange {
                path: path.to_path_buf(),
                index,
                depth,
            });
        }
        Ok(index)
    }
}
