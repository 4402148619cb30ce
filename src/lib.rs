//! # volume-slicer library
//!
//! This crate cuts volumetric medical images into 2D slices and rebuilds
//! volumes from a directory of (possibly processed) slices.
//!
//! Volumes can be read from and written to NIfTI, GIPL and NRRD files as well
//! as single-slice PNGs. Any of these may carry an extra `.gz` suffix; writes
//! to a `.gz` path are atomic, so the destination either holds the complete
//! compressed file or is left untouched.
//! Slices are taken along the third axis of the volume and resampled
//! bilinearly to a canonical in-plane size. Each slice is written as
//! `<stem>_<index>.png` next to a `<stem>.slices.json` manifest that records
//! the index of every file. If the environment supports it slices are
//! written, read and resampled in parallel using rayon.
//!
//! Before slicing, intensities can be:
//!  - Normalized into an output range (default `0..=255`)
//!  - Contrast adjusted using foreground percentiles and histogram
//!    equalization
//!
//! Reconstruction takes the shape and header from the original volume, so the
//! rebuilt file keeps its spatial metadata.
//!
//! # Examples
//!
//! ## Slicing a volume and rebuilding it
//!
//! ```no_run
//! # use volume_slicer::{Decomposer, Reconstructor, SliceConfig, Volume};
//! let volume = Volume::read("scan1.nii.gz").expect("should have read the volume");
//! let (width, height, _) = volume.dim();
//! Decomposer::decompose(&volume, "scan1.nii.gz", "slices", &SliceConfig::new(width, height))
//!     .expect("should have written slices");
//!
//! let rebuilt = Reconstructor::reconstruct("scan1", "slices", &volume)
//!     .expect("should have rebuilt the volume");
//! assert!(rebuilt.skipped.is_empty());
//! rebuilt.volume.write("scan1_rebuilt.nii.gz").expect("should have written the volume");
//! ```
//!
//! ## Running the configured pipeline
//!
//! ```no_run
//! # use volume_slicer::{Pipeline, PipelineConfig};
//! let config = PipelineConfig::load("pipeline.json").expect("should have read config");
//! let pipeline = Pipeline::new(config).expect("config should be valid");
//! pipeline.slice_volume("scan1.nrrd", "slices").expect("should have sliced");
//! pipeline
//!     .rebuild_volume("scan1", "predictions", "scan1.nrrd", "scan1_pred.nrrd")
//!     .expect("should have rebuilt");
//! ```

pub mod config;
pub mod decomposer;
pub mod enums;
pub mod error;
pub mod format;
pub mod header;
pub mod intensity;
mod interpolator;
pub mod manifest;
pub mod pipeline;
pub mod reconstructor;
pub mod slice;
pub mod slice_loader;
pub mod volume;

pub use config::{ContrastConfig, NormalizeConfig, PipelineConfig, SliceConfig};
pub use decomposer::Decomposer;
pub use enums::{Compression, FormatKind, SliceRole};
pub use error::{Error, Result};
pub use format::{FileFormat, FormatAdapter};
pub use header::Header;
pub use interpolator::resize_2d;
pub use manifest::{SliceManifest, SliceRecord};
pub use pipeline::Pipeline;
pub use reconstructor::{Reconstruction, Reconstructor, SkippedSlice};
pub use slice::Slice;
pub use slice_loader::load_slice;
pub use volume::Volume;
