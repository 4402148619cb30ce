//! Uniform read/write access to volumetric and 2D container formats.
//!
//! The format of a path is resolved once, from its file name, into a
//! [`FileFormat`]: a base [`FormatKind`] plus an optional gzip layer
//! (`scan.nii.gz`, `scan.nrrd.gz`, ...). Paths that do not end with a known
//! suffix are rejected with [`Error::UnsupportedFormat`].
//!
//! Supported base formats:
//!
//! - **NIfTI-1** (`.nii`), through the `nifti` crate
//! - **GIPL** (`.gipl`)
//! - **NRRD** (`.nrrd`, attached data)
//! - **PNG** (`.png`, 2D only, no header)

pub mod gipl;
mod gzip;
mod nii;
pub mod nrrd;
mod png;
mod sample;

pub(crate) use png::MAX_VALUE as PNG_MAX_VALUE;

use std::path::Path;

use ndarray::{ArrayBase, ArrayD, ArrayViewD, Data, Dimension};
use tracing::debug;

use crate::enums::{Compression, FormatKind};
use crate::error::{Error, Result};
use crate::header::Header;

const KINDS: [FormatKind; 4] = [
    FormatKind::Nifti,
    FormatKind::Gipl,
    FormatKind::Nrrd,
    FormatKind::Png,
];

const GZIP_SUFFIX: &str = ".gz";

/// Format of a file as resolved from its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileFormat {
    pub kind: FormatKind,
    pub compression: Compression,
}

impl FileFormat {
    /// Resolve the format from the file name suffix, case-insensitively
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let unsupported = || Error::UnsupportedFormat {
            path: path.to_path_buf(),
        };
        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(str::to_ascii_lowercase)
            .ok_or_else(unsupported)?;

        let (base, compression) = match name.strip_suffix(GZIP_SUFFIX) {
            Some(base) => (base, Compression::Gzip),
            None => (name.as_str(), Compression::None),
        };
        let kind = KINDS
            .into_iter()
            .find(|kind| base.len() > kind.suffix().len() && base.ends_with(kind.suffix()))
            .ok_or_else(unsupported)?;

        Ok(Self { kind, compression })
    }
}

pub struct FormatAdapter;

impl FormatAdapter {
    /// Read any supported file into an `f32` array and its header.
    ///
    /// Volumetric formats keep their native axis order (`[x, y, z]`); PNG
    /// images are `[row, column]` with [`Header::None`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedFormat`] for unknown suffixes, or the
    /// underlying I/O or decoding error.
    pub fn read(path: impl AsRef<Path>) -> Result<(ArrayD<f32>, Header)> {
        let path = path.as_ref();
        let format = FileFormat::from_path(path)?;
        debug!(path = %path.display(), format = format.kind.name(), compression = ?format.compression, "Reading");

        match format.compression {
            Compression::None => Self::read_base(format.kind, path),
            Compression::Gzip => gzip::read_compressed(path, format.kind.suffix(), |base| {
                Self::read_base(format.kind, base)
            }),
        }
    }

    /// Write `data` to `path` in the format named by its suffix.
    ///
    /// A header of another format (or [`Header::None`]) is replaced by the
    /// target format's defaults. Paths ending in `.gz` are written through an
    /// atomic compress-and-rename step.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedFormat`] for unknown suffixes,
    /// [`Error::PartialCompressionFailure`] when the gzip layer fails, or the
    /// underlying encoding error.
    pub fn write<S, D>(path: impl AsRef<Path>, data: &ArrayBase<S, D>, header: &Header) -> Result<()>
    where
        S: Data<Elem = f32>,
        D: Dimension,
    {
        let path = path.as_ref();
        let format = FileFormat::from_path(path)?;
        debug!(path = %path.display(), format = format.kind.name(), compression = ?format.compression, "Writing");

        let data = data.view().into_dyn();
        match format.compression {
            Compression::None => Self::write_base(format.kind, path, &data, header),
            Compression::Gzip => gzip::write_compressed(path, format.kind.suffix(), |base| {
                Self::write_base(format.kind, base, &data, header)
            }),
        }
    }

    fn read_base(kind: FormatKind, path: &Path) -> Result<(ArrayD<f32>, Header)> {
        match kind {
            FormatKind::Nifti => nii::read(path),
            FormatKind::Gipl => gipl::read(path),
            FormatKind::Nrrd => nrrd::read(path),
            FormatKind::Png => png::read(path),
        }
    }

    fn write_base(kind: FormatKind, path: &Path, data: &ArrayViewD<f32>, header: &Header) -> Result<()> {
        match kind {
            FormatKind::Nifti => nii::write(path, data, header),
            FormatKind::Gipl => gipl::write(path, data, header),
            FormatKind::Nrrd => nrrd::write(path, data, header),
            FormatKind::Png => png::write(path, data),
        }
    }
}
