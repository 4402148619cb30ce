//! Slices and the file naming contract shared by decomposition and
//! reconstruction.
//!
//! A slice of volume `scan1` at index `7` is stored as `scan1_7.png`. The index
//! is the second-to-last token of the file name split on `_` and `.`; the stem
//! is the source file name up to its first `.`.

use std::path::Path;

use ndarray::{Array2, Axis, Ix2, Ix3};

use crate::error::{Error, Result};
use crate::format::FormatAdapter;
use crate::header::Header;

/// Extension of every slice written by the decomposer.
pub const SLICE_EXTENSION: &str = "png";

/// A 2D cut of a volume along its third axis.
#[derive(Debug, Clone, PartialEq)]
pub struct Slice {
    pub data: Array2<f32>,
    pub stem: String,
    pub index: usize,
}

impl Slice {
    pub fn new(data: Array2<f32>, stem: impl Into<String>, index: usize) -> Self {
        Self {
            data,
            stem: stem.into(),
            index,
        }
    }

    pub fn file_name(&self) -> String {
        slice_file_name(&self.stem, self.index)
    }

    /// Write the slice as `dir/<stem>_<index>.png` and return the file name
    pub fn write(&self, dir: impl AsRef<Path>) -> Result<String> {
        let file = self.file_name();
        FormatAdapter::write(dir.as_ref().join(&file), &self.data, &Header::None)?;
        Ok(file)
    }

    /// Read a slice file, recovering stem and index from its name
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let (stem, index) = parse_slice_name(path)?;
        Ok(Self::new(read_slice(path)?, stem, index))
    }
}

/// `<stem>_<index>.png`
pub fn slice_file_name(stem: &str, index: usize) -> String {
    format!("{stem}_{index}.{SLICE_EXTENSION}")
}

/// File name of `path` up to its first `.`
pub fn volume_stem(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    path.file_name()
        .and_then(|name| name.to_str())
        .and_then(|name| name.split('.').next())
        .filter(|stem| !stem.is_empty())
        .map(str::to_string)
        .ok_or_else(|| Error::InvalidConfig(format!("{path:?} has no usable file stem")))
}

/// Slice index encoded in a file name: the second-to-last token after
/// splitting on `_` and `.`.
pub fn parse_slice_index(path: impl AsRef<Path>) -> Result<usize> {
    parse_slice_name(path).map(|(_, index)| index)
}

/// Stem and index encoded in a slice file name.
///
/// This is the compatibility path for slices without a manifest; it relies
/// entirely on the naming convention and is best-effort.
pub fn parse_slice_name(path: impl AsRef<Path>) -> Result<(String, usize)> {
    let path = path.as_ref();
    let malformed = || Error::MalformedSliceName {
        path: path.to_path_buf(),
    };
    let name = path.file_name().and_then(|name| name.to_str()).ok_or_else(malformed)?;

    let tokens: Vec<&str> = name.split(['_', '.']).collect();
    let token = tokens
        .len()
        .checked_sub(2)
        .map(|i| tokens[i])
        .ok_or_else(malformed)?;
    let index = token.parse::<usize>().map_err(|_| malformed())?;

    // `<stem>_<index>.<ext>`: the stem is what precedes the index token
    let suffix = format!("_{token}.");
    let stem = name
        .rfind(&suffix)
        .map(|position| &name[..position])
        .filter(|stem| !stem.is_empty())
        .ok_or_else(malformed)?;
    Ok((stem.to_string(), index))
}

/// Read a file that holds a single 2D slice.
///
/// Volumetric files with a single slice along the third axis are accepted.
pub fn read_slice(path: impl AsRef<Path>) -> Result<Array2<f32>> {
    let path = path.as_ref();
    let (data, _) = FormatAdapter::read(path)?;
    let shape = data.shape().to_vec();
    match data.ndim() {
        2 => data
            .into_dimensionality::<Ix2>()
            .map_err(|e| Error::ShapeMismatch(e.to_string())),
        3 if shape[2] == 1 => data
            .into_dimensionality::<Ix3>()
            .map(|volume| volume.index_axis_move(Axis(2), 0))
            .map_err(|e| Error::ShapeMismatch(e.to_string())),
        _ => Err(Error::ShapeMismatch(format!(
            "{path:?} is not a 2D slice, shape {shape:?}"
        ))),
    }
}
