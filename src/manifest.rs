//! Slice manifest written next to decomposed slices.
//!
//! The manifest records the explicit index of every slice file, so
//! reconstruction does not have to trust file names. It is stored as
//! `<stem>.slices.json` in the slice directory.

use std::fs;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::Builder;

use crate::error::{Error, Result};

pub const MANIFEST_SUFFIX: &str = ".slices.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SliceRecord {
    pub index: usize,
    /// File name relative to the manifest's directory
    pub file: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SliceManifest {
    pub stem: String,
    /// `(width, height, depth)` of the decomposed volume
    pub source_shape: [usize; 3],
    /// `(width, height)` every slice was resampled to
    pub slice_size: [usize; 2],
    pub slices: Vec<SliceRecord>,
}

impl SliceManifest {
    pub fn path_for(dir: impl AsRef<Path>, stem: &str) -> PathBuf {
        dir.as_ref().join(format!("{stem}{MANIFEST_SUFFIX}"))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let reader = BufReader::new(fs::File::open(path.as_ref())?);
        Ok(serde_json::from_reader(reader)?)
    }

    /// Manifest of `stem` in `dir`, if one was written
    pub fn find(dir: impl AsRef<Path>, stem: &str) -> Result<Option<Self>> {
        let path = Self::path_for(dir, stem);
        if !path.is_file() {
            return Ok(None);
        }
        let manifest = Self::load(&path)?;
        if manifest.stem != stem {
            return Err(Error::StemMismatch {
                path,
                stem: stem.to_string(),
            });
        }
        Ok(Some(manifest))
    }

    /// Write the manifest into `dir`, replacing any previous one atomically
    pub fn save(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let dir = dir.as_ref();
        let path = Self::path_for(dir, &self.stem);
        let mut file = Builder::new().suffix(".json.part").tempfile_in(dir)?;
        {
            let mut writer = BufWriter::new(file.as_file_mut());
            serde_json::to_writer_pretty(&mut writer, self)?;
            writer.flush()?;
        }
        file.persist(&path).map_err(|e| Error::Io(e.error))?;
        Ok(path)
    }

    /// Absolute paths of the recorded slices paired with their index
    pub fn entries<'a>(&'a self, dir: &'a Path) -> impl Iterator<Item = (PathBuf, usize)> + 'a {
        self.slices
            .iter()
            .map(move |record| (dir.join(&record.file), record.index))
    }
}
