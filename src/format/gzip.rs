//! Gzip layering over any base format.
//!
//! Compressed writes never expose a partial destination: the base format is
//! written into a temporary file, compressed into a second temporary file in
//! the destination directory, and only then renamed onto the destination.
//! Both temporaries are removed when they go out of scope, whatever happens.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::Path;

use flate2::Compression as Level;
use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use tempfile::{Builder, NamedTempFile};

use crate::error::{Error, Result};

const TEMP_PREFIX: &str = ".volume-slicer-";

/// Write `path` by running `write_base` on an uncompressed temporary file
/// named with `base_suffix`, then gzip it atomically onto `path`.
pub(crate) fn write_compressed<F>(path: &Path, base_suffix: &str, write_base: F) -> Result<()>
where
    F: FnOnce(&Path) -> Result<()>,
{
    compress_atomically(path, base_suffix, write_base).map_err(|source| {
        Error::PartialCompressionFailure {
            path: path.to_path_buf(),
            source: Box::new(source),
        }
    })
}

fn compress_atomically<F>(path: &Path, base_suffix: &str, write_base: F) -> Result<()>
where
    F: FnOnce(&Path) -> Result<()>,
{
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let base = scoped_temp(dir, base_suffix)?;
    write_base(base.path())?;

    let mut compressed = scoped_temp(dir, ".gz.part")?;
    {
        let mut input = BufReader::new(File::open(base.path())?);
        let mut encoder = GzEncoder::new(BufWriter::new(compressed.as_file_mut()), Level::default());
        io::copy(&mut input, &mut encoder)?;
        encoder.finish()?.flush()?;
    }
    compressed.as_file().sync_all()?;
    compressed.persist(path).map_err(|e| Error::Io(e.error))?;
    Ok(())
}

/// Decompress `path` into a temporary file named with `base_suffix` and hand
/// it to `read_base`.
pub(crate) fn read_compressed<T, F>(path: &Path, base_suffix: &str, read_base: F) -> Result<T>
where
    F: FnOnce(&Path) -> Result<T>,
{
    let mut decoder = MultiGzDecoder::new(BufReader::new(File::open(path)?));
    let mut base = Builder::new()
        .prefix(TEMP_PREFIX)
        .suffix(base_suffix)
        .tempfile()?;
    {
        let mut output = BufWriter::new(base.as_file_mut());
        io::copy(&mut decoder, &mut output)?;
        output.flush()?;
    }
    read_base(base.path())
}

fn scoped_temp(dir: &Path, suffix: &str) -> Result<NamedTempFile> {
    Ok(Builder::new()
        .prefix(TEMP_PREFIX)
        .suffix(suffix)
        .tempfile_in(dir)?)
}
