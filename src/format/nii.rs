use std::path::Path;

use ndarray::{ArrayD, ArrayViewD};
use nifti::writer::WriterOptions;
use nifti::{IntoNdArray, NiftiObject, ReaderOptions};

use crate::error::Result;
use crate::header::Header;

/// Read a single-file NIfTI-1 volume. Voxels are scaled by the header's
/// slope/intercept and indexed `[x, y, z]`.
pub(crate) fn read(path: &Path) -> Result<(ArrayD<f32>, Header)> {
    let object = ReaderOptions::new().read_file(path)?;
    let header = object.header().clone();
    let data = object.into_volume().into_ndarray::<f32>()?;
    Ok((data, Header::Nifti(Box::new(header))))
}

/// Write `data` as `float` voxels, reusing the geometry of a NIfTI header
/// when one is given.
pub(crate) fn write(path: &Path, data: &ArrayViewD<f32>, header: &Header) -> Result<()> {
    match header {
        Header::Nifti(reference) => {
            let mut reference = (**reference).clone();
            // voxels are stored already scaled
            reference.scl_slope = 1.0;
            reference.scl_inter = 0.0;
            WriterOptions::new(path)
                .reference_header(&reference)
                .write_nifti(data)?;
        }
        _ => WriterOptions::new(path).write_nifti(data)?,
    }
    Ok(())
}
