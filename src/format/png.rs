use std::path::Path;

use image::{DynamicImage, ImageBuffer, ImageFormat, Luma};
use ndarray::{Array2, ArrayD, ArrayViewD, Ix2};

use crate::error::{Error, Result};
use crate::header::Header;

/// Largest sample a 16-bit grayscale PNG can hold.
pub(crate) const MAX_VALUE: f32 = 65535.0;

/// Read a PNG as a single-channel array indexed `[row, column]`.
///
/// Colour images are converted to luma, keeping their bit depth.
pub(crate) fn read(path: &Path) -> Result<(ArrayD<f32>, Header)> {
    let image = image::open(path)?;
    let (width, height) = (image.width() as usize, image.height() as usize);

    let values: Vec<f32> = match image {
        DynamicImage::ImageLuma8(buffer) => buffer.into_raw().into_iter().map(f32::from).collect(),
        DynamicImage::ImageLuma16(buffer) => {
            buffer.into_raw().into_iter().map(f32::from).collect()
        }
        other if other.color().bytes_per_pixel() == other.color().channel_count() => {
            other.to_luma8().into_raw().into_iter().map(f32::from).collect()
        }
        other => other.to_luma16().into_raw().into_iter().map(f32::from).collect(),
    };

    let data = Array2::from_shape_vec((height, width), values)
        .map_err(|e| Error::ShapeMismatch(e.to_string()))?;
    Ok((data.into_dyn(), Header::None))
}

/// Write a 2D array as a grayscale PNG, 8-bit when every rounded value fits
/// `0..=255` and 16-bit when it fits `0..=65535`.
pub(crate) fn write(path: &Path, data: &ArrayViewD<f32>) -> Result<()> {
    let data = data
        .view()
        .into_dimensionality::<Ix2>()
        .map_err(|_| Error::ShapeMismatch(format!("PNG needs a 2D array, got shape {:?}", data.shape())))?;
    let (rows, columns) = data.dim();
    let (width, height) = match (u32::try_from(columns), u32::try_from(rows)) {
        (Ok(width), Ok(height)) => (width, height),
        _ => {
            return Err(Error::ShapeMismatch(format!(
                "{rows}x{columns} is too large for PNG"
            )));
        }
    };

    let rounded: Vec<f32> = data.iter().map(|v| v.round()).collect();
    let (low, high) = rounded
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    if rounded.iter().any(|v| v.is_nan()) || (!rounded.is_empty() && low < 0.0) || high > MAX_VALUE {
        return Err(Error::ValueOutOfRange(format!(
            "PNG slices need values in 0..=65535, got [{low}, {high}]"
        )));
    }

    let mismatch = || Error::ShapeMismatch(format!("{rows}x{columns} buffer does not match"));
    if high <= 255.0 {
        let pixels: Vec<u8> = rounded.iter().map(|&v| v as u8).collect();
        ImageBuffer::<Luma<u8>, _>::from_raw(width, height, pixels)
            .ok_or_else(mismatch)?
            .save_with_format(path, ImageFormat::Png)?;
    } else {
        let pixels: Vec<u16> = rounded.iter().map(|&v| v as u16).collect();
        ImageBuffer::<Luma<u16>, _>::from_raw(width, height, pixels)
            .ok_or_else(mismatch)?
            .save_with_format(path, ImageFormat::Png)?;
    }
    Ok(())
}
