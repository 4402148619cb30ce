use ndarray::{Array2, ArrayBase, ArrayView2, Data, Ix2};
use rayon::prelude::*;

use crate::error::{Error, Result};

pub(crate) struct Interpolator;

impl Interpolator {
    /// Source coordinate read by output sample `index` when an axis of length
    /// `source` is resampled to `target` samples. Corner-aligned: the first and
    /// last samples of both grids coincide.
    #[inline]
    pub(crate) fn source_coordinate(index: usize, source: usize, target: usize) -> f32 {
        if target <= 1 || source <= 1 {
            return 0.0;
        }
        let zoom = (source - 1) as f64 / (target - 1) as f64;
        ((index as f64 * zoom) as f32).min((source - 1) as f32)
    }

    #[inline]
    pub(crate) fn bilinear_interpolate(slice: &ArrayView2<f32>, x: f32, y: f32) -> f32 {
        let (width, height) = slice.dim();

        let x0 = x.floor() as usize;
        let y0 = y.floor() as usize;
        let x1 = (x0 + 1).min(width - 1);
        let y1 = (y0 + 1).min(height - 1);

        let dx = x - x0 as f32;
        let dy = y - y0 as f32;
        let one_minus_dx = 1.0 - dx;
        let one_minus_dy = 1.0 - dy;

        let v00 = slice[[x0, y0]];
        let v01 = slice[[x0, y1]];
        let v10 = slice[[x1, y0]];
        let v11 = slice[[x1, y1]];

        // exact zero weights keep samples that sit on the grid untouched
        let v0 = if dy == 0.0 { v00 } else { v00.mul_add(one_minus_dy, v01 * dy) };
        let v1 = if dy == 0.0 { v10 } else { v10.mul_add(one_minus_dy, v11 * dy) };

        if dx == 0.0 { v0 } else { v0.mul_add(one_minus_dx, v1 * dx) }
    }
}

/// Resize a 2D slice to `(target_width, target_height)` with order-1
/// (bilinear) interpolation.
///
/// `target_width` is the first array axis and `target_height` the second,
/// matching the `(width, height, depth)` layout of volumes. Each axis is
/// zoomed independently by `target / current`. Resizing to the current shape
/// returns an identical copy.
pub fn resize_2d<S>(
    slice: &ArrayBase<S, Ix2>,
    target_width: usize,
    target_height: usize,
) -> Result<Array2<f32>>
where
    S: Data<Elem = f32>,
{
    let (width, height) = slice.dim();
    if width == 0 || height == 0 || target_width == 0 || target_height == 0 {
        return Err(Error::ShapeMismatch(format!(
            "cannot resize {width}x{height} slice to {target_width}x{target_height}"
        )));
    }
    if (width, height) == (target_width, target_height) {
        return Ok(slice.to_owned());
    }

    let source = slice.view();
    let view = &source;
    let pixel_data: Vec<f32> = (0..target_width)
        .into_par_iter()
        .flat_map_iter(move |x| {
            let src_x = Interpolator::source_coordinate(x, width, target_width);
            (0..target_height).map(move |y| {
                let src_y = Interpolator::source_coordinate(y, height, target_height);
                Interpolator::bilinear_interpolate(view, src_x, src_y)
            })
        })
        .collect();

    Array2::from_shape_vec((target_width, target_height), pixel_data)
        .map_err(|e| Error::ShapeMismatch(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_resize_to_same_shape_is_identity() {
        let slice = Array2::from_shape_fn((7, 5), |(x, y)| (x * 13 + y * 3) as f32 * 0.37);
        let resized = resize_2d(&slice, 7, 5).unwrap();
        assert_eq!(resized, slice);
    }

    #[test]
    fn test_upsample_interpolates_linearly() {
        let slice = array![[0.0_f32, 10.0], [20.0, 30.0]];
        let resized = resize_2d(&slice, 3, 3).unwrap();
        assert_eq!(resized.dim(), (3, 3));
        assert_eq!(resized[[0, 0]], 0.0);
        assert_eq!(resized[[0, 2]], 10.0);
        assert_eq!(resized[[2, 0]], 20.0);
        assert_eq!(resized[[2, 2]], 30.0);
        assert!((resized[[1, 1]] - 15.0).abs() < 1e-5);
        assert!((resized[[0, 1]] - 5.0).abs() < 1e-5);
    }

    #[test]
    fn test_axes_resize_independently() {
        let slice = Array2::from_shape_fn((4, 6), |(x, _)| x as f32);
        let resized = resize_2d(&slice, 7, 2).unwrap();
        assert_eq!(resized.dim(), (7, 2));
        for x in 0..7 {
            let expected = x as f32 * 0.5;
            assert!((resized[[x, 0]] - expected).abs() < 1e-5);
            assert!((resized[[x, 1]] - expected).abs() < 1e-5);
        }
    }

    #[test]
    fn test_downsample_then_upsample_keeps_linear_ramp() {
        let slice = Array2::from_shape_fn((9, 9), |(x, y)| (x + y) as f32);
        let small = resize_2d(&slice, 5, 5).unwrap();
        let back = resize_2d(&small, 9, 9).unwrap();
        for (a, b) in slice.iter().zip(back.iter()) {
            assert!((a - b).abs() < 1e-4);
        }
    }

    #[test]
    fn test_single_sample_axis() {
        let slice = array![[4.0_f32, 8.0]];
        let resized = resize_2d(&slice, 3, 1).unwrap();
        assert_eq!(resized, array![[4.0_f32], [4.0], [4.0]]);
    }

    #[test]
    fn test_zero_target_is_rejected() {
        let slice = Array2::<f32>::zeros((3, 3));
        assert!(matches!(resize_2d(&slice, 0, 3), Err(Error::ShapeMismatch(_))));
    }
}
