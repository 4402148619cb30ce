//! Per-slice loading for 2D consumers.
//!
//! Image slices are mapped into `[0, 1]` in 8-bit steps; label slices are
//! thresholded into `{0, 1}`.

use std::path::Path;

use ndarray::Array2;

use crate::config::DEFAULT_LABEL_THRESHOLD;
use crate::enums::SliceRole;
use crate::error::Result;
use crate::intensity::{binarize_in_place, quantize_unit};
use crate::slice::read_slice;

pub fn load_slice(path: impl AsRef<Path>, role: SliceRole) -> Result<Array2<f32>> {
    let slice = read_slice(path)?;
    Ok(prepare_slice(slice, role))
}

/// Apply the role's transform to an already loaded slice
pub fn prepare_slice(mut slice: Array2<f32>, role: SliceRole) -> Array2<f32> {
    match role {
        SliceRole::Image => quantize_unit(&slice),
        SliceRole::Label => {
            binarize_in_place(&mut slice, DEFAULT_LABEL_THRESHOLD);
            slice
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_image_role_maps_to_unit_range() {
        let slice = array![[10.0_f32, 20.0], [30.0, 60.0]];
        let prepared = prepare_slice(slice, SliceRole::Image);
        assert_eq!(prepared[[0, 0]], 0.0);
        assert_eq!(prepared[[1, 1]], 1.0);
        assert!(prepared.iter().all(|&v| (0.0..=1.0).contains(&v)));
    }

    #[test]
    fn test_label_role_binarizes() {
        let slice = array![[0.0_f32, 200.0], [127.0, 255.0]];
        let prepared = prepare_slice(slice, SliceRole::Label);
        assert_eq!(prepared, array![[0.0_f32, 1.0], [0.0, 1.0]]);
    }

    #[test]
    fn test_load_slice_from_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mask_0.png");
        crate::format::FormatAdapter::write(
            &path,
            &array![[0.0_f32, 255.0], [255.0, 0.0]],
            &crate::header::Header::None,
        )
        .unwrap();

        let label = load_slice(&path, SliceRole::Label).unwrap();
        assert_eq!(label, array![[0.0_f32, 1.0], [1.0, 0.0]]);
    }
}
