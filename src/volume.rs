use std::path::Path;

use ndarray::{Array3, ArrayD, ArrayView2, Axis, Ix3, s};

use crate::config::{ContrastConfig, NormalizeConfig};
use crate::error::{Error, Result};
use crate::format::FormatAdapter;
use crate::header::Header;
use crate::intensity;

/// A 3D scan indexed `[x, y, z]` together with the header it was read with.
#[derive(Debug, Clone, Default)]
pub struct Volume {
    pub data: Array3<f32>,
    pub header: Header,
}

impl Volume {
    pub fn new(data: Array3<f32>, header: Header) -> Self {
        Self { data, header }
    }

    /// Build a volume from an array of any rank.
    ///
    /// 2D arrays become single-slice volumes; trailing singleton axes beyond
    /// the third are dropped.
    pub fn from_array(data: ArrayD<f32>, header: Header) -> Result<Self> {
        let mut data = data;
        while data.ndim() > 3 && data.shape()[data.ndim() - 1] == 1 {
            let last = Axis(data.ndim() - 1);
            data = data.index_axis_move(last, 0);
        }
        if data.ndim() == 2 {
            data = data.insert_axis(Axis(2));
        }
        let shape = data.shape().to_vec();
        let data = data
            .into_dimensionality::<Ix3>()
            .map_err(|_| Error::ShapeMismatch(format!("expected a 3D volume, got shape {shape:?}")))?;
        Ok(Self::new(data, header))
    }

    /// Read a volume through the format adapter
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let (data, header) = FormatAdapter::read(path)?;
        Self::from_array(data, header)
    }

    /// Write the volume with its own header
    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        FormatAdapter::write(path, &self.data, &self.header)
    }

    /// Get the dimensions of the volume (width, height, depth)
    pub fn dim(&self) -> (usize, usize, usize) {
        self.data.dim()
    }

    pub fn depth(&self) -> usize {
        self.data.dim().2
    }

    /// Get a reference to the underlying data
    pub fn data(&self) -> &Array3<f32> {
        &self.data
    }

    /// Slice at `index` along the third axis
    pub fn get_slice(&self, index: usize) -> Option<ArrayView2<'_, f32>> {
        if index >= self.depth() {
            return None;
        }
        Some(self.data.slice(s![.., .., index]))
    }

    pub fn slices(&self) -> impl Iterator<Item = ArrayView2<'_, f32>> {
        self.data.axis_iter(Axis(2))
    }

    /// Same header, new voxels
    pub fn with_data(&self, data: Array3<f32>) -> Self {
        Self::new(data, self.header.clone())
    }

    pub fn normalized(&self, config: &NormalizeConfig) -> Self {
        self.with_data(intensity::normalize(&self.data, config))
    }

    pub fn contrast_adjusted(&self, config: &ContrastConfig) -> Result<Self> {
        Ok(self.with_data(intensity::adjust_contrast(&self.data, config)?))
    }
}
