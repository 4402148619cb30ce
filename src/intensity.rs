//! Stateless intensity transforms.
//!
//! Every transform takes an explicit input and output [`IntensityRange`] (or a
//! config from which they are derived) and returns a new array. The only
//! in-place operation is [`binarize_in_place`] for label slices.
//!
//! Degenerate ranges never divide by zero: mapping a zero-width input range
//! yields the midpoint of the output range for every element.

use ndarray::{Array, ArrayBase, Data, DataMut, Dimension};

use crate::config::{ContrastConfig, NormalizeConfig};
use crate::error::{Error, Result};

/// Ordered `(min, max)` pair of intensities.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntensityRange {
    pub min: f32,
    pub max: f32,
}

impl IntensityRange {
    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Extrema of `data`, ignoring NaN. `None` when no finite value exists.
    pub fn of<S, D>(data: &ArrayBase<S, D>) -> Option<Self>
    where
        S: Data<Elem = f32>,
        D: Dimension,
    {
        let (min, max) = data
            .iter()
            .filter(|v| !v.is_nan())
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });
        (min <= max).then_some(Self { min, max })
    }

    /// Range spanned by the `pmin`/`pmax` percentiles of `values`
    pub fn from_percentiles(values: &[f32], pmin: f32, pmax: f32) -> Option<Self> {
        let sorted = sorted_finite(values.iter().copied());
        Some(Self {
            min: percentile_sorted(&sorted, pmin)?,
            max: percentile_sorted(&sorted, pmax)?,
        })
    }

    pub fn width(&self) -> f32 {
        self.max - self.min
    }

    /// True when the range cannot be used as a divisor.
    pub fn is_degenerate(&self) -> bool {
        !(self.max > self.min)
    }

    pub fn midpoint(&self) -> f32 {
        self.min + (self.max - self.min) / 2.0
    }

    /// Clip `value` into the range. Unlike `f32::clamp` this never panics on
    /// an inverted range.
    #[inline]
    pub fn clip(&self, value: f32) -> f32 {
        value.max(self.min).min(self.max)
    }
}

/// Affine map of `input` onto `output`, clipping values outside `input`.
///
/// Elements at or beyond `input.min`/`input.max` land exactly on
/// `output.min`/`output.max`.
pub fn rescale<S, D>(
    data: &ArrayBase<S, D>,
    input: IntensityRange,
    output: IntensityRange,
) -> Array<f32, D>
where
    S: Data<Elem = f32>,
    D: Dimension,
{
    if input.is_degenerate() {
        return Array::from_elem(data.raw_dim(), output.midpoint());
    }

    let in_width = input.width();
    let out_width = output.width();
    data.mapv(|v| {
        let t = (v - input.min) / in_width;
        if t <= 0.0 {
            output.min
        } else if t >= 1.0 {
            output.max
        } else {
            output.clip(t.mul_add(out_width, output.min))
        }
    })
}

/// Rescale `data` from its input range (explicit or its own extrema) into the
/// configured output range.
pub fn normalize<S, D>(data: &ArrayBase<S, D>, config: &NormalizeConfig) -> Array<f32, D>
where
    S: Data<Elem = f32>,
    D: Dimension,
{
    let input = match (config.in_min, config.in_max) {
        (Some(min), Some(max)) => IntensityRange::new(min, max),
        (min, max) => match IntensityRange::of(data) {
            Some(extrema) => {
                IntensityRange::new(min.unwrap_or(extrema.min), max.unwrap_or(extrema.max))
            }
            None => return data.to_owned(),
        },
    };
    rescale(data, input, IntensityRange::new(config.out_min, config.out_max))
}

/// Percentile stretch, histogram equalization, then a final normalization so
/// the result spans exactly the output range.
///
/// Percentiles are taken over nonzero elements only; zero voxels are treated
/// as background.
pub fn adjust_contrast<S, D>(data: &ArrayBase<S, D>, config: &ContrastConfig) -> Result<Array<f32, D>>
where
    S: Data<Elem = f32>,
    D: Dimension,
{
    config.validate()?;
    let extrema = IntensityRange::of(data).ok_or(Error::EmptyForeground)?;
    let output = IntensityRange::new(
        config.out_min.unwrap_or(extrema.min),
        config.out_max.unwrap_or(extrema.max),
    );

    let foreground: Vec<f32> = data.iter().copied().filter(|&v| v != 0.0).collect();
    let window = IntensityRange::from_percentiles(&foreground, config.pmin, config.pmax)
        .ok_or(Error::EmptyForeground)?;
    if window.is_degenerate() {
        return Ok(Array::from_elem(data.raw_dim(), output.midpoint()));
    }

    let stretched = rescale(data, window, output);
    let equalized = equalize_hist(&stretched, config.bins);
    let equalized_range = IntensityRange::of(&equalized).unwrap_or(output);
    Ok(rescale(&equalized, equalized_range, output))
}

/// Global histogram equalization.
///
/// Builds `nbins` equal-width bins over the data range and maps each element
/// through the normalized cumulative histogram, linearly interpolated between
/// bin centers. The result lies in `(0, 1]`.
pub fn equalize_hist<S, D>(data: &ArrayBase<S, D>, nbins: usize) -> Array<f32, D>
where
    S: Data<Elem = f32>,
    D: Dimension,
{
    let nbins = nbins.max(1);
    let Some(range) = IntensityRange::of(data) else {
        return data.to_owned();
    };
    if range.is_degenerate() {
        return data.mapv(|v| if v.is_nan() { v } else { 1.0 });
    }

    let bin_width = range.width() / nbins as f32;
    let mut histogram = vec![0u64; nbins];
    for &v in data.iter().filter(|v| !v.is_nan()) {
        let bin = (((v - range.min) / bin_width) as usize).min(nbins - 1);
        histogram[bin] += 1;
    }

    let total: u64 = histogram.iter().sum();
    let mut running = 0u64;
    let cdf: Vec<f32> = histogram
        .iter()
        .map(|&count| {
            running += count;
            (running as f64 / total as f64) as f32
        })
        .collect();

    data.mapv(|v| {
        if v.is_nan() {
            return v;
        }
        // position in units of bins, relative to the first bin center
        let position = (v - range.min) / bin_width - 0.5;
        if position <= 0.0 {
            cdf[0]
        } else if position >= (nbins - 1) as f32 {
            cdf[nbins - 1]
        } else {
            let lower = position.floor() as usize;
            let fraction = position - lower as f32;
            cdf[lower] + (cdf[lower + 1] - cdf[lower]) * fraction
        }
    })
}

/// `p`-th percentile (0..=100) of `values` with linear interpolation between
/// closest ranks. NaN values are ignored.
pub fn percentile(values: &[f32], p: f32) -> Option<f32> {
    percentile_sorted(&sorted_finite(values.iter().copied()), p)
}

fn sorted_finite(values: impl Iterator<Item = f32>) -> Vec<f32> {
    let mut sorted: Vec<f32> = values.filter(|v| !v.is_nan()).collect();
    sorted.sort_unstable_by(f32::total_cmp);
    sorted
}

fn percentile_sorted(sorted: &[f32], p: f32) -> Option<f32> {
    if sorted.is_empty() || !(0.0..=100.0).contains(&p) {
        return None;
    }
    let rank = f64::from(p) / 100.0 * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let fraction = (rank - lower as f64) as f32;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}

/// Map a slice into `[0, 1]` quantized to 8-bit steps.
///
/// Data with a positive maximum is first rescaled by its own extrema; the
/// result is truncated to `floor(255 * x)` and divided by 255.
pub fn quantize_unit<S, D>(data: &ArrayBase<S, D>) -> Array<f32, D>
where
    S: Data<Elem = f32>,
    D: Dimension,
{
    let scaled = match IntensityRange::of(data) {
        Some(range) if range.max > 0.0 && !range.is_degenerate() => {
            data.mapv(|v| (v - range.min) / range.width())
        }
        _ => data.to_owned(),
    };
    scaled.mapv(|v| (255.0 * v).floor().clamp(0.0, 255.0) / 255.0)
}

/// Label-mode thresholding: `< threshold` becomes 0, `>= threshold` becomes 1.
pub fn binarize_in_place<S, D>(data: &mut ArrayBase<S, D>, threshold: f32)
where
    S: DataMut<Elem = f32>,
    D: Dimension,
{
    data.mapv_inplace(|v| {
        if v < threshold {
            0.0
        } else if v >= threshold {
            1.0
        } else {
            v
        }
    });
}
