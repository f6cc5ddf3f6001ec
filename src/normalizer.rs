//! Display rescaling of intensity grids.
//!
//! Nothing here touches the volume itself; every function returns a new grid.

use ndarray::{Array, Array2, ArrayBase, ArrayView2, Data, Dimension, Zip};
use serde::{Deserialize, Serialize};

use crate::volume::VolumeError;

/// Keeps the rescale finite when the window collapses to a single value.
pub const EPSILON: f32 = 1e-5;

/// Intensity range made visible in the volume render.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdWindow {
    min: f32,
    max: f32,
}

impl ThresholdWindow {
    pub fn new(min: f32, max: f32) -> Result<Self, VolumeError> {
        if min.is_nan() || max.is_nan() || min > max {
            return Err(VolumeError::InvalidThreshold { min, max });
        }
        Ok(Self { min, max })
    }

    /// Window spanning `range` exactly.
    pub fn from_range((min, max): (f32, f32)) -> Self {
        Self { min, max }
    }

    pub fn min(&self) -> f32 {
        self.min
    }

    pub fn max(&self) -> f32 {
        self.max
    }

    /// Whether this window lies inside `range`.
    pub fn within(&self, (lo, hi): (f32, f32)) -> bool {
        self.min >= lo && self.max <= hi
    }

    #[inline]
    pub fn rescale(&self, value: f32) -> f32 {
        (value.clamp(self.min, self.max) - self.min) / (self.max - self.min + EPSILON)
    }
}

/// Smallest and largest finite value of `grid`, `None` when it has none.
pub fn observed_range<S, D>(grid: &ArrayBase<S, D>) -> Option<(f32, f32)>
where
    S: Data<Elem = f32>,
    D: Dimension,
{
    grid.iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(None, |range, v| match range {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

/// Clip `grid` to `window` and rescale it to `[0, 1]`.
///
/// A constant grid yields zeros of the same shape.
pub fn normalize<S, D>(grid: &ArrayBase<S, D>, window: ThresholdWindow) -> Array<f32, D>
where
    S: Data<Elem = f32>,
    D: Dimension,
{
    match observed_range(grid) {
        Some((lo, hi)) if lo < hi => Zip::from(grid).par_map_collect(|&v| window.rescale(v)),
        _ => Array::zeros(grid.raw_dim()),
    }
}

/// Stretch a 2D grid over its own observed range into `0..=255` grey levels.
pub fn to_display_u8(grid: &ArrayView2<'_, f32>) -> Array2<u8> {
    match observed_range(grid) {
        Some((lo, hi)) if lo < hi => {
            let (lo, hi) = (f64::from(lo), f64::from(hi));
            Zip::from(grid).par_map_collect(|&v| {
                ((f64::from(v).clamp(lo, hi) - lo) / (hi - lo) * 255.0) as u8
            })
        }
        _ => Array2::zeros(grid.raw_dim()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{Array3, array};

    #[test]
    fn constant_grid_is_all_zero() {
        let grid = Array3::<f32>::from_elem((2, 3, 4), 42.0);
        let normalized = normalize(&grid, ThresholdWindow::new(0.0, 100.0).unwrap());

        assert_eq!(normalized.dim(), (2, 3, 4));
        assert!(normalized.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn degenerate_window_does_not_divide_by_zero() {
        let grid = array![[1.0_f32, 5.0], [9.0, 5.0]];
        let normalized = normalize(&grid, ThresholdWindow::new(5.0, 5.0).unwrap());

        assert!(normalized.iter().all(|v| v.is_finite()));
        assert!(normalized.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn values_land_in_unit_interval_and_are_clipped() {
        let grid = array![[-50.0_f32, 0.0, 50.0], [100.0, 150.0, 75.0]];
        let window = ThresholdWindow::new(0.0, 100.0).unwrap();
        let normalized = normalize(&grid, window);

        assert!(normalized.iter().all(|&v| (0.0..=1.0).contains(&v)));
        assert_eq!(normalized[[0, 0]], normalized[[0, 1]]);
        assert_eq!(normalized[[1, 1]], normalized[[1, 0]]);
        assert_abs_diff_eq!(normalized[[0, 2]], 0.5, epsilon = 1e-4);
        assert_abs_diff_eq!(normalized[[1, 0]], 1.0, epsilon = 1e-4);
    }

    #[test]
    fn rejects_inverted_windows() {
        assert!(matches!(
            ThresholdWindow::new(10.0, 1.0),
            Err(VolumeError::InvalidThreshold { .. })
        ));
        assert!(ThresholdWindow::new(f32::NAN, 1.0).is_err());
    }

    #[test]
    fn observed_range_skips_non_finite() {
        let grid = array![[3.0_f32, f32::NAN], [-2.0, 8.0]];

        assert_eq!(observed_range(&grid), Some((-2.0, 8.0)));
        assert_eq!(observed_range(&Array2::<f32>::zeros((0, 3))), None);
    }

    #[test]
    fn display_stretch_spans_full_grey_range() {
        let grid = array![[-10.0_f32, 0.0], [10.0, 10.0]];
        let image = to_display_u8(&grid.view());

        assert_eq!(image, array![[0_u8, 127], [255, 255]]);
    }

    #[test]
    fn display_maximum_is_always_white() {
        for hi in 1..400 {
            let grid = Array2::from_shape_fn((1, hi + 1), |(_, c)| c as f32);
            let image = to_display_u8(&grid.view());

            assert_eq!(image[[0, 0]], 0, "range 0..={hi}");
            assert_eq!(image[[0, hi]], 255, "range 0..={hi}");
            for (c, &level) in image.iter().enumerate() {
                let expected = (c as f64 / hi as f64 * 255.0) as u8;
                assert_eq!(level, expected, "value {c} in range 0..={hi}");
            }
        }
    }

    #[test]
    fn constant_display_is_black() {
        let grid = Array2::<f32>::from_elem((3, 2), 7.0);

        assert!(to_display_u8(&grid.view()).iter().all(|&v| v == 0));
    }
}
