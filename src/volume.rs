use crate::enums::Orientation;
use crate::normalizer::{self, ThresholdWindow};

use image::{GrayImage, Luma};
use ndarray::Array3;
use ndarray::ArrayView2;
use ndarray::Axis;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VolumeError {
    #[error("Expected a non-empty 3D volume, but got shape {shape:?}")]
    InvalidShape { shape: (usize, usize, usize) },

    #[error("{orientation} slice index {index} is outside 0..{extent}")]
    IndexOutOfBounds {
        orientation: Orientation,
        index: usize,
        extent: usize,
    },

    #[error("Threshold minimum {min} must not exceed maximum {max}")]
    InvalidThreshold { min: f32, max: f32 },

    #[error("Threshold {min}..{max} lies outside the observed intensity range {lo}..{hi}")]
    ThresholdOutOfRange { min: f32, max: f32, lo: f32, hi: f32 },

    #[error("Failed to write image: {0}")]
    Image(#[from] image::ImageError),
}

/// Stack of slices as a (depth, height, width) intensity grid. Never
/// modified after assembly.
#[derive(Debug, Clone)]
pub struct Volume {
    data: Array3<f32>,
    range: Option<(f32, f32)>,
}

/// One cross-section of a specific volume. Only obtainable through
/// [`Volume::slice_view`], so the index is always in bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliceView {
    orientation: Orientation,
    index: usize,
    shape: (usize, usize, usize),
}

impl SliceView {
    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

/// Grey-level rendering of a [`SliceView`].
#[derive(Debug, Clone)]
pub struct SliceImage {
    pub view: SliceView,
    pub image: GrayImage,
}

impl SliceImage {
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), VolumeError> {
        self.image.save(path)?;
        Ok(())
    }
}

impl Volume {
    pub fn new(data: Array3<f32>) -> Self {
        let range = normalizer::observed_range(&data);
        Self { data, range }
    }

    /// Get the dimensions of the volume (depth, height, width)
    pub fn dim(&self) -> (usize, usize, usize) {
        self.data.dim()
    }

    /// Get a reference to the underlying data
    pub fn data(&self) -> &Array3<f32> {
        &self.data
    }

    /// Smallest and largest finite intensity, `None` for an empty volume.
    pub fn observed_range(&self) -> Option<(f32, f32)> {
        self.range
    }

    /// Ensure the volume can be rendered and exported.
    pub fn validate(&self) -> Result<(), VolumeError> {
        if self.data.is_empty() || self.range.is_none() {
            return Err(VolumeError::InvalidShape { shape: self.dim() });
        }
        Ok(())
    }

    /// Window covering every observed intensity.
    pub fn default_threshold(&self) -> Result<ThresholdWindow, VolumeError> {
        self.range
            .map(ThresholdWindow::from_range)
            .ok_or(VolumeError::InvalidShape { shape: self.dim() })
    }

    /// Validate a user window against the observed range.
    pub fn threshold(&self, min: f32, max: f32) -> Result<ThresholdWindow, VolumeError> {
        let window = ThresholdWindow::new(min, max)?;
        let (lo, hi) = self
            .range
            .ok_or(VolumeError::InvalidShape { shape: self.dim() })?;
        if !window.within((lo, hi)) {
            return Err(VolumeError::ThresholdOutOfRange { min, max, lo, hi });
        }
        Ok(window)
    }

    /// Number of slices available along `orientation`.
    pub fn extent(&self, orientation: Orientation) -> usize {
        self.data.len_of(Axis(orientation.axis()))
    }

    pub fn slice_view(
        &self,
        orientation: Orientation,
        index: usize,
    ) -> Result<SliceView, VolumeError> {
        let extent = self.extent(orientation);
        if index >= extent {
            return Err(VolumeError::IndexOutOfBounds {
                orientation,
                index,
                extent,
            });
        }
        Ok(SliceView {
            orientation,
            index,
            shape: self.dim(),
        })
    }

    /// The middle cross-section along `orientation`.
    pub fn default_slice_view(&self, orientation: Orientation) -> Result<SliceView, VolumeError> {
        let max_index = self.extent(orientation).saturating_sub(1);
        self.slice_view(orientation, max_index / 2)
    }

    pub fn get_slice_from_axis(&self, view: &SliceView) -> Result<ArrayView2<'_, f32>, VolumeError> {
        if view.shape != self.dim() {
            return Err(VolumeError::IndexOutOfBounds {
                orientation: view.orientation,
                index: view.index,
                extent: self.extent(view.orientation),
            });
        }
        Ok(self
            .data
            .index_axis(Axis(view.orientation.axis()), view.index))
    }

    /// Cross-section stretched over its own intensity range, independent of
    /// any threshold window.
    pub fn get_image_from_axis(&self, view: &SliceView) -> Result<SliceImage, VolumeError> {
        let slice = self.get_slice_from_axis(view)?;
        Ok(SliceImage {
            view: *view,
            image: Self::slice_to_image(&slice),
        })
    }

    fn slice_to_image(slice: &ArrayView2<'_, f32>) -> GrayImage {
        let (height, width) = slice.dim();
        let levels = normalizer::to_display_u8(slice);
        GrayImage::from_fn(width as u32, height as u32, |x, y| {
            Luma([levels[[y as usize, x as usize]]])
        })
    }
}
