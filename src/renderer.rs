//! Volumetric view of a whole volume.
//!
//! The renderer does not draw anything itself. It produces a [`VolumeFigure`]:
//! one coordinate per voxel plus the windowed intensity, shaped like a Plotly
//! `volume` trace so any plotting front end can display it.

use std::{fs, path::Path};

use ndarray::Array1;
use serde::Serialize;

use crate::{
    config::RenderSettings,
    normalizer::{self, ThresholdWindow},
    volume::{Volume, VolumeError},
};

#[derive(Debug, Clone, Serialize)]
pub struct VolumeFigure {
    #[serde(rename = "type")]
    pub kind: &'static str,
    /// Width coordinate of each voxel.
    pub x: Vec<f32>,
    /// Height coordinate of each voxel.
    pub y: Vec<f32>,
    /// Depth coordinate of each voxel.
    pub z: Vec<f32>,
    /// Windowed intensity in `[0, 1]`.
    pub value: Vec<f32>,
    pub opacity: f32,
    pub surface_count: u32,
    pub colorscale: String,
    pub window: ThresholdWindow,
    pub layout: FigureLayout,
}

#[derive(Debug, Clone, Serialize)]
pub struct FigureLayout {
    pub width: u32,
    pub height: u32,
    pub axis_titles: [&'static str; 3],
}

impl Default for FigureLayout {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            axis_titles: ["X", "Y", "Z"],
        }
    }
}

impl VolumeFigure {
    pub fn len(&self) -> usize {
        self.value.len()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        fs::write(path, serde_json::to_vec(self)?)
    }
}

/// `n` evenly spaced points from 0 to 1. A single point sits at 0.
fn ramp(n: usize) -> Array1<f32> {
    if n <= 1 {
        return Array1::zeros(n);
    }
    Array1::linspace(0.0, 1.0, n)
}

pub struct VolumeRenderer;

impl VolumeRenderer {
    /// Build the full figure for `volume` seen through `window`.
    ///
    /// Every call recomputes everything; there is no incremental update.
    ///
    /// # Errors
    ///
    /// Returns [`VolumeError::InvalidShape`] for an empty volume, after logging
    /// a warning. Nothing is rendered in that case.
    pub fn render(
        volume: &Volume,
        window: ThresholdWindow,
        settings: &RenderSettings,
    ) -> Result<VolumeFigure, VolumeError> {
        if let Err(err) = volume.validate() {
            log::warn!("{err}. Skipping 3D view.");
            return Err(err);
        }

        let (depth, height, width) = volume.dim();
        let (zs, ys, xs) = (ramp(depth), ramp(height), ramp(width));
        let len = depth * height * width;

        let mut x = Vec::with_capacity(len);
        let mut y = Vec::with_capacity(len);
        let mut z = Vec::with_capacity(len);
        for &zv in &zs {
            for &yv in &ys {
                for &xv in &xs {
                    x.push(xv);
                    y.push(yv);
                    z.push(zv);
                }
            }
        }

        let value: Vec<f32> = normalizer::normalize(volume.data(), window)
            .iter()
            .copied()
            .collect();

        log::debug!(
            "Rendered {len} voxels with window {}..{}",
            window.min(),
            window.max()
        );
        Ok(VolumeFigure {
            kind: "volume",
            x,
            y,
            z,
            value,
            opacity: settings.opacity,
            surface_count: settings.surface_count,
            colorscale: settings.colorscale.clone(),
            window,
            layout: FigureLayout::default(),
        })
    }
}
