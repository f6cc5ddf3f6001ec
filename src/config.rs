//! Per-session settings.

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::enums::Orientation;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Failed to create output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Fixed parameters handed to the volumetric plot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    pub opacity: f32,
    /// Number of iso-surface levels.
    pub surface_count: u32,
    pub colorscale: String,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            opacity: 0.1,
            surface_count: 20,
            colorscale: "Gray".to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Where exports and rendered artefacts are written.
    pub output_dir: PathBuf,
    /// Export file name; overwritten on every export.
    pub export_file_name: String,
    /// Extension of slice files inside archives and directories.
    pub slice_extension: String,
    /// Plane shown first after a load.
    pub default_orientation: Orientation,
    pub render: RenderSettings,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("exports"),
            export_file_name: "volume.nii.gz".to_owned(),
            slice_extension: "dcm".to_owned(),
            default_orientation: Orientation::Axial,
            render: RenderSettings::default(),
        }
    }
}

impl SessionConfig {
    /// Read a JSON config. Missing fields keep their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    pub fn export_path(&self) -> PathBuf {
        self.output_dir.join(&self.export_file_name)
    }

    /// Create the output directory if needed.
    pub fn ensure_output_dir(&self) -> Result<&Path, ConfigError> {
        fs::create_dir_all(&self.output_dir).map_err(|source| ConfigError::OutputDir {
            path: self.output_dir.clone(),
            source,
        })?;
        Ok(&self.output_dir)
    }
}
