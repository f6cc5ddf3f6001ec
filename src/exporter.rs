//! NIfTI export of a whole volume.
//!
//! The written file keeps voxel values and nothing else: intensities are cast
//! to `i16` and the spatial transform is the identity, so no orientation or
//! spacing survives the export.

use std::path::{Path, PathBuf};

use ndarray::Array3;
use nifti::{NiftiHeader, header::MAGIC_CODE_NIP1, writer::WriterOptions};
use thiserror::Error;

use crate::volume::{Volume, VolumeError};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Volume(#[from] VolumeError),

    #[error("Failed to write NIfTI file {path}: {source}")]
    Write {
        path: PathBuf,
        source: nifti::error::NiftiError,
    },
}

/// A written export file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub path: PathBuf,
    pub shape: (usize, usize, usize),
    /// Voxels outside the `i16` range, stored saturated.
    pub saturated_voxels: usize,
}

/// Row-major identity affine.
pub const IDENTITY_AFFINE: [[f32; 4]; 4] = [
    [1.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0],
    [0.0, 0.0, 0.0, 1.0],
];

pub struct Exporter;

impl Exporter {
    /// Cast intensities to `i16`. Values beyond the range saturate and
    /// fractional parts are truncated; the count of saturated voxels is
    /// returned alongside.
    pub fn to_i16(data: &Array3<f32>) -> (Array3<i16>, usize) {
        let range = f32::from(i16::MIN)..=f32::from(i16::MAX);
        let saturated = data.iter().filter(|&&v| !range.contains(&v)).count();
        (data.mapv(|v| v as i16), saturated)
    }

    /// Header carrying the identity transform as sform (code 1) and unit
    /// voxel sizes.
    pub fn identity_header() -> NiftiHeader {
        let [srow_x, srow_y, srow_z, _] = IDENTITY_AFFINE;
        NiftiHeader {
            pixdim: [1.0; 8],
            sform_code: 1,
            qform_code: 0,
            srow_x,
            srow_y,
            srow_z,
            scl_slope: 1.0,
            scl_inter: 0.0,
            magic: *MAGIC_CODE_NIP1,
            ..NiftiHeader::default()
        }
    }

    /// Write `volume` to `path`, replacing any existing file. A `.gz` suffix
    /// selects gzip compression.
    pub fn export(volume: &Volume, path: impl AsRef<Path>) -> Result<ExportArtifact, ExportError> {
        volume.validate()?;
        let path = path.as_ref();

        let (data, saturated_voxels) = Self::to_i16(volume.data());
        if saturated_voxels > 0 {
            log::warn!(
                "{saturated_voxels} voxels fall outside the 16-bit range and were saturated"
            );
        }

        WriterOptions::new(path)
            .reference_header(&Self::identity_header())
            .write_nifti(&data)
            .map_err(|source| ExportError::Write {
                path: path.to_path_buf(),
                source,
            })?;

        log::info!("Exported volume {:?} to {}", volume.dim(), path.display());
        Ok(ExportArtifact {
            path: path.to_path_buf(),
            shape: volume.dim(),
            saturated_voxels,
        })
    }
}
