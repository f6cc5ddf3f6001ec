//! # DICOM-explorer library
//!
//! This crate turns a stack of DICOM slices into a volume that can be
//! explored and exported.
//!
//! Slices can come from a ZIP archive, a local directory or a single file.
//! Archive members and directory entries are filtered by extension (".dcm" by
//! default) and stacked in lexicographic name order; no DICOM ordering
//! attribute is consulted. Files that cannot be parsed or carry no pixel data
//! are skipped and reported, while slices of differing shape abort the load.
//!
//! Once loaded, the volume can be
//!  - rendered as a volumetric figure through an intensity threshold window
//!  - sliced in the three different medical axes (Axial, Coronal, Sagittal)
//!  - exported to a gzip-compressed NIfTI file
//!
//! The export keeps voxel values only. Intensities are cast to 16-bit signed
//! integers (saturating) and the affine is the identity, so spacing and
//! orientation of the original series are lost.
//!
//! All of this is driven through a [`Session`], an explicit state machine
//! owning one volume.
//!
//! # Examples
//!
//! ## Loading a folder and exporting it
//!
//! ```no_run
//! # use dicom_explorer::{Orientation, Session, SessionConfig, LoadSource};
//! let mut session = Session::new(SessionConfig::default().with_output_dir("exports"));
//! session
//!     .load(&LoadSource::from_path("dicom"))
//!     .expect("should have loaded files from directory");
//! let image = session
//!     .select_slice(Orientation::Sagittal, 0)
//!     .expect("should have returned the first sagittal slice");
//! image.save("sagittal.png").expect("should have written the image");
//! let artifact = session.export().expect("should have written volume.nii.gz");
//! println!("{}", artifact.path.display());
//! ```

pub mod config;
pub mod decoder;
pub mod enumerator;
pub mod enums;
pub mod exporter;
pub mod normalizer;
pub mod renderer;
pub mod session;
pub mod volume;
pub mod volume_loader;

#[cfg(test)]
mod test_utils;

pub use config::{RenderSettings, SessionConfig};
pub use enums::{Orientation, SessionState};
pub use exporter::{ExportArtifact, Exporter};
pub use normalizer::ThresholdWindow;
pub use renderer::{VolumeFigure, VolumeRenderer};
pub use session::{Command, Outcome, Session, SessionError};
pub use volume::{SliceImage, SliceView, Volume, VolumeError};
pub use volume_loader::{LoadError, LoadReport, LoadSource, VolumeLoader};
