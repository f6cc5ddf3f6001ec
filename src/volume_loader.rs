use crate::{
    decoder::SliceDecoder,
    enumerator::{ArchiveSource, DirectorySource, SliceSource},
    volume::Volume,
};

use ndarray::{Array2, Array3, s};
use std::{
    fmt, fs,
    io::Cursor,
    path::{Path, PathBuf},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("No matching slice files were found in the input")]
    EmptyInput,

    #[error("None of the candidate files contained usable pixel data")]
    EmptyVolume { report: LoadReport },

    #[error("Slice `{member}` has shape {found:?} but earlier slices have shape {expected:?}")]
    ShapeMismatch {
        member: String,
        expected: (usize, usize),
        found: (usize, usize),
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),
}

/// Outcome of one candidate file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SliceDiagnostic {
    Loaded {
        member: String,
        shape: (usize, usize),
    },
    Skipped {
        member: String,
        reason: String,
    },
}

impl fmt::Display for SliceDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SliceDiagnostic::Loaded { member, shape } => {
                write!(f, "Loaded {member} with shape {}x{}", shape.0, shape.1)
            }
            SliceDiagnostic::Skipped { member, reason } => write!(f, "Skipped {member}: {reason}"),
        }
    }
}

/// Per-file diagnostics of one load, in slice order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub entries: Vec<SliceDiagnostic>,
}

impl LoadReport {
    pub fn loaded(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| matches!(entry, SliceDiagnostic::Loaded { .. }))
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.entries.len() - self.loaded()
    }

    fn record(&mut self, diagnostic: SliceDiagnostic) {
        match &diagnostic {
            SliceDiagnostic::Loaded { .. } => log::info!("{diagnostic}"),
            SliceDiagnostic::Skipped { .. } => log::warn!("{diagnostic}"),
        }
        self.entries.push(diagnostic);
    }
}

/// What the user handed in.
#[derive(Debug, Clone)]
pub enum LoadSource {
    /// ZIP archive on disk.
    Archive(PathBuf),
    /// ZIP archive received as an upload.
    ArchiveBytes(Vec<u8>),
    /// Directory of slice files.
    Directory(PathBuf),
    /// One slice file on disk.
    SingleFile(PathBuf),
    /// One slice file received as an upload.
    SingleFileBytes { name: String, bytes: Vec<u8> },
}

impl LoadSource {
    /// Classify a path: directories are scanned, `.zip` files are archives and
    /// everything else is read as a single slice.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        if path.is_dir() {
            LoadSource::Directory(path)
        } else if path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("zip"))
        {
            LoadSource::Archive(path)
        } else {
            LoadSource::SingleFile(path)
        }
    }
}

pub struct VolumeLoader;

impl VolumeLoader {
    /// Load a volume from any supported input.
    ///
    /// `extension` selects the archive members or directory entries taken as
    /// slices. It is not applied to single files.
    pub fn load(source: &LoadSource, extension: &str) -> Result<(Volume, LoadReport), LoadError> {
        match source {
            LoadSource::Archive(path) => Self::load_from_archive(path, extension),
            LoadSource::ArchiveBytes(bytes) => Self::load_from_archive_bytes(bytes, extension),
            LoadSource::Directory(path) => Self::load_from_directory(path, extension),
            LoadSource::SingleFile(path) => {
                let name = path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string());
                Self::load_single_file(&name, &fs::read(path)?)
            }
            LoadSource::SingleFileBytes { name, bytes } => Self::load_single_file(name, bytes),
        }
    }

    /// Load a volume from a ZIP archive on disk
    pub fn load_from_archive(
        path: impl AsRef<Path>,
        extension: &str,
    ) -> Result<(Volume, LoadReport), LoadError> {
        let file = fs::File::open(path.as_ref())?;
        let mut source = ArchiveSource::new(file, extension)?;
        Self::load_from_source(&mut source)
    }

    /// Load a volume from an in-memory ZIP archive
    pub fn load_from_archive_bytes(
        bytes: &[u8],
        extension: &str,
    ) -> Result<(Volume, LoadReport), LoadError> {
        let mut source = ArchiveSource::new(Cursor::new(bytes), extension)?;
        Self::load_from_source(&mut source)
    }

    /// Load a volume from a directory containing slice files
    pub fn load_from_directory(
        path: impl AsRef<Path>,
        extension: &str,
    ) -> Result<(Volume, LoadReport), LoadError> {
        let mut source = DirectorySource::new(path, extension)?;
        Self::load_from_source(&mut source)
    }

    /// Wrap a lone slice as a volume of depth 1.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::EmptyVolume`] if the file cannot be used as a slice.
    pub fn load_single_file(name: &str, bytes: &[u8]) -> Result<(Volume, LoadReport), LoadError> {
        let mut report = LoadReport::default();
        let images = match SliceDecoder::decode(bytes) {
            Ok(image) => {
                report.record(SliceDiagnostic::Loaded {
                    member: name.to_owned(),
                    shape: image.dim(),
                });
                vec![(name.to_owned(), image)]
            }
            Err(reason) => {
                report.record(SliceDiagnostic::Skipped {
                    member: name.to_owned(),
                    reason: reason.to_string(),
                });
                return Err(LoadError::EmptyVolume { report });
            }
        };
        Ok((Volume::new(Self::build_volume_array(&images)), report))
    }

    /// Decode every member of `source` in order and stack the usable ones.
    ///
    /// # Errors
    ///
    /// Returns error if the source has no members, no member decodes or the
    /// decoded slices disagree in shape. No partial volume is returned.
    pub fn load_from_source(
        source: &mut impl SliceSource,
    ) -> Result<(Volume, LoadReport), LoadError> {
        let members = source.members().to_vec();
        if members.is_empty() {
            return Err(LoadError::EmptyInput);
        }

        let mut report = LoadReport::default();
        let mut images = Vec::with_capacity(members.len());
        for member in members {
            let bytes = source.read_member(&member)?;
            match SliceDecoder::decode(&bytes) {
                Ok(image) => {
                    report.record(SliceDiagnostic::Loaded {
                        member: member.clone(),
                        shape: image.dim(),
                    });
                    images.push((member, image));
                }
                Err(reason) => report.record(SliceDiagnostic::Skipped {
                    member,
                    reason: reason.to_string(),
                }),
            }
        }

        if images.is_empty() {
            return Err(LoadError::EmptyVolume { report });
        }
        Self::validate_dimensions(&images)?;

        let volume = Volume::new(Self::build_volume_array(&images));
        log::info!(
            "Assembled volume of shape {:?} ({} loaded, {} skipped)",
            volume.dim(),
            report.loaded(),
            report.skipped()
        );
        Ok((volume, report))
    }

    fn validate_dimensions(images: &[(String, Array2<f32>)]) -> Result<(), LoadError> {
        let expected = images[0].1.dim();
        match images.iter().find(|(_, image)| image.dim() != expected) {
            Some((member, image)) => Err(LoadError::ShapeMismatch {
                member: member.clone(),
                expected,
                found: image.dim(),
            }),
            None => Ok(()),
        }
    }

    fn build_volume_array(images: &[(String, Array2<f32>)]) -> Array3<f32> {
        let (height, width) = images[0].1.dim();
        let depth = images.len();
        let mut volume = Array3::<f32>::zeros((depth, height, width));

        for (i, (_, image)) in images.iter().enumerate() {
            volume.slice_mut(s![i, .., ..]).assign(image);
        }

        volume
    }
}
