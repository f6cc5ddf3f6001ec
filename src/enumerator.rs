//! Enumeration of candidate slice files inside an archive or a directory.
//!
//! Slice order is the lexicographic order of member names. No other ordering
//! metadata is consulted.

use std::{
    fs,
    io::{Read, Seek},
    path::{Path, PathBuf},
};

use zip::ZipArchive;

use crate::volume_loader::LoadError;

/// An ordered collection of candidate slice files and access to their bytes.
pub trait SliceSource {
    /// Matching member names, sorted.
    fn members(&self) -> &[String];

    /// Raw bytes of one member.
    fn read_member(&mut self, member: &str) -> Result<Vec<u8>, LoadError>;
}

/// Whether `name` ends with `.{extension}`, ignoring ASCII case.
pub fn matches_extension(name: &str, extension: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
}

/// Sorted names of the archive's file members carrying `extension`.
pub fn archive_members<R: Read + Seek>(archive: &ZipArchive<R>, extension: &str) -> Vec<String> {
    let mut members: Vec<String> = archive
        .file_names()
        .filter(|name| !name.ends_with('/'))
        .filter(|name| matches_extension(name, extension))
        .map(str::to_owned)
        .collect();
    members.sort();
    members
}

/// Sorted file names directly inside `dir` carrying `extension`. Not recursive.
pub fn directory_members(dir: &Path, extension: &str) -> Result<Vec<String>, LoadError> {
    let mut members = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
            log::warn!("Ignoring non UTF-8 file name in {}", dir.display());
            continue;
        };
        if matches_extension(&name, extension) {
            members.push(name);
        }
    }
    members.sort();
    Ok(members)
}

/// Slices stored as members of a ZIP archive.
pub struct ArchiveSource<R> {
    archive: ZipArchive<R>,
    members: Vec<String>,
}

impl<R: Read + Seek> ArchiveSource<R> {
    pub fn new(reader: R, extension: &str) -> Result<Self, LoadError> {
        let archive = ZipArchive::new(reader)?;
        let members = archive_members(&archive, extension);
        Ok(Self { archive, members })
    }
}

impl<R: Read + Seek> SliceSource for ArchiveSource<R> {
    fn members(&self) -> &[String] {
        &self.members
    }

    fn read_member(&mut self, member: &str) -> Result<Vec<u8>, LoadError> {
        let mut file = self.archive.by_name(member)?;
        let mut bytes = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut bytes)?;
        Ok(bytes)
    }
}

/// Slices stored as files in a local directory.
pub struct DirectorySource {
    root: PathBuf,
    members: Vec<String>,
}

impl DirectorySource {
    pub fn new(root: impl AsRef<Path>, extension: &str) -> Result<Self, LoadError> {
        let root = root.as_ref().to_path_buf();
        let members = directory_members(&root, extension)?;
        Ok(Self { root, members })
    }
}

impl SliceSource for DirectorySource {
    fn members(&self) -> &[String] {
        &self.members
    }

    fn read_member(&mut self, member: &str) -> Result<Vec<u8>, LoadError> {
        Ok(fs::read(self.root.join(member))?)
    }
}
