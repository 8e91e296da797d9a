//! Building entries from filesystem metadata.
//!
//! The facts about an object (what `lstat(2)` would report, names already
//! resolved) come from a [`MetadataProvider`], so entries can be built from
//! synthetic metadata as easily as from the local filesystem
//! (see [`crate::FsMetadataProvider`]).

use std::fmt::{self, Display};
use std::io::Read;
use std::path::{Path, PathBuf};

use log::debug;
use serde::Serialize;

use crate::checksum;
use crate::contents_entry::{
    Attributes, ContentsEntry, DEFAULT_INSTALL_CLASS, Device, EntryKind, Link, Regular,
};
use crate::err::{ContentsError, Result};
use crate::package::PackageRef;

/// Classification of a filesystem object, without following symlinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ObjectKind {
    File,
    Directory,
    Symlink,
    BlockDevice,
    CharDevice,
    Fifo,
    Socket,
    Unknown,
}

impl Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            ObjectKind::File => "file",
            ObjectKind::Directory => "directory",
            ObjectKind::Symlink => "link",
            ObjectKind::BlockDevice => "blockSpecial",
            ObjectKind::CharDevice => "characterSpecial",
            ObjectKind::Fifo => "fifo",
            ObjectKind::Socket => "socket",
            ObjectKind::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// What a [`MetadataProvider`] knows about a single path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMetadata {
    pub kind: ObjectKind,
    /// Full `st_mode`; only the permission bits are recorded.
    pub permissions: u32,
    pub device_major: u32,
    pub device_minor: u32,
    pub size: u64,
    /// Seconds since the epoch.
    pub modified: i64,
    pub owner: String,
    pub group: String,
}

pub trait MetadataProvider {
    /// Metadata of `path` itself, not of what it links to.
    fn metadata(&self, path: &Path) -> std::io::Result<FileMetadata>;

    /// The fully resolved path `path` points to.
    fn real_path(&self, path: &Path) -> std::io::Result<PathBuf>;

    /// Opens the contents of a regular file.
    fn open(&self, path: &Path) -> std::io::Result<Box<dyn Read + '_>>;
}

/// Options for [`ContentsEntry::from_metadata`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryOptions {
    install_class: String,
    display_path: Option<String>,
    packages: Vec<PackageRef>,
}

impl Default for EntryOptions {
    fn default() -> Self {
        EntryOptions {
            install_class: DEFAULT_INSTALL_CLASS.to_owned(),
            display_path: None,
            packages: vec![],
        }
    }
}

impl EntryOptions {
    pub fn new() -> Self {
        EntryOptions::default()
    }

    pub fn install_class(mut self, install_class: impl Into<String>) -> Self {
        self.install_class = install_class.into();
        self
    }

    /// Records `path` in the entry instead of the path metadata was read from,
    /// e.g. when the object is staged under a temporary root.
    pub fn display_path(mut self, path: impl Into<String>) -> Self {
        self.display_path = Some(path.into());
        self
    }

    pub fn package(mut self, package: PackageRef) -> Self {
        self.packages.push(package);
        self
    }

    pub fn packages(mut self, packages: impl IntoIterator<Item = PackageRef>) -> Self {
        self.packages.extend(packages);
        self
    }
}

impl ContentsEntry {
    /// Describes the object at `path` as reported by `provider`.
    ///
    /// Regular files become `f` entries and are summed, symlinks become `s`
    /// entries pointing at their resolved target. Fifos, sockets and unknown
    /// objects have no record type.
    pub fn from_metadata<P: MetadataProvider + ?Sized>(
        provider: &P,
        path: impl AsRef<Path>,
        options: EntryOptions,
    ) -> Result<ContentsEntry> {
        let path = path.as_ref();
        let meta = provider
            .metadata(path)
            .map_err(|e| ContentsError::read_path(path, e))?;

        debug!("{} is a {}", path.display(), meta.kind);

        let attributes = || Attributes::new(meta.permissions & 0o7777, &meta.owner, &meta.group);

        let kind = match meta.kind {
            ObjectKind::File => {
                let reader = provider
                    .open(path)
                    .map_err(|e| ContentsError::read_path(path, e))?;
                let checksum =
                    checksum::sum_reader(reader).map_err(|e| ContentsError::read_path(path, e))?;
                debug!("{} sums to {}", path.display(), checksum);

                EntryKind::File(Regular {
                    attributes: attributes(),
                    size: meta.size,
                    checksum,
                    mtime: meta.modified,
                })
            }
            ObjectKind::Symlink => {
                let target = provider
                    .real_path(path)
                    .map_err(|e| ContentsError::read_path(path, e))?;
                EntryKind::SymLink(Link {
                    target: target.to_string_lossy().into_owned(),
                })
            }
            ObjectKind::BlockDevice | ObjectKind::CharDevice => {
                let device = Device {
                    major: meta.device_major,
                    minor: meta.device_minor,
                    attributes: attributes(),
                };
                if meta.kind == ObjectKind::BlockDevice {
                    EntryKind::BlockDevice(device)
                } else {
                    EntryKind::CharDevice(device)
                }
            }
            ObjectKind::Directory => EntryKind::Directory(attributes()),
            kind @ (ObjectKind::Fifo | ObjectKind::Socket | ObjectKind::Unknown) => {
                return Err(ContentsError::UnsupportedFileType {
                    path: path.to_path_buf(),
                    kind,
                });
            }
        };

        let EntryOptions {
            install_class,
            display_path,
            packages,
        } = options;

        Ok(ContentsEntry {
            path: display_path.unwrap_or_else(|| path.to_string_lossy().into_owned()),
            install_class,
            kind,
            packages,
        })
    }
}
