use std::fs::{self, File};
use std::io::{self, Read};
use std::os::unix::fs::{FileTypeExt, MetadataExt};
use std::path::{Path, PathBuf};

use log::debug;
use nix::unistd::{Gid, Group, Uid, User};

use crate::metadata::{FileMetadata, MetadataProvider, ObjectKind};

/// Reads metadata from the local filesystem with `lstat(2)`.
///
/// Owners and groups are resolved through the password and group databases;
/// ids without a name are recorded numerically.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsMetadataProvider;

impl FsMetadataProvider {
    pub fn new() -> Self {
        FsMetadataProvider
    }
}

impl MetadataProvider for FsMetadataProvider {
    fn metadata(&self, path: &Path) -> io::Result<FileMetadata> {
        let meta = fs::symlink_metadata(path)?;
        let file_type = meta.file_type();

        let kind = if file_type.is_symlink() {
            ObjectKind::Symlink
        } else if file_type.is_dir() {
            ObjectKind::Directory
        } else if file_type.is_file() {
            ObjectKind::File
        } else if file_type.is_block_device() {
            ObjectKind::BlockDevice
        } else if file_type.is_char_device() {
            ObjectKind::CharDevice
        } else if file_type.is_fifo() {
            ObjectKind::Fifo
        } else if file_type.is_socket() {
            ObjectKind::Socket
        } else {
            ObjectKind::Unknown
        };

        let (device_major, device_minor) = device_numbers(meta.rdev());

        Ok(FileMetadata {
            kind,
            permissions: meta.mode(),
            device_major,
            device_minor,
            size: meta.size(),
            modified: meta.mtime(),
            owner: user_name(meta.uid()),
            group: group_name(meta.gid()),
        })
    }

    fn real_path(&self, path: &Path) -> io::Result<PathBuf> {
        fs::canonicalize(path)
    }

    fn open(&self, path: &Path) -> io::Result<Box<dyn Read + '_>> {
        Ok(Box::new(File::open(path)?))
    }
}

/// Splits `st_rdev` with the platform's own `major(3)`/`minor(3)`.
#[allow(unused_unsafe)]
fn device_numbers(rdev: u64) -> (u32, u32) {
    let dev = rdev as libc::dev_t;
    // Safe functions on some targets, plain C calls on others.
    unsafe { (libc::major(dev) as u32, libc::minor(dev) as u32) }
}

fn user_name(uid: u32) -> String {
    match User::from_uid(Uid::from_raw(uid)) {
        Ok(Some(user)) => user.name,
        Ok(None) => uid.to_string(),
        Err(e) => {
            debug!("Failed to look up uid {}: {}", uid, e);
            uid.to_string()
        }
    }
}

fn group_name(gid: u32) -> String {
    match Group::from_gid(Gid::from_raw(gid)) {
        Ok(Some(group)) => group.name,
        Ok(None) => gid.to_string(),
        Err(e) => {
            debug!("Failed to look up gid {}: {}", gid, e);
            gid.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contents_entry::ContentsEntry;
    use crate::grammar::FileType;
    use crate::metadata::EntryOptions;
    use crate::package::PackageRef;
    use std::os::unix::fs::{PermissionsExt, symlink};

    #[test]
    fn test_regular_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("motd");
        fs::write(&path, "@".repeat(1_023)).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o640)).unwrap();

        let entry = ContentsEntry::from_metadata(
            &FsMetadataProvider,
            &path,
            EntryOptions::new()
                .display_path("/etc/motd")
                .package(PackageRef::confirmed("SUNWcsr")),
        )
        .unwrap();

        assert_eq!(entry.file_type(), FileType::File);
        assert_eq!(entry.path, "/etc/motd");
        assert_eq!(entry.mode(), Some(0o640));
        assert_eq!(entry.size(), Some(1_023));
        assert_eq!(entry.checksum(), Some(65_472));
        assert!(entry.is_valid());
    }

    #[test]
    fn test_symlink_is_not_followed() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("usr");
        fs::create_dir(&target).unwrap();
        let link = dir.path().join("bin");
        symlink(&target, &link).unwrap();

        let entry =
            ContentsEntry::from_metadata(&FsMetadataProvider, &link, EntryOptions::new()).unwrap();

        assert_eq!(entry.file_type(), FileType::SymLink);
        let expected = fs::canonicalize(&target).unwrap();
        assert_eq!(entry.link_target(), Some(expected.to_string_lossy().as_ref()));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_device_numbers() {
        #[allow(unused_unsafe)]
        let dev = unsafe { libc::makedev(44, 7) };
        assert_eq!(device_numbers(dev as u64), (44, 7));

        let null = FsMetadataProvider.metadata(Path::new("/dev/null")).unwrap();
        assert_eq!(null.kind, ObjectKind::CharDevice);
        assert_eq!((null.device_major, null.device_minor), (1, 3));
    }

    #[test]
    fn test_directory() {
        let dir = tempfile::tempdir().unwrap();
        let meta = FsMetadataProvider.metadata(dir.path()).unwrap();
        assert_eq!(meta.kind, ObjectKind::Directory);
        assert!(!meta.owner.is_empty());
        assert!(!meta.group.is_empty());
    }
}
