use std::fmt::{self, Display};
use std::str::FromStr;

use log::trace;
use serde::Serialize;

use crate::err::{ContentsError, Result};
use crate::grammar::{self, Field, FileType, MatchedLine};
use crate::package::PackageRef;

/// Install class used when none is given.
pub const DEFAULT_INSTALL_CLASS: &str = "none";

/// One line of a contents(4) file.
///
/// Which attributes are recorded depends on the type of the object and is
/// carried by [`EntryKind`]; the accessors on this type return `None` for
/// attributes the type doesn't have.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ContentsEntry {
    pub path: String,
    pub install_class: String,
    #[serde(flatten)]
    pub kind: EntryKind,
    pub packages: Vec<PackageRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EntryKind {
    BlockDevice(Device),
    CharDevice(Device),
    Directory(Attributes),
    Editable(Regular),
    File(Regular),
    Volatile(Regular),
    Exclusive(Attributes),
    HardLink(Link),
    SymLink(Link),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Link {
    /// Link target, as written after the `=`.
    pub target: String,
}

/// Permissions and ownership, shared by every non-link type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Attributes {
    /// Permission bits (`0o7777` at most).
    pub mode: u32,
    pub owner: String,
    pub group: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Device {
    pub major: u32,
    pub minor: u32,
    #[serde(flatten)]
    pub attributes: Attributes,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Regular {
    #[serde(flatten)]
    pub attributes: Attributes,
    pub size: u64,
    /// See [`crate::checksum`].
    pub checksum: u32,
    /// Modification time, in seconds since the epoch.
    pub mtime: i64,
}

impl Attributes {
    pub fn new(mode: u32, owner: impl Into<String>, group: impl Into<String>) -> Self {
        Attributes {
            mode,
            owner: owner.into(),
            group: group.into(),
        }
    }
}

impl Display for Attributes {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:04o} {} {}", self.mode, self.owner, self.group)
    }
}

impl EntryKind {
    pub fn file_type(&self) -> FileType {
        match self {
            EntryKind::BlockDevice(_) => FileType::BlockDevice,
            EntryKind::CharDevice(_) => FileType::CharDevice,
            EntryKind::Directory(_) => FileType::Directory,
            EntryKind::Editable(_) => FileType::Editable,
            EntryKind::File(_) => FileType::File,
            EntryKind::Volatile(_) => FileType::Volatile,
            EntryKind::Exclusive(_) => FileType::Exclusive,
            EntryKind::HardLink(_) => FileType::HardLink,
            EntryKind::SymLink(_) => FileType::SymLink,
        }
    }

    pub fn attributes(&self) -> Option<&Attributes> {
        match self {
            EntryKind::BlockDevice(d) | EntryKind::CharDevice(d) => Some(&d.attributes),
            EntryKind::Directory(a) | EntryKind::Exclusive(a) => Some(a),
            EntryKind::Editable(r) | EntryKind::File(r) | EntryKind::Volatile(r) => {
                Some(&r.attributes)
            }
            EntryKind::HardLink(_) | EntryKind::SymLink(_) => None,
        }
    }

    pub fn attributes_mut(&mut self) -> Option<&mut Attributes> {
        match self {
            EntryKind::BlockDevice(d) | EntryKind::CharDevice(d) => Some(&mut d.attributes),
            EntryKind::Directory(a) | EntryKind::Exclusive(a) => Some(a),
            EntryKind::Editable(r) | EntryKind::File(r) | EntryKind::Volatile(r) => {
                Some(&mut r.attributes)
            }
            EntryKind::HardLink(_) | EntryKind::SymLink(_) => None,
        }
    }

    fn device(&self) -> Option<&Device> {
        match self {
            EntryKind::BlockDevice(d) | EntryKind::CharDevice(d) => Some(d),
            _ => None,
        }
    }

    fn regular(&self) -> Option<&Regular> {
        match self {
            EntryKind::Editable(r) | EntryKind::File(r) | EntryKind::Volatile(r) => Some(r),
            _ => None,
        }
    }
}

impl ContentsEntry {
    pub fn new(
        path: impl Into<String>,
        install_class: impl Into<String>,
        kind: EntryKind,
        packages: Vec<PackageRef>,
    ) -> Self {
        ContentsEntry {
            path: path.into(),
            install_class: install_class.into(),
            kind,
            packages,
        }
    }

    /// Parses a single line of a contents file.
    ///
    /// Blank lines and comments (lines starting with `#`) yield `Ok(None)`. A
    /// single trailing line terminator is ignored.
    pub fn from_line(line: &str) -> Result<Option<ContentsEntry>> {
        let line = strip_line_ending(line);
        if line.trim().is_empty() || line.starts_with('#') {
            return Ok(None);
        }

        let file_type =
            grammar::extract_tag(line).ok_or_else(|| ContentsError::unknown_file_type(line))?;

        let entry = file_type
            .layout()
            .match_line(line)
            .and_then(|matched| Self::from_matched(file_type, &matched))
            .ok_or_else(|| ContentsError::unparseable(line))?;

        trace!("Parsed `{}` entry for {}", file_type, entry.path);
        Ok(Some(entry))
    }

    fn from_matched(file_type: FileType, m: &MatchedLine) -> Option<ContentsEntry> {
        let attributes = || -> Option<Attributes> {
            Some(Attributes {
                mode: u32::from_str_radix(m.get(Field::Mode)?, 8).ok()?,
                owner: m.get(Field::Owner)?.to_owned(),
                group: m.get(Field::Group)?.to_owned(),
            })
        };
        let device = || -> Option<Device> {
            Some(Device {
                major: parse_field(m, Field::Major)?,
                minor: parse_field(m, Field::Minor)?,
                attributes: attributes()?,
            })
        };
        let regular = || -> Option<Regular> {
            Some(Regular {
                attributes: attributes()?,
                size: parse_field(m, Field::Size)?,
                checksum: parse_field(m, Field::Checksum)?,
                mtime: parse_field(m, Field::ModTime)?,
            })
        };
        let link = || -> Option<Link> {
            Some(Link {
                target: m.get(Field::LinkTarget)?.to_owned(),
            })
        };

        let kind = match file_type {
            FileType::BlockDevice => EntryKind::BlockDevice(device()?),
            FileType::CharDevice => EntryKind::CharDevice(device()?),
            FileType::Directory => EntryKind::Directory(attributes()?),
            FileType::Exclusive => EntryKind::Exclusive(attributes()?),
            FileType::Editable => EntryKind::Editable(regular()?),
            FileType::File => EntryKind::File(regular()?),
            FileType::Volatile => EntryKind::Volatile(regular()?),
            FileType::HardLink => EntryKind::HardLink(link()?),
            FileType::SymLink => EntryKind::SymLink(link()?),
        };

        Some(ContentsEntry {
            path: m.get(Field::Path)?.to_owned(),
            install_class: m.get(Field::InstallClass)?.to_owned(),
            kind,
            packages: m.packages.iter().map(|p| PackageRef::decode(p)).collect(),
        })
    }

    /// Renders the entry as a contents(4) line, without line terminator.
    pub fn to_line(&self) -> String {
        self.to_string()
    }

    /// Whether the entry renders to a line that parses back into an entry.
    ///
    /// The entry read back may differ from `self`, e.g. when an owner
    /// contains a space. See [`ContentsEntry::round_trips`].
    pub fn is_valid(&self) -> bool {
        matches!(ContentsEntry::from_line(&self.to_line()), Ok(Some(_)))
    }

    /// Whether the rendered line parses back into an identical entry.
    pub fn round_trips(&self) -> bool {
        matches!(ContentsEntry::from_line(&self.to_line()), Ok(Some(ref e)) if e == self)
    }

    /// The only package of this entry.
    ///
    /// Every type except directories and links lists exactly one package;
    /// for those use [`ContentsEntry::packages`] directly.
    pub fn single_package(&self) -> Result<&PackageRef> {
        match self.packages.as_slice() {
            [only] => Ok(only),
            [] => Err(ContentsError::MissingPackage),
            many => Err(ContentsError::AmbiguousPackageList { count: many.len() }),
        }
    }

    /// Looks up a package of this entry by name, ignoring its status.
    pub fn package(&self, name: &str) -> Option<&PackageRef> {
        self.packages.iter().find(|p| p.name == name)
    }

    pub fn file_type(&self) -> FileType {
        self.kind.file_type()
    }

    pub fn link_target(&self) -> Option<&str> {
        match &self.kind {
            EntryKind::HardLink(link) | EntryKind::SymLink(link) => Some(&link.target),
            _ => None,
        }
    }

    pub fn mode(&self) -> Option<u32> {
        self.kind.attributes().map(|a| a.mode)
    }

    pub fn owner(&self) -> Option<&str> {
        self.kind.attributes().map(|a| a.owner.as_str())
    }

    pub fn group(&self) -> Option<&str> {
        self.kind.attributes().map(|a| a.group.as_str())
    }

    pub fn major(&self) -> Option<u32> {
        self.kind.device().map(|d| d.major)
    }

    pub fn minor(&self) -> Option<u32> {
        self.kind.device().map(|d| d.minor)
    }

    pub fn size(&self) -> Option<u64> {
        self.kind.regular().map(|r| r.size)
    }

    pub fn checksum(&self) -> Option<u32> {
        self.kind.regular().map(|r| r.checksum)
    }

    pub fn mtime(&self) -> Option<i64> {
        self.kind.regular().map(|r| r.mtime)
    }
}

impl Display for ContentsEntry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let tag = self.file_type();
        let class = &self.install_class;

        match &self.kind {
            EntryKind::HardLink(link) | EntryKind::SymLink(link) => {
                write!(f, "{}={} {tag} {class}", self.path, link.target)?
            }
            EntryKind::Directory(a) | EntryKind::Exclusive(a) => {
                write!(f, "{} {tag} {class} {a}", self.path)?
            }
            EntryKind::BlockDevice(d) | EntryKind::CharDevice(d) => write!(
                f,
                "{} {tag} {class} {} {} {}",
                self.path, d.major, d.minor, d.attributes
            )?,
            EntryKind::Editable(r) | EntryKind::File(r) | EntryKind::Volatile(r) => write!(
                f,
                "{} {tag} {class} {} {} {} {}",
                self.path, r.attributes, r.size, r.checksum, r.mtime
            )?,
        }

        for package in &self.packages {
            write!(f, " {package}")?;
        }
        Ok(())
    }
}

fn parse_field<T: FromStr>(m: &MatchedLine, field: Field) -> Option<T> {
    m.get(field)?.parse().ok()
}

fn strip_line_ending(line: &str) -> &str {
    match line.strip_suffix('\n') {
        Some(line) => line.strip_suffix('\r').unwrap_or(line),
        None => line,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::PackageStatus;
    use pretty_assertions::assert_eq;

    fn parse(line: &str) -> ContentsEntry {
        ContentsEntry::from_line(line)
            .expect("line to parse")
            .expect("line to hold an entry")
    }

    #[test]
    fn test_character_device() {
        let line = "/devices/pseudo/arp@0:arp c none 44 0 0666 root sys SUNWcsd";
        let entry = parse(line);

        assert_eq!(entry.file_type(), FileType::CharDevice);
        assert_eq!(entry.path, "/devices/pseudo/arp@0:arp");
        assert_eq!(entry.link_target(), None);
        assert_eq!(entry.install_class, "none");
        assert_eq!(entry.mode(), Some(438));
        assert_eq!(entry.major(), Some(44));
        assert_eq!(entry.minor(), Some(0));
        assert_eq!(entry.mtime(), None);
        assert_eq!(entry.owner(), Some("root"));
        assert_eq!(entry.group(), Some("sys"));
        assert_eq!(entry.single_package().unwrap().to_string(), "SUNWcsd");
        assert_eq!(entry.packages, vec![PackageRef::confirmed("SUNWcsd")]);
        assert_eq!(entry.size(), None);
        assert_eq!(entry.checksum(), None);
        assert_eq!(entry.to_line(), line);
        assert!(entry.is_valid());
    }

    #[test]
    fn test_directory() {
        let line = "/dev d none 0755 root sys SUNWcsr SUNWcsd";
        let entry = parse(line);

        assert_eq!(entry.file_type(), FileType::Directory);
        assert_eq!(entry.path, "/dev");
        assert_eq!(entry.mode(), Some(493));
        assert_eq!(entry.major(), None);
        assert_eq!(entry.minor(), None);
        assert_eq!(entry.owner(), Some("root"));
        assert_eq!(entry.group(), Some("sys"));
        assert!(matches!(
            entry.single_package(),
            Err(ContentsError::AmbiguousPackageList { count: 2 })
        ));
        assert_eq!(
            entry
                .packages
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>(),
            vec!["SUNWcsr", "SUNWcsd"]
        );
        assert_eq!(entry.to_line(), line);
        assert!(entry.is_valid());
    }

    #[test]
    fn test_editable() {
        let line = "/etc/passwd e passwd 0644 root sys 580 48299 1077177419 SUNWcsr";
        let entry = parse(line);

        assert_eq!(
            entry,
            ContentsEntry::new(
                "/etc/passwd",
                "passwd",
                EntryKind::Editable(Regular {
                    attributes: Attributes::new(0o644, "root", "sys"),
                    size: 580,
                    checksum: 48299,
                    mtime: 1077177419,
                }),
                vec![PackageRef::confirmed("SUNWcsr")],
            )
        );
        assert_eq!(entry.to_line(), line);
    }

    #[test]
    fn test_symlink() {
        let line = "/bin=./usr/bin s none SUNWcsr";
        let entry = parse(line);

        assert_eq!(entry.file_type(), FileType::SymLink);
        assert_eq!(entry.path, "/bin");
        assert_eq!(entry.link_target(), Some("./usr/bin"));
        assert_eq!(entry.install_class, "none");
        assert_eq!(entry.mode(), None);
        assert_eq!(entry.major(), None);
        assert_eq!(entry.minor(), None);
        assert_eq!(entry.mtime(), None);
        assert_eq!(entry.owner(), None);
        assert_eq!(entry.group(), None);
        assert_eq!(entry.size(), None);
        assert_eq!(entry.checksum(), None);
        assert_eq!(entry.to_line(), line);
        assert!(entry.is_valid());
    }

    #[test]
    fn test_blank_and_comment_lines_hold_no_entry() {
        assert!(ContentsEntry::from_line("").unwrap().is_none());
        assert!(ContentsEntry::from_line("\n").unwrap().is_none());
        assert!(ContentsEntry::from_line("   ").unwrap().is_none());
        assert!(
            ContentsEntry::from_line("# Last modified by pkgadd")
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn test_trailing_newline_is_ignored() {
        let entry = parse("/bin=./usr/bin s none SUNWcsr\n");
        assert_eq!(entry.to_line(), "/bin=./usr/bin s none SUNWcsr");
    }

    #[test]
    fn test_unknown_file_type() {
        let line = "/boot/grub/bin/grub Z none 0555 root sys 378124 54144 1281112186 SUNWgrub";
        let err = ContentsEntry::from_line(line).unwrap_err();
        assert!(matches!(err, ContentsError::UnknownFileType { .. }));
        assert_eq!(err.line(), Some(line));
    }

    #[test]
    fn test_unparseable_line() {
        let line = "/boot/grub/bin/grub f nonsense";
        let err = ContentsEntry::from_line(line).unwrap_err();
        assert!(matches!(err, ContentsError::UnparseableLine { .. }));
        assert_eq!(err.line(), Some(line));
    }

    #[test]
    fn test_numeric_overflow_is_unparseable() {
        let line = "/dev/x c none 4294967296 0 0666 root sys SUNWcsd";
        assert!(matches!(
            ContentsEntry::from_line(line),
            Err(ContentsError::UnparseableLine { .. })
        ));
    }

    #[test]
    fn test_package_prefixes_are_decoded() {
        let entry = parse("/usr d none 0755 root sys +SUNWcsr ~SUNWcsu SUNWcsd");
        assert_eq!(
            entry
                .packages
                .iter()
                .map(|p| p.status)
                .collect::<Vec<_>>(),
            vec![
                PackageStatus::InstallReady,
                PackageStatus::ConfirmAttributes,
                PackageStatus::Confirmed
            ]
        );
        assert_eq!(
            entry.package("SUNWcsu").map(|p| p.status),
            Some(PackageStatus::ConfirmAttributes)
        );
        assert_eq!(entry.package("SUNWzsh"), None);
    }

    #[test]
    fn test_valid() {
        let line = "/boot/grub/bin/grub f none 0555 root sys 378124 54144 1281112186 SUNWgrub";
        let mut entry = parse(line);
        assert!(entry.is_valid());

        let EntryKind::File(regular) = entry.kind.clone() else {
            panic!("expected a file entry");
        };

        // Exclusive directories only carry a single package.
        entry.kind = EntryKind::Exclusive(regular.attributes.clone());
        entry.packages.push(PackageRef::confirmed("SUNWcsr"));
        assert!(!entry.is_valid());

        entry.kind = EntryKind::File(regular);
        assert!(entry.is_valid());
    }

    #[test]
    fn test_fields_outside_the_grammar_are_invalid() {
        let mut entry = parse("/dev d none 0755 root sys SUNWcsr");

        entry.kind.attributes_mut().unwrap().mode = 0o17777;
        assert!(!entry.is_valid());

        entry.kind.attributes_mut().unwrap().mode = 0o755;
        // Still a well-formed line, but the owner is read back as "root".
        entry.kind.attributes_mut().unwrap().owner = "root user".to_owned();
        assert!(entry.is_valid());
        assert!(!entry.round_trips());
        assert_eq!(entry.to_line(), "/dev d none 0755 root user sys SUNWcsr");

        entry.kind.attributes_mut().unwrap().owner = "root".to_owned();
        entry.install_class = "not-a-word".to_owned();
        assert!(!entry.is_valid());

        entry.install_class = DEFAULT_INSTALL_CLASS.to_owned();
        entry.packages.clear();
        assert!(!entry.is_valid());
        assert!(matches!(
            entry.single_package(),
            Err(ContentsError::MissingPackage)
        ));
    }

    #[test]
    fn test_negative_mtime_is_invalid() {
        let entry = ContentsEntry::new(
            "/etc/motd",
            DEFAULT_INSTALL_CLASS,
            EntryKind::File(Regular {
                attributes: Attributes::new(0o644, "root", "sys"),
                size: 0,
                checksum: 0,
                mtime: -1,
            }),
            vec![PackageRef::confirmed("SUNWcsr")],
        );
        assert!(!entry.is_valid());
    }
}
