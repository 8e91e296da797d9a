//! Field layouts of the contents(4) record types.
//!
//! A line is recognized in two steps. [`extract_tag`] looks at the second
//! space separated token to find the record type. The [`Layout`] of that type
//! is then matched against the whole line at once by [`Layout::match_line`].
//! Keeping the steps apart is what lets callers tell an unknown type from a
//! known type with malformed fields.

use std::fmt::{self, Display};

use serde::Serialize;

/// Type of the filesystem object described by a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum FileType {
    BlockDevice,
    CharDevice,
    Directory,
    /// A file whose contents may be edited after installation.
    Editable,
    File,
    /// A file whose contents are expected to change (log files and the like).
    Volatile,
    /// An exclusive directory, owned by a single package.
    Exclusive,
    HardLink,
    SymLink,
}

impl FileType {
    pub const ALL: [FileType; 9] = [
        FileType::BlockDevice,
        FileType::CharDevice,
        FileType::Directory,
        FileType::Editable,
        FileType::File,
        FileType::Volatile,
        FileType::Exclusive,
        FileType::HardLink,
        FileType::SymLink,
    ];

    pub fn from_tag(tag: char) -> Option<FileType> {
        match tag {
            'b' => Some(FileType::BlockDevice),
            'c' => Some(FileType::CharDevice),
            'd' => Some(FileType::Directory),
            'e' => Some(FileType::Editable),
            'f' => Some(FileType::File),
            'v' => Some(FileType::Volatile),
            'x' => Some(FileType::Exclusive),
            'l' => Some(FileType::HardLink),
            's' => Some(FileType::SymLink),
            _ => None,
        }
    }

    pub fn tag(self) -> char {
        match self {
            FileType::BlockDevice => 'b',
            FileType::CharDevice => 'c',
            FileType::Directory => 'd',
            FileType::Editable => 'e',
            FileType::File => 'f',
            FileType::Volatile => 'v',
            FileType::Exclusive => 'x',
            FileType::HardLink => 'l',
            FileType::SymLink => 's',
        }
    }

    pub fn is_link(self) -> bool {
        matches!(self, FileType::HardLink | FileType::SymLink)
    }

    pub fn is_device(self) -> bool {
        matches!(self, FileType::BlockDevice | FileType::CharDevice)
    }

    /// Editable, plain and volatile files, which record size, sum and mtime.
    pub fn is_regular(self) -> bool {
        matches!(self, FileType::Editable | FileType::File | FileType::Volatile)
    }

    pub fn layout(self) -> &'static Layout {
        match self {
            FileType::HardLink | FileType::SymLink => &LINK_LAYOUT,
            FileType::Directory => &DIRECTORY_LAYOUT,
            FileType::Exclusive => &EXCLUSIVE_LAYOUT,
            FileType::BlockDevice | FileType::CharDevice => &DEVICE_LAYOUT,
            FileType::Editable | FileType::File | FileType::Volatile => &REGULAR_LAYOUT,
        }
    }
}

impl Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// A single field of a record, in the order it appears on the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Path,
    /// Only for links, written as `path=target` in the first token.
    LinkTarget,
    Type,
    InstallClass,
    Major,
    Minor,
    Mode,
    Owner,
    Group,
    Size,
    Checksum,
    ModTime,
}

impl Field {
    /// Whether `token` has the shape this field requires.
    pub fn accepts(self, token: &str) -> bool {
        match self {
            Field::Path | Field::LinkTarget | Field::Owner | Field::Group => is_word(token),
            Field::Type => token.chars().count() == 1,
            Field::InstallClass => is_install_class(token),
            Field::Mode => token.len() == 4 && token.bytes().all(|b| matches!(b, b'0'..=b'7')),
            Field::Major | Field::Minor | Field::Size | Field::Checksum | Field::ModTime => {
                is_decimal(token)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageCount {
    One,
    OneOrMore,
}

/// The fields of one record type, followed by its package list.
#[derive(Debug, PartialEq, Eq)]
pub struct Layout {
    pub fields: &'static [Field],
    pub packages: PackageCount,
}

static LINK_LAYOUT: Layout = Layout {
    fields: &[Field::Path, Field::LinkTarget, Field::Type, Field::InstallClass],
    packages: PackageCount::OneOrMore,
};

const DIRECTORY_FIELDS: &[Field] = &[
    Field::Path,
    Field::Type,
    Field::InstallClass,
    Field::Mode,
    Field::Owner,
    Field::Group,
];

static DIRECTORY_LAYOUT: Layout = Layout {
    fields: DIRECTORY_FIELDS,
    packages: PackageCount::OneOrMore,
};

static EXCLUSIVE_LAYOUT: Layout = Layout {
    fields: DIRECTORY_FIELDS,
    packages: PackageCount::One,
};

static DEVICE_LAYOUT: Layout = Layout {
    fields: &[
        Field::Path,
        Field::Type,
        Field::InstallClass,
        Field::Major,
        Field::Minor,
        Field::Mode,
        Field::Owner,
        Field::Group,
    ],
    packages: PackageCount::One,
};

static REGULAR_LAYOUT: Layout = Layout {
    fields: &[
        Field::Path,
        Field::Type,
        Field::InstallClass,
        Field::Mode,
        Field::Owner,
        Field::Group,
        Field::Size,
        Field::Checksum,
        Field::ModTime,
    ],
    packages: PackageCount::OneOrMore,
};

/// The tokens of a line that matched a [`Layout`].
#[derive(Debug)]
pub struct MatchedLine<'a> {
    layout: &'static Layout,
    values: Vec<&'a str>,
    pub packages: Vec<&'a str>,
}

impl<'a> MatchedLine<'a> {
    pub fn get(&self, field: Field) -> Option<&'a str> {
        self.layout
            .fields
            .iter()
            .position(|f| *f == field)
            .and_then(|i| self.values.get(i).copied())
    }
}

impl Layout {
    pub fn is_link(&self) -> bool {
        self.fields.contains(&Field::LinkTarget)
    }

    /// Matches the whole of `line` against this layout.
    pub fn match_line<'a>(&'static self, line: &'a str) -> Option<MatchedLine<'a>> {
        let mut tokens = line.split(' ');
        let mut values = Vec::with_capacity(self.fields.len());

        let rest = if self.is_link() {
            // Path and target are both taken from the first token.
            let (path, target) = split_link(tokens.next()?)?;
            values.push(path);
            values.push(target);
            &self.fields[2..]
        } else {
            self.fields
        };

        for &field in rest {
            let token = tokens.next()?;
            if !field.accepts(token) {
                return None;
            }
            values.push(token);
        }

        let packages: Vec<&str> = tokens.collect();
        let count_ok = match self.packages {
            PackageCount::One => packages.len() == 1,
            PackageCount::OneOrMore => !packages.is_empty(),
        };
        if !count_ok || !packages.iter().all(|p| is_word(p)) {
            return None;
        }

        Some(MatchedLine {
            layout: self,
            values,
            packages,
        })
    }
}

/// Finds the record type of `line` without looking at the other fields.
///
/// The line must start with a path token, a single space, a known type tag
/// and another space.
pub fn extract_tag(line: &str) -> Option<FileType> {
    let mut parts = line.splitn(3, ' ');
    let path = parts.next()?;
    let tag = parts.next()?;
    parts.next()?;

    if !is_word(path) {
        return None;
    }

    let mut chars = tag.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => FileType::from_tag(c),
        _ => None,
    }
}

/// Splits `path=target` at the last `=` that leaves both sides non-empty.
pub fn split_link(token: &str) -> Option<(&str, &str)> {
    if !is_word(token) {
        return None;
    }
    token
        .rmatch_indices('=')
        .map(|(i, _)| (&token[..i], &token[i + 1..]))
        .find(|(path, target)| !path.is_empty() && !target.is_empty())
}

fn is_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r' | '\x0b' | '\x0c')
}

/// A non-empty run of non-whitespace characters.
pub fn is_word(token: &str) -> bool {
    !token.is_empty() && !token.chars().any(is_space)
}

pub fn is_install_class(token: &str) -> bool {
    !token.is_empty() && token.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

/// Canonical unsigned decimal: a bare `0` or digits without a leading zero.
fn is_decimal(token: &str) -> bool {
    match token.as_bytes() {
        [] => false,
        [b'0'] => true,
        [b'0', ..] => false,
        digits => digits.iter().all(u8::is_ascii_digit),
    }
}
