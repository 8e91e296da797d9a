//! Package references as they appear at the end of a contents line.
//!
//! A package name may carry a single status character in front of it. The
//! characters are not publicly documented, but the svr4pkg tools define them
//! in `libinst.h` (`INST_RDY`, `RM_RDY`, ...). A name without a prefix is a
//! confirmed entry.

use std::fmt::{self, Display};

use serde::Serialize;

package_statuses! {
    /// The entry is confirmed (`ENTRY_OK`).
    none => Confirmed, is_confirmed;
    /// The entry is ready for `installf -f`.
    '+' => InstallReady, is_install_ready;
    /// The entry is ready for `removef -f`.
    '-' => RemoveReady, is_remove_ready;
    /// The entry (or part of it) was not found.
    '!' => NotFound, is_not_found;
    /// The file is served from the file server's read-only partition.
    '%' => ServedFile, is_served_file;
    /// The entry is waiting on a stat of the installed object.
    '@' => AwaitingStat, is_awaiting_stat;
    /// There is a duplicate of this entry.
    '#' => DuplicateEntry, is_duplicate_entry;
    /// Contents still need to be confirmed.
    '*' => ConfirmContents, is_confirm_contents;
    /// Attributes still need to be confirmed.
    '~' => ConfirmAttributes, is_confirm_attributes;
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PackageRef {
    /// The package name, without status prefix.
    pub name: String,
    pub status: PackageStatus,
}

impl PackageRef {
    pub fn new(name: impl Into<String>, status: PackageStatus) -> Self {
        PackageRef {
            name: name.into(),
            status,
        }
    }

    /// A confirmed reference to `name`.
    pub fn confirmed(name: impl Into<String>) -> Self {
        Self::new(name, PackageStatus::Confirmed)
    }

    /// Splits an optional status prefix off `token`.
    pub fn decode(token: &str) -> Self {
        let mut chars = token.chars();
        match chars.next().and_then(PackageStatus::from_prefix) {
            Some(status) => Self::new(chars.as_str(), status),
            None => Self::confirmed(token),
        }
    }

    pub fn encode(&self) -> String {
        self.to_string()
    }
}

impl Display for PackageRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if let Some(prefix) = self.status.prefix() {
            write!(f, "{prefix}")?;
        }
        f.write_str(&self.name)
    }
}

impl From<&str> for PackageRef {
    fn from(token: &str) -> Self {
        PackageRef::decode(token)
    }
}
