//! Reading and writing SVR4 package `contents(4)` files.
//!
//! Every line of a contents file describes one installed object and the
//! packages that own it:
//!
//! ```
//! use svr4_contents::{ContentsEntry, FileType};
//!
//! let line = "/devices/pseudo/arp@0:arp c none 44 0 0666 root sys SUNWcsd";
//! let entry = ContentsEntry::from_line(line).unwrap().unwrap();
//!
//! assert_eq!(entry.file_type(), FileType::CharDevice);
//! assert_eq!(entry.mode(), Some(0o666));
//! assert_eq!(entry.to_line(), line);
//! ```

#[macro_use]
mod macros;

pub mod checksum;
mod contents_entry;
mod contents_parser;
pub mod err;
#[cfg(unix)]
mod fs_metadata;
pub mod grammar;
mod metadata;
mod package;

pub use checksum::{LegacySum, sum, sum_reader};
pub use contents_entry::{
    Attributes, ContentsEntry, DEFAULT_INSTALL_CLASS, Device, EntryKind, Link, Regular,
};
pub use contents_parser::{ContentsParser, DEFAULT_CONTENTS_PATH, IterEntries, ParserSettings};
pub use err::{ContentsError, Result};
#[cfg(unix)]
pub use fs_metadata::FsMetadataProvider;
pub use grammar::FileType;
pub use metadata::{EntryOptions, FileMetadata, MetadataProvider, ObjectKind};
pub use package::{PackageRef, PackageStatus, STATUS_PREFIXES};

// For tests, we only initialize logging once.
#[cfg(test)]
use std::sync::Once;

#[cfg(test)]
static LOGGER_INIT: Once = Once::new();

// Rust runs the tests concurrently, so unless we synchronize logging access
// it will crash when attempting to run `cargo test` with some logging facilities.
#[cfg(test)]
pub fn ensure_env_logger_initialized() {
    LOGGER_INIT.call_once(env_logger::init);
}
