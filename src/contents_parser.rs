use std::fs::File;
use std::io::{BufRead, BufReader, Cursor};
use std::path::{Path, PathBuf};

use log::{info, trace, warn};

use crate::contents_entry::ContentsEntry;
use crate::err::{ContentsError, Result};

/// Location of the system contents file.
pub const DEFAULT_CONTENTS_PATH: &str = "/var/sadm/install/contents";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParserSettings {
    skip_invalid: bool,
}

impl ParserSettings {
    pub fn new() -> Self {
        ParserSettings::default()
    }

    /// When set, lines that fail to parse are logged and skipped instead of
    /// being yielded as errors.
    pub fn skip_invalid(mut self, skip_invalid: bool) -> Self {
        self.skip_invalid = skip_invalid;
        self
    }

    pub fn should_skip_invalid(&self) -> bool {
        self.skip_invalid
    }
}

/// Reads the entries of a contents file, one line at a time.
///
/// ```
/// use svr4_contents::ContentsParser;
///
/// let data = b"# comment\n/bin=./usr/bin s none SUNWcsr\n".to_vec();
/// let entries = ContentsParser::from_buffer(data).read_all().unwrap();
/// assert_eq!(entries[0].link_target(), Some("./usr/bin"));
/// ```
pub struct ContentsParser<R: BufRead> {
    data: R,
    config: ParserSettings,
}

impl ContentsParser<BufReader<File>> {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| ContentsError::FailedToOpenFile {
            path: PathBuf::from(path),
            source: e,
        })?;

        info!("Reading contents from {}", path.display());
        Ok(Self::from_reader(BufReader::new(f)))
    }

    /// Opens [`DEFAULT_CONTENTS_PATH`].
    pub fn from_default_path() -> Result<Self> {
        Self::from_path(DEFAULT_CONTENTS_PATH)
    }
}

impl ContentsParser<Cursor<Vec<u8>>> {
    pub fn from_buffer(buffer: Vec<u8>) -> Self {
        Self::from_reader(Cursor::new(buffer))
    }
}

impl<R: BufRead> ContentsParser<R> {
    pub fn from_reader(data: R) -> Self {
        ContentsParser {
            data,
            config: ParserSettings::default(),
        }
    }

    pub fn with_configuration(mut self, configuration: ParserSettings) -> Self {
        self.config = configuration;
        self
    }

    /// Iterates over the entries, skipping blank and comment lines.
    pub fn entries(self) -> IterEntries<R> {
        IterEntries {
            data: self.data,
            config: self.config,
            line_number: 0,
            buf: Vec::new(),
            done: false,
        }
    }

    /// Reads every entry, stopping at the first error.
    pub fn read_all(self) -> Result<Vec<ContentsEntry>> {
        self.entries().collect()
    }
}

pub struct IterEntries<R: BufRead> {
    data: R,
    config: ParserSettings,
    line_number: u64,
    buf: Vec<u8>,
    done: bool,
}

impl<R: BufRead> Iterator for IterEntries<R> {
    type Item = Result<ContentsEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            self.buf.clear();
            self.line_number += 1;
            let line_number = self.line_number;

            match self.data.read_until(b'\n', &mut self.buf) {
                Ok(0) => {
                    self.done = true;
                    trace!("Reached end of contents after {} lines", line_number - 1);
                }
                Ok(_) => match decode_line(&self.buf).and_then(ContentsEntry::from_line) {
                    Ok(Some(entry)) => return Some(Ok(entry)),
                    Ok(None) => continue,
                    Err(e) if self.config.should_skip_invalid() => {
                        warn!("Skipping line {}: {}", line_number, e);
                    }
                    Err(e) => {
                        return Some(Err(ContentsError::FailedToParseLine {
                            line_number,
                            source: Box::new(e),
                        }));
                    }
                },
                Err(e) => {
                    // A reader that failed once is not retried.
                    self.done = true;
                    return Some(Err(ContentsError::FailedToReadLine {
                        line_number,
                        source: e,
                    }));
                }
            }
        }

        None
    }
}

fn decode_line(buf: &[u8]) -> Result<&str> {
    std::str::from_utf8(buf).map_err(|e| ContentsError::InvalidEncoding {
        line: String::from_utf8_lossy(buf).trim_end().to_owned(),
        source: e,
    })
}
