use super::record::VariantRecord;
use crate::constants::COMMENT_MARKER;
use crate::error::{AnnotatorError, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::trace;

/// Lines the reader consumed without yielding a record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReaderStats {
    pub lines_read: usize,
    pub comment_lines: usize,
    pub blank_lines: usize,
    pub missing_id_lines: usize,
}

/// Lazy, single forward pass over a VCF text stream.
///
/// Yields one `VariantRecord` per identified data line. Header/comment lines, blank
/// lines and records whose ID column is `.` are consumed silently and counted in
/// [`ReaderStats`]. A line that is not UTF-8 or cannot be split into the expected
/// columns yields an `AnnotatorError::MalformedLine`; iteration may continue past it.
pub struct VcfReader<R> {
    reader: R,
    buf: Vec<u8>,
    stats: ReaderStats,
}

impl<R: BufRead> VcfReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
            stats: ReaderStats::default(),
        }
    }

    /// Next raw line without its terminator, `None` at end of input.
    fn next_line(&mut self) -> Option<Result<Vec<u8>>> {
        self.buf.clear();
        match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(0) => None,
            Ok(_) => {
                if self.buf.ends_with(b"\n") {
                    self.buf.pop();
                    if self.buf.ends_with(b"\r") {
                        self.buf.pop();
                    }
                }
                Some(Ok(std::mem::take(&mut self.buf)))
            }
            Err(e) => Some(Err(e.into())),
        }
    }

    pub fn stats(&self) -> ReaderStats {
        self.stats
    }
}

impl VcfReader<BufReader<File>> {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<'a> VcfReader<BufReader<&'a [u8]>> {
    pub fn from_text(text: &'a str) -> Self {
        Self::new(BufReader::new(text.as_bytes()))
    }
}

impl<R: BufRead> Iterator for VcfReader<R> {
    type Item = Result<VariantRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let bytes = match self.next_line()? {
                Ok(bytes) => bytes,
                Err(e) => return Some(Err(e)),
            };
            self.stats.lines_read += 1;
            let line = self.stats.lines_read;
            let text = match String::from_utf8(bytes) {
                Ok(text) => text,
                Err(_) => {
                    return Some(Err(AnnotatorError::MalformedLine {
                        line,
                        reason: "invalid UTF-8".to_string(),
                    }))
                }
            };

            if text.starts_with(COMMENT_MARKER) {
                self.stats.comment_lines += 1;
                continue;
            }
            if text.trim().is_empty() {
                self.stats.blank_lines += 1;
                continue;
            }

            match VariantRecord::parse_line(line, &text) {
                Ok(Some(record)) => return Some(Ok(record)),
                Ok(None) => {
                    trace!(line, "dropping record without identifier");
                    self.stats.missing_id_lines += 1;
                }
                Err(e) => return Some(Err(e)),
            }
        }
    }
}
