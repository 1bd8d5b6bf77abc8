//! Journal Reader
//!
//! Lazily reads records from a journal file in write order.

use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use crate::error::{Result, StoreError};

use super::Record;

/// Reads records from a journal file
///
/// Iterating yields one decoded record per non-blank line. A final line
/// with no terminating newline that fails to decode is the remnant of an
/// interrupted append: iteration ends there and `torn_tail()` reports it.
/// Any other undecodable line yields an `InconsistentJournal` error and
/// ends iteration.
pub struct JournalReader {
    path: PathBuf,
    reader: BufReader<File>,
    /// 1-based number of the last line read
    line_no: u64,
    torn_tail: bool,
    finished: bool,
}

impl JournalReader {
    /// Open a journal file for reading
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            reader: BufReader::new(file),
            line_no: 0,
            torn_tail: false,
            finished: false,
        })
    }

    /// Read the next record, `Ok(None)` at end of file
    pub fn next_record(&mut self) -> Result<Option<Record>> {
        if self.finished {
            return Ok(None);
        }

        let mut buf = Vec::new();
        loop {
            buf.clear();
            let read = self.reader.read_until(b'\n', &mut buf)?;
            if read == 0 {
                self.finished = true;
                return Ok(None);
            }
            self.line_no += 1;

            let terminated = buf.last() == Some(&b'\n');
            let decoded = std::str::from_utf8(&buf)
                .map_err(|e| StoreError::InconsistentJournal(format!("invalid UTF-8: {}", e)))
                .and_then(|line| {
                    let line = line.trim_end_matches(['\n', '\r']);
                    if line.trim().is_empty() {
                        Ok(None)
                    } else {
                        Record::decode(line).map(Some)
                    }
                });

            match decoded {
                Ok(Some(record)) => return Ok(Some(record)),
                Ok(None) => continue,
                Err(_) if !terminated => {
                    tracing::warn!(
                        path = %self.path.display(),
                        line = self.line_no,
                        bytes = buf.len(),
                        "dropping torn record at end of journal"
                    );
                    self.torn_tail = true;
                    self.finished = true;
                    return Ok(None);
                }
                Err(StoreError::InconsistentJournal(reason)) => {
                    self.finished = true;
                    return Err(StoreError::InconsistentJournal(format!(
                        "{}:{}: {}",
                        self.path.display(),
                        self.line_no,
                        reason
                    )));
                }
                Err(e) => {
                    self.finished = true;
                    return Err(e);
                }
            }
        }
    }

    /// Whether the scan ended on a torn final record
    pub fn torn_tail(&self) -> bool {
        self.torn_tail
    }

    /// Number of lines consumed so far
    pub fn line_no(&self) -> u64 {
        self.line_no
    }

    /// Restart the scan from the first record
    pub fn rewind(&mut self) -> Result<()> {
        self.reader.seek(SeekFrom::Start(0))?;
        self.line_no = 0;
        self.torn_tail = false;
        self.finished = false;
        Ok(())
    }

    /// Path of the journal being read
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Iterator for JournalReader {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}
