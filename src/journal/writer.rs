//! Journal Writer
//!
//! Handles appending records to a journal file.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::config::JournalSync;
use crate::error::Result;

use super::Record;

/// Appends records to the journal file
pub struct JournalWriter {
    path: PathBuf,
    writer: BufWriter<File>,
    sync_strategy: JournalSync,
    /// Records appended through this writer
    appended: u64,
    /// Records flushed but not yet fsynced
    uncommitted: usize,
}

impl JournalWriter {
    /// Open or create a journal file in append mode
    pub fn open(path: &Path, sync_strategy: JournalSync) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
            sync_strategy,
            appended: 0,
            uncommitted: 0,
        })
    }

    /// Append one record as a line and flush it before returning
    pub fn append(&mut self, record: &Record) -> Result<()> {
        let mut line = record.encode()?;
        line.push('\n');

        self.writer.write_all(line.as_bytes())?;
        self.writer.flush()?;

        self.appended += 1;
        self.uncommitted += 1;

        match self.sync_strategy {
            JournalSync::EveryWrite => self.sync()?,
            JournalSync::EveryNEntries { count } => {
                if self.uncommitted >= count {
                    self.sync()?;
                }
            }
        }

        tracing::debug!(
            path = %self.path.display(),
            id = record.id(),
            tombstone = record.is_tombstone(),
            "appended journal record"
        );
        Ok(())
    }

    /// Force everything appended so far onto disk
    pub fn sync(&mut self) -> Result<()> {
        self.writer.flush()?;
        self.writer.get_ref().sync_data()?;
        self.uncommitted = 0;
        Ok(())
    }

    /// Flush, fsync and release the file handle
    pub fn close(mut self) -> Result<()> {
        self.sync()
    }

    /// Release the file handle without flushing
    ///
    /// Bytes a failed flush left in the buffer are dropped instead of being
    /// written behind the caller's back.
    pub fn abandon(self) {
        let Self { path, writer, .. } = self;
        let (_file, unwritten) = writer.into_parts();
        let dropped = unwritten.map_or(0, |bytes| bytes.len());
        if dropped > 0 {
            tracing::warn!(
                path = %path.display(),
                bytes = dropped,
                "discarding unflushed journal bytes"
            );
        }
    }

    /// Bytes buffered but not yet handed to the OS
    pub fn pending_bytes(&self) -> usize {
        self.writer.buffer().len()
    }

    /// Records appended through this writer
    pub fn appended_count(&self) -> u64 {
        self.appended
    }

    /// Records not yet fsynced
    pub fn uncommitted_count(&self) -> usize {
        self.uncommitted
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
