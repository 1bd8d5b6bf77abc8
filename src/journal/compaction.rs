//! Journal compaction
//!
//! Rewrites a journal so it holds exactly a given sequence of records.
//! The new contents go to a scratch file next to the journal, which is
//! fsynced and then renamed over the original, so a later open sees either
//! the old file or the complete new one.

use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::Result;

use super::Record;

/// Suffix of the scratch file used while a compaction is in flight
pub const SCRATCH_SUFFIX: &str = ".compact";

/// Path of the scratch file for `journal`
/// "books.jsonl" → "books.jsonl.compact"
pub fn scratch_path(journal: &Path) -> PathBuf {
    let mut name = journal.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(SCRATCH_SUFFIX);
    journal.with_file_name(name)
}

/// Replace `journal` with a file containing exactly `records`, in order.
///
/// Returns the number of records written. On error before the swap the
/// scratch file is removed and the original journal is untouched.
pub fn replace_atomically<I>(journal: &Path, records: I) -> Result<usize>
where
    I: IntoIterator<Item = Record>,
{
    let scratch = scratch_path(journal);

    let written = match write_scratch(&scratch, records) {
        Ok(written) => written,
        Err(e) => {
            let _ = fs::remove_file(&scratch);
            return Err(e);
        }
    };

    fs::rename(&scratch, journal)?;
    sync_parent_dir(journal)?;

    tracing::info!(path = %journal.display(), records = written, "journal rewritten");
    Ok(written)
}

fn write_scratch<I>(scratch: &Path, records: I) -> Result<usize>
where
    I: IntoIterator<Item = Record>,
{
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(scratch)?;
    let mut writer = BufWriter::new(file);

    let mut written = 0;
    for record in records {
        let mut line = record.encode()?;
        line.push('\n');
        writer.write_all(line.as_bytes())?;
        written += 1;
    }

    writer.flush()?;
    writer.get_ref().sync_all()?;
    Ok(written)
}

/// Make the rename durable by syncing the containing directory
#[cfg(unix)]
fn sync_parent_dir(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::File::open(dir)?.sync_all()?;
    }
    Ok(())
}

#[cfg(not(unix))]
fn sync_parent_dir(_path: &Path) -> Result<()> {
    Ok(())
}
