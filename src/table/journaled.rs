//! Table implementation
//!
//! One journal plus the live map it replays into.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{Config, JournalSync};
use crate::error::{Result, StoreError};
use crate::journal::{
    check_field_names, replace_atomically, scratch_path, Fields, JournalRecovery, JournalWriter,
    LiveMap, Record, ReplayStats,
};
use crate::query::{self, Limit, Predicate, Row};

use super::KeyOrder;

/// A journaled table
///
/// ## Lifecycle
/// - `open` replays the journal, rewrites it with one upsert per live id,
///   then reopens it for appending
/// - `put`/`rekey`/`delete` append to the journal first, then update the map
/// - `close` (or drop) flushes and fsyncs the journal once
///
/// A storage or consistency error during a mutation marks the table failed;
/// every later call returns `TableFailed`.
pub struct Table {
    /// Table name, also the journal file stem
    name: String,

    /// Journal location
    path: PathBuf,

    /// Id order for limited queries and compacted files
    order: KeyOrder,

    sync_strategy: JournalSync,

    /// id → fields of the live record
    live: LiveMap,

    /// Appender; `None` once closed
    writer: Option<JournalWriter>,

    /// Nothing appended since the last compaction
    compacted: bool,

    /// Reason the table became unusable
    failure: Option<String>,

    /// Statistics of the replay done at open
    replay: ReplayStats,
}

impl Table {
    /// Open (or create) the table `name` under `config.data_dir`
    ///
    /// On startup:
    /// 1. Refuse (or, with operator go-ahead, discard) an interrupted compaction
    /// 2. Replay the journal into the live map
    /// 3. Compact the journal down to the live records
    /// 4. Reopen the journal for appending
    pub fn open(config: &Config, name: &str, order: KeyOrder) -> Result<Self> {
        if name.is_empty() || name.contains(['/', '\\']) || name.starts_with('.') {
            return Err(StoreError::Config(format!("invalid table name '{}'", name)));
        }

        fs::create_dir_all(&config.data_dir)?;
        let path = config.journal_path(name);

        // Step 1: a scratch file means a rewrite never reached its rename
        let scratch = scratch_path(&path);
        if scratch.exists() {
            if !config.discard_interrupted_compaction {
                return Err(StoreError::InconsistentJournal(format!(
                    "{} was left by an interrupted compaction of table '{}'; \
                     enable discard_interrupted_compaction to drop it",
                    scratch.display(),
                    name
                )));
            }
            tracing::warn!(
                table = name,
                scratch = %scratch.display(),
                "discarding scratch file of an interrupted compaction"
            );
            fs::remove_file(&scratch)?;
        }

        // Step 2: replay
        let existed = path.exists();
        let (live, replay) = JournalRecovery::recover(&path)?;

        let mut table = Self {
            name: name.to_string(),
            path,
            order,
            sync_strategy: config.journal_sync,
            live,
            writer: None,
            compacted: false,
            failure: None,
            replay,
        };

        // Step 3: compact
        if existed {
            table.rewrite()?;
        }

        // Step 4: append mode
        table.writer = Some(JournalWriter::open(&table.path, table.sync_strategy)?);
        table.compacted = true;

        tracing::info!(
            table = %table.name,
            live = table.live.len(),
            records = table.replay.records,
            tombstones = table.replay.tombstones,
            rekeys = table.replay.rekeys,
            torn_tail = table.replay.torn_tail,
            "table opened"
        );
        Ok(table)
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Insert or overwrite `id`
    ///
    /// Entity-level checks run before this is called; here only the id and
    /// field names are checked. Nothing is appended if a check fails.
    pub fn put(&mut self, id: &str, fields: Fields) -> Result<()> {
        self.ensure_usable()?;
        check_id(id)?;
        check_field_names(&fields)?;

        self.append(&Record::upsert(id, fields.clone()))?;
        self.live.insert(id.to_string(), fields);
        Ok(())
    }

    /// Move a live record from `old_id` to `new_id`, storing `fields`
    ///
    /// Appends the new upsert (marked with the id it retires) before the
    /// tombstone of the old id, so a crash in between still resolves the
    /// entity under `new_id` only.
    pub fn rekey(&mut self, old_id: &str, new_id: &str, fields: Fields) -> Result<()> {
        if old_id == new_id {
            return self.put(new_id, fields);
        }

        self.ensure_usable()?;
        check_id(new_id)?;
        check_field_names(&fields)?;

        if !self.live.contains_key(old_id) {
            return Err(self.not_found(old_id));
        }
        if self.live.contains_key(new_id) {
            return Err(StoreError::DuplicateKey {
                table: self.name.clone(),
                id: new_id.to_string(),
            });
        }

        self.append(&Record::Upsert {
            id: new_id.to_string(),
            fields: fields.clone(),
            rekeyed_from: Some(old_id.to_string()),
        })?;
        self.live.remove(old_id);
        self.live.insert(new_id.to_string(), fields);

        self.append(&Record::tombstone(old_id))?;

        tracing::debug!(table = %self.name, from = old_id, to = new_id, "record rekeyed");
        Ok(())
    }

    /// Delete the live record `id`
    pub fn delete(&mut self, id: &str) -> Result<()> {
        self.ensure_usable()?;
        if !self.live.contains_key(id) {
            return Err(self.not_found(id));
        }

        self.append(&Record::tombstone(id))?;
        self.live.remove(id);
        Ok(())
    }

    /// Rewrite the journal down to the live records now
    ///
    /// Returns the number of records in the rewritten journal.
    pub fn compact(&mut self) -> Result<usize> {
        self.ensure_usable()?;

        if let Some(writer) = self.writer.take() {
            if let Err(e) = writer.close() {
                return Err(self.fail(e));
            }
        }

        let written = match self.rewrite() {
            Ok(written) => written,
            Err(e) => return Err(self.fail(e)),
        };

        match JournalWriter::open(&self.path, self.sync_strategy) {
            Ok(writer) => self.writer = Some(writer),
            Err(e) => return Err(self.fail(e)),
        }
        self.compacted = true;
        Ok(written)
    }

    /// Flush and close the journal; later calls are no-ops
    ///
    /// A failed table has nothing left to flush: whatever a failed append
    /// left buffered is discarded, never written.
    pub fn close(&mut self) -> Result<()> {
        if let Some(writer) = self.writer.take() {
            if self.failure.is_some() {
                writer.abandon();
                return Ok(());
            }
            writer.close()?;
            tracing::info!(table = %self.name, live = self.live.len(), "table closed");
        }
        Ok(())
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Detached copy of the live record `id`
    pub fn get(&self, id: &str) -> Result<Option<Fields>> {
        self.ensure_usable()?;
        Ok(self.live.get(id).cloned())
    }

    /// First live record matching `predicate`
    pub fn find_one(&self, predicate: &Predicate) -> Result<Option<Row>> {
        self.ensure_usable()?;
        Ok(query::find_one(&self.live, predicate))
    }

    /// Live records matching `predicate`, at most `limit` of them
    pub fn find_many(&self, predicate: &Predicate, limit: Limit) -> Result<Vec<Row>> {
        self.ensure_usable()?;
        Ok(query::find_many(&self.live, self.order, predicate, limit))
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn order(&self) -> KeyOrder {
        self.order
    }

    /// Number of live records
    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// Whether nothing has been appended since the last compaction
    pub fn is_compacted(&self) -> bool {
        self.compacted
    }

    pub fn is_closed(&self) -> bool {
        self.writer.is_none()
    }

    /// Reason the table stopped accepting operations, if it did
    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    /// Statistics of the replay done at open
    pub fn replay_stats(&self) -> &ReplayStats {
        &self.replay
    }

    /// Records appended since the journal was last (re)opened
    pub fn appended_since_open(&self) -> u64 {
        self.writer.as_ref().map_or(0, JournalWriter::appended_count)
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn ensure_usable(&self) -> Result<()> {
        if let Some(reason) = &self.failure {
            return Err(StoreError::TableFailed {
                table: self.name.clone(),
                reason: reason.clone(),
            });
        }
        if self.writer.is_none() {
            return Err(StoreError::TableFailed {
                table: self.name.clone(),
                reason: "table is closed".to_string(),
            });
        }
        Ok(())
    }

    fn append(&mut self, record: &Record) -> Result<()> {
        let writer = match self.writer.as_mut() {
            Some(writer) => writer,
            None => return self.ensure_usable(),
        };
        let result = writer.append(record);
        if let Err(e) = result {
            return Err(self.fail(e));
        }
        self.compacted = false;
        Ok(())
    }

    /// Write the live map, in table order, over the journal
    fn rewrite(&self) -> Result<usize> {
        let mut rows: Vec<(&String, &Fields)> = self.live.iter().collect();
        rows.sort_by(|a, b| self.order.compare(a.0, b.0));
        replace_atomically(
            &self.path,
            rows.into_iter()
                .map(|(id, fields)| Record::upsert(id.clone(), fields.clone())),
        )
    }

    /// Mark the table failed if `err` is fatal, and hand the error back
    ///
    /// The appender is dropped without a flush, so bytes of a record whose
    /// append already returned an error can never reach the journal later.
    fn fail(&mut self, err: StoreError) -> StoreError {
        if err.is_fatal() && self.failure.is_none() {
            tracing::error!(table = %self.name, error = %err, "table failed");
            self.failure = Some(err.to_string());
            if let Some(writer) = self.writer.take() {
                writer.abandon();
            }
        }
        err
    }

    fn not_found(&self, id: &str) -> StoreError {
        StoreError::NotFound {
            table: self.name.clone(),
            id: id.to_string(),
        }
    }
}

impl Drop for Table {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            tracing::warn!(table = %self.name, error = %e, "failed to close journal on drop");
        }
    }
}

fn check_id(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(StoreError::validation("primary key must not be empty"));
    }
    Ok(())
}
