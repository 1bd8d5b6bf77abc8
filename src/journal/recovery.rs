//! Journal Recovery
//!
//! Rebuilds the live map by replaying a journal in write order.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use crate::error::{Result, StoreError};

use super::{Fields, JournalReader, Record};

/// Materialized state of a table: id → fields of its last live upsert
pub type LiveMap = BTreeMap<String, Fields>;

/// Statistics of a replay
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplayStats {
    /// Records applied
    pub records: u64,

    /// Upserts applied (rekey upserts included)
    pub upserts: u64,

    /// Tombstones applied
    pub tombstones: u64,

    /// Upserts that retired a previous id
    pub rekeys: u64,

    /// Ids live after the replay
    pub live: usize,

    /// Whether a torn final record was dropped
    pub torn_tail: bool,
}

/// Applies records to a live map, enforcing the journal ordering contract
///
/// - An upsert sets or overwrites its id.
/// - An upsert with `rekeyed_from` also removes the retired id, which must be live.
/// - A tombstone removes its id, which must be live or retired by a rekey.
#[derive(Debug, Default)]
pub struct Replayer {
    live: LiveMap,
    /// Ids removed by a rekey upsert whose tombstone has not been seen yet
    retired: BTreeSet<String>,
    stats: ReplayStats,
}

impl Replayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one record
    pub fn apply(&mut self, record: Record) -> Result<()> {
        match record {
            Record::Upsert {
                id,
                fields,
                rekeyed_from,
            } => {
                if let Some(old) = rekeyed_from {
                    if old == id || self.live.remove(&old).is_none() {
                        return Err(StoreError::InconsistentJournal(format!(
                            "upsert of '{}' retires '{}' which is not live",
                            id, old
                        )));
                    }
                    self.retired.insert(old);
                    self.stats.rekeys += 1;
                }
                self.retired.remove(&id);
                self.live.insert(id, fields);
                self.stats.upserts += 1;
            }
            Record::Tombstone { id } => {
                if self.live.remove(&id).is_none() && !self.retired.remove(&id) {
                    return Err(StoreError::InconsistentJournal(format!(
                        "tombstone for '{}' which is not live",
                        id
                    )));
                }
                self.stats.tombstones += 1;
            }
        }
        self.stats.records += 1;
        Ok(())
    }

    /// Current live map
    pub fn live(&self) -> &LiveMap {
        &self.live
    }

    pub fn finish(mut self) -> (LiveMap, ReplayStats) {
        self.stats.live = self.live.len();
        (self.live, self.stats)
    }
}

/// Handles journal replay on open
pub struct JournalRecovery;

impl JournalRecovery {
    /// Replay the journal at `path`
    ///
    /// A missing file replays to an empty map.
    pub fn recover(path: &Path) -> Result<(LiveMap, ReplayStats)> {
        if !path.exists() {
            return Ok((LiveMap::new(), ReplayStats::default()));
        }

        let mut reader = JournalReader::open(path)?;
        let mut replayer = Replayer::new();
        while let Some(record) = reader.next_record()? {
            replayer.apply(record).map_err(|e| match e {
                StoreError::InconsistentJournal(reason) => StoreError::InconsistentJournal(
                    format!("{}:{}: {}", path.display(), reader.line_no(), reason),
                ),
                other => other,
            })?;
        }

        let torn_tail = reader.torn_tail();
        let (live, mut stats) = replayer.finish();
        stats.torn_tail = torn_tail;
        Ok((live, stats))
    }

    /// Replay without keeping the map, to check a journal is readable
    pub fn verify(path: &Path) -> Result<ReplayStats> {
        Self::recover(path).map(|(_, stats)| stats)
    }
}
