//! Journal Module
//!
//! Append-only record log backing one table.
//!
//! ## Responsibilities
//! - Append one record per line, flushed before the call returns
//! - Lazy, restartable scan of every record in write order
//! - Replay into a live map with tombstone/rekey consistency checks
//! - Atomic rewrite-to-replace for compaction
//!
//! ## File Format
//! ```text
//! {"name":"Alice","id":"A001","_id":"A001"}             upsert
//! {"name":"Alicia","id":"A001","_id":"A001"}            upsert (overwrites)
//! {"isbn":"978-2","_id":"978-2","_rekeyed_from":"978-1"}  upsert written by a rekey
//! {"_id":"978-1","_deleted":true}                        tombstone
//! ```
//! One JSON object per line, newline terminated. Keys starting with `_`
//! are reserved for the record envelope.

mod compaction;
mod reader;
mod record;
mod recovery;
mod writer;

pub use compaction::{replace_atomically, scratch_path, SCRATCH_SUFFIX};
pub use reader::JournalReader;
pub use record::{check_field_names, Fields, Record, Value, DELETED_KEY, ID_KEY, REKEYED_FROM_KEY};
pub use recovery::{JournalRecovery, LiveMap, ReplayStats, Replayer};
pub use writer::JournalWriter;
