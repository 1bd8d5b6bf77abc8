//! Table Module
//!
//! A journal plus the in-memory map it replays into.
//!
//! ## Responsibilities
//! - Replay the journal on open and compact it to one upsert per live id
//! - Append before mutating, so the map never runs ahead of the journal
//! - Reject deletes of absent ids and rekeys onto taken ids
//! - Fail fast after any storage or consistency error
//!
//! ## Data Structure Choice
//! The live map is a BTreeMap: unlimited scans visit ids in a stable
//! order, and lookups never touch the file.

mod journaled;
mod order;

pub use journaled::Table;
pub use order::KeyOrder;
