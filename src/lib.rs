//! # shelfdb
//!
//! A small persistent object store for an inventory/accounting tool:
//! - One append-only JSON-lines journal per table
//! - Replay-and-compact on open, with torn-tail and rekey crash handling
//! - Upsert / rekey / delete with at most one live record per key
//! - Predicate queries with equality and tag-membership matching
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          Store                              │
//! │          (opens every table, bootstrap, counters)           │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                 Collection<E: Entity>                       │
//! │        (primary key, sanity check, rekey detection)         │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │    Table    │─────────▶│    Query    │
//!   │ (live map)  │          │  (scans)    │
//!   └──────┬──────┘          └─────────────┘
//!          │
//!          ▼
//!   ┌─────────────┐
//!   │   Journal   │
//!   │  (append,   │
//!   │   replace)  │
//!   └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod journal;
pub mod table;
pub mod query;
pub mod entity;
pub mod store;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use config::Config;
pub use entity::{Collection, Entity, Tracked};
pub use error::{Result, StoreError};
pub use journal::{Fields, Value};
pub use query::{Limit, Predicate};
pub use store::Store;
pub use table::{KeyOrder, Table};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of shelfdb
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
