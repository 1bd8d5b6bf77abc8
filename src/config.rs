//! Configuration for shelfdb
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

/// Main configuration for a shelfdb instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Root directory for all journal files
    /// Internal structure:
    ///   {data_dir}/
    ///     ├── accounts.jsonl          (one journal per table)
    ///     ├── books.jsonl
    ///     └── books.jsonl.compact     (only while a compaction is in flight)
    pub data_dir: PathBuf,

    // -------------------------------------------------------------------------
    // Journal Configuration
    // -------------------------------------------------------------------------
    /// Sync strategy: how often to fsync a journal after appending
    pub journal_sync: JournalSync,

    /// Operator go-ahead to delete a scratch file left by an interrupted
    /// compaction. When false, opening such a table fails.
    pub discard_interrupted_compaction: bool,

    // -------------------------------------------------------------------------
    // Bootstrap Configuration
    // -------------------------------------------------------------------------
    /// Account seeded on first start (when no schema version is recorded)
    pub root_account: Option<RootAccount>,
}

/// Journal sync strategy
///
/// Every append is flushed to the OS before returning regardless of strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JournalSync {
    /// fsync after every append (safest, slowest)
    EveryWrite,

    /// fsync after N appends
    EveryNEntries { count: usize },
}

/// Credentials of the account created on first start
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootAccount {
    pub id: String,
    pub password: String,
    pub name: String,
}

impl Default for RootAccount {
    fn default() -> Self {
        Self {
            id: "root".to_string(),
            password: "sjtu".to_string(),
            name: String::new(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./shelfdb_data"),
            journal_sync: JournalSync::EveryWrite,
            discard_interrupted_compaction: false,
            root_account: Some(RootAccount::default()),
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Path of the journal backing `table`
    pub fn journal_path(&self, table: &str) -> PathBuf {
        self.data_dir.join(format!("{}.jsonl", table))
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory (root for all journals)
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Set the journal sync strategy
    pub fn journal_sync(mut self, strategy: JournalSync) -> Self {
        self.config.journal_sync = strategy;
        self
    }

    /// Allow open to drop scratch files from interrupted compactions
    pub fn discard_interrupted_compaction(mut self, discard: bool) -> Self {
        self.config.discard_interrupted_compaction = discard;
        self
    }

    /// Set (or clear) the account seeded on first start
    pub fn root_account(mut self, account: Option<RootAccount>) -> Self {
        self.config.root_account = account;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
