//! Store Module
//!
//! Opens every table at startup and coordinates the operations that span
//! more than one of them.
//!
//! ## Responsibilities
//! - Open (replay and compact) each table once, before anything else runs
//! - Bootstrap a fresh data directory: root account, then version marker
//! - Hand out transaction ids from the persisted counter
//! - Close every journal on shutdown
//!
//! Operations touching several tables are not atomic: each save is durable
//! on its own, in the order listed.

use std::fs;

use crate::config::{Config, JournalSync};
use crate::entity::{
    Account, Book, Collection, Entity, SchemaVersion, Tracked, Transaction, TransactionCounter,
    TxKind, MAX_QUANTITY, SINGLETON_KEY,
};
use crate::error::{Result, StoreError};
use crate::query::{Limit, Predicate};

/// Largest limit accepted by `finance`
pub const MAX_QUERY_LIMIT: usize = 2_147_483_647;

/// Income and expense over a window of transactions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FinanceSummary {
    /// Transactions summed
    pub transactions: usize,
    /// Sum of purchase amounts
    pub income_cent: i64,
    /// Sum of import costs
    pub expense_cent: i64,
}

/// All tables of one data directory
pub struct Store {
    config: Config,
    versions: Collection<SchemaVersion>,
    accounts: Collection<Account>,
    books: Collection<Book>,
    counter: Collection<TransactionCounter>,
    transactions: Collection<Transaction>,
    /// In-memory handle of the counter singleton
    next_id: Tracked<TransactionCounter>,
}

impl Store {
    /// Open or create a store with the given config
    ///
    /// On startup:
    /// 1. Create the data directory
    /// 2. Open every table (replay + compaction)
    /// 3. Ensure the transaction counter exists
    /// 4. Seed a fresh directory
    pub fn open(config: Config) -> Result<Self> {
        if let JournalSync::EveryNEntries { count: 0 } = config.journal_sync {
            return Err(StoreError::Config(
                "journal sync interval must be at least one entry".to_string(),
            ));
        }

        // Step 1
        fs::create_dir_all(&config.data_dir)?;

        // Step 2
        let versions = Collection::open(&config)?;
        let accounts = Collection::open(&config)?;
        let books = Collection::open(&config)?;
        let mut counter: Collection<TransactionCounter> = Collection::open(&config)?;
        let transactions = Collection::open(&config)?;

        // Step 3
        let next_id = match counter.find_by_id(SINGLETON_KEY)? {
            Some(existing) => existing,
            None => counter.insert(TransactionCounter::default())?,
        };

        let mut store = Self {
            config,
            versions,
            accounts,
            books,
            counter,
            transactions,
            next_id,
        };

        // Step 4
        store.bootstrap()?;

        tracing::info!(
            data_dir = %store.config.data_dir.display(),
            accounts = store.accounts.len(),
            books = store.books.len(),
            transactions = store.transactions.len(),
            "store opened"
        );
        Ok(store)
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified data directory
    pub fn open_path(path: &std::path::Path) -> Result<Self> {
        Self::open(Config::builder().data_dir(path).build())
    }

    /// The version marker is written last, so an interrupted bootstrap is
    /// redone on the next start.
    fn bootstrap(&mut self) -> Result<()> {
        if self.versions.find_by_id(SINGLETON_KEY)?.is_some() {
            return Ok(());
        }

        tracing::info!(data_dir = %self.config.data_dir.display(), "bootstrapping fresh store");

        if let Some(root) = &self.config.root_account {
            let account = Account::new(&root.id, &root.password, &root.name, Account::PRIVILEGE_ROOT);
            self.accounts.insert(account)?;
        }
        self.versions.insert(SchemaVersion::default())?;
        Ok(())
    }

    // =========================================================================
    // Tables
    // =========================================================================

    pub fn accounts(&self) -> &Collection<Account> {
        &self.accounts
    }

    pub fn accounts_mut(&mut self) -> &mut Collection<Account> {
        &mut self.accounts
    }

    pub fn books(&self) -> &Collection<Book> {
        &self.books
    }

    pub fn books_mut(&mut self) -> &mut Collection<Book> {
        &mut self.books
    }

    pub fn transactions(&self) -> &Collection<Transaction> {
        &self.transactions
    }

    /// Recorded schema version
    pub fn schema_version(&self) -> Result<u32> {
        self.versions
            .find_by_id(SINGLETON_KEY)?
            .map(|marker| marker.version)
            .ok_or_else(|| StoreError::NotFound {
                table: SchemaVersion::TABLE.to_string(),
                id: SINGLETON_KEY.to_string(),
            })
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Hand out the next transaction id, persisting the advanced counter
    pub fn next_transaction_id(&mut self) -> Result<u64> {
        let id = self.next_id.next_id;
        self.next_id.next_id += 1;
        if let Err(e) = self.counter.save(&mut self.next_id) {
            self.next_id.next_id = id;
            return Err(e);
        }
        Ok(id)
    }

    /// Find the book `isbn`, creating an empty one if absent
    pub fn ensure_book(&mut self, isbn: &str) -> Result<Tracked<Book>> {
        match self.books.find_by_id(isbn)? {
            Some(book) => Ok(book),
            None => self.books.insert(Book::new(isbn)),
        }
    }

    /// Sell `quantity` copies of `isbn`: decrement stock, then record the sale
    pub fn record_purchase(&mut self, isbn: &str, quantity: i64) -> Result<Tracked<Transaction>> {
        check_quantity(quantity)?;
        let mut book = self.find_book(isbn)?;
        if book.stock < quantity {
            return Err(StoreError::Validation(format!(
                "only {} copies of '{}' in stock",
                book.stock, isbn
            )));
        }
        // reject an out-of-range amount before anything is written
        Transaction::purchase(0, &book, quantity)?.validate()?;

        book.stock -= quantity;
        self.books.save(&mut book)?;

        let id = self.next_transaction_id()?;
        let transaction = Transaction::purchase(id, &book, quantity)?;
        self.transactions.insert(transaction)
    }

    /// Restock `quantity` copies of `isbn` bought for `cost_cent` in total
    pub fn record_import(
        &mut self,
        isbn: &str,
        quantity: i64,
        cost_cent: i64,
    ) -> Result<Tracked<Transaction>> {
        check_quantity(quantity)?;
        let transaction = Transaction::import(0, isbn, quantity, cost_cent);
        transaction.validate()?;

        let mut book = self.find_book(isbn)?;
        book.stock = book
            .stock
            .checked_add(quantity)
            .ok_or_else(|| StoreError::validation("stock overflows"))?;
        self.books.save(&mut book)?;

        let id = self.next_transaction_id()?;
        self.transactions.insert(Transaction { id, ..transaction })
    }

    /// Income and expense over the `limit` most recent transactions
    ///
    /// A bounded limit larger than the number of recorded transactions is
    /// rejected rather than silently summing fewer.
    pub fn finance(&self, limit: Limit) -> Result<FinanceSummary> {
        if let Limit::At(n) = limit {
            if n > MAX_QUERY_LIMIT {
                return Err(StoreError::Validation(format!("limit {} too large", n)));
            }
        }

        let transactions = self.transactions.find_many(&Predicate::new(), limit)?;
        if let Limit::At(n) = limit {
            if transactions.len() < n {
                return Err(StoreError::Validation(format!(
                    "limit {} exceeds the {} recorded transactions",
                    n,
                    transactions.len()
                )));
            }
        }

        let mut summary = FinanceSummary {
            transactions: transactions.len(),
            ..FinanceSummary::default()
        };
        for tx in &transactions {
            let total = match tx.kind {
                TxKind::Buy => &mut summary.income_cent,
                TxKind::Import => &mut summary.expense_cent,
            };
            *total = total
                .checked_add(tx.amount_cent)
                .ok_or_else(|| StoreError::validation("finance total overflows"))?;
        }
        Ok(summary)
    }

    /// Close every journal; safe to call more than once
    pub fn close(&mut self) -> Result<()> {
        let results = [
            self.transactions.close(),
            self.counter.close(),
            self.books.close(),
            self.accounts.close(),
            self.versions.close(),
        ];
        results.into_iter().collect::<Result<Vec<()>>>().map(|_| ())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn config(&self) -> &Config {
        &self.config
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn find_book(&self, isbn: &str) -> Result<Tracked<Book>> {
        self.books.find_by_id(isbn)?.ok_or_else(|| StoreError::NotFound {
            table: Book::TABLE.to_string(),
            id: isbn.to_string(),
        })
    }
}

fn check_quantity(quantity: i64) -> Result<()> {
    if !(0..=MAX_QUANTITY).contains(&quantity) {
        return Err(StoreError::Validation(format!("invalid quantity {}", quantity)));
    }
    Ok(())
}
