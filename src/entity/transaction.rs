//! Transaction and transaction-id counter bindings.

use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};
use crate::table::KeyOrder;

use super::{Book, Entity, SINGLETON_KEY};

/// Largest quantity a single transaction may move
pub const MAX_QUANTITY: i64 = 2_147_483_647;

/// Amounts must stay below 2^53
const MAX_AMOUNT_CENT: i64 = 9_007_199_254_740_991;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxKind {
    /// Sale to a customer (income)
    #[default]
    Buy,

    /// Restock from a supplier (expense)
    Import,
}

/// A stock movement, keyed by a counter-assigned id
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Transaction {
    pub id: u64,
    pub book_id: String,
    #[serde(rename = "type")]
    pub kind: TxKind,
    pub quantity: i64,
    pub amount_cent: i64,
}

impl Transaction {
    /// Sale of `quantity` copies of `book` at its current price
    pub fn purchase(id: u64, book: &Book, quantity: i64) -> Result<Self> {
        Ok(Self {
            id,
            book_id: book.isbn.clone(),
            kind: TxKind::Buy,
            quantity,
            amount_cent: book.price_of(quantity)?,
        })
    }

    /// Restock of `quantity` copies of `isbn` for `cost_cent` in total
    pub fn import(id: u64, isbn: impl Into<String>, quantity: i64, cost_cent: i64) -> Self {
        Self {
            id,
            book_id: isbn.into(),
            kind: TxKind::Import,
            quantity,
            amount_cent: cost_cent,
        }
    }
}

impl Entity for Transaction {
    const TABLE: &'static str = "transactions";

    // most recent first
    const ORDER: KeyOrder = KeyOrder::NumericDescending;

    fn primary_key(&self) -> String {
        self.id.to_string()
    }

    fn validate(&self) -> Result<()> {
        if self.book_id.is_empty() {
            return Err(StoreError::validation("transaction has no book"));
        }
        if !(0..=MAX_QUANTITY).contains(&self.quantity) {
            return Err(StoreError::Validation(format!(
                "invalid quantity {}",
                self.quantity
            )));
        }
        if !(0..MAX_AMOUNT_CENT).contains(&self.amount_cent) {
            return Err(StoreError::Validation(format!(
                "invalid amount {}",
                self.amount_cent
            )));
        }
        Ok(())
    }
}

/// Singleton holding the next transaction id to hand out
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransactionCounter {
    #[serde(rename = "id")]
    pub next_id: u64,
}

impl Entity for TransactionCounter {
    const TABLE: &'static str = "transactionids";

    fn primary_key(&self) -> String {
        SINGLETON_KEY.to_string()
    }

    fn validate(&self) -> Result<()> {
        if self.next_id > i64::MAX as u64 {
            return Err(StoreError::validation("transaction id space exhausted"));
        }
        Ok(())
    }
}
