//! Entity Module
//!
//! Typed bindings over tables. Each entity kind is a plain struct that
//! knows its table, how to derive its primary key, and how to sanity-check
//! itself; `Collection<E>` turns saves into table puts or rekeys.

mod account;
mod book;
mod collection;
mod transaction;
mod version;

use std::ops::{Deref, DerefMut};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;
use crate::journal::Fields;
use crate::table::KeyOrder;

pub use account::Account;
pub use book::Book;
pub use collection::Collection;
pub use transaction::{Transaction, TransactionCounter, TxKind, MAX_QUANTITY};
pub use version::SchemaVersion;

/// Primary key of single-record tables
pub const SINGLETON_KEY: &str = "singleton";

/// Binding between an entity type and its table
pub trait Entity: Serialize + DeserializeOwned + Default + Clone {
    /// Table (and journal file stem) holding this kind
    const TABLE: &'static str;

    /// Id order for limited queries
    const ORDER: KeyOrder = KeyOrder::Lexical;

    /// Derive the primary key from the value
    fn primary_key(&self) -> String;

    /// Sanity check run before every save
    fn validate(&self) -> Result<()>;

    /// Flatten into the journal field shape
    fn to_fields(&self) -> Result<Fields> {
        Ok(serde_json::from_value(serde_json::to_value(self)?)?)
    }

    /// Rebuild from journal fields; missing fields take their defaults
    fn from_fields(fields: &Fields) -> Result<Self> {
        Ok(serde_json::from_value(serde_json::to_value(fields)?)?)
    }

    /// Default value with `overrides` applied on top
    fn with_defaults(overrides: Fields) -> Result<Self> {
        let mut fields = Self::default().to_fields()?;
        fields.extend(overrides);
        Self::from_fields(&fields)
    }
}

/// An entity value plus the key it was last saved under
///
/// Values handed out by queries are detached copies; changes reach the
/// table only through `Collection::save`. If the primary key changed since
/// the last save, the save is a rekey.
#[derive(Debug, Clone, PartialEq)]
pub struct Tracked<E> {
    value: E,
    saved_key: Option<String>,
    deleted: bool,
}

impl<E> Tracked<E> {
    /// A value that has never been saved
    pub fn new(value: E) -> Self {
        Self {
            value,
            saved_key: None,
            deleted: false,
        }
    }

    pub(crate) fn persisted(value: E, key: String) -> Self {
        Self {
            value,
            saved_key: Some(key),
            deleted: false,
        }
    }

    /// Key the value is stored under, `None` before the first save
    pub fn saved_key(&self) -> Option<&str> {
        self.saved_key.as_deref()
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    pub fn into_inner(self) -> E {
        self.value
    }
}

impl<E> Deref for Tracked<E> {
    type Target = E;

    fn deref(&self) -> &E {
        &self.value
    }
}

impl<E> DerefMut for Tracked<E> {
    fn deref_mut(&mut self) -> &mut E {
        &mut self.value
    }
}

// =============================================================================
// Field checks shared by the bindings
// =============================================================================

/// Printable ASCII without space (0x21..=0x7E)
pub(crate) fn is_visible_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x21..=0x7E).contains(&b))
}

/// `[0-9A-Za-z_]`
pub(crate) fn is_word(s: &str) -> bool {
    s.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

pub(crate) fn len_between(s: &str, min: usize, max: usize) -> bool {
    (min..=max).contains(&s.len())
}
