//! Book binding.
//!
//! A book is keyed by its ISBN, which can be edited after creation; saving
//! an edited ISBN rekeys the record.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};

use super::{is_visible_ascii, len_between, Entity};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Book {
    pub isbn: String,
    pub name: String,
    pub author: String,
    pub keywords: Vec<String>,
    pub stock: i64,
    pub price_cent: i64,
}

impl Book {
    /// Max length of the keywords joined with `|`
    pub const KEYWORDS_MAX_LENGTH: usize = 60;

    pub fn new(isbn: impl Into<String>) -> Self {
        Self {
            isbn: isbn.into(),
            ..Self::default()
        }
    }

    /// Replace the keywords with the `|`-separated list `joined`
    pub fn set_keywords(&mut self, joined: &str) -> Result<()> {
        let keywords: Vec<String> = joined.split('|').map(str::to_string).collect();
        if !all_distinct(&keywords) {
            return Err(StoreError::validation("duplicate keywords"));
        }
        self.keywords = keywords;
        Ok(())
    }

    /// Keywords sorted and joined with `|`
    pub fn keywords_joined(&self) -> String {
        let mut keywords = self.keywords.clone();
        keywords.sort();
        keywords.join("|")
    }

    /// Price of `quantity` copies, in cents
    pub fn price_of(&self, quantity: i64) -> Result<i64> {
        self.price_cent
            .checked_mul(quantity)
            .ok_or_else(|| StoreError::validation("purchase amount overflows"))
    }
}

impl Entity for Book {
    const TABLE: &'static str = "books";

    fn primary_key(&self) -> String {
        self.isbn.clone()
    }

    fn validate(&self) -> Result<()> {
        if !len_between(&self.isbn, 1, 20) || !is_visible_ascii(&self.isbn) {
            return Err(StoreError::validation("invalid ISBN"));
        }
        for text in [&self.name, &self.author] {
            if !len_between(text, 0, 60) || !is_visible_ascii(text) || text.contains('"') {
                return Err(StoreError::validation("invalid name or author"));
            }
        }
        if self.keywords.join("|").len() > Self::KEYWORDS_MAX_LENGTH {
            return Err(StoreError::validation("keywords too long"));
        }
        if !all_distinct(&self.keywords) {
            return Err(StoreError::validation("duplicate keywords"));
        }
        if self.keywords.iter().any(|kw| kw.is_empty() || !is_visible_ascii(kw)) {
            return Err(StoreError::validation("invalid keyword"));
        }
        if self.stock < 0 {
            return Err(StoreError::validation("negative stock"));
        }
        if self.price_cent < 0 {
            return Err(StoreError::validation("negative price"));
        }
        Ok(())
    }
}

fn all_distinct(items: &[String]) -> bool {
    items.iter().collect::<BTreeSet<_>>().len() == items.len()
}
