//! Query Module
//!
//! Predicate matching over a table's live map.
//!
//! ## Semantics
//! - `find_one`: first match in scan order, or none
//! - `find_many`: all matches; with a finite limit, ids are visited in the
//!   table's `KeyOrder` and the scan stops once `limit` matches are found
//! - A scalar clause also matches an array field holding that scalar, so
//!   `{keywords: "rust"}` finds every record tagged `rust`

mod engine;
mod predicate;

pub use engine::{find_many, find_one, Limit, Row};
pub use predicate::{parse_clause, Matcher, Predicate};
