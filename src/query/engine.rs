//! Scan engine
//!
//! Linear scans over a live map. There are no secondary indexes.

use crate::journal::{Fields, LiveMap};
use crate::table::KeyOrder;

use super::Predicate;

/// A detached `(id, fields)` copy of a live record
pub type Row = (String, Fields);

/// How many matches `find_many` may return
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Limit {
    /// Every match, in id scan order
    #[default]
    Unbounded,

    /// The first `n` matches in the table's key order
    At(usize),
}

impl Limit {
    pub fn is_bounded(&self) -> bool {
        matches!(self, Limit::At(_))
    }
}

impl From<Option<usize>> for Limit {
    fn from(limit: Option<usize>) -> Self {
        limit.map_or(Limit::Unbounded, Limit::At)
    }
}

/// First match in scan order
pub fn find_one(live: &LiveMap, predicate: &Predicate) -> Option<Row> {
    live.iter()
        .find(|(_, fields)| predicate.matches(fields))
        .map(|(id, fields)| (id.clone(), fields.clone()))
}

/// Matches of `predicate`
///
/// With `Limit::At(n)` ids are visited in `order` and the scan stops at the
/// n-th match. Fewer than `n` rows come back when fewer exist; that is not
/// an error here.
pub fn find_many(live: &LiveMap, order: KeyOrder, predicate: &Predicate, limit: Limit) -> Vec<Row> {
    match limit {
        Limit::Unbounded => live
            .iter()
            .filter(|(_, fields)| predicate.matches(fields))
            .map(|(id, fields)| (id.clone(), fields.clone()))
            .collect(),
        Limit::At(n) => {
            let mut ids: Vec<&String> = live.keys().collect();
            order.sort(&mut ids);
            ids.into_iter()
                .filter_map(|id| live.get(id).map(|fields| (id, fields)))
                .filter(|(_, fields)| predicate.matches(fields))
                .take(n)
                .map(|(id, fields)| (id.clone(), fields.clone()))
                .collect()
        }
    }
}
