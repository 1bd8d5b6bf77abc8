//! Per-table id ordering used by limited queries.

use std::cmp::Ordering;

/// Order in which a limited query visits ids
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyOrder {
    /// Byte-wise ascending
    #[default]
    Lexical,

    /// Decimal ids largest first (most recent first for counter-assigned
    /// ids); non-numeric ids sort after all numeric ones, lexically.
    NumericDescending,
}

impl KeyOrder {
    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        match self {
            KeyOrder::Lexical => a.cmp(b),
            KeyOrder::NumericDescending => match (parse_numeric(a), parse_numeric(b)) {
                (Some(x), Some(y)) => y.cmp(&x).then_with(|| a.cmp(b)),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => a.cmp(b),
            },
        }
    }

    /// Sort ids in place
    pub fn sort<S: AsRef<str>>(&self, ids: &mut [S]) {
        ids.sort_by(|a, b| self.compare(a.as_ref(), b.as_ref()));
    }
}

fn parse_numeric(id: &str) -> Option<u128> {
    if id.is_empty() || !id.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    id.parse().ok()
}
