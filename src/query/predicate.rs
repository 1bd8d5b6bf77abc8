//! Predicates
//!
//! A predicate maps field names to matchers; a record matches when every
//! clause matches. The empty predicate matches everything.

use std::collections::BTreeMap;

use crate::error::{Result, StoreError};
use crate::journal::{Fields, Value};

/// Condition on a single field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Matcher {
    /// Field equals the value, or is an array containing it
    Equals(Value),

    /// Field matches any candidate as `Equals` would, or equals the whole array
    OneOf(Vec<Value>),
}

impl Matcher {
    pub fn matches(&self, field: &Value) -> bool {
        match self {
            Matcher::Equals(expected) => value_matches(expected, field),
            Matcher::OneOf(candidates) => {
                candidates.iter().any(|c| value_matches(c, field)) || equals_array(candidates, field)
            }
        }
    }
}

/// `field == expected`, or `expected` is one of the tags of an array field
fn value_matches(expected: &Value, field: &Value) -> bool {
    if expected == field {
        return true;
    }
    match (field, expected) {
        (Value::List(items), Value::Str(tag)) => items.contains(tag),
        _ => false,
    }
}

fn equals_array(candidates: &[Value], field: &Value) -> bool {
    match field {
        Value::List(items) => {
            items.len() == candidates.len()
                && items
                    .iter()
                    .zip(candidates)
                    .all(|(item, c)| c.as_str() == Some(item.as_str()))
        }
        _ => false,
    }
}

/// Conjunction of per-field matchers
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Predicate {
    clauses: BTreeMap<String, Matcher>,
}

impl Predicate {
    /// The predicate that matches every record
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `field` to equal (or, for arrays, contain) `value`
    pub fn eq(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with(field, Matcher::Equals(value.into()))
    }

    /// Require `field` to match one of `values`
    pub fn one_of<I, V>(self, field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.with(field, Matcher::OneOf(values.into_iter().map(Into::into).collect()))
    }

    /// Set the matcher for `field`, replacing any previous one
    pub fn with(mut self, field: impl Into<String>, matcher: Matcher) -> Self {
        self.clauses.insert(field.into(), matcher);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    pub fn clauses(&self) -> impl Iterator<Item = (&str, &Matcher)> {
        self.clauses.iter().map(|(name, m)| (name.as_str(), m))
    }

    /// A record missing a constrained field never matches
    pub fn matches(&self, fields: &Fields) -> bool {
        self.clauses
            .iter()
            .all(|(name, matcher)| fields.get(name).is_some_and(|value| matcher.matches(value)))
    }
}

/// Parse a textual `field=value` clause
///
/// The value always matches as a string. When it also reads as an integer
/// or a boolean, the typed reading is accepted too, so `isbn=9780441013593`
/// finds a string ISBN and `stock=3` finds an integer stock.
pub fn parse_clause(clause: &str) -> Result<(String, Matcher)> {
    let (field, raw) = clause
        .split_once('=')
        .filter(|(field, _)| !field.is_empty())
        .ok_or_else(|| StoreError::Validation(format!("expected FIELD=VALUE, got '{}'", clause)))?;

    let text = Value::Str(raw.to_string());
    let matcher = if let Ok(int) = raw.parse::<i64>() {
        Matcher::OneOf(vec![text, Value::Int(int)])
    } else if let Ok(flag) = raw.parse::<bool>() {
        Matcher::OneOf(vec![text, Value::Bool(flag)])
    } else {
        Matcher::Equals(text)
    };
    Ok((field.to_string(), matcher))
}
