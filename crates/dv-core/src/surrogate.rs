//! Surrogate-key allocation
//!
//! Business keys are identified by their canonical text form, with NULL
//! kept apart from every text value. Existing
//! assignments are reused unchanged; unmapped keys receive consecutive
//! integers above the current maximum, in the order they are first seen in
//! the batch.

use crate::error::{CoreError, CoreResult};
use crate::value::Value;
use std::collections::HashMap;

/// Business key → surrogate key mapping for one key table.
#[derive(Debug, Clone, Default)]
pub struct SurrogateKeyMap {
    keys: HashMap<Option<String>, i64>,
    max_key: i64,
}

/// Keys assigned to a batch, one per input row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub keys: Vec<i64>,
    /// Number of distinct business keys that received a new surrogate key.
    pub minted: usize,
    /// Number of rows whose business key was already mapped, including keys
    /// minted earlier in the same batch.
    pub reused: usize,
}

impl SurrogateKeyMap {
    /// Empty mapping; the first minted key is 1.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from persisted `(business key, surrogate key)` pairs.
    ///
    /// NULL surrogate keys are ignored, both for lookup and for the maximum.
    /// Repeated identical pairs are fine; one business key with two
    /// different surrogate keys is an error.
    pub fn from_pairs<I>(pairs: I) -> CoreResult<Self>
    where
        I: IntoIterator<Item = (Value, Option<i64>)>,
    {
        let mut map = Self::new();
        for (business_key, surrogate) in pairs {
            let Some(surrogate) = surrogate else {
                continue;
            };
            let ident = business_key.canonical();
            match map.keys.get(&ident) {
                Some(&existing) if existing != surrogate => {
                    return Err(CoreError::SurrogateKeyConflict {
                        business_key: business_key.to_string(),
                        first: existing,
                        second: surrogate,
                    });
                }
                Some(_) => {}
                None => {
                    map.keys.insert(ident, surrogate);
                }
            }
            map.max_key = map.max_key.max(surrogate);
        }
        Ok(map)
    }

    /// Highest surrogate key seen, 0 when none.
    pub fn max_key(&self) -> i64 {
        self.max_key
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn get(&self, business_key: &Value) -> Option<i64> {
        self.keys.get(&business_key.canonical()).copied()
    }

    /// Assign a surrogate key to every business key in `batch`.
    ///
    /// Repeated business keys within the batch share one key. All NULL
    /// business keys share one key of their own.
    pub fn assign<'a, I>(&mut self, batch: I) -> Assignment
    where
        I: IntoIterator<Item = &'a Value>,
    {
        let mut keys = Vec::new();
        let mut minted = 0;
        let mut reused = 0;
        for business_key in batch {
            let ident = business_key.canonical();
            let key = match self.keys.get(&ident) {
                Some(&existing) => {
                    reused += 1;
                    existing
                }
                None => {
                    self.max_key += 1;
                    minted += 1;
                    self.keys.insert(ident, self.max_key);
                    self.max_key
                }
            };
            keys.push(key);
        }
        Assignment {
            keys,
            minted,
            reused,
        }
    }
}

#[cfg(test)]
#[path = "surrogate_test.rs"]
mod tests;
