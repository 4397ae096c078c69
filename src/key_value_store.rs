//! In-memory key-value store with lazy, per-key expiry.
//!
//! Expired entries are only removed when a later read touches them; there is
//! no background sweep.

use std::{collections::HashMap, time::Duration};

use tokio::time::Instant;

/// The two kinds of value SET accepts.
#[derive(Debug, Clone, PartialEq)]
pub enum StoredValue {
    String(String),
    Integer(i64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Value {
    pub data: StoredValue,
    pub expiration: Option<Instant>,
}

impl Value {
    fn is_expired(&self, now: Instant) -> bool {
        matches!(self.expiration, Some(expiration) if now > expiration)
    }
}

#[derive(Debug, Default)]
pub struct KeyValueStore {
    entries: HashMap<String, Value>,
}

impl KeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `data` under `key`, replacing any previous entry.
    ///
    /// A `ttl` of `None` or zero means the entry never expires.
    pub fn set(&mut self, key: String, data: StoredValue, ttl: Option<Duration>) {
        let expiration = ttl
            .filter(|ttl| !ttl.is_zero())
            .map(|ttl| Instant::now() + ttl);

        self.entries.insert(key, Value { data, expiration });
    }

    /// Returns the string stored under `key`.
    ///
    /// Integers are not readable as strings and yield `None`. An expired entry
    /// also yields `None` and is removed from the map.
    pub fn get(&mut self, key: &str) -> Option<String> {
        let value = self.entries.get(key)?;

        if value.is_expired(Instant::now()) {
            self.entries.remove(key);
            return None;
        }

        match &value.data {
            StoredValue::String(s) => Some(s.clone()),
            StoredValue::Integer(_) => None,
        }
    }

    /// Looks at an entry without applying expiry.
    pub fn peek(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
