//! Output sink the collectors marshal their statistics into.

use std::collections::BTreeMap;

use serde::Serialize;

/// A value a collector can write into a [`StatsSink`].
///
/// This is the whole output shape of the crate: strings, unsigned integers,
/// nested sinks, and lists of nested sinks. Serialization is untagged so a
/// sink renders as a plain JSON object.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StatsValue {
    /// An unsigned integer, e.g. a duration or a byte count.
    UInt(u64),
    /// A string, e.g. a heap space name.
    Text(String),
    /// A nested group of statistics.
    Nested(StatsSink),
    /// A list of nested groups, e.g. the heap spaces.
    List(Vec<StatsSink>),
}

impl From<u64> for StatsValue {
    fn from(v: u64) -> Self {
        StatsValue::UInt(v)
    }
}

impl From<&str> for StatsValue {
    fn from(v: &str) -> Self {
        StatsValue::Text(v.to_owned())
    }
}

impl From<String> for StatsValue {
    fn from(v: String) -> Self {
        StatsValue::Text(v)
    }
}

impl From<StatsSink> for StatsValue {
    fn from(v: StatsSink) -> Self {
        StatsValue::Nested(v)
    }
}

impl From<Vec<StatsSink>> for StatsValue {
    fn from(v: Vec<StatsSink>) -> Self {
        StatsValue::List(v)
    }
}

/// String-keyed sink for one snapshot's statistics.
///
/// Collectors write into a sink during [`inject`](crate::Collector::inject);
/// the composed sink is handed back to the caller and can be serialized with
/// `serde` as-is.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct StatsSink {
    entries: BTreeMap<String, StatsValue>,
}

impl StatsSink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes `value` under `key`, replacing any previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<StatsValue>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Returns the value under `key`, if any.
    pub fn get(&self, key: &str) -> Option<&StatsValue> {
        self.entries.get(key)
    }

    /// Returns the unsigned integer under `key`, if it is one.
    pub fn get_uint(&self, key: &str) -> Option<u64> {
        match self.entries.get(key) {
            Some(StatsValue::UInt(v)) => Some(*v),
            _ => None,
        }
    }

    /// Returns the string under `key`, if it is one.
    pub fn get_text(&self, key: &str) -> Option<&str> {
        match self.entries.get(key) {
            Some(StatsValue::Text(v)) => Some(v),
            _ => None,
        }
    }

    /// Returns the nested sink under `key`, if it is one.
    pub fn get_nested(&self, key: &str) -> Option<&StatsSink> {
        match self.entries.get(key) {
            Some(StatsValue::Nested(v)) => Some(v),
            _ => None,
        }
    }

    /// Returns the list of nested sinks under `key`, if it is one.
    pub fn get_list(&self, key: &str) -> Option<&[StatsSink]> {
        match self.entries.get(key) {
            Some(StatsValue::List(v)) => Some(v),
            _ => None,
        }
    }

    /// True when nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries written.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Iterates over the written keys.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}
