//! Domain types for songbook record sources.
//!
//! A [`Record`] is a schema-free JSON object whose only required field is
//! `Title`. Titles are stored verbatim; ordering uses the lower-cased form.

use std::collections::btree_map::{self, BTreeMap};
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Name of the identifying field every record must carry.
pub const TITLE_FIELD: &str = "Title";

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A record identifier, kept exactly as written in the source file.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Title(pub String);

impl Title {
    /// Case-normalized key used for ordering comparisons.
    pub fn sort_key(&self) -> String {
        self.0.to_lowercase()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Title {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for Title {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Title {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// One record: a JSON object passed through unchanged.
///
/// Field order is preserved from the source document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(pub Map<String, Value>);

impl Record {
    /// Wrap a parsed JSON value, rejecting anything that is not an object.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    /// The `Title` field, if present and a string.
    pub fn title(&self) -> Option<Title> {
        self.0
            .get(TITLE_FIELD)
            .and_then(Value::as_str)
            .map(Title::from)
    }

    /// Title used for joins; records without one key as the empty title.
    pub fn title_or_empty(&self) -> Title {
        self.title().unwrap_or_else(|| Title(String::new()))
    }

    pub fn sort_key(&self) -> String {
        self.title_or_empty().sort_key()
    }

    /// Build a record holding only a title. Mostly useful in tests.
    pub fn with_title(title: impl Into<String>) -> Self {
        let mut map = Map::new();
        map.insert(TITLE_FIELD.to_string(), Value::String(title.into()));
        Self(map)
    }

    /// Builder-style field insertion.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }
}

// ---------------------------------------------------------------------------
// Detail source
// ---------------------------------------------------------------------------

/// A detail record together with the unit it was loaded from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailEntry {
    pub path: PathBuf,
    pub record: Record,
}

/// The per-record source, keyed by verbatim title.
///
/// Backed by a `BTreeMap` so iteration is always in title order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetailSource {
    entries: BTreeMap<Title, DetailEntry>,
}

impl DetailSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry, returning the one it replaced (same title).
    pub fn insert(&mut self, title: Title, entry: DetailEntry) -> Option<DetailEntry> {
        self.entries.insert(title, entry)
    }

    pub fn get(&self, title: &Title) -> Option<&DetailEntry> {
        self.entries.get(title)
    }

    pub fn contains(&self, title: &Title) -> bool {
        self.entries.contains_key(title)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn titles(&self) -> impl Iterator<Item = &Title> {
        self.entries.keys()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, Title, DetailEntry> {
        self.entries.iter()
    }
}

impl FromIterator<Record> for DetailSource {
    /// Build a source from in-memory records, skipping untitled ones.
    ///
    /// Entries get a synthetic `<title>.json` path.
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        let mut source = Self::new();
        for record in iter {
            if let Some(title) = record.title() {
                let path = PathBuf::from(format!("{title}.json"));
                source.insert(title, DetailEntry { path, record });
            }
        }
        source
    }
}
