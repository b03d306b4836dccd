//! Word catalog normalization
//!
//! Raw word lists are arrays of loosely typed objects. Normalization keeps
//! every entry with a usable headword and silently drops the rest.

use std::collections::HashMap;

use serde_json::Value;

use crate::sanitize::{coerce_integer, coerce_text};
use crate::types::WordEntry;

/// Ordered, de-duplicated set of word entries keyed by `word`
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<WordEntry>,
    index: HashMap<String, usize>,
}

impl Catalog {
    /// Build a catalog from already-normalized entries
    ///
    /// A repeated `word` replaces the earlier entry in place, so the last
    /// occurrence wins but keeps the slot of the first.
    pub fn new(entries: impl IntoIterator<Item = WordEntry>) -> Self {
        let mut catalog = Catalog::default();
        for entry in entries {
            match catalog.index.get(&entry.word) {
                Some(&slot) => catalog.entries[slot] = entry,
                None => {
                    catalog.index.insert(entry.word.clone(), catalog.entries.len());
                    catalog.entries.push(entry);
                }
            }
        }
        catalog
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn get(&self, word: &str) -> Option<&WordEntry> {
        self.index.get(word).map(|&slot| &self.entries[slot])
    }

    pub fn contains(&self, word: &str) -> bool {
        self.index.contains_key(word)
    }

    pub fn iter(&self) -> impl Iterator<Item = &WordEntry> {
        self.entries.iter()
    }

    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.word.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Largest position in the catalog, never below 1
    ///
    /// Used as the default upper bound of a position range.
    pub fn max_position(&self) -> i64 {
        self.entries
            .iter()
            .filter_map(|entry| entry.position)
            .fold(1, i64::max)
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a WordEntry;
    type IntoIter = std::slice::Iter<'a, WordEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Normalize one raw entry; `None` when it has no usable headword
pub fn normalize_entry(raw: &Value) -> Option<WordEntry> {
    let object = raw.as_object()?;

    let word = coerce_text(object.get("word"));
    if word.is_empty() {
        return None;
    }

    Some(WordEntry {
        word,
        pos: coerce_text(object.get("pos")),
        phonetic: coerce_text(object.get("phonetic")),
        meaning: coerce_text(object.get("meaning")),
        example: coerce_text(object.get("example")),
        position: coerce_integer(object.get("position")),
    })
}

/// Normalize a raw word list into a catalog
pub fn normalize_catalog(raw: &[Value]) -> Catalog {
    let entries: Vec<WordEntry> = raw.iter().filter_map(normalize_entry).collect();

    let dropped = raw.len() - entries.len();
    if dropped > 0 {
        tracing::debug!(dropped, kept = entries.len(), "dropped malformed catalog entries");
    }

    Catalog::new(entries)
}
