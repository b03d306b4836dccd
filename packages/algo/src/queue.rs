//! Due-set selection and session queue ordering
//!
//! A word is due when it has no record yet or its `nextDue` is on or before
//! today. The due words are ordered by a pluggable [`OrderingStrategy`] and
//! optionally truncated; the resulting queue is fixed for one session.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rand::seq::SliceRandom;
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::progress::ProgressStore;
use crate::types::WordEntry;

// ==================== Ordering Strategies ====================

/// Turns the due set into a presentation order
pub trait OrderingStrategy {
    fn name(&self) -> &'static str;

    fn order(&self, due: Vec<String>, store: &ProgressStore, rng: &mut dyn RngCore) -> Vec<String>;
}

/// Uniform shuffle, every permutation equally likely
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainRandom;

impl OrderingStrategy for PlainRandom {
    fn name(&self) -> &'static str {
        "random"
    }

    fn order(
        &self,
        mut due: Vec<String>,
        _store: &ProgressStore,
        rng: &mut dyn RngCore,
    ) -> Vec<String> {
        due.shuffle(rng);
        due
    }
}

/// Words forgotten more times in a row come first
///
/// Equal streaks are ordered by an independent uniform draw per word, so
/// catalog order never leaks into the tie-break.
#[derive(Debug, Clone, Copy, Default)]
pub struct StreakPriority;

impl OrderingStrategy for StreakPriority {
    fn name(&self) -> &'static str {
        "streak"
    }

    fn order(
        &self,
        due: Vec<String>,
        store: &ProgressStore,
        rng: &mut dyn RngCore,
    ) -> Vec<String> {
        let mut keyed: Vec<(u32, u64, String)> = due
            .into_iter()
            .map(|word| (store.streak_forgot(&word), rng.gen::<u64>(), word))
            .collect();

        keyed.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
        keyed.into_iter().map(|(_, _, word)| word).collect()
    }
}

/// Built-in strategies, selectable from configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrderingPolicy {
    PlainRandom,
    #[default]
    StreakPriority,
}

impl OrderingPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderingPolicy::PlainRandom => PlainRandom.name(),
            OrderingPolicy::StreakPriority => StreakPriority.name(),
        }
    }
}

impl OrderingStrategy for OrderingPolicy {
    fn name(&self) -> &'static str {
        self.as_str()
    }

    fn order(
        &self,
        due: Vec<String>,
        store: &ProgressStore,
        rng: &mut dyn RngCore,
    ) -> Vec<String> {
        match self {
            OrderingPolicy::PlainRandom => PlainRandom.order(due, store, rng),
            OrderingPolicy::StreakPriority => StreakPriority.order(due, store, rng),
        }
    }
}

impl FromStr for OrderingPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "random" | "plain" | "plain-random" | "shuffle" => Ok(OrderingPolicy::PlainRandom),
            "streak" | "priority" | "streak-priority" => Ok(OrderingPolicy::StreakPriority),
            other => Err(format!("unknown ordering policy: {other}")),
        }
    }
}

impl fmt::Display for OrderingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ==================== Queue Building ====================

/// Inclusive position window; entries without a position fall outside
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionRange {
    pub from: i64,
    pub to: i64,
}

impl PositionRange {
    pub fn new(from: i64, to: i64) -> Self {
        Self { from, to }
    }

    pub fn contains(&self, position: Option<i64>) -> bool {
        position.is_some_and(|p| self.from <= p && p <= self.to)
    }
}

/// Optional restrictions applied while building a queue
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueOptions {
    pub range: Option<PositionRange>,
    /// Keep at most this many words after ordering
    pub max_items: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuiltQueue {
    /// Word keys in presentation order
    pub words: Vec<String>,
    /// Nothing in the range was due, so every word in the range was used
    pub widened: bool,
    /// Size of the candidate set before truncation
    pub candidates: usize,
}

impl BuiltQueue {
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }
}

pub fn is_due(store: &ProgressStore, word: &str, today: NaiveDate) -> bool {
    store.get(word).map_or(true, |record| record.is_due(today))
}

/// Number of catalog words due on `today`
pub fn count_due(catalog: &Catalog, store: &ProgressStore, today: NaiveDate) -> usize {
    catalog
        .words()
        .filter(|word| is_due(store, word, today))
        .count()
}

/// Select the due words, order them and apply the session limits
pub fn build_queue(
    catalog: &Catalog,
    store: &ProgressStore,
    today: NaiveDate,
    options: &QueueOptions,
    strategy: &dyn OrderingStrategy,
    rng: &mut dyn RngCore,
) -> BuiltQueue {
    let in_range = |entry: &&WordEntry| {
        options
            .range
            .map_or(true, |range| range.contains(entry.position))
    };

    let mut candidates: Vec<String> = catalog
        .iter()
        .filter(in_range)
        .filter(|entry| is_due(store, &entry.word, today))
        .map(|entry| entry.word.clone())
        .collect();

    let mut widened = false;
    if candidates.is_empty() && options.range.is_some() {
        candidates = catalog
            .iter()
            .filter(in_range)
            .map(|entry| entry.word.clone())
            .collect();
        widened = !candidates.is_empty();
        if widened {
            tracing::info!(
                count = candidates.len(),
                "nothing due in range, drilling the whole range"
            );
        }
    }

    let candidate_count = candidates.len();
    let mut words = strategy.order(candidates, store, rng);
    if let Some(max) = options.max_items {
        words.truncate(max);
    }

    tracing::debug!(
        strategy = strategy.name(),
        candidates = candidate_count,
        queued = words.len(),
        widened,
        "session queue built"
    );

    BuiltQueue {
        words,
        widened,
        candidates: candidate_count,
    }
}
