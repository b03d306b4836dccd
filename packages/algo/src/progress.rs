//! Progress store
//!
//! Owns one [`ProgressRecord`] per word and reconciles it against the
//! current catalog. Records loaded from storage stay as raw JSON until their
//! word shows up in a catalog; at that point they are coerced and any fields
//! missing from older blobs are backfilled. Records are never pruned, so a
//! word that leaves the list and comes back keeps its history.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use chrono::NaiveDate;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::catalog::Catalog;
use crate::date::add_days;
use crate::sanitize::{coerce_count, coerce_day, coerce_level};
use crate::types::{interval_days, ForgotPolicy, Outcome, ProgressRecord, MAX_LEVEL};

// ============================================================
// 错误类型定义
// ============================================================

/// Persistence errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

// ============================================================
// ProgressRepository - 持久化协作者
// ============================================================

/// Best-effort persistence of the whole progress mapping
///
/// `load` returns the stored blob (an empty object when nothing has been
/// saved yet). `save` receives the complete snapshot after every mutation.
pub trait ProgressRepository {
    fn load(&self) -> StoreResult<Value>;
    fn save(&self, snapshot: &Value) -> StoreResult<()>;
}

/// In-memory repository
///
/// Clones share storage, so a test can inspect what a session wrote.
#[derive(Debug, Clone, Default)]
pub struct MemoryRepository {
    blob: Rc<RefCell<Value>>,
    fail_writes: Rc<RefCell<bool>>,
    fail_loads: Rc<RefCell<bool>>,
    saves: Rc<RefCell<usize>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::with_blob(Value::Object(Map::new()))
    }

    pub fn with_blob(blob: Value) -> Self {
        Self {
            blob: Rc::new(RefCell::new(blob)),
            fail_writes: Rc::new(RefCell::new(false)),
            fail_loads: Rc::new(RefCell::new(false)),
            saves: Rc::new(RefCell::new(0)),
        }
    }

    /// Current stored blob
    pub fn blob(&self) -> Value {
        self.blob.borrow().clone()
    }

    /// Number of successful saves
    pub fn save_count(&self) -> usize {
        *self.saves.borrow()
    }

    /// Make every following `save` fail
    pub fn set_fail_writes(&self, fail: bool) {
        *self.fail_writes.borrow_mut() = fail;
    }

    /// Make every following `load` fail
    pub fn set_fail_loads(&self, fail: bool) {
        *self.fail_loads.borrow_mut() = fail;
    }
}

impl ProgressRepository for MemoryRepository {
    fn load(&self) -> StoreResult<Value> {
        if *self.fail_loads.borrow() {
            return Err(StoreError::Unavailable("reads disabled".to_string()));
        }
        Ok(self.blob.borrow().clone())
    }

    fn save(&self, snapshot: &Value) -> StoreResult<()> {
        if *self.fail_writes.borrow() {
            return Err(StoreError::Unavailable("writes disabled".to_string()));
        }
        *self.blob.borrow_mut() = snapshot.clone();
        *self.saves.borrow_mut() += 1;
        Ok(())
    }
}

// ============================================================
// ProgressStore
// ============================================================

/// Counts reported by [`ProgressStore::reconcile`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Fresh records created for words never seen before
    pub inserted: usize,
    /// Stored records coerced into the current shape
    pub restored: usize,
    /// Records kept for words absent from the catalog
    pub retained: usize,
}

#[derive(Debug, Clone, Default)]
pub struct ProgressStore {
    records: BTreeMap<String, ProgressRecord>,
    /// Stored entries not yet matched against a catalog, kept verbatim
    detached: BTreeMap<String, Value>,
}

impl ProgressStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a loaded blob; anything but a JSON object counts as empty
    pub fn from_raw(raw: Value) -> Self {
        match raw {
            Value::Object(map) => Self {
                records: BTreeMap::new(),
                detached: map.into_iter().collect(),
            },
            Value::Null => Self::new(),
            other => {
                tracing::warn!(
                    kind = value_kind(&other),
                    "progress blob is not an object, starting empty"
                );
                Self::new()
            }
        }
    }

    /// Make sure every catalog word has exactly one well-formed record
    pub fn reconcile(&mut self, catalog: &Catalog, today: NaiveDate) -> ReconcileReport {
        let mut report = ReconcileReport::default();

        for word in catalog.words() {
            if self.records.contains_key(word) {
                continue;
            }

            let record = match self.detached.remove(word) {
                Some(raw) => {
                    report.restored += 1;
                    restore_record(&raw, today)
                }
                None => {
                    report.inserted += 1;
                    ProgressRecord::fresh(today)
                }
            };
            self.records.insert(word.to_string(), record);
        }

        report.retained = self.len() - catalog.len();

        tracing::debug!(
            inserted = report.inserted,
            restored = report.restored,
            retained = report.retained,
            "progress reconciled"
        );

        report
    }

    pub fn get(&self, word: &str) -> Option<&ProgressRecord> {
        self.records.get(word)
    }

    /// `streakForgot` of a word, 0 when it has no record
    pub fn streak_forgot(&self, word: &str) -> u32 {
        self.records.get(word).map_or(0, |record| record.streak_forgot)
    }

    /// Apply a judgment made on `today` and return the updated record
    pub fn judge(
        &mut self,
        word: &str,
        outcome: Outcome,
        today: NaiveDate,
        forgot_policy: ForgotPolicy,
    ) -> ProgressRecord {
        let detached = &mut self.detached;
        let record = self.records.entry(word.to_string()).or_insert_with(|| {
            detached
                .remove(word)
                .map(|raw| restore_record(&raw, today))
                .unwrap_or_else(|| ProgressRecord::fresh(today))
        });

        apply_outcome(record, outcome, today, forgot_policy);
        record.clone()
    }

    /// Put every catalog word back to a fresh record due `today`
    pub fn reset(&mut self, catalog: &Catalog, today: NaiveDate) {
        for word in catalog.words() {
            self.detached.remove(word);
            self.records.insert(word.to_string(), ProgressRecord::fresh(today));
        }
    }

    /// Records and detached entries together
    pub fn len(&self) -> usize {
        self.records.len() + self.detached.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty() && self.detached.is_empty()
    }

    /// JSON object holding every record, ready to persist
    pub fn snapshot(&self) -> Value {
        let mut map: Map<String, Value> = self
            .detached
            .iter()
            .map(|(word, raw)| (word.clone(), raw.clone()))
            .collect();

        for (word, record) in &self.records {
            match serde_json::to_value(record) {
                Ok(value) => {
                    map.insert(word.clone(), value);
                }
                Err(err) => {
                    tracing::warn!(
                        word = %word,
                        error = %err,
                        "failed to serialize progress record"
                    );
                }
            }
        }

        Value::Object(map)
    }
}

/// Level-transition rules for one judgment
///
/// `nextDue` is always derived from `today`, never from the previous due date.
pub fn apply_outcome(
    record: &mut ProgressRecord,
    outcome: Outcome,
    today: NaiveDate,
    forgot_policy: ForgotPolicy,
) {
    match outcome {
        Outcome::Remembered => {
            record.level = record.level.saturating_add(1).min(MAX_LEVEL);
            record.next_due = add_days(today, interval_days(record.level));
            record.streak_forgot = 0;
        }
        Outcome::Forgot => {
            record.level = 0;
            record.next_due = add_days(today, forgot_policy.retry_after_days());
            record.streak_forgot = record.streak_forgot.saturating_add(1);
        }
    }
    record.last_reviewed = Some(today);
}

/// Coerce a stored entry, backfilling fields older blobs lack
fn restore_record(raw: &Value, today: NaiveDate) -> ProgressRecord {
    let field = |name: &str| raw.get(name);

    ProgressRecord {
        level: coerce_level(field("level")),
        next_due: coerce_day(field("nextDue").or_else(|| field("next"))).unwrap_or(today),
        last_reviewed: coerce_day(field("lastReviewed")),
        streak_forgot: coerce_count(field("streakForgot")),
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
