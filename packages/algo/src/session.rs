//! Review session state machine
//!
//! `ReviewSession` is the context object for one loaded catalog: it owns the
//! catalog, the progress store, the persistence and clock collaborators, the
//! RNG, and the queue with its cursor.
//!
//! ```text
//! Idle --start--> Presenting --reveal--> Revealed --judge--> Presenting
//!                                                  \--judge--> Complete --finish--> Idle
//! ```
//!
//! Every mutation is persisted immediately. A failed write is logged and
//! the in-memory state stays authoritative. If the stored progress could not
//! be read at all, the session never writes, so an unreadable file is not
//! replaced with fresh records.

use std::fmt;

use chrono::NaiveDate;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use thiserror::Error;

use crate::catalog::Catalog;
use crate::date::Clock;
use crate::progress::{ProgressRepository, ProgressStore, ReconcileReport};
use crate::queue::{
    build_queue, count_due, BuiltQueue, OrderingPolicy, OrderingStrategy, QueueOptions,
};
use crate::stats::{compute_stats, Stats};
use crate::types::{
    ForgotPolicy, Outcome, ProgressRecord, PromptMode, RevealedCard, WordEntry, LEARNED_THRESHOLD,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionState {
    Idle,
    Presenting,
    Revealed,
    Complete,
}

impl SessionState {
    pub const fn as_str(self) -> &'static str {
        match self {
            SessionState::Idle => "IDLE",
            SessionState::Presenting => "PRESENTING",
            SessionState::Revealed => "REVEALED",
            SessionState::Complete => "COMPLETE",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operation attempted on the session, for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionAction {
    Start,
    Reveal,
    Judge,
    Finish,
}

impl fmt::Display for SessionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionAction::Start => "start",
            SessionAction::Reveal => "reveal",
            SessionAction::Judge => "judge",
            SessionAction::Finish => "finish",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("cannot {action} while session is {state}")]
    InvalidTransition {
        action: SessionAction,
        state: SessionState,
    },

    #[error("nothing due for review")]
    NothingDue,
}

/// Scheduling knobs fixed for the lifetime of a session context
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionConfig {
    pub ordering: OrderingPolicy,
    pub forgot_policy: ForgotPolicy,
    /// Fixed RNG seed; `None` seeds from the system time
    pub seed: Option<u64>,
}

/// Position within the running queue, for status lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionStatus {
    pub state: SessionState,
    /// 1-based index of the current item, 0 when nothing is presented
    pub current: usize,
    pub total: usize,
}

/// Result of one judgment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Judgment {
    pub word: String,
    pub outcome: Outcome,
    pub record: ProgressRecord,
    /// Whether the store write succeeded
    pub persisted: bool,
    /// State after the cursor advanced
    pub next_state: SessionState,
}

pub struct ReviewSession {
    catalog: Catalog,
    store: ProgressStore,
    repository: Box<dyn ProgressRepository>,
    clock: Box<dyn Clock>,
    strategy: Box<dyn OrderingStrategy>,
    forgot_policy: ForgotPolicy,
    rng: ChaCha8Rng,
    state: SessionState,
    queue: Vec<String>,
    cursor: usize,
    /// False when the initial load failed
    writable: bool,
}

impl ReviewSession {
    /// Load stored progress, reconcile it against `catalog` and persist
    ///
    /// An unreadable store is treated as empty and left untouched: nothing
    /// is written back for the lifetime of this session.
    pub fn open(
        catalog: Catalog,
        repository: Box<dyn ProgressRepository>,
        clock: Box<dyn Clock>,
        config: SessionConfig,
    ) -> Self {
        let (raw, writable) = match repository.load() {
            Ok(raw) => (raw, true),
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    "failed to load progress, starting empty without saving"
                );
                (serde_json::Value::Null, false)
            }
        };

        let seed = config.seed.unwrap_or_else(|| {
            use std::time::{SystemTime, UNIX_EPOCH};
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_nanos() as u64)
                .unwrap_or(42)
        });

        let mut session = Self {
            catalog: Catalog::empty(),
            store: ProgressStore::from_raw(raw),
            repository,
            clock,
            strategy: Box::new(config.ordering),
            forgot_policy: config.forgot_policy,
            rng: ChaCha8Rng::seed_from_u64(seed),
            state: SessionState::Idle,
            queue: Vec::new(),
            cursor: 0,
            writable,
        };
        session.load_catalog(catalog);
        session
    }

    /// Replace the ordering strategy
    pub fn with_strategy(mut self, strategy: Box<dyn OrderingStrategy>) -> Self {
        self.strategy = strategy;
        self
    }

    /// Swap in a freshly loaded catalog
    ///
    /// Reconciles and persists, and abandons any running queue.
    pub fn load_catalog(&mut self, catalog: Catalog) -> ReconcileReport {
        let today = self.today();
        self.catalog = catalog;
        let report = self.store.reconcile(&self.catalog, today);
        self.persist();
        self.clear_queue();
        tracing::info!(
            words = self.catalog.len(),
            inserted = report.inserted,
            restored = report.restored,
            "catalog loaded"
        );
        report
    }

    // ========== 查询 ==========

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn store(&self) -> &ProgressStore {
        &self.store
    }

    pub fn forgot_policy(&self) -> ForgotPolicy {
        self.forgot_policy
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    pub fn queue(&self) -> &[String] {
        &self.queue
    }

    pub fn status(&self) -> SessionStatus {
        let current = match self.state {
            SessionState::Presenting | SessionState::Revealed => self.cursor + 1,
            _ => 0,
        };
        SessionStatus {
            state: self.state,
            current,
            total: self.queue.len(),
        }
    }

    /// Entry under the cursor while presenting or revealed
    pub fn current(&self) -> Option<&WordEntry> {
        match self.state {
            SessionState::Presenting | SessionState::Revealed => {
                self.queue.get(self.cursor).and_then(|word| self.catalog.get(word))
            }
            _ => None,
        }
    }

    /// Prompt text for the current item
    pub fn current_prompt(&self, mode: PromptMode) -> Option<&str> {
        self.current().map(|entry| mode.prompt_for(entry))
    }

    pub fn stats(&self) -> Stats {
        compute_stats(&self.catalog, &self.store, LEARNED_THRESHOLD)
    }

    pub fn due_count(&self) -> usize {
        count_due(&self.catalog, &self.store, self.today())
    }

    // ========== 状态迁移 ==========

    /// Build today's queue with the session strategy
    pub fn build_queue(&mut self, options: &QueueOptions) -> BuiltQueue {
        let today = self.today();
        build_queue(
            &self.catalog,
            &self.store,
            today,
            options,
            self.strategy.as_ref(),
            &mut self.rng,
        )
    }

    /// Begin presenting `queue`
    ///
    /// Words missing from the catalog are skipped. An empty queue leaves the
    /// state untouched and reports [`SessionError::NothingDue`].
    pub fn start(&mut self, queue: Vec<String>) -> Result<(), SessionError> {
        if !matches!(self.state, SessionState::Idle | SessionState::Complete) {
            return Err(self.invalid(SessionAction::Start));
        }

        let queue: Vec<String> = queue
            .into_iter()
            .filter(|word| self.catalog.contains(word))
            .collect();
        if queue.is_empty() {
            return Err(SessionError::NothingDue);
        }

        tracing::info!(total = queue.len(), "review session started");
        self.queue = queue;
        self.cursor = 0;
        self.state = SessionState::Presenting;
        Ok(())
    }

    /// Build today's queue and start it in one step
    pub fn start_due(&mut self, options: &QueueOptions) -> Result<BuiltQueue, SessionError> {
        if !matches!(self.state, SessionState::Idle | SessionState::Complete) {
            return Err(self.invalid(SessionAction::Start));
        }
        let built = self.build_queue(options);
        self.start(built.words.clone())?;
        Ok(built)
    }

    /// Show the answer for the current item; the record is not touched
    pub fn reveal(&mut self) -> Result<RevealedCard, SessionError> {
        if self.state != SessionState::Presenting {
            return Err(self.invalid(SessionAction::Reveal));
        }
        let card = self
            .current()
            .map(RevealedCard::from)
            .ok_or(SessionError::InvalidTransition {
                action: SessionAction::Reveal,
                state: self.state,
            })?;

        self.state = SessionState::Revealed;
        Ok(card)
    }

    /// Apply the learner's judgment to the current item and advance
    pub fn judge(&mut self, outcome: Outcome) -> Result<Judgment, SessionError> {
        if self.state != SessionState::Revealed {
            return Err(self.invalid(SessionAction::Judge));
        }
        let word = match self.queue.get(self.cursor) {
            Some(word) => word.clone(),
            None => return Err(self.invalid(SessionAction::Judge)),
        };

        let today = self.today();
        let record = self.store.judge(&word, outcome, today, self.forgot_policy);
        let persisted = self.persist();

        tracing::debug!(
            word = %word,
            ?outcome,
            level = record.level,
            next_due = %record.next_due,
            streak_forgot = record.streak_forgot,
            "judgment applied"
        );

        self.cursor += 1;
        self.state = if self.cursor >= self.queue.len() {
            tracing::info!(total = self.queue.len(), "review session complete");
            SessionState::Complete
        } else {
            SessionState::Presenting
        };

        Ok(Judgment {
            word,
            outcome,
            record,
            persisted,
            next_state: self.state,
        })
    }

    /// Leave a completed session
    pub fn finish(&mut self) -> Result<(), SessionError> {
        if self.state != SessionState::Complete {
            return Err(self.invalid(SessionAction::Finish));
        }
        self.clear_queue();
        Ok(())
    }

    /// Wipe progress for every catalog word and return to `Idle`
    ///
    /// Records of words outside the current catalog are left alone.
    pub fn reset(&mut self) {
        let today = self.today();
        self.store.reset(&self.catalog, today);
        self.persist();
        self.clear_queue();
        tracing::info!(words = self.catalog.len(), "progress reset");
    }

    fn clear_queue(&mut self) {
        self.queue.clear();
        self.cursor = 0;
        self.state = SessionState::Idle;
    }

    /// Whether judgments reach the repository
    pub fn is_writable(&self) -> bool {
        self.writable
    }

    fn persist(&self) -> bool {
        if !self.writable {
            tracing::debug!("progress load failed earlier, skipping save");
            return false;
        }
        match self.repository.save(&self.store.snapshot()) {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(error = %err, "failed to persist progress, keeping in-memory state");
                false
            }
        }
    }

    fn invalid(&self, action: SessionAction) -> SessionError {
        SessionError::InvalidTransition {
            action,
            state: self.state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::date::FixedClock;
    use crate::progress::MemoryRepository;
    use crate::types::WordEntry;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn session_with(
        words: &[&str],
        today: NaiveDate,
    ) -> (ReviewSession, MemoryRepository, FixedClock) {
        let repo = MemoryRepository::new();
        let clock = FixedClock::new(today);
        let catalog = Catalog::new(words.iter().map(|w| WordEntry::new(*w)));
        let config = SessionConfig {
            seed: Some(42),
            ..SessionConfig::default()
        };
        let session = ReviewSession::open(
            catalog,
            Box::new(repo.clone()),
            Box::new(clock.clone()),
            config,
        );
        (session, repo, clock)
    }

    #[test]
    fn test_open_reconciles_and_persists() {
        let (session, repo, _) = session_with(&["cat", "dog"], ymd(2024, 1, 1));

        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(repo.save_count(), 1);
        assert_eq!(repo.blob()["cat"]["nextDue"], "2024-01-01");
        assert_eq!(repo.blob()["dog"]["level"], 0);
    }

    #[test]
    fn test_start_empty_queue_reports_nothing_due() {
        let (mut session, _, _) = session_with(&["cat"], ymd(2024, 1, 1));

        assert_eq!(session.start(Vec::new()), Err(SessionError::NothingDue));
        assert_eq!(session.start(vec!["ghost".to_string()]), Err(SessionError::NothingDue));
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn test_reveal_and_judge_are_gated() {
        let (mut session, repo, _) = session_with(&["cat"], ymd(2024, 1, 1));
        let saves = repo.save_count();

        assert_eq!(
            session.reveal(),
            Err(SessionError::InvalidTransition {
                action: SessionAction::Reveal,
                state: SessionState::Idle
            })
        );

        session.start(vec!["cat".to_string()]).unwrap();
        assert_eq!(
            session.judge(Outcome::Remembered),
            Err(SessionError::InvalidTransition {
                action: SessionAction::Judge,
                state: SessionState::Presenting
            })
        );

        session.reveal().unwrap();
        assert!(session.reveal().is_err());
        assert_eq!(session.state(), SessionState::Revealed);
        assert_eq!(repo.save_count(), saves, "invalid transitions must not write");
    }

    #[test]
    fn test_reveal_does_not_touch_record() {
        let (mut session, _, _) = session_with(&["cat"], ymd(2024, 1, 1));
        let before = session.store().get("cat").cloned();

        session.start(vec!["cat".to_string()]).unwrap();
        let card = session.reveal().unwrap();

        assert_eq!(card.word, "cat");
        assert_eq!(session.store().get("cat").cloned(), before);
    }

    #[test]
    fn test_walks_queue_to_completion() {
        let (mut session, repo, _) = session_with(&["a", "b"], ymd(2024, 1, 1));
        session.start(vec!["a".to_string(), "b".to_string()]).unwrap();
        assert_eq!(
            session.status(),
            SessionStatus {
                state: SessionState::Presenting,
                current: 1,
                total: 2
            }
        );
        assert_eq!(session.current_prompt(PromptMode::WordToMeaning), Some("a"));

        session.reveal().unwrap();
        let first = session.judge(Outcome::Remembered).unwrap();
        assert_eq!(first.next_state, SessionState::Presenting);
        assert!(first.persisted);
        assert_eq!(session.status().current, 2);

        session.reveal().unwrap();
        let second = session.judge(Outcome::Forgot).unwrap();
        assert_eq!(second.next_state, SessionState::Complete);
        assert_eq!(session.current(), None);
        assert_eq!(repo.blob()["b"]["streakForgot"], 1);

        session.finish().unwrap();
        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.queue().is_empty());
    }

    #[test]
    fn test_failed_write_keeps_memory_state() {
        let (mut session, repo, _) = session_with(&["cat"], ymd(2024, 1, 1));
        repo.set_fail_writes(true);

        session.start(vec!["cat".to_string()]).unwrap();
        session.reveal().unwrap();
        let judgment = session.judge(Outcome::Remembered).unwrap();

        assert!(!judgment.persisted);
        assert_eq!(session.store().get("cat").unwrap().level, 1);
        assert_eq!(repo.blob()["cat"]["level"], 0);
    }

    #[test]
    fn test_failed_load_never_overwrites_store() {
        let repo = MemoryRepository::with_blob(serde_json::json!({
            "cat": { "level": 4, "nextDue": "2024-03-01", "streakForgot": 0 }
        }));
        repo.set_fail_loads(true);
        let catalog = Catalog::new([WordEntry::new("cat")]);
        let clock = FixedClock::new(ymd(2024, 1, 1));

        let mut session = ReviewSession::open(
            catalog,
            Box::new(repo.clone()),
            Box::new(clock),
            SessionConfig::default(),
        );
        assert!(!session.is_writable());
        assert_eq!(repo.save_count(), 0);

        session.start(vec!["cat".to_string()]).unwrap();
        session.reveal().unwrap();
        let judgment = session.judge(Outcome::Remembered).unwrap();

        assert!(!judgment.persisted);
        assert_eq!(session.store().get("cat").unwrap().level, 1);
        assert_eq!(repo.save_count(), 0);
        assert_eq!(repo.blob()["cat"]["level"], 4);
    }

    #[test]
    fn test_reset_returns_to_idle() {
        let (mut session, _, clock) = session_with(&["cat"], ymd(2024, 1, 1));
        session.start(vec!["cat".to_string()]).unwrap();
        session.reveal().unwrap();
        session.judge(Outcome::Remembered).unwrap();

        clock.set(ymd(2024, 2, 1));
        session.reset();

        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(session.store().get("cat"), Some(&ProgressRecord::fresh(ymd(2024, 2, 1))));
    }

    #[test]
    fn test_start_refused_mid_session() {
        let (mut session, _, _) = session_with(&["cat", "dog"], ymd(2024, 1, 1));
        session.start(vec!["cat".to_string(), "dog".to_string()]).unwrap();

        assert!(matches!(
            session.start(vec!["dog".to_string()]),
            Err(SessionError::InvalidTransition { action: SessionAction::Start, .. })
        ));
        assert!(session.start_due(&QueueOptions::default()).is_err());
    }
}
