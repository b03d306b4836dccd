//! Common Types and Constants
//!
//! Shared data structures used across the scheduling modules.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==================== Constants ====================

/// Highest mastery level a word can reach
pub const MAX_LEVEL: u8 = 4;

/// Days until next review, indexed by the level reached after a correct answer
pub const INTERVALS: [u32; 5] = [1, 3, 7, 14, 30];

/// Level at or above which a word counts as learned
pub const LEARNED_THRESHOLD: u8 = 3;

/// Review interval for a level; levels above the cap use the last slot
pub fn interval_days(level: u8) -> u32 {
    INTERVALS[usize::from(level.min(MAX_LEVEL))]
}

// ==================== Catalog Types ====================

/// A single catalog entry, immutable once loaded
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordEntry {
    /// Unique key across the catalog, never empty
    pub word: String,
    /// Part of speech
    #[serde(default)]
    pub pos: String,
    #[serde(default)]
    pub phonetic: String,
    #[serde(default)]
    pub meaning: String,
    #[serde(default)]
    pub example: String,
    /// Rank in the source list; `None` is distinct from zero
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<i64>,
}

impl WordEntry {
    /// Entry with only the headword filled in
    pub fn new(word: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            pos: String::new(),
            phonetic: String::new(),
            meaning: String::new(),
            example: String::new(),
            position: None,
        }
    }

    pub fn with_position(mut self, position: i64) -> Self {
        self.position = Some(position);
        self
    }

    pub fn with_meaning(mut self, meaning: impl Into<String>) -> Self {
        self.meaning = meaning.into();
        self
    }
}

// ==================== Progress Types ====================

/// Per-word review state
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRecord {
    /// Mastery level [0, MAX_LEVEL]
    pub level: u8,
    /// First day the word is eligible again
    #[serde(alias = "next")]
    pub next_due: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_reviewed: Option<NaiveDate>,
    /// Consecutive "forgot" answers since the last "remembered"
    #[serde(default)]
    pub streak_forgot: u32,
}

impl ProgressRecord {
    /// Record for a word that has never been reviewed
    pub fn fresh(today: NaiveDate) -> Self {
        Self {
            level: 0,
            next_due: today,
            last_reviewed: None,
            streak_forgot: 0,
        }
    }

    pub fn is_due(&self, today: NaiveDate) -> bool {
        self.next_due <= today
    }

    pub fn is_learned(&self, threshold: u8) -> bool {
        self.level >= threshold
    }
}

// ==================== Judgment Types ====================

/// Learner's self-assessment after the answer is revealed
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Remembered,
    Forgot,
}

/// When a forgotten word becomes eligible again
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ForgotPolicy {
    /// Due again today, so it can be re-drilled in a later session the same day
    SameDay,
    /// Due again tomorrow
    #[default]
    NextDay,
}

impl ForgotPolicy {
    pub fn retry_after_days(self) -> u32 {
        match self {
            ForgotPolicy::SameDay => 0,
            ForgotPolicy::NextDay => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ForgotPolicy::SameDay => "same-day",
            ForgotPolicy::NextDay => "next-day",
        }
    }
}

impl FromStr for ForgotPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "same-day" | "same_day" | "today" => Ok(ForgotPolicy::SameDay),
            "next-day" | "next_day" | "tomorrow" => Ok(ForgotPolicy::NextDay),
            other => Err(format!("unknown forgot policy: {other}")),
        }
    }
}

impl fmt::Display for ForgotPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ==================== Presentation Types ====================

/// Which side of the card is shown as the prompt
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PromptMode {
    /// Show the word, recall the meaning
    #[default]
    WordToMeaning,
    /// Show the meaning, recall the word
    MeaningToWord,
}

impl PromptMode {
    pub fn prompt_for(self, entry: &WordEntry) -> &str {
        match self {
            PromptMode::WordToMeaning => &entry.word,
            PromptMode::MeaningToWord => &entry.meaning,
        }
    }
}

impl FromStr for PromptMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "word" | "en-to-meaning" | "word-to-meaning" => Ok(PromptMode::WordToMeaning),
            "meaning" | "meaning-to-en" | "meaning-to-word" => Ok(PromptMode::MeaningToWord),
            other => Err(format!("unknown prompt mode: {other}")),
        }
    }
}

/// Full answer payload produced by a reveal
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevealedCard {
    pub word: String,
    pub pos: String,
    pub phonetic: String,
    pub meaning: String,
    pub example: String,
    pub position: Option<i64>,
}

impl From<&WordEntry> for RevealedCard {
    fn from(entry: &WordEntry) -> Self {
        Self {
            word: entry.word.clone(),
            pos: entry.pos.clone(),
            phonetic: entry.phonetic.clone(),
            meaning: entry.meaning.clone(),
            example: entry.example.clone(),
            position: entry.position,
        }
    }
}
