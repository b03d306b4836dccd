//! Presentation sink
//!
//! The scheduling core hands over plain data; this module decides how it
//! looks on a terminal.

use std::io::{self, Write};

use tango_algo::{format_day, Judgment, Outcome, RevealedCard, SessionStatus, Stats};

use crate::source::CatalogStatus;

/// Receives everything the learner should see
pub trait PresentationSink {
    fn catalog_status(&mut self, status: &CatalogStatus) -> io::Result<()>;
    fn prompt(&mut self, status: SessionStatus, text: &str) -> io::Result<()>;
    fn answer(&mut self, card: &RevealedCard) -> io::Result<()>;
    fn judged(&mut self, judgment: &Judgment) -> io::Result<()>;
    fn stats(&mut self, stats: &Stats, due: usize) -> io::Result<()>;
    /// Free-form status line ("nothing to review", "session complete", ...)
    fn notice(&mut self, message: &str) -> io::Result<()>;
}

/// Line-oriented terminal output
pub struct TerminalSink<W: Write> {
    out: W,
}

impl<W: Write> TerminalSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> PresentationSink for TerminalSink<W> {
    fn catalog_status(&mut self, status: &CatalogStatus) -> io::Result<()> {
        match status {
            CatalogStatus::Ready { words } => writeln!(self.out, "Ready: {words} words loaded."),
            CatalogStatus::Unavailable { reason } => {
                writeln!(self.out, "No data: word list could not be loaded ({reason}).")
            }
        }
    }

    fn prompt(&mut self, status: SessionStatus, text: &str) -> io::Result<()> {
        writeln!(self.out)?;
        writeln!(self.out, "Question {} / {}", status.current, status.total)?;
        writeln!(self.out, "  {text}")?;
        write!(self.out, "[Enter] show answer, [q] quit > ")?;
        self.out.flush()
    }

    fn answer(&mut self, card: &RevealedCard) -> io::Result<()> {
        match card.position {
            Some(position) => writeln!(self.out, "  Word: {}  (#{position})", card.word)?,
            None => writeln!(self.out, "  Word: {}", card.word)?,
        }
        for (label, value) in [
            ("POS", &card.pos),
            ("Phonetic", &card.phonetic),
            ("Meaning", &card.meaning),
            ("Example", &card.example),
        ] {
            if !value.is_empty() {
                writeln!(self.out, "  {label}: {value}")?;
            }
        }
        write!(self.out, "[y] remembered, [n] forgot, [s] speak, [q] quit > ")?;
        self.out.flush()
    }

    fn judged(&mut self, judgment: &Judgment) -> io::Result<()> {
        let next = format_day(judgment.record.next_due);
        match judgment.outcome {
            Outcome::Remembered => writeln!(
                self.out,
                "  Level {} - next review {next}",
                judgment.record.level
            )?,
            Outcome::Forgot => writeln!(
                self.out,
                "  Back to level 0 (forgot {}x in a row) - review again {next}",
                judgment.record.streak_forgot
            )?,
        }
        if !judgment.persisted {
            writeln!(self.out, "  (warning: progress could not be saved)")?;
        }
        Ok(())
    }

    fn stats(&mut self, stats: &Stats, due: usize) -> io::Result<()> {
        writeln!(
            self.out,
            "Learned {} / {} ({}%), due today: {due}",
            stats.learned, stats.total, stats.percent_learned
        )
    }

    fn notice(&mut self, message: &str) -> io::Result<()> {
        writeln!(self.out, "{message}")
    }
}
