//! Interactive drill loop
//!
//! Reads one command per line: Enter reveals the answer, `y` / `n` judge it,
//! `s` speaks the word, `q` (or end of input) stops. Quitting mid-queue
//! keeps every judgment made so far.

use std::io::BufRead;

use serde::Serialize;
use tango_algo::{Outcome, PromptMode, QueueOptions, ReviewSession, SessionError, SessionState};

use crate::error::AppResult;
use crate::presenter::PresentationSink;
use crate::speech::Speaker;

#[derive(Debug, Clone, Copy, Default)]
pub struct DrillOptions {
    pub queue: QueueOptions,
    pub mode: PromptMode,
    /// Speak each word as soon as it is revealed
    pub speak: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DrillSummary {
    /// Queue length at start, 0 when nothing was due
    pub queued: usize,
    pub remembered: usize,
    pub forgot: usize,
    /// Judgments that could not be written to disk
    pub unsaved: usize,
    pub widened: bool,
    /// The whole queue was judged
    pub completed: bool,
}

enum Command {
    Reveal,
    Judge(Outcome),
    Speak,
    Quit,
    Unknown,
}

fn parse_command(line: &str) -> Command {
    match line.trim().to_lowercase().as_str() {
        "" => Command::Reveal,
        "y" | "yes" | "o" | "ok" | "1" => Command::Judge(Outcome::Remembered),
        "n" | "no" | "ng" | "0" => Command::Judge(Outcome::Forgot),
        "s" | "say" | "speak" => Command::Speak,
        "q" | "quit" | "exit" => Command::Quit,
        _ => Command::Unknown,
    }
}

/// Next command, `Quit` on end of input
fn read_command<R: BufRead + ?Sized>(input: &mut R) -> std::io::Result<Command> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(Command::Quit);
    }
    Ok(parse_command(&line))
}

fn say<S: PresentationSink + ?Sized>(
    speaker: &dyn Speaker,
    word: &str,
    sink: &mut S,
) -> std::io::Result<()> {
    if let Err(err) = speaker.speak(word) {
        tracing::warn!(word, error = %err, "speech failed");
        sink.notice(&format!("  (speech unavailable: {err})"))?;
    }
    Ok(())
}

/// Run today's queue to completion or until the learner quits
pub fn run_drill<R, S>(
    session: &mut ReviewSession,
    options: &DrillOptions,
    input: &mut R,
    sink: &mut S,
    speaker: &dyn Speaker,
) -> AppResult<DrillSummary>
where
    R: BufRead + ?Sized,
    S: PresentationSink + ?Sized,
{
    let mut summary = DrillSummary::default();

    let built = match session.start_due(&options.queue) {
        Ok(built) => built,
        Err(SessionError::NothingDue) => {
            sink.notice("Nothing to review today.")?;
            return Ok(summary);
        }
        Err(err) => return Err(err.into()),
    };
    summary.queued = built.len();
    summary.widened = built.widened;

    if built.widened {
        sink.notice("Nothing due in that range; reviewing every word in it instead.")?;
    }
    sink.notice(&format!("{} word(s) to review.", built.len()))?;

    while session.state() == SessionState::Presenting {
        let prompt = session
            .current_prompt(options.mode)
            .filter(|text| !text.is_empty())
            .unwrap_or("(no text)")
            .to_string();
        sink.prompt(session.status(), &prompt)?;

        // anything but quit reveals
        if let Command::Quit = read_command(input)? {
            sink.notice("Stopped. Progress so far is saved.")?;
            return Ok(summary);
        }

        let card = session.reveal()?;
        sink.answer(&card)?;
        if options.speak {
            say(speaker, &card.word, sink)?;
        }

        let outcome = loop {
            match read_command(input)? {
                Command::Judge(outcome) => break outcome,
                Command::Speak => {
                    say(speaker, &card.word, sink)?;
                    sink.notice("[y] remembered, [n] forgot")?;
                }
                Command::Quit => {
                    sink.notice("Stopped. Progress so far is saved.")?;
                    return Ok(summary);
                }
                Command::Reveal | Command::Unknown => {
                    sink.notice("Please answer y (remembered) or n (forgot).")?;
                }
            }
        };

        let judgment = session.judge(outcome)?;
        match judgment.outcome {
            Outcome::Remembered => summary.remembered += 1,
            Outcome::Forgot => summary.forgot += 1,
        }
        if !judgment.persisted {
            summary.unsaved += 1;
        }
        sink.judged(&judgment)?;
    }

    if session.state() == SessionState::Complete {
        session.finish()?;
        summary.completed = true;
        sink.notice(&format!(
            "Session complete: {} remembered, {} forgot.",
            summary.remembered, summary.forgot
        ))?;
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    use chrono::NaiveDate;
    use tango_algo::{Catalog, FixedClock, MemoryRepository, SessionConfig, WordEntry};

    use crate::presenter::TerminalSink;
    use crate::speech::SilentSpeaker;

    fn session(words: &[&str]) -> ReviewSession {
        let catalog = Catalog::new(words.iter().map(|w| WordEntry::new(*w).with_meaning("m")));
        ReviewSession::open(
            catalog,
            Box::new(MemoryRepository::new()),
            Box::new(FixedClock::new(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())),
            SessionConfig {
                seed: Some(1),
                ..SessionConfig::default()
            },
        )
    }

    fn drill(session: &mut ReviewSession, script: &str) -> (DrillSummary, String) {
        let mut input = Cursor::new(script.as_bytes().to_vec());
        let mut sink = TerminalSink::new(Vec::new());
        let summary = run_drill(
            session,
            &DrillOptions::default(),
            &mut input,
            &mut sink,
            &SilentSpeaker,
        )
        .unwrap();
        (summary, String::from_utf8(sink.into_inner()).unwrap())
    }

    #[test]
    fn test_parse_command() {
        assert!(matches!(parse_command("\n"), Command::Reveal));
        assert!(matches!(parse_command("Y\n"), Command::Judge(Outcome::Remembered)));
        assert!(matches!(parse_command(" ng "), Command::Judge(Outcome::Forgot)));
        assert!(matches!(parse_command("s"), Command::Speak));
        assert!(matches!(parse_command("q"), Command::Quit));
        assert!(matches!(parse_command("maybe"), Command::Unknown));
    }

    #[test]
    fn test_full_run() {
        let mut session = session(&["cat", "dog"]);
        let (summary, output) = drill(&mut session, "\ny\n\nmaybe\nn\n");

        assert_eq!(summary.queued, 2);
        assert_eq!(summary.remembered, 1);
        assert_eq!(summary.forgot, 1);
        assert!(summary.completed);
        assert_eq!(session.state(), SessionState::Idle);
        assert!(output.contains("Please answer y"));
        assert!(output.contains("Session complete: 1 remembered, 1 forgot."));
    }

    #[test]
    fn test_quit_keeps_earlier_judgments() {
        let mut session = session(&["cat", "dog"]);
        let (summary, output) = drill(&mut session, "\ny\nq\n");

        assert_eq!(summary.remembered, 1);
        assert!(!summary.completed);
        assert!(output.contains("Stopped."));
        let levels: Vec<u8> = ["cat", "dog"]
            .iter()
            .map(|w| session.store().get(w).unwrap().level)
            .collect();
        assert!(levels.contains(&1));
        assert!(levels.contains(&0));
    }

    #[test]
    fn test_eof_while_revealed_stops() {
        let mut session = session(&["cat"]);
        let (summary, _) = drill(&mut session, "\n");

        assert_eq!(summary.remembered + summary.forgot, 0);
        assert_eq!(session.store().get("cat").unwrap().level, 0);
    }

    #[test]
    fn test_nothing_due() {
        let mut session = session(&[]);
        let (summary, output) = drill(&mut session, "");

        assert_eq!(summary, DrillSummary::default());
        assert!(output.contains("Nothing to review today."));
    }
}
