// 发音模块
// 通过外部 TTS 命令朗读单词 (espeak / say 等)，未配置时静默

use std::process::{Command, Stdio};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 朗读参数，替换进 TTS 命令行的占位符
///
/// 默认 en-US、0.9 倍速：听写练习时略慢于正常语速。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TtsConfig {
    /// `{lang}`，如 "en-US" / "en-GB"
    pub language: String,
    /// `{rate}`，相对语速，配置层截断到 0.5 - 2.0
    pub rate: f32,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            language: "en-US".to_string(),
            rate: 0.9,
        }
    }
}

#[derive(Debug, Error)]
pub enum SpeechError {
    #[error("speech command is empty")]
    EmptyCommand,

    #[error("failed to run speech command: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("speech command exited with {0}")]
    Failed(std::process::ExitStatus),
}

/// Audio collaborator, called by the presentation layer after a reveal
pub trait Speaker {
    fn speak(&self, word: &str) -> Result<(), SpeechError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SilentSpeaker;

impl Speaker for SilentSpeaker {
    fn speak(&self, _word: &str) -> Result<(), SpeechError> {
        Ok(())
    }
}

/// Runs an external TTS program with the word as the last argument
///
/// `{lang}` and `{rate}` in the command are replaced from [`TtsConfig`];
/// `{wpm}` becomes the rate scaled to espeak's 175 words-per-minute default.
#[derive(Debug, Clone)]
pub struct CommandSpeaker {
    command: String,
    config: TtsConfig,
}

impl CommandSpeaker {
    pub fn new(command: impl Into<String>, config: TtsConfig) -> Self {
        Self {
            command: command.into(),
            config,
        }
    }

    /// Program and arguments for one utterance
    pub fn argv(&self, word: &str) -> Vec<String> {
        let wpm = (175.0 * self.config.rate).round() as u32;
        let mut argv: Vec<String> = self
            .command
            .split_whitespace()
            .map(|part| {
                part.replace("{lang}", &self.config.language)
                    .replace("{rate}", &self.config.rate.to_string())
                    .replace("{wpm}", &wpm.to_string())
            })
            .collect();
        argv.push(word.to_string());
        argv
    }
}

impl Speaker for CommandSpeaker {
    fn speak(&self, word: &str) -> Result<(), SpeechError> {
        if self.command.trim().is_empty() {
            return Err(SpeechError::EmptyCommand);
        }
        let argv = self.argv(word);
        let (program, args) = argv.split_first().ok_or(SpeechError::EmptyCommand)?;

        let status = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()?;

        if status.success() {
            Ok(())
        } else {
            Err(SpeechError::Failed(status))
        }
    }
}
