use std::path::PathBuf;

use chrono::NaiveDate;
use tango_algo::{parse_day, ForgotPolicy, OrderingPolicy, SessionConfig};

use crate::speech::TtsConfig;

/// File name of the progress blob inside the data directory
pub const PROGRESS_FILE: &str = "vocab_progress_v1.json";

#[derive(Debug, Clone)]
pub struct Config {
    /// Word list location: a file path or an http(s) URL
    pub catalog: String,
    pub data_dir: PathBuf,
    pub ordering: OrderingPolicy,
    pub forgot_policy: ForgotPolicy,
    pub seed: Option<u64>,
    /// Pin "today" instead of reading the system clock
    pub today: Option<NaiveDate>,
    /// Speech command; `None` disables speech
    pub tts_command: Option<String>,
    pub tts: TtsConfig,
    pub log_level: String,
    pub file_logs: bool,
    pub log_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key/value source; unparseable values fall back to defaults
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let catalog = non_empty("TANGO_CATALOG").unwrap_or_else(|| "words.json".to_string());

        let data_dir = non_empty("TANGO_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(default_data_dir);

        let ordering = non_empty("TANGO_ORDERING")
            .and_then(|value| value.parse::<OrderingPolicy>().ok())
            .unwrap_or_default();

        let forgot_policy = non_empty("TANGO_FORGOT_POLICY")
            .and_then(|value| value.parse::<ForgotPolicy>().ok())
            .unwrap_or_default();

        let seed = non_empty("TANGO_SEED").and_then(|value| value.trim().parse::<u64>().ok());

        let today = non_empty("TANGO_TODAY").and_then(|value| parse_day(&value));

        let tts_command = non_empty("TANGO_TTS_COMMAND");

        let mut tts = TtsConfig::default();
        if let Some(language) = non_empty("TANGO_TTS_LANGUAGE") {
            tts.language = language;
        }
        let rate = non_empty("TANGO_TTS_RATE").and_then(|value| value.parse::<f32>().ok());
        if let Some(rate) = rate {
            tts.rate = rate.clamp(0.5, 2.0);
        }

        let log_level = lookup("RUST_LOG").unwrap_or_else(|| "warn".to_string());

        let file_logs = lookup("ENABLE_FILE_LOGS")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        let log_dir = non_empty("LOG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join("logs"));

        Self {
            catalog,
            data_dir,
            ordering,
            forgot_policy,
            seed,
            today,
            tts_command,
            tts,
            log_level,
            file_logs,
            log_dir,
        }
    }

    pub fn progress_path(&self) -> PathBuf {
        self.data_dir.join(PROGRESS_FILE)
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            ordering: self.ordering,
            forgot_policy: self.forgot_policy,
            seed: self.seed,
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("tango"))
        .unwrap_or_else(|| PathBuf::from(".tango"))
}
