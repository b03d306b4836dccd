//! # tango-drill - 终端单词练习
//!
//! `tango-algo` 调度核心的外壳: 词表获取、JSON 进度文件、终端交互、
//! 发音与 CSV 导入。

pub mod config;
pub mod drill;
pub mod error;
pub mod import;
pub mod logging;
pub mod presenter;
pub mod repository;
pub mod source;
pub mod speech;

pub use config::Config;
pub use drill::{run_drill, DrillOptions, DrillSummary};
pub use error::{AppError, AppResult};
pub use import::{import_sheet, parse_csv, parse_workbook, ImportError, ImportReport};
pub use presenter::{PresentationSink, TerminalSink};
pub use repository::JsonFileRepository;
pub use source::{fetch_catalog, load_catalog, CatalogStatus, RetrievalError};
pub use speech::{CommandSpeaker, SilentSpeaker, Speaker, SpeechError, TtsConfig};
