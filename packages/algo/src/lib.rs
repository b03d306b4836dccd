//! # tango-algo - 单词复习调度核心库
//!
//! 本 crate 提供间隔重复 (SRS) 单词练习的调度逻辑:
//!
//! - **Catalog** - 词表清洗与去重
//! - **Progress Store** - 每个单词的学习进度，与词表对账
//! - **Queue Builder** - 选出今日到期单词并排序
//! - **Review Session** - 出题 / 揭晓 / 判定的状态机
//! - **Statistics** - 已掌握 / 总数统计
//!
//! ## 设计理念
//!
//! - **纯逻辑** - 不直接读取时钟、文件或网络，全部通过协作者 trait 注入
//! - **按天调度** - 日期统一使用 `NaiveDate`，只在边界转换为 `YYYY-MM-DD`
//! - **可替换排序** - 出题顺序由 [`queue::OrderingStrategy`] 决定
//!
//! ## 模块结构
//!
//! - [`catalog`] - 词表规范化 ([`normalize_catalog`])
//! - [`progress`] - 进度存储、对账、持久化 trait
//! - [`queue`] - 到期判定与出题队列
//! - [`session`] - 复习会话状态机
//! - [`stats`] - 统计
//! - [`date`] - 日期工具与时钟
//! - [`sanitize`] - 松散 JSON 值的清洗
//! - [`types`] - 公共类型和常量
//!
//! ## 使用示例
//!
//! ```rust
//! use chrono::NaiveDate;
//! use serde_json::json;
//! use tango_algo::{
//!     normalize_catalog, FixedClock, MemoryRepository, Outcome, QueueOptions, ReviewSession,
//!     SessionConfig,
//! };
//!
//! let catalog = normalize_catalog(&[json!({ "word": "cat", "meaning": "猫" })]);
//! let clock = FixedClock::new(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
//! let mut session = ReviewSession::open(
//!     catalog,
//!     Box::new(MemoryRepository::new()),
//!     Box::new(clock),
//!     SessionConfig::default(),
//! );
//!
//! session.start_due(&QueueOptions::default()).unwrap();
//! let card = session.reveal().unwrap();
//! assert_eq!(card.meaning, "猫");
//!
//! let judgment = session.judge(Outcome::Remembered).unwrap();
//! assert_eq!(judgment.record.level, 1);
//! assert_eq!(judgment.record.next_due, NaiveDate::from_ymd_opt(2024, 1, 4).unwrap());
//! ```

// ============================================================================
// 模块声明
// ============================================================================

pub mod catalog;
pub mod date;
pub mod progress;
pub mod queue;
pub mod sanitize;
pub mod session;
pub mod stats;
pub mod types;

// ============================================================================
// 重新导出
// ============================================================================

/// 重新导出所有公共类型
pub use types::*;

/// 重新导出词表
pub use catalog::{normalize_catalog, normalize_entry, Catalog};

/// 重新导出日期与时钟
pub use date::{add_days, format_day, parse_day, Clock, FixedClock, SystemClock};

/// 重新导出进度存储
pub use progress::{
    apply_outcome, MemoryRepository, ProgressRepository, ProgressStore, ReconcileReport,
    StoreError, StoreResult,
};

/// 重新导出出题队列
pub use queue::{
    build_queue, count_due, is_due, BuiltQueue, OrderingPolicy, OrderingStrategy, PlainRandom,
    PositionRange, QueueOptions, StreakPriority,
};

/// 重新导出复习会话
pub use session::{
    Judgment, ReviewSession, SessionAction, SessionConfig, SessionError, SessionState,
    SessionStatus,
};

/// 重新导出统计
pub use stats::{compute_stats, Stats};
