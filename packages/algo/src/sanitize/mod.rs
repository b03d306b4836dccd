//! Data Sanitization
//!
//! Coercion of loosely typed JSON values coming from word lists and
//! persisted progress blobs.
//!
//! Functions:
//! - Text field coercion
//! - Integer coercion (positions, levels, counters)
//! - Calendar day coercion

use chrono::NaiveDate;
use serde_json::Value;

use crate::date::parse_day;
use crate::types::MAX_LEVEL;

/// 将任意 JSON 值转换为去除首尾空白的字符串，缺失时返回空串
pub fn coerce_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

/// 将数字或数字字符串转换为整数
///
/// `"123"`、`"123.0"`、`123.7` 均视为有效（截断小数部分）；
/// 空串、NaN、无穷大或无法解析的值返回 `None`。
pub fn coerce_integer(value: Option<&Value>) -> Option<i64> {
    let number = match value? {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                return Some(i);
            }
            n.as_f64()?
        }
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return None;
            }
            s.parse::<f64>().ok()?
        }
        _ => return None,
    };

    finite_to_i64(number)
}

/// 掌握等级：非数字视为 0，越界值截断到 [0, MAX_LEVEL]
pub fn coerce_level(value: Option<&Value>) -> u8 {
    coerce_integer(value)
        .map(|level| level.clamp(0, i64::from(MAX_LEVEL)) as u8)
        .unwrap_or(0)
}

/// 非负计数器：缺失、无效或负数视为 0
pub fn coerce_count(value: Option<&Value>) -> u32 {
    coerce_integer(value)
        .map(|count| count.clamp(0, i64::from(u32::MAX)) as u32)
        .unwrap_or(0)
}

/// 日期字段：仅接受可解析的日期字符串
pub fn coerce_day(value: Option<&Value>) -> Option<NaiveDate> {
    match value {
        Some(Value::String(s)) => parse_day(s),
        _ => None,
    }
}

fn finite_to_i64(number: f64) -> Option<i64> {
    if !number.is_finite() {
        return None;
    }
    let truncated = number.trunc();
    if truncated < i64::MIN as f64 || truncated > i64::MAX as f64 {
        return None;
    }
    Some(truncated as i64)
}
