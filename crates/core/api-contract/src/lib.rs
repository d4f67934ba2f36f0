//! 遗留 treatment 记录的稳定线格式。
//!
//! 周边 API 早于区间建模存在，字段名与数值单位必须与既有 schema
//! 完全一致以保证向后兼容：
//! - `duration`：分钟
//! - `rate` / `absolute`：U/hr（absolute 是旧客户端使用的别名）
//! - `mills`：epoch 毫秒
//! - `_id`：记录标识

use serde::{Deserialize, Serialize};

/// 遗留事件类型字符串。
pub mod event_types {
    pub const TEMP_BASAL: &str = "Temp Basal";
    pub const EXERCISE: &str = "Exercise";
    pub const TEMPORARY_OVERRIDE: &str = "Temporary Override";
    pub const BASAL: &str = "Basal";
}

/// 遗留平面 treatment 记录。
///
/// 点事件形状：一个时间戳加类别相关的标量字段。
/// 区间派生记录与原生记录共用此形状，调用方无法区分来源。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreatmentRecord {
    /// 记录标识；区间派生记录携带其 span_id。
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub mills: i64,
    pub event_type: String,
    /// 时长（分钟）。
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    /// 速率（U/hr）。
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate: Option<f64>,
    /// 速率的遗留别名（U/hr），写出时与 rate 同值。
    #[serde(skip_serializing_if = "Option::is_none")]
    pub absolute: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entered_by: Option<String>,
}
