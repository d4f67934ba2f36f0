//! 区间元数据键值包。
//!
//! metadata 是按类别开放的键值包（如 `rate`、`scheduledRate`、`origin`）。
//! 值是松散类型：同一个键在不同来源可能以数值、字符串或布尔到达，
//! 读取时必须做显式的完全强制转换，不在调用点做运行时类型嗅探。

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 元数据值的变体类型。
///
/// 反序列化按变体顺序尝试：布尔 → 数值 → 文本。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetaValue {
    Flag(bool),
    Number(f64),
    Text(String),
}

impl MetaValue {
    /// 数值强制转换。
    ///
    /// 字符串按十进制解析，布尔按 1/0 处理；不可解析返回 None。
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetaValue::Number(v) => Some(*v),
            MetaValue::Text(v) => v.trim().parse::<f64>().ok(),
            MetaValue::Flag(v) => Some(if *v { 1.0 } else { 0.0 }),
        }
    }

    /// 文本强制转换（总是成功）。
    pub fn as_text(&self) -> String {
        match self {
            MetaValue::Number(v) => v.to_string(),
            MetaValue::Text(v) => v.clone(),
            MetaValue::Flag(v) => v.to_string(),
        }
    }
}

impl From<f64> for MetaValue {
    fn from(value: f64) -> Self {
        MetaValue::Number(value)
    }
}

impl From<bool> for MetaValue {
    fn from(value: bool) -> Self {
        MetaValue::Flag(value)
    }
}

impl From<&str> for MetaValue {
    fn from(value: &str) -> Self {
        MetaValue::Text(value.to_string())
    }
}

impl From<String> for MetaValue {
    fn from(value: String) -> Self {
        MetaValue::Text(value)
    }
}

/// 区间元数据包。
pub type SpanMetadata = HashMap<String, MetaValue>;

/// 读取数值键；缺失或不可解析返回 None。
pub fn metadata_number(metadata: &SpanMetadata, key: &str) -> Option<f64> {
    metadata.get(key).and_then(MetaValue::as_f64)
}

/// 读取文本键；缺失返回 None。
pub fn metadata_text(metadata: &SpanMetadata, key: &str) -> Option<String> {
    metadata.get(key).map(MetaValue::as_text)
}
