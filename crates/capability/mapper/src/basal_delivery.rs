//! 基础率输注段映射
//!
//! 遗留形状：`Basal` 事件，`rate`（U/hr）+ `duration`（分钟）。
//! 与命令侧的 `Temp Basal` 区分开：输注段是泵确认已执行的交付。
//! metadata 里的 `scheduledRate` 等键遗留形状承载不了，渲染后丢失。

use crate::{duration_minutes, end_mills_from_duration};
use api_contract::{TreatmentRecord, event_types};
use domain::{MetaValue, SpanCategory, SpanMetadata, StateSpan, metadata_number};

/// 区间 → 遗留记录。
///
/// rate 缺失或不可解析的输注段视为坏记录，返回 None。
pub fn to_treatment(span: &StateSpan) -> Option<TreatmentRecord> {
    if span.category != SpanCategory::BasalDelivery {
        return None;
    }
    let rate = metadata_number(&span.metadata, "rate")?;
    Some(TreatmentRecord {
        id: Some(span.span_id.clone()),
        mills: span.start_mills,
        event_type: event_types::BASAL.to_string(),
        duration: Some(duration_minutes(span)),
        rate: Some(rate),
        absolute: Some(rate),
        reason: None,
        notes: None,
        entered_by: (!span.source.is_empty()).then(|| span.source.clone()),
    })
}

/// 遗留记录 → 区间。
pub fn from_treatment(record: &TreatmentRecord) -> Option<StateSpan> {
    if record.event_type != event_types::BASAL {
        return None;
    }
    let rate = record.rate.or(record.absolute)?;
    let mut metadata = SpanMetadata::new();
    metadata.insert("rate".to_string(), MetaValue::from(rate));
    Some(StateSpan {
        span_id: String::new(),
        category: SpanCategory::BasalDelivery,
        state: String::new(),
        start_mills: record.mills,
        end_mills: end_mills_from_duration(record.mills, record.duration),
        source: record.entered_by.clone().unwrap_or_else(|| "api".to_string()),
        original_id: record.id.clone(),
        metadata,
    })
}
