//! 治疗覆盖映射
//!
//! 遗留形状：`Temporary Override` 事件，`reason` 承载覆盖名。

use crate::{duration_minutes, end_mills_from_duration};
use api_contract::{TreatmentRecord, event_types};
use domain::{SpanCategory, SpanMetadata, StateSpan};

/// 区间 → 遗留记录。
pub fn to_treatment(span: &StateSpan) -> Option<TreatmentRecord> {
    if span.category != SpanCategory::Override {
        return None;
    }
    Some(TreatmentRecord {
        id: Some(span.span_id.clone()),
        mills: span.start_mills,
        event_type: event_types::TEMPORARY_OVERRIDE.to_string(),
        duration: Some(duration_minutes(span)),
        rate: None,
        absolute: None,
        reason: (!span.state.is_empty()).then(|| span.state.clone()),
        notes: None,
        entered_by: (!span.source.is_empty()).then(|| span.source.clone()),
    })
}

/// 遗留记录 → 区间。
pub fn from_treatment(record: &TreatmentRecord) -> Option<StateSpan> {
    if record.event_type != event_types::TEMPORARY_OVERRIDE {
        return None;
    }
    Some(StateSpan {
        span_id: String::new(),
        category: SpanCategory::Override,
        state: record.reason.clone().unwrap_or_default(),
        start_mills: record.mills,
        end_mills: end_mills_from_duration(record.mills, record.duration),
        source: record.entered_by.clone().unwrap_or_else(|| "api".to_string()),
        original_id: record.id.clone(),
        metadata: SpanMetadata::new(),
    })
}
