//! 临时基础率映射
//!
//! 遗留形状用 `duration`（分钟）表达区间长度，区间形状用
//! `end_mills` 表达；两个方向都要换算：
//! - 入库：`end_mills = mills + duration × 60000`
//! - 渲染：`duration = (end_mills − start_mills) / 60000`，
//!   未结束区间按类别默认时长折算
//!
//! 速率（U/hr）保存在 metadata 的 `rate` 键下，读取时做完全
//! 强制转换；写出时同时填充遗留别名 `absolute`。

use crate::{duration_minutes, end_mills_from_duration};
use api_contract::{TreatmentRecord, event_types};
use domain::{MetaValue, SpanCategory, SpanMetadata, StateSpan, metadata_number};

/// 区间 → 遗留记录。
///
/// 类别不符或 rate 缺失/不可解析时返回 None（调用方按坏记录跳过）。
pub fn to_treatment(span: &StateSpan) -> Option<TreatmentRecord> {
    if span.category != SpanCategory::TempBasal {
        return None;
    }
    let rate = metadata_number(&span.metadata, "rate")?;
    Some(TreatmentRecord {
        id: Some(span.span_id.clone()),
        mills: span.start_mills,
        event_type: event_types::TEMP_BASAL.to_string(),
        duration: Some(duration_minutes(span)),
        rate: Some(rate),
        absolute: Some(rate),
        reason: (!span.state.is_empty()).then(|| span.state.clone()),
        notes: None,
        entered_by: (!span.source.is_empty()).then(|| span.source.clone()),
    })
}

/// 遗留记录 → 区间。
///
/// 事件类型不是临时基础率、或速率缺失时返回 None。
pub fn from_treatment(record: &TreatmentRecord) -> Option<StateSpan> {
    if record.event_type != event_types::TEMP_BASAL {
        return None;
    }
    let rate = record.rate.or(record.absolute)?;
    let mut metadata = SpanMetadata::new();
    metadata.insert("rate".to_string(), MetaValue::from(rate));
    Some(StateSpan {
        span_id: String::new(),
        category: SpanCategory::TempBasal,
        state: record.reason.clone().unwrap_or_default(),
        start_mills: record.mills,
        end_mills: end_mills_from_duration(record.mills, record.duration),
        source: record.entered_by.clone().unwrap_or_else(|| "api".to_string()),
        original_id: record.id.clone(),
        metadata,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(start_mills: i64, end_mills: Option<i64>, rate: MetaValue) -> StateSpan {
        let mut metadata = SpanMetadata::new();
        metadata.insert("rate".to_string(), rate);
        StateSpan {
            span_id: "span-1".to_string(),
            category: SpanCategory::TempBasal,
            state: String::new(),
            start_mills,
            end_mills,
            source: "pump".to_string(),
            original_id: Some("abc".to_string()),
            metadata,
        }
    }

    #[test]
    fn renders_duration_in_minutes() {
        let record = to_treatment(&span(1_000, Some(1_600_000), MetaValue::from(0.5)))
            .expect("mapped");
        assert_eq!(record.event_type, event_types::TEMP_BASAL);
        assert_eq!(record.rate, Some(0.5));
        assert_eq!(record.absolute, Some(0.5));
        let duration = record.duration.expect("duration");
        assert!((duration - 26.65).abs() < 1e-9);
    }

    #[test]
    fn open_span_falls_back_to_default_duration() {
        let record = to_treatment(&span(1_000, None, MetaValue::from(0.8))).expect("mapped");
        assert_eq!(record.duration, Some(30.0));
    }

    #[test]
    fn rate_is_coerced_from_wire_strings() {
        let record = to_treatment(&span(1_000, Some(61_000), MetaValue::from("1.75")))
            .expect("mapped");
        assert_eq!(record.rate, Some(1.75));
    }

    #[test]
    fn malformed_rate_does_not_map() {
        assert!(to_treatment(&span(1_000, Some(61_000), MetaValue::from("n/a"))).is_none());
    }

    #[test]
    fn rejects_other_event_types() {
        let record = TreatmentRecord {
            mills: 1_000,
            event_type: event_types::EXERCISE.to_string(),
            rate: Some(1.0),
            ..Default::default()
        };
        assert!(from_treatment(&record).is_none());
    }

    #[test]
    fn round_trip_preserves_minute_aligned_spans() {
        // 长度为 60000 的整数倍时，分钟粒度换算无损。
        let original = span(120_000, Some(1_920_000), MetaValue::from(0.5));
        let record = to_treatment(&original).expect("render");
        let back = from_treatment(&record).expect("parse");

        assert_eq!(back.start_mills, original.start_mills);
        assert_eq!(back.end_mills, original.end_mills);
        assert_eq!(metadata_number(&back.metadata, "rate"), Some(0.5));
        // 区间派生记录的 _id 即 span_id，回流时作为自然键。
        assert_eq!(back.original_id.as_deref(), Some("span-1"));
    }

    #[test]
    fn legacy_absolute_alias_is_honoured() {
        let record = TreatmentRecord {
            id: Some("native-1".to_string()),
            mills: 1_000,
            event_type: event_types::TEMP_BASAL.to_string(),
            duration: Some(30.0),
            absolute: Some(1.2),
            ..Default::default()
        };
        let span = from_treatment(&record).expect("parse");
        assert_eq!(metadata_number(&span.metadata, "rate"), Some(1.2));
        assert_eq!(span.end_mills, Some(1_000 + 30 * 60_000));
    }
}
