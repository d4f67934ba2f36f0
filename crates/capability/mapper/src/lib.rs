//! 区间记录与遗留平面记录的双向映射。
//!
//! 每个类别一对纯函数：
//! - `to_treatment`：StateSpan → 遗留记录，输入不属于该类别或
//!   必要元数据缺失时返回 None
//! - `from_treatment`：遗留记录 → StateSpan，事件类型不匹配时返回 None
//!
//! 映射是确定性的、无副作用的，可脱离存储单独测试。
//! 类别分发通过 `SpanCategory` 上的穷尽 match 完成，新增类别时
//! 编译器强制补全分支。
//!
//! 有损约定：遗留形状承载不了的元数据键（如 `scheduledRate`）只
//! 保留在区间一侧，经过平面记录往返后丢失；这是契约的一部分。
//!
//! 映射产生的区间不携带 span_id（留空），由服务层在落库时分配。

use api_contract::TreatmentRecord;
use domain::{SpanCategory, StateSpan};

pub mod activity;
pub mod basal_delivery;
pub mod temp_basal;
pub mod therapy_override;

/// 按类别将区间渲染为遗留记录。
///
/// DataExclusion 没有遗留投影（旧 API 从未表达过剔除段）。
pub fn span_to_treatment(span: &StateSpan) -> Option<TreatmentRecord> {
    match span.category {
        SpanCategory::TempBasal => temp_basal::to_treatment(span),
        SpanCategory::Activity => activity::to_treatment(span),
        SpanCategory::Override => therapy_override::to_treatment(span),
        SpanCategory::BasalDelivery => basal_delivery::to_treatment(span),
        SpanCategory::DataExclusion => None,
    }
}

/// 按目标类别将遗留记录解释为区间。
pub fn treatment_to_span(category: SpanCategory, record: &TreatmentRecord) -> Option<StateSpan> {
    match category {
        SpanCategory::TempBasal => temp_basal::from_treatment(record),
        SpanCategory::Activity => activity::from_treatment(record),
        SpanCategory::Override => therapy_override::from_treatment(record),
        SpanCategory::BasalDelivery => basal_delivery::from_treatment(record),
        SpanCategory::DataExclusion => None,
    }
}

/// 类别对应的遗留事件类型字符串。
///
/// 合并协调器用它决定原生一侧的过滤条件；DataExclusion 返回 None。
pub fn legacy_event_type(category: SpanCategory) -> Option<&'static str> {
    match category {
        SpanCategory::TempBasal => Some(api_contract::event_types::TEMP_BASAL),
        SpanCategory::Activity => Some(api_contract::event_types::EXERCISE),
        SpanCategory::Override => Some(api_contract::event_types::TEMPORARY_OVERRIDE),
        SpanCategory::BasalDelivery => Some(api_contract::event_types::BASAL),
        SpanCategory::DataExclusion => None,
    }
}

/// 渲染时长（分钟）；未结束区间按类别默认时长折算。
pub(crate) fn duration_minutes(span: &StateSpan) -> f64 {
    span.effective_duration_ms() as f64 / 60_000.0
}

/// 由时间戳加分钟时长推导结束时间。
pub(crate) fn end_mills_from_duration(mills: i64, duration: Option<f64>) -> Option<i64> {
    duration.map(|minutes| mills + (minutes * 60_000.0).round() as i64)
}
