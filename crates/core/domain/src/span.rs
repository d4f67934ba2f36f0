//! 状态区间领域模型。
//!
//! StateSpan 以时间区间描述一段生理或设备状态：
//! - TempBasal：临时基础率变更
//! - Activity：活动（运动等）
//! - Override：治疗覆盖
//! - BasalDelivery：基础率实际输注段
//! - DataExclusion：数据剔除段（如 CompressionLow）

use crate::meta::SpanMetadata;

/// 区间类别（封闭集合）。
///
/// 类别决定使用哪个映射器以及未结束区间的默认时长。
/// 新增类别时编译器会强制补全所有 match 分支。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpanCategory {
    TempBasal,
    Activity,
    Override,
    BasalDelivery,
    DataExclusion,
}

impl SpanCategory {
    /// 全部类别（用于跨类别遍历，如级联删除）。
    pub const ALL: [SpanCategory; 5] = [
        SpanCategory::TempBasal,
        SpanCategory::Activity,
        SpanCategory::Override,
        SpanCategory::BasalDelivery,
        SpanCategory::DataExclusion,
    ];

    /// 存储层使用的类别标识。
    pub fn as_str(&self) -> &'static str {
        match self {
            SpanCategory::TempBasal => "temp-basal",
            SpanCategory::Activity => "activity",
            SpanCategory::Override => "override",
            SpanCategory::BasalDelivery => "basal-delivery",
            SpanCategory::DataExclusion => "data-exclusion",
        }
    }

    /// 从存储标识解析类别。
    pub fn parse(value: &str) -> Option<SpanCategory> {
        match value {
            "temp-basal" => Some(SpanCategory::TempBasal),
            "activity" => Some(SpanCategory::Activity),
            "override" => Some(SpanCategory::Override),
            "basal-delivery" => Some(SpanCategory::BasalDelivery),
            "data-exclusion" => Some(SpanCategory::DataExclusion),
            _ => None,
        }
    }

    /// 未结束区间参与时长计算时替代的默认时长（毫秒）。
    ///
    /// BasalDelivery 固定为一个输注节拍（5 分钟）。
    pub fn default_span_ms(&self) -> i64 {
        match self {
            SpanCategory::TempBasal => 30 * 60_000,
            SpanCategory::Activity => 30 * 60_000,
            SpanCategory::Override => 60 * 60_000,
            SpanCategory::BasalDelivery => 5 * 60_000,
            SpanCategory::DataExclusion => 5 * 60_000,
        }
    }
}

/// 状态区间记录。
///
/// `end_mills` 为 None 表示区间仍在进行中。
/// `original_id` 是生产方分配的自然键，与系统分配的 `span_id` 不同，
/// 用于幂等 upsert（同步窗口可被连接器无限重放）。
#[derive(Debug, Clone)]
pub struct StateSpan {
    pub span_id: String,
    pub category: SpanCategory,
    pub state: String,
    pub start_mills: i64,
    pub end_mills: Option<i64>,
    pub source: String,
    pub original_id: Option<String>,
    pub metadata: SpanMetadata,
}

impl StateSpan {
    /// 区间是否仍在进行中。
    pub fn is_ongoing(&self) -> bool {
        self.end_mills.is_none()
    }

    /// 结束时间；未结束区间按类别默认时长折算。
    pub fn effective_end_mills(&self) -> i64 {
        self.end_mills
            .unwrap_or_else(|| self.start_mills + self.category.default_span_ms())
    }

    /// 区间长度（毫秒），未结束区间按类别默认时长折算。
    pub fn effective_duration_ms(&self) -> i64 {
        (self.effective_end_mills() - self.start_mills).max(0)
    }

    /// 是否与 `[from, to]` 重叠（端点含）；未结束区间视为延伸到 to。
    pub fn overlaps(&self, from: i64, to: i64) -> bool {
        let end = self.end_mills.unwrap_or(i64::MAX);
        end >= from && self.start_mills <= to
    }
}
