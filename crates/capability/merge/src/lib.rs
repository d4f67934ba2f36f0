//! 双存储合并分页：原生平面记录 + 区间派生记录。
//!
//! 合并协调器把两个互不知晓的来源拼成一个按时间排序、可分页的
//! 遗留记录列表：
//! 1. 把调用方的时间过滤解析为两侧都能用的 `TimeRange`
//! 2. 原生一侧与派生一侧各取满 `skip + limit` 条（合并边界处不分页）
//! 3. 拼接后按 mills 降序重排（同一时间戳按记录 id 升序决出
//!    确定性次序），再对合并序列应用 skip / take
//!
//! 任一侧取不满深度都可能把另一侧更新的记录挤出窗口，所以即使
//! 单侧足以凑满 limit 也必须两侧都取。
//!
//! 一致性契约：两个存储之间没有跨库事务。只要两次调用之间没有
//! 写入，翻页看到的是全局时间一致的次序；与并发写之间是尽力而为
//! 的弱一致读，调用方可能观察到刚被删除的记录。

use api_contract::TreatmentRecord;
use async_trait::async_trait;
use domain::SpanCategory;
use gms_statespan::StateSpanService;
use gms_storage::{TimeOrder, TreatmentQueryOptions, TreatmentStore};
use std::sync::Arc;

/// 合并层错误。
#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    /// 时间过滤本身非法（from > to），属被拒绝的输入。
    #[error("invalid range: {0}")]
    InvalidRange(String),
    /// 任一来源的瞬时失败，向上传播，由调用方决定重试。
    #[error("source error: {0}")]
    Source(String),
}

/// 查询时间窗口（端点含，epoch 毫秒）。
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeRange {
    pub from_ms: Option<i64>,
    pub to_ms: Option<i64>,
}

impl TimeRange {
    /// 解析并校验窗口；同时给出 from/to 时要求 from <= to。
    pub fn new(from_ms: Option<i64>, to_ms: Option<i64>) -> Result<Self, MergeError> {
        if let (Some(from), Some(to)) = (from_ms, to_ms) {
            if from > to {
                return Err(MergeError::InvalidRange(format!("{from} > {to}")));
            }
        }
        Ok(Self { from_ms, to_ms })
    }
}

/// 区间派生记录源抽象。
///
/// 合并协调器不关心派生记录怎么来，只要求按窗口与类别产出
/// 遗留形状的记录。
#[async_trait]
pub trait SyntheticTreatmentSource: Send + Sync {
    async fn query_synthetic(
        &self,
        category: SpanCategory,
        range: TimeRange,
        limit: i64,
    ) -> Result<Vec<TreatmentRecord>, MergeError>;
}

/// 基于 StateSpan 服务的派生记录源。
#[derive(Clone)]
pub struct SpanTreatmentSource {
    service: StateSpanService,
}

impl SpanTreatmentSource {
    pub fn new(service: StateSpanService) -> Self {
        Self { service }
    }
}

#[async_trait]
impl SyntheticTreatmentSource for SpanTreatmentSource {
    async fn query_synthetic(
        &self,
        category: SpanCategory,
        range: TimeRange,
        limit: i64,
    ) -> Result<Vec<TreatmentRecord>, MergeError> {
        self.service
            .get_rendered_treatments(category, range.from_ms, range.to_ms, limit, 0)
            .await
            .map_err(|err| MergeError::Source(err.to_string()))
    }
}

fn record_id(record: &TreatmentRecord) -> &str {
    record.id.as_deref().unwrap_or("")
}

/// 合并两个各自按 mills 降序的列表并重新分页（纯函数）。
///
/// 结果等价于对两列表并集整体降序排序后切片 `[skip, skip+limit)`。
pub fn merge_treatments(
    native: Vec<TreatmentRecord>,
    synthetic: Vec<TreatmentRecord>,
    skip: i64,
    limit: i64,
) -> Vec<TreatmentRecord> {
    let mut merged = native;
    merged.extend(synthetic);
    merged.sort_by(|a, b| {
        b.mills
            .cmp(&a.mills)
            .then_with(|| record_id(a).cmp(record_id(b)))
    });

    let skip = skip.max(0) as usize;
    let mut items: Vec<TreatmentRecord> = merged.into_iter().skip(skip).collect();
    if limit > 0 {
        items.truncate(limit as usize);
    }
    items
}

/// 合并协调器。
#[derive(Clone)]
pub struct TreatmentMergeService {
    natives: Arc<dyn TreatmentStore>,
    synthetics: Arc<dyn SyntheticTreatmentSource>,
    spans: StateSpanService,
}

impl TreatmentMergeService {
    pub fn new(natives: Arc<dyn TreatmentStore>, spans: StateSpanService) -> Self {
        Self {
            synthetics: Arc::new(SpanTreatmentSource::new(spans.clone())),
            natives,
            spans,
        }
    }

    /// 单类别合并查询。
    ///
    /// 两侧各取满 `skip + limit` 条再合并，分页只在合并之后发生。
    pub async fn query_merged(
        &self,
        category: SpanCategory,
        range: TimeRange,
        limit: i64,
        skip: i64,
    ) -> Result<Vec<TreatmentRecord>, MergeError> {
        gms_telemetry::record_merge_query();
        let depth = limit.max(0) + skip.max(0);

        let native = self
            .natives
            .query_treatments(TreatmentQueryOptions {
                event_type: gms_mapper::legacy_event_type(category).map(str::to_string),
                from_ms: range.from_ms,
                to_ms: range.to_ms,
                order: TimeOrder::Desc,
                limit: depth,
                skip: 0,
            })
            .await
            .map_err(|err| MergeError::Source(err.to_string()))?;

        let synthetic = self
            .synthetics
            .query_synthetic(category, range, depth)
            .await?;

        Ok(merge_treatments(native, synthetic, skip, limit))
    }

    /// 删除原生记录并级联删除由它派生的区间。
    ///
    /// original_id 等于该记录 id 的区间视为由它产生；自然键按类别
    /// 隔离，所以逐类别穷尽检查。返回是否删除了任何东西。
    pub async fn remove_treatment(&self, id: &str) -> Result<bool, MergeError> {
        let existed = self
            .natives
            .delete_treatment(id)
            .await
            .map_err(|err| MergeError::Source(err.to_string()))?;

        let mut cascaded = 0u64;
        for category in SpanCategory::ALL {
            let span = self
                .spans
                .get_by_original_id(category, id)
                .await
                .map_err(|err| MergeError::Source(err.to_string()))?;
            if let Some(span) = span {
                let deleted = self
                    .spans
                    .delete_by_id(&span.span_id)
                    .await
                    .map_err(|err| MergeError::Source(err.to_string()))?;
                if deleted {
                    cascaded += 1;
                    tracing::debug!(
                        span_id = %span.span_id,
                        original_id = id,
                        "cascaded span delete"
                    );
                }
            }
        }
        if cascaded > 0 {
            gms_telemetry::record_cascade_deletes(cascaded);
        }
        Ok(existed || cascaded > 0)
    }
}
