//! 追踪与请求 ID 生成。

use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing_subscriber::{EnvFilter, fmt};

/// 请求级追踪标识。
#[derive(Debug, Clone)]
pub struct RequestIds {
    pub request_id: String,
    pub trace_id: String,
}

/// 基础指标快照。
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsSnapshot {
    pub spans_upserted: u64,
    pub spans_inserted: u64,
    pub spans_replaced: u64,
    pub spans_deleted: u64,
    pub mapping_failures: u64,
    pub synthetic_records: u64,
    pub merge_queries: u64,
    pub cascade_deletes: u64,
    pub publish_failures: u64,
}

/// 写入与合并路径的基础指标。
pub struct TelemetryMetrics {
    spans_upserted: AtomicU64,
    spans_inserted: AtomicU64,
    spans_replaced: AtomicU64,
    spans_deleted: AtomicU64,
    mapping_failures: AtomicU64,
    synthetic_records: AtomicU64,
    merge_queries: AtomicU64,
    cascade_deletes: AtomicU64,
    publish_failures: AtomicU64,
}

impl TelemetryMetrics {
    pub fn new() -> Self {
        Self {
            spans_upserted: AtomicU64::new(0),
            spans_inserted: AtomicU64::new(0),
            spans_replaced: AtomicU64::new(0),
            spans_deleted: AtomicU64::new(0),
            mapping_failures: AtomicU64::new(0),
            synthetic_records: AtomicU64::new(0),
            merge_queries: AtomicU64::new(0),
            cascade_deletes: AtomicU64::new(0),
            publish_failures: AtomicU64::new(0),
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            spans_upserted: self.spans_upserted.load(Ordering::Relaxed),
            spans_inserted: self.spans_inserted.load(Ordering::Relaxed),
            spans_replaced: self.spans_replaced.load(Ordering::Relaxed),
            spans_deleted: self.spans_deleted.load(Ordering::Relaxed),
            mapping_failures: self.mapping_failures.load(Ordering::Relaxed),
            synthetic_records: self.synthetic_records.load(Ordering::Relaxed),
            merge_queries: self.merge_queries.load(Ordering::Relaxed),
            cascade_deletes: self.cascade_deletes.load(Ordering::Relaxed),
            publish_failures: self.publish_failures.load(Ordering::Relaxed),
        }
    }
}

impl Default for TelemetryMetrics {
    fn default() -> Self {
        Self::new()
    }
}

static METRICS: OnceLock<TelemetryMetrics> = OnceLock::new();

/// 获取全局指标实例。
pub fn metrics() -> &'static TelemetryMetrics {
    METRICS.get_or_init(TelemetryMetrics::new)
}

/// 初始化 tracing（默认 info）。
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).try_init();
}

/// 生成新的 request_id 与 trace_id。
pub fn new_request_ids() -> RequestIds {
    RequestIds {
        request_id: uuid::Uuid::new_v4().to_string(),
        trace_id: uuid::Uuid::new_v4().to_string(),
    }
}

/// 记录 upsert 写入次数（含插入与替换）。
pub fn record_span_upserted() {
    metrics().spans_upserted.fetch_add(1, Ordering::Relaxed);
}

/// 记录新区间插入次数。
pub fn record_span_inserted() {
    metrics().spans_inserted.fetch_add(1, Ordering::Relaxed);
}

/// 记录自然键命中的替换次数。
pub fn record_span_replaced() {
    metrics().spans_replaced.fetch_add(1, Ordering::Relaxed);
}

/// 记录区间删除次数。
pub fn record_span_deleted() {
    metrics().spans_deleted.fetch_add(1, Ordering::Relaxed);
}

/// 记录批量渲染中跳过的坏记录次数。
pub fn record_mapping_failure() {
    metrics().mapping_failures.fetch_add(1, Ordering::Relaxed);
}

/// 记录区间派生记录产出条数。
pub fn record_synthetic_records(count: u64) {
    metrics()
        .synthetic_records
        .fetch_add(count, Ordering::Relaxed);
}

/// 记录合并查询次数。
pub fn record_merge_query() {
    metrics().merge_queries.fetch_add(1, Ordering::Relaxed);
}

/// 记录级联删除命中的区间数。
pub fn record_cascade_deletes(count: u64) {
    metrics().cascade_deletes.fetch_add(count, Ordering::Relaxed);
}

/// 记录发布失败次数（发布是尽力而为，不向上传播）。
pub fn record_publish_failure() {
    metrics().publish_failures.fetch_add(1, Ordering::Relaxed);
}
