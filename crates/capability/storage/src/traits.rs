//! 存储接口 Trait 定义
//!
//! 定义两类资源存储的异步接口：
//! - StateSpanStore：状态区间存储
//! - TreatmentStore：原生平面记录存储（主存储的仓储视图）
//!
//! 设计原则：
//! - 查不到按 Ok(None) / Ok(false) 返回，不作为错误
//! - 所有接口返回 StorageError
//! - 使用 async_trait 支持动态分发
//! - 读操作与并发写之间不提供跨调用事务一致性

use crate::error::StorageError;
use api_contract::TreatmentRecord;
use async_trait::async_trait;
use domain::{SpanCategory, StateSpan};

/// 时间排序方向。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeOrder {
    Asc,
    Desc,
}

/// 区间查询选项。
///
/// 给定的谓词按 AND 组合，limit/skip 在过滤之后应用。
/// `active` 为 true 时选取进行中（end 为空）或与 `[from, to]`
/// 重叠的区间；为 false 时 from/to 约束 start_mills。
/// `limit <= 0` 表示不限制。
#[derive(Debug, Clone)]
pub struct SpanQueryOptions {
    pub category: Option<SpanCategory>,
    pub state: Option<String>,
    pub source: Option<String>,
    pub from_ms: Option<i64>,
    pub to_ms: Option<i64>,
    pub active: bool,
    pub order: TimeOrder,
    pub limit: i64,
    pub skip: i64,
}

impl Default for SpanQueryOptions {
    fn default() -> Self {
        Self {
            category: None,
            state: None,
            source: None,
            from_ms: None,
            to_ms: None,
            active: false,
            order: TimeOrder::Desc,
            limit: 100,
            skip: 0,
        }
    }
}

/// 原生记录查询选项。
#[derive(Debug, Clone)]
pub struct TreatmentQueryOptions {
    pub event_type: Option<String>,
    pub from_ms: Option<i64>,
    pub to_ms: Option<i64>,
    pub order: TimeOrder,
    pub limit: i64,
    pub skip: i64,
}

impl Default for TreatmentQueryOptions {
    fn default() -> Self {
        Self {
            event_type: None,
            from_ms: None,
            to_ms: None,
            order: TimeOrder::Desc,
            limit: 100,
            skip: 0,
        }
    }
}

/// 状态区间存储接口
///
/// 持久化的键值存储视图：一行一个区间，metadata 作为不透明
/// 序列化块保存。
#[async_trait]
pub trait StateSpanStore: Send + Sync {
    /// 条件查询区间，默认按 start_mills 最近优先排序
    async fn query_spans(&self, options: SpanQueryOptions)
    -> Result<Vec<StateSpan>, StorageError>;

    /// 按系统 id 查找区间
    async fn find_span(&self, span_id: &str) -> Result<Option<StateSpan>, StorageError>;

    /// 按自然键 (category, original_id) 查找区间
    async fn find_by_original_id(
        &self,
        category: SpanCategory,
        original_id: &str,
    ) -> Result<Option<StateSpan>, StorageError>;

    /// 插入新区间
    async fn insert_span(&self, span: StateSpan) -> Result<StateSpan, StorageError>;

    /// 整体替换指定 id 的区间（span_id 以路径为准）
    async fn replace_span(
        &self,
        span_id: &str,
        span: StateSpan,
    ) -> Result<Option<StateSpan>, StorageError>;

    /// 硬删除区间
    async fn delete_span(&self, span_id: &str) -> Result<bool, StorageError>;

    /// 按 (category, original_id) 插入或替换。
    ///
    /// 命中已有自然键时保留原 span_id 并覆盖其余字段；未命中或
    /// original_id 为空时按新区间插入。整个判定在单次存储调用内
    /// 原子完成，并发重放同一同步批次不会产生重复区间。
    async fn upsert_span(&self, span: StateSpan) -> Result<StateSpan, StorageError>;
}

/// 原生平面记录存储接口
///
/// 主存储引擎内部不在本引擎范围内，这里只暴露合并协调器需要的
/// 仓储视图。
#[async_trait]
pub trait TreatmentStore: Send + Sync {
    /// 窗口查询（按 mills 排序）
    async fn query_treatments(
        &self,
        options: TreatmentQueryOptions,
    ) -> Result<Vec<TreatmentRecord>, StorageError>;

    /// 按记录 id 查找
    async fn find_treatment(&self, id: &str) -> Result<Option<TreatmentRecord>, StorageError>;

    /// 插入记录（id 由主存储一侧分配）
    async fn insert_treatment(
        &self,
        record: TreatmentRecord,
    ) -> Result<TreatmentRecord, StorageError>;

    /// 硬删除记录
    async fn delete_treatment(&self, id: &str) -> Result<bool, StorageError>;
}
