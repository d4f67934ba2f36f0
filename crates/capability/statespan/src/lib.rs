//! StateSpan 服务：区间的查询、幂等写入与遗留渲染视图。
//!
//! 服务持有注入的 `StateSpanStore`，在其上编排：
//! - 条件查询 / 按 id 查询
//! - 幂等 upsert（自然键 `(category, original_id)`）
//! - 按 id 更新与硬删除
//! - 类别渲染视图：把窗口内的区间逐条映射为遗留记录，
//!   坏记录记日志后跳过，整批不失败
//! - 从遗留记录创建区间（事件类型不符时拒绝）
//!
//! 每次成功变更都会通过注入的发布器发出事件（尽力而为）。

use api_contract::TreatmentRecord;
use domain::{SpanCategory, StateSpan};
use gms_storage::{SpanQueryOptions, StateSpanStore, StorageError};
use std::sync::Arc;

pub mod publish;

pub use publish::{NoopPublisher, PublishError, SpanEvent, SpanEventPublisher};

/// StateSpan 服务错误。
#[derive(Debug, thiserror::Error)]
pub enum SpanServiceError {
    /// 遗留记录无法映射为请求的类别（被拒绝的输入，不重试）。
    #[error("invalid treatment: {0}")]
    InvalidTreatment(String),
    /// 存储不可用等瞬时失败，向上传播，由调用方决定重试。
    #[error("store error: {0}")]
    Store(String),
}

impl From<StorageError> for SpanServiceError {
    fn from(err: StorageError) -> Self {
        SpanServiceError::Store(err.to_string())
    }
}

/// StateSpan 服务。
#[derive(Clone)]
pub struct StateSpanService {
    store: Arc<dyn StateSpanStore>,
    publisher: Arc<dyn SpanEventPublisher>,
}

impl StateSpanService {
    pub fn new(store: Arc<dyn StateSpanStore>) -> Self {
        Self::with_publisher(store, Arc::new(NoopPublisher))
    }

    pub fn with_publisher(
        store: Arc<dyn StateSpanStore>,
        publisher: Arc<dyn SpanEventPublisher>,
    ) -> Self {
        Self { store, publisher }
    }

    /// 条件查询区间。
    pub async fn get_spans(
        &self,
        options: SpanQueryOptions,
    ) -> Result<Vec<StateSpan>, SpanServiceError> {
        Ok(self.store.query_spans(options).await?)
    }

    /// 按系统 id 查询；查不到返回 Ok(None)。
    pub async fn get_by_id(&self, span_id: &str) -> Result<Option<StateSpan>, SpanServiceError> {
        Ok(self.store.find_span(span_id).await?)
    }

    /// 按自然键 (category, original_id) 查询；查不到返回 Ok(None)。
    pub async fn get_by_original_id(
        &self,
        category: SpanCategory,
        original_id: &str,
    ) -> Result<Option<StateSpan>, SpanServiceError> {
        Ok(self.store.find_by_original_id(category, original_id).await?)
    }

    /// 幂等写入。
    ///
    /// span_id 为空时分配新 UUID 作为插入候选；自然键命中时存储层
    /// 保留已有 span_id 并覆盖其余字段。
    pub async fn upsert(&self, mut span: StateSpan) -> Result<StateSpan, SpanServiceError> {
        if span.span_id.is_empty() {
            span.span_id = uuid::Uuid::new_v4().to_string();
        }
        let candidate_id = span.span_id.clone();
        let stored = self.store.upsert_span(span).await?;
        gms_telemetry::record_span_upserted();
        if stored.span_id == candidate_id {
            gms_telemetry::record_span_inserted();
        } else {
            gms_telemetry::record_span_replaced();
        }
        self.publish(SpanEvent::Upserted(stored.clone())).await;
        Ok(stored)
    }

    /// 按 id 整体替换；查不到返回 Ok(None)。
    pub async fn update_by_id(
        &self,
        span_id: &str,
        span: StateSpan,
    ) -> Result<Option<StateSpan>, SpanServiceError> {
        let replaced = self.store.replace_span(span_id, span).await?;
        if let Some(stored) = replaced.as_ref() {
            self.publish(SpanEvent::Upserted(stored.clone())).await;
        }
        Ok(replaced)
    }

    /// 硬删除；返回是否存在过。
    pub async fn delete_by_id(&self, span_id: &str) -> Result<bool, SpanServiceError> {
        let existed = self.store.delete_span(span_id).await?;
        if existed {
            gms_telemetry::record_span_deleted();
            self.publish(SpanEvent::Deleted {
                span_id: span_id.to_string(),
            })
            .await;
        }
        Ok(existed)
    }

    /// 类别渲染视图：窗口内的区间映射为遗留记录。
    ///
    /// 单条映射失败（元数据损坏等）记日志后跳过，调用整体成功，
    /// 列表可能变短。
    pub async fn get_rendered_treatments(
        &self,
        category: SpanCategory,
        from_ms: Option<i64>,
        to_ms: Option<i64>,
        limit: i64,
        skip: i64,
    ) -> Result<Vec<TreatmentRecord>, SpanServiceError> {
        let spans = self
            .store
            .query_spans(SpanQueryOptions {
                category: Some(category),
                from_ms,
                to_ms,
                limit,
                skip,
                ..Default::default()
            })
            .await?;

        let mut records = Vec::with_capacity(spans.len());
        for span in spans {
            match gms_mapper::span_to_treatment(&span) {
                Some(record) => records.push(record),
                None => {
                    gms_telemetry::record_mapping_failure();
                    tracing::warn!(
                        span_id = %span.span_id,
                        category = category.as_str(),
                        "skipping span that fails to map"
                    );
                }
            }
        }
        gms_telemetry::record_synthetic_records(records.len() as u64);
        Ok(records)
    }

    /// 临时基础率渲染视图。
    pub async fn get_temp_basal_treatments(
        &self,
        from_ms: Option<i64>,
        to_ms: Option<i64>,
        limit: i64,
        skip: i64,
    ) -> Result<Vec<TreatmentRecord>, SpanServiceError> {
        self.get_rendered_treatments(SpanCategory::TempBasal, from_ms, to_ms, limit, skip)
            .await
    }

    /// 从遗留记录创建区间。
    ///
    /// 记录的事件类型不代表目标类别时返回验证错误。
    pub async fn create_from_treatment(
        &self,
        category: SpanCategory,
        record: &TreatmentRecord,
    ) -> Result<StateSpan, SpanServiceError> {
        let span = gms_mapper::treatment_to_span(category, record).ok_or_else(|| {
            SpanServiceError::InvalidTreatment(format!(
                "event type '{}' does not qualify for category {}",
                record.event_type,
                category.as_str()
            ))
        })?;
        self.upsert(span).await
    }

    async fn publish(&self, event: SpanEvent) {
        if let Err(err) = self.publisher.publish(event).await {
            gms_telemetry::record_publish_failure();
            tracing::warn!(error = %err, "span event publish failed");
        }
    }
}
