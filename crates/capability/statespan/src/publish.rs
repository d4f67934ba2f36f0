//! 区间变更事件发布。
//!
//! 发布语义是至少一次、尽力而为：服务在每次成功变更后调用发布器，
//! 发布失败只记录计数和日志，不影响写路径的结果。实际的广播扇出
//! 在本引擎之外。

use async_trait::async_trait;
use domain::StateSpan;

/// 区间变更事件。
#[derive(Debug, Clone)]
pub enum SpanEvent {
    Upserted(StateSpan),
    Deleted { span_id: String },
}

/// 发布错误。
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("publish failed: {0}")]
    Failed(String),
}

/// 区间事件发布抽象。
#[async_trait]
pub trait SpanEventPublisher: Send + Sync {
    async fn publish(&self, event: SpanEvent) -> Result<(), PublishError>;
}

/// 空发布器（用于接线与测试）。
#[derive(Debug, Default)]
pub struct NoopPublisher;

#[async_trait]
impl SpanEventPublisher for NoopPublisher {
    async fn publish(&self, _event: SpanEvent) -> Result<(), PublishError> {
        Ok(())
    }
}
