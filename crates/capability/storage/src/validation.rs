//! 验证辅助函数
//!
//! 提供统一的验证逻辑，确保数据一致性：
//! - ensure_span_bounds：验证区间时间边界
//!
//! 使用场景：
//! - 所有区间写入路径（insert / replace / upsert）在落库前验证

use crate::error::StorageError;
use domain::StateSpan;

/// 验证区间时间边界
///
/// start_mills 必须为正；end_mills 存在时不得早于 start_mills。
pub fn ensure_span_bounds(span: &StateSpan) -> Result<(), StorageError> {
    if span.start_mills <= 0 {
        return Err(StorageError::new("start_mills required"));
    }
    if let Some(end_mills) = span.end_mills {
        if end_mills < span.start_mills {
            return Err(StorageError::new("end_mills before start_mills"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{SpanCategory, SpanMetadata};

    fn span(start_mills: i64, end_mills: Option<i64>) -> StateSpan {
        StateSpan {
            span_id: "span-1".to_string(),
            category: SpanCategory::TempBasal,
            state: String::new(),
            start_mills,
            end_mills,
            source: "test".to_string(),
            original_id: None,
            metadata: SpanMetadata::new(),
        }
    }

    #[test]
    fn accepts_ordered_bounds() {
        assert!(ensure_span_bounds(&span(1_000, Some(2_000))).is_ok());
        assert!(ensure_span_bounds(&span(1_000, None)).is_ok());
        assert!(ensure_span_bounds(&span(1_000, Some(1_000))).is_ok());
    }

    #[test]
    fn rejects_inverted_bounds() {
        let err = ensure_span_bounds(&span(2_000, Some(1_000))).expect_err("inverted");
        assert_eq!(err.to_string(), "end_mills before start_mills");
        assert!(ensure_span_bounds(&span(0, None)).is_err());
    }
}
