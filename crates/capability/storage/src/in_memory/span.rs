//! 状态区间内存存储实现
//!
//! 仅用于本地演示和测试。
//!
//! 功能：
//! - 区间 CRUD 与条件查询
//! - 按 (category, original_id) 的原子 upsert

use crate::error::StorageError;
use crate::traits::{SpanQueryOptions, StateSpanStore, TimeOrder};
use crate::validation::ensure_span_bounds;
use domain::{SpanCategory, StateSpan};
use std::collections::HashMap;
use std::sync::RwLock;

/// 状态区间内存存储
///
/// 使用 RwLock + HashMap 提供线程安全的内存存储，支持并发读。
pub struct InMemorySpanStore {
    spans: RwLock<HashMap<String, StateSpan>>,
}

impl InMemorySpanStore {
    /// 创建新的区间存储
    pub fn new() -> Self {
        Self {
            spans: RwLock::new(HashMap::new()),
        }
    }

    /// 获取当前区间数量（用于测试）
    pub fn len(&self) -> usize {
        self.spans.read().map(|map| map.len()).unwrap_or(0)
    }
}

impl Default for InMemorySpanStore {
    fn default() -> Self {
        Self::new()
    }
}

fn matches(span: &StateSpan, options: &SpanQueryOptions) -> bool {
    if let Some(category) = options.category {
        if span.category != category {
            return false;
        }
    }
    if let Some(state) = options.state.as_deref() {
        if span.state != state {
            return false;
        }
    }
    if let Some(source) = options.source.as_deref() {
        if span.source != source {
            return false;
        }
    }
    if options.active {
        let from = options.from_ms.unwrap_or(i64::MIN);
        let to = options.to_ms.unwrap_or(i64::MAX);
        return span.is_ongoing() || span.overlaps(from, to);
    }
    if let Some(from) = options.from_ms {
        if span.start_mills < from {
            return false;
        }
    }
    if let Some(to) = options.to_ms {
        if span.start_mills > to {
            return false;
        }
    }
    true
}

fn sort_spans(spans: &mut [StateSpan], order: TimeOrder) {
    // 同一时间戳按 span_id 升序决出确定性次序。
    match order {
        TimeOrder::Asc => spans.sort_by(|a, b| {
            a.start_mills
                .cmp(&b.start_mills)
                .then_with(|| a.span_id.cmp(&b.span_id))
        }),
        TimeOrder::Desc => spans.sort_by(|a, b| {
            b.start_mills
                .cmp(&a.start_mills)
                .then_with(|| a.span_id.cmp(&b.span_id))
        }),
    }
}

#[async_trait::async_trait]
impl StateSpanStore for InMemorySpanStore {
    /// 条件查询区间
    async fn query_spans(
        &self,
        options: SpanQueryOptions,
    ) -> Result<Vec<StateSpan>, StorageError> {
        let spans = self
            .spans
            .read()
            .map_err(|_| StorageError::new("lock failed"))?;
        let mut selected: Vec<StateSpan> = spans
            .values()
            .filter(|span| matches(span, &options))
            .cloned()
            .collect();
        drop(spans);

        sort_spans(&mut selected, options.order);

        let skip = options.skip.max(0) as usize;
        let mut items: Vec<StateSpan> = selected.into_iter().skip(skip).collect();
        if options.limit > 0 {
            items.truncate(options.limit as usize);
        }
        Ok(items)
    }

    /// 按系统 id 查找区间
    async fn find_span(&self, span_id: &str) -> Result<Option<StateSpan>, StorageError> {
        let spans = self
            .spans
            .read()
            .map_err(|_| StorageError::new("lock failed"))?;
        Ok(spans.get(span_id).cloned())
    }

    /// 按自然键查找区间
    async fn find_by_original_id(
        &self,
        category: SpanCategory,
        original_id: &str,
    ) -> Result<Option<StateSpan>, StorageError> {
        let spans = self
            .spans
            .read()
            .map_err(|_| StorageError::new("lock failed"))?;
        Ok(spans
            .values()
            .find(|span| {
                span.category == category && span.original_id.as_deref() == Some(original_id)
            })
            .cloned())
    }

    /// 插入新区间
    async fn insert_span(&self, span: StateSpan) -> Result<StateSpan, StorageError> {
        ensure_span_bounds(&span)?;
        let mut spans = self
            .spans
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        if spans.contains_key(&span.span_id) {
            return Err(StorageError::new("span exists"));
        }
        spans.insert(span.span_id.clone(), span.clone());
        Ok(span)
    }

    /// 整体替换指定 id 的区间
    async fn replace_span(
        &self,
        span_id: &str,
        span: StateSpan,
    ) -> Result<Option<StateSpan>, StorageError> {
        ensure_span_bounds(&span)?;
        let mut spans = self
            .spans
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        if !spans.contains_key(span_id) {
            return Ok(None);
        }
        let mut replaced = span;
        replaced.span_id = span_id.to_string();
        spans.insert(span_id.to_string(), replaced.clone());
        Ok(Some(replaced))
    }

    /// 硬删除区间
    async fn delete_span(&self, span_id: &str) -> Result<bool, StorageError> {
        let mut spans = self
            .spans
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        Ok(spans.remove(span_id).is_some())
    }

    /// 按 (category, original_id) 插入或替换
    ///
    /// 查找与写入在同一次写锁持有期内完成，保证并发重放下
    /// 每个自然键至多一个区间。
    async fn upsert_span(&self, span: StateSpan) -> Result<StateSpan, StorageError> {
        ensure_span_bounds(&span)?;
        let mut spans = self
            .spans
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;

        let existing_id = span.original_id.as_deref().and_then(|original_id| {
            spans
                .values()
                .find(|item| {
                    item.category == span.category
                        && item.original_id.as_deref() == Some(original_id)
                })
                .map(|item| item.span_id.clone())
        });

        let stored = match existing_id {
            Some(span_id) => {
                let mut replaced = span;
                replaced.span_id = span_id;
                replaced
            }
            None => span,
        };
        spans.insert(stored.span_id.clone(), stored.clone());
        Ok(stored)
    }
}
