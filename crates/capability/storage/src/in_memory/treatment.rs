//! 原生平面记录内存存储实现
//!
//! 仅用于本地测试和占位。合并协调器通过它模拟主存储的
//! 仓储视图。

use crate::error::StorageError;
use crate::traits::{TimeOrder, TreatmentQueryOptions, TreatmentStore};
use api_contract::TreatmentRecord;
use std::sync::RwLock;

/// 原生记录内存存储
pub struct InMemoryTreatmentStore {
    records: RwLock<Vec<TreatmentRecord>>,
}

impl InMemoryTreatmentStore {
    /// 创建新的原生记录存储
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
        }
    }

    /// 获取当前记录数量（用于测试）
    pub fn len(&self) -> usize {
        self.records.read().map(|v| v.len()).unwrap_or(0)
    }
}

impl Default for InMemoryTreatmentStore {
    fn default() -> Self {
        Self::new()
    }
}

fn record_id(record: &TreatmentRecord) -> &str {
    record.id.as_deref().unwrap_or("")
}

#[async_trait::async_trait]
impl TreatmentStore for InMemoryTreatmentStore {
    /// 窗口查询
    async fn query_treatments(
        &self,
        options: TreatmentQueryOptions,
    ) -> Result<Vec<TreatmentRecord>, StorageError> {
        let records = self
            .records
            .read()
            .map_err(|_| StorageError::new("lock failed"))?;
        let mut selected: Vec<TreatmentRecord> = records
            .iter()
            .filter(|record| {
                if let Some(event_type) = options.event_type.as_deref() {
                    if record.event_type != event_type {
                        return false;
                    }
                }
                if let Some(from) = options.from_ms {
                    if record.mills < from {
                        return false;
                    }
                }
                if let Some(to) = options.to_ms {
                    if record.mills > to {
                        return false;
                    }
                }
                true
            })
            .cloned()
            .collect();
        drop(records);

        match options.order {
            TimeOrder::Asc => selected.sort_by(|a, b| {
                a.mills
                    .cmp(&b.mills)
                    .then_with(|| record_id(a).cmp(record_id(b)))
            }),
            TimeOrder::Desc => selected.sort_by(|a, b| {
                b.mills
                    .cmp(&a.mills)
                    .then_with(|| record_id(a).cmp(record_id(b)))
            }),
        }

        let skip = options.skip.max(0) as usize;
        let mut items: Vec<TreatmentRecord> = selected.into_iter().skip(skip).collect();
        if options.limit > 0 {
            items.truncate(options.limit as usize);
        }
        Ok(items)
    }

    /// 按记录 id 查找
    async fn find_treatment(&self, id: &str) -> Result<Option<TreatmentRecord>, StorageError> {
        let records = self
            .records
            .read()
            .map_err(|_| StorageError::new("lock failed"))?;
        Ok(records
            .iter()
            .find(|record| record.id.as_deref() == Some(id))
            .cloned())
    }

    /// 插入记录
    async fn insert_treatment(
        &self,
        record: TreatmentRecord,
    ) -> Result<TreatmentRecord, StorageError> {
        if record.id.is_none() {
            return Err(StorageError::new("record id required"));
        }
        let mut records = self
            .records
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        if records.iter().any(|item| item.id == record.id) {
            return Err(StorageError::new("record exists"));
        }
        records.push(record.clone());
        Ok(record)
    }

    /// 硬删除记录
    async fn delete_treatment(&self, id: &str) -> Result<bool, StorageError> {
        let mut records = self
            .records
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        let before = records.len();
        records.retain(|record| record.id.as_deref() != Some(id));
        Ok(records.len() < before)
    }
}
