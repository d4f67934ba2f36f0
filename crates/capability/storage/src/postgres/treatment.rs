//! Postgres 原生平面记录实现

use crate::error::StorageError;
use crate::traits::{TimeOrder, TreatmentQueryOptions, TreatmentStore};
use api_contract::TreatmentRecord;
use sqlx::{PgPool, Row};

pub struct PgTreatmentStore {
    pub pool: PgPool,
}

impl PgTreatmentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self, StorageError> {
        let pool = crate::connection::connect_pool(database_url).await?;
        Ok(Self { pool })
    }
}

const TREATMENT_COLUMNS: &str = "treatment_id, \
    (extract(epoch from ts) * 1000)::bigint as mills, \
    event_type, duration, rate, absolute, reason, notes, entered_by";

fn row_to_treatment(row: &sqlx::postgres::PgRow) -> Result<TreatmentRecord, StorageError> {
    Ok(TreatmentRecord {
        id: row.try_get("treatment_id")?,
        mills: row.try_get("mills")?,
        event_type: row.try_get("event_type")?,
        duration: row.try_get("duration")?,
        rate: row.try_get("rate")?,
        absolute: row.try_get("absolute")?,
        reason: row.try_get("reason")?,
        notes: row.try_get("notes")?,
        entered_by: row.try_get("entered_by")?,
    })
}

#[async_trait::async_trait]
impl TreatmentStore for PgTreatmentStore {
    async fn query_treatments(
        &self,
        options: TreatmentQueryOptions,
    ) -> Result<Vec<TreatmentRecord>, StorageError> {
        let order_by = match options.order {
            TimeOrder::Asc => "asc",
            TimeOrder::Desc => "desc",
        };
        let sql = format!(
            "select {TREATMENT_COLUMNS} \
             from treatment \
             where ($1 is null or event_type = $1) \
             and ($2 is null or ts >= to_timestamp($2 / 1000.0)) \
             and ($3 is null or ts <= to_timestamp($3 / 1000.0)) \
             order by ts {order_by}, treatment_id asc \
             limit $4 offset $5"
        );

        let rows = sqlx::query(&sql)
            .bind(&options.event_type)
            .bind(options.from_ms)
            .bind(options.to_ms)
            .bind((options.limit > 0).then_some(options.limit))
            .bind(options.skip.max(0))
            .fetch_all(&self.pool)
            .await?;

        let mut items = Vec::with_capacity(rows.len());
        for row in rows {
            items.push(row_to_treatment(&row)?);
        }
        Ok(items)
    }

    async fn find_treatment(&self, id: &str) -> Result<Option<TreatmentRecord>, StorageError> {
        let sql = format!("select {TREATMENT_COLUMNS} from treatment where treatment_id = $1");
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|row| row_to_treatment(&row)).transpose()
    }

    async fn insert_treatment(
        &self,
        record: TreatmentRecord,
    ) -> Result<TreatmentRecord, StorageError> {
        let Some(id) = record.id.as_deref() else {
            return Err(StorageError::new("record id required"));
        };
        sqlx::query(
            "insert into treatment \
             (treatment_id, ts, event_type, duration, rate, absolute, reason, notes, entered_by) \
             values ($1, to_timestamp($2 / 1000.0), $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(id)
        .bind(record.mills as f64)
        .bind(&record.event_type)
        .bind(record.duration)
        .bind(record.rate)
        .bind(record.absolute)
        .bind(&record.reason)
        .bind(&record.notes)
        .bind(&record.entered_by)
        .execute(&self.pool)
        .await?;
        Ok(record)
    }

    async fn delete_treatment(&self, id: &str) -> Result<bool, StorageError> {
        let result = sqlx::query("delete from treatment where treatment_id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
