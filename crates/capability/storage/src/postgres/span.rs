//! Postgres 状态区间实现
//!
//! upsert 依赖 `(category, original_id)` 上的部分唯一索引
//! （`where original_id is not null`），find-or-replace 在单条
//! `insert … on conflict do update` 语句内完成。

use crate::error::StorageError;
use crate::traits::{SpanQueryOptions, StateSpanStore, TimeOrder};
use crate::validation::ensure_span_bounds;
use domain::{SpanCategory, SpanMetadata, StateSpan};
use sqlx::{PgPool, Row};

pub struct PgSpanStore {
    pub pool: PgPool,
}

impl PgSpanStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self, StorageError> {
        let pool = crate::connection::connect_pool(database_url).await?;
        Ok(Self { pool })
    }
}

const SPAN_COLUMNS: &str = "span_id, category, state, \
    (extract(epoch from start_ts) * 1000)::bigint as start_mills, \
    (extract(epoch from end_ts) * 1000)::bigint as end_mills, \
    source, original_id, metadata::text as metadata";

fn metadata_to_blob(metadata: &SpanMetadata) -> Result<String, StorageError> {
    Ok(serde_json::to_string(metadata)?)
}

fn row_to_span(row: &sqlx::postgres::PgRow) -> Result<StateSpan, StorageError> {
    let category: String = row.try_get("category")?;
    let category = SpanCategory::parse(&category)
        .ok_or_else(|| StorageError::new(format!("unknown category: {category}")))?;
    let metadata: Option<String> = row.try_get("metadata")?;
    let metadata = match metadata {
        Some(blob) => serde_json::from_str(&blob)?,
        None => SpanMetadata::new(),
    };
    Ok(StateSpan {
        span_id: row.try_get("span_id")?,
        category,
        state: row.try_get("state")?,
        start_mills: row.try_get("start_mills")?,
        end_mills: row.try_get("end_mills")?,
        source: row.try_get("source")?,
        original_id: row.try_get("original_id")?,
        metadata,
    })
}

#[async_trait::async_trait]
impl StateSpanStore for PgSpanStore {
    async fn query_spans(
        &self,
        options: SpanQueryOptions,
    ) -> Result<Vec<StateSpan>, StorageError> {
        let order_by = match options.order {
            TimeOrder::Asc => "asc",
            TimeOrder::Desc => "desc",
        };
        let window_predicate = if options.active {
            "and (end_ts is null \
              or (($4 is null or end_ts >= to_timestamp($4 / 1000.0)) \
              and ($5 is null or start_ts <= to_timestamp($5 / 1000.0))))"
        } else {
            "and ($4 is null or start_ts >= to_timestamp($4 / 1000.0)) \
             and ($5 is null or start_ts <= to_timestamp($5 / 1000.0))"
        };
        let sql = format!(
            "select {SPAN_COLUMNS} \
             from state_span \
             where ($1 is null or category = $1) \
             and ($2 is null or state = $2) \
             and ($3 is null or source = $3) \
             {window_predicate} \
             order by start_ts {order_by}, span_id asc \
             limit $6 offset $7"
        );

        let rows = sqlx::query(&sql)
            .bind(options.category.map(|category| category.as_str()))
            .bind(&options.state)
            .bind(&options.source)
            .bind(options.from_ms)
            .bind(options.to_ms)
            .bind((options.limit > 0).then_some(options.limit))
            .bind(options.skip.max(0))
            .fetch_all(&self.pool)
            .await?;

        let mut items = Vec::with_capacity(rows.len());
        for row in rows {
            items.push(row_to_span(&row)?);
        }
        Ok(items)
    }

    async fn find_span(&self, span_id: &str) -> Result<Option<StateSpan>, StorageError> {
        let sql = format!("select {SPAN_COLUMNS} from state_span where span_id = $1");
        let row = sqlx::query(&sql)
            .bind(span_id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|row| row_to_span(&row)).transpose()
    }

    async fn find_by_original_id(
        &self,
        category: SpanCategory,
        original_id: &str,
    ) -> Result<Option<StateSpan>, StorageError> {
        let sql = format!(
            "select {SPAN_COLUMNS} from state_span \
             where category = $1 and original_id = $2"
        );
        let row = sqlx::query(&sql)
            .bind(category.as_str())
            .bind(original_id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|row| row_to_span(&row)).transpose()
    }

    async fn insert_span(&self, span: StateSpan) -> Result<StateSpan, StorageError> {
        ensure_span_bounds(&span)?;
        let metadata = metadata_to_blob(&span.metadata)?;
        sqlx::query(
            "insert into state_span \
             (span_id, category, state, start_ts, end_ts, source, original_id, metadata) \
             values ($1, $2, $3, to_timestamp($4 / 1000.0), to_timestamp($5 / 1000.0), \
             $6, $7, $8::jsonb)",
        )
        .bind(&span.span_id)
        .bind(span.category.as_str())
        .bind(&span.state)
        .bind(span.start_mills as f64)
        .bind(span.end_mills.map(|end_mills| end_mills as f64))
        .bind(&span.source)
        .bind(&span.original_id)
        .bind(metadata)
        .execute(&self.pool)
        .await?;
        Ok(span)
    }

    async fn replace_span(
        &self,
        span_id: &str,
        span: StateSpan,
    ) -> Result<Option<StateSpan>, StorageError> {
        ensure_span_bounds(&span)?;
        let metadata = metadata_to_blob(&span.metadata)?;
        let sql = format!(
            "update state_span set category = $2, state = $3, \
             start_ts = to_timestamp($4 / 1000.0), end_ts = to_timestamp($5 / 1000.0), \
             source = $6, original_id = $7, metadata = $8::jsonb \
             where span_id = $1 \
             returning {SPAN_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(span_id)
            .bind(span.category.as_str())
            .bind(&span.state)
            .bind(span.start_mills as f64)
            .bind(span.end_mills.map(|end_mills| end_mills as f64))
            .bind(&span.source)
            .bind(&span.original_id)
            .bind(metadata)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|row| row_to_span(&row)).transpose()
    }

    async fn delete_span(&self, span_id: &str) -> Result<bool, StorageError> {
        let result = sqlx::query("delete from state_span where span_id = $1")
            .bind(span_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn upsert_span(&self, span: StateSpan) -> Result<StateSpan, StorageError> {
        ensure_span_bounds(&span)?;
        let metadata = metadata_to_blob(&span.metadata)?;
        let sql = format!(
            "insert into state_span \
             (span_id, category, state, start_ts, end_ts, source, original_id, metadata) \
             values ($1, $2, $3, to_timestamp($4 / 1000.0), to_timestamp($5 / 1000.0), \
             $6, $7, $8::jsonb) \
             on conflict (category, original_id) where original_id is not null \
             do update set state = excluded.state, start_ts = excluded.start_ts, \
             end_ts = excluded.end_ts, source = excluded.source, metadata = excluded.metadata \
             returning {SPAN_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(&span.span_id)
            .bind(span.category.as_str())
            .bind(&span.state)
            .bind(span.start_mills as f64)
            .bind(span.end_mills.map(|end_mills| end_mills as f64))
            .bind(&span.source)
            .bind(&span.original_id)
            .bind(metadata)
            .fetch_one(&self.pool)
            .await?;
        row_to_span(&row)
    }
}
