use domain::{MetaValue, SpanCategory, SpanMetadata, StateSpan};
use gms_storage::{InMemorySpanStore, SpanQueryOptions, StateSpanStore, TimeOrder};

fn sample_span(
    span_id: &str,
    category: SpanCategory,
    start_mills: i64,
    end_mills: Option<i64>,
) -> StateSpan {
    StateSpan {
        span_id: span_id.to_string(),
        category,
        state: String::new(),
        start_mills,
        end_mills,
        source: "pump".to_string(),
        original_id: None,
        metadata: SpanMetadata::new(),
    }
}

#[tokio::test]
async fn query_filters_are_combined() {
    let store = InMemorySpanStore::new();
    store
        .insert_span(sample_span(
            "a",
            SpanCategory::TempBasal,
            1_000,
            Some(2_000),
        ))
        .await
        .expect("insert");
    store
        .insert_span(sample_span("b", SpanCategory::Activity, 1_500, Some(2_500)))
        .await
        .expect("insert");
    let mut exclusion = sample_span("c", SpanCategory::DataExclusion, 1_200, None);
    exclusion.state = "CompressionLow".to_string();
    exclusion.source = "cgm".to_string();
    store.insert_span(exclusion).await.expect("insert");

    let items = store
        .query_spans(SpanQueryOptions {
            category: Some(SpanCategory::TempBasal),
            ..Default::default()
        })
        .await
        .expect("query");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].span_id, "a");

    let items = store
        .query_spans(SpanQueryOptions {
            state: Some("CompressionLow".to_string()),
            source: Some("cgm".to_string()),
            ..Default::default()
        })
        .await
        .expect("query");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].span_id, "c");

    let items = store
        .query_spans(SpanQueryOptions {
            state: Some("CompressionLow".to_string()),
            source: Some("pump".to_string()),
            ..Default::default()
        })
        .await
        .expect("query");
    assert!(items.is_empty());
}

#[tokio::test]
async fn query_window_bounds_start_mills() {
    let store = InMemorySpanStore::new();
    for (span_id, start_mills) in [("a", 1_000), ("b", 2_000), ("c", 3_000)] {
        store
            .insert_span(sample_span(
                span_id,
                SpanCategory::BasalDelivery,
                start_mills,
                Some(start_mills + 100),
            ))
            .await
            .expect("insert");
    }

    let items = store
        .query_spans(SpanQueryOptions {
            from_ms: Some(1_500),
            to_ms: Some(2_500),
            ..Default::default()
        })
        .await
        .expect("query");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].span_id, "b");
}

#[tokio::test]
async fn active_selects_open_or_overlapping() {
    let store = InMemorySpanStore::new();
    // 已结束且窗口之前。
    store
        .insert_span(sample_span("old", SpanCategory::Override, 500, Some(900)))
        .await
        .expect("insert");
    // 跨窗口边界。
    store
        .insert_span(sample_span(
            "crossing",
            SpanCategory::Override,
            800,
            Some(1_500),
        ))
        .await
        .expect("insert");
    // 进行中。
    store
        .insert_span(sample_span("open", SpanCategory::Override, 600, None))
        .await
        .expect("insert");

    let items = store
        .query_spans(SpanQueryOptions {
            active: true,
            from_ms: Some(1_000),
            to_ms: Some(2_000),
            ..Default::default()
        })
        .await
        .expect("query");
    let ids: Vec<&str> = items.iter().map(|span| span.span_id.as_str()).collect();
    assert!(ids.contains(&"crossing"));
    assert!(ids.contains(&"open"));
    assert!(!ids.contains(&"old"));
}

#[tokio::test]
async fn query_orders_most_recent_first_and_paginates() {
    let store = InMemorySpanStore::new();
    for (span_id, start_mills) in [("a", 1_000), ("b", 3_000), ("c", 2_000), ("d", 4_000)] {
        store
            .insert_span(sample_span(
                span_id,
                SpanCategory::TempBasal,
                start_mills,
                None,
            ))
            .await
            .expect("insert");
    }

    let items = store
        .query_spans(SpanQueryOptions {
            limit: 2,
            skip: 1,
            ..Default::default()
        })
        .await
        .expect("query");
    let ids: Vec<&str> = items.iter().map(|span| span.span_id.as_str()).collect();
    assert_eq!(ids, vec!["b", "c"]);

    let items = store
        .query_spans(SpanQueryOptions {
            order: TimeOrder::Asc,
            limit: 2,
            skip: 0,
            ..Default::default()
        })
        .await
        .expect("query");
    let ids: Vec<&str> = items.iter().map(|span| span.span_id.as_str()).collect();
    assert_eq!(ids, vec!["a", "c"]);
}

#[tokio::test]
async fn not_found_is_a_normal_result() {
    let store = InMemorySpanStore::new();
    assert!(store.find_span("missing").await.expect("find").is_none());
    assert!(!store.delete_span("missing").await.expect("delete"));
    let replaced = store
        .replace_span(
            "missing",
            sample_span("missing", SpanCategory::Activity, 1_000, None),
        )
        .await
        .expect("replace");
    assert!(replaced.is_none());
}

#[tokio::test]
async fn insert_rejects_inverted_bounds() {
    let store = InMemorySpanStore::new();
    let err = store
        .insert_span(sample_span("bad", SpanCategory::TempBasal, 2_000, Some(1_000)))
        .await
        .expect_err("inverted bounds");
    assert_eq!(err.to_string(), "end_mills before start_mills");
    assert_eq!(store.len(), 0);
}

#[tokio::test]
async fn delete_leaves_no_artifact() {
    let store = InMemorySpanStore::new();
    let mut span = sample_span("gone", SpanCategory::TempBasal, 1_000, Some(2_000));
    span.metadata
        .insert("rate".to_string(), MetaValue::from(0.5));
    store.insert_span(span).await.expect("insert");

    assert!(store.delete_span("gone").await.expect("delete"));
    assert!(store.find_span("gone").await.expect("find").is_none());
    let items = store
        .query_spans(SpanQueryOptions::default())
        .await
        .expect("query");
    assert!(items.is_empty());
}
