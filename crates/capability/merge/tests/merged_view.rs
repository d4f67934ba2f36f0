use api_contract::{TreatmentRecord, event_types};
use domain::{MetaValue, SpanCategory, SpanMetadata, StateSpan};
use gms_merge::{TimeRange, TreatmentMergeService};
use gms_statespan::StateSpanService;
use gms_storage::{InMemorySpanStore, InMemoryTreatmentStore, StateSpanStore, TreatmentStore};
use std::sync::Arc;

struct Fixture {
    natives: Arc<InMemoryTreatmentStore>,
    spans: Arc<InMemorySpanStore>,
    service: TreatmentMergeService,
    span_service: StateSpanService,
}

fn fixture() -> Fixture {
    let natives = Arc::new(InMemoryTreatmentStore::new());
    let spans = Arc::new(InMemorySpanStore::new());
    let span_service = StateSpanService::new(spans.clone());
    let service = TreatmentMergeService::new(natives.clone(), span_service.clone());
    Fixture {
        natives,
        spans,
        service,
        span_service,
    }
}

fn native_temp_basal(id: &str, mills: i64) -> TreatmentRecord {
    TreatmentRecord {
        id: Some(id.to_string()),
        mills,
        event_type: event_types::TEMP_BASAL.to_string(),
        duration: Some(30.0),
        rate: Some(1.0),
        absolute: Some(1.0),
        ..Default::default()
    }
}

fn temp_basal_span(span_id: &str, original_id: Option<&str>, start_mills: i64) -> StateSpan {
    let mut metadata = SpanMetadata::new();
    metadata.insert("rate".to_string(), MetaValue::from(0.5));
    StateSpan {
        span_id: span_id.to_string(),
        category: SpanCategory::TempBasal,
        state: String::new(),
        start_mills,
        end_mills: Some(start_mills + 1_800_000),
        source: "connector".to_string(),
        original_id: original_id.map(str::to_string),
        metadata,
    }
}

#[tokio::test]
async fn small_window_prefers_newer_synthetic_record() {
    let fx = fixture();
    fx.natives
        .insert_treatment(native_temp_basal("native-1", 100))
        .await
        .expect("native");
    fx.spans
        .insert_span(temp_basal_span("span-1", None, 200))
        .await
        .expect("span");

    let window = fx
        .service
        .query_merged(SpanCategory::TempBasal, TimeRange::default(), 1, 0)
        .await
        .expect("merge");
    assert_eq!(window.len(), 1);
    // 原生一侧单独就能凑满 limit，但更新的派生记录不能被挤掉。
    assert_eq!(window[0].id.as_deref(), Some("span-1"));
    assert_eq!(window[0].mills, 200);
}

#[tokio::test]
async fn paging_sees_one_consistent_order_across_sources() {
    let fx = fixture();
    for (id, mills) in [("native-1", 500), ("native-2", 300), ("native-3", 100)] {
        fx.natives
            .insert_treatment(native_temp_basal(id, mills))
            .await
            .expect("native");
    }
    for (id, mills) in [("span-1", 400), ("span-2", 200)] {
        fx.spans
            .insert_span(temp_basal_span(id, None, mills))
            .await
            .expect("span");
    }

    let mut collected = Vec::new();
    for page in 0..3 {
        let window = fx
            .service
            .query_merged(SpanCategory::TempBasal, TimeRange::default(), 2, page * 2)
            .await
            .expect("merge");
        collected.extend(window.into_iter().map(|record| record.mills));
    }
    assert_eq!(collected, vec![500, 400, 300, 200, 100]);
}

#[tokio::test]
async fn window_filter_applies_to_both_sources() {
    let fx = fixture();
    fx.natives
        .insert_treatment(native_temp_basal("native-1", 1_000))
        .await
        .expect("native");
    fx.natives
        .insert_treatment(native_temp_basal("native-2", 5_000))
        .await
        .expect("native");
    fx.spans
        .insert_span(temp_basal_span("span-1", None, 2_000))
        .await
        .expect("span");
    fx.spans
        .insert_span(temp_basal_span("span-2", None, 6_000))
        .await
        .expect("span");

    let range = TimeRange::new(Some(1_500), Some(5_500)).expect("range");
    let window = fx
        .service
        .query_merged(SpanCategory::TempBasal, range, 10, 0)
        .await
        .expect("merge");
    let mills: Vec<i64> = window.iter().map(|record| record.mills).collect();
    assert_eq!(mills, vec![5_000, 2_000]);
}

#[tokio::test]
async fn callers_cannot_distinguish_origin() {
    let fx = fixture();
    fx.natives
        .insert_treatment(native_temp_basal("native-1", 100))
        .await
        .expect("native");
    fx.spans
        .insert_span(temp_basal_span("span-1", None, 200))
        .await
        .expect("span");

    let window = fx
        .service
        .query_merged(SpanCategory::TempBasal, TimeRange::default(), 10, 0)
        .await
        .expect("merge");
    assert_eq!(window.len(), 2);
    for record in window {
        assert_eq!(record.event_type, event_types::TEMP_BASAL);
        assert!(record.id.is_some());
        assert!(record.rate.is_some());
        assert!(record.duration.is_some());
    }
}

#[tokio::test]
async fn removing_native_record_cascades_to_spans() {
    let fx = fixture();
    fx.natives
        .insert_treatment(native_temp_basal("shared-id", 1_000))
        .await
        .expect("native");
    // 由该记录派生的区间（original_id 指回记录 id）。
    fx.span_service
        .upsert(temp_basal_span("", Some("shared-id"), 1_000))
        .await
        .expect("span");

    assert!(fx.service.remove_treatment("shared-id").await.expect("remove"));

    let window = fx
        .service
        .query_merged(SpanCategory::TempBasal, TimeRange::default(), 10, 0)
        .await
        .expect("merge");
    assert!(window.is_empty());
    assert_eq!(fx.spans.len(), 0);
    assert_eq!(fx.natives.len(), 0);
}

#[tokio::test]
async fn removing_missing_record_reports_false() {
    let fx = fixture();
    assert!(!fx.service.remove_treatment("missing").await.expect("remove"));
}

#[tokio::test]
async fn deleted_span_disappears_from_merged_view() {
    let fx = fixture();
    let stored = fx
        .span_service
        .upsert(temp_basal_span("", Some("abc"), 1_000))
        .await
        .expect("span");

    let before = fx
        .service
        .query_merged(SpanCategory::TempBasal, TimeRange::default(), 10, 0)
        .await
        .expect("merge");
    assert_eq!(before.len(), 1);

    assert!(
        fx.span_service
            .delete_by_id(&stored.span_id)
            .await
            .expect("delete")
    );
    let after = fx
        .service
        .query_merged(SpanCategory::TempBasal, TimeRange::default(), 10, 0)
        .await
        .expect("merge");
    assert!(after.is_empty());
}
