use axum::body::{to_bytes, Body};
use http::Request;
use lc_compliance_engine::app::{build_router, AppState};
use lc_compliance_engine::config::environment::AppConfig;
use lc_compliance_engine::module::lc_check::model::{
    AuditEventPayload, AuditEventRecord, CorrectionChannel, CorrectionSentEvent, LcCheckEvent,
    TransitEvent, Verdict,
};
use lc_compliance_engine::module::lc_check::schema::{AppendEventRequest, ErrorBody};
use lc_compliance_engine::service::chain_hash_service::{
    build_event_id, compute_event_hash, payload_parts,
};
use lc_compliance_engine::service::chain_verify_service::verify_chain;
use tower::util::ServiceExt;

fn append_in_memory(
    chain: &mut Vec<AuditEventRecord>,
    lookup_id: &str,
    payload: &AuditEventPayload,
    created_at: i64,
) {
    let (event_type, event_data) = payload_parts(payload).expect("payload parts");
    let previous_hash = chain.last().map(|e| e.event_hash.clone());
    let event_hash =
        compute_event_hash(&event_type, &event_data, created_at, previous_hash.as_deref());
    chain.push(AuditEventRecord {
        event_id: build_event_id(&event_hash),
        lookup_id: lookup_id.to_string(),
        session_id: None,
        event_type,
        event_data,
        previous_hash,
        event_hash,
        created_at,
    });
}

fn sample_chain() -> Vec<AuditEventRecord> {
    let mut chain = Vec::new();
    append_in_memory(
        &mut chain,
        "lookup-007",
        &AuditEventPayload::LcCheck(LcCheckEvent {
            check_id: "chk_0f3a9b2c4d5e6f7a8b9c0d1e".to_string(),
            verdict: Verdict::DiscrepanciesFound,
            green: 6,
            amber: 1,
            red: 2,
        }),
        1_770_000_000,
    );
    append_in_memory(
        &mut chain,
        "lookup-007",
        &AuditEventPayload::CorrectionSent(CorrectionSentEvent {
            case_id: "case_1a2b3c4d5e6f7a8b9c0d1e2f".to_string(),
            channel: CorrectionChannel::Email,
            discrepancy_count: 3,
        }),
        1_770_000_120,
    );
    append_in_memory(
        &mut chain,
        "lookup-007",
        &AuditEventPayload::Arrival(TransitEvent {
            port: "Hamburg".to_string(),
            occurred_at: 1_770_600_000,
        }),
        1_770_600_010,
    );
    chain
}

#[test]
fn appended_chain_verifies() {
    let chain = sample_chain();
    let verification = verify_chain(&chain);
    assert!(verification.valid);
    assert!(verification.broken_at.is_none());
}

#[test]
fn empty_chain_is_vacuously_valid() {
    assert!(verify_chain(&[]).valid);
}

#[test]
fn tampered_event_data_breaks_the_chain_at_that_link() {
    let mut chain = sample_chain();
    chain[1].event_data["discrepancyCount"] = serde_json::json!(0);

    let verification = verify_chain(&chain);
    assert!(!verification.valid);
    assert_eq!(verification.broken_at, Some(1));
    assert!(verification
        .reason
        .expect("reason")
        .contains("does not match recomputed"));
}

#[test]
fn relinked_previous_hash_is_detected() {
    let mut chain = sample_chain();
    // Point the last event at the genesis hash, as if the middle event had
    // been cut out.
    chain[2].previous_hash = Some(chain[0].event_hash.clone());

    let verification = verify_chain(&chain);
    assert!(!verification.valid);
    assert_eq!(verification.broken_at, Some(2));
}

#[test]
fn forged_genesis_is_detected() {
    let mut chain = sample_chain();
    chain[0].previous_hash = Some("deadbeef".repeat(8));

    let verification = verify_chain(&chain);
    assert!(!verification.valid);
    assert_eq!(verification.broken_at, Some(0));
}

#[test]
fn stored_hash_swap_is_detected() {
    let mut chain = sample_chain();
    chain[0].event_hash = "0".repeat(64);

    let verification = verify_chain(&chain);
    assert!(!verification.valid);
    // Either the first recompute or the second link must flag it first.
    assert_eq!(verification.broken_at, Some(0));
}

#[test]
fn append_request_carries_the_persisted_event_shape() {
    let raw = r#"{
        "sessionId": "sess-9",
        "eventType": "customs_cleared",
        "eventData": { "port": "Hamburg", "occurredAt": 1771000000 }
    }"#;
    let parsed: AppendEventRequest = serde_json::from_str(raw).expect("parse request");
    assert_eq!(parsed.session_id.as_deref(), Some("sess-9"));
    assert_eq!(parsed.payload.event_type(), "customs_cleared");

    let (event_type, event_data) = payload_parts(&parsed.payload).expect("payload parts");
    assert_eq!(event_type, "customs_cleared");
    assert_eq!(event_data["port"], "Hamburg");
}

#[tokio::test]
async fn chain_reads_require_persistence() {
    let config = AppConfig {
        rust_env: "test".to_string(),
        api_host: "127.0.0.1".to_string(),
        api_port: 0,
        mongodb_url: None,
        mongodb_database: None,
        redis_url: None,
        match_tolerance_pct: 0.5,
        max_free_rechecks: 2,
        chain_append_max_attempts: 5,
        idempotency_ttl_seconds: 86400,
    };
    let app = build_router(AppState::new(config, None));

    let http_req = Request::builder()
        .method("GET")
        .uri("/v1/verify/twl_0123456789abcdef01234567")
        .body(Body::empty())
        .expect("build request");
    let http_resp = app.oneshot(http_req).await.expect("response");
    assert_eq!(http_resp.status(), http::StatusCode::BAD_REQUEST);
    let body = to_bytes(http_resp.into_body(), usize::MAX)
        .await
        .expect("read body");
    let parsed: ErrorBody = serde_json::from_slice(&body).expect("parse body");
    assert_eq!(parsed.error_code, "PERSISTENCE_DISABLED");
}
