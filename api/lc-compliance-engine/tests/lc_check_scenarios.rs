use axum::body::{to_bytes, Body};
use http::Request;
use lc_compliance_engine::app::{build_router, AppState};
use lc_compliance_engine::config::environment::AppConfig;
use lc_compliance_engine::module::lc_check::model::{
    DocumentSubmission, DocumentType, FieldValue, LcTerms, Severity, Verdict,
};
use lc_compliance_engine::module::lc_check::schema::{
    ErrorBody, SubmitCheckRequest, SubmitCheckResponse,
};
use std::collections::BTreeMap;
use tower::util::ServiceExt;

fn test_config() -> AppConfig {
    AppConfig {
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
    }
}

fn base_terms() -> LcTerms {
    LcTerms {
        lc_reference: "LC-2026-0042".to_string(),
        beneficiary_name: "Golden Harvest Exports Ltd".to_string(),
        applicant_name: Some("Baltic Foods GmbH".to_string()),
        goods_description: Some("premium basmati rice".to_string()),
        hs_code: Some("1006.30".to_string()),
        quantity: Some(FieldValue::Number(25000.0)),
        quantity_unit: Some("kg".to_string()),
        unit_price: None,
        currency: "USD".to_string(),
        total_amount: FieldValue::Number(30000.0),
        country_of_origin: Some("India".to_string()),
        port_of_loading: Some("Mundra".to_string()),
        port_of_discharge: Some("Hamburg".to_string()),
        latest_shipment_date: Some("2026-06-30".to_string()),
        lc_expiry_date: Some("2026-07-21".to_string()),
        incoterms: Some("FOB".to_string()),
        partial_shipment_allowed: Some(false),
        transhipment_allowed: Some(false),
        issuing_bank: Some("DEUTDEFF".to_string()),
        advising_bank: None,
    }
}

fn invoice(fields: &[(&str, FieldValue)]) -> DocumentSubmission {
    document(DocumentType::CommercialInvoice, fields)
}

fn document(doc_type: DocumentType, fields: &[(&str, FieldValue)]) -> DocumentSubmission {
    let mut map = BTreeMap::new();
    for (name, value) in fields {
        map.insert((*name).to_string(), value.clone());
    }
    DocumentSubmission {
        doc_type,
        fields: map,
    }
}

fn text(s: &str) -> FieldValue {
    FieldValue::Text(s.to_string())
}

fn submit_request(documents: Vec<DocumentSubmission>) -> SubmitCheckRequest {
    SubmitCheckRequest {
        source_lookup_id: "lookup-001".to_string(),
        session_id: None,
        request_id: None,
        payment_authorized: false,
        trade_context: None,
        terms: base_terms(),
        documents,
    }
}

async fn post_check(request: &SubmitCheckRequest) -> (http::StatusCode, Vec<u8>) {
    let app = build_router(AppState::new(test_config(), None));
    let http_req = Request::builder()
        .method("POST")
        .uri("/v1/lc/checks")
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(request).expect("serialize")))
        .expect("build request");
    let http_resp = app.oneshot(http_req).await.expect("response");
    let status = http_resp.status();
    let body = to_bytes(http_resp.into_body(), usize::MAX)
        .await
        .expect("read body");
    (status, body.to_vec())
}

#[tokio::test]
async fn matching_invoice_is_compliant() {
    let request = submit_request(vec![invoice(&[
        ("beneficiaryName", text("Golden Harvest Exports Ltd")),
        ("goodsDescription", text("premium basmati rice")),
        ("totalAmount", text("30000")),
        ("currency", text("USD")),
        ("quantity", text("25000")),
    ])]);

    let (status, body) = post_check(&request).await;
    assert_eq!(status, http::StatusCode::OK);
    let parsed: SubmitCheckResponse = serde_json::from_slice(&body).expect("parse body");

    assert_eq!(parsed.verdict, Verdict::Compliant);
    assert_eq!(parsed.summary.red, 0);
    assert_eq!(parsed.summary.amber, 0);
    assert!(parsed.summary.green >= 4);
    assert!(!parsed.integrity_hash.is_empty());
    assert!(parsed.check_id.starts_with("chk_"));
    assert!(!parsed.persisted);
    assert_eq!(parsed.recheck_number, 0);
}

#[tokio::test]
async fn quantity_beyond_tolerance_is_a_discrepancy() {
    let request = submit_request(vec![invoice(&[
        ("beneficiaryName", text("Golden Harvest Exports Ltd")),
        ("goodsDescription", text("premium basmati rice")),
        ("totalAmount", text("30000")),
        ("currency", text("USD")),
        ("quantity", text("24000")),
    ])]);

    let (status, body) = post_check(&request).await;
    assert_eq!(status, http::StatusCode::OK);
    let parsed: SubmitCheckResponse = serde_json::from_slice(&body).expect("parse body");

    assert_eq!(parsed.verdict, Verdict::DiscrepanciesFound);
    let quantity_row = parsed
        .results
        .iter()
        .find(|row| row.field_name == "quantity")
        .expect("quantity row");
    assert_eq!(quantity_row.severity, Severity::Red);
    assert!(quantity_row.explanation.contains("beyond"));
}

#[tokio::test]
async fn missing_shipped_on_board_date_is_a_red_row() {
    let request = submit_request(vec![document(
        DocumentType::BillOfLading,
        &[
            ("portOfLoading", text("Mundra")),
            ("portOfDischarge", text("Hamburg")),
        ],
    )]);

    let (status, body) = post_check(&request).await;
    assert_eq!(status, http::StatusCode::OK);
    let parsed: SubmitCheckResponse = serde_json::from_slice(&body).expect("parse body");

    assert_eq!(parsed.verdict, Verdict::DiscrepanciesFound);
    let date_row = parsed
        .results
        .iter()
        .find(|row| row.field_name == "shippedOnBoardDate")
        .expect("shippedOnBoardDate row");
    assert_eq!(date_row.severity, Severity::Red);
    assert!(date_row.explanation.contains("missing"));
}

#[tokio::test]
async fn late_shipment_date_is_a_discrepancy() {
    let request = submit_request(vec![document(
        DocumentType::BillOfLading,
        &[
            ("shippedOnBoardDate", text("2026-07-05")),
            ("portOfLoading", text("Mundra")),
            ("portOfDischarge", text("Hamburg")),
        ],
    )]);

    let (_, body) = post_check(&request).await;
    let parsed: SubmitCheckResponse = serde_json::from_slice(&body).expect("parse body");

    assert_eq!(parsed.verdict, Verdict::DiscrepanciesFound);
    let date_row = parsed
        .results
        .iter()
        .find(|row| row.field_name == "shippedOnBoardDate")
        .expect("shippedOnBoardDate row");
    assert_eq!(date_row.severity, Severity::Red);
    assert!(date_row.explanation.contains("after the deadline"));
    assert_eq!(date_row.ucp_rule_ref.as_deref(), Some("UCP600 Art.20(a)(ii)"));
}

#[tokio::test]
async fn unit_alias_downgrades_to_notes_only() {
    let request = submit_request(vec![invoice(&[
        ("beneficiaryName", text("Golden Harvest Exports Ltd")),
        ("goodsDescription", text("premium basmati rice")),
        ("totalAmount", text("30000")),
        ("currency", text("USD")),
        ("quantityUnit", text("KGS")),
    ])]);

    let (_, body) = post_check(&request).await;
    let parsed: SubmitCheckResponse = serde_json::from_slice(&body).expect("parse body");

    assert_eq!(parsed.verdict, Verdict::CompliantWithNotes);
    assert_eq!(parsed.summary.red, 0);
    assert_eq!(parsed.summary.amber, 1);
}

#[tokio::test]
async fn identical_submissions_hash_identically() {
    let request = submit_request(vec![invoice(&[
        ("beneficiaryName", text("Golden Harvest Exports Ltd")),
        ("goodsDescription", text("premium basmati rice")),
        ("totalAmount", text("30000")),
        ("currency", text("USD")),
    ])]);

    let (_, first_body) = post_check(&request).await;
    let (_, second_body) = post_check(&request).await;
    let first: SubmitCheckResponse = serde_json::from_slice(&first_body).expect("parse body");
    let second: SubmitCheckResponse = serde_json::from_slice(&second_body).expect("parse body");

    assert_eq!(first.integrity_hash, second.integrity_hash);
    assert_eq!(first.check_id, second.check_id);
    assert_eq!(first.summary.verdict, second.summary.verdict);
    assert_eq!(first.results.len(), second.results.len());
}

#[tokio::test]
async fn empty_document_set_is_rejected_before_matching() {
    let request = submit_request(vec![]);

    let (status, body) = post_check(&request).await;
    assert_eq!(status, http::StatusCode::BAD_REQUEST);
    let parsed: ErrorBody = serde_json::from_slice(&body).expect("parse body");
    assert_eq!(parsed.error_code, "EMPTY_DOCUMENT_SET");
}

#[tokio::test]
async fn blank_lc_terms_are_rejected_before_matching() {
    let mut request = submit_request(vec![invoice(&[("totalAmount", text("30000"))])]);
    request.terms.beneficiary_name = " ".to_string();

    let (status, body) = post_check(&request).await;
    assert_eq!(status, http::StatusCode::BAD_REQUEST);
    let parsed: ErrorBody = serde_json::from_slice(&body).expect("parse body");
    assert_eq!(parsed.error_code, "INVALID_BENEFICIARY");
}
