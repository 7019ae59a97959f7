use super::model::{
    AuditEventPayload, AuditEventRecord, CaseStatus, CheckHistoryEntry, CheckResultItem,
    CorrectionChannel, CorrectionRequestEntry, DocumentSubmission, DocumentType, FieldValue,
    LcCheckSummary, LcTerms, Severity, Verdict,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitCheckRequest {
    pub source_lookup_id: String,
    pub session_id: Option<String>,
    /// Optional idempotency key; with Redis configured, a replayed key
    /// returns the original check instead of running a duplicate.
    pub request_id: Option<String>,
    /// Billing collaborator's assertion that a paid re-check was authorized.
    #[serde(default)]
    pub payment_authorized: bool,
    pub trade_context: Option<TradeContext>,
    pub terms: LcTerms,
    pub documents: Vec<DocumentSubmission>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeContext {
    pub commodity_name: String,
    pub origin_name: String,
    pub destination_name: String,
    pub readiness_score: Option<u16>,
    pub readiness_verdict: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitCheckResponse {
    pub check_id: String,
    pub case_id: Option<String>,
    pub case_status: Option<CaseStatus>,
    pub recheck_number: u32,
    pub verdict: Verdict,
    pub summary: LcCheckSummary,
    pub results: Vec<CheckResultItem>,
    pub integrity_hash: String,
    pub public_ref: Option<String>,
    pub persisted: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckSnapshot {
    pub check_id: String,
    pub recheck_number: u32,
    pub summary: LcCheckSummary,
    pub results: Vec<CheckResultItem>,
}

/// "Initial vs latest" row for one field that opened AMBER or RED.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonRow {
    pub field_name: String,
    pub document_type: DocumentType,
    pub lc_value: Option<FieldValue>,
    pub initial_severity: Severity,
    pub initial_value: Option<FieldValue>,
    pub latest_severity: Option<Severity>,
    pub latest_value: Option<FieldValue>,
    pub resolution: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseViewResponse {
    pub case_id: String,
    pub status: CaseStatus,
    pub lc_reference: String,
    pub beneficiary_name: String,
    pub recheck_count: u32,
    pub max_free_rechecks: u32,
    pub initial_check: Option<CheckSnapshot>,
    pub latest_check: Option<CheckSnapshot>,
    pub check_history: Vec<CheckHistoryEntry>,
    pub correction_requests: Vec<CorrectionRequestEntry>,
    pub comparison: Vec<ComparisonRow>,
    pub chain_valid: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogCorrectionRequest {
    pub channel: CorrectionChannel,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogCorrectionResponse {
    pub case_id: String,
    pub status: CaseStatus,
    pub channel: CorrectionChannel,
    pub discrepancy_count: usize,
    pub sent_at: i64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CloseCaseResponse {
    pub case_id: String,
    pub status: CaseStatus,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppendEventRequest {
    pub session_id: Option<String>,
    #[serde(flatten)]
    pub payload: AuditEventPayload,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainViewResponse {
    pub valid: bool,
    pub broken_at: Option<usize>,
    pub reason: Option<String>,
    pub events: Vec<AuditEventRecord>,
}

/// Public verification shape. Keyed by the opaque `public_ref`; never
/// carries the internal lookup id.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicVerificationResponse {
    pub commodity_name: String,
    pub origin_name: String,
    pub destination_name: String,
    #[serde(rename = "ref")]
    pub public_ref: String,
    pub hash: String,
    pub locked_at: i64,
    pub readiness_score: Option<u16>,
    pub readiness_verdict: Option<String>,
    pub chain_valid: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub persistence_enabled: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub error_code: String,
    pub reason: String,
}
