use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// One extracted document field value. The extraction collaborator emits
/// strings, numbers, and booleans; numeric strings ("30000") are common.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Flag(bool),
}

impl FieldValue {
    pub fn as_text(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    format!("{n}")
                }
            }
            Self::Flag(b) => b.to_string(),
        }
    }

    /// Numeric reading of the value. Accepts numeric strings with thousands
    /// separators ("25,000.50").
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().replace(',', "").parse::<f64>().ok(),
            Self::Flag(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Green,
    Amber,
    Red,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Green => "GREEN",
            Self::Amber => "AMBER",
            Self::Red => "RED",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    Compliant,
    CompliantWithNotes,
    DiscrepanciesFound,
}

impl Verdict {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Compliant => "COMPLIANT",
            Self::CompliantWithNotes => "COMPLIANT_WITH_NOTES",
            Self::DiscrepanciesFound => "DISCREPANCIES_FOUND",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    CommercialInvoice,
    BillOfLading,
    CertificateOfOrigin,
    PhytosanitaryCertificate,
    PackingList,
    Other,
}

impl DocumentType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CommercialInvoice => "commercial_invoice",
            Self::BillOfLading => "bill_of_lading",
            Self::CertificateOfOrigin => "certificate_of_origin",
            Self::PhytosanitaryCertificate => "phytosanitary_certificate",
            Self::PackingList => "packing_list",
            Self::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseStatus {
    Checking,
    AllClear,
    Discrepancy,
    PendingCorrection,
    Rechecking,
    Resolved,
    Closed,
}

impl CaseStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Checking => "checking",
            Self::AllClear => "all_clear",
            Self::Discrepancy => "discrepancy",
            Self::PendingCorrection => "pending_correction",
            Self::Rechecking => "rechecking",
            Self::Resolved => "resolved",
            Self::Closed => "closed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CorrectionChannel {
    Email,
    Whatsapp,
    Link,
}

impl CorrectionChannel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Whatsapp => "whatsapp",
            Self::Link => "link",
        }
    }
}

/// Buyer-declared LC terms. Snapshot semantics: once a check has run against
/// a terms value it is never edited, a corrected submission carries a fresh
/// snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LcTerms {
    pub lc_reference: String,
    pub beneficiary_name: String,
    pub applicant_name: Option<String>,
    pub goods_description: Option<String>,
    pub hs_code: Option<String>,
    pub quantity: Option<FieldValue>,
    pub quantity_unit: Option<String>,
    pub unit_price: Option<FieldValue>,
    pub currency: String,
    pub total_amount: FieldValue,
    pub country_of_origin: Option<String>,
    pub port_of_loading: Option<String>,
    pub port_of_discharge: Option<String>,
    pub latest_shipment_date: Option<String>,
    pub lc_expiry_date: Option<String>,
    pub incoterms: Option<String>,
    pub partial_shipment_allowed: Option<bool>,
    pub transhipment_allowed: Option<bool>,
    pub issuing_bank: Option<String>,
    pub advising_bank: Option<String>,
}

/// One structured document as delivered by the extraction collaborator.
/// Fields are a sorted map so canonical serialization is order-stable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSubmission {
    pub doc_type: DocumentType,
    pub fields: BTreeMap<String, FieldValue>,
}

/// One row of the discrepancy matrix. Produced fresh per check, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckResultItem {
    pub field_name: String,
    pub document_type: DocumentType,
    pub severity: Severity,
    pub lc_value: Option<FieldValue>,
    pub doc_value: Option<FieldValue>,
    pub explanation: String,
    pub ucp_rule_ref: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LcCheckSummary {
    pub verdict: Verdict,
    pub green: usize,
    pub amber: usize,
    pub red: usize,
    pub checked_at: i64,
}

/// One persisted check attempt. Immutable after insert.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LcCheckRecord {
    pub check_id: String,
    pub source_lookup_id: String,
    pub case_id: Option<String>,
    pub recheck_number: u32,
    pub terms: LcTerms,
    pub documents: Vec<DocumentSubmission>,
    pub results: Vec<CheckResultItem>,
    pub summary: LcCheckSummary,
    pub integrity_hash: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckHistoryEntry {
    pub recheck_number: u32,
    pub verdict: Verdict,
    pub summary: LcCheckSummary,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrectionRequestEntry {
    pub channel: CorrectionChannel,
    pub discrepancy_count: usize,
    pub sent_at: i64,
}

/// The mutable case aggregate for one shipment. `check_history` and
/// `correction_requests` are append-only, crud only ever pushes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LcCaseRecord {
    pub case_id: String,
    pub source_lookup_id: String,
    pub lc_reference: String,
    pub beneficiary_name: String,
    pub status: CaseStatus,
    pub recheck_count: u32,
    pub max_free_rechecks: u32,
    pub check_history: Vec<CheckHistoryEntry>,
    pub correction_requests: Vec<CorrectionRequestEntry>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// One tamper-evident log entry. Per lookup the records form a singly linked
/// hash chain: `event_hash` commits to the canonical content concatenated
/// with `previous_hash`, and `previous_hash` is the prior event's hash
/// (None only for the first event of a lookup).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEventRecord {
    pub event_id: String,
    pub lookup_id: String,
    pub session_id: Option<String>,
    pub event_type: String,
    pub event_data: Value,
    pub previous_hash: Option<String>,
    pub event_hash: String,
    pub created_at: i64,
}

/// Public-verification backing row. `public_ref` is the opaque token shared
/// with external parties; the raw `lookup_id` never leaves the service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupRecord {
    pub lookup_id: String,
    pub public_ref: String,
    pub commodity_name: String,
    pub origin_name: String,
    pub destination_name: String,
    pub readiness_score: Option<u16>,
    pub readiness_verdict: Option<String>,
    pub locked_at: i64,
    pub created_at: i64,
}

/// Typed audit-event payloads, one variant per event type. Serializes to the
/// persisted `{eventType, eventData}` shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "eventType", content = "eventData", rename_all = "snake_case")]
pub enum AuditEventPayload {
    ComplianceCheck(ComplianceCheckEvent),
    LcCheck(LcCheckEvent),
    LcRecheck(LcRecheckEvent),
    CorrectionSent(CorrectionSentEvent),
    SupplierLinkCreated(SupplierLinkCreatedEvent),
    SupplierDocUploaded(SupplierDocUploadedEvent),
    SupplierComplete(SupplierCompleteEvent),
    StatusChange(StatusChangeEvent),
    TwinlogGenerated(TwinlogGeneratedEvent),
    EudrCreated(EudrCreatedEvent),
    TradeArchived(TradeLifecycleEvent),
    TradeClosed(TradeLifecycleEvent),
    AccountCreated(AccountCreatedEvent),
    Arrival(TransitEvent),
    CustomsCleared(TransitEvent),
}

impl AuditEventPayload {
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::ComplianceCheck(_) => "compliance_check",
            Self::LcCheck(_) => "lc_check",
            Self::LcRecheck(_) => "lc_recheck",
            Self::CorrectionSent(_) => "correction_sent",
            Self::SupplierLinkCreated(_) => "supplier_link_created",
            Self::SupplierDocUploaded(_) => "supplier_doc_uploaded",
            Self::SupplierComplete(_) => "supplier_complete",
            Self::StatusChange(_) => "status_change",
            Self::TwinlogGenerated(_) => "twinlog_generated",
            Self::EudrCreated(_) => "eudr_created",
            Self::TradeArchived(_) => "trade_archived",
            Self::TradeClosed(_) => "trade_closed",
            Self::AccountCreated(_) => "account_created",
            Self::Arrival(_) => "arrival",
            Self::CustomsCleared(_) => "customs_cleared",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceCheckEvent {
    pub readiness_score: u16,
    pub readiness_verdict: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LcCheckEvent {
    pub check_id: String,
    pub verdict: Verdict,
    pub green: usize,
    pub amber: usize,
    pub red: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LcRecheckEvent {
    pub check_id: String,
    pub recheck_number: u32,
    pub verdict: Verdict,
    pub green: usize,
    pub amber: usize,
    pub red: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrectionSentEvent {
    pub case_id: String,
    pub channel: CorrectionChannel,
    pub discrepancy_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplierLinkCreatedEvent {
    pub link_ref: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplierDocUploadedEvent {
    pub doc_type: DocumentType,
    pub file_ref: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplierCompleteEvent {
    pub doc_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChangeEvent {
    pub case_id: String,
    pub from: CaseStatus,
    pub to: CaseStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TwinlogGeneratedEvent {
    pub public_ref: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EudrCreatedEvent {
    pub statement_ref: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeLifecycleEvent {
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountCreatedEvent {
    pub account_ref: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitEvent {
    pub port: String,
    pub occurred_at: i64,
}
