use crate::module::lc_check::error::AppError;
use crate::module::lc_check::model::{
    CheckResultItem, DocumentSubmission, DocumentType, FieldValue, LcCheckSummary, LcTerms,
    Severity, Verdict,
};
use crate::service::field_match_service::{match_field, FieldKind, FieldSpec};

const COMMERCIAL_INVOICE_FIELDS: &[FieldSpec] = &[
    FieldSpec { name: "beneficiaryName", kind: FieldKind::FreeText, required: true, ucp_rule_ref: Some("UCP600 Art.18(a)") },
    FieldSpec { name: "goodsDescription", kind: FieldKind::FreeText, required: true, ucp_rule_ref: Some("UCP600 Art.18(c)") },
    FieldSpec { name: "hsCode", kind: FieldKind::Enumerated, required: false, ucp_rule_ref: Some("UCP600 Art.14(d)") },
    FieldSpec { name: "quantity", kind: FieldKind::Numeric, required: false, ucp_rule_ref: Some("UCP600 Art.30(b)") },
    FieldSpec { name: "quantityUnit", kind: FieldKind::Enumerated, required: false, ucp_rule_ref: None },
    FieldSpec { name: "unitPrice", kind: FieldKind::Numeric, required: false, ucp_rule_ref: Some("UCP600 Art.18(b)") },
    FieldSpec { name: "totalAmount", kind: FieldKind::Numeric, required: true, ucp_rule_ref: Some("UCP600 Art.18(b)") },
    FieldSpec { name: "currency", kind: FieldKind::Enumerated, required: true, ucp_rule_ref: Some("UCP600 Art.18") },
    FieldSpec { name: "incoterms", kind: FieldKind::Enumerated, required: false, ucp_rule_ref: None },
    FieldSpec { name: "countryOfOrigin", kind: FieldKind::FreeText, required: false, ucp_rule_ref: Some("UCP600 Art.14(d)") },
];

const BILL_OF_LADING_FIELDS: &[FieldSpec] = &[
    FieldSpec { name: "shippedOnBoardDate", kind: FieldKind::Date, required: true, ucp_rule_ref: Some("UCP600 Art.20(a)(ii)") },
    FieldSpec { name: "portOfLoading", kind: FieldKind::FreeText, required: true, ucp_rule_ref: Some("UCP600 Art.20(a)(iii)") },
    FieldSpec { name: "portOfDischarge", kind: FieldKind::FreeText, required: true, ucp_rule_ref: Some("UCP600 Art.20(a)(iii)") },
    FieldSpec { name: "goodsDescription", kind: FieldKind::FreeText, required: false, ucp_rule_ref: Some("UCP600 Art.14(e)") },
    FieldSpec { name: "consignee", kind: FieldKind::FreeText, required: false, ucp_rule_ref: None },
];

const CERTIFICATE_OF_ORIGIN_FIELDS: &[FieldSpec] = &[
    FieldSpec { name: "countryOfOrigin", kind: FieldKind::FreeText, required: true, ucp_rule_ref: Some("UCP600 Art.14(d)") },
    FieldSpec { name: "goodsDescription", kind: FieldKind::FreeText, required: false, ucp_rule_ref: Some("UCP600 Art.14(e)") },
    FieldSpec { name: "beneficiaryName", kind: FieldKind::FreeText, required: false, ucp_rule_ref: None },
];

const PHYTOSANITARY_FIELDS: &[FieldSpec] = &[
    FieldSpec { name: "countryOfOrigin", kind: FieldKind::FreeText, required: true, ucp_rule_ref: Some("UCP600 Art.14(d)") },
    FieldSpec { name: "goodsDescription", kind: FieldKind::FreeText, required: false, ucp_rule_ref: None },
];

const PACKING_LIST_FIELDS: &[FieldSpec] = &[
    FieldSpec { name: "quantity", kind: FieldKind::Numeric, required: false, ucp_rule_ref: Some("UCP600 Art.30(b)") },
    FieldSpec { name: "quantityUnit", kind: FieldKind::Enumerated, required: false, ucp_rule_ref: None },
    FieldSpec { name: "goodsDescription", kind: FieldKind::FreeText, required: false, ucp_rule_ref: Some("UCP600 Art.14(e)") },
];

const OTHER_FIELDS: &[FieldSpec] = &[
    FieldSpec { name: "goodsDescription", kind: FieldKind::FreeText, required: false, ucp_rule_ref: None },
];

pub fn applicable_fields(doc_type: DocumentType) -> &'static [FieldSpec] {
    match doc_type {
        DocumentType::CommercialInvoice => COMMERCIAL_INVOICE_FIELDS,
        DocumentType::BillOfLading => BILL_OF_LADING_FIELDS,
        DocumentType::CertificateOfOrigin => CERTIFICATE_OF_ORIGIN_FIELDS,
        DocumentType::PhytosanitaryCertificate => PHYTOSANITARY_FIELDS,
        DocumentType::PackingList => PACKING_LIST_FIELDS,
        DocumentType::Other => OTHER_FIELDS,
    }
}

/// LC-side expectation for a document field. Date fields compare against the
/// relevant LC deadline; `consignee` against the applicant.
pub fn lc_expectation(terms: &LcTerms, field_name: &str) -> Option<FieldValue> {
    let text = |s: &Option<String>| s.as_ref().map(|v| FieldValue::Text(v.clone()));
    match field_name {
        "beneficiaryName" => Some(FieldValue::Text(terms.beneficiary_name.clone())),
        "goodsDescription" => text(&terms.goods_description),
        "hsCode" => text(&terms.hs_code),
        "quantity" => terms.quantity.clone(),
        "quantityUnit" => text(&terms.quantity_unit),
        "unitPrice" => terms.unit_price.clone(),
        "currency" => Some(FieldValue::Text(terms.currency.clone())),
        "totalAmount" => Some(terms.total_amount.clone()),
        "incoterms" => text(&terms.incoterms),
        "countryOfOrigin" => text(&terms.country_of_origin),
        "portOfLoading" => text(&terms.port_of_loading),
        "portOfDischarge" => text(&terms.port_of_discharge),
        "shippedOnBoardDate" => text(&terms.latest_shipment_date),
        "consignee" => text(&terms.applicant_name),
        _ => None,
    }
}

#[derive(Debug, Clone)]
pub struct CheckOutput {
    pub results: Vec<CheckResultItem>,
    pub summary: LcCheckSummary,
}

/// Run the full field-by-field matrix for one submission. Deterministic and
/// order-independent in its verdict; fails fast on invalid input before any
/// matching happens.
pub fn run_check(
    terms: &LcTerms,
    documents: &[DocumentSubmission],
    tolerance_pct: f64,
    checked_at: i64,
) -> Result<CheckOutput, AppError> {
    validate_terms(terms)?;
    if documents.is_empty() {
        return Err(AppError::bad_request(
            "EMPTY_DOCUMENT_SET",
            "at least one document is required",
        ));
    }

    let mut results = Vec::new();
    for document in documents {
        for spec in applicable_fields(document.doc_type) {
            let lc_value = lc_expectation(terms, spec.name);
            let doc_value = document.fields.get(spec.name);
            let Some(outcome) = match_field(spec, lc_value.as_ref(), doc_value, tolerance_pct)
            else {
                continue;
            };
            let cite = outcome.severity != Severity::Green;
            results.push(CheckResultItem {
                field_name: spec.name.to_string(),
                document_type: document.doc_type,
                severity: outcome.severity,
                lc_value,
                doc_value: doc_value.cloned(),
                explanation: outcome.explanation,
                ucp_rule_ref: if cite {
                    spec.ucp_rule_ref.map(str::to_string)
                } else {
                    None
                },
            });
        }
    }

    let summary = summarize(&results, checked_at);
    Ok(CheckOutput { results, summary })
}

pub fn summarize(results: &[CheckResultItem], checked_at: i64) -> LcCheckSummary {
    let green = results.iter().filter(|r| r.severity == Severity::Green).count();
    let amber = results.iter().filter(|r| r.severity == Severity::Amber).count();
    let red = results.iter().filter(|r| r.severity == Severity::Red).count();
    LcCheckSummary {
        verdict: verdict_for(red, amber),
        green,
        amber,
        red,
        checked_at,
    }
}

fn verdict_for(red: usize, amber: usize) -> Verdict {
    if red > 0 {
        Verdict::DiscrepanciesFound
    } else if amber > 0 {
        Verdict::CompliantWithNotes
    } else {
        Verdict::Compliant
    }
}

fn validate_terms(terms: &LcTerms) -> Result<(), AppError> {
    if terms.lc_reference.trim().is_empty() {
        return Err(AppError::bad_request(
            "INVALID_LC_REFERENCE",
            "lcReference is required",
        ));
    }
    if terms.beneficiary_name.trim().is_empty() {
        return Err(AppError::bad_request(
            "INVALID_BENEFICIARY",
            "beneficiaryName is required",
        ));
    }
    if terms.currency.trim().is_empty() {
        return Err(AppError::bad_request(
            "INVALID_CURRENCY",
            "currency is required",
        ));
    }
    if terms.total_amount.as_number().is_none() {
        return Err(AppError::bad_request(
            "INVALID_TOTAL_AMOUNT",
            "totalAmount must be numeric",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn minimal_terms() -> LcTerms {
        LcTerms {
            lc_reference: "LC-2026-0042".to_string(),
            beneficiary_name: "Golden Harvest Exports Ltd".to_string(),
            applicant_name: None,
            goods_description: None,
            hs_code: None,
            quantity: None,
            quantity_unit: None,
            unit_price: None,
            currency: "USD".to_string(),
            total_amount: FieldValue::Number(30000.0),
            country_of_origin: None,
            port_of_loading: None,
            port_of_discharge: None,
            latest_shipment_date: None,
            lc_expiry_date: None,
            incoterms: None,
            partial_shipment_allowed: None,
            transhipment_allowed: None,
            issuing_bank: None,
            advising_bank: None,
        }
    }

    #[test]
    fn empty_document_set_fails_fast() {
        let err = run_check(&minimal_terms(), &[], 0.5, 0).expect_err("must reject");
        assert_eq!(err.code, "EMPTY_DOCUMENT_SET");
    }

    #[test]
    fn missing_lc_reference_fails_fast() {
        let mut terms = minimal_terms();
        terms.lc_reference = "  ".to_string();
        let doc = DocumentSubmission {
            doc_type: DocumentType::Other,
            fields: BTreeMap::new(),
        };
        let err = run_check(&terms, &[doc], 0.5, 0).expect_err("must reject");
        assert_eq!(err.code, "INVALID_LC_REFERENCE");
    }

    #[test]
    fn verdict_red_wins_over_amber() {
        let mut fields = BTreeMap::new();
        fields.insert(
            "beneficiaryName".to_string(),
            FieldValue::Text("Golden Harvest Exports".to_string()),
        );
        fields.insert("goodsDescription".to_string(), FieldValue::Text("steel coils".to_string()));
        fields.insert("totalAmount".to_string(), FieldValue::Text("28000".to_string()));
        fields.insert("currency".to_string(), FieldValue::Text("USD".to_string()));
        let mut terms = minimal_terms();
        terms.goods_description = Some("steel coils".to_string());
        let doc = DocumentSubmission {
            doc_type: DocumentType::CommercialInvoice,
            fields,
        };
        let output = run_check(&terms, &[doc], 0.5, 0).expect("check");
        assert_eq!(output.summary.verdict, Verdict::DiscrepanciesFound);
        assert!(output.summary.red >= 1);
        assert!(output.summary.amber >= 1);
    }
}
