use super::error::AppError;
use super::model::{
    AuditEventPayload, AuditEventRecord, CaseStatus, CheckHistoryEntry, CorrectionRequestEntry,
    CorrectionSentEvent, LcCaseRecord, LcCheckEvent, LcCheckRecord, LcRecheckEvent, LookupRecord,
    Severity, StatusChangeEvent, TwinlogGeneratedEvent,
};
use super::schema::{
    CaseViewResponse, ChainViewResponse, CheckSnapshot, CloseCaseResponse, ComparisonRow,
    LogCorrectionRequest, LogCorrectionResponse, PublicVerificationResponse, SubmitCheckRequest,
    SubmitCheckResponse,
};
use crate::app::AppState;
use crate::infra::{
    InfraClients, AUDIT_EVENTS_COLLECTION, IDEMPOTENCY_PREFIX, LC_CASES_COLLECTION,
    LC_CHECKS_COLLECTION, LOOKUPS_COLLECTION,
};
use crate::service::case_lifecycle_service::{
    ensure_recheck_allowed, status_after_check, status_after_close, status_after_correction,
};
use crate::service::chain_hash_service::{build_event_id, compute_event_hash, payload_parts};
use crate::service::chain_verify_service::{verify_chain, ChainVerification};
use crate::service::discrepancy_service::run_check;
use crate::service::integrity_hash_service::{
    build_case_id, build_check_id, build_public_ref, compute_integrity_hash,
};
use mongodb::bson::doc;
use mongodb::Collection;
use redis::aio::MultiplexedConnection;
use redis::Script;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::warn;

pub async fn submit_check(
    state: &AppState,
    req: SubmitCheckRequest,
) -> Result<SubmitCheckResponse, AppError> {
    if req.source_lookup_id.trim().is_empty() {
        return Err(AppError::bad_request(
            "INVALID_SOURCE_LOOKUP_ID",
            "sourceLookupId is required",
        ));
    }

    let checked_at = now_unix()?;
    let output = run_check(
        &req.terms,
        &req.documents,
        state.config.match_tolerance_pct,
        checked_at,
    )?;
    let summary = output.summary;
    let results = output.results;
    let integrity_hash = compute_integrity_hash(
        &req.terms,
        &req.documents,
        &results,
        summary.verdict,
        summary.green,
        summary.amber,
        summary.red,
    )
    .map_err(|e| AppError::internal("SERIALIZATION_ERROR", format!("content hash failed: {e}")))?;
    let check_id = build_check_id(&integrity_hash);

    let Some(infra) = &state.infra else {
        // Stateless mode: the matrix and hash are still useful to callers,
        // but no case, chain, or lookup bookkeeping happens.
        return Ok(SubmitCheckResponse {
            check_id,
            case_id: None,
            case_status: None,
            recheck_number: 0,
            verdict: summary.verdict,
            summary,
            results,
            integrity_hash,
            public_ref: None,
            persisted: false,
        });
    };

    if let Some(request_id) = req.request_id.as_deref().filter(|r| !r.trim().is_empty()) {
        if let Some(existing_check_id) =
            reserve_idempotency_key(infra, request_id, state.config.idempotency_ttl_seconds).await?
        {
            return replay_check(infra, &existing_check_id).await;
        }
    }

    let cases: Collection<LcCaseRecord> = infra.mongo_db.collection(LC_CASES_COLLECTION);
    let existing_case = cases
        .find_one(doc! { "sourceLookupId": &req.source_lookup_id })
        .await
        .map_err(|e| AppError::internal("PERSISTENCE_ERROR", format!("mongo find case failed: {e}")))?;

    let case_id = build_case_id(&req.source_lookup_id);
    let (recheck_number, prior_status, prior_recheck_count) = match &existing_case {
        None => (0, CaseStatus::Checking, 0),
        Some(case) => {
            ensure_recheck_allowed(
                case.recheck_count,
                case.max_free_rechecks,
                req.payment_authorized,
            )?;
            (case.recheck_count + 1, case.status, case.recheck_count)
        }
    };
    let new_status = status_after_check(prior_status, summary.verdict, recheck_number)?;

    let check_record = LcCheckRecord {
        check_id: check_id.clone(),
        source_lookup_id: req.source_lookup_id.clone(),
        case_id: Some(case_id.clone()),
        recheck_number,
        terms: req.terms.clone(),
        documents: req.documents.clone(),
        results: results.clone(),
        summary: summary.clone(),
        integrity_hash: integrity_hash.clone(),
        created_at: checked_at,
    };
    let checks: Collection<LcCheckRecord> = infra.mongo_db.collection(LC_CHECKS_COLLECTION);
    checks.insert_one(&check_record).await.map_err(|e| {
        AppError::internal("PERSISTENCE_ERROR", format!("insert check failed: {e}"))
    })?;

    let history_entry = CheckHistoryEntry {
        recheck_number,
        verdict: summary.verdict,
        summary: summary.clone(),
        created_at: checked_at,
    };
    match existing_case {
        None => {
            let case_record = LcCaseRecord {
                case_id: case_id.clone(),
                source_lookup_id: req.source_lookup_id.clone(),
                lc_reference: req.terms.lc_reference.clone(),
                beneficiary_name: req.terms.beneficiary_name.clone(),
                status: new_status,
                recheck_count: 0,
                max_free_rechecks: state.config.max_free_rechecks,
                check_history: vec![history_entry],
                correction_requests: vec![],
                created_at: checked_at,
                updated_at: checked_at,
            };
            cases.insert_one(&case_record).await.map_err(|e| {
                if is_duplicate_key(&e) {
                    AppError::conflict(
                        "CASE_RACE",
                        "concurrent first submission for this lookup, retry",
                    )
                } else {
                    AppError::internal("PERSISTENCE_ERROR", format!("insert case failed: {e}"))
                }
            })?;
        }
        Some(_) => {
            let entry_bson = mongodb::bson::to_bson(&history_entry).map_err(|e| {
                AppError::internal("SERIALIZATION_ERROR", format!("history encode failed: {e}"))
            })?;
            // recheckCount in the filter serializes concurrent rechecks:
            // the loser matches nothing and is told to retry.
            let updated = cases
                .update_one(
                    doc! { "caseId": &case_id, "recheckCount": prior_recheck_count as i64 },
                    doc! {
                        "$set": { "status": new_status.as_str(), "recheckCount": recheck_number as i64, "updatedAt": checked_at },
                        "$push": { "checkHistory": entry_bson },
                    },
                )
                .await
                .map_err(|e| {
                    AppError::internal("PERSISTENCE_ERROR", format!("update case failed: {e}"))
                })?;
            if updated.matched_count == 0 {
                return Err(AppError::conflict(
                    "CASE_RACE",
                    "concurrent re-check for this case, retry",
                ));
            }
        }
    }

    let public_ref = ensure_lookup_record(state, infra, &req, checked_at).await?;

    let payload = if recheck_number == 0 {
        AuditEventPayload::LcCheck(LcCheckEvent {
            check_id: check_id.clone(),
            verdict: summary.verdict,
            green: summary.green,
            amber: summary.amber,
            red: summary.red,
        })
    } else {
        AuditEventPayload::LcRecheck(LcRecheckEvent {
            check_id: check_id.clone(),
            recheck_number,
            verdict: summary.verdict,
            green: summary.green,
            amber: summary.amber,
            red: summary.red,
        })
    };
    append_event(
        infra,
        &req.source_lookup_id,
        req.session_id.as_deref(),
        &payload,
        state.config.chain_append_max_attempts,
    )
    .await?;

    if let Some(request_id) = req.request_id.as_deref().filter(|r| !r.trim().is_empty()) {
        finalize_idempotency_key(
            infra,
            request_id,
            &check_id,
            state.config.idempotency_ttl_seconds,
        )
        .await?;
    }

    Ok(SubmitCheckResponse {
        check_id,
        case_id: Some(case_id),
        case_status: Some(new_status),
        recheck_number,
        verdict: summary.verdict,
        summary,
        results,
        integrity_hash,
        public_ref: Some(public_ref),
        persisted: true,
    })
}

pub async fn get_case_view(state: &AppState, case_id: &str) -> Result<CaseViewResponse, AppError> {
    let infra = require_infra(state)?;
    let cases: Collection<LcCaseRecord> = infra.mongo_db.collection(LC_CASES_COLLECTION);
    let case = cases
        .find_one(doc! { "caseId": case_id })
        .await
        .map_err(|e| AppError::internal("PERSISTENCE_ERROR", format!("mongo find case failed: {e}")))?
        .ok_or_else(|| AppError::not_found("CASE_NOT_FOUND", "case not found"))?;

    let checks: Collection<LcCheckRecord> = infra.mongo_db.collection(LC_CHECKS_COLLECTION);
    let initial = checks
        .find_one(doc! { "caseId": case_id, "recheckNumber": 0 })
        .await
        .map_err(|e| AppError::internal("PERSISTENCE_ERROR", format!("mongo find check failed: {e}")))?;
    let latest = checks
        .find_one(doc! { "caseId": case_id })
        .sort(doc! { "recheckNumber": -1 })
        .await
        .map_err(|e| AppError::internal("PERSISTENCE_ERROR", format!("mongo find check failed: {e}")))?;

    let events = load_chain(infra, &case.source_lookup_id).await?;
    let verification = verify_chain(&events);
    if !verification.valid {
        warn!(
            case_id,
            broken_at = ?verification.broken_at,
            reason = ?verification.reason,
            "audit chain verification failed on case read"
        );
    }

    let comparison = match (&initial, &latest) {
        (Some(first), Some(last)) => build_comparison(first, last),
        _ => vec![],
    };

    Ok(CaseViewResponse {
        case_id: case.case_id,
        status: case.status,
        lc_reference: case.lc_reference,
        beneficiary_name: case.beneficiary_name,
        recheck_count: case.recheck_count,
        max_free_rechecks: case.max_free_rechecks,
        initial_check: initial.map(snapshot),
        latest_check: latest.map(snapshot),
        check_history: case.check_history,
        correction_requests: case.correction_requests,
        comparison,
        chain_valid: verification.valid,
    })
}

pub async fn log_correction(
    state: &AppState,
    case_id: &str,
    req: LogCorrectionRequest,
) -> Result<LogCorrectionResponse, AppError> {
    let infra = require_infra(state)?;
    let cases: Collection<LcCaseRecord> = infra.mongo_db.collection(LC_CASES_COLLECTION);
    let case = cases
        .find_one(doc! { "caseId": case_id })
        .await
        .map_err(|e| AppError::internal("PERSISTENCE_ERROR", format!("mongo find case failed: {e}")))?
        .ok_or_else(|| AppError::not_found("CASE_NOT_FOUND", "case not found"))?;

    let new_status = status_after_correction(case.status)?;
    let discrepancy_count = case
        .check_history
        .last()
        .map(|entry| entry.summary.amber + entry.summary.red)
        .unwrap_or(0);
    let sent_at = now_unix()?;
    let entry = CorrectionRequestEntry {
        channel: req.channel,
        discrepancy_count,
        sent_at,
    };
    let entry_bson = mongodb::bson::to_bson(&entry).map_err(|e| {
        AppError::internal("SERIALIZATION_ERROR", format!("correction encode failed: {e}"))
    })?;
    let updated = cases
        .update_one(
            doc! { "caseId": case_id, "status": case.status.as_str() },
            doc! {
                "$set": { "status": new_status.as_str(), "updatedAt": sent_at },
                "$push": { "correctionRequests": entry_bson },
            },
        )
        .await
        .map_err(|e| AppError::internal("PERSISTENCE_ERROR", format!("update case failed: {e}")))?;
    if updated.matched_count == 0 {
        return Err(AppError::conflict(
            "CASE_RACE",
            "case changed concurrently, retry",
        ));
    }

    append_event(
        infra,
        &case.source_lookup_id,
        None,
        &AuditEventPayload::CorrectionSent(CorrectionSentEvent {
            case_id: case.case_id.clone(),
            channel: req.channel,
            discrepancy_count,
        }),
        state.config.chain_append_max_attempts,
    )
    .await?;

    Ok(LogCorrectionResponse {
        case_id: case.case_id,
        status: new_status,
        channel: req.channel,
        discrepancy_count,
        sent_at,
    })
}

pub async fn close_case(state: &AppState, case_id: &str) -> Result<CloseCaseResponse, AppError> {
    let infra = require_infra(state)?;
    let cases: Collection<LcCaseRecord> = infra.mongo_db.collection(LC_CASES_COLLECTION);
    let case = cases
        .find_one(doc! { "caseId": case_id })
        .await
        .map_err(|e| AppError::internal("PERSISTENCE_ERROR", format!("mongo find case failed: {e}")))?
        .ok_or_else(|| AppError::not_found("CASE_NOT_FOUND", "case not found"))?;

    let new_status = status_after_close(case.status)?;
    let closed_at = now_unix()?;
    let updated = cases
        .update_one(
            doc! { "caseId": case_id, "status": case.status.as_str() },
            doc! { "$set": { "status": new_status.as_str(), "updatedAt": closed_at } },
        )
        .await
        .map_err(|e| AppError::internal("PERSISTENCE_ERROR", format!("update case failed: {e}")))?;
    if updated.matched_count == 0 {
        return Err(AppError::conflict(
            "CASE_RACE",
            "case changed concurrently, retry",
        ));
    }

    append_event(
        infra,
        &case.source_lookup_id,
        None,
        &AuditEventPayload::StatusChange(StatusChangeEvent {
            case_id: case.case_id.clone(),
            from: case.status,
            to: new_status,
        }),
        state.config.chain_append_max_attempts,
    )
    .await?;

    Ok(CloseCaseResponse {
        case_id: case.case_id,
        status: new_status,
    })
}

pub async fn record_event(
    state: &AppState,
    lookup_id: &str,
    session_id: Option<&str>,
    payload: &AuditEventPayload,
) -> Result<AuditEventRecord, AppError> {
    if lookup_id.trim().is_empty() {
        return Err(AppError::bad_request(
            "INVALID_LOOKUP_ID",
            "lookup id is required",
        ));
    }
    let infra = require_infra(state)?;
    append_event(
        infra,
        lookup_id,
        session_id,
        payload,
        state.config.chain_append_max_attempts,
    )
    .await
}

pub async fn get_chain(state: &AppState, lookup_id: &str) -> Result<ChainViewResponse, AppError> {
    let infra = require_infra(state)?;
    let events = load_chain(infra, lookup_id).await?;
    let verification = verify_chain(&events);
    if !verification.valid {
        warn!(
            lookup_id,
            broken_at = ?verification.broken_at,
            reason = ?verification.reason,
            "audit chain verification failed"
        );
    }
    Ok(chain_view(verification, events))
}

pub async fn verify_public(
    state: &AppState,
    public_ref: &str,
) -> Result<PublicVerificationResponse, AppError> {
    let infra = require_infra(state)?;
    let lookups: Collection<LookupRecord> = infra.mongo_db.collection(LOOKUPS_COLLECTION);
    let record = lookups
        .find_one(doc! { "publicRef": public_ref })
        .await
        .map_err(|e| AppError::internal("PERSISTENCE_ERROR", format!("mongo find lookup failed: {e}")))?
        .ok_or_else(|| AppError::not_found("REF_NOT_FOUND", "verification reference not found"))?;

    let events = load_chain(infra, &record.lookup_id).await?;
    let verification = verify_chain(&events);
    if !verification.valid {
        warn!(
            public_ref,
            broken_at = ?verification.broken_at,
            "audit chain verification failed on public read"
        );
    }
    let tip_hash = events
        .last()
        .map(|e| e.event_hash.clone())
        .unwrap_or_default();

    Ok(PublicVerificationResponse {
        commodity_name: record.commodity_name,
        origin_name: record.origin_name,
        destination_name: record.destination_name,
        public_ref: record.public_ref,
        hash: tip_hash,
        locked_at: record.locked_at,
        readiness_score: record.readiness_score,
        readiness_verdict: record.readiness_verdict,
        chain_valid: verification.valid,
    })
}

/// Append one event to a lookup's chain. Reads the tail, hashes against it,
/// and inserts; a duplicate-key rejection on `(lookupId, previousHash)`
/// means another writer got there first, so the tail is reread and the hash
/// recomputed, up to `max_attempts` times.
pub async fn append_event(
    infra: &InfraClients,
    lookup_id: &str,
    session_id: Option<&str>,
    payload: &AuditEventPayload,
    max_attempts: u32,
) -> Result<AuditEventRecord, AppError> {
    let (event_type, event_data) = payload_parts(payload)
        .map_err(|e| AppError::internal("EVENT_ENCODING_ERROR", e.to_string()))?;
    let events: Collection<AuditEventRecord> = infra.mongo_db.collection(AUDIT_EVENTS_COLLECTION);

    let mut attempt = 0;
    loop {
        attempt += 1;
        let tail = events
            .find_one(doc! { "lookupId": lookup_id })
            .sort(doc! { "createdAt": -1, "_id": -1 })
            .await
            .map_err(|e| {
                AppError::internal("PERSISTENCE_ERROR", format!("mongo find tail failed: {e}"))
            })?;
        let previous_hash = tail.map(|t| t.event_hash);
        let created_at = now_unix()?;
        let event_hash =
            compute_event_hash(&event_type, &event_data, created_at, previous_hash.as_deref());
        let record = AuditEventRecord {
            event_id: build_event_id(&event_hash),
            lookup_id: lookup_id.to_string(),
            session_id: session_id.map(str::to_string),
            event_type: event_type.clone(),
            event_data: event_data.clone(),
            previous_hash,
            event_hash,
            created_at,
        };

        match events.insert_one(&record).await {
            Ok(_) => return Ok(record),
            Err(e) if is_duplicate_key(&e) => {
                if attempt >= max_attempts {
                    return Err(AppError::conflict(
                        "CHAIN_CONFLICT",
                        "audit chain contention persisted across retries",
                    ));
                }
                warn!(lookup_id, attempt, "audit chain fork detected, rereading tail");
            }
            Err(e) => {
                return Err(AppError::internal(
                    "PERSISTENCE_ERROR",
                    format!("insert audit event failed: {e}"),
                ));
            }
        }
    }
}

async fn ensure_lookup_record(
    state: &AppState,
    infra: &InfraClients,
    req: &SubmitCheckRequest,
    locked_at: i64,
) -> Result<String, AppError> {
    let lookups: Collection<LookupRecord> = infra.mongo_db.collection(LOOKUPS_COLLECTION);
    let existing = lookups
        .find_one(doc! { "lookupId": &req.source_lookup_id })
        .await
        .map_err(|e| AppError::internal("PERSISTENCE_ERROR", format!("mongo find lookup failed: {e}")))?;
    if let Some(record) = existing {
        return Ok(record.public_ref);
    }

    let public_ref = build_public_ref(&req.source_lookup_id, locked_at);
    let context = req.trade_context.as_ref();
    let record = LookupRecord {
        lookup_id: req.source_lookup_id.clone(),
        public_ref: public_ref.clone(),
        commodity_name: context
            .map(|c| c.commodity_name.clone())
            .or_else(|| req.terms.goods_description.clone())
            .unwrap_or_default(),
        origin_name: context
            .map(|c| c.origin_name.clone())
            .or_else(|| req.terms.country_of_origin.clone())
            .unwrap_or_default(),
        destination_name: context
            .map(|c| c.destination_name.clone())
            .or_else(|| req.terms.port_of_discharge.clone())
            .unwrap_or_default(),
        readiness_score: context.and_then(|c| c.readiness_score),
        readiness_verdict: context.and_then(|c| c.readiness_verdict.clone()),
        locked_at,
        created_at: locked_at,
    };
    match lookups.insert_one(&record).await {
        Ok(_) => {
            append_event(
                infra,
                &req.source_lookup_id,
                req.session_id.as_deref(),
                &AuditEventPayload::TwinlogGenerated(TwinlogGeneratedEvent {
                    public_ref: public_ref.clone(),
                }),
                state.config.chain_append_max_attempts,
            )
            .await?;
            Ok(public_ref)
        }
        // A concurrent submission created the lookup first; its ref wins.
        Err(e) if is_duplicate_key(&e) => {
            let winner = lookups
                .find_one(doc! { "lookupId": &req.source_lookup_id })
                .await
                .map_err(|e| {
                    AppError::internal("PERSISTENCE_ERROR", format!("mongo find lookup failed: {e}"))
                })?
                .ok_or_else(|| {
                    AppError::internal("PERSISTENCE_ERROR", "lookup vanished after insert race")
                })?;
            Ok(winner.public_ref)
        }
        Err(e) => Err(AppError::internal(
            "PERSISTENCE_ERROR",
            format!("insert lookup failed: {e}"),
        )),
    }
}

async fn replay_check(
    infra: &InfraClients,
    check_id: &str,
) -> Result<SubmitCheckResponse, AppError> {
    let checks: Collection<LcCheckRecord> = infra.mongo_db.collection(LC_CHECKS_COLLECTION);
    let check = checks
        .find_one(doc! { "checkId": check_id })
        .await
        .map_err(|e| AppError::internal("PERSISTENCE_ERROR", format!("mongo find check failed: {e}")))?
        .ok_or_else(|| {
            AppError::internal("IDEMPOTENCY_STATE_ERROR", "reserved check record missing")
        })?;

    let case_status = match &check.case_id {
        Some(case_id) => {
            let cases: Collection<LcCaseRecord> = infra.mongo_db.collection(LC_CASES_COLLECTION);
            cases
                .find_one(doc! { "caseId": case_id })
                .await
                .map_err(|e| {
                    AppError::internal("PERSISTENCE_ERROR", format!("mongo find case failed: {e}"))
                })?
                .map(|c| c.status)
        }
        None => None,
    };
    let lookups: Collection<LookupRecord> = infra.mongo_db.collection(LOOKUPS_COLLECTION);
    let public_ref = lookups
        .find_one(doc! { "lookupId": &check.source_lookup_id })
        .await
        .map_err(|e| AppError::internal("PERSISTENCE_ERROR", format!("mongo find lookup failed: {e}")))?
        .map(|l| l.public_ref);

    Ok(SubmitCheckResponse {
        check_id: check.check_id,
        case_id: check.case_id,
        case_status,
        recheck_number: check.recheck_number,
        verdict: check.summary.verdict,
        summary: check.summary,
        results: check.results,
        integrity_hash: check.integrity_hash,
        public_ref,
        persisted: true,
    })
}

/// Reserve the idempotency key. `None` means a fresh reservation; a stored
/// check id means this request already completed and should be replayed.
async fn reserve_idempotency_key(
    infra: &InfraClients,
    request_id: &str,
    ttl_seconds: i64,
) -> Result<Option<String>, AppError> {
    let mut conn: MultiplexedConnection = infra
        .redis
        .get_multiplexed_async_connection()
        .await
        .map_err(|e| AppError::internal("REDIS_ERROR", format!("redis connect failed: {e}")))?;

    let key = format!("{IDEMPOTENCY_PREFIX}{request_id}");
    let script = Script::new(
        r#"
        local existing = redis.call('GET', KEYS[1])
        if existing then return existing end
        redis.call('SET', KEYS[1], 'PENDING', 'EX', tonumber(ARGV[1]))
        return nil
    "#,
    );
    let status: Option<String> = script
        .key(&key)
        .arg(ttl_seconds)
        .invoke_async(&mut conn)
        .await
        .map_err(|e| AppError::internal("REDIS_ERROR", format!("idempotency script failed: {e}")))?;

    match status.as_deref() {
        None => Ok(None),
        Some("PENDING") => Err(AppError::conflict(
            "REQUEST_IN_FLIGHT",
            "same requestId is currently being processed",
        )),
        Some(check_id) => Ok(Some(check_id.to_string())),
    }
}

async fn finalize_idempotency_key(
    infra: &InfraClients,
    request_id: &str,
    check_id: &str,
    ttl_seconds: i64,
) -> Result<(), AppError> {
    use redis::AsyncCommands;
    let ttl = u64::try_from(ttl_seconds)
        .map_err(|_| AppError::internal("REDIS_ERROR", "invalid idempotency ttl"))?;
    let mut conn: MultiplexedConnection = infra
        .redis
        .get_multiplexed_async_connection()
        .await
        .map_err(|e| AppError::internal("REDIS_ERROR", format!("redis connect failed: {e}")))?;
    let key = format!("{IDEMPOTENCY_PREFIX}{request_id}");
    let _: () = conn
        .set_ex(key, check_id, ttl)
        .await
        .map_err(|e| AppError::internal("REDIS_ERROR", format!("set idempotency failed: {e}")))?;
    Ok(())
}

async fn load_chain(
    infra: &InfraClients,
    lookup_id: &str,
) -> Result<Vec<AuditEventRecord>, AppError> {
    let events: Collection<AuditEventRecord> = infra.mongo_db.collection(AUDIT_EVENTS_COLLECTION);
    let mut cursor = events
        .find(doc! { "lookupId": lookup_id })
        .sort(doc! { "createdAt": 1, "_id": 1 })
        .await
        .map_err(|e| AppError::internal("PERSISTENCE_ERROR", format!("mongo find events failed: {e}")))?;

    let mut loaded = Vec::new();
    while cursor.advance().await.map_err(|e| {
        AppError::internal("PERSISTENCE_ERROR", format!("event cursor failed: {e}"))
    })? {
        let record = cursor.deserialize_current().map_err(|e| {
            AppError::internal("PERSISTENCE_ERROR", format!("event decode failed: {e}"))
        })?;
        loaded.push(record);
    }
    Ok(loaded)
}

fn build_comparison(initial: &LcCheckRecord, latest: &LcCheckRecord) -> Vec<ComparisonRow> {
    initial
        .results
        .iter()
        .filter(|row| row.severity != Severity::Green)
        .map(|row| {
            let current = latest.results.iter().find(|candidate| {
                candidate.field_name == row.field_name
                    && candidate.document_type == row.document_type
            });
            let latest_severity = current.map(|c| c.severity);
            let resolution = if latest_severity == Some(Severity::Green) {
                "Fixed"
            } else {
                "Open"
            };
            ComparisonRow {
                field_name: row.field_name.clone(),
                document_type: row.document_type,
                lc_value: row.lc_value.clone(),
                initial_severity: row.severity,
                initial_value: row.doc_value.clone(),
                latest_severity,
                latest_value: current.and_then(|c| c.doc_value.clone()),
                resolution: resolution.to_string(),
            }
        })
        .collect()
}

fn snapshot(check: LcCheckRecord) -> CheckSnapshot {
    CheckSnapshot {
        check_id: check.check_id,
        recheck_number: check.recheck_number,
        summary: check.summary,
        results: check.results,
    }
}

fn chain_view(verification: ChainVerification, events: Vec<AuditEventRecord>) -> ChainViewResponse {
    ChainViewResponse {
        valid: verification.valid,
        broken_at: verification.broken_at,
        reason: verification.reason,
        events,
    }
}

fn require_infra(state: &AppState) -> Result<&InfraClients, AppError> {
    state.infra.as_ref().ok_or_else(|| {
        AppError::bad_request("PERSISTENCE_DISABLED", "persistence is not configured")
    })
}

fn now_unix() -> Result<i64, AppError> {
    let elapsed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AppError::internal("CLOCK_ERROR", format!("clock error: {e}")))?;
    Ok(elapsed.as_secs() as i64)
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        *err.kind,
        mongodb::error::ErrorKind::Write(mongodb::error::WriteFailure::WriteError(ref write))
            if write.code == 11000
    )
}
