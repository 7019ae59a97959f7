use super::crud;
use super::error::AppError;
use super::schema::{
    AppendEventRequest, ErrorBody, HealthResponse, LogCorrectionRequest, SubmitCheckRequest,
};
use crate::app::AppState;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use tracing::{error, info};

pub async fn submit_check(
    State(state): State<AppState>,
    Json(req): Json<SubmitCheckRequest>,
) -> impl IntoResponse {
    match crud::submit_check(&state, req).await {
        Ok(resp) => {
            info!(
                check_id = %resp.check_id,
                verdict = %resp.verdict.as_str(),
                green = resp.summary.green,
                amber = resp.summary.amber,
                red = resp.summary.red,
                recheck_number = resp.recheck_number,
                persisted = resp.persisted,
                "lc check completed"
            );
            (axum::http::StatusCode::OK, Json(resp)).into_response()
        }
        Err(e) => reject("lc check rejected", e),
    }
}

pub async fn get_case(
    State(state): State<AppState>,
    Path(case_id): Path<String>,
) -> impl IntoResponse {
    match crud::get_case_view(&state, &case_id).await {
        Ok(resp) => (axum::http::StatusCode::OK, Json(resp)).into_response(),
        Err(e) => reject("case read rejected", e),
    }
}

pub async fn log_correction(
    State(state): State<AppState>,
    Path(case_id): Path<String>,
    Json(req): Json<LogCorrectionRequest>,
) -> impl IntoResponse {
    match crud::log_correction(&state, &case_id, req).await {
        Ok(resp) => {
            info!(
                case_id = %resp.case_id,
                channel = %resp.channel.as_str(),
                discrepancy_count = resp.discrepancy_count,
                "correction request logged"
            );
            (axum::http::StatusCode::OK, Json(resp)).into_response()
        }
        Err(e) => reject("correction rejected", e),
    }
}

pub async fn close_case(
    State(state): State<AppState>,
    Path(case_id): Path<String>,
) -> impl IntoResponse {
    match crud::close_case(&state, &case_id).await {
        Ok(resp) => {
            info!(case_id = %resp.case_id, "case closed");
            (axum::http::StatusCode::OK, Json(resp)).into_response()
        }
        Err(e) => reject("case close rejected", e),
    }
}

pub async fn append_event(
    State(state): State<AppState>,
    Path(lookup_id): Path<String>,
    Json(req): Json<AppendEventRequest>,
) -> impl IntoResponse {
    match crud::record_event(&state, &lookup_id, req.session_id.as_deref(), &req.payload).await {
        Ok(resp) => {
            info!(event_id = %resp.event_id, event_type = %resp.event_type, "audit event appended");
            (axum::http::StatusCode::OK, Json(resp)).into_response()
        }
        Err(e) => reject("audit event rejected", e),
    }
}

pub async fn get_chain(
    State(state): State<AppState>,
    Path(lookup_id): Path<String>,
) -> impl IntoResponse {
    match crud::get_chain(&state, &lookup_id).await {
        Ok(resp) => (axum::http::StatusCode::OK, Json(resp)).into_response(),
        Err(e) => reject("chain read rejected", e),
    }
}

pub async fn verify_public(
    State(state): State<AppState>,
    Path(public_ref): Path<String>,
) -> impl IntoResponse {
    match crud::verify_public(&state, &public_ref).await {
        Ok(resp) => (axum::http::StatusCode::OK, Json(resp)).into_response(),
        Err(e) => reject("public verification rejected", e),
    }
}

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let persistence_enabled = state.infra.is_some();
    (
        axum::http::StatusCode::OK,
        Json(HealthResponse {
            status: "ok".to_string(),
            persistence_enabled,
        }),
    )
}

fn reject(context: &'static str, e: AppError) -> axum::response::Response {
    error!(error_code = e.code, reason = %e.message, "{context}");
    (
        e.status,
        Json(ErrorBody {
            error_code: e.code.to_string(),
            reason: e.message,
        }),
    )
        .into_response()
}
