use crate::app::AppState;
use crate::module::lc_check::controller;
use axum::routing::{get, post};
use axum::Router;

pub fn register_routes(state: AppState) -> Router {
    Router::new()
        .route("/v1/lc/checks", post(controller::submit_check))
        .route("/v1/lc/cases/:case_id", get(controller::get_case))
        .route(
            "/v1/lc/cases/:case_id/corrections",
            post(controller::log_correction),
        )
        .route("/v1/lc/cases/:case_id/close", post(controller::close_case))
        .route(
            "/v1/twinlog/:lookup_id/events",
            post(controller::append_event),
        )
        .route("/v1/twinlog/:lookup_id", get(controller::get_chain))
        .route("/v1/verify/:public_ref", get(controller::verify_public))
        .route("/v1/lc/health", get(controller::health))
        .with_state(state)
}
