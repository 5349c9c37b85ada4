use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Form, State as AxumState},
    response::IntoResponse,
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};

use crate::{
    database::push_vote,
    error::AppError,
    fault::FaultInjector,
    state::State,
    utils::ensure_voter_id,
};

#[derive(Deserialize)]
pub struct VoteForm {
    vote: String,
}

#[derive(Deserialize, Default)]
pub struct ControlRequest {
    #[serde(default)]
    action: Option<String>,
}

pub async fn index_handler(
    AxumState(state): AxumState<Arc<State>>,
    jar: CookieJar,
) -> impl IntoResponse {
    let (jar, voter_id) = ensure_voter_id(jar);

    (
        jar,
        Json(json!({
            "option_a": state.config.option_a,
            "option_b": state.config.option_b,
            "hostname": state.hostname,
            "voter_id": voter_id,
            "vote": null,
            "error_sim_enabled": state.fault.is_active(),
            "error_sim_stats": state.fault.stats(),
        })),
    )
}

pub async fn vote_handler(
    AxumState(state): AxumState<Arc<State>>,
    jar: CookieJar,
    Form(payload): Form<VoteForm>,
) -> Result<impl IntoResponse, AppError> {
    let (jar, voter_id) = ensure_voter_id(jar);

    // The decision comes BEFORE the write so a failed request never
    // enqueues anything.
    if state.fault.should_error() {
        error!("SIMULATED ERROR: Vote processing failed (error simulation active)");
        return Err(AppError::Simulated {
            hostname: state.hostname.clone(),
        });
    }

    push_vote(state.redis_connection.clone(), &voter_id, &payload.vote).await?;
    info!("Received vote for {}", payload.vote);

    Ok((
        jar,
        Json(json!({
            "option_a": state.config.option_a,
            "option_b": state.config.option_b,
            "hostname": state.hostname,
            "voter_id": voter_id,
            "vote": payload.vote,
            "error_sim_enabled": state.fault.is_active(),
            "error_sim_stats": state.fault.stats(),
        })),
    ))
}

pub async fn fault_status_handler(AxumState(state): AxumState<Arc<State>>) -> impl IntoResponse {
    Json(state.fault.stats())
}

pub async fn fault_control_handler(
    AxumState(state): AxumState<Arc<State>>,
    bytes: Bytes,
) -> impl IntoResponse {
    let request: ControlRequest = serde_json::from_slice(&bytes).unwrap_or_default();

    apply_action(&state.fault, request.action.as_deref());

    Json(state.fault.stats())
}

// Anything other than an explicit enable/disable falls through to toggle,
// including an empty body.
fn apply_action(fault: &FaultInjector, action: Option<&str>) {
    match action {
        Some("enable") => fault.enable(),
        Some("disable") => fault.disable(),
        _ => fault.toggle(),
    }
}

/// Always 200, never consults the injector. Liveness must stay green while
/// synthetic failures fire, otherwise the orchestrator recycles pods instead
/// of letting the rollback tooling react.
pub async fn health_handler(AxumState(state): AxumState<Arc<State>>) -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "hostname": state.hostname,
    }))
}
