//! Security endpoints: apply the declared policies, report RLS status, audit policies

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use log::error;
use rls_guard_core::{ApplyOptions, ApplyResult, PolicyAudit, RlsGuardError, SecurityStatus};
use serde::{Deserialize, Serialize};

use super::AppState;

/// Envelope returned by every security endpoint
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityResponse<T> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Short, generic reason. Internal detail is only logged.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

type Reply<T> = (StatusCode, Json<SecurityResponse<T>>);

fn ok<T>(message: &str, data: T) -> Reply<T> {
    (
        StatusCode::OK,
        Json(SecurityResponse {
            success: true,
            message: message.to_string(),
            data: Some(data),
            error: None,
        }),
    )
}

fn failed<T>(message: &str, err: &RlsGuardError, data: Option<T>) -> Reply<T> {
    error!("{message}: {err}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(SecurityResponse {
            success: false,
            message: message.to_string(),
            data,
            error: Some(err.public_message().to_string()),
        }),
    )
}

/// `POST /api/security`
pub async fn apply_security(State(state): State<AppState>) -> Reply<ApplyResult> {
    let options = ApplyOptions {
        mode: state.apply_mode,
    };
    match state.service.apply(options).await {
        Ok(result) => ok("Database security policies enabled", result),
        Err(e) => failed("Failed to enable security policies", &e, None),
    }
}

/// `GET /api/security`
///
/// On failure the entries read before the failing table are returned in `data`.
pub async fn inspect_security(State(state): State<AppState>) -> Reply<Vec<SecurityStatus>> {
    match state.service.inspect().await {
        Ok(statuses) => ok("Database security status check completed", statuses),
        Err(e) => {
            let partial = e.partial_statuses().to_vec();
            failed("Failed to check security status", &e, Some(partial))
        }
    }
}

/// `GET /api/security/policies`
pub async fn audit_policies(State(state): State<AppState>) -> Reply<PolicyAudit> {
    match state.service.audit_policies().await {
        Ok(audit) => ok("Policy audit completed", audit),
        Err(e) => failed("Failed to list security policies", &e, None),
    }
}
