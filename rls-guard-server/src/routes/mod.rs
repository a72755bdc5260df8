//! HTTP routes

mod health;
mod security;

use axum::routing::get;
use axum::Router;
use rls_guard_core::{ApplyMode, RlsGuardService};

pub use health::HealthResponse;
pub use security::SecurityResponse;

/// State shared by all handlers
#[derive(Clone)]
pub struct AppState {
    pub service: RlsGuardService,
    /// Mode used by `POST /api/security`
    pub apply_mode: ApplyMode,
}

impl AppState {
    pub fn new(service: RlsGuardService) -> Self {
        Self {
            service,
            apply_mode: ApplyMode::default(),
        }
    }

    pub fn with_apply_mode(mut self, mode: ApplyMode) -> Self {
        self.apply_mode = mode;
        self
    }
}

/// Create the HTTP router with all routes configured
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health::health))
        .route(
            "/api/security",
            get(security::inspect_security).post(security::apply_security),
        )
        .route("/api/security/policies", get(security::audit_policies))
        .with_state(state)
}
