// handlers/public/system.rs - GET / and GET /health

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET / - service info
pub async fn root(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": "PsyForm API",
            "version": env!("CARGO_PKG_VERSION"),
            "environment": state.config.environment,
            "endpoints": {
                "auth": "/auth/register, /auth/login (public), /auth/me (protected)",
                "forms": "/forms[/:id[/responses]] (psychologist)",
                "patients": "/patients (psychologist)",
                "patient": "/patient/forms (patient)",
                "responses": "/responses, /responses/my (patient)",
                "health": "/health (public)"
            }
        }
    }))
}

/// GET /health - storage reachability
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.repo.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "storage": state.config.storage
                }
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "storage unavailable",
                    "code": "SERVICE_UNAVAILABLE",
                    "data": {
                        "status": "degraded",
                        "timestamp": now,
                        "storage": state.config.storage
                    }
                })),
            )
        }
    }
}
