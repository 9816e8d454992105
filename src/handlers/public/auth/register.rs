// handlers/public/auth/register.rs - POST /auth/register handler

use axum::extract::State;

use crate::api::SessionView;
use crate::middleware::{ApiJson, ApiResponse, ApiResult};
use crate::services::RegisterInput;
use crate::state::AppState;

/// POST /auth/register - create an account and return a token for it
///
/// Input: `{ "username", "password", "name", "email", "role" }`
/// where role is `psychologist` or `patient`.
pub async fn post(State(state): State<AppState>, ApiJson(input): ApiJson<RegisterInput>) -> ApiResult<SessionView> {
    let session = state.sessions.register(input).await?;
    Ok(ApiResponse::created(session.into()))
}
