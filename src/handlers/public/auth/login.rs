// handlers/public/auth/login.rs - POST /auth/login handler

use axum::extract::State;

use crate::api::SessionView;
use crate::middleware::{ApiJson, ApiResponse, ApiResult};
use crate::services::LoginInput;
use crate::state::AppState;

/// POST /auth/login - exchange credentials for a bearer token
///
/// Unknown usernames and wrong passwords both answer 401 "Invalid credentials".
pub async fn post(State(state): State<AppState>, ApiJson(input): ApiJson<LoginInput>) -> ApiResult<SessionView> {
    let session = state.sessions.login(input).await?;
    Ok(ApiResponse::success(session.into()))
}
