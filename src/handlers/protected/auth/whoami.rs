use axum::{extract::State, Extension};

use crate::api::UserView;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;

/// GET /auth/me - the account behind the bearer token
pub async fn get(State(state): State<AppState>, Extension(caller): Extension<AuthUser>) -> ApiResult<UserView> {
    let user = state.sessions.whoami(&caller).await?;
    Ok(ApiResponse::success(UserView::from(&user)))
}
