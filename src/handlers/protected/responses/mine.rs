use axum::{extract::State, Extension};

use crate::api::ResponseView;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;

/// GET /responses/my - the caller's submission history, newest first
pub async fn get(State(state): State<AppState>, Extension(caller): Extension<AuthUser>) -> ApiResult<Vec<ResponseView>> {
    let responses = state.responses.list_responses_for_patient(&caller).await?;
    Ok(ApiResponse::success(responses.into_iter().map(ResponseView::from).collect()))
}
