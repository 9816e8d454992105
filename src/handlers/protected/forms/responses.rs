use axum::{
    extract::{Path, State},
    Extension,
};

use crate::api::FormResponseView;
use crate::handlers::protected::utils::parse_id;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;

/// GET /forms/:id/responses - every submission to the caller's form
pub async fn get(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Vec<FormResponseView>> {
    let form_id = parse_id(&id, "form")?;
    let responses = state.responses.list_responses_for_form(&caller, form_id).await?;
    Ok(ApiResponse::success(responses.into_iter().map(FormResponseView::from).collect()))
}
