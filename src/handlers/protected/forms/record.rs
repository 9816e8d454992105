use axum::{
    extract::{Path, State},
    Extension,
};

use crate::api::FormDetail;
use crate::handlers::protected::utils::parse_id;
use crate::middleware::{ApiJson, ApiResponse, ApiResult, AuthUser};
use crate::services::FormPatch;
use crate::state::AppState;

/// GET /forms/:id - owner, or a patient the form is visible to
pub async fn get(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<FormDetail> {
    let form_id = parse_id(&id, "form")?;
    let form = state.forms.get_form(&caller, form_id).await?;
    Ok(ApiResponse::success(FormDetail::for_caller(form, &caller)))
}

/// PUT /forms/:id - partial update by the owner
pub async fn put(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<FormPatch>,
) -> ApiResult<FormDetail> {
    let form_id = parse_id(&id, "form")?;
    let form = state.forms.update_form(&caller, form_id, patch).await?;
    Ok(ApiResponse::success(FormDetail::for_caller(form, &caller)))
}

/// DELETE /forms/:id - hides the form; its responses stay readable by the owner
pub async fn delete(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    let form_id = parse_id(&id, "form")?;
    state.forms.delete_form(&caller, form_id).await?;
    Ok(ApiResponse::no_content())
}
