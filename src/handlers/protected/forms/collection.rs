use axum::{extract::State, Extension};

use crate::api::{FormDetail, FormSummary};
use crate::middleware::{ApiJson, ApiResponse, ApiResult, AuthUser};
use crate::services::FormInput;
use crate::state::AppState;

/// GET /forms - the caller's live forms, newest first, with response counts
pub async fn get(State(state): State<AppState>, Extension(caller): Extension<AuthUser>) -> ApiResult<Vec<FormSummary>> {
    let forms = state.forms.list_forms_for_psychologist(&caller).await?;
    Ok(ApiResponse::success(forms.into_iter().map(FormSummary::from).collect()))
}

/// POST /forms - create a form owned by the caller
pub async fn post(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    ApiJson(input): ApiJson<FormInput>,
) -> ApiResult<FormDetail> {
    let form = state.forms.create_form(&caller, input).await?;
    Ok(ApiResponse::created(FormDetail::for_caller(form, &caller)))
}
