use axum::{extract::State, Extension};

use crate::api::AvailableFormView;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;

/// GET /patient/forms - forms the caller may answer, newest first
pub async fn get(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
) -> ApiResult<Vec<AvailableFormView>> {
    let forms = state.forms.list_forms_for_patient(&caller).await?;
    Ok(ApiResponse::success(forms.into_iter().map(AvailableFormView::from).collect()))
}
