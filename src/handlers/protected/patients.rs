use axum::{extract::State, Extension};

use crate::api::PatientView;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;

/// GET /patients - every patient account, by name, for assignment pickers
pub async fn get(State(state): State<AppState>, Extension(caller): Extension<AuthUser>) -> ApiResult<Vec<PatientView>> {
    let patients = state.forms.list_patients(&caller).await?;
    Ok(ApiResponse::success(patients.into_iter().map(PatientView::from).collect()))
}
