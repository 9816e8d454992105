use axum::{extract::State, Extension};
use serde::Deserialize;

use crate::api::ResponseView;
use crate::handlers::protected::utils::parse_id;
use crate::middleware::{ApiJson, ApiResponse, ApiResult, AuthUser};
use crate::services::AnswerInput;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    pub form_id: String,
    pub answers: Vec<AnswerInput>,
}

/// POST /responses - a patient's single submission to a form
///
/// A second submission to the same form answers 409.
pub async fn post(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    ApiJson(body): ApiJson<SubmitRequest>,
) -> ApiResult<ResponseView> {
    let form_id = parse_id(&body.form_id, "form")?;
    let response = state.responses.submit_response(&caller, form_id, body.answers).await?;
    Ok(ApiResponse::created(response.into()))
}
