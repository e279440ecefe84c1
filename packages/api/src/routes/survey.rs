//! Onboarding survey answers, stored as one JSON document per user.

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde_json::Value;

use crate::auth::AuthUser;
use crate::db::Database;
use crate::error::ApiError;
use crate::models::{SurveyResponse, SurveySaved};
use crate::state::AppState;

pub async fn submit_survey<D: Database>(
    State(state): State<AppState<D>>,
    user: AuthUser,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<SurveySaved>, ApiError> {
    let Json(data) = payload?;
    if !data.is_object() {
        return Err(ApiError::BadRequest("Survey must be a JSON object".into()));
    }
    state.db.upsert_survey(user.id, &data).await?;
    Ok(Json(SurveySaved { ok: true }))
}

pub async fn get_survey<D: Database>(
    State(state): State<AppState<D>>,
    user: AuthUser,
) -> Result<Json<SurveyResponse>, ApiError> {
    let data = state.db.get_survey(user.id).await?;
    Ok(Json(SurveyResponse { data }))
}
