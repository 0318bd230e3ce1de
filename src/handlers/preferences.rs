use axum::{extract::State, response::Response};
use validator::Validate;

use crate::auth::Claims;
use crate::models::preference::{Preference, UpsertPreference};
use crate::state::AppState;
use crate::utils::extract::Json;
use crate::utils::response::success;
use crate::utils::{AppError, AppResult};

pub async fn get_preference(State(state): State<AppState>, claims: Claims) -> AppResult<Response> {
    let preference = Preference::find_by_user(&state.pool, claims.user_id())
        .await?
        .ok_or_else(|| AppError::NotFound("No preference saved yet".to_string()))?;

    Ok(success(preference, "Preference retrieved"))
}

pub async fn upsert_preference(
    State(state): State<AppState>,
    claims: Claims,
    Json(req): Json<UpsertPreference>,
) -> AppResult<Response> {
    req.validate()?;
    let preference = Preference::upsert(&state.pool, claims.user_id(), &req).await?;
    Ok(success(preference, "Preference saved"))
}
