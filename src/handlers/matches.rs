use axum::{extract::State, response::Response};
use tracing::debug;

use crate::auth::Claims;
use crate::models::preference::Preference;
use crate::services::matching::filter_candidates;
use crate::state::AppState;
use crate::utils::response::success;
use crate::utils::{AppError, AppResult};

/// Recomputed on every call; matches are never stored.
pub async fn find_matches(State(state): State<AppState>, claims: Claims) -> AppResult<Response> {
    let preference = Preference::find_by_user(&state.pool, claims.user_id())
        .await?
        .ok_or_else(|| {
            AppError::NotFound("Save your preferences before looking for matches".to_string())
        })?;

    let candidates = preference.find_candidates(&state.pool).await?;
    let fetched = candidates.len();
    let matches = filter_candidates(&preference, candidates);
    debug!(user_id = %claims.user_id(), fetched, matched = matches.len(), "Matching finished");

    Ok(success(matches, "Matches retrieved"))
}
