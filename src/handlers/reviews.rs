use axum::{extract::State, response::Response};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use super::venues::load_venue;
use crate::auth::Claims;
use crate::models::review::{CreateReview, Review};
use crate::realtime::RealtimeEvent;
use crate::state::AppState;
use crate::utils::extract::{Json, Path};
use crate::utils::response::{created, empty_success, success};
use crate::utils::{AppError, AppResult};

pub async fn list_venue_reviews(
    State(state): State<AppState>,
    Path(venue_id): Path<Uuid>,
) -> AppResult<Response> {
    load_venue(&state.pool, venue_id).await?;
    let reviews = Review::find_by_venue_with_authors(&state.pool, venue_id).await?;
    Ok(success(reviews, "Reviews retrieved"))
}

pub async fn create_review(
    State(state): State<AppState>,
    Path(venue_id): Path<Uuid>,
    claims: Claims,
    Json(req): Json<CreateReview>,
) -> AppResult<Response> {
    req.validate()?;

    let venue = load_venue(&state.pool, venue_id).await?;
    if venue.is_owned_by(claims.user_id()) {
        return Err(AppError::Forbidden(
            "Owners cannot review their own venue".to_string(),
        ));
    }

    let review = Review::create(&state.pool, venue_id, claims.user_id(), &req)
        .await
        .map_err(|e| match AppError::from(e) {
            AppError::Conflict(_) => {
                AppError::Conflict("You have already reviewed this venue".to_string())
            }
            other => other,
        })?;
    info!(review_id = %review.id, %venue_id, rating = review.rating, "Review created");

    state
        .dispatcher
        .publish(
            &[],
            RealtimeEvent::ReviewCreated {
                review: review.clone(),
            },
        )
        .await;

    Ok(created(review, "Review created"))
}

pub async fn delete_review(
    State(state): State<AppState>,
    Path(review_id): Path<Uuid>,
    claims: Claims,
) -> AppResult<Response> {
    let review = Review::find_by_id(&state.pool, review_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Review '{}' was not found", review_id)))?;

    if review.user_id != claims.user_id() {
        return Err(AppError::Forbidden(
            "Only the author can delete a review".to_string(),
        ));
    }

    Review::delete(&state.pool, review_id).await?;
    Ok(empty_success("Review deleted"))
}
