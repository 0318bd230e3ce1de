use axum::{extract::State, response::Response};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::auth::Claims;
use crate::models::venue::{CreateVenue, UpdateVenue, Venue, VenueFilter};
use crate::state::AppState;
use crate::utils::extract::{Json, Path, Query};
use crate::utils::response::{created, empty_success, success};
use crate::utils::{AppError, AppResult};

pub(crate) async fn load_venue(pool: &PgPool, venue_id: Uuid) -> AppResult<Venue> {
    Venue::find_by_id(pool, venue_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Venue '{}' was not found", venue_id)))
}

/// The venue, provided the caller owns it.
pub(crate) async fn load_owned_venue(
    pool: &PgPool,
    venue_id: Uuid,
    claims: &Claims,
) -> AppResult<Venue> {
    let venue = load_venue(pool, venue_id).await?;
    if !venue.is_owned_by(claims.user_id()) {
        return Err(AppError::Forbidden(
            "Only the venue owner can do that".to_string(),
        ));
    }
    Ok(venue)
}

pub async fn list_venues(
    State(state): State<AppState>,
    Query(filter): Query<VenueFilter>,
) -> AppResult<Response> {
    let venues = Venue::list(&state.pool, &filter).await?;
    Ok(success(venues, "Venues retrieved"))
}

pub async fn list_my_venues(State(state): State<AppState>, claims: Claims) -> AppResult<Response> {
    let venues = Venue::find_by_owner(&state.pool, claims.user_id()).await?;
    Ok(success(venues, "Venues retrieved"))
}

pub async fn create_venue(
    State(state): State<AppState>,
    claims: Claims,
    Json(req): Json<CreateVenue>,
) -> AppResult<Response> {
    if !claims.is_business() {
        return Err(AppError::Forbidden(
            "Only business accounts can register venues".to_string(),
        ));
    }
    req.validate()?;

    let venue = Venue::create(&state.pool, claims.user_id(), &req).await?;
    info!(venue_id = %venue.id, owner_id = %venue.owner_id, "Venue created");

    Ok(created(venue, "Venue created"))
}

pub async fn get_venue(
    State(state): State<AppState>,
    Path(venue_id): Path<Uuid>,
) -> AppResult<Response> {
    let venue = load_venue(&state.pool, venue_id).await?;
    Ok(success(venue, "Venue retrieved"))
}

pub async fn update_venue(
    State(state): State<AppState>,
    Path(venue_id): Path<Uuid>,
    claims: Claims,
    Json(req): Json<UpdateVenue>,
) -> AppResult<Response> {
    req.validate()?;
    load_owned_venue(&state.pool, venue_id, &claims).await?;

    let venue = Venue::update(&state.pool, venue_id, &req)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Venue '{}' was not found", venue_id)))?;

    Ok(success(venue, "Venue updated"))
}

pub async fn delete_venue(
    State(state): State<AppState>,
    Path(venue_id): Path<Uuid>,
    claims: Claims,
) -> AppResult<Response> {
    load_owned_venue(&state.pool, venue_id, &claims).await?;
    Venue::delete(&state.pool, venue_id).await?;
    info!(%venue_id, "Venue deleted");

    Ok(empty_success("Venue deleted"))
}
