use axum::{extract::State, response::Response};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use super::venues::{load_owned_venue, load_venue};
use crate::auth::Claims;
use crate::models::event::{check_window, CreateEvent, Event, EventFilter, UpdateEvent};
use crate::state::AppState;
use crate::utils::extract::{Json, Path, Query};
use crate::utils::response::{created, empty_success, success};
use crate::utils::{AppError, AppResult};

pub(crate) async fn load_event(pool: &PgPool, event_id: Uuid) -> AppResult<Event> {
    Event::find_by_id(pool, event_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Event '{}' was not found", event_id)))
}

/// Fails unless the caller owns the venue hosting the event.
pub(crate) async fn ensure_event_owner(
    pool: &PgPool,
    event_id: Uuid,
    claims: &Claims,
) -> AppResult<()> {
    let owner_id = Event::owner_of(pool, event_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Event '{}' was not found", event_id)))?;

    if owner_id != claims.user_id() {
        return Err(AppError::Forbidden(
            "Only the venue owner can manage this event".to_string(),
        ));
    }
    Ok(())
}

pub async fn list_events(
    State(state): State<AppState>,
    Query(filter): Query<EventFilter>,
) -> AppResult<Response> {
    let events = Event::list(&state.pool, &filter).await?;
    Ok(success(events, "Events retrieved"))
}

pub async fn list_venue_events(
    State(state): State<AppState>,
    Path(venue_id): Path<Uuid>,
) -> AppResult<Response> {
    load_venue(&state.pool, venue_id).await?;
    let events = Event::find_by_venue(&state.pool, venue_id).await?;
    Ok(success(events, "Events retrieved"))
}

pub async fn create_event(
    State(state): State<AppState>,
    Path(venue_id): Path<Uuid>,
    claims: Claims,
    Json(req): Json<CreateEvent>,
) -> AppResult<Response> {
    req.validate()?;
    load_owned_venue(&state.pool, venue_id, &claims).await?;

    let event = Event::create(&state.pool, venue_id, &req).await?;
    info!(event_id = %event.id, %venue_id, "Event created");

    Ok(created(event, "Event created"))
}

pub async fn get_event(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
) -> AppResult<Response> {
    let event = load_event(&state.pool, event_id).await?;
    Ok(success(event, "Event retrieved"))
}

pub async fn update_event(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
    claims: Claims,
    Json(req): Json<UpdateEvent>,
) -> AppResult<Response> {
    req.validate()?;
    ensure_event_owner(&state.pool, event_id, &claims).await?;

    let current = load_event(&state.pool, event_id).await?;
    let (start, end) = req.merged_window(&current);
    if let Err(err) = check_window(start, end) {
        let mut errors = ValidationErrors::new();
        errors.add("end_time", err);
        return Err(errors.into());
    }

    let event = Event::update(&state.pool, event_id, &req)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Event '{}' was not found", event_id)))?;

    Ok(success(event, "Event updated"))
}

pub async fn delete_event(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
    claims: Claims,
) -> AppResult<Response> {
    ensure_event_owner(&state.pool, event_id, &claims).await?;
    Event::delete(&state.pool, event_id).await?;
    info!(%event_id, "Event deleted");

    Ok(empty_success("Event deleted"))
}
