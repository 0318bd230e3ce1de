use axum::{extract::State, response::Response};
use uuid::Uuid;
use validator::Validate;

use super::events::load_event;
use crate::auth::Claims;
use crate::models::rsvp::{EventRsvps, Rsvp, RsvpCounts, UpsertRsvp};
use crate::realtime::RealtimeEvent;
use crate::state::AppState;
use crate::utils::extract::{Json, Path};
use crate::utils::response::{empty_success, success};
use crate::utils::{AppError, AppResult};

pub async fn list_event_rsvps(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
) -> AppResult<Response> {
    load_event(&state.pool, event_id).await?;

    let rsvps = Rsvp::find_by_event(&state.pool, event_id).await?;
    let counts = RsvpCounts::tally(&rsvps);

    Ok(success(EventRsvps { counts, rsvps }, "RSVPs retrieved"))
}

pub async fn upsert_rsvp(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
    claims: Claims,
    Json(req): Json<UpsertRsvp>,
) -> AppResult<Response> {
    req.validate()?;
    load_event(&state.pool, event_id).await?;

    let rsvp = Rsvp::upsert(&state.pool, event_id, claims.user_id(), &req).await?;

    state
        .dispatcher
        .publish(
            &[],
            RealtimeEvent::RsvpUpdated {
                event_id,
                user_id: rsvp.user_id,
                status: Some(rsvp.status),
            },
        )
        .await;

    Ok(success(rsvp, "RSVP saved"))
}

pub async fn delete_rsvp(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
    claims: Claims,
) -> AppResult<Response> {
    let removed = Rsvp::delete_for_user(&state.pool, event_id, claims.user_id()).await?;
    if removed == 0 {
        return Err(AppError::NotFound(
            "You have not RSVPed to this event".to_string(),
        ));
    }

    state
        .dispatcher
        .publish(
            &[],
            RealtimeEvent::RsvpUpdated {
                event_id,
                user_id: claims.user_id(),
                status: None,
            },
        )
        .await;

    Ok(empty_success("RSVP withdrawn"))
}
