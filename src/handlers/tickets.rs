use axum::{extract::State, response::Response};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use super::events::{ensure_event_owner, load_event};
use crate::auth::Claims;
use crate::models::ticket::{
    CreateTicket, EventTicket, PurchaseOutcome, PurchaseTicket, TicketPurchase,
};
use crate::state::AppState;
use crate::utils::extract::{Json, Path};
use crate::utils::response::{created, success};
use crate::utils::{AppError, AppResult};

pub async fn list_event_tickets(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
) -> AppResult<Response> {
    load_event(&state.pool, event_id).await?;
    let tickets = EventTicket::find_by_event(&state.pool, event_id).await?;
    Ok(success(tickets, "Tickets retrieved"))
}

pub async fn create_ticket(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
    claims: Claims,
    Json(req): Json<CreateTicket>,
) -> AppResult<Response> {
    req.validate()?;
    ensure_event_owner(&state.pool, event_id, &claims).await?;

    let ticket = EventTicket::create(&state.pool, event_id, &req).await?;
    info!(ticket_id = %ticket.id, %event_id, price_cents = ticket.price_cents, "Ticket type created");

    Ok(created(ticket, "Ticket created"))
}

pub async fn purchase_ticket(
    State(state): State<AppState>,
    Path(ticket_id): Path<Uuid>,
    claims: Claims,
    Json(req): Json<PurchaseTicket>,
) -> AppResult<Response> {
    req.validate()?;

    match EventTicket::purchase(&state.pool, ticket_id, claims.user_id(), &req).await? {
        PurchaseOutcome::Purchased(purchase) => {
            info!(
                purchase_id = %purchase.id,
                %ticket_id,
                quantity = purchase.quantity,
                total_cents = purchase.total_cents,
                "Tickets purchased"
            );
            Ok(created(purchase, "Tickets purchased"))
        }
        PurchaseOutcome::SoldOut { remaining } => Err(AppError::Conflict(format!(
            "Not enough tickets left ({} remaining)",
            remaining
        ))),
        PurchaseOutcome::UnknownTicket => Err(AppError::NotFound(format!(
            "Ticket '{}' was not found",
            ticket_id
        ))),
    }
}

pub async fn list_my_purchases(
    State(state): State<AppState>,
    claims: Claims,
) -> AppResult<Response> {
    let purchases = TicketPurchase::find_by_user(&state.pool, claims.user_id()).await?;
    Ok(success(purchases, "Purchases retrieved"))
}
