use axum::{extract::State, response::Response};
use tracing::{debug, info};
use uuid::Uuid;
use validator::Validate;

use crate::auth::Claims;
use crate::models::chat::{
    ChatMessage, ChatRequest, ChatRequestStatus, ConversationQuery, CreateChatRequest,
    RespondChatRequest, SendMessage,
};
use crate::models::user::User;
use crate::realtime::RealtimeEvent;
use crate::state::AppState;
use crate::utils::extract::{Json, Path, Query};
use crate::utils::response::{created, success};
use crate::utils::{AppError, AppResult};

pub async fn list_requests(State(state): State<AppState>, claims: Claims) -> AppResult<Response> {
    let requests = ChatRequest::find_for_user(&state.pool, claims.user_id()).await?;
    Ok(success(requests, "Chat requests retrieved"))
}

pub async fn create_request(
    State(state): State<AppState>,
    claims: Claims,
    Json(req): Json<CreateChatRequest>,
) -> AppResult<Response> {
    let sender_id = claims.user_id();
    if req.receiver_id == sender_id {
        return Err(AppError::ValidationError(
            "You cannot send a chat request to yourself".to_string(),
        ));
    }

    if User::find_by_id(&state.pool, req.receiver_id).await?.is_none() {
        return Err(AppError::NotFound(format!(
            "User '{}' was not found",
            req.receiver_id
        )));
    }

    if let Some(existing) = ChatRequest::find_between(&state.pool, sender_id, req.receiver_id).await? {
        return Err(AppError::Conflict(format!(
            "A chat request between you already exists ({:?})",
            existing.status
        )));
    }

    let request = ChatRequest::create(&state.pool, sender_id, req.receiver_id).await?;
    info!(request_id = %request.id, %sender_id, receiver_id = %request.receiver_id, "Chat request sent");

    state
        .dispatcher
        .publish(
            &[request.receiver_id],
            RealtimeEvent::ChatRequestCreated {
                request: request.clone(),
            },
        )
        .await;

    Ok(created(request, "Chat request sent"))
}

pub async fn respond_request(
    State(state): State<AppState>,
    Path(request_id): Path<Uuid>,
    claims: Claims,
    Json(req): Json<RespondChatRequest>,
) -> AppResult<Response> {
    let request = ChatRequest::find_by_id(&state.pool, request_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Chat request '{}' was not found", request_id)))?;

    if request.receiver_id != claims.user_id() {
        return Err(AppError::Forbidden(
            "Only the recipient can answer a chat request".to_string(),
        ));
    }

    let status = ChatRequestStatus::from(req.decision);
    let updated = ChatRequest::respond(&state.pool, request_id, status)
        .await?
        .ok_or_else(|| AppError::Conflict("This chat request was already answered".to_string()))?;

    state
        .dispatcher
        .publish(
            &[updated.sender_id, updated.receiver_id],
            RealtimeEvent::ChatRequestUpdated {
                request: updated.clone(),
            },
        )
        .await;

    Ok(success(updated, "Chat request answered"))
}

/// Messaging is only open between users with an accepted request.
async fn ensure_can_chat(state: &AppState, me: Uuid, other: Uuid) -> AppResult<()> {
    let accepted = ChatRequest::find_between(&state.pool, me, other)
        .await?
        .is_some_and(|request| request.status == ChatRequestStatus::Accepted);

    if !accepted {
        return Err(AppError::Forbidden(
            "You can only message users who accepted your chat request".to_string(),
        ));
    }
    Ok(())
}

pub async fn get_conversation(
    State(state): State<AppState>,
    Path(other_id): Path<Uuid>,
    Query(query): Query<ConversationQuery>,
    claims: Claims,
) -> AppResult<Response> {
    let me = claims.user_id();
    ensure_can_chat(&state, me, other_id).await?;

    let messages = ChatMessage::conversation(&state.pool, me, other_id, &query).await?;
    let incoming: Vec<Uuid> = messages
        .iter()
        .filter(|message| message.sender_id == other_id)
        .map(|message| message.id)
        .collect();
    ChatMessage::mark_read(&state.pool, me, other_id, &incoming).await?;

    Ok(success(messages, "Messages retrieved"))
}

pub async fn send_message(
    State(state): State<AppState>,
    Path(other_id): Path<Uuid>,
    claims: Claims,
    Json(req): Json<SendMessage>,
) -> AppResult<Response> {
    req.validate()?;

    let me = claims.user_id();
    ensure_can_chat(&state, me, other_id).await?;

    let message = ChatMessage::create(&state.pool, me, other_id, req.content.trim()).await?;
    let recipient_online = state.dispatcher.is_online(other_id).await;
    debug!(message_id = %message.id, recipient_online, "Message stored");

    state
        .dispatcher
        .publish(
            &[other_id, me],
            RealtimeEvent::ChatMessageCreated {
                message: message.clone(),
            },
        )
        .await;

    Ok(created(message, "Message sent"))
}
