use axum::{
    extract::{State, WebSocketUpgrade},
    response::Response,
};
use serde::Deserialize;

use crate::auth::token::decode_token;
use crate::realtime::connection::handle_connection;
use crate::state::AppState;
use crate::utils::extract::Query;
use crate::utils::AppResult;

#[derive(Debug, Deserialize)]
pub struct RealtimeQuery {
    pub token: String,
}

/// Browsers cannot set headers on a WebSocket handshake, so the token travels
/// in the query string and is checked before upgrading.
pub async fn realtime_upgrade(
    State(state): State<AppState>,
    Query(query): Query<RealtimeQuery>,
    ws: WebSocketUpgrade,
) -> AppResult<Response> {
    let claims = decode_token(&state.config.jwt_secret, &query.token)?;
    let dispatcher = state.dispatcher.clone();

    Ok(ws.on_upgrade(move |socket| handle_connection(socket, dispatcher, claims.user_id())))
}
