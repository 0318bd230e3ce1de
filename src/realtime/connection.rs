use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::dispatcher::Dispatcher;
use super::events::RealtimeEvent;

/// Server pings every 15 seconds; two unanswered pings drop the connection.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(15);
const MAX_MISSED_HEARTBEATS: u8 = 2;

fn encode(event: &RealtimeEvent) -> Option<Message> {
    match serde_json::to_string(event) {
        Ok(text) => Some(Message::Text(text)),
        Err(e) => {
            warn!(error = %e, "Failed to encode realtime event");
            None
        }
    }
}

/// Drive one authenticated WebSocket until either side goes away.
pub async fn handle_connection(socket: WebSocket, dispatcher: Dispatcher, user_id: Uuid) {
    let (mut sender, mut receiver) = socket.split();

    if let Some(ready) = encode(&RealtimeEvent::Ready { user_id }) {
        if sender.send(ready).await.is_err() {
            return;
        }
    }

    let (conn_id, mut user_rx) = dispatcher.register(user_id).await;
    let mut broadcast_rx = dispatcher.subscribe();
    info!(%user_id, %conn_id, "Realtime client connected");

    let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
    heartbeat.tick().await;
    let mut missed_heartbeats: u8 = 0;

    loop {
        let outgoing = tokio::select! {
            result = broadcast_rx.recv() => match result {
                Ok(event) => encode(&event),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(%user_id, skipped, "Realtime receiver lagged");
                    None
                }
                Err(RecvError::Closed) => break,
            },
            event = user_rx.recv() => match event {
                Some(event) => encode(&event),
                None => break,
            },
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Pong(_))) => {
                    missed_heartbeats = 0;
                    None
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {
                    // Clients only listen; anything they send is ignored
                    None
                }
                Some(Err(e)) => {
                    debug!(%user_id, error = %e, "Realtime socket error");
                    break;
                }
            },
            _ = heartbeat.tick() => {
                if missed_heartbeats >= MAX_MISSED_HEARTBEATS {
                    warn!(%user_id, "Heartbeat timeout, dropping connection");
                    break;
                }
                missed_heartbeats += 1;
                Some(Message::Ping(Vec::new()))
            }
        };

        if let Some(message) = outgoing {
            if sender.send(message).await.is_err() {
                break;
            }
        }
    }

    dispatcher.unregister(user_id, conn_id).await;
    info!(%user_id, %conn_id, "Realtime client disconnected");
}
