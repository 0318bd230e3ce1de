use serde::Serialize;
use uuid::Uuid;

use crate::models::chat::{ChatMessage, ChatRequest};
use crate::models::review::Review;
use crate::models::rsvp::RsvpStatus;

/// Change notifications pushed over the realtime gateway.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum RealtimeEvent {
    /// First frame on every connection
    Ready { user_id: Uuid },

    /// Someone asked the recipient to chat
    ChatRequestCreated { request: ChatRequest },

    /// A pending request was accepted or declined
    ChatRequestUpdated { request: ChatRequest },

    ChatMessageCreated { message: ChatMessage },

    ReviewCreated { review: Review },

    /// `status` is `None` when the RSVP was withdrawn
    RsvpUpdated {
        event_id: Uuid,
        user_id: Uuid,
        status: Option<RsvpStatus>,
    },
}

impl RealtimeEvent {
    /// Targeted events only reach the users they concern; everything else is
    /// broadcast to every connection.
    pub fn is_public(&self) -> bool {
        matches!(self, Self::ReviewCreated { .. } | Self::RsvpUpdated { .. })
    }
}
