use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Type};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "chat_request_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ChatRequestStatus {
    Pending,
    Accepted,
    Declined,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ChatRequest {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub status: ChatRequestStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ChatMessage {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub content: String,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateChatRequest {
    pub receiver_id: Uuid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatDecision {
    Accept,
    Decline,
}

impl From<ChatDecision> for ChatRequestStatus {
    fn from(decision: ChatDecision) -> Self {
        match decision {
            ChatDecision::Accept => ChatRequestStatus::Accepted,
            ChatDecision::Decline => ChatRequestStatus::Declined,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RespondChatRequest {
    pub decision: ChatDecision,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SendMessage {
    #[validate(length(min = 1, max = 4000))]
    #[serde(deserialize_with = "crate::models::trim::string")]
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct ConversationQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    /// Only messages created strictly before this instant.
    pub before: Option<DateTime<Utc>>,
}

fn default_limit() -> i64 {
    50
}

pub const MAX_PAGE_SIZE: i64 = 200;

#[derive(Debug, Serialize)]
pub struct ChatRequestLists {
    pub incoming: Vec<ChatRequest>,
    pub outgoing: Vec<ChatRequest>,
}

impl ChatRequest {
    pub async fn create(
        pool: &PgPool,
        sender_id: Uuid,
        receiver_id: Uuid,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, ChatRequest>(
            "INSERT INTO chat_requests (id, sender_id, receiver_id)
             VALUES ($1, $2, $3)
             RETURNING id, sender_id, receiver_id, status, created_at, updated_at",
        )
        .bind(Uuid::new_v4())
        .bind(sender_id)
        .bind(receiver_id)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, ChatRequest>(
            "SELECT id, sender_id, receiver_id, status, created_at, updated_at
             FROM chat_requests WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// The request between two users, whichever of them sent it.
    pub async fn find_between(
        pool: &PgPool,
        a: Uuid,
        b: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, ChatRequest>(
            "SELECT id, sender_id, receiver_id, status, created_at, updated_at
             FROM chat_requests
             WHERE (sender_id = $1 AND receiver_id = $2)
                OR (sender_id = $2 AND receiver_id = $1)
             ORDER BY created_at DESC
             LIMIT 1",
        )
        .bind(a)
        .bind(b)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_for_user(
        pool: &PgPool,
        user_id: Uuid,
    ) -> Result<ChatRequestLists, sqlx::Error> {
        let requests = sqlx::query_as::<_, ChatRequest>(
            "SELECT id, sender_id, receiver_id, status, created_at, updated_at
             FROM chat_requests
             WHERE sender_id = $1 OR receiver_id = $1
             ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        let (incoming, outgoing): (Vec<_>, Vec<_>) = requests
            .into_iter()
            .partition(|request| request.receiver_id == user_id);

        Ok(ChatRequestLists { incoming, outgoing })
    }

    /// Only pending requests can change status; returns `None` otherwise.
    pub async fn respond(
        pool: &PgPool,
        id: Uuid,
        status: ChatRequestStatus,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, ChatRequest>(
            "UPDATE chat_requests SET status = $2, updated_at = NOW()
             WHERE id = $1 AND status = 'pending'
             RETURNING id, sender_id, receiver_id, status, created_at, updated_at",
        )
        .bind(id)
        .bind(status)
        .fetch_optional(pool)
        .await
    }
}

impl ChatMessage {
    pub async fn create(
        pool: &PgPool,
        sender_id: Uuid,
        receiver_id: Uuid,
        content: &str,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, ChatMessage>(
            "INSERT INTO chat_messages (id, sender_id, receiver_id, content)
             VALUES ($1, $2, $3, $4)
             RETURNING id, sender_id, receiver_id, content, read_at, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(sender_id)
        .bind(receiver_id)
        .bind(content)
        .fetch_one(pool)
        .await
    }

    /// A page of the conversation between two users, oldest message first.
    pub async fn conversation(
        pool: &PgPool,
        a: Uuid,
        b: Uuid,
        query: &ConversationQuery,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let limit = query.limit.clamp(1, MAX_PAGE_SIZE);

        let mut messages = sqlx::query_as::<_, ChatMessage>(
            "SELECT id, sender_id, receiver_id, content, read_at, created_at
             FROM chat_messages
             WHERE ((sender_id = $1 AND receiver_id = $2) OR (sender_id = $2 AND receiver_id = $1))
               AND ($3::TIMESTAMPTZ IS NULL OR created_at < $3)
             ORDER BY created_at DESC
             LIMIT $4",
        )
        .bind(a)
        .bind(b)
        .bind(query.before)
        .bind(limit)
        .fetch_all(pool)
        .await?;

        messages.reverse();
        Ok(messages)
    }

    /// Marks the given messages from `sender_id` to `reader_id` as read.
    pub async fn mark_read(
        pool: &PgPool,
        reader_id: Uuid,
        sender_id: Uuid,
        message_ids: &[Uuid],
    ) -> Result<u64, sqlx::Error> {
        if message_ids.is_empty() {
            return Ok(0);
        }

        let result = sqlx::query(
            "UPDATE chat_messages SET read_at = NOW()
             WHERE receiver_id = $1 AND sender_id = $2 AND read_at IS NULL
               AND id = ANY($3)",
        )
        .bind(reader_id)
        .bind(sender_id)
        .bind(message_ids)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures;
    use crate::models::user::AccountType;
    use crate::utils::AppError;

    #[test]
    fn test_decision_maps_to_status() {
        assert_eq!(
            ChatRequestStatus::from(ChatDecision::Accept),
            ChatRequestStatus::Accepted
        );
        assert_eq!(
            ChatRequestStatus::from(ChatDecision::Decline),
            ChatRequestStatus::Declined
        );
    }

    #[test]
    fn test_conversation_query_defaults() {
        let query: ConversationQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(query.limit, 50);
        assert!(query.before.is_none());
    }

    #[test]
    fn test_blank_message_is_rejected() {
        let message = SendMessage {
            content: String::new(),
        };
        assert!(message.validate().is_err());
    }

    #[test]
    fn test_whitespace_message_is_rejected() {
        let message: SendMessage = serde_json::from_str(r#"{"content":"    \n "}"#).unwrap();
        assert!(message.content.is_empty());
        assert!(message.validate().is_err());

        let padded: SendMessage = serde_json::from_str(r#"{"content":"  see you there  "}"#).unwrap();
        assert_eq!(padded.content, "see you there");
        assert!(padded.validate().is_ok());
    }

    #[sqlx::test]
    async fn test_reverse_request_is_a_conflict(pool: PgPool) {
        let alice = fixtures::user(&pool, AccountType::User).await;
        let bob = fixtures::user(&pool, AccountType::User).await;

        ChatRequest::create(&pool, alice.id, bob.id).await.unwrap();
        let err = ChatRequest::create(&pool, bob.id, alice.id).await.unwrap_err();
        assert!(matches!(AppError::from(err), AppError::Conflict(_)));
    }

    #[sqlx::test]
    async fn test_respond_only_once(pool: PgPool) {
        let alice = fixtures::user(&pool, AccountType::User).await;
        let bob = fixtures::user(&pool, AccountType::User).await;
        let request = ChatRequest::create(&pool, alice.id, bob.id).await.unwrap();

        let accepted = ChatRequest::respond(&pool, request.id, ChatRequestStatus::Accepted)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(accepted.status, ChatRequestStatus::Accepted);

        let again = ChatRequest::respond(&pool, request.id, ChatRequestStatus::Declined)
            .await
            .unwrap();
        assert!(again.is_none());

        let lists = ChatRequest::find_for_user(&pool, bob.id).await.unwrap();
        assert_eq!(lists.incoming.len(), 1);
        assert!(lists.outgoing.is_empty());
    }

    #[sqlx::test]
    async fn test_mark_read_touches_only_given_messages(pool: PgPool) {
        let alice = fixtures::user(&pool, AccountType::User).await;
        let bob = fixtures::user(&pool, AccountType::User).await;

        let first = ChatMessage::create(&pool, bob.id, alice.id, "one").await.unwrap();
        let second = ChatMessage::create(&pool, bob.id, alice.id, "two").await.unwrap();
        let reply = ChatMessage::create(&pool, alice.id, bob.id, "three").await.unwrap();

        let marked = ChatMessage::mark_read(&pool, alice.id, bob.id, &[second.id, reply.id])
            .await
            .unwrap();
        assert_eq!(marked, 1);
        assert_eq!(ChatMessage::mark_read(&pool, alice.id, bob.id, &[]).await.unwrap(), 0);

        let query: ConversationQuery = serde_json::from_str("{}").unwrap();
        let messages = ChatMessage::conversation(&pool, alice.id, bob.id, &query)
            .await
            .unwrap();
        assert_eq!(messages.len(), 3);

        let read_at = |id: Uuid| messages.iter().find(|m| m.id == id).unwrap().read_at;
        assert!(read_at(first.id).is_none());
        assert!(read_at(second.id).is_some());
        assert!(read_at(reply.id).is_none());
    }
}
