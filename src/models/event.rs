use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Event {
    pub id: Uuid,
    pub venue_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub genre: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub capacity: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
#[validate(schema(function = "validate_create_window"))]
pub struct CreateEvent {
    #[validate(length(min = 1, max = 160))]
    #[serde(deserialize_with = "crate::models::trim::string")]
    pub title: String,
    #[validate(length(max = 4000))]
    pub description: Option<String>,
    #[validate(length(min = 1, max = 50))]
    #[serde(deserialize_with = "crate::models::trim::string")]
    pub genre: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    #[validate(range(min = 1))]
    pub capacity: Option<i32>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateEvent {
    #[validate(length(min = 1, max = 160))]
    #[serde(default, deserialize_with = "crate::models::trim::option")]
    pub title: Option<String>,
    #[validate(length(max = 4000))]
    pub description: Option<String>,
    #[validate(length(min = 1, max = 50))]
    #[serde(default, deserialize_with = "crate::models::trim::option")]
    pub genre: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    #[validate(range(min = 1))]
    pub capacity: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct EventFilter {
    pub genre: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

/// An event must end after it starts.
pub fn check_window(
    start: DateTime<Utc>,
    end: Option<DateTime<Utc>>,
) -> Result<(), ValidationError> {
    match end {
        Some(end) if end <= start => {
            let mut err = ValidationError::new("event_window");
            err.message = Some("end_time must be after start_time".into());
            Err(err)
        }
        _ => Ok(()),
    }
}

fn validate_create_window(event: &CreateEvent) -> Result<(), ValidationError> {
    check_window(event.start_time, event.end_time)
}

impl UpdateEvent {
    /// The start/end pair that would be stored after applying this update.
    pub fn merged_window(&self, current: &Event) -> (DateTime<Utc>, Option<DateTime<Utc>>) {
        (
            self.start_time.unwrap_or(current.start_time),
            self.end_time.or(current.end_time),
        )
    }
}

const EVENT_COLUMNS: &str =
    "id, venue_id, title, description, genre, start_time, end_time, capacity, created_at, updated_at";

impl Event {
    pub async fn create(
        pool: &PgPool,
        venue_id: Uuid,
        data: &CreateEvent,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Event>(&format!(
            "INSERT INTO events (id, venue_id, title, description, genre, start_time, end_time, capacity)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {EVENT_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(venue_id)
        .bind(data.title.trim())
        .bind(data.description.as_deref())
        .bind(data.genre.trim())
        .bind(data.start_time)
        .bind(data.end_time)
        .bind(data.capacity)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Event>(&format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_venue(pool: &PgPool, venue_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Event>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE venue_id = $1 ORDER BY start_time ASC"
        ))
        .bind(venue_id)
        .fetch_all(pool)
        .await
    }

    /// Without a `from` bound only events that have not started yet are listed.
    pub async fn list(pool: &PgPool, filter: &EventFilter) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Event>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events
             WHERE start_time >= COALESCE($1, NOW())
               AND ($2::TIMESTAMPTZ IS NULL OR start_time <= $2)
               AND ($3::TEXT IS NULL OR LOWER(genre) = LOWER($3))
             ORDER BY start_time ASC"
        ))
        .bind(filter.from)
        .bind(filter.to)
        .bind(filter.genre.as_deref())
        .fetch_all(pool)
        .await
    }

    /// Owner of the venue hosting the event.
    pub async fn owner_of(pool: &PgPool, id: Uuid) -> Result<Option<Uuid>, sqlx::Error> {
        sqlx::query_scalar::<_, Uuid>(
            "SELECT v.owner_id
             FROM events e
             JOIN venues v ON v.id = e.venue_id
             WHERE e.id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: &UpdateEvent,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Event>(&format!(
            "UPDATE events SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                genre = COALESCE($4, genre),
                start_time = COALESCE($5, start_time),
                end_time = COALESCE($6, end_time),
                capacity = COALESCE($7, capacity),
                updated_at = NOW()
             WHERE id = $1
             RETURNING {EVENT_COLUMNS}"
        ))
        .bind(id)
        .bind(data.title.as_deref().map(str::trim))
        .bind(data.description.as_deref())
        .bind(data.genre.as_deref().map(str::trim))
        .bind(data.start_time)
        .bind(data.end_time)
        .bind(data.capacity)
        .fetch_optional(pool)
        .await
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
