use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Type};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[sqlx(type_name = "rsvp_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RsvpStatus {
    Going,
    Maybe,
    NotGoing,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Rsvp {
    pub id: Uuid,
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub status: RsvpStatus,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpsertRsvp {
    pub status: RsvpStatus,
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: Option<f64>,
    #[validate(length(max = 100))]
    pub city: Option<String>,
    #[validate(length(max = 100))]
    pub region: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RsvpCounts {
    pub going: i64,
    pub maybe: i64,
    pub not_going: i64,
}

impl RsvpCounts {
    pub fn record(&mut self, status: RsvpStatus) {
        match status {
            RsvpStatus::Going => self.going += 1,
            RsvpStatus::Maybe => self.maybe += 1,
            RsvpStatus::NotGoing => self.not_going += 1,
        }
    }

    pub fn tally<'a>(rsvps: impl IntoIterator<Item = &'a Rsvp>) -> Self {
        let mut counts = Self::default();
        for rsvp in rsvps {
            counts.record(rsvp.status);
        }
        counts
    }

    pub fn total(&self) -> i64 {
        self.going + self.maybe + self.not_going
    }
}

#[derive(Debug, Serialize)]
pub struct EventRsvps {
    pub counts: RsvpCounts,
    pub rsvps: Vec<Rsvp>,
}

const RSVP_COLUMNS: &str =
    "id, event_id, user_id, status, latitude, longitude, city, region, created_at, updated_at";

impl Rsvp {
    /// One row per (event, user); a repeat call overwrites the earlier answer.
    pub async fn upsert(
        pool: &PgPool,
        event_id: Uuid,
        user_id: Uuid,
        data: &UpsertRsvp,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Rsvp>(&format!(
            "INSERT INTO event_rsvps (id, event_id, user_id, status, latitude, longitude, city, region)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             ON CONFLICT (event_id, user_id) DO UPDATE SET
                status = EXCLUDED.status,
                latitude = EXCLUDED.latitude,
                longitude = EXCLUDED.longitude,
                city = EXCLUDED.city,
                region = EXCLUDED.region,
                updated_at = NOW()
             RETURNING {RSVP_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(event_id)
        .bind(user_id)
        .bind(data.status)
        .bind(data.latitude)
        .bind(data.longitude)
        .bind(data.city.as_deref())
        .bind(data.region.as_deref())
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_event(pool: &PgPool, event_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Rsvp>(&format!(
            "SELECT {RSVP_COLUMNS} FROM event_rsvps WHERE event_id = $1 ORDER BY updated_at DESC"
        ))
        .bind(event_id)
        .fetch_all(pool)
        .await
    }

    /// Every RSVP for every event held at the venue.
    pub async fn find_by_venue(pool: &PgPool, venue_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Rsvp>(
            "SELECT r.id, r.event_id, r.user_id, r.status, r.latitude, r.longitude, r.city,
                    r.region, r.created_at, r.updated_at
             FROM event_rsvps r
             JOIN events e ON e.id = r.event_id
             WHERE e.venue_id = $1",
        )
        .bind(venue_id)
        .fetch_all(pool)
        .await
    }

    pub async fn delete_for_user(
        pool: &PgPool,
        event_id: Uuid,
        user_id: Uuid,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM event_rsvps WHERE event_id = $1 AND user_id = $2")
            .bind(event_id)
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
