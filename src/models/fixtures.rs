//! Rows for the database-backed tests.

use chrono::{Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::event::{CreateEvent, Event};
use super::user::{AccountType, RegisterRequest, User};
use super::venue::{CreateVenue, Venue};

pub async fn user(pool: &PgPool, account_type: AccountType) -> User {
    let request = RegisterRequest {
        email: format!("{}@example.com", Uuid::new_v4().simple()),
        password: "correct horse battery".into(),
        display_name: "Tester".into(),
        account_type,
    };
    User::create(pool, &request, "unused-hash").await.unwrap()
}

pub fn venue_payload() -> CreateVenue {
    CreateVenue {
        name: "The Basement".into(),
        description: None,
        address: "1 Main St".into(),
        city: "Nashville".into(),
        latitude: 36.16,
        longitude: -86.78,
        genre: "indie".into(),
        capacity: Some(300),
        image_url: None,
    }
}

pub async fn venue(pool: &PgPool, owner_id: Uuid) -> Venue {
    Venue::create(pool, owner_id, &venue_payload()).await.unwrap()
}

pub async fn event(pool: &PgPool, venue_id: Uuid) -> Event {
    let start = Utc::now() + Duration::days(3);
    let request = CreateEvent {
        title: "Late Show".into(),
        description: None,
        genre: "indie".into(),
        start_time: start,
        end_time: Some(start + Duration::hours(3)),
        capacity: Some(120),
    };
    Event::create(pool, venue_id, &request).await.unwrap()
}
