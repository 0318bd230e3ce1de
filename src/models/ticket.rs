use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Type};
use uuid::Uuid;
use validator::Validate;

/// A ticket type on sale for an event. Prices are in minor currency units.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EventTicket {
    pub id: Uuid,
    pub event_id: Uuid,
    pub name: String,
    pub price_cents: i64,
    pub currency: String,
    pub quantity_available: i32,
    pub quantity_sold: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "purchase_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PurchaseStatus {
    Completed,
    Refunded,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TicketPurchase {
    pub id: Uuid,
    pub ticket_id: Uuid,
    pub user_id: Uuid,
    pub quantity: i32,
    pub total_cents: i64,
    pub status: PurchaseStatus,
    pub payment_reference: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTicket {
    #[validate(length(min = 1, max = 80))]
    #[serde(deserialize_with = "crate::models::trim::string")]
    pub name: String,
    #[validate(range(min = 0))]
    pub price_cents: i64,
    #[serde(default = "default_currency")]
    #[validate(length(equal = 3))]
    pub currency: String,
    #[validate(range(min = 1))]
    pub quantity_available: i32,
}

fn default_currency() -> String {
    "usd".to_string()
}

#[derive(Debug, Deserialize, Validate)]
pub struct PurchaseTicket {
    #[validate(range(min = 1, max = 20))]
    pub quantity: i32,
    #[validate(length(max = 255))]
    pub payment_reference: Option<String>,
}

#[derive(Debug)]
pub enum PurchaseOutcome {
    Purchased(TicketPurchase),
    SoldOut { remaining: i32 },
    UnknownTicket,
}

impl EventTicket {
    pub fn remaining(&self) -> i32 {
        self.quantity_available - self.quantity_sold
    }

    pub async fn create(
        pool: &PgPool,
        event_id: Uuid,
        data: &CreateTicket,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, EventTicket>(
            "INSERT INTO event_tickets (id, event_id, name, price_cents, currency, quantity_available)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING id, event_id, name, price_cents, currency, quantity_available, quantity_sold, created_at, updated_at",
        )
        .bind(Uuid::new_v4())
        .bind(event_id)
        .bind(data.name.trim())
        .bind(data.price_cents)
        .bind(data.currency.to_lowercase())
        .bind(data.quantity_available)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, EventTicket>(
            "SELECT id, event_id, name, price_cents, currency, quantity_available, quantity_sold, created_at, updated_at
             FROM event_tickets WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_by_event(pool: &PgPool, event_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, EventTicket>(
            "SELECT id, event_id, name, price_cents, currency, quantity_available, quantity_sold, created_at, updated_at
             FROM event_tickets WHERE event_id = $1 ORDER BY price_cents ASC",
        )
        .bind(event_id)
        .fetch_all(pool)
        .await
    }

    /// Reserves stock and records the purchase in one transaction. The
    /// conditional update keeps `quantity_sold <= quantity_available` under
    /// concurrent buyers.
    pub async fn purchase(
        pool: &PgPool,
        ticket_id: Uuid,
        user_id: Uuid,
        data: &PurchaseTicket,
    ) -> Result<PurchaseOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let reserved: Option<(i64,)> = sqlx::query_as(
            "UPDATE event_tickets
             SET quantity_sold = quantity_sold + $2, updated_at = NOW()
             WHERE id = $1 AND quantity_sold + $2 <= quantity_available
             RETURNING price_cents",
        )
        .bind(ticket_id)
        .bind(data.quantity)
        .fetch_optional(&mut *tx)
        .await?;

        let Some((price_cents,)) = reserved else {
            tx.rollback().await?;
            return Ok(match Self::find_by_id(pool, ticket_id).await? {
                Some(ticket) => PurchaseOutcome::SoldOut {
                    remaining: ticket.remaining(),
                },
                None => PurchaseOutcome::UnknownTicket,
            });
        };

        let purchase = sqlx::query_as::<_, TicketPurchase>(
            "INSERT INTO ticket_purchases (id, ticket_id, user_id, quantity, total_cents, payment_reference)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING id, ticket_id, user_id, quantity, total_cents, status, payment_reference, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(ticket_id)
        .bind(user_id)
        .bind(data.quantity)
        .bind(price_cents * i64::from(data.quantity))
        .bind(data.payment_reference.as_deref())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(PurchaseOutcome::Purchased(purchase))
    }
}

impl TicketPurchase {
    pub async fn find_by_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, TicketPurchase>(
            "SELECT id, ticket_id, user_id, quantity, total_cents, status, payment_reference, created_at
             FROM ticket_purchases WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }
}
