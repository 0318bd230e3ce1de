use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Type};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "account_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    #[default]
    User,
    /// May own venues and sell tickets.
    Business,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub display_name: String,
    pub account_type: AccountType,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub city: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    #[validate(length(min = 1, max = 64))]
    #[serde(deserialize_with = "crate::models::trim::string")]
    pub display_name: String,
    #[serde(default)]
    pub account_type: AccountType,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateProfile {
    #[validate(length(min = 1, max = 64))]
    #[serde(default, deserialize_with = "crate::models::trim::option")]
    pub display_name: Option<String>,
    #[validate(range(min = 13, max = 120))]
    pub age: Option<i32>,
    #[validate(length(max = 32))]
    pub gender: Option<String>,
    #[validate(length(max = 100))]
    pub city: Option<String>,
}

const USER_COLUMNS: &str = "id, email, password_hash, display_name, account_type, age, gender, city, created_at, updated_at";

impl User {
    pub async fn create(
        pool: &PgPool,
        data: &RegisterRequest,
        password_hash: &str,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (id, email, password_hash, display_name, account_type)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {USER_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(data.email.trim().to_lowercase())
        .bind(password_hash)
        .bind(data.display_name.trim())
        .bind(data.account_type)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email.trim().to_lowercase())
        .fetch_optional(pool)
        .await
    }

    /// Absent fields keep their stored value.
    pub async fn update_profile(
        pool: &PgPool,
        id: Uuid,
        data: &UpdateProfile,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET
                display_name = COALESCE($2, display_name),
                age = COALESCE($3, age),
                gender = COALESCE($4, gender),
                city = COALESCE($5, city),
                updated_at = NOW()
             WHERE id = $1
             RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(data.display_name.as_deref().map(str::trim))
        .bind(data.age)
        .bind(data.gender.as_deref())
        .bind(data.city.as_deref())
        .fetch_optional(pool)
        .await
    }
}
