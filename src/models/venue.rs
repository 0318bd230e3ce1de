use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Venue {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub address: String,
    pub city: String,
    pub latitude: f64,
    pub longitude: f64,
    pub genre: String,
    pub capacity: Option<i32>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateVenue {
    #[validate(length(min = 1, max = 120))]
    #[serde(deserialize_with = "crate::models::trim::string")]
    pub name: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(length(min = 1, max = 255))]
    #[serde(deserialize_with = "crate::models::trim::string")]
    pub address: String,
    #[validate(length(min = 1, max = 100))]
    #[serde(deserialize_with = "crate::models::trim::string")]
    pub city: String,
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,
    #[validate(length(min = 1, max = 50))]
    #[serde(deserialize_with = "crate::models::trim::string")]
    pub genre: String,
    #[validate(range(min = 1))]
    pub capacity: Option<i32>,
    #[validate(url)]
    pub image_url: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateVenue {
    #[validate(length(min = 1, max = 120))]
    #[serde(default, deserialize_with = "crate::models::trim::option")]
    pub name: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(length(min = 1, max = 255))]
    #[serde(default, deserialize_with = "crate::models::trim::option")]
    pub address: Option<String>,
    #[validate(length(min = 1, max = 100))]
    #[serde(default, deserialize_with = "crate::models::trim::option")]
    pub city: Option<String>,
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: Option<f64>,
    #[validate(length(min = 1, max = 50))]
    #[serde(default, deserialize_with = "crate::models::trim::option")]
    pub genre: Option<String>,
    #[validate(range(min = 1))]
    pub capacity: Option<i32>,
    #[validate(url)]
    pub image_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct VenueFilter {
    pub city: Option<String>,
    pub genre: Option<String>,
}

const VENUE_COLUMNS: &str = "id, owner_id, name, description, address, city, latitude, longitude, genre, capacity, image_url, created_at, updated_at";

impl Venue {
    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.owner_id == user_id
    }

    pub async fn create(
        pool: &PgPool,
        owner_id: Uuid,
        data: &CreateVenue,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Venue>(&format!(
            "INSERT INTO venues (id, owner_id, name, description, address, city, latitude, longitude, genre, capacity, image_url)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
             RETURNING {VENUE_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(owner_id)
        .bind(data.name.trim())
        .bind(data.description.as_deref())
        .bind(data.address.trim())
        .bind(data.city.trim())
        .bind(data.latitude)
        .bind(data.longitude)
        .bind(data.genre.trim())
        .bind(data.capacity)
        .bind(data.image_url.as_deref())
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Venue>(&format!("SELECT {VENUE_COLUMNS} FROM venues WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// City and genre match case-insensitively; absent filters match everything.
    pub async fn list(pool: &PgPool, filter: &VenueFilter) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Venue>(&format!(
            "SELECT {VENUE_COLUMNS} FROM venues
             WHERE ($1::TEXT IS NULL OR LOWER(city) = LOWER($1))
               AND ($2::TEXT IS NULL OR LOWER(genre) = LOWER($2))
             ORDER BY name ASC"
        ))
        .bind(filter.city.as_deref())
        .bind(filter.genre.as_deref())
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_owner(pool: &PgPool, owner_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Venue>(&format!(
            "SELECT {VENUE_COLUMNS} FROM venues WHERE owner_id = $1 ORDER BY created_at DESC"
        ))
        .bind(owner_id)
        .fetch_all(pool)
        .await
    }

    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: &UpdateVenue,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Venue>(&format!(
            "UPDATE venues SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                address = COALESCE($4, address),
                city = COALESCE($5, city),
                latitude = COALESCE($6, latitude),
                longitude = COALESCE($7, longitude),
                genre = COALESCE($8, genre),
                capacity = COALESCE($9, capacity),
                image_url = COALESCE($10, image_url),
                updated_at = NOW()
             WHERE id = $1
             RETURNING {VENUE_COLUMNS}"
        ))
        .bind(id)
        .bind(data.name.as_deref().map(str::trim))
        .bind(data.description.as_deref())
        .bind(data.address.as_deref().map(str::trim))
        .bind(data.city.as_deref().map(str::trim))
        .bind(data.latitude)
        .bind(data.longitude)
        .bind(data.genre.as_deref().map(str::trim))
        .bind(data.capacity)
        .bind(data.image_url.as_deref())
        .fetch_optional(pool)
        .await
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM venues WHERE id = $1")
            .bind(id)
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

    fn create_payload() -> CreateVenue {
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

    #[test]
    fn test_valid_venue_passes() {
        assert!(create_payload().validate().is_ok());
    }

    #[test]
    fn test_coordinates_are_bounded() {
        let mut venue = create_payload();
        venue.latitude = 91.0;
        venue.longitude = -181.0;
        let errors = venue.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("latitude"));
        assert!(errors.field_errors().contains_key("longitude"));
    }

    #[test]
    fn test_image_url_must_be_a_url() {
        let mut venue = create_payload();
        venue.image_url = Some("not a url".into());
        assert!(venue.validate().is_err());
    }

    #[test]
    fn test_empty_update_is_valid() {
        assert!(UpdateVenue::default().validate().is_ok());
    }

    #[test]
    fn test_blank_name_is_rejected_after_trimming() {
        let payload: CreateVenue = serde_json::from_value(serde_json::json!({
            "name": "   ",
            "address": "1 Main St",
            "city": " Nashville ",
            "latitude": 36.16,
            "longitude": -86.78,
            "genre": "indie"
        }))
        .unwrap();
        assert_eq!(payload.city, "Nashville");
        let errors = payload.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("name"));
    }

    #[sqlx::test]
    async fn test_created_venue_is_listed_until_deleted(pool: PgPool) {
        let owner = fixtures::user(&pool, AccountType::Business).await;
        let venue = Venue::create(&pool, owner.id, &create_payload()).await.unwrap();

        assert!(Venue::find_by_id(&pool, venue.id).await.unwrap().is_some());
        let filter = VenueFilter {
            city: Some("NASHVILLE".into()),
            genre: None,
        };
        let listed = Venue::list(&pool, &filter).await.unwrap();
        assert!(listed.iter().any(|v| v.id == venue.id));
        assert_eq!(Venue::find_by_owner(&pool, owner.id).await.unwrap().len(), 1);

        assert_eq!(Venue::delete(&pool, venue.id).await.unwrap(), 1);
        assert!(Venue::find_by_id(&pool, venue.id).await.unwrap().is_none());
        assert!(Venue::list(&pool, &filter).await.unwrap().is_empty());
        assert_eq!(Venue::delete(&pool, venue.id).await.unwrap(), 0);
    }

    #[sqlx::test]
    async fn test_partial_update_keeps_other_fields(pool: PgPool) {
        let owner = fixtures::user(&pool, AccountType::Business).await;
        let venue = Venue::create(&pool, owner.id, &create_payload()).await.unwrap();

        let update = UpdateVenue {
            name: Some("The Attic".into()),
            ..Default::default()
        };
        let updated = Venue::update(&pool, venue.id, &update).await.unwrap().unwrap();
        assert_eq!(updated.name, "The Attic");
        assert_eq!(updated.city, venue.city);
        assert_eq!(updated.capacity, venue.capacity);
    }
}
