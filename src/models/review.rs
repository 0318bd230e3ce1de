use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Review {
    pub id: Uuid,
    pub venue_id: Uuid,
    pub user_id: Uuid,
    pub rating: i32,
    pub comment: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ReviewWithAuthor {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub review: Review,
    pub author_name: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateReview {
    #[validate(range(min = 1, max = 5))]
    pub rating: i32,
    #[validate(length(max = 2000))]
    pub comment: Option<String>,
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: Option<f64>,
    #[validate(length(max = 100))]
    pub city: Option<String>,
    #[validate(length(max = 100))]
    pub region: Option<String>,
}

const REVIEW_COLUMNS: &str =
    "id, venue_id, user_id, rating, comment, latitude, longitude, city, region, created_at";

impl Review {
    pub async fn create(
        pool: &PgPool,
        venue_id: Uuid,
        user_id: Uuid,
        data: &CreateReview,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Review>(&format!(
            "INSERT INTO reviews (id, venue_id, user_id, rating, comment, latitude, longitude, city, region)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING {REVIEW_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(venue_id)
        .bind(user_id)
        .bind(data.rating)
        .bind(data.comment.as_deref())
        .bind(data.latitude)
        .bind(data.longitude)
        .bind(data.city.as_deref())
        .bind(data.region.as_deref())
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Review>(&format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_by_venue(pool: &PgPool, venue_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Review>(&format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews WHERE venue_id = $1 ORDER BY created_at DESC"
        ))
        .bind(venue_id)
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_venue_with_authors(
        pool: &PgPool,
        venue_id: Uuid,
    ) -> Result<Vec<ReviewWithAuthor>, sqlx::Error> {
        sqlx::query_as::<_, ReviewWithAuthor>(
            "SELECT r.id, r.venue_id, r.user_id, r.rating, r.comment, r.latitude, r.longitude,
                    r.city, r.region, r.created_at, u.display_name AS author_name
             FROM reviews r
             JOIN users u ON u.id = r.user_id
             WHERE r.venue_id = $1
             ORDER BY r.created_at DESC",
        )
        .bind(venue_id)
        .fetch_all(pool)
        .await
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_must_be_one_to_five() {
        for (rating, ok) in [(0, false), (1, true), (5, true), (6, false)] {
            let review = CreateReview {
                rating,
                comment: None,
                latitude: None,
                longitude: None,
                city: None,
                region: None,
            };
            assert_eq!(review.validate().is_ok(), ok, "rating {rating}");
        }
    }

    #[test]
    fn test_author_name_is_flattened() {
        let row = ReviewWithAuthor {
            review: Review {
                id: Uuid::new_v4(),
                venue_id: Uuid::new_v4(),
                user_id: Uuid::new_v4(),
                rating: 4,
                comment: Some("Great sound".into()),
                latitude: None,
                longitude: None,
                city: Some("Austin".into()),
                region: None,
                created_at: Utc::now(),
            },
            author_name: "Sam".into(),
        };
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["author_name"], "Sam");
        assert_eq!(json["rating"], 4);
    }
}
