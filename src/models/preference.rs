use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;
use validator::Validate;

use crate::services::matching::age_band;

/// What a user wants to go to, and with whom they could go.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Preference {
    pub id: Uuid,
    pub user_id: Uuid,
    pub genre: String,
    pub age: i32,
    pub gender: Option<String>,
    pub location: String,
    pub event_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Another user's preference row, as seen by the matcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct MatchCandidate {
    pub user_id: Uuid,
    pub display_name: String,
    pub genre: String,
    pub age: i32,
    pub gender: Option<String>,
    pub location: String,
    pub event_date: NaiveDate,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpsertPreference {
    #[validate(length(min = 1, max = 50))]
    #[serde(deserialize_with = "crate::models::trim::string")]
    pub genre: String,
    #[validate(range(min = 13, max = 120))]
    pub age: i32,
    #[validate(length(max = 32))]
    pub gender: Option<String>,
    #[validate(length(min = 1, max = 100))]
    #[serde(deserialize_with = "crate::models::trim::string")]
    pub location: String,
    pub event_date: NaiveDate,
}

const PREFERENCE_COLUMNS: &str =
    "id, user_id, genre, age, gender, location, event_date, created_at, updated_at";

impl Preference {
    pub async fn find_by_user(pool: &PgPool, user_id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Preference>(&format!(
            "SELECT {PREFERENCE_COLUMNS} FROM user_event_preferences WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn upsert(
        pool: &PgPool,
        user_id: Uuid,
        data: &UpsertPreference,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Preference>(&format!(
            "INSERT INTO user_event_preferences (id, user_id, genre, age, gender, location, event_date)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             ON CONFLICT (user_id) DO UPDATE SET
                genre = EXCLUDED.genre,
                age = EXCLUDED.age,
                gender = EXCLUDED.gender,
                location = EXCLUDED.location,
                event_date = EXCLUDED.event_date,
                updated_at = NOW()
             RETURNING {PREFERENCE_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(data.genre.trim())
        .bind(data.age)
        .bind(data.gender.as_deref())
        .bind(data.location.trim())
        .bind(data.event_date)
        .fetch_one(pool)
        .await
    }

    /// Same genre, same date, age inside the band, anyone but the owner.
    /// The location check happens afterwards in [`crate::services::matching`].
    pub async fn find_candidates(&self, pool: &PgPool) -> Result<Vec<MatchCandidate>, sqlx::Error> {
        let (min_age, max_age) = age_band(self.age);

        sqlx::query_as::<_, MatchCandidate>(
            "SELECT p.user_id, u.display_name, p.genre, p.age, p.gender, p.location, p.event_date
             FROM user_event_preferences p
             JOIN users u ON u.id = p.user_id
             WHERE p.genre = $1
               AND p.event_date = $2
               AND p.user_id <> $3
               AND p.age BETWEEN $4 AND $5",
        )
        .bind(&self.genre)
        .bind(self.event_date)
        .bind(self.user_id)
        .bind(min_age)
        .bind(max_age)
        .fetch_all(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures;
    use crate::models::user::AccountType;

    #[test]
    fn test_preference_validation() {
        let payload: UpsertPreference = serde_json::from_str(
            r#"{"genre":"techno","age":29,"location":"Berlin","event_date":"2026-11-07"}"#,
        )
        .unwrap();
        assert!(payload.validate().is_ok());
        assert_eq!(payload.event_date, NaiveDate::from_ymd_opt(2026, 11, 7).unwrap());

        let blank = UpsertPreference {
            location: String::new(),
            ..payload
        };
        assert!(blank.validate().is_err());
    }

    #[test]
    fn test_blank_location_is_rejected_after_trimming() {
        let payload: UpsertPreference = serde_json::from_str(
            r#"{"genre":"techno","age":29,"location":"   ","event_date":"2026-11-07"}"#,
        )
        .unwrap();
        let errors = payload.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("location"));
    }

    async fn save(
        pool: &PgPool,
        genre: &str,
        age: i32,
        event_date: NaiveDate,
    ) -> Preference {
        let user = fixtures::user(pool, AccountType::User).await;
        let data = UpsertPreference {
            genre: genre.into(),
            age,
            gender: None,
            location: "Berlin".into(),
            event_date,
        };
        Preference::upsert(pool, user.id, &data).await.unwrap()
    }

    #[sqlx::test]
    async fn test_find_candidates_applies_genre_date_and_age(pool: PgPool) {
        let date = NaiveDate::from_ymd_opt(2026, 11, 7).unwrap();
        let next_day = NaiveDate::from_ymd_opt(2026, 11, 8).unwrap();

        let mine = save(&pool, "techno", 30, date).await;
        let at_band_edge = save(&pool, "techno", 35, date).await;
        let younger = save(&pool, "techno", 25, date).await;
        save(&pool, "techno", 36, date).await;
        save(&pool, "house", 30, date).await;
        save(&pool, "techno", 30, next_day).await;

        let mut found: Vec<Uuid> = mine
            .find_candidates(&pool)
            .await
            .unwrap()
            .into_iter()
            .map(|candidate| candidate.user_id)
            .collect();
        found.sort();

        let mut expected = vec![at_band_edge.user_id, younger.user_id];
        expected.sort();
        assert_eq!(found, expected);
        assert!(!found.contains(&mine.user_id));
    }

    #[sqlx::test]
    async fn test_upsert_keeps_one_row_per_user(pool: PgPool) {
        let date = NaiveDate::from_ymd_opt(2026, 11, 7).unwrap();
        let first = save(&pool, "techno", 30, date).await;

        let changed = UpsertPreference {
            genre: "jazz".into(),
            age: 31,
            gender: Some("f".into()),
            location: "Hamburg".into(),
            event_date: date,
        };
        let second = Preference::upsert(&pool, first.user_id, &changed).await.unwrap();

        assert_eq!(second.id, first.id);
        assert_eq!(second.genre, "jazz");
        let stored = Preference::find_by_user(&pool, first.user_id).await.unwrap().unwrap();
        assert_eq!(stored.location, "Hamburg");
    }
}
