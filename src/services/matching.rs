//! Taste matching between users who want to go out on the same day.

use crate::models::preference::{MatchCandidate, Preference};

pub const AGE_BAND_YEARS: i32 = 5;

/// Inclusive age range a preference matches against.
pub fn age_band(age: i32) -> (i32, i32) {
    (age - AGE_BAND_YEARS, age + AGE_BAND_YEARS)
}

/// True when one location contains the other, ignoring case and surrounding
/// whitespace. Blank locations never match.
pub fn locations_overlap(a: &str, b: &str) -> bool {
    let a = a.trim().to_lowercase();
    let b = b.trim().to_lowercase();

    if a.is_empty() || b.is_empty() {
        return false;
    }

    a.contains(&b) || b.contains(&a)
}

pub fn is_match(preference: &Preference, candidate: &MatchCandidate) -> bool {
    let (min_age, max_age) = age_band(preference.age);

    candidate.user_id != preference.user_id
        && candidate.genre == preference.genre
        && candidate.event_date == preference.event_date
        && (min_age..=max_age).contains(&candidate.age)
        && locations_overlap(&preference.location, &candidate.location)
}

/// Keeps the candidates that satisfy every matching rule, in input order.
pub fn filter_candidates(
    preference: &Preference,
    candidates: Vec<MatchCandidate>,
) -> Vec<MatchCandidate> {
    candidates
        .into_iter()
        .filter(|candidate| is_match(preference, candidate))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use uuid::Uuid;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 11, day).unwrap()
    }

    fn preference(age: i32, location: &str) -> Preference {
        Preference {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            genre: "techno".into(),
            age,
            gender: None,
            location: location.into(),
            event_date: date(7),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn candidate(genre: &str, day: u32, age: i32, location: &str) -> MatchCandidate {
        MatchCandidate {
            user_id: Uuid::new_v4(),
            display_name: "Robin".into(),
            genre: genre.into(),
            age,
            gender: Some("nonbinary".into()),
            location: location.into(),
            event_date: date(day),
        }
    }

    #[test]
    fn test_age_band_is_five_years_each_way() {
        assert_eq!(age_band(30), (25, 35));
    }

    #[test]
    fn test_locations_overlap_either_direction() {
        assert!(locations_overlap("Berlin", "Berlin, Germany"));
        assert!(locations_overlap("Berlin Kreuzberg", "berlin"));
        assert!(!locations_overlap("Berlin", "Hamburg"));
        assert!(!locations_overlap("", "Berlin"));
        assert!(!locations_overlap("   ", "   "));
    }

    #[test]
    fn test_only_exact_genre_and_date_match() {
        let pref = preference(30, "Berlin");
        let candidates = vec![
            candidate("techno", 7, 30, "Berlin"),
            candidate("house", 7, 30, "Berlin"),
            candidate("techno", 8, 30, "Berlin"),
            candidate("Techno", 7, 30, "Berlin"),
        ];

        let matches = filter_candidates(&pref, candidates);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].genre, "techno");
        assert_eq!(matches[0].event_date, date(7));
    }

    #[test]
    fn test_age_band_edges_are_inclusive() {
        let pref = preference(30, "Berlin");
        let ages: Vec<i32> = filter_candidates(
            &pref,
            [24, 25, 30, 35, 36]
                .into_iter()
                .map(|age| candidate("techno", 7, age, "Berlin"))
                .collect(),
        )
        .into_iter()
        .map(|c| c.age)
        .collect();

        assert_eq!(ages, vec![25, 30, 35]);
    }

    #[test]
    fn test_location_must_overlap() {
        let pref = preference(30, "Berlin, Germany");
        let matches = filter_candidates(
            &pref,
            vec![
                candidate("techno", 7, 31, "berlin"),
                candidate("techno", 7, 31, "Leipzig"),
            ],
        );
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].location, "berlin");
    }

    #[test]
    fn test_own_row_is_never_a_match() {
        let pref = preference(30, "Berlin");
        let mut own = candidate("techno", 7, 30, "Berlin");
        own.user_id = pref.user_id;
        assert!(!is_match(&pref, &own));
    }
}
