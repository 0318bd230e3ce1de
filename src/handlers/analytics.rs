use axum::{extract::State, response::Response};
use serde::Deserialize;
use uuid::Uuid;

use super::venues::load_owned_venue;
use crate::auth::Claims;
use crate::models::review::Review;
use crate::models::rsvp::Rsvp;
use crate::services::analytics::{
    regional_report, GeoPoint, DEFAULT_RADIUS_KM, MAX_RADIUS_KM,
};
use crate::state::AppState;
use crate::utils::extract::{Path, Query};
use crate::utils::response::success;
use crate::utils::{AppError, AppResult};

#[derive(Debug, Deserialize)]
pub struct RegionalQuery {
    pub radius_km: Option<f64>,
}

pub(crate) fn resolve_radius(requested: Option<f64>) -> AppResult<f64> {
    let radius = requested.unwrap_or(DEFAULT_RADIUS_KM);
    if !radius.is_finite() || radius <= 0.0 || radius > MAX_RADIUS_KM {
        return Err(AppError::ValidationError(format!(
            "radius_km must be greater than 0 and at most {}",
            MAX_RADIUS_KM
        )));
    }
    Ok(radius)
}

pub async fn regional_analytics(
    State(state): State<AppState>,
    Path(venue_id): Path<Uuid>,
    Query(query): Query<RegionalQuery>,
    claims: Claims,
) -> AppResult<Response> {
    let radius_km = resolve_radius(query.radius_km)?;
    let venue = load_owned_venue(&state.pool, venue_id, &claims).await?;

    let origin = GeoPoint::new(venue.latitude, venue.longitude).ok_or_else(|| {
        AppError::InternalServerError(format!("Venue '{}' has invalid coordinates", venue_id))
    })?;

    let reviews = Review::find_by_venue(&state.pool, venue_id).await?;
    let rsvps = Rsvp::find_by_venue(&state.pool, venue_id).await?;

    let report = regional_report(origin, radius_km, &reviews, &rsvps);
    Ok(success(report, "Regional analytics computed"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_radius_defaults() {
        assert_eq!(resolve_radius(None).unwrap(), DEFAULT_RADIUS_KM);
        assert_eq!(resolve_radius(Some(12.5)).unwrap(), 12.5);
    }

    #[test]
    fn test_radius_bounds() {
        assert!(resolve_radius(Some(0.0)).is_err());
        assert!(resolve_radius(Some(-3.0)).is_err());
        assert!(resolve_radius(Some(f64::INFINITY)).is_err());
        assert!(resolve_radius(Some(MAX_RADIUS_KM + 1.0)).is_err());
    }
}
