//! Regional breakdown of a venue's audience.
//!
//! Reviews and RSVPs may carry the coordinates and city/region the client
//! reported when they were written. For a venue and a radius this module keeps
//! the records that fall inside the radius, groups them by region (falling back
//! to city, then `"Unknown"`) and summarises each group. Records without usable
//! coordinates are skipped. Nothing is cached; every call recomputes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::review::Review;
use crate::models::rsvp::{Rsvp, RsvpCounts};

pub const EARTH_RADIUS_KM: f64 = 6371.0;
pub const DEFAULT_RADIUS_KM: f64 = 50.0;
/// Half the Earth's circumference, rounded up. Anything larger covers the globe.
pub const MAX_RADIUS_KM: f64 = 20_040.0;
pub const UNKNOWN_REGION: &str = "Unknown";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    /// `None` for non-finite or out-of-range coordinates.
    pub fn new(latitude: f64, longitude: f64) -> Option<Self> {
        let valid = latitude.is_finite()
            && longitude.is_finite()
            && (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude);

        valid.then_some(Self {
            latitude,
            longitude,
        })
    }

    fn from_parts(latitude: Option<f64>, longitude: Option<f64>) -> Option<Self> {
        Self::new(latitude?, longitude?)
    }
}

/// Great-circle distance in kilometres.
pub fn haversine_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();
    let lat_a = a.latitude.to_radians();
    let lat_b = b.latitude.to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_KM * c
}

/// A record that may have been written from a known place.
pub trait Geotagged {
    fn location(&self) -> Option<GeoPoint>;
    fn region(&self) -> Option<&str>;
    fn city(&self) -> Option<&str>;

    fn region_key(&self) -> &str {
        non_blank(self.region())
            .or_else(|| non_blank(self.city()))
            .unwrap_or(UNKNOWN_REGION)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

impl Geotagged for Review {
    fn location(&self) -> Option<GeoPoint> {
        GeoPoint::from_parts(self.latitude, self.longitude)
    }

    fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    fn city(&self) -> Option<&str> {
        self.city.as_deref()
    }
}

impl Geotagged for Rsvp {
    fn location(&self) -> Option<GeoPoint> {
        GeoPoint::from_parts(self.latitude, self.longitude)
    }

    fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    fn city(&self) -> Option<&str> {
        self.city.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionalReviewSummary {
    pub region: String,
    pub count: usize,
    pub average_rating: f64,
    pub closest_km: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionalRsvpSummary {
    pub region: String,
    pub count: usize,
    #[serde(flatten)]
    pub statuses: RsvpCounts,
    pub closest_km: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegionalReport {
    pub origin: GeoPoint,
    pub radius_km: f64,
    pub total_reviews_in_radius: usize,
    pub total_rsvps_in_radius: usize,
    pub reviews: Vec<RegionalReviewSummary>,
    pub rsvps: Vec<RegionalRsvpSummary>,
}

/// Records inside the radius (inclusive), paired with their distance.
fn within_radius<'a, T: Geotagged>(
    origin: GeoPoint,
    radius_km: f64,
    records: &'a [T],
) -> impl Iterator<Item = (&'a T, f64)> + 'a {
    records.iter().filter_map(move |record| {
        let distance = haversine_km(origin, record.location()?);
        (distance <= radius_km).then_some((record, distance))
    })
}

#[derive(Default)]
struct ReviewBucket {
    count: usize,
    rating_sum: i64,
    closest_km: f64,
}

#[derive(Default)]
struct RsvpBucket {
    statuses: RsvpCounts,
    closest_km: f64,
}

/// Largest group first; equal counts by region name.
fn sort_by_count<T>(summaries: &mut [T], count: impl Fn(&T) -> usize) {
    summaries.sort_by(|a, b| count(b).cmp(&count(a)));
}

pub fn bucket_reviews(
    origin: GeoPoint,
    radius_km: f64,
    reviews: &[Review],
) -> Vec<RegionalReviewSummary> {
    let mut buckets: BTreeMap<String, ReviewBucket> = BTreeMap::new();

    for (review, distance) in within_radius(origin, radius_km, reviews) {
        let bucket = buckets
            .entry(review.region_key().to_string())
            .or_insert_with(|| ReviewBucket {
                closest_km: f64::INFINITY,
                ..Default::default()
            });
        bucket.count += 1;
        bucket.rating_sum += i64::from(review.rating);
        bucket.closest_km = bucket.closest_km.min(distance);
    }

    let mut summaries: Vec<RegionalReviewSummary> = buckets
        .into_iter()
        .map(|(region, bucket)| RegionalReviewSummary {
            region,
            count: bucket.count,
            average_rating: bucket.rating_sum as f64 / bucket.count as f64,
            closest_km: bucket.closest_km,
        })
        .collect();

    sort_by_count(&mut summaries, |s| s.count);
    summaries
}

pub fn bucket_rsvps(
    origin: GeoPoint,
    radius_km: f64,
    rsvps: &[Rsvp],
) -> Vec<RegionalRsvpSummary> {
    let mut buckets: BTreeMap<String, RsvpBucket> = BTreeMap::new();

    for (rsvp, distance) in within_radius(origin, radius_km, rsvps) {
        let bucket = buckets
            .entry(rsvp.region_key().to_string())
            .or_insert_with(|| RsvpBucket {
                closest_km: f64::INFINITY,
                ..Default::default()
            });
        bucket.statuses.record(rsvp.status);
        bucket.closest_km = bucket.closest_km.min(distance);
    }

    let mut summaries: Vec<RegionalRsvpSummary> = buckets
        .into_iter()
        .map(|(region, bucket)| RegionalRsvpSummary {
            region,
            count: bucket.statuses.total() as usize,
            statuses: bucket.statuses,
            closest_km: bucket.closest_km,
        })
        .collect();

    sort_by_count(&mut summaries, |s| s.count);
    summaries
}

pub fn regional_report(
    origin: GeoPoint,
    radius_km: f64,
    reviews: &[Review],
    rsvps: &[Rsvp],
) -> RegionalReport {
    let reviews = bucket_reviews(origin, radius_km, reviews);
    let rsvps = bucket_rsvps(origin, radius_km, rsvps);

    RegionalReport {
        origin,
        radius_km,
        total_reviews_in_radius: reviews.iter().map(|s| s.count).sum(),
        total_rsvps_in_radius: rsvps.iter().map(|s| s.count).sum(),
        reviews,
        rsvps,
    }
}
