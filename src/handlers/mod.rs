use axum::response::Response;
use serde::Serialize;

use crate::utils::response::success;

pub mod analytics;
pub mod auth;
pub mod chat;
pub mod events;
pub mod matches;
pub mod preferences;
pub mod realtime;
pub mod reviews;
pub mod rsvps;
pub mod tickets;
pub mod venues;

#[derive(Serialize)]
struct HealthPayload {
    status: &'static str,
    service: &'static str,
    version: &'static str,
}

pub async fn health_check() -> Response {
    let payload = HealthPayload {
        status: "ok",
        service: "vibeverse-api",
        version: env!("CARGO_PKG_VERSION"),
    };

    success(payload, "Health check successful")
}
