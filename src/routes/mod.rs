use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::config::{create_cors_layer, create_security_headers_layer};
use crate::handlers::{
    analytics, auth, chat, events, health_check, matches, preferences, realtime, reviews, rsvps,
    tickets, venues,
};
use crate::state::AppState;

fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/me", get(auth::me).put(auth::update_me))
        .route("/me/venues", get(venues::list_my_venues))
        .route("/me/purchases", get(tickets::list_my_purchases))
        .route(
            "/preferences",
            get(preferences::get_preference).put(preferences::upsert_preference),
        )
        .route("/matches", get(matches::find_matches))
}

fn venue_routes() -> Router<AppState> {
    Router::new()
        .route("/venues", get(venues::list_venues).post(venues::create_venue))
        .route(
            "/venues/:id",
            get(venues::get_venue)
                .put(venues::update_venue)
                .delete(venues::delete_venue),
        )
        .route(
            "/venues/:id/events",
            get(events::list_venue_events).post(events::create_event),
        )
        .route(
            "/venues/:id/reviews",
            get(reviews::list_venue_reviews).post(reviews::create_review),
        )
        .route(
            "/venues/:id/analytics/regional",
            get(analytics::regional_analytics),
        )
        .route("/reviews/:id", delete(reviews::delete_review))
}

fn event_routes() -> Router<AppState> {
    Router::new()
        .route("/events", get(events::list_events))
        .route(
            "/events/:id",
            get(events::get_event)
                .put(events::update_event)
                .delete(events::delete_event),
        )
        .route("/events/:id/rsvps", get(rsvps::list_event_rsvps))
        .route(
            "/events/:id/rsvp",
            put(rsvps::upsert_rsvp).delete(rsvps::delete_rsvp),
        )
        .route(
            "/events/:id/tickets",
            get(tickets::list_event_tickets).post(tickets::create_ticket),
        )
        .route("/tickets/:id/purchase", post(tickets::purchase_ticket))
}

fn chat_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/chat/requests",
            get(chat::list_requests).post(chat::create_request),
        )
        .route("/chat/requests/:id/respond", post(chat::respond_request))
        .route(
            "/chat/conversations/:user_id",
            get(chat::get_conversation).post(chat::send_message),
        )
        .route("/realtime", get(realtime::realtime_upgrade))
}

pub fn create_routes(state: AppState) -> Router {
    let cors = create_cors_layer(&state.config.allowed_origins);
    let include_hsts = state.config.production;

    let router = Router::new()
        .route("/health", get(health_check))
        .merge(account_routes())
        .merge(venue_routes())
        .merge(event_routes())
        .merge(chat_routes())
        .with_state(state);

    create_security_headers_layer(router, include_hsts)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use http_body_util::BodyExt;
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;
    use uuid::Uuid;

    use crate::auth::token::issue_token;
    use crate::config::Config;
    use crate::models::user::AccountType;

    // The pool never connects; these requests are all answered before any query runs.
    fn test_app() -> (Router, Config) {
        let config = Config::default();
        let pool = PgPoolOptions::new()
            .connect_lazy(&config.database_url)
            .unwrap();
        (create_routes(AppState::new(pool, config.clone())), config)
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_check() {
        let (app, _) = test_app();
        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get("x-content-type-options").unwrap(),
            "nosniff"
        );
        let json = body_json(response).await;
        assert_eq!(json["data"]["service"], "vibeverse-api");
    }

    #[tokio::test]
    async fn test_protected_route_requires_token() {
        let (app, _) = test_app();
        let response = app
            .oneshot(Request::get("/me").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_garbage_token_rejected() {
        let (app, _) = test_app();
        let response = app
            .oneshot(
                Request::get("/matches")
                    .header(header::AUTHORIZATION, "Bearer not-a-jwt")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_register_validation() {
        let (app, _) = test_app();
        let body = serde_json::json!({
            "email": "not-an-email",
            "password": "short",
            "display_name": "Ada"
        });
        let response = app
            .oneshot(
                Request::post("/auth/register")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["success"], false);
    }

    #[tokio::test]
    async fn test_regular_user_cannot_create_venue() {
        let (app, config) = test_app();
        let token = issue_token(
            &config.jwt_secret,
            Uuid::new_v4(),
            "fan@example.com",
            AccountType::User,
        )
        .unwrap();
        let body = serde_json::json!({
            "name": "The Loft",
            "address": "1 Main St",
            "city": "Austin",
            "latitude": 30.27,
            "longitude": -97.74,
            "genre": "jazz"
        });

        let response = app
            .oneshot(
                Request::post("/venues")
                    .header(header::AUTHORIZATION, format!("Bearer {}", token))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_analytics_rejects_bad_radius() {
        let (app, config) = test_app();
        let token = issue_token(
            &config.jwt_secret,
            Uuid::new_v4(),
            "owner@example.com",
            AccountType::Business,
        )
        .unwrap();

        let response = app
            .oneshot(
                Request::get(format!(
                    "/venues/{}/analytics/regional?radius_km=-1",
                    Uuid::new_v4()
                ))
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let (app, _) = test_app();
        let response = app
            .oneshot(Request::get("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    async fn assert_validation_envelope(response: axum::response::Response) {
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
        let json = body_json(response).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_malformed_json_uses_envelope() {
        let (app, _) = test_app();
        let response = app
            .oneshot(
                Request::post("/auth/register")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"email":"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_validation_envelope(response).await;
    }

    #[tokio::test]
    async fn test_bad_path_id_uses_envelope() {
        let (app, _) = test_app();
        let response = app
            .oneshot(Request::get("/venues/not-a-uuid").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_validation_envelope(response).await;
    }

    #[tokio::test]
    async fn test_bad_query_uses_envelope() {
        let (app, _) = test_app();
        let response = app
            .oneshot(Request::get("/realtime").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_validation_envelope(response).await;
    }

    #[tokio::test]
    async fn test_send_message_requires_token() {
        let (app, _) = test_app();
        let response = app
            .oneshot(
                Request::post(format!("/chat/conversations/{}", Uuid::new_v4()))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"content":"hi"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
