use axum::{extract::State, response::Response};
use tracing::info;
use validator::Validate;

use crate::auth::password::{hash_password, verify_password};
use crate::auth::token::issue_token;
use crate::auth::Claims;
use crate::models::user::{AuthResponse, LoginRequest, RegisterRequest, UpdateProfile, User};
use crate::state::AppState;
use crate::utils::extract::Json;
use crate::utils::response::{created, success};
use crate::utils::{AppError, AppResult};

fn auth_response(state: &AppState, user: User) -> AppResult<AuthResponse> {
    let token = issue_token(
        &state.config.jwt_secret,
        user.id,
        &user.email,
        user.account_type,
    )?;
    Ok(AuthResponse { token, user })
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> AppResult<Response> {
    req.validate()?;

    if User::find_by_email(&state.pool, &req.email).await?.is_some() {
        return Err(AppError::Conflict("Email is already registered".to_string()));
    }

    let password_hash = hash_password(&req.password)?;
    let user = User::create(&state.pool, &req, &password_hash).await?;
    info!(user_id = %user.id, account_type = ?user.account_type, "User registered");

    Ok(created(auth_response(&state, user)?, "Account created"))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<Response> {
    req.validate()?;

    let invalid = || AppError::AuthError("Invalid email or password".to_string());

    let user = User::find_by_email(&state.pool, &req.email)
        .await?
        .ok_or_else(invalid)?;

    if !verify_password(&req.password, &user.password_hash)? {
        return Err(invalid());
    }

    Ok(success(auth_response(&state, user)?, "Logged in"))
}

pub async fn me(State(state): State<AppState>, claims: Claims) -> AppResult<Response> {
    let user = User::find_by_id(&state.pool, claims.user_id())
        .await?
        .ok_or_else(|| AppError::NotFound("Account no longer exists".to_string()))?;

    Ok(success(user, "Profile retrieved"))
}

pub async fn update_me(
    State(state): State<AppState>,
    claims: Claims,
    Json(req): Json<UpdateProfile>,
) -> AppResult<Response> {
    req.validate()?;

    let user = User::update_profile(&state.pool, claims.user_id(), &req)
        .await?
        .ok_or_else(|| AppError::NotFound("Account no longer exists".to_string()))?;

    Ok(success(user, "Profile updated"))
}
