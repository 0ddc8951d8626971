//! Authentication routes for login, register, and token refresh.

use axum::{Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::post};
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;

use crate::AppState;
use saldra_core::auth::{hash_password, verify_password};
use saldra_db::UserRepository;
use saldra_shared::AppError;
use saldra_shared::auth::{
    AuthResponse, LoginRequest, RefreshRequest, RegisterRequest, TokenPair, UserInfo,
};
use saldra_shared::jwt::{JwtError, JwtService};

use super::app_error_response;

/// Creates the auth router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
        .route("/auth/refresh", post(refresh))
}

/// POST /auth/login - Authenticate a user and return tokens.
async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> impl IntoResponse {
    let user_repo = UserRepository::new((*state.db).clone());

    // Find user by email
    let user = match user_repo.find_by_email(&payload.email).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            info!(email = %payload.email, "Login attempt for non-existent user");
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({
                    "error": "invalid_credentials",
                    "message": "Invalid email or password"
                })),
            )
                .into_response();
        }
        Err(e) => {
            error!(error = %e, "Database error during login");
            return app_error_response(&AppError::Internal(
                "login could not be completed".to_string(),
            ));
        }
    };

    // Check if user is active
    if !user.is_active {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "error": "account_disabled",
                "message": "This account has been disabled"
            })),
        )
            .into_response();
    }

    // Verify password
    match verify_password(&payload.password, &user.password_hash) {
        Ok(true) => {}
        Ok(false) => {
            info!(user_id = %user.id, "Failed login attempt - invalid password");
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({
                    "error": "invalid_credentials",
                    "message": "Invalid email or password"
                })),
            )
                .into_response();
        }
        Err(e) => {
            error!(error = %e, "Password verification error");
            return app_error_response(&AppError::Internal(
                "login could not be completed".to_string(),
            ));
        }
    }

    // Generate tokens
    let tokens = match issue_tokens(&state.jwt_service, user.id) {
        Ok(t) => t,
        Err(e) => {
            error!(error = %e, "Failed to generate tokens");
            return app_error_response(&AppError::Internal(
                "login could not be completed".to_string(),
            ));
        }
    };

    info!(user_id = %user.id, "User logged in successfully");

    let response = AuthResponse {
        user: UserInfo {
            id: user.id,
            email: user.email,
            full_name: user.full_name,
        },
        tokens,
    };

    (StatusCode::OK, Json(response)).into_response()
}

/// POST /auth/register - Register a new user.
async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> impl IntoResponse {
    let user_repo = UserRepository::new((*state.db).clone());

    // Check if email already exists
    match user_repo.email_exists(&payload.email).await {
        Ok(true) => {
            return (
                StatusCode::CONFLICT,
                Json(json!({
                    "error": "email_exists",
                    "message": "An account with this email already exists"
                })),
            )
                .into_response();
        }
        Ok(false) => {}
        Err(e) => {
            error!(error = %e, "Database error checking email");
            return app_error_response(&AppError::Internal(
                "registration could not be completed".to_string(),
            ));
        }
    }

    // Hash password
    let password_hash = match hash_password(&payload.password) {
        Ok(h) => h,
        Err(e) => {
            error!(error = %e, "Failed to hash password");
            return app_error_response(&AppError::Internal(
                "registration could not be completed".to_string(),
            ));
        }
    };

    // Create user
    let user = match user_repo
        .create(&payload.email, &password_hash, &payload.full_name)
        .await
    {
        Ok(u) => u,
        Err(e) => {
            error!(error = %e, "Failed to create user");
            return app_error_response(&AppError::Internal(
                "registration could not be completed".to_string(),
            ));
        }
    };

    let tokens = match issue_tokens(&state.jwt_service, user.id) {
        Ok(t) => t,
        Err(e) => {
            error!(error = %e, "Failed to generate tokens");
            return app_error_response(&AppError::Internal(
                "registration could not be completed".to_string(),
            ));
        }
    };

    info!(user_id = %user.id, email = %user.email, "New user registered");

    let response = AuthResponse {
        user: UserInfo {
            id: user.id,
            email: user.email,
            full_name: user.full_name,
        },
        tokens,
    };

    (StatusCode::CREATED, Json(response)).into_response()
}

/// POST /auth/refresh - Exchange a refresh token for a fresh token pair.
async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> impl IntoResponse {
    // Validate refresh token
    let claims = match state
        .jwt_service
        .validate_refresh_token(&payload.refresh_token)
    {
        Ok(c) => c,
        Err(e) => {
            let (error, message) = match e {
                JwtError::Expired => ("token_expired", "Refresh token has expired"),
                _ => ("invalid_token", "Invalid refresh token"),
            };
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": error, "message": message })),
            )
                .into_response();
        }
    };

    // Rotate the pair
    let tokens = match issue_tokens(&state.jwt_service, claims.user_id()) {
        Ok(t) => t,
        Err(e) => {
            error!(error = %e, "Failed to generate tokens");
            return app_error_response(&AppError::Internal(
                "token refresh could not be completed".to_string(),
            ));
        }
    };

    (StatusCode::OK, Json(tokens)).into_response()
}

/// Generates a fresh access/refresh token pair for a user.
fn issue_tokens(jwt: &JwtService, user_id: Uuid) -> Result<TokenPair, JwtError> {
    let access_token = jwt.generate_access_token(user_id)?;
    let refresh_token = jwt.generate_refresh_token(user_id)?;

    Ok(TokenPair::new(
        access_token,
        refresh_token,
        jwt.access_token_expires_in(),
    ))
}
