use axum::{extract::State, Extension, Json};
use chrono::Utc;
use taskman_shared::api::{AuthResponse, LoginRequest, RegisterRequest, UserResponse};
use taskman_shared::Role;
use uuid::Uuid;

use crate::auth::{create_access_token, hash_password, verify_password, AuthUser};
use crate::error::AppError;
use crate::routes::AppState;

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    // Validate input
    if req.email.is_empty() || req.password.is_empty() || req.display_name.is_empty() {
        return Err(AppError::Validation("All fields are required".to_string()));
    }

    if req.password.len() < 8 {
        return Err(AppError::Validation(
            "Password must be at least 8 characters".to_string(),
        ));
    }

    // Check if email already exists
    let existing: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE email = $1")
        .bind(&req.email)
        .fetch_optional(&state.db)
        .await?;

    if existing.is_some() {
        return Err(AppError::Conflict("Email already registered".to_string()));
    }

    let password_hash = hash_password(&req.password)?;
    let user_id = Uuid::new_v4();
    let roles = vec![Role::User];

    let mut tx = state.db.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO users (id, email, password_hash, display_name, created_at)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(user_id)
    .bind(&req.email)
    .bind(&password_hash)
    .bind(&req.display_name)
    .bind(Utc::now())
    .execute(&mut *tx)
    .await?;

    // Everyone starts as a plain user; admins grant the rest.
    sqlx::query("INSERT INTO user_roles (user_id, role) VALUES ($1, $2)")
        .bind(user_id)
        .bind(Role::User)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    let access_token = create_access_token(
        user_id,
        &req.email,
        &roles,
        &state.config.jwt_secret,
        state.config.jwt_expires_in,
    )?;

    Ok(Json(AuthResponse {
        access_token,
        user_id,
        roles,
    }))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let row: Option<(Uuid, String, String)> =
        sqlx::query_as("SELECT id, email, password_hash FROM users WHERE email = $1")
            .bind(&req.email)
            .fetch_optional(&state.db)
            .await?;

    let (user_id, email, password_hash) = row.ok_or(AppError::Unauthorized)?;

    if !verify_password(&req.password, &password_hash)? {
        return Err(AppError::Unauthorized);
    }

    let role_rows: Vec<(Role,)> = sqlx::query_as("SELECT role FROM user_roles WHERE user_id = $1")
        .bind(user_id)
        .fetch_all(&state.db)
        .await?;
    let roles: Vec<Role> = role_rows.into_iter().map(|(r,)| r).collect();

    let access_token = create_access_token(
        user_id,
        &email,
        &roles,
        &state.config.jwt_secret,
        state.config.jwt_expires_in,
    )?;

    tracing::info!("User {} logged in", user_id);

    Ok(Json(AuthResponse {
        access_token,
        user_id,
        roles,
    }))
}

/// Tokens are short-lived and stateless; logout is the client discarding
/// its token. The endpoint exists so clients have a uniform flow.
pub async fn logout(Extension(user): Extension<AuthUser>) -> Json<serde_json::Value> {
    tracing::info!("User {} ({}) logged out", user.id, user.email);

    Json(serde_json::json!({ "message": "Logged out successfully" }))
}

pub async fn me(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<UserResponse>, AppError> {
    let row: Option<(Uuid, String, String, chrono::DateTime<Utc>)> = sqlx::query_as(
        "SELECT id, email, display_name, created_at FROM users WHERE id = $1",
    )
    .bind(user.id)
    .fetch_optional(&state.db)
    .await?;

    let (id, email, display_name, created_at) = row.ok_or(AppError::NotFound)?;

    Ok(Json(UserResponse {
        id,
        email,
        display_name,
        roles: user.roles,
        created_at,
    }))
}
