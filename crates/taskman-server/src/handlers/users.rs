use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use taskman_shared::{
    api::{UpdateUserRolesRequest, UserResponse},
    Role,
};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::error::AppError;
use crate::policy;
use crate::routes::AppState;

type UserRow = (Uuid, String, String, DateTime<Utc>);

async fn roles_of(state: &AppState, user_id: Uuid) -> Result<Vec<Role>, AppError> {
    let rows: Vec<(Role,)> =
        sqlx::query_as("SELECT role FROM user_roles WHERE user_id = $1 ORDER BY role")
            .bind(user_id)
            .fetch_all(&state.db)
            .await?;

    Ok(rows.into_iter().map(|(r,)| r).collect())
}

async fn fetch_user(state: &AppState, user_id: Uuid) -> Result<Option<UserResponse>, AppError> {
    let row: Option<UserRow> = sqlx::query_as(
        "SELECT id, email, display_name, created_at FROM users WHERE id = $1",
    )
    .bind(user_id)
    .fetch_optional(&state.db)
    .await?;

    let Some((id, email, display_name, created_at)) = row else {
        return Ok(None);
    };

    let roles = roles_of(state, id).await?;

    Ok(Some(UserResponse {
        id,
        email,
        display_name,
        roles,
        created_at,
    }))
}

/// GET /api/v1/users
pub async fn list_users(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    if !user.has_role(Role::Admin) {
        return Err(AppError::Forbidden);
    }

    let rows: Vec<UserRow> = sqlx::query_as(
        "SELECT id, email, display_name, created_at FROM users ORDER BY created_at ASC",
    )
    .fetch_all(&state.db)
    .await?;

    let mut responses = Vec::with_capacity(rows.len());
    for (id, email, display_name, created_at) in rows {
        let roles = roles_of(&state, id).await?;
        responses.push(UserResponse {
            id,
            email,
            display_name,
            roles,
            created_at,
        });
    }

    Ok(Json(responses))
}

/// GET /api/v1/users/current
pub async fn current_user(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<UserResponse>, AppError> {
    let response = fetch_user(&state, user.id).await?.ok_or(AppError::NotFound)?;

    Ok(Json(response))
}

/// GET /api/v1/users/:id
pub async fn get_user(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<UserResponse>, AppError> {
    if !user.has_role(Role::Admin) {
        return Err(AppError::Forbidden);
    }

    let response = fetch_user(&state, user_id).await?.ok_or(AppError::NotFound)?;

    Ok(Json(response))
}

/// PUT /api/v1/users/:id/roles
///
/// Replaces the target's role set. Unknown role names already failed at
/// deserialization, so only the admin and self-modification gates remain.
pub async fn update_user_roles(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(user_id): Path<Uuid>,
    Json(req): Json<UpdateUserRolesRequest>,
) -> Result<Json<UserResponse>, AppError> {
    if !policy::can_update_roles(&user.roles, user.id, user_id) {
        if user.has_role(Role::Admin) && user.id == user_id {
            return Err(AppError::Validation(
                "You cannot modify your own roles".to_string(),
            ));
        }
        return Err(AppError::Forbidden);
    }

    let existing = fetch_user(&state, user_id).await?.ok_or(AppError::NotFound)?;

    let mut tx = state.db.begin().await?;

    sqlx::query("DELETE FROM user_roles WHERE user_id = $1")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    for role in &req.roles {
        sqlx::query("INSERT INTO user_roles (user_id, role) VALUES ($1, $2) ON CONFLICT DO NOTHING")
            .bind(user_id)
            .bind(role)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;

    tracing::info!("Updated roles for user {}: {:?}", user_id, req.roles);

    Ok(Json(UserResponse {
        roles: req.roles,
        ..existing
    }))
}
