use axum::{
    extract::{Path, State},
    Extension, Json,
};
use taskman_shared::{
    api::{AssignmentRequest, CreateTaskRequest, TaskDetail, UpdateTaskRequest},
    Task, TaskAssignment,
};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::error::AppError;
use crate::policy::{self, Decision, TaskAction, TaskOwnership};
use crate::routes::AppState;

fn ownership_of(detail: &TaskDetail, user: &AuthUser) -> TaskOwnership {
    TaskOwnership {
        is_creator: detail.task.created_by == user.id,
        is_active_assignee: detail
            .assignments
            .iter()
            .any(|a| a.user_id == user.id && a.is_active),
    }
}

/// Helper to verify the referenced user account exists
async fn verify_user(state: &AppState, user_id: Uuid) -> Result<(), AppError> {
    let exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(&state.db)
        .await?;

    if exists.is_none() {
        return Err(AppError::Validation("User not found".to_string()));
    }
    Ok(())
}

/// GET /api/v1/tasks
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Task>>, AppError> {
    let tasks = if policy::can_list_all(&user.roles) {
        state.tasks.get_all().await?
    } else {
        state.tasks.get_tasks_by_user(user.id).await?
    };

    Ok(Json(tasks))
}

/// GET /api/v1/tasks/:id
pub async fn get_task(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(task_id): Path<Uuid>,
) -> Result<Json<TaskDetail>, AppError> {
    let detail = state
        .tasks
        .get_detail(task_id)
        .await?
        .ok_or(AppError::NotFound)?;

    let ownership = ownership_of(&detail, &user);
    if policy::authorize_task(&user.roles, TaskAction::Read, ownership) != Decision::Allow {
        return Err(AppError::Forbidden);
    }

    Ok(Json(detail))
}

/// POST /api/v1/tasks
pub async fn create_task(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<CreateTaskRequest>,
) -> Result<Json<Task>, AppError> {
    // Any authenticated user may create; the caller becomes the creator.
    let assignee_ids = req.assignee_ids.clone();
    let task = state.tasks.create_task(req, user.id).await?;

    for assignee_id in assignee_ids {
        state.tasks.assign_task(task.id, assignee_id, user.id).await?;
    }

    Ok(Json(task))
}

/// PUT /api/v1/tasks/:id
pub async fn update_task(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(task_id): Path<Uuid>,
    Json(req): Json<UpdateTaskRequest>,
) -> Result<Json<Task>, AppError> {
    let detail = state
        .tasks
        .get_detail(task_id)
        .await?
        .ok_or(AppError::NotFound)?;

    let ownership = ownership_of(&detail, &user);
    let task = match policy::authorize_task(&user.roles, TaskAction::Update, ownership) {
        Decision::Allow => state.tasks.update_task(task_id, req).await?,
        // Active assignees may move the status; every other field in the
        // request is dropped.
        Decision::StatusOnly => state.tasks.update_task_status(task_id, req.status).await?,
        Decision::Deny => return Err(AppError::Forbidden),
    };

    Ok(Json(task))
}

/// DELETE /api/v1/tasks/:id
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(task_id): Path<Uuid>,
) -> Result<(), AppError> {
    let detail = state
        .tasks
        .get_detail(task_id)
        .await?
        .ok_or(AppError::NotFound)?;

    let ownership = ownership_of(&detail, &user);
    if policy::authorize_task(&user.roles, TaskAction::Delete, ownership) != Decision::Allow {
        return Err(AppError::Forbidden);
    }

    if !state.tasks.delete_task(task_id).await? {
        return Err(AppError::NotFound);
    }

    Ok(())
}

/// POST /api/v1/tasks/:id/assign
pub async fn assign_task(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(task_id): Path<Uuid>,
    Json(req): Json<AssignmentRequest>,
) -> Result<Json<TaskAssignment>, AppError> {
    let decision = policy::authorize_task(&user.roles, TaskAction::Assign, TaskOwnership::default());
    if decision != Decision::Allow {
        return Err(AppError::Forbidden);
    }

    verify_user(&state, req.user_id).await?;

    let assignment = state.tasks.assign_task(task_id, req.user_id, user.id).await?;

    Ok(Json(assignment))
}

/// POST /api/v1/tasks/:id/unassign
pub async fn unassign_task(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(task_id): Path<Uuid>,
    Json(req): Json<AssignmentRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let decision =
        policy::authorize_task(&user.roles, TaskAction::Unassign, TaskOwnership::default());
    if decision != Decision::Allow {
        return Err(AppError::Forbidden);
    }

    verify_user(&state, req.user_id).await?;

    let removed = state.tasks.unassign_task(task_id, req.user_id).await?;

    Ok(Json(serde_json::json!({
        "message": "Task unassigned successfully",
        "removed": removed,
    })))
}
