use axum::{
    extract::{Path, State},
    Extension, Json,
};
use taskman_shared::{
    api::{CreateProjectRequest, TaskSummary, UpdateProjectRequest},
    Project,
};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::error::AppError;
use crate::policy::{self, Decision, ProjectAction};
use crate::routes::AppState;

/// GET /api/v1/projects
pub async fn list_projects(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Project>>, AppError> {
    let projects = if policy::can_list_all(&user.roles) {
        state.projects.get_all().await?
    } else {
        state.projects.get_projects_by_user(user.id).await?
    };

    Ok(Json(projects))
}

/// GET /api/v1/projects/:id
pub async fn get_project(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(project_id): Path<Uuid>,
) -> Result<Json<Project>, AppError> {
    let project = state
        .projects
        .get(project_id)
        .await?
        .ok_or(AppError::NotFound)?;

    let is_creator = project.created_by == user.id;
    if policy::authorize_project(&user.roles, ProjectAction::Read, is_creator) != Decision::Allow {
        return Err(AppError::Forbidden);
    }

    Ok(Json(project))
}

/// POST /api/v1/projects
pub async fn create_project(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<CreateProjectRequest>,
) -> Result<Json<Project>, AppError> {
    // Any authenticated user may create; the caller becomes the creator.
    let project = state.projects.create_project(req, user.id).await?;

    Ok(Json(project))
}

/// PUT /api/v1/projects/:id
pub async fn update_project(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(project_id): Path<Uuid>,
    Json(req): Json<UpdateProjectRequest>,
) -> Result<Json<Project>, AppError> {
    let existing = state
        .projects
        .get(project_id)
        .await?
        .ok_or(AppError::NotFound)?;

    let is_creator = existing.created_by == user.id;
    if policy::authorize_project(&user.roles, ProjectAction::Update, is_creator) != Decision::Allow
    {
        return Err(AppError::Forbidden);
    }

    let project = state.projects.update_project(project_id, req).await?;

    Ok(Json(project))
}

/// DELETE /api/v1/projects/:id
pub async fn delete_project(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(project_id): Path<Uuid>,
) -> Result<(), AppError> {
    let existing = state
        .projects
        .get(project_id)
        .await?
        .ok_or(AppError::NotFound)?;

    let is_creator = existing.created_by == user.id;
    if policy::authorize_project(&user.roles, ProjectAction::Delete, is_creator) != Decision::Allow
    {
        return Err(AppError::Forbidden);
    }

    if !state.projects.delete_project(project_id).await? {
        return Err(AppError::NotFound);
    }

    Ok(())
}

/// GET /api/v1/projects/:id/tasks
pub async fn list_project_tasks(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(project_id): Path<Uuid>,
) -> Result<Json<Vec<TaskSummary>>, AppError> {
    let project = state
        .projects
        .get(project_id)
        .await?
        .ok_or(AppError::NotFound)?;

    let is_creator = project.created_by == user.id;
    if policy::authorize_project(&user.roles, ProjectAction::ListTasks, is_creator)
        != Decision::Allow
    {
        return Err(AppError::Forbidden);
    }

    let tasks = state.projects.get_tasks_by_project(project_id).await?;
    let summaries = tasks
        .into_iter()
        .map(|t| TaskSummary {
            id: t.id,
            title: t.title,
            due_date: t.due_date,
            priority: t.priority,
            status: t.status,
        })
        .collect();

    Ok(Json(summaries))
}
