use chrono::{NaiveDate, Utc};
use taskman_shared::{
    api::{CreateProjectRequest, UpdateProjectRequest},
    Project, ProjectStatus, Task,
};
use uuid::Uuid;

use crate::repo::ProjectRepo;

use super::ServiceError;

fn validate_dates(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<(), ServiceError> {
    if let (Some(start), Some(end)) = (start, end) {
        if end < start {
            return Err(ServiceError::InvalidArgument(
                "Project end date cannot precede start date".to_string(),
            ));
        }
    }
    Ok(())
}

#[derive(Clone)]
pub struct ProjectService {
    repo: ProjectRepo,
}

impl ProjectService {
    pub fn new(repo: ProjectRepo) -> Self {
        Self { repo }
    }

    pub async fn get_all(&self) -> Result<Vec<Project>, ServiceError> {
        Ok(self.repo.list_all().await?)
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Project>, ServiceError> {
        Ok(self.repo.get(id).await?)
    }

    pub async fn create_project(
        &self,
        req: CreateProjectRequest,
        creator_id: Uuid,
    ) -> Result<Project, ServiceError> {
        if req.name.trim().is_empty() {
            return Err(ServiceError::InvalidArgument(
                "Project name cannot be empty".to_string(),
            ));
        }

        if creator_id.is_nil() {
            return Err(ServiceError::InvalidArgument(
                "Creator ID cannot be empty".to_string(),
            ));
        }

        validate_dates(req.start_date, req.end_date)?;

        let project = Project {
            id: Uuid::new_v4(),
            name: req.name,
            description: req.description,
            start_date: req.start_date,
            end_date: req.end_date,
            status: req.status.unwrap_or(ProjectStatus::Planning),
            created_by: creator_id,
            created_at: Utc::now(),
        };

        self.repo.insert(&project).await?;

        Ok(project)
    }

    /// The stored creator never changes; whatever the caller sends, the
    /// original `created_by` is carried forward.
    pub async fn update_project(
        &self,
        id: Uuid,
        req: UpdateProjectRequest,
    ) -> Result<Project, ServiceError> {
        let existing = self.repo.get(id).await?.ok_or(ServiceError::NotFound)?;

        if req.name.trim().is_empty() {
            return Err(ServiceError::InvalidArgument(
                "Project name cannot be empty".to_string(),
            ));
        }

        validate_dates(req.start_date, req.end_date)?;

        let project = Project {
            id: existing.id,
            name: req.name,
            description: req.description,
            start_date: req.start_date,
            end_date: req.end_date,
            status: req.status,
            created_by: existing.created_by,
            created_at: existing.created_at,
        };

        self.repo.update(&project).await?;

        Ok(project)
    }

    /// Cascades to the project's tasks.
    pub async fn delete_project(&self, id: Uuid) -> Result<bool, ServiceError> {
        Ok(self.repo.delete(id).await?)
    }

    pub async fn get_projects_by_user(&self, user_id: Uuid) -> Result<Vec<Project>, ServiceError> {
        if user_id.is_nil() {
            return Err(ServiceError::InvalidArgument(
                "User ID cannot be empty".to_string(),
            ));
        }

        Ok(self.repo.projects_by_user(user_id).await?)
    }

    pub async fn get_tasks_by_project(&self, project_id: Uuid) -> Result<Vec<Task>, ServiceError> {
        Ok(self.repo.tasks_by_project(project_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn end_before_start_is_rejected() {
        let result = validate_dates(Some(date("2026-03-01")), Some(date("2026-02-01")));
        assert!(result.is_err());
    }

    #[test]
    fn open_ended_ranges_are_fine() {
        assert!(validate_dates(Some(date("2026-03-01")), None).is_ok());
        assert!(validate_dates(None, Some(date("2026-03-01"))).is_ok());
        assert!(validate_dates(None, None).is_ok());
        assert!(validate_dates(Some(date("2026-03-01")), Some(date("2026-03-01"))).is_ok());
    }
}
