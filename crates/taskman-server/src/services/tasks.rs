use chrono::{DateTime, Utc};
use taskman_shared::{
    api::{CreateTaskRequest, TaskDetail, UpdateTaskRequest},
    Priority, Task, TaskAssignment, TaskStatus,
};
use uuid::Uuid;

use crate::repo::TaskRepo;

use super::ServiceError;

/// Derives `completed_at` from a status write. This is the one enforced
/// piece of the status state machine: the timestamp is set exactly when
/// the status is Completed.
///
/// - entering Completed without a timestamp stamps `now`
/// - staying Completed keeps the existing timestamp
/// - leaving Completed clears it
fn completed_at_for(
    status: TaskStatus,
    current: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    if status == TaskStatus::Completed {
        current.or(Some(now))
    } else {
        None
    }
}

#[derive(Clone)]
pub struct TaskService {
    repo: TaskRepo,
}

impl TaskService {
    pub fn new(repo: TaskRepo) -> Self {
        Self { repo }
    }

    pub async fn get_all(&self) -> Result<Vec<Task>, ServiceError> {
        Ok(self.repo.list_all().await?)
    }

    pub async fn get_detail(&self, id: Uuid) -> Result<Option<TaskDetail>, ServiceError> {
        Ok(self.repo.get_detail(id).await?)
    }

    pub async fn create_task(
        &self,
        req: CreateTaskRequest,
        creator_id: Uuid,
    ) -> Result<Task, ServiceError> {
        if req.title.trim().is_empty() {
            return Err(ServiceError::InvalidArgument(
                "Task title cannot be empty".to_string(),
            ));
        }

        let now = Utc::now();
        let status = req.status.unwrap_or(TaskStatus::Todo);

        let task = Task {
            id: Uuid::new_v4(),
            title: req.title,
            description: req.description,
            due_date: req.due_date,
            priority: req.priority.unwrap_or(Priority::Medium),
            status,
            created_at: now,
            completed_at: completed_at_for(status, None, now),
            project_id: req.project_id,
            created_by: creator_id,
        };

        self.repo.insert(&task).await?;

        if !req.category_ids.is_empty() {
            self.repo.set_categories(task.id, &req.category_ids).await?;
        }

        Ok(task)
    }

    /// Full update of every mutable field. The creator never changes.
    pub async fn update_task(
        &self,
        id: Uuid,
        req: UpdateTaskRequest,
    ) -> Result<Task, ServiceError> {
        let existing = self.repo.get(id).await?.ok_or(ServiceError::NotFound)?;

        if req.title.trim().is_empty() {
            return Err(ServiceError::InvalidArgument(
                "Task title cannot be empty".to_string(),
            ));
        }

        let now = Utc::now();
        let task = Task {
            id: existing.id,
            title: req.title,
            description: req.description,
            due_date: req.due_date,
            priority: req.priority,
            status: req.status,
            created_at: existing.created_at,
            completed_at: completed_at_for(req.status, existing.completed_at, now),
            project_id: req.project_id,
            created_by: existing.created_by,
        };

        self.repo.update(&task).await?;

        if let Some(ref category_ids) = req.category_ids {
            self.repo.set_categories(task.id, category_ids).await?;
        }

        Ok(task)
    }

    /// Status-scoped update for callers whose only right to the task is an
    /// active assignment. Completed-at bookkeeping still applies.
    pub async fn update_task_status(
        &self,
        id: Uuid,
        status: TaskStatus,
    ) -> Result<Task, ServiceError> {
        let mut task = self.repo.get(id).await?.ok_or(ServiceError::NotFound)?;

        let now = Utc::now();
        task.completed_at = completed_at_for(status, task.completed_at, now);
        task.status = status;

        self.repo.update(&task).await?;

        Ok(task)
    }

    pub async fn delete_task(&self, id: Uuid) -> Result<bool, ServiceError> {
        Ok(self.repo.delete(id).await?)
    }

    pub async fn get_tasks_by_user(&self, user_id: Uuid) -> Result<Vec<Task>, ServiceError> {
        if user_id.is_nil() {
            return Err(ServiceError::InvalidArgument(
                "User ID cannot be empty".to_string(),
            ));
        }

        Ok(self.repo.tasks_by_user(user_id).await?)
    }

    /// Assigns a user to a task. Any prior active assignment for the same
    /// (task, user) pair is deactivated first, so at most one row stays
    /// active; the partial unique index backstops concurrent callers.
    pub async fn assign_task(
        &self,
        task_id: Uuid,
        user_id: Uuid,
        assigned_by: Uuid,
    ) -> Result<TaskAssignment, ServiceError> {
        if user_id.is_nil() {
            return Err(ServiceError::InvalidArgument(
                "Assignee ID cannot be empty".to_string(),
            ));
        }

        if !self.repo.exists(task_id).await? {
            return Err(ServiceError::NotFound);
        }

        let now = Utc::now();
        self.repo.deactivate_assignments(task_id, user_id, now).await?;

        let assignment = TaskAssignment {
            id: Uuid::new_v4(),
            task_id,
            user_id,
            assigned_by,
            assigned_at: now,
            is_active: true,
            deactivated_at: None,
        };

        self.repo.insert_assignment(&assignment).await?;

        Ok(assignment)
    }

    /// Deactivates all active assignments for the pair; false when none
    /// matched.
    pub async fn unassign_task(&self, task_id: Uuid, user_id: Uuid) -> Result<bool, ServiceError> {
        if user_id.is_nil() {
            return Err(ServiceError::InvalidArgument(
                "Assignee ID cannot be empty".to_string(),
            ));
        }

        if !self.repo.exists(task_id).await? {
            return Err(ServiceError::NotFound);
        }

        let deactivated = self
            .repo
            .deactivate_assignments(task_id, user_id, Utc::now())
            .await?;

        Ok(deactivated > 0)
    }

    pub async fn count(&self) -> Result<i64, ServiceError> {
        Ok(self.repo.count().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entering_completed_stamps_now() {
        let now = Utc::now();
        assert_eq!(completed_at_for(TaskStatus::Completed, None, now), Some(now));
    }

    #[test]
    fn staying_completed_keeps_original_timestamp() {
        let then = Utc::now() - chrono::Duration::hours(3);
        let now = Utc::now();
        assert_eq!(
            completed_at_for(TaskStatus::Completed, Some(then), now),
            Some(then)
        );
    }

    #[test]
    fn leaving_completed_clears_timestamp() {
        let then = Utc::now() - chrono::Duration::hours(3);
        let now = Utc::now();
        for status in [
            TaskStatus::Todo,
            TaskStatus::InProgress,
            TaskStatus::Review,
            TaskStatus::Canceled,
        ] {
            assert_eq!(completed_at_for(status, Some(then), now), None);
        }
    }

    #[test]
    fn timestamp_is_present_iff_completed() {
        // The invariant from both ends: derive for every status, with and
        // without a prior timestamp.
        let then = Utc::now();
        let now = Utc::now();
        for status in [
            TaskStatus::Todo,
            TaskStatus::InProgress,
            TaskStatus::Review,
            TaskStatus::Completed,
            TaskStatus::Canceled,
        ] {
            for current in [None, Some(then)] {
                let derived = completed_at_for(status, current, now);
                assert_eq!(derived.is_some(), status == TaskStatus::Completed);
            }
        }
    }
}
