use chrono::{DateTime, NaiveDate, Utc};
use taskman_shared::{
    api::TaskDetail, Category, Comment, Priority, Task, TaskAssignment, TaskStatus,
};
use uuid::Uuid;

use crate::db::DbPool;

pub(crate) type TaskRow = (
    Uuid,                          // id
    String,                        // title
    Option<String>,                // description
    Option<NaiveDate>,             // due_date
    Priority,                      // priority
    TaskStatus,                    // status
    DateTime<Utc>,                 // created_at
    Option<DateTime<Utc>>,         // completed_at
    Option<Uuid>,                  // project_id
    Uuid,                          // created_by
);

pub(crate) fn row_to_task(row: TaskRow) -> Task {
    Task {
        id: row.0,
        title: row.1,
        description: row.2,
        due_date: row.3,
        priority: row.4,
        status: row.5,
        created_at: row.6,
        completed_at: row.7,
        project_id: row.8,
        created_by: row.9,
    }
}

pub(crate) const TASK_COLUMNS: &str =
    "id, title, description, due_date, priority, status, created_at, completed_at, project_id, created_by";

type AssignmentRow = (
    Uuid,                  // id
    Uuid,                  // task_id
    Uuid,                  // user_id
    Uuid,                  // assigned_by
    DateTime<Utc>,         // assigned_at
    bool,                  // is_active
    Option<DateTime<Utc>>, // deactivated_at
);

fn row_to_assignment(row: AssignmentRow) -> TaskAssignment {
    TaskAssignment {
        id: row.0,
        task_id: row.1,
        user_id: row.2,
        assigned_by: row.3,
        assigned_at: row.4,
        is_active: row.5,
        deactivated_at: row.6,
    }
}

/// Persistence for tasks and their assignment rows. Every method returns
/// fully-materialized data; callers never traverse lazy relations.
#[derive(Clone)]
pub struct TaskRepo {
    db: DbPool,
}

impl TaskRepo {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    pub async fn list_all(&self) -> Result<Vec<Task>, sqlx::Error> {
        let rows: Vec<TaskRow> = sqlx::query_as(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks ORDER BY created_at DESC"
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(row_to_task).collect())
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Task>, sqlx::Error> {
        let row: Option<TaskRow> =
            sqlx::query_as(&format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.db)
                .await?;

        Ok(row.map(row_to_task))
    }

    /// Task with assignments, categories and comments attached.
    pub async fn get_detail(&self, id: Uuid) -> Result<Option<TaskDetail>, sqlx::Error> {
        let Some(task) = self.get(id).await? else {
            return Ok(None);
        };

        let assignments = self.assignments_by_task(id).await?;

        let category_rows: Vec<(Uuid, String, Option<String>)> = sqlx::query_as(
            r#"
            SELECT c.id, c.name, c.color
            FROM categories c
            JOIN task_categories tc ON tc.category_id = c.id
            WHERE tc.task_id = $1
            ORDER BY c.name ASC
            "#,
        )
        .bind(id)
        .fetch_all(&self.db)
        .await?;

        let categories = category_rows
            .into_iter()
            .map(|(id, name, color)| Category { id, name, color })
            .collect();

        let comment_rows: Vec<(Uuid, Uuid, Uuid, String, DateTime<Utc>)> = sqlx::query_as(
            r#"
            SELECT id, task_id, user_id, content, created_at
            FROM comments
            WHERE task_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(id)
        .fetch_all(&self.db)
        .await?;

        let comments = comment_rows
            .into_iter()
            .map(|(id, task_id, user_id, content, created_at)| Comment {
                id,
                task_id,
                user_id,
                content,
                created_at,
            })
            .collect();

        Ok(Some(TaskDetail {
            task,
            assignments,
            categories,
            comments,
        }))
    }

    pub async fn insert(&self, task: &Task) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO tasks (id, title, description, due_date, priority, status,
                               created_at, completed_at, project_id, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(task.id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.due_date)
        .bind(task.priority)
        .bind(task.status)
        .bind(task.created_at)
        .bind(task.completed_at)
        .bind(task.project_id)
        .bind(task.created_by)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    pub async fn update(&self, task: &Task) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE tasks
            SET title = $1, description = $2, due_date = $3, priority = $4,
                status = $5, completed_at = $6, project_id = $7
            WHERE id = $8
            "#,
        )
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.due_date)
        .bind(task.priority)
        .bind(task.status)
        .bind(task.completed_at)
        .bind(task.project_id)
        .bind(task.id)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    /// Comments, assignments and category links go with the task (FK cascade).
    pub async fn delete(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Tasks the user created plus tasks with an active assignment for them.
    pub async fn tasks_by_user(&self, user_id: Uuid) -> Result<Vec<Task>, sqlx::Error> {
        let rows: Vec<TaskRow> = sqlx::query_as(&format!(
            r#"
            SELECT {TASK_COLUMNS} FROM tasks t
            WHERE t.created_by = $1
               OR EXISTS (
                    SELECT 1 FROM task_assignments a
                    WHERE a.task_id = t.id AND a.user_id = $1 AND a.is_active
                  )
            ORDER BY t.created_at DESC
            "#
        ))
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(row_to_task).collect())
    }

    pub async fn exists(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        let row: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM tasks WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        Ok(row.is_some())
    }

    pub async fn assignments_by_task(
        &self,
        task_id: Uuid,
    ) -> Result<Vec<TaskAssignment>, sqlx::Error> {
        let rows: Vec<AssignmentRow> = sqlx::query_as(
            r#"
            SELECT id, task_id, user_id, assigned_by, assigned_at, is_active, deactivated_at
            FROM task_assignments
            WHERE task_id = $1
            ORDER BY assigned_at ASC
            "#,
        )
        .bind(task_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(row_to_assignment).collect())
    }

    pub async fn insert_assignment(
        &self,
        assignment: &TaskAssignment,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO task_assignments (id, task_id, user_id, assigned_by,
                                          assigned_at, is_active, deactivated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(assignment.id)
        .bind(assignment.task_id)
        .bind(assignment.user_id)
        .bind(assignment.assigned_by)
        .bind(assignment.assigned_at)
        .bind(assignment.is_active)
        .bind(assignment.deactivated_at)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    /// Deactivates every active assignment for the (task, user) pair.
    /// Returns how many rows were flipped.
    pub async fn deactivate_assignments(
        &self,
        task_id: Uuid,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE task_assignments
            SET is_active = FALSE, deactivated_at = $3
            WHERE task_id = $1 AND user_id = $2 AND is_active
            "#,
        )
        .bind(task_id)
        .bind(user_id)
        .bind(now)
        .execute(&self.db)
        .await?;

        Ok(result.rows_affected())
    }

    pub async fn set_categories(
        &self,
        task_id: Uuid,
        category_ids: &[Uuid],
    ) -> Result<(), sqlx::Error> {
        let mut tx = self.db.begin().await?;

        sqlx::query("DELETE FROM task_categories WHERE task_id = $1")
            .bind(task_id)
            .execute(&mut *tx)
            .await?;

        for category_id in category_ids {
            sqlx::query("INSERT INTO task_categories (task_id, category_id) VALUES ($1, $2)")
                .bind(task_id)
                .bind(category_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        Ok(())
    }

    pub async fn count(&self) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tasks")
            .fetch_one(&self.db)
            .await?;

        Ok(count)
    }
}
