use chrono::{DateTime, NaiveDate, Utc};
use taskman_shared::{Project, ProjectStatus, Task};
use uuid::Uuid;

use crate::db::DbPool;

use super::tasks::{row_to_task, TaskRow, TASK_COLUMNS};

type ProjectRow = (
    Uuid,                  // id
    String,                // name
    Option<String>,        // description
    Option<NaiveDate>,     // start_date
    Option<NaiveDate>,     // end_date
    ProjectStatus,         // status
    Uuid,                  // created_by
    DateTime<Utc>,         // created_at
);

fn row_to_project(row: ProjectRow) -> Project {
    Project {
        id: row.0,
        name: row.1,
        description: row.2,
        start_date: row.3,
        end_date: row.4,
        status: row.5,
        created_by: row.6,
        created_at: row.7,
    }
}

const PROJECT_COLUMNS: &str =
    "id, name, description, start_date, end_date, status, created_by, created_at";

#[derive(Clone)]
pub struct ProjectRepo {
    db: DbPool,
}

impl ProjectRepo {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    pub async fn list_all(&self) -> Result<Vec<Project>, sqlx::Error> {
        let rows: Vec<ProjectRow> = sqlx::query_as(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects ORDER BY created_at DESC"
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(row_to_project).collect())
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Project>, sqlx::Error> {
        let row: Option<ProjectRow> =
            sqlx::query_as(&format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.db)
                .await?;

        Ok(row.map(row_to_project))
    }

    pub async fn insert(&self, project: &Project) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO projects (id, name, description, start_date, end_date,
                                  status, created_by, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(project.id)
        .bind(&project.name)
        .bind(&project.description)
        .bind(project.start_date)
        .bind(project.end_date)
        .bind(project.status)
        .bind(project.created_by)
        .bind(project.created_at)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    /// `created_by` is deliberately absent: the creator is immutable.
    pub async fn update(&self, project: &Project) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE projects
            SET name = $1, description = $2, start_date = $3, end_date = $4, status = $5
            WHERE id = $6
            "#,
        )
        .bind(&project.name)
        .bind(&project.description)
        .bind(project.start_date)
        .bind(project.end_date)
        .bind(project.status)
        .bind(project.id)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    /// Tasks under the project go with it (FK cascade).
    pub async fn delete(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn projects_by_user(&self, user_id: Uuid) -> Result<Vec<Project>, sqlx::Error> {
        let rows: Vec<ProjectRow> = sqlx::query_as(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE created_by = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(row_to_project).collect())
    }

    pub async fn tasks_by_project(&self, project_id: Uuid) -> Result<Vec<Task>, sqlx::Error> {
        let rows: Vec<TaskRow> = sqlx::query_as(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE project_id = $1 ORDER BY created_at DESC"
        ))
        .bind(project_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(row_to_task).collect())
    }
}
