mod projects;
mod tasks;

pub use projects::ProjectService;
pub use tasks::TaskService;

use crate::error::AppError;

/// Local error taxonomy for the domain services. The API layer translates
/// these into user-visible failures; handlers never inspect the variants.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{0}")]
    InvalidArgument(String),

    #[error("not found")]
    NotFound,

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::InvalidArgument(msg) => AppError::Validation(msg),
            ServiceError::NotFound => AppError::NotFound,
            ServiceError::Database(e) => AppError::Database(e),
        }
    }
}
