use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct DbHealthResponse {
    pub status: String,
    pub task_count: i64,
}
