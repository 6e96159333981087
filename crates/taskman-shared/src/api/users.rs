use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::Role;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
    pub roles: Vec<Role>,
    pub created_at: DateTime<Utc>,
}

/// Replaces the target user's role set. Unknown role names fail
/// deserialization, which keeps the set constrained to user/manager/admin.
#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateUserRolesRequest {
    pub roles: Vec<Role>,
}
