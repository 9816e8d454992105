use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::Role;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(username: String, password_hash: String, name: String, email: String, role: Role) -> Self {
        Self {
            id: Uuid::new_v4(),
            username,
            password_hash,
            name,
            email,
            role,
            created_at: Utc::now(),
        }
    }

    pub fn is_patient(&self) -> bool {
        self.role == Role::Patient
    }
}
