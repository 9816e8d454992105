use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{Form, FormStats, Response, User};
use crate::types::Role;

/// Persistence contract shared by the PostgreSQL and in-memory stores.
///
/// Uniqueness (usernames, one response per form and patient) is the store's
/// job: implementations must reject the second write with
/// `DatabaseError::Conflict` atomically, never check-then-insert.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users ---
    async fn insert_user(&self, user: User) -> Result<User, DatabaseError>;
    async fn find_user(&self, id: Uuid) -> Result<Option<User>, DatabaseError>;
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, DatabaseError>;
    async fn find_users(&self, ids: &[Uuid]) -> Result<Vec<User>, DatabaseError>;
    /// Ordered by name
    async fn list_users_by_role(&self, role: Role) -> Result<Vec<User>, DatabaseError>;

    // --- Forms ---
    async fn insert_form(&self, form: Form) -> Result<Form, DatabaseError>;
    /// Returns tombstoned forms too; callers decide what a tombstone means.
    async fn find_form(&self, id: Uuid) -> Result<Option<Form>, DatabaseError>;
    /// Live forms owned by `owner_id`, newest first, with response counts.
    async fn list_forms_by_owner(&self, owner_id: Uuid) -> Result<Vec<FormStats>, DatabaseError>;
    /// Live forms that are open or assigned to `patient_id`, newest first.
    async fn list_forms_visible_to(&self, patient_id: Uuid) -> Result<Vec<Form>, DatabaseError>;
    /// `NotFound` once the form is tombstoned, so a racing edit cannot revive it.
    async fn update_form(&self, form: Form) -> Result<Form, DatabaseError>;
    async fn tombstone_form(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), DatabaseError>;

    // --- Responses ---
    async fn insert_response(&self, response: Response) -> Result<Response, DatabaseError>;
    /// Newest first
    async fn list_responses_for_form(&self, form_id: Uuid) -> Result<Vec<Response>, DatabaseError>;
    /// Newest first
    async fn list_responses_for_patient(&self, patient_id: Uuid) -> Result<Vec<Response>, DatabaseError>;

    async fn health_check(&self) -> Result<(), DatabaseError>;
}

pub type RepositoryState = Arc<dyn Repository>;

/// Index users by id, for joining display names onto listings.
pub fn users_by_id(users: Vec<User>) -> HashMap<Uuid, User> {
    users.into_iter().map(|u| (u.id, u)).collect()
}
