use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{Form, FormStats, Response, User};
use crate::database::repository::Repository;
use crate::types::Role;

#[derive(Default)]
struct MemoryState {
    users: Vec<User>,
    forms: Vec<Form>,
    responses: Vec<Response>,
    // (form_id, patient_id)
    submitted: HashSet<(Uuid, Uuid)>,
}

/// Process-local store for development and tests.
///
/// Every write takes the single write lock, so the uniqueness checks and the
/// insert they guard happen as one step.
#[derive(Default)]
pub struct MemoryRepository {
    state: RwLock<MemoryState>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first<T>(mut items: Vec<T>, key: impl Fn(&T) -> DateTime<Utc>) -> Vec<T> {
    // Items arrive in insertion order; reverse first so ties keep the later insert on top.
    items.reverse();
    items.sort_by(|a, b| key(b).cmp(&key(a)));
    items
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn insert_user(&self, user: User) -> Result<User, DatabaseError> {
        let mut state = self.state.write().await;
        if state.users.iter().any(|u| u.username == user.username) {
            return Err(DatabaseError::Conflict("Username already exists".to_string()));
        }
        state.users.push(user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, DatabaseError> {
        let state = self.state.read().await;
        Ok(state.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, DatabaseError> {
        let state = self.state.read().await;
        Ok(state.users.iter().find(|u| u.username == username).cloned())
    }

    async fn find_users(&self, ids: &[Uuid]) -> Result<Vec<User>, DatabaseError> {
        let state = self.state.read().await;
        Ok(state.users.iter().filter(|u| ids.contains(&u.id)).cloned().collect())
    }

    async fn list_users_by_role(&self, role: Role) -> Result<Vec<User>, DatabaseError> {
        let state = self.state.read().await;
        let mut users: Vec<User> = state.users.iter().filter(|u| u.role == role).cloned().collect();
        users.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(users)
    }

    async fn insert_form(&self, form: Form) -> Result<Form, DatabaseError> {
        let mut state = self.state.write().await;
        if state.forms.iter().any(|f| f.id == form.id) {
            return Err(DatabaseError::Conflict(format!("Form {} already exists", form.id)));
        }
        state.forms.push(form.clone());
        Ok(form)
    }

    async fn find_form(&self, id: Uuid) -> Result<Option<Form>, DatabaseError> {
        let state = self.state.read().await;
        Ok(state.forms.iter().find(|f| f.id == id).cloned())
    }

    async fn list_forms_by_owner(&self, owner_id: Uuid) -> Result<Vec<FormStats>, DatabaseError> {
        let state = self.state.read().await;
        let owned: Vec<Form> = state
            .forms
            .iter()
            .filter(|f| f.owner_id == owner_id && !f.is_deleted())
            .cloned()
            .collect();

        let stats = newest_first(owned, |f| f.created_at)
            .into_iter()
            .map(|form| {
                let response_count = state.responses.iter().filter(|r| r.form_id == form.id).count() as i64;
                FormStats { form, response_count }
            })
            .collect();
        Ok(stats)
    }

    async fn list_forms_visible_to(&self, patient_id: Uuid) -> Result<Vec<Form>, DatabaseError> {
        let state = self.state.read().await;
        let visible = state.forms.iter().filter(|f| f.is_visible_to(patient_id)).cloned().collect();
        Ok(newest_first(visible, |f| f.created_at))
    }

    async fn update_form(&self, form: Form) -> Result<Form, DatabaseError> {
        let mut state = self.state.write().await;
        let slot = state
            .forms
            .iter_mut()
            .find(|f| f.id == form.id && !f.is_deleted())
            .ok_or_else(|| DatabaseError::NotFound(format!("Form {}", form.id)))?;
        *slot = form.clone();
        Ok(form)
    }

    async fn tombstone_form(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), DatabaseError> {
        let mut state = self.state.write().await;
        let slot = state
            .forms
            .iter_mut()
            .find(|f| f.id == id)
            .ok_or_else(|| DatabaseError::NotFound(format!("Form {}", id)))?;
        slot.deleted_at = Some(at);
        slot.updated_at = at;
        Ok(())
    }

    async fn insert_response(&self, response: Response) -> Result<Response, DatabaseError> {
        let mut state = self.state.write().await;
        if !state.submitted.insert((response.form_id, response.patient_id)) {
            return Err(DatabaseError::Conflict(
                "A response to this form was already submitted".to_string(),
            ));
        }
        state.responses.push(response.clone());
        Ok(response)
    }

    async fn list_responses_for_form(&self, form_id: Uuid) -> Result<Vec<Response>, DatabaseError> {
        let state = self.state.read().await;
        let matching = state.responses.iter().filter(|r| r.form_id == form_id).cloned().collect();
        Ok(newest_first(matching, |r| r.submitted_at))
    }

    async fn list_responses_for_patient(&self, patient_id: Uuid) -> Result<Vec<Response>, DatabaseError> {
        let state = self.state.read().await;
        let matching = state.responses.iter().filter(|r| r.patient_id == patient_id).cloned().collect();
        Ok(newest_first(matching, |r| r.submitted_at))
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        Ok(())
    }
}
