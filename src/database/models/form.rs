use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single free-text question. Rendered in ascending `order`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub text: String,
    pub order: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Form {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    pub questions: Vec<Question>,
    /// Empty means the form is open to every patient.
    pub assigned_patient_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Set when the owner deletes the form; responses outlive it.
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Form {
    pub fn new(
        owner_id: Uuid,
        title: String,
        description: String,
        questions: Vec<Question>,
        assigned_patient_ids: Vec<Uuid>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            owner_id,
            title,
            description,
            questions,
            assigned_patient_ids,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.owner_id == user_id
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Visibility predicate shared by every store implementation.
    pub fn is_visible_to(&self, patient_id: Uuid) -> bool {
        !self.is_deleted()
            && (self.assigned_patient_ids.is_empty() || self.assigned_patient_ids.contains(&patient_id))
    }

    pub fn question(&self, question_id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == question_id)
    }
}

/// Owner-facing listing row with computed counters
#[derive(Debug, Clone)]
pub struct FormStats {
    pub form: Form,
    pub response_count: i64,
}
