use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An answer with the question text captured at submission time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub question_id: String,
    pub question_text: String,
    pub answer_text: String,
}

/// One patient's submission to one form. Never mutated after insert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub id: Uuid,
    pub form_id: Uuid,
    pub patient_id: Uuid,
    pub form_title: String,
    pub answers: Vec<Answer>,
    pub submitted_at: DateTime<Utc>,
}

impl Response {
    pub fn new(form_id: Uuid, patient_id: Uuid, form_title: String, answers: Vec<Answer>) -> Self {
        Self {
            id: Uuid::new_v4(),
            form_id,
            patient_id,
            form_title,
            answers,
            submitted_at: Utc::now(),
        }
    }
}
