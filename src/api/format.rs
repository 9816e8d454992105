use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::database::models::{Answer, Form, FormStats, Question, Response, User};
use crate::middleware::AuthUser;
use crate::services::{AvailableForm, PatientResponse, Session};
use crate::types::Role;

/// Public view of an account; never carries the password hash
#[derive(Debug, Clone, Serialize)]
pub struct UserView {
    pub id: Uuid,
    pub username: String,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}

/// Token grant returned by register and login
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: u64,
    pub user: UserView,
}

impl From<Session> for SessionView {
    fn from(session: Session) -> Self {
        Self {
            access_token: session.access_token,
            token_type: "bearer",
            expires_in: session.expires_in,
            user: UserView::from(&session.user),
        }
    }
}

/// Row in the psychologist's own form listing
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormSummary {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub question_count: usize,
    pub response_count: i64,
    pub assigned_patient_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<FormStats> for FormSummary {
    fn from(stats: FormStats) -> Self {
        let form = stats.form;
        Self {
            id: form.id,
            question_count: form.questions.len(),
            response_count: stats.response_count,
            title: form.title,
            description: form.description,
            assigned_patient_ids: form.assigned_patient_ids,
            created_at: form.created_at,
            updated_at: form.updated_at,
        }
    }
}

/// Row in a patient's available-forms listing
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableFormView {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub question_count: usize,
    pub psychologist_name: Option<String>,
    pub answered: bool,
    pub created_at: DateTime<Utc>,
}

impl From<AvailableForm> for AvailableFormView {
    fn from(available: AvailableForm) -> Self {
        let form = available.form;
        Self {
            id: form.id,
            question_count: form.questions.len(),
            title: form.title,
            description: form.description,
            psychologist_name: available.psychologist_name,
            answered: available.answered,
            created_at: form.created_at,
        }
    }
}

/// Full form. The assignment list is only shown to the owner.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormDetail {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    pub questions: Vec<Question>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_patient_ids: Option<Vec<Uuid>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FormDetail {
    pub fn for_caller(form: Form, caller: &AuthUser) -> Self {
        let assigned_patient_ids = form.is_owned_by(caller.id).then_some(form.assigned_patient_ids);
        Self {
            id: form.id,
            owner_id: form.owner_id,
            title: form.title,
            description: form.description,
            questions: form.questions,
            assigned_patient_ids,
            created_at: form.created_at,
            updated_at: form.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerView {
    pub question_id: String,
    pub question_text: String,
    pub answer_text: String,
}

impl From<Answer> for AnswerView {
    fn from(answer: Answer) -> Self {
        Self {
            question_id: answer.question_id,
            question_text: answer.question_text,
            answer_text: answer.answer_text,
        }
    }
}

/// A patient's own submission
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseView {
    pub id: Uuid,
    pub form_id: Uuid,
    pub form_title: String,
    pub patient_id: Uuid,
    pub answers: Vec<AnswerView>,
    pub submitted_at: DateTime<Utc>,
}

impl From<Response> for ResponseView {
    fn from(response: Response) -> Self {
        Self {
            id: response.id,
            form_id: response.form_id,
            form_title: response.form_title,
            patient_id: response.patient_id,
            answers: response.answers.into_iter().map(AnswerView::from).collect(),
            submitted_at: response.submitted_at,
        }
    }
}

/// A submission as the form owner sees it, with the patient's identity
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormResponseView {
    #[serde(flatten)]
    pub response: ResponseView,
    pub patient_name: Option<String>,
    pub patient_email: Option<String>,
    pub patient_username: Option<String>,
}

impl From<PatientResponse> for FormResponseView {
    fn from(item: PatientResponse) -> Self {
        let (patient_name, patient_email, patient_username) = match item.patient {
            Some(user) => (Some(user.name), Some(user.email), Some(user.username)),
            None => (None, None, None),
        };
        Self {
            response: ResponseView::from(item.response),
            patient_name,
            patient_email,
            patient_username,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PatientView {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub username: String,
}

impl From<User> for PatientView {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            username: user.username,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn form(owner_id: Uuid, assigned: Vec<Uuid>) -> Form {
        Form::new(
            owner_id,
            "Intake".into(),
            "First session".into(),
            vec![
                Question { id: "q1".into(), text: "How are you?".into(), order: 1 },
                Question { id: "q2".into(), text: "Why now?".into(), order: 2 },
            ],
            assigned,
        )
    }

    fn caller(id: Uuid, role: Role) -> AuthUser {
        AuthUser { id, username: "someone".into(), role }
    }

    #[test]
    fn session_view_uses_bearer_and_hides_hash() {
        let user = User::new("maria".into(), "$argon2id$secret".into(), "Maria".into(), "m@x.io".into(), Role::Psychologist);
        let view = SessionView::from(Session { access_token: "tok".into(), expires_in: 60, user });
        let value = serde_json::to_value(&view).unwrap();

        assert_eq!(value["token_type"], "bearer");
        assert_eq!(value["user"]["role"], "psychologist");
        assert!(!value.to_string().contains("argon2"));
    }

    #[test]
    fn summary_counts_questions_and_uses_camel_case() {
        let stats = FormStats { form: form(Uuid::new_v4(), vec![]), response_count: 3 };
        let value = serde_json::to_value(FormSummary::from(stats)).unwrap();

        assert_eq!(value["questionCount"], 2);
        assert_eq!(value["responseCount"], 3);
        assert_eq!(value["assignedPatientIds"], json!([]));
    }

    #[test]
    fn assignment_list_is_only_shown_to_the_owner() {
        let owner = Uuid::new_v4();
        let patient = Uuid::new_v4();
        let f = form(owner, vec![patient]);

        let owner_view = serde_json::to_value(FormDetail::for_caller(f.clone(), &caller(owner, Role::Psychologist))).unwrap();
        assert_eq!(owner_view["assignedPatientIds"], json!([patient]));

        let patient_view = serde_json::to_value(FormDetail::for_caller(f, &caller(patient, Role::Patient))).unwrap();
        assert!(patient_view.get("assignedPatientIds").is_none());
    }

    #[test]
    fn owner_response_view_flattens_patient_identity() {
        let patient = User::new("joao".into(), "h".into(), "Joao".into(), "j@x.io".into(), Role::Patient);
        let response = Response::new(
            Uuid::new_v4(),
            patient.id,
            "Intake".into(),
            vec![Answer { question_id: "q1".into(), question_text: "How are you?".into(), answer_text: "Fine".into() }],
        );
        let value = serde_json::to_value(FormResponseView::from(PatientResponse { response, patient: Some(patient) })).unwrap();

        assert_eq!(value["patientName"], "Joao");
        assert_eq!(value["formTitle"], "Intake");
        assert_eq!(value["answers"][0]["answerText"], "Fine");
    }
}
