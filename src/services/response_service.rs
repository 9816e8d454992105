use serde::Deserialize;
use std::collections::HashMap;
use tracing::info;
use uuid::Uuid;

use crate::database::models::{Answer, Form, Response, User};
use crate::database::repository::users_by_id;
use crate::database::RepositoryState;
use crate::middleware::AuthUser;
use crate::policy::authorize;
use crate::types::{Action, Role};

use super::{is_blank, ServiceError, ServiceResult};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerInput {
    pub question_id: String,
    /// Ignored; the stored text is taken from the form at submission time
    #[serde(default)]
    pub question_text: Option<String>,
    pub answer_text: String,
}

/// A response joined with the patient who submitted it
#[derive(Debug, Clone)]
pub struct PatientResponse {
    pub response: Response,
    pub patient: Option<User>,
}

#[derive(Clone)]
pub struct ResponseService {
    repo: RepositoryState,
}

impl ResponseService {
    pub fn new(repo: RepositoryState) -> Self {
        Self { repo }
    }

    /// Stores the caller's one and only response to `form_id`.
    pub async fn submit_response(
        &self,
        caller: &AuthUser,
        form_id: Uuid,
        answers: Vec<AnswerInput>,
    ) -> ServiceResult<Response> {
        if caller.role != Role::Patient {
            return Err(ServiceError::Forbidden("Only patients can submit responses".to_string()));
        }

        let form = match self.repo.find_form(form_id).await? {
            Some(form) if !form.is_deleted() => form,
            _ => return Err(ServiceError::NotFound("Form not found".to_string())),
        };
        authorize(caller, Action::SubmitResponse, Some(&form))?;

        let answers = match_answers(&form, answers)?;

        // The store owns the one-per-patient rule; a concurrent duplicate surfaces here as Conflict.
        let response = self
            .repo
            .insert_response(Response::new(form.id, caller.id, form.title.clone(), answers))
            .await?;

        info!(response_id = %response.id, form_id = %form.id, patient_id = %caller.id, "response submitted");
        Ok(response)
    }

    /// Owner only. Still answers after the form is deleted.
    pub async fn list_responses_for_form(
        &self,
        caller: &AuthUser,
        form_id: Uuid,
    ) -> ServiceResult<Vec<PatientResponse>> {
        let form = self
            .repo
            .find_form(form_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Form not found".to_string()))?;
        authorize(caller, Action::ViewFormResponses, Some(&form))?;

        let responses = self.repo.list_responses_for_form(form.id).await?;
        let patient_ids: Vec<Uuid> = responses.iter().map(|r| r.patient_id).collect();
        let patients = users_by_id(self.repo.find_users(&patient_ids).await?);

        Ok(responses
            .into_iter()
            .map(|response| PatientResponse {
                patient: patients.get(&response.patient_id).cloned(),
                response,
            })
            .collect())
    }

    pub async fn list_responses_for_patient(&self, caller: &AuthUser) -> ServiceResult<Vec<Response>> {
        authorize(caller, Action::ViewOwnResponses, None)?;
        Ok(self.repo.list_responses_for_patient(caller.id).await?)
    }
}

/// Pairs every question of `form` with exactly one non-blank answer, in form order.
fn match_answers(form: &Form, inputs: Vec<AnswerInput>) -> ServiceResult<Vec<Answer>> {
    let mut by_question: HashMap<String, String> = HashMap::with_capacity(inputs.len());
    for input in inputs {
        let question_id = input.question_id.trim().to_string();
        if form.question(&question_id).is_none() {
            return Err(ServiceError::Validation(format!(
                "Answer refers to unknown question '{}'",
                question_id
            )));
        }
        if by_question.insert(question_id.clone(), input.answer_text).is_some() {
            return Err(ServiceError::Validation(format!(
                "Question '{}' was answered more than once",
                question_id
            )));
        }
    }

    form.questions
        .iter()
        .map(|question| match by_question.remove(&question.id) {
            Some(answer_text) if !is_blank(&answer_text) => Ok(Answer {
                question_id: question.id.clone(),
                question_text: question.text.clone(),
                answer_text,
            }),
            _ => Err(ServiceError::Validation(format!(
                "Question '{}' needs an answer",
                question.text
            ))),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::FormPatch;
    use crate::testing::{answers_for, form_input, question, TestContext};

    #[tokio::test]
    async fn second_submission_conflicts() {
        let ctx = TestContext::new();
        let psy = ctx.psychologist("dra_maria").await;
        let patient = ctx.patient("joao").await;
        let form = ctx.forms.create_form(&psy, form_input("Intake", &["Q1", "Q2"])).await.unwrap();

        ctx.responses.submit_response(&patient, form.id, answers_for(&form, "ok")).await.unwrap();
        let err = ctx
            .responses
            .submit_response(&patient, form.id, answers_for(&form, "again"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));

        let stored = ctx.responses.list_responses_for_form(&psy, form.id).await.unwrap();
        assert_eq!(stored.len(), 1);
    }

    #[tokio::test]
    async fn concurrent_submissions_store_exactly_one() {
        let ctx = TestContext::new();
        let psy = ctx.psychologist("dra_maria").await;
        let patient = ctx.patient("joao").await;
        let form = ctx.forms.create_form(&psy, form_input("Intake", &["Q1"])).await.unwrap();

        let a = ctx.responses.clone();
        let b = ctx.responses.clone();
        let (pa, pb) = (patient.clone(), patient.clone());
        let (aa, ab) = (answers_for(&form, "tap one"), answers_for(&form, "tap two"));
        let form_id = form.id;

        let (first, second) = tokio::join!(
            tokio::spawn(async move { a.submit_response(&pa, form_id, aa).await }),
            tokio::spawn(async move { b.submit_response(&pb, form_id, ab).await }),
        );
        let results = [first.unwrap(), second.unwrap()];

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results
            .iter()
            .any(|r| matches!(r, Err(ServiceError::Conflict(_)))));
        assert_eq!(ctx.responses.list_responses_for_patient(&patient).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unanswered_question_is_rejected_and_nothing_stored() {
        let ctx = TestContext::new();
        let psy = ctx.psychologist("dra_maria").await;
        let patient = ctx.patient("joao").await;
        let form = ctx.forms.create_form(&psy, form_input("Intake", &["Q1", "Q2", "Q3"])).await.unwrap();

        let mut answers = answers_for(&form, "fine");
        answers[2].answer_text = "   ".into();
        let err = ctx.responses.submit_response(&patient, form.id, answers).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        let mut answers = answers_for(&form, "fine");
        answers.pop();
        let err = ctx.responses.submit_response(&patient, form.id, answers).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        assert!(ctx.responses.list_responses_for_patient(&patient).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_or_repeated_question_ids_are_rejected() {
        let ctx = TestContext::new();
        let psy = ctx.psychologist("dra_maria").await;
        let patient = ctx.patient("joao").await;
        let form = ctx.forms.create_form(&psy, form_input("Intake", &["Q1"])).await.unwrap();

        let mut answers = answers_for(&form, "x");
        answers.push(AnswerInput { question_id: "nope".into(), question_text: None, answer_text: "y".into() });
        assert!(matches!(
            ctx.responses.submit_response(&patient, form.id, answers).await.unwrap_err(),
            ServiceError::Validation(_)
        ));

        let mut answers = answers_for(&form, "x");
        answers.push(answers[0].clone());
        assert!(matches!(
            ctx.responses.submit_response(&patient, form.id, answers).await.unwrap_err(),
            ServiceError::Validation(_)
        ));
    }

    #[tokio::test]
    async fn psychologists_cannot_submit() {
        let ctx = TestContext::new();
        let psy = ctx.psychologist("dra_maria").await;
        let form = ctx.forms.create_form(&psy, form_input("Intake", &["Q1"])).await.unwrap();

        let err = ctx.responses.submit_response(&psy, form.id, answers_for(&form, "x")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));
    }

    #[tokio::test]
    async fn unassigned_patient_cannot_submit() {
        let ctx = TestContext::new();
        let psy = ctx.psychologist("dra_maria").await;
        let alice = ctx.patient("alice").await;
        let bob = ctx.patient("bob").await;

        let mut input = form_input("Alice only", &["Q1"]);
        input.assigned_patient_ids = Some(vec![alice.id]);
        let form = ctx.forms.create_form(&psy, input).await.unwrap();

        let err = ctx.responses.submit_response(&bob, form.id, answers_for(&form, "x")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));
    }

    #[tokio::test]
    async fn answers_round_trip_in_order_with_snapshots() {
        let ctx = TestContext::new();
        let psy = ctx.psychologist("dra_maria").await;
        let patient = ctx.patient("joao").await;
        let form = ctx.forms.create_form(&psy, form_input("Intake", &["Q1", "Q2"])).await.unwrap();

        let answers = vec![
            AnswerInput { question_id: form.questions[1].id.clone(), question_text: None, answer_text: "A2".into() },
            AnswerInput { question_id: form.questions[0].id.clone(), question_text: None, answer_text: "A1".into() },
        ];
        ctx.responses.submit_response(&patient, form.id, answers).await.unwrap();

        // Later edits must not rewrite history.
        let patch = FormPatch {
            title: Some("Renamed".into()),
            questions: Some(vec![question("Changed")]),
            ..Default::default()
        };
        ctx.forms.update_form(&psy, form.id, patch).await.unwrap();

        let listed = ctx.responses.list_responses_for_form(&psy, form.id).await.unwrap();
        let pairs: Vec<(String, String)> = listed[0]
            .response
            .answers
            .iter()
            .map(|a| (a.question_text.clone(), a.answer_text.clone()))
            .collect();
        assert_eq!(
            pairs,
            vec![("Q1".to_string(), "A1".to_string()), ("Q2".to_string(), "A2".to_string())]
        );
        assert_eq!(listed[0].response.form_title, "Intake");
        assert_eq!(listed[0].patient.as_ref().map(|p| p.id), Some(patient.id));
    }

    #[tokio::test]
    async fn responses_survive_form_deletion() {
        let ctx = TestContext::new();
        let psy = ctx.psychologist("dra_maria").await;
        let patient = ctx.patient("joao").await;
        let form = ctx.forms.create_form(&psy, form_input("Intake", &["Q1"])).await.unwrap();
        ctx.responses.submit_response(&patient, form.id, answers_for(&form, "x")).await.unwrap();

        ctx.forms.delete_form(&psy, form.id).await.unwrap();

        assert_eq!(ctx.responses.list_responses_for_form(&psy, form.id).await.unwrap().len(), 1);
        assert_eq!(ctx.responses.list_responses_for_patient(&patient).await.unwrap().len(), 1);

        let err = ctx.responses.submit_response(&patient, form.id, answers_for(&form, "y")).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn only_the_owner_reads_form_responses() {
        let ctx = TestContext::new();
        let owner = ctx.psychologist("dra_maria").await;
        let other = ctx.psychologist("dr_paulo").await;
        let patient = ctx.patient("joao").await;
        let form = ctx.forms.create_form(&owner, form_input("Intake", &["Q1"])).await.unwrap();

        for caller in [&other, &patient] {
            let err = ctx.responses.list_responses_for_form(caller, form.id).await.unwrap_err();
            assert!(matches!(err, ServiceError::Forbidden(_)));
        }
    }

    #[tokio::test]
    async fn patient_history_is_newest_first() {
        let ctx = TestContext::new();
        let psy = ctx.psychologist("dra_maria").await;
        let patient = ctx.patient("joao").await;
        let first = ctx.forms.create_form(&psy, form_input("First", &["Q1"])).await.unwrap();
        let second = ctx.forms.create_form(&psy, form_input("Second", &["Q1"])).await.unwrap();

        ctx.responses.submit_response(&patient, first.id, answers_for(&first, "a")).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        ctx.responses.submit_response(&patient, second.id, answers_for(&second, "b")).await.unwrap();

        let titles: Vec<String> = ctx
            .responses
            .list_responses_for_patient(&patient)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.form_title)
            .collect();
        assert_eq!(titles, vec!["Second".to_string(), "First".to_string()]);

        assert!(matches!(
            ctx.responses.list_responses_for_patient(&psy).await.unwrap_err(),
            ServiceError::Forbidden(_)
        ));
    }
}
