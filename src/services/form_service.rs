use chrono::Utc;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use tracing::info;
use uuid::Uuid;

use crate::database::models::{Form, FormStats, Question, User};
use crate::database::repository::users_by_id;
use crate::database::RepositoryState;
use crate::middleware::AuthUser;
use crate::policy::authorize;
use crate::types::{Action, Role};

use super::{is_blank, ServiceError, ServiceResult};

#[derive(Debug, Clone, Deserialize)]
pub struct QuestionInput {
    /// Kept when present and unique within the form
    #[serde(default)]
    pub id: Option<String>,
    pub text: String,
    #[serde(default)]
    pub order: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormInput {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub questions: Vec<QuestionInput>,
    #[serde(default)]
    pub assigned_patient_ids: Option<Vec<Uuid>>,
}

/// Fields left as `None` keep their current value
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub questions: Option<Vec<QuestionInput>>,
    pub assigned_patient_ids: Option<Vec<Uuid>>,
}

/// A form as listed to a patient
#[derive(Debug, Clone)]
pub struct AvailableForm {
    pub form: Form,
    pub psychologist_name: Option<String>,
    pub answered: bool,
}

#[derive(Clone)]
pub struct FormService {
    repo: RepositoryState,
}

impl FormService {
    pub fn new(repo: RepositoryState) -> Self {
        Self { repo }
    }

    pub async fn create_form(&self, caller: &AuthUser, input: FormInput) -> ServiceResult<Form> {
        authorize(caller, Action::CreateForm, None)?;

        let title = validate_title(&input.title)?;
        let questions = build_questions(input.questions)?;
        let assigned = match input.assigned_patient_ids {
            Some(ids) => self.validate_assignees(ids).await?,
            None => vec![],
        };
        let description = input.description.map(|d| d.trim().to_string()).unwrap_or_default();

        let form = self
            .repo
            .insert_form(Form::new(caller.id, title, description, questions, assigned))
            .await?;

        info!(form_id = %form.id, owner_id = %caller.id, "created form '{}'", form.title);
        Ok(form)
    }

    pub async fn list_forms_for_psychologist(&self, caller: &AuthUser) -> ServiceResult<Vec<FormStats>> {
        authorize(caller, Action::ListOwnForms, None)?;
        Ok(self.repo.list_forms_by_owner(caller.id).await?)
    }

    pub async fn list_forms_for_patient(&self, caller: &AuthUser) -> ServiceResult<Vec<AvailableForm>> {
        authorize(caller, Action::ListAvailableForms, None)?;

        let forms = self.repo.list_forms_visible_to(caller.id).await?;

        let owner_ids: Vec<Uuid> = forms
            .iter()
            .map(|f| f.owner_id)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        let owners = users_by_id(self.repo.find_users(&owner_ids).await?);

        let answered: HashSet<Uuid> = self
            .repo
            .list_responses_for_patient(caller.id)
            .await?
            .into_iter()
            .map(|r| r.form_id)
            .collect();

        Ok(forms
            .into_iter()
            .map(|form| AvailableForm {
                psychologist_name: owners.get(&form.owner_id).map(|u| u.name.clone()),
                answered: answered.contains(&form.id),
                form,
            })
            .collect())
    }

    pub async fn get_form(&self, caller: &AuthUser, form_id: Uuid) -> ServiceResult<Form> {
        let form = self.live_form(form_id).await?;
        authorize(caller, Action::ViewForm, Some(&form))?;
        Ok(form)
    }

    pub async fn update_form(&self, caller: &AuthUser, form_id: Uuid, patch: FormPatch) -> ServiceResult<Form> {
        let mut form = self.live_form(form_id).await?;
        authorize(caller, Action::EditForm, Some(&form))?;

        if let Some(title) = patch.title {
            form.title = validate_title(&title)?;
        }
        if let Some(description) = patch.description {
            form.description = description.trim().to_string();
        }
        if let Some(questions) = patch.questions {
            form.questions = build_questions(questions)?;
        }
        if let Some(ids) = patch.assigned_patient_ids {
            form.assigned_patient_ids = self.validate_assignees(ids).await?;
        }
        form.updated_at = Utc::now();

        let form = self.repo.update_form(form).await?;
        info!(form_id = %form.id, "updated form '{}'", form.title);
        Ok(form)
    }

    /// Tombstones the form. Its responses are kept and stay readable by the owner.
    pub async fn delete_form(&self, caller: &AuthUser, form_id: Uuid) -> ServiceResult<()> {
        let form = self.live_form(form_id).await?;
        authorize(caller, Action::DeleteForm, Some(&form))?;

        self.repo.tombstone_form(form.id, Utc::now()).await?;
        info!(form_id = %form.id, "deleted form '{}'", form.title);
        Ok(())
    }

    pub async fn list_patients(&self, caller: &AuthUser) -> ServiceResult<Vec<User>> {
        authorize(caller, Action::ListPatients, None)?;
        Ok(self.repo.list_users_by_role(Role::Patient).await?)
    }

    async fn live_form(&self, form_id: Uuid) -> ServiceResult<Form> {
        match self.repo.find_form(form_id).await? {
            Some(form) if !form.is_deleted() => Ok(form),
            _ => Err(ServiceError::NotFound("Form not found".to_string())),
        }
    }

    /// Deduplicates and checks every id names a patient.
    async fn validate_assignees(&self, ids: Vec<Uuid>) -> ServiceResult<Vec<Uuid>> {
        let mut seen = HashSet::new();
        let ids: Vec<Uuid> = ids.into_iter().filter(|id| seen.insert(*id)).collect();
        if ids.is_empty() {
            return Ok(ids);
        }

        let found: HashMap<Uuid, User> = users_by_id(self.repo.find_users(&ids).await?);
        for id in &ids {
            match found.get(id) {
                Some(user) if user.is_patient() => {}
                _ => {
                    return Err(ServiceError::Validation(format!("{} is not a registered patient", id)));
                }
            }
        }
        Ok(ids)
    }
}

fn validate_title(title: &str) -> ServiceResult<String> {
    if is_blank(title) {
        return Err(ServiceError::Validation("Title is required".to_string()));
    }
    Ok(title.trim().to_string())
}

/// Orders questions by their requested position and renumbers them densely from 1.
///
/// Missing `order` falls back to the list position; ties keep input order.
/// Missing ids become `q<n>` without colliding with ids the client supplied.
pub(crate) fn build_questions(inputs: Vec<QuestionInput>) -> ServiceResult<Vec<Question>> {
    if inputs.is_empty() {
        return Err(ServiceError::Validation("A form needs at least one question".to_string()));
    }
    if let Some(pos) = inputs.iter().position(|q| is_blank(&q.text)) {
        return Err(ServiceError::Validation(format!("Question {} has no text", pos + 1)));
    }

    let mut supplied = HashSet::new();
    for id in inputs.iter().filter_map(|q| q.id.as_deref()).map(str::trim).filter(|id| !id.is_empty()) {
        if !supplied.insert(id.to_string()) {
            return Err(ServiceError::Validation(format!("Duplicate question id '{}'", id)));
        }
    }

    let mut ranked: Vec<(i32, QuestionInput)> = inputs
        .into_iter()
        .enumerate()
        .map(|(pos, q)| (q.order.unwrap_or(pos as i32 + 1), q))
        .collect();
    ranked.sort_by_key(|(rank, _)| *rank);

    let mut next_generated = 1;
    let questions = ranked
        .into_iter()
        .enumerate()
        .map(|(pos, (_, q))| {
            let id = match q.id.as_deref().map(str::trim).filter(|id| !id.is_empty()) {
                Some(id) => id.to_string(),
                None => loop {
                    let candidate = format!("q{}", next_generated);
                    next_generated += 1;
                    if !supplied.contains(&candidate) {
                        break candidate;
                    }
                },
            };
            Question {
                id,
                text: q.text.trim().to_string(),
                order: pos as i32 + 1,
            }
        })
        .collect();

    Ok(questions)
}
