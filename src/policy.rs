//! Authorization rules.
//!
//! Pure decisions over (caller role, resource, action). Nothing here touches
//! storage: services load the form first, then ask.
//!
//! | Action                | Owner | Other psychologist | Patient (visible) | Patient (hidden) |
//! |-----------------------|-------|--------------------|-------------------|------------------|
//! | create / list own     | allow | allow              | deny              | deny             |
//! | list forms to answer  | -     | -                  | allow             | allow            |
//! | view form             | allow | deny               | allow             | deny             |
//! | edit / delete form    | allow | deny               | deny              | deny             |
//! | view form responses   | allow | deny               | deny              | deny             |
//! | submit response       | deny  | deny               | allow             | deny             |
//! | view own responses    | -     | -                  | allow             | allow            |
//! | list patients         | allow | allow              | deny              | deny             |
//!
//! "Submit response" only covers the first submission; the store rejects the
//! second one.

use crate::database::models::Form;
use crate::middleware::AuthUser;
use crate::services::ServiceError;
use crate::types::{Action, Role};

pub fn permits(caller: &AuthUser, action: Action, form: Option<&Form>) -> bool {
    match (action, caller.role) {
        (Action::CreateForm, role) | (Action::ListOwnForms, role) | (Action::ListPatients, role) => {
            role == Role::Psychologist
        }
        (Action::ListAvailableForms, role) | (Action::ViewOwnResponses, role) => role == Role::Patient,

        (Action::ViewForm, Role::Psychologist)
        | (Action::EditForm, Role::Psychologist)
        | (Action::DeleteForm, Role::Psychologist)
        | (Action::ViewFormResponses, Role::Psychologist) => {
            form.map_or(false, |f| f.is_owned_by(caller.id))
        }

        (Action::ViewForm, Role::Patient) | (Action::SubmitResponse, Role::Patient) => {
            form.map_or(false, |f| f.is_visible_to(caller.id))
        }

        (Action::EditForm, Role::Patient)
        | (Action::DeleteForm, Role::Patient)
        | (Action::ViewFormResponses, Role::Patient)
        | (Action::SubmitResponse, Role::Psychologist) => false,
    }
}

/// `permits` as a `Result`, logging denials.
pub fn authorize(caller: &AuthUser, action: Action, form: Option<&Form>) -> Result<(), ServiceError> {
    if permits(caller, action, form) {
        return Ok(());
    }

    tracing::warn!(
        user_id = %caller.id,
        role = %caller.role,
        form_id = ?form.map(|f| f.id),
        ?action,
        "authorization denied"
    );
    Err(ServiceError::Forbidden(format!("Not allowed to {}", action.describe())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::Question;
    use uuid::Uuid;

    fn caller(role: Role) -> AuthUser {
        AuthUser {
            id: Uuid::new_v4(),
            username: "someone".into(),
            role,
        }
    }

    fn form_for(owner: &AuthUser, assigned: Vec<Uuid>) -> Form {
        Form::new(
            owner.id,
            "Anxiety scale".into(),
            String::new(),
            vec![Question { id: "q1".into(), text: "Sleep?".into(), order: 1 }],
            assigned,
        )
    }

    #[test]
    fn owner_has_full_control() {
        let owner = caller(Role::Psychologist);
        let form = form_for(&owner, vec![]);
        for action in [Action::ViewForm, Action::EditForm, Action::DeleteForm, Action::ViewFormResponses] {
            assert!(permits(&owner, action, Some(&form)), "{:?}", action);
        }
        assert!(!permits(&owner, Action::SubmitResponse, Some(&form)));
    }

    #[test]
    fn other_psychologist_is_locked_out() {
        let owner = caller(Role::Psychologist);
        let other = caller(Role::Psychologist);
        let form = form_for(&owner, vec![]);
        for action in [
            Action::ViewForm,
            Action::EditForm,
            Action::DeleteForm,
            Action::ViewFormResponses,
            Action::SubmitResponse,
        ] {
            assert!(!permits(&other, action, Some(&form)), "{:?}", action);
        }
        assert!(permits(&other, Action::ListPatients, None));
        assert!(permits(&other, Action::CreateForm, None));
    }

    #[test]
    fn assigned_patient_can_view_and_answer_only() {
        let owner = caller(Role::Psychologist);
        let patient = caller(Role::Patient);
        let form = form_for(&owner, vec![patient.id]);

        assert!(permits(&patient, Action::ViewForm, Some(&form)));
        assert!(permits(&patient, Action::SubmitResponse, Some(&form)));
        assert!(!permits(&patient, Action::EditForm, Some(&form)));
        assert!(!permits(&patient, Action::DeleteForm, Some(&form)));
        assert!(!permits(&patient, Action::ViewFormResponses, Some(&form)));
        assert!(!permits(&patient, Action::ListPatients, None));
        assert!(!permits(&patient, Action::CreateForm, None));
        assert!(permits(&patient, Action::ViewOwnResponses, None));
    }

    #[test]
    fn unassigned_patient_is_denied() {
        let owner = caller(Role::Psychologist);
        let patient = caller(Role::Patient);
        let form = form_for(&owner, vec![Uuid::new_v4()]);

        assert!(!permits(&patient, Action::ViewForm, Some(&form)));
        assert!(!permits(&patient, Action::SubmitResponse, Some(&form)));
    }

    #[test]
    fn open_form_admits_any_patient() {
        let owner = caller(Role::Psychologist);
        let form = form_for(&owner, vec![]);
        assert!(permits(&caller(Role::Patient), Action::SubmitResponse, Some(&form)));
    }

    #[test]
    fn form_actions_without_a_form_are_denied() {
        assert!(!permits(&caller(Role::Psychologist), Action::EditForm, None));
        assert!(!permits(&caller(Role::Patient), Action::ViewForm, None));
    }

    #[test]
    fn authorize_maps_denial_to_forbidden() {
        let err = authorize(&caller(Role::Patient), Action::ListPatients, None).unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));
    }
}
