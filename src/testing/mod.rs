use std::sync::Arc;

use crate::auth::TokenIssuer;
use crate::database::models::{Form, User};
use crate::database::{MemoryRepository, RepositoryState};
use crate::middleware::AuthUser;
use crate::services::{
    AnswerInput, FormInput, FormService, QuestionInput, RegisterInput, ResponseService, SessionService,
};
use crate::types::Role;

/// Services wired to a fresh in-memory store
pub struct TestContext {
    pub repo: RepositoryState,
    pub sessions: SessionService,
    pub forms: FormService,
    pub responses: ResponseService,
}

impl TestContext {
    pub fn new() -> Self {
        let repo: RepositoryState = Arc::new(MemoryRepository::new());
        Self {
            sessions: SessionService::new(repo.clone(), TokenIssuer::new("test-secret", 1)),
            forms: FormService::new(repo.clone()),
            responses: ResponseService::new(repo.clone()),
            repo,
        }
    }

    pub async fn psychologist(&self, username: &str) -> AuthUser {
        self.user(username, Role::Psychologist).await
    }

    pub async fn patient(&self, username: &str) -> AuthUser {
        self.user(username, Role::Patient).await
    }

    /// Inserts directly, skipping password hashing to keep tests fast.
    async fn user(&self, username: &str, role: Role) -> AuthUser {
        let user = User::new(
            username.to_string(),
            "unusable".to_string(),
            username.to_uppercase(),
            format!("{}@example.com", username),
            role,
        );
        let user = self.repo.insert_user(user).await.expect("insert test user");
        AuthUser {
            id: user.id,
            username: user.username,
            role: user.role,
        }
    }
}

pub fn register_input(username: &str, role: &str) -> RegisterInput {
    RegisterInput {
        username: username.to_string(),
        password: "senha123".to_string(),
        name: format!("{} name", username),
        email: format!("{}@example.com", username),
        role: role.to_string(),
    }
}

pub fn question(text: &str) -> QuestionInput {
    QuestionInput {
        id: None,
        text: text.to_string(),
        order: None,
    }
}

pub fn form_input(title: &str, questions: &[&str]) -> FormInput {
    FormInput {
        title: title.to_string(),
        description: None,
        questions: questions.iter().map(|q| question(q)).collect(),
        assigned_patient_ids: None,
    }
}

/// One answer per question, all with the same text
pub fn answers_for(form: &Form, text: &str) -> Vec<AnswerInput> {
    form.questions
        .iter()
        .map(|q| AnswerInput {
            question_id: q.id.clone(),
            question_text: None,
            answer_text: text.to_string(),
        })
        .collect()
}
