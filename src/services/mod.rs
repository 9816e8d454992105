pub mod form_service;
pub mod response_service;
pub mod session_service;

pub use form_service::{AvailableForm, FormInput, FormPatch, FormService, QuestionInput};
pub use response_service::{AnswerInput, PatientResponse, ResponseService};
pub use session_service::{LoginInput, RegisterInput, Session, SessionService};

use crate::auth::{JwtError, PasswordError};
use crate::database::DatabaseError;

/// Domain failures raised by the services and authorization rules
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Auth(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Token(#[from] JwtError),

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Database(DatabaseError),
}

impl From<DatabaseError> for ServiceError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::Conflict(msg) => ServiceError::Conflict(msg),
            DatabaseError::NotFound(msg) => ServiceError::NotFound(msg),
            other => ServiceError::Database(other),
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Blank means empty after trimming whitespace.
pub(crate) fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}
