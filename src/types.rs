/// Shared types used across the codebase

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The two account classes. There is no hierarchy between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Psychologist,
    Patient,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Psychologist => "psychologist",
            Role::Patient => "patient",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role '{0}'")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    /// Accepts the legacy `patiente` spelling found in older client builds
    /// and folds it into `Patient`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "psychologist" => Ok(Role::Psychologist),
            "patient" | "patiente" => Ok(Role::Patient),
            _ => Err(UnknownRole(s.to_string())),
        }
    }
}

/// Actions checked by the authorization rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    CreateForm,
    ListOwnForms,
    ListAvailableForms,
    ViewForm,
    EditForm,
    DeleteForm,
    ViewFormResponses,
    SubmitResponse,
    ViewOwnResponses,
    ListPatients,
}

impl Action {
    pub fn describe(&self) -> &'static str {
        match self {
            Action::CreateForm => "create forms",
            Action::ListOwnForms => "list authored forms",
            Action::ListAvailableForms => "list forms to answer",
            Action::ViewForm => "view this form",
            Action::EditForm => "edit this form",
            Action::DeleteForm => "delete this form",
            Action::ViewFormResponses => "view responses to this form",
            Action::SubmitResponse => "answer this form",
            Action::ViewOwnResponses => "view submitted responses",
            Action::ListPatients => "list patients",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_roles_case_insensitively() {
        assert_eq!("Psychologist".parse::<Role>().unwrap(), Role::Psychologist);
        assert_eq!(" patient ".parse::<Role>().unwrap(), Role::Patient);
    }

    #[test]
    fn legacy_patient_spelling_is_normalized() {
        assert_eq!("patiente".parse::<Role>().unwrap(), Role::Patient);
    }

    #[test]
    fn rejects_unknown_roles() {
        assert!("admin".parse::<Role>().is_err());
        assert!("".parse::<Role>().is_err());
    }

    #[test]
    fn serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Psychologist).unwrap(), "\"psychologist\"");
    }
}
