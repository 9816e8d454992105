pub mod format;

pub use format::{
    AnswerView, AvailableFormView, FormDetail, FormResponseView, FormSummary, PatientView, ResponseView, SessionView,
    UserView,
};
