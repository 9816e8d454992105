pub mod form;
pub mod response;
pub mod user;

pub use form::{Form, FormStats, Question};
pub use response::{Answer, Response};
pub use user::User;
