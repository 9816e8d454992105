pub mod forms; // GET /patient/forms

pub use forms::get as patient_forms_get;
