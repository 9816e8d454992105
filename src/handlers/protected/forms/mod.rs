pub mod collection; // GET, POST /forms
pub mod record;     // GET, PUT, DELETE /forms/:id
pub mod responses;  // GET /forms/:id/responses

pub use collection::get as forms_get;
pub use collection::post as forms_post;

pub use record::delete as form_delete;
pub use record::get as form_get;
pub use record::put as form_put;

pub use responses::get as form_responses_get;
