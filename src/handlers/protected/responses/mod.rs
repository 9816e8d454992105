pub mod mine;   // GET /responses/my
pub mod submit; // POST /responses

pub use mine::get as my_responses_get;
pub use submit::post as responses_post;
