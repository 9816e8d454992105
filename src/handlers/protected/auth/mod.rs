pub mod whoami; // GET /auth/me

pub use whoami::get as whoami_get;
