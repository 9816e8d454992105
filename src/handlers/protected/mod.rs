// handlers/protected/mod.rs - Protected handlers (bearer JWT required)
//
// jwt_auth_middleware resolves the token and injects an AuthUser extension.
// Role and ownership checks live in the services, not here.
pub mod auth;
pub mod forms;
pub mod patient;
pub mod patients;
pub mod responses;
pub mod utils;
