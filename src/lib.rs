pub mod api;
pub mod app;
pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod policy;
pub mod services;
pub mod state;
pub mod types;

pub use app::app;
pub use state::AppState;

#[cfg(test)]
pub mod testing;
