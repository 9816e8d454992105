// handlers/mod.rs - Two-tier handler layout
//
// Public (no auth) → Protected (bearer JWT, caller injected as AuthUser)
pub mod public;
pub mod protected;
