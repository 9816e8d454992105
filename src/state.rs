use std::sync::Arc;

use crate::auth::TokenIssuer;
use crate::config::AppConfig;
use crate::database::RepositoryState;
use crate::services::{FormService, ResponseService, SessionService};

/// Shared handler state. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub repo: RepositoryState,
    pub sessions: SessionService,
    pub forms: FormService,
    pub responses: ResponseService,
}

impl AppState {
    pub fn new(config: AppConfig, repo: RepositoryState) -> Self {
        let tokens = TokenIssuer::from_config(&config.security);
        Self {
            sessions: SessionService::new(repo.clone(), tokens),
            forms: FormService::new(repo.clone()),
            responses: ResponseService::new(repo.clone()),
            config: Arc::new(config),
            repo,
        }
    }
}
